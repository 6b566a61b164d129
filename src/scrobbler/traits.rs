// Common traits for scrobbling services

use super::error::ScrobbleError;
use crate::settings::{SettingKey, SettingsStore};
use crate::track::TrackIdentity;

/// Why a submission was not attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    MissingCredentials(SettingKey),
}

/// Result of a submission that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    Sent,
    Skipped(SkipReason),
}

pub type ReportResult = Result<Report, ScrobbleError>;

/// Common trait for all scrobbling services
///
/// Failures are returned, never retried; the caller decides what to log.
pub trait Scrobbler {
    /// Update "now playing" status
    fn now_playing(&self, settings: &dyn SettingsStore, track: &TrackIdentity) -> ReportResult;

    /// Submit a scrobble stamped with the current time
    fn scrobble(&self, settings: &dyn SettingsStore, track: &TrackIdentity) -> ReportResult;
}

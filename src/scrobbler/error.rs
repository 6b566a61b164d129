//! Error types for the reporting clients

use crate::settings::SettingKey;

/// Why a Last.fm call did not go through
#[derive(Debug, thiserror::Error)]
pub enum ScrobbleError {
    #[error("Last.fm error {code}: {message}")]
    Api { code: u32, message: String },

    #[error("HTTP status {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Request failed: {0}")]
    Transport(#[from] attohttpc::Error),

    #[error("Unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Missing setting: {0}")]
    MissingSetting(SettingKey),
}

// Relay loop
// One tick: sample the page, run the state machine, report, update presence

use anyhow::Result;
use std::thread;
use std::time::{Duration, Instant};

use crate::media_monitor::{Command, MediaMonitor};
use crate::presence::{Presence, PresenceStatus};
use crate::sampler::Sampler;
use crate::scrobbler::traits::{Report, ReportResult, Scrobbler, SkipReason};
use crate::settings::SettingsStore;
use crate::text_cleanup::TextCleaner;
use crate::track::{Sample, TrackIdentity};

/// Whether the loop should keep going after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub struct Relay {
    sampler: Box<dyn Sampler>,
    monitor: MediaMonitor,
    cleaner: TextCleaner,
    scrobbler: Box<dyn Scrobbler>,
    presence: Box<dyn Presence>,
    interval: Duration,
    last_presence: Option<PresenceStatus>,
    warned_missing_credentials: bool,
}

impl Relay {
    pub fn new(
        sampler: Box<dyn Sampler>,
        monitor: MediaMonitor,
        cleaner: TextCleaner,
        scrobbler: Box<dyn Scrobbler>,
        presence: Box<dyn Presence>,
        interval: Duration,
    ) -> Self {
        Self {
            sampler,
            monitor,
            cleaner,
            scrobbler,
            presence,
            interval,
            last_presence: None,
            warned_missing_credentials: false,
        }
    }

    /// Tick until the sampler is exhausted. Ticks never overlap.
    pub fn run(&mut self, settings: &dyn SettingsStore) -> Result<()> {
        log::info!("Relay started, polling every {}s", self.interval.as_secs());

        loop {
            let started = Instant::now();
            if self.tick(settings, started) == Flow::Stop {
                log::info!("Sampler closed, stopping");
                if let Some(observation) = self.monitor.current().filter(|o| !o.scrobbled) {
                    log::debug!("{} was not played long enough to scrobble", observation.track);
                }
                self.broadcast(PresenceStatus::Idle);
                return Ok(());
            }

            if !self.sampler.paces_itself() {
                thread::sleep(self.interval.saturating_sub(started.elapsed()));
            }
        }
    }

    /// Run a single tick at `now`
    pub fn tick(&mut self, settings: &dyn SettingsStore, now: Instant) -> Flow {
        let sample = match self.sampler.sample() {
            Ok(Some(raw)) => Sample::from_raw(&raw, &self.cleaner),
            Ok(None) => return Flow::Stop,
            Err(e) => {
                log::warn!("Sampling failed: {e:#}");
                None
            }
        };

        if sample.is_none() {
            log::debug!("Incomplete sample, skipping tick");
        }

        let outcome = self.monitor.tick(sample.as_ref(), now);

        for command in &outcome.commands {
            match command {
                Command::NowPlaying(track) => {
                    let result = self.scrobbler.now_playing(settings, track);
                    self.log_report("Now playing", track, result);
                }
                Command::Scrobble(track) => {
                    let result = self.scrobbler.scrobble(settings, track);
                    self.log_report("Scrobble", track, result);
                }
            }
        }

        self.broadcast(outcome.presence);
        Flow::Continue
    }

    fn log_report(&mut self, what: &str, track: &TrackIdentity, result: ReportResult) {
        match result {
            Ok(Report::Sent) => {
                self.warned_missing_credentials = false;
                log::info!("{what} sent: {track}");
            }
            Ok(Report::Skipped(SkipReason::MissingCredentials(key))) => {
                if self.warned_missing_credentials {
                    log::debug!("{what} skipped for {track}: {key} is not set");
                } else {
                    log::warn!("{what} skipped for {track}: {key} is not set");
                    self.warned_missing_credentials = true;
                }
            }
            Ok(Report::Skipped(SkipReason::Disabled)) => {
                log::debug!("{what} skipped for {track}: Last.fm disabled");
            }
            Err(e) => log::error!("{what} failed for {track}: {e}"),
        }
    }

    /// Push a presence change; identical consecutive statuses are not resent
    fn broadcast(&mut self, status: PresenceStatus) {
        if self.last_presence.as_ref() == Some(&status) {
            return;
        }

        match self.presence.update(&status) {
            Ok(()) => self.last_presence = Some(status),
            Err(e) => log::warn!("Presence update failed: {e:#}"),
        }
    }
}

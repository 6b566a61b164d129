// Media monitoring module
// Turns polled player samples into now-playing and scrobble decisions

use std::time::{Duration, Instant};

use crate::config::ScrobblePolicy;
use crate::presence::PresenceStatus;
use crate::track::{Sample, TrackIdentity};

/// Wall-clock seconds a track must play before it is scrobbled
pub const MIN_PLAY_SECS: u64 = 30;

/// How far the page position may lag our clock before we call it a restart
pub const LOOP_TOLERANCE_SECS: u64 = 10;

/// The single track we are currently accounting play time for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrobbleObservation {
    pub track: TrackIdentity,
    pub started_at: Instant,
    /// Track length in seconds
    pub duration: u64,
    pub scrobbled: bool,
}

impl ScrobbleObservation {
    fn new(track: TrackIdentity, duration: u64, started_at: Instant) -> Self {
        Self {
            track,
            started_at,
            duration,
            scrobbled: false,
        }
    }

    /// Time since this observation was created
    pub fn played_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }

    /// True once the track has been observed for at least `min_play`
    /// and has not been scrobbled yet
    pub fn should_scrobble(&self, now: Instant, min_play: Duration) -> bool {
        !self.scrobbled && self.played_for(now) >= min_play
    }
}

/// Side effect requested by a tick, in the order it must be performed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    NowPlaying(TrackIdentity),
    Scrobble(TrackIdentity),
}

/// Everything a tick decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    pub commands: Vec<Command>,
    pub presence: PresenceStatus,
}

impl TickOutcome {
    fn quiet(presence: PresenceStatus) -> Self {
        Self {
            commands: Vec::new(),
            presence,
        }
    }
}

/// Scrobble state machine. Owns the current observation; performs no I/O.
#[derive(Debug)]
pub struct MediaMonitor {
    min_play: Duration,
    loop_tolerance: Duration,
    current: Option<ScrobbleObservation>,
}

impl MediaMonitor {
    pub fn new(policy: ScrobblePolicy) -> Self {
        Self {
            min_play: Duration::from_secs(policy.min_play_seconds),
            loop_tolerance: Duration::from_secs(policy.loop_tolerance_seconds),
            current: None,
        }
    }

    pub fn current(&self) -> Option<&ScrobbleObservation> {
        self.current.as_ref()
    }

    /// Process one poll. `sample` is `None` when the scrape was incomplete.
    pub fn tick(&mut self, sample: Option<&Sample>, now: Instant) -> TickOutcome {
        let Some(sample) = sample else {
            return TickOutcome::quiet(PresenceStatus::Idle);
        };

        if !sample.is_playing {
            // Keep the observation so resuming the same track continues its play time
            return TickOutcome::quiet(PresenceStatus::Paused {
                track: sample.identity.clone(),
            });
        }

        if let Some(elapsed) = sample.elapsed_secs {
            self.discard_on_restart(elapsed, now);
        }

        let mut commands = Vec::new();
        let unchanged = self
            .current
            .as_ref()
            .is_some_and(|observation| observation.track == sample.identity);

        if unchanged {
            if let Some(observation) = self.current.as_mut() {
                commands.push(Command::NowPlaying(observation.track.clone()));

                if observation.should_scrobble(now, self.min_play) {
                    log::info!(
                        "Scrobbling: {} (played {}s / {}s)",
                        observation.track,
                        observation.played_for(now).as_secs(),
                        observation.duration
                    );
                    commands.push(Command::Scrobble(observation.track.clone()));
                    observation.scrobbled = true;
                }
            }
        } else {
            if let Some(previous) = self.current.take() {
                if previous.should_scrobble(now, self.min_play) {
                    log::info!("Late scrobble for previous track: {}", previous.track);
                    commands.push(Command::Scrobble(previous.track));
                }
            }

            log::info!("New track: {} ({}s)", sample.identity, sample.duration_secs);
            self.current = Some(ScrobbleObservation::new(
                sample.identity.clone(),
                sample.duration_secs,
                now,
            ));
            commands.push(Command::NowPlaying(sample.identity.clone()));
        }

        TickOutcome {
            commands,
            presence: PresenceStatus::Listening {
                track: sample.identity.clone(),
                elapsed_secs: sample.elapsed_secs,
                duration_secs: sample.duration_secs,
                artwork_url: sample.artwork_url.clone(),
            },
        }
    }

    /// Drop the observation if the page position fell behind our clock by more
    /// than the tolerance, meaning the track looped or was sought backwards.
    fn discard_on_restart(&mut self, elapsed_secs: u64, now: Instant) {
        let Some(observation) = &self.current else {
            return;
        };

        let expected = observation.played_for(now);
        let behind = Duration::from_secs(elapsed_secs)
            .checked_add(self.loop_tolerance)
            .is_some_and(|reported| reported < expected);
        if behind {
            log::debug!(
                "Position {}s is behind expected {}s for {}, restarting observation",
                elapsed_secs,
                expected.as_secs(),
                observation.track
            );
            self.current = None;
        }
    }
}

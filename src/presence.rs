// Rich presence module
// Mirrors the listening status into a Discord activity

use anyhow::{anyhow, Result};
use chrono::Utc;
use discord_rich_presence::{activity, DiscordIpc, DiscordIpcClient};

use crate::track::TrackIdentity;

/// What the user is doing right now, as shown to chat clients
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceStatus {
    Listening {
        track: TrackIdentity,
        elapsed_secs: Option<u64>,
        duration_secs: u64,
        artwork_url: Option<String>,
    },
    Paused {
        track: TrackIdentity,
    },
    Idle,
}

/// Sink for presence updates. Implementations are best-effort.
pub trait Presence {
    fn update(&mut self, status: &PresenceStatus) -> Result<()>;
}

/// Discord IPC backed presence
pub struct DiscordPresence {
    client: DiscordIpcClient,
    connected: bool,
}

impl DiscordPresence {
    pub fn new(client_id: &str) -> Result<Self> {
        let client = DiscordIpcClient::new(client_id)
            .map_err(|e| anyhow!("Failed to create Discord client: {e}"))?;

        let mut presence = Self {
            client,
            connected: false,
        };
        // Discord may not be running yet; update() retries the connection.
        if let Err(e) = presence.ensure_connected() {
            log::warn!("{e:#}");
        }
        Ok(presence)
    }

    fn ensure_connected(&mut self) -> Result<()> {
        if self.connected {
            return Ok(());
        }
        self.client
            .connect()
            .map_err(|e| anyhow!("Failed to connect to Discord IPC: {e}"))?;
        self.connected = true;
        log::info!("Connected to Discord IPC");
        Ok(())
    }

    fn push(&mut self, status: &PresenceStatus) -> Result<()> {
        match status {
            PresenceStatus::Listening {
                track,
                elapsed_secs,
                duration_secs,
                artwork_url,
            } => {
                let state = format!("by {}", track.artist);
                let mut payload = activity::Activity::new()
                    .details(&track.title)
                    .state(&state);

                if let Some(url) = artwork_url {
                    payload = payload.assets(activity::Assets::new().large_image(url).large_text(&track.title));
                }

                if let Some((start, end)) = elapsed_secs
                    .and_then(|elapsed| listening_window(Utc::now().timestamp(), elapsed, *duration_secs))
                {
                    payload = payload.timestamps(activity::Timestamps::new().start(start).end(end));
                }

                self.client
                    .set_activity(payload)
                    .map_err(|e| anyhow!("Failed to set Discord activity: {e}"))
            }
            PresenceStatus::Paused { track } => {
                let details = track.to_string();
                let payload = activity::Activity::new().details(&details).state("Paused");
                self.client
                    .set_activity(payload)
                    .map_err(|e| anyhow!("Failed to set Discord activity: {e}"))
            }
            PresenceStatus::Idle => self
                .client
                .clear_activity()
                .map_err(|e| anyhow!("Failed to clear Discord activity: {e}")),
        }
    }
}

impl Presence for DiscordPresence {
    fn update(&mut self, status: &PresenceStatus) -> Result<()> {
        self.ensure_connected()?;
        let result = self.push(status);
        if result.is_err() {
            // Most failures mean the pipe went away; reconnect on the next update.
            self.connected = false;
        }
        result
    }
}

/// Presence sink that only logs, used when Discord is disabled
#[derive(Debug, Default)]
pub struct LogPresence;

impl Presence for LogPresence {
    fn update(&mut self, status: &PresenceStatus) -> Result<()> {
        match status {
            PresenceStatus::Listening { track, .. } => log::debug!("Presence: listening to {}", track),
            PresenceStatus::Paused { track } => log::debug!("Presence: paused {}", track),
            PresenceStatus::Idle => log::debug!("Presence: idle"),
        }
        Ok(())
    }
}

/// Unix start/end of the current play given the page position.
/// `None` when the reported times do not fit a timestamp.
fn listening_window(now: i64, elapsed_secs: u64, duration_secs: u64) -> Option<(i64, i64)> {
    let elapsed = i64::try_from(elapsed_secs).ok()?;
    let length = i64::try_from(duration_secs.max(elapsed_secs)).ok()?;
    let start = now.checked_sub(elapsed)?;
    let end = start.checked_add(length)?;
    Some((start, end))
}

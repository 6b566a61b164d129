// Last.fm authentication helper using the desktop token flow
// https://www.last.fm/api/desktopauth

use anyhow::{Context, Result};
use std::io::{BufRead, Write};

use super::lastfm::LastFmClient;
use super::transport::Transport;
use crate::settings::{SettingKey, SettingsStore};

const AUTH_PAGE: &str = "https://www.last.fm/api/auth/";

/// Perform the complete Last.fm authentication flow and store the session key.
///
/// Prompts go to `output`; the user confirms approval by pressing Enter on `input`.
pub fn authenticate<T: Transport>(
    client: &LastFmClient<T>,
    settings: &mut dyn SettingsStore,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<String> {
    let api_key = settings
        .get(SettingKey::ApiKey)
        .context("Set lastfm.api_key and lastfm.api_secret in the config file first")?;

    writeln!(output, "Starting Last.fm authentication...\n")?;

    let token = client
        .get_token(settings)
        .context("Failed to request an authentication token")?;

    writeln!(output, "Open this page and allow access:\n\n  {AUTH_PAGE}?api_key={api_key}&token={token}\n")?;
    write!(output, "Press Enter once access has been granted...")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;

    writeln!(output, "\nRequesting session...")?;
    let session_key = client
        .get_session(settings, &token)
        .context("Failed to obtain a session, was access granted?")?;

    settings
        .set(SettingKey::SessionKey, &session_key)
        .context("Failed to store session key")?;
    writeln!(output, "Session key obtained successfully!\n")?;

    Ok(session_key)
}

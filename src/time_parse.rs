// Time parsing module
// Converts the player's "M:SS" / "H:MM:SS" text into whole seconds

/// Duration assumed when the page does not expose a usable track length
pub const DEFAULT_DURATION_SECS: u64 = 240;

/// Parse a colon-separated time ("3:45", "1:02:03") into seconds.
///
/// Components are folded left to right as `acc * 60 + part`, so any number of
/// components is accepted. Returns `None` if any component is not a number.
pub fn parse_time(text: &str) -> Option<u64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    text.split(':').try_fold(0u64, |acc, part| {
        let part: u64 = part.trim().parse().ok()?;
        acc.checked_mul(60)?.checked_add(part)
    })
}

/// Parse a strict `M:SS` track length, falling back to [`DEFAULT_DURATION_SECS`].
///
/// Anything that is not exactly two numeric components (missing, empty,
/// garbage, or an hour-long `H:MM:SS`) yields the default instead of an error.
pub fn parse_duration_with_default(text: Option<&str>) -> u64 {
    let Some(text) = text else {
        return DEFAULT_DURATION_SECS;
    };

    let mut parts = text.trim().split(':');
    let (Some(minutes), Some(seconds), None) = (parts.next(), parts.next(), parts.next()) else {
        return DEFAULT_DURATION_SECS;
    };

    let minutes = minutes.trim().parse::<u64>().ok();
    let seconds = seconds.trim().parse::<u64>().ok();
    minutes
        .zip(seconds)
        .and_then(|(minutes, seconds)| minutes.checked_mul(60)?.checked_add(seconds))
        .unwrap_or(DEFAULT_DURATION_SECS)
}

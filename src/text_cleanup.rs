// Text cleanup module
// Applies regex patterns to clean up track/artist names

use crate::config::CleanupConfig;
use regex::Regex;

pub struct TextCleaner {
    enabled: bool,
    patterns: Vec<Regex>,
}

impl TextCleaner {
    /// Create a new text cleaner from config
    pub fn new(config: &CleanupConfig) -> Self {
        let patterns = if config.enabled {
            config
                .patterns
                .iter()
                .filter_map(|pattern| match Regex::new(pattern) {
                    Ok(re) => Some(re),
                    Err(e) => {
                        log::warn!("Invalid regex pattern '{}': {}", pattern, e);
                        None
                    }
                })
                .collect()
        } else {
            Vec::new()
        };

        Self {
            enabled: config.enabled,
            patterns,
        }
    }

    /// Drop everything after the first line and a leading "<label>: " prefix.
    ///
    /// Always applied, independent of the configured patterns.
    pub fn strip_title_decorations(title: &str) -> String {
        let first_line = title.lines().next().unwrap_or_default();
        let without_label = first_line
            .split_once(": ")
            .map_or(first_line, |(_, rest)| rest);
        without_label.trim().to_string()
    }

    /// Clean a text string by applying all patterns
    pub fn clean(&self, text: &str) -> String {
        if !self.enabled {
            return text.trim().to_string();
        }

        let mut result = text.to_string();
        for pattern in &self.patterns {
            result = pattern.replace_all(&result, "").to_string();
        }

        result.trim().to_string()
    }
}

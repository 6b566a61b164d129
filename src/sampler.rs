// Sampling module
// Pulls now playing samples from the page scraper running in the browser host

use anyhow::{Context, Result};
use std::io::BufRead;
use std::process::Command;

use crate::track::RawSample;

/// Source of raw player samples
pub trait Sampler {
    /// Next sample. `Ok(None)` means the source is exhausted and the relay should stop.
    fn sample(&mut self) -> Result<Option<RawSample>>;

    /// True if `sample` blocks until the source has something new,
    /// in which case the relay does not sleep between ticks
    fn paces_itself(&self) -> bool {
        false
    }
}

/// Parse one scraper payload. `null` means no player is present.
fn parse_sample(text: &str) -> Result<RawSample> {
    let sample: Option<RawSample> = serde_json::from_str(text)
        .with_context(|| format!("Malformed sample: {text}"))?;
    Ok(sample.unwrap_or_default())
}

/// Reads one JSON sample per line, as written by the host on each poll
pub struct LineSampler<R> {
    reader: R,
    line: String,
}

impl<R: BufRead> LineSampler<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
        }
    }
}

impl<R: BufRead> Sampler for LineSampler<R> {
    fn sample(&mut self) -> Result<Option<RawSample>> {
        loop {
            self.line.clear();
            let read = self
                .reader
                .read_line(&mut self.line)
                .context("Failed to read sample")?;
            if read == 0 {
                return Ok(None);
            }

            let line = self.line.trim();
            if !line.is_empty() {
                return parse_sample(line).map(Some);
            }
        }
    }

    fn paces_itself(&self) -> bool {
        true
    }
}

/// Runs a scrape command on every tick and parses its stdout
#[derive(Debug)]
pub struct CommandSampler {
    program: String,
    args: Vec<String>,
}

impl CommandSampler {
    pub fn new(command: &[String]) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .context("sampler.command must name a program")?;

        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl Sampler for CommandSampler {
    fn sample(&mut self) -> Result<Option<RawSample>> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .with_context(|| format!("Failed to run sampler command '{}'", self.program))?;

        if !output.status.success() {
            anyhow::bail!(
                "Sampler command exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim();
        if stdout.is_empty() {
            return Ok(Some(RawSample::default()));
        }

        parse_sample(stdout).map(Some)
    }
}

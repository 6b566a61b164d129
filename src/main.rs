mod config;
mod media_monitor;
mod presence;
mod relay;
mod sampler;
mod scrobbler;
mod settings;
mod text_cleanup;
mod time_parse;
mod track;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::{Env, WriteStyle};
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use config::Config;
use media_monitor::MediaMonitor;
use presence::{DiscordPresence, LogPresence, Presence};
use relay::Relay;
use sampler::{CommandSampler, LineSampler, Sampler};
use scrobbler::lastfm::LastFmClient;
use scrobbler::transport::HttpTransport;
use settings::FileSettings;
use text_cleanup::TextCleaner;

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Relay samples to Last.fm and Discord (default)
    Run,
    /// Authorize with Last.fm and store the session key
    Auth,
    /// Print the config file location
    ConfigPath,
}

fn init_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let style = if atty::is(atty::Stream::Stderr) {
        WriteStyle::Auto
    } else {
        WriteStyle::Never
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .write_style(style)
        .init();
}

fn build_sampler(config: &Config) -> Result<Box<dyn Sampler>> {
    if config.sampler.command.is_empty() {
        log::info!("Reading samples from stdin");
        Ok(Box::new(LineSampler::new(io::stdin().lock())))
    } else {
        log::info!("Sampling with {:?}", config.sampler.command);
        Ok(Box::new(CommandSampler::new(&config.sampler.command)?))
    }
}

fn build_presence(config: &Config) -> Box<dyn Presence> {
    if !config.presence.enabled {
        return Box::new(LogPresence);
    }

    match DiscordPresence::new(&config.presence.client_id) {
        Ok(presence) => Box::new(presence),
        Err(e) => {
            log::error!("Rich presence unavailable: {e:#}");
            Box::new(LogPresence)
        }
    }
}

fn run(config: Config, settings: &FileSettings) -> Result<()> {
    let client = LastFmClient::new(HttpTransport, config.lastfm.api_url.clone(), config.lastfm.enabled);

    let mut relay = Relay::new(
        build_sampler(&config)?,
        MediaMonitor::new(config.scrobble),
        TextCleaner::new(&config.cleanup),
        Box::new(client),
        build_presence(&config),
        Duration::from_secs(config.refresh_interval),
    );

    relay.run(settings)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::config_path()?,
    };

    if let Some(Commands::ConfigPath) = cli.command {
        println!("{}", config_path.display());
        return Ok(());
    }

    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    let mut settings = FileSettings::new(config_path, config.clone());

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run | Commands::ConfigPath => run(config, &settings),
        Commands::Auth => {
            let client = LastFmClient::new(HttpTransport, config.lastfm.api_url.clone(), true);
            let stdin = io::stdin();
            scrobbler::lastfm_auth::authenticate(&client, &mut settings, &mut stdin.lock(), &mut io::stdout())?;
            if !config.lastfm.enabled {
                log::warn!("Session stored, but Last.fm is disabled; set lastfm.enabled = true");
            }
            Ok(())
        }
    }
}

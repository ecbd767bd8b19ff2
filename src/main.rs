mod archiver;
mod collector;
mod config;
mod error;
mod fetcher;
mod logging;
mod models;
mod parser;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use archiver::Archiver;
use collector::Collector;
use config::{OutputMode, Settings, TerminationCheck};
use fetcher::SteamFetcher;
use logging::RunLog;

#[derive(Parser)]
#[command(name = "steam-review-collector")]
#[command(about = "Collect every review of a Steam product into a CSV snapshot")]
#[command(version)]
struct Cli {
    /// Steam app id to collect reviews for
    #[arg(long, default_value_t = config::DEFAULT_APP_ID)]
    app_id: u32,

    /// Seconds to wait between page requests
    #[arg(long, default_value_t = config::DEFAULT_DELAY.as_secs_f64())]
    delay_secs: f64,

    /// Directory for CSV snapshots
    #[arg(long, default_value = config::DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// Number of old snapshots to keep
    #[arg(long, default_value_t = config::DEFAULT_KEEP)]
    keep: usize,

    /// Output naming scheme
    #[arg(long, value_enum, default_value_t)]
    output_mode: OutputMode,

    /// Whether the page that repeats the cursor is checked before or after it is kept
    #[arg(long, value_enum, default_value_t)]
    termination: TerminationCheck,

    /// Review API host
    #[arg(long, default_value = fetcher::DEFAULT_BASE_URL)]
    base_url: String,

    /// Log file (default: <data-dir>/steam_review_collector.log)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

impl Cli {
    fn settings(&self) -> Result<Settings> {
        let delay = Duration::try_from_secs_f64(self.delay_secs)
            .with_context(|| format!("Invalid delay: {}", self.delay_secs))?;
        Ok(Settings {
            app_id: self.app_id,
            delay,
            base_url: self.base_url.clone(),
            data_dir: self.data_dir.clone(),
            keep: self.keep,
            output_mode: self.output_mode,
            termination: self.termination,
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.settings()?;

    std::fs::create_dir_all(&settings.data_dir)
        .with_context(|| format!("Cannot create data dir {}", settings.data_dir.display()))?;
    let log_file = cli
        .log_file
        .clone()
        .unwrap_or_else(|| settings.data_dir.join(config::LOG_FILE_NAME));
    let log = RunLog::open(&log_file, cli.debug)?;

    let result = run(&settings, &log);
    if let Err(e) = &result {
        log.error(format_args!("{e:#}"));
    }
    log.flush();
    result
}

fn run(settings: &Settings, log: &RunLog) -> Result<()> {
    log.info(format_args!(
        "Collecting reviews for app {} from {}",
        settings.app_id, settings.base_url
    ));

    let fetcher = SteamFetcher::new(&settings.base_url, settings.app_id)?;
    let archiver = Archiver::new(&settings.data_dir, settings.output_mode, settings.keep, log);
    let mut collector = Collector::new(fetcher, log, settings.delay, settings.termination);

    let today = chrono::Local::now().date_naive();
    let summary = collector.run(&archiver, today)?;

    match &summary.output {
        Some(path) => log.info(format_args!(
            "Collected {} reviews over {} pages into {} ({:?})",
            summary.reviews,
            summary.pages,
            path.display(),
            summary.stop
        )),
        None => log.info(format_args!(
            "Nothing written after {} pages ({:?})",
            summary.pages, summary.stop
        )),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_match_settings_defaults() {
        let cli = Cli::try_parse_from(["steam-review-collector"]).unwrap();
        let settings = cli.settings().unwrap();
        let defaults = Settings::default();
        assert_eq!(settings.app_id, defaults.app_id);
        assert_eq!(settings.delay, defaults.delay);
        assert_eq!(settings.base_url, defaults.base_url);
        assert_eq!(settings.data_dir, defaults.data_dir);
        assert_eq!(settings.keep, defaults.keep);
        assert_eq!(settings.output_mode, defaults.output_mode);
        assert_eq!(settings.termination, defaults.termination);
        assert_eq!(cli.log_file, None);
    }

    #[test]
    fn cli_overrides() {
        let cli = Cli::try_parse_from([
            "steam-review-collector",
            "--app-id",
            "730",
            "--delay-secs",
            "0.5",
            "--keep",
            "5",
            "--output-mode",
            "dated",
            "--termination",
            "after",
        ])
        .unwrap();
        let settings = cli.settings().unwrap();
        assert_eq!(settings.app_id, 730);
        assert_eq!(settings.delay, Duration::from_millis(500));
        assert_eq!(settings.keep, 5);
        assert_eq!(settings.output_mode, OutputMode::Dated);
        assert_eq!(settings.termination, TerminationCheck::AfterAccumulate);
    }

    #[test]
    fn negative_delay_rejected() {
        let cli = Cli::try_parse_from(["steam-review-collector", "--delay-secs=-1"]).unwrap();
        assert!(cli.settings().is_err());
    }
}

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;

use crate::fetcher::DEFAULT_BASE_URL;

pub const DEFAULT_APP_ID: u32 = 1658280;
pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_KEEP: usize = 3;
pub const DEFAULT_DATA_DIR: &str = "data";
pub const LOG_FILE_NAME: &str = "steam_review_collector.log";

/// Where the stable-cursor check sits relative to appending a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TerminationCheck {
    /// Check first: the page that repeats the cursor is discarded.
    #[default]
    #[value(name = "before")]
    BeforeAccumulate,
    /// Append first: the page that repeats the cursor is kept.
    #[value(name = "after")]
    AfterAccumulate,
}

/// How the CSV output is named and rotated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputMode {
    /// `reviews_latest.csv`, previous one renamed to `reviews_old_<date>.csv`.
    #[default]
    Rotating,
    /// `reviews_<date>.csv`, no rotation or retention.
    Dated,
}

/// Everything one collection run needs.
#[derive(Debug, Clone)]
pub struct Settings {
    pub app_id: u32,
    pub delay: Duration,
    pub base_url: String,
    pub data_dir: PathBuf,
    pub keep: usize,
    pub output_mode: OutputMode,
    pub termination: TerminationCheck,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_id: DEFAULT_APP_ID,
            delay: DEFAULT_DELAY,
            base_url: DEFAULT_BASE_URL.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            keep: DEFAULT_KEEP,
            output_mode: OutputMode::default(),
            termination: TerminationCheck::default(),
        }
    }
}

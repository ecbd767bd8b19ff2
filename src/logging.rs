//! Run log handle passed to the collector instead of a global logger

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use env_logger::{Logger, Target, WriteStyle};
use log::{Level, LevelFilter, Log, Record};

const TARGET: &str = "steam_review_collector";

fn level_label(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARN ",
        Level::Info => "INFO ",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}

/// Owns the log sinks for one run. Open it before the run, `flush` after.
pub struct RunLog {
    sinks: Vec<Logger>,
}

impl RunLog {
    /// Log file plus stderr. Stderr honors `RUST_LOG`.
    pub fn open(log_file: &Path, debug: bool) -> Result<Self> {
        let level = if debug {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        };
        let default_filter = if debug { "debug" } else { "info" };

        let console = env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(default_filter),
        )
        .format(|buf, record| writeln!(buf, "[{}] {}", level_label(record.level()), record.args()))
        .build();

        Ok(Self {
            sinks: vec![file_sink(log_file, level)?, console],
        })
    }

    /// Log file only.
    #[cfg(test)]
    pub fn file_only(log_file: &Path, level: LevelFilter) -> Result<Self> {
        Ok(Self {
            sinks: vec![file_sink(log_file, level)?],
        })
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Error, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Warn, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Info, args);
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Debug, args);
    }

    pub fn flush(&self) {
        for sink in &self.sinks {
            sink.flush();
        }
    }

    fn emit(&self, level: Level, args: fmt::Arguments<'_>) {
        let record = Record::builder()
            .args(args)
            .level(level)
            .target(TARGET)
            .build();
        for sink in &self.sinks {
            if sink.enabled(record.metadata()) {
                sink.log(&record);
            }
        }
    }
}

/// Append-mode file sink: `<timestamp> - <LEVEL> - <message>`.
fn file_sink(path: &Path, level: LevelFilter) -> Result<Logger> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Cannot open log file {}", path.display()))?;

    Ok(env_logger::Builder::new()
        .filter_level(level)
        .write_style(WriteStyle::Never)
        .target(Target::Pipe(Box::new(file)))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
                record.level(),
                record.args()
            )
        })
        .build())
}

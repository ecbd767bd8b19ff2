use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::config::OutputMode;
use crate::logging::RunLog;
use crate::models::{REVIEW_FIELDS, Review};

pub const LATEST_FILE: &str = "reviews_latest.csv";
pub const OLD_PREFIX: &str = "reviews_old_";

/// Writes review snapshots into one directory and rotates older ones.
///
/// Two runs sharing a directory at the same time race on the rename and
/// the write; nothing here guards against that.
pub struct Archiver<'a> {
    dir: PathBuf,
    mode: OutputMode,
    keep: usize,
    log: &'a RunLog,
}

impl<'a> Archiver<'a> {
    pub fn new(dir: impl Into<PathBuf>, mode: OutputMode, keep: usize, log: &'a RunLog) -> Self {
        Self {
            dir: dir.into(),
            mode,
            keep,
            log,
        }
    }

    /// Persist `reviews` captured on `today`. Returns the written path.
    pub fn save(&self, reviews: &[Review], today: NaiveDate) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create data dir {}", self.dir.display()))?;

        match self.mode {
            OutputMode::Dated => {
                let path = self.dir.join(format!("reviews_{}.csv", date_stamp(today)));
                write_csv(reviews, &path)?;
                self.log.info(format_args!("Data saved to {}", path.display()));
                Ok(path)
            }
            OutputMode::Rotating => {
                let latest = self.dir.join(LATEST_FILE);
                let latest_exists = latest
                    .try_exists()
                    .with_context(|| format!("Cannot stat {}", latest.display()))?;
                if latest_exists {
                    let old = free_old_name(&self.dir, today)?;
                    fs::rename(&latest, &old).with_context(|| {
                        format!("Cannot rename {} to {}", latest.display(), old.display())
                    })?;
                    self.log
                        .info(format_args!("Renamed latest file to {}", old.display()));
                }

                write_csv(reviews, &latest)?;
                self.log.info(format_args!("Data saved to {}", latest.display()));

                self.prune_old()?;
                Ok(latest)
            }
        }
    }

    /// Delete the oldest `reviews_old_*` files until `keep` remain.
    pub fn prune_old(&self) -> Result<Vec<PathBuf>> {
        let mut old = list_old(&self.dir)?;
        old.sort();

        let excess = old.len().saturating_sub(self.keep);
        let mut deleted = Vec::with_capacity(excess);
        for (_, path) in old.into_iter().take(excess) {
            fs::remove_file(&path)
                .with_context(|| format!("Cannot delete {}", path.display()))?;
            self.log
                .info(format_args!("Deleted old review file: {}", path.display()));
            deleted.push(path);
        }
        Ok(deleted)
    }
}

fn date_stamp(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// `reviews_old_<date>.csv`, or the first free `reviews_old_<date>_<n>.csv`.
fn free_old_name(dir: &Path, today: NaiveDate) -> Result<PathBuf> {
    let stamp = date_stamp(today);
    let mut candidate = dir.join(format!("{OLD_PREFIX}{stamp}.csv"));
    let mut counter = 1u32;
    while candidate
        .try_exists()
        .with_context(|| format!("Cannot stat {}", candidate.display()))?
    {
        candidate = dir.join(format!("{OLD_PREFIX}{stamp}_{counter}.csv"));
        counter += 1;
    }
    Ok(candidate)
}

/// Old snapshot files with their modification time; order is unspecified.
fn list_old(dir: &Path) -> Result<Vec<(SystemTime, PathBuf)>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Cannot list {}", dir.display()))?;

    let mut old = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Cannot list {}", dir.display()))?;
        if !entry.file_name().to_string_lossy().starts_with(OLD_PREFIX) {
            continue;
        }
        let meta = entry
            .metadata()
            .with_context(|| format!("Cannot stat {}", entry.path().display()))?;
        if !meta.is_file() {
            continue;
        }
        let modified = meta
            .modified()
            .with_context(|| format!("No mtime for {}", entry.path().display()))?;
        old.push((modified, entry.path()));
    }
    Ok(old)
}

fn write_csv(reviews: &[Review], path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV writer for {}", path.display()))?;

    wtr.write_record(REVIEW_FIELDS)?;
    for review in reviews {
        wtr.write_record(review.csv_row())?;
    }
    wtr.flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

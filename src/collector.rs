//! Cursor pagination over the review source

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDate;

use crate::archiver::Archiver;
use crate::config::TerminationCheck;
use crate::fetcher::ReviewSource;
use crate::logging::RunLog;
use crate::models::{Cursor, Review};
use crate::parser::parse_reviews;

/// Why pagination stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The source returned the cursor it was sent.
    CursorRepeated,
    /// A fetch failed; see the run log.
    FetchFailed,
    /// The source answered a non-empty cursor with an empty one.
    CursorLost,
}

#[derive(Debug)]
pub struct RunSummary {
    pub pages: usize,
    pub reviews: usize,
    pub stop: StopReason,
    pub output: Option<PathBuf>,
}

/// Fetches every page for one product and hands the result to an [`Archiver`].
pub struct Collector<'a, S> {
    source: S,
    log: &'a RunLog,
    delay: Duration,
    termination: TerminationCheck,
    cursor: Cursor,
    reviews: Vec<Review>,
}

impl<'a, S: ReviewSource> Collector<'a, S> {
    pub fn new(source: S, log: &'a RunLog, delay: Duration, termination: TerminationCheck) -> Self {
        Self {
            source,
            log,
            delay,
            termination,
            cursor: Cursor::new(),
            reviews: Vec::new(),
        }
    }

    /// Reviews accumulated so far, in fetch order.
    #[cfg(test)]
    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    /// Paginate until the cursor repeats or a fetch fails.
    pub fn collect(&mut self) -> (usize, StopReason) {
        let mut pages = 0;
        loop {
            let page = match self.source.fetch_page(&self.cursor) {
                Ok(page) => page,
                Err(e) => {
                    self.log.error(format_args!("{e}"));
                    return (pages, StopReason::FetchFailed);
                }
            };

            // An empty cursor means "from the start"; following it would
            // collect every page again.
            if page.cursor.is_empty() && !self.cursor.is_empty() {
                self.log.warn(format_args!(
                    "Empty cursor returned for cursor {:?}, stopping.",
                    self.cursor
                ));
                return (pages, StopReason::CursorLost);
            }

            let repeated = page.cursor == self.cursor;
            if repeated && self.termination == TerminationCheck::BeforeAccumulate {
                self.log.info(format_args!("No more reviews to collect."));
                return (pages, StopReason::CursorRepeated);
            }

            let parsed = parse_reviews(&page);
            self.log.debug(format_args!(
                "Page {}: {} reviews, cursor {:?}",
                pages + 1,
                parsed.len(),
                page.cursor
            ));
            self.reviews.extend(parsed);
            pages += 1;
            self.log.info(format_args!(
                "Number of reviews collected: {}",
                self.reviews.len()
            ));

            if repeated {
                self.log.info(format_args!("No more reviews to collect."));
                return (pages, StopReason::CursorRepeated);
            }

            self.cursor = page.cursor;
            std::thread::sleep(self.delay);
        }
    }

    /// Collect, then persist through `archiver` if anything was collected.
    pub fn run(&mut self, archiver: &Archiver<'_>, today: NaiveDate) -> Result<RunSummary> {
        let (pages, stop) = self.collect();

        let output = if self.reviews.is_empty() {
            self.log
                .warn(format_args!("No data collected, something went wrong."));
            None
        } else {
            Some(archiver.save(&self.reviews, today)?)
        };

        Ok(RunSummary {
            pages,
            reviews: self.reviews.len(),
            stop,
            output,
        })
    }
}

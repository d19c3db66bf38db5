//! Run orchestrator for one search scope.
//!
//! The `Orchestrator` owns the record store and the done-set for the whole
//! run. It pulls candidate pages from a [`CandidateSource`], filters out
//! identifiers already harvested, hands the rest to a [`ProfileSource`] and
//! records successes durably before marking them done.

use crate::aggregate::{aggregate, AggregateOutputs};
use crate::done_set::DoneSet;
use crate::error::{HarvestError, Result};
use crate::pager::CandidateSource;
use crate::processor::{ProfileOutcome, ProfileSource};
use crate::scope::ScopePaths;
use crate::store::RecordStore;
use serde::Serialize;
use std::fmt;
use tokio_util::sync::CancellationToken;

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Store and done-set opened
    Init,
    /// Waiting for the next result page
    Enumerating,
    /// Checking a candidate against the done-set
    Filtering,
    /// Extracting a profile
    Processing,
    /// Appending a record and marking it done
    Recording,
    /// Flushing and aggregating
    Finalizing,
    /// Finished normally
    Done,
    /// Stopped by cancellation or a fatal error
    Interrupted,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Enumerating => "enumerating",
            Self::Filtering => "filtering",
            Self::Processing => "processing",
            Self::Recording => "recording",
            Self::Finalizing => "finalizing",
            Self::Done => "done",
            Self::Interrupted => "interrupted",
        };
        f.write_str(name)
    }
}

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStatistics {
    /// Profiles recorded
    pub processed: u32,
    /// Candidates skipped (already done, no identity, no information)
    pub skipped: u32,
    /// Profiles that failed every attempt
    pub failed: u32,
    /// Result pages enumerated
    pub pages: u32,
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed: {}, skipped: {}, failed: {}, pages: {}",
            self.processed, self.skipped, self.failed, self.pages
        )
    }
}

/// Final report of a run.
#[derive(Debug)]
pub struct RunSummary {
    /// `Done` or `Interrupted`
    pub state: RunState,
    /// Counters
    pub stats: RunStatistics,
    /// Aggregated files
    pub outputs: AggregateOutputs,
    /// Error that stopped the run early, if any
    pub fatal: Option<HarvestError>,
}

/// Drives one scope from enumeration to aggregation.
pub struct Orchestrator {
    paths: ScopePaths,
    store: RecordStore,
    done: DoneSet,
    profile_attempts: u32,
    cancel: CancellationToken,
    state: RunState,
    stats: RunStatistics,
}

impl Orchestrator {
    /// Open the store and done-set of a scope, creating directories as needed.
    pub fn open(paths: ScopePaths, profile_attempts: u32, cancel: CancellationToken) -> Result<Self> {
        paths.ensure_dirs()?;
        let done = DoneSet::load(&paths.done)?;
        let store = RecordStore::open(&paths.store)?;

        Ok(Self {
            paths,
            store,
            done,
            profile_attempts: profile_attempts.max(1),
            cancel,
            state: RunState::Init,
            stats: RunStatistics::default(),
        })
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> RunStatistics {
        self.stats
    }

    /// Identifiers harvested so far, including previous runs.
    #[must_use]
    pub fn done_set(&self) -> &DoneSet {
        &self.done
    }

    /// Mark the run as interrupted, e.g. after a fatal error outside the loop.
    pub fn interrupt(&mut self) {
        self.state = RunState::Interrupted;
    }

    fn cancelled(&mut self) -> bool {
        if self.cancel.is_cancelled() {
            tracing::warn!("Run cancelled; partial results preserved");
            self.state = RunState::Interrupted;
            true
        } else {
            false
        }
    }

    /// Consume every candidate page. Returns early, with state `Interrupted`,
    /// on cancellation or on an error that makes further progress impossible.
    pub async fn run<C, P>(&mut self, source: &mut C, processor: &P) -> Result<()>
    where
        C: CandidateSource + ?Sized,
        P: ProfileSource + ?Sized,
    {
        loop {
            if self.cancelled() {
                return Ok(());
            }

            self.state = RunState::Enumerating;
            let batch = match source.next_batch().await {
                Ok(Some(batch)) => batch,
                Ok(None) => break,
                Err(e) => {
                    self.state = RunState::Interrupted;
                    return Err(e);
                }
            };
            self.stats.pages += 1;

            for url in batch {
                if self.cancelled() {
                    return Ok(());
                }
                if let Err(e) = self.handle_candidate(&url, processor).await {
                    tracing::error!(url = %url, "Cannot record progress: {}", e);
                    self.state = RunState::Interrupted;
                    return Err(e);
                }
            }
        }

        self.state = RunState::Finalizing;
        Ok(())
    }

    async fn handle_candidate<P>(&mut self, url: &str, processor: &P) -> Result<()>
    where
        P: ProfileSource + ?Sized,
    {
        self.state = RunState::Filtering;
        if let Some(id) = self.done.matches_url(url) {
            tracing::info!(url = %url, rpps = %id, "Skipping (URL indicates already processed)");
            self.stats.skipped += 1;
            return Ok(());
        }

        self.state = RunState::Processing;
        let mut outcome = processor.process(url, &self.done).await;
        let mut attempt = 1;
        while let ProfileOutcome::Failure(failure) = &outcome {
            if attempt >= self.profile_attempts || self.cancel.is_cancelled() {
                break;
            }
            tracing::warn!(url = %url, "Attempt {} failed: {}", attempt, failure.cause);
            attempt += 1;
            outcome = processor.process(url, &self.done).await;
        }

        self.state = RunState::Recording;
        match outcome {
            ProfileOutcome::Success(profile) => {
                self.store.append(&profile.record)?;
                self.done.mark_done(profile.rpps.as_str())?;
                self.stats.processed += 1;
                tracing::info!(rpps = %profile.rpps, "Processed profile");
            }
            ProfileOutcome::Skip { url, reason, rpps } => {
                if let Some(id) = &rpps {
                    self.done.mark_done(id)?;
                }
                self.stats.skipped += 1;
                tracing::info!(
                    url = %url,
                    rpps = rpps.as_deref().unwrap_or("-"),
                    "Skipped profile: {}",
                    reason
                );
            }
            ProfileOutcome::Failure(failure) => {
                self.stats.failed += 1;
                tracing::error!(
                    url = %failure.url,
                    rpps = failure.rpps.as_deref().unwrap_or("-"),
                    "Profile failed after {} attempts: {}",
                    attempt,
                    failure.cause
                );
            }
        }
        Ok(())
    }

    /// Flush the store and rebuild the aggregated outputs.
    ///
    /// Runs on every exit path; the browser must already be closed.
    pub fn finalize(mut self) -> Result<RunSummary> {
        let interrupted = self.state == RunState::Interrupted;
        self.state = RunState::Finalizing;

        if let Err(e) = self.store.flush() {
            tracing::error!("Failed to flush record store: {}", e);
        }
        let outputs = aggregate(&self.paths)?;

        let state = if interrupted {
            RunState::Interrupted
        } else {
            RunState::Done
        };
        tracing::info!(state = %state, "Harvest finished. {}", self.stats);

        Ok(RunSummary {
            state,
            stats: self.stats,
            outputs,
            fatal: None,
        })
    }
}

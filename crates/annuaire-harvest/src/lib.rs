//! Annuaire Harvest - directory harvesting orchestration.
//!
//! This crate turns a `(keyword, location)` search on annuaire.sante.fr into
//! durable records. It submits the search form, walks the result pages,
//! extracts each profile, enriches it from the company registries and
//! appends it to a per-scope JSONL store before marking its RPPS number done.
//!
//! # Features
//!
//! - Resumable runs: identifiers already in the done-set are never re-scraped
//! - Crash safety: every record and every done mark is synced to disk
//! - Bounded retries per interaction and per profile
//! - Cooperative cancellation between pages and candidates
//! - Aggregated pretty JSON and spreadsheet-friendly CSV on every exit path
//!
//! # Example
//!
//! ```rust,no_run
//! use annuaire_core::AppConfig;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! let summary = annuaire_harvest::harvest(&config, CancellationToken::new()).await?;
//! println!("{}", summary.stats);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod address;
pub mod aggregate;
pub mod done_set;
#[allow(missing_docs)]
pub mod error;
pub mod orchestrator;
pub mod pager;
pub mod pipeline;
pub mod processor;
pub mod scope;
pub mod site;
pub mod store;

// Re-export commonly used types
pub use aggregate::{aggregate, AggregateOutputs};
pub use done_set::DoneSet;
pub use error::{HarvestError, Result};
pub use orchestrator::{Orchestrator, RunState, RunStatistics, RunSummary};
pub use pager::{CandidateSource, SearchPager};
pub use pipeline::harvest;
pub use processor::{
    ProcessedProfile, ProfileFailure, ProfileOutcome, ProfileProcessor, ProfileSource, SkipReason,
};
pub use scope::ScopePaths;
pub use site::SiteSelectors;
pub use store::RecordStore;

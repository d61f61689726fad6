//! runreport engine: classification and tallies over one test run's results
//!
//! The engine takes every result recorded for a (test run, project) scope and
//! derives two independent views:
//! - an anomaly classification: tests that failed on every host and context
//!   versus tests that failed only on some hosts
//! - a status tally per host and context with a scope-wide roll-up
//!
//! Everything here is an in-memory, single-pass batch computation. Fetching
//! results, rendering and delivery live in the notifier.

pub mod assembly;
pub mod cache;
pub mod classifier;
pub mod error;
pub mod grouping;
pub mod record;
pub mod status;
pub mod tally;

pub use assembly::{assemble, AnomalyReport, AnomalyRow, AnomalySection};
pub use cache::ReportCache;
pub use classifier::{classify, BucketKey, ClassifiedBucket, ClassifiedRow};
pub use error::EngineError;
pub use record::{RawResult, ResultSet, ResultTuple, Scope};
pub use status::{StatusCode, StatusCounts, TallyColumn};
pub use tally::{tally, TallyRow, TallyTable};

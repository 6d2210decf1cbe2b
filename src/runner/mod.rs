//! End-to-end suite execution: one generation per prospect, scored and
//! checked for critical failures, aggregated into suite statistics.

mod critical;
mod suite;
mod types;

pub use critical::{critical_failures, CTA_FLOOR, INTENT_FLOOR};
pub use suite::{classify_failure_patterns, SuiteRunner};
pub use types::{FailureKind, TestResult, TestSuiteResults};

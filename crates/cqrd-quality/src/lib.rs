//! Validation, link checking and metrics aggregation on top of the
//! remote quality source.
//!
//! Two error policies live here. Validation calls never fail: remote
//! trouble degrades to optimistic fallbacks so advisory checks do not
//! block anyone's publish. Metrics calls propagate [`QualityError`]
//! instead, since made-up numbers are worse than no numbers.

pub mod error;
pub mod keys;
pub mod links;
pub mod metrics;
pub mod types;
pub mod validate;

pub use error::QualityError;
pub use links::schedule_link_check;
pub use metrics::MetricsAggregator;
pub use validate::{default_rules, ValidationService};

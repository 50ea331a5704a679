//! Visibility-scoped search over the task and organization indices.
//!
//! The query builder adapts its match strategy to the store's live
//! schema: exact term matching against keyword sub-fields where the
//! mapping has them, fuzzy matching everywhere else. The visibility
//! filter restricts hits to tasks the caller owns and organizations the
//! caller belongs to.

mod mapping;
mod query;
mod service;
mod types;

pub use mapping::{MappingSummary, MappingSummaryCache};
pub use query::QueryContext;
pub use service::{SearchConfig, SearchError, SearchService};
pub use types::{DebugOutcome, SearchItem, SearchOutcome};

//! Output formatting consumed by the `torpedo` CLI: solve-summary metrics
//! as JSON, and per-torpedo run records as plain text.

pub mod runs;
pub mod summary;

pub use runs::format_runs;
pub use summary::{build_summary, ConflictSummary, SolveSummary};

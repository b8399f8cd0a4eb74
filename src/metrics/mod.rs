//! Prometheus request metrics
//!
//! Provides the request metrics collector, the summary engine it uses for
//! response times, and the process-level default metrics.

mod collector;
pub mod labels;
pub mod process;
pub mod summary;
mod traits;

pub use collector::{CONTENT_TYPE, RenderedMetrics, RequestMetrics};
pub use summary::{SummaryOpts, SummarySnapshot, SummaryVec};
pub use traits::{NoopObserver, RequestObserver};

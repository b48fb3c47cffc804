//! Stateful operators and drivers: per-partition processing units, the
//! per-route pipeline, and the application wiring every route to the
//! global registration and acknowledgment streams.

pub mod app;
pub mod route;
pub mod sink;
pub mod unit;

pub use app::PaginationApp;
pub use route::RoutePipeline;
pub use sink::{MemorySink, PublishedSummary, SinkError, SummarySink};
pub use unit::{
    AckOutcome, PartitionUnit, PipelineError, TrackedSummary, ACK_STORE_NAME, METADATA_STORE_NAME,
    PAGE_STORE_NAME, REGISTRATION_STORE_NAME, SUMMARY_STORE_NAME,
};

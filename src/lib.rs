//! Reassembly pipeline for oversized messages split into page records.
//!
//! Pages arrive on per-route input topics, are guarded against oversize,
//! re-keyed by pagination id through a repartition barrier, and folded
//! into a per-pagination summary that completes exactly once when every
//! page has been seen. State is reclaimed through a consensus protocol:
//! all registered downstream consumers must acknowledge a pagination id
//! before its entries are purged.

pub mod checkpoint;
pub mod codec;
pub mod diag;
pub mod extract;
pub mod guard;
pub mod headers;
pub mod model;
pub mod partition;
pub mod pipeline;
pub mod record;
pub mod route;
pub mod store;
pub mod sweep;

pub use checkpoint::{
    open, seal, CheckpointError, DirectorySnapshotSink, PersistedSnapshot, SnapshotSink,
    UnitSnapshot,
};
pub use codec::{Codec, CodecError, JsonCodec};
pub use diag::{DiagError, DiagEvent, DiagLevel, DiagLog, DiagRotationPolicy, DiagSegment};
pub use extract::{ExtractError, PageExtractor};
pub use guard::{
    GuardError, OversizeDrop, SizeCheck, SizeGuard, DEFAULT_MAX_MESSAGE_BYTES,
    MAX_MESSAGE_SIZE_ENV,
};
pub use headers::{composite_key, HeaderError, MessageHeaders, RecordHeaders};
pub use model::{
    ModelError, PageData, PageMetadata, PageObservation, PaginationData, PaginationStatus,
    PaginationSummary, UNKNOWN_TOTAL,
};
pub use partition::{hash_pagination_key, Repartitioner};
pub use pipeline::{
    AckOutcome, MemorySink, PaginationApp, PartitionUnit, PipelineError, PublishedSummary,
    RoutePipeline, SinkError, SummarySink, TrackedSummary, ACK_STORE_NAME, METADATA_STORE_NAME,
    PAGE_STORE_NAME, REGISTRATION_STORE_NAME, SUMMARY_STORE_NAME,
};
pub use record::{RawRecord, Record, RecordContext};
pub use route::{
    load_config, AppConfig, ConfigError, RouteConfig, RouteError, DEFAULT_ACK_TOPIC,
    DEFAULT_MAX_OPEN_MS, DEFAULT_REGISTRATION_TOPIC,
};
pub use store::{KeyValueStore, WindowStore};
pub use sweep::{SweepPolicy, SweptPagination};

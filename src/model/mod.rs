//! Domain entities for the reassembly pipeline: raw pages, per-page
//! metadata, and the per-pagination completion summary.

pub mod page;
pub mod summary;

pub use page::{ModelError, PageData, PageMetadata, PaginationData};
pub use summary::{PageObservation, PaginationStatus, PaginationSummary, UNKNOWN_TOTAL};

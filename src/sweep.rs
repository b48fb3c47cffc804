//! Stale-pagination sweep.
//!
//! Only the page store has time-bounded retention; summaries and the
//! registration/ack sets would otherwise leak forever for paginations
//! that never complete or are never fully acked. The sweep purges every
//! namespace for paginations whose summary has been idle past a ceiling,
//! keyed by the last-touched timestamp stored alongside the summary.

use serde::{Deserialize, Serialize};

/// Ceiling on how long an idle pagination may hold state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepPolicy {
    pub max_open_ms: u64,
}

impl SweepPolicy {
    pub fn new(max_open_ms: u64) -> Self {
        Self { max_open_ms }
    }
}

/// One pagination purged by a sweep pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweptPagination {
    pub pagination_id: String,
    pub idle_ms: u64,
}

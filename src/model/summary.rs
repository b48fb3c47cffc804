use crate::headers::MessageHeaders;
use serde::{Deserialize, Serialize};

/// Sentinel for totals that are unknown until the terminal page arrives.
pub const UNKNOWN_TOTAL: i64 = -1;

/// Lifecycle of a pagination summary. `Completed` is terminal for the
/// aggregator; the entry itself is destroyed later by the cleanup protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaginationStatus {
    Open,
    Completed,
}

/// Outcome of feeding one page event into a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageObservation {
    /// The page's composite key was appended to the summary.
    Recorded { completed_now: bool },
    /// The composite key was already referenced; redelivery is a no-op.
    Duplicate,
}

impl PageObservation {
    pub fn completed_now(self) -> bool {
        matches!(self, PageObservation::Recorded { completed_now: true })
    }
}

/// Running aggregate for one pagination id.
///
/// Totals start unknown (`-1`) and become fixed when a page carrying
/// `totalElements > 0` (the terminal page) is observed, regardless of where
/// in the sequence it arrives. Completion is monotone: once `Completed`,
/// the status never regresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationSummary {
    pub total_pages: i64,
    pub total_elements: i64,
    pub total_size: i64,
    pub status: PaginationStatus,
    pub references: Vec<String>,
}

impl PaginationSummary {
    /// Creates the summary for the first page observed for a pagination id.
    ///
    /// Handles the single-page case: a lone page that already carries its
    /// total count completes the summary immediately.
    pub fn first_page(headers: &MessageHeaders) -> Self {
        let (total_pages, total_elements) = if headers.is_terminal_page() {
            (headers.page_number, headers.total_elements)
        } else {
            (UNKNOWN_TOTAL, UNKNOWN_TOTAL)
        };
        let mut summary = Self {
            total_pages,
            total_elements,
            total_size: headers.key_size + headers.value_size,
            status: PaginationStatus::Open,
            references: vec![headers.composite_key.clone()],
        };
        summary.recompute_status();
        summary
    }

    /// Feeds a subsequent page event into the summary.
    ///
    /// References are deduplicated by composite key so broker redelivery
    /// can neither inflate the reference list nor double-count sizes.
    pub fn observe(&mut self, headers: &MessageHeaders) -> PageObservation {
        if self.references.iter().any(|r| r == &headers.composite_key) {
            return PageObservation::Duplicate;
        }
        self.references.push(headers.composite_key.clone());
        self.total_size += headers.key_size + headers.value_size;
        if headers.is_terminal_page() && self.total_pages == UNKNOWN_TOTAL {
            self.total_pages = headers.page_number;
            self.total_elements = headers.total_elements;
        }
        let was_completed = self.is_completed();
        self.recompute_status();
        PageObservation::Recorded {
            completed_now: !was_completed && self.is_completed(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == PaginationStatus::Completed
    }

    /// Completion fires exactly when the count of distinct pages received
    /// matches the now-known total, independent of arrival order.
    fn recompute_status(&mut self) {
        if self.is_completed() {
            return;
        }
        if self.total_pages != UNKNOWN_TOTAL && self.references.len() as i64 == self.total_pages {
            self.status = PaginationStatus::Completed;
        }
    }
}

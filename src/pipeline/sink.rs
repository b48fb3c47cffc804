use crate::model::PaginationSummary;
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

/// Error surfaced when publishing a completed summary fails.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to publish summary: {0}")]
    Publish(String),
}

/// Contract implemented by downstream publishers of completed summaries
/// (e.g. broker producers). Publishing may block on broker backpressure.
pub trait SummarySink {
    fn publish(
        &mut self,
        topic: &str,
        pagination_id: &str,
        summary: &PaginationSummary,
    ) -> Result<(), SinkError>;
}

/// One summary captured by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedSummary {
    pub topic: String,
    pub pagination_id: String,
    pub summary: PaginationSummary,
}

/// In-memory sink collecting published summaries.
#[derive(Debug, Default)]
pub struct MemorySink {
    published: Vec<PublishedSummary>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> &[PublishedSummary] {
        &self.published
    }
}

impl SummarySink for MemorySink {
    fn publish(
        &mut self,
        topic: &str,
        pagination_id: &str,
        summary: &PaginationSummary,
    ) -> Result<(), SinkError> {
        self.published.push(PublishedSummary {
            topic: topic.to_string(),
            pagination_id: pagination_id.to_string(),
            summary: summary.clone(),
        });
        Ok(())
    }
}

/// Lets callers keep a handle on a sink that the pipeline owns boxed.
impl SummarySink for Rc<RefCell<MemorySink>> {
    fn publish(
        &mut self,
        topic: &str,
        pagination_id: &str,
        summary: &PaginationSummary,
    ) -> Result<(), SinkError> {
        self.borrow_mut().publish(topic, pagination_id, summary)
    }
}

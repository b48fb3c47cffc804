use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors raised at entity construction, before any store write.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("field '{field}' cannot be empty")]
    EmptyField { field: &'static str },
    #[error("field '{field}' holds {value} but must not be negative")]
    NegativeField { field: &'static str, value: i64 },
}

/// Raw split payload of one page. Immutable once written to the page store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageData {
    #[serde(default)]
    pub key: Option<Vec<u8>>,
    #[serde(default)]
    pub value: Option<Vec<u8>>,
}

impl PageData {
    pub fn new(key: Option<Vec<u8>>, value: Option<Vec<u8>>) -> Self {
        Self { key, value }
    }

    pub fn key_len(&self) -> usize {
        self.key.as_ref().map(Vec::len).unwrap_or(0)
    }

    pub fn value_len(&self) -> usize {
        self.value.as_ref().map(Vec::len).unwrap_or(0)
    }
}

/// Descriptive metadata for one page, stored under the page's composite key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub topic: String,
    pub message_id: String,
    pub page_number: i64,
    pub offset: i64,
    pub partition: i64,
    pub key_size: i64,
    pub value_size: i64,
}

impl PageMetadata {
    /// Builds metadata, rejecting empty or negative fields up front.
    pub fn try_new(
        topic: impl Into<String>,
        message_id: impl Into<String>,
        page_number: i64,
        offset: i64,
        partition: i64,
        key_size: i64,
        value_size: i64,
    ) -> Result<Self, ModelError> {
        let metadata = Self {
            topic: topic.into(),
            message_id: message_id.into(),
            page_number,
            offset,
            partition,
            key_size,
            value_size,
        };
        require_non_empty("topic", &metadata.topic)?;
        require_non_empty("messageId", &metadata.message_id)?;
        require_non_negative("pageNumber", metadata.page_number)?;
        require_non_negative("offset", metadata.offset)?;
        require_non_negative("partition", metadata.partition)?;
        require_non_negative("keySize", metadata.key_size)?;
        require_non_negative("valueSize", metadata.value_size)?;
        Ok(metadata)
    }
}

/// Transient page + metadata pair forwarded from the metadata stage to the
/// summary aggregator. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationData {
    pub page: PageData,
    pub metadata: PageMetadata,
}

impl PaginationData {
    pub fn new(page: PageData, metadata: PageMetadata) -> Self {
        Self { page, metadata }
    }
}

fn require_non_empty(field: &'static str, value: &str) -> Result<(), ModelError> {
    if value.is_empty() {
        return Err(ModelError::EmptyField { field });
    }
    Ok(())
}

fn require_non_negative(field: &'static str, value: i64) -> Result<(), ModelError> {
    if value < 0 {
        return Err(ModelError::NegativeField { field, value });
    }
    Ok(())
}

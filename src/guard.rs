use crate::record::RawRecord;
use thiserror::Error;

/// Environment override for the maximum total record size.
pub const MAX_MESSAGE_SIZE_ENV: &str = "MAX_MESSAGE_SIZE";

/// Default limit, safely under the broker's 1 MiB per-record ceiling to
/// leave headroom for headers and serialization overhead.
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 900 * 1024;

/// Errors raised while resolving the size limit at startup.
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("{MAX_MESSAGE_SIZE_ENV} holds '{value}' which is not a byte count")]
    InvalidLimit { value: String },
}

/// Decision for a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeCheck {
    /// Record is within bounds and forwarded unchanged.
    Forward,
    /// Record exceeds the limit and is dropped before any state mutation.
    Dropped(OversizeDrop),
}

/// Sizes observed for a dropped record, surfaced through diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OversizeDrop {
    pub key_size: usize,
    pub value_size: usize,
    pub total_size: usize,
    pub limit: usize,
}

/// Pure filter rejecting oversized records ahead of the stateful stages.
#[derive(Debug, Clone, Copy)]
pub struct SizeGuard {
    max_bytes: usize,
}

impl SizeGuard {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    /// Resolves the limit once at startup from the environment override,
    /// falling back to [`DEFAULT_MAX_MESSAGE_BYTES`].
    pub fn from_env() -> Result<Self, GuardError> {
        match std::env::var(MAX_MESSAGE_SIZE_ENV) {
            Ok(value) => {
                let max_bytes = value
                    .parse::<usize>()
                    .map_err(|_| GuardError::InvalidLimit { value })?;
                Ok(Self::new(max_bytes))
            }
            Err(_) => Ok(Self::new(DEFAULT_MAX_MESSAGE_BYTES)),
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn check(&self, record: &RawRecord) -> SizeCheck {
        let key_size = record.key.as_ref().map(Vec::len).unwrap_or(0);
        let value_size = record.value.as_ref().map(Vec::len).unwrap_or(0);
        let total_size = key_size + value_size;
        if total_size > self.max_bytes {
            return SizeCheck::Dropped(OversizeDrop {
                key_size,
                value_size,
                total_size,
                limit: self.max_bytes,
            });
        }
        SizeCheck::Forward
    }
}

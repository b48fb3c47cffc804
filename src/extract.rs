use crate::codec::{Codec, CodecError};
use crate::headers::{self, composite_key, HeaderError};
use crate::model::PageData;
use crate::record::{RawRecord, Record, RecordContext};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised while extracting a page from a raw record. All variants
/// are record-local: the record is not forwarded and nothing is persisted.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Header(#[from] HeaderError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("record timestamp {timestamp_ms} is not a valid epoch instant")]
    InvalidTimestamp { timestamp_ms: i64 },
}

/// Derives the composite key, enriches the header envelope with broker
/// metadata and sizes, and re-keys the record by pagination id so the
/// repartition step groups all pages of one message together.
#[derive(Debug, Clone)]
pub struct PageExtractor<C> {
    codec: C,
}

impl<C: Codec<PageData>> PageExtractor<C> {
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    pub fn extract(
        &self,
        record: RawRecord,
        ctx: &RecordContext,
    ) -> Result<Record<String, PageData>, ExtractError> {
        let pagination_id = require_utf8_header(&record, headers::PAGINATION_ID)?;
        let message_id = require_utf8_header(&record, headers::MESSAGE_ID)?;

        let page = PageData::new(record.key.clone(), record.value.clone());
        let encoded = self.codec.encode(&page)?;
        let message_time = epoch_ms_to_instant(record.timestamp_ms)?;

        let original_key_size = record.key.as_ref().map(|k| k.len() as i64).unwrap_or(-1);
        let original_value_size = record.value.as_ref().map(|v| v.len() as i64).unwrap_or(-1);

        let mut enriched = record.headers.clone();
        enriched.add(headers::TOPIC, ctx.topic.as_bytes());
        enriched.add_integer(headers::PARTITION, ctx.partition);
        enriched.add_integer(headers::OFFSET, ctx.offset);
        enriched.add_instant(headers::MESSAGE_TIME, message_time);
        enriched.add_integer(headers::ORIGINAL_KEY_SIZE, original_key_size);
        enriched.add_integer(headers::ORIGINAL_VALUE_SIZE, original_value_size);
        // Outgoing key is the pagination id; outgoing value is the encoded page.
        enriched.add_integer(headers::PAGE_KEY_SIZE, pagination_id.len() as i64);
        enriched.add_integer(headers::PAGE_VALUE_SIZE, encoded.len() as i64);
        enriched.add(
            headers::COMPOSITE_KEY,
            composite_key(&pagination_id, &message_id).into_bytes(),
        );

        Ok(Record::new(
            pagination_id,
            page,
            record.timestamp_ms,
            enriched,
        ))
    }
}

fn require_utf8_header(record: &RawRecord, key: &'static str) -> Result<String, ExtractError> {
    record
        .headers
        .string(key)?
        .ok_or(HeaderError::MissingHeader { key })
        .map_err(ExtractError::from)
        .and_then(|value| {
            if value.is_empty() {
                return Err(HeaderError::EmptyField { field: key }.into());
            }
            Ok(value)
        })
}

fn epoch_ms_to_instant(timestamp_ms: i64) -> Result<DateTime<Utc>, ExtractError> {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .ok_or(ExtractError::InvalidTimestamp { timestamp_ms })
}

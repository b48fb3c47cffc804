use crate::headers::RecordHeaders;

/// Broker-assigned position of the record being processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordContext {
    pub topic: String,
    pub partition: i64,
    pub offset: i64,
}

impl RecordContext {
    pub fn new(topic: impl Into<String>, partition: i64, offset: i64) -> Self {
        Self {
            topic: topic.into(),
            partition,
            offset,
        }
    }
}

/// A record flowing between pipeline stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<K, V> {
    pub key: K,
    pub value: V,
    pub timestamp_ms: i64,
    pub headers: RecordHeaders,
}

impl<K, V> Record<K, V> {
    pub fn new(key: K, value: V, timestamp_ms: i64, headers: RecordHeaders) -> Self {
        Self {
            key,
            value,
            timestamp_ms,
            headers,
        }
    }

    /// Rebinds the record to a new key, keeping value, timestamp and headers.
    pub fn with_key<K2>(self, key: K2) -> Record<K2, V> {
        Record {
            key,
            value: self.value,
            timestamp_ms: self.timestamp_ms,
            headers: self.headers,
        }
    }

    /// Rebinds the record to a new value, keeping key, timestamp and headers.
    pub fn with_value<V2>(self, value: V2) -> Record<K, V2> {
        Record {
            key: self.key,
            value,
            timestamp_ms: self.timestamp_ms,
            headers: self.headers,
        }
    }
}

/// Raw input record as consumed from the broker: optional byte key/value.
pub type RawRecord = Record<Option<Vec<u8>>, Option<Vec<u8>>>;

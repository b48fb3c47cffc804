use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

pub const ORIGIN: &str = "ORIGIN";
pub const PAGINATION_ID: &str = "PAGINATION_ID";
pub const MESSAGE_ID: &str = "MESSAGE_ID";
pub const COMPOSITE_KEY: &str = "COMPOSITE_KEY";
pub const TOTAL_ELEMENTS: &str = "TOTAL_ELEMENTS";
pub const PAGE_SIZE: &str = "PAGE_SIZE";
pub const PAGE_NUMBER: &str = "PAGE_NUMBER";
pub const TOPIC: &str = "TOPIC";
pub const OFFSET: &str = "OFFSET";
pub const PARTITION: &str = "PARTITION";
pub const MESSAGE_TIME: &str = "MESSAGE_TIME";
pub const PAGE_KEY_SIZE: &str = "KEY_SIZE";
pub const PAGE_VALUE_SIZE: &str = "VALUE_SIZE";
pub const ORIGINAL_KEY_SIZE: &str = "ORIGINAL_KEY_SIZE";
pub const ORIGINAL_VALUE_SIZE: &str = "ORIGINAL_VALUE_SIZE";

/// Separator between the pagination id and the message id in a composite key.
pub const COMPOSITE_KEY_SEPARATOR: char = '@';

/// Builds the composite key uniquely identifying one page of a pagination.
pub fn composite_key(pagination_id: &str, message_id: &str) -> String {
    format!("{pagination_id}{COMPOSITE_KEY_SEPARATOR}{message_id}")
}

/// Errors surfaced while reading or validating record headers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeaderError {
    #[error("required header '{key}' is missing")]
    MissingHeader { key: &'static str },
    #[error("header '{key}' is not valid UTF-8")]
    NotUtf8 { key: &'static str },
    #[error("header '{key}' holds '{value}' which is not a decimal integer")]
    InvalidInteger { key: &'static str, value: String },
    #[error("header '{key}' holds '{value}' which is not an ISO-8601 instant")]
    InvalidInstant { key: &'static str, value: String },
    #[error("field '{field}' cannot be empty")]
    EmptyField { field: &'static str },
    #[error("field '{field}' holds {value} but must be at least {min}")]
    FieldBelowMinimum {
        field: &'static str,
        value: i64,
        min: i64,
    },
}

/// Out-of-band header bag attached to every record.
///
/// Values are UTF-8 string encodings; lookups resolve to the last value
/// written for a key, matching the broker's header semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordHeaders {
    entries: Vec<(String, Vec<u8>)>,
}

impl RecordHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a raw header value.
    pub fn add(&mut self, key: &str, value: impl Into<Vec<u8>>) {
        self.entries.push((key.to_string(), value.into()));
    }

    /// Appends a decimal-encoded integer header.
    pub fn add_integer(&mut self, key: &str, value: i64) {
        self.add(key, value.to_string().into_bytes());
    }

    /// Appends an ISO-8601 instant header.
    pub fn add_instant(&mut self, key: &str, value: DateTime<Utc>) {
        self.add(
            key,
            value
                .to_rfc3339_opts(SecondsFormat::Millis, true)
                .into_bytes(),
        );
    }

    /// Last raw value written for `key`, if any.
    pub fn last(&self, key: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    /// Last value for `key` decoded as UTF-8; absent header resolves to `None`.
    pub fn string(&self, key: &'static str) -> Result<Option<String>, HeaderError> {
        match self.last(key) {
            Some(raw) => std::str::from_utf8(raw)
                .map(|s| Some(s.to_string()))
                .map_err(|_| HeaderError::NotUtf8 { key }),
            None => Ok(None),
        }
    }

    /// Last value for `key` as a decimal integer; absent header resolves to `-1`.
    pub fn integer(&self, key: &'static str) -> Result<i64, HeaderError> {
        match self.string(key)? {
            Some(value) => value
                .parse::<i64>()
                .map_err(|_| HeaderError::InvalidInteger { key, value }),
            None => Ok(-1),
        }
    }

    /// Last value for `key` as an ISO-8601 instant; absent header resolves to `None`.
    pub fn instant(&self, key: &'static str) -> Result<Option<DateTime<Utc>>, HeaderError> {
        match self.string(key)? {
            Some(value) => DateTime::parse_from_rfc3339(&value)
                .map(|parsed| Some(parsed.with_timezone(&Utc)))
                .map_err(|_| HeaderError::InvalidInstant { key, value }),
            None => Ok(None),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Enriched header envelope reconstructed from wire headers at every hop.
///
/// Never persisted as its own entity; stores only keep its derived fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeaders {
    pub origin: String,
    pub pagination_id: String,
    pub message_id: String,
    pub composite_key: String,
    pub topic: String,
    pub offset: i64,
    pub partition: i64,
    pub message_time: DateTime<Utc>,
    pub total_elements: i64,
    pub page_size: i64,
    pub page_number: i64,
    pub key_size: i64,
    pub value_size: i64,
    pub original_key_size: i64,
    pub original_value_size: i64,
}

impl MessageHeaders {
    /// Reconstructs and validates the envelope from a record's headers.
    pub fn from_headers(headers: &RecordHeaders) -> Result<Self, HeaderError> {
        let parsed = Self {
            origin: required_string(headers, ORIGIN)?,
            pagination_id: required_string(headers, PAGINATION_ID)?,
            message_id: required_string(headers, MESSAGE_ID)?,
            composite_key: required_string(headers, COMPOSITE_KEY)?,
            topic: required_string(headers, TOPIC)?,
            offset: headers.integer(OFFSET)?,
            partition: headers.integer(PARTITION)?,
            message_time: headers
                .instant(MESSAGE_TIME)?
                .ok_or(HeaderError::MissingHeader { key: MESSAGE_TIME })?,
            total_elements: headers.integer(TOTAL_ELEMENTS)?,
            page_size: headers.integer(PAGE_SIZE)?,
            page_number: headers.integer(PAGE_NUMBER)?,
            key_size: headers.integer(PAGE_KEY_SIZE)?,
            value_size: headers.integer(PAGE_VALUE_SIZE)?,
            original_key_size: headers.integer(ORIGINAL_KEY_SIZE)?,
            original_value_size: headers.integer(ORIGINAL_VALUE_SIZE)?,
        };
        parsed.validate()?;
        Ok(parsed)
    }

    fn validate(&self) -> Result<(), HeaderError> {
        require_min("offset", self.offset, 0)?;
        require_min("partition", self.partition, 0)?;
        require_min("pageNumber", self.page_number, 0)?;
        require_min("keySize", self.key_size, 0)?;
        require_min("valueSize", self.value_size, 0)?;
        // Unknown counts and absent original sizes are carried as -1.
        require_min("totalElements", self.total_elements, -1)?;
        require_min("pageSize", self.page_size, -1)?;
        require_min("originalKeySize", self.original_key_size, -1)?;
        require_min("originalValueSize", self.original_value_size, -1)?;
        Ok(())
    }

    /// Writes every envelope field back onto a header bag, e.g. when
    /// forwarding a page to a downstream topic.
    pub fn apply_to(&self, headers: &mut RecordHeaders) {
        headers.add(ORIGIN, self.origin.as_bytes());
        headers.add(PAGINATION_ID, self.pagination_id.as_bytes());
        headers.add(MESSAGE_ID, self.message_id.as_bytes());
        headers.add(COMPOSITE_KEY, self.composite_key.as_bytes());
        headers.add(TOPIC, self.topic.as_bytes());
        headers.add_integer(OFFSET, self.offset);
        headers.add_integer(PARTITION, self.partition);
        headers.add_instant(MESSAGE_TIME, self.message_time);
        headers.add_integer(TOTAL_ELEMENTS, self.total_elements);
        headers.add_integer(PAGE_SIZE, self.page_size);
        headers.add_integer(PAGE_NUMBER, self.page_number);
        headers.add_integer(PAGE_KEY_SIZE, self.key_size);
        headers.add_integer(PAGE_VALUE_SIZE, self.value_size);
        headers.add_integer(ORIGINAL_KEY_SIZE, self.original_key_size);
        headers.add_integer(ORIGINAL_VALUE_SIZE, self.original_value_size);
    }

    /// True when this page declares itself the terminal page of its pagination.
    pub fn is_terminal_page(&self) -> bool {
        self.total_elements > 0
    }
}

fn required_string(headers: &RecordHeaders, key: &'static str) -> Result<String, HeaderError> {
    let value = headers
        .string(key)?
        .ok_or(HeaderError::MissingHeader { key })?;
    if value.is_empty() {
        return Err(HeaderError::EmptyField { field: key });
    }
    Ok(value)
}

fn require_min(field: &'static str, value: i64, min: i64) -> Result<(), HeaderError> {
    if value < min {
        return Err(HeaderError::FieldBelowMinimum { field, value, min });
    }
    Ok(())
}

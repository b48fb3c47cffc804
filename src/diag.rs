use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;

/// Severity attached to each diagnostic line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiagLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl DiagLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagLevel::Debug => "DEBUG",
            DiagLevel::Info => "INFO",
            DiagLevel::Warn => "WARN",
            DiagLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for DiagLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed diagnostic events emitted by the pipeline. Dropped and failed
/// records are observable only through these; no synchronous caller
/// exists to receive an error code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DiagEvent {
    OversizeDrop {
        topic: String,
        key_size: usize,
        value_size: usize,
        total_size: usize,
        limit: usize,
    },
    RecordFailed {
        topic: String,
        reason: String,
    },
    RegistrationAdded {
        pagination_id: String,
        consumer_id: String,
    },
    AckReceived {
        pagination_id: String,
        consumer_id: String,
    },
    UnregisteredAck {
        pagination_id: String,
        consumer_id: String,
    },
    AwaitingAcks {
        pagination_id: String,
        acked: usize,
        registered: usize,
    },
    PaginationCompleted {
        pagination_id: String,
        total_pages: i64,
        total_size: i64,
    },
    CleanupCompleted {
        pagination_id: String,
        references_deleted: usize,
    },
    SummaryMissingAtCleanup {
        pagination_id: String,
    },
    SweepExpired {
        pagination_id: String,
        idle_ms: u64,
    },
}

impl DiagEvent {
    pub fn level(&self) -> DiagLevel {
        match self {
            DiagEvent::OversizeDrop { .. } | DiagEvent::RecordFailed { .. } => DiagLevel::Error,
            DiagEvent::UnregisteredAck { .. } | DiagEvent::SummaryMissingAtCleanup { .. } => {
                DiagLevel::Warn
            }
            DiagEvent::AwaitingAcks { .. } => DiagLevel::Debug,
            _ => DiagLevel::Info,
        }
    }
}

/// Rotation policy bounding retained diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagRotationPolicy {
    pub max_bytes: usize,
    pub max_segments: usize,
}

impl Default for DiagRotationPolicy {
    fn default() -> Self {
        Self {
            max_bytes: 1 << 20,
            max_segments: 8,
        }
    }
}

/// Lines accumulated for one rotated segment.
#[derive(Debug, Default, Clone)]
pub struct DiagSegment {
    lines: Vec<String>,
    bytes_written: usize,
}

impl DiagSegment {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }
}

/// Errors surfaced while serializing diagnostic lines.
#[derive(Debug, Error)]
pub enum DiagError {
    #[error("failed to serialize diagnostic record: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct DiagLine<'a> {
    ts: u64,
    level: &'static str,
    #[serde(flatten)]
    event: &'a DiagEvent,
}

/// JSON-line diagnostics log with a level filter and byte-bounded rotation.
#[derive(Debug, Clone)]
pub struct DiagLog {
    policy: DiagRotationPolicy,
    min_level: DiagLevel,
    segments: VecDeque<DiagSegment>,
    active: DiagSegment,
}

impl Default for DiagLog {
    fn default() -> Self {
        Self::new(DiagRotationPolicy::default())
    }
}

impl DiagLog {
    pub fn new(policy: DiagRotationPolicy) -> Self {
        Self {
            policy,
            min_level: DiagLevel::Debug,
            segments: VecDeque::new(),
            active: DiagSegment::default(),
        }
    }

    pub fn level(&self) -> DiagLevel {
        self.min_level
    }

    pub fn set_level(&mut self, level: DiagLevel) {
        self.min_level = level;
    }

    /// Records a diagnostic event as one JSON line.
    pub fn record(&mut self, ts_ms: u64, event: &DiagEvent) -> Result<(), DiagError> {
        if event.level() < self.min_level {
            return Ok(());
        }
        let line = serde_json::to_string(&DiagLine {
            ts: ts_ms,
            level: event.level().as_str(),
            event,
        })?;
        self.rotate_if_needed(line.len());
        self.active.bytes_written += line.len();
        self.active.lines.push(line);
        Ok(())
    }

    /// Rotated history, oldest first, followed by the active segment.
    pub fn segments(&self) -> impl Iterator<Item = &DiagSegment> {
        self.segments.iter().chain(std::iter::once(&self.active))
    }

    /// All retained lines, oldest first.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.segments()
            .flat_map(|segment| segment.lines.iter().map(String::as_str))
    }

    fn rotate_if_needed(&mut self, next_line_len: usize) {
        if self.active.bytes_written + next_line_len <= self.policy.max_bytes {
            return;
        }
        if !self.active.lines.is_empty() {
            self.segments.push_back(std::mem::take(&mut self.active));
            while self.segments.len() > self.policy.max_segments {
                self.segments.pop_front();
            }
        }
        self.active = DiagSegment::default();
    }
}

use crate::codec::CodecError;
use crate::diag::{DiagError, DiagEvent, DiagLog};
use crate::extract::ExtractError;
use crate::headers::{HeaderError, MessageHeaders};
use crate::model::{ModelError, PageData, PageMetadata, PaginationData, PaginationSummary};
use crate::pipeline::sink::SinkError;
use crate::record::Record;
use crate::store::{KeyValueStore, WindowStore};
use crate::sweep::{SweepPolicy, SweptPagination};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

pub const PAGE_STORE_NAME: &str = "pagination-page-store";
pub const METADATA_STORE_NAME: &str = "pagination-metadata-store";
pub const SUMMARY_STORE_NAME: &str = "pagination-summary-store";
pub const REGISTRATION_STORE_NAME: &str = "pagination-registrations-store";
pub const ACK_STORE_NAME: &str = "pagination-acks-store";

/// Errors surfaced by pipeline stages.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Header(#[from] HeaderError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Diag(#[from] DiagError),
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error("no route is configured for input topic '{topic}'")]
    UnknownInput { topic: String },
}

impl PipelineError {
    /// Record-local failures halt one record without being fatal to the
    /// processing unit.
    pub fn is_record_local(&self) -> bool {
        matches!(
            self,
            PipelineError::Header(_) | PipelineError::Model(_) | PipelineError::Extract(_)
        )
    }
}

/// Summary plus the last-touched timestamp driving the stale sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedSummary {
    pub summary: PaginationSummary,
    pub last_touched_ms: u64,
}

/// Result of handling one acknowledgment event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// No consumer ever registered for the pagination id; the ack was
    /// recorded but consensus cannot be evaluated.
    Unregistered,
    /// Some registered consumers have not acked yet.
    Pending { acked: usize, registered: usize },
    /// Consensus reached; all five namespaces were purged.
    CleanedUp { references_deleted: usize },
    /// Consensus reached but the summary was already gone; the ack and
    /// registration sets were cleared and everything else left untouched.
    AlreadyClean,
}

/// One processing unit: exclusive owner of the five state namespaces for
/// its share of the pagination-id key space. Records are handled one at a
/// time, giving serializable updates without locks.
#[derive(Debug, Clone)]
pub struct PartitionUnit {
    partition: usize,
    pages: WindowStore<PageData>,
    metadata: KeyValueStore<PageMetadata>,
    summaries: KeyValueStore<TrackedSummary>,
    registrations: KeyValueStore<BTreeSet<String>>,
    acks: KeyValueStore<BTreeSet<String>>,
}

impl PartitionUnit {
    pub fn new(partition: usize, retention_ms: u64, window_ms: u64, retain_duplicates: bool) -> Self {
        Self {
            partition,
            pages: WindowStore::new(PAGE_STORE_NAME, retention_ms, window_ms, retain_duplicates),
            metadata: KeyValueStore::new(METADATA_STORE_NAME),
            summaries: KeyValueStore::new(SUMMARY_STORE_NAME),
            registrations: KeyValueStore::new(REGISTRATION_STORE_NAME),
            acks: KeyValueStore::new(ACK_STORE_NAME),
        }
    }

    pub fn partition(&self) -> usize {
        self.partition
    }

    /// Runs one extracted page through the page, metadata, and summary
    /// stages. Returns the summary when this page completed it.
    pub fn apply_page(
        &mut self,
        record: Record<String, PageData>,
        now_ms: u64,
        diag: &mut DiagLog,
    ) -> Result<Option<PaginationSummary>, PipelineError> {
        let record = self.store_page(record, now_ms)?;
        let record = self.store_metadata(record)?;
        self.aggregate(record, now_ms, diag)
    }

    /// Page stage: stores the raw payload under the composite key and
    /// forwards the record re-keyed by that composite key. The window
    /// bounds storage for paginations that never complete.
    pub fn store_page(
        &mut self,
        record: Record<String, PageData>,
        now_ms: u64,
    ) -> Result<Record<String, PageData>, PipelineError> {
        let headers = MessageHeaders::from_headers(&record.headers)?;
        self.pages
            .put(headers.composite_key.clone(), record.value.clone(), now_ms);
        Ok(record.with_key(headers.composite_key))
    }

    /// Metadata stage: persists validated per-page metadata under the
    /// composite key and forwards the page + metadata pair.
    pub fn store_metadata(
        &mut self,
        record: Record<String, PageData>,
    ) -> Result<Record<String, PaginationData>, PipelineError> {
        let headers = MessageHeaders::from_headers(&record.headers)?;
        let metadata = PageMetadata::try_new(
            headers.topic,
            headers.message_id,
            headers.page_number,
            headers.offset,
            headers.partition,
            headers.key_size,
            headers.value_size,
        )?;
        self.metadata
            .put(headers.composite_key, metadata.clone());
        let page = record.value.clone();
        Ok(record.with_value(PaginationData::new(page, metadata)))
    }

    /// Summary stage: creates or advances the per-pagination aggregate,
    /// keyed by pagination id. Returns the summary the first time it
    /// reaches `Completed`; already-completed summaries are never
    /// re-emitted.
    pub fn aggregate(
        &mut self,
        record: Record<String, PaginationData>,
        now_ms: u64,
        diag: &mut DiagLog,
    ) -> Result<Option<PaginationSummary>, PipelineError> {
        let headers = MessageHeaders::from_headers(&record.headers)?;
        let pagination_id = headers.pagination_id.clone();

        let completed = match self.summaries.get_mut(&pagination_id) {
            None => {
                let summary = PaginationSummary::first_page(&headers);
                let completed = summary.is_completed().then(|| summary.clone());
                self.summaries.put(
                    pagination_id.clone(),
                    TrackedSummary {
                        summary,
                        last_touched_ms: now_ms,
                    },
                );
                completed
            }
            Some(tracked) => {
                let observation = tracked.summary.observe(&headers);
                tracked.last_touched_ms = now_ms;
                observation
                    .completed_now()
                    .then(|| tracked.summary.clone())
            }
        };

        if let Some(summary) = &completed {
            diag.record(
                now_ms,
                &DiagEvent::PaginationCompleted {
                    pagination_id,
                    total_pages: summary.total_pages,
                    total_size: summary.total_size,
                },
            )?;
        }
        Ok(completed)
    }

    /// Registers a downstream consumer's interest: read current set
    /// (default empty), add the consumer id, write back.
    pub fn apply_registration(
        &mut self,
        pagination_id: &str,
        consumer_id: &str,
        now_ms: u64,
        diag: &mut DiagLog,
    ) -> Result<(), PipelineError> {
        match self.registrations.get_mut(pagination_id) {
            Some(consumers) => {
                consumers.insert(consumer_id.to_string());
            }
            None => {
                let mut consumers = BTreeSet::new();
                consumers.insert(consumer_id.to_string());
                self.registrations.put(pagination_id, consumers);
            }
        }
        diag.record(
            now_ms,
            &DiagEvent::RegistrationAdded {
                pagination_id: pagination_id.to_string(),
                consumer_id: consumer_id.to_string(),
            },
        )?;
        Ok(())
    }

    /// Records an acknowledgment and evaluates the cleanup consensus.
    ///
    /// Cleanup fires once every registered consumer has acked. Acks from
    /// consumers that never registered are recorded and logged but do not
    /// count toward (or against) the consensus.
    pub fn apply_ack(
        &mut self,
        pagination_id: &str,
        consumer_id: &str,
        now_ms: u64,
        diag: &mut DiagLog,
    ) -> Result<AckOutcome, PipelineError> {
        match self.acks.get_mut(pagination_id) {
            Some(consumers) => {
                consumers.insert(consumer_id.to_string());
            }
            None => {
                let mut consumers = BTreeSet::new();
                consumers.insert(consumer_id.to_string());
                self.acks.put(pagination_id, consumers);
            }
        }
        diag.record(
            now_ms,
            &DiagEvent::AckReceived {
                pagination_id: pagination_id.to_string(),
                consumer_id: consumer_id.to_string(),
            },
        )?;

        let registered = match self.registrations.get(pagination_id) {
            Some(consumers) if !consumers.is_empty() => consumers,
            _ => {
                diag.record(
                    now_ms,
                    &DiagEvent::UnregisteredAck {
                        pagination_id: pagination_id.to_string(),
                        consumer_id: consumer_id.to_string(),
                    },
                )?;
                return Ok(AckOutcome::Unregistered);
            }
        };

        if !registered.contains(consumer_id) {
            diag.record(
                now_ms,
                &DiagEvent::UnregisteredAck {
                    pagination_id: pagination_id.to_string(),
                    consumer_id: consumer_id.to_string(),
                },
            )?;
        }

        let acked = self
            .acks
            .get(pagination_id)
            .expect("ack set was written above");
        if registered.is_subset(acked) {
            return self.cleanup(pagination_id, now_ms, diag);
        }
        let outcome = AckOutcome::Pending {
            acked: acked.intersection(registered).count(),
            registered: registered.len(),
        };
        if let AckOutcome::Pending { acked, registered } = outcome {
            diag.record(
                now_ms,
                &DiagEvent::AwaitingAcks {
                    pagination_id: pagination_id.to_string(),
                    acked,
                    registered,
                },
            )?;
        }
        Ok(outcome)
    }

    /// Purges every namespace for a pagination id once consensus holds.
    /// Idempotent: with the summary already gone, only the ack and
    /// registration sets are cleared.
    fn cleanup(
        &mut self,
        pagination_id: &str,
        now_ms: u64,
        diag: &mut DiagLog,
    ) -> Result<AckOutcome, PipelineError> {
        let Some(tracked) = self.summaries.delete(pagination_id) else {
            self.acks.delete(pagination_id);
            self.registrations.delete(pagination_id);
            diag.record(
                now_ms,
                &DiagEvent::SummaryMissingAtCleanup {
                    pagination_id: pagination_id.to_string(),
                },
            )?;
            return Ok(AckOutcome::AlreadyClean);
        };

        for reference in &tracked.summary.references {
            self.metadata.delete(reference);
            self.pages.delete(reference);
        }
        self.acks.delete(pagination_id);
        self.registrations.delete(pagination_id);
        diag.record(
            now_ms,
            &DiagEvent::CleanupCompleted {
                pagination_id: pagination_id.to_string(),
                references_deleted: tracked.summary.references.len(),
            },
        )?;
        Ok(AckOutcome::CleanedUp {
            references_deleted: tracked.summary.references.len(),
        })
    }

    /// Purges paginations idle longer than the policy allows and reclaims
    /// aged-out page entries. Covers paginations that will never complete
    /// as well as completed ones whose consumers never all acked.
    pub fn sweep(
        &mut self,
        policy: SweepPolicy,
        now_ms: u64,
        diag: &mut DiagLog,
    ) -> Result<Vec<SweptPagination>, PipelineError> {
        let stale: Vec<(String, u64)> = self
            .summaries
            .iter()
            .filter_map(|(pagination_id, tracked)| {
                let idle_ms = now_ms.saturating_sub(tracked.last_touched_ms);
                (idle_ms >= policy.max_open_ms).then(|| (pagination_id.clone(), idle_ms))
            })
            .collect();

        let mut swept = Vec::with_capacity(stale.len());
        for (pagination_id, idle_ms) in stale {
            if let Some(tracked) = self.summaries.delete(&pagination_id) {
                for reference in &tracked.summary.references {
                    self.metadata.delete(reference);
                    self.pages.delete(reference);
                }
            }
            self.acks.delete(&pagination_id);
            self.registrations.delete(&pagination_id);
            diag.record(
                now_ms,
                &DiagEvent::SweepExpired {
                    pagination_id: pagination_id.clone(),
                    idle_ms,
                },
            )?;
            swept.push(SweptPagination {
                pagination_id,
                idle_ms,
            });
        }
        self.pages.advance(now_ms);
        Ok(swept)
    }

    pub fn pages(&self) -> &WindowStore<PageData> {
        &self.pages
    }

    pub fn metadata(&self) -> &KeyValueStore<PageMetadata> {
        &self.metadata
    }

    pub fn summaries(&self) -> &KeyValueStore<TrackedSummary> {
        &self.summaries
    }

    pub fn registrations(&self) -> &KeyValueStore<BTreeSet<String>> {
        &self.registrations
    }

    pub fn acks(&self) -> &KeyValueStore<BTreeSet<String>> {
        &self.acks
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        usize,
        WindowStore<PageData>,
        KeyValueStore<PageMetadata>,
        KeyValueStore<TrackedSummary>,
        KeyValueStore<BTreeSet<String>>,
        KeyValueStore<BTreeSet<String>>,
    ) {
        (
            self.partition,
            self.pages,
            self.metadata,
            self.summaries,
            self.registrations,
            self.acks,
        )
    }

    pub(crate) fn from_parts(
        partition: usize,
        pages: WindowStore<PageData>,
        metadata: KeyValueStore<PageMetadata>,
        summaries: KeyValueStore<TrackedSummary>,
        registrations: KeyValueStore<BTreeSet<String>>,
        acks: KeyValueStore<BTreeSet<String>>,
    ) -> Self {
        Self {
            partition,
            pages,
            metadata,
            summaries,
            registrations,
            acks,
        }
    }
}

use crate::codec::Codec;
use crate::diag::{DiagEvent, DiagLog};
use crate::extract::PageExtractor;
use crate::guard::{SizeCheck, SizeGuard};
use crate::model::{PageData, PaginationSummary};
use crate::partition::Repartitioner;
use crate::pipeline::sink::SummarySink;
use crate::pipeline::unit::{AckOutcome, PartitionUnit, PipelineError};
use crate::record::{RawRecord, RecordContext};
use crate::route::{RouteConfig, RouteError};
use crate::sweep::{SweepPolicy, SweptPagination};

/// One reassembly route: size guard and extractor ahead of the
/// repartition barrier, then one processing unit per partition, each
/// owning its own state namespaces.
pub struct RoutePipeline<C> {
    config: RouteConfig,
    guard: SizeGuard,
    extractor: PageExtractor<C>,
    repartitioner: Repartitioner,
    units: Vec<PartitionUnit>,
    sink: Box<dyn SummarySink>,
}

impl<C: Codec<PageData>> RoutePipeline<C> {
    pub fn new(
        config: RouteConfig,
        guard: SizeGuard,
        codec: C,
        sink: Box<dyn SummarySink>,
    ) -> Result<Self, RouteError> {
        config.validate()?;
        let units = (0..config.repartitions)
            .map(|partition| {
                PartitionUnit::new(
                    partition,
                    config.retention_ms,
                    config.window_ms,
                    config.retain_duplicates,
                )
            })
            .collect();
        Ok(Self {
            repartitioner: Repartitioner::new(config.repartitions),
            config,
            guard,
            extractor: PageExtractor::new(codec),
            units,
            sink,
        })
    }

    pub fn config(&self) -> &RouteConfig {
        &self.config
    }

    /// Runs one raw input record through the route. Oversized and
    /// malformed records are dropped with a diagnostic; a completed
    /// summary is published to the output topic and returned.
    pub fn process_record(
        &mut self,
        raw: RawRecord,
        ctx: &RecordContext,
        now_ms: u64,
        diag: &mut DiagLog,
    ) -> Result<Option<PaginationSummary>, PipelineError> {
        if let SizeCheck::Dropped(drop) = self.guard.check(&raw) {
            diag.record(
                now_ms,
                &DiagEvent::OversizeDrop {
                    topic: ctx.topic.clone(),
                    key_size: drop.key_size,
                    value_size: drop.value_size,
                    total_size: drop.total_size,
                    limit: drop.limit,
                },
            )?;
            return Ok(None);
        }

        let extracted = match self.extractor.extract(raw, ctx) {
            Ok(record) => record,
            Err(err) => {
                diag.record(
                    now_ms,
                    &DiagEvent::RecordFailed {
                        topic: ctx.topic.clone(),
                        reason: err.to_string(),
                    },
                )?;
                return Ok(None);
            }
        };

        let pagination_id = extracted.key.clone();
        let unit = &mut self.units[self.repartitioner.partition_for(&pagination_id)];
        match unit.apply_page(extracted, now_ms, diag) {
            Ok(Some(summary)) => {
                self.sink
                    .publish(&self.config.output, &pagination_id, &summary)?;
                Ok(Some(summary))
            }
            Ok(None) => Ok(None),
            Err(err) if err.is_record_local() => {
                diag.record(
                    now_ms,
                    &DiagEvent::RecordFailed {
                        topic: ctx.topic.clone(),
                        reason: err.to_string(),
                    },
                )?;
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    pub fn process_registration(
        &mut self,
        pagination_id: &str,
        consumer_id: &str,
        now_ms: u64,
        diag: &mut DiagLog,
    ) -> Result<(), PipelineError> {
        self.unit_for_mut(pagination_id)
            .apply_registration(pagination_id, consumer_id, now_ms, diag)
    }

    pub fn process_ack(
        &mut self,
        pagination_id: &str,
        consumer_id: &str,
        now_ms: u64,
        diag: &mut DiagLog,
    ) -> Result<AckOutcome, PipelineError> {
        self.unit_for_mut(pagination_id)
            .apply_ack(pagination_id, consumer_id, now_ms, diag)
    }

    /// Sweeps every unit, returning the purged paginations.
    pub fn sweep(
        &mut self,
        policy: SweepPolicy,
        now_ms: u64,
        diag: &mut DiagLog,
    ) -> Result<Vec<SweptPagination>, PipelineError> {
        let mut swept = Vec::new();
        for unit in &mut self.units {
            swept.extend(unit.sweep(policy, now_ms, diag)?);
        }
        Ok(swept)
    }

    pub fn units(&self) -> &[PartitionUnit] {
        &self.units
    }

    pub fn unit_for(&self, pagination_id: &str) -> &PartitionUnit {
        &self.units[self.repartitioner.partition_for(pagination_id)]
    }

    /// Replaces a unit with one rebuilt from a restored snapshot, e.g.
    /// after reprocessing from the last committed offset.
    pub fn restore_unit(&mut self, unit: PartitionUnit) {
        let partition = unit.partition();
        self.units[partition] = unit;
    }

    pub(crate) fn unit_for_mut(&mut self, pagination_id: &str) -> &mut PartitionUnit {
        &mut self.units[self.repartitioner.partition_for(pagination_id)]
    }
}

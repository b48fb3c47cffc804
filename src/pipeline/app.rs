use crate::codec::Codec;
use crate::diag::DiagLog;
use crate::guard::SizeGuard;
use crate::model::{PageData, PaginationSummary};
use crate::pipeline::route::RoutePipeline;
use crate::pipeline::sink::SummarySink;
use crate::pipeline::unit::{AckOutcome, PipelineError};
use crate::record::{RawRecord, RecordContext};
use crate::route::{AppConfig, ConfigError, RouteConfig};
use crate::sweep::{SweepPolicy, SweptPagination};

/// The whole application: every configured reassembly route plus the
/// global registration and acknowledgment streams feeding the cleanup
/// consensus.
pub struct PaginationApp<C> {
    registration_topic: String,
    ack_topic: String,
    sweep_policy: SweepPolicy,
    routes: Vec<RoutePipeline<C>>,
    diag: DiagLog,
}

impl<C: Codec<PageData> + Clone> PaginationApp<C> {
    /// Builds the app from validated configuration. The codec is the
    /// process-wide instance handed to every route; `make_sink` supplies
    /// each route's downstream publisher.
    pub fn new(
        config: AppConfig,
        codec: C,
        guard: SizeGuard,
        mut make_sink: impl FnMut(&RouteConfig) -> Box<dyn SummarySink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut routes = Vec::with_capacity(config.routes.len());
        for route_config in config.routes {
            let sink = make_sink(&route_config);
            routes.push(RoutePipeline::new(route_config, guard, codec.clone(), sink)?);
        }
        Ok(Self {
            registration_topic: config.registration_topic,
            ack_topic: config.ack_topic,
            sweep_policy: SweepPolicy::new(config.max_open_ms),
            routes,
            diag: DiagLog::default(),
        })
    }

    pub fn registration_topic(&self) -> &str {
        &self.registration_topic
    }

    pub fn ack_topic(&self) -> &str {
        &self.ack_topic
    }

    /// Dispatches a raw page record to the route consuming its topic.
    pub fn process_record(
        &mut self,
        raw: RawRecord,
        ctx: &RecordContext,
        now_ms: u64,
    ) -> Result<Option<PaginationSummary>, PipelineError> {
        let diag = &mut self.diag;
        let route = self
            .routes
            .iter_mut()
            .find(|route| route.config().input == ctx.topic)
            .ok_or_else(|| PipelineError::UnknownInput {
                topic: ctx.topic.clone(),
            })?;
        route.process_record(raw, ctx, now_ms, diag)
    }

    /// Feeds one registration event. Events with an absent or empty key
    /// or value are filtered out before any state is touched.
    pub fn process_registration(
        &mut self,
        pagination_id: Option<&str>,
        consumer_id: Option<&str>,
        now_ms: u64,
    ) -> Result<(), PipelineError> {
        let Some((pagination_id, consumer_id)) = event_pair(pagination_id, consumer_id) else {
            return Ok(());
        };
        for route in &mut self.routes {
            route.process_registration(pagination_id, consumer_id, now_ms, &mut self.diag)?;
        }
        Ok(())
    }

    /// Feeds one acknowledgment event, returning the per-route outcomes.
    pub fn process_ack(
        &mut self,
        pagination_id: Option<&str>,
        consumer_id: Option<&str>,
        now_ms: u64,
    ) -> Result<Vec<AckOutcome>, PipelineError> {
        let Some((pagination_id, consumer_id)) = event_pair(pagination_id, consumer_id) else {
            return Ok(Vec::new());
        };
        let mut outcomes = Vec::with_capacity(self.routes.len());
        for route in &mut self.routes {
            outcomes.push(route.process_ack(pagination_id, consumer_id, now_ms, &mut self.diag)?);
        }
        Ok(outcomes)
    }

    /// Purges idle paginations across every route.
    pub fn sweep(&mut self, now_ms: u64) -> Result<Vec<SweptPagination>, PipelineError> {
        let mut swept = Vec::new();
        for route in &mut self.routes {
            swept.extend(route.sweep(self.sweep_policy, now_ms, &mut self.diag)?);
        }
        Ok(swept)
    }

    pub fn routes(&self) -> &[RoutePipeline<C>] {
        &self.routes
    }

    pub fn route(&self, input: &str) -> Option<&RoutePipeline<C>> {
        self.routes.iter().find(|route| route.config().input == input)
    }

    pub fn diag(&self) -> &DiagLog {
        &self.diag
    }

    pub fn diag_mut(&mut self) -> &mut DiagLog {
        &mut self.diag
    }
}

fn event_pair<'a>(
    key: Option<&'a str>,
    value: Option<&'a str>,
) -> Option<(&'a str, &'a str)> {
    match (key, value) {
        (Some(key), Some(value)) if !key.is_empty() && !value.is_empty() => Some((key, value)),
        _ => None,
    }
}

//! The immutable execution plan and its single runtime entry point.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::config::EngineConfig;
use crate::enhancer::FilterEnhancer;
use crate::meta::DefinitionMetadata;
use crate::model::{
    Pagination, ReportDefinition, SubjectType, FIELD_DEFINITION_KEY, FIELD_DEFINITION_VERSION,
    FIELD_TENANT_ID,
};
use crate::query::{FilterExpr, SearchQuery};
use crate::result::{ResultType, TypedResult};
use crate::stats::{MinMaxStatsService, StatsMap};
use crate::store::{StoreClient, StoreResult};

use super::command_key::command_key;
use super::context::{ExecutionContext, IdentifierStack};
use super::decoder;
use super::dimension::AssemblyEnv;
use super::distributed_by::{DistributedBy, DISTRIBUTE_SEGMENT};
use super::error::{EvaluationError, EvaluationResult, PlanConfigurationError};
use super::group_by::{GroupBy, GROUP_SEGMENT};
use super::view::View;

/// An immutable composition of one view, one group-by, one
/// distributed-by and a result shape.
///
/// Built once per report shape, cacheable by command key, and safe to
/// share across concurrent evaluations; all per-call state lives in the
/// [`ExecutionContext`].
#[derive(Debug)]
pub struct ExecutionPlan {
    subject: SubjectType,
    view: View,
    group_by: GroupBy,
    distributed_by: DistributedBy,
    shape: ResultType,
    command_key: String,
}

impl ExecutionPlan {
    pub(crate) fn assemble(
        subject: SubjectType,
        view: View,
        group_by: GroupBy,
        distributed_by: DistributedBy,
        shape: ResultType,
    ) -> Self {
        let command_key = command_key(subject, &view, &group_by, &distributed_by);
        Self {
            subject,
            view,
            group_by,
            distributed_by,
            shape,
            command_key,
        }
    }

    pub fn subject(&self) -> SubjectType {
        self.subject
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn group_by(&self) -> &GroupBy {
        &self.group_by
    }

    pub fn distributed_by(&self) -> &DistributedBy {
        &self.distributed_by
    }

    pub fn result_shape(&self) -> ResultType {
        self.shape
    }

    /// The structural fingerprint of this plan.
    pub fn command_key(&self) -> &str {
        &self.command_key
    }

    /// Verifies that the resolved definition versions expose every field
    /// the view reads. Runs before any store contact; a cached plan must
    /// be re-checked per definition since the command key carries no
    /// version information.
    pub fn check_field_support(
        &self,
        definition: &ReportDefinition,
        metadata: &dyn DefinitionMetadata,
    ) -> Result<(), PlanConfigurationError> {
        for field in self.view.required_fields() {
            if !metadata.supports_field(
                self.subject,
                &definition.definition_key,
                &definition.definition_versions,
                &field,
            ) {
                return Err(PlanConfigurationError::UnsupportedViewForVersion { field });
            }
        }
        Ok(())
    }

    /// Evaluates the plan: pre-queries, one composite aggregation query
    /// plus the unfiltered count query, bottom-up decode, sorting.
    pub async fn evaluate(
        &self,
        ctx: &ExecutionContext,
        store: &dyn StoreClient,
        enhancer: &dyn FilterEnhancer,
        metadata: &dyn DefinitionMetadata,
        config: &EngineConfig,
    ) -> EvaluationResult<TypedResult> {
        let timeout = config.query_timeout();
        let scope_filter = definition_scope(&ctx.definition);
        let filter = FilterExpr::all(vec![
            scope_filter.clone(),
            enhancer.enhance(&ctx.all_filters(), ctx.timezone),
        ]);

        let stats = self.fetch_stats(store, &filter, timeout).await?;
        let main_query = self.assemble_query(ctx, config, &stats, filter);
        let count_query = SearchQuery::count(scope_filter);

        // The main query and the unfiltered total-count query are
        // independent; run them concurrently.
        let (main, count) = tokio::try_join!(
            timed(timeout, store.search(&main_query)),
            timed(timeout, store.search(&count_query)),
        )?;
        debug!(
            command_key = %self.command_key,
            instance_count = main.total_hits,
            "report query executed"
        );

        let data = decoder::decode(self, ctx, metadata, &main)?;
        Ok(TypedResult {
            data,
            instance_count: main.total_hits,
            instance_count_without_filters: count.total_hits,
        })
    }

    async fn fetch_stats(
        &self,
        store: &dyn StoreClient,
        filter: &FilterExpr,
        timeout: Duration,
    ) -> EvaluationResult<StatsMap> {
        let mut fields = Vec::new();
        if !self.view.is_raw() {
            fields.extend(self.group_by.stats_fields(self.subject));
            fields.extend(self.distributed_by.stats_fields(self.subject));
            fields.sort();
            fields.dedup();
        }
        if fields.is_empty() {
            return Ok(StatsMap::new());
        }
        debug!(fields = fields.len(), "issuing min/max pre-queries");
        Ok(MinMaxStatsService::new(store, timeout)
            .fetch_all(filter, &fields)
            .await?)
    }

    fn assemble_query(
        &self,
        ctx: &ExecutionContext,
        config: &EngineConfig,
        stats: &StatsMap,
        filter: FilterExpr,
    ) -> SearchQuery {
        if let View::RawInstances { columns } = &self.view {
            let page = ctx.pagination.unwrap_or(Pagination {
                offset: 0,
                limit: config.default_raw_limit,
            });
            return SearchQuery::rows(filter, page.offset, page.limit, columns.clone());
        }

        let env = AssemblyEnv {
            subject: self.subject,
            timezone: ctx.timezone,
            stats,
            config,
            view_scope: self.view.scope(),
        };
        let (group_ns, dist_ns, view_ns) = self.namespaces(&ctx.identifiers);

        let view_aggs = self
            .view
            .build_aggregations(&view_ns, self.view_scope_already_open());
        let dist_aggs = self.distributed_by.build(
            &dist_ns,
            &env,
            self.distribute_scope_already_open(),
            view_aggs,
        );
        let root = self.group_by.build(&group_ns, &env, dist_aggs);
        SearchQuery::aggregations(filter, root)
    }

    /// The namespace each nesting level generates its aggregation names
    /// under. Mirrored exactly by the decoder.
    pub(crate) fn namespaces(
        &self,
        root: &IdentifierStack,
    ) -> (IdentifierStack, IdentifierStack, IdentifierStack) {
        let group_ns = root.clone();
        let dist_ns = match self.group_by {
            GroupBy::None => group_ns.clone(),
            _ => group_ns.pushed(GROUP_SEGMENT),
        };
        let view_ns = match self.distributed_by {
            DistributedBy::None => dist_ns.clone(),
            _ => dist_ns.pushed(DISTRIBUTE_SEGMENT),
        };
        (group_ns, dist_ns, view_ns)
    }

    pub(crate) fn group_opens_scope(&self) -> Option<&'static str> {
        self.group_by.opens_scope(self.view.scope())
    }

    pub(crate) fn distribute_scope_already_open(&self) -> bool {
        self.group_opens_scope().is_some()
    }

    pub(crate) fn view_scope_already_open(&self) -> bool {
        self.group_opens_scope().is_some()
            || self
                .distributed_by
                .opens_scope(self.view.scope())
                .is_some()
    }
}

/// Restricts a query to the definition the report is scoped to. This is
/// also the filter of the "count without filters" query.
fn definition_scope(definition: &ReportDefinition) -> FilterExpr {
    let mut clauses = vec![FilterExpr::term(
        FIELD_DEFINITION_KEY,
        definition.definition_key.clone(),
    )];
    if !definition.definition_versions.is_empty() {
        clauses.push(FilterExpr::Terms {
            field: FIELD_DEFINITION_VERSION.to_string(),
            values: definition
                .definition_versions
                .iter()
                .map(|v| Value::String(v.clone()))
                .collect(),
        });
    }
    if !definition.tenant_ids.is_empty() {
        clauses.push(FilterExpr::Terms {
            field: FIELD_TENANT_ID.to_string(),
            values: definition
                .tenant_ids
                .iter()
                .map(|t| t.clone().map(Value::String).unwrap_or(Value::Null))
                .collect(),
        });
    }
    FilterExpr::all(clauses)
}

/// Bounds one store call by the evaluation deadline; elapsing surfaces
/// as a cancellation, never as a partial result.
async fn timed<T>(
    timeout: Duration,
    call: impl Future<Output = StoreResult<T>>,
) -> EvaluationResult<T> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result.map_err(EvaluationError::from),
        Err(_) => Err(EvaluationError::Cancelled(format!(
            "store call exceeded the {} ms deadline",
            timeout.as_millis()
        ))),
    }
}

//! High-level evaluation API.
//!
//! Owns the collaborators (store client, filter enhancer, metadata
//! lookup), the engine configuration and the embedder-supplied plan
//! cache, and drives one report definition through plan building and
//! evaluation.

use std::sync::Arc;

use tracing::debug;

use crate::cache::PlanCache;
use crate::config::EngineConfig;
use crate::enhancer::{DefaultFilterEnhancer, FilterEnhancer};
use crate::meta::{DefinitionMetadata, NoMetadata};
use crate::model::ReportDefinition;
use crate::plan::{
    command_key, create_plan, expected_shape, is_combinable, DistributedBy, EvaluationError,
    ExecutionContext, ExecutionPlan, GroupBy, PlanConfigurationError, View,
};
use crate::result::TypedResult;
use crate::store::StoreClient;

/// The report execution engine.
pub struct ReportEngine {
    store: Arc<dyn StoreClient>,
    enhancer: Arc<dyn FilterEnhancer>,
    metadata: Arc<dyn DefinitionMetadata>,
    cache: PlanCache,
    config: EngineConfig,
}

impl ReportEngine {
    pub fn new(
        store: Arc<dyn StoreClient>,
        enhancer: Arc<dyn FilterEnhancer>,
        metadata: Arc<dyn DefinitionMetadata>,
        cache: PlanCache,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            enhancer,
            metadata,
            cache,
            config,
        }
    }

    /// An engine with the built-in enhancer, no metadata lookup and
    /// default configuration.
    pub fn with_defaults(store: Arc<dyn StoreClient>) -> Self {
        Self::new(
            store,
            Arc::new(DefaultFilterEnhancer),
            Arc::new(NoMetadata),
            PlanCache::default(),
            EngineConfig::default(),
        )
    }

    /// Resolves the execution plan for a definition, reusing a cached
    /// plan with the same command key when one exists. The per-version
    /// field-support gate runs on every call: the command key carries no
    /// version information, so a cache hit proves nothing about it.
    pub fn plan_for(
        &self,
        definition: &ReportDefinition,
    ) -> Result<Arc<ExecutionPlan>, PlanConfigurationError> {
        let view = View::from_config(&definition.view)?;
        let group_by = GroupBy::from_config(&definition.group_by);
        let distributed_by = DistributedBy::from_config(&definition.distributed_by);
        let key = command_key(definition.subject, &view, &group_by, &distributed_by);

        let plan = match self.cache.get(&key) {
            Some(plan) => {
                debug!(command_key = %key, "plan cache hit");
                plan
            }
            None => {
                let shape = expected_shape(&view, &group_by, &distributed_by);
                let plan = Arc::new(
                    create_plan(definition.subject)
                        .view(view)
                        .group_by(group_by)
                        .distributed_by(distributed_by)
                        .result_as(shape)
                        .build()?,
                );
                self.cache.insert(Arc::clone(&plan));
                plan
            }
        };

        plan.check_field_support(definition, self.metadata.as_ref())?;
        Ok(plan)
    }

    /// Evaluates one report definition with its execution context.
    pub async fn evaluate(&self, ctx: &ExecutionContext) -> Result<TypedResult, EvaluationError> {
        let plan = self.plan_for(&ctx.definition)?;
        plan.evaluate(
            ctx,
            self.store.as_ref(),
            self.enhancer.as_ref(),
            self.metadata.as_ref(),
            &self.config,
        )
        .await
    }

    /// Whether two report definitions may share one combined chart.
    /// Definitions that fail to build are never combinable.
    pub fn combinable(&self, a: &ReportDefinition, b: &ReportDefinition) -> bool {
        match (self.plan_for(a), self.plan_for(b)) {
            (Ok(a), Ok(b)) => is_combinable(&a, &b),
            _ => false,
        }
    }
}

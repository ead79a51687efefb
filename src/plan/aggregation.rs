//! Leaf numeric reducers used inside duration views.

use crate::model::AggregationType;
use crate::query::{Aggregation, AggregationResults, MetricFunction, NamedAggregation};

use super::context::IdentifierStack;
use super::error::{EvaluationError, EvaluationResult, PlanConfigurationError};

/// A validated aggregation strategy.
///
/// The percentile id embeds `p`, so several percentile strategies can
/// coexist as sibling aggregations under one parent without collision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AggregationStrategy {
    Avg,
    Min,
    Max,
    Sum,
    Percentile(f64),
}

impl AggregationStrategy {
    pub fn from_config(config: AggregationType) -> Result<Self, PlanConfigurationError> {
        match config {
            AggregationType::Avg => Ok(AggregationStrategy::Avg),
            AggregationType::Min => Ok(AggregationStrategy::Min),
            AggregationType::Max => Ok(AggregationStrategy::Max),
            AggregationType::Sum => Ok(AggregationStrategy::Sum),
            AggregationType::Percentile { p } => {
                if p > 0.0 && p <= 100.0 {
                    Ok(AggregationStrategy::Percentile(p))
                } else {
                    Err(PlanConfigurationError::InvalidPercentile(p))
                }
            }
        }
    }

    /// Stable strategy id; part of aggregation names and command keys.
    pub fn id(&self) -> String {
        match self {
            AggregationStrategy::Avg => "avg".to_string(),
            AggregationStrategy::Min => "min".to_string(),
            AggregationStrategy::Max => "max".to_string(),
            AggregationStrategy::Sum => "sum".to_string(),
            AggregationStrategy::Percentile(p) => {
                if p.fract() == 0.0 {
                    format!("p{}", *p as u32)
                } else {
                    format!("p{}", p.to_string().replace('.', "_"))
                }
            }
        }
    }

    /// The aggregation name under the given namespace.
    pub fn aggregation_name(&self, ns: &IdentifierStack) -> String {
        ns.qualify(&self.id())
    }

    pub fn build(&self, ns: &IdentifierStack, field: &str) -> NamedAggregation {
        NamedAggregation::new(
            self.aggregation_name(ns),
            Aggregation::Metric {
                function: self.function(),
                field: field.to_string(),
            },
            Vec::new(),
        )
    }

    /// Reads the metric back out of a bucket's aggregations. Returns
    /// `Ok(None)` (not zero) when the bucket had no matching documents.
    pub fn extract(
        &self,
        ns: &IdentifierStack,
        aggregations: &AggregationResults,
    ) -> EvaluationResult<Option<f64>> {
        let name = self.aggregation_name(ns);
        aggregations
            .metric(&name)
            .ok_or_else(|| EvaluationError::Decode(format!("aggregation '{name}' missing")))
    }

    fn function(&self) -> MetricFunction {
        match self {
            AggregationStrategy::Avg => MetricFunction::Avg,
            AggregationStrategy::Min => MetricFunction::Min,
            AggregationStrategy::Max => MetricFunction::Max,
            AggregationStrategy::Sum => MetricFunction::Sum,
            AggregationStrategy::Percentile(p) => MetricFunction::Percentile { p: *p },
        }
    }
}

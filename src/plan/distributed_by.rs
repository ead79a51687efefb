//! Distributed-by strategies: the secondary bucketing dimension, nested
//! inside each group-by bucket (or evaluated globally when the group-by
//! is `None`).

use std::mem::discriminant;

use crate::meta::LabelKind;
use crate::model::{
    DateDimension, DateUnitConfig, DistributedByConfig, IdentityDimension, SubjectType,
    VariableType, FIELD_ASSIGNEE, FIELD_CANDIDATE_GROUPS, FIELD_DEFINITION_KEY,
    FIELD_FLOW_NODE_ID, FIELD_TASK_ID, NESTED_USER_TASKS,
};
use crate::query::{Aggregation, AggregationResults, NamedAggregation};

use super::context::IdentifierStack;
use super::dimension::{self, date_field, identity_missing_key, AssemblyEnv, DecodedBucket};
use super::error::EvaluationResult;
use super::group_by::missing_aggregation;

const DISTRIBUTE_AGG: &str = "distribute";
const DISTRIBUTE_NESTED_AGG: &str = "distributeNested";

/// Segment the distributed-by axis pushes onto the identifier stack for
/// the view aggregations nested inside its buckets.
pub(crate) const DISTRIBUTE_SEGMENT: &str = "distribute";

/// The secondary bucketing dimension.
#[derive(Debug, Clone, PartialEq)]
pub enum DistributedBy {
    None,
    Date {
        dimension: DateDimension,
        unit: DateUnitConfig,
    },
    Process,
    FlowNode,
    UserTask,
    Identity {
        dimension: IdentityDimension,
    },
    Variable {
        name: String,
        var_type: VariableType,
    },
}

impl DistributedBy {
    pub fn from_config(config: &DistributedByConfig) -> Self {
        match config {
            DistributedByConfig::None => DistributedBy::None,
            DistributedByConfig::Date { dimension, unit } => DistributedBy::Date {
                dimension: *dimension,
                unit: *unit,
            },
            DistributedByConfig::Process => DistributedBy::Process,
            DistributedByConfig::FlowNode => DistributedBy::FlowNode,
            DistributedByConfig::UserTask => DistributedBy::UserTask,
            DistributedByConfig::Identity { dimension } => DistributedBy::Identity {
                dimension: *dimension,
            },
            DistributedByConfig::Variable { name, var_type } => DistributedBy::Variable {
                name: name.clone(),
                var_type: *var_type,
            },
        }
    }

    /// Stable type id; part of the command key.
    pub fn id(&self) -> &'static str {
        match self {
            DistributedBy::None => "distributedByNone",
            DistributedBy::Date { dimension, .. } => match dimension {
                DateDimension::Start => "distributedByStartDate",
                DateDimension::End => "distributedByEndDate",
                DateDimension::Running => "distributedByRunningDate",
            },
            DistributedBy::Process => "distributedByProcess",
            DistributedBy::FlowNode => "distributedByFlowNode",
            DistributedBy::UserTask => "distributedByUserTask",
            DistributedBy::Identity { dimension } => match dimension {
                IdentityDimension::Assignee => "distributedByAssignee",
                IdentityDimension::CandidateGroup => "distributedByCandidateGroup",
            },
            DistributedBy::Variable { .. } => "distributedByVariable",
        }
    }

    pub(crate) fn opens_scope(&self, view_scope: Option<&'static str>) -> Option<&'static str> {
        match self {
            DistributedBy::FlowNode => view_scope,
            DistributedBy::UserTask | DistributedBy::Identity { .. } => Some(NESTED_USER_TASKS),
            _ => None,
        }
    }

    /// Whether bucket keys compare numerically for default sorting.
    /// Stable per strategy instance; consumers rely on it to pick
    /// numeric vs. lexical ordering.
    pub fn is_key_of_numeric_type(&self) -> bool {
        matches!(self, DistributedBy::Variable { var_type, .. } if var_type.is_numeric())
    }

    /// Fields whose min/max stats must be resolved before assembly. A
    /// date distribution sizes its intervals from its own field,
    /// independently of the group-by axis.
    pub(crate) fn stats_fields(&self, subject: SubjectType) -> Vec<String> {
        match self {
            DistributedBy::Date {
                dimension,
                unit: DateUnitConfig::Automatic,
            } => vec![date_field(subject, *dimension).to_string()],
            DistributedBy::Variable { name, var_type } => {
                dimension::variable_stats_fields(name, *var_type)
            }
            _ => Vec::new(),
        }
    }

    pub(crate) fn build(
        &self,
        ns: &IdentifierStack,
        env: &AssemblyEnv<'_>,
        scope_already_open: bool,
        inner: Vec<NamedAggregation>,
    ) -> Vec<NamedAggregation> {
        let agg = match self {
            DistributedBy::None => return inner,
            DistributedBy::Date { dimension, unit } => dimension::date_histogram(
                date_field(env.subject, *dimension),
                *unit,
                env.stats,
                env.config,
                env.timezone,
            ),
            DistributedBy::Process => Aggregation::Terms {
                field: FIELD_DEFINITION_KEY.to_string(),
                size: env.config.max_terms_buckets,
                missing: None,
            },
            DistributedBy::FlowNode => Aggregation::Terms {
                field: FIELD_FLOW_NODE_ID.to_string(),
                size: env.config.max_terms_buckets,
                missing: None,
            },
            DistributedBy::UserTask => Aggregation::Terms {
                field: FIELD_TASK_ID.to_string(),
                size: env.config.max_terms_buckets,
                missing: None,
            },
            DistributedBy::Identity { dimension } => Aggregation::Terms {
                field: match dimension {
                    IdentityDimension::Assignee => FIELD_ASSIGNEE.to_string(),
                    IdentityDimension::CandidateGroup => FIELD_CANDIDATE_GROUPS.to_string(),
                },
                size: env.config.max_terms_buckets,
                missing: identity_missing_key(),
            },
            DistributedBy::Variable { name, var_type } => dimension::variable_aggregation(
                name,
                *var_type,
                env.stats,
                env.config,
                env.timezone,
            ),
        };

        let bucket_agg = NamedAggregation::new(ns.qualify(DISTRIBUTE_AGG), agg, inner);
        match (self.opens_scope(env.view_scope), scope_already_open) {
            (Some(path), false) => vec![NamedAggregation::new(
                ns.qualify(DISTRIBUTE_NESTED_AGG),
                Aggregation::Nested {
                    path: path.to_string(),
                },
                vec![bucket_agg],
            )],
            _ => vec![bucket_agg],
        }
    }

    pub(crate) fn decode_buckets<'a>(
        &self,
        ns: &IdentifierStack,
        view_scope: Option<&'static str>,
        scope_already_open: bool,
        aggregations: &'a AggregationResults,
    ) -> EvaluationResult<Vec<DecodedBucket<'a>>> {
        let mut current = aggregations;
        if self.opens_scope(view_scope).is_some() && !scope_already_open {
            let name = ns.qualify(DISTRIBUTE_NESTED_AGG);
            current = &current
                .single(&name)
                .ok_or_else(|| missing_aggregation(&name))?
                .aggregations;
        }
        let name = ns.qualify(DISTRIBUTE_AGG);
        let buckets = current
            .buckets(&name)
            .ok_or_else(|| missing_aggregation(&name))?;
        Ok(buckets
            .iter()
            .map(|b| DecodedBucket {
                key: b.key_string(),
                aggregations: &b.aggregations,
            })
            .collect())
    }

    pub(crate) fn label_kind(&self) -> Option<LabelKind> {
        match self {
            DistributedBy::Process => Some(LabelKind::Process),
            DistributedBy::FlowNode => Some(LabelKind::FlowNode),
            DistributedBy::UserTask => Some(LabelKind::UserTask),
            DistributedBy::Identity { dimension } => Some(match dimension {
                IdentityDimension::Assignee => LabelKind::Assignee,
                IdentityDimension::CandidateGroup => LabelKind::CandidateGroup,
            }),
            _ => None,
        }
    }

    /// Distribution axes combine for side-by-side charting when they
    /// match by type; bucket parameters are deliberately ignored.
    pub fn matches_type(&self, other: &DistributedBy) -> bool {
        discriminant(self) == discriminant(other)
    }
}

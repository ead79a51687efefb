//! Group-by strategies: the primary bucketing dimension.

use crate::meta::LabelKind;
use crate::model::{
    DateDimension, DateUnitConfig, GroupByConfig, IdentityDimension, SubjectType, VariableType,
    FIELD_ASSIGNEE, FIELD_CANDIDATE_GROUPS, FIELD_END_DATE, FIELD_FLOW_NODE_ID, FIELD_START_DATE,
    FIELD_TASK_ID, NESTED_USER_TASKS,
};
use crate::query::{Aggregation, AggregationResults, NamedAggregation};

use super::context::IdentifierStack;
use super::dimension::{
    self, date_field, identity_missing_key, AssemblyEnv, DecodedBucket,
};
use super::error::{EvaluationError, EvaluationResult};

const GROUP_AGG: &str = "group";
const GROUP_NESTED_AGG: &str = "groupNested";

/// Segment the group-by axis pushes onto the identifier stack for
/// everything nested inside its buckets.
pub(crate) const GROUP_SEGMENT: &str = "group";

/// The primary bucketing dimension. `None` is a strategy, not an
/// absence: the inner aggregation is then evaluated globally.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupBy {
    None,
    Date {
        dimension: DateDimension,
        unit: DateUnitConfig,
    },
    Variable {
        name: String,
        var_type: VariableType,
    },
    FlowNode,
    UserTask,
    Identity {
        dimension: IdentityDimension,
    },
}

impl GroupBy {
    pub fn from_config(config: &GroupByConfig) -> Self {
        match config {
            GroupByConfig::None => GroupBy::None,
            GroupByConfig::Date { dimension, unit } => GroupBy::Date {
                dimension: *dimension,
                unit: *unit,
            },
            GroupByConfig::Variable { name, var_type } => GroupBy::Variable {
                name: name.clone(),
                var_type: *var_type,
            },
            GroupByConfig::FlowNode => GroupBy::FlowNode,
            GroupByConfig::UserTask => GroupBy::UserTask,
            GroupByConfig::Identity { dimension } => GroupBy::Identity {
                dimension: *dimension,
            },
        }
    }

    /// Stable type id; part of the command key.
    pub fn id(&self) -> &'static str {
        match self {
            GroupBy::None => "groupByNone",
            GroupBy::Date { dimension, .. } => match dimension {
                DateDimension::Start => "byStartDate",
                DateDimension::End => "byEndDate",
                DateDimension::Running => "byRunningDate",
            },
            GroupBy::Variable { .. } => "byVariable",
            GroupBy::FlowNode => "byFlowNode",
            GroupBy::UserTask => "byUserTask",
            GroupBy::Identity { dimension } => match dimension {
                IdentityDimension::Assignee => "byAssignee",
                IdentityDimension::CandidateGroup => "byCandidateGroup",
            },
        }
    }

    /// Command-key component: type id plus the bucket shape.
    pub fn key_component(&self) -> String {
        match self {
            GroupBy::Date { unit, .. } => format!("{}.{}", self.id(), unit.id()),
            GroupBy::Variable { name, var_type } => {
                format!("{}.{}.{}", self.id(), name, var_type.id())
            }
            _ => self.id().to_string(),
        }
    }

    /// The nested sub-document path this axis buckets over, if any.
    /// Element axes inherit the path from the view (flow-node buckets of
    /// an incident view live under the incident sub-documents).
    pub(crate) fn opens_scope(&self, view_scope: Option<&'static str>) -> Option<&'static str> {
        match self {
            GroupBy::FlowNode => view_scope,
            GroupBy::UserTask | GroupBy::Identity { .. } => Some(NESTED_USER_TASKS),
            _ => None,
        }
    }

    /// Whether bucket keys compare numerically for default sorting.
    /// Stable per strategy instance.
    pub fn is_key_numeric(&self) -> bool {
        matches!(self, GroupBy::Variable { var_type, .. } if var_type.is_numeric())
    }

    /// Fields whose min/max stats must be resolved before assembly.
    pub(crate) fn stats_fields(&self, subject: SubjectType) -> Vec<String> {
        match self {
            GroupBy::Date {
                dimension: DateDimension::Running,
                ..
            } => vec![FIELD_START_DATE.to_string(), FIELD_END_DATE.to_string()],
            GroupBy::Date {
                dimension,
                unit: DateUnitConfig::Automatic,
            } => vec![date_field(subject, *dimension).to_string()],
            GroupBy::Date { .. } => Vec::new(),
            GroupBy::Variable { name, var_type } => {
                dimension::variable_stats_fields(name, *var_type)
            }
            _ => Vec::new(),
        }
    }

    /// Wraps the inner aggregations into this axis's bucket aggregation.
    pub(crate) fn build(
        &self,
        ns: &IdentifierStack,
        env: &AssemblyEnv<'_>,
        inner: Vec<NamedAggregation>,
    ) -> Vec<NamedAggregation> {
        let agg = match self {
            GroupBy::None => return inner,
            GroupBy::Date { dimension, unit } => match dimension {
                DateDimension::Running => dimension::running_date_buckets(
                    *unit,
                    env.stats,
                    env.config,
                    env.timezone,
                ),
                _ => dimension::date_histogram(
                    date_field(env.subject, *dimension),
                    *unit,
                    env.stats,
                    env.config,
                    env.timezone,
                ),
            },
            GroupBy::Variable { name, var_type } => dimension::variable_aggregation(
                name,
                *var_type,
                env.stats,
                env.config,
                env.timezone,
            ),
            GroupBy::FlowNode => Aggregation::Terms {
                field: FIELD_FLOW_NODE_ID.to_string(),
                size: env.config.max_terms_buckets,
                missing: None,
            },
            GroupBy::UserTask => Aggregation::Terms {
                field: FIELD_TASK_ID.to_string(),
                size: env.config.max_terms_buckets,
                missing: None,
            },
            GroupBy::Identity { dimension } => Aggregation::Terms {
                field: match dimension {
                    IdentityDimension::Assignee => FIELD_ASSIGNEE.to_string(),
                    IdentityDimension::CandidateGroup => FIELD_CANDIDATE_GROUPS.to_string(),
                },
                size: env.config.max_terms_buckets,
                missing: identity_missing_key(),
            },
        };

        let bucket_agg = NamedAggregation::new(ns.qualify(GROUP_AGG), agg, inner);
        match self.opens_scope(env.view_scope) {
            Some(path) => vec![NamedAggregation::new(
                ns.qualify(GROUP_NESTED_AGG),
                Aggregation::Nested {
                    path: path.to_string(),
                },
                vec![bucket_agg],
            )],
            None => vec![bucket_agg],
        }
    }

    /// Reads this axis's buckets back out of the response, mirroring
    /// `build`.
    pub(crate) fn decode_buckets<'a>(
        &self,
        ns: &IdentifierStack,
        view_scope: Option<&'static str>,
        aggregations: &'a AggregationResults,
    ) -> EvaluationResult<Vec<DecodedBucket<'a>>> {
        let mut current = aggregations;
        if self.opens_scope(view_scope).is_some() {
            let name = ns.qualify(GROUP_NESTED_AGG);
            current = &current
                .single(&name)
                .ok_or_else(|| missing_aggregation(&name))?
                .aggregations;
        }
        let name = ns.qualify(GROUP_AGG);
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

    /// What kind of label the decoded keys resolve through.
    pub(crate) fn label_kind(&self) -> Option<LabelKind> {
        match self {
            GroupBy::FlowNode => Some(LabelKind::FlowNode),
            GroupBy::UserTask => Some(LabelKind::UserTask),
            GroupBy::Identity { dimension } => Some(match dimension {
                IdentityDimension::Assignee => LabelKind::Assignee,
                IdentityDimension::CandidateGroup => LabelKind::CandidateGroup,
            }),
            _ => None,
        }
    }

    /// Whether two group-by axes may share one combined chart. Date axes
    /// combine across start/end/running dimensions when their bucket
    /// shapes match, so time series of different date semantics can
    /// share one chart.
    pub fn combinable_with(&self, other: &GroupBy) -> bool {
        match (self, other) {
            (GroupBy::None, GroupBy::None) => true,
            (GroupBy::Date { unit: a, .. }, GroupBy::Date { unit: b, .. }) => a == b,
            (
                GroupBy::Variable {
                    name: a,
                    var_type: ta,
                },
                GroupBy::Variable {
                    name: b,
                    var_type: tb,
                },
            ) => a == b && ta == tb,
            (GroupBy::FlowNode, GroupBy::FlowNode) => true,
            (GroupBy::UserTask, GroupBy::UserTask) => true,
            (GroupBy::Identity { dimension: a }, GroupBy::Identity { dimension: b }) => a == b,
            _ => false,
        }
    }
}

pub(crate) fn missing_aggregation(name: &str) -> EvaluationError {
    EvaluationError::Decode(format!("aggregation '{name}' missing"))
}

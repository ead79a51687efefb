//! View strategies: which metric a plan measures.

use crate::model::{
    nested_field, ColumnSelection, SubjectType, UserTaskDurationVariant, ViewConfig,
    FIELD_DURATION, FIELD_IDLE_DURATION, FIELD_INCIDENT_STATUS, FIELD_TOTAL_DURATION,
    FIELD_WORK_DURATION, INCIDENT_STATUS_RESOLVED, NESTED_FLOW_NODES, NESTED_INCIDENTS,
    NESTED_USER_TASKS,
};
use crate::query::{Aggregation, AggregationResults, FilterExpr, NamedAggregation};

use super::aggregation::AggregationStrategy;
use super::context::IdentifierStack;
use super::error::{EvaluationError, EvaluationResult, PlanConfigurationError};

const NESTED_AGG: &str = "nested";
const FILTER_AGG: &str = "filter";
const COUNT_AGG: &str = "count";

/// The metric being measured.
///
/// Frequency views count matching leaf documents or sub-documents
/// exactly; duration views reduce a millisecond duration field with
/// their aggregation strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    InstanceFrequency,
    InstanceDuration {
        aggregation: AggregationStrategy,
    },
    FlowNodeFrequency,
    FlowNodeDuration {
        aggregation: AggregationStrategy,
    },
    UserTaskFrequency,
    UserTaskDuration {
        aggregation: AggregationStrategy,
        variant: UserTaskDurationVariant,
    },
    IncidentFrequency,
    IncidentDuration {
        aggregation: AggregationStrategy,
    },
    RawInstances {
        columns: ColumnSelection,
    },
}

impl View {
    pub fn from_config(config: &ViewConfig) -> Result<Self, PlanConfigurationError> {
        Ok(match config {
            ViewConfig::InstanceFrequency => View::InstanceFrequency,
            ViewConfig::InstanceDuration { aggregation } => View::InstanceDuration {
                aggregation: AggregationStrategy::from_config(*aggregation)?,
            },
            ViewConfig::FlowNodeFrequency => View::FlowNodeFrequency,
            ViewConfig::FlowNodeDuration { aggregation } => View::FlowNodeDuration {
                aggregation: AggregationStrategy::from_config(*aggregation)?,
            },
            ViewConfig::UserTaskFrequency => View::UserTaskFrequency,
            ViewConfig::UserTaskDuration {
                aggregation,
                variant,
            } => View::UserTaskDuration {
                aggregation: AggregationStrategy::from_config(*aggregation)?,
                variant: *variant,
            },
            ViewConfig::IncidentFrequency => View::IncidentFrequency,
            ViewConfig::IncidentDuration { aggregation } => View::IncidentDuration {
                aggregation: AggregationStrategy::from_config(*aggregation)?,
            },
            ViewConfig::RawInstances { columns } => View::RawInstances {
                columns: columns.clone(),
            },
        })
    }

    /// Stable view type id; part of the command key.
    pub fn id(&self) -> &'static str {
        match self {
            View::InstanceFrequency => "instanceFrequency",
            View::InstanceDuration { .. } => "instanceDuration",
            View::FlowNodeFrequency => "flowNodeFrequency",
            View::FlowNodeDuration { .. } => "flowNodeDuration",
            View::UserTaskFrequency => "userTaskFrequency",
            View::UserTaskDuration { .. } => "userTaskDuration",
            View::IncidentFrequency => "incidentFrequency",
            View::IncidentDuration { .. } => "incidentDuration",
            View::RawInstances { .. } => "rawInstances",
        }
    }

    /// The measured property, including the aggregation and variant for
    /// duration views; part of the command key.
    pub fn property_id(&self) -> String {
        match self {
            View::InstanceFrequency
            | View::FlowNodeFrequency
            | View::UserTaskFrequency
            | View::IncidentFrequency => "frequency".to_string(),
            View::InstanceDuration { aggregation }
            | View::FlowNodeDuration { aggregation }
            | View::IncidentDuration { aggregation } => {
                format!("duration.{}", aggregation.id())
            }
            View::UserTaskDuration {
                aggregation,
                variant,
            } => format!("duration.{}.{}", variant_id(*variant), aggregation.id()),
            View::RawInstances { .. } => "raw".to_string(),
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, View::RawInstances { .. })
    }

    fn is_frequency(&self) -> bool {
        matches!(
            self,
            View::InstanceFrequency
                | View::FlowNodeFrequency
                | View::UserTaskFrequency
                | View::IncidentFrequency
        )
    }

    /// The nested sub-document path this view measures inside, if any.
    pub fn scope(&self) -> Option<&'static str> {
        match self {
            View::FlowNodeFrequency | View::FlowNodeDuration { .. } => Some(NESTED_FLOW_NODES),
            View::UserTaskFrequency | View::UserTaskDuration { .. } => Some(NESTED_USER_TASKS),
            View::IncidentFrequency | View::IncidentDuration { .. } => Some(NESTED_INCIDENTS),
            _ => None,
        }
    }

    /// Restricts the measured sub-documents beyond the nested scope.
    fn view_filter(&self) -> Option<FilterExpr> {
        match self {
            // Duration of an incident is its time to resolution, so only
            // resolved incidents carry it.
            View::IncidentDuration { .. } => Some(FilterExpr::term(
                FIELD_INCIDENT_STATUS,
                INCIDENT_STATUS_RESOLVED,
            )),
            _ => None,
        }
    }

    /// The duration field, relative to the view's scope.
    fn duration_field(&self) -> Option<&'static str> {
        match self {
            View::InstanceDuration { .. }
            | View::FlowNodeDuration { .. }
            | View::IncidentDuration { .. } => Some(FIELD_DURATION),
            View::UserTaskDuration { variant, .. } => Some(match variant {
                UserTaskDurationVariant::Total => FIELD_TOTAL_DURATION,
                UserTaskDurationVariant::Idle => FIELD_IDLE_DURATION,
                UserTaskDurationVariant::Work => FIELD_WORK_DURATION,
            }),
            _ => None,
        }
    }

    /// The aggregation strategies this view needs.
    pub fn required_aggregations(&self) -> Vec<AggregationStrategy> {
        match self {
            View::InstanceDuration { aggregation }
            | View::FlowNodeDuration { aggregation }
            | View::UserTaskDuration { aggregation, .. }
            | View::IncidentDuration { aggregation } => vec![*aggregation],
            _ => Vec::new(),
        }
    }

    /// Full field paths the resolved definition versions must expose.
    pub fn required_fields(&self) -> Vec<String> {
        match self {
            View::InstanceFrequency | View::RawInstances { .. } => Vec::new(),
            View::InstanceDuration { .. } => vec![FIELD_DURATION.to_string()],
            View::FlowNodeFrequency | View::UserTaskFrequency | View::IncidentFrequency => {
                // The nested path itself must be mapped.
                self.scope().map(str::to_string).into_iter().collect()
            }
            View::FlowNodeDuration { .. } | View::IncidentDuration { .. } => {
                match (self.scope(), self.duration_field()) {
                    (Some(path), Some(field)) => vec![nested_field(path, field)],
                    _ => Vec::new(),
                }
            }
            View::UserTaskDuration { .. } => match self.duration_field() {
                Some(field) => vec![nested_field(NESTED_USER_TASKS, field)],
                None => Vec::new(),
            },
        }
    }

    /// Subjects this view is defined for.
    pub fn supports_subject(&self, subject: SubjectType) -> bool {
        match subject {
            SubjectType::Process => true,
            SubjectType::Decision => matches!(
                self,
                View::InstanceFrequency | View::RawInstances { .. }
            ),
        }
    }

    /// The leaf aggregations of the composite query, wrapped in the
    /// view's nested scope unless an outer strategy opened it already.
    pub fn build_aggregations(
        &self,
        ns: &IdentifierStack,
        scope_already_open: bool,
    ) -> Vec<NamedAggregation> {
        if self.is_raw() {
            return Vec::new();
        }

        let leaf = if self.is_frequency() {
            vec![NamedAggregation::new(
                ns.qualify(COUNT_AGG),
                Aggregation::Filter {
                    filter: self.view_filter().unwrap_or(FilterExpr::MatchAll),
                },
                Vec::new(),
            )]
        } else {
            let metrics: Vec<NamedAggregation> = self
                .required_aggregations()
                .iter()
                .filter_map(|agg| self.duration_field().map(|field| agg.build(ns, field)))
                .collect();
            match self.view_filter() {
                Some(filter) => vec![NamedAggregation::new(
                    ns.qualify(FILTER_AGG),
                    Aggregation::Filter { filter },
                    metrics,
                )],
                None => metrics,
            }
        };

        match (self.scope(), scope_already_open) {
            (Some(path), false) => vec![NamedAggregation::new(
                ns.qualify(NESTED_AGG),
                Aggregation::Nested {
                    path: path.to_string(),
                },
                leaf,
            )],
            _ => leaf,
        }
    }

    /// Decodes the view value out of one bucket's aggregations,
    /// mirroring `build_aggregations`.
    pub fn extract(
        &self,
        ns: &IdentifierStack,
        aggregations: &AggregationResults,
        scope_already_open: bool,
    ) -> EvaluationResult<Option<f64>> {
        let mut current = aggregations;

        if self.scope().is_some() && !scope_already_open {
            current = &self.unwrap_single(ns, current, NESTED_AGG)?.aggregations;
        }

        if self.is_frequency() {
            let count = self.unwrap_single(ns, current, COUNT_AGG)?;
            return Ok(Some(count.doc_count as f64));
        }

        if self.view_filter().is_some() {
            current = &self.unwrap_single(ns, current, FILTER_AGG)?.aggregations;
        }

        match self.required_aggregations().first() {
            Some(aggregation) => aggregation.extract(ns, current),
            None => Ok(None),
        }
    }

    fn unwrap_single<'a>(
        &self,
        ns: &IdentifierStack,
        aggregations: &'a AggregationResults,
        id: &str,
    ) -> EvaluationResult<&'a crate::query::SingleBucket> {
        let name = ns.qualify(id);
        aggregations
            .single(&name)
            .ok_or_else(|| EvaluationError::Decode(format!("aggregation '{name}' missing")))
    }

    /// Whether two views may share one combined chart: same metric, and
    /// for duration views the same aggregation (and variant).
    pub fn combinable_with(&self, other: &View) -> bool {
        match (self, other) {
            (View::InstanceFrequency, View::InstanceFrequency)
            | (View::FlowNodeFrequency, View::FlowNodeFrequency)
            | (View::UserTaskFrequency, View::UserTaskFrequency)
            | (View::IncidentFrequency, View::IncidentFrequency) => true,
            (
                View::InstanceDuration { aggregation: a },
                View::InstanceDuration { aggregation: b },
            )
            | (
                View::FlowNodeDuration { aggregation: a },
                View::FlowNodeDuration { aggregation: b },
            )
            | (
                View::IncidentDuration { aggregation: a },
                View::IncidentDuration { aggregation: b },
            ) => a == b,
            (
                View::UserTaskDuration {
                    aggregation: a,
                    variant: va,
                },
                View::UserTaskDuration {
                    aggregation: b,
                    variant: vb,
                },
            ) => a == b && va == vb,
            _ => false,
        }
    }
}

fn variant_id(variant: UserTaskDurationVariant) -> &'static str {
    match variant {
        UserTaskDurationVariant::Total => "total",
        UserTaskDurationVariant::Idle => "idle",
        UserTaskDurationVariant::Work => "work",
    }
}

//! Filter enhancement.
//!
//! Turns the abstract [`Filter`] values of a report definition into a
//! store-native [`FilterExpr`], once per evaluation. The trait is the
//! contract; [`DefaultFilterEnhancer`] covers the built-in filter
//! vocabulary.

use chrono::SecondsFormat;
use chrono_tz::Tz;
use serde_json::Value;

use crate::model::{
    variable_field, CompareOp, Filter, InstanceState, FIELD_DURATION, FIELD_END_DATE,
    FIELD_FLOW_NODE_ID, FIELD_START_DATE, FIELD_STATE, NESTED_FLOW_NODES, STATE_ACTIVE,
    STATE_CANCELED, STATE_COMPLETED,
};
use crate::query::FilterExpr;

/// External filter-translation collaborator.
pub trait FilterEnhancer: Send + Sync {
    fn enhance(&self, filters: &[Filter], timezone: Tz) -> FilterExpr;
}

/// Translates the built-in filter vocabulary.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFilterEnhancer;

impl FilterEnhancer for DefaultFilterEnhancer {
    fn enhance(&self, filters: &[Filter], _timezone: Tz) -> FilterExpr {
        FilterExpr::all(filters.iter().map(translate).collect())
    }
}

fn translate(filter: &Filter) -> FilterExpr {
    match filter {
        Filter::StartDate { after, before } => date_range(FIELD_START_DATE, after, before),
        Filter::EndDate { after, before } => date_range(FIELD_END_DATE, after, before),
        Filter::VariableEquals { name, value } => {
            FilterExpr::term(variable_field(name), value.clone())
        }
        Filter::VariableCompare { name, op, value } => {
            compare(variable_field(name), *op, (*value).into())
        }
        Filter::FlowNodeExecuted { flow_node_id } => FilterExpr::nested(
            NESTED_FLOW_NODES,
            FilterExpr::term(FIELD_FLOW_NODE_ID, flow_node_id.clone()),
        ),
        Filter::InstanceState { state } => FilterExpr::term(
            FIELD_STATE,
            match state {
                InstanceState::Running => STATE_ACTIVE,
                InstanceState::Completed => STATE_COMPLETED,
                InstanceState::Canceled => STATE_CANCELED,
            },
        ),
        Filter::DurationCompare { op, value_ms } => {
            compare(FIELD_DURATION.to_string(), *op, (*value_ms).into())
        }
    }
}

fn date_range(
    field: &str,
    after: &Option<chrono::DateTime<chrono::Utc>>,
    before: &Option<chrono::DateTime<chrono::Utc>>,
) -> FilterExpr {
    let mut range = FilterExpr::range(field);
    if let Some(after) = after {
        range = range.gte(after.to_rfc3339_opts(SecondsFormat::Millis, true));
    }
    if let Some(before) = before {
        range = range.lt(before.to_rfc3339_opts(SecondsFormat::Millis, true));
    }
    range.build()
}

fn compare(field: String, op: CompareOp, value: Value) -> FilterExpr {
    let range = FilterExpr::range(field);
    match op {
        CompareOp::Gt => range.gt(value),
        CompareOp::Gte => range.gte(value),
        CompareOp::Lt => range.lt(value),
        CompareOp::Lte => range.lte(value),
    }
    .build()
}

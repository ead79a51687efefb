//! Command keys and combinability.
//!
//! The command key is a deterministic fingerprint of a plan's *shape*:
//! a pure function of the strategy ids, never of filter values, tenants
//! or concrete date ranges. Equal keys guarantee identical aggregation
//! nesting and decode shape, not identical data.

use crate::model::SubjectType;

use super::distributed_by::DistributedBy;
use super::group_by::GroupBy;
use super::plan::ExecutionPlan;
use super::view::View;

/// The structural fingerprint: each component contributes its own id.
pub(crate) fn command_key(
    subject: SubjectType,
    view: &View,
    group_by: &GroupBy,
    distributed_by: &DistributedBy,
) -> String {
    [
        subject.id().to_string(),
        view.id().to_string(),
        view.property_id(),
        group_by.key_component(),
        distributed_by.id().to_string(),
    ]
    .join(":")
}

/// Whether two plans may be rendered on one combined chart.
///
/// Presentation-only: views must be pairwise combinable, group-by axes
/// must be pairwise combinable, and distribution axes must match by
/// type. Never used for data correctness.
pub fn is_combinable(a: &ExecutionPlan, b: &ExecutionPlan) -> bool {
    a.view().combinable_with(b.view())
        && a.group_by().combinable_with(b.group_by())
        && a.distributed_by().matches_type(b.distributed_by())
}

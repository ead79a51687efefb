//! Staged plan builder.
//!
//! `create_plan(subject).view(v).group_by(g).distributed_by(d)
//! .result_as(shape).build()` - each stage is its own type, so a plan
//! missing a slot is a compile error in the caller, not a runtime check.
//! `build()` validates the combination and never touches the store.

use crate::model::{DateDimension, SubjectType, NESTED_USER_TASKS};
use crate::result::ResultType;

use super::distributed_by::DistributedBy;
use super::error::PlanConfigurationError;
use super::group_by::GroupBy;
use super::plan::ExecutionPlan;
use super::view::View;

/// Entry point of the builder chain.
pub fn create_plan(subject: SubjectType) -> PlanBuilder {
    PlanBuilder { subject }
}

#[must_use = "builders have no effect until used"]
pub struct PlanBuilder {
    subject: SubjectType,
}

impl PlanBuilder {
    pub fn view(self, view: View) -> PlanBuilderWithView {
        PlanBuilderWithView {
            subject: self.subject,
            view,
        }
    }
}

#[must_use = "builders have no effect until used"]
pub struct PlanBuilderWithView {
    subject: SubjectType,
    view: View,
}

impl PlanBuilderWithView {
    pub fn group_by(self, group_by: GroupBy) -> PlanBuilderWithGroupBy {
        PlanBuilderWithGroupBy {
            subject: self.subject,
            view: self.view,
            group_by,
        }
    }
}

#[must_use = "builders have no effect until used"]
pub struct PlanBuilderWithGroupBy {
    subject: SubjectType,
    view: View,
    group_by: GroupBy,
}

impl PlanBuilderWithGroupBy {
    pub fn distributed_by(self, distributed_by: DistributedBy) -> PlanBuilderWithDistribution {
        PlanBuilderWithDistribution {
            subject: self.subject,
            view: self.view,
            group_by: self.group_by,
            distributed_by,
        }
    }
}

#[must_use = "builders have no effect until used"]
pub struct PlanBuilderWithDistribution {
    subject: SubjectType,
    view: View,
    group_by: GroupBy,
    distributed_by: DistributedBy,
}

impl PlanBuilderWithDistribution {
    pub fn result_as(self, shape: ResultType) -> PlanBuilderComplete {
        PlanBuilderComplete {
            subject: self.subject,
            view: self.view,
            group_by: self.group_by,
            distributed_by: self.distributed_by,
            shape,
        }
    }
}

#[must_use = "builders have no effect until used"]
pub struct PlanBuilderComplete {
    subject: SubjectType,
    view: View,
    group_by: GroupBy,
    distributed_by: DistributedBy,
    shape: ResultType,
}

impl PlanBuilderComplete {
    pub fn build(self) -> Result<ExecutionPlan, PlanConfigurationError> {
        validate(&self.subject, &self.view, &self.group_by, &self.distributed_by)?;

        let expected = expected_shape(&self.view, &self.group_by, &self.distributed_by);
        if self.shape != expected {
            return Err(PlanConfigurationError::ShapeMismatch {
                requested: self.shape.id().to_string(),
                expected: expected.id().to_string(),
            });
        }

        Ok(ExecutionPlan::assemble(
            self.subject,
            self.view,
            self.group_by,
            self.distributed_by,
            self.shape,
        ))
    }
}

/// The result shape a dimension combination decodes to.
pub(crate) fn expected_shape(
    view: &View,
    group_by: &GroupBy,
    distributed_by: &DistributedBy,
) -> ResultType {
    if view.is_raw() {
        return ResultType::Raw;
    }
    match (group_by, distributed_by) {
        (GroupBy::None, DistributedBy::None) => ResultType::Number,
        (GroupBy::None, _) | (_, DistributedBy::None) => ResultType::Map,
        _ => ResultType::HyperMap,
    }
}

fn validate(
    subject: &SubjectType,
    view: &View,
    group_by: &GroupBy,
    distributed_by: &DistributedBy,
) -> Result<(), PlanConfigurationError> {
    let illegal = || PlanConfigurationError::IllegalCombination {
        view: view.id().to_string(),
        group_by: group_by.id().to_string(),
        distributed_by: distributed_by.id().to_string(),
    };

    if !view.supports_subject(*subject) {
        return Err(PlanConfigurationError::InvalidSubject {
            subject: subject.id().to_string(),
            view: view.id().to_string(),
        });
    }

    // A raw listing is a plain projection; it cannot sit inside buckets.
    if view.is_raw()
        && !(matches!(group_by, GroupBy::None) && matches!(distributed_by, DistributedBy::None))
    {
        return Err(illegal());
    }

    // Decision instances carry one date (the evaluation date) and no
    // sub-documents.
    if *subject == SubjectType::Decision {
        match group_by {
            GroupBy::None | GroupBy::Variable { .. } => {}
            GroupBy::Date {
                dimension: DateDimension::Start,
                ..
            } => {}
            _ => return Err(illegal()),
        }
        match distributed_by {
            DistributedBy::None | DistributedBy::Variable { .. } => {}
            DistributedBy::Date {
                dimension: DateDimension::Start,
                ..
            } => {}
            _ => return Err(illegal()),
        }
    }

    // Running date cannot nest inside other buckets.
    if matches!(
        distributed_by,
        DistributedBy::Date {
            dimension: DateDimension::Running,
            ..
        }
    ) {
        return Err(illegal());
    }

    let view_scope = view.scope();

    // Element axes must have sub-documents to bucket over.
    match group_by {
        GroupBy::FlowNode => {
            if !matches!(view_scope, Some(s) if s != NESTED_USER_TASKS) {
                return Err(illegal());
            }
        }
        GroupBy::UserTask | GroupBy::Identity { .. } => {
            if view_scope != Some(NESTED_USER_TASKS) {
                return Err(illegal());
            }
        }
        _ => {}
    }

    let group_opens = group_by.opens_scope(view_scope);
    match distributed_by {
        DistributedBy::None => {}
        DistributedBy::FlowNode => {
            if !matches!(view_scope, Some(s) if s != NESTED_USER_TASKS) {
                return Err(illegal());
            }
            // Either nobody has opened the nested scope yet, or the
            // group-by opened the same one.
            if group_opens.is_some() && group_opens != distributed_by.opens_scope(view_scope) {
                return Err(illegal());
            }
        }
        DistributedBy::UserTask | DistributedBy::Identity { .. } => {
            if view_scope != Some(NESTED_USER_TASKS) {
                return Err(illegal());
            }
            if group_opens.is_some() && group_opens != Some(NESTED_USER_TASKS) {
                return Err(illegal());
            }
        }
        // Instance-level distributions cannot sit inside sub-document
        // buckets: there is no way back up the nesting.
        DistributedBy::Process | DistributedBy::Date { .. } | DistributedBy::Variable { .. } => {
            if group_opens.is_some() {
                return Err(illegal());
            }
        }
    }

    // The same dimension on both axes yields a degenerate diagonal.
    if same_dimension(group_by, distributed_by) {
        return Err(illegal());
    }

    Ok(())
}

fn same_dimension(group_by: &GroupBy, distributed_by: &DistributedBy) -> bool {
    match (group_by, distributed_by) {
        (GroupBy::FlowNode, DistributedBy::FlowNode) => true,
        (GroupBy::UserTask, DistributedBy::UserTask) => true,
        (GroupBy::Identity { dimension: a }, DistributedBy::Identity { dimension: b }) => a == b,
        (GroupBy::Variable { name: a, .. }, DistributedBy::Variable { name: b, .. }) => a == b,
        (
            GroupBy::Date { dimension: a, .. },
            DistributedBy::Date { dimension: b, .. },
        ) => a == b,
        _ => false,
    }
}

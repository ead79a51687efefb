//! Definition metadata lookup.
//!
//! Resolves human-readable labels for flow-node/user-task/process keys
//! and answers whether a field exists for the resolved definition
//! versions. Labels populate `label` fields only, never `key` fields.

use crate::model::SubjectType;

/// What kind of key a label is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    Process,
    FlowNode,
    UserTask,
    Assignee,
    CandidateGroup,
}

/// External metadata collaborator.
pub trait DefinitionMetadata: Send + Sync {
    /// A human-readable label for `key`, if one is known.
    fn label(&self, kind: LabelKind, key: &str) -> Option<String>;

    /// Whether the store mapping for the resolved definition versions
    /// exposes `field`. Strategies requiring an unsupported field fail
    /// the plan build, never silently return zero.
    fn supports_field(
        &self,
        subject: SubjectType,
        definition_key: &str,
        definition_versions: &[String],
        field: &str,
    ) -> bool {
        let _ = (subject, definition_key, definition_versions, field);
        true
    }
}

/// Metadata lookup that knows nothing: no labels, every field supported.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMetadata;

impl DefinitionMetadata for NoMetadata {
    fn label(&self, _kind: LabelKind, _key: &str) -> Option<String> {
        None
    }
}

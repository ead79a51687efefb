// src/model/fields.rs
//
// Document field names shared between query assembly and the store
// clients. Paths inside nested sub-documents are relative to the
// sub-document root.

pub const FIELD_DEFINITION_KEY: &str = "definitionKey";
pub const FIELD_DEFINITION_VERSION: &str = "definitionVersion";
pub const FIELD_TENANT_ID: &str = "tenantId";
pub const FIELD_STATE: &str = "state";
pub const FIELD_START_DATE: &str = "startDate";
pub const FIELD_END_DATE: &str = "endDate";
pub const FIELD_EVALUATION_DATE: &str = "evaluationDate";
pub const FIELD_DURATION: &str = "durationInMs";

pub const VARIABLE_PREFIX: &str = "variables";

pub const NESTED_FLOW_NODES: &str = "flowNodes";
pub const FIELD_FLOW_NODE_ID: &str = "flowNodeId";

pub const NESTED_USER_TASKS: &str = "userTasks";
pub const FIELD_TASK_ID: &str = "taskId";
pub const FIELD_ASSIGNEE: &str = "assignee";
pub const FIELD_CANDIDATE_GROUPS: &str = "candidateGroups";
pub const FIELD_TOTAL_DURATION: &str = "totalDurationInMs";
pub const FIELD_IDLE_DURATION: &str = "idleDurationInMs";
pub const FIELD_WORK_DURATION: &str = "workDurationInMs";

pub const NESTED_INCIDENTS: &str = "incidents";
pub const FIELD_INCIDENT_STATUS: &str = "status";
pub const INCIDENT_STATUS_RESOLVED: &str = "resolved";

pub const STATE_ACTIVE: &str = "ACTIVE";
pub const STATE_COMPLETED: &str = "COMPLETED";
pub const STATE_CANCELED: &str = "CANCELED";

/// Bucket key under which identity buckets without an assignee (or without
/// any candidate group) are surfaced. Such documents are reported, never
/// silently dropped.
pub const MISSING_IDENTITY_KEY: &str = "__unassigned";

/// Joins a field path to a nested sub-document prefix.
pub fn nested_field(path: &str, field: &str) -> String {
    format!("{path}.{field}")
}

/// The document field holding a variable value.
pub fn variable_field(name: &str) -> String {
    format!("{VARIABLE_PREFIX}.{name}")
}

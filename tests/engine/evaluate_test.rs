//! End-to-end evaluation tests: report definitions driven through the
//! engine against the in-memory store.

use std::sync::Arc;

use async_trait::async_trait;
use facet::cache::PlanCache;
use facet::config::EngineConfig;
use facet::enhancer::DefaultFilterEnhancer;
use facet::meta::{DefinitionMetadata, LabelKind};
use facet::model::{
    AggregationType, ColumnSelection, DateDimension, DateUnit, DateUnitConfig,
    DistributedByConfig, Filter, GroupByConfig, IdentityDimension, Pagination, ReportDefinition,
    SubjectType, UserTaskDurationVariant, VariableType, ViewConfig,
};
use facet::plan::{EvaluationError, ExecutionContext, PlanConfigurationError};
use facet::prelude::{MemoryStore, ReportEngine};
use facet::query::{SearchQuery, SearchResponse};
use facet::result::{ReportData, ResultType};
use facet::store::{StoreClient, StoreResult};
use serde_json::{json, Value};

const DEFINITION_KEY: &str = "invoice";

fn definition(
    view: ViewConfig,
    group_by: GroupByConfig,
    distributed_by: DistributedByConfig,
) -> ReportDefinition {
    ReportDefinition {
        subject: SubjectType::Process,
        definition_key: DEFINITION_KEY.to_string(),
        definition_versions: Vec::new(),
        tenant_ids: Vec::new(),
        view,
        group_by,
        distributed_by,
        filters: Vec::new(),
        sorting: None,
    }
}

fn instance(region: &str, duration: u64, start: &str) -> Value {
    json!({
        "definitionKey": DEFINITION_KEY,
        "definitionVersion": "1",
        "tenantId": null,
        "state": "COMPLETED",
        "startDate": start,
        "endDate": "2026-01-30T00:00:00Z",
        "durationInMs": duration,
        "variables": {"region": region},
    })
}

fn engine_with(docs: Vec<Value>) -> ReportEngine {
    ReportEngine::with_defaults(Arc::new(MemoryStore::with_documents(docs)))
}

#[tokio::test]
async fn test_average_duration_as_number() {
    let engine = engine_with(vec![
        instance("eu", 100, "2026-01-01T08:00:00Z"),
        instance("eu", 200, "2026-01-01T09:00:00Z"),
        instance("us", 300, "2026-01-01T10:00:00Z"),
    ]);
    let ctx = ExecutionContext::new(definition(
        ViewConfig::InstanceDuration {
            aggregation: AggregationType::Avg,
        },
        GroupByConfig::None,
        DistributedByConfig::None,
    ));

    let result = engine.evaluate(&ctx).await.unwrap();
    assert_eq!(result.result_type(), ResultType::Number);
    assert_eq!(result.as_number(), Some(200.0));
    assert_eq!(result.instance_count, 3);
    assert_eq!(result.instance_count_without_filters, 3);
}

#[tokio::test]
async fn test_date_buckets_follow_the_caller_timezone() {
    // 23:30 UTC on Jan 1 is already Jan 2 in Berlin.
    let engine = engine_with(vec![instance("eu", 100, "2026-01-01T23:30:00Z")]);
    let ctx = ExecutionContext::new(definition(
        ViewConfig::InstanceFrequency,
        GroupByConfig::Date {
            dimension: DateDimension::Start,
            unit: DateUnitConfig::Fixed {
                unit: DateUnit::Day,
            },
        },
        DistributedByConfig::None,
    ))
    .with_timezone("Europe/Berlin".parse().unwrap());

    let result = engine.evaluate(&ctx).await.unwrap();
    let entries = result.as_map().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].key, "2026-01-02T00:00:00.000+01:00");
}

#[tokio::test]
async fn test_number_result_distinguishes_no_data_from_zero() {
    let engine = engine_with(Vec::new());
    let ctx = ExecutionContext::new(definition(
        ViewConfig::InstanceDuration {
            aggregation: AggregationType::Avg,
        },
        GroupByConfig::None,
        DistributedByConfig::None,
    ));

    let result = engine.evaluate(&ctx).await.unwrap();
    assert_eq!(result.data, ReportData::Number(None));
    assert_eq!(result.instance_count, 0);
}

#[tokio::test]
async fn test_frequency_grouped_by_variable() {
    let engine = engine_with(vec![
        instance("eu", 100, "2026-01-01T08:00:00Z"),
        instance("eu", 200, "2026-01-02T08:00:00Z"),
        instance("us", 300, "2026-01-03T08:00:00Z"),
    ]);
    let ctx = ExecutionContext::new(definition(
        ViewConfig::InstanceFrequency,
        GroupByConfig::Variable {
            name: "region".to_string(),
            var_type: VariableType::String,
        },
        DistributedByConfig::None,
    ));

    let result = engine.evaluate(&ctx).await.unwrap();
    let entries = result.as_map().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!((entries[0].key.as_str(), entries[0].value), ("eu", Some(2.0)));
    assert_eq!((entries[1].key.as_str(), entries[1].value), ("us", Some(1.0)));
}

#[tokio::test]
async fn test_numeric_variable_buckets_sort_numerically() {
    let mut docs = Vec::new();
    for amount in [10, 2, 3] {
        let mut doc = instance("eu", 100, "2026-01-01T08:00:00Z");
        doc["variables"]["amount"] = json!(amount);
        docs.push(doc);
    }
    let engine = engine_with(docs);
    let ctx = ExecutionContext::new(definition(
        ViewConfig::InstanceFrequency,
        GroupByConfig::Variable {
            name: "amount".to_string(),
            var_type: VariableType::Integer,
        },
        DistributedByConfig::None,
    ));

    let result = engine.evaluate(&ctx).await.unwrap();
    let keys: Vec<&str> = result
        .as_map()
        .unwrap()
        .iter()
        .map(|e| e.key.as_str())
        .collect();
    // Numeric key space: 2 before 10, which a lexical sort would invert.
    assert_eq!(keys, vec!["2", "3", "10"]);
}

#[tokio::test]
async fn test_automatic_date_unit_picks_days_for_a_ten_day_range() {
    let docs: Vec<Value> = (1..=10)
        .map(|day| {
            instance(
                "eu",
                100,
                &format!("2026-01-{day:02}T1{}:30:00Z", day % 10),
            )
        })
        .collect();
    let engine = engine_with(docs);
    let ctx = ExecutionContext::new(definition(
        ViewConfig::InstanceFrequency,
        GroupByConfig::Date {
            dimension: DateDimension::Start,
            unit: DateUnitConfig::Automatic,
        },
        DistributedByConfig::None,
    ));

    let result = engine.evaluate(&ctx).await.unwrap();
    let entries = result.as_map().unwrap();
    assert_eq!(entries.len(), 10);
    // Daily buckets: every key is a midnight boundary.
    for entry in entries {
        assert!(
            entry.key.ends_with("T00:00:00.000+00:00"),
            "expected a day boundary, got {}",
            entry.key
        );
        assert_eq!(entry.value, Some(1.0));
    }
}

#[tokio::test]
async fn test_running_date_counts_active_instances_per_bucket() {
    let mut a = instance("eu", 100, "2026-01-01T05:00:00Z");
    a["endDate"] = json!("2026-01-03T10:00:00Z");
    let mut b = instance("eu", 100, "2026-01-02T01:00:00Z");
    b["endDate"] = json!("2026-01-02T12:00:00Z");

    let engine = engine_with(vec![a, b]);
    let ctx = ExecutionContext::new(definition(
        ViewConfig::InstanceFrequency,
        GroupByConfig::Date {
            dimension: DateDimension::Running,
            unit: DateUnitConfig::Fixed {
                unit: DateUnit::Day,
            },
        },
        DistributedByConfig::None,
    ));

    let result = engine.evaluate(&ctx).await.unwrap();
    let counts: Vec<Option<f64>> = result.as_map().unwrap().iter().map(|e| e.value).collect();
    // One instance spans all three days, the other only the second.
    assert_eq!(counts, vec![Some(1.0), Some(2.0), Some(1.0)]);
}

#[tokio::test]
async fn test_flow_node_frequency_hyper_map() {
    let mut day1 = instance("eu", 100, "2026-01-01T08:00:00Z");
    day1["flowNodes"] = json!([
        {"flowNodeId": "approve", "durationInMs": 50},
        {"flowNodeId": "review", "durationInMs": 70},
    ]);
    let mut day2 = instance("eu", 100, "2026-01-02T08:00:00Z");
    day2["flowNodes"] = json!([{"flowNodeId": "approve", "durationInMs": 90}]);

    let engine = engine_with(vec![day1, day2]);
    let ctx = ExecutionContext::new(definition(
        ViewConfig::FlowNodeFrequency,
        GroupByConfig::Date {
            dimension: DateDimension::Start,
            unit: DateUnitConfig::Fixed {
                unit: DateUnit::Day,
            },
        },
        DistributedByConfig::FlowNode,
    ));

    let result = engine.evaluate(&ctx).await.unwrap();
    let entries = result.as_hyper_map().unwrap();
    assert_eq!(entries.len(), 2);

    let first: Vec<(&str, Option<f64>)> = entries[0]
        .entries
        .iter()
        .map(|e| (e.key.as_str(), e.value))
        .collect();
    assert_eq!(first, vec![("approve", Some(1.0)), ("review", Some(1.0))]);

    let second: Vec<(&str, Option<f64>)> = entries[1]
        .entries
        .iter()
        .map(|e| (e.key.as_str(), e.value))
        .collect();
    assert_eq!(second, vec![("approve", Some(1.0))]);
}

#[tokio::test]
async fn test_unassigned_tasks_surface_under_sentinel_key() {
    let mut with_assignee = instance("eu", 100, "2026-01-01T08:00:00Z");
    with_assignee["userTasks"] = json!([
        {"taskId": "approve", "assignee": "demo", "totalDurationInMs": 100},
    ]);
    let mut without_assignee = instance("eu", 100, "2026-01-02T08:00:00Z");
    without_assignee["userTasks"] = json!([
        {"taskId": "approve", "totalDurationInMs": 300},
    ]);

    let engine = engine_with(vec![with_assignee, without_assignee]);
    let ctx = ExecutionContext::new(definition(
        ViewConfig::UserTaskFrequency,
        GroupByConfig::Identity {
            dimension: IdentityDimension::Assignee,
        },
        DistributedByConfig::None,
    ));

    let result = engine.evaluate(&ctx).await.unwrap();
    let keys: Vec<&str> = result
        .as_map()
        .unwrap()
        .iter()
        .map(|e| e.key.as_str())
        .collect();
    assert_eq!(keys, vec!["__unassigned", "demo"]);
}

#[tokio::test]
async fn test_user_task_work_duration_with_labels() {
    struct TaskNames;
    impl DefinitionMetadata for TaskNames {
        fn label(&self, kind: LabelKind, key: &str) -> Option<String> {
            match (kind, key) {
                (LabelKind::UserTask, "approve") => Some("Approve Invoice".to_string()),
                _ => None,
            }
        }
    }

    let mut doc = instance("eu", 100, "2026-01-01T08:00:00Z");
    doc["userTasks"] = json!([
        {"taskId": "approve", "assignee": "demo",
         "totalDurationInMs": 500, "idleDurationInMs": 200, "workDurationInMs": 300},
    ]);

    let engine = ReportEngine::new(
        Arc::new(MemoryStore::with_documents(vec![doc])),
        Arc::new(DefaultFilterEnhancer),
        Arc::new(TaskNames),
        PlanCache::default(),
        EngineConfig::default(),
    );
    let ctx = ExecutionContext::new(definition(
        ViewConfig::UserTaskDuration {
            aggregation: AggregationType::Avg,
            variant: UserTaskDurationVariant::Work,
        },
        GroupByConfig::UserTask,
        DistributedByConfig::None,
    ));

    let result = engine.evaluate(&ctx).await.unwrap();
    let entries = result.as_map().unwrap();
    assert_eq!(entries.len(), 1);
    // The work variant reads its own stored field, not a subtraction.
    assert_eq!(entries[0].value, Some(300.0));
    assert_eq!(entries[0].key, "approve");
    assert_eq!(entries[0].label, "Approve Invoice");
}

#[tokio::test]
async fn test_incident_duration_measures_resolved_incidents_only() {
    let mut doc = instance("eu", 100, "2026-01-01T08:00:00Z");
    doc["incidents"] = json!([
        {"flowNodeId": "approve", "status": "resolved", "durationInMs": 100},
        {"flowNodeId": "approve", "status": "open", "durationInMs": 9999},
        {"flowNodeId": "review", "status": "resolved", "durationInMs": 300},
    ]);

    let engine = engine_with(vec![doc]);
    let ctx = ExecutionContext::new(definition(
        ViewConfig::IncidentDuration {
            aggregation: AggregationType::Avg,
        },
        GroupByConfig::None,
        DistributedByConfig::None,
    ));

    let result = engine.evaluate(&ctx).await.unwrap();
    assert_eq!(result.as_number(), Some(200.0));
}

#[tokio::test]
async fn test_filters_narrow_the_instance_count_but_not_the_total() {
    let engine = engine_with(vec![
        instance("eu", 100, "2026-01-01T08:00:00Z"),
        instance("eu", 200, "2026-01-02T08:00:00Z"),
        instance("us", 300, "2026-01-03T08:00:00Z"),
    ]);
    let mut def = definition(
        ViewConfig::InstanceFrequency,
        GroupByConfig::None,
        DistributedByConfig::None,
    );
    def.filters = vec![Filter::VariableEquals {
        name: "region".to_string(),
        value: json!("eu"),
    }];
    let ctx = ExecutionContext::new(def);

    let result = engine.evaluate(&ctx).await.unwrap();
    assert_eq!(result.as_number(), Some(2.0));
    assert_eq!(result.instance_count, 2);
    assert_eq!(result.instance_count_without_filters, 3);
}

#[tokio::test]
async fn test_raw_listing_projects_and_paginates() {
    let engine = engine_with(vec![
        instance("eu", 100, "2026-01-01T08:00:00Z"),
        instance("eu", 200, "2026-01-02T08:00:00Z"),
        instance("us", 300, "2026-01-03T08:00:00Z"),
    ]);
    let ctx = ExecutionContext::new(definition(
        ViewConfig::RawInstances {
            columns: ColumnSelection {
                includes: vec!["startDate".to_string(), "durationInMs".to_string()],
                excludes: Vec::new(),
            },
        },
        GroupByConfig::None,
        DistributedByConfig::None,
    ))
    .with_pagination(Pagination { offset: 1, limit: 1 });

    let result = engine.evaluate(&ctx).await.unwrap();
    let rows = result.as_raw().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0],
        json!({"startDate": "2026-01-02T08:00:00Z", "durationInMs": 200})
    );
    // The count covers all matching instances, not the page.
    assert_eq!(result.instance_count, 3);
}

#[tokio::test(start_paused = true)]
async fn test_store_deadline_surfaces_as_cancellation() {
    struct StalledStore;

    #[async_trait]
    impl StoreClient for StalledStore {
        async fn search(&self, _query: &SearchQuery) -> StoreResult<SearchResponse> {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
            Ok(SearchResponse::default())
        }
    }

    let engine = ReportEngine::new(
        Arc::new(StalledStore),
        Arc::new(DefaultFilterEnhancer),
        Arc::new(facet::meta::NoMetadata),
        PlanCache::default(),
        EngineConfig {
            query_timeout_ms: 50,
            ..EngineConfig::default()
        },
    );
    let ctx = ExecutionContext::new(definition(
        ViewConfig::InstanceFrequency,
        GroupByConfig::None,
        DistributedByConfig::None,
    ));

    match engine.evaluate(&ctx).await {
        Err(EvaluationError::Cancelled(_)) => {}
        other => panic!("expected cancellation, got {other:?}"),
    }
}

#[tokio::test]
async fn test_version_gate_runs_even_on_cache_hits() {
    struct LegacyMapping;
    impl DefinitionMetadata for LegacyMapping {
        fn label(&self, _kind: LabelKind, _key: &str) -> Option<String> {
            None
        }
        fn supports_field(
            &self,
            _subject: SubjectType,
            _definition_key: &str,
            versions: &[String],
            field: &str,
        ) -> bool {
            field != "userTasks.workDurationInMs" || versions != ["1"]
        }
    }

    let engine = ReportEngine::new(
        Arc::new(MemoryStore::new()),
        Arc::new(DefaultFilterEnhancer),
        Arc::new(LegacyMapping),
        PlanCache::default(),
        EngineConfig::default(),
    );

    let mut def = definition(
        ViewConfig::UserTaskDuration {
            aggregation: AggregationType::Avg,
            variant: UserTaskDurationVariant::Work,
        },
        GroupByConfig::UserTask,
        DistributedByConfig::None,
    );
    def.definition_versions = vec!["2".to_string()];
    // Supported version: the plan builds and lands in the cache.
    assert!(engine.plan_for(&def).is_ok());

    // Same shape, older version: the cached plan must still be gated.
    def.definition_versions = vec!["1".to_string()];
    let err = engine.evaluate(&ExecutionContext::new(def)).await.unwrap_err();
    match err {
        EvaluationError::Configuration(
            PlanConfigurationError::UnsupportedViewForVersion { field },
        ) => assert_eq!(field, "userTasks.workDurationInMs"),
        other => panic!("expected version gate, got {other:?}"),
    }
}

//! Command-key determinism and combinability tests.

use std::sync::Arc;

use facet::model::{
    AggregationType, DateDimension, DateUnit, DateUnitConfig, DistributedByConfig, Filter,
    GroupByConfig, InstanceState, ReportDefinition, SubjectType, UserTaskDurationVariant,
    ViewConfig,
};
use facet::plan::is_combinable;
use facet::prelude::{MemoryStore, ReportEngine};

fn definition(
    view: ViewConfig,
    group_by: GroupByConfig,
    distributed_by: DistributedByConfig,
) -> ReportDefinition {
    ReportDefinition {
        subject: SubjectType::Process,
        definition_key: "invoice".to_string(),
        definition_versions: Vec::new(),
        tenant_ids: Vec::new(),
        view,
        group_by,
        distributed_by,
        filters: Vec::new(),
        sorting: None,
    }
}

fn engine() -> ReportEngine {
    ReportEngine::with_defaults(Arc::new(MemoryStore::new()))
}

fn date_group_by(dimension: DateDimension, unit: DateUnitConfig) -> GroupByConfig {
    GroupByConfig::Date { dimension, unit }
}

#[test]
fn test_command_key_is_deterministic_and_filter_independent() {
    let engine = engine();
    let mut a = definition(
        ViewConfig::InstanceDuration {
            aggregation: AggregationType::Avg,
        },
        date_group_by(DateDimension::Start, DateUnitConfig::Automatic),
        DistributedByConfig::None,
    );
    let mut b = a.clone();

    // Filters, tenants and versions never reach the key.
    a.filters = vec![Filter::InstanceState {
        state: InstanceState::Completed,
    }];
    b.definition_versions = vec!["7".to_string()];
    b.tenant_ids = vec![Some("tenant-a".to_string())];

    let key_a = engine.plan_for(&a).unwrap().command_key().to_string();
    let key_b = engine.plan_for(&b).unwrap().command_key().to_string();
    assert_eq!(key_a, key_b);

    insta::assert_snapshot!(
        key_a,
        @"process:instanceDuration:duration.avg:byStartDate.automatic:distributedByNone"
    );
}

#[test]
fn test_command_key_embeds_shape_components() {
    let engine = engine();
    let key = engine
        .plan_for(&definition(
            ViewConfig::UserTaskDuration {
                aggregation: AggregationType::Percentile { p: 95.0 },
                variant: UserTaskDurationVariant::Work,
            },
            GroupByConfig::UserTask,
            DistributedByConfig::Identity {
                dimension: facet::model::IdentityDimension::Assignee,
            },
        ))
        .unwrap()
        .command_key()
        .to_string();

    insta::assert_snapshot!(
        key,
        @"process:userTaskDuration:duration.work.p95:byUserTask:distributedByAssignee"
    );

    let variable_key = engine
        .plan_for(&definition(
            ViewConfig::InstanceFrequency,
            GroupByConfig::Variable {
                name: "region".to_string(),
                var_type: facet::model::VariableType::String,
            },
            DistributedByConfig::None,
        ))
        .unwrap()
        .command_key()
        .to_string();

    insta::assert_snapshot!(
        variable_key,
        @"process:instanceFrequency:frequency:byVariable.region.string:distributedByNone"
    );
}

#[test]
fn test_equal_keys_share_the_cached_plan() {
    let engine = engine();
    let def = definition(
        ViewConfig::InstanceFrequency,
        GroupByConfig::None,
        DistributedByConfig::None,
    );
    let first = engine.plan_for(&def).unwrap();
    let second = engine.plan_for(&def).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_date_group_bys_combine_across_date_dimensions() {
    let engine = engine();
    let unit = DateUnitConfig::Fixed {
        unit: DateUnit::Day,
    };
    let start = engine
        .plan_for(&definition(
            ViewConfig::InstanceFrequency,
            date_group_by(DateDimension::Start, unit),
            DistributedByConfig::None,
        ))
        .unwrap();
    let end = engine
        .plan_for(&definition(
            ViewConfig::InstanceFrequency,
            date_group_by(DateDimension::End, unit),
            DistributedByConfig::None,
        ))
        .unwrap();
    let running = engine
        .plan_for(&definition(
            ViewConfig::InstanceFrequency,
            date_group_by(DateDimension::Running, unit),
            DistributedByConfig::None,
        ))
        .unwrap();

    assert!(is_combinable(&start, &end));
    assert!(is_combinable(&start, &running));

    // Different bucket shapes do not combine.
    let monthly = engine
        .plan_for(&definition(
            ViewConfig::InstanceFrequency,
            date_group_by(
                DateDimension::Start,
                DateUnitConfig::Fixed {
                    unit: DateUnit::Month,
                },
            ),
            DistributedByConfig::None,
        ))
        .unwrap();
    assert!(!is_combinable(&start, &monthly));
}

#[test]
fn test_views_combine_only_with_matching_aggregation() {
    let engine = engine();
    let group_by = date_group_by(
        DateDimension::Start,
        DateUnitConfig::Fixed {
            unit: DateUnit::Day,
        },
    );
    let avg = |agg| {
        definition(
            ViewConfig::InstanceDuration { aggregation: agg },
            group_by.clone(),
            DistributedByConfig::None,
        )
    };

    assert!(engine.combinable(&avg(AggregationType::Avg), &avg(AggregationType::Avg)));
    assert!(!engine.combinable(&avg(AggregationType::Avg), &avg(AggregationType::Max)));

    // Frequency and duration never share a chart.
    let frequency = definition(
        ViewConfig::InstanceFrequency,
        group_by.clone(),
        DistributedByConfig::None,
    );
    assert!(!engine.combinable(&avg(AggregationType::Avg), &frequency));
}

#[test]
fn test_distribution_must_match_by_type() {
    let engine = engine();
    let base = |distributed_by| {
        definition(
            ViewConfig::UserTaskFrequency,
            GroupByConfig::UserTask,
            distributed_by,
        )
    };

    assert!(engine.combinable(
        &base(DistributedByConfig::Identity {
            dimension: facet::model::IdentityDimension::Assignee,
        }),
        &base(DistributedByConfig::Identity {
            dimension: facet::model::IdentityDimension::CandidateGroup,
        }),
    ));
    assert!(!engine.combinable(
        &base(DistributedByConfig::Identity {
            dimension: facet::model::IdentityDimension::Assignee,
        }),
        &base(DistributedByConfig::None),
    ));
}

//! In-memory store client tests: the full query vocabulary evaluated
//! over JSON documents.

use facet::model::{ColumnSelection, DateUnit};
use facet::query::{
    Aggregation, AggregationResult, FilterExpr, MetricFunction, NamedAggregation, SearchQuery,
};
use facet::store::{MemoryStore, StoreClient};
use serde_json::{json, Value};

fn store_with(docs: Vec<Value>) -> MemoryStore {
    MemoryStore::with_documents(docs)
}

fn metric(name: &str, function: MetricFunction, field: &str) -> NamedAggregation {
    NamedAggregation::new(
        name,
        Aggregation::Metric {
            function,
            field: field.to_string(),
        },
        Vec::new(),
    )
}

#[tokio::test]
async fn test_terms_with_sub_metric() {
    let store = store_with(vec![
        json!({"region": "eu", "durationInMs": 100}),
        json!({"region": "eu", "durationInMs": 300}),
        json!({"region": "us", "durationInMs": 500}),
    ]);
    let query = SearchQuery::aggregations(
        FilterExpr::MatchAll,
        vec![NamedAggregation::new(
            "byRegion",
            Aggregation::Terms {
                field: "region".to_string(),
                size: 10,
                missing: None,
            },
            vec![metric("avg", MetricFunction::Avg, "durationInMs")],
        )],
    );

    let response = store.search(&query).await.unwrap();
    assert_eq!(response.total_hits, 3);

    let buckets = response.aggregations.buckets("byRegion").unwrap();
    assert_eq!(buckets.len(), 2);
    assert_eq!(buckets[0].key_string(), "eu");
    assert_eq!(buckets[0].doc_count, 2);
    assert_eq!(buckets[0].aggregations.metric("avg"), Some(Some(200.0)));
    assert_eq!(buckets[1].key_string(), "us");
    assert_eq!(buckets[1].aggregations.metric("avg"), Some(Some(500.0)));
}

#[tokio::test]
async fn test_terms_surfaces_missing_and_array_values() {
    let store = store_with(vec![
        json!({"userTasks": [{"candidateGroups": ["sales", "support"]}]}),
        json!({"userTasks": [{"candidateGroups": []}]}),
    ]);
    let query = SearchQuery::aggregations(
        FilterExpr::MatchAll,
        vec![NamedAggregation::new(
            "tasks",
            Aggregation::Nested {
                path: "userTasks".to_string(),
            },
            vec![NamedAggregation::new(
                "byGroup",
                Aggregation::Terms {
                    field: "candidateGroups".to_string(),
                    size: 10,
                    missing: Some(json!("__unassigned")),
                },
                Vec::new(),
            )],
        )],
    );

    let response = store.search(&query).await.unwrap();
    let tasks = response.aggregations.single("tasks").unwrap();
    let buckets = tasks.aggregations.buckets("byGroup").unwrap();
    let keys: Vec<String> = buckets.iter().map(|b| b.key_string()).collect();
    assert_eq!(keys, vec!["__unassigned", "sales", "support"]);
}

#[tokio::test]
async fn test_date_histogram_truncates_in_timezone() {
    let store = store_with(vec![
        json!({"startDate": "2026-01-05T10:30:00Z"}),
        json!({"startDate": "2026-01-20T23:59:00Z"}),
        json!({"startDate": "2026-02-01T00:00:00Z"}),
    ]);
    let query = SearchQuery::aggregations(
        FilterExpr::MatchAll,
        vec![NamedAggregation::new(
            "byMonth",
            Aggregation::DateHistogram {
                field: "startDate".to_string(),
                unit: DateUnit::Month,
                timezone: "UTC".to_string(),
            },
            Vec::new(),
        )],
    );

    let response = store.search(&query).await.unwrap();
    let buckets = response.aggregations.buckets("byMonth").unwrap();
    assert_eq!(buckets.len(), 2);
    assert_eq!(buckets[0].key_string(), "2026-01-01T00:00:00.000+00:00");
    assert_eq!(buckets[0].doc_count, 2);
    assert_eq!(buckets[1].key_string(), "2026-02-01T00:00:00.000+00:00");
}

#[tokio::test]
async fn test_percentile_interpolates_and_empty_is_none() {
    let store = store_with(vec![
        json!({"durationInMs": 10}),
        json!({"durationInMs": 20}),
        json!({"durationInMs": 30}),
    ]);
    let query = SearchQuery::aggregations(
        FilterExpr::MatchAll,
        vec![
            metric("p50", MetricFunction::Percentile { p: 50.0 }, "durationInMs"),
            metric("p100", MetricFunction::Percentile { p: 100.0 }, "durationInMs"),
            metric("none", MetricFunction::Avg, "unknownField"),
        ],
    );

    let response = store.search(&query).await.unwrap();
    assert_eq!(response.aggregations.metric("p50"), Some(Some(20.0)));
    assert_eq!(response.aggregations.metric("p100"), Some(Some(30.0)));
    // No values at all: the metric reports no data, not zero.
    assert_eq!(response.aggregations.metric("none"), Some(None));
}

#[tokio::test]
async fn test_filter_aggregation_and_nested_scope() {
    let store = store_with(vec![
        json!({"incidents": [
            {"status": "resolved", "durationInMs": 100},
            {"status": "open", "durationInMs": 999},
        ]}),
        json!({"incidents": [{"status": "resolved", "durationInMs": 300}]}),
    ]);
    let query = SearchQuery::aggregations(
        FilterExpr::MatchAll,
        vec![NamedAggregation::new(
            "incidents",
            Aggregation::Nested {
                path: "incidents".to_string(),
            },
            vec![NamedAggregation::new(
                "resolved",
                Aggregation::Filter {
                    filter: FilterExpr::term("status", "resolved"),
                },
                vec![metric("avg", MetricFunction::Avg, "durationInMs")],
            )],
        )],
    );

    let response = store.search(&query).await.unwrap();
    let incidents = response.aggregations.single("incidents").unwrap();
    assert_eq!(incidents.doc_count, 3);
    let resolved = incidents.aggregations.single("resolved").unwrap();
    assert_eq!(resolved.doc_count, 2);
    assert_eq!(resolved.aggregations.metric("avg"), Some(Some(200.0)));
}

#[tokio::test]
async fn test_date_range_filters_compare_chronologically() {
    let store = store_with(vec![
        json!({"id": "early", "startDate": "2026-01-01T00:00:00Z"}),
        json!({"id": "late", "startDate": "2026-06-01T00:00:00Z"}),
    ]);
    let query = SearchQuery::count(
        FilterExpr::range("startDate")
            .gte("2026-03-01T00:00:00Z")
            .build(),
    );
    let response = store.search(&query).await.unwrap();
    assert_eq!(response.total_hits, 1);
}

#[tokio::test]
async fn test_histogram_buckets_anchor_at_offset() {
    let store = store_with(vec![
        json!({"amount": 12}),
        json!({"amount": 14}),
        json!({"amount": 27}),
    ]);
    let query = SearchQuery::aggregations(
        FilterExpr::MatchAll,
        vec![NamedAggregation::new(
            "byAmount",
            Aggregation::Histogram {
                field: "amount".to_string(),
                interval: 10.0,
                offset: 12.0,
            },
            Vec::new(),
        )],
    );
    let response = store.search(&query).await.unwrap();
    let buckets = response.aggregations.buckets("byAmount").unwrap();
    let keys: Vec<String> = buckets.iter().map(|b| b.key_string()).collect();
    assert_eq!(keys, vec!["12", "22"]);
    assert_eq!(buckets[0].doc_count, 2);
}

#[tokio::test]
async fn test_row_projection_and_pagination() {
    let store = store_with(vec![
        json!({"id": "a", "state": "ACTIVE", "internal": 1}),
        json!({"id": "b", "state": "ACTIVE", "internal": 2}),
        json!({"id": "c", "state": "ACTIVE", "internal": 3}),
    ]);
    let query = SearchQuery::rows(
        FilterExpr::MatchAll,
        1,
        1,
        ColumnSelection {
            includes: vec!["id".to_string(), "state".to_string()],
            excludes: vec!["state".to_string()],
        },
    );

    let response = store.search(&query).await.unwrap();
    // Total hits ignore pagination.
    assert_eq!(response.total_hits, 3);
    assert_eq!(response.rows, vec![json!({"id": "b"})]);
}

#[tokio::test]
async fn test_bool_filter_combinations() {
    let store = store_with(vec![
        json!({"state": "ACTIVE", "tenantId": null}),
        json!({"state": "COMPLETED", "tenantId": "t1"}),
    ]);

    let query = SearchQuery::count(FilterExpr::Bool {
        must: vec![FilterExpr::term("tenantId", Value::Null)],
        should: Vec::new(),
        must_not: vec![FilterExpr::term("state", "COMPLETED")],
    });
    let response = store.search(&query).await.unwrap();
    assert_eq!(response.total_hits, 1);

    // Unknown timezone surfaces as an error, not as empty buckets.
    let bad = SearchQuery::aggregations(
        FilterExpr::MatchAll,
        vec![NamedAggregation::new(
            "byDay",
            Aggregation::DateHistogram {
                field: "startDate".to_string(),
                unit: DateUnit::Day,
                timezone: "Not/AZone".to_string(),
            },
            Vec::new(),
        )],
    );
    assert!(store.search(&bad).await.is_err());
}

#[tokio::test]
async fn test_filters_aggregation_buckets_overlap() {
    let store = store_with(vec![json!({"v": 1}), json!({"v": 5})]);
    let query = SearchQuery::aggregations(
        FilterExpr::MatchAll,
        vec![NamedAggregation::new(
            "ranges",
            Aggregation::Filters {
                buckets: vec![
                    facet::query::FilterBucket {
                        key: "low".to_string(),
                        filter: FilterExpr::range("v").lte(4.0).build(),
                    },
                    facet::query::FilterBucket {
                        key: "all".to_string(),
                        filter: FilterExpr::MatchAll,
                    },
                ],
            },
            Vec::new(),
        )],
    );
    let response = store.search(&query).await.unwrap();
    let buckets = response.aggregations.buckets("ranges").unwrap();
    assert_eq!(buckets[0].key_string(), "low");
    assert_eq!(buckets[0].doc_count, 1);
    assert_eq!(buckets[1].key_string(), "all");
    assert_eq!(buckets[1].doc_count, 2);
}

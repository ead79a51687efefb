//! Result decoding and sorting.
//!
//! Walks the bucket tree bottom-up: the view decodes leaf values, the
//! distributed-by decodes its buckets into map entries, the group-by
//! decodes its buckets into map or hyper-map entries. Default sort is
//! ascending by raw key - numeric when the owning dimension declares
//! numeric keys, lexical otherwise, never by label.

use std::cmp::Ordering;

use crate::meta::{DefinitionMetadata, LabelKind};
use crate::model::{SortBy, SortConfig, SortOrder};
use crate::query::SearchResponse;
use crate::result::{HyperMapEntry, MapEntry, ReportData, ResultType};

use super::context::{ExecutionContext, IdentifierStack};
use super::dimension::DecodedBucket;
use super::error::EvaluationResult;
use super::group_by::GroupBy;
use super::plan::ExecutionPlan;

pub(crate) fn decode(
    plan: &ExecutionPlan,
    ctx: &ExecutionContext,
    metadata: &dyn DefinitionMetadata,
    response: &SearchResponse,
) -> EvaluationResult<ReportData> {
    let (group_ns, dist_ns, view_ns) = plan.namespaces(&ctx.identifiers);
    let view_scope = plan.view().scope();
    let sorting = ctx.definition.sorting;

    match plan.result_shape() {
        ResultType::Raw => Ok(ReportData::Raw(response.rows.clone())),

        ResultType::Number => {
            let value = plan.view().extract(
                &view_ns,
                &response.aggregations,
                plan.view_scope_already_open(),
            )?;
            Ok(ReportData::Number(value))
        }

        ResultType::Map => {
            // Exactly one axis is active; the other is `None`.
            let mut entries = match plan.group_by() {
                GroupBy::None => {
                    let buckets = plan.distributed_by().decode_buckets(
                        &dist_ns,
                        view_scope,
                        plan.distribute_scope_already_open(),
                        &response.aggregations,
                    )?;
                    decode_entries(
                        plan,
                        metadata,
                        plan.distributed_by().label_kind(),
                        &view_ns,
                        buckets,
                    )?
                }
                _ => {
                    let buckets = plan.group_by().decode_buckets(
                        &group_ns,
                        view_scope,
                        &response.aggregations,
                    )?;
                    decode_entries(
                        plan,
                        metadata,
                        plan.group_by().label_kind(),
                        &view_ns,
                        buckets,
                    )?
                }
            };
            let numeric = match plan.group_by() {
                GroupBy::None => plan.distributed_by().is_key_of_numeric_type(),
                group_by => group_by.is_key_numeric(),
            };
            sort_map_entries(&mut entries, numeric, sorting);
            Ok(ReportData::Map(entries))
        }

        ResultType::HyperMap => {
            let group_buckets = plan.group_by().decode_buckets(
                &group_ns,
                view_scope,
                &response.aggregations,
            )?;
            let mut entries = Vec::with_capacity(group_buckets.len());
            for bucket in group_buckets {
                let inner_buckets = plan.distributed_by().decode_buckets(
                    &dist_ns,
                    view_scope,
                    plan.distribute_scope_already_open(),
                    bucket.aggregations,
                )?;
                let mut inner = decode_entries(
                    plan,
                    metadata,
                    plan.distributed_by().label_kind(),
                    &view_ns,
                    inner_buckets,
                )?;
                // Distribution entries always carry the default order;
                // explicit sorting applies to the outer dimension.
                sort_map_entries(&mut inner, plan.distributed_by().is_key_of_numeric_type(), None);
                entries.push(HyperMapEntry {
                    label: resolve_label(metadata, plan.group_by().label_kind(), &bucket.key),
                    key: bucket.key,
                    entries: inner,
                });
            }
            sort_hyper_entries(&mut entries, plan.group_by().is_key_numeric(), sorting);
            Ok(ReportData::HyperMap(entries))
        }
    }
}

fn decode_entries(
    plan: &ExecutionPlan,
    metadata: &dyn DefinitionMetadata,
    label_kind: Option<LabelKind>,
    view_ns: &IdentifierStack,
    buckets: Vec<DecodedBucket<'_>>,
) -> EvaluationResult<Vec<MapEntry>> {
    let scope_open = plan.view_scope_already_open();
    buckets
        .into_iter()
        .map(|bucket| {
            let value = plan.view().extract(view_ns, bucket.aggregations, scope_open)?;
            Ok(MapEntry {
                label: resolve_label(metadata, label_kind, &bucket.key),
                key: bucket.key,
                value,
            })
        })
        .collect()
}

/// Labels are presentation only: resolved through the metadata
/// collaborator, falling back to the raw key.
fn resolve_label(
    metadata: &dyn DefinitionMetadata,
    kind: Option<LabelKind>,
    key: &str,
) -> String {
    kind.and_then(|k| metadata.label(k, key))
        .unwrap_or_else(|| key.to_string())
}

// ============================================================================
// Sorting
// ============================================================================

/// Sorts map entries: the caller-supplied sort when present, otherwise
/// ascending by raw key. Stable, applied after decoding, never pushed
/// into the store query.
pub fn sort_map_entries(entries: &mut [MapEntry], numeric_keys: bool, sort: Option<SortConfig>) {
    match sort {
        None => entries.sort_by(|a, b| compare_keys(&a.key, &b.key, numeric_keys)),
        Some(SortConfig { by, order }) => entries.sort_by(|a, b| {
            let ordering = match by {
                SortBy::Key => compare_keys(&a.key, &b.key, numeric_keys),
                SortBy::Label => a.label.cmp(&b.label),
                // Empty buckets sort last regardless of direction.
                SortBy::Value => {
                    return match (a.value, b.value) {
                        (Some(x), Some(y)) => directed(compare_numbers(x, y), order),
                        (Some(_), None) => Ordering::Less,
                        (None, Some(_)) => Ordering::Greater,
                        (None, None) => Ordering::Equal,
                    }
                }
            };
            directed(ordering, order)
        }),
    }
}

fn sort_hyper_entries(
    entries: &mut [HyperMapEntry],
    numeric_keys: bool,
    sort: Option<SortConfig>,
) {
    match sort {
        None => entries.sort_by(|a, b| compare_keys(&a.key, &b.key, numeric_keys)),
        Some(SortConfig { by, order }) => entries.sort_by(|a, b| {
            let ordering = match by {
                SortBy::Key => compare_keys(&a.key, &b.key, numeric_keys),
                SortBy::Label => a.label.cmp(&b.label),
                // A hyper-map bucket has no single value to sort on.
                SortBy::Value => compare_keys(&a.key, &b.key, numeric_keys),
            };
            directed(ordering, order)
        }),
    }
}

fn directed(ordering: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

/// Key comparison: numeric when the owning dimension declares numeric
/// keys and both keys parse, lexical on the raw key otherwise.
fn compare_keys(a: &str, b: &str, numeric: bool) -> Ordering {
    if numeric {
        if let (Ok(x), Ok(y)) = (a.parse::<f64>(), b.parse::<f64>()) {
            return compare_numbers(x, y);
        }
    }
    a.cmp(b)
}

fn compare_numbers(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

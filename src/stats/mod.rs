//! Min/max field statistics.
//!
//! Cheap pre-queries feeding automatic interval sizing and numeric
//! range-bucket boundaries. Stats are scoped to one filtered query and
//! never persisted. Independent fields are fetched concurrently.

use std::collections::HashMap;
use std::time::Duration;

use futures::future::try_join_all;
use tracing::debug;

use crate::query::{Aggregation, FilterExpr, MetricFunction, NamedAggregation, SearchQuery};
use crate::store::{StoreClient, StoreError, StoreResult};

const MIN_AGG: &str = "min";
const MAX_AGG: &str = "max";

/// Observed bounds of one field under one filter set. Date fields are
/// reported as epoch milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxStat {
    pub field: String,
    pub min: f64,
    pub max: f64,
}

/// Min/max stats per field, `None` where the field held no data.
pub type StatsMap = HashMap<String, Option<MinMaxStat>>;

/// Issues min/max pre-queries against the store.
pub struct MinMaxStatsService<'a> {
    store: &'a dyn StoreClient,
    timeout: Duration,
}

impl<'a> MinMaxStatsService<'a> {
    pub fn new(store: &'a dyn StoreClient, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Bounds of `field` under `filter`, or `None` when no document
    /// carries the field.
    pub async fn min_max(
        &self,
        filter: &FilterExpr,
        field: &str,
    ) -> StoreResult<Option<MinMaxStat>> {
        let query = SearchQuery::aggregations(
            filter.clone(),
            vec![
                NamedAggregation::new(
                    MIN_AGG,
                    Aggregation::Metric {
                        function: MetricFunction::Min,
                        field: field.to_string(),
                    },
                    Vec::new(),
                ),
                NamedAggregation::new(
                    MAX_AGG,
                    Aggregation::Metric {
                        function: MetricFunction::Max,
                        field: field.to_string(),
                    },
                    Vec::new(),
                ),
            ],
        );

        let response = tokio::time::timeout(self.timeout, self.store.search(&query))
            .await
            .map_err(|_| StoreError::Timeout(self.timeout.as_millis() as u64))??;

        let min = response.aggregations.metric(MIN_AGG).flatten();
        let max = response.aggregations.metric(MAX_AGG).flatten();
        let stat = match (min, max) {
            (Some(min), Some(max)) => Some(MinMaxStat {
                field: field.to_string(),
                min,
                max,
            }),
            _ => None,
        };
        debug!(field, found = stat.is_some(), "min/max stats resolved");
        Ok(stat)
    }

    /// Fetches stats for all fields concurrently (fire-and-join).
    pub async fn fetch_all(&self, filter: &FilterExpr, fields: &[String]) -> StoreResult<StatsMap> {
        let futures = fields.iter().map(|field| async move {
            let stat = self.min_max(filter, field).await?;
            Ok::<_, StoreError>((field.clone(), stat))
        });
        Ok(try_join_all(futures).await?.into_iter().collect())
    }
}

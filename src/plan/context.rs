//! Per-evaluation context.

use chrono_tz::Tz;

use crate::model::{Filter, Pagination, ReportDefinition};

/// Namespace stack for aggregation names.
///
/// Every aggregation name in the composite query is a pure function of
/// `(namespace, strategy id)`, so leaf aggregations never collide even
/// when one plan nests several named aggregations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierStack {
    segments: Vec<String>,
}

impl IdentifierStack {
    pub fn root() -> Self {
        Self::default()
    }

    /// A copy of this stack with one more segment.
    pub fn pushed(&self, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Self { segments }
    }

    /// The aggregation name for `id` under this namespace.
    pub fn qualify(&self, id: &str) -> String {
        if self.segments.is_empty() {
            id.to_string()
        } else {
            format!("{}_{id}", self.segments.join("_"))
        }
    }
}

/// Everything one evaluation call needs beyond the plan itself.
///
/// Created per call and discarded after; never shared across concurrent
/// evaluations.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub definition: ReportDefinition,
    /// Additional filters beyond the definition's own (e.g. dashboard
    /// level); both sets are enhanced together.
    pub filters: Vec<Filter>,
    pub timezone: Tz,
    pub pagination: Option<Pagination>,
    pub identifiers: IdentifierStack,
}

impl ExecutionContext {
    pub fn new(definition: ReportDefinition) -> Self {
        Self {
            definition,
            filters: Vec::new(),
            timezone: chrono_tz::UTC,
            pagination: None,
            identifiers: IdentifierStack::root(),
        }
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_filters(mut self, filters: Vec<Filter>) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// Seeds the aggregation namespace, for embedders nesting this plan's
    /// aggregations into a larger query.
    pub fn with_identifier(mut self, segment: &str) -> Self {
        self.identifiers = self.identifiers.pushed(segment);
        self
    }

    /// All active filters: the definition's own plus the context's.
    pub fn all_filters(&self) -> Vec<Filter> {
        let mut filters = self.definition.filters.clone();
        filters.extend(self.filters.iter().cloned());
        filters
    }
}

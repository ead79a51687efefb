//! Boolean filter expressions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A store-native boolean filter expression.
///
/// Every variant must be handled by every store client - the compiler
/// enforces this.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FilterExpr {
    MatchAll,

    /// Field equals the value. Matching against an array field matches
    /// any element; `null` matches documents storing an explicit null.
    Term { field: String, value: Value },

    /// Field equals any of the values.
    Terms { field: String, values: Vec<Value> },

    /// Range over a numeric field or an RFC 3339 date field.
    Range {
        field: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        gt: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        gte: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lt: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lte: Option<Value>,
    },

    /// Field is present and non-null.
    Exists { field: String },

    /// Any sub-document under `path` matches the inner filter.
    Nested { path: String, filter: Box<FilterExpr> },

    Bool {
        #[serde(default)]
        must: Vec<FilterExpr>,
        #[serde(default)]
        should: Vec<FilterExpr>,
        #[serde(default)]
        must_not: Vec<FilterExpr>,
    },
}

impl FilterExpr {
    /// Conjunction of all clauses, flattening the trivial cases.
    pub fn all(mut clauses: Vec<FilterExpr>) -> FilterExpr {
        clauses.retain(|c| !matches!(c, FilterExpr::MatchAll));
        match clauses.len() {
            0 => FilterExpr::MatchAll,
            1 => clauses.remove(0),
            _ => FilterExpr::Bool {
                must: clauses,
                should: Vec::new(),
                must_not: Vec::new(),
            },
        }
    }

    pub fn term(field: impl Into<String>, value: impl Into<Value>) -> FilterExpr {
        FilterExpr::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn exists(field: impl Into<String>) -> FilterExpr {
        FilterExpr::Exists {
            field: field.into(),
        }
    }

    pub fn nested(path: impl Into<String>, filter: FilterExpr) -> FilterExpr {
        FilterExpr::Nested {
            path: path.into(),
            filter: Box::new(filter),
        }
    }

    /// Range with only the given bound set.
    pub fn range(field: impl Into<String>) -> RangeBuilder {
        RangeBuilder {
            field: field.into(),
            gt: None,
            gte: None,
            lt: None,
            lte: None,
        }
    }
}

/// Builder for [`FilterExpr::Range`].
#[derive(Debug, Clone)]
#[must_use = "builders have no effect until used"]
pub struct RangeBuilder {
    field: String,
    gt: Option<Value>,
    gte: Option<Value>,
    lt: Option<Value>,
    lte: Option<Value>,
}

impl RangeBuilder {
    pub fn gt(mut self, v: impl Into<Value>) -> Self {
        self.gt = Some(v.into());
        self
    }

    pub fn gte(mut self, v: impl Into<Value>) -> Self {
        self.gte = Some(v.into());
        self
    }

    pub fn lt(mut self, v: impl Into<Value>) -> Self {
        self.lt = Some(v.into());
        self
    }

    pub fn lte(mut self, v: impl Into<Value>) -> Self {
        self.lte = Some(v.into());
        self
    }

    pub fn build(self) -> FilterExpr {
        FilterExpr::Range {
            field: self.field,
            gt: self.gt,
            gte: self.gte,
            lt: self.lt,
            lte: self.lte,
        }
    }
}

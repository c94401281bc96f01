//! Search tasks and the product records assembled from them.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use crate::profiles::StoreId;

/// Text written wherever a field could not be extracted.
pub const UNAVAILABLE: &str = "Unavailable";

/// One item to look up at one store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTask {
    pub store_id: StoreId,
    pub item_query: String,
    /// Zero-based index of the item in the shopping list; doubles as the sheet row offset.
    pub position: usize,
}

/// A value that extraction was attempted for.
///
/// `Unavailable` means the attempt produced nothing; it is never used for
/// "not yet attempted".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue<T> {
    Present(T),
    Unavailable,
}

impl<T> FieldValue<T> {
    #[must_use]
    pub fn is_present(&self) -> bool {
        matches!(self, FieldValue::Present(_))
    }
}

impl<T> From<Option<T>> for FieldValue<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Unavailable, FieldValue::Present)
    }
}

impl<T: fmt::Display> fmt::Display for FieldValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Present(v) => v.fmt(f),
            FieldValue::Unavailable => f.pad(UNAVAILABLE),
        }
    }
}

impl<T: Serialize> Serialize for FieldValue<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Present(v) => v.serialize(serializer),
            FieldValue::Unavailable => serializer.serialize_str(UNAVAILABLE),
        }
    }
}

/// The orchestrator step a [`SearchIssue`] was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStep {
    Navigate,
    Search,
    ConfirmResult,
    Settle,
    ExtractName,
    ExtractPrice,
    ReadUrl,
}

impl fmt::Display for SearchStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchStep::Navigate => "navigate",
            SearchStep::Search => "search",
            SearchStep::ConfirmResult => "confirm_result",
            SearchStep::Settle => "settle",
            SearchStep::ExtractName => "extract_name",
            SearchStep::ExtractPrice => "extract_price",
            SearchStep::ReadUrl => "read_url",
        };
        f.write_str(name)
    }
}

/// Why a step degraded a field (or the whole record) to `Unavailable`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchIssue {
    pub step: SearchStep,
    pub reason: String,
}

/// Result of one [`SearchTask`]. Exactly one record exists per task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductRecord {
    pub store_id: StoreId,
    pub item_query: String,
    pub product_name: FieldValue<String>,
    pub price: FieldValue<Decimal>,
    /// Canonical product URL, or empty when none was read.
    pub source_url: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<SearchIssue>,
}

impl ProductRecord {
    /// A record for a task that failed before anything could be extracted,
    /// carrying every issue noted up to the failure.
    #[must_use]
    pub fn failed(task: &SearchTask, issues: Vec<SearchIssue>) -> Self {
        Self {
            store_id: task.store_id.clone(),
            item_query: task.item_query.clone(),
            product_name: FieldValue::Unavailable,
            price: FieldValue::Unavailable,
            source_url: String::new(),
            issues,
        }
    }

    /// Price as sheet text: two decimals, or the `Unavailable` marker.
    #[must_use]
    pub fn price_text(&self) -> String {
        match &self.price {
            FieldValue::Present(p) => format!("{p:.2}"),
            FieldValue::Unavailable => UNAVAILABLE.to_string(),
        }
    }
}

/// Per-store records in item order, for every store whose session opened.
pub type RunResults = BTreeMap<StoreId, Vec<ProductRecord>>;

// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend-neutral row query description.
//!
//! A [`Query`] names a table plus a conjunction of column filters, an
//! optional ordering and a page window. Adapters translate it to their wire
//! format; the in-memory test store evaluates it directly via [`Filter::matches`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

static NULL: Value = Value::Null;

/// Tables the client reads and writes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Table {
    Profiles,
    Softwares,
    SoftwareVersions,
    Threads,
    Comments,
    Reactions,
    RoleRequests,
}

impl Table {
    pub fn as_str(self) -> &'static str {
        match self {
            Table::Profiles => "profiles",
            Table::Softwares => "softwares",
            Table::SoftwareVersions => "software_versions",
            Table::Threads => "threads",
            Table::Comments => "comments",
            Table::Reactions => "reactions",
            Table::RoleRequests => "role_requests",
        }
    }
}

/// A single column predicate. All filters on a query are ANDed.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = value`. A JSON `null` value means `column IS NULL`.
    Eq(String, Value),
    /// `column <> value`.
    Neq(String, Value),
    /// `column IN (values)`.
    In(String, Vec<Value>),
    /// Array column shares at least one element with `values`.
    Overlaps(String, Vec<String>),
    /// Case-insensitive substring match on any of the columns.
    IlikeAny(Vec<String>, String),
}

impl Filter {
    /// Evaluates the predicate against a JSON row object.
    pub fn matches(&self, row: &Value) -> bool {
        match self {
            Filter::Eq(col, v) => row.get(col).unwrap_or(&NULL) == v,
            Filter::Neq(col, v) => row.get(col).unwrap_or(&NULL) != v,
            Filter::In(col, vs) => {
                let cell = row.get(col).unwrap_or(&NULL);
                vs.iter().any(|v| v == cell)
            }
            Filter::Overlaps(col, wanted) => match row.get(col) {
                Some(Value::Array(items)) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .any(|item| wanted.iter().any(|w| w == item)),
                _ => false,
            },
            Filter::IlikeAny(cols, needle) => {
                let needle = needle.to_lowercase();
                cols.iter().any(|c| {
                    row.get(c)
                        .and_then(Value::as_str)
                        .is_some_and(|s| s.to_lowercase().contains(&needle))
                })
            }
        }
    }
}

/// Sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// A select/update/delete target.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: Table,
    pub filters: Vec<Filter>,
    pub order: Vec<Order>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl Query {
    pub fn table(table: Table) -> Self {
        Self {
            table,
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(column.to_string(), value.into()));
        self
    }

    pub fn neq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters
            .push(Filter::Neq(column.to_string(), value.into()));
        self
    }

    pub fn in_list<I, V>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.filters.push(Filter::In(
            column.to_string(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn overlaps<I, S>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters.push(Filter::Overlaps(
            column.to_string(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn ilike_any(mut self, columns: &[&str], needle: impl Into<String>) -> Self {
        self.filters.push(Filter::IlikeAny(
            columns.iter().map(|c| (*c).to_string()).collect(),
            needle.into(),
        ));
        self
    }

    /// Appends a sort key; earlier keys take precedence.
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order.push(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: usize) -> Self {
        self.offset = Some(n);
        self
    }

    /// Whether every filter accepts `row`.
    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }

    /// Human-readable key used in not-found errors (`user_id=u1`).
    pub fn describe_key(&self) -> String {
        let parts: Vec<String> = self
            .filters
            .iter()
            .filter_map(|f| match f {
                Filter::Eq(col, Value::String(s)) => Some(format!("{col}={s}")),
                Filter::Eq(col, v) => Some(format!("{col}={v}")),
                _ => None,
            })
            .collect();
        parts.join(",")
    }
}

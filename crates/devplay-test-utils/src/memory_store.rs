// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory [`DataStore`] that evaluates [`Query`] values directly.
//!
//! Emulates the handful of backend behaviours the client depends on: column
//! defaults, generated ids and timestamps, unique constraints, and missing
//! tables. Failures and slow reads can be scripted per table.

use std::cmp::Ordering as CmpOrdering;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value, json};
use tokio::sync::RwLock;
use tracing::debug;

use devplay_core::error::{CODE_UNDEFINED_TABLE, CODE_UNIQUE_VIOLATION};
use devplay_core::traits::adapter::BackendAdapter;
use devplay_core::traits::data::DataStore;
use devplay_core::types::{AdapterType, HealthStatus};
use devplay_core::{DevPlayError, Filter, Query, Table};

/// Column sets that must be unique per table, mirroring the hosted schema.
const UNIQUE_KEYS: &[(Table, &[&str])] = &[
    (Table::Profiles, &["user_id"]),
    (Table::Profiles, &["username"]),
    (Table::SoftwareVersions, &["software_id", "version"]),
    (Table::Reactions, &["thread_id", "user_id", "type"]),
];

struct SlowRead {
    column: String,
    value: Value,
    delay: Duration,
}

pub struct MemoryStore {
    tables: RwLock<HashMap<Table, Vec<Value>>>,
    enforce_unique: bool,
    dropped: Mutex<HashSet<Table>>,
    failures: Mutex<HashMap<Table, VecDeque<DevPlayError>>>,
    slow_reads: Mutex<HashMap<Table, Vec<SlowRead>>>,
    select_calls: Mutex<HashMap<Table, usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            enforce_unique: true,
            dropped: Mutex::new(HashSet::new()),
            failures: Mutex::new(HashMap::new()),
            slow_reads: Mutex::new(HashMap::new()),
            select_calls: Mutex::new(HashMap::new()),
        }
    }

    /// Skips unique-key checks, e.g. to seed a duplicate username.
    pub fn without_constraints(mut self) -> Self {
        self.enforce_unique = false;
        self
    }

    /// Stores `row` verbatim, bypassing defaults and constraints.
    pub async fn seed(&self, table: Table, row: Value) {
        self.tables.write().await.entry(table).or_default().push(row);
    }

    pub async fn rows(&self, table: Table) -> Vec<Value> {
        self.tables
            .read()
            .await
            .get(&table)
            .cloned()
            .unwrap_or_default()
    }

    /// The next operation on `table` fails with `err`. Queued errors apply in order.
    pub async fn fail_next(&self, table: Table, err: DevPlayError) {
        lock(&self.failures).entry(table).or_default().push_back(err);
    }

    /// Selects on `table` with an `eq` filter `column = value` sleep for `delay` first.
    pub async fn delay_select(
        &self,
        table: Table,
        column: &str,
        value: impl Into<Value>,
        delay: Duration,
    ) {
        lock(&self.slow_reads).entry(table).or_default().push(SlowRead {
            column: column.to_string(),
            value: value.into(),
            delay,
        });
    }

    /// Every later operation on `table` fails as an undefined relation.
    pub fn drop_table(&self, table: Table) {
        lock(&self.dropped).insert(table);
    }

    /// Number of selects issued against `table`, counted when the call starts.
    pub fn select_calls(&self, table: Table) -> usize {
        lock(&self.select_calls).get(&table).copied().unwrap_or(0)
    }

    fn precheck(&self, table: Table) -> Result<(), DevPlayError> {
        if lock(&self.dropped).contains(&table) {
            return Err(DevPlayError::Backend {
                code: Some(CODE_UNDEFINED_TABLE.to_string()),
                message: format!("relation \"public.{table}\" does not exist"),
            });
        }
        if let Some(err) = lock(&self.failures)
            .get_mut(&table)
            .and_then(VecDeque::pop_front)
        {
            return Err(err);
        }
        Ok(())
    }

    fn read_delay(&self, query: &Query) -> Option<Duration> {
        let slow = lock(&self.slow_reads);
        slow.get(&query.table)?.iter().find_map(|s| {
            query
                .filters
                .iter()
                .any(|f| matches!(f, Filter::Eq(c, v) if *c == s.column && *v == s.value))
                .then_some(s.delay)
        })
    }

    fn check_unique(
        &self,
        table: Table,
        rows: &[Value],
        candidate: &Value,
        skip: Option<usize>,
    ) -> Result<(), DevPlayError> {
        if !self.enforce_unique {
            return Ok(());
        }
        for (t, cols) in UNIQUE_KEYS {
            if *t != table || cols.iter().any(|c| is_null(candidate.get(*c))) {
                continue;
            }
            let clash = rows.iter().enumerate().any(|(i, row)| {
                Some(i) != skip && cols.iter().all(|c| row.get(*c) == candidate.get(*c))
            });
            if clash {
                return Err(DevPlayError::Conflict {
                    message: format!(
                        "{CODE_UNIQUE_VIOLATION}: duplicate key value violates unique constraint \"{table}_{}_key\"",
                        cols.join("_")
                    ),
                });
            }
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

fn is_null(v: Option<&Value>) -> bool {
    v.is_none_or(Value::is_null)
}

fn now_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Server-side column defaults for freshly inserted rows.
fn column_defaults(table: Table) -> Value {
    match table {
        Table::Profiles => json!({ "role": "user", "bio": null, "avatar_url": null }),
        Table::Softwares => json!({ "is_archived": false, "tags": null }),
        Table::Threads => json!({ "score": 0, "software_id": null, "media_urls": null }),
        Table::Comments => json!({ "parent_id": null, "is_edited": false, "is_deleted": false }),
        Table::RoleRequests => json!({ "status": "pending", "admin_notes": null }),
        Table::SoftwareVersions | Table::Reactions => json!({}),
    }
}

fn compare(a: &Value, b: &Value) -> CmpOrdering {
    match (a, b) {
        (Value::Null, Value::Null) => CmpOrdering::Equal,
        // nulls sort last ascending, matching the backend default
        (Value::Null, _) => CmpOrdering::Greater,
        (_, Value::Null) => CmpOrdering::Less,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(CmpOrdering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn sort_rows(rows: &mut [Value], query: &Query) {
    if query.order.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        for key in &query.order {
            let l = a.get(&key.column).unwrap_or(&Value::Null);
            let r = b.get(&key.column).unwrap_or(&Value::Null);
            let ord = compare(l, r);
            let ord = if key.ascending { ord } else { ord.reverse() };
            if ord != CmpOrdering::Equal {
                return ord;
            }
        }
        CmpOrdering::Equal
    });
}

fn object(row: Value) -> Result<Map<String, Value>, DevPlayError> {
    match row {
        Value::Object(map) => Ok(map),
        other => Err(DevPlayError::validation(
            "row",
            format!("expected a JSON object, got {other}"),
        )),
    }
}

#[async_trait]
impl BackendAdapter for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Data
    }

    async fn health_check(&self) -> Result<HealthStatus, DevPlayError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, DevPlayError> {
        *lock(&self.select_calls).entry(query.table).or_default() += 1;
        if let Some(delay) = self.read_delay(query) {
            tokio::time::sleep(delay).await;
        }
        self.precheck(query.table)?;

        let tables = self.tables.read().await;
        let mut rows: Vec<Value> = tables
            .get(&query.table)
            .map(|rows| rows.iter().filter(|r| query.matches(r)).cloned().collect())
            .unwrap_or_default();
        drop(tables);

        sort_rows(&mut rows, query);
        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);
        let rows: Vec<Value> = rows.into_iter().skip(offset).take(limit).collect();
        debug!(table = %query.table, rows = rows.len(), "memory select");
        Ok(rows)
    }

    async fn count(&self, query: &Query) -> Result<u64, DevPlayError> {
        self.precheck(query.table)?;
        let tables = self.tables.read().await;
        let n = tables
            .get(&query.table)
            .map_or(0, |rows| rows.iter().filter(|r| query.matches(r)).count());
        Ok(n as u64)
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value, DevPlayError> {
        self.precheck(table)?;
        let mut fields = object(row)?;

        if let Value::Object(defaults) = column_defaults(table) {
            for (k, v) in defaults {
                fields.entry(k).or_insert(v);
            }
        }
        fields
            .entry("id")
            .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()));
        let stamp = now_stamp();
        fields
            .entry("created_at")
            .or_insert_with(|| Value::String(stamp.clone()));
        if table != Table::Reactions {
            fields
                .entry("updated_at")
                .or_insert_with(|| Value::String(stamp.clone()));
        }
        if table == Table::SoftwareVersions {
            fields
                .entry("release_date")
                .or_insert_with(|| Value::String(stamp));
        }
        let row = Value::Object(fields);

        let mut tables = self.tables.write().await;
        let rows = tables.entry(table).or_default();
        self.check_unique(table, rows, &row, None)?;
        rows.push(row.clone());
        debug!(%table, "memory insert");
        Ok(row)
    }

    async fn update(&self, query: &Query, patch: Value) -> Result<Vec<Value>, DevPlayError> {
        self.precheck(query.table)?;
        let patch = object(patch)?;
        let stamp = now_stamp();

        let mut tables = self.tables.write().await;
        let rows = tables.entry(query.table).or_default();
        let targets: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, r)| query.matches(r))
            .map(|(i, _)| i)
            .collect();

        let mut staged = Vec::with_capacity(targets.len());
        for &i in &targets {
            let mut fields = object(rows[i].clone())?;
            for (k, v) in &patch {
                fields.insert(k.clone(), v.clone());
            }
            if !patch.contains_key("updated_at") && fields.contains_key("updated_at") {
                fields.insert("updated_at".into(), Value::String(stamp.clone()));
            }
            let updated = Value::Object(fields);
            self.check_unique(query.table, rows, &updated, Some(i))?;
            staged.push((i, updated));
        }

        let mut out = Vec::with_capacity(staged.len());
        for (i, row) in staged {
            rows[i] = row.clone();
            out.push(row);
        }
        Ok(out)
    }

    async fn delete(&self, query: &Query) -> Result<u64, DevPlayError> {
        self.precheck(query.table)?;
        let mut tables = self.tables.write().await;
        let rows = tables.entry(query.table).or_default();
        let before = rows.len();
        rows.retain(|r| !query.matches(r));
        Ok((before - rows.len()) as u64)
    }
}

// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row-level data subsystem contract and typed helpers over it.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::DevPlayError;
use crate::query::{Query, Table};
use crate::traits::adapter::BackendAdapter;

/// The external data subsystem, addressed as JSON rows.
///
/// Row-level authorization happens on the other side; denials surface as
/// [`DevPlayError::PermissionDenied`].
#[async_trait]
pub trait DataStore: BackendAdapter {
    /// Returns every row matching the query.
    async fn select(&self, query: &Query) -> Result<Vec<Value>, DevPlayError>;

    /// Counts rows matching the query's filters (ordering and window ignored).
    async fn count(&self, query: &Query) -> Result<u64, DevPlayError>;

    /// Inserts one row and returns it as stored.
    async fn insert(&self, table: Table, row: Value) -> Result<Value, DevPlayError>;

    /// Applies `patch` to every matching row and returns the updated rows.
    async fn update(&self, query: &Query, patch: Value) -> Result<Vec<Value>, DevPlayError>;

    /// Deletes matching rows and returns how many were removed.
    async fn delete(&self, query: &Query) -> Result<u64, DevPlayError>;
}

/// Decodes a backend row into `T`.
pub fn decode_row<T: DeserializeOwned>(table: Table, row: Value) -> Result<T, DevPlayError> {
    serde_json::from_value(row)
        .map_err(|e| DevPlayError::transport(format!("failed to decode {table} row"), e))
}

/// Selects and decodes every matching row.
pub async fn select_all<T: DeserializeOwned>(
    store: &dyn DataStore,
    query: &Query,
) -> Result<Vec<T>, DevPlayError> {
    store
        .select(query)
        .await?
        .into_iter()
        .map(|row| decode_row(query.table, row))
        .collect()
}

/// Selects at most one row.
///
/// Zero rows is `Ok(None)`; more than one is a data-integrity error.
pub async fn select_maybe<T: DeserializeOwned>(
    store: &dyn DataStore,
    query: &Query,
) -> Result<Option<T>, DevPlayError> {
    let mut rows = store.select(query).await?;
    match rows.len() {
        0 => Ok(None),
        1 => rows
            .pop()
            .map(|row| decode_row(query.table, row))
            .transpose(),
        n => Err(DevPlayError::Integrity(format!(
            "expected at most one {} row for {}, found {n}",
            query.table,
            query.describe_key()
        ))),
    }
}

/// Selects exactly one row; zero rows is [`DevPlayError::NotFound`].
pub async fn select_one<T: DeserializeOwned>(
    store: &dyn DataStore,
    query: &Query,
) -> Result<T, DevPlayError> {
    select_maybe(store, query)
        .await?
        .ok_or_else(|| DevPlayError::not_found(query.table.to_string(), query.describe_key()))
}

/// Serializes `row`, inserts it, and decodes the stored row.
pub async fn insert_as<T, R>(store: &dyn DataStore, table: Table, row: &R) -> Result<T, DevPlayError>
where
    T: DeserializeOwned,
    R: Serialize + ?Sized,
{
    let value = serde_json::to_value(row)
        .map_err(|e| DevPlayError::Internal(format!("failed to encode {table} row: {e}")))?;
    let stored = store.insert(table, value).await?;
    decode_row(table, stored)
}

/// Updates the single row addressed by `query` and decodes it.
pub async fn update_one<T, P>(store: &dyn DataStore, query: &Query, patch: &P) -> Result<T, DevPlayError>
where
    T: DeserializeOwned,
    P: Serialize + ?Sized,
{
    let value = serde_json::to_value(patch)
        .map_err(|e| DevPlayError::Internal(format!("failed to encode {} patch: {e}", query.table)))?;
    let mut rows = store.update(query, value).await?;
    match rows.len() {
        0 => Err(DevPlayError::not_found(
            query.table.to_string(),
            query.describe_key(),
        )),
        1 => rows
            .pop()
            .map(|row| decode_row(query.table, row))
            .ok_or_else(|| DevPlayError::Internal("update returned no row".into()))?,
        n => Err(DevPlayError::Integrity(format!(
            "update on {} matched {n} rows",
            query.table
        ))),
    }
}

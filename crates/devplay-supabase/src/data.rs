// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row access through the hosted REST endpoint.

use async_trait::async_trait;
use devplay_core::{
    AdapterType, BackendAdapter, DataStore, DevPlayError, HealthStatus, Query, Table,
};
use reqwest::header::{CONTENT_RANGE, HeaderMap};
use reqwest::{Method, RequestBuilder};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::client::SupabaseClient;
use crate::postgrest::{self, Shape};

const PREFER: &str = "Prefer";
const RETURN_REPRESENTATION: &str = "return=representation";
const COUNT_EXACT: &str = "count=exact";

/// [`DataStore`] over `/rest/v1/{table}`. Requests carry the current
/// user's access token, so row-level policies apply.
#[derive(Debug, Clone)]
pub struct SupabaseData {
    client: SupabaseClient,
}

impl SupabaseData {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    fn table_url(&self, table: Table) -> Result<Url, DevPlayError> {
        self.client.endpoint(&format!("rest/v1/{}", table.as_str()))
    }

    fn url_for(&self, query: &Query, shape: Shape) -> Result<Url, DevPlayError> {
        let mut url = self.table_url(query.table)?;
        postgrest::apply(&mut url, query, shape);
        Ok(url)
    }

    async fn rows(&self, request: RequestBuilder) -> Result<Vec<Value>, DevPlayError> {
        self.client.send_json::<Vec<Value>>(request).await
    }
}

#[async_trait]
impl BackendAdapter for SupabaseData {
    fn name(&self) -> &str {
        "supabase-rest"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Data
    }

    async fn health_check(&self) -> Result<HealthStatus, DevPlayError> {
        match self.count(&Query::table(Table::Profiles)).await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e @ DevPlayError::PermissionDenied { .. }) => {
                Ok(HealthStatus::Degraded(e.to_string()))
            }
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }
}

#[async_trait]
impl DataStore for SupabaseData {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, DevPlayError> {
        let url = self.url_for(query, Shape::Read)?;
        let rows = self.rows(self.client.request(Method::GET, url).await).await?;
        debug!(table = %query.table, rows = rows.len(), "select");
        Ok(rows)
    }

    async fn count(&self, query: &Query) -> Result<u64, DevPlayError> {
        let mut url = self.url_for(query, Shape::FiltersOnly)?;
        url.query_pairs_mut().append_pair("select", "*");
        let request = self
            .client
            .request(Method::HEAD, url)
            .await
            .header(PREFER, COUNT_EXACT);
        let response = self.client.send(request).await?;
        let total = parse_total(response.headers())?;
        debug!(table = %query.table, total, "count");
        Ok(total)
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value, DevPlayError> {
        let url = self.table_url(table)?;
        let request = self
            .client
            .request(Method::POST, url)
            .await
            .header(PREFER, RETURN_REPRESENTATION)
            .json(&row);
        let mut rows = self.rows(request).await?;
        if rows.is_empty() {
            return Err(DevPlayError::Internal(format!(
                "insert into {table} returned no row"
            )));
        }
        Ok(rows.swap_remove(0))
    }

    async fn update(&self, query: &Query, patch: Value) -> Result<Vec<Value>, DevPlayError> {
        ensure_filtered(query, "update")?;
        let url = self.url_for(query, Shape::FiltersOnly)?;
        let request = self
            .client
            .request(Method::PATCH, url)
            .await
            .header(PREFER, RETURN_REPRESENTATION)
            .json(&patch);
        let rows = self.rows(request).await?;
        debug!(table = %query.table, rows = rows.len(), "update");
        Ok(rows)
    }

    async fn delete(&self, query: &Query) -> Result<u64, DevPlayError> {
        ensure_filtered(query, "delete")?;
        let url = self.url_for(query, Shape::FiltersOnly)?;
        let request = self
            .client
            .request(Method::DELETE, url)
            .await
            .header(PREFER, RETURN_REPRESENTATION);
        let removed = self.rows(request).await?.len() as u64;
        debug!(table = %query.table, removed, "delete");
        Ok(removed)
    }
}

// Unfiltered writes would touch the whole table.
fn ensure_filtered(query: &Query, op: &str) -> Result<(), DevPlayError> {
    if query.filters.is_empty() {
        return Err(DevPlayError::Internal(format!(
            "refusing unfiltered {op} on {}",
            query.table
        )));
    }
    Ok(())
}

/// Reads the total from `Content-Range: 0-9/42` or `*/0`.
fn parse_total(headers: &HeaderMap) -> Result<u64, DevPlayError> {
    let raw = headers
        .get(CONTENT_RANGE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| DevPlayError::Internal("count response lacks Content-Range".into()))?;
    raw.rsplit_once('/')
        .and_then(|(_, total)| total.trim().parse::<u64>().ok())
        .ok_or_else(|| DevPlayError::Internal(format!("unparseable Content-Range '{raw}'")))
}

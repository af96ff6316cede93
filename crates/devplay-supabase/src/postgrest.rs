// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Encodes a [`Query`] as REST query-string parameters.

use devplay_core::{Filter, Query};
use serde_json::Value;
use url::Url;

/// Characters that must be quoted inside list and `or=` values.
const RESERVED: &[char] = &[',', '(', ')', '.', ':', '"', '{', '}', ' '];

/// Which parts of the query apply to the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Filters plus `select`, ordering and window.
    Read,
    /// Filters only (count, update, delete).
    FiltersOnly,
}

/// Appends `query`'s parameters to `url`.
pub fn apply(url: &mut Url, query: &Query, shape: Shape) {
    let mut pairs = url.query_pairs_mut();
    if shape == Shape::Read {
        pairs.append_pair("select", "*");
    }
    for filter in &query.filters {
        let (key, value) = encode_filter(filter);
        pairs.append_pair(&key, &value);
    }
    if shape == Shape::FiltersOnly {
        return;
    }
    if !query.order.is_empty() {
        let order: Vec<String> = query
            .order
            .iter()
            .map(|o| {
                let dir = if o.ascending { "asc" } else { "desc" };
                format!("{}.{dir}.nullslast", o.column)
            })
            .collect();
        pairs.append_pair("order", &order.join(","));
    }
    if let Some(limit) = query.limit {
        pairs.append_pair("limit", &limit.to_string());
    }
    if let Some(offset) = query.offset {
        pairs.append_pair("offset", &offset.to_string());
    }
}

fn encode_filter(filter: &Filter) -> (String, String) {
    match filter {
        Filter::Eq(col, Value::Null) => (col.clone(), "is.null".into()),
        Filter::Eq(col, v) => (col.clone(), format!("eq.{}", scalar(v))),
        Filter::Neq(col, Value::Null) => (col.clone(), "not.is.null".into()),
        Filter::Neq(col, v) => (col.clone(), format!("neq.{}", scalar(v))),
        Filter::In(col, values) => {
            let items: Vec<String> = values.iter().map(|v| quoted(&scalar(v))).collect();
            (col.clone(), format!("in.({})", items.join(",")))
        }
        Filter::Overlaps(col, values) => {
            let items: Vec<String> = values.iter().map(|v| quoted(v)).collect();
            (col.clone(), format!("ov.{{{}}}", items.join(",")))
        }
        Filter::IlikeAny(cols, needle) => {
            let pattern = quoted(&format!("*{needle}*"));
            let alternatives: Vec<String> = cols
                .iter()
                .map(|c| format!("{c}.ilike.{pattern}"))
                .collect();
            ("or".into(), format!("({})", alternatives.join(",")))
        }
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".into(),
        other => other.to_string(),
    }
}

fn quoted(raw: &str) -> String {
    if raw.contains(RESERVED) {
        format!("\"{}\"", raw.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devplay_core::Table;

    fn encoded(query: &Query, shape: Shape) -> Vec<(String, String)> {
        let mut url = Url::parse("https://x.supabase.co/rest/v1/t").unwrap();
        apply(&mut url, query, shape);
        url.query_pairs().into_owned().collect()
    }

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn select_with_order_and_window() {
        let q = Query::table(Table::Threads)
            .eq("software_id", "s1")
            .order("score", false)
            .order("created_at", false)
            .limit(20)
            .offset(40);
        assert_eq!(
            encoded(&q, Shape::Read),
            vec![
                pair("select", "*"),
                pair("software_id", "eq.s1"),
                pair("order", "score.desc.nullslast,created_at.desc.nullslast"),
                pair("limit", "20"),
                pair("offset", "40"),
            ]
        );
    }

    #[test]
    fn null_and_scalar_filters() {
        let q = Query::table(Table::Comments)
            .eq("parent_id", Value::Null)
            .neq("id", Value::Null)
            .eq("is_archived", false)
            .neq("score", 3);
        assert_eq!(
            encoded(&q, Shape::FiltersOnly),
            vec![
                pair("parent_id", "is.null"),
                pair("id", "not.is.null"),
                pair("is_archived", "eq.false"),
                pair("score", "neq.3"),
            ]
        );
    }

    #[test]
    fn list_filters_quote_reserved_characters() {
        let q = Query::table(Table::Softwares)
            .in_list("id", ["a", "b,c"])
            .overlaps("tags", ["indie", "co op"]);
        assert_eq!(
            encoded(&q, Shape::FiltersOnly),
            vec![
                pair("id", "in.(a,\"b,c\")"),
                pair("tags", "ov.{indie,\"co op\"}"),
            ]
        );
    }

    #[test]
    fn search_becomes_or_of_ilike() {
        let q = Query::table(Table::Softwares).ilike_any(&["name", "description"], "rust");
        assert_eq!(
            encoded(&q, Shape::FiltersOnly),
            vec![pair("or", "(name.ilike.*rust*,description.ilike.*rust*)")]
        );

        let spaced = Query::table(Table::Softwares).ilike_any(&["name"], "dev tool");
        assert_eq!(
            encoded(&spaced, Shape::FiltersOnly),
            vec![pair("or", "(name.ilike.\"*dev tool*\")")]
        );
    }
}

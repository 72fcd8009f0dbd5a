// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod page;

use anyhow::{Result, anyhow};
use psr_app::{RuleId, RuleRecord, RuleTable, Treemap, ViewMode, build_treemap, filter};
use serde::Serialize;
use tiny_http::{Header, Method, Request, Response, Server};
use tracing::{debug, info, warn};
use url::Url;

const JSON: &str = "application/json";
const HTML: &str = "text/html; charset=utf-8";
const TEXT: &str = "text/plain; charset=utf-8";

/// A fully rendered response, independent of the socket that carries it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpReply {
    fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: TEXT,
            body: body.into(),
        }
    }

    fn html(body: String) -> Self {
        Self {
            status: 200,
            content_type: HTML,
            body,
        }
    }

    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self {
                status,
                content_type: JSON,
                body,
            },
            Err(error) => Self::text(500, format!("encode response: {error}")),
        }
    }

    fn error(status: u16, message: &str) -> Self {
        Self::json(status, &ErrorBody { error: message })
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

/// Plotly treemap columns: one entry per node, chapters first in each group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreemapPayload {
    pub ids: Vec<String>,
    pub labels: Vec<String>,
    pub parents: Vec<String>,
    /// `[short_description, short_rule]`; empty for chapter nodes.
    pub customdata: Vec<[String; 2]>,
}

impl From<&Treemap> for TreemapPayload {
    fn from(treemap: &Treemap) -> Self {
        let nodes = treemap.nodes();
        let mut payload = Self {
            ids: Vec::with_capacity(nodes.len()),
            labels: Vec::with_capacity(nodes.len()),
            parents: Vec::with_capacity(nodes.len()),
            customdata: Vec::with_capacity(nodes.len()),
        };
        for node in nodes {
            payload.ids.push(node.id);
            payload.labels.push(node.label);
            payload.parents.push(node.parent);
            payload.customdata.push(match node.tooltip {
                Some(tooltip) => [tooltip.short_description, tooltip.short_rule],
                None => [String::new(), String::new()],
            });
        }
        payload
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct RuleRow<'a> {
    id: RuleId,
    chapter: &'a str,
    subheading: &'a str,
    short_description: &'a str,
    short_rule: &'a str,
}

impl<'a> From<&'a RuleRecord> for RuleRow<'a> {
    fn from(record: &'a RuleRecord) -> Self {
        Self {
            id: record.id,
            chapter: &record.chapter,
            subheading: &record.subheading,
            short_description: &record.short_description,
            short_rule: &record.short_rule,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct RuleDetail<'a> {
    id: RuleId,
    title: String,
    product_description: &'a str,
    product_specific_rule: &'a str,
}

/// Maps one request to its reply. `url` is the request target as sent on
/// the wire, path plus optional query.
pub fn route(table: &RuleTable, variant: ViewMode, method: &Method, url: &str) -> HttpReply {
    let Ok(target) = Url::parse(&format!("http://dashboard{url}")) else {
        return HttpReply::text(400, "malformed request target");
    };
    let path = target.path();
    let known = matches!(path, "/" | "/healthz" | "/api/treemap" | "/api/rules")
        || path.starts_with("/api/rules/");
    if !known {
        return HttpReply::error(404, "not found");
    }
    if *method != Method::Get {
        return HttpReply::error(405, "method not allowed");
    }

    let query = target
        .query_pairs()
        .find(|(key, _)| key == "q")
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default();

    match path {
        "/" => HttpReply::html(page::render(variant)),
        "/healthz" => HttpReply::text(200, "ok"),
        "/api/treemap" => {
            let treemap = build_treemap(filter(table, &query));
            HttpReply::json(200, &TreemapPayload::from(&treemap))
        }
        "/api/rules" => {
            let rows = filter(table, &query)
                .into_iter()
                .map(RuleRow::from)
                .collect::<Vec<RuleRow<'_>>>();
            HttpReply::json(200, &rows)
        }
        _ => rule_detail(table, path),
    }
}

fn rule_detail(table: &RuleTable, path: &str) -> HttpReply {
    let record = path
        .strip_prefix("/api/rules/")
        .and_then(|raw| raw.parse::<usize>().ok())
        .and_then(|id| table.get(RuleId::new(id)));
    match record {
        Some(record) => HttpReply::json(
            200,
            &RuleDetail {
                id: record.id,
                title: record.detail_title(),
                product_description: &record.product_description,
                product_specific_rule: &record.product_specific_rule,
            },
        ),
        None => HttpReply::error(404, "no rule with that id"),
    }
}

/// Single-threaded HTTP front end over an immutable rule table.
pub struct DashboardServer {
    server: Server,
    table: RuleTable,
    variant: ViewMode,
}

impl DashboardServer {
    pub fn bind(addr: &str, table: RuleTable, variant: ViewMode) -> Result<Self> {
        let server = Server::http(addr).map_err(|error| {
            anyhow!("bind dashboard server to {addr}: {error}; set --port/PORT or --bind/HOST")
        })?;
        Ok(Self {
            server,
            table,
            variant,
        })
    }

    pub fn local_addr(&self) -> String {
        self.server.server_addr().to_string()
    }

    /// Serves until the listener shuts down.
    pub fn serve(&self) -> Result<()> {
        info!(
            addr = %self.local_addr(),
            variant = self.variant.as_str(),
            rules = self.table.len(),
            "dashboard listening"
        );
        for request in self.server.incoming_requests() {
            self.respond(request);
        }
        Ok(())
    }

    /// Serves exactly `count` requests, then returns.
    pub fn serve_requests(&self, count: usize) -> Result<()> {
        for _ in 0..count {
            let request = self
                .server
                .recv()
                .map_err(|error| anyhow!("accept request: {error}"))?;
            self.respond(request);
        }
        Ok(())
    }

    fn respond(&self, request: Request) {
        let reply = route(&self.table, self.variant, request.method(), request.url());
        debug!(
            method = %request.method(),
            url = request.url(),
            status = reply.status,
            "request"
        );

        let mut response = Response::from_string(reply.body).with_status_code(reply.status);
        match Header::from_bytes("Content-Type", reply.content_type) {
            Ok(header) => response = response.with_header(header),
            Err(()) => warn!(content_type = reply.content_type, "invalid content type header"),
        }
        if let Err(error) = request.respond(response) {
            warn!(%error, "write response");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{TreemapPayload, route};
    use psr_app::{NewRule, RuleTable, ViewMode, build_treemap};
    use serde_json::{Value, json};
    use tiny_http::Method;

    fn table() -> RuleTable {
        let rows = [
            ("01", "0101.21", "Live horses: pure-bred breeding animals", "CC"),
            ("01", "0101.29", "Live horses: other", "CC"),
            (
                "02",
                "0201.10",
                "Meat of bovine animals, fresh or chilled: carcasses and half-carcasses",
                "CC",
            ),
        ];
        RuleTable::from_rules(rows.iter().map(|(chapter, subheading, description, rule)| {
            NewRule {
                chapter: (*chapter).to_owned(),
                subheading: (*subheading).to_owned(),
                product_description: (*description).to_owned(),
                product_specific_rule: (*rule).to_owned(),
            }
        }))
    }

    fn get_json(url: &str) -> Value {
        let reply = route(&table(), ViewMode::Table, &Method::Get, url);
        assert_eq!(reply.status, 200, "{url}: {}", reply.body);
        assert_eq!(reply.content_type, "application/json");
        serde_json::from_str(&reply.body).expect("valid json")
    }

    #[test]
    fn rules_endpoint_filters_by_decoded_query() {
        let rows = get_json("/api/rules?q=0101%2E2");
        assert_eq!(
            rows,
            json!([
                {
                    "id": 0,
                    "chapter": "01",
                    "subheading": "0101.21",
                    "short_description": "Live horses: pure-bred breeding animals",
                    "short_rule": "CC"
                },
                {
                    "id": 1,
                    "chapter": "01",
                    "subheading": "0101.29",
                    "short_description": "Live horses: other",
                    "short_rule": "CC"
                }
            ])
        );
        assert_eq!(get_json("/api/rules").as_array().map(Vec::len), Some(3));
        assert_eq!(get_json("/api/rules?q=+").as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn treemap_endpoint_returns_parallel_columns() {
        let payload = get_json("/api/treemap?q=01");
        assert_eq!(payload["ids"], json!(["01", "01/0101.21", "01/0101.29", "02", "02/0201.10"]));
        assert_eq!(payload["parents"], json!(["", "01", "01", "", "02"]));
        assert_eq!(payload["customdata"][0], json!(["", ""]));
        assert_eq!(
            payload["customdata"][4],
            json!([
                "Meat of bovine animals, fresh or chilled: carcasses and half-carcasses",
                "CC"
            ])
        );
    }

    #[test]
    fn treemap_payload_of_empty_match_is_empty() {
        let payload = TreemapPayload::from(&build_treemap(std::iter::empty()));
        assert!(payload.ids.is_empty());
        assert!(payload.customdata.is_empty());
        assert_eq!(get_json("/api/treemap?q=zzz")["labels"], json!([]));
    }

    #[test]
    fn detail_endpoint_returns_full_text() {
        let detail = get_json("/api/rules/2");
        assert_eq!(detail["title"], "Subheading 0201.10");
        assert_eq!(
            detail["product_description"],
            "Meat of bovine animals, fresh or chilled: carcasses and half-carcasses"
        );
        assert_eq!(detail["product_specific_rule"], "CC");

        for missing in ["/api/rules/3", "/api/rules/x", "/api/rules/"] {
            let reply = route(&table(), ViewMode::Table, &Method::Get, missing);
            assert_eq!(reply.status, 404, "{missing}");
        }
    }

    #[test]
    fn unknown_paths_and_methods_are_rejected() {
        let table = table();
        assert_eq!(
            route(&table, ViewMode::Table, &Method::Get, "/nope").status,
            404
        );
        assert_eq!(
            route(&table, ViewMode::Table, &Method::Post, "/api/rules").status,
            405
        );
        assert_eq!(
            route(&table, ViewMode::Table, &Method::Delete, "/nope").status,
            404
        );
    }

    #[test]
    fn index_page_matches_variant_and_healthz_is_plain() {
        let table = table();
        let treemap = route(&table, ViewMode::Treemap, &Method::Get, "/");
        assert_eq!(treemap.content_type, "text/html; charset=utf-8");
        assert!(treemap.body.contains("plotly"));
        assert!(treemap.body.contains("/api/treemap"));

        let rules = route(&table, ViewMode::Table, &Method::Get, "/?q=ignored");
        assert!(rules.body.contains("/api/rules"));
        assert!(!rules.body.contains("plotly"));

        let health = route(&table, ViewMode::Table, &Method::Get, "/healthz");
        assert_eq!((health.status, health.body.as_str()), (200, "ok"));
    }
}

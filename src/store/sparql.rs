//! SPARQL 1.1 HTTP graph store for production use.
//!
//! Updates are POSTed as `application/sparql-update` to the update endpoint and
//! probes as `application/sparql-query` to the query endpoint, following the
//! SPARQL 1.1 Protocol. GraphDB exposes these as `/repositories/<id>` and
//! `/repositories/<id>/statements`.
//!
//! ## Configuration
//!
//! All settings can be configured via environment variables:
//! - `SPARQL_QUERY_URL`: query endpoint (default: `http://localhost:7200/repositories/Ski-Tp3`)
//! - `SPARQL_UPDATE_URL`: update endpoint (default: `<query url>/statements`)
//! - `SPARQL_TIMEOUT_SECS`: per-request timeout, 0 disables it (default: 30)
//! - `SPARQL_NAMESPACE`: ontology namespace bound to `:` (default: the tp2 ontology)

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Deserialize;

use crate::types::{Class, Predicate, QuerySpec, UpdateSpec, DEFAULT_NAMESPACE};
use super::GraphStore;

const DEFAULT_QUERY_URL: &str = "http://localhost:7200/repositories/Ski-Tp3";
const RDF_NAMESPACE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// Variable every counting query binds its result to.
const COUNT_VARIABLE: &str = "rowCount";

/// Configuration for the SPARQL endpoints.
#[derive(Debug, Clone)]
pub struct SparqlConfig {
    /// SPARQL query endpoint.
    pub query_url: String,
    /// SPARQL update endpoint.
    pub update_url: String,
    /// Per-request timeout in seconds (default: 30, 0 = none).
    pub timeout_secs: u64,
    /// Namespace bound to the empty prefix.
    pub namespace: String,
}

impl SparqlConfig {
    /// Load configuration from environment variables with local defaults.
    pub fn from_env() -> Self {
        let query_url = std::env::var("SPARQL_QUERY_URL")
            .unwrap_or_else(|_| DEFAULT_QUERY_URL.to_string());
        let update_url = std::env::var("SPARQL_UPDATE_URL")
            .unwrap_or_else(|_| format!("{}/statements", query_url.trim_end_matches('/')));
        Self {
            query_url,
            update_url,
            timeout_secs: std::env::var("SPARQL_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            namespace: std::env::var("SPARQL_NAMESPACE")
                .unwrap_or_else(|_| DEFAULT_NAMESPACE.to_string()),
        }
    }
}

impl Default for SparqlConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Error type for the SPARQL store.
#[derive(Debug, thiserror::Error)]
pub enum SparqlError {
    /// Transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// Endpoint answered with a non-success status.
    #[error("Endpoint returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
    /// Result document could not be interpreted.
    #[error("Malformed query result: {0}")]
    MalformedResult(String),
}

/// SPARQL 1.1 HTTP graph store.
pub struct SparqlGraphStore {
    http: reqwest::Client,
    config: SparqlConfig,
}

impl SparqlGraphStore {
    /// Create a store with the given configuration.
    pub fn new(config: SparqlConfig) -> Result<Self, SparqlError> {
        tracing::info!(
            query_url = %config.query_url,
            update_url = %config.update_url,
            timeout_secs = config.timeout_secs,
            "Initializing SPARQL client"
        );

        let mut builder = reqwest::Client::builder();
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }

        Ok(Self {
            http: builder.build()?,
            config,
        })
    }

    /// Create a store from environment variables.
    pub fn from_env() -> Result<Self, SparqlError> {
        Self::new(SparqlConfig::from_env())
    }

    /// Get the endpoint configuration.
    pub fn config(&self) -> &SparqlConfig {
        &self.config
    }

    /// Check if the query endpoint answers.
    pub async fn is_healthy(&self) -> bool {
        self.select("ASK {}".to_string()).await.is_ok()
    }

    async fn select(&self, query: String) -> Result<String, SparqlError> {
        let resp = self
            .http
            .post(&self.config.query_url)
            .header(CONTENT_TYPE, "application/sparql-query")
            .header(ACCEPT, SPARQL_RESULTS_JSON)
            .body(query)
            .send()
            .await?;
        read_success(resp).await
    }
}

async fn read_success(resp: reqwest::Response) -> Result<String, SparqlError> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(SparqlError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

#[async_trait]
impl GraphStore for SparqlGraphStore {
    type Error = SparqlError;

    async fn update(&self, op: &UpdateSpec) -> Result<(), Self::Error> {
        let text = render_update(&self.config.namespace, op);
        tracing::trace!(op = op.label(), update = %text, "sending SPARQL update");

        let resp = self
            .http
            .post(&self.config.update_url)
            .header(CONTENT_TYPE, "application/sparql-update")
            .body(text)
            .send()
            .await?;
        read_success(resp).await.map(|_| ())
    }

    async fn count(&self, probe: &QuerySpec) -> Result<u64, Self::Error> {
        let text = render_count(&self.config.namespace, probe);
        tracing::trace!(probe = probe.label(), query = %text, "sending SPARQL count");

        let body = self.select(text).await?;
        parse_count(&body)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Query rendering
// ─────────────────────────────────────────────────────────────────────────────

fn prologue(namespace: &str) -> String {
    format!("PREFIX : <{namespace}>\nPREFIX rdf: <{RDF_NAMESPACE}>\n")
}

fn class(c: Class) -> String {
    format!(":{}", c.local_name())
}

/// Render an update as SPARQL 1.1 `INSERT { } WHERE { }` text.
pub fn render_update(namespace: &str, op: &UpdateSpec) -> String {
    let route = class(Class::Route);
    let first = Predicate::FirstElement;
    let next = Predicate::NextElement;
    let belongs = Predicate::BelongsTo;

    let (insert, body) = match op {
        UpdateSpec::SeedDifficulty { class: c, difficulty } => (
            format!("?run {} {} .", Predicate::Difficulty, difficulty.value()),
            format!("?run a {} .", class(*c)),
        ),
        UpdateSpec::InferDuration => {
            let duration = Predicate::Duration;
            (
                format!("?route {duration} ?total ."),
                format!(
                    "?route a {route} .\n  ?route {first} ?first .\n  ?route {next} ?next .\n  \
                     ?first {duration} ?firstValue .\n  ?next {duration} ?nextValue .\n  \
                     BIND(?firstValue + ?nextValue AS ?total)"
                ),
            )
        }
        UpdateSpec::InferDifficulty => {
            let difficulty = Predicate::Difficulty;
            (
                format!("?route {difficulty} ?max ."),
                format!(
                    "?route a {route} .\n  ?route {first} ?first .\n  ?route {next} ?next .\n  \
                     ?first {difficulty} ?firstValue .\n  ?next {difficulty} ?nextValue .\n  \
                     BIND(IF(?firstValue >= ?nextValue, ?firstValue, ?nextValue) AS ?max)"
                ),
            )
        }
        UpdateSpec::BelongsToFirst => (
            format!("?belonger {belongs} ?route ."),
            format!("?route a {route} .\n  ?route {first} ?belonger ."),
        ),
        UpdateSpec::BelongsToRest => (
            format!("?belonger {belongs} ?route ."),
            format!("?route a {route} .\n  ?route {next} ?next .\n  ?belonger {belongs} ?next ."),
        ),
        UpdateSpec::BelongsToPlace => (
            format!("?place {belongs} ?route ."),
            format!(
                "?place a {} .\n  ?place ({} | {}) ?lift .\n  ?lift {belongs} ?route .",
                class(Class::Place),
                Predicate::IsStartOf,
                Predicate::IsEndOf,
            ),
        ),
        UpdateSpec::BelongsToRestaurant => (
            format!("?restaurant {belongs} ?route ."),
            format!(
                "?restaurant a {} .\n  ?restaurant {} ?place .\n  ?place {belongs} ?route .",
                class(Class::Restaurant),
                Predicate::LocatedAt,
            ),
        ),
    };

    format!("{}INSERT {{ {insert} }}\nWHERE {{\n  {body}\n}}", prologue(namespace))
}

/// Render a probe as a SPARQL `SELECT (COUNT(..) AS ?rowCount)` query.
pub fn render_count(namespace: &str, probe: &QuerySpec) -> String {
    let (counted, body) = match probe {
        QuerySpec::RouteDurations => (
            "?value",
            format!("?route a {} .\n  ?route {} ?value .", class(Class::Route), Predicate::Duration),
        ),
        QuerySpec::RouteDifficulties => (
            "?value",
            format!("?route a {} .\n  ?route {} ?value .", class(Class::Route), Predicate::Difficulty),
        ),
        QuerySpec::Memberships => (
            "?belonger",
            format!("?belonger {} ?route .", Predicate::BelongsTo),
        ),
    };

    format!(
        "{}SELECT (COUNT({counted}) AS ?{COUNT_VARIABLE})\nWHERE {{\n  {body}\n}}",
        prologue(namespace)
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Result parsing
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SelectResponse {
    results: SelectResults,
}

#[derive(Debug, Deserialize)]
struct SelectResults {
    bindings: Vec<HashMap<String, BindingValue>>,
}

#[derive(Debug, Deserialize)]
struct BindingValue {
    value: String,
}

/// Read the `?rowCount` binding from a SPARQL JSON results document.
///
/// A document with no solution counts as zero.
pub fn parse_count(body: &str) -> Result<u64, SparqlError> {
    let response: SelectResponse = serde_json::from_str(body)
        .map_err(|e| SparqlError::MalformedResult(e.to_string()))?;

    let Some(row) = response.results.bindings.last() else {
        return Ok(0);
    };
    let value = row
        .get(COUNT_VARIABLE)
        .ok_or_else(|| SparqlError::MalformedResult(format!("missing ?{COUNT_VARIABLE} binding")))?;
    value
        .value
        .parse()
        .map_err(|_| SparqlError::MalformedResult(format!("non-numeric count: {}", value.value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Difficulty;

    const NS: &str = "http://example.org/ski#";

    #[test]
    fn test_render_seed_difficulty() {
        let text = render_update(
            NS,
            &UpdateSpec::SeedDifficulty { class: Class::RedRun, difficulty: Difficulty::RED },
        );
        assert!(text.starts_with("PREFIX : <http://example.org/ski#>"));
        assert!(text.contains("INSERT { ?run :difficulty 2 . }"));
        assert!(text.contains("?run a :RedRun ."));
    }

    #[test]
    fn test_render_duration_binds_sum() {
        let text = render_update(NS, &UpdateSpec::InferDuration);
        assert!(text.contains("INSERT { ?route :duration ?total . }"));
        assert!(text.contains("?route :firstElement ?first ."));
        assert!(text.contains("BIND(?firstValue + ?nextValue AS ?total)"));
    }

    #[test]
    fn test_render_place_uses_alternative_path() {
        let text = render_update(NS, &UpdateSpec::BelongsToPlace);
        assert!(text.contains("?place (:isStartOf | :isEndOf) ?lift ."));
        assert!(text.contains("?lift :belongsTo ?route ."));
    }

    #[test]
    fn test_render_count_projects_row_count() {
        let text = render_count(NS, &QuerySpec::Memberships);
        assert!(text.contains("SELECT (COUNT(?belonger) AS ?rowCount)"));
        assert!(text.contains("?belonger :belongsTo ?route ."));
    }

    #[test]
    fn test_parse_count() {
        let body = r#"{
            "head": {"vars": ["rowCount"]},
            "results": {"bindings": [
                {"rowCount": {"datatype": "http://www.w3.org/2001/XMLSchema#integer", "type": "literal", "value": "42"}}
            ]}
        }"#;
        assert_eq!(parse_count(body).unwrap(), 42);
    }

    #[test]
    fn test_parse_count_empty_is_zero() {
        let body = r#"{"head": {"vars": ["rowCount"]}, "results": {"bindings": []}}"#;
        assert_eq!(parse_count(body).unwrap(), 0);
    }

    #[test]
    fn test_parse_count_rejects_garbage() {
        assert!(matches!(parse_count("<html/>"), Err(SparqlError::MalformedResult(_))));

        let body = r#"{"results": {"bindings": [{"rowCount": {"value": "many"}}]}}"#;
        assert!(matches!(parse_count(body), Err(SparqlError::MalformedResult(_))));
    }
}

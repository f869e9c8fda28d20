//! Route Inference Binary
//!
//! Runs every inference rule once against a SPARQL endpoint and prints the
//! run report as JSON on stdout:
//! - Structured JSON logging on stderr
//! - Non-zero exit status when any rule failed
//!
//! ## Configuration
//!
//! Environment variables:
//! - `SPARQL_QUERY_URL`: query endpoint (default: `http://localhost:7200/repositories/Ski-Tp3`)
//! - `SPARQL_UPDATE_URL`: update endpoint (default: `<query url>/statements`)
//! - `SPARQL_TIMEOUT_SECS`: per-request timeout (default: 30)
//! - `SPARQL_NAMESPACE`: ontology namespace
//! - `INFERENCE_MAX_ITERATIONS`: cap on fixpoint passes (default: unlimited)
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//!
//! ## Usage
//!
//! ```bash
//! SPARQL_QUERY_URL=http://localhost:7200/repositories/Ski-Tp3 cargo run --bin route_inference --features sparql
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use route_inference::{Orchestrator, SparqlGraphStore};

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "route_inference=info,reqwest=warn".into());

    if log_format == "pretty" {
        // Pretty format for local development
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE)
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_current_span(true)
                    .flatten_event(true)
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    init_tracing();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting route inference");

    let store = SparqlGraphStore::from_env()?;
    let config = store.config();
    info!(
        query_url = %config.query_url,
        update_url = %config.update_url,
        timeout_secs = config.timeout_secs,
        "SPARQL store configured"
    );
    if !store.is_healthy().await {
        warn!("SPARQL endpoint did not answer the health probe; continuing anyway");
    }

    let orchestrator = Orchestrator::from_env(Arc::new(store));
    let report = match orchestrator.run().await {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Inference run aborted");
            return Err(e.into());
        }
    };

    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.is_success() {
        info!("All rules reached fixpoint");
        Ok(ExitCode::SUCCESS)
    } else {
        for (rule, e) in &report.failures {
            error!(rule = %rule, error = %e, "Rule failed");
        }
        Ok(ExitCode::FAILURE)
    }
}

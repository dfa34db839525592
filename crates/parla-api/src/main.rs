//! Parla server binary - composition root.
//!
//! Ties the crates together into one executable:
//! 1. Load configuration from TOML
//! 2. Build the flow catalog from the injected product list
//! 3. Wire the generation client, event store, logger, and orchestrator
//! 4. Start the axum REST API server

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use parla_assist::{AssistRouter, HttpGenerator, TextGenerator};
use parla_core::{ParlaConfig, Product};
use parla_flow::{default_catalog, Orchestrator};
use parla_metrics::MetricsService;
use parla_telemetry::{EventStore, HttpEventStore, InteractionLogger, LogResult};

use parla_api::routes;
use parla_api::state::AppState;

mod cli;

/// Load the product catalog from a JSON file; an unreadable file degrades to
/// an empty list so the assistant still answers dúvidas.
fn load_products(path: Option<&std::path::Path>) -> Vec<Product> {
    let Some(path) = path else {
        return Vec::new();
    };
    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<Vec<Product>>(&content) {
            Ok(products) => {
                tracing::info!(count = products.len(), "Product catalog loaded");
                products
            }
            Err(e) => {
                tracing::warn!(error = %e, "Product catalog unparsable, continuing without it");
                Vec::new()
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "Product catalog unreadable, continuing without it");
            Vec::new()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = cli::CliArgs::parse();

    // Config first; the log level may come from it.
    let config_file = args.resolve_config_path();
    let config = ParlaConfig::load_or_default(&config_file);

    // Tracing.
    let log_level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    tracing::info!("Starting Parla v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    let products = load_products(args.products.as_deref());
    let catalog = Arc::new(default_catalog(&products));
    tracing::info!(
        nodes = catalog.len(),
        version = catalog.version(),
        "Flow catalog published"
    );

    // Collaborators.
    let generator: Arc<dyn TextGenerator> = Arc::new(HttpGenerator::new(
        config.assist.endpoint.as_str(),
        config.assist.model.as_str(),
        Duration::from_secs(config.assist.timeout_secs),
    )?);
    let store: Arc<dyn EventStore> = Arc::new(HttpEventStore::new(
        config.telemetry.endpoint.as_str(),
        Duration::from_secs(config.telemetry.timeout_secs),
    )?);

    // Diagnostics: every append outcome lands here so silent data loss is
    // visible to operators without touching the UI-facing contract.
    let (logger, mut diag_rx) = InteractionLogger::new(Arc::clone(&store));
    tokio::spawn(async move {
        while let Some(result) = diag_rx.recv().await {
            if let LogResult::Failed { event_id, error } = result {
                tracing::warn!(%event_id, %error, "Interaction event lost");
            }
        }
    });

    let orchestrator = Arc::new(Orchestrator::new(
        catalog,
        AssistRouter::new(generator),
        logger,
        products,
        config.chat.clone(),
        config.assist.enabled,
    ));
    let metrics = MetricsService::new(store);

    let state = AppState::new(orchestrator, metrics);
    let port = args.resolve_port(config.api.port);
    routes::start_server(state, port).await?;

    Ok(())
}

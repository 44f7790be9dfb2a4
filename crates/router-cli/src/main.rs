//! Entrypoint for the `semantic-mcp-router` binary: argument parsing,
//! logging init, config load, then serving an MCP server over stdio until
//! shutdown, in the style of `crucible-cli/src/main.rs` and
//! `crucible-cli/src/commands/mcp.rs`.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use rmcp::ServiceExt;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use router_core::discovery::DiscoveryManager;
use router_core::facade::RouterFacade;
use router_core::{load_config_file, EmbeddingIndex, EmbeddingModel};
use router_embeddings::default_embedding_model;

use router_cli::cli::Cli;
use router_cli::logging::JsonLogLayer;
use router_cli::server::RouterServerHandler;

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    let subscriber = Registry::default().with(filter).with(JsonLogLayer);
    let _ = subscriber.try_init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match load_config_file(&cli.config) {
        Ok(config) => Arc::new(config),
        Err(err) => {
            error!(error = %err, path = %cli.config.display(), "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let index = Arc::new(EmbeddingIndex::new());
    let embedding_model = default_embedding_model();
    if let Err(err) = embedding_model.initialize().await {
        error!(error = %err, "failed to initialize embedding model");
        return ExitCode::FAILURE;
    }

    let discovery = Arc::new(DiscoveryManager::new(config.clone(), index.clone(), embedding_model.clone()));

    let startup_outcomes = discovery.startup().await;
    let failures = startup_outcomes.iter().filter(|o| o.is_err()).count();
    info!(
        attempted = startup_outcomes.len(),
        failed = failures,
        "startup auto-load complete"
    );

    let facade = Arc::new(RouterFacade::new(config, index, embedding_model, discovery.clone()));
    let handler = RouterServerHandler::new(facade);

    info!("semantic-mcp-router ready, serving MCP over stdio");

    let service = match handler.serve((tokio::io::stdin(), tokio::io::stdout())).await {
        Ok(service) => service,
        Err(err) => {
            error!(error = %err, "failed to start MCP server");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = tokio::signal::ctrl_c();
    tokio::select! {
        result = service.waiting() => {
            if let Err(err) = result {
                error!(error = %err, "MCP server session ended with an error");
            }
        }
        _ = shutdown => {
            info!("received interrupt, shutting down");
        }
    }

    for upstream in discovery.loaded_upstreams().await {
        if let Err(err) = discovery.unload_upstream(&upstream).await {
            error!(upstream_id = %upstream, error = %err, "failed to disconnect upstream during shutdown");
        }
    }

    info!("semantic-mcp-router shut down");
    ExitCode::SUCCESS
}

use clap::Parser;
use gateway::Orchestrator;
use gateway::memory::{EchoSupplierClient, InMemoryLogRepo};
use std::sync::Arc;

mod args;
mod config;
mod logger;

use args::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init(&args.log_filter);

    let nexus_config = config::load(args.config.as_deref())?;
    let (model_repo, provider_repo) = nexus_config.build_repos();

    let mut gateway_config = nexus_config.gateway;
    if let Some(listen_address) = args.listen_address {
        gateway_config.listen_address = listen_address;
    }
    let listen_address = gateway_config.listen_address.clone();

    // No real upstream credentials are part of this binary's surface (see
    // `SupplierClient` for the network boundary a production deployment
    // swaps in); `EchoSupplierClient` lets every route be exercised end to
    // end without one.
    let orchestrator = Arc::new(Orchestrator::new(
        Arc::new(model_repo),
        Arc::new(provider_repo),
        Arc::new(InMemoryLogRepo::new()),
        Arc::new(EchoSupplierClient::new()),
        gateway_config,
    ));

    let app = gateway::http::router(orchestrator);
    let listener = tokio::net::TcpListener::bind(&listen_address).await?;
    log::info!("nexus listening on {listen_address}");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        log::error!("failed to install Ctrl+C handler");
    }
    log::info!("shutting down");
}

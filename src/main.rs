use anyhow::Context;
use axum::http::Method;
use clap::Parser;
use newsletter::config::{Cli, Config, default_config_path};
use newsletter::handler::AppState;
use newsletter::pocket::PocketClient;
use newsletter::routes;
use std::path::PathBuf;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    // .env is optional
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    tracing::info!("newsletter.svc starting");

    if let Err(e) = run(args).await {
        tracing::error!(error = %format!("{:#}", e), "newsletter.svc failed");
        std::process::exit(1);
    }

    tracing::info!("newsletter.svc going off, graceful shutdown complete");
}

async fn run(args: Cli) -> anyhow::Result<()> {
    // An explicit --config must load; the default location is optional.
    let mut cfg = match args.config_path {
        Some(path) => Config::new(&PathBuf::from(path))?,
        None => Config::load_or_default(&default_config_path())?,
    };
    if let Some(port) = args.port {
        cfg.app.set_port(port);
    }

    let pocket = PocketClient::new(cfg.pocket.endpoint.clone());
    tracing::info!(endpoint = pocket.endpoint(), "pocket client ready");

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let app = routes::routes()
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(AppState::new(pocket));

    let address = format!("0.0.0.0:{}", cfg.app.get_port());
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;

    tracing::info!("newsletter.svc running on {}", &address);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl+c");
        std::future::pending::<()>().await;
    }
    tracing::info!("ctrl+c signal received, preparing to shutdown");
}

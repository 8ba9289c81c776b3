use anyhow::Context;
use clap::Parser;

mod bootstrap;
mod cli;

use cli::CliArgs;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(args.log_level.clone()))
        .init();

    let boot = bootstrap::bootstrap(args).context("bootstrap")?;
    let app = radgate_gateway::router(boot.state);

    let listener = tokio::net::TcpListener::bind(&boot.listen_addr)
        .await
        .with_context(|| format!("bind {}", boot.listen_addr))?;
    tracing::info!(addr = %boot.listen_addr, "radgate listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve")?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received, draining in-flight requests");
}

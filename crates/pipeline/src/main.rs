use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use coldchain_events::EventBus;
use coldchain_pipeline::app::build_app;
use coldchain_pipeline::config::PipelineConfig;
use coldchain_pipeline::logging::{init_tracing, LogFormat};
use coldchain_pipeline::runtime::{build_parts, spawn_pipeline};
use coldchain_pipeline::supervisor::BackoffConfig;

/// How long each component gets to stop after cancellation.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = match PipelineConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(LogFormat::Pretty);
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    // --- Tracing ---
    init_tracing(config.log_format);
    tracing::info!(
        pallet_id = %config.simulation.pallet_id,
        step_interval_ms = config.simulation.step_interval.as_millis() as u64,
        alert_threshold = config.alert_threshold,
        "Loaded pipeline configuration"
    );

    // --- Event bus ---
    let bus = Arc::new(EventBus::default());

    // --- Components ---
    let parts = match build_parts(&config, Arc::clone(&bus)) {
        Ok(parts) => parts,
        Err(e) => {
            tracing::error!(error = %e, "Failed to assemble pipeline");
            std::process::exit(1);
        }
    };
    let state = parts.state.clone();
    let pipeline = spawn_pipeline(parts, config.alert_threshold, config.poll, BackoffConfig::default());

    // --- Router ---
    let app = build_app(state, &config.dashboard);

    // --- Start server ---
    let addr = match config.dashboard.host.parse() {
        Ok(ip) => SocketAddr::new(ip, config.dashboard.port),
        Err(e) => {
            tracing::error!(host = %config.dashboard.host, error = %e, "Invalid DASHBOARD_HOST");
            pipeline.shutdown(SHUTDOWN_GRACE).await;
            std::process::exit(1);
        }
    };
    tracing::info!(%addr, "Starting status API");

    let cancel = pipeline.cancel_token();
    match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    tokio::select! {
                        () = shutdown_signal() => {}
                        () = cancel.cancelled() => {}
                    }
                })
                .await;
            if let Err(e) = served {
                tracing::error!(error = %e, "Status API failed");
            }
        }
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind status API");
        }
    }

    // --- Post-shutdown cleanup ---
    tracing::info!("Stopping pipeline components");
    pipeline.shutdown(SHUTDOWN_GRACE).await;
    bus.close();
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

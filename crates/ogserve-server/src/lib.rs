pub mod error;
pub mod routes;
pub mod state;

use axum::routing::get;
use axum::Router;
use ogserve_core::config::RuntimeConfig;
use ogserve_core::notify::NotifyLevel;
use ogserve_core::probe::HEALTHZ_PATH;
use ogserve_core::privileges;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the axum Router with all routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(config: RuntimeConfig) -> Router {
    router(state::AppState::new(config))
}

fn router(app_state: state::AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(HEALTHZ_PATH, get(routes::health::healthz))
        .route("/og/news/{slug}", get(routes::og::news_card))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Bind the configured address and serve until a shutdown signal arrives.
/// Refuses to start as root unless the config allows it.
pub async fn serve(config: RuntimeConfig) -> anyhow::Result<()> {
    privileges::enforce_unprivileged(config.allow_root)?;
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(config, listener).await
}

/// Serve on an already-bound listener. Separated from `serve` so tests and
/// the CLI can bind port 0 themselves.
pub async fn serve_on(
    config: RuntimeConfig,
    listener: tokio::net::TcpListener,
) -> anyhow::Result<()> {
    let app_state = state::AppState::new(config);

    if !app_state.readiness.workspace() {
        tracing::warn!(
            root = %app_state.config.root.display(),
            "serving degraded: workspace is not writable"
        );
        app_state.alert(
            NotifyLevel::Warning,
            format!(
                "card service started degraded: workspace under {} is not writable",
                app_state.config.root.display()
            ),
            None,
        );
    }
    if !app_state.readiness.store() {
        tracing::warn!(
            dir = %app_state.config.news_dir.display(),
            "serving degraded: news store is unreachable"
        );
        app_state.alert(
            NotifyLevel::Warning,
            format!(
                "card service started degraded: news store at {} is unreachable",
                app_state.config.news_dir.display()
            ),
            None,
        );
    }

    let app = router(app_state.clone());
    let actual = listener.local_addr()?;
    tracing::info!("card service listening on http://{actual}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            wait_for_shutdown_signal().await;
            tracing::info!("shutdown signal received, draining connections");
        })
        .await?;

    let dropped = app_state.cards.asset_catalog().clear().await;
    tracing::info!(assets_dropped = dropped, "shutdown complete");
    Ok(())
}

/// SIGTERM is what the orchestrator sends on replacement; SIGINT covers a
/// terminal. Either one starts the drain.
pub async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM handler unavailable, watching ctrl-c only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

use passage_server::{app, auth::OidcStrategy, config::ServerConfig};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };
    tracing::info!("Loaded configuration");

    tracing::info!(domain = %config.identity.domain(), "Discovering identity provider...");
    let public_url = config.public_url();
    let strategy = match OidcStrategy::discover(config.identity.clone(), &public_url).await {
        Ok(strategy) => strategy,
        Err(e) => {
            tracing::error!(error = %e, "Failed to discover identity provider");
            std::process::exit(1);
        }
    };

    let state = app::build_state(config.session.clone(), Arc::new(strategy));

    // Spawn periodic session cleanup task
    let cleanup_gate = state.gate.clone();
    let cleanup_interval_secs = config.session.cleanup_interval_seconds.max(1);
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(cleanup_interval_secs));
        loop {
            interval.tick().await;
            match cleanup_gate.purge_expired().await {
                Ok(count) if count > 0 => {
                    tracing::debug!(deleted_sessions = count, "Periodic session cleanup");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to cleanup expired sessions");
                }
            }
        }
    });

    let router = app::router(state, config.identity.callback_path());

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", addr);
    tracing::info!("sign in at {}/login", public_url.trim_end_matches('/'));

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

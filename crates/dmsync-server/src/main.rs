mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use dmsync_engine::{BulkSync, EventBridge, HookRegistry, LinkStore};

use crate::{
    api::{build_app, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = dmsync_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::debug!(?config, "loaded configuration");

    let links = LinkStore::from_config(&config).await?;
    let (directus, medusa) = dmsync_engine::build_clients(&config)?;
    let medusa = Arc::new(medusa);

    let bridge = Arc::new(EventBridge::new(
        Arc::clone(&medusa),
        links.clone(),
        config.collection.clone(),
        config.currency_code.clone(),
    ));
    let mut registry = HookRegistry::new();
    bridge.register(&mut registry);

    let bulk = Arc::new(BulkSync::new(
        Arc::new(directus),
        medusa,
        links.clone(),
        config.collection.clone(),
        config.currency_code.clone(),
    ));
    let _scheduler = scheduler::build_scheduler(config.sync_schedule.as_deref(), bulk).await?;

    let auth = AuthState::from_env(matches!(
        config.env,
        dmsync_core::Environment::Development
    ))?;
    let app = build_app(
        AppState {
            registry: Arc::new(registry),
            links,
            collection: config.collection.clone(),
        },
        auth,
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "dmsync server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}

//! Settings server: reads settings from the environment (and `.env`), prepares the tables for the
//! enabled resources, and serves the REST surface until Ctrl-C.

use settings_api::{
    app, apply_migrations, builtin_catalog, connect_pool, ensure_database_exists, load_catalog_from_path, resolve,
    AppState, Settings,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("settings_api=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;

    let catalog = match &settings.catalog_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading catalog");
            load_catalog_from_path(path).await?
        }
        None => {
            tracing::info!("using built-in catalog");
            builtin_catalog()?
        }
    };
    let model = resolve(&catalog, settings.enabled_resources.as_deref())?;

    if settings.run_migrations {
        ensure_database_exists(&settings.database.connect_options()?).await?;
    }
    let pool = connect_pool(&settings)?;
    if settings.run_migrations {
        apply_migrations(&pool, &model).await?;
    }

    for r in &model.resources {
        tracing::info!(resource = %r.name, path = %r.path, toggle = r.toggle.is_some(), "mounted");
    }

    let state = AppState {
        pool,
        model: Arc::new(model),
    };
    let router = app(state, settings.body_limit);

    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}

use std::sync::Arc;

use anyhow::Context as _;
use sea_orm::Database;
use tower_http::services::ServeDir;
use tracing::info;

use hackers_api::config::ApiConfig;
use hackers_api::domain::repository::{Mailer, Persistence};
use hackers_api::infra::db::{DbPersistence, ensure_schema};
use hackers_api::infra::images::LocalImageStore;
use hackers_api::infra::mailer::{LogMailer, SmtpMailer};
use hackers_api::infra::sweeper::{SWEEP_INTERVAL, spawn_expired_code_sweeper};
use hackers_api::router::build_router;
use hackers_api::state::AppState;
use hackers_auth_types::token::TokenIssuer;
use hackers_core::config::Config;
use hackers_core::tracing::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ApiConfig::try_from_env().context("load configuration")?;
    info!(?config, "configuration loaded");

    let db = Database::connect(&config.database_url)
        .await
        .context("connect to database")?;
    ensure_schema(&db).await.context("prepare schema")?;

    let persistence = DbPersistence {
        db,
        code_ttl: config.one_time_code_ttl(),
    };
    spawn_expired_code_sweeper(persistence.codes(), SWEEP_INTERVAL);

    let mailer: Arc<dyn Mailer> = match config.smtp() {
        Some(smtp) => Arc::new(SmtpMailer::new(&smtp)?),
        None => {
            info!("SMTP_HOST not set, outgoing mail will only be logged");
            Arc::new(LogMailer)
        }
    };
    let images =
        LocalImageStore::new(config.upload_dir.clone(), config.public_upload_url.clone()).await?;

    let state = AppState {
        persistence,
        tokens: TokenIssuer::new(&config.token_config()),
        hasher: config.password_hasher(),
        mailer,
        images: Arc::new(images),
        reset_link_base: config.reset_link_base.clone(),
    };

    let router = build_router(state).nest_service("/uploads", ServeDir::new(&config.upload_dir));

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;

    info!("api listening on {addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

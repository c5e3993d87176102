use std::{sync::Arc, time::Duration};

use anyhow::Context;
use marquee_api::{
    create_router,
    db::{create_pool, run_migrations, PgHistoryStore, PgUserStore},
    logging::init_logging,
    services::{
        auth::{AuthService, TokenService},
        mail::{DisabledMailTransport, MailTransport, Mailer, SmtpMailTransport},
        providers::{MovieCatalog, TmdbProvider},
    },
    AppState, Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    init_logging()?;

    let pool = create_pool(&config.database_url, config.database_max_connections)
        .await
        .context("Failed to connect to database")?;
    run_migrations(&pool).await?;

    let catalog = TmdbProvider::new(
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
        Duration::from_secs(config.catalog_timeout_secs),
    )?;
    tracing::info!(provider = catalog.name(), "Movie catalog configured");

    let transport: Arc<dyn MailTransport> = if config.email_id.is_empty() {
        tracing::warn!("EMAIL_ID not set, outgoing mail is disabled");
        Arc::new(DisabledMailTransport)
    } else {
        Arc::new(SmtpMailTransport::new(
            &config.smtp_host,
            &config.email_id,
            &config.email_password,
        )?)
    };
    let (mailer, mailer_handle) = Mailer::new(transport);

    let history = Arc::new(PgHistoryStore::new(pool.clone()));
    let users = Arc::new(PgUserStore::new(pool));

    let auth = AuthService::new(
        users,
        history.clone(),
        TokenService::new(&config.jwt_secret_key, config.token_ttl_hours),
        mailer,
        config.bcrypt_cost,
    );

    let state = Arc::new(AppState::new(Arc::new(catalog), history, auth));
    let app = create_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    mailer_handle.shutdown().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

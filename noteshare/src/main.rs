use std::sync::Arc;

use anyhow::Context;
use noteshare::api::ApiServer;
use noteshare::config::AppConfig;
use noteshare::database;
use noteshare::logging;
use noteshare::services::ServiceContainer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Logging comes up before the rest of the config so config errors are recorded.
    let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());
    let (logging_config, _log_guard) =
        logging::init_logging(&log_dir).context("Failed to initialize logging")?;

    let config = AppConfig::from_env().context("Invalid configuration")?;

    let pool = database::init_pool(&config.database_url)
        .await
        .context("Failed to open database")?;
    database::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    let container = Arc::new(ServiceContainer::new(pool, &config)?);
    container.start_background();
    logging_config.start_retention_cleanup(container.cancellation_token());

    let server = ApiServer::new(
        config.server.clone(),
        container.app_state().with_logging_config(logging_config),
    );
    let server_token = server.cancel_token();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
        tracing::info!("Shutdown signal received");
        server_token.cancel();
    });

    tracing::info!("noteshare {} started", env!("CARGO_PKG_VERSION"));
    let served = server.run().await;

    container.shutdown().await?;
    served?;

    Ok(())
}

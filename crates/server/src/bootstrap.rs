use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use shopguide_core::config::{AppConfig, ConfigError, LoadOptions};
use shopguide_core::GuideError;
use shopguide_db::repositories::{
    SqlCatalogRepository, SqlOrderRepository, SqlProfileRepository,
};
use shopguide_db::{connect_with_settings, migrations, DbPool};
use shopguide_guide::{GatewayChatClient, GuideOrchestrator};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub orchestrator: Arc<GuideOrchestrator>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Guide(#[from] GuideError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

/// Brings up the data path and the guide pipeline. A missing model gateway
/// credential fails here, before the server starts accepting chat traffic.
pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        "database migrations applied"
    );

    let chat_client = Arc::new(GatewayChatClient::from_config(&config.llm)?);
    let orchestrator = Arc::new(GuideOrchestrator::new(
        Arc::new(SqlCatalogRepository::new(db_pool.clone())),
        Arc::new(SqlProfileRepository::new(db_pool.clone())),
        Arc::new(SqlOrderRepository::new(db_pool.clone())),
        chat_client,
    ));
    info!(
        event_name = "system.bootstrap.guide_ready",
        model = %config.llm.model,
        "guide pipeline initialized"
    );

    Ok(Application { config, db_pool, orchestrator })
}

#[cfg(test)]
mod tests {
    use shopguide_core::config::{ConfigOverrides, LoadOptions};

    use super::{bootstrap, BootstrapError};

    fn options(overrides: ConfigOverrides) -> LoadOptions {
        LoadOptions { overrides, ..LoadOptions::default() }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_without_model_gateway_key() {
        let result = bootstrap(options(ConfigOverrides {
            database_url: Some("sqlite::memory:".to_string()),
            ..ConfigOverrides::default()
        }))
        .await;

        assert!(matches!(result, Err(BootstrapError::Guide(_))));
    }

    #[tokio::test]
    async fn bootstrap_applies_migrations_and_builds_the_pipeline() {
        let app = bootstrap(options(ConfigOverrides {
            database_url: Some("sqlite::memory:?cache=shared".to_string()),
            llm_api_key: Some("test-key".to_string()),
            ..ConfigOverrides::default()
        }))
        .await
        .expect("bootstrap succeeds with a key");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('products', 'user_profiles', 'orders', 'order_items')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("schema query succeeds");

        assert_eq!(table_count, 4);
    }
}

use std::sync::Arc;

use custodia_core::config::{AppConfig, ConfigError};
use custodia_db::{
    connect_with_settings, migrations, DbPool, SqlEnterpriseRepository, SqlPersonalRepository,
};
use custodia_gateway::HttpAccountGateway;
use custodia_provisioning::{EnterpriseProvisioner, PersonalProvisioner};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub personal: PersonalProvisioner,
    pub enterprise: EnterpriseProvisioner,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("account gateway client could not be built: {0}")]
    Gateway(#[source] reqwest::Error),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let gateway = Arc::new(HttpAccountGateway::new(&config.gateway).map_err(BootstrapError::Gateway)?);
    info!(
        event_name = "system.bootstrap.gateway_ready",
        correlation_id = "bootstrap",
        passive_base_url = %config.gateway.passive_base_url,
        active_base_url = %config.gateway.active_base_url,
        timeout_secs = config.gateway.timeout_secs,
        "account gateway configured"
    );

    let personal = PersonalProvisioner::new(
        Arc::new(SqlPersonalRepository::new(db_pool.clone())),
        gateway.clone(),
    );
    let enterprise =
        EnterpriseProvisioner::new(Arc::new(SqlEnterpriseRepository::new(db_pool.clone())), gateway);

    Ok(Application { config, db_pool, personal, enterprise })
}

#[cfg(test)]
mod tests {
    use custodia_core::config::{AppConfig, ConfigOverrides, LoadOptions};

    use crate::bootstrap::{bootstrap_with_config, Application, BootstrapError};

    async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
        bootstrap_with_config(AppConfig::load(options)?).await
    }

    fn options(database_url: &str, passive_base_url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                passive_base_url: Some(passive_base_url.to_string()),
                active_base_url: Some("http://127.0.0.1:9".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_on_invalid_gateway_url() {
        let result = bootstrap(options("sqlite::memory:", "ftp://passive.local")).await;

        let message = result.err().expect("error").to_string();
        assert!(message.contains("gateway.passive_base_url"), "{message}");
    }

    #[tokio::test]
    async fn bootstrap_applies_migrations_and_wires_provisioners() {
        let app = bootstrap(options("sqlite::memory:", "http://127.0.0.1:9"))
            .await
            .expect("bootstrap should succeed with valid overrides");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('personal', 'enterprise')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("customer tables should exist after bootstrap");
        assert_eq!(table_count, 2);

        assert!(app.personal.find_all().await.expect("list personal").is_empty());
        assert!(app.enterprise.find_all().await.expect("list enterprise").is_empty());

        app.db_pool.close().await;
    }
}

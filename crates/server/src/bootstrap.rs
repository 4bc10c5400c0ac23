use std::sync::Arc;

use axum::Router;
use farmquote_core::config::{AppConfig, ConfigError, LoadOptions};
use farmquote_core::schema::{FormDefinition, SchemaError};
use farmquote_core::submission::SubmissionPipeline;
use farmquote_db::{connect_with_config, migrations, DbPool, SqlEstimateStore};
use thiserror::Error;
use tracing::info;

use crate::estimates::{self, SharedPipeline, SharedStore};
use crate::health;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub pipeline: SharedPipeline,
}

impl Application {
    pub fn router(&self) -> Router {
        health::router(self.db_pool.clone()).merge(estimates::router(self.pipeline.clone()))
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("estimate form definition is invalid: {0}")]
    Form(#[from] SchemaError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let form = Arc::new(FormDefinition::standard()?);

    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
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

    let store: SharedStore = Arc::new(SqlEstimateStore::new(db_pool.clone()));
    let pipeline = Arc::new(SubmissionPipeline::new(form, store));

    Ok(Application { config, db_pool, pipeline })
}

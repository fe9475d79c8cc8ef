//! Database layer for snapfeed.

pub mod entities;
pub mod migrations;
pub mod repositories;

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use snapfeed_common::{AppError, AppResult, config::DatabaseConfig};

/// Open a pooled connection to the configured database.
pub async fn connect(config: &DatabaseConfig) -> AppResult<DatabaseConnection> {
    let mut options = ConnectOptions::new(&config.url);
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .sqlx_logging(false);

    Database::connect(options)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Bring the schema up to date.
pub async fn migrate(db: &DatabaseConnection) -> AppResult<()> {
    migrations::Migrator::up(db, None)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

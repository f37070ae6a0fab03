use std::time::Duration;

use db_migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use utils_core::assets::asset_dir;

pub mod entities;
pub mod models;
pub mod types;

pub use sea_orm::{DbErr, TransactionTrait};

#[derive(Clone)]
pub struct DBService {
    pub conn: DatabaseConnection,
}

impl DBService {
    /// Opens (or creates) the on-disk database and runs pending migrations.
    pub async fn new() -> Result<DBService, DbErr> {
        let database_url = format!(
            "sqlite://{}?mode=rwc",
            asset_dir().join("db.sqlite").to_string_lossy()
        );
        Self::connect(&database_url).await
    }

    pub async fn connect(database_url: &str) -> Result<DBService, DbErr> {
        let mut options = ConnectOptions::new(database_url);
        options
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .sqlx_logging(false);
        let conn = Database::connect(options).await?;
        Migrator::up(&conn, None).await?;
        Ok(DBService { conn })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub async fn setup_db() -> DatabaseConnection {
        // A single pooled connection, otherwise every checkout would see its
        // own empty in-memory database.
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1).sqlx_logging(false);
        let conn = Database::connect(options)
            .await
            .expect("connect in-memory sqlite");
        Migrator::up(&conn, None).await.expect("run migrations");
        conn
    }
}

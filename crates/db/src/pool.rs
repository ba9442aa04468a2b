//! MySQL connection pool.

use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::MySqlPool;
use tracing::info;

use crate::connection::ConnectionPool;
use crate::DbError;

/// Type alias for the shared MySQL pool used across the whole application.
pub type DbPool = MySqlPool;

/// Connection settings, normally filled from `DB_*` environment variables.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Pool ceiling; acquisitions beyond it wait for a free connection.
    pub max_connections: u32,
}

impl DbConfig {
    fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }
}

/// Create a new connection pool and verify it can reach the server.
pub async fn create_pool(config: &DbConfig) -> Result<DbPool, DbError> {
    info!(
        host = %config.host,
        port = config.port,
        database = %config.database,
        "Connecting to database (max_connections={})",
        config.max_connections
    );
    let pool = MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(config.connect_options())
        .await?;

    ping(&pool).await?;
    info!("Connected to the database");
    Ok(pool)
}

/// Run `SELECT 1` through the pool.
pub async fn ping(pool: &DbPool) -> Result<(), DbError> {
    let rows = ConnectionPool::execute(pool, "SELECT 1", &[])
        .await?
        .into_rows()?;
    if rows.is_empty() {
        return Err(DbError::UnexpectedOutput { expected: "one row" });
    }
    Ok(())
}

/// Run embedded SQLx migrations located in `./migrations` (relative to the
/// workspace root at build time).
pub async fn run_migrations(pool: &DbPool) -> Result<(), DbError> {
    info!("Running database migrations");
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

/// Wait for in-flight queries and close every connection.
pub async fn close_pool(pool: &DbPool) {
    pool.close().await;
    info!("Disconnected from database");
}

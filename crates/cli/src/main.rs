//! `crud-api` CLI entry-point.
//!
//! Available sub-commands:
//! - `serve`   — start the API server.
//! - `migrate` — run pending database migrations.
//! - `ping`    — check that the database is reachable.
//!
//! Settings come from flags or the matching environment variables; a `.env`
//! file in the working directory is loaded first if present.

use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use db::DbConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "crud-api",
    about = "REST API over the departments and employees tables",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the REST API server.
    Serve {
        #[command(flatten)]
        database: DbArgs,
        #[arg(long, env = "HOST", default_value = "0.0.0.0")]
        host: String,
        #[arg(long, env = "PORT", default_value_t = 3000)]
        port: u16,
        /// Apply pending migrations before accepting requests.
        #[arg(long)]
        migrate: bool,
    },
    /// Run pending database migrations.
    Migrate {
        #[command(flatten)]
        database: DbArgs,
    },
    /// Connect, run `SELECT 1` and exit.
    Ping {
        #[command(flatten)]
        database: DbArgs,
    },
}

#[derive(Args, Debug)]
struct DbArgs {
    #[arg(long, env = "DB_HOST", default_value = "localhost")]
    db_host: String,
    #[arg(long, env = "DB_PORT", default_value_t = 3306)]
    db_port: u16,
    #[arg(long, env = "DB_USER")]
    db_user: String,
    #[arg(long, env = "DB_PASSWORD", default_value = "", hide_env_values = true)]
    db_password: String,
    #[arg(long, env = "DB_NAME")]
    db_name: String,
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 10)]
    db_max_connections: u32,
}

impl From<DbArgs> for DbConfig {
    fn from(args: DbArgs) -> Self {
        Self {
            host: args.db_host,
            port: args.db_port,
            user: args.db_user,
            password: args.db_password,
            database: args.db_name,
            max_connections: args.db_max_connections,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            database,
            host,
            port,
            migrate,
        } => {
            let pool = db::pool::create_pool(&database.into())
                .await
                .context("failed to connect to database")?;
            if migrate {
                db::pool::run_migrations(&pool)
                    .await
                    .context("migration failed")?;
            }

            let bind = format!("{host}:{port}");
            info!("Starting API server on {bind}");
            let backend = api::Backend::mysql(Arc::new(pool.clone()));
            let served = api::serve(&bind, backend).await;

            db::pool::close_pool(&pool).await;
            served.with_context(|| format!("server on {bind} failed"))?;
        }
        Command::Migrate { database } => {
            let config: DbConfig = database.into();
            info!("Running migrations against {}/{}", config.host, config.database);
            let pool = db::pool::create_pool(&config)
                .await
                .context("failed to connect to database")?;
            db::pool::run_migrations(&pool)
                .await
                .context("migration failed")?;
            db::pool::close_pool(&pool).await;
            info!("Migrations applied successfully");
        }
        Command::Ping { database } => {
            let pool = db::pool::create_pool(&database.into())
                .await
                .context("database is not reachable")?;
            db::pool::close_pool(&pool).await;
            println!("Database is reachable");
        }
    }

    Ok(())
}

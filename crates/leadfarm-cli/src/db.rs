//! Database administration commands.

use anyhow::Context;
use clap::Subcommand;

use leadfarm_core::AppConfig;
use leadfarm_db::{connect_pool, ping, run_migrations, PoolConfig};

/// Sub-commands available under `db`.
#[derive(Debug, Subcommand)]
pub enum DbCommands {
    /// Apply any pending migrations
    Migrate,
    /// Check that the database is reachable
    Ping,
}

/// Run a database admin command.
///
/// # Errors
///
/// Returns an error if `DATABASE_URL` is not set, the pool cannot connect,
/// or the migration run fails.
pub(crate) async fn run_db(config: &AppConfig, command: DbCommands) -> anyhow::Result<()> {
    let database_url = config.require_database_url()?;
    let pool = connect_pool(database_url, PoolConfig::from_app_config(config))
        .await
        .context("failed to connect to the database")?;

    match command {
        DbCommands::Migrate => {
            let applied = run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        DbCommands::Ping => {
            ping(&pool).await?;
            println!("database is reachable");
        }
    }
    Ok(())
}

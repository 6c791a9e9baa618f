mod config;
mod graphql;
mod http;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use migration::{Migrator, MigratorTrait};
use platform_db::{DbPool, DynStore, KeyValueStore, SqlStore, connect};
use platform_obs::{ObsConfig, init_tracing};
use products_hr::{EXPORT_FILE_NAME, LoadOutcome, Roster};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    http::{AppState, ServeConfig},
};

#[derive(Parser, Debug)]
#[command(name = "roster-server", version, about = "Employee roster manager")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP + GraphQL server.
    Serve(ServeCommand),
    /// Run database migrations.
    #[command(subcommand)]
    Migrate(MigrateCommand),
    /// Replace the stored roster with the three seed employees.
    Seed,
    /// Write the full roster as CSV.
    Export {
        #[arg(long, value_name = "FILE", help = "Destination file path")]
        output: Option<PathBuf>,
    },
    /// Print the GraphQL schema snapshot.
    #[command(name = "schema:print")]
    SchemaPrint {
        #[arg(long, value_name = "FILE", help = "Destination file path")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum MigrateCommand {
    /// Apply pending migrations.
    Up,
    /// Rollback the most recent migration.
    Down,
}

#[derive(Args, Debug)]
struct ServeCommand {
    #[arg(long, default_value = "0.0.0.0")]
    host: std::net::IpAddr,
    #[arg(long, default_value_t = 8080)]
    port: u16,
    #[arg(long, help = "Allow starting even when migrations are pending")]
    allow_dirty: bool,
}

impl From<ServeCommand> for ServeConfig {
    fn from(value: ServeCommand) -> Self {
        ServeConfig::new(value.host, value.port)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(ObsConfig::default())?;
    let cli = Cli::parse();
    let app_config = Arc::new(AppConfig::load()?);
    match cli.command {
        Command::Serve(cmd) => run_server(cmd, app_config).await,
        Command::Migrate(action) => match action {
            MigrateCommand::Up => migrate_up(&app_config).await,
            MigrateCommand::Down => migrate_down(&app_config).await,
        },
        Command::Seed => run_seed(&app_config).await,
        Command::Export { output } => run_export(&app_config, output).await,
        Command::SchemaPrint { output } => schema_print(output),
    }
}

async fn setup_pool(config: &AppConfig) -> Result<DbPool> {
    connect(&config.database).await.map_err(Into::into)
}

async fn open_roster(pool: DbPool, config: &AppConfig) -> Result<Roster<DynStore>> {
    let store: DynStore = Arc::new(SqlStore::new(pool));
    let (roster, outcome) = Roster::open(store, config.roster.clone())
        .await
        .context("failed to load roster")?;
    let key = roster.store().key();
    match outcome {
        LoadOutcome::Restored { count } => info!(key, count, "roster restored from storage"),
        LoadOutcome::Seeded => info!(key, "no stored roster; seeded defaults"),
        LoadOutcome::Corrupt => warn!(key, "stored roster unreadable; starting empty"),
    }
    Ok(roster)
}

async fn run_server(cmd: ServeCommand, config: Arc<AppConfig>) -> Result<()> {
    let pool = setup_pool(&config).await?;
    ensure_migrations(&pool, cmd.allow_dirty).await?;
    let roster = Arc::new(Mutex::new(open_roster(pool, &config).await?));
    let schema = graphql::build_schema(roster.clone());
    let state = AppState {
        roster,
        schema,
        config: config.clone(),
    };
    http::serve(cmd.into(), state).await
}

async fn run_seed(config: &AppConfig) -> Result<()> {
    let pool = setup_pool(config).await?;
    ensure_migrations(&pool, false).await?;
    let mut roster = open_roster(pool, config).await?;
    seed_roster(&mut roster).await
}

async fn seed_roster<S: KeyValueStore>(roster: &mut Roster<S>) -> Result<()> {
    roster.reset_to_seed().await?;
    info!(count = roster.employees().len(), "roster reset to seed data");
    Ok(())
}

async fn run_export(config: &AppConfig, output: Option<PathBuf>) -> Result<()> {
    let pool = setup_pool(config).await?;
    ensure_migrations(&pool, false).await?;
    let roster = open_roster(pool, config).await?;
    let target = output.unwrap_or_else(|| PathBuf::from(EXPORT_FILE_NAME));
    export_roster(&roster, &target).await
}

async fn export_roster<S: KeyValueStore>(roster: &Roster<S>, target: &Path) -> Result<()> {
    tokio::fs::write(target, roster.export_csv())
        .await
        .with_context(|| format!("failed to write {}", target.display()))?;
    info!(path = %target.display(), "roster exported");
    Ok(())
}

fn schema_print(path: Option<PathBuf>) -> Result<()> {
    let sdl = graphql::schema_sdl();
    match path {
        Some(target) => std::fs::write(&target, sdl)
            .with_context(|| format!("failed to write {}", target.display())),
        None => {
            println!("{sdl}");
            Ok(())
        }
    }
}

async fn ensure_migrations(pool: &DbPool, allow_dirty: bool) -> Result<()> {
    let pending = Migrator::get_pending_migrations(pool).await?;
    if !pending.is_empty() && !allow_dirty {
        anyhow::bail!(
            "pending migrations detected; run `roster-server migrate up` or pass --allow-dirty"
        );
    }
    Ok(())
}

async fn migrate_up(config: &AppConfig) -> Result<()> {
    let pool = setup_pool(config).await?;
    Migrator::up(&pool, None).await?;
    info!("database migrations applied");
    Ok(())
}

async fn migrate_down(config: &AppConfig) -> Result<()> {
    let pool = setup_pool(config).await?;
    Migrator::down(&pool, Some(1)).await?;
    info!("most recent migration rolled back");
    Ok(())
}

#[cfg(test)]
mod tests {
    use platform_db::MemoryStore;
    use products_hr::RosterSettings;

    use super::*;

    async fn memory_roster() -> Roster<MemoryStore> {
        let (roster, _) = Roster::open(MemoryStore::new(), RosterSettings::default())
            .await
            .unwrap();
        roster
    }

    #[tokio::test]
    async fn seed_restores_the_three_defaults() {
        let mut roster = memory_roster().await;
        roster.delete(1, &true).await.unwrap();
        roster.delete(2, &true).await.unwrap();
        assert_eq!(roster.employees().len(), 1);

        seed_roster(&mut roster).await.unwrap();
        let names: Vec<_> = roster.employees().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Aisha Khan", "Bob Smith", "Charlie Jain"]);

        let storage = roster.store().storage().clone();
        let (reopened, outcome) = Roster::open(storage, RosterSettings::default())
            .await
            .unwrap();
        assert_eq!(outcome, LoadOutcome::Restored { count: 3 });
        assert_eq!(reopened.employees(), roster.employees());
    }

    #[tokio::test]
    async fn export_writes_the_csv_report() {
        let roster = memory_roster().await;
        let target =
            std::env::temp_dir().join(format!("roster-export-{}.csv", std::process::id()));
        export_roster(&roster, &target).await.unwrap();

        let written = tokio::fs::read_to_string(&target).await.unwrap();
        let _ = tokio::fs::remove_file(&target).await;
        assert_eq!(written, roster.export_csv());
        assert!(written.starts_with("ID,Name,Email,Department,Skills,Certified\n"));
    }

    #[test]
    fn schema_snapshot_lists_roster_operations() {
        let sdl = graphql::schema_sdl();
        assert!(sdl.contains("validateField"));
        assert!(sdl.contains("exportCsv"));
    }
}

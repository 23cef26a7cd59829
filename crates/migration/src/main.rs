use clap::{Parser, Subcommand};
use sea_orm::Database;
use sea_orm_migration::prelude::*;

/// Applies or reverts the Seva schema and launch catalog.
#[derive(Parser, Debug)]
#[command(name = "migration")]
struct Cli {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./seva.db?mode=rwc")]
    database_url: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Default)]
enum Command {
    /// Apply pending migrations.
    #[default]
    Up,
    /// Revert the last `steps` migrations, or all of them.
    Down {
        #[arg(long)]
        steps: Option<u32>,
    },
    /// Drop every table and re-apply, seeding the catalog again.
    Fresh,
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let db = Database::connect(&cli.database_url).await?;

    match cli.command.unwrap_or_default() {
        Command::Up => migration::Migrator::up(&db, None).await?,
        Command::Down { steps } => migration::Migrator::down(&db, steps).await?,
        Command::Fresh => migration::Migrator::fresh(&db).await?,
        Command::Status => migration::Migrator::status(&db).await?,
    }

    Ok(())
}

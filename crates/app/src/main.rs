use std::{net::SocketAddr, sync::Arc, time::Duration};

use engine::FsDocumentStore;
use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "seva={level},server={level},engine={level},migration={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.database).await?;
    let engine = engine::Engine::builder()
        .database(db)
        .documents(Arc::new(FsDocumentStore::new(&settings.documents.root)))
        .collaborator_timeout(Duration::from_secs(settings.documents.timeout_secs))
        .build()
        .await?;

    match settings.server {
        Some(server) => {
            tasks.spawn(async move {
                tracing::info!("Found server settings...");
                let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
                let addr: SocketAddr = match format!("{}:{}", bind, server.port).parse() {
                    Ok(addr) => addr,
                    Err(err) => {
                        tracing::error!("invalid server address {bind}:{}: {err}", server.port);
                        return;
                    }
                };
                server::run(engine, addr).await;
            });
        }
        None => tracing::warn!("no server settings found, nothing to run"),
    }

    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    tracing::info!("database ready");
    Ok(database)
}

//! Handles settings for the application.
//!
//! Values come from an optional `settings.toml` in the working directory,
//! overridden by `SEVA__*` environment variables (`SEVA__APP__LEVEL=debug`,
//! `SEVA__SERVER__PORT=8080`, ...).
use config::{Config, ConfigError, Environment, File, builder::DefaultState};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    #[default]
    Memory,
    /// Path of the sqlite file, created when missing.
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct Documents {
    pub root: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    #[serde(default)]
    pub database: Database,
    pub server: Option<Server>,
    pub documents: Documents,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::build(
            Config::builder()
                .add_source(File::with_name("settings").required(false))
                .add_source(Environment::with_prefix("SEVA").separator("__")),
        )
    }

    fn build(builder: config::ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder
            .set_default("app.level", "info")?
            .set_default("documents.root", "documents")?
            .set_default("documents.timeout_secs", 30)?
            .build()?
            .try_deserialize()
    }
}

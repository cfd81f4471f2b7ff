//! Settings of the command line front end.
//!
//! Sources, later ones winning: `config/shopkeep.toml` (optional, or the file
//! given with `--config`), `SHOPKEEP_*` environment variables, command line
//! flags.

use serde::Deserialize;

use crate::{cli::Cli, error::Result};

const DEFAULT_CONFIG_PATH: &str = "config/shopkeep";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Database {
    fn parse(raw: &str) -> Self {
        match raw.trim() {
            "" | "memory" | ":memory:" => Database::Memory,
            path => Database::Sqlite(path.to_string()),
        }
    }

    pub fn url(&self) -> String {
        match self {
            Database::Memory => String::from("sqlite::memory:"),
            Database::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// `memory` or the path of a sqlite file.
    pub database: String,
    pub storage_key: String,
    pub level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: "shopkeep.db".to_string(),
            storage_key: engine::DEFAULT_STORAGE_KEY.to_string(),
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn database(&self) -> Database {
        Database::parse(&self.database)
    }
}

pub fn load(cli: &Cli) -> Result<AppConfig> {
    let config_path = cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("SHOPKEEP"));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(database) = &cli.database {
        settings.database = database.clone();
    }
    if let Some(storage_key) = &cli.storage_key {
        settings.storage_key = storage_key.clone();
    }
    if let Some(level) = &cli.level {
        settings.level = level.clone();
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_parses_memory_and_paths() {
        assert_eq!(Database::parse("memory"), Database::Memory);
        assert_eq!(
            Database::parse("data/shop.db"),
            Database::Sqlite("data/shop.db".to_string())
        );
        assert_eq!(
            Database::parse("data/shop.db").url(),
            "sqlite:data/shop.db?mode=rwc"
        );
    }
}

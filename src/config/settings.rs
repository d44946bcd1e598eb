use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

fn default_pool_size() -> usize {
    4
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            name: None,
            pool_size: default_pool_size(),
        }
    }
}

/// Where `DATABASE_URL` points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    Postgres { url: String, schema: Option<String> },
    Sqlite { path: String },
    Memory,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl DatabaseConfig {
    /// `DATABASE_URL`, trimmed; blank counts as unset.
    pub fn url(&self) -> Option<&str> {
        non_blank(&self.url)
    }

    /// `DATABASE_NAME`, trimmed; blank counts as unset.
    pub fn name(&self) -> Option<&str> {
        non_blank(&self.name)
    }

    pub fn target(&self) -> Option<DatabaseTarget> {
        let url = self.url()?;
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            return Some(DatabaseTarget::Postgres {
                url: url.to_string(),
                schema: self.name().map(str::to_string),
            });
        }
        if url.starts_with("memory://") {
            return Some(DatabaseTarget::Memory);
        }
        let raw = url.strip_prefix("sqlite://").unwrap_or(url);
        let path = match self.name() {
            Some(name) => Path::new(raw)
                .join(format!("{}.db", name))
                .to_string_lossy()
                .into_owned(),
            None => raw.to_string(),
        };
        Some(DatabaseTarget::Sqlite { path })
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        // .env is optional
        let _ = dotenvy::dotenv();

        let mut settings = match Self::find_config_file() {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                toml::from_str::<Settings>(&content)
                    .map_err(|e| AppError::Config(format!("{}: {}", path, e)))?
            }
            None => Settings::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| AppError::Config(format!("invalid PORT: {}", port)))?;
        }
        if let Some(url) = lookup("DATABASE_URL").filter(|v| !v.is_empty()) {
            self.database.url = Some(url);
        }
        if let Some(name) = lookup("DATABASE_NAME").filter(|v| !v.is_empty()) {
            self.database.name = Some(name);
        }
        Ok(())
    }

    fn find_config_file() -> Option<&'static str> {
        let possible_names = ["custom-config.toml", "config.toml"];
        possible_names
            .into_iter()
            .find(|name| Path::new(name).exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_listen_on_8000_without_database() {
        let s = Settings::default();
        assert_eq!(s.server.port, 8000);
        assert_eq!(s.server.host, "0.0.0.0");
        assert!(s.database.target().is_none());
    }

    #[test]
    fn env_overrides_port_and_database() {
        let mut s = Settings::default();
        s.apply_env(env(&[
            ("PORT", "9100"),
            ("DATABASE_URL", "postgres://u:p@localhost/app"),
            ("DATABASE_NAME", "billing"),
        ]))
        .unwrap();
        assert_eq!(s.server.port, 9100);
        assert_eq!(
            s.database.target(),
            Some(DatabaseTarget::Postgres {
                url: "postgres://u:p@localhost/app".into(),
                schema: Some("billing".into()),
            })
        );
    }

    #[test]
    fn invalid_port_is_a_config_error() {
        let mut s = Settings::default();
        let err = s.apply_env(env(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn sqlite_target_joins_database_name() {
        let cfg = DatabaseConfig {
            url: Some("sqlite://data".into()),
            name: Some("pricing".into()),
            ..Default::default()
        };
        let Some(DatabaseTarget::Sqlite { path }) = cfg.target() else {
            panic!("expected sqlite target");
        };
        assert!(path.ends_with("pricing.db"));
        assert!(path.starts_with("data"));

        let cfg = DatabaseConfig {
            url: Some("data/app.db".into()),
            ..Default::default()
        };
        assert_eq!(
            cfg.target(),
            Some(DatabaseTarget::Sqlite {
                path: "data/app.db".into()
            })
        );
    }

    #[test]
    fn memory_target() {
        let cfg = DatabaseConfig {
            url: Some("memory://".into()),
            ..Default::default()
        };
        assert_eq!(cfg.target(), Some(DatabaseTarget::Memory));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let cfg = DatabaseConfig {
            url: Some("   ".into()),
            name: Some(" \t".into()),
            ..Default::default()
        };
        assert_eq!(cfg.url(), None);
        assert_eq!(cfg.name(), None);
        assert_eq!(cfg.target(), None);

        let cfg = DatabaseConfig {
            url: Some(" postgres://db/app ".into()),
            name: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(
            cfg.target(),
            Some(DatabaseTarget::Postgres {
                url: "postgres://db/app".into(),
                schema: None
            })
        );
    }

    #[test]
    fn parses_toml_sections() {
        let s: Settings = toml::from_str(
            r#"
            [server]
            host = "127.0.0.1"
            port = 8080

            [database]
            url = "memory://"
            "#,
        )
        .unwrap();
        assert_eq!(s.server.port, 8080);
        assert_eq!(s.database.pool_size, 4);
        assert_eq!(s.database.target(), Some(DatabaseTarget::Memory));
    }
}

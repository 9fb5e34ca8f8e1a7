//! # Configuration
//!
//! Settings come from environment variables with sensible defaults.
//!
//! | Variable                       | Default                                  |
//! |--------------------------------|------------------------------------------|
//! | `FABRICA_DB_PATH`              | platform data dir + `fabrica.db`         |
//! | `FABRICA_MAX_CONNECTIONS`      | `5`                                      |
//! | `FABRICA_CONNECT_TIMEOUT_SECS` | `30`                                     |
//! | `RUST_LOG`                     | `info,fabrica=debug,sqlx=warn`           |
//!
//! The `--db` flag wins over `FABRICA_DB_PATH`.

use directories::ProjectDirs;
use std::path::PathBuf;
use std::time::Duration;

use fabrica_db::DbConfig;

pub const ENV_DB_PATH: &str = "FABRICA_DB_PATH";
pub const ENV_MAX_CONNECTIONS: &str = "FABRICA_MAX_CONNECTIONS";
pub const ENV_CONNECT_TIMEOUT: &str = "FABRICA_CONNECT_TIMEOUT_SECS";

/// Log filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "info,fabrica=debug,sqlx=warn";

const DB_FILE_NAME: &str = "fabrica.db";

/// Resolved application settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub max_connections: u32,
    pub connect_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            db_path: default_db_path(),
            max_connections: 5,
            connect_timeout: Duration::from_secs(30),
        }
    }
}

impl AppConfig {
    /// Reads the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key → value source. Unparseable numbers
    /// keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = AppConfig::default();

        if let Some(path) = lookup(ENV_DB_PATH).filter(|p| !p.trim().is_empty()) {
            config.db_path = PathBuf::from(path);
        }

        if let Some(max) = lookup(ENV_MAX_CONNECTIONS).and_then(|v| v.trim().parse().ok()) {
            config.max_connections = max;
        }

        if let Some(secs) = lookup(ENV_CONNECT_TIMEOUT).and_then(|v| v.trim().parse().ok()) {
            config.connect_timeout = Duration::from_secs(secs);
        }

        config
    }

    /// Applies the `--db` flag.
    pub fn with_db_override(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.db_path = path;
        }
        self
    }

    /// Pool settings for [`fabrica_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.db_path)
            .max_connections(self.max_connections.max(1))
            .acquire_timeout(self.connect_timeout)
    }
}

/// `~/.local/share/fabrica/fabrica.db` on Linux, the platform equivalent
/// elsewhere, or `./fabrica.db` when no home directory is known.
fn default_db_path() -> PathBuf {
    ProjectDirs::from("es", "Fabrica de Libros", "fabrica")
        .map(|dirs| dirs.data_dir().join(DB_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(DB_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabrica_db::DbLocation;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[]));
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert!(config.db_path.ends_with(DB_FILE_NAME));
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, "/tmp/f.db"),
            (ENV_MAX_CONNECTIONS, "2"),
            (ENV_CONNECT_TIMEOUT, "7"),
        ]));
        assert_eq!(config.db_path, PathBuf::from("/tmp/f.db"));
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.connect_timeout, Duration::from_secs(7));
    }

    #[test]
    fn test_bad_numbers_keep_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            (ENV_MAX_CONNECTIONS, "many"),
            (ENV_CONNECT_TIMEOUT, "-1"),
        ]));
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_flag_beats_env() {
        let config = AppConfig::from_lookup(lookup(&[(ENV_DB_PATH, "/tmp/env.db")]))
            .with_db_override(Some(PathBuf::from("/tmp/flag.db")));
        assert_eq!(config.db_path, PathBuf::from("/tmp/flag.db"));

        let db = config.db_config();
        assert_eq!(db.location, DbLocation::File(PathBuf::from("/tmp/flag.db")));
        assert_eq!(db.max_connections, 5);
        assert_eq!(db.acquire_timeout, Duration::from_secs(30));
    }
}

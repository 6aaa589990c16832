//! Connection descriptor.

use crate::dialect::Dialect;
use crate::error::{DbError, DbResult};
use serde::Deserialize;

/// Everything needed to open one connection.
///
/// Passed explicitly to [`Database::connect`](super::Database::connect); the
/// library never reads credentials on its own.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    pub driver: String,
    #[serde(default = "default_host")]
    pub host: String,
    /// Defaults to the driver's well-known port when absent.
    #[serde(default)]
    pub port: Option<u16>,
    pub database: String,
    #[serde(default, alias = "username")]
    pub user: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    database: ConnectionConfig,
}

fn default_host() -> String {
    "localhost".to_string()
}

impl ConnectionConfig {
    pub fn new(driver: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            host: default_host(),
            port: None,
            database: database.into(),
            user: String::new(),
            password: String::new(),
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Parse the driver name. Fails with [`DbError::UnsupportedDriver`].
    pub fn dialect(&self) -> DbResult<Dialect> {
        self.driver.parse()
    }

    /// Explicit port, else 5432 for postgres and 3306 for mysql.
    pub fn resolved_port(&self) -> DbResult<u16> {
        if let Some(port) = self.port {
            return Ok(port);
        }
        Ok(match self.dialect()? {
            Dialect::Postgres => 5432,
            Dialect::Mysql => 3306,
        })
    }

    /// Parse TOML holding either a `[database]` table or the bare fields.
    ///
    /// A `[database]` table is parsed on its own; errors inside it are not
    /// retried as bare fields.
    pub fn from_toml_str(input: &str) -> DbResult<Self> {
        let doc: toml::Table = input
            .parse()
            .map_err(|e: toml::de::Error| DbError::config(e.to_string()))?;
        let parsed = if doc.get("database").is_some_and(toml::Value::is_table) {
            toml::from_str::<ConfigFile>(input).map(|file| file.database)
        } else {
            toml::from_str::<Self>(input)
        };
        parsed.map_err(|e| DbError::config(e.to_string()))
    }

    /// Read `DB_DRIVER`, `DB_HOST`, `DB_PORT`, `DB_DATABASE`, `DB_USERNAME`
    /// and `DB_PASSWORD` from the process environment.
    pub fn from_env() -> DbResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DbResult<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| DbError::config(format!("{key} is not set")))
        };

        let port = match lookup("DB_PORT").filter(|v| !v.trim().is_empty()) {
            Some(raw) => Some(
                raw.trim()
                    .parse::<u16>()
                    .map_err(|e| DbError::config(format!("DB_PORT '{raw}': {e}")))?,
            ),
            None => None,
        };

        Ok(Self {
            driver: required("DB_DRIVER")?,
            host: lookup("DB_HOST")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(default_host),
            port,
            database: required("DB_DATABASE")?,
            user: lookup("DB_USERNAME").unwrap_or_default(),
            password: lookup("DB_PASSWORD").unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn toml_database_table() {
        let cfg = ConnectionConfig::from_toml_str(
            r#"
[database]
driver = "postgres"
host = "db.internal"
port = 6543
database = "app"
user = "app"
password = "secret"
"#,
        )
        .unwrap();
        assert_eq!(cfg.driver, "postgres");
        assert_eq!(cfg.host, "db.internal");
        assert_eq!(cfg.resolved_port().unwrap(), 6543);
        assert_eq!(cfg.user, "app");
    }

    #[test]
    fn toml_bare_fields_and_defaults() {
        let cfg = ConnectionConfig::from_toml_str(
            r#"
driver = "mysql"
database = "shop"
username = "root"
"#,
        )
        .unwrap();
        assert_eq!(cfg.host, "localhost");
        assert_eq!(cfg.user, "root");
        assert_eq!(cfg.password, "");
        assert_eq!(cfg.resolved_port().unwrap(), 3306);
    }

    #[test]
    fn toml_missing_database_is_config_error() {
        let err = ConnectionConfig::from_toml_str("driver = \"mysql\"\n").unwrap_err();
        assert!(matches!(err, DbError::Config(_)));
    }

    #[test]
    fn toml_database_table_errors_are_not_masked() {
        let err = ConnectionConfig::from_toml_str(
            r#"
[database]
driver = "mysql"
databse = "app"
"#,
        )
        .unwrap_err();
        let DbError::Config(msg) = &err else {
            panic!("expected config error, got {err:?}");
        };
        assert!(msg.contains("databse"), "{msg}");
        assert!(!msg.contains("unknown field `database`"), "{msg}");
    }

    #[test]
    fn unknown_driver_fails_on_dialect() {
        let cfg = ConnectionConfig::new("sqlite", "app");
        assert!(matches!(
            cfg.dialect(),
            Err(DbError::UnsupportedDriver { driver }) if driver == "sqlite"
        ));
        assert!(cfg.resolved_port().is_err());
    }

    #[test]
    fn builder_setters() {
        let cfg = ConnectionConfig::new("pgsql", "app")
            .host("10.0.0.2")
            .port(5433)
            .user("svc")
            .password("pw");
        assert_eq!(cfg.dialect().unwrap(), Dialect::Postgres);
        assert_eq!(cfg.resolved_port().unwrap(), 5433);
        assert_eq!(cfg.password, "pw");
    }

    #[test]
    fn env_lookup() {
        let env: HashMap<&str, &str> = [
            ("DB_DRIVER", "mysql"),
            ("DB_HOST", "127.0.0.1"),
            ("DB_PORT", "3307"),
            ("DB_DATABASE", "shop"),
            ("DB_USERNAME", "root"),
        ]
        .into_iter()
        .collect();
        let cfg =
            ConnectionConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, Some(3307));
        assert_eq!(cfg.user, "root");
        assert_eq!(cfg.password, "");
    }

    #[test]
    fn env_lookup_errors() {
        let missing = ConnectionConfig::from_lookup(|_| None).unwrap_err();
        assert!(matches!(missing, DbError::Config(msg) if msg.contains("DB_DRIVER")));

        let bad_port = ConnectionConfig::from_lookup(|k| match k {
            "DB_DRIVER" => Some("mysql".into()),
            "DB_DATABASE" => Some("shop".into()),
            "DB_PORT" => Some("abc".into()),
            _ => None,
        })
        .unwrap_err();
        assert!(matches!(bad_port, DbError::Config(msg) if msg.contains("DB_PORT")));
    }
}

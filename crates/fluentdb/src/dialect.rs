//! Supported SQL dialects.

use crate::error::{DbError, DbResult};
use std::fmt;
use std::str::FromStr;

/// The target database flavor.
///
/// The dialect decides which operators are accepted and how `:key`
/// placeholders are rewritten before a statement reaches the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Mysql,
    Postgres,
}

impl Dialect {
    /// Canonical driver name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Mysql => "mysql",
            Dialect::Postgres => "postgres",
        }
    }

    /// Native positional placeholder for the 1-based parameter `index`.
    pub(crate) fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Mysql => "?".to_string(),
            Dialect::Postgres => format!("${index}"),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = DbError;

    fn from_str(s: &str) -> DbResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" => Ok(Dialect::Mysql),
            "postgres" | "postgresql" | "pgsql" => Ok(Dialect::Postgres),
            _ => Err(DbError::UnsupportedDriver {
                driver: s.to_string(),
            }),
        }
    }
}

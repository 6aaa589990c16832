//! Operator and direction whitelists.
//!
//! Every operator reaching a WHERE or JOIN fragment is looked up here first, so
//! only the fixed keywords below can ever appear between two operands.

use crate::dialect::Dialect;
use crate::error::{DbError, DbResult};
use std::fmt;
use std::str::FromStr;

/// Operators accepted by every dialect.
pub const BASE_OPERATORS: &[&str] = &[
    "<", "<=", "!<", ">", ">=", "!>", "<>", "!=", "=", "BETWEEN", "EXISTS", "OR", "AND", "NOT",
    "IN", "ALL", "ANY", "LIKE", "IS NULL", "UNIQUE",
];

/// Operators only postgres understands.
pub const POSTGRES_OPERATORS: &[&str] = &["ILIKE"];

/// Resolved operator whitelist for one dialect.
#[derive(Debug, Clone, Copy)]
pub struct OperatorPolicy {
    dialect: Dialect,
}

impl OperatorPolicy {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Dialect-specific additions to [`BASE_OPERATORS`].
    fn extensions(&self) -> &'static [&'static str] {
        match self.dialect {
            Dialect::Postgres => POSTGRES_OPERATORS,
            Dialect::Mysql => &[],
        }
    }

    /// All operators accepted for this dialect.
    pub fn operators(&self) -> impl Iterator<Item = &'static str> {
        BASE_OPERATORS.iter().chain(self.extensions()).copied()
    }

    /// Check `operator` case-insensitively and return its canonical spelling.
    pub fn validate(&self, operator: &str) -> DbResult<&'static str> {
        let wanted = normalize(operator);
        self.operators()
            .find(|candidate| *candidate == wanted)
            .ok_or_else(|| DbError::UnsupportedOperator {
                operator: operator.to_string(),
                dialect: self.dialect.to_string(),
            })
    }
}

/// Uppercase and collapse inner whitespace (`is  null` -> `IS NULL`).
fn normalize(operator: &str) -> String {
    operator
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_uppercase()
}

/// ORDER BY direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = DbError;

    fn from_str(s: &str) -> DbResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(Direction::Asc),
            "DESC" => Ok(Direction::Desc),
            _ => Err(DbError::UnsupportedDirection {
                direction: s.to_string(),
            }),
        }
    }
}

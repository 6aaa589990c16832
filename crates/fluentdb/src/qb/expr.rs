//! WHERE clause model and rendering.

use std::fmt;

/// Boolean connector placed in front of a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connector {
    #[default]
    And,
    Or,
}

impl Connector {
    pub fn as_str(&self) -> &'static str {
        match self {
            Connector::And => "AND",
            Connector::Or => "OR",
        }
    }
}

impl fmt::Display for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JOIN flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
    Full,
}

impl JoinType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER",
            JoinType::Left => "LEFT",
            JoinType::Right => "RIGHT",
            JoinType::Full => "FULL",
        }
    }
}

/// Right-hand side of a predicate, as binding keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// `IS NULL` takes no value.
    None,
    /// `:key`
    Key(String),
    /// `(:k1, :k2, ...)`, or `(NULL)` when empty.
    List(Vec<String>),
    /// `:low AND :high`
    Range(String, String),
}

impl Operand {
    /// Binding keys referenced by this operand.
    pub fn keys(&self) -> Vec<&str> {
        match self {
            Operand::None => Vec::new(),
            Operand::Key(k) => vec![k.as_str()],
            Operand::List(keys) => keys.iter().map(String::as_str).collect(),
            Operand::Range(low, high) => vec![low.as_str(), high.as_str()],
        }
    }
}

/// One WHERE predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhereClause {
    pub column: String,
    /// Canonical operator from the whitelist.
    pub operator: &'static str,
    pub operand: Operand,
    pub connector: Connector,
}

impl WhereClause {
    /// Render the predicate with `:key` placeholders.
    pub fn render(&self) -> String {
        match &self.operand {
            Operand::None => format!("{} {}", self.column, self.operator),
            Operand::Key(key) => format!("{} {} :{}", self.column, self.operator, key),
            Operand::List(keys) if keys.is_empty() => {
                format!("{} {} (NULL)", self.column, self.operator)
            }
            Operand::List(keys) => {
                let placeholders: Vec<String> = keys.iter().map(|k| format!(":{k}")).collect();
                format!(
                    "{} {} ({})",
                    self.column,
                    self.operator,
                    placeholders.join(", ")
                )
            }
            Operand::Range(low, high) => {
                format!("{} {} :{} AND :{}", self.column, self.operator, low, high)
            }
        }
    }
}

/// Join clauses into a WHERE body.
///
/// The separator in front of clause `i` (for `i >= 1`) is clause `i`'s own
/// connector; the first clause's connector is never emitted:
/// `c0 <conn1> c1 <conn2> c2 ...`.
pub(crate) fn render_where(clauses: &[WhereClause]) -> Option<String> {
    if clauses.is_empty() {
        return None;
    }

    let mut out = String::new();
    for (i, clause) in clauses.iter().enumerate() {
        if i > 0 {
            out.push(' ');
            out.push_str(clause.connector.as_str());
            out.push(' ');
        }
        out.push_str(&clause.render());
    }
    Some(out)
}

//! Fluent query builder.
//!
//! A [`QueryBuilder`] accumulates table, projection, joins, WHERE clauses,
//! ordering and paging through chained calls, then one terminal operation
//! compiles that state into a single statement and runs it on an
//! [`Executor`](crate::Executor).
//!
//! # Features
//!
//! - **Whitelisted operators**: every WHERE/JOIN operator goes through
//!   [`OperatorPolicy`] for the builder's dialect
//! - **Bound values only**: values are registered under generated `:key`
//!   placeholders, never interpolated
//! - **Inspectable**: `to_sql()` returns exactly what `get()` dispatches
//!
//! # Usage
//!
//! ```ignore
//! use fluentdb::{Dialect, QueryBuilder};
//!
//! let mut qb = QueryBuilder::new(Dialect::Postgres);
//! qb.table("users")
//!     .select(["id", "name"])
//!     .where_("status", "=", "active")?
//!     .or_where("role", "=", "admin")?
//!     .order_by("name", "DESC")?
//!     .limit(20)?;
//!
//! let rows = qb.get(&mut db).await?;
//! ```

mod delete;
mod expr;
mod insert;
mod select;
mod update;

pub use expr::{Connector, JoinType, Operand, WhereClause};

use crate::bindings::BindingRegistry;
use crate::dialect::Dialect;
use crate::error::{DbError, DbResult};
use crate::executor::Executor;
use crate::ident::sanitize;
use crate::operator::{Direction, OperatorPolicy};
use crate::value::Value;

/// Mutable accumulator for one logical query.
///
/// Built per request and discarded after its terminal operation; it is never
/// shared between requests.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    dialect: Dialect,
    table: Option<String>,
    from: Option<String>,
    select: Vec<String>,
    joins: Vec<String>,
    wheres: Vec<WhereClause>,
    order_by: Vec<String>,
    limit: Option<u64>,
    offset: Option<u64>,
    bindings: BindingRegistry,
}

impl QueryBuilder {
    /// Create an empty builder for `dialect`.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            table: None,
            from: None,
            select: Vec::new(),
            joins: Vec::new(),
            wheres: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            bindings: BindingRegistry::new(),
        }
    }

    /// Create a builder already bound to `table`.
    pub fn for_table(dialect: Dialect, table: &str) -> Self {
        let mut qb = Self::new(dialect);
        qb.table(table);
        qb
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn policy(&self) -> OperatorPolicy {
        OperatorPolicy::new(self.dialect)
    }

    /// Registered bindings, in registration order.
    pub fn bindings(&self) -> &BindingRegistry {
        &self.bindings
    }

    pub fn where_clauses(&self) -> &[WhereClause] {
        &self.wheres
    }

    // ==================== Target & projection ====================

    /// Set the target table.
    pub fn table(&mut self, name: &str) -> &mut Self {
        self.table = Some(sanitize(name).into_owned());
        self
    }

    /// Override the FROM source for SELECT/COUNT.
    pub fn from(&mut self, name: &str) -> &mut Self {
        self.from = Some(sanitize(name).into_owned());
        self
    }

    /// Replace the projection. An empty projection compiles to `*`.
    pub fn select<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.select = columns
            .into_iter()
            .map(|c| sanitize(c.as_ref()).into_owned())
            .collect();
        self
    }

    // ==================== JOIN ====================

    /// Append `<type> JOIN table ON local_key <operator> foreign_key`.
    pub fn join(
        &mut self,
        table: &str,
        local_key: &str,
        operator: &str,
        foreign_key: &str,
        join_type: JoinType,
    ) -> DbResult<&mut Self> {
        let operator = self.policy().validate(operator)?;
        self.joins.push(format!(
            "{} JOIN {} ON {} {} {}",
            join_type.as_str(),
            sanitize(table),
            sanitize(local_key),
            operator,
            sanitize(foreign_key)
        ));
        Ok(self)
    }

    /// Append an INNER JOIN.
    pub fn inner_join(
        &mut self,
        table: &str,
        local_key: &str,
        operator: &str,
        foreign_key: &str,
    ) -> DbResult<&mut Self> {
        self.join(table, local_key, operator, foreign_key, JoinType::Inner)
    }

    /// Append a LEFT JOIN.
    pub fn left_join(
        &mut self,
        table: &str,
        local_key: &str,
        operator: &str,
        foreign_key: &str,
    ) -> DbResult<&mut Self> {
        self.join(table, local_key, operator, foreign_key, JoinType::Left)
    }

    /// Append a RIGHT JOIN.
    pub fn right_join(
        &mut self,
        table: &str,
        local_key: &str,
        operator: &str,
        foreign_key: &str,
    ) -> DbResult<&mut Self> {
        self.join(table, local_key, operator, foreign_key, JoinType::Right)
    }

    /// Append a FULL JOIN.
    pub fn full_join(
        &mut self,
        table: &str,
        local_key: &str,
        operator: &str,
        foreign_key: &str,
    ) -> DbResult<&mut Self> {
        self.join(table, local_key, operator, foreign_key, JoinType::Full)
    }

    // ==================== WHERE ====================

    /// Append a predicate joined with `connector`.
    ///
    /// The operator is validated before anything is recorded, so a rejected
    /// call leaves the builder untouched.
    pub fn where_with(
        &mut self,
        column: &str,
        operator: &str,
        value: impl Into<Value>,
        connector: Connector,
    ) -> DbResult<&mut Self> {
        let operator = self.policy().validate(operator)?;
        let column = sanitize(column).into_owned();
        let value = value.into();

        let operand = match (operator, value) {
            ("IS NULL", _) => Operand::None,
            ("BETWEEN", Value::List(items)) if items.len() == 2 => {
                let mut items = items.into_iter();
                let low = self.bindings.push(&column, items.next().unwrap_or(Value::Null));
                let high = self.bindings.push(&column, items.next().unwrap_or(Value::Null));
                Operand::Range(low, high)
            }
            ("BETWEEN", _) => {
                return Err(DbError::invalid_value(
                    column,
                    "BETWEEN expects a list of exactly two values",
                ));
            }
            (_, Value::List(items)) => Operand::List(
                items
                    .into_iter()
                    .map(|item| self.bindings.push(&column, item))
                    .collect(),
            ),
            (_, value) => Operand::Key(self.bindings.push(&column, value)),
        };

        self.wheres.push(WhereClause {
            column,
            operator,
            operand,
            connector,
        });
        Ok(self)
    }

    /// Append an AND predicate.
    pub fn where_(
        &mut self,
        column: &str,
        operator: &str,
        value: impl Into<Value>,
    ) -> DbResult<&mut Self> {
        self.where_with(column, operator, value, Connector::And)
    }

    /// Append an AND `IN` predicate.
    pub fn where_in(&mut self, column: &str, values: impl Into<Value>) -> DbResult<&mut Self> {
        self.where_with(column, "IN", values, Connector::And)
    }

    /// Append an OR predicate.
    pub fn or_where(
        &mut self,
        column: &str,
        operator: &str,
        value: impl Into<Value>,
    ) -> DbResult<&mut Self> {
        self.where_with(column, operator, value, Connector::Or)
    }

    /// Append an OR `IN` predicate.
    pub fn or_where_in(&mut self, column: &str, values: impl Into<Value>) -> DbResult<&mut Self> {
        self.where_with(column, "IN", values, Connector::Or)
    }

    // ==================== Ordering & paging ====================

    /// Append `column direction` to ORDER BY. Only `ASC`/`DESC` are accepted.
    pub fn order_by(&mut self, column: &str, direction: &str) -> DbResult<&mut Self> {
        let direction: Direction = direction.parse()?;
        self.order_by
            .push(format!("{} {}", sanitize(column), direction));
        Ok(self)
    }

    /// Set LIMIT. Accepts integers and numeric text; negatives are rejected.
    pub fn limit(&mut self, limit: impl Into<Value>) -> DbResult<&mut Self> {
        self.limit = Some(non_negative("LIMIT", limit.into())?);
        Ok(self)
    }

    /// Set OFFSET. Accepts integers and numeric text; negatives are rejected.
    pub fn offset(&mut self, offset: impl Into<Value>) -> DbResult<&mut Self> {
        self.offset = Some(non_negative("OFFSET", offset.into())?);
        Ok(self)
    }

    // ==================== Transactions ====================

    /// Begin a transaction on `conn`.
    pub async fn begin_transaction<E: Executor>(&self, conn: &mut E) -> DbResult<()> {
        conn.begin_transaction().await
    }

    /// Commit the transaction open on `conn`.
    pub async fn commit<E: Executor>(&self, conn: &mut E) -> DbResult<()> {
        conn.commit().await
    }

    /// Roll back the transaction open on `conn`.
    pub async fn rollback<E: Executor>(&self, conn: &mut E) -> DbResult<()> {
        conn.rollback().await
    }

    // ==================== Compilation helpers ====================

    /// Source for SELECT/COUNT: the FROM override, else the table.
    fn source(&self) -> DbResult<&str> {
        self.from
            .as_deref()
            .or(self.table.as_deref())
            .filter(|t| !t.is_empty())
            .ok_or(DbError::MissingTable)
    }

    /// Target for INSERT/UPDATE/DELETE: the table, else the FROM override.
    fn target(&self) -> DbResult<&str> {
        self.table
            .as_deref()
            .or(self.from.as_deref())
            .filter(|t| !t.is_empty())
            .ok_or(DbError::MissingTable)
    }

    /// Operators were validated for `self.dialect`; refuse any other connection.
    fn ensure_dialect<E: Executor>(&self, conn: &E) -> DbResult<()> {
        let connection = conn.dialect();
        if connection != self.dialect {
            return Err(DbError::DialectMismatch {
                builder: self.dialect,
                connection,
            });
        }
        Ok(())
    }

    /// Append JOIN, WHERE and (optionally) ORDER BY / LIMIT / OFFSET.
    fn push_tail(&self, sql: &mut String, paging: bool) {
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }

        if let Some(where_sql) = expr::render_where(&self.wheres) {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }

        if !paging {
            return;
        }

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
    }
}

fn non_negative(clause: &'static str, value: Value) -> DbResult<u64> {
    match value.as_integer() {
        Some(n) if n >= 0 => Ok(n as u64),
        _ => Err(DbError::InvalidLimitOffset {
            clause,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests;

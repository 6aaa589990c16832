//! UPDATE with a mandatory WHERE clause.

use crate::error::{DbError, DbResult};
use crate::executor::Executor;
use crate::ident::sanitize;
use crate::qb::QueryBuilder;
use crate::value::Value;

impl QueryBuilder {
    /// Register one binding per column of `data` and return the UPDATE statement.
    ///
    /// Empty `data` yields `Ok(None)`. Without at least one WHERE clause this
    /// fails with [`DbError::MissingWhereClause`] and registers nothing.
    pub fn stage_update<I, K, V>(&mut self, data: I) -> DbResult<Option<String>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let data: Vec<(String, Value)> = data
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        if data.is_empty() {
            return Ok(None);
        }

        let table = self.target()?.to_string();
        if self.wheres.is_empty() {
            return Err(DbError::MissingWhereClause { table });
        }

        let assignments: Vec<String> = data
            .into_iter()
            .map(|(column, value)| {
                let key = self.bindings.push(&column, value);
                format!("{} = :{}", sanitize(&column), key)
            })
            .collect();

        let mut sql = format!("UPDATE {} SET {}", table, assignments.join(", "));
        self.push_tail(&mut sql, true);
        Ok(Some(sql))
    }

    /// Update the rows matched by the current WHERE clauses.
    ///
    /// Returns the affected row count; empty `data` succeeds with `0`.
    pub async fn update<E, I, K, V>(&mut self, conn: &mut E, data: I) -> DbResult<u64>
    where
        E: Executor,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.ensure_dialect(conn)?;
        match self.stage_update(data)? {
            Some(sql) => conn.execute(&sql, &self.bindings).await,
            None => Ok(0),
        }
    }
}

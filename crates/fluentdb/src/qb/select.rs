//! SELECT and COUNT compilation and execution.

use crate::error::{DbError, DbResult};
use crate::executor::Executor;
use crate::qb::QueryBuilder;
use crate::row::Row;

impl QueryBuilder {
    /// Compile the SELECT statement `get()` would run.
    pub fn to_sql(&self) -> DbResult<String> {
        let projection = if self.select.is_empty() {
            "*".to_string()
        } else {
            self.select.join(", ")
        };
        let mut sql = format!("SELECT {} FROM {}", projection, self.source()?);
        self.push_tail(&mut sql, true);
        Ok(sql)
    }

    /// Compile the statement `count()` would run.
    ///
    /// The projection becomes `COUNT(*) AS count`; ORDER BY, LIMIT and OFFSET
    /// are left out so the total covers every matching row.
    pub fn to_count_sql(&self) -> DbResult<String> {
        let mut sql = format!("SELECT COUNT(*) AS count FROM {}", self.source()?);
        self.push_tail(&mut sql, false);
        Ok(sql)
    }

    /// Run the SELECT and return all rows.
    pub async fn get<E: Executor>(&self, conn: &mut E) -> DbResult<Vec<Row>> {
        self.ensure_dialect(conn)?;
        let sql = self.to_sql()?;
        conn.fetch_all(&sql, &self.bindings).await
    }

    /// Run the COUNT and return the `count` field of its single row.
    pub async fn count<E: Executor>(&self, conn: &mut E) -> DbResult<i64> {
        self.ensure_dialect(conn)?;
        let sql = self.to_count_sql()?;
        let rows = conn.fetch_all(&sql, &self.bindings).await?;
        rows.first()
            .and_then(|row| row.get_i64("count"))
            .ok_or_else(|| DbError::NotFound("count field missing from COUNT result".to_string()))
    }
}

//! DELETE.

use crate::error::DbResult;
use crate::executor::Executor;
use crate::qb::QueryBuilder;

impl QueryBuilder {
    /// Compile the DELETE statement.
    ///
    /// Unlike UPDATE there is no WHERE guard: without clauses this deletes
    /// every row of the table.
    pub fn to_delete_sql(&self) -> DbResult<String> {
        let mut sql = format!("DELETE FROM {}", self.target()?);
        self.push_tail(&mut sql, true);
        Ok(sql)
    }

    /// Delete the rows matched by the current WHERE clauses.
    pub async fn delete<E: Executor>(&self, conn: &mut E) -> DbResult<u64> {
        self.ensure_dialect(conn)?;
        let sql = self.to_delete_sql()?;
        conn.execute(&sql, &self.bindings).await
    }
}

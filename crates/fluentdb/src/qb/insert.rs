//! Multi-row INSERT.

use crate::error::{DbError, DbResult};
use crate::executor::Executor;
use crate::ident::sanitize;
use crate::qb::QueryBuilder;
use crate::value::Value;

impl QueryBuilder {
    /// Register bindings for `rows` and return the INSERT statement.
    ///
    /// The column list comes from the first row; every other row must carry
    /// the same columns (in any order). Values are registered row by row, one
    /// placeholder group per row. Returns `Ok(None)` for an empty input.
    ///
    /// Nothing is registered unless every row passes validation.
    pub fn stage_insert<I, R, K, V>(&mut self, rows: I) -> DbResult<Option<String>>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let rows: Vec<Vec<(String, Value)>> = rows
            .into_iter()
            .map(|row| row.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
            .collect();

        let Some(first) = rows.first() else {
            return Ok(None);
        };
        let table = self.target()?.to_string();

        let columns: Vec<String> = first.iter().map(|(c, _)| c.clone()).collect();
        if columns.is_empty() {
            return Err(DbError::MismatchedRow {
                index: 0,
                message: "row has no columns".to_string(),
            });
        }

        let mut ordered: Vec<Vec<Value>> = Vec::with_capacity(rows.len());
        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != columns.len() {
                return Err(DbError::MismatchedRow {
                    index,
                    message: format!("expected {} columns, got {}", columns.len(), row.len()),
                });
            }
            let mut row = row;
            let mut values = Vec::with_capacity(columns.len());
            for column in &columns {
                let pos = row.iter().position(|(c, _)| c == column).ok_or_else(|| {
                    DbError::MismatchedRow {
                        index,
                        message: format!("missing column '{column}'"),
                    }
                })?;
                values.push(row.swap_remove(pos).1);
            }
            ordered.push(values);
        }

        let mut groups = Vec::with_capacity(ordered.len());
        for values in ordered {
            let keys: Vec<String> = columns
                .iter()
                .zip(values)
                .map(|(column, value)| format!(":{}", self.bindings.push(column, value)))
                .collect();
            groups.push(format!("({})", keys.join(", ")));
        }

        let column_list: Vec<String> = columns.iter().map(|c| sanitize(c).into_owned()).collect();
        Ok(Some(format!(
            "INSERT INTO {} ({}) VALUES {}",
            table,
            column_list.join(", "),
            groups.join(", ")
        )))
    }

    /// Insert `rows` in one statement and return the affected row count.
    ///
    /// An empty input succeeds with `0` without touching the connection.
    pub async fn insert<E, I, R, K, V>(&mut self, conn: &mut E, rows: I) -> DbResult<u64>
    where
        E: Executor,
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.ensure_dialect(conn)?;
        match self.stage_insert(rows)? {
            Some(sql) => conn.execute(&sql, &self.bindings).await,
            None => Ok(0),
        }
    }
}

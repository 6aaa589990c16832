//! In-memory executor for unit tests.

use crate::bindings::BindingRegistry;
use crate::dialect::Dialect;
use crate::error::DbResult;
use crate::executor::Executor;
use crate::row::Row;
use crate::value::Value;
use std::collections::VecDeque;

/// One statement as it reached the executor.
#[derive(Debug, Clone)]
pub(crate) struct Dispatched {
    pub sql: String,
    pub bindings: Vec<(String, Value)>,
}

/// Records every statement and answers reads from a queue of canned results.
#[derive(Debug)]
pub(crate) struct RecordingExecutor {
    pub dialect: Dialect,
    pub dispatched: Vec<Dispatched>,
    pub transaction_log: Vec<&'static str>,
    results: VecDeque<Vec<Row>>,
    affected: u64,
}

impl RecordingExecutor {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            dispatched: Vec::new(),
            transaction_log: Vec::new(),
            results: VecDeque::new(),
            affected: 1,
        }
    }

    /// Queue the rows returned by the next `fetch_all`.
    pub fn push_result(&mut self, rows: Vec<Row>) {
        self.results.push_back(rows);
    }

    pub fn last_sql(&self) -> Option<&str> {
        self.dispatched.last().map(|d| d.sql.as_str())
    }

    fn record(&mut self, sql: &str, bindings: &BindingRegistry) {
        self.dispatched.push(Dispatched {
            sql: sql.to_string(),
            bindings: bindings
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        });
    }
}

impl Executor for RecordingExecutor {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn fetch_all(&mut self, sql: &str, bindings: &BindingRegistry) -> DbResult<Vec<Row>> {
        // Resolve placeholders like a real backend would, so unbound keys fail.
        bindings.bind_all(sql, self.dialect)?;
        self.record(sql, bindings);
        Ok(self.results.pop_front().unwrap_or_default())
    }

    async fn execute(&mut self, sql: &str, bindings: &BindingRegistry) -> DbResult<u64> {
        bindings.bind_all(sql, self.dialect)?;
        self.record(sql, bindings);
        Ok(self.affected)
    }

    async fn begin_transaction(&mut self) -> DbResult<()> {
        self.transaction_log.push("BEGIN");
        Ok(())
    }

    async fn commit(&mut self) -> DbResult<()> {
        self.transaction_log.push("COMMIT");
        Ok(())
    }

    async fn rollback(&mut self) -> DbResult<()> {
        self.transaction_log.push("ROLLBACK");
        Ok(())
    }
}

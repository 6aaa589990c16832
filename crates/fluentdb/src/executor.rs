//! Execution seam between the query builder and a live connection.

use crate::bindings::BindingRegistry;
use crate::dialect::Dialect;
use crate::error::DbResult;
use crate::row::Row;

/// Something that can run compiled statements.
///
/// SQL arrives exactly as the builder compiled it, with `:key` placeholders,
/// together with the registry holding their values. Implementations bind the
/// values (see [`BindingRegistry::bind_all`]) and run the statement.
///
/// Transactions are plain calls: there is no nesting and no automatic
/// rollback, the caller balances begin/commit/rollback.
pub trait Executor: Send {
    /// Dialect of the underlying connection.
    fn dialect(&self) -> Dialect;

    /// Run a statement and return all rows.
    fn fetch_all(
        &mut self,
        sql: &str,
        bindings: &BindingRegistry,
    ) -> impl std::future::Future<Output = DbResult<Vec<Row>>> + Send;

    /// Run a statement and return the number of affected rows.
    fn execute(
        &mut self,
        sql: &str,
        bindings: &BindingRegistry,
    ) -> impl std::future::Future<Output = DbResult<u64>> + Send;

    fn begin_transaction(&mut self) -> impl std::future::Future<Output = DbResult<()>> + Send;

    fn commit(&mut self) -> impl std::future::Future<Output = DbResult<()>> + Send;

    fn rollback(&mut self) -> impl std::future::Future<Output = DbResult<()>> + Send;
}

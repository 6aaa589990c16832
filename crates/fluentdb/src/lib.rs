//! # fluentdb
//!
//! A fluent, parameter-bound SQL query builder for MySQL and PostgreSQL.
//!
//! ## Features
//!
//! - **Fluent chaining**: shape a query with `table`, `select`, `join`,
//!   `where_`, `order_by`, `limit` and `offset`, then run one terminal call
//! - **Bound values only**: every value goes through a generated `:key`
//!   placeholder; nothing is inlined into SQL text
//! - **Operator whitelist**: WHERE/JOIN operators are checked per dialect
//!   (`ILIKE` is postgres-only)
//! - **Inspectable**: `to_sql()` is exactly the text the connection receives
//! - **Guarded updates**: `update` refuses to run without a WHERE clause
//! - **Pagination**: search/filter/sort/page over any builder, with
//!   `x-data-page` / `x-data-total` headers
//!
//! ## Usage
//!
//! ```ignore
//! use fluentdb::{ConnectionConfig, Database};
//!
//! let mut db = Database::connect(&ConnectionConfig::from_env()?).await?;
//!
//! // SELECT
//! let mut qb = db.table("users");
//! qb.select(["id", "name"])
//!     .where_("status", "=", "active")?
//!     .order_by("name", "ASC")?
//!     .limit(10)?;
//! let users = qb.get(&mut db).await?;
//!
//! // INSERT
//! db.table("users")
//!     .insert(&mut db, [[("name", "alice")], [("name", "bob")]])
//!     .await?;
//!
//! // UPDATE
//! let mut qb = db.table("users");
//! qb.where_("id", "=", 7)?;
//! qb.update(&mut db, [("status", "inactive")]).await?;
//!
//! // Transactions are plain calls on the connection
//! qb.begin_transaction(&mut db).await?;
//! qb.delete(&mut db).await?;
//! qb.commit(&mut db).await?;
//! ```

pub mod bindings;
pub mod connection;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod ident;
pub mod operator;
pub mod pagination;
pub mod qb;
pub mod row;
pub mod value;

#[cfg(test)]
mod testing;

pub use bindings::{BindingRegistry, BoundStatement};
pub use connection::{ConnectionConfig, Database};
pub use dialect::Dialect;
pub use error::{DbError, DbResult};
pub use executor::Executor;
pub use operator::{Direction, OperatorPolicy};
pub use pagination::{ColumnMeta, Page, PageBody, PageHeaders, PageRequest, paginate};
pub use qb::{Connector, JoinType, Operand, QueryBuilder, WhereClause};
pub use row::Row;
pub use value::Value;

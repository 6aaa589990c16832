//! Connection adapter.
//!
//! [`Database`] owns exactly one live connection, either postgres
//! (`tokio-postgres`) or mysql (`sqlx`), for its whole lifetime. There is no
//! pool and no retry: `connect` either returns a working adapter or an error.
//!
//! # Example
//!
//! ```ignore
//! use fluentdb::{ConnectionConfig, Database};
//!
//! let config = ConnectionConfig::new("postgres", "app")
//!     .host("localhost")
//!     .user("app")
//!     .password("secret");
//! let mut db = Database::connect(&config).await?;
//!
//! let mut qb = db.table("users");
//! qb.where_("id", "=", 1)?;
//! let rows = qb.get(&mut db).await?;
//! ```

mod config;
mod mysql;
mod postgres;

pub use config::ConnectionConfig;

use crate::bindings::BindingRegistry;
use crate::dialect::Dialect;
use crate::error::DbResult;
use crate::executor::Executor;
use crate::qb::QueryBuilder;
use crate::row::Row;
use mysql::MysqlConnection;
use postgres::PostgresConnection;
use tracing::{debug, info};

const MAX_LOGGED_SQL: usize = 200;

enum Backend {
    Postgres(PostgresConnection),
    Mysql(MysqlConnection),
}

/// One connection plus the dialect it speaks.
pub struct Database {
    dialect: Dialect,
    backend: Backend,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("dialect", &self.dialect)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Open a connection.
    ///
    /// The driver name is checked before any network I/O, so an unknown
    /// driver fails with [`DbError::UnsupportedDriver`](crate::DbError::UnsupportedDriver)
    /// without touching the network. Connect failures surface as
    /// [`DbError::Connection`](crate::DbError::Connection).
    pub async fn connect(config: &ConnectionConfig) -> DbResult<Self> {
        let dialect = config.dialect()?;
        let port = config.resolved_port()?;
        info!(
            target: "fluentdb.connection",
            %dialect,
            host = %config.host,
            port,
            database = %config.database,
            "connecting"
        );

        let backend = match dialect {
            Dialect::Postgres => Backend::Postgres(PostgresConnection::connect(config).await?),
            Dialect::Mysql => Backend::Mysql(MysqlConnection::connect(config).await?),
        };

        Ok(Self { dialect, backend })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Start a builder on `name` in this connection's dialect.
    pub fn table(&self, name: &str) -> QueryBuilder {
        QueryBuilder::for_table(self.dialect, name)
    }

    fn log_sql(&self, sql: &str, bindings: &BindingRegistry) {
        debug!(
            target: "fluentdb.sql",
            dialect = %self.dialect,
            sql = %truncate_sql(sql, MAX_LOGGED_SQL),
            param_count = bindings.len(),
            "dispatch"
        );
    }

    async fn transaction_statement(&mut self, postgres: &str, mysql: &str) -> DbResult<()> {
        match &mut self.backend {
            Backend::Postgres(conn) => {
                debug!(target: "fluentdb.connection", statement = postgres, "transaction");
                conn.batch_execute(postgres).await
            }
            Backend::Mysql(conn) => {
                debug!(target: "fluentdb.connection", statement = mysql, "transaction");
                conn.raw_execute(mysql).await
            }
        }
    }
}

impl Executor for Database {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn fetch_all(&mut self, sql: &str, bindings: &BindingRegistry) -> DbResult<Vec<Row>> {
        self.log_sql(sql, bindings);
        match &mut self.backend {
            Backend::Postgres(conn) => conn.fetch_all(sql, bindings).await,
            Backend::Mysql(conn) => conn.fetch_all(sql, bindings).await,
        }
    }

    async fn execute(&mut self, sql: &str, bindings: &BindingRegistry) -> DbResult<u64> {
        self.log_sql(sql, bindings);
        match &mut self.backend {
            Backend::Postgres(conn) => conn.execute(sql, bindings).await,
            Backend::Mysql(conn) => conn.execute(sql, bindings).await,
        }
    }

    async fn begin_transaction(&mut self) -> DbResult<()> {
        self.transaction_statement("BEGIN", "START TRANSACTION").await
    }

    async fn commit(&mut self) -> DbResult<()> {
        self.transaction_statement("COMMIT", "COMMIT").await
    }

    async fn rollback(&mut self) -> DbResult<()> {
        self.transaction_statement("ROLLBACK", "ROLLBACK").await
    }
}

/// Cut `sql` to at most `max_bytes` on a char boundary, marking the cut.
fn truncate_sql(sql: &str, max_bytes: usize) -> std::borrow::Cow<'_, str> {
    if sql.len() <= max_bytes {
        return sql.into();
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &sql[..end]).into()
}

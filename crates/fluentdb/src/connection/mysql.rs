//! MySQL backend on one `sqlx` connection.

use super::config::ConnectionConfig;
use crate::bindings::BindingRegistry;
use crate::dialect::Dialect;
use crate::error::{DbError, DbResult};
use crate::row::Row;
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySql, MySqlArguments, MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column as _, ConnectOptions, Row as _, TypeInfo as _, ValueRef as _};

pub(crate) struct MysqlConnection {
    conn: MySqlConnection,
}

impl MysqlConnection {
    pub(crate) async fn connect(config: &ConnectionConfig) -> DbResult<Self> {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.resolved_port()?)
            .database(&config.database)
            .username(&config.user)
            .password(&config.password);

        let conn = options
            .connect()
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;

        Ok(Self { conn })
    }

    pub(crate) async fn fetch_all(
        &mut self,
        sql: &str,
        bindings: &BindingRegistry,
    ) -> DbResult<Vec<Row>> {
        let bound = bindings.bind_all(sql, Dialect::Mysql)?;
        let query = bind_values(sqlx::query(&bound.sql), &bound.values)?;
        let rows = query.fetch_all(&mut self.conn).await?;
        rows.iter().map(decode_row).collect()
    }

    pub(crate) async fn execute(&mut self, sql: &str, bindings: &BindingRegistry) -> DbResult<u64> {
        let bound = bindings.bind_all(sql, Dialect::Mysql)?;
        let query = bind_values(sqlx::query(&bound.sql), &bound.values)?;
        Ok(query.execute(&mut self.conn).await?.rows_affected())
    }

    /// Run a statement over the text protocol, without preparing it.
    pub(crate) async fn raw_execute(&mut self, sql: &str) -> DbResult<()> {
        sqlx::Executor::execute(&mut self.conn, sqlx::raw_sql(sql)).await?;
        Ok(())
    }
}

fn bind_values<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    values: &[&Value],
) -> DbResult<Query<'q, MySql, MySqlArguments>> {
    for value in values {
        query = match value {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(*b),
            Value::Int(i) => query.bind(*i),
            Value::Float(f) => query.bind(*f),
            Value::Text(s) => query.bind(s.clone()),
            Value::List(_) => {
                return Err(DbError::invalid_value(
                    "",
                    "list values are expanded into one placeholder per element",
                ));
            }
        };
    }
    Ok(query)
}

fn decode_row(row: &MySqlRow) -> DbResult<Row> {
    let mut out = Row::with_capacity(row.columns().len());
    for column in row.columns() {
        let idx = column.ordinal();
        let name = column.name();

        if row.try_get_raw(idx)?.is_null() {
            out.push(name, JsonValue::Null);
            continue;
        }

        let type_name = column.type_info().name().to_ascii_uppercase();
        let value =
            decode_value(row, idx, &type_name).map_err(|e| DbError::decode(name, e.to_string()))?;
        out.push(name, value);
    }
    Ok(out)
}

fn decode_value(row: &MySqlRow, idx: usize, type_name: &str) -> Result<JsonValue, sqlx::Error> {
    let value = match type_name {
        "BOOLEAN" => JsonValue::from(row.try_get::<bool, _>(idx)?),
        "TINYINT" => JsonValue::from(row.try_get::<i8, _>(idx)?),
        "SMALLINT" => JsonValue::from(row.try_get::<i16, _>(idx)?),
        "MEDIUMINT" | "INT" => JsonValue::from(row.try_get::<i32, _>(idx)?),
        "BIGINT" => JsonValue::from(row.try_get::<i64, _>(idx)?),
        "TINYINT UNSIGNED" => JsonValue::from(row.try_get::<u8, _>(idx)?),
        "SMALLINT UNSIGNED" => JsonValue::from(row.try_get::<u16, _>(idx)?),
        "MEDIUMINT UNSIGNED" | "INT UNSIGNED" => JsonValue::from(row.try_get::<u32, _>(idx)?),
        "BIGINT UNSIGNED" => JsonValue::from(row.try_get::<u64, _>(idx)?),
        "FLOAT" => JsonValue::from(f64::from(row.try_get::<f32, _>(idx)?)),
        "DOUBLE" => JsonValue::from(row.try_get::<f64, _>(idx)?),
        "JSON" => row.try_get::<JsonValue, _>(idx)?,
        "DATE" => JsonValue::from(row.try_get::<NaiveDate, _>(idx)?.to_string()),
        "TIME" => JsonValue::from(row.try_get::<NaiveTime, _>(idx)?.to_string()),
        "DATETIME" => JsonValue::from(
            row.try_get::<NaiveDateTime, _>(idx)?
                .format("%Y-%m-%dT%H:%M:%S%.f")
                .to_string(),
        ),
        "TIMESTAMP" => JsonValue::from(row.try_get::<DateTime<Utc>, _>(idx)?.to_rfc3339()),
        "BINARY" | "VARBINARY" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" => {
            JsonValue::from(row.try_get::<Vec<u8>, _>(idx)?)
        }
        // DECIMAL, ENUM, SET and the text family arrive as strings.
        _ => JsonValue::from(row.try_get_unchecked::<String, _>(idx)?),
    };
    Ok(value)
}

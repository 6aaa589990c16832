//! Postgres backend on `tokio-postgres`.

use super::config::ConnectionConfig;
use crate::bindings::BindingRegistry;
use crate::dialect::Dialect;
use crate::error::{DbError, DbResult};
use crate::row::Row;
use crate::value::Value;
use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use tokio_postgres::{Client, Column, NoTls};

type BoxError = Box<dyn std::error::Error + Sync + Send>;

pub(crate) struct PostgresConnection {
    client: Client,
}

impl PostgresConnection {
    pub(crate) async fn connect(config: &ConnectionConfig) -> DbResult<Self> {
        let mut pg = tokio_postgres::Config::new();
        pg.host(&config.host)
            .port(config.resolved_port()?)
            .dbname(&config.database)
            .user(&config.user);
        if !config.password.is_empty() {
            pg.password(&config.password);
        }

        let (client, connection) = pg
            .connect(NoTls)
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(
                    target: "fluentdb.connection",
                    error = %e,
                    "postgres connection closed with error"
                );
            }
        });

        Ok(Self { client })
    }

    pub(crate) async fn fetch_all(
        &mut self,
        sql: &str,
        bindings: &BindingRegistry,
    ) -> DbResult<Vec<Row>> {
        let bound = bindings.bind_all(sql, Dialect::Postgres)?;
        let params = params(&bound.values);
        let rows = self.client.query(bound.sql.as_str(), &params).await?;
        rows.iter().map(decode_row).collect()
    }

    pub(crate) async fn execute(&mut self, sql: &str, bindings: &BindingRegistry) -> DbResult<u64> {
        let bound = bindings.bind_all(sql, Dialect::Postgres)?;
        let params = params(&bound.values);
        Ok(self.client.execute(bound.sql.as_str(), &params).await?)
    }

    pub(crate) async fn batch_execute(&mut self, sql: &str) -> DbResult<()> {
        Ok(self.client.batch_execute(sql).await?)
    }
}

fn params<'a>(values: &[&'a Value]) -> Vec<&'a (dyn ToSql + Sync)> {
    values
        .iter()
        .map(|v| *v as &(dyn ToSql + Sync))
        .collect()
}

// ==================== Binding ====================

fn mismatch(kind: &str, ty: &Type) -> BoxError {
    format!("cannot bind {kind} value to parameter of type {ty}").into()
}

fn int_to_sql(v: i64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    if <i64 as ToSql>::accepts(ty) {
        v.to_sql(ty, out)
    } else if <i32 as ToSql>::accepts(ty) {
        i32::try_from(v)?.to_sql(ty, out)
    } else if <i16 as ToSql>::accepts(ty) {
        i16::try_from(v)?.to_sql(ty, out)
    } else if <f64 as ToSql>::accepts(ty) {
        (v as f64).to_sql(ty, out)
    } else if <f32 as ToSql>::accepts(ty) {
        (v as f32).to_sql(ty, out)
    } else if <Decimal as ToSql>::accepts(ty) {
        Decimal::from(v).to_sql(ty, out)
    } else if <bool as ToSql>::accepts(ty) {
        (v != 0).to_sql(ty, out)
    } else if <&str as ToSql>::accepts(ty) {
        v.to_string().as_str().to_sql(ty, out)
    } else {
        Err(mismatch("integer", ty))
    }
}

fn float_to_sql(v: f64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    if <f64 as ToSql>::accepts(ty) {
        v.to_sql(ty, out)
    } else if <f32 as ToSql>::accepts(ty) {
        (v as f32).to_sql(ty, out)
    } else if <Decimal as ToSql>::accepts(ty) {
        Decimal::try_from(v)?.to_sql(ty, out)
    } else if <&str as ToSql>::accepts(ty) {
        v.to_string().as_str().to_sql(ty, out)
    } else if v.fract() == 0.0 && (<i64 as ToSql>::accepts(ty) || <i32 as ToSql>::accepts(ty)) {
        int_to_sql(v as i64, ty, out)
    } else {
        Err(mismatch("float", ty))
    }
}

fn text_to_sql(s: &str, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    if <&str as ToSql>::accepts(ty) {
        return s.to_sql(ty, out);
    }
    let trimmed = s.trim();
    if <i64 as ToSql>::accepts(ty) || <i32 as ToSql>::accepts(ty) || <i16 as ToSql>::accepts(ty) {
        int_to_sql(trimmed.parse::<i64>()?, ty, out)
    } else if <f64 as ToSql>::accepts(ty) || <f32 as ToSql>::accepts(ty) {
        float_to_sql(trimmed.parse::<f64>()?, ty, out)
    } else if <Decimal as ToSql>::accepts(ty) {
        parse_decimal(trimmed)?.to_sql(ty, out)
    } else if <bool as ToSql>::accepts(ty) {
        let b = match trimmed.to_ascii_lowercase().as_str() {
            "t" | "true" | "1" | "yes" | "on" => true,
            "f" | "false" | "0" | "no" | "off" => false,
            _ => return Err(mismatch("text", ty)),
        };
        b.to_sql(ty, out)
    } else if <JsonValue as ToSql>::accepts(ty) {
        serde_json::from_str::<JsonValue>(s)?.to_sql(ty, out)
    } else if <uuid::Uuid as ToSql>::accepts(ty) {
        uuid::Uuid::parse_str(trimmed)?.to_sql(ty, out)
    } else if <DateTime<Utc> as ToSql>::accepts(ty) {
        trimmed.parse::<DateTime<Utc>>()?.to_sql(ty, out)
    } else if <NaiveDateTime as ToSql>::accepts(ty) {
        parse_naive_datetime(trimmed)?.to_sql(ty, out)
    } else if <NaiveDate as ToSql>::accepts(ty) {
        trimmed.parse::<NaiveDate>()?.to_sql(ty, out)
    } else if <NaiveTime as ToSql>::accepts(ty) {
        trimmed.parse::<NaiveTime>()?.to_sql(ty, out)
    } else {
        Err(mismatch("text", ty))
    }
}

/// Plain (`"9.99"`) or scientific (`"1e3"`) notation.
fn parse_decimal(s: &str) -> Result<Decimal, rust_decimal::Error> {
    s.parse::<Decimal>().or_else(|_| Decimal::from_scientific(s))
}

fn parse_naive_datetime(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    s.parse::<NaiveDateTime>()
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
}

/// Values are loosely typed; the encoding follows the parameter type the
/// server inferred for each placeholder.
impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => {
                if <bool as ToSql>::accepts(ty) {
                    b.to_sql(ty, out)
                } else {
                    int_to_sql(i64::from(*b), ty, out)
                }
            }
            Value::Int(i) => int_to_sql(*i, ty, out),
            Value::Float(f) => float_to_sql(*f, ty, out),
            Value::Text(s) => text_to_sql(s, ty, out),
            Value::List(_) => {
                Err("list values are expanded into one placeholder per element".into())
            }
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

// ==================== Decoding ====================

/// NUMERIC keeps its exact digits as a JSON string.
fn numeric_to_json(d: Decimal) -> JsonValue {
    JsonValue::String(d.to_string())
}

fn decode_row(row: &tokio_postgres::Row) -> DbResult<Row> {
    let mut out = Row::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        out.push(column.name(), decode_column(row, idx, column)?);
    }
    Ok(out)
}

fn decode_column(row: &tokio_postgres::Row, idx: usize, column: &Column) -> DbResult<JsonValue> {
    let ty = column.type_();
    let decode_err = |e: tokio_postgres::Error| DbError::decode(column.name(), e.to_string());

    macro_rules! get {
        ($t:ty) => {
            row.try_get::<_, Option<$t>>(idx).map_err(decode_err)?
        };
    }

    let value = if *ty == Type::BOOL {
        get!(bool).map(JsonValue::from)
    } else if *ty == Type::INT2 {
        get!(i16).map(JsonValue::from)
    } else if *ty == Type::INT4 {
        get!(i32).map(JsonValue::from)
    } else if *ty == Type::INT8 {
        get!(i64).map(JsonValue::from)
    } else if *ty == Type::OID {
        get!(u32).map(JsonValue::from)
    } else if *ty == Type::FLOAT4 {
        get!(f32).map(|v| JsonValue::from(f64::from(v)))
    } else if *ty == Type::FLOAT8 {
        get!(f64).map(JsonValue::from)
    } else if *ty == Type::NUMERIC {
        get!(Decimal).map(numeric_to_json)
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        get!(JsonValue)
    } else if *ty == Type::TIMESTAMP {
        get!(NaiveDateTime).map(|v| JsonValue::from(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string()))
    } else if *ty == Type::TIMESTAMPTZ {
        get!(DateTime<Utc>).map(|v| JsonValue::from(v.to_rfc3339()))
    } else if *ty == Type::DATE {
        get!(NaiveDate).map(|v| JsonValue::from(v.to_string()))
    } else if *ty == Type::TIME {
        get!(NaiveTime).map(|v| JsonValue::from(v.to_string()))
    } else if *ty == Type::UUID {
        get!(uuid::Uuid).map(|v| JsonValue::from(v.to_string()))
    } else if *ty == Type::BYTEA {
        get!(Vec<u8>).map(JsonValue::from)
    } else if <String as tokio_postgres::types::FromSql>::accepts(ty) {
        get!(String).map(JsonValue::from)
    } else {
        return Err(DbError::decode(
            column.name(),
            format!("unsupported column type {ty}"),
        ));
    };

    Ok(value.unwrap_or(JsonValue::Null))
}

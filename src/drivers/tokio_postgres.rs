use std::error::Error as StdError;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use tokio_postgres::types::{FromSql, ToSql, Type};
use tokio_postgres::{Client, NoTls, Statement};
use tracing::{debug, error};

use crate::config::ConnectionConfig;
use crate::error::{Result, SchemaBindError};
use crate::traits::DatabaseDriver;
use crate::types::{BindParameter, BindType, RawQueryResult, SqlValue};

/// PostgreSQL driver implementation using tokio-postgres.
///
/// Statements are prepared with parameter types declared from each
/// parameter's bind type. Writes report the first column of the first
/// returned row as the generated id, so inserts should use
/// `RETURNING id`.
pub struct TokioPostgresDriver {
    client: Client,
}

impl TokioPostgresDriver {
    /// Connect to a PostgreSQL database.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let (client, connection) = config
            .to_pg_config()
            .connect(NoTls)
            .await
            .map_err(|e| SchemaBindError::ConnectionFailed(e.to_string()))?;

        // Spawn the connection handler
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "PostgreSQL connection error");
            }
        });

        debug!(host = %config.host, database = %config.database, "connected");
        Ok(Self { client })
    }

    async fn prepare(&self, sql: &str, params: &[BindParameter]) -> Result<Statement> {
        let types: Vec<Type> = params.iter().map(|p| pg_type(p.bind_type)).collect();

        let statement = self
            .client
            .prepare_typed(sql, &types)
            .await
            .map_err(|e| classify(e, SchemaBindError::PrepareFailed))?;

        if statement.params().len() != params.len() {
            return Err(SchemaBindError::PrepareFailed(format!(
                "statement has {} placeholder(s) but {} parameter(s) were bound",
                statement.params().len(),
                params.len()
            )));
        }
        Ok(statement)
    }

    async fn run(
        &self,
        sql: &str,
        params: &[BindParameter],
    ) -> Result<(Statement, Vec<tokio_postgres::Row>)> {
        let statement = self.prepare(sql, params).await?;

        let converted_params: Vec<Box<dyn ToSql + Sync + Send>> =
            params.iter().map(bind_param_to_tosql).collect();

        let param_refs: Vec<&(dyn ToSql + Sync)> = converted_params
            .iter()
            .map(|b| b.as_ref() as &(dyn ToSql + Sync))
            .collect();

        let rows = self
            .client
            .query(&statement, &param_refs)
            .await
            .map_err(|e| classify(e, SchemaBindError::QueryFailed))?;
        Ok((statement, rows))
    }
}

#[async_trait]
impl DatabaseDriver for TokioPostgresDriver {
    async fn query(&self, sql: &str, params: &[BindParameter]) -> Result<RawQueryResult> {
        let (statement, rows) = self.run(sql, params).await?;

        // Extract column names
        let columns: Vec<String> = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let result_rows = rows
            .iter()
            .map(|row| {
                row.columns()
                    .iter()
                    .enumerate()
                    .map(|(i, col)| row_value(row, i, col.type_()))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(RawQueryResult::new(columns, result_rows))
    }

    async fn execute(&self, sql: &str, params: &[BindParameter]) -> Result<Option<i64>> {
        let (_, rows) = self.run(sql, params).await?;

        let Some(row) = rows.first() else {
            return Ok(None);
        };
        if row.is_empty() {
            return Ok(None);
        }
        Ok(match row_value(row, 0, row.columns()[0].type_())? {
            SqlValue::Integer(id) => Some(id),
            _ => None,
        })
    }
}

/// Closed connections are connection failures whatever the stage.
fn classify(e: tokio_postgres::Error, otherwise: fn(String) -> SchemaBindError) -> SchemaBindError {
    if e.is_closed() {
        SchemaBindError::ConnectionFailed(e.to_string())
    } else {
        otherwise(e.to_string())
    }
}

/// Declared parameter type for a bind type.
fn pg_type(bind_type: BindType) -> Type {
    match bind_type {
        BindType::Integer => Type::INT8,
        BindType::String => Type::TEXT,
        BindType::Decimal => Type::FLOAT8,
        BindType::Binary => Type::BYTEA,
        BindType::Unknown => Type::UNKNOWN,
    }
}

/// Convert a BindParameter to a boxed ToSql trait object.
fn bind_param_to_tosql(param: &BindParameter) -> Box<dyn ToSql + Sync + Send> {
    match (&param.value, param.bind_type) {
        (SqlValue::Null, BindType::Integer) => Box::new(None::<i64>),
        (SqlValue::Null, BindType::Decimal) => Box::new(None::<f64>),
        (SqlValue::Null, BindType::Binary) => Box::new(None::<Vec<u8>>),
        (SqlValue::Null, _) => Box::new(None::<String>),
        (SqlValue::Integer(i), _) => Box::new(*i),
        (SqlValue::Text(s), _) => Box::new(s.clone()),
        (SqlValue::Decimal(f), _) => Box::new(*f),
        (SqlValue::Bytes(b), _) => Box::new(b.clone()),
        (SqlValue::Bool(b), _) => Box::new(*b),
    }
}

/// Decode the cell at `index` according to its column type.
fn row_value(row: &tokio_postgres::Row, index: usize, type_: &Type) -> Result<SqlValue> {
    let decode_err =
        |e: tokio_postgres::Error| SchemaBindError::QueryFailed(format!("decoding column {}: {}", index, e));

    let value = match *type_ {
        Type::BOOL => row.try_get::<_, Option<bool>>(index).map(|v| v.map(SqlValue::Bool)),
        Type::INT2 => row
            .try_get::<_, Option<i16>>(index)
            .map(|v| v.map(|i| SqlValue::Integer(i.into()))),
        Type::INT4 => row
            .try_get::<_, Option<i32>>(index)
            .map(|v| v.map(|i| SqlValue::Integer(i.into()))),
        Type::INT8 => row.try_get::<_, Option<i64>>(index).map(|v| v.map(SqlValue::Integer)),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(index)
            .map(|v| v.map(|f| SqlValue::Decimal(f.into()))),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(index).map(|v| v.map(SqlValue::Decimal)),
        Type::NUMERIC => row
            .try_get::<_, Option<PgNumeric>>(index)
            .map(|v| v.map(|n| SqlValue::Decimal(n.0))),
        Type::BYTEA => row.try_get::<_, Option<Vec<u8>>>(index).map(|v| v.map(SqlValue::Bytes)),
        Type::DATE => row
            .try_get::<_, Option<NaiveDate>>(index)
            .map(|v| v.map(|d| SqlValue::Text(d.to_string()))),
        Type::TIME => row
            .try_get::<_, Option<NaiveTime>>(index)
            .map(|v| v.map(|t| SqlValue::Text(t.to_string()))),
        Type::TIMESTAMP => row
            .try_get::<_, Option<NaiveDateTime>>(index)
            .map(|v| v.map(|t| SqlValue::Text(t.to_string()))),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<DateTime<Utc>>>(index)
            .map(|v| v.map(|t| SqlValue::Text(t.to_rfc3339()))),
        _ if <String as FromSql>::accepts(type_) => {
            row.try_get::<_, Option<String>>(index).map(|v| v.map(SqlValue::Text))
        }
        _ => row
            .try_get::<_, Option<RawBytes>>(index)
            .map(|v| v.map(|b| SqlValue::Bytes(b.0))),
    };

    value.map(|v| v.unwrap_or(SqlValue::Null)).map_err(decode_err)
}

/// Wire bytes of a column type with no dedicated decoder.
struct RawBytes(Vec<u8>);

impl<'a> FromSql<'a> for RawBytes {
    fn from_sql(_: &Type, raw: &'a [u8]) -> std::result::Result<Self, Box<dyn StdError + Sync + Send>> {
        Ok(RawBytes(raw.to_vec()))
    }

    fn accepts(_: &Type) -> bool {
        true
    }
}

/// NUMERIC decoded from its binary wire format into an f64.
struct PgNumeric(f64);

const NUMERIC_POS: u16 = 0x0000;
const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

impl<'a> FromSql<'a> for PgNumeric {
    fn from_sql(_: &Type, raw: &'a [u8]) -> std::result::Result<Self, Box<dyn StdError + Sync + Send>> {
        let word = |i: usize| -> std::result::Result<u16, Box<dyn StdError + Sync + Send>> {
            raw.get(i * 2..i * 2 + 2)
                .map(|b| u16::from_be_bytes([b[0], b[1]]))
                .ok_or_else(|| "truncated numeric".into())
        };

        let ndigits = word(0)? as usize;
        let weight = word(1)? as i16;
        let sign = word(2)?;

        match sign {
            NUMERIC_POS | NUMERIC_NEG => {}
            NUMERIC_NAN => return Ok(PgNumeric(f64::NAN)),
            NUMERIC_PINF => return Ok(PgNumeric(f64::INFINITY)),
            NUMERIC_NINF => return Ok(PgNumeric(f64::NEG_INFINITY)),
            other => return Err(format!("unknown numeric sign {:#06x}", other).into()),
        }

        let mut value = 0f64;
        for i in 0..ndigits {
            let digit = f64::from(word(4 + i)?);
            value += digit * 10000f64.powi(i32::from(weight) - i as i32);
        }
        if sign == NUMERIC_NEG {
            value = -value;
        }
        Ok(PgNumeric(value))
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }
}

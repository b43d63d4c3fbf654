//! The one concrete `Database` adapter this crate ships: a `sqlx`
//! `PgPool`-backed implementation of the `drk::database::Database`
//! contract.

use std::time::Duration;
use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use drk::database::Database;
use drk::value::{Row, Value};
use sqlx::postgres::{PgColumn, PgPoolOptions, PgRow};
use sqlx::{Column, Row as SqlxRow, TypeInfo};

pub struct PostgresDatabase {
    pool: sqlx::PgPool,
}

impl PostgresDatabase {
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .with_context(|| "connecting to postgres")?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl Database for PostgresDatabase {
    async fn query(&self, statement: &str, args: &[Value]) -> anyhow::Result<(Vec<Row>, Duration)> {
        let mut query = sqlx::query(statement);
        for arg in args {
            query = bind_value(query, arg);
        }

        let start = Instant::now();
        let rows = query.fetch_all(&self.pool).await?;
        let duration = start.elapsed();

        let rows = rows.iter().map(decode_row).collect::<Result<Vec<_>>>()?;
        Ok((rows, duration))
    }

    async fn exec(&self, statement: &str, args: &[Value]) -> anyhow::Result<Duration> {
        let mut query = sqlx::query(statement);
        for arg in args {
            query = bind_value(query, arg);
        }

        let start = Instant::now();
        query.execute(&self.pool).await?;
        Ok(start.elapsed())
    }
}

type PgQuery<'q> = sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>;

fn bind_value<'q>(query: PgQuery<'q>, value: &'q Value) -> PgQuery<'q> {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(b) => query.bind(*b),
        Value::Int(i) => query.bind(*i),
        Value::Float(f) => query.bind(*f),
        Value::Text(s) => query.bind(s.as_str()),
        Value::Timestamp(t) => query.bind(*t),
        Value::Interval(d) => query.bind(chrono::Duration::from_std(*d).unwrap_or_default()),
    }
}

fn decode_row(row: &PgRow) -> Result<Row> {
    let mut out = Row::new();
    for column in row.columns() {
        out.insert(column.name().to_string(), decode_cell(row, column)?);
    }
    Ok(out)
}

/// Decodes a driver-specific cell into the crate-wide `Value` at the
/// boundary, so nothing upstream of this module ever touches a `sqlx`
/// type.
fn decode_cell(row: &PgRow, column: &PgColumn) -> Result<Value> {
    let idx = column.ordinal();
    let value = match column.type_info().name() {
        "BOOL" => row.try_get::<Option<bool>, _>(idx)?.map(Value::Bool),
        "INT2" | "INT4" => row
            .try_get::<Option<i32>, _>(idx)?
            .map(|v| Value::Int(v as i64)),
        "INT8" => row.try_get::<Option<i64>, _>(idx)?.map(Value::Int),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(idx)?
            .map(|v| Value::Float(v as f64)),
        "FLOAT8" => row.try_get::<Option<f64>, _>(idx)?.map(Value::Float),
        "TIMESTAMPTZ" | "TIMESTAMP" => row
            .try_get::<Option<DateTime<Utc>>, _>(idx)?
            .map(Value::Timestamp),
        _ => row.try_get::<Option<String>, _>(idx)?.map(Value::Text),
    };
    Ok(value.unwrap_or(Value::Null))
}

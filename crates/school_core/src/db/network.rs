//! PostgreSQL backend for the storage gateway.
//!
//! The client runs in autocommit mode: every statement commits on its own,
//! so no explicit transaction wraps `execute` / `query`.

use super::value::{DbValue, Row};
use super::{DbError, DbResult};
use once_cell::sync::Lazy;
use postgres::types::{ToSql, Type};
use postgres::{Client, NoTls};
use regex::Regex;
use std::borrow::Cow;

static NUMBERED_PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\?(\d+)").expect("valid placeholder regex"));

pub(super) fn connect(connection_string: &str) -> DbResult<Client> {
    Ok(Client::connect(connection_string, NoTls)?)
}

pub(super) fn execute(client: &mut Client, sql: &str, params: &[DbValue]) -> DbResult<usize> {
    let sql = rewrite_placeholders(sql);
    let bound = bind(params);
    let refs = param_refs(&bound);
    let changed = client
        .execute(sql.as_ref(), &refs)
        .map_err(classify_postgres)?;
    Ok(usize::try_from(changed).unwrap_or(usize::MAX))
}

pub(super) fn query(client: &mut Client, sql: &str, params: &[DbValue]) -> DbResult<Vec<Row>> {
    let sql = rewrite_placeholders(sql);
    let bound = bind(params);
    let refs = param_refs(&bound);
    let rows = client
        .query(sql.as_ref(), &refs)
        .map_err(classify_postgres)?;

    rows.iter().map(decode_row).collect()
}

/// Rewrites SQLite-style `?N` placeholders into PostgreSQL `$N`.
fn rewrite_placeholders(sql: &str) -> Cow<'_, str> {
    NUMBERED_PLACEHOLDER_RE.replace_all(sql, "$$${1}")
}

fn bind(params: &[DbValue]) -> Vec<Box<dyn ToSql + Sync>> {
    params
        .iter()
        .map(|value| -> Box<dyn ToSql + Sync> {
            match value {
                DbValue::Null => Box::new(Option::<String>::None),
                DbValue::Integer(v) => Box::new(*v),
                DbValue::Real(v) => Box::new(*v),
                DbValue::Text(v) => Box::new(v.clone()),
            }
        })
        .collect()
}

fn param_refs(bound: &[Box<dyn ToSql + Sync>]) -> Vec<&(dyn ToSql + Sync)> {
    bound.iter().map(|value| value.as_ref()).collect()
}

fn decode_row(row: &postgres::Row) -> DbResult<Row> {
    let mut values = Vec::with_capacity(row.len());
    for (index, column) in row.columns().iter().enumerate() {
        let ty = column.type_();
        let value = if *ty == Type::INT8 {
            row.try_get::<_, Option<i64>>(index)?
                .map_or(DbValue::Null, DbValue::Integer)
        } else if *ty == Type::INT4 {
            row.try_get::<_, Option<i32>>(index)?
                .map_or(DbValue::Null, |v| DbValue::Integer(i64::from(v)))
        } else if *ty == Type::INT2 {
            row.try_get::<_, Option<i16>>(index)?
                .map_or(DbValue::Null, |v| DbValue::Integer(i64::from(v)))
        } else if *ty == Type::FLOAT8 {
            row.try_get::<_, Option<f64>>(index)?
                .map_or(DbValue::Null, DbValue::Real)
        } else if *ty == Type::FLOAT4 {
            row.try_get::<_, Option<f32>>(index)?
                .map_or(DbValue::Null, |v| DbValue::Real(f64::from(v)))
        } else if *ty == Type::TEXT || *ty == Type::VARCHAR || *ty == Type::BPCHAR || *ty == Type::NAME
        {
            row.try_get::<_, Option<String>>(index)?
                .map_or(DbValue::Null, DbValue::Text)
        } else {
            return Err(DbError::TypeMismatch {
                expected: "int, float or text column",
                actual: "unsupported postgres type",
            });
        };
        values.push(value);
    }
    Ok(values)
}

fn classify_postgres(err: postgres::Error) -> DbError {
    // SQLSTATE class 23 is "integrity constraint violation".
    let is_constraint = err
        .code()
        .map_or(false, |state| state.code().starts_with("23"));
    if is_constraint {
        DbError::Integrity(err.to_string())
    } else {
        DbError::Postgres(err)
    }
}

#[cfg(test)]
mod tests {
    use super::rewrite_placeholders;

    #[test]
    fn numbered_placeholders_become_dollar_params() {
        assert_eq!(
            rewrite_placeholders("UPDATE t SET a = ?1, b = ?2 WHERE id = ?10"),
            "UPDATE t SET a = $1, b = $2 WHERE id = $10"
        );
        assert_eq!(rewrite_placeholders("SELECT 1"), "SELECT 1");
    }
}

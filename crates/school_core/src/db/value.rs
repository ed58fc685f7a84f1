//! Backend-neutral column values.

use super::{DbError, DbResult};
use rusqlite::types::{Value, ValueRef};

/// One column value as returned by, or bound into, a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum DbValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

/// One result row, columns in select order.
pub type Row = Vec<DbValue>;

impl DbValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Text(_) => "text",
        }
    }

    /// Integer view; reals are accepted only when they hold a whole number.
    pub fn as_i64(&self) -> DbResult<i64> {
        match self {
            Self::Integer(value) => Ok(*value),
            Self::Real(value) if value.fract() == 0.0 => Ok(*value as i64),
            other => Err(DbError::TypeMismatch {
                expected: "integer",
                actual: other.kind(),
            }),
        }
    }

    pub fn as_f64(&self) -> DbResult<f64> {
        match self {
            Self::Integer(value) => Ok(*value as f64),
            Self::Real(value) => Ok(*value),
            other => Err(DbError::TypeMismatch {
                expected: "real",
                actual: other.kind(),
            }),
        }
    }

    pub fn as_str(&self) -> DbResult<&str> {
        match self {
            Self::Text(value) => Ok(value.as_str()),
            other => Err(DbError::TypeMismatch {
                expected: "text",
                actual: other.kind(),
            }),
        }
    }

    /// Renders the value as text the way a user would have typed it.
    ///
    /// Used by maintenance paths that re-parse stored numerics.
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Integer(value) => value.to_string(),
            Self::Real(value) => value.to_string(),
            Self::Text(value) => value.clone(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<&str> for DbValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for DbValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for DbValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<i64> for DbValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for DbValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<&DbValue> for Value {
    fn from(value: &DbValue) -> Self {
        match value {
            DbValue::Null => Value::Null,
            DbValue::Integer(v) => Value::Integer(*v),
            DbValue::Real(v) => Value::Real(*v),
            DbValue::Text(v) => Value::Text(v.clone()),
        }
    }
}

impl From<ValueRef<'_>> for DbValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Self::Null,
            ValueRef::Integer(v) => Self::Integer(v),
            ValueRef::Real(v) => Self::Real(v),
            ValueRef::Text(bytes) => Self::Text(String::from_utf8_lossy(bytes).into_owned()),
            // No table in this schema stores blobs; keep them readable anyway.
            ValueRef::Blob(bytes) => Self::Text(String::from_utf8_lossy(bytes).into_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DbValue;

    #[test]
    fn numeric_views_accept_both_storage_classes() {
        assert_eq!(DbValue::Integer(3).as_f64().unwrap(), 3.0);
        assert_eq!(DbValue::Real(4.0).as_i64().unwrap(), 4);
        assert!(DbValue::Real(4.5).as_i64().is_err());
        assert!(DbValue::Text("4".into()).as_i64().is_err());
    }

    #[test]
    fn to_text_keeps_user_visible_form() {
        assert_eq!(DbValue::Text("1,5".into()).to_text(), "1,5");
        assert_eq!(DbValue::Real(1500.0).to_text(), "1500");
        assert_eq!(DbValue::Null.to_text(), "");
    }
}

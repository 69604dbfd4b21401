use crate::error::{Result, SchemaBindError};
use crate::types::{BindType, SqlValue};

/// A named, typed parameter ready for positional binding.
///
/// The value has already been converted to the representation its bind
/// type calls for, so drivers only ever see `Integer` values for
/// `BindType::Integer`, `Text` for `String`, `Decimal` for `Decimal`,
/// `Bytes` for `Binary`, or `Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct BindParameter {
    pub name: String,
    pub bind_type: BindType,
    pub value: SqlValue,
}

impl BindParameter {
    /// Creates a parameter, converting `value` to match `bind_type`.
    pub fn new(name: impl Into<String>, bind_type: BindType, value: SqlValue) -> Result<Self> {
        let name = name.into();
        let value = convert(&name, bind_type, value)?;
        Ok(Self {
            name,
            bind_type,
            value,
        })
    }
}

fn convert(column: &str, bind_type: BindType, value: SqlValue) -> Result<SqlValue> {
    let invalid = |reason: String| SchemaBindError::InvalidValue {
        column: column.to_string(),
        bind_type,
        reason,
    };

    if value.is_null() {
        return match bind_type {
            BindType::Unknown => Err(invalid("column has no known bind type".to_string())),
            _ => Ok(SqlValue::Null),
        };
    }

    match (bind_type, value) {
        (BindType::Unknown, _) => Err(invalid("column has no known bind type".to_string())),

        (BindType::Integer, v @ SqlValue::Integer(_)) => Ok(v),
        (BindType::Integer, SqlValue::Bool(b)) => Ok(SqlValue::Integer(b.into())),
        (BindType::Integer, SqlValue::Decimal(f)) => {
            if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
                Ok(SqlValue::Integer(f as i64))
            } else {
                Err(invalid(format!("{} is not an integral value", f)))
            }
        }
        (BindType::Integer, SqlValue::Text(s)) => s
            .trim()
            .parse::<i64>()
            .map(SqlValue::Integer)
            .map_err(|_| invalid(format!("'{}' is not an integer", s))),

        (BindType::String, v @ SqlValue::Text(_)) => Ok(v),
        (BindType::String, SqlValue::Integer(i)) => Ok(SqlValue::Text(i.to_string())),
        (BindType::String, SqlValue::Decimal(f)) => Ok(SqlValue::Text(f.to_string())),
        (BindType::String, SqlValue::Bool(b)) => Ok(SqlValue::Text(if b { "1" } else { "0" }.to_string())),
        (BindType::String, SqlValue::Bytes(b)) => String::from_utf8(b)
            .map(SqlValue::Text)
            .map_err(|_| invalid("bytes are not valid UTF-8".to_string())),

        (BindType::Decimal, v @ SqlValue::Decimal(_)) => Ok(v),
        (BindType::Decimal, SqlValue::Integer(i)) => Ok(SqlValue::Decimal(i as f64)),
        (BindType::Decimal, SqlValue::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(SqlValue::Decimal)
            .map_err(|_| invalid(format!("'{}' is not a number", s))),

        (BindType::Binary, v @ SqlValue::Bytes(_)) => Ok(v),
        (BindType::Binary, SqlValue::Text(s)) => Ok(SqlValue::Bytes(s.into_bytes())),

        (_, other) => Err(invalid(format!("{} values are not accepted", other.kind()))),
    }
}

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// The coarse category a driver needs to encode a parameter value.
///
/// Persisted catalogs store each type as a single-character code
/// (`i`, `s`, `d`, `b`). `Unknown` has no code and is never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindType {
    Integer,
    String,
    Decimal,
    Binary,
    Unknown,
}

impl BindType {
    /// Maps a database native column type name onto its bind type.
    ///
    /// Matching ignores case, surrounding whitespace and a parenthesized
    /// length suffix, so `varchar(255)` and `VARCHAR` are the same type.
    /// Unrecognized names map to `Unknown`. That includes PostgreSQL's
    /// `boolean`, `uuid`, `json` and `jsonb`, which accept neither an
    /// integer nor a text parameter without an explicit cast.
    pub fn from_native_type(native: &str) -> Self {
        let name = native.split('(').next().unwrap_or("").trim().to_ascii_uppercase();

        match name.as_str() {
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "INTEGER" => {
                BindType::Integer
            }
            "CHAR" | "VARCHAR" | "DATE" | "DATETIME" | "TIMESTAMP" | "BINARY" | "VARBINARY"
            | "TINYTEXT" | "TEXT" | "MEDIUMTEXT" | "LONGTEXT" | "CHARACTER"
            | "CHARACTER VARYING" => BindType::String,
            "DECIMAL" | "NUMERIC" | "FLOAT" | "DOUBLE" | "REAL" | "DOUBLE PRECISION" => {
                BindType::Decimal
            }
            "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BYTEA" => BindType::Binary,
            // PostgreSQL spells these with a zone qualifier
            other
                if other == "TIME"
                    || other.starts_with("TIME ")
                    || other.starts_with("TIMESTAMP ") =>
            {
                BindType::String
            }
            _ => BindType::Unknown,
        }
    }

    /// The single-character code used in the persisted catalog.
    pub fn code(&self) -> Option<char> {
        match self {
            BindType::Integer => Some('i'),
            BindType::String => Some('s'),
            BindType::Decimal => Some('d'),
            BindType::Binary => Some('b'),
            BindType::Unknown => None,
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'i' => Some(BindType::Integer),
            's' => Some(BindType::String),
            'd' => Some(BindType::Decimal),
            'b' => Some(BindType::Binary),
            _ => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, BindType::Unknown)
    }
}

impl Serialize for BindType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.code() {
            Some(code) => serializer.serialize_char(code),
            None => Err(serde::ser::Error::custom(
                "unknown bind type cannot be persisted",
            )),
        }
    }
}

impl<'de> Deserialize<'de> for BindType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CodeVisitor;

        impl<'de> Visitor<'de> for CodeVisitor {
            type Value = BindType;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("one of the bind type codes \"i\", \"s\", \"d\", \"b\"")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<BindType, E> {
                let mut chars = v.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => BindType::from_code(c)
                        .ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self)),
                    _ => Err(E::invalid_value(de::Unexpected::Str(v), &self)),
                }
            }

            fn visit_char<E: de::Error>(self, v: char) -> Result<BindType, E> {
                BindType::from_code(v)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Char(v), &self))
            }
        }

        deserializer.deserialize_str(CodeVisitor)
    }
}

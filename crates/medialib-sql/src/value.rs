//! Scalar values that can be spliced into SQL text.
//!
//! [`SqlValue`] is what the escaper in [`crate::escape`] consumes. Most Rust
//! scalars convert into it via `From`, and `Option::None` converts to
//! [`SqlValue::Null`], which the builders treat as "absent".

use crate::ident::Ident;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// A scalar SQL value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL `NULL`; also the "absent" marker for records and predicates.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Binary data, rendered as a hex `bytea` literal.
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    Uuid(Uuid),
    /// A JSON document, rendered as its serialized text.
    Json(serde_json::Value),
    /// A sequence of values (e.g. the right-hand side of `IN`).
    List(Vec<SqlValue>),
    /// Identifier marker: always rendered as a quoted-if-needed name.
    Ident(Ident),
}

impl SqlValue {
    /// Wrap raw bytes.
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        SqlValue::Bytes(bytes.into())
    }

    /// Mark a name as an identifier rather than a literal.
    pub fn ident(name: &str) -> crate::SqlResult<Self> {
        Ok(SqlValue::Ident(Ident::new(name)?))
    }

    /// `true` for [`SqlValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// `true` for `NULL` and for empty text.
    pub fn is_blank(&self) -> bool {
        match self {
            SqlValue::Null => true,
            SqlValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for SqlValue {
                fn from(v: $t) -> Self {
                    SqlValue::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<f32> for SqlValue {
    fn from(v: f32) -> Self {
        SqlValue::Float(f64::from(v))
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&[u8]> for SqlValue {
    fn from(v: &[u8]) -> Self {
        SqlValue::Bytes(v.to_vec())
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(v)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

impl From<Uuid> for SqlValue {
    fn from(v: Uuid) -> Self {
        SqlValue::Uuid(v)
    }
}

impl From<serde_json::Value> for SqlValue {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => SqlValue::Null,
            other => SqlValue::Json(other),
        }
    }
}

impl From<Ident> for SqlValue {
    fn from(v: Ident) -> Self {
        SqlValue::Ident(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

impl<T: Into<SqlValue>> From<Vec<T>> for SqlValue {
    fn from(v: Vec<T>) -> Self {
        SqlValue::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Clone + Into<SqlValue>> From<&T> for SqlValue {
    fn from(v: &T) -> Self {
        v.clone().into()
    }
}

/// Build a `Vec<SqlValue>` row from heterogeneous values.
///
/// ```ignore
/// let row = medialib_sql::sql_row![video_id, tag_id];
/// ```
#[macro_export]
macro_rules! sql_row {
    ($($value:expr),* $(,)?) => {
        vec![$($crate::SqlValue::from($value)),*]
    };
}

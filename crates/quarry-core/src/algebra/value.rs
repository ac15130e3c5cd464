use super::{RowType, Type, ValueRecord};
use std::cmp::Ordering;
use uuid::Uuid;

#[derive(Debug, Default, Clone, PartialEq)]
pub enum Value {
    /// Boolean value
    Bool(bool),

    /// Byte array
    Bytes(Vec<u8>),

    /// Point in time, as microseconds since the Unix epoch
    DateTime(i64),

    /// 64-bit floating point number
    F64(f64),

    /// Globally unique identifier
    Guid(Uuid),

    /// Signed 32-bit integer
    I32(i32),

    /// Signed 64-bit integer
    I64(i64),

    /// A list of values of the same type
    List(Vec<Value>),

    /// Null value. For booleans this is the unknown truth value.
    #[default]
    Null,

    /// A row or object with named fields
    Record(ValueRecord),

    /// String value
    String(String),
}

impl Value {
    pub const fn null() -> Self {
        Self::Null
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    pub fn list_from_vec(items: Vec<Self>) -> Self {
        Self::List(items)
    }

    /// The boolean, or `None` for null and non-boolean values.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&ValueRecord> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Integer view of the value, widening `I32`.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Self::I32(v) => Some(i64::from(*v)),
            Self::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Floating point view of any numeric value.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Self::I32(v) => Some(f64::from(*v)),
            // Precision loss above 2^53 is accepted for comparisons
            Self::I64(v) => Some(*v as f64),
            Self::F64(v) => Some(*v),
            _ => None,
        }
    }

    /// Infers the type of the value. Null and empty lists are `Unknown`.
    pub fn infer_ty(&self) -> Type {
        match self {
            Self::Bool(_) => Type::Bool,
            Self::Bytes(_) => Type::Bytes,
            Self::DateTime(_) => Type::DateTime,
            Self::F64(_) => Type::F64,
            Self::Guid(_) => Type::Guid,
            Self::I32(_) => Type::I32,
            Self::I64(_) => Type::I64,
            Self::List(items) => Type::collection(
                items
                    .iter()
                    .find(|item| !item.is_null())
                    .map(Value::infer_ty)
                    .unwrap_or(Type::Unknown),
            ),
            Self::Null => Type::Unknown,
            Self::Record(record) => match &record.type_name {
                Some(name) => Type::Entity(name.clone()),
                None => Type::Row(RowType::new(
                    record
                        .fields
                        .iter()
                        .map(|(name, value)| (name.clone(), value.infer_ty()))
                        .collect(),
                )),
            },
            Self::String(_) => Type::String,
        }
    }

    /// Compares two non-null scalar values. Numbers compare across widths.
    /// Returns `None` for nulls and for values of unrelated types.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Self::Bool(lhs), Self::Bool(rhs)) => Some(lhs.cmp(rhs)),
            (Self::Bytes(lhs), Self::Bytes(rhs)) => Some(lhs.cmp(rhs)),
            (Self::DateTime(lhs), Self::DateTime(rhs)) => Some(lhs.cmp(rhs)),
            (Self::Guid(lhs), Self::Guid(rhs)) => Some(lhs.cmp(rhs)),
            (Self::String(lhs), Self::String(rhs)) => Some(lhs.cmp(rhs)),
            (lhs, rhs) => match (lhs.to_i64(), rhs.to_i64()) {
                (Some(lhs), Some(rhs)) => Some(lhs.cmp(&rhs)),
                _ => lhs.to_f64()?.partial_cmp(&rhs.to_f64()?),
            },
        }
    }

    /// Equality where null equals null, used for grouping and set
    /// operations.
    pub fn is_same(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Null, _) | (_, Self::Null) => false,
            (Self::List(lhs), Self::List(rhs)) => {
                lhs.len() == rhs.len() && lhs.iter().zip(rhs).all(|(l, r)| l.is_same(r))
            }
            (Self::Record(lhs), Self::Record(rhs)) => lhs.is_same(rhs),
            (lhs, rhs) => lhs.compare(rhs) == Some(Ordering::Equal),
        }
    }
}

impl From<bool> for Value {
    fn from(src: bool) -> Self {
        Self::Bool(src)
    }
}

impl From<i32> for Value {
    fn from(src: i32) -> Self {
        Self::I32(src)
    }
}

impl From<i64> for Value {
    fn from(src: i64) -> Self {
        Self::I64(src)
    }
}

impl From<f64> for Value {
    fn from(src: f64) -> Self {
        Self::F64(src)
    }
}

impl From<&str> for Value {
    fn from(src: &str) -> Self {
        Self::String(src.to_string())
    }
}

impl From<String> for Value {
    fn from(src: String) -> Self {
        Self::String(src)
    }
}

impl From<Uuid> for Value {
    fn from(src: Uuid) -> Self {
        Self::Guid(src)
    }
}

impl From<Vec<u8>> for Value {
    fn from(src: Vec<u8>) -> Self {
        Self::Bytes(src)
    }
}

impl From<ValueRecord> for Value {
    fn from(src: ValueRecord) -> Self {
        Self::Record(src)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(src: Option<T>) -> Self {
        match src {
            Some(value) => value.into(),
            None => Self::Null,
        }
    }
}

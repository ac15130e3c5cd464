use super::RowType;
use std::fmt;

/// The result type of an algebra expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// Boolean value
    Bool,

    /// Signed 32-bit integer
    I32,

    /// Signed 64-bit integer
    I64,

    /// 64-bit floating point number
    F64,

    /// String value
    String,

    /// Byte array
    Bytes,

    /// Globally unique identifier
    Guid,

    /// Point in time
    DateTime,

    /// An instance of an entity type
    Entity(String),

    /// An instance of a complex type
    Complex(String),

    /// A row with named fields
    Row(RowType),

    /// A collection of a single type
    Collection(Box<Type>),

    /// A type that could not be inferred (e.g., an untyped null or an empty
    /// list)
    Unknown,
}

impl Type {
    pub fn collection(element: impl Into<Self>) -> Self {
        Self::Collection(Box::new(element.into()))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Self::Collection(_))
    }

    pub fn is_row(&self) -> bool {
        matches!(self, Self::Row(_))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Self::Bool)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Self::String)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::I32 | Self::I64 | Self::F64)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Self::I32 | Self::I64)
    }

    /// Entity and complex types.
    pub fn is_nominal(&self) -> bool {
        matches!(self, Self::Entity(_) | Self::Complex(_))
    }

    /// Element type of a collection, or `Unknown` for anything else.
    pub fn element_type(&self) -> Type {
        match self {
            Self::Collection(element) => (**element).clone(),
            _ => Self::Unknown,
        }
    }

    pub fn as_row(&self) -> Option<&RowType> {
        match self {
            Self::Row(row) => Some(row),
            _ => None,
        }
    }

    /// Returns `true` when a value of `self` can be passed where `target` is
    /// expected without an explicit cast.
    pub fn promotes_to(&self, target: &Type) -> bool {
        if self == target {
            return true;
        }

        matches!(
            (self, target),
            (Self::Unknown, _)
                | (Self::I32, Self::I64)
                | (Self::I32, Self::F64)
                | (Self::I64, Self::F64)
        )
    }

    /// The wider of two numeric types, used for arithmetic results.
    pub fn widest(&self, other: &Type) -> Type {
        match (self, other) {
            (Self::F64, _) | (_, Self::F64) => Self::F64,
            (Self::I64, _) | (_, Self::I64) => Self::I64,
            (Self::Unknown, ty) => ty.clone(),
            (ty, _) => ty.clone(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bool => f.write_str("bool"),
            Type::I32 => f.write_str("i32"),
            Type::I64 => f.write_str("i64"),
            Type::F64 => f.write_str("f64"),
            Type::String => f.write_str("string"),
            Type::Bytes => f.write_str("bytes"),
            Type::Guid => f.write_str("guid"),
            Type::DateTime => f.write_str("datetime"),
            Type::Entity(name) | Type::Complex(name) => f.write_str(name),
            Type::Row(row) => {
                f.write_str("row(")?;
                for (i, (name, ty)) in row.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name} {ty}")?;
                }
                f.write_str(")")
            }
            Type::Collection(element) => write!(f, "collection({element})"),
            Type::Unknown => f.write_str("unknown"),
        }
    }
}

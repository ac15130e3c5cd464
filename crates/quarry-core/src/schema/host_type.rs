use std::fmt;

/// The client-side type of a source expression node.
///
/// This is the type as the query-building API sees it, before the resolver
/// maps it to an algebra [`Type`](crate::algebra::Type). Nominal types are
/// identified by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostType {
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

    /// A value type that may also be null
    Nullable(Box<HostType>),

    /// A model entity type registered with the schema
    Entity(String),

    /// A model complex type registered with the schema
    Complex(String),

    /// A client class, named or anonymous, used as a projection target
    Class(String),

    /// An enumerable or queryable sequence of elements
    Sequence(Box<HostType>),

    /// A group produced by `GroupBy`: key type and element type
    Grouping(Box<HostType>, Box<HostType>),

    /// Anything else: closure objects, contexts, delegates
    Object,
}

impl HostType {
    pub fn nullable(ty: HostType) -> HostType {
        match ty {
            HostType::Nullable(_) => ty,
            ty => HostType::Nullable(Box::new(ty)),
        }
    }

    pub fn sequence(element: impl Into<HostType>) -> HostType {
        HostType::Sequence(Box::new(element.into()))
    }

    pub fn grouping(key: HostType, element: HostType) -> HostType {
        HostType::Grouping(Box::new(key), Box::new(element))
    }

    pub fn entity(name: impl Into<String>) -> HostType {
        HostType::Entity(name.into())
    }

    pub fn class(name: impl Into<String>) -> HostType {
        HostType::Class(name.into())
    }

    /// Strips one level of `Nullable`.
    pub fn non_nullable(&self) -> &HostType {
        match self {
            HostType::Nullable(inner) => inner,
            ty => ty,
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, HostType::Nullable(_))
    }

    /// Returns `true` for types with a direct scalar representation.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self.non_nullable(),
            HostType::Bool
                | HostType::I32
                | HostType::I64
                | HostType::F64
                | HostType::String
                | HostType::Bytes
                | HostType::Guid
                | HostType::DateTime
        )
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self.non_nullable(),
            HostType::I32 | HostType::I64 | HostType::F64
        )
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.non_nullable(), HostType::I32 | HostType::I64)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, HostType::String)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.non_nullable(), HostType::Bool)
    }

    /// Entity and complex types have a nominal identity in the model.
    pub fn is_nominal(&self) -> bool {
        matches!(self, HostType::Entity(_) | HostType::Complex(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, HostType::Sequence(_))
    }

    pub fn is_grouping(&self) -> bool {
        matches!(self, HostType::Grouping(..))
    }

    /// The element type of a sequence, if this is one.
    pub fn element(&self) -> Option<&HostType> {
        match self {
            HostType::Sequence(element) => Some(element),
            HostType::Grouping(_, element) => Some(element),
            _ => None,
        }
    }

    /// Returns `true` when a value of `self` converts to `target` without
    /// loss.
    pub fn widens_to(&self, target: &HostType) -> bool {
        let (from, to) = (self.non_nullable(), target.non_nullable());
        if from == to {
            return true;
        }

        matches!(
            (from, to),
            (HostType::I32, HostType::I64)
                | (HostType::I32, HostType::F64)
                | (HostType::I64, HostType::F64)
        )
    }
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostType::Bool => f.write_str("bool"),
            HostType::I32 => f.write_str("i32"),
            HostType::I64 => f.write_str("i64"),
            HostType::F64 => f.write_str("f64"),
            HostType::String => f.write_str("string"),
            HostType::Bytes => f.write_str("bytes"),
            HostType::Guid => f.write_str("guid"),
            HostType::DateTime => f.write_str("datetime"),
            HostType::Nullable(inner) => write!(f, "{inner}?"),
            HostType::Entity(name) | HostType::Complex(name) | HostType::Class(name) => {
                f.write_str(name)
            }
            HostType::Sequence(element) => write!(f, "Sequence<{element}>"),
            HostType::Grouping(key, element) => write!(f, "Grouping<{key}, {element}>"),
            HostType::Object => f.write_str("object"),
        }
    }
}

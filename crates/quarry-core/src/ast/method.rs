use std::fmt;

/// Identifies the method invoked by a call node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub owner: MethodOwner,
    pub name: String,

    /// Set on host methods that stand in for a backend function
    pub function: Option<FunctionAttribute>,
}

/// The type declaring a method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodOwner {
    /// Query operators over queryable sources
    Queryable,

    /// Query operators over in-memory sequences
    Enumerable,
    String,
    Math,
    DateTime,
    Object,

    /// Any other host type
    Host(String),
}

/// Maps a host method to a function in the model's namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionAttribute {
    pub namespace: String,
    pub name: String,
}

impl Method {
    pub fn new(owner: MethodOwner, name: impl Into<String>) -> Method {
        Method {
            owner,
            name: name.into(),
            function: None,
        }
    }

    pub fn queryable(name: impl Into<String>) -> Method {
        Method::new(MethodOwner::Queryable, name)
    }

    pub fn enumerable(name: impl Into<String>) -> Method {
        Method::new(MethodOwner::Enumerable, name)
    }

    pub fn string(name: impl Into<String>) -> Method {
        Method::new(MethodOwner::String, name)
    }

    pub fn math(name: impl Into<String>) -> Method {
        Method::new(MethodOwner::Math, name)
    }

    pub fn object(name: impl Into<String>) -> Method {
        Method::new(MethodOwner::Object, name)
    }

    /// A host method bound to `namespace.function` in the model.
    pub fn function(
        owner: impl Into<String>,
        name: impl Into<String>,
        namespace: impl Into<String>,
        function: impl Into<String>,
    ) -> Method {
        Method {
            owner: MethodOwner::Host(owner.into()),
            name: name.into(),
            function: Some(FunctionAttribute {
                namespace: namespace.into(),
                name: function.into(),
            }),
        }
    }

    /// Returns `true` for query operators, regardless of which sequence
    /// flavor declares them.
    pub fn is_sequence_operator(&self) -> bool {
        matches!(self.owner, MethodOwner::Queryable | MethodOwner::Enumerable)
    }

    pub fn is(&self, owner: &MethodOwner, name: &str) -> bool {
        self.owner == *owner && self.name == name
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.owner {
            MethodOwner::Queryable => write!(f, "Queryable.{}", self.name),
            MethodOwner::Enumerable => write!(f, "Enumerable.{}", self.name),
            MethodOwner::String => write!(f, "String.{}", self.name),
            MethodOwner::Math => write!(f, "Math.{}", self.name),
            MethodOwner::DateTime => write!(f, "DateTime.{}", self.name),
            MethodOwner::Object => write!(f, "Object.{}", self.name),
            MethodOwner::Host(owner) => write!(f, "{owner}.{}", self.name),
        }
    }
}

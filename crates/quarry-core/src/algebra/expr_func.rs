use super::{Expr, Type};

/// Invokes a function known to the backend.
///
/// Canonical functions live in the `Edm` namespace. Aggregates take a single
/// collection argument.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprFunc {
    pub namespace: String,
    pub name: String,
    pub args: Vec<Expr>,

    /// Return type
    pub ty: Type,

    pub aggregate: bool,
}

/// Namespace of the canonical functions every backend provides.
pub const CANONICAL_NAMESPACE: &str = "Edm";

impl Expr {
    /// Calls a canonical function.
    pub fn canonical(name: impl Into<String>, args: Vec<Expr>, ty: Type) -> Self {
        ExprFunc {
            namespace: CANONICAL_NAMESPACE.to_string(),
            name: name.into(),
            args,
            ty,
            aggregate: false,
        }
        .into()
    }

    /// Applies a canonical aggregate to a collection.
    pub fn aggregate(name: impl Into<String>, input: impl Into<Self>, ty: Type) -> Self {
        ExprFunc {
            namespace: CANONICAL_NAMESPACE.to_string(),
            name: name.into(),
            args: vec![input.into()],
            ty,
            aggregate: true,
        }
        .into()
    }

    pub fn is_canonical(&self, name: &str) -> bool {
        matches!(self, Self::Func(func) if func.namespace == CANONICAL_NAMESPACE && func.name == name)
    }
}

impl From<ExprFunc> for Expr {
    fn from(value: ExprFunc) -> Self {
        Self::Func(value)
    }
}

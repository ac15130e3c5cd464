use super::{Expr, Type};

/// Whether an instance is of the given entity or complex type.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprIsOf {
    pub expr: Box<Expr>,
    pub ty: Type,

    /// When set, instances of derived types do not match
    pub only: bool,
}

impl Expr {
    pub fn is_of(expr: impl Into<Self>, ty: Type) -> Self {
        ExprIsOf {
            expr: Box::new(expr.into()),
            ty,
            only: false,
        }
        .into()
    }
}

impl From<ExprIsOf> for Expr {
    fn from(value: ExprIsOf) -> Self {
        Self::IsOf(value)
    }
}

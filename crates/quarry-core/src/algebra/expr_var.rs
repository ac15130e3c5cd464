use super::{Expr, Type};

/// Reference to the element variable introduced by a [`Binding`](super::Binding).
#[derive(Debug, Clone, PartialEq)]
pub struct ExprVar {
    pub name: String,
    pub ty: Type,
}

impl Expr {
    pub fn var(name: impl Into<String>, ty: Type) -> Self {
        ExprVar {
            name: name.into(),
            ty,
        }
        .into()
    }
}

impl From<ExprVar> for Expr {
    fn from(value: ExprVar) -> Self {
        Self::Var(value)
    }
}

use super::{Expr, Type};

/// Views an instance as a derived type; null when it is not an instance of
/// that type.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprTreat {
    pub expr: Box<Expr>,
    pub ty: Type,
}

impl Expr {
    pub fn treat(expr: impl Into<Self>, ty: Type) -> Self {
        ExprTreat {
            expr: Box::new(expr.into()),
            ty,
        }
        .into()
    }
}

impl From<ExprTreat> for Expr {
    fn from(value: ExprTreat) -> Self {
        Self::Treat(value)
    }
}

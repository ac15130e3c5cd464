use super::{Expr, Type};

/// Keeps the input elements that are instances of `ty`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprOfType {
    pub input: Box<Expr>,
    pub ty: Type,

    /// When set, instances of types derived from `ty` are excluded
    pub only: bool,
}

impl Expr {
    pub fn of_type(input: impl Into<Self>, ty: Type) -> Self {
        ExprOfType {
            input: Box::new(input.into()),
            ty,
            only: false,
        }
        .into()
    }
}

impl From<ExprOfType> for Expr {
    fn from(value: ExprOfType) -> Self {
        Self::OfType(value)
    }
}

use super::{Expr, Type};

/// A query parameter whose value is supplied when the query executes.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprParam {
    pub name: String,
    pub ty: Type,
}

impl Expr {
    pub fn param(name: impl Into<String>, ty: Type) -> Self {
        ExprParam {
            name: name.into(),
            ty,
        }
        .into()
    }
}

impl From<ExprParam> for Expr {
    fn from(value: ExprParam) -> Self {
        Self::Param(value)
    }
}

use super::{Expr, Type};

/// A collection literal built from element expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprCollection {
    pub elements: Vec<Expr>,

    /// Element type, needed when `elements` is empty
    pub ty: Type,
}

impl Expr {
    pub fn collection(elements: Vec<Expr>, ty: Type) -> Self {
        ExprCollection { elements, ty }.into()
    }
}

impl From<ExprCollection> for Expr {
    fn from(value: ExprCollection) -> Self {
        Self::Collection(value)
    }
}

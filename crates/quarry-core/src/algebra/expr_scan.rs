use super::{Expr, Type};

/// All instances of an entity set.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprScan {
    /// Name of the entity set
    pub set: String,

    /// Element type
    pub ty: Type,
}

impl Expr {
    pub fn scan(set: impl Into<String>, ty: Type) -> Self {
        ExprScan {
            set: set.into(),
            ty,
        }
        .into()
    }
}

impl From<ExprScan> for Expr {
    fn from(value: ExprScan) -> Self {
        Self::Scan(value)
    }
}

use super::{Binding, Expr};

/// Joins two collections, producing rows named after the binding variables.
///
/// ```text
/// join(scan(Orders) as o, scan(Customers) as c, o.CustomerId = c.Id)
///     → collection(row(o Order, c Customer))
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ExprJoin {
    pub kind: JoinKind,
    pub left: Binding,
    pub right: Binding,
    pub condition: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    LeftOuter,
    FullOuter,
    Cross,
}

impl Expr {
    pub fn join(kind: JoinKind, left: Binding, right: Binding, condition: impl Into<Self>) -> Self {
        ExprJoin {
            kind,
            left,
            right,
            condition: Box::new(condition.into()),
        }
        .into()
    }
}

impl From<ExprJoin> for Expr {
    fn from(value: ExprJoin) -> Self {
        Self::Join(value)
    }
}

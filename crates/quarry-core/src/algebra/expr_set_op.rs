use super::Expr;
use std::fmt;

/// Combines two collections of the same element type.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprSetOp {
    pub op: SetOp,
    pub lhs: Box<Expr>,
    pub rhs: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    /// All elements of both sides, duplicates kept
    UnionAll,

    /// Distinct elements present on both sides
    Intersect,

    /// Distinct elements of the left side absent from the right side
    Except,
}

impl Expr {
    pub fn set_op(op: SetOp, lhs: impl Into<Self>, rhs: impl Into<Self>) -> Self {
        ExprSetOp {
            op,
            lhs: Box::new(lhs.into()),
            rhs: Box::new(rhs.into()),
        }
        .into()
    }

    pub fn union_all(lhs: impl Into<Self>, rhs: impl Into<Self>) -> Self {
        Expr::set_op(SetOp::UnionAll, lhs, rhs)
    }
}

impl From<ExprSetOp> for Expr {
    fn from(value: ExprSetOp) -> Self {
        Self::SetOp(value)
    }
}

impl fmt::Display for SetOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SetOp::UnionAll => "union_all",
            SetOp::Intersect => "intersect",
            SetOp::Except => "except",
        })
    }
}

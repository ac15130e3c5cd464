use super::{Binding, Expr};

/// Keeps the input elements for which the predicate is true.
///
/// Elements where the predicate is false or unknown are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprFilter {
    pub input: Binding,
    pub predicate: Box<Expr>,
}

impl Expr {
    pub fn filter(input: Binding, predicate: impl Into<Self>) -> Self {
        ExprFilter {
            input,
            predicate: Box::new(predicate.into()),
        }
        .into()
    }
}

impl From<ExprFilter> for Expr {
    fn from(value: ExprFilter) -> Self {
        Self::Filter(value)
    }
}

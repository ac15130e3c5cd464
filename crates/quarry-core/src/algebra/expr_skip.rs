use super::{Binding, Expr, SortKey};

/// Sorts the input and skips the first `count` elements.
///
/// Skipping is only defined relative to an order, so the node carries its
/// own sort keys.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprSkip {
    pub input: Binding,
    pub keys: Vec<SortKey>,
    pub count: Box<Expr>,
}

impl Expr {
    pub fn skip(input: Binding, keys: Vec<SortKey>, count: impl Into<Self>) -> Self {
        ExprSkip {
            input,
            keys,
            count: Box::new(count.into()),
        }
        .into()
    }
}

impl From<ExprSkip> for Expr {
    fn from(value: ExprSkip) -> Self {
        Self::Skip(value)
    }
}

use super::Expr;

/// Keeps at most `count` elements of the input.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprLimit {
    pub input: Box<Expr>,
    pub count: Box<Expr>,
}

impl Expr {
    pub fn limit(input: impl Into<Self>, count: impl Into<Self>) -> Self {
        ExprLimit {
            input: Box::new(input.into()),
            count: Box::new(count.into()),
        }
        .into()
    }
}

impl From<ExprLimit> for Expr {
    fn from(value: ExprLimit) -> Self {
        Self::Limit(value)
    }
}

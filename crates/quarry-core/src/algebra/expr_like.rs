use super::Expr;

/// SQL-style pattern match: `%` matches any run of characters and `_`
/// matches exactly one.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprLike {
    pub input: Box<Expr>,
    pub pattern: Box<Expr>,

    /// Escape character that makes the following wildcard literal
    pub escape: Option<Box<Expr>>,
}

impl Expr {
    pub fn like(input: impl Into<Self>, pattern: impl Into<Self>, escape: Option<char>) -> Self {
        ExprLike {
            input: Box::new(input.into()),
            pattern: Box::new(pattern.into()),
            escape: escape.map(|c| Box::new(Expr::from(c.to_string()))),
        }
        .into()
    }
}

impl From<ExprLike> for Expr {
    fn from(value: ExprLike) -> Self {
        Self::Like(value)
    }
}

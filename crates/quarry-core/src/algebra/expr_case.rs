use super::Expr;

/// Searched case: the result of the first `when` whose condition is true,
/// otherwise `otherwise`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprCase {
    pub whens: Vec<(Expr, Expr)>,
    pub otherwise: Box<Expr>,
}

impl Expr {
    pub fn case(condition: impl Into<Self>, then: impl Into<Self>, otherwise: impl Into<Self>) -> Self {
        ExprCase {
            whens: vec![(condition.into(), then.into())],
            otherwise: Box::new(otherwise.into()),
        }
        .into()
    }
}

impl From<ExprCase> for Expr {
    fn from(value: ExprCase) -> Self {
        Self::Case(value)
    }
}

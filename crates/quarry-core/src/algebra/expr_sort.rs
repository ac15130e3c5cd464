use super::{Binding, Expr};

/// Orders the input by a list of keys.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprSort {
    pub input: Binding,

    /// Keys in order of significance, each referencing the input variable
    pub keys: Vec<SortKey>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub expr: Expr,
    pub ascending: bool,
}

impl SortKey {
    pub fn asc(expr: impl Into<Expr>) -> SortKey {
        SortKey {
            expr: expr.into(),
            ascending: true,
        }
    }

    pub fn desc(expr: impl Into<Expr>) -> SortKey {
        SortKey {
            expr: expr.into(),
            ascending: false,
        }
    }
}

impl Expr {
    pub fn sort(input: Binding, keys: Vec<SortKey>) -> Self {
        ExprSort { input, keys }.into()
    }
}

impl From<ExprSort> for Expr {
    fn from(value: ExprSort) -> Self {
        Self::Sort(value)
    }
}

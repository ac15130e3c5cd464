use super::{Binding, Expr};

/// Evaluates `apply` once per element of `input`, with the input variable in
/// scope, and pairs each input element with each resulting element.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprApply {
    pub kind: ApplyKind,
    pub input: Binding,
    pub apply: Binding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyKind {
    /// Input elements with an empty correlated collection are dropped
    Cross,

    /// Input elements with an empty correlated collection are kept, paired
    /// with null
    Outer,
}

impl From<ExprApply> for Expr {
    fn from(value: ExprApply) -> Self {
        Self::Apply(value)
    }
}

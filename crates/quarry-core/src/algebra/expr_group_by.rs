use super::{Binding, Expr};

/// Partitions the input by key.
///
/// Produces one row per distinct key combination. The row holds each key
/// under its name and, when `group` is set, the collection of the group's
/// elements mapped through the group projection. Null keys compare equal to
/// each other.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprGroupBy {
    pub input: Binding,

    /// Variable bound to each element of a group while evaluating `group`
    pub group_var: String,

    /// Named key expressions over the input variable
    pub keys: Vec<(String, Expr)>,

    /// Named projection collecting each group's elements
    pub group: Option<(String, Box<Expr>)>,
}

impl From<ExprGroupBy> for Expr {
    fn from(value: ExprGroupBy) -> Self {
        Self::GroupBy(value)
    }
}

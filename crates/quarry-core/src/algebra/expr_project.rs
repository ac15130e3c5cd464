use super::{Binding, Expr};

/// Maps each element of the input to the projection.
///
/// ```text
/// project(scan(Products) as LQ0, LQ0.Name)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ExprProject {
    pub input: Binding,

    /// Evaluated once per element, with the input variable bound
    pub projection: Box<Expr>,
}

impl Expr {
    pub fn project(input: Binding, projection: impl Into<Self>) -> Self {
        ExprProject {
            input,
            projection: Box::new(projection.into()),
        }
        .into()
    }

    /// Returns `true` when the projection returns the element unchanged.
    pub fn is_identity_project(&self) -> bool {
        matches!(self, Self::Project(project) if project.projection.is_var(&project.input.var))
    }
}

impl From<ExprProject> for Expr {
    fn from(value: ExprProject) -> Self {
        Self::Project(value)
    }
}

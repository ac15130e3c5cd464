use super::{Expr, ExprVar, Type};

/// A collection expression together with the variable name that refers to
/// each of its elements inside the enclosing operator.
///
/// ```text
/// filter(scan(Products) as LQ0, LQ0.Price > 10)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    /// Name of the element variable
    pub var: String,

    /// The collection being bound
    pub expr: Box<Expr>,
}

impl Binding {
    pub fn new(var: impl Into<String>, expr: impl Into<Expr>) -> Binding {
        Binding {
            var: var.into(),
            expr: Box::new(expr.into()),
        }
    }

    /// Element type of the bound collection.
    pub fn element_ty(&self) -> Type {
        self.expr.ty().element_type()
    }

    /// A reference to the element variable.
    pub fn var_ref(&self) -> Expr {
        Expr::Var(ExprVar {
            name: self.var.clone(),
            ty: self.element_ty(),
        })
    }

    /// The same collection bound under a different variable name.
    pub fn rename(&self, var: impl Into<String>) -> Binding {
        Binding {
            var: var.into(),
            expr: self.expr.clone(),
        }
    }
}

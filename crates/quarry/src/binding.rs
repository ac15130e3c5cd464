//! Scope binding of lambda parameters.
//!
//! While a lambda body is translated, its parameter stands for an algebra
//! expression, usually the variable of the binding the lambda ranges over.
//! Parameters are identified by their arena handle, never by name: two
//! lambdas may both call their parameter `x`.

use quarry_core::{algebra::Expr, ast::NodeId};

#[derive(Debug, Default)]
pub struct ScopeBinder {
    scopes: Vec<(NodeId, Expr)>,
}

impl ScopeBinder {
    pub fn new() -> ScopeBinder {
        ScopeBinder::default()
    }

    /// Binds `param` for the duration of the scope being entered.
    pub fn push(&mut self, param: NodeId, expr: Expr) {
        self.scopes.push((param, expr));
    }

    /// Leaves the innermost scope.
    pub fn pop(&mut self) -> Option<(NodeId, Expr)> {
        self.scopes.pop()
    }

    /// The expression `param` is bound to, searching innermost scopes first.
    pub fn resolve(&self, param: NodeId) -> Option<&Expr> {
        self.scopes
            .iter()
            .rev()
            .find(|(bound, _)| *bound == param)
            .map(|(_, expr)| expr)
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::algebra::Type;

    fn id(raw: u32) -> NodeId {
        NodeId::from_raw(raw)
    }

    #[test]
    fn lookup_returns_the_bound_expression() {
        let mut binder = ScopeBinder::new();
        binder.push(id(1), Expr::var("LQ0", Type::I32));

        let first = binder.resolve(id(1)).unwrap();
        let second = binder.resolve(id(1)).unwrap();
        assert!(std::ptr::eq(first, second));
        assert!(binder.resolve(id(2)).is_none());
    }

    #[test]
    fn inner_scope_shadows_outer() {
        let mut binder = ScopeBinder::new();
        binder.push(id(1), Expr::var("LQ0", Type::I32));
        binder.push(id(1), Expr::var("LQ1", Type::I32));

        assert!(binder.resolve(id(1)).unwrap().is_var("LQ1"));
        binder.pop();
        assert!(binder.resolve(id(1)).unwrap().is_var("LQ0"));
        binder.pop();
        assert!(binder.resolve(id(1)).is_none());
        assert!(binder.is_empty());
    }
}

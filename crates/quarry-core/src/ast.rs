//! The source query expression tree.
//!
//! Queries arrive as a lambda-built expression tree stored in an [`Ast`]
//! arena. Nodes reference their children by [`NodeId`]. Passes never change
//! an existing node; rewrites push new nodes and return a new root.

mod builder;
pub use builder::{host_type_of, CLOSURE_TYPE};

mod closure;
pub use closure::{Captured, Closure};

mod embedded;
pub use embedded::{EmbeddedQuery, Fragment, MergeOption};

mod expr;
pub use expr::{
    BinaryOp, Expr, ExprBinary, ExprCall, ExprConditional, ExprLambda, ExprMember,
    ExprMemberInit, ExprNew, ExprNewArray, ExprParameter, ExprType, ExprUnary, UnaryOp,
};

mod method;
pub use method::{FunctionAttribute, Method, MethodOwner};

mod placeholder;
pub use placeholder::{Evaluator, Placeholder};

use crate::schema::HostType;
use index_vec::IndexVec;
use std::ops::Index;

index_vec::define_index_type! {
    /// Handle to a node in an [`Ast`].
    pub struct NodeId = u32;
}

/// Arena of source expression nodes.
#[derive(Debug, Default, Clone)]
pub struct Ast {
    nodes: IndexVec<NodeId, Node>,
}

/// A source expression and its host type.
#[derive(Debug, Clone)]
pub struct Node {
    pub expr: Expr,
    pub ty: HostType,
}

impl Ast {
    pub fn new() -> Ast {
        Ast::default()
    }

    /// Appends a node and returns its handle.
    pub fn push(&mut self, expr: impl Into<Expr>, ty: HostType) -> NodeId {
        self.nodes.push(Node {
            expr: expr.into(),
            ty,
        })
    }

    pub fn expr(&self, id: NodeId) -> &Expr {
        &self.nodes[id].expr
    }

    pub fn ty(&self, id: NodeId) -> &HostType {
        &self.nodes[id].ty
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Replaces the expression stored at `id`.
    ///
    /// Compiler passes never call this. It exists for callers that assemble
    /// a tree out of order, which is also the only way to create a cycle.
    pub fn set(&mut self, id: NodeId, expr: impl Into<Expr>) {
        self.nodes[id].expr = expr.into();
    }

    /// Iterates over the children of a node, in evaluation order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.expr(id).children()
    }

    /// Returns `true` if the subtree rooted at `id` contains a placeholder.
    pub fn has_placeholder(&self, id: NodeId) -> bool {
        let mut stack = vec![id];
        let mut seen = vec![false; self.nodes.len()];

        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut seen[id.index()], true) {
                continue;
            }
            if matches!(self.expr(id), Expr::Placeholder(_)) {
                return true;
            }
            stack.extend(self.children(id));
        }

        false
    }

    /// Collects the distinct placeholders reachable from `id`, in the order
    /// they are first reached.
    pub fn placeholders(&self, id: NodeId) -> Vec<std::rc::Rc<Placeholder>> {
        let mut ret: Vec<std::rc::Rc<Placeholder>> = vec![];
        let mut stack = vec![id];
        let mut seen = vec![false; self.nodes.len()];

        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut seen[id.index()], true) {
                continue;
            }
            if let Expr::Placeholder(placeholder) = self.expr(id) {
                if !ret.iter().any(|p| std::rc::Rc::ptr_eq(p, placeholder)) {
                    ret.push(placeholder.clone());
                }
            }
            // Reverse so the leftmost child is visited first
            stack.extend(self.children(id).into_iter().rev());
        }

        ret
    }
}

impl Index<NodeId> for Ast {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }
}

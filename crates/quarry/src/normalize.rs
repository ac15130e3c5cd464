//! Rewrites compiler sugar into the plain operators the translator expects.
//!
//! * `a.Equals(b)` and `Object.Equals(a, b)` become `a == b`
//! * `String.Compare(a, b) < 0` and `a.CompareTo(b) < 0` become `a < b`, for
//!   every comparison operator and with zero on either side
//! * `!(a == b)` becomes `a != b`, and `!(a != b)` becomes `a == b`
//! * `(T)(T)x` becomes `(T)x`
//!
//! Nodes that do not change keep their handle, so lambda parameters remain
//! identifiable after the pass.

use indexmap::{IndexMap, IndexSet};
use quarry_core::{
    ast::{Ast, BinaryOp, Expr, ExprBinary, ExprUnary, MethodOwner, NodeId, UnaryOp},
    schema::HostType,
};
use tracing::{instrument, trace};

#[instrument(name = "normalize", level = "debug", skip(ast))]
pub fn normalize(ast: &mut Ast, root: NodeId) -> NodeId {
    Normalize {
        ast,
        done: IndexMap::new(),
        active: IndexSet::new(),
    }
    .visit(root)
}

struct Normalize<'a> {
    ast: &'a mut Ast,

    /// Result for each node already visited
    done: IndexMap<NodeId, NodeId>,

    /// Nodes on the current path. A cycle is left in place for the
    /// funcletizer to report.
    active: IndexSet<NodeId>,
}

impl Normalize<'_> {
    fn visit(&mut self, id: NodeId) -> NodeId {
        if let Some(&done) = self.done.get(&id) {
            return done;
        }

        if !self.active.insert(id) {
            return id;
        }

        let expr = self.ast.expr(id).clone();
        let mapped = expr.map_children(|child| self.visit(child));

        let rebuilt = if mapped.children() == expr.children() {
            id
        } else {
            let ty = self.ast.ty(id).clone();
            self.ast.push(mapped, ty)
        };

        let ret = self.rewrite(rebuilt);
        self.active.swap_remove(&id);
        self.done.insert(id, ret);
        ret
    }

    fn rewrite(&mut self, id: NodeId) -> NodeId {
        match self.ast.expr(id).clone() {
            Expr::Call(call) if call.method.name == "Equals" => {
                match (call.object, call.args.as_slice()) {
                    (Some(lhs), &[rhs]) => self.comparison(BinaryOp::Equal, lhs, rhs),
                    (None, &[lhs, rhs]) if call.method.owner == MethodOwner::Object => {
                        self.comparison(BinaryOp::Equal, lhs, rhs)
                    }
                    _ => id,
                }
            }
            Expr::Binary(binary) if binary.op.is_comparison() => {
                if let (Some((lhs, rhs)), true) =
                    (self.compare_operands(binary.lhs), self.is_zero(binary.rhs))
                {
                    self.comparison(binary.op, lhs, rhs)
                } else if let (true, Some((lhs, rhs))) =
                    (self.is_zero(binary.lhs), self.compare_operands(binary.rhs))
                {
                    self.comparison(commute(binary.op), lhs, rhs)
                } else {
                    id
                }
            }
            Expr::Unary(ExprUnary {
                op: UnaryOp::Not,
                operand,
            }) => match self.ast.expr(operand) {
                Expr::Binary(ExprBinary { op, lhs, rhs })
                    if matches!(op, BinaryOp::Equal | BinaryOp::NotEqual) =>
                {
                    let op = match op {
                        BinaryOp::Equal => BinaryOp::NotEqual,
                        _ => BinaryOp::Equal,
                    };
                    let (lhs, rhs) = (*lhs, *rhs);
                    self.comparison(op, lhs, rhs)
                }
                _ => id,
            },
            Expr::Unary(ExprUnary {
                op: UnaryOp::Convert,
                operand,
            }) if matches!(
                self.ast.expr(operand),
                Expr::Unary(ExprUnary { op: UnaryOp::Convert, .. })
            ) && self.ast.ty(operand) == self.ast.ty(id) =>
            {
                trace!(?id, "collapsing repeated conversion");
                operand
            }
            _ => id,
        }
    }

    fn comparison(&mut self, op: BinaryOp, lhs: NodeId, rhs: NodeId) -> NodeId {
        trace!(%op, ?lhs, ?rhs, "rewriting to comparison");
        self.ast.push(ExprBinary { op, lhs, rhs }, HostType::Bool)
    }

    /// Operands of `String.Compare(a, b)` or `a.CompareTo(b)`.
    fn compare_operands(&self, id: NodeId) -> Option<(NodeId, NodeId)> {
        let call = self.ast.expr(id).as_call()?;

        match (call.method.name.as_str(), call.object, call.args.as_slice()) {
            ("Compare", None, &[lhs, rhs]) if call.method.owner == MethodOwner::String => {
                Some((lhs, rhs))
            }
            ("CompareTo", Some(lhs), &[rhs]) => Some((lhs, rhs)),
            _ => None,
        }
    }

    fn is_zero(&self, id: NodeId) -> bool {
        self.ast
            .expr(id)
            .as_constant()
            .and_then(|value| value.to_i64())
            == Some(0)
    }
}

/// The operator that gives the same result with the operands swapped.
fn commute(op: BinaryOp) -> BinaryOp {
    match op {
        BinaryOp::LessThan => BinaryOp::GreaterThan,
        BinaryOp::LessThanOrEqual => BinaryOp::GreaterThanOrEqual,
        BinaryOp::GreaterThan => BinaryOp::LessThan,
        BinaryOp::GreaterThanOrEqual => BinaryOp::LessThanOrEqual,
        op => op,
    }
}

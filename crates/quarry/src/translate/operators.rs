use super::{TranslationContext, TranslationState};
use crate::equality::{self, EqualsPattern};
use quarry_core::{
    algebra::{self, Type, Value},
    ast::{BinaryOp, ExprBinary, ExprUnary, NodeId, UnaryOp},
    Error, Result,
};

impl TranslationContext<'_> {
    pub(super) fn binary(
        self,
        state: &mut TranslationState,
        id: NodeId,
        binary: &ExprBinary,
    ) -> Result<algebra::Expr> {
        let lhs = self.translate(state, binary.lhs)?;
        let rhs = self.translate(state, binary.rhs)?;
        let is_bool = self.ast.ty(binary.lhs).is_bool();

        Ok(match binary.op {
            BinaryOp::Add if self.ast.ty(id).is_string() => algebra::Expr::canonical(
                "Concat",
                vec![as_string(lhs), as_string(rhs)],
                Type::String,
            ),
            BinaryOp::Add => algebra::Expr::binary_op(lhs, algebra::BinaryOp::Add, rhs),
            BinaryOp::Subtract => algebra::Expr::binary_op(lhs, algebra::BinaryOp::Sub, rhs),
            BinaryOp::Multiply => algebra::Expr::binary_op(lhs, algebra::BinaryOp::Mul, rhs),
            BinaryOp::Divide => algebra::Expr::binary_op(lhs, algebra::BinaryOp::Div, rhs),
            BinaryOp::Modulo => algebra::Expr::binary_op(lhs, algebra::BinaryOp::Mod, rhs),
            BinaryOp::Equal => self.equals(lhs, rhs)?,
            BinaryOp::NotEqual => not_equal(self.equals(lhs, rhs)?),
            BinaryOp::LessThan => algebra::Expr::lt(lhs, rhs),
            BinaryOp::LessThanOrEqual => algebra::Expr::le(lhs, rhs),
            BinaryOp::GreaterThan => algebra::Expr::gt(lhs, rhs),
            BinaryOp::GreaterThanOrEqual => algebra::Expr::ge(lhs, rhs),
            BinaryOp::AndAlso => algebra::Expr::and(lhs, rhs),
            BinaryOp::OrElse => algebra::Expr::or(lhs, rhs),
            BinaryOp::And if is_bool => algebra::Expr::and(lhs, rhs),
            BinaryOp::Or if is_bool => algebra::Expr::or(lhs, rhs),
            BinaryOp::ExclusiveOr if is_bool => algebra::Expr::ne(lhs, rhs),
            BinaryOp::And => self.bitwise(id, "BitwiseAnd", vec![lhs, rhs])?,
            BinaryOp::Or => self.bitwise(id, "BitwiseOr", vec![lhs, rhs])?,
            BinaryOp::ExclusiveOr => self.bitwise(id, "BitwiseXor", vec![lhs, rhs])?,
            BinaryOp::Coalesce => {
                algebra::Expr::case(algebra::Expr::is_null(lhs.clone()), rhs, lhs)
            }
        })
    }

    pub(super) fn unary(
        self,
        state: &mut TranslationState,
        id: NodeId,
        unary: &ExprUnary,
    ) -> Result<algebra::Expr> {
        match unary.op {
            UnaryOp::Convert => self.convert(state, id, unary.operand),
            UnaryOp::Quote => Err(Error::unsupported_construct(
                "a quoted lambda outside of a query operator",
            )),
            UnaryOp::Negate => Ok(algebra::Expr::negate(self.translate(state, unary.operand)?)),
            UnaryOp::Not if self.ast.ty(unary.operand).is_bool() => {
                Ok(algebra::Expr::not(self.translate(state, unary.operand)?))
            }
            UnaryOp::Not | UnaryOp::BitNot => {
                let operand = self.translate(state, unary.operand)?;
                self.bitwise(id, "BitwiseNot", vec![operand])
            }
        }
    }

    /// User-written equality, under the pattern the options select.
    pub(super) fn equals(
        &self,
        lhs: algebra::Expr,
        rhs: algebra::Expr,
    ) -> Result<algebra::Expr> {
        equality::equals(self.resolver, lhs, rhs, EqualsPattern::user(self.options))
    }

    /// Equality between join or grouping keys: null keys match.
    pub(super) fn key_equals(
        &self,
        lhs: algebra::Expr,
        rhs: algebra::Expr,
    ) -> Result<algebra::Expr> {
        equality::equals(
            self.resolver,
            lhs,
            rhs,
            EqualsPattern::PositiveNullEqualityNonComposable,
        )
    }

    fn convert(
        self,
        state: &mut TranslationState,
        id: NodeId,
        operand: NodeId,
    ) -> Result<algebra::Expr> {
        let target = self.ast.ty(id);
        if target.non_nullable().is_nominal() {
            return Err(Error::unsupported_construct(format!(
                "conversion to `{target}`"
            )));
        }

        let expr = self.translate(state, operand)?;

        // Sequence conversions only change the static type
        if target.is_sequence() && self.ast.ty(operand).is_sequence() {
            return Ok(expr);
        }

        let ty = self.algebra_type(target)?;
        if expr.ty() == ty {
            return Ok(expr);
        }

        Ok(algebra::Expr::cast(expr, ty))
    }

    fn bitwise(
        &self,
        id: NodeId,
        name: &str,
        args: Vec<algebra::Expr>,
    ) -> Result<algebra::Expr> {
        Ok(algebra::Expr::canonical(name, args, self.node_type(id)?))
    }
}

/// Negates an equality built by [`equality::equals`].
fn not_equal(eq: algebra::Expr) -> algebra::Expr {
    match eq {
        algebra::Expr::BinaryOp(binary) if binary.op.is_eq() => {
            algebra::Expr::ne(*binary.lhs, *binary.rhs)
        }
        algebra::Expr::Value(Value::Bool(value)) => (!value).into(),
        eq => algebra::Expr::not(eq),
    }
}

fn as_string(expr: algebra::Expr) -> algebra::Expr {
    if expr.ty().is_string() {
        expr
    } else {
        algebra::Expr::cast(expr, Type::String)
    }
}

use indexmap::IndexMap;
use quarry_core::{
    algebra::{self, Type, Value},
    ast::{Ast, BinaryOp, Expr, ExprUnary, NodeId, UnaryOp},
    bail,
    schema::HostType,
    Error, Result,
};

/// Computes the value of a locally evaluable subtree.
///
/// `env` supplies the values of the compiled-query parameters the subtree
/// reads. The subtree is lowered to a constant algebra expression and handed
/// to the algebra evaluator, so local and server-side arithmetic agree.
pub(crate) fn evaluate(ast: &Ast, id: NodeId, env: &IndexMap<NodeId, Value>) -> Result<Value> {
    Lower { ast, env }.lower(id)?.eval_const()
}

/// Copies the subtree rooted at `id` into a fresh arena.
///
/// Returns the arena, the new root, and the mapping from old handles to new
/// ones.
pub(crate) fn detach(ast: &Ast, id: NodeId) -> (Ast, NodeId, IndexMap<NodeId, NodeId>) {
    fn copy(ast: &Ast, id: NodeId, into: &mut Ast, map: &mut IndexMap<NodeId, NodeId>) -> NodeId {
        if let Some(&copied) = map.get(&id) {
            return copied;
        }
        let expr = ast.expr(id).map_children(|child| copy(ast, child, into, map));
        let copied = into.push(expr, ast.ty(id).clone());
        map.insert(id, copied);
        copied
    }

    let mut into = Ast::new();
    let mut map = IndexMap::new();
    let root = copy(ast, id, &mut into, &mut map);
    (into, root, map)
}

struct Lower<'a> {
    ast: &'a Ast,
    env: &'a IndexMap<NodeId, Value>,
}

impl Lower<'_> {
    fn lower(&self, id: NodeId) -> Result<algebra::Expr> {
        let ty = self.ast.ty(id);

        Ok(match self.ast.expr(id) {
            Expr::Constant(value) => value.clone().into(),
            Expr::Parameter(param) => match self.env.get(&id) {
                Some(value) => value.clone().into(),
                None => return Err(Error::unbound_parameter(&param.name)),
            },
            Expr::Member(member) => {
                let Some(receiver) = member.receiver else {
                    bail!("static member `{}.{}` cannot be evaluated locally", member.owner, member.name);
                };

                if let Expr::Closure(closure) = self.ast.expr(receiver) {
                    return Ok(closure.read(&member.name)?.into());
                }

                match self.lower(receiver)?.eval_const()? {
                    Value::Record(record) => match record.get(&member.name) {
                        Some(value) => value.clone().into(),
                        None => {
                            return Err(Error::expression_evaluation_failed(format!(
                                "value has no member `{}`",
                                member.name
                            )))
                        }
                    },
                    Value::Null => {
                        return Err(Error::expression_evaluation_failed(format!(
                            "null reference reading `{}`",
                            member.name
                        )))
                    }
                    value => {
                        return Err(Error::expression_evaluation_failed(format!(
                            "cannot read `{}` from {value}",
                            member.name
                        )))
                    }
                }
            }
            Expr::Binary(binary) => {
                let lhs = self.lower(binary.lhs)?;
                let rhs = self.lower(binary.rhs)?;
                let is_bool = self.ast.ty(binary.lhs).is_bool();

                match binary.op {
                    BinaryOp::Add => algebra::Expr::binary_op(lhs, algebra::BinaryOp::Add, rhs),
                    BinaryOp::Subtract => algebra::Expr::binary_op(lhs, algebra::BinaryOp::Sub, rhs),
                    BinaryOp::Multiply => algebra::Expr::binary_op(lhs, algebra::BinaryOp::Mul, rhs),
                    BinaryOp::Divide => algebra::Expr::binary_op(lhs, algebra::BinaryOp::Div, rhs),
                    BinaryOp::Modulo => algebra::Expr::binary_op(lhs, algebra::BinaryOp::Mod, rhs),
                    BinaryOp::Equal => algebra::Expr::eq(lhs, rhs),
                    BinaryOp::NotEqual => algebra::Expr::ne(lhs, rhs),
                    BinaryOp::LessThan => algebra::Expr::lt(lhs, rhs),
                    BinaryOp::LessThanOrEqual => algebra::Expr::le(lhs, rhs),
                    BinaryOp::GreaterThan => algebra::Expr::gt(lhs, rhs),
                    BinaryOp::GreaterThanOrEqual => algebra::Expr::ge(lhs, rhs),
                    BinaryOp::AndAlso => algebra::Expr::and(lhs, rhs),
                    BinaryOp::OrElse => algebra::Expr::or(lhs, rhs),
                    BinaryOp::And if is_bool => algebra::Expr::and(lhs, rhs),
                    BinaryOp::Or if is_bool => algebra::Expr::or(lhs, rhs),
                    BinaryOp::ExclusiveOr if is_bool => algebra::Expr::ne(lhs, rhs),
                    BinaryOp::And => bitwise("BitwiseAnd", vec![lhs, rhs], ty),
                    BinaryOp::Or => bitwise("BitwiseOr", vec![lhs, rhs], ty),
                    BinaryOp::ExclusiveOr => bitwise("BitwiseXor", vec![lhs, rhs], ty),
                    BinaryOp::Coalesce => {
                        algebra::Expr::case(algebra::Expr::is_null(lhs.clone()), rhs, lhs)
                    }
                }
            }
            Expr::Unary(ExprUnary { op, operand }) => {
                let operand_expr = self.lower(*operand)?;

                match op {
                    UnaryOp::Not if self.ast.ty(*operand).is_bool() => {
                        algebra::Expr::not(operand_expr)
                    }
                    UnaryOp::Not | UnaryOp::BitNot => bitwise("BitwiseNot", vec![operand_expr], ty),
                    UnaryOp::Negate => algebra::Expr::negate(operand_expr),
                    UnaryOp::Convert => match primitive_type(ty) {
                        Some(target) => algebra::Expr::cast(operand_expr, target),
                        None => bail!("cannot convert to `{ty}` locally"),
                    },
                    UnaryOp::Quote => bail!("a quoted lambda has no local value"),
                }
            }
            Expr::Conditional(conditional) => algebra::Expr::case(
                self.lower(conditional.test)?,
                self.lower(conditional.then)?,
                self.lower(conditional.otherwise)?,
            ),
            Expr::New(new) => {
                let args = new
                    .args
                    .iter()
                    .map(|&arg| self.lower(arg)?.eval_const())
                    .collect::<Result<Vec<_>>>()?;
                construct(ty, &args)?.into()
            }
            Expr::NewArray(array) => {
                let elements = array
                    .elements
                    .iter()
                    .map(|&element| self.lower(element)?.eval_const())
                    .collect::<Result<Vec<_>>>()?;

                match ty {
                    HostType::Bytes => Value::Bytes(
                        elements
                            .iter()
                            .map(|element| {
                                element
                                    .to_i64()
                                    .and_then(|byte| u8::try_from(byte).ok())
                                    .ok_or_else(|| {
                                        Error::expression_evaluation_failed(format!(
                                            "{element} is not a byte"
                                        ))
                                    })
                            })
                            .collect::<Result<_>>()?,
                    )
                    .into(),
                    _ => Value::List(elements).into(),
                }
            }
            expr => {
                return Err(Error::expression_evaluation_failed(format!(
                    "{} cannot be evaluated locally",
                    describe(expr)
                )))
            }
        })
    }
}

fn bitwise(name: &str, args: Vec<algebra::Expr>, ty: &HostType) -> algebra::Expr {
    let target = primitive_type(ty).unwrap_or(Type::I64);
    algebra::Expr::cast(algebra::Expr::canonical(name, args, Type::I64), target)
}

/// Builds a primitive value from constructor arguments.
fn construct(ty: &HostType, args: &[Value]) -> Result<Value> {
    Ok(match (ty.non_nullable(), args) {
        (HostType::Guid, []) => Value::Guid(uuid::Uuid::nil()),
        (HostType::Guid, [Value::String(text)]) => Value::Guid(
            uuid::Uuid::parse_str(text)
                .map_err(|err| Error::expression_evaluation_failed(err.to_string()))?,
        ),
        (HostType::String, []) => Value::String(String::new()),
        (HostType::I32, []) => Value::I32(0),
        (HostType::I64, []) => Value::I64(0),
        (HostType::F64, []) => Value::F64(0.0),
        (HostType::DateTime, parts) if (3..=6).contains(&parts.len()) => {
            let parts = parts
                .iter()
                .map(|part| {
                    part.to_i64().ok_or_else(|| {
                        Error::expression_evaluation_failed(format!("{part} is not a date part"))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Value::DateTime(unix_micros(&parts))
        }
        (ty, _) => {
            return Err(Error::expression_evaluation_failed(format!(
                "cannot construct `{ty}` locally"
            )))
        }
    })
}

/// Microseconds since the Unix epoch of `[year, month, day, hour?, minute?,
/// second?]`.
fn unix_micros(parts: &[i64]) -> i64 {
    let part = |i: usize| parts.get(i).copied().unwrap_or(0);
    let (year, month, day) = (part(0), part(1), part(2));

    // Days from civil, with March as the first month of the year
    let year = if month <= 2 { year - 1 } else { year };
    let era = year.div_euclid(400);
    let year_of_era = year - era * 400;
    let month_index = (month + 9) % 12;
    let day_of_year = (153 * month_index + 2) / 5 + day - 1;
    let day_of_era = year_of_era * 365 + year_of_era / 4 - year_of_era / 100 + day_of_year;
    let days = era * 146_097 + day_of_era - 719_468;

    let seconds = days * 86_400 + part(3) * 3_600 + part(4) * 60 + part(5);
    seconds * 1_000_000
}

/// Algebra type of a primitive host type.
pub(crate) fn primitive_type(ty: &HostType) -> Option<Type> {
    Some(match ty.non_nullable() {
        HostType::Bool => Type::Bool,
        HostType::I32 => Type::I32,
        HostType::I64 => Type::I64,
        HostType::F64 => Type::F64,
        HostType::String => Type::String,
        HostType::Bytes => Type::Bytes,
        HostType::Guid => Type::Guid,
        HostType::DateTime => Type::DateTime,
        _ => return None,
    })
}

fn describe(expr: &Expr) -> &'static str {
    match expr {
        Expr::Binary(_) => "a binary expression",
        Expr::Call(_) => "a method call",
        Expr::Closure(_) => "a closure",
        Expr::Conditional(_) => "a conditional",
        Expr::Constant(_) => "a constant",
        Expr::EntitySet(_) => "an entity set",
        Expr::Lambda(_) => "a lambda",
        Expr::Member(_) => "a member access",
        Expr::MemberInit(_) => "an object initializer",
        Expr::New(_) => "a constructor call",
        Expr::NewArray(_) => "an array",
        Expr::Parameter(_) => "a parameter",
        Expr::Placeholder(_) => "a placeholder",
        Expr::TypeAs(_) | Expr::TypeIs(_) => "a type test",
        Expr::Unary(_) => "a unary expression",
    }
}

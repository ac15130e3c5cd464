use super::{Closure, Method, NodeId, Placeholder};
use crate::{algebra::Value, schema::HostType, Result};
use std::{fmt, rc::Rc};

/// A source expression node.
#[derive(Debug, Clone)]
pub enum Expr {
    /// Binary operator
    Binary(ExprBinary),

    /// Method call, static or on an instance
    Call(ExprCall),

    /// A closure object whose members are captured variables
    Closure(Closure),

    /// `test ? then : otherwise`
    Conditional(ExprConditional),

    /// Literal value
    Constant(Value),

    /// Access to an entity set of the model
    EntitySet(String),

    /// Lambda with parameters and a body
    Lambda(ExprLambda),

    /// Property or field access, or a static member when there is no
    /// receiver
    Member(ExprMember),

    /// Object construction followed by member assignments
    MemberInit(ExprMemberInit),

    /// Object construction
    New(ExprNew),

    /// Array construction from elements
    NewArray(ExprNewArray),

    /// A lambda parameter or a compiled query's formal parameter
    Parameter(ExprParameter),

    /// Locally computed value deferred to execution time
    Placeholder(Rc<Placeholder>),

    /// `expr as T`
    TypeAs(ExprType),

    /// `expr is T`
    TypeIs(ExprType),

    /// Unary operator
    Unary(ExprUnary),
}

#[derive(Debug, Clone)]
pub struct ExprBinary {
    pub op: BinaryOp,
    pub lhs: NodeId,
    pub rhs: NodeId,
}

#[derive(Debug, Clone)]
pub struct ExprCall {
    pub method: Method,

    /// Receiver for instance methods
    pub object: Option<NodeId>,
    pub args: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct ExprConditional {
    pub test: NodeId,
    pub then: NodeId,
    pub otherwise: NodeId,
}

#[derive(Debug, Clone)]
pub struct ExprLambda {
    pub params: Vec<NodeId>,
    pub body: NodeId,
}

#[derive(Debug, Clone)]
pub struct ExprMember {
    pub receiver: Option<NodeId>,

    /// Declaring type, used for static members and computed properties
    pub owner: HostType,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ExprMemberInit {
    /// The `New` node that creates the object
    pub new: NodeId,
    pub bindings: Vec<(String, NodeId)>,
}

#[derive(Debug, Clone)]
pub struct ExprNew {
    pub args: Vec<NodeId>,

    /// The member each argument initializes. Empty for constructors that do
    /// not map arguments to members.
    pub members: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ExprNewArray {
    pub elements: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct ExprParameter {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ExprType {
    pub expr: NodeId,
    pub ty: HostType,
}

#[derive(Debug, Clone)]
pub struct ExprUnary {
    pub op: UnaryOp,
    pub operand: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,

    /// `&`: bitwise on integers, logical on booleans
    And,

    /// `|`: bitwise on integers, logical on booleans
    Or,

    /// `^`
    ExclusiveOr,

    /// `&&`
    AndAlso,

    /// `||`
    OrElse,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,

    /// `??`
    Coalesce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Negate,

    /// Conversion to the node's host type
    Convert,

    /// Wraps a lambda passed as an argument
    Quote,

    /// `~` on integers
    BitNot,
}

impl Expr {
    /// Child handles in evaluation order.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            Expr::Binary(e) => vec![e.lhs, e.rhs],
            Expr::Call(e) => e.object.into_iter().chain(e.args.iter().copied()).collect(),
            Expr::Conditional(e) => vec![e.test, e.then, e.otherwise],
            Expr::Lambda(e) => e.params.iter().copied().chain([e.body]).collect(),
            Expr::Member(e) => e.receiver.into_iter().collect(),
            Expr::MemberInit(e) => [e.new]
                .into_iter()
                .chain(e.bindings.iter().map(|(_, id)| *id))
                .collect(),
            Expr::New(e) => e.args.clone(),
            Expr::NewArray(e) => e.elements.clone(),
            Expr::TypeAs(e) | Expr::TypeIs(e) => vec![e.expr],
            Expr::Unary(e) => vec![e.operand],
            Expr::Closure(_)
            | Expr::Constant(_)
            | Expr::EntitySet(_)
            | Expr::Parameter(_)
            | Expr::Placeholder(_) => vec![],
        }
    }

    /// A copy of the expression with each child handle replaced by `f`.
    pub fn try_map_children(
        &self,
        mut f: impl FnMut(NodeId) -> Result<NodeId>,
    ) -> Result<Expr> {
        let mut all = |ids: &mut dyn Iterator<Item = NodeId>| -> Result<Vec<NodeId>> {
            ids.map(&mut f).collect()
        };

        Ok(match self {
            Expr::Binary(e) => {
                let ids = all(&mut [e.lhs, e.rhs].into_iter())?;
                Expr::Binary(ExprBinary {
                    op: e.op,
                    lhs: ids[0],
                    rhs: ids[1],
                })
            }
            Expr::Call(e) => {
                let ids = all(&mut e.object.into_iter().chain(e.args.iter().copied()))?;
                let (object, args) = match e.object {
                    Some(_) => (Some(ids[0]), ids[1..].to_vec()),
                    None => (None, ids),
                };
                Expr::Call(ExprCall {
                    method: e.method.clone(),
                    object,
                    args,
                })
            }
            Expr::Conditional(e) => {
                let ids = all(&mut [e.test, e.then, e.otherwise].into_iter())?;
                Expr::Conditional(ExprConditional {
                    test: ids[0],
                    then: ids[1],
                    otherwise: ids[2],
                })
            }
            Expr::Lambda(e) => {
                let mut ids = all(&mut e.params.iter().copied().chain([e.body]))?;
                let body = ids.pop().unwrap_or(e.body);
                Expr::Lambda(ExprLambda { params: ids, body })
            }
            Expr::Member(e) => Expr::Member(ExprMember {
                receiver: all(&mut e.receiver.into_iter())?.pop(),
                owner: e.owner.clone(),
                name: e.name.clone(),
            }),
            Expr::MemberInit(e) => {
                let ids = all(&mut [e.new]
                    .into_iter()
                    .chain(e.bindings.iter().map(|(_, id)| *id)))?;
                Expr::MemberInit(ExprMemberInit {
                    new: ids[0],
                    bindings: e
                        .bindings
                        .iter()
                        .zip(&ids[1..])
                        .map(|((name, _), id)| (name.clone(), *id))
                        .collect(),
                })
            }
            Expr::New(e) => Expr::New(ExprNew {
                args: all(&mut e.args.iter().copied())?,
                members: e.members.clone(),
            }),
            Expr::NewArray(e) => Expr::NewArray(ExprNewArray {
                elements: all(&mut e.elements.iter().copied())?,
            }),
            Expr::TypeAs(e) => Expr::TypeAs(ExprType {
                expr: all(&mut [e.expr].into_iter())?[0],
                ty: e.ty.clone(),
            }),
            Expr::TypeIs(e) => Expr::TypeIs(ExprType {
                expr: all(&mut [e.expr].into_iter())?[0],
                ty: e.ty.clone(),
            }),
            Expr::Unary(e) => Expr::Unary(ExprUnary {
                op: e.op,
                operand: all(&mut [e.operand].into_iter())?[0],
            }),
            Expr::Closure(_)
            | Expr::Constant(_)
            | Expr::EntitySet(_)
            | Expr::Parameter(_)
            | Expr::Placeholder(_) => self.clone(),
        })
    }

    /// Infallible form of [`Expr::try_map_children`].
    pub fn map_children(&self, mut f: impl FnMut(NodeId) -> NodeId) -> Expr {
        match self.try_map_children(|id| Ok(f(id))) {
            Ok(expr) => expr,
            Err(_) => self.clone(),
        }
    }

    pub fn as_constant(&self) -> Option<&Value> {
        match self {
            Expr::Constant(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<&ExprCall> {
        match self {
            Expr::Call(call) => Some(call),
            _ => None,
        }
    }

    pub fn as_lambda(&self) -> Option<&ExprLambda> {
        match self {
            Expr::Lambda(lambda) => Some(lambda),
            _ => None,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Expr::Constant(_))
    }

    pub fn is_parameter(&self) -> bool {
        matches!(self, Expr::Parameter(_))
    }
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::LessThan
                | BinaryOp::LessThanOrEqual
                | BinaryOp::GreaterThan
                | BinaryOp::GreaterThanOrEqual
        )
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add
                | BinaryOp::Subtract
                | BinaryOp::Multiply
                | BinaryOp::Divide
                | BinaryOp::Modulo
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::ExclusiveOr => "^",
            BinaryOp::AndAlso => "&&",
            BinaryOp::OrElse => "||",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::LessThan => "<",
            BinaryOp::LessThanOrEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterThanOrEqual => ">=",
            BinaryOp::Coalesce => "??",
        })
    }
}

macro_rules! impl_from {
    ($($variant:ident($ty:ty),)*) => {
        $(
            impl From<$ty> for Expr {
                fn from(value: $ty) -> Self {
                    Expr::$variant(value)
                }
            }
        )*
    };
}

impl_from! {
    Binary(ExprBinary),
    Call(ExprCall),
    Closure(Closure),
    Conditional(ExprConditional),
    Constant(Value),
    Lambda(ExprLambda),
    Member(ExprMember),
    MemberInit(ExprMemberInit),
    New(ExprNew),
    NewArray(ExprNewArray),
    Parameter(ExprParameter),
    Placeholder(Rc<Placeholder>),
    Unary(ExprUnary),
}

use super::{
    Ast, BinaryOp, Closure, Expr, ExprBinary, ExprCall, ExprConditional, ExprLambda, ExprMember,
    ExprMemberInit, ExprNew, ExprNewArray, ExprParameter, ExprType, ExprUnary, Method, NodeId,
    Placeholder, UnaryOp,
};
use crate::{algebra::Value, schema::HostType};
use std::rc::Rc;

/// Host type of closure objects.
pub const CLOSURE_TYPE: &str = "<closure>";

/// Node constructors.
///
/// Each constructor pushes one node and infers its host type from the
/// children where the tree alone determines it.
impl Ast {
    pub fn constant(&mut self, value: impl Into<Value>) -> NodeId {
        let value = value.into();
        let ty = host_type_of(&value);
        self.push(value, ty)
    }

    pub fn constant_typed(&mut self, value: impl Into<Value>, ty: HostType) -> NodeId {
        self.push(value.into(), ty)
    }

    /// A null literal of the given type.
    pub fn null(&mut self, ty: HostType) -> NodeId {
        let ty = match ty {
            ty if ty.is_primitive() => HostType::nullable(ty),
            ty => ty,
        };
        self.push(Value::Null, ty)
    }

    pub fn parameter(&mut self, name: impl Into<String>, ty: HostType) -> NodeId {
        self.push(ExprParameter { name: name.into() }, ty)
    }

    pub fn lambda(&mut self, params: Vec<NodeId>, body: NodeId) -> NodeId {
        self.push(ExprLambda { params, body }, HostType::Object)
    }

    /// A lambda with one parameter; `body` receives the parameter's handle.
    pub fn lambda1(
        &mut self,
        name: &str,
        ty: HostType,
        body: impl FnOnce(&mut Ast, NodeId) -> NodeId,
    ) -> NodeId {
        let param = self.parameter(name, ty);
        let body = body(self, param);
        self.lambda(vec![param], body)
    }

    pub fn call(
        &mut self,
        method: Method,
        object: Option<NodeId>,
        args: Vec<NodeId>,
        ty: HostType,
    ) -> NodeId {
        self.push(
            ExprCall {
                method,
                object,
                args,
            },
            ty,
        )
    }

    /// Calls a query operator, inferring the result type from the source
    /// and lambdas.
    ///
    /// Operators whose result type is not determined by their arguments
    /// (`OfType`, `Cast`) need [`Ast::query_typed`].
    pub fn query(&mut self, name: &str, args: Vec<NodeId>) -> NodeId {
        let ty = self.infer_query_type(name, &args);
        self.call(Method::queryable(name), None, args, ty)
    }

    pub fn query_typed(&mut self, name: &str, args: Vec<NodeId>, ty: HostType) -> NodeId {
        self.call(Method::queryable(name), None, args, ty)
    }

    pub fn member(&mut self, receiver: NodeId, name: impl Into<String>, ty: HostType) -> NodeId {
        let owner = self.ty(receiver).clone();
        self.push(
            ExprMember {
                receiver: Some(receiver),
                owner,
                name: name.into(),
            },
            ty,
        )
    }

    pub fn static_member(
        &mut self,
        owner: HostType,
        name: impl Into<String>,
        ty: HostType,
    ) -> NodeId {
        self.push(
            ExprMember {
                receiver: None,
                owner,
                name: name.into(),
            },
            ty,
        )
    }

    /// Constructs `ty`, assigning each argument to the member of the same
    /// position. Anonymous types are built this way.
    pub fn new_object(&mut self, ty: HostType, members: Vec<(&str, NodeId)>) -> NodeId {
        let (members, args) = members
            .into_iter()
            .map(|(name, id)| (name.to_string(), id))
            .unzip();
        self.push(ExprNew { args, members }, ty)
    }

    /// Calls a constructor whose arguments are not mapped to members.
    pub fn new_with_args(&mut self, ty: HostType, args: Vec<NodeId>) -> NodeId {
        self.push(
            ExprNew {
                args,
                members: vec![],
            },
            ty,
        )
    }

    /// `new T { A = a, B = b }`
    pub fn member_init(&mut self, ty: HostType, bindings: Vec<(&str, NodeId)>) -> NodeId {
        let new = self.new_with_args(ty.clone(), vec![]);
        self.push(
            ExprMemberInit {
                new,
                bindings: bindings
                    .into_iter()
                    .map(|(name, id)| (name.to_string(), id))
                    .collect(),
            },
            ty,
        )
    }

    pub fn new_array(&mut self, element: HostType, elements: Vec<NodeId>) -> NodeId {
        self.push(ExprNewArray { elements }, HostType::sequence(element))
    }

    pub fn conditional(&mut self, test: NodeId, then: NodeId, otherwise: NodeId) -> NodeId {
        let ty = self.ty(then).clone();
        self.push(
            ExprConditional {
                test,
                then,
                otherwise,
            },
            ty,
        )
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: NodeId, rhs: NodeId) -> NodeId {
        let ty = binary_type(op, self.ty(lhs), self.ty(rhs));
        self.push(ExprBinary { op, lhs, rhs }, ty)
    }

    pub fn eq(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.binary(BinaryOp::Equal, lhs, rhs)
    }

    pub fn and_also(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.binary(BinaryOp::AndAlso, lhs, rhs)
    }

    pub fn unary(&mut self, op: UnaryOp, operand: NodeId, ty: HostType) -> NodeId {
        self.push(ExprUnary { op, operand }, ty)
    }

    pub fn not(&mut self, operand: NodeId) -> NodeId {
        let ty = self.ty(operand).clone();
        self.unary(UnaryOp::Not, operand, ty)
    }

    pub fn convert(&mut self, operand: NodeId, ty: HostType) -> NodeId {
        self.unary(UnaryOp::Convert, operand, ty)
    }

    pub fn quote(&mut self, lambda: NodeId) -> NodeId {
        let ty = self.ty(lambda).clone();
        self.unary(UnaryOp::Quote, lambda, ty)
    }

    pub fn type_is(&mut self, expr: NodeId, ty: HostType) -> NodeId {
        self.push(Expr::TypeIs(ExprType { expr, ty }), HostType::Bool)
    }

    pub fn type_as(&mut self, expr: NodeId, ty: HostType) -> NodeId {
        self.push(Expr::TypeAs(ExprType { expr, ty: ty.clone() }), ty)
    }

    pub fn closure(&mut self, closure: &Closure) -> NodeId {
        self.push(closure.clone(), HostType::class(CLOSURE_TYPE))
    }

    /// Reads a captured variable of a closure node.
    pub fn captured(&mut self, closure: NodeId, name: impl Into<String>, ty: HostType) -> NodeId {
        self.member(closure, name, ty)
    }

    /// Scans an entity set whose elements are `entity`.
    pub fn entity_set(&mut self, name: impl Into<String>, entity: impl Into<String>) -> NodeId {
        self.push(
            Expr::EntitySet(name.into()),
            HostType::sequence(HostType::Entity(entity.into())),
        )
    }

    pub fn placeholder(&mut self, placeholder: Rc<Placeholder>) -> NodeId {
        let ty = placeholder.ty().clone();
        self.push(placeholder, ty)
    }

    /// The body type of a lambda, looking through `Quote`.
    pub fn lambda_body_type(&self, id: NodeId) -> Option<&HostType> {
        match self.expr(id) {
            Expr::Lambda(lambda) => Some(self.ty(lambda.body)),
            Expr::Unary(ExprUnary {
                op: UnaryOp::Quote,
                operand,
            }) => self.lambda_body_type(*operand),
            _ => None,
        }
    }

    fn lambda_arity(&self, id: NodeId) -> usize {
        match self.expr(id) {
            Expr::Lambda(lambda) => lambda.params.len(),
            Expr::Unary(ExprUnary {
                op: UnaryOp::Quote,
                operand,
            }) => self.lambda_arity(*operand),
            _ => 0,
        }
    }

    fn infer_query_type(&self, name: &str, args: &[NodeId]) -> HostType {
        let Some(&source) = args.first() else {
            return HostType::Object;
        };
        let source_ty = self.ty(source).clone();
        let element = source_ty.element().cloned().unwrap_or(HostType::Object);
        let body = |i: usize| {
            args.get(i)
                .and_then(|&id| self.lambda_body_type(id))
                .cloned()
                .unwrap_or(HostType::Object)
        };

        match name {
            "Select" => HostType::sequence(body(1)),
            "SelectMany" if args.len() == 3 => HostType::sequence(body(2)),
            "SelectMany" => body(1),
            "Join" | "GroupJoin" => HostType::sequence(body(4)),
            "GroupBy" => match args.len() {
                2 => HostType::sequence(HostType::grouping(body(1), element)),
                3 if self.lambda_arity(args[2]) == 2 => HostType::sequence(body(2)),
                3 => HostType::sequence(HostType::grouping(body(1), body(2))),
                _ => HostType::sequence(body(3)),
            },
            "First" | "FirstOrDefault" | "Single" | "SingleOrDefault" => element,
            "Count" => HostType::I32,
            "LongCount" => HostType::I64,
            "Any" | "All" | "Contains" => HostType::Bool,
            "Average" => HostType::F64,
            "Sum" | "Min" | "Max" if args.len() == 2 => body(1),
            "Sum" | "Min" | "Max" => element,
            _ => source_ty,
        }
    }
}

/// Host type of a literal value.
pub fn host_type_of(value: &Value) -> HostType {
    match value {
        Value::Bool(_) => HostType::Bool,
        Value::Bytes(_) => HostType::Bytes,
        Value::DateTime(_) => HostType::DateTime,
        Value::F64(_) => HostType::F64,
        Value::Guid(_) => HostType::Guid,
        Value::I32(_) => HostType::I32,
        Value::I64(_) => HostType::I64,
        Value::List(items) => HostType::sequence(
            items
                .iter()
                .find(|item| !item.is_null())
                .map(host_type_of)
                .unwrap_or(HostType::Object),
        ),
        Value::Null => HostType::Object,
        Value::Record(record) => match &record.type_name {
            Some(name) => HostType::class(name.clone()),
            None => HostType::Object,
        },
        Value::String(_) => HostType::String,
    }
}

fn binary_type(op: BinaryOp, lhs: &HostType, rhs: &HostType) -> HostType {
    let nullable = lhs.is_nullable() || rhs.is_nullable();
    let wrap = |ty: HostType| {
        if nullable {
            HostType::nullable(ty)
        } else {
            ty
        }
    };

    match op {
        op if op.is_comparison() => HostType::Bool,
        BinaryOp::AndAlso | BinaryOp::OrElse => wrap(HostType::Bool),
        BinaryOp::Coalesce => rhs.clone(),
        BinaryOp::Add if lhs.is_string() || rhs.is_string() => HostType::String,
        _ => {
            let (l, r) = (lhs.non_nullable(), rhs.non_nullable());
            let ty = if *l == HostType::F64 || *r == HostType::F64 {
                HostType::F64
            } else if *l == HostType::I64 || *r == HostType::I64 {
                HostType::I64
            } else {
                l.clone()
            };
            wrap(ty)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_type_follows_select_body() {
        let mut ast = Ast::new();
        let products = ast.entity_set("Products", "Product");
        let select = ast.lambda1("p", HostType::entity("Product"), |ast, p| {
            ast.member(p, "Name", HostType::String)
        });
        let query = ast.query("Select", vec![products, select]);

        assert_eq!(*ast.ty(query), HostType::sequence(HostType::String));
    }

    #[test]
    fn group_by_yields_groupings() {
        let mut ast = Ast::new();
        let products = ast.entity_set("Products", "Product");
        let key = ast.lambda1("p", HostType::entity("Product"), |ast, p| {
            ast.member(p, "Category", HostType::String)
        });
        let query = ast.query("GroupBy", vec![products, key]);

        assert_eq!(
            *ast.ty(query),
            HostType::sequence(HostType::grouping(
                HostType::String,
                HostType::entity("Product")
            ))
        );
    }

    #[test]
    fn arithmetic_widens_and_keeps_nullability() {
        let mut ast = Ast::new();
        let a = ast.null(HostType::I32);
        let b = ast.constant(2i64);
        let sum = ast.binary(BinaryOp::Add, a, b);

        assert_eq!(*ast.ty(sum), HostType::nullable(HostType::I64));
    }
}

use super::{Expr, RowType, Type};

impl Expr {
    /// The result type of the expression.
    ///
    /// Types are inferred structurally from the children. Nodes whose type
    /// cannot be derived (functions, properties, parameters, variables) store
    /// it.
    pub fn ty(&self) -> Type {
        match self {
            Expr::Apply(apply) => Type::collection(Type::Row(RowType::new(vec![
                (apply.input.var.clone(), apply.input.element_ty()),
                (apply.apply.var.clone(), apply.apply.element_ty()),
            ]))),
            Expr::BinaryOp(binary) => {
                if binary.op.is_comparison() || binary.op.is_logical() {
                    Type::Bool
                } else {
                    binary.lhs.ty().widest(&binary.rhs.ty())
                }
            }
            Expr::Case(case) => case
                .whens
                .iter()
                .map(|(_, then)| then.ty())
                .chain(std::iter::once(case.otherwise.ty()))
                .find(|ty| *ty != Type::Unknown)
                .unwrap_or(Type::Unknown),
            Expr::Cast(cast) => cast.ty.clone(),
            Expr::Collection(collection) => Type::collection(collection.ty.clone()),
            Expr::Distinct(input) => input.ty(),
            Expr::Element(input) => input.ty().element_type(),
            Expr::Exists(_) | Expr::IsNull(_) | Expr::IsOf(_) | Expr::Like(_) | Expr::Not(_) => {
                Type::Bool
            }
            Expr::Filter(filter) => filter.input.expr.ty(),
            Expr::Func(func) => func.ty.clone(),
            Expr::GroupBy(group_by) => {
                let mut fields: Vec<_> = group_by
                    .keys
                    .iter()
                    .map(|(name, key)| (name.clone(), key.ty()))
                    .collect();

                if let Some((name, group)) = &group_by.group {
                    fields.push((name.clone(), Type::collection(group.ty())));
                }

                Type::collection(Type::Row(RowType::new(fields)))
            }
            Expr::Join(join) => Type::collection(Type::Row(RowType::new(vec![
                (join.left.var.clone(), join.left.element_ty()),
                (join.right.var.clone(), join.right.element_ty()),
            ]))),
            Expr::Limit(limit) => limit.input.ty(),
            Expr::Negate(expr) => expr.ty(),
            Expr::Null(ty) => ty.clone(),
            Expr::OfType(of_type) => Type::collection(of_type.ty.clone()),
            Expr::Param(param) => param.ty.clone(),
            Expr::Project(project) => Type::collection(project.projection.ty()),
            Expr::Property(property) => property.ty.clone(),
            Expr::Row(row) => Type::Row(row.ty.clone()),
            Expr::Scan(scan) => Type::collection(scan.ty.clone()),
            Expr::SetOp(set_op) => match set_op.lhs.ty() {
                Type::Collection(element) if *element != Type::Unknown => {
                    Type::Collection(element)
                }
                _ => set_op.rhs.ty(),
            },
            Expr::Skip(skip) => skip.input.expr.ty(),
            Expr::Sort(sort) => sort.input.expr.ty(),
            Expr::Treat(treat) => treat.ty.clone(),
            Expr::Value(value) => value.infer_ty(),
            Expr::Var(var) => var.ty.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::{Binding, SortKey};

    fn products() -> Expr {
        Expr::scan("Products", Type::Entity("Product".into()))
    }

    #[test]
    fn relational_nodes_keep_input_type() {
        let input = Binding::new("p", products());
        let sorted = Expr::sort(
            input.clone(),
            vec![SortKey::asc(Expr::property(
                input.var_ref(),
                "Name",
                Type::String,
            ))],
        );

        assert_eq!(sorted.ty(), Type::collection(Type::Entity("Product".into())));
        assert_eq!(
            Expr::limit(sorted, 3).ty(),
            Type::collection(Type::Entity("Product".into()))
        );
    }

    #[test]
    fn project_yields_collection_of_projection() {
        let input = Binding::new("p", products());
        let project = Expr::project(
            input.clone(),
            Expr::property(input.var_ref(), "Name", Type::String),
        );

        assert_eq!(project.ty(), Type::collection(Type::String));
        assert_eq!(Expr::element(project).ty(), Type::String);
    }

    #[test]
    fn arithmetic_widens() {
        let expr = Expr::binary_op(1i32, crate::algebra::BinaryOp::Add, 2i64);
        assert_eq!(expr.ty(), Type::I64);
    }
}

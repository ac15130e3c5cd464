use super::{Binding, Expr};

/// Visits free references to one binding variable.
///
/// Bindings that reintroduce the same name shadow it: references below them
/// are left alone.
struct Substitute<'a> {
    name: &'a str,
    on_free: &'a mut dyn FnMut(&mut Expr),
}

impl Expr {
    /// Returns a copy of `self` with free references to `name` replaced by
    /// `replacement`.
    pub fn substitute(&self, name: &str, replacement: &Expr) -> Expr {
        let mut expr = self.clone();
        expr.substitute_mut(name, replacement);
        expr
    }

    pub fn substitute_mut(&mut self, name: &str, replacement: &Expr) {
        Substitute {
            name,
            on_free: &mut |expr| *expr = replacement.clone(),
        }
        .visit(self);
    }

    /// Renames free references to the variable `from` to `to`.
    pub fn rebind(&self, from: &str, to: &Binding) -> Expr {
        if from == to.var {
            return self.clone();
        }
        self.substitute(from, &to.var_ref())
    }

    /// Returns `true` if `name` occurs free in the expression.
    pub fn references_var(&self, name: &str) -> bool {
        let mut found = false;
        let mut scratch = self.clone();
        Substitute {
            name,
            on_free: &mut |_| found = true,
        }
        .visit(&mut scratch);
        found
    }

    /// Calls `f` on every expression in the tree, parents first.
    pub fn walk(&self, f: &mut impl FnMut(&Expr)) {
        f(self);

        match self {
            Expr::Apply(apply) => {
                apply.input.expr.walk(f);
                apply.apply.expr.walk(f);
            }
            Expr::BinaryOp(binary) => {
                binary.lhs.walk(f);
                binary.rhs.walk(f);
            }
            Expr::Case(case) => {
                for (when, then) in &case.whens {
                    when.walk(f);
                    then.walk(f);
                }
                case.otherwise.walk(f);
            }
            Expr::Cast(cast) => cast.expr.walk(f),
            Expr::Collection(collection) => {
                for element in &collection.elements {
                    element.walk(f);
                }
            }
            Expr::Distinct(expr)
            | Expr::Element(expr)
            | Expr::Exists(expr)
            | Expr::IsNull(expr)
            | Expr::Negate(expr)
            | Expr::Not(expr) => expr.walk(f),
            Expr::Filter(filter) => {
                filter.input.expr.walk(f);
                filter.predicate.walk(f);
            }
            Expr::Func(func) => {
                for arg in &func.args {
                    arg.walk(f);
                }
            }
            Expr::GroupBy(group_by) => {
                group_by.input.expr.walk(f);
                for (_, key) in &group_by.keys {
                    key.walk(f);
                }
                if let Some((_, group)) = &group_by.group {
                    group.walk(f);
                }
            }
            Expr::IsOf(is_of) => is_of.expr.walk(f),
            Expr::Join(join) => {
                join.left.expr.walk(f);
                join.right.expr.walk(f);
                join.condition.walk(f);
            }
            Expr::Like(like) => {
                like.input.walk(f);
                like.pattern.walk(f);
                if let Some(escape) = &like.escape {
                    escape.walk(f);
                }
            }
            Expr::Limit(limit) => {
                limit.input.walk(f);
                limit.count.walk(f);
            }
            Expr::OfType(of_type) => of_type.input.walk(f),
            Expr::Project(project) => {
                project.input.expr.walk(f);
                project.projection.walk(f);
            }
            Expr::Property(property) => property.instance.walk(f),
            Expr::Row(row) => {
                for field in &row.fields {
                    field.walk(f);
                }
            }
            Expr::SetOp(set_op) => {
                set_op.lhs.walk(f);
                set_op.rhs.walk(f);
            }
            Expr::Skip(skip) => {
                skip.input.expr.walk(f);
                for key in &skip.keys {
                    key.expr.walk(f);
                }
                skip.count.walk(f);
            }
            Expr::Sort(sort) => {
                sort.input.expr.walk(f);
                for key in &sort.keys {
                    key.expr.walk(f);
                }
            }
            Expr::Treat(treat) => treat.expr.walk(f),
            Expr::Null(_) | Expr::Param(_) | Expr::Scan(_) | Expr::Value(_) | Expr::Var(_) => {}
        }
    }
}

impl Substitute<'_> {
    fn visit(&mut self, expr: &mut Expr) {
        match expr {
            Expr::Var(var) if var.name == self.name => (self.on_free)(expr),
            Expr::Apply(apply) => {
                self.visit(&mut apply.input.expr);
                if !self.shadowed_by(&apply.input) {
                    self.visit(&mut apply.apply.expr);
                }
            }
            Expr::BinaryOp(binary) => {
                self.visit(&mut binary.lhs);
                self.visit(&mut binary.rhs);
            }
            Expr::Case(case) => {
                for (when, then) in &mut case.whens {
                    self.visit(when);
                    self.visit(then);
                }
                self.visit(&mut case.otherwise);
            }
            Expr::Cast(cast) => self.visit(&mut cast.expr),
            Expr::Collection(collection) => {
                for element in &mut collection.elements {
                    self.visit(element);
                }
            }
            Expr::Distinct(expr)
            | Expr::Element(expr)
            | Expr::Exists(expr)
            | Expr::IsNull(expr)
            | Expr::Negate(expr)
            | Expr::Not(expr) => self.visit(expr),
            Expr::Filter(filter) => {
                self.visit(&mut filter.input.expr);
                if !self.shadowed_by(&filter.input) {
                    self.visit(&mut filter.predicate);
                }
            }
            Expr::Func(func) => {
                for arg in &mut func.args {
                    self.visit(arg);
                }
            }
            Expr::GroupBy(group_by) => {
                self.visit(&mut group_by.input.expr);
                if !self.shadowed_by(&group_by.input) {
                    for (_, key) in &mut group_by.keys {
                        self.visit(key);
                    }
                }
                if group_by.group_var != self.name {
                    if let Some((_, group)) = &mut group_by.group {
                        self.visit(group);
                    }
                }
            }
            Expr::IsOf(is_of) => self.visit(&mut is_of.expr),
            Expr::Join(join) => {
                self.visit(&mut join.left.expr);
                self.visit(&mut join.right.expr);
                if !self.shadowed_by(&join.left) && !self.shadowed_by(&join.right) {
                    self.visit(&mut join.condition);
                }
            }
            Expr::Like(like) => {
                self.visit(&mut like.input);
                self.visit(&mut like.pattern);
                if let Some(escape) = &mut like.escape {
                    self.visit(escape);
                }
            }
            Expr::Limit(limit) => {
                self.visit(&mut limit.input);
                self.visit(&mut limit.count);
            }
            Expr::OfType(of_type) => self.visit(&mut of_type.input),
            Expr::Project(project) => {
                self.visit(&mut project.input.expr);
                if !self.shadowed_by(&project.input) {
                    self.visit(&mut project.projection);
                }
            }
            Expr::Property(property) => self.visit(&mut property.instance),
            Expr::Row(row) => {
                for field in &mut row.fields {
                    self.visit(field);
                }
            }
            Expr::SetOp(set_op) => {
                self.visit(&mut set_op.lhs);
                self.visit(&mut set_op.rhs);
            }
            Expr::Skip(skip) => {
                self.visit(&mut skip.input.expr);
                self.visit(&mut skip.count);
                if !self.shadowed_by(&skip.input) {
                    for key in &mut skip.keys {
                        self.visit(&mut key.expr);
                    }
                }
            }
            Expr::Sort(sort) => {
                self.visit(&mut sort.input.expr);
                if !self.shadowed_by(&sort.input) {
                    for key in &mut sort.keys {
                        self.visit(&mut key.expr);
                    }
                }
            }
            Expr::Treat(treat) => self.visit(&mut treat.expr),
            Expr::Null(_) | Expr::Param(_) | Expr::Scan(_) | Expr::Value(_) | Expr::Var(_) => {}
        }
    }

    fn shadowed_by(&self, binding: &Binding) -> bool {
        binding.var == self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::Type;

    fn product() -> Type {
        Type::Entity("Product".into())
    }

    #[test]
    fn replaces_free_references() {
        let expr = Expr::property(Expr::var("x", product()), "Name", Type::String);
        let replaced = expr.substitute("x", &Expr::var("y", product()));

        assert_eq!(
            replaced,
            Expr::property(Expr::var("y", product()), "Name", Type::String)
        );
    }

    #[test]
    fn inner_binding_shadows() {
        let inner = Binding::new("x", Expr::scan("Products", product()));
        let expr = Expr::filter(
            inner,
            Expr::eq(
                Expr::property(Expr::var("x", product()), "Id", Type::I32),
                1,
            ),
        );

        let replaced = expr.substitute("x", &Expr::from(5));
        assert_eq!(replaced, expr);
        assert!(!expr.references_var("x"));
    }

    #[test]
    fn detects_free_reference_in_predicate() {
        let input = Binding::new("y", Expr::scan("Products", product()));
        let expr = Expr::filter(
            input,
            Expr::eq(
                Expr::property(Expr::var("x", product()), "Id", Type::I32),
                1,
            ),
        );

        assert!(expr.references_var("x"));
        assert!(!expr.references_var("y"));
    }
}

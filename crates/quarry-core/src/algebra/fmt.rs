use super::{Binding, Expr, JoinKind, SortKey, Value};
use std::fmt;

/// Compact functional rendering, used in logs and test failure output.
///
/// ```text
/// project(filter(scan(Products) as LQ0, eq(LQ0.Id, 5)) as LQ1, LQ1.Name)
/// ```
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Apply(apply) => write!(
                f,
                "{}_apply({}, {})",
                match apply.kind {
                    super::ApplyKind::Cross => "cross",
                    super::ApplyKind::Outer => "outer",
                },
                apply.input,
                apply.apply
            ),
            Expr::BinaryOp(binary) => write!(f, "({} {} {})", binary.lhs, binary.op, binary.rhs),
            Expr::Case(case) => {
                f.write_str("case(")?;
                for (when, then) in &case.whens {
                    write!(f, "when {when} then {then}, ")?;
                }
                write!(f, "else {})", case.otherwise)
            }
            Expr::Cast(cast) => write!(f, "cast({} as {})", cast.expr, cast.ty),
            Expr::Collection(collection) => {
                f.write_str("[")?;
                list(f, &collection.elements)?;
                f.write_str("]")
            }
            Expr::Distinct(input) => write!(f, "distinct({input})"),
            Expr::Element(input) => write!(f, "element({input})"),
            Expr::Exists(input) => write!(f, "exists({input})"),
            Expr::Filter(filter) => write!(f, "filter({}, {})", filter.input, filter.predicate),
            Expr::Func(func) => {
                write!(f, "{}.{}(", func.namespace, func.name)?;
                list(f, &func.args)?;
                f.write_str(")")
            }
            Expr::GroupBy(group_by) => {
                write!(f, "group_by({}, group {}, keys(", group_by.input, group_by.group_var)?;
                for (i, (name, key)) in group_by.keys.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key} as {name}")?;
                }
                f.write_str(")")?;
                if let Some((name, group)) = &group_by.group {
                    write!(f, ", {group} as {name}")?;
                }
                f.write_str(")")
            }
            Expr::IsNull(expr) => write!(f, "is_null({expr})"),
            Expr::IsOf(is_of) => write!(
                f,
                "is_of({}, {}{})",
                is_of.expr,
                if is_of.only { "only " } else { "" },
                is_of.ty
            ),
            Expr::Join(join) => write!(
                f,
                "{}_join({}, {}, {})",
                match join.kind {
                    JoinKind::Inner => "inner",
                    JoinKind::LeftOuter => "left_outer",
                    JoinKind::FullOuter => "full_outer",
                    JoinKind::Cross => "cross",
                },
                join.left,
                join.right,
                join.condition
            ),
            Expr::Like(like) => {
                write!(f, "like({}, {}", like.input, like.pattern)?;
                if let Some(escape) = &like.escape {
                    write!(f, " escape {escape}")?;
                }
                f.write_str(")")
            }
            Expr::Limit(limit) => write!(f, "limit({}, {})", limit.input, limit.count),
            Expr::Negate(expr) => write!(f, "-{expr}"),
            Expr::Not(expr) => write!(f, "not({expr})"),
            Expr::Null(_) => f.write_str("null"),
            Expr::OfType(of_type) => write!(f, "of_type({}, {})", of_type.input, of_type.ty),
            Expr::Param(param) => write!(f, "@{}", param.name),
            Expr::Project(project) => {
                write!(f, "project({}, {})", project.input, project.projection)
            }
            Expr::Property(property) => write!(f, "{}.{}", property.instance, property.name),
            Expr::Row(row) => {
                f.write_str("row(")?;
                for (i, (name, field)) in row.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{field} as {name}")?;
                }
                f.write_str(")")
            }
            Expr::Scan(scan) => write!(f, "scan({})", scan.set),
            Expr::SetOp(set_op) => write!(f, "{}({}, {})", set_op.op, set_op.lhs, set_op.rhs),
            Expr::Skip(skip) => {
                write!(f, "skip({}, ", skip.input)?;
                keys(f, &skip.keys)?;
                write!(f, ", {})", skip.count)
            }
            Expr::Sort(sort) => {
                write!(f, "sort({}, ", sort.input)?;
                keys(f, &sort.keys)?;
                f.write_str(")")
            }
            Expr::Treat(treat) => write!(f, "treat({} as {})", treat.expr, treat.ty),
            Expr::Value(value) => fmt::Display::fmt(value, f),
            Expr::Var(var) => f.write_str(&var.name),
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} as {}", self.expr, self.var)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Bytes(v) => write!(f, "bytes[{}]", v.len()),
            Value::DateTime(v) => write!(f, "datetime({v})"),
            Value::F64(v) => write!(f, "{v:?}"),
            Value::Guid(v) => write!(f, "guid'{v}'"),
            Value::I32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}L"),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Null => f.write_str("null"),
            Value::Record(record) => {
                if let Some(name) = &record.type_name {
                    f.write_str(name)?;
                }
                f.write_str("{")?;
                for (i, (name, value)) in record.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                f.write_str("}")
            }
            Value::String(v) => write!(f, "{v:?}"),
        }
    }
}

fn list(f: &mut fmt::Formatter<'_>, exprs: &[Expr]) -> fmt::Result {
    for (i, expr) in exprs.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{expr}")?;
    }
    Ok(())
}

fn keys(f: &mut fmt::Formatter<'_>, keys: &[SortKey]) -> fmt::Result {
    f.write_str("[")?;
    for (i, key) in keys.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(
            f,
            "{} {}",
            key.expr,
            if key.ascending { "asc" } else { "desc" }
        )?;
    }
    f.write_str("]")
}

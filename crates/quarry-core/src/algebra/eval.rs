//! Client-side reference evaluation of algebra trees.
//!
//! Backends execute the command tree natively; this evaluator gives the
//! same tree in-process semantics so translations can be checked against
//! expected rows. Boolean logic is three-valued: `Value::Null` is unknown.

use super::{
    ApplyKind, BinaryOp, Expr, ExprFunc, JoinKind, SetOp, SortKey, Type, Value, ValueRecord,
    CANONICAL_NAMESPACE,
};
use crate::{Error, Result};
use indexmap::IndexMap;
use std::cmp::Ordering;
use uuid::Uuid;

/// Supplies the data an algebra tree reads.
pub trait Input {
    /// All instances of an entity set.
    fn scan(&mut self, set: &str) -> Result<Vec<Value>> {
        Err(Error::expression_evaluation_failed(format!(
            "no data for entity set `{set}`"
        )))
    }

    /// The value of a query parameter.
    fn param(&mut self, name: &str) -> Option<Value> {
        let _ = name;
        None
    }

    /// Returns `true` if `ty` is `base` or derives from it.
    fn is_subtype(&self, ty: &str, base: &str) -> bool {
        ty == base
    }
}

/// Input for trees that read neither entity sets nor parameters.
#[derive(Debug, Default)]
pub struct ConstInput {}

impl ConstInput {
    pub fn new() -> ConstInput {
        ConstInput {}
    }
}

impl Input for ConstInput {}

/// In-memory entity sets and parameter values.
#[derive(Debug, Default, Clone)]
pub struct Tables {
    sets: IndexMap<String, Vec<Value>>,
    params: IndexMap<String, Value>,

    /// Derived type name to base type name
    bases: IndexMap<String, String>,
}

impl Tables {
    pub fn new() -> Tables {
        Tables::default()
    }

    pub fn with_set(mut self, name: impl Into<String>, rows: Vec<Value>) -> Tables {
        self.sets.insert(name.into(), rows);
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Tables {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_base(mut self, derived: impl Into<String>, base: impl Into<String>) -> Tables {
        self.bases.insert(derived.into(), base.into());
        self
    }
}

impl Input for &Tables {
    fn scan(&mut self, set: &str) -> Result<Vec<Value>> {
        self.sets.get(set).cloned().ok_or_else(|| {
            Error::expression_evaluation_failed(format!("no data for entity set `{set}`"))
        })
    }

    fn param(&mut self, name: &str) -> Option<Value> {
        self.params.get(name).cloned()
    }

    fn is_subtype(&self, ty: &str, base: &str) -> bool {
        let mut current = Some(ty);
        while let Some(name) = current {
            if name == base {
                return true;
            }
            current = self.bases.get(name).map(String::as_str);
        }
        false
    }
}

/// Evaluates algebra trees against an [`Input`].
#[derive(Debug)]
pub struct Eval<I> {
    input: I,

    /// Reverse the output of filters and type filters, modelling a backend
    /// where those operators do not keep input order.
    reorder_unordered: bool,
}

enum Scope<'a> {
    Root,
    Var {
        name: &'a str,
        value: &'a Value,
        parent: &'a Scope<'a>,
    },
}

impl Scope<'_> {
    fn resolve(&self, name: &str) -> Option<&Value> {
        let mut scope = self;
        loop {
            match scope {
                Scope::Root => return None,
                Scope::Var {
                    name: var,
                    value,
                    parent,
                } => {
                    if *var == name {
                        return Some(value);
                    }
                    scope = parent;
                }
            }
        }
    }

    fn bind<'a>(&'a self, name: &'a str, value: &'a Value) -> Scope<'a> {
        Scope::Var {
            name,
            value,
            parent: self,
        }
    }
}

impl Expr {
    pub fn eval(&self, input: impl Input) -> Result<Value> {
        Eval::new(input).eval(self)
    }

    pub fn eval_const(&self) -> Result<Value> {
        self.eval(ConstInput::new())
    }
}

impl<I: Input> Eval<I> {
    pub fn new(input: I) -> Eval<I> {
        Eval {
            input,
            reorder_unordered: false,
        }
    }

    pub fn reorder_unordered(mut self, reorder: bool) -> Eval<I> {
        self.reorder_unordered = reorder;
        self
    }

    pub fn eval(&mut self, expr: &Expr) -> Result<Value> {
        self.eval_ref(expr, &Scope::Root)
    }

    fn eval_ref(&mut self, expr: &Expr, scope: &Scope<'_>) -> Result<Value> {
        match expr {
            Expr::Apply(apply) => {
                let items = self.eval_list(&apply.input.expr, scope)?;
                let mut ret = vec![];

                for item in &items {
                    let inner = scope.bind(&apply.input.var, item);
                    let applied = self.eval_list(&apply.apply.expr, &inner)?;

                    if applied.is_empty() && apply.kind == ApplyKind::Outer {
                        ret.push(pair(&apply.input.var, item.clone(), &apply.apply.var, Value::Null));
                    }

                    for value in applied {
                        ret.push(pair(&apply.input.var, item.clone(), &apply.apply.var, value));
                    }
                }

                Ok(Value::List(ret))
            }
            Expr::BinaryOp(binary) => match binary.op {
                BinaryOp::And => {
                    let lhs = self.eval_ref(&binary.lhs, scope)?;
                    if lhs.as_bool() == Some(false) {
                        return Ok(false.into());
                    }
                    let rhs = self.eval_ref(&binary.rhs, scope)?;
                    Ok(match (lhs.as_bool(), rhs.as_bool()) {
                        (_, Some(false)) => false.into(),
                        (Some(true), Some(true)) => true.into(),
                        _ => Value::Null,
                    })
                }
                BinaryOp::Or => {
                    let lhs = self.eval_ref(&binary.lhs, scope)?;
                    if lhs.as_bool() == Some(true) {
                        return Ok(true.into());
                    }
                    let rhs = self.eval_ref(&binary.rhs, scope)?;
                    Ok(match (lhs.as_bool(), rhs.as_bool()) {
                        (_, Some(true)) => true.into(),
                        (Some(false), Some(false)) => false.into(),
                        _ => Value::Null,
                    })
                }
                op => {
                    let lhs = self.eval_ref(&binary.lhs, scope)?;
                    let rhs = self.eval_ref(&binary.rhs, scope)?;
                    eval_binary_op(op, &lhs, &rhs)
                }
            },
            Expr::Case(case) => {
                for (when, then) in &case.whens {
                    if self.eval_ref(when, scope)?.as_bool() == Some(true) {
                        return self.eval_ref(then, scope);
                    }
                }
                self.eval_ref(&case.otherwise, scope)
            }
            Expr::Cast(cast) => cast_value(self.eval_ref(&cast.expr, scope)?, &cast.ty),
            Expr::Collection(collection) => {
                let mut ret = vec![];
                for element in &collection.elements {
                    ret.push(self.eval_ref(element, scope)?);
                }
                Ok(Value::List(ret))
            }
            Expr::Distinct(input) => {
                let items = self.eval_list(input, scope)?;
                Ok(Value::List(distinct(items)))
            }
            Expr::Element(input) => {
                let items = self.eval_list(input, scope)?;
                Ok(items.into_iter().next().unwrap_or(Value::Null))
            }
            Expr::Exists(input) => Ok((!self.eval_list(input, scope)?.is_empty()).into()),
            Expr::Filter(filter) => {
                let items = self.eval_list(&filter.input.expr, scope)?;
                let mut ret = vec![];

                for item in items {
                    let inner = scope.bind(&filter.input.var, &item);
                    let keep = self.eval_ref(&filter.predicate, &inner)?.as_bool() == Some(true);
                    if keep {
                        ret.push(item);
                    }
                }

                Ok(Value::List(self.maybe_reorder(ret)))
            }
            Expr::Func(func) => self.eval_func(func, scope),
            Expr::GroupBy(group_by) => {
                let items = self.eval_list(&group_by.input.expr, scope)?;
                let mut groups: Vec<(Vec<Value>, Vec<Value>)> = vec![];

                for item in items {
                    let inner = scope.bind(&group_by.input.var, &item);
                    let mut key = vec![];
                    for (_, key_expr) in &group_by.keys {
                        key.push(self.eval_ref(key_expr, &inner)?);
                    }

                    match groups.iter_mut().find(|(existing, _)| {
                        existing.iter().zip(&key).all(|(lhs, rhs)| lhs.is_same(rhs))
                    }) {
                        Some((_, members)) => members.push(item),
                        None => groups.push((key, vec![item])),
                    }
                }

                let mut ret = vec![];
                for (key, members) in groups {
                    let mut record = ValueRecord::new();
                    for ((name, _), value) in group_by.keys.iter().zip(key) {
                        record.fields.insert(name.clone(), value);
                    }

                    if let Some((name, group)) = &group_by.group {
                        let mut elements = vec![];
                        for member in &members {
                            let inner = scope.bind(&group_by.group_var, member);
                            elements.push(self.eval_ref(group, &inner)?);
                        }
                        record.fields.insert(name.clone(), Value::List(elements));
                    }

                    ret.push(Value::Record(record));
                }

                Ok(Value::List(ret))
            }
            Expr::IsNull(expr) => Ok(self.eval_ref(expr, scope)?.is_null().into()),
            Expr::IsOf(is_of) => {
                let value = self.eval_ref(&is_of.expr, scope)?;
                Ok(self.is_of(&value, &is_of.ty, is_of.only).into())
            }
            Expr::Join(join) => {
                let left = self.eval_list(&join.left.expr, scope)?;
                let right = self.eval_list(&join.right.expr, scope)?;
                let mut right_matched = vec![false; right.len()];
                let mut ret = vec![];

                for l in &left {
                    let mut matched = false;

                    for (i, r) in right.iter().enumerate() {
                        let keep = match join.kind {
                            JoinKind::Cross => true,
                            _ => {
                                let outer = scope.bind(&join.left.var, l);
                                let inner = outer.bind(&join.right.var, r);
                                self.eval_ref(&join.condition, &inner)?.as_bool() == Some(true)
                            }
                        };

                        if keep {
                            matched = true;
                            right_matched[i] = true;
                            ret.push(pair(&join.left.var, l.clone(), &join.right.var, r.clone()));
                        }
                    }

                    if !matched && matches!(join.kind, JoinKind::LeftOuter | JoinKind::FullOuter) {
                        ret.push(pair(&join.left.var, l.clone(), &join.right.var, Value::Null));
                    }
                }

                if join.kind == JoinKind::FullOuter {
                    for (r, matched) in right.iter().zip(right_matched) {
                        if !matched {
                            ret.push(pair(&join.left.var, Value::Null, &join.right.var, r.clone()));
                        }
                    }
                }

                Ok(Value::List(ret))
            }
            Expr::Like(like) => {
                let input = self.eval_ref(&like.input, scope)?;
                let pattern = self.eval_ref(&like.pattern, scope)?;
                let escape = match &like.escape {
                    Some(escape) => self
                        .eval_ref(escape, scope)?
                        .as_str()
                        .and_then(|s| s.chars().next()),
                    None => None,
                };

                match (input.as_str(), pattern.as_str()) {
                    (Some(input), Some(pattern)) => Ok(like_match(input, pattern, escape).into()),
                    _ => Ok(Value::Null),
                }
            }
            Expr::Limit(limit) => {
                let mut items = self.eval_list(&limit.input, scope)?;
                let count = self.eval_count(&limit.count, scope)?;
                items.truncate(count);
                Ok(Value::List(items))
            }
            Expr::Negate(expr) => match self.eval_ref(expr, scope)? {
                Value::Null => Ok(Value::Null),
                Value::I32(v) => Ok(Value::I32(-v)),
                Value::I64(v) => Ok(Value::I64(-v)),
                Value::F64(v) => Ok(Value::F64(-v)),
                value => Err(Error::expression_evaluation_failed(format!(
                    "cannot negate {value}"
                ))),
            },
            Expr::Not(expr) => Ok(match self.eval_ref(expr, scope)?.as_bool() {
                Some(value) => (!value).into(),
                None => Value::Null,
            }),
            Expr::Null(_) => Ok(Value::Null),
            Expr::OfType(of_type) => {
                let items = self.eval_list(&of_type.input, scope)?;
                let ret = items
                    .into_iter()
                    .filter(|item| self.is_of(item, &of_type.ty, of_type.only))
                    .collect();
                Ok(Value::List(self.maybe_reorder(ret)))
            }
            Expr::Param(param) => self.input.param(&param.name).ok_or_else(|| {
                Error::expression_evaluation_failed(format!(
                    "no value for parameter `{}`",
                    param.name
                ))
            }),
            Expr::Project(project) => {
                let items = self.eval_list(&project.input.expr, scope)?;
                let mut ret = vec![];
                for item in &items {
                    let inner = scope.bind(&project.input.var, item);
                    ret.push(self.eval_ref(&project.projection, &inner)?);
                }
                Ok(Value::List(ret))
            }
            Expr::Property(property) => match self.eval_ref(&property.instance, scope)? {
                Value::Null => Ok(Value::Null),
                Value::Record(record) => record.get(&property.name).cloned().ok_or_else(|| {
                    Error::expression_evaluation_failed(format!(
                        "record has no field `{}`",
                        property.name
                    ))
                }),
                value => Err(Error::expression_evaluation_failed(format!(
                    "cannot read `{}` from {value}",
                    property.name
                ))),
            },
            Expr::Row(row) => {
                let mut record = ValueRecord::new();
                for (name, field) in row.iter() {
                    let value = self.eval_ref(field, scope)?;
                    record.fields.insert(name.to_string(), value);
                }
                Ok(Value::Record(record))
            }
            Expr::Scan(scan) => Ok(Value::List(self.input.scan(&scan.set)?)),
            Expr::SetOp(set_op) => {
                let lhs = self.eval_list(&set_op.lhs, scope)?;
                let rhs = self.eval_list(&set_op.rhs, scope)?;

                let ret = match set_op.op {
                    SetOp::UnionAll => lhs.into_iter().chain(rhs).collect(),
                    SetOp::Intersect => distinct(lhs)
                        .into_iter()
                        .filter(|item| rhs.iter().any(|other| item.is_same(other)))
                        .collect(),
                    SetOp::Except => distinct(lhs)
                        .into_iter()
                        .filter(|item| !rhs.iter().any(|other| item.is_same(other)))
                        .collect(),
                };

                Ok(Value::List(ret))
            }
            Expr::Skip(skip) => {
                let items = self.eval_list(&skip.input.expr, scope)?;
                let mut items = self.sort(items, &skip.input.var, &skip.keys, scope)?;
                let count = self.eval_count(&skip.count, scope)?;
                items.drain(..count.min(items.len()));
                Ok(Value::List(items))
            }
            Expr::Sort(sort) => {
                let items = self.eval_list(&sort.input.expr, scope)?;
                Ok(Value::List(self.sort(
                    items,
                    &sort.input.var,
                    &sort.keys,
                    scope,
                )?))
            }
            Expr::Treat(treat) => {
                let value = self.eval_ref(&treat.expr, scope)?;
                if self.is_of(&value, &treat.ty, false) {
                    Ok(value)
                } else {
                    Ok(Value::Null)
                }
            }
            Expr::Value(value) => Ok(value.clone()),
            Expr::Var(var) => scope.resolve(&var.name).cloned().ok_or_else(|| {
                Error::expression_evaluation_failed(format!(
                    "variable `{}` is not bound",
                    var.name
                ))
            }),
        }
    }

    fn eval_list(&mut self, expr: &Expr, scope: &Scope<'_>) -> Result<Vec<Value>> {
        match self.eval_ref(expr, scope)? {
            Value::List(items) => Ok(items),
            Value::Null => Ok(vec![]),
            value => Err(Error::expression_evaluation_failed(format!(
                "expected a collection, got {value}"
            ))),
        }
    }

    fn eval_count(&mut self, expr: &Expr, scope: &Scope<'_>) -> Result<usize> {
        let value = self.eval_ref(expr, scope)?;
        let Some(count) = value.to_i64() else {
            return Err(Error::expression_evaluation_failed(format!(
                "expected an integer count, got {value}"
            )));
        };
        Ok(usize::try_from(count.max(0))?)
    }

    fn sort(
        &mut self,
        items: Vec<Value>,
        var: &str,
        keys: &[SortKey],
        scope: &Scope<'_>,
    ) -> Result<Vec<Value>> {
        let mut keyed = vec![];

        for item in items {
            let inner = scope.bind(var, &item);
            let mut values = vec![];
            for key in keys {
                values.push(self.eval_ref(&key.expr, &inner)?);
            }
            keyed.push((values, item));
        }

        // Stable, so equal keys keep input order. Nulls sort first.
        keyed.sort_by(|(lhs, _), (rhs, _)| {
            for ((lhs, rhs), key) in lhs.iter().zip(rhs).zip(keys) {
                let ordering = match (lhs.is_null(), rhs.is_null()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Less,
                    (false, true) => Ordering::Greater,
                    (false, false) => lhs.compare(rhs).unwrap_or(Ordering::Equal),
                };
                let ordering = if key.ascending {
                    ordering
                } else {
                    ordering.reverse()
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });

        Ok(keyed.into_iter().map(|(_, item)| item).collect())
    }

    fn maybe_reorder(&self, mut items: Vec<Value>) -> Vec<Value> {
        if self.reorder_unordered {
            items.reverse();
        }
        items
    }

    fn is_of(&self, value: &Value, ty: &Type, only: bool) -> bool {
        let (Value::Record(record), Type::Entity(name) | Type::Complex(name)) = (value, ty) else {
            return false;
        };
        let Some(actual) = &record.type_name else {
            return false;
        };

        if only {
            actual == name
        } else {
            self.input.is_subtype(actual, name)
        }
    }

    fn eval_func(&mut self, func: &ExprFunc, scope: &Scope<'_>) -> Result<Value> {
        if func.namespace != CANONICAL_NAMESPACE {
            return Err(Error::expression_evaluation_failed(format!(
                "function `{}.{}` can only be evaluated by the backend",
                func.namespace, func.name
            )));
        }

        if func.aggregate {
            let [arg] = &func.args[..] else {
                return Err(Error::expression_evaluation_failed(
                    "aggregate takes a single collection argument",
                ));
            };
            let items = self.eval_list(arg, scope)?;
            return aggregate(&func.name, items, &func.ty);
        }

        let mut args = vec![];
        for arg in &func.args {
            args.push(self.eval_ref(arg, scope)?);
        }

        // Canonical scalar functions return null when any argument is null
        if args.iter().any(Value::is_null) {
            return Ok(Value::Null);
        }

        scalar_function(&func.name, &args)
    }
}

fn pair(lhs_name: &str, lhs: Value, rhs_name: &str, rhs: Value) -> Value {
    Value::Record(ValueRecord::new().with(lhs_name, lhs).with(rhs_name, rhs))
}

fn distinct(items: Vec<Value>) -> Vec<Value> {
    let mut ret: Vec<Value> = vec![];
    for item in items {
        if !ret.iter().any(|existing| existing.is_same(&item)) {
            ret.push(item);
        }
    }
    ret
}

fn eval_binary_op(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value> {
    if lhs.is_null() || rhs.is_null() {
        return Ok(Value::Null);
    }

    if op.is_comparison() {
        let Some(ordering) = lhs.compare(rhs) else {
            return Err(Error::expression_evaluation_failed(format!(
                "cannot compare {lhs} with {rhs}"
            )));
        };

        return Ok(match op {
            BinaryOp::Eq => ordering.is_eq(),
            BinaryOp::Ne => ordering.is_ne(),
            BinaryOp::Lt => ordering.is_lt(),
            BinaryOp::Le => ordering.is_le(),
            BinaryOp::Gt => ordering.is_gt(),
            BinaryOp::Ge => ordering.is_ge(),
            _ => unreachable!(),
        }
        .into());
    }

    if let (Value::String(lhs), Value::String(rhs), BinaryOp::Add) = (lhs, rhs, op) {
        return Ok(Value::String(format!("{lhs}{rhs}")));
    }

    match (lhs, rhs) {
        (Value::F64(_), _) | (_, Value::F64(_)) => {
            let (Some(l), Some(r)) = (lhs.to_f64(), rhs.to_f64()) else {
                return Err(arithmetic_error(op, lhs, rhs));
            };
            Ok(Value::F64(match op {
                BinaryOp::Add => l + r,
                BinaryOp::Sub => l - r,
                BinaryOp::Mul => l * r,
                BinaryOp::Div => l / r,
                BinaryOp::Mod => l % r,
                _ => return Err(arithmetic_error(op, lhs, rhs)),
            }))
        }
        _ => {
            let (Some(l), Some(r)) = (lhs.to_i64(), rhs.to_i64()) else {
                return Err(arithmetic_error(op, lhs, rhs));
            };
            let result = match op {
                BinaryOp::Add => l.checked_add(r),
                BinaryOp::Sub => l.checked_sub(r),
                BinaryOp::Mul => l.checked_mul(r),
                BinaryOp::Div => l.checked_div(r),
                BinaryOp::Mod => l.checked_rem(r),
                _ => None,
            }
            .ok_or_else(|| arithmetic_error(op, lhs, rhs))?;

            if matches!((lhs, rhs), (Value::I32(_), Value::I32(_))) {
                Ok(Value::I32(i32::try_from(result)?))
            } else {
                Ok(Value::I64(result))
            }
        }
    }
}

fn arithmetic_error(op: BinaryOp, lhs: &Value, rhs: &Value) -> Error {
    Error::expression_evaluation_failed(format!("cannot evaluate {lhs} {op} {rhs}"))
}

fn cast_value(value: Value, ty: &Type) -> Result<Value> {
    Ok(match (value, ty) {
        (Value::Null, _) => Value::Null,
        (value @ Value::I32(_), Type::I64) | (value @ Value::I64(_), Type::I64) => {
            Value::I64(value.to_i64().unwrap_or_default())
        }
        (Value::I64(v), Type::I32) => Value::I32(i32::try_from(v)?),
        (Value::F64(v), Type::I32) => Value::I32(v as i32),
        (Value::F64(v), Type::I64) => Value::I64(v as i64),
        (value, Type::F64) if value.to_f64().is_some() => {
            Value::F64(value.to_f64().unwrap_or_default())
        }
        (Value::String(v), Type::String) => Value::String(v),
        (value, Type::String) => Value::String(value.to_string()),
        (value, ty) if value.infer_ty() == *ty => value,
        (value, ty) => {
            return Err(Error::expression_evaluation_failed(format!(
                "cannot cast {value} to {ty}"
            )))
        }
    })
}

fn aggregate(name: &str, items: Vec<Value>, ty: &Type) -> Result<Value> {
    match name {
        "Count" => Ok(Value::I32(i32::try_from(items.len())?)),
        "BigCount" => Ok(Value::I64(i64::try_from(items.len())?)),
        "Sum" | "Min" | "Max" | "Avg" => {
            let values: Vec<Value> = items.into_iter().filter(|item| !item.is_null()).collect();
            if values.is_empty() {
                return Ok(Value::Null);
            }

            match name {
                "Min" | "Max" => {
                    let mut best = values[0].clone();
                    for value in &values[1..] {
                        let ordering = value.compare(&best).unwrap_or(Ordering::Equal);
                        if (name == "Min" && ordering.is_lt()) || (name == "Max" && ordering.is_gt())
                        {
                            best = value.clone();
                        }
                    }
                    Ok(best)
                }
                "Sum" if ty.is_integer() => {
                    let mut total = 0i64;
                    for value in &values {
                        total += value.to_i64().unwrap_or_default();
                    }
                    cast_value(Value::I64(total), ty)
                }
                _ => {
                    let total: f64 = values.iter().filter_map(Value::to_f64).sum();
                    if name == "Avg" {
                        Ok(Value::F64(total / values.len() as f64))
                    } else {
                        Ok(Value::F64(total))
                    }
                }
            }
        }
        _ => Err(Error::expression_evaluation_failed(format!(
            "unknown aggregate `{name}`"
        ))),
    }
}

fn scalar_function(name: &str, args: &[Value]) -> Result<Value> {
    let str_arg = |i: usize| -> Result<&str> {
        args.get(i).and_then(Value::as_str).ok_or_else(|| {
            Error::expression_evaluation_failed(format!("`{name}` expects a string argument"))
        })
    };
    let int_arg = |i: usize| -> Result<i64> {
        args.get(i).and_then(Value::to_i64).ok_or_else(|| {
            Error::expression_evaluation_failed(format!("`{name}` expects an integer argument"))
        })
    };

    Ok(match name {
        "Concat" => Value::String(format!("{}{}", str_arg(0)?, str_arg(1)?)),
        "Contains" => str_arg(0)?.contains(str_arg(1)?).into(),
        "EndsWith" => str_arg(0)?.ends_with(str_arg(1)?).into(),
        "IndexOf" => {
            // 1-based, 0 when absent
            let target = str_arg(1)?;
            let position = match target.find(str_arg(0)?) {
                Some(byte) => i32::try_from(target[..byte].chars().count())? + 1,
                None => 0,
            };
            Value::I32(position)
        }
        "Length" => Value::I32(i32::try_from(str_arg(0)?.chars().count())?),
        "LTrim" => Value::String(str_arg(0)?.trim_start().to_string()),
        "Replace" => Value::String(str_arg(0)?.replace(str_arg(1)?, str_arg(2)?)),
        "Reverse" => Value::String(str_arg(0)?.chars().rev().collect()),
        "RTrim" => Value::String(str_arg(0)?.trim_end().to_string()),
        "StartsWith" => str_arg(0)?.starts_with(str_arg(1)?).into(),
        "Substring" => {
            let start = usize::try_from((int_arg(1)? - 1).max(0))?;
            let len = usize::try_from(int_arg(2)?.max(0))?;
            Value::String(str_arg(0)?.chars().skip(start).take(len).collect())
        }
        "ToLower" => Value::String(str_arg(0)?.to_lowercase()),
        "ToUpper" => Value::String(str_arg(0)?.to_uppercase()),
        "Trim" => Value::String(str_arg(0)?.trim().to_string()),
        "Left" => {
            let len = usize::try_from(int_arg(1)?.max(0))?;
            Value::String(str_arg(0)?.chars().take(len).collect())
        }
        "Right" => {
            let string = str_arg(0)?;
            let len = usize::try_from(int_arg(1)?.max(0))?;
            let skip = string.chars().count().saturating_sub(len);
            Value::String(string.chars().skip(skip).collect())
        }
        "NewGuid" => Value::Guid(Uuid::new_v4()),
        "Year" | "Month" | "Day" | "Hour" | "Minute" | "Second" => {
            let Some(Value::DateTime(micros)) = args.first() else {
                return Err(Error::expression_evaluation_failed(format!(
                    "`{name}` expects a date"
                )));
            };
            Value::I32(i32::try_from(date_part(name, *micros))?)
        }
        "Ceiling" | "Floor" | "Round" | "Truncate" => match &args[0] {
            Value::F64(v) => Value::F64(match name {
                "Ceiling" => v.ceil(),
                "Floor" => v.floor(),
                "Round" => v.round(),
                _ => v.trunc(),
            }),
            value @ (Value::I32(_) | Value::I64(_)) => value.clone(),
            value => {
                return Err(Error::expression_evaluation_failed(format!(
                    "`{name}` expects a number, got {value}"
                )))
            }
        },
        "Power" => {
            let float_arg = |i: usize| {
                args[i].to_f64().ok_or_else(|| {
                    Error::expression_evaluation_failed("`Power` expects numbers")
                })
            };
            Value::F64(float_arg(0)?.powf(float_arg(1)?))
        }
        "Abs" => match &args[0] {
            Value::I32(v) => Value::I32(v.abs()),
            Value::I64(v) => Value::I64(v.abs()),
            Value::F64(v) => Value::F64(v.abs()),
            value => {
                return Err(Error::expression_evaluation_failed(format!(
                    "`Abs` expects a number, got {value}"
                )))
            }
        },
        "BitwiseAnd" => Value::I64(int_arg(0)? & int_arg(1)?),
        "BitwiseOr" => Value::I64(int_arg(0)? | int_arg(1)?),
        "BitwiseXor" => Value::I64(int_arg(0)? ^ int_arg(1)?),
        "BitwiseNot" => Value::I64(!int_arg(0)?),
        _ => {
            return Err(Error::expression_evaluation_failed(format!(
                "canonical function `{name}` has no client-side evaluation"
            )))
        }
    })
}

/// Component `name` of a timestamp in microseconds since the Unix epoch.
fn date_part(name: &str, micros: i64) -> i64 {
    let seconds = micros.div_euclid(1_000_000);
    let days = seconds.div_euclid(86_400);
    let time = seconds.rem_euclid(86_400);

    // Civil from days, with March as the first month of the year
    let days = days + 719_468;
    let era = days.div_euclid(146_097);
    let day_of_era = days - era * 146_097;
    let year_of_era =
        (day_of_era - day_of_era / 1_460 + day_of_era / 36_524 - day_of_era / 146_096) / 365;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    let month_index = (5 * day_of_year + 2) / 153;
    let day = day_of_year - (153 * month_index + 2) / 5 + 1;
    let month = if month_index < 10 { month_index + 3 } else { month_index - 9 };
    let year = year_of_era + era * 400 + i64::from(month <= 2);

    match name {
        "Year" => year,
        "Month" => month,
        "Day" => day,
        "Hour" => time / 3_600,
        "Minute" => time % 3_600 / 60,
        _ => time % 60,
    }
}

fn like_match(input: &str, pattern: &str, escape: Option<char>) -> bool {
    enum Token {
        Any,
        One,
        Char(char),
    }

    let mut tokens = vec![];
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            c if Some(c) == escape => match chars.next() {
                Some(next) => Token::Char(next),
                None => Token::Char(c),
            },
            '%' => Token::Any,
            '_' => Token::One,
            c => Token::Char(c),
        });
    }

    let input: Vec<char> = input.chars().collect();

    // matches[i][j]: input[..i] matches tokens[..j]
    let mut matches = vec![vec![false; tokens.len() + 1]; input.len() + 1];
    matches[0][0] = true;
    for j in 1..=tokens.len() {
        matches[0][j] = matches[0][j - 1] && matches!(tokens[j - 1], Token::Any);
    }

    for i in 1..=input.len() {
        for j in 1..=tokens.len() {
            matches[i][j] = match tokens[j - 1] {
                Token::Any => matches[i][j - 1] || matches[i - 1][j],
                Token::One => matches[i - 1][j - 1],
                Token::Char(c) => matches[i - 1][j - 1] && input[i - 1] == c,
            };
        }
    }

    matches[input.len()][tokens.len()]
}

#[cfg(test)]
mod tests {
    use super::{date_part, like_match};

    #[test]
    fn date_parts() {
        // 2024-02-29 13:45:30
        let micros = 1_709_214_330_000_000;
        assert_eq!(date_part("Year", micros), 2024);
        assert_eq!(date_part("Month", micros), 2);
        assert_eq!(date_part("Day", micros), 29);
        assert_eq!(date_part("Hour", micros), 13);
        assert_eq!(date_part("Minute", micros), 45);
        assert_eq!(date_part("Second", micros), 30);

        assert_eq!(date_part("Year", -1), 1969);
        assert_eq!(date_part("Day", -1), 31);
    }

    #[test]
    fn like_wildcards() {
        assert!(like_match("widget", "wid%", None));
        assert!(like_match("widget", "%dge%", None));
        assert!(like_match("widget", "w_dget", None));
        assert!(!like_match("widget", "w_get", None));
    }

    #[test]
    fn like_escape_makes_wildcard_literal() {
        assert!(like_match("50%", "50~%", Some('~')));
        assert!(!like_match("500", "50~%", Some('~')));
        assert!(like_match("a_b", "a~_b", Some('~')));
    }
}

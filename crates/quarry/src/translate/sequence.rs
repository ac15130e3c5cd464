//! Query operators.
//!
//! Every relational operator is built through the
//! [`OrderLifter`](crate::lift::OrderLifter), so an order established earlier
//! in the query survives wherever the algebra allows it.

use super::{
    construct::initialized_row, members::count, TranslationContext, TranslationState,
};
use indexmap::IndexMap;
use quarry_core::{
    algebra::{
        self, ApplyKind, Binding, ExprApply, ExprGroupBy, InitializerKind, JoinKind, SetOp,
        SortKey, Type, Value,
    },
    ast::{Ast, Expr, ExprCall, MergeOption, NodeId},
    schema::HostType,
    Error, Result,
};
use std::sync::LazyLock;
use tracing::trace;

/// Translates one query operator call.
pub(super) type Rule = fn(
    TranslationContext<'_>,
    &mut TranslationState,
    NodeId,
    &ExprCall,
) -> Result<algebra::Expr>;

static OPERATORS: LazyLock<IndexMap<&'static str, Rule>> = LazyLock::new(|| {
    let mut rules = IndexMap::<&'static str, Rule>::new();

    rules.insert("Where", filter);
    rules.insert("Select", select);
    rules.insert("SelectMany", select_many);

    rules.insert("OrderBy", order_by);
    rules.insert("OrderByDescending", order_by_descending);
    rules.insert("ThenBy", then_by);
    rules.insert("ThenByDescending", then_by_descending);
    rules.insert("Take", take);
    rules.insert("Skip", skip);

    rules.insert("Distinct", distinct);
    rules.insert("Union", union);
    rules.insert("Concat", concat);
    rules.insert("Intersect", intersect);
    rules.insert("Except", except);
    rules.insert("OfType", of_type);
    rules.insert("Cast", cast);

    rules.insert("GroupBy", group_by);
    rules.insert("Join", join);
    rules.insert("GroupJoin", group_join);

    rules.insert("Count", count_rule);
    rules.insert("LongCount", long_count);
    rules.insert("Sum", sum);
    rules.insert("Min", min);
    rules.insert("Max", max);
    rules.insert("Average", average);

    rules.insert("Any", any);
    rules.insert("All", all);
    rules.insert("Contains", contains);

    rules.insert("First", element_operator);
    rules.insert("FirstOrDefault", element_operator);
    rules.insert("Single", element_operator);
    rules.insert("SingleOrDefault", element_operator);
    rules.insert("DefaultIfEmpty", default_if_empty);

    rules.insert("AsQueryable", passthrough);
    rules.insert("AsEnumerable", passthrough);
    rules.insert("Include", include);
    rules.insert("MergeAs", merge_as);

    rules
});

/// The rule for the query operator `name`.
pub(super) fn operator(name: &str) -> Option<Rule> {
    OPERATORS.get(name).copied()
}

/// The elements of a collection-valued expression.
///
/// Groupings and one-to-many navigations translate to rows that carry their
/// elements in a field; operators over them read that field.
pub(super) fn elements(expr: algebra::Expr) -> algebra::Expr {
    let field = match expr.ty() {
        Type::Row(row) => match row.initializer.as_deref().map(|initializer| &initializer.kind) {
            Some(InitializerKind::Grouping) => "Group",
            Some(InitializerKind::EntityCollection { .. }) => "Elements",
            _ => return expr,
        },
        _ => return expr,
    };

    algebra::Expr::field(expr, field)
}

fn collection(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    id: NodeId,
) -> Result<algebra::Expr> {
    Ok(elements(cx.translate(state, id)?))
}

fn bind_collection(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    id: NodeId,
) -> Result<Binding> {
    let collection = collection(cx, state, id)?;
    Ok(state.bind(collection))
}

/// The collection, filtered by `predicate` when there is one.
fn filtered(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    source: NodeId,
    predicate: Option<NodeId>,
) -> Result<algebra::Expr> {
    let Some(predicate) = predicate else {
        return collection(cx, state, source);
    };

    let input = bind_collection(cx, state, source)?;
    let predicate = cx.apply_lambda(state, predicate, vec![input.var_ref()])?;
    Ok(state.lifter.filter(input, predicate))
}

/// The collection, projected through `selector` when there is one.
fn selected(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    source: NodeId,
    selector: Option<NodeId>,
) -> Result<algebra::Expr> {
    let Some(selector) = selector else {
        return collection(cx, state, source);
    };

    let input = bind_collection(cx, state, source)?;
    let projection = cx.apply_lambda(state, selector, vec![input.var_ref()])?;
    Ok(state.lifter.project(input, projection))
}

fn arity(call: &ExprCall) -> Error {
    Error::unsupported_construct(format!(
        "`{}` with {} arguments",
        call.method,
        call.args.len()
    ))
}

/// The constant string argument of `Include` and `MergeAs`.
fn constant_str<'a>(ast: &'a Ast, call: &ExprCall, id: NodeId) -> Result<&'a str> {
    ast.expr(id)
        .as_constant()
        .and_then(Value::as_str)
        .ok_or_else(|| {
            Error::unsupported_construct(format!(
                "`{}` with an argument that is not a constant string",
                call.method
            ))
        })
}

// ===== Projection and filtering =====

fn filter(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    id: NodeId,
    call: &ExprCall,
) -> Result<algebra::Expr> {
    let &[source, predicate] = &call.args[..] else {
        return Err(arity(call));
    };

    let ret = filtered(cx, state, source, Some(predicate))?;
    state.spans.propagate(source, id);
    Ok(ret)
}

fn select(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    id: NodeId,
    call: &ExprCall,
) -> Result<algebra::Expr> {
    let &[source, selector] = &call.args[..] else {
        return Err(arity(call));
    };

    let input = bind_collection(cx, state, source)?;
    let projection = cx.apply_lambda(state, selector, vec![input.var_ref()])?;

    // Eager loading survives only when the elements are returned as is
    if projection.is_var(&input.var) {
        state.spans.propagate(source, id);
    }

    Ok(state.lifter.project(input, projection))
}

fn select_many(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    _id: NodeId,
    call: &ExprCall,
) -> Result<algebra::Expr> {
    let (source, selector, result) = match call.args[..] {
        [source, selector] => (source, selector, None),
        [source, selector, result] => (source, selector, Some(result)),
        _ => return Err(arity(call)),
    };

    let input = bind_collection(cx, state, source)?;
    let (kind, applied) = cx.in_scope(state, selector, vec![input.var_ref()], |cx, state, body| {
        // `x => x.Items.DefaultIfEmpty()` keeps elements with no items
        match default_if_empty_source(cx.ast, body) {
            Some(inner) => Ok((ApplyKind::Outer, collection(cx, state, inner)?)),
            None => Ok((ApplyKind::Cross, collection(cx, state, body)?)),
        }
    })?;

    let apply = state.bind(applied);
    let (outer, inner) = (input.var.clone(), apply.var.clone());
    let pairs = state.bind(ExprApply { kind, input, apply }.into());
    let pair = pairs.var_ref();

    let projection = match result {
        Some(result) => cx.apply_lambda(
            state,
            result,
            vec![
                algebra::Expr::field(pair.clone(), &outer),
                algebra::Expr::field(pair, &inner),
            ],
        )?,
        None => algebra::Expr::field(pair, &inner),
    };

    Ok(state.lifter.project(pairs, projection))
}

fn default_if_empty_source(ast: &Ast, id: NodeId) -> Option<NodeId> {
    match ast.expr(id) {
        Expr::Call(call)
            if call.method.is_sequence_operator()
                && call.method.name == "DefaultIfEmpty"
                && call.args.len() == 1 =>
        {
            Some(call.args[0])
        }
        _ => None,
    }
}

// ===== Ordering and paging =====

fn order_by(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    id: NodeId,
    call: &ExprCall,
) -> Result<algebra::Expr> {
    order(cx, state, id, call, true)
}

fn order_by_descending(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    id: NodeId,
    call: &ExprCall,
) -> Result<algebra::Expr> {
    order(cx, state, id, call, false)
}

fn then_by(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    id: NodeId,
    call: &ExprCall,
) -> Result<algebra::Expr> {
    order(cx, state, id, call, true)
}

fn then_by_descending(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    id: NodeId,
    call: &ExprCall,
) -> Result<algebra::Expr> {
    order(cx, state, id, call, false)
}

fn order(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    id: NodeId,
    call: &ExprCall,
    ascending: bool,
) -> Result<algebra::Expr> {
    let &[source, key] = &call.args[..] else {
        return Err(arity(call));
    };

    let input = bind_collection(cx, state, source)?;
    let key = SortKey {
        expr: cx.apply_lambda(state, key, vec![input.var_ref()])?,
        ascending,
    };
    state.spans.propagate(source, id);

    if call.method.name.starts_with("ThenBy") {
        state.lifter.then_by(input, vec![key], &call.method.name)
    } else {
        Ok(state.lifter.sort(input, vec![key]))
    }
}

fn take(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    id: NodeId,
    call: &ExprCall,
) -> Result<algebra::Expr> {
    let &[source, count] = &call.args[..] else {
        return Err(arity(call));
    };

    let input = collection(cx, state, source)?;
    let count = cx.translate(state, count)?;
    state.spans.propagate(source, id);
    Ok(state.lifter.limit(input, count))
}

fn skip(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    id: NodeId,
    call: &ExprCall,
) -> Result<algebra::Expr> {
    let &[source, count] = &call.args[..] else {
        return Err(arity(call));
    };

    let input = collection(cx, state, source)?;
    let count = cx.translate(state, count)?;
    state.spans.propagate(source, id);
    state.lifter.skip(input, count)
}

// ===== Set operations =====

fn distinct(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    id: NodeId,
    call: &ExprCall,
) -> Result<algebra::Expr> {
    let &[source] = &call.args[..] else {
        return Err(arity(call));
    };

    let input = collection(cx, state, source)?;
    state.spans.propagate(source, id);
    Ok(state.lifter.distinct(input))
}

fn union(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    id: NodeId,
    call: &ExprCall,
) -> Result<algebra::Expr> {
    let union_all = set_op(cx, state, id, call, SetOp::UnionAll)?;
    Ok(state.lifter.distinct(union_all))
}

fn concat(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    id: NodeId,
    call: &ExprCall,
) -> Result<algebra::Expr> {
    set_op(cx, state, id, call, SetOp::UnionAll)
}

fn intersect(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    id: NodeId,
    call: &ExprCall,
) -> Result<algebra::Expr> {
    set_op(cx, state, id, call, SetOp::Intersect)
}

fn except(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    id: NodeId,
    call: &ExprCall,
) -> Result<algebra::Expr> {
    set_op(cx, state, id, call, SetOp::Except)
}

fn set_op(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    id: NodeId,
    call: &ExprCall,
    op: SetOp,
) -> Result<algebra::Expr> {
    let &[lhs, rhs] = &call.args[..] else {
        return Err(arity(call));
    };

    let lhs_expr = collection(cx, state, lhs)?;

    if op == SetOp::Except {
        // Elements of the right side are never returned
        let rhs_expr = collection(cx.suppressing_includes(), state, rhs)?;
        state.spans.propagate(lhs, id);
        return Ok(state.lifter.set_op(op, lhs_expr, rhs_expr));
    }

    let rhs_expr = collection(cx, state, rhs)?;
    state.spans.merge(lhs, rhs, id);
    Ok(state.lifter.set_op(op, lhs_expr, rhs_expr))
}

fn of_type(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    id: NodeId,
    call: &ExprCall,
) -> Result<algebra::Expr> {
    let &[source] = &call.args[..] else {
        return Err(arity(call));
    };

    let target = element_host_type(cx.ast, id)?;
    let ty = cx.type_test_target(target)?;
    let input = collection(cx, state, source)?;
    state.spans.propagate(source, id);
    Ok(state.lifter.of_type(input, ty))
}

fn cast(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    id: NodeId,
    call: &ExprCall,
) -> Result<algebra::Expr> {
    let &[source] = &call.args[..] else {
        return Err(arity(call));
    };

    let target = element_host_type(cx.ast, id)?;
    let input = bind_collection(cx, state, source)?;

    let projection = if target.non_nullable().is_nominal() {
        algebra::Expr::treat(input.var_ref(), cx.type_test_target(target)?)
    } else {
        let ty = cx.algebra_type(target)?;
        if ty == input.element_ty() {
            return Ok(*input.expr);
        }
        algebra::Expr::cast(input.var_ref(), ty)
    };

    Ok(state.lifter.project(input, projection))
}

fn element_host_type(ast: &Ast, id: NodeId) -> Result<&HostType> {
    ast.ty(id).element().ok_or_else(|| {
        Error::unsupported_construct(format!("a query operator of type `{}`", ast.ty(id)))
    })
}

// ===== Grouping and joins =====

fn group_by(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    _id: NodeId,
    call: &ExprCall,
) -> Result<algebra::Expr> {
    let (source, key, element, result) = match call.args[..] {
        [source, key] => (source, key, None, None),
        [source, key, result] if cx.lambda_arity(result) == 2 => (source, key, None, Some(result)),
        [source, key, element] => (source, key, Some(element), None),
        [source, key, element, result] => (source, key, Some(element), Some(result)),
        _ => return Err(arity(call)),
    };

    let grouping_ty = HostType::grouping(
        lambda_type(cx.ast, key),
        match element {
            Some(element) => lambda_type(cx.ast, element),
            None => element_host_type(cx.ast, source)?.clone(),
        },
    );

    let input = bind_collection(cx, state, source)?;
    let key = cx.apply_lambda(state, key, vec![input.var_ref()])?;

    let group_var = state.alias();
    let member = algebra::Expr::var(&group_var, input.element_ty());
    let group = match element {
        Some(element) => cx.apply_lambda(state, element, vec![member])?,
        None => member,
    };

    let grouped = state.bind(
        ExprGroupBy {
            input,
            group_var,
            keys: vec![("Key".to_string(), key)],
            group: Some(("Group".to_string(), Box::new(group))),
        }
        .into(),
    );
    let row = grouped.var_ref();
    let groups = initialized_row(
        state,
        grouping_ty,
        InitializerKind::Grouping,
        vec![
            ("Key".to_string(), algebra::Expr::field(row.clone(), "Key")),
            ("Group".to_string(), algebra::Expr::field(row, "Group")),
        ],
    )?;
    let groups = state.lifter.project(grouped, groups);

    let Some(result) = result else {
        return Ok(groups);
    };

    let input = state.bind(groups);
    let grouping = input.var_ref();
    let projection = cx.apply_lambda(
        state,
        result,
        vec![algebra::Expr::field(grouping.clone(), "Key"), grouping],
    )?;
    Ok(state.lifter.project(input, projection))
}

fn lambda_type(ast: &Ast, id: NodeId) -> HostType {
    ast.lambda_body_type(id).cloned().unwrap_or(HostType::Object)
}

fn join(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    _id: NodeId,
    call: &ExprCall,
) -> Result<algebra::Expr> {
    let &[outer, inner, outer_key, inner_key, result] = &call.args[..] else {
        return Err(arity(call));
    };

    let left = bind_collection(cx, state, outer)?;
    let right = bind_collection(cx, state, inner)?;
    let left_key = cx.apply_lambda(state, outer_key, vec![left.var_ref()])?;
    let right_key = cx.apply_lambda(state, inner_key, vec![right.var_ref()])?;
    let condition = cx.key_equals(left_key, right_key)?;

    let (left_var, right_var) = (left.var.clone(), right.var.clone());
    let joined = state.bind(algebra::Expr::join(JoinKind::Inner, left, right, condition));
    let row = joined.var_ref();

    let projection = cx.apply_lambda(
        state,
        result,
        vec![
            algebra::Expr::field(row.clone(), &left_var),
            algebra::Expr::field(row, &right_var),
        ],
    )?;
    Ok(state.lifter.project(joined, projection))
}

fn group_join(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    _id: NodeId,
    call: &ExprCall,
) -> Result<algebra::Expr> {
    let &[outer, inner, outer_key, inner_key, result] = &call.args[..] else {
        return Err(arity(call));
    };

    let left = bind_collection(cx, state, outer)?;
    let left_key = cx.apply_lambda(state, outer_key, vec![left.var_ref()])?;
    let right = bind_collection(cx, state, inner)?;
    let right_key = cx.apply_lambda(state, inner_key, vec![right.var_ref()])?;

    // Correlated on the outer element
    let matches = state.lifter.filter(right, cx.key_equals(left_key, right_key)?);
    let pair = algebra::Expr::row(vec![
        ("Outer".to_string(), left.var_ref()),
        ("Inner".to_string(), matches),
    ]);
    let pairs = state.lifter.project(left, pair);

    let input = state.bind(pairs);
    let pair = input.var_ref();
    let projection = cx.apply_lambda(
        state,
        result,
        vec![
            algebra::Expr::field(pair.clone(), "Outer"),
            algebra::Expr::field(pair, "Inner"),
        ],
    )?;
    Ok(state.lifter.project(input, projection))
}

// ===== Aggregates =====

fn count_rule(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    _id: NodeId,
    call: &ExprCall,
) -> Result<algebra::Expr> {
    let collection = match call.args[..] {
        [source] => filtered(cx, state, source, None)?,
        [source, predicate] => filtered(cx, state, source, Some(predicate))?,
        _ => return Err(arity(call)),
    };
    Ok(count(state, collection, "Count", Type::I32))
}

fn long_count(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    _id: NodeId,
    call: &ExprCall,
) -> Result<algebra::Expr> {
    let collection = match call.args[..] {
        [source] => filtered(cx, state, source, None)?,
        [source, predicate] => filtered(cx, state, source, Some(predicate))?,
        _ => return Err(arity(call)),
    };
    Ok(count(state, collection, "BigCount", Type::I64))
}

fn sum(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    id: NodeId,
    call: &ExprCall,
) -> Result<algebra::Expr> {
    aggregate(cx, state, id, call, "Sum")
}

fn min(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    id: NodeId,
    call: &ExprCall,
) -> Result<algebra::Expr> {
    aggregate(cx, state, id, call, "Min")
}

fn max(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    id: NodeId,
    call: &ExprCall,
) -> Result<algebra::Expr> {
    aggregate(cx, state, id, call, "Max")
}

fn average(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    id: NodeId,
    call: &ExprCall,
) -> Result<algebra::Expr> {
    aggregate(cx, state, id, call, "Avg")
}

fn aggregate(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    id: NodeId,
    call: &ExprCall,
    name: &str,
) -> Result<algebra::Expr> {
    let collection = match call.args[..] {
        [source] => selected(cx, state, source, None)?,
        [source, selector] => selected(cx, state, source, Some(selector))?,
        _ => return Err(arity(call)),
    };
    Ok(algebra::Expr::aggregate(name, collection, cx.node_type(id)?))
}

// ===== Quantifiers =====

fn any(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    _id: NodeId,
    call: &ExprCall,
) -> Result<algebra::Expr> {
    let collection = match call.args[..] {
        [source] => filtered(cx, state, source, None)?,
        [source, predicate] => filtered(cx, state, source, Some(predicate))?,
        _ => return Err(arity(call)),
    };
    Ok(algebra::Expr::exists(collection))
}

/// `All(p)` holds when no element fails `p`. An unknown `p` counts as a
/// failure.
fn all(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    _id: NodeId,
    call: &ExprCall,
) -> Result<algebra::Expr> {
    let &[source, predicate] = &call.args[..] else {
        return Err(arity(call));
    };

    let input = bind_collection(cx, state, source)?;
    let predicate = cx.apply_lambda(state, predicate, vec![input.var_ref()])?;
    let fails = algebra::Expr::or(
        algebra::Expr::not(predicate.clone()),
        algebra::Expr::is_null(predicate),
    );
    Ok(algebra::Expr::not(algebra::Expr::exists(
        state.lifter.filter(input, fails),
    )))
}

fn contains(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    _id: NodeId,
    call: &ExprCall,
) -> Result<algebra::Expr> {
    let &[source, value] = &call.args[..] else {
        return Err(arity(call));
    };

    let collection = collection(cx, state, source)?;
    let value = cx.translate(state, value)?;

    let items = match collection {
        algebra::Expr::Value(Value::List(items)) => {
            items.into_iter().map(algebra::Expr::Value).collect()
        }
        algebra::Expr::Collection(collection) => collection.elements,
        collection => {
            let input = state.bind(collection);
            let predicate = cx.equals(input.var_ref(), value)?;
            return Ok(algebra::Expr::exists(state.lifter.filter(input, predicate)));
        }
    };

    trace!(items = items.len(), "expanding contains over a constant list");
    let operands = items
        .into_iter()
        .map(|item| cx.equals(item, value.clone()))
        .collect::<Result<Vec<_>>>()?;
    Ok(algebra::Expr::or_all(operands))
}

// ===== Element operators =====

/// `First`, `Single`, and their `OrDefault` forms.
///
/// At the root of the query they become a limit: one row for `First`, two
/// for `Single` so the caller can detect a second match. Below the root only
/// `FirstOrDefault` is supported.
fn element_operator(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    id: NodeId,
    call: &ExprCall,
) -> Result<algebra::Expr> {
    let name = call.method.name.as_str();
    let (source, predicate) = match call.args[..] {
        [source] => (source, None),
        [source, predicate] => (source, Some(predicate)),
        _ => return Err(arity(call)),
    };

    let is_root = id == cx.root;
    if !is_root && name != "FirstOrDefault" {
        return Err(Error::unsupported_nested(name));
    }

    let collection = filtered(cx, state, source, predicate)?;

    if is_root {
        let count = if name.starts_with("Single") { 2 } else { 1 };
        state.spans.propagate(source, id);
        return Ok(state.lifter.limit(collection, algebra::Expr::from(count)));
    }

    let element = algebra::Expr::element(state.lifter.limit(collection, algebra::Expr::from(1)));
    Ok(match default_value(cx.ast.ty(id)) {
        Some(default) => algebra::Expr::case(
            algebra::Expr::is_null(element.clone()),
            default,
            element,
        ),
        None => element,
    })
}

/// The value `FirstOrDefault` yields for an empty input, for types whose
/// default is not null.
fn default_value(ty: &HostType) -> Option<Value> {
    Some(match ty {
        HostType::Bool => Value::Bool(false),
        HostType::I32 => Value::I32(0),
        HostType::I64 => Value::I64(0),
        HostType::F64 => Value::F64(0.0),
        HostType::Guid => Value::Guid(uuid::Uuid::nil()),
        HostType::DateTime => Value::DateTime(0),
        _ => return None,
    })
}

/// A left outer join of a one-row sentinel with the input: the input's
/// elements, or a single null when it is empty.
fn default_if_empty(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    _id: NodeId,
    call: &ExprCall,
) -> Result<algebra::Expr> {
    let &[source] = &call.args[..] else {
        return Err(arity(call));
    };

    let sentinel = state.bind(algebra::Expr::collection(vec![true.into()], Type::Bool));
    let input = bind_collection(cx, state, source)?;
    let var = input.var.clone();

    let joined = state.bind(algebra::Expr::join(JoinKind::LeftOuter, sentinel, input, true));
    let row = joined.var_ref();
    Ok(state.lifter.project(joined, algebra::Expr::field(row, &var)))
}

// ===== Passthroughs =====

fn passthrough(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    id: NodeId,
    call: &ExprCall,
) -> Result<algebra::Expr> {
    let &[source] = &call.args[..] else {
        return Err(arity(call));
    };

    let ret = cx.translate(state, source)?;
    state.spans.propagate(source, id);
    Ok(ret)
}

fn include(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    id: NodeId,
    call: &ExprCall,
) -> Result<algebra::Expr> {
    let &[source, path] = &call.args[..] else {
        return Err(arity(call));
    };

    let path = constant_str(cx.ast, call, path)?;
    let ret = cx.translate(state, source)?;

    if cx.includes_suppressed() {
        state.spans.propagate(source, id);
    } else {
        trace!(path, "including");
        state.spans.include(source, id, path);
    }

    Ok(ret)
}

fn merge_as(
    cx: TranslationContext<'_>,
    state: &mut TranslationState,
    id: NodeId,
    call: &ExprCall,
) -> Result<algebra::Expr> {
    let &[source, option] = &call.args[..] else {
        return Err(arity(call));
    };

    let name = constant_str(cx.ast, call, option)?;
    let option = MergeOption::from_name(name)
        .ok_or_else(|| Error::unsupported_construct(format!("merge option `{name}`")))?;

    let ret = cx.translate(state, source)?;
    state.merge_option = Some(option);
    state.spans.propagate(source, id);
    Ok(ret)
}

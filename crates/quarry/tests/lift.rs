mod support;

use pretty_assertions::assert_eq;
use quarry::{
    algebra::{Binding, Eval, Expr, SetOp, SortKey, Type, Value},
    lift::{OrderLifter, Shape},
};
use support::*;

fn product_ty() -> Type {
    Type::Entity("Product".into())
}

/// `Products as <var>`
fn scan(var: &str) -> Binding {
    Binding::new(var, Expr::scan("Products", product_ty()))
}

fn prop(input: &Binding, name: &str, ty: Type) -> Expr {
    Expr::property(input.var_ref(), name, ty)
}

/// `sort(Products as a, a.Created desc)`
fn by_created_desc() -> Expr {
    let a = scan("a");
    let key = SortKey::desc(prop(&a, "Created", Type::DateTime));
    Expr::sort(a, vec![key])
}

/// `skip(Products as a, a.Id asc, 1)`
fn skip_first() -> Expr {
    let a = scan("a");
    let key = SortKey::asc(prop(&a, "Id", Type::I32));
    Expr::skip(a, vec![key], 1)
}

/// `project(<ordered> as w, w.Name)`
fn names_of(ordered: Expr) -> Expr {
    let w = Binding::new("w", ordered);
    let name = prop(&w, "Name", Type::String);
    Expr::project(w, name)
}

/// `x.Active` over an entity input bound to `x`
fn filter_active(input: Expr) -> Expr {
    let x = Binding::new("x", input);
    let active = Expr::eq(prop(&x, "Active", Type::Bool), true);
    OrderLifter::new().filter(x, active)
}

/// `x != <name>` over a string input bound to `x`
fn filter_name_ne(input: Expr, name: &str) -> Expr {
    let x = Binding::new("x", input);
    let ne = Expr::ne(Expr::var("x", Type::String), name);
    OrderLifter::new().filter(x, ne)
}

/// Evaluates with unordered operators reversing their output.
fn eval(expr: &Expr) -> Value {
    let tables = tables();
    Eval::new(&tables)
        .reorder_unordered(true)
        .eval(expr)
        .unwrap()
}

// ---------------------------------------------------------------------------
// Shapes
// ---------------------------------------------------------------------------

#[test]
fn classifies_ordered_inputs() {
    let limit = |input| Expr::limit(input, 2);

    let cases = [
        (by_created_desc(), Shape::Sort),
        (skip_first(), Shape::Skip),
        (limit(Expr::scan("Products", product_ty())), Shape::Limit),
        (names_of(by_created_desc()), Shape::SortProject),
        (names_of(skip_first()), Shape::SkipProject),
        (limit(by_created_desc()), Shape::SortLimit),
        (limit(skip_first()), Shape::SkipLimit),
        (names_of(limit(by_created_desc())), Shape::SortLimitProject),
        (names_of(limit(skip_first())), Shape::SkipLimitProject),
        (Expr::scan("Products", product_ty()), Shape::Unordered),
    ];

    for (expr, shape) in cases {
        assert_eq!(Shape::of(&expr), shape, "{expr}");
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

#[test]
fn filter_over_sort() {
    let filtered = filter_active(by_created_desc());

    assert_eq!(Shape::of(&filtered), Shape::Sort);
    assert_eq!(ids(eval(&filtered)), vec![4, 3, 1]);
}

#[test]
fn filter_over_skip() {
    let filtered = filter_active(skip_first());

    assert_eq!(Shape::of(&filtered), Shape::Sort);
    assert_eq!(ids(eval(&filtered)), vec![3, 4]);
}

#[test]
fn filter_over_unordered_limit() {
    let filtered = filter_active(Expr::limit(Expr::scan("Products", product_ty()), 3));

    assert!(matches!(filtered, Expr::Filter(_)));

    // No order is promised, so compare as a multiset
    let mut ids = ids(eval(&filtered));
    ids.sort();
    assert_eq!(ids, vec![1, 3]);
}

#[test]
fn filter_over_sort_project() {
    let filtered = filter_name_ne(names_of(by_created_desc()), "cog");

    assert_eq!(Shape::of(&filtered), Shape::SortProject);
    assert_eq!(strings(eval(&filtered)), vec!["anchor", "drill", "bolt"]);
}

#[test]
fn filter_over_skip_project() {
    let filtered = filter_name_ne(names_of(skip_first()), "cog");

    assert_eq!(strings(eval(&filtered)), vec!["anchor", "drill"]);
}

#[test]
fn filter_over_sort_limit() {
    let filtered = filter_active(Expr::limit(by_created_desc(), 3));

    assert_eq!(Shape::of(&filtered), Shape::Sort);
    assert_eq!(ids(eval(&filtered)), vec![4, 3]);
}

#[test]
fn filter_over_skip_limit() {
    let filtered = filter_active(Expr::limit(skip_first(), 2));

    assert_eq!(ids(eval(&filtered)), vec![3]);
}

#[test]
fn filter_over_sort_limit_project() {
    let filtered = filter_name_ne(names_of(Expr::limit(by_created_desc(), 3)), "drill");

    assert_eq!(strings(eval(&filtered)), vec!["anchor", "cog"]);
}

#[test]
fn filter_over_skip_limit_project() {
    let filtered = filter_name_ne(names_of(Expr::limit(skip_first(), 2)), "anchor");

    assert_eq!(strings(eval(&filtered)), vec!["cog"]);
}

// ---------------------------------------------------------------------------
// Other operators
// ---------------------------------------------------------------------------

#[test]
fn type_filter_over_sort_keeps_the_order() {
    let filtered = OrderLifter::new().of_type(by_created_desc(), product_ty());

    assert_eq!(Shape::of(&filtered), Shape::Sort);
    assert_eq!(ids(eval(&filtered)), vec![2, 4, 3, 1]);
}

#[test]
fn project_over_project_composes() {
    let lifter = OrderLifter::new();
    let names = names_of(by_created_desc());
    let y = Binding::new("y", names);
    let projected = lifter.project(
        y,
        Expr::canonical("ToUpper", vec![Expr::var("y", Type::String)], Type::String),
    );

    let Expr::Project(project) = &projected else {
        panic!("expected a projection, got {projected}");
    };
    assert!(matches!(*project.input.expr, Expr::Sort(_)));
    assert_eq!(
        strings(eval(&projected)),
        vec!["ANCHOR", "DRILL", "COG", "BOLT"]
    );
}

#[test]
fn constant_limits_merge() {
    let limited = OrderLifter::new().limit(Expr::limit(by_created_desc(), 3), Expr::from(2));

    let Expr::Limit(limit) = &limited else {
        panic!("expected a limit, got {limited}");
    };
    assert_eq!(limit.count.as_const_i64(), Some(2));
    assert!(matches!(*limit.input, Expr::Sort(_)));
    assert_eq!(ids(eval(&limited)), vec![2, 4]);
}

#[test]
fn limit_moves_below_projection() {
    let limited = OrderLifter::new().limit(names_of(by_created_desc()), Expr::from(2));

    assert_eq!(Shape::of(&limited), Shape::SortLimitProject);
    assert_eq!(strings(eval(&limited)), vec!["anchor", "drill"]);
}

#[test]
fn constant_skips_add_up() {
    let skipped = OrderLifter::new().skip(skip_first(), Expr::from(2)).unwrap();

    let Expr::Skip(skip) = &skipped else {
        panic!("expected a skip, got {skipped}");
    };
    assert_eq!(skip.count.as_const_i64(), Some(3));
    assert_eq!(ids(eval(&skipped)), vec![4]);
}

#[test]
fn skip_after_take() {
    let skipped = OrderLifter::new()
        .skip(Expr::limit(by_created_desc(), 3), Expr::from(1))
        .unwrap();

    assert_eq!(ids(eval(&skipped)), vec![4, 3]);
}

#[test]
fn skip_after_take_with_extreme_counts() {
    let taken = Expr::limit(skip_first(), Expr::from(i64::MIN));

    let skipped = OrderLifter::new()
        .skip(taken, Expr::from(i64::MAX))
        .unwrap();

    let Expr::Limit(limit) = &skipped else {
        panic!("expected a limit, got {skipped}");
    };
    assert_eq!(limit.count.as_const_i64(), Some(0));
    let Expr::Skip(skip) = &*limit.input else {
        panic!("expected a skip, got {}", limit.input);
    };
    assert_eq!(skip.count.as_const_i64(), Some(i64::MAX));
}

#[test]
fn skip_requires_an_order() {
    let err = OrderLifter::new()
        .skip(Expr::scan("Products", product_ty()), Expr::from(1))
        .unwrap_err();

    assert!(err.is_skip_without_order(), "{err}");
}

#[test]
fn then_by_extends_the_sort() {
    let lifter = OrderLifter::new();
    let sorted = Binding::new("s", by_created_desc());
    let key = SortKey::asc(prop(&sorted, "Name", Type::String));

    let Expr::Sort(sort) = lifter.then_by(sorted, vec![key], "ThenBy").unwrap() else {
        panic!("expected a sort");
    };
    assert_eq!(sort.keys.len(), 2);
    assert_eq!(
        sort.keys[1].expr,
        Expr::property(Expr::var("a", product_ty()), "Name", Type::String)
    );
}

#[test]
fn then_by_requires_a_sort() {
    let unsorted = scan("s");
    let key = SortKey::asc(prop(&unsorted, "Name", Type::String));

    let err = OrderLifter::new()
        .then_by(unsorted, vec![key], "ThenBy")
        .unwrap_err();
    assert!(err.is_then_by_without_order_by(), "{err}");
}

#[test]
fn distinct_and_set_ops_drop_the_order() {
    let lifter = OrderLifter::new();

    let distinct = lifter.distinct(by_created_desc());
    assert!(matches!(distinct, Expr::Distinct(_)));
    assert_eq!(Shape::of(&distinct), Shape::Unordered);

    let union_all = lifter.set_op(SetOp::UnionAll, by_created_desc(), skip_first());
    assert!(matches!(union_all, Expr::SetOp(_)));
    assert_eq!(Shape::of(&union_all), Shape::Unordered);
    assert_eq!(list(eval(&union_all)).len(), 7);
}

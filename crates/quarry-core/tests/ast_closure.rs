use quarry_core::{
    algebra::Value,
    ast::{Ast, Captured, Closure, EmbeddedQuery, Expr, Fragment, MergeOption, Placeholder},
    schema::HostType,
};
use std::{cell::Cell, rc::Rc};

// ---------------------------------------------------------------------------
// Closure slots
// ---------------------------------------------------------------------------

#[test]
fn closure_assignment_is_visible_through_clones() {
    let closure = Closure::new();
    closure.set("id", 5);

    let shared = closure.clone();
    closure.set("id", 6);

    assert_eq!(shared.read("id").unwrap(), Value::I32(6));
    assert!(shared.ptr_eq(&closure));
    assert!(!shared.ptr_eq(&Closure::new()));
}

#[test]
fn getter_runs_on_every_read() {
    let calls = Rc::new(Cell::new(0));
    let closure = Closure::new();
    closure.set_getter("next", {
        let calls = calls.clone();
        move || {
            calls.set(calls.get() + 1);
            Ok(Value::I32(calls.get()))
        }
    });

    assert_eq!(closure.read("next").unwrap(), Value::I32(1));
    assert_eq!(closure.read("next").unwrap(), Value::I32(2));
}

#[test]
fn reading_missing_variable_fails() {
    let err = Closure::new().read("missing").unwrap_err();
    assert!(err.is_expression_evaluation_failed());
}

#[test]
fn query_slot_is_not_a_value() {
    let closure = Closure::new();
    closure.set_query(
        "inner",
        Rc::new(Fragment::new(|ast| ast.entity_set("Products", "Product"))),
    );

    assert!(matches!(closure.get("inner").unwrap(), Captured::Query(_)));
    assert!(closure.read("inner").is_err());
}

// ---------------------------------------------------------------------------
// Embedded fragments
// ---------------------------------------------------------------------------

#[test]
fn fragment_grafts_into_arena() {
    let fragment = Fragment::new(|ast| ast.entity_set("Products", "Product"));
    let mut ast = Ast::new();
    ast.constant(1);

    let root = fragment.graft(&mut ast).unwrap();
    assert_eq!(ast.len(), 2);
    assert!(matches!(ast.expr(root), Expr::EntitySet(name) if name == "Products"));
}

#[test]
fn fragment_merge_option_is_observable() {
    let fragment = Fragment::new(|ast| ast.entity_set("Products", "Product"));
    assert_eq!(fragment.merge_option(), None);

    fragment.set_merge_option(Some(MergeOption::NoTracking));
    assert_eq!(fragment.merge_option(), Some(MergeOption::NoTracking));
}

// ---------------------------------------------------------------------------
// Placeholders
// ---------------------------------------------------------------------------

#[test]
fn placeholders_are_collected_once_in_order() {
    let mut ast = Ast::new();
    let first = Rc::new(Placeholder::new(
        "p__linq__0",
        HostType::I32,
        ast.constant(1),
        vec![],
        Rc::new(|_: &[Value]| Ok(Value::I32(1))),
    ));
    let second = Rc::new(Placeholder::new(
        "p__linq__1",
        HostType::I32,
        ast.constant(2),
        vec![],
        Rc::new(|_: &[Value]| Ok(Value::I32(2))),
    ));

    let a = ast.placeholder(first.clone());
    let b = ast.placeholder(second.clone());
    let a_again = ast.placeholder(first.clone());
    let sum = ast.binary(quarry_core::ast::BinaryOp::Add, a, b);
    let root = ast.binary(quarry_core::ast::BinaryOp::Add, sum, a_again);

    let found = ast.placeholders(root);
    assert_eq!(found.len(), 2);
    assert!(Rc::ptr_eq(&found[0], &first));
    assert!(Rc::ptr_eq(&found[1], &second));
    assert!(ast.has_placeholder(root));
}

#[test]
fn placeholder_evaluates_with_arguments() {
    let mut ast = Ast::new();
    let source = ast.parameter("n", HostType::I32);
    let placeholder = Placeholder::new(
        "p__linq__0",
        HostType::I32,
        source,
        vec!["n".into()],
        Rc::new(|args: &[Value]| Ok(args[0].clone())),
    );

    assert_eq!(placeholder.evaluate(&[Value::I32(9)]).unwrap(), Value::I32(9));
    assert_eq!(placeholder.outer_parameters(), ["n".to_string()]);
}

mod support;

use pretty_assertions::assert_eq;
use quarry::{
    algebra::{Binding, Expr, ExprFunc, Type, Value, ValueRecord},
    ast::{Ast, BinaryOp, MergeOption, Method, MethodOwner, NodeId},
    schema::HostType,
    Options,
};
use support::*;

fn product_ty() -> Type {
    Type::Entity("Product".into())
}

fn record(fields: &[(&str, Value)]) -> Value {
    fields
        .iter()
        .fold(ValueRecord::new(), |record, (name, value)| {
            record.with(*name, value.clone())
        })
        .into()
}

// ---------------------------------------------------------------------------
// Filter and projection
// ---------------------------------------------------------------------------

#[test]
fn select_over_where() {
    let mut ast = Ast::new();
    let products = products_set(&mut ast);
    let active = product_member_eq(&mut ast, "Active", HostType::Bool, true);
    let filtered = ast.query("Where", vec![products, active]);
    let name = product_member(&mut ast, "Name", HostType::String);
    let root = ast.query("Select", vec![filtered, name]);

    let query = compile(&mut ast, root);

    let scan = Binding::new("LQ0", Expr::scan("Products", product_ty()));
    let filter = Expr::filter(
        scan.clone(),
        Expr::eq(Expr::property(scan.var_ref(), "Active", Type::Bool), true),
    );
    let input = Binding::new("LQ1", filter);
    assert_eq!(
        query.expr,
        Expr::project(
            input.clone(),
            Expr::property(input.var_ref(), "Name", Type::String)
        )
    );

    assert_eq!(query.parameters().len(), 0);

    let mut names = strings(run(&query));
    names.sort();
    assert_eq!(names, vec!["bolt", "cog", "drill"]);
}

#[test]
fn coalesce_replaces_nulls() {
    let mut ast = Ast::new();
    let products = products_set(&mut ast);
    let ordered = order_by_id(&mut ast, products);
    let price = ast.lambda1("p", product(), |ast, p| {
        let price = ast.member(p, "Price", HostType::nullable(HostType::I32));
        let zero = ast.constant(0);
        ast.binary(BinaryOp::Coalesce, price, zero)
    });
    let root = ast.query("Select", vec![ordered, price]);

    let query = compile(&mut ast, root);

    assert_eq!(
        list(run(&query)),
        vec![Value::I32(3), Value::I32(0), Value::I32(1), Value::I32(3)]
    );
}

// ---------------------------------------------------------------------------
// Ordering and paging
// ---------------------------------------------------------------------------

#[test]
fn filter_after_take_keeps_the_order() {
    let mut ast = Ast::new();
    let products = products_set(&mut ast);
    let created = product_member(&mut ast, "Created", HostType::DateTime);
    let ordered = ast.query("OrderByDescending", vec![products, created]);
    let three = ast.constant(3);
    let taken = ast.query("Take", vec![ordered, three]);
    let active = product_member_eq(&mut ast, "Active", HostType::Bool, true);
    let root = ast.query("Where", vec![taken, active]);

    let query = compile(&mut ast, root);

    // The order is re-applied above the filter
    let Expr::Sort(sort) = &query.expr else {
        panic!("expected a sort at the root, got {}", query.expr);
    };
    assert!(matches!(*sort.input.expr, Expr::Filter(_)));

    assert_eq!(ids(run(&query)), vec![4, 3]);
}

#[test]
fn select_after_order_by_keeps_the_order() {
    let mut ast = Ast::new();
    let products = products_set(&mut ast);
    let name = product_member(&mut ast, "Name", HostType::String);
    let ordered = ast.query("OrderBy", vec![products, name]);
    let name = product_member(&mut ast, "Name", HostType::String);
    let root = ast.query("Select", vec![ordered, name]);

    let query = compile(&mut ast, root);

    assert_eq!(
        strings(run(&query)),
        vec!["anchor", "bolt", "cog", "drill"]
    );
}

#[test]
fn then_by_extends_the_sort() {
    let mut ast = Ast::new();
    let products = products_set(&mut ast);
    let category = product_member(&mut ast, "Category", HostType::String);
    let ordered = ast.query("OrderBy", vec![products, category]);
    let id = product_member(&mut ast, "Id", HostType::I32);
    let root = ast.query("ThenByDescending", vec![ordered, id]);

    let query = compile(&mut ast, root);

    let Expr::Sort(sort) = &query.expr else {
        panic!("expected a sort, got {}", query.expr);
    };
    assert_eq!(sort.keys.len(), 2);
    assert_eq!(ids(run(&query)), vec![3, 1, 2, 4]);
}

#[test]
fn skip_then_take() {
    let mut ast = Ast::new();
    let products = products_set(&mut ast);
    let ordered = order_by_id(&mut ast, products);
    let one = ast.constant(1);
    let skipped = ast.query("Skip", vec![ordered, one]);
    let two = ast.constant(2);
    let root = ast.query("Take", vec![skipped, two]);

    let query = compile(&mut ast, root);

    assert_eq!(ids(run(&query)), vec![2, 3]);
}

// ---------------------------------------------------------------------------
// Element operators
// ---------------------------------------------------------------------------

#[test]
fn first_at_the_root_limits_to_one() {
    let mut ast = Ast::new();
    let products = products_set(&mut ast);
    let created = product_member(&mut ast, "Created", HostType::DateTime);
    let ordered = ast.query("OrderByDescending", vec![products, created]);
    let root = ast.query("First", vec![ordered]);

    let query = compile(&mut ast, root);

    let Expr::Limit(limit) = &query.expr else {
        panic!("expected a limit, got {}", query.expr);
    };
    assert_eq!(limit.count.as_const_i64(), Some(1));
    assert_eq!(ids(run(&query)), vec![2]);
}

#[test]
fn single_at_the_root_limits_to_two() {
    let mut ast = Ast::new();
    let products = products_set(&mut ast);
    let cog = product_member_eq(&mut ast, "Name", HostType::String, "cog");
    let root = ast.query("Single", vec![products, cog]);

    let query = compile(&mut ast, root);

    let Expr::Limit(limit) = &query.expr else {
        panic!("expected a limit, got {}", query.expr);
    };
    assert_eq!(limit.count.as_const_i64(), Some(2));
    assert_eq!(ids(run(&query)), vec![3]);
}

#[test]
fn nested_first_or_default_yields_the_type_default() {
    let mut ast = Ast::new();
    let suppliers = ast.entity_set("Suppliers", "Supplier");
    let first_id = ast.lambda1("s", supplier(), |ast, s| {
        let products = ast.member(s, "Products", HostType::sequence(product()));
        let id = product_member(ast, "Id", HostType::I32);
        let ids = ast.query("Select", vec![products, id]);
        ast.query("FirstOrDefault", vec![ids])
    });
    let root = ast.query("Select", vec![suppliers, first_id]);

    let query = compile(&mut ast, root);

    assert_eq!(
        list(run(&query)),
        vec![Value::I32(1), Value::I32(2), Value::I32(0)]
    );
}

#[test]
fn nested_first_or_default_entity_is_null_when_empty() {
    let mut ast = Ast::new();
    let suppliers = ast.entity_set("Suppliers", "Supplier");
    let first = ast.lambda1("s", supplier(), |ast, s| {
        let products = ast.member(s, "Products", HostType::sequence(product()));
        ast.query("FirstOrDefault", vec![products])
    });
    let root = ast.query("Select", vec![suppliers, first]);

    let query = compile(&mut ast, root);

    let firsts = list(run(&query));
    assert_eq!(firsts.len(), 3);
    assert_eq!(
        firsts[0].as_record().and_then(|r| r.get("Id")),
        Some(&Value::I32(1))
    );
    assert_eq!(firsts[2], Value::Null);
}

#[test]
fn default_if_empty_yields_one_null() {
    let mut ast = Ast::new();
    let products = products_set(&mut ast);
    let none = product_member_eq(&mut ast, "Name", HostType::String, "none");
    let filtered = ast.query("Where", vec![products, none]);
    let root = ast.query("DefaultIfEmpty", vec![filtered]);

    let query = compile(&mut ast, root);

    assert_eq!(list(run(&query)), vec![Value::Null]);
}

// ---------------------------------------------------------------------------
// Aggregates and quantifiers
// ---------------------------------------------------------------------------

#[test]
fn count_with_predicate() {
    let mut ast = Ast::new();
    let products = products_set(&mut ast);
    let active = product_member_eq(&mut ast, "Active", HostType::Bool, true);
    let root = ast.query("Count", vec![products, active]);

    let query = compile(&mut ast, root);

    assert!(query.expr.is_canonical("Count"));
    assert_eq!(run(&query), Value::I32(3));
}

#[test]
fn count_of_each_navigation() {
    let mut ast = Ast::new();
    let suppliers = ast.entity_set("Suppliers", "Supplier");
    let count = ast.lambda1("s", supplier(), |ast, s| {
        let products = ast.member(s, "Products", HostType::sequence(product()));
        count_of(ast, products)
    });
    let root = ast.query("Select", vec![suppliers, count]);

    let query = compile(&mut ast, root);

    assert_eq!(
        list(run(&query)),
        vec![Value::I32(2), Value::I32(1), Value::I32(0)]
    );
}

#[test]
fn any_per_supplier() {
    let mut ast = Ast::new();
    let suppliers = ast.entity_set("Suppliers", "Supplier");
    let any = ast.lambda1("s", supplier(), |ast, s| {
        let products = ast.member(s, "Products", HostType::sequence(product()));
        ast.query("Any", vec![products])
    });
    let root = ast.query("Select", vec![suppliers, any]);

    let query = compile(&mut ast, root);

    assert_eq!(
        list(run(&query)),
        vec![Value::Bool(true), Value::Bool(true), Value::Bool(false)]
    );
}

#[test]
fn all_treats_unknown_as_failure() {
    let mut ast = Ast::new();
    let products = products_set(&mut ast);
    let priced = ast.lambda1("p", product(), |ast, p| {
        let price = ast.member(p, "Price", HostType::nullable(HostType::I32));
        let zero = ast.constant(0);
        ast.binary(BinaryOp::GreaterThan, price, zero)
    });
    let root = ast.query("All", vec![products, priced]);

    let query = compile(&mut ast, root);

    assert_eq!(run(&query), Value::Bool(false));
}

#[test]
fn contains_over_a_constant_list() {
    let mut ast = Ast::new();
    let products = products_set(&mut ast);
    let wanted = ast.lambda1("p", product(), |ast, p| {
        let one = ast.constant(1);
        let three = ast.constant(3);
        let list = ast.new_array(HostType::I32, vec![one, three]);
        let id = ast.member(p, "Id", HostType::I32);
        ast.query("Contains", vec![list, id])
    });
    let filtered = ast.query("Where", vec![products, wanted]);
    let root = order_by_id(&mut ast, filtered);

    let query = compile(&mut ast, root);

    assert_eq!(ids(run(&query)), vec![1, 3]);
}

// ---------------------------------------------------------------------------
// Grouping and joins
// ---------------------------------------------------------------------------

#[test]
fn group_by_with_count() {
    let mut ast = Ast::new();
    let products = products_set(&mut ast);
    let category = product_member(&mut ast, "Category", HostType::String);
    let groups = ast.query("GroupBy", vec![products, category]);

    let grouping = HostType::grouping(HostType::String, product());
    let summary = HostType::class("CategoryCount");
    let g = ast.parameter("g", grouping.clone());
    let key = ast.member(g, "Key", HostType::String);
    let count = count_of(&mut ast, g);
    let body = ast.new_object(summary.clone(), vec![("Category", key), ("Count", count)]);
    let select = ast.lambda(vec![g], body);
    let root = ast.query("Select", vec![groups, select]);

    let query = compile(&mut ast, root);

    assert_eq!(
        list(run(&query)),
        vec![
            record(&[("Category", "hardware".into()), ("Count", Value::I32(2))]),
            record(&[("Category", "marine".into()), ("Count", Value::I32(1))]),
            record(&[("Category", "tools".into()), ("Count", Value::I32(1))]),
        ]
    );
    assert!(query.initializers.get(&grouping).is_some());
    assert!(query.initializers.get(&summary).is_some());
}

#[test]
fn join_on_nullable_key() {
    let mut ast = Ast::new();
    let products = products_set(&mut ast);
    let suppliers = ast.entity_set("Suppliers", "Supplier");
    let outer_key = product_member(&mut ast, "SupplierId", HostType::nullable(HostType::I32));
    let inner_key = ast.lambda1("s", supplier(), |ast, s| ast.member(s, "Id", HostType::I32));
    let pair = HostType::class("ProductSupplier");
    let result = lambda2(
        &mut ast,
        ("p", product()),
        ("s", supplier()),
        |ast, p, s| {
            let product = ast.member(p, "Name", HostType::String);
            let supplier = ast.member(s, "Name", HostType::String);
            ast.new_object(pair.clone(), vec![("Product", product), ("Supplier", supplier)])
        },
    );
    let root = ast.query(
        "Join",
        vec![products, suppliers, outer_key, inner_key, result],
    );

    let query = compile(&mut ast, root);

    assert_eq!(
        list(run(&query)),
        vec![
            record(&[("Product", "bolt".into()), ("Supplier", "acme".into())]),
            record(&[("Product", "anchor".into()), ("Supplier", "bolt co".into())]),
            record(&[("Product", "cog".into()), ("Supplier", "acme".into())]),
        ]
    );
}

#[test]
fn group_join_counts_matches() {
    let mut ast = Ast::new();
    let suppliers = ast.entity_set("Suppliers", "Supplier");
    let products = products_set(&mut ast);
    let outer_key = ast.lambda1("s", supplier(), |ast, s| ast.member(s, "Id", HostType::I32));
    let inner_key = product_member(&mut ast, "SupplierId", HostType::nullable(HostType::I32));
    let summary = HostType::class("SupplierCount");
    let result = lambda2(
        &mut ast,
        ("s", supplier()),
        ("ps", HostType::sequence(product())),
        |ast, s, ps| {
            let name = ast.member(s, "Name", HostType::String);
            let count = count_of(ast, ps);
            ast.new_object(summary.clone(), vec![("Name", name), ("Count", count)])
        },
    );
    let root = ast.query(
        "GroupJoin",
        vec![suppliers, products, outer_key, inner_key, result],
    );

    let query = compile(&mut ast, root);

    assert_eq!(
        list(run(&query)),
        vec![
            record(&[("Name", "acme".into()), ("Count", Value::I32(2))]),
            record(&[("Name", "bolt co".into()), ("Count", Value::I32(1))]),
            record(&[("Name", "empty co".into()), ("Count", Value::I32(0))]),
        ]
    );
}

#[test]
fn select_many_flattens_navigations() {
    let mut ast = Ast::new();
    let suppliers = ast.entity_set("Suppliers", "Supplier");
    let products = ast.lambda1("s", supplier(), |ast, s| {
        ast.member(s, "Products", HostType::sequence(product()))
    });
    let root = ast.query("SelectMany", vec![suppliers, products]);

    let query = compile(&mut ast, root);

    assert_eq!(ids(run(&query)), vec![1, 3, 2]);
}

#[test]
fn select_many_over_default_if_empty_keeps_empty_owners() {
    let mut ast = Ast::new();
    let suppliers = ast.entity_set("Suppliers", "Supplier");
    let products = ast.lambda1("s", supplier(), |ast, s| {
        let products = ast.member(s, "Products", HostType::sequence(product()));
        ast.query("DefaultIfEmpty", vec![products])
    });
    let result = lambda2(
        &mut ast,
        ("s", supplier()),
        ("p", product()),
        |ast, s, _| ast.member(s, "Name", HostType::String),
    );
    let root = ast.query("SelectMany", vec![suppliers, products, result]);

    let query = compile(&mut ast, root);

    assert_eq!(
        strings(run(&query)),
        vec!["acme", "acme", "bolt co", "empty co"]
    );
}

// ---------------------------------------------------------------------------
// Methods
// ---------------------------------------------------------------------------

fn where_name(ast: &mut Ast, method: &str, pattern: &str) -> NodeId {
    let products = products_set(ast);
    let predicate = ast.lambda1("p", product(), |ast, p| {
        let name = ast.member(p, "Name", HostType::String);
        let pattern = ast.constant(pattern);
        ast.call(Method::string(method), Some(name), vec![pattern], HostType::Bool)
    });
    ast.query("Where", vec![products, predicate])
}

#[test]
fn starts_with_becomes_like() {
    let mut ast = Ast::new();
    let root = where_name(&mut ast, "StartsWith", "b");

    let query = compile(&mut ast, root);

    let Expr::Filter(filter) = &query.expr else {
        panic!("expected a filter, got {}", query.expr);
    };
    assert_eq!(
        *filter.predicate,
        Expr::like(
            Expr::property(filter.input.var_ref(), "Name", Type::String),
            "b%",
            Some('~')
        )
    );
    assert_eq!(ids(run(&query)), vec![1]);
}

#[test]
fn like_pattern_escapes_wildcards() {
    let mut ast = Ast::new();
    let root = where_name(&mut ast, "Contains", "50%_");

    let query = compile(&mut ast, root);

    let Expr::Filter(filter) = &query.expr else {
        panic!("expected a filter, got {}", query.expr);
    };
    let Expr::Like(like) = &*filter.predicate else {
        panic!("expected like, got {}", filter.predicate);
    };
    assert_eq!(*like.pattern, Expr::from("%50~%~_%"));
}

#[test]
fn string_match_without_escape_support_calls_the_function() {
    let mut ast = Ast::new();
    let root = where_name(&mut ast, "EndsWith", "g");
    let options = Options {
        like_escape: None,
        ..Options::DEFAULT
    };

    let query = compile_with(options, &mut ast, root);

    let Expr::Filter(filter) = &query.expr else {
        panic!("expected a filter, got {}", query.expr);
    };
    assert!(filter.predicate.is_canonical("EndsWith"));
    assert_eq!(ids(run(&query)), vec![3]);
}

#[test]
fn substring_and_index_of_are_zero_based() {
    let mut ast = Ast::new();
    let products = products_set(&mut ast);
    let ordered = order_by_id(&mut ast, products);
    let parts = ast.lambda1("p", product(), |ast, p| {
        let name = ast.member(p, "Name", HostType::String);
        let one = ast.constant(1);
        let two = ast.constant(2);
        let substring = ast.call(
            Method::string("Substring"),
            Some(name),
            vec![one, two],
            HostType::String,
        );
        let o = ast.constant("o");
        let index = ast.call(Method::string("IndexOf"), Some(name), vec![o], HostType::I32);
        ast.new_object(
            HostType::class("Parts"),
            vec![("Substring", substring), ("IndexOf", index)],
        )
    });
    let root = ast.query("Select", vec![ordered, parts]);

    let query = compile(&mut ast, root);

    assert_eq!(
        list(run(&query)),
        vec![
            record(&[("Substring", "ol".into()), ("IndexOf", Value::I32(1))]),
            record(&[("Substring", "nc".into()), ("IndexOf", Value::I32(4))]),
            record(&[("Substring", "og".into()), ("IndexOf", Value::I32(1))]),
            record(&[("Substring", "ri".into()), ("IndexOf", Value::I32(-1))]),
        ]
    );
}

#[test]
fn model_function_resolves_overload() {
    let mut ast = Ast::new();
    let products = products_set(&mut ast);
    let soundex = ast.lambda1("p", product(), |ast, p| {
        let name = ast.member(p, "Name", HostType::String);
        ast.call(
            Method::function("Names", "Soundex", "Store", "Soundex"),
            None,
            vec![name],
            HostType::String,
        )
    });
    let root = ast.query("Select", vec![products, soundex]);

    let query = compile(&mut ast, root);

    let Expr::Project(project) = &query.expr else {
        panic!("expected a projection, got {}", query.expr);
    };
    let Expr::Func(ExprFunc {
        namespace,
        name,
        ty,
        aggregate,
        ..
    }) = &*project.projection
    else {
        panic!("expected a function, got {}", project.projection);
    };
    assert_eq!(namespace, "Store");
    assert_eq!(name, "Soundex");
    assert_eq!(*ty, Type::String);
    assert!(!aggregate);
}

// ---------------------------------------------------------------------------
// Eager loading and merge options
// ---------------------------------------------------------------------------

#[test]
fn include_survives_filters() {
    let mut ast = Ast::new();
    let products = products_set(&mut ast);
    let path = ast.constant("Supplier");
    let included = ast.query("Include", vec![products, path]);
    let active = product_member_eq(&mut ast, "Active", HostType::Bool, true);
    let root = ast.query("Where", vec![included, active]);

    let query = compile(&mut ast, root);

    let span = query.span().expect("span");
    assert!(span.contains("Supplier"));
}

#[test]
fn include_is_dropped_by_projection() {
    let mut ast = Ast::new();
    let products = products_set(&mut ast);
    let path = ast.constant("Supplier");
    let included = ast.query("Include", vec![products, path]);
    let name = product_member(&mut ast, "Name", HostType::String);
    let root = ast.query("Select", vec![included, name]);

    let query = compile(&mut ast, root);

    assert!(query.span().is_none());
}

#[test]
fn include_on_the_right_of_except_is_ignored() {
    let mut ast = Ast::new();
    let lhs = products_set(&mut ast);
    let rhs = products_set(&mut ast);
    let path = ast.constant("Supplier");
    let rhs = ast.query("Include", vec![rhs, path]);
    let root = ast.query("Except", vec![lhs, rhs]);

    let query = compile(&mut ast, root);

    assert!(query.span().is_none());
    assert_eq!(ids(run(&query)), Vec::<i64>::new());
}

#[test]
fn merge_as_sets_the_merge_option() {
    let mut ast = Ast::new();
    let products = products_set(&mut ast);
    let option = ast.constant("NoTracking");
    let root = ast.query("MergeAs", vec![products, option]);

    let query = compile(&mut ast, root);

    assert_eq!(query.merge_option(), MergeOption::NoTracking);
}

#[test]
fn merge_option_defaults_to_the_options() {
    let mut ast = Ast::new();
    let root = products_set(&mut ast);

    let query = compile(&mut ast, root);

    assert_eq!(query.merge_option(), MergeOption::AppendOnly);
    assert!(query.parameters().next().is_none());
}

// ---------------------------------------------------------------------------
// Set operators
// ---------------------------------------------------------------------------

/// `Products.Where(p => p.Category == "hardware")` and
/// `Products.Where(p => p.Active == true)`
fn hardware_and_active(ast: &mut Ast) -> (NodeId, NodeId) {
    let products = products_set(ast);
    let hardware = product_member_eq(ast, "Category", HostType::String, "hardware");
    let hardware = ast.query("Where", vec![products, hardware]);

    let products = products_set(ast);
    let active = product_member_eq(ast, "Active", HostType::Bool, true);
    let active = ast.query("Where", vec![products, active]);

    (hardware, active)
}

fn sorted_ids(query: &quarry::CompiledQuery) -> Vec<i64> {
    let mut ids = ids(run(query));
    ids.sort();
    ids
}

#[test]
fn union_removes_duplicates() {
    let mut ast = Ast::new();
    let (hardware, active) = hardware_and_active(&mut ast);
    let root = ast.query("Union", vec![hardware, active]);

    let query = compile(&mut ast, root);

    assert!(matches!(query.expr, Expr::Distinct(_)));
    assert_eq!(sorted_ids(&query), vec![1, 3, 4]);
}

#[test]
fn concat_keeps_duplicates() {
    let mut ast = Ast::new();
    let (hardware, active) = hardware_and_active(&mut ast);
    let root = ast.query("Concat", vec![hardware, active]);

    let query = compile(&mut ast, root);

    assert_eq!(sorted_ids(&query), vec![1, 1, 3, 3, 4]);
}

#[test]
fn intersect_and_except() {
    let mut ast = Ast::new();
    let (hardware, active) = hardware_and_active(&mut ast);
    let root = ast.query("Intersect", vec![hardware, active]);
    let query = compile(&mut ast, root);
    assert_eq!(sorted_ids(&query), vec![1, 3]);

    let mut ast = Ast::new();
    let (hardware, active) = hardware_and_active(&mut ast);
    let root = ast.query("Except", vec![active, hardware]);
    let query = compile(&mut ast, root);
    assert_eq!(sorted_ids(&query), vec![4]);
}

#[test]
fn distinct_categories() {
    let mut ast = Ast::new();
    let products = products_set(&mut ast);
    let category = product_member(&mut ast, "Category", HostType::String);
    let categories = ast.query("Select", vec![products, category]);
    let root = ast.query("Distinct", vec![categories]);

    let query = compile(&mut ast, root);

    let mut categories = strings(run(&query));
    categories.sort();
    assert_eq!(categories, vec!["hardware", "marine", "tools"]);
}

// ---------------------------------------------------------------------------
// Type filters and conversions
// ---------------------------------------------------------------------------

fn discontinued() -> HostType {
    HostType::entity("Discontinued")
}

#[test]
fn of_type_keeps_derived_rows() {
    let mut ast = Ast::new();
    let products = products_set(&mut ast);
    let root = ast.query_typed("OfType", vec![products], HostType::sequence(discontinued()));

    let query = compile(&mut ast, root);

    assert!(matches!(query.expr, Expr::OfType(_)));
    assert_eq!(ids(run(&query)), vec![2]);
}

#[test]
fn type_is_in_a_predicate() {
    let mut ast = Ast::new();
    let products = products_set(&mut ast);
    let predicate = ast.lambda1("p", product(), |ast, p| ast.type_is(p, discontinued()));
    let root = ast.query("Where", vec![products, predicate]);

    let query = compile(&mut ast, root);

    assert_eq!(ids(run(&query)), vec![2]);
}

#[test]
fn type_as_yields_null_for_other_types() {
    let mut ast = Ast::new();
    let products = products_set(&mut ast);
    let ordered = order_by_id(&mut ast, products);
    let select = ast.lambda1("p", product(), |ast, p| ast.type_as(p, discontinued()));
    let root = ast.query("Select", vec![ordered, select]);

    let query = compile(&mut ast, root);

    let rows = list(run(&query));
    assert_eq!(rows.len(), 4);
    assert_eq!(
        rows[1].as_record().and_then(|r| r.get("Id")),
        Some(&Value::I32(2))
    );
    assert_eq!(rows[0], Value::Null);
    assert_eq!(rows[2], Value::Null);
    assert_eq!(rows[3], Value::Null);
}

#[test]
fn cast_to_a_base_type_keeps_every_row() {
    let mut ast = Ast::new();
    let products = products_set(&mut ast);
    let ordered = order_by_id(&mut ast, products);
    let root = ast.query_typed("Cast", vec![ordered], HostType::sequence(product()));

    let query = compile(&mut ast, root);

    assert_eq!(ids(run(&query)), vec![1, 2, 3, 4]);
}

#[test]
fn cast_widens_scalars() {
    let mut ast = Ast::new();
    let products = products_set(&mut ast);
    let ordered = order_by_id(&mut ast, products);
    let id = product_member(&mut ast, "Id", HostType::I32);
    let ids = ast.query("Select", vec![ordered, id]);
    let root = ast.query_typed("Cast", vec![ids], HostType::sequence(HostType::I64));

    let query = compile(&mut ast, root);

    assert_eq!(
        list(run(&query)),
        vec![Value::I64(1), Value::I64(2), Value::I64(3), Value::I64(4)]
    );
}

// ---------------------------------------------------------------------------
// Aggregates over selectors
// ---------------------------------------------------------------------------

fn aggregate_price(name: &str) -> Value {
    let mut ast = Ast::new();
    let products = products_set(&mut ast);
    let price = product_member(&mut ast, "Price", HostType::nullable(HostType::I32));
    let root = ast.query(name, vec![products, price]);

    let query = compile(&mut ast, root);
    assert!(query.expr.is_canonical(name), "{}", query.expr);
    run(&query)
}

#[test]
fn sum_min_max_skip_nulls() {
    assert_eq!(aggregate_price("Sum"), Value::I32(7));
    assert_eq!(aggregate_price("Min"), Value::I32(1));
    assert_eq!(aggregate_price("Max"), Value::I32(3));
}

#[test]
fn average_is_floating_point() {
    let mut ast = Ast::new();
    let products = products_set(&mut ast);
    let id = product_member(&mut ast, "Id", HostType::I32);
    let root = ast.query("Average", vec![products, id]);

    let query = compile(&mut ast, root);

    assert!(query.expr.is_canonical("Avg"));
    assert_eq!(run(&query), Value::F64(2.5));
}

#[test]
fn long_count_is_big_count() {
    let mut ast = Ast::new();
    let products = products_set(&mut ast);
    let root = ast.query("LongCount", vec![products]);

    let query = compile(&mut ast, root);

    assert!(query.expr.is_canonical("BigCount"));
    assert_eq!(run(&query), Value::I64(4));
}

// ---------------------------------------------------------------------------
// Canonical functions and members
// ---------------------------------------------------------------------------

/// `Products.OrderBy(p => p.Id).Select(p => <select>)`
fn select_each(ast: &mut Ast, select: impl FnOnce(&mut Ast, NodeId) -> NodeId) -> NodeId {
    let products = products_set(ast);
    let ordered = order_by_id(ast, products);
    let select = ast.lambda1("p", product(), select);
    ast.query("Select", vec![ordered, select])
}

fn name_of(ast: &mut Ast, p: NodeId) -> NodeId {
    ast.member(p, "Name", HostType::String)
}

fn select_strings(select: impl FnOnce(&mut Ast, NodeId) -> NodeId) -> Vec<String> {
    let mut ast = Ast::new();
    let root = select_each(&mut ast, select);
    strings(run(&compile(&mut ast, root)))
}

fn select_values(select: impl FnOnce(&mut Ast, NodeId) -> NodeId) -> Vec<Value> {
    let mut ast = Ast::new();
    let root = select_each(&mut ast, select);
    list(run(&compile(&mut ast, root)))
}

fn i32s(values: &[i32]) -> Vec<Value> {
    values.iter().map(|&v| Value::I32(v)).collect()
}

#[test]
fn reverse() {
    let reversed = select_strings(|ast, p| {
        let name = name_of(ast, p);
        ast.call(Method::string("Reverse"), None, vec![name], HostType::String)
    });

    assert_eq!(reversed, vec!["tlob", "rohcna", "goc", "llird"]);
}

#[test]
fn known_methods_win_over_function_attributes() {
    let reversed = select_strings(|ast, p| {
        let name = name_of(ast, p);
        ast.call(
            Method::function("String", "Reverse", "Store", "Soundex"),
            None,
            vec![name],
            HostType::String,
        )
    });

    assert_eq!(reversed, vec!["tlob", "rohcna", "goc", "llird"]);
}

#[test]
fn remove_keeps_the_prefix() {
    let removed = select_strings(|ast, p| {
        let name = name_of(ast, p);
        let one = ast.constant(1);
        ast.call(Method::string("Remove"), Some(name), vec![one], HostType::String)
    });

    assert_eq!(removed, vec!["b", "a", "c", "d"]);
}

#[test]
fn remove_a_range() {
    let removed = select_strings(|ast, p| {
        let name = name_of(ast, p);
        let one = ast.constant(1);
        let two = ast.constant(2);
        ast.call(
            Method::string("Remove"),
            Some(name),
            vec![one, two],
            HostType::String,
        )
    });

    assert_eq!(removed, vec!["bt", "ahor", "c", "dll"]);
}

#[test]
fn insert_splices() {
    let inserted = select_strings(|ast, p| {
        let name = name_of(ast, p);
        let one = ast.constant(1);
        let dash = ast.constant("-");
        ast.call(
            Method::string("Insert"),
            Some(name),
            vec![one, dash],
            HostType::String,
        )
    });

    assert_eq!(inserted, vec!["b-olt", "a-nchor", "c-og", "d-rill"]);
}

#[test]
fn trim_and_concat() {
    let trimmed = select_strings(|ast, p| {
        let name = name_of(ast, p);
        let space = ast.constant(" ");
        let padded = ast.call(
            Method::string("Concat"),
            None,
            vec![space, name, space],
            HostType::String,
        );
        ast.call(Method::string("Trim"), Some(padded), vec![], HostType::String)
    });

    assert_eq!(trimmed, vec!["bolt", "anchor", "cog", "drill"]);
}

#[test]
fn is_null_or_empty_over_replace() {
    let mut ast = Ast::new();
    let products = products_set(&mut ast);
    let predicate = ast.lambda1("p", product(), |ast, p| {
        let name = name_of(ast, p);
        let cog = ast.constant("cog");
        let empty = ast.constant("");
        let replaced = ast.call(
            Method::string("Replace"),
            Some(name),
            vec![cog, empty],
            HostType::String,
        );
        ast.call(
            Method::string("IsNullOrEmpty"),
            None,
            vec![replaced],
            HostType::Bool,
        )
    });
    let root = ast.query("Where", vec![products, predicate]);

    let query = compile(&mut ast, root);

    assert_eq!(ids(run(&query)), vec![3]);
}

#[test]
fn math_functions() {
    let abs = select_values(|ast, p| {
        let price = ast.member(p, "Price", HostType::nullable(HostType::I32));
        let two = ast.constant(2);
        let diff = ast.binary(BinaryOp::Subtract, price, two);
        ast.call(
            Method::math("Abs"),
            None,
            vec![diff],
            HostType::nullable(HostType::I32),
        )
    });
    assert_eq!(
        abs,
        vec![Value::I32(1), Value::Null, Value::I32(1), Value::I32(1)]
    );

    let ceiling = select_values(|ast, p| {
        let id = ast.member(p, "Id", HostType::I32);
        let half = ast.constant(0.5);
        let root = ast.call(Method::math("Power"), None, vec![id, half], HostType::F64);
        ast.call(Method::math("Ceiling"), None, vec![root], HostType::F64)
    });
    assert_eq!(
        ceiling,
        vec![
            Value::F64(1.0),
            Value::F64(2.0),
            Value::F64(2.0),
            Value::F64(2.0)
        ]
    );
}

#[test]
fn date_part_members() {
    let years = select_values(|ast, p| {
        let created = ast.member(p, "Created", HostType::DateTime);
        ast.member(created, "Year", HostType::I32)
    });
    assert_eq!(years, i32s(&[2021, 2024, 2022, 2023]));

    let months = select_values(|ast, p| {
        let created = ast.member(p, "Created", HostType::DateTime);
        ast.member(created, "Month", HostType::I32)
    });
    assert_eq!(months, i32s(&[1, 2, 6, 11]));
}

#[test]
fn has_value_and_value() {
    let mut ast = Ast::new();
    let products = products_set(&mut ast);
    let ordered = order_by_id(&mut ast, products);
    let priced = ast.lambda1("p", product(), |ast, p| {
        let price = ast.member(p, "Price", HostType::nullable(HostType::I32));
        ast.member(price, "HasValue", HostType::Bool)
    });
    let filtered = ast.query("Where", vec![ordered, priced]);
    let value = ast.lambda1("p", product(), |ast, p| {
        let price = ast.member(p, "Price", HostType::nullable(HostType::I32));
        ast.member(price, "Value", HostType::I32)
    });
    let root = ast.query("Select", vec![filtered, value]);

    let query = compile(&mut ast, root);

    assert_eq!(list(run(&query)), i32s(&[3, 1, 3]));
}

#[test]
fn new_guid_is_evaluated_per_row() {
    let mut ast = Ast::new();
    let root = select_each(&mut ast, |ast, _| {
        ast.call(
            Method::new(MethodOwner::Host("Guid".into()), "NewGuid"),
            None,
            vec![],
            HostType::Guid,
        )
    });

    let query = compile(&mut ast, root);

    let Expr::Project(project) = &query.expr else {
        panic!("expected a projection, got {}", query.expr);
    };
    assert!(project.projection.is_canonical("NewGuid"));

    let guids = list(run(&query));
    assert_eq!(guids.len(), 4);
    assert!(guids.iter().all(|guid| matches!(guid, Value::Guid(_))));
    assert_ne!(guids[0], guids[1]);
}

// ---------------------------------------------------------------------------
// Visual Basic runtime helpers
// ---------------------------------------------------------------------------

fn strings_call(ast: &mut Ast, name: &str, args: Vec<NodeId>, ty: HostType) -> NodeId {
    ast.call(
        Method::new(MethodOwner::Host("Strings".into()), name),
        None,
        args,
        ty,
    )
}

#[test]
fn left_right_and_mid() {
    let left = select_strings(|ast, p| {
        let name = name_of(ast, p);
        let two = ast.constant(2);
        strings_call(ast, "Left", vec![name, two], HostType::String)
    });
    assert_eq!(left, vec!["bo", "an", "co", "dr"]);

    let right = select_strings(|ast, p| {
        let name = name_of(ast, p);
        let two = ast.constant(2);
        strings_call(ast, "Right", vec![name, two], HostType::String)
    });
    assert_eq!(right, vec!["lt", "or", "og", "ll"]);

    // One-based, like Substring in the store
    let mid = select_strings(|ast, p| {
        let name = name_of(ast, p);
        let two = ast.constant(2);
        strings_call(ast, "Mid", vec![name, two, two], HostType::String)
    });
    assert_eq!(mid, vec!["ol", "nc", "og", "ri"]);
}

#[test]
fn renamed_string_helpers() {
    let lengths = select_values(|ast, p| {
        let name = name_of(ast, p);
        strings_call(ast, "Len", vec![name], HostType::I32)
    });
    assert_eq!(lengths, i32s(&[4, 6, 3, 5]));

    let upper = select_strings(|ast, p| {
        let name = name_of(ast, p);
        strings_call(ast, "UCase", vec![name], HostType::String)
    });
    assert_eq!(upper, vec!["BOLT", "ANCHOR", "COG", "DRILL"]);

    let lower = select_strings(|ast, p| {
        let name = name_of(ast, p);
        let upper = strings_call(ast, "UCase", vec![name], HostType::String);
        strings_call(ast, "LCase", vec![upper], HostType::String)
    });
    assert_eq!(lower, vec!["bolt", "anchor", "cog", "drill"]);
}

#[test]
fn date_and_time_helpers() {
    let hours = select_values(|ast, p| {
        let created = ast.member(p, "Created", HostType::DateTime);
        ast.call(
            Method::new(MethodOwner::Host("DateAndTime".into()), "Hour"),
            None,
            vec![created],
            HostType::I32,
        )
    });

    assert_eq!(hours, i32s(&[8, 23, 12, 18]));
}

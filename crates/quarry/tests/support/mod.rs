#![allow(dead_code)]

use quarry::{
    algebra::{Eval, Tables, Type, Value, ValueRecord},
    ast::{Ast, Method, NodeId},
    schema::{Function, HostType},
    CompiledQuery, Compiler, Options, Schema,
};
use tracing_subscriber::EnvFilter;

/// Logs the compiler passes to the test output. Filter with `RUST_LOG`, e.g.
/// `RUST_LOG=quarry=trace`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn product() -> HostType {
    HostType::entity("Product")
}

pub fn supplier() -> HostType {
    HostType::entity("Supplier")
}

pub fn schema() -> Schema {
    Schema::builder()
        .entity("Product", |e| {
            e.key("Id")
                .property("Id", HostType::I32)
                .property("Name", HostType::String)
                .property("Price", HostType::nullable(HostType::I32))
                .property("Category", HostType::String)
                .property("Active", HostType::Bool)
                .property("Created", HostType::DateTime)
                .property("SupplierId", HostType::nullable(HostType::I32))
                .reference("Supplier", "Supplier");
        })
        .entity("Discontinued", |e| {
            e.base("Product").property("Reason", HostType::String);
        })
        .entity("Supplier", |e| {
            e.key("Id")
                .property("Id", HostType::I32)
                .property("Name", HostType::String)
                .collection("Products", "Product");
        })
        .entity_set("Products", "Product")
        .entity_set("Suppliers", "Supplier")
        .function(Function::new(
            "Store",
            "Soundex",
            vec![Type::String],
            Type::String,
        ))
        .build()
        .unwrap()
}

fn product_row(
    entity: &str,
    id: i32,
    name: &str,
    price: Option<i32>,
    category: &str,
    active: bool,
    created: i64,
    supplier: Option<(i32, &str)>,
) -> Value {
    let supplier_id = supplier.map(|(id, _)| id);
    let supplier = match supplier {
        Some((id, name)) => ValueRecord::entity("Supplier")
            .with("Id", id)
            .with("Name", name)
            .into(),
        None => Value::Null,
    };

    ValueRecord::entity(entity)
        .with("Id", id)
        .with("Name", name)
        .with("Price", price)
        .with("Category", category)
        .with("Active", active)
        .with("Created", Value::DateTime(created))
        .with("SupplierId", supplier_id)
        .with("Supplier", supplier)
        .into()
}

/// bolt, anchor, cog, drill; created in the order bolt, cog, drill, anchor.
/// anchor is discontinued.
pub fn products() -> Vec<Value> {
    vec![
        // 2021-01-15 08:30:00
        product_row(
            "Product",
            1,
            "bolt",
            Some(3),
            "hardware",
            true,
            1_610_699_400_000_000,
            Some((1, "acme")),
        ),
        // 2024-02-29 23:59:59
        product_row(
            "Discontinued",
            2,
            "anchor",
            None,
            "marine",
            false,
            1_709_251_199_000_000,
            Some((2, "bolt co")),
        ),
        // 2022-06-30 12:00:00
        product_row(
            "Product",
            3,
            "cog",
            Some(1),
            "hardware",
            true,
            1_656_590_400_000_000,
            Some((1, "acme")),
        ),
        // 2023-11-02 18:45:10
        product_row(
            "Product",
            4,
            "drill",
            Some(3),
            "tools",
            true,
            1_698_950_710_000_000,
            None,
        ),
    ]
}

pub fn tables() -> Tables {
    let products = products();
    let supplier = |id: i32, name: &str, members: &[usize]| -> Value {
        ValueRecord::entity("Supplier")
            .with("Id", id)
            .with("Name", name)
            .with(
                "Products",
                Value::List(members.iter().map(|&i| products[i].clone()).collect()),
            )
            .into()
    };

    let suppliers = vec![
        supplier(1, "acme", &[0, 2]),
        supplier(2, "bolt co", &[1]),
        supplier(3, "empty co", &[]),
    ];

    Tables::new()
        .with_set("Products", products)
        .with_set("Suppliers", suppliers)
        .with_base("Discontinued", "Product")
}

pub fn compile(ast: &mut Ast, root: NodeId) -> CompiledQuery {
    compile_with(Options::DEFAULT, ast, root)
}

pub fn compile_with(options: Options, ast: &mut Ast, root: NodeId) -> CompiledQuery {
    init_tracing();
    let schema = schema();
    Compiler::new(&schema)
        .options(options)
        .compile(ast, root)
        .unwrap()
}

/// Runs a compiled query with unordered operators reversing their output,
/// so only orders the tree establishes survive.
pub fn run(query: &CompiledQuery) -> Value {
    run_with(query, &[])
}

/// Runs a compiled query with the given arguments for its formal parameters.
pub fn run_with(query: &CompiledQuery, args: &[Value]) -> Value {
    let mut tables = tables();
    for (name, value) in query.parameter_values(args).unwrap() {
        tables = tables.with_param(name, value);
    }

    Eval::new(&tables)
        .reorder_unordered(true)
        .eval(&query.expr)
        .unwrap()
}

pub fn list(value: Value) -> Vec<Value> {
    match value {
        Value::List(items) => items,
        value => panic!("expected list, got {value:?}"),
    }
}

pub fn ids(value: Value) -> Vec<i64> {
    list(value)
        .iter()
        .map(|item| item.as_record().unwrap().get("Id").unwrap().to_i64().unwrap())
        .collect()
}

pub fn strings(value: Value) -> Vec<String> {
    list(value)
        .iter()
        .map(|item| item.as_str().unwrap().to_string())
        .collect()
}

/// `Products`
pub fn products_set(ast: &mut Ast) -> NodeId {
    ast.entity_set("Products", "Product")
}

/// `p => p.<name>`
pub fn product_member(ast: &mut Ast, name: &str, ty: HostType) -> NodeId {
    ast.lambda1("p", product(), |ast, p| ast.member(p, name, ty))
}

/// `p => p.<name> == value`
pub fn product_member_eq(
    ast: &mut Ast,
    name: &str,
    ty: HostType,
    value: impl Into<Value>,
) -> NodeId {
    let value = value.into();
    ast.lambda1("p", product(), |ast, p| {
        let member = ast.member(p, name, ty);
        let value = ast.constant(value);
        ast.eq(member, value)
    })
}

/// `source.Count()` as written inside a lambda
pub fn count_of(ast: &mut Ast, source: NodeId) -> NodeId {
    ast.call(Method::enumerable("Count"), None, vec![source], HostType::I32)
}

/// `(a, b) => body`
pub fn lambda2(
    ast: &mut Ast,
    (a, a_ty): (&str, HostType),
    (b, b_ty): (&str, HostType),
    body: impl FnOnce(&mut Ast, NodeId, NodeId) -> NodeId,
) -> NodeId {
    let a = ast.parameter(a, a_ty);
    let b = ast.parameter(b, b_ty);
    let body = body(ast, a, b);
    ast.lambda(vec![a, b], body)
}

/// `source.OrderBy(p => p.Id)`
pub fn order_by_id(ast: &mut Ast, source: NodeId) -> NodeId {
    let key = product_member(ast, "Id", HostType::I32);
    ast.query("OrderBy", vec![source, key])
}

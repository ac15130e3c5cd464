use super::*;

/// A node of the relational-algebra command tree.
///
/// Relational nodes (scan, filter, sort, ...) evaluate to collections.
/// Relational inputs that introduce a variable for each element are wrapped
/// in a [`Binding`].
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Cross or outer apply of a correlated collection
    Apply(ExprApply),

    /// Binary expression: comparisons, arithmetic, and boolean connectives
    BinaryOp(ExprBinaryOp),

    /// Searched case expression
    Case(ExprCase),

    /// Convert a scalar to a different primitive type
    Cast(ExprCast),

    /// A collection built from element expressions
    Collection(ExprCollection),

    /// Removes duplicate elements
    Distinct(Box<Expr>),

    /// The single element of a collection, or null when it is empty
    Element(Box<Expr>),

    /// Whether a collection has at least one element
    Exists(Box<Expr>),

    /// Keeps the elements satisfying a predicate
    Filter(ExprFilter),

    /// Function invocation, including aggregates
    Func(ExprFunc),

    /// Partitions a collection by key
    GroupBy(ExprGroupBy),

    /// Whether an expression is null. This is different from a binary
    /// expression because of how backends treat null comparisons.
    IsNull(Box<Expr>),

    /// Type test against an entity or complex type
    IsOf(ExprIsOf),

    /// Inner, outer, or cross join of two collections
    Join(ExprJoin),

    /// Pattern match
    Like(ExprLike),

    /// Keeps the first `n` elements
    Limit(ExprLimit),

    /// Arithmetic negation
    Negate(Box<Expr>),

    /// Boolean negation
    Not(Box<Expr>),

    /// A typed null constant
    Null(Type),

    /// Keeps the elements of a given type
    OfType(ExprOfType),

    /// Reference to a query parameter supplied at execution
    Param(ExprParam),

    /// Maps each element of a collection
    Project(ExprProject),

    /// Property or navigation access
    Property(ExprProperty),

    /// Evaluates to a row
    Row(ExprRow),

    /// All instances of an entity set
    Scan(ExprScan),

    /// Union all, intersect, or except
    SetOp(ExprSetOp),

    /// Skips the first `n` elements in a given order
    Skip(ExprSkip),

    /// Orders a collection
    Sort(ExprSort),

    /// Views an instance as a derived type, or null when it is not one
    Treat(ExprTreat),

    /// Evaluates to a constant value
    Value(Value),

    /// Reference to a binding variable
    Var(ExprVar),
}

impl Expr {
    pub fn null(ty: Type) -> Self {
        Self::Null(ty)
    }

    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    pub fn distinct(input: impl Into<Self>) -> Self {
        Self::Distinct(Box::new(input.into()))
    }

    pub fn element(input: impl Into<Self>) -> Self {
        Self::Element(Box::new(input.into()))
    }

    pub fn exists(input: impl Into<Self>) -> Self {
        Self::Exists(Box::new(input.into()))
    }

    /// Collection has no elements.
    pub fn is_empty(input: impl Into<Self>) -> Self {
        Self::not(Self::exists(input))
    }

    pub fn is_null(expr: impl Into<Self>) -> Self {
        Self::IsNull(Box::new(expr.into()))
    }

    pub fn negate(expr: impl Into<Self>) -> Self {
        Self::Negate(Box::new(expr.into()))
    }

    pub fn not(expr: impl Into<Self>) -> Self {
        Self::Not(Box::new(expr.into()))
    }

    /// Is a value that evaluates to null
    pub fn is_value_null(&self) -> bool {
        matches!(self, Self::Null(_) | Self::Value(Value::Null))
    }

    /// Returns true if the expression is the `true` boolean expression
    pub fn is_true(&self) -> bool {
        matches!(self, Self::Value(Value::Bool(true)))
    }

    /// Returns `true` if the expression is the `false` boolean expression
    pub fn is_false(&self) -> bool {
        matches!(self, Self::Value(Value::Bool(false)))
    }

    /// Returns true if the expression is a constant value, null included.
    pub fn is_const(&self) -> bool {
        match self {
            Self::Value(_) | Self::Null(_) => true,
            Self::Row(row) => row.fields.iter().all(Expr::is_const),
            Self::Collection(collection) => collection.elements.iter().all(Expr::is_const),
            _ => false,
        }
    }

    /// The literal integer value, if this is an integer constant.
    pub fn as_const_i64(&self) -> Option<i64> {
        match self {
            Self::Value(value) => value.to_i64(),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_var(&self) -> Option<&ExprVar> {
        match self {
            Self::Var(var) => Some(var),
            _ => None,
        }
    }

    pub fn as_row(&self) -> Option<&ExprRow> {
        match self {
            Self::Row(row) => Some(row),
            _ => None,
        }
    }

    pub fn as_sort(&self) -> Option<&ExprSort> {
        match self {
            Self::Sort(sort) => Some(sort),
            _ => None,
        }
    }

    pub fn is_var(&self, name: &str) -> bool {
        matches!(self, Self::Var(var) if var.name == name)
    }

    /// Returns `true` for nodes evaluating to a collection whose element
    /// order is defined by a sort.
    pub fn is_ordered(&self) -> bool {
        matches!(self, Self::Sort(_) | Self::Skip(_))
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<bool> for Expr {
    fn from(value: bool) -> Self {
        Self::Value(Value::Bool(value))
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        Self::Value(Value::I32(value))
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Self::Value(Value::I64(value))
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<String> for Expr {
    fn from(value: String) -> Self {
        Self::Value(Value::String(value))
    }
}

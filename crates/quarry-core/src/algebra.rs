mod binding;
pub use binding::Binding;

pub mod eval;
pub use eval::{ConstInput, Eval, Input, Tables};

mod expr;
pub use expr::Expr;

mod expr_apply;
pub use expr_apply::{ApplyKind, ExprApply};

mod expr_binary_op;
pub use expr_binary_op::ExprBinaryOp;

mod expr_case;
pub use expr_case::ExprCase;

mod expr_cast;
pub use expr_cast::ExprCast;

mod expr_collection;
pub use expr_collection::ExprCollection;

mod expr_filter;
pub use expr_filter::ExprFilter;

mod expr_func;
pub use expr_func::{ExprFunc, CANONICAL_NAMESPACE};

mod expr_group_by;
pub use expr_group_by::ExprGroupBy;

mod expr_is_of;
pub use expr_is_of::ExprIsOf;

mod expr_join;
pub use expr_join::{ExprJoin, JoinKind};

mod expr_like;
pub use expr_like::ExprLike;

mod expr_limit;
pub use expr_limit::ExprLimit;

mod expr_of_type;
pub use expr_of_type::ExprOfType;

mod expr_param;
pub use expr_param::ExprParam;

mod expr_project;
pub use expr_project::ExprProject;

mod expr_property;
pub use expr_property::ExprProperty;

mod expr_row;
pub use expr_row::ExprRow;

mod expr_scan;
pub use expr_scan::ExprScan;

mod expr_set_op;
pub use expr_set_op::{ExprSetOp, SetOp};

mod expr_skip;
pub use expr_skip::ExprSkip;

mod expr_sort;
pub use expr_sort::{ExprSort, SortKey};

mod expr_treat;
pub use expr_treat::ExprTreat;

mod expr_var;
pub use expr_var::ExprVar;

mod fmt;

mod infer;

mod initializer;
pub use initializer::{InitializerDescriptor, InitializerKind};

mod op_binary;
pub use op_binary::BinaryOp;

mod row_type;
pub use row_type::RowType;

mod substitute;

mod ty;
pub use ty::Type;

mod value;
pub use value::Value;

mod value_record;
pub use value_record::ValueRecord;

pub mod binding;
pub use binding::ScopeBinder;

mod compile;
pub use compile::{CompiledQuery, Compiler};

pub mod equality;
pub use equality::EqualsPattern;

pub mod funcletize;

pub mod initializer;

pub mod lift;

pub mod normalize;

mod options;
pub use options::Options;

pub mod span;

pub mod translate;

pub use quarry_core::{algebra, ast, bail, err, schema, Error, Result, Schema};

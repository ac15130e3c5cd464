use super::NodeId;
use crate::{algebra::Value, schema::HostType, Result};
use std::{fmt, rc::Rc};

/// Computes a placeholder's value from the compiled query's arguments.
pub type Evaluator = Rc<dyn Fn(&[Value]) -> Result<Value>>;

/// A locally computable sub-expression whose value is read at execution
/// time.
///
/// Placeholders are shared behind `Rc` and compared by address: two
/// placeholders with the same name built by different compilations are
/// different parameters.
pub struct Placeholder {
    name: String,
    ty: HostType,

    /// The sub-expression the placeholder replaced
    source: NodeId,

    /// Formal parameters of the compiled query that the value depends on
    outer: Vec<String>,

    eval: Evaluator,
}

impl Placeholder {
    pub fn new(
        name: impl Into<String>,
        ty: HostType,
        source: NodeId,
        outer: Vec<String>,
        eval: Evaluator,
    ) -> Placeholder {
        Placeholder {
            name: name.into(),
            ty,
            source,
            outer,
            eval,
        }
    }

    /// Generated external parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &HostType {
        &self.ty
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn outer_parameters(&self) -> &[String] {
        &self.outer
    }

    /// Computes the current value.
    ///
    /// `args` are the compiled query's arguments, in declaration order.
    /// Conventional queries pass an empty slice.
    pub fn evaluate(&self, args: &[Value]) -> Result<Value> {
        (self.eval)(args)
    }
}

impl fmt::Debug for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Placeholder")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("source", &self.source)
            .field("outer", &self.outer)
            .finish_non_exhaustive()
    }
}

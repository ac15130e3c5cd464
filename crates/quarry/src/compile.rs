use crate::{
    funcletize::{Funcletizer, RecompileRequired},
    initializer::Registry,
    normalize::normalize,
    span::Span,
    translate::translate,
    Options,
};
use by_address::ByAddress;
use indexmap::IndexSet;
use quarry_core::{
    algebra::{self, Value},
    ast::{Ast, MergeOption, NodeId, Placeholder},
    schema::Resolver,
    Result,
};
use std::rc::Rc;
use tracing::{debug, instrument};

/// Compiles source query trees into the relational algebra.
///
/// ```ignore
/// let query = Compiler::new(&schema).compile(&mut ast, root)?;
/// ```
pub struct Compiler<'a> {
    resolver: &'a dyn Resolver,
    options: Options,

    /// Formal parameters of a compiled query, root context first
    formals: Option<Vec<NodeId>>,

    /// Arguments for `formals[1..]`, when compiling for known arguments
    args: Option<Vec<Value>>,
}

/// The result of compiling one query.
#[derive(Debug)]
pub struct CompiledQuery {
    /// Root of the algebra tree
    pub expr: algebra::Expr,

    /// Row shapes used by the tree, one descriptor per distinct shape
    pub initializers: Registry,

    parameters: Vec<Rc<Placeholder>>,
    span: Option<Span>,
    merge_option: MergeOption,
    recompile_required: RecompileRequired,
}

impl<'a> Compiler<'a> {
    pub fn new(resolver: &'a dyn Resolver) -> Compiler<'a> {
        Compiler {
            resolver,
            options: Options::DEFAULT,
            formals: None,
            args: None,
        }
    }

    pub fn options(mut self, options: Options) -> Compiler<'a> {
        self.options = options;
        self
    }

    /// Compiles a query that will run many times with different arguments.
    /// `formals[0]` is the root context.
    pub fn compiled(mut self, formals: Vec<NodeId>) -> Compiler<'a> {
        self.formals = Some(formals);
        self.args = None;
        self
    }

    /// Compiles a query for one set of arguments bound to `formals[1..]`.
    pub fn evaluate(mut self, formals: Vec<NodeId>, args: Vec<Value>) -> Compiler<'a> {
        self.formals = Some(formals);
        self.args = Some(args);
        self
    }

    #[instrument(name = "compile", level = "debug", skip(self, ast))]
    pub fn compile(&self, ast: &mut Ast, root: NodeId) -> Result<CompiledQuery> {
        let root = normalize(ast, root);

        let funcletizer = Funcletizer::new(self.resolver, self.options);
        let funcletizer = match (&self.formals, &self.args) {
            (Some(formals), None) => funcletizer.compiled(formals.clone()),
            (Some(formals), Some(args)) => funcletizer.evaluate(formals.clone(), args.clone()),
            (None, _) => funcletizer,
        };

        let funcletized = funcletizer.funcletize(ast, root)?;
        let translation = translate(
            self.resolver,
            &self.options,
            ast,
            funcletized.root,
            funcletizer.root_context(),
        )?;

        // Placeholders already in the tree come first, then the ones the
        // funcletizer created
        let parameters: IndexSet<ByAddress<Rc<Placeholder>>> = ast
            .placeholders(funcletized.root)
            .into_iter()
            .chain(funcletized.placeholders)
            .map(ByAddress)
            .collect();

        debug!(
            parameters = parameters.len(),
            captures = funcletized.recompile_required.len(),
            "compiled"
        );

        Ok(CompiledQuery {
            expr: translation.expr,
            initializers: translation.initializers,
            parameters: parameters.into_iter().map(|p| p.0).collect(),
            span: translation.span,
            merge_option: funcletized
                .merge_option
                .or(translation.merge_option)
                .unwrap_or(self.options.merge_option),
            recompile_required: funcletized.recompile_required,
        })
    }
}

impl CompiledQuery {
    /// Parameters of the compiled query, by name, in the order they first
    /// appear.
    pub fn parameters(&self) -> impl ExactSizeIterator<Item = (&str, &Rc<Placeholder>)> + '_ {
        self.parameters
            .iter()
            .map(|placeholder| (placeholder.name(), placeholder))
    }

    /// Values of the parameters for one execution.
    pub fn parameter_values(&self, args: &[Value]) -> Result<Vec<(String, Value)>> {
        self.parameters
            .iter()
            .map(|placeholder| Ok((placeholder.name().to_string(), placeholder.evaluate(args)?)))
            .collect()
    }

    /// Navigation paths to load along with the query result.
    pub fn span(&self) -> Option<&Span> {
        self.span.as_ref()
    }

    pub fn merge_option(&self) -> MergeOption {
        self.merge_option
    }

    /// Returns `true` when a captured query inlined into this one has since
    /// been replaced and the query must be compiled again.
    pub fn recompile_required(&self) -> bool {
        self.recompile_required.check()
    }
}

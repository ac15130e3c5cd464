//! Translation of a funcletized source tree into the relational algebra.
//!
//! The translator walks the tree from the root and builds one algebra node
//! per source node, with an exhaustive match over the source node kinds.
//! Lambdas never become algebra nodes of their own: the query operator that
//! receives a lambda binds its parameter to the variable of the collection
//! it ranges over and translates the body in that scope.
//!
//! Read-only inputs travel in a [`TranslationContext`], copied into each
//! recursive call. Everything that accumulates (scope bindings, initializer
//! descriptors, eager-load spans, generated aliases) lives in a single
//! [`TranslationState`].

mod construct;
mod functions;
mod members;
mod operators;
mod sequence;

use crate::{
    binding::ScopeBinder,
    initializer::Registry,
    lift::OrderLifter,
    span::{Span, SpanMap},
    Options,
};
use quarry_core::{
    algebra::{self, Binding, Type},
    ast::{Ast, Expr, ExprLambda, ExprUnary, MergeOption, NodeId, UnaryOp},
    schema::{HostType, Resolver},
    Error, Result,
};
use tracing::{debug, instrument};

/// Read-only inputs of a translation.
#[derive(Clone, Copy)]
pub struct TranslationContext<'a> {
    pub resolver: &'a dyn Resolver,
    pub options: &'a Options,
    pub ast: &'a Ast,

    /// Root of the whole query. `First` and `Single` are only legal here.
    pub root: NodeId,

    /// The compiled query's root-context parameter
    pub root_context: Option<NodeId>,

    /// Non-zero while translating a subtree whose `Include` paths are
    /// dropped, such as the right side of `Except`
    suppress_includes: usize,
}

/// State accumulated over one translation.
#[derive(Debug)]
pub struct TranslationState {
    pub bindings: ScopeBinder,
    pub initializers: Registry,
    pub spans: SpanMap,
    lifter: OrderLifter,
    alias_prefix: &'static str,
    next_alias: usize,

    /// Set by `MergeAs`
    merge_option: Option<MergeOption>,
}

/// A translated query.
#[derive(Debug)]
pub struct Translation {
    pub expr: algebra::Expr,

    /// Eager-load paths of the query result
    pub span: Option<Span>,

    /// Merge option requested inside the query
    pub merge_option: Option<MergeOption>,
    pub initializers: Registry,
}

/// Translates the tree rooted at `root`.
#[instrument(name = "translate", level = "debug", skip(resolver, options, ast))]
pub fn translate(
    resolver: &dyn Resolver,
    options: &Options,
    ast: &Ast,
    root: NodeId,
    root_context: Option<NodeId>,
) -> Result<Translation> {
    let cx = TranslationContext {
        resolver,
        options,
        ast,
        root,
        root_context,
        suppress_includes: 0,
    };
    let mut state = TranslationState::new(options);

    let expr = cx.translate(&mut state, root)?;
    debug!(%expr, initializers = state.initializers.len(), "translated");

    Ok(Translation {
        expr,
        span: state.spans.get(root).cloned(),
        merge_option: state.merge_option,
        initializers: state.initializers,
    })
}

impl<'a> TranslationContext<'a> {
    pub fn new(
        resolver: &'a dyn Resolver,
        options: &'a Options,
        ast: &'a Ast,
        root: NodeId,
    ) -> TranslationContext<'a> {
        TranslationContext {
            resolver,
            options,
            ast,
            root,
            root_context: None,
            suppress_includes: 0,
        }
    }

    pub fn with_root_context(self, root_context: Option<NodeId>) -> TranslationContext<'a> {
        TranslationContext {
            root_context,
            ..self
        }
    }

    /// Translates one node.
    ///
    /// A lambda parameter bound in an enclosing scope translates to the
    /// expression it is bound to.
    pub fn translate(self, state: &mut TranslationState, id: NodeId) -> Result<algebra::Expr> {
        if let Some(bound) = state.bindings.resolve(id) {
            return Ok(bound.clone());
        }

        match self.ast.expr(id) {
            Expr::Binary(binary) => self.binary(state, id, binary),
            Expr::Call(call) => self.call(state, id, call),
            Expr::Closure(_) => Err(Error::unsupported_construct(
                "a closure that was not evaluated locally",
            )),
            Expr::Conditional(conditional) => Ok(algebra::Expr::case(
                self.translate(state, conditional.test)?,
                self.translate(state, conditional.then)?,
                self.translate(state, conditional.otherwise)?,
            )),
            Expr::Constant(value) => self.constant(id, value),
            Expr::EntitySet(name) => self.entity_set(name),
            Expr::Lambda(_) => Err(Error::unsupported_construct(
                "a lambda outside of a query operator",
            )),
            Expr::Member(member) => self.member(state, member),
            Expr::MemberInit(init) => self.member_init(state, id, init),
            Expr::New(new) => self.new_object(state, id, new),
            Expr::NewArray(array) => self.new_array(state, id, array),
            Expr::Parameter(param) if self.root_context == Some(id) => {
                Err(Error::root_context_misuse(&param.name))
            }
            Expr::Parameter(param) => Err(Error::unbound_parameter(&param.name)),
            Expr::Placeholder(placeholder) => Ok(algebra::Expr::param(
                placeholder.name(),
                self.algebra_type(placeholder.ty())?,
            )),
            Expr::TypeAs(test) => {
                let ty = self.type_test_target(&test.ty)?;
                Ok(algebra::Expr::treat(self.translate(state, test.expr)?, ty))
            }
            Expr::TypeIs(test) => {
                let ty = self.type_test_target(&test.ty)?;
                Ok(algebra::Expr::is_of(self.translate(state, test.expr)?, ty))
            }
            Expr::Unary(unary) => self.unary(state, id, unary),
        }
    }

    /// Algebra type of a host type.
    fn algebra_type(&self, ty: &HostType) -> Result<Type> {
        self.resolver
            .type_for_host_type(ty)
            .ok_or_else(|| Error::unsupported_construct(format!("values of type `{ty}`")))
    }

    /// Algebra type of a node's host type.
    fn node_type(&self, id: NodeId) -> Result<Type> {
        self.algebra_type(self.ast.ty(id))
    }

    /// The lambda behind an operator argument, looking through `Quote`.
    fn lambda(&self, id: NodeId) -> Result<&'a ExprLambda> {
        let ast = self.ast;
        match ast.expr(id) {
            Expr::Lambda(lambda) => Ok(lambda),
            Expr::Unary(ExprUnary {
                op: UnaryOp::Quote,
                operand,
            }) => self.lambda(*operand),
            _ => Err(Error::unsupported_construct(
                "a query operator argument that is not a lambda",
            )),
        }
    }

    fn lambda_arity(&self, id: NodeId) -> usize {
        self.lambda(id).map_or(0, |lambda| lambda.params.len())
    }

    /// Runs `f` on the body of `lambda` with its parameters bound to `args`.
    fn in_scope<T>(
        self,
        state: &mut TranslationState,
        lambda: NodeId,
        args: Vec<algebra::Expr>,
        f: impl FnOnce(Self, &mut TranslationState, NodeId) -> Result<T>,
    ) -> Result<T> {
        let lambda = self.lambda(lambda)?;
        if lambda.params.len() != args.len() {
            return Err(Error::unsupported_construct(format!(
                "a lambda with {} parameters where {} are expected",
                lambda.params.len(),
                args.len()
            )));
        }

        for (&param, arg) in lambda.params.iter().zip(args) {
            state.bindings.push(param, arg);
        }

        let ret = f(self, state, lambda.body);

        for _ in &lambda.params {
            state.bindings.pop();
        }

        ret
    }

    /// Translates the body of `lambda` with its parameters bound to `args`.
    fn apply_lambda(
        self,
        state: &mut TranslationState,
        lambda: NodeId,
        args: Vec<algebra::Expr>,
    ) -> Result<algebra::Expr> {
        self.in_scope(state, lambda, args, |cx, state, body| {
            cx.translate(state, body)
        })
    }

    /// A context whose `Include` calls record nothing.
    fn suppressing_includes(self) -> Self {
        TranslationContext {
            suppress_includes: self.suppress_includes + 1,
            ..self
        }
    }

    fn includes_suppressed(&self) -> bool {
        self.suppress_includes > 0
    }
}

impl TranslationState {
    pub fn new(options: &Options) -> TranslationState {
        TranslationState {
            bindings: ScopeBinder::new(),
            initializers: Registry::new(),
            spans: SpanMap::new(),
            lifter: OrderLifter::new(),
            alias_prefix: options.alias_prefix,
            next_alias: 0,
            merge_option: None,
        }
    }

    /// A fresh binding variable name.
    pub fn alias(&mut self) -> String {
        let alias = format!("{}{}", self.alias_prefix, self.next_alias);
        self.next_alias += 1;
        alias
    }

    /// Binds `expr` to a fresh variable.
    pub fn bind(&mut self, expr: algebra::Expr) -> Binding {
        Binding::new(self.alias(), expr)
    }

    pub fn merge_option(&self) -> Option<MergeOption> {
        self.merge_option
    }
}

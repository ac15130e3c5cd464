//! Partial evaluation of the parts of a query that never reach the backend.
//!
//! Queries mix expressions over entities, which must be translated, with
//! expressions over values the caller already has: literals, captured
//! variables, arithmetic on both. The funcletizer finds the maximal subtrees
//! of the second kind and replaces each one with either
//!
//! * a constant, when the subtree cannot change between executions, or
//! * a [`Placeholder`], when it reads state that may change, such as a
//!   captured variable or a compiled query's formal parameter.
//!
//! Captured queries are inlined in place. Their identity and merge option
//! are remembered so [`RecompileRequired`] can tell when the compiled form is
//! stale.

mod local;
mod nominate;

use crate::Options;
use indexmap::{IndexMap, IndexSet};
use quarry_core::{
    algebra::Value,
    ast::{Ast, Captured, Closure, EmbeddedQuery, Evaluator, Expr, MergeOption, NodeId, Placeholder},
    schema::Resolver,
    Error, Result,
};
use std::rc::Rc;
use tracing::{debug, instrument, trace};

/// What may be evaluated locally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// A query compiled for one execution. Formal parameters do not exist.
    #[default]
    Conventional,

    /// A compiled query being prepared for repeated execution. References to
    /// formal parameters become placeholders that read the supplied
    /// arguments.
    CompiledLockdown,

    /// A compiled query being prepared with known arguments. Formal
    /// parameters are constants.
    CompiledEvaluation,
}

pub struct Funcletizer<'a> {
    resolver: &'a dyn Resolver,
    options: Options,
    mode: Mode,

    /// Formal parameters of a compiled query. The first is the root context.
    formals: Vec<NodeId>,

    /// Values of `formals[1..]` in evaluation mode
    args: Vec<Value>,
}

/// Result of funcletizing a tree.
#[derive(Debug)]
pub struct Funcletized {
    pub root: NodeId,

    /// Placeholders in the rewritten tree, in the order they were created
    pub placeholders: Vec<Rc<Placeholder>>,

    pub recompile_required: RecompileRequired,

    /// Merge option of the captured query the whole tree was inlined from
    pub merge_option: Option<MergeOption>,
}

/// Reports whether a compiled query is out of date with respect to the
/// captured queries it inlined.
#[derive(Debug, Clone, Default)]
pub struct RecompileRequired {
    captures: Vec<QueryCapture>,
}

#[derive(Debug, Clone)]
struct QueryCapture {
    closure: Closure,
    name: String,
    query: Rc<dyn EmbeddedQuery>,
    merge_option: Option<MergeOption>,
}

/// Locality of a node, computed bottom-up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Local {
    /// The value is the same on every execution
    constant: bool,

    /// The value is known before execution, but may differ between
    /// executions
    variable: bool,
}

struct Pass<'a, 'b> {
    funcletizer: &'b Funcletizer<'a>,
    ast: &'b mut Ast,
    nominations: IndexMap<NodeId, Local>,

    /// Nodes on the current nomination path
    nominating: IndexSet<NodeId>,
    done: IndexMap<NodeId, NodeId>,

    /// Nodes on the current path
    active: IndexSet<NodeId>,

    /// Captured queries currently being inlined
    grafting: Vec<Rc<dyn EmbeddedQuery>>,

    /// Values of the formal parameters in evaluation mode
    env: IndexMap<NodeId, Value>,
    next_placeholder: usize,
    placeholders: Vec<Rc<Placeholder>>,
    captures: Vec<QueryCapture>,
}

impl<'a> Funcletizer<'a> {
    pub fn new(resolver: &'a dyn Resolver, options: Options) -> Funcletizer<'a> {
        Funcletizer {
            resolver,
            options,
            mode: Mode::Conventional,
            formals: vec![],
            args: vec![],
        }
    }

    /// Prepares a compiled query whose formal parameters are read from
    /// execution arguments. `formals[0]` is the root context.
    pub fn compiled(mut self, formals: Vec<NodeId>) -> Funcletizer<'a> {
        self.mode = Mode::CompiledLockdown;
        self.formals = formals;
        self
    }

    /// Prepares a compiled query with `args` bound to `formals[1..]`.
    pub fn evaluate(mut self, formals: Vec<NodeId>, args: Vec<Value>) -> Funcletizer<'a> {
        self.mode = Mode::CompiledEvaluation;
        self.formals = formals;
        self.args = args;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The root-context parameter of a compiled query.
    pub fn root_context(&self) -> Option<NodeId> {
        match self.mode {
            Mode::Conventional => None,
            _ => self.formals.first().copied(),
        }
    }

    #[instrument(name = "funcletize", level = "debug", skip(self, ast), fields(mode = ?self.mode))]
    pub fn funcletize(&self, ast: &mut Ast, root: NodeId) -> Result<Funcletized> {
        let env = self.bind_formals(ast)?;
        let next_placeholder = ast.placeholders(root).len();

        let merge_option = match ast.expr(root) {
            Expr::Member(member) => match member.receiver.map(|receiver| ast.expr(receiver)) {
                Some(Expr::Closure(closure)) => match closure.get(&member.name) {
                    Ok(Captured::Query(query)) => query.merge_option(),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        };

        let mut pass = Pass {
            funcletizer: self,
            ast,
            nominations: IndexMap::new(),
            nominating: IndexSet::new(),
            done: IndexMap::new(),
            active: IndexSet::new(),
            grafting: vec![],
            env,
            next_placeholder,
            placeholders: vec![],
            captures: vec![],
        };

        let root = pass.rewrite(root)?;
        debug!(
            placeholders = pass.placeholders.len(),
            captured_queries = pass.captures.len(),
            "funcletized"
        );

        Ok(Funcletized {
            root,
            placeholders: pass.placeholders,
            recompile_required: RecompileRequired {
                captures: pass.captures,
            },
            merge_option,
        })
    }

    /// Checks the formal parameters and, in evaluation mode, pairs them with
    /// their arguments.
    fn bind_formals(&self, ast: &Ast) -> Result<IndexMap<NodeId, Value>> {
        let mut env = IndexMap::new();
        let formals = self.formals.iter().skip(1);

        match self.mode {
            Mode::Conventional => {}
            Mode::CompiledLockdown => {
                for &formal in formals {
                    let ty = ast.ty(formal);
                    if self.resolver.type_for_host_type(ty).is_none() {
                        return Err(Error::unsupported_parameter_type(
                            parameter_name(ast, formal),
                            ty,
                        ));
                    }
                }
            }
            Mode::CompiledEvaluation => {
                if self.formals.len().saturating_sub(1) != self.args.len() {
                    return Err(Error::invalid_operation(format!(
                        "compiled query expects {} arguments, got {}",
                        self.formals.len().saturating_sub(1),
                        self.args.len()
                    )));
                }
                env.extend(formals.copied().zip(self.args.iter().cloned()));
            }
        }

        Ok(env)
    }

    fn is_formal(&self, id: NodeId) -> bool {
        self.mode != Mode::Conventional && self.formals.iter().skip(1).any(|&formal| formal == id)
    }

    /// Formal parameters supplied per execution, with their argument index.
    fn arguments(&self) -> impl Iterator<Item = (usize, NodeId)> + '_ {
        let formals: &[NodeId] = match self.mode {
            Mode::CompiledLockdown => self.formals.get(1..).unwrap_or_default(),
            _ => &[],
        };
        formals.iter().copied().enumerate()
    }

    /// Number of arguments each execution supplies.
    fn arity(&self) -> usize {
        self.arguments().count()
    }
}

impl RecompileRequired {
    /// Returns `true` if any captured query was replaced, or had its merge
    /// option changed, since the query was compiled.
    pub fn check(&self) -> bool {
        self.captures.iter().any(|capture| {
            match capture.closure.get(&capture.name) {
                Ok(Captured::Query(current)) => {
                    !Rc::ptr_eq(&current, &capture.query)
                        || current.merge_option() != capture.merge_option
                }
                _ => true,
            }
        })
    }

    /// Number of captured queries being watched.
    pub fn len(&self) -> usize {
        self.captures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }
}

impl Pass<'_, '_> {
    fn rewrite(&mut self, id: NodeId) -> Result<NodeId> {
        if let Some(&done) = self.done.get(&id) {
            return Ok(done);
        }

        let local = self.nominate(id)?;

        if !self.active.insert(id) {
            return Err(Error::cycle_detected(id.index()));
        }

        let ret = if local.constant && self.is_candidate(id) {
            self.fold(id)?
        } else if local.variable && self.is_candidate(id) {
            self.parameterize(id)?
        } else if let Some((closure, name, query)) = self.captured_query(id) {
            self.graft(closure, name, query)?
        } else {
            let expr = self.ast.expr(id).clone();
            let mapped = expr.try_map_children(|child| self.rewrite(child))?;

            if mapped.children() == expr.children() {
                id
            } else {
                let ty = self.ast.ty(id).clone();
                self.ast.push(mapped, ty)
            }
        };

        self.active.swap_remove(&id);
        self.done.insert(id, ret);
        Ok(ret)
    }

    /// Whether a local node may be replaced as a whole. Literals already are
    /// constants; closures and lambdas have no value of their own.
    fn is_candidate(&self, id: NodeId) -> bool {
        !matches!(
            self.ast.expr(id),
            Expr::Constant(_) | Expr::Closure(_) | Expr::Lambda(_)
        )
    }

    fn fold(&mut self, id: NodeId) -> Result<NodeId> {
        let value = local::evaluate(self.ast, id, &self.env)?;
        trace!(?id, %value, "folded local expression");
        let ty = self.ast.ty(id).clone();
        Ok(self.ast.push(value, ty))
    }

    fn parameterize(&mut self, id: NodeId) -> Result<NodeId> {
        // Reached formals, ordered by declaration, with their argument index
        let reachable = self.reachable(id);
        let outer: Vec<(usize, NodeId)> = self
            .funcletizer
            .arguments()
            .filter(|(_, formal)| reachable.contains(formal))
            .collect();
        let outer_names = outer
            .iter()
            .map(|&(_, formal)| parameter_name(self.ast, formal))
            .collect();

        let (snapshot, source, map) = local::detach(self.ast, id);
        let outer: Vec<(usize, NodeId)> = outer
            .iter()
            .filter_map(|&(index, formal)| Some((index, *map.get(&formal)?)))
            .collect();
        let arity = self.funcletizer.arity();
        let evaluator: Evaluator = Rc::new(move |args: &[Value]| {
            if args.len() != arity {
                return Err(Error::invalid_operation(format!(
                    "compiled query expects {arity} arguments, got {}",
                    args.len()
                )));
            }
            let env: IndexMap<NodeId, Value> = outer
                .iter()
                .map(|&(index, formal)| (formal, args[index].clone()))
                .collect();
            local::evaluate(&snapshot, source, &env)
        });

        let name = format!(
            "{}{}",
            self.funcletizer.options.parameter_prefix, self.next_placeholder
        );
        self.next_placeholder += 1;
        debug!(%name, ?id, "created placeholder");

        let ty = self.ast.ty(id).clone();
        let placeholder = Rc::new(Placeholder::new(name, ty, id, outer_names, evaluator));
        self.placeholders.push(placeholder.clone());
        Ok(self.ast.placeholder(placeholder))
    }

    /// A member access reading a query out of a closure.
    fn captured_query(&self, id: NodeId) -> Option<(Closure, String, Rc<dyn EmbeddedQuery>)> {
        let Expr::Member(member) = self.ast.expr(id) else {
            return None;
        };
        let Expr::Closure(closure) = self.ast.expr(member.receiver?) else {
            return None;
        };

        match closure.get(&member.name) {
            Ok(Captured::Query(query)) => Some((closure.clone(), member.name.clone(), query)),
            _ => None,
        }
    }

    /// Inlines a captured query and funcletizes the result.
    fn graft(
        &mut self,
        closure: Closure,
        name: String,
        query: Rc<dyn EmbeddedQuery>,
    ) -> Result<NodeId> {
        if self.grafting.iter().any(|active| Rc::ptr_eq(active, &query)) {
            return Err(Error::cycle_detected(format!("captured query `{name}`")));
        }

        debug!(%name, "inlining captured query");
        self.captures.push(QueryCapture {
            closure,
            name,
            merge_option: query.merge_option(),
            query: query.clone(),
        });

        let root = query.graft(self.ast)?;
        self.grafting.push(query);
        let ret = self.rewrite(root);
        self.grafting.pop();
        ret
    }

    /// Nodes reachable from `id`, each once.
    fn reachable(&self, id: NodeId) -> Vec<NodeId> {
        let mut seen = IndexSet::new();
        let mut stack = vec![id];

        while let Some(id) = stack.pop() {
            if seen.insert(id) {
                stack.extend(self.ast.children(id));
            }
        }

        seen.into_iter().collect()
    }
}

fn parameter_name(ast: &Ast, id: NodeId) -> String {
    match ast.expr(id) {
        Expr::Parameter(param) => param.name.clone(),
        _ => format!("#{}", id.index()),
    }
}

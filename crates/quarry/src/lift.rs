//! Order-preserving composition of relational operators.
//!
//! In the algebra only `Sort` and `Skip` define an element order; filters,
//! projections, type filters, and limits are free to emit their input in
//! any order. A query such as `OrderBy(d).Take(3).Where(p)` still promises
//! its results in `d` order, so when one of these operators lands on an
//! ordered input the lifter re-associates it so the order survives: the sort
//! is re-applied above the operator, or the operator is pushed below a
//! projection.
//!
//! Re-applied sorts reuse the original sort's binding variable, so the sort
//! keys carry over without rewriting.

use quarry_core::{
    algebra::{Binding, Expr, SetOp, SortKey, Type, Value},
    Error, Result,
};
use tracing::trace;

/// How an operator's input is ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `sort(I as v, K)`
    Sort,

    /// `skip(I as v, K, k)`
    Skip,

    /// `limit(X, n)` over an input with no order
    Limit,

    /// `project(sort(..) as w, p)`
    SortProject,

    /// `project(skip(..) as w, p)`
    SkipProject,

    /// `limit(sort(..), n)`
    SortLimit,

    /// `limit(skip(..), n)`
    SkipLimit,

    /// `project(limit(sort(..), n) as w, p)`
    SortLimitProject,

    /// `project(limit(skip(..), n) as w, p)`
    SkipLimitProject,

    /// No order to preserve
    Unordered,
}

impl Shape {
    pub fn of(expr: &Expr) -> Shape {
        match expr {
            Expr::Sort(_) => Shape::Sort,
            Expr::Skip(_) => Shape::Skip,
            Expr::Limit(limit) => match &*limit.input {
                Expr::Sort(_) => Shape::SortLimit,
                Expr::Skip(_) => Shape::SkipLimit,
                _ => Shape::Limit,
            },
            Expr::Project(project) => match Shape::of(&project.input.expr) {
                Shape::Sort => Shape::SortProject,
                Shape::Skip => Shape::SkipProject,
                Shape::SortLimit => Shape::SortLimitProject,
                Shape::SkipLimit => Shape::SkipLimitProject,
                _ => Shape::Unordered,
            },
            _ => Shape::Unordered,
        }
    }

    pub fn is_project(self) -> bool {
        matches!(
            self,
            Shape::SortProject
                | Shape::SkipProject
                | Shape::SortLimitProject
                | Shape::SkipLimitProject
        )
    }
}

/// Builds the relational operators of a query. Filters, projections, type
/// filters, skips, and limits keep the order of their input.
#[derive(Debug, Default, Clone, Copy)]
pub struct OrderLifter {}

impl OrderLifter {
    pub fn new() -> OrderLifter {
        OrderLifter {}
    }

    /// Starts a new order.
    pub fn sort(&self, input: Binding, keys: Vec<SortKey>) -> Expr {
        Expr::sort(input, keys)
    }

    /// Adds keys to the order established by the preceding sort.
    ///
    /// `method` names the calling operator for the error raised when the
    /// input is not a sort.
    pub fn then_by(&self, input: Binding, keys: Vec<SortKey>, method: &str) -> Result<Expr> {
        let Expr::Sort(mut sort) = *input.expr else {
            return Err(Error::then_by_without_order_by(method));
        };

        for key in keys {
            sort.keys.push(SortKey {
                expr: key.expr.rebind(&input.var, &sort.input),
                ascending: key.ascending,
            });
        }

        Ok(sort.into())
    }

    /// Duplicate elimination. The result has no order.
    pub fn distinct(&self, input: Expr) -> Expr {
        Expr::distinct(input)
    }

    /// Set operations discard the order of both inputs.
    pub fn set_op(&self, op: SetOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::set_op(op, lhs, rhs)
    }

    pub fn filter(&self, input: Binding, predicate: Expr) -> Expr {
        let shape = Shape::of(&input.expr);
        trace!(?shape, "lifting filter");

        match *input.expr {
            Expr::Sort(sort) => {
                let predicate = predicate.rebind(&input.var, &sort.input);
                let var = sort.input.var.clone();
                resort(var, Expr::filter(sort.input, predicate), sort.keys)
            }
            Expr::Project(project) if shape.is_project() => {
                let predicate = predicate.substitute(&input.var, &project.projection);
                let var = project.input.var.clone();
                let filtered = self.filter(project.input, predicate);
                Expr::project(Binding::new(var, filtered), *project.projection)
            }
            expr => match ordering(&expr) {
                // skip, sort+limit, skip+limit: filter the ordered result and
                // sort it again
                Some((var, keys)) => {
                    let ordered = Binding::new(var.clone(), expr);
                    let predicate = predicate.rebind(&input.var, &ordered);
                    resort(var, Expr::filter(ordered, predicate), keys)
                }
                None => Expr::filter(
                    Binding {
                        var: input.var,
                        expr: Box::new(expr),
                    },
                    predicate,
                ),
            },
        }
    }

    pub fn project(&self, input: Binding, projection: Expr) -> Expr {
        let shape = Shape::of(&input.expr);
        trace!(?shape, "lifting project");

        match *input.expr {
            Expr::Project(project) if shape.is_project() => {
                let projection = projection.substitute(&input.var, &project.projection);
                Expr::project(project.input, projection)
            }
            expr => Expr::project(
                Binding {
                    var: input.var,
                    expr: Box::new(expr),
                },
                projection,
            ),
        }
    }

    pub fn of_type(&self, input: Expr, ty: Type) -> Expr {
        let shape = Shape::of(&input);
        trace!(?shape, %ty, "lifting type filter");

        match input {
            Expr::Sort(sort) => {
                let var = sort.input.var.clone();
                resort(var, Expr::of_type(*sort.input.expr, ty), sort.keys)
            }
            Expr::Project(project) if shape.is_project() => {
                let var = project.input.var.clone();
                let test = Expr::is_of(project.projection.as_ref().clone(), ty.clone());
                let filtered = self.filter(project.input, test);
                Expr::project(
                    Binding::new(var, filtered),
                    Expr::treat(*project.projection, ty),
                )
            }
            input => match ordering(&input) {
                Some((var, keys)) => resort(var, Expr::of_type(input, ty), keys),
                None => Expr::of_type(input, ty),
            },
        }
    }

    pub fn limit(&self, input: Expr, count: Expr) -> Expr {
        let shape = Shape::of(&input);
        trace!(?shape, "lifting limit");

        match input {
            Expr::Limit(limit) => {
                if let (Some(outer), Some(inner)) = (count.as_const_i64(), limit.count.as_const_i64())
                {
                    return Expr::limit(*limit.input, const_count(outer.min(inner), &count));
                }

                match ordering(&limit.input) {
                    // Re-apply the order between the two limits
                    Some((var, keys)) => {
                        Expr::limit(resort(var, Expr::Limit(limit), keys), count)
                    }
                    None => Expr::limit(Expr::Limit(limit), count),
                }
            }
            Expr::Project(project) if shape.is_project() => {
                let limited = self.limit(*project.input.expr, count);
                Expr::project(Binding::new(project.input.var, limited), *project.projection)
            }
            input => Expr::limit(input, count),
        }
    }

    /// Skips `count` elements of an ordered input.
    ///
    /// Fails when the input has no order: without one, which elements are
    /// skipped is undefined.
    pub fn skip(&self, input: Expr, count: Expr) -> Result<Expr> {
        let shape = Shape::of(&input);
        trace!(?shape, "lifting skip");

        match input {
            Expr::Sort(sort) => Ok(Expr::skip(sort.input, sort.keys, count)),
            Expr::Skip(skip) => {
                if let (Some(first), Some(second)) = (skip.count.as_const_i64(), count.as_const_i64())
                {
                    let total = const_count(first.saturating_add(second), &count);
                    return Ok(Expr::skip(skip.input, skip.keys, total));
                }

                let var = skip.input.var.clone();
                let keys = skip.keys.clone();
                Ok(Expr::skip(Binding::new(var, Expr::Skip(skip)), keys, count))
            }
            Expr::Limit(limit) if shape == Shape::SkipLimit => {
                let consts = match &*limit.input {
                    Expr::Skip(inner) => inner
                        .count
                        .as_const_i64()
                        .zip(limit.count.as_const_i64())
                        .zip(count.as_const_i64()),
                    _ => None,
                };

                match (consts, *limit.input) {
                    (Some(((first, take), second)), Expr::Skip(inner)) => {
                        let skipped = Expr::skip(
                            inner.input,
                            inner.keys,
                            const_count(first.saturating_add(second), &count),
                        );
                        let remaining =
                            const_count(take.saturating_sub(second).max(0), &limit.count);
                        Ok(Expr::limit(skipped, remaining))
                    }
                    (_, inner) => {
                        let (var, keys) = ordering(&inner).unwrap_or_default();
                        let limit = Expr::limit(inner, *limit.count);
                        Ok(Expr::skip(Binding::new(var, limit), keys, count))
                    }
                }
            }
            Expr::Limit(limit) if shape == Shape::SortLimit => {
                let (var, keys) = ordering(&limit.input).unwrap_or_default();
                Ok(Expr::skip(Binding::new(var, Expr::Limit(limit)), keys, count))
            }
            Expr::Project(project) if shape.is_project() => {
                let skipped = self.skip(*project.input.expr, count)?;
                Ok(Expr::project(
                    Binding::new(project.input.var, skipped),
                    *project.projection,
                ))
            }
            _ => Err(Error::skip_without_order()),
        }
    }
}

/// Binding variable and keys of the order `expr` establishes: sorts, skips,
/// and limits over either.
fn ordering(expr: &Expr) -> Option<(String, Vec<SortKey>)> {
    match expr {
        Expr::Sort(sort) => Some((sort.input.var.clone(), sort.keys.clone())),
        Expr::Skip(skip) => Some((skip.input.var.clone(), skip.keys.clone())),
        Expr::Limit(limit) if matches!(&*limit.input, Expr::Sort(_) | Expr::Skip(_)) => {
            ordering(&limit.input)
        }
        _ => None,
    }
}

fn resort(var: String, input: Expr, keys: Vec<SortKey>) -> Expr {
    Expr::sort(Binding::new(var, input), keys)
}

/// A count literal of the same width as `like`.
fn const_count(count: i64, like: &Expr) -> Expr {
    match (like.as_value(), i32::try_from(count)) {
        (Some(Value::I32(_)), Ok(count)) => Expr::from(count),
        _ => Expr::from(count),
    }
}

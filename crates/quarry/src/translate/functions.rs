use super::{sequence, TranslationContext, TranslationState};
use indexmap::IndexMap;
use quarry_core::{
    algebra::{self, ExprFunc, Type, Value},
    ast::{ExprCall, FunctionAttribute, NodeId},
    Error, Result,
};
use std::sync::LazyLock;
use tracing::trace;

/// How a host method translates.
#[derive(Clone, Copy)]
enum FunctionRule {
    /// The canonical function `name`, with the receiver (if any) followed by
    /// the arguments
    Canonical(&'static str),

    Custom(fn(TranslationContext<'_>, NodeId, Vec<algebra::Expr>) -> Result<algebra::Expr>),
}

/// Host methods with a canonical translation, keyed by `Owner.Name`.
static FUNCTIONS: LazyLock<IndexMap<&'static str, FunctionRule>> = LazyLock::new(|| {
    use FunctionRule::*;

    IndexMap::from([
        ("String.Concat", Custom(concat)),
        ("String.Contains", Custom(contains)),
        ("String.EndsWith", Custom(ends_with)),
        ("String.IndexOf", Custom(index_of)),
        ("String.IsNullOrEmpty", Custom(is_null_or_empty)),
        ("String.Insert", Custom(insert)),
        ("String.Remove", Custom(remove)),
        ("String.Replace", Canonical("Replace")),
        ("String.Reverse", Canonical("Reverse")),
        ("String.StartsWith", Custom(starts_with)),
        ("String.Substring", Custom(substring)),
        ("String.ToLower", Canonical("ToLower")),
        ("String.ToUpper", Canonical("ToUpper")),
        ("String.Trim", Canonical("Trim")),
        ("String.TrimEnd", Canonical("RTrim")),
        ("String.TrimStart", Canonical("LTrim")),
        ("Math.Abs", Canonical("Abs")),
        ("Math.Ceiling", Canonical("Ceiling")),
        ("Math.Floor", Canonical("Floor")),
        ("Math.Power", Canonical("Power")),
        ("Math.Round", Canonical("Round")),
        ("Math.Truncate", Canonical("Truncate")),
        ("Guid.NewGuid", Canonical("NewGuid")),
        ("Object.Equals", Custom(equals)),
        // Visual Basic runtime helpers
        ("Strings.Trim", Canonical("Trim")),
        ("Strings.LTrim", Canonical("LTrim")),
        ("Strings.RTrim", Canonical("RTrim")),
        ("Strings.Left", Canonical("Left")),
        ("Strings.Right", Canonical("Right")),
        ("Strings.Len", Canonical("Length")),
        ("Strings.Mid", Canonical("Substring")),
        ("Strings.UCase", Canonical("ToUpper")),
        ("Strings.LCase", Canonical("ToLower")),
        ("DateAndTime.Year", Canonical("Year")),
        ("DateAndTime.Month", Canonical("Month")),
        ("DateAndTime.Day", Canonical("Day")),
        ("DateAndTime.Hour", Canonical("Hour")),
        ("DateAndTime.Minute", Canonical("Minute")),
        ("DateAndTime.Second", Canonical("Second")),
    ])
});

impl TranslationContext<'_> {
    /// Translates a method call.
    ///
    /// Query operators come first, then methods with a canonical
    /// translation. Any other method must be bound to a model function.
    pub(super) fn call(
        self,
        state: &mut TranslationState,
        id: NodeId,
        call: &ExprCall,
    ) -> Result<algebra::Expr> {
        if call.method.is_sequence_operator() {
            let rule = sequence::operator(&call.method.name).ok_or_else(|| {
                Error::unsupported_construct(format!("query operator `{}`", call.method))
            })?;
            return rule(self, state, id, call);
        }

        let args = call
            .object
            .iter()
            .chain(&call.args)
            .map(|&arg| self.translate(state, arg))
            .collect::<Result<Vec<_>>>()?;

        match FUNCTIONS.get(call.method.to_string().as_str()) {
            Some(FunctionRule::Canonical(name)) => {
                Ok(algebra::Expr::canonical(*name, args, self.node_type(id)?))
            }
            Some(FunctionRule::Custom(rule)) => rule(self, id, args),
            None => match &call.method.function {
                Some(function) => self.model_function(function, args),
                None => Err(Error::unsupported_construct(format!(
                    "method `{}`",
                    call.method
                ))),
            },
        }
    }

    /// A host method bound to a function in the model, resolved against the
    /// argument types.
    fn model_function(
        &self,
        function: &FunctionAttribute,
        args: Vec<algebra::Expr>,
    ) -> Result<algebra::Expr> {
        let arg_types = args.iter().map(algebra::Expr::ty).collect::<Vec<_>>();
        let resolved = self
            .resolver
            .resolve_overload(&function.namespace, &function.name, &arg_types)?;

        trace!(
            namespace = %function.namespace,
            name = %function.name,
            returns = %resolved.returns,
            "resolved model function"
        );

        Ok(ExprFunc {
            namespace: resolved.namespace.clone(),
            name: resolved.name.clone(),
            args,
            ty: resolved.returns.clone(),
            aggregate: resolved.aggregate,
        }
        .into())
    }
}

fn concat(
    _cx: TranslationContext<'_>,
    _id: NodeId,
    args: Vec<algebra::Expr>,
) -> Result<algebra::Expr> {
    Ok(args
        .into_iter()
        .reduce(|lhs, rhs| algebra::Expr::canonical("Concat", vec![lhs, rhs], Type::String))
        .unwrap_or_else(|| "".into()))
}

/// `s.IndexOf(x)` is zero-based; the canonical function is one-based and
/// takes the needle first.
fn index_of(
    _cx: TranslationContext<'_>,
    _id: NodeId,
    args: Vec<algebra::Expr>,
) -> Result<algebra::Expr> {
    let [string, needle] = string_args(args, "IndexOf")?;
    Ok(algebra::Expr::binary_op(
        algebra::Expr::canonical("IndexOf", vec![needle, string], Type::I32),
        algebra::BinaryOp::Sub,
        1,
    ))
}

fn is_null_or_empty(
    _cx: TranslationContext<'_>,
    _id: NodeId,
    args: Vec<algebra::Expr>,
) -> Result<algebra::Expr> {
    let [string] = string_args(args, "IsNullOrEmpty")?;
    Ok(algebra::Expr::or(
        algebra::Expr::is_null(string.clone()),
        algebra::Expr::eq(
            algebra::Expr::canonical("Length", vec![string], Type::I32),
            0,
        ),
    ))
}

/// `s.Substring(start)` and `s.Substring(start, length)`, shifted to the
/// one-based canonical form.
fn substring(
    _cx: TranslationContext<'_>,
    _id: NodeId,
    args: Vec<algebra::Expr>,
) -> Result<algebra::Expr> {
    let mut args = args.into_iter();
    let (Some(string), Some(start)) = (args.next(), args.next()) else {
        return Err(Error::unsupported_construct("`String.Substring` without a start"));
    };

    let length = match args.next() {
        Some(length) => length,
        None => algebra::Expr::binary_op(
            algebra::Expr::canonical("Length", vec![string.clone()], Type::I32),
            algebra::BinaryOp::Sub,
            start.clone(),
        ),
    };

    let start = algebra::Expr::binary_op(start, algebra::BinaryOp::Add, 1);

    Ok(algebra::Expr::canonical(
        "Substring",
        vec![string, start, length],
        Type::String,
    ))
}

/// `s.Remove(start)` keeps the first `start` characters. `s.Remove(start,
/// count)` also keeps what follows the removed range, and only supports a
/// constant, non-negative `count`.
fn remove(
    _cx: TranslationContext<'_>,
    _id: NodeId,
    args: Vec<algebra::Expr>,
) -> Result<algebra::Expr> {
    let mut args = args.into_iter();
    let (Some(string), Some(start)) = (args.next(), args.next()) else {
        return Err(Error::unsupported_construct("`String.Remove` without a start"));
    };

    let head = algebra::Expr::canonical(
        "Substring",
        vec![string.clone(), 1_i32.into(), start.clone()],
        Type::String,
    );

    let Some(count) = args.next() else {
        return Ok(head);
    };

    if !matches!(count.as_value(), Some(Value::I32(count)) if *count >= 0) {
        return Err(Error::unsupported_construct(
            "`String.Remove` with a count that is not a non-negative constant",
        ));
    }

    let end = algebra::Expr::binary_op(start, algebra::BinaryOp::Add, count);
    let tail = algebra::Expr::canonical(
        "Substring",
        vec![
            string.clone(),
            algebra::Expr::binary_op(end.clone(), algebra::BinaryOp::Add, 1),
            algebra::Expr::binary_op(
                algebra::Expr::canonical("Length", vec![string], Type::I32),
                algebra::BinaryOp::Sub,
                end,
            ),
        ],
        Type::String,
    );

    Ok(algebra::Expr::canonical("Concat", vec![head, tail], Type::String))
}

/// `s.Insert(start, value)` splices `value` in after the first `start`
/// characters.
fn insert(
    _cx: TranslationContext<'_>,
    _id: NodeId,
    args: Vec<algebra::Expr>,
) -> Result<algebra::Expr> {
    let [string, start, value] = string_args(args, "Insert")?;

    let head = algebra::Expr::canonical(
        "Substring",
        vec![string.clone(), 1_i32.into(), start.clone()],
        Type::String,
    );
    let tail = algebra::Expr::canonical(
        "Substring",
        vec![
            string.clone(),
            algebra::Expr::binary_op(start.clone(), algebra::BinaryOp::Add, 1),
            algebra::Expr::binary_op(
                algebra::Expr::canonical("Length", vec![string], Type::I32),
                algebra::BinaryOp::Sub,
                start,
            ),
        ],
        Type::String,
    );

    Ok(algebra::Expr::canonical(
        "Concat",
        vec![
            algebra::Expr::canonical("Concat", vec![head, value], Type::String),
            tail,
        ],
        Type::String,
    ))
}

fn equals(
    cx: TranslationContext<'_>,
    _id: NodeId,
    args: Vec<algebra::Expr>,
) -> Result<algebra::Expr> {
    let [lhs, rhs] = <[algebra::Expr; 2]>::try_from(args)
        .map_err(|_| Error::unsupported_construct("`Object.Equals` with one argument"))?;
    cx.equals(lhs, rhs)
}

fn starts_with(
    cx: TranslationContext<'_>,
    _id: NodeId,
    args: Vec<algebra::Expr>,
) -> Result<algebra::Expr> {
    like(cx, args, "StartsWith", |pattern| format!("{pattern}%"))
}

fn ends_with(
    cx: TranslationContext<'_>,
    _id: NodeId,
    args: Vec<algebra::Expr>,
) -> Result<algebra::Expr> {
    like(cx, args, "EndsWith", |pattern| format!("%{pattern}"))
}

fn contains(
    cx: TranslationContext<'_>,
    _id: NodeId,
    args: Vec<algebra::Expr>,
) -> Result<algebra::Expr> {
    like(cx, args, "Contains", |pattern| format!("%{pattern}%"))
}

/// A string match against a constant becomes `LIKE`, with the wildcards of
/// the constant escaped. Anything else calls the canonical function.
fn like(
    cx: TranslationContext<'_>,
    args: Vec<algebra::Expr>,
    name: &str,
    wrap: impl FnOnce(&str) -> String,
) -> Result<algebra::Expr> {
    let [string, pattern] = string_args(args, name)?;

    match (cx.options.like_escape, pattern.as_value().and_then(Value::as_str)) {
        (Some(escape), Some(pattern)) => Ok(algebra::Expr::like(
            string,
            wrap(&escape_like(pattern, escape)),
            Some(escape),
        )),
        _ => Ok(algebra::Expr::canonical(
            name,
            vec![string, pattern],
            Type::Bool,
        )),
    }
}

/// Escapes the `LIKE` wildcards in `pattern`, and the escape character
/// itself.
pub(crate) fn escape_like(pattern: &str, escape: char) -> String {
    let mut ret = String::with_capacity(pattern.len());

    for c in pattern.chars() {
        if matches!(c, '%' | '_' | '[') || c == escape {
            ret.push(escape);
        }
        ret.push(c);
    }

    ret
}

fn string_args<const N: usize>(
    args: Vec<algebra::Expr>,
    name: &str,
) -> Result<[algebra::Expr; N]> {
    let len = args.len();
    <[algebra::Expr; N]>::try_from(args).map_err(|_| {
        Error::unsupported_construct(format!("`String.{name}` with {len} arguments"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_wildcards_and_the_escape_character() {
        assert_eq!(escape_like("50%_off", '~'), "50~%~_off");
        assert_eq!(escape_like("[a]~b", '~'), "~[a]~~b");
        assert_eq!(escape_like("plain", '~'), "plain");
    }
}

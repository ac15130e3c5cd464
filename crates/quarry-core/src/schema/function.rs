use crate::{algebra::Type, Error, Result};

/// A function the backend knows how to evaluate.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub namespace: String,
    pub name: String,

    /// Parameter types, in order
    pub params: Vec<Type>,

    /// Return type
    pub returns: Type,

    /// Aggregates take a collection argument and reduce it to a scalar
    pub aggregate: bool,
}

impl Function {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        params: Vec<Type>,
        returns: Type,
    ) -> Function {
        Function {
            namespace: namespace.into(),
            name: name.into(),
            params,
            returns,
            aggregate: false,
        }
    }

    /// Scores how well `args` match this overload.
    ///
    /// Returns `None` when an argument cannot be passed at all, otherwise the
    /// number of arguments that match exactly. Higher is better.
    fn applicability(&self, args: &[Type]) -> Option<usize> {
        if self.params.len() != args.len() {
            return None;
        }

        let mut exact = 0;

        for (param, arg) in self.params.iter().zip(args) {
            if param == arg {
                exact += 1;
            } else if !arg.promotes_to(param) {
                return None;
            }
        }

        Some(exact)
    }
}

/// Picks the best overload among `candidates` for the given argument types.
///
/// Fails with an unresolved-function error carrying the number of remaining
/// candidates: zero when nothing applies, more than one when the best match
/// is ambiguous.
pub fn resolve_overload<'a>(
    namespace: &str,
    name: &str,
    candidates: impl IntoIterator<Item = &'a Function>,
    args: &[Type],
) -> Result<&'a Function> {
    let mut best: Vec<&'a Function> = vec![];
    let mut best_score = 0;

    for candidate in candidates {
        let Some(score) = candidate.applicability(args) else {
            continue;
        };

        if best.is_empty() || score > best_score {
            best.clear();
            best.push(candidate);
            best_score = score;
        } else if score == best_score {
            best.push(candidate);
        }
    }

    match &best[..] {
        [function] => Ok(function),
        _ => Err(Error::unresolved_function(namespace, name, best.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn soundex(param: Type) -> Function {
        Function::new("Store", "Soundex", vec![param], Type::String)
    }

    #[test]
    fn exact_match_beats_promotion() {
        let candidates = [soundex(Type::I64), soundex(Type::I32)];
        let function = resolve_overload("Store", "Soundex", &candidates, &[Type::I32]).unwrap();
        assert_eq!(function.params, vec![Type::I32]);
    }

    #[test]
    fn promotion_applies_when_no_exact_match() {
        let candidates = [soundex(Type::I64)];
        let function = resolve_overload("Store", "Soundex", &candidates, &[Type::I32]).unwrap();
        assert_eq!(function.params, vec![Type::I64]);
    }

    #[test]
    fn arity_mismatch_is_not_found() {
        let candidates = [soundex(Type::String)];
        let err = resolve_overload("Store", "Soundex", &candidates, &[]).unwrap_err();
        assert!(err.is_function_not_found());
    }

    #[test]
    fn two_promotions_are_ambiguous() {
        let candidates = [soundex(Type::I64), soundex(Type::F64)];
        let err = resolve_overload("Store", "Soundex", &candidates, &[Type::I32]).unwrap_err();
        assert!(err.is_ambiguous_function());
        assert_eq!(err.unresolved_function_candidates(), Some(2));
    }
}

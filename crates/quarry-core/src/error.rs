mod adhoc;
mod expression_evaluation_failed;
mod heterogeneous_initializer;
mod invalid_operation;
mod unresolved_function;
mod unsupported_construct;
mod unsupported_parameter_type;

use adhoc::AdhocError;
use expression_evaluation_failed::ExpressionEvaluationFailed;
use heterogeneous_initializer::HeterogeneousInitializer;
use invalid_operation::InvalidOperation;
use std::sync::Arc;
use unresolved_function::UnresolvedFunction;
use unsupported_construct::UnsupportedConstruct;
use unsupported_parameter_type::UnsupportedParameterType;

/// Returns early with an ad-hoc error built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::from_args(format_args!($($arg)*)))
    };
}

/// Builds an ad-hoc error from a format string.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        $crate::Error::from_args(format_args!($($arg)*))
    };
}

/// An error raised while compiling a query.
#[derive(Clone)]
pub struct Error {
    inner: Option<Arc<ErrorInner>>,
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
    cause: Option<Error>,
}

impl Error {
    /// Adds context to this error.
    ///
    /// Context is displayed in reverse order: the most recently added context
    /// is shown first, followed by earlier context, ending with the root cause.
    #[inline(always)]
    pub fn context(self, consequent: impl IntoError) -> Error {
        self.context_impl(consequent.into_error())
    }

    #[inline(never)]
    #[cold]
    fn context_impl(self, consequent: Error) -> Error {
        let kind = match consequent.inner {
            Some(inner) => match Arc::try_unwrap(inner) {
                Ok(inner) => {
                    assert!(
                        inner.cause.is_none(),
                        "consequent error must not already have a cause"
                    );
                    inner.kind
                }
                Err(shared) => ErrorKind::Adhoc(AdhocError::new(shared.kind.to_string())),
            },
            None => ErrorKind::Unknown,
        };

        Error {
            inner: Some(Arc::new(ErrorInner {
                kind,
                cause: Some(self),
            })),
        }
    }

    /// Returns the innermost error of the context chain.
    pub fn root(&self) -> &Error {
        let mut err = self;
        while let Some(cause) = err.inner.as_ref().and_then(|inner| inner.cause.as_ref()) {
            err = cause;
        }
        err
    }

    fn chain(&self) -> impl Iterator<Item = &Error> {
        let mut err = self;
        core::iter::once(err).chain(core::iter::from_fn(move || {
            err = err.inner.as_ref().and_then(|inner| inner.cause.as_ref())?;
            Some(err)
        }))
    }

    fn kind(&self) -> &ErrorKind {
        self.inner
            .as_ref()
            .map(|inner| &inner.kind)
            .unwrap_or(&ErrorKind::Unknown)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.kind() {
            ErrorKind::Anyhow(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut it = self.chain().peekable();
        while let Some(err) = it.next() {
            core::fmt::Display::fmt(err.kind(), f)?;
            if it.peek().is_some() {
                f.write_str(": ")?;
            }
        }
        Ok(())
    }
}

impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if !f.alternate() {
            core::fmt::Display::fmt(self, f)
        } else {
            let Some(ref inner) = self.inner else {
                return f.debug_struct("Error").field("kind", &"None").finish();
            };
            f.debug_struct("Error")
                .field("kind", &inner.kind)
                .field("cause", &inner.cause)
                .finish()
        }
    }
}

#[derive(Debug)]
enum ErrorKind {
    Anyhow(anyhow::Error),
    Adhoc(AdhocError),
    ExpressionEvaluationFailed(ExpressionEvaluationFailed),
    HeterogeneousInitializer(HeterogeneousInitializer),
    InvalidOperation(InvalidOperation),
    UnresolvedFunction(UnresolvedFunction),
    UnsupportedConstruct(UnsupportedConstruct),
    UnsupportedParameterType(UnsupportedParameterType),
    Unknown,
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use self::ErrorKind::*;

        match self {
            Anyhow(err) => core::fmt::Display::fmt(err, f),
            Adhoc(err) => core::fmt::Display::fmt(err, f),
            ExpressionEvaluationFailed(err) => core::fmt::Display::fmt(err, f),
            HeterogeneousInitializer(err) => core::fmt::Display::fmt(err, f),
            InvalidOperation(err) => core::fmt::Display::fmt(err, f),
            UnresolvedFunction(err) => core::fmt::Display::fmt(err, f),
            UnsupportedConstruct(err) => core::fmt::Display::fmt(err, f),
            UnsupportedParameterType(err) => core::fmt::Display::fmt(err, f),
            Unknown => f.write_str("unknown quarry error"),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            inner: Some(Arc::new(ErrorInner { kind, cause: None })),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Error {
        Error::from(ErrorKind::Anyhow(err))
    }
}

impl From<std::num::TryFromIntError> for Error {
    fn from(err: std::num::TryFromIntError) -> Error {
        Error::from(anyhow::Error::from(err))
    }
}

impl From<uuid::Error> for Error {
    fn from(err: uuid::Error) -> Error {
        Error::from(anyhow::Error::from(err))
    }
}

/// Trait for types that can be converted into an Error.
pub trait IntoError {
    /// Converts this type into an Error.
    fn into_error(self) -> Error;
}

impl IntoError for Error {
    #[inline(always)]
    fn into_error(self) -> Error {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_size() {
        // Error stays one pointer wide
        let expected_size = core::mem::size_of::<usize>();
        assert_eq!(expected_size, core::mem::size_of::<Error>());
    }

    #[test]
    fn error_from_args() {
        let err = Error::from_args(format_args!("test error: {}", 42));
        assert_eq!(err.to_string(), "test error: 42");
    }

    #[test]
    fn error_chain_display() {
        let root = Error::from_args(format_args!("root cause"));
        let mid = Error::from_args(format_args!("middle context"));
        let top = Error::from_args(format_args!("top context"));

        let chained = root.context(mid).context(top);
        assert_eq!(
            chained.to_string(),
            "top context: middle context: root cause"
        );
    }

    #[test]
    fn root_skips_context() {
        let err = Error::unsupported_construct("method `Aggregate`")
            .context(err!("translating call"))
            .context(err!("compiling query"));

        assert!(err.root().is_unsupported_construct());
        assert!(!err.is_unsupported_construct());
    }

    #[test]
    fn anyhow_bridge() {
        let anyhow_err = anyhow::anyhow!("something failed");
        let our_err: Error = anyhow_err.into();
        assert_eq!(our_err.to_string(), "something failed");
    }

    #[test]
    fn unsupported_nested_is_invalid_operation() {
        let err = Error::unsupported_nested("First");
        assert!(err.is_invalid_operation());
        assert!(err.is_unsupported_nested());
        assert!(!err.is_skip_without_order());
        assert_eq!(
            err.to_string(),
            "invalid operation: `First` can only be used as the final query operation"
        );
    }

    #[test]
    fn cycle_detected_is_invalid_operation() {
        let err = Error::cycle_detected(7);
        assert!(err.is_invalid_operation());
        assert!(err.is_cycle_detected());
        assert_eq!(
            err.to_string(),
            "invalid operation: cycle detected at expression node 7"
        );
    }

    #[test]
    fn unresolved_function_not_found_vs_ambiguous() {
        let missing = Error::unresolved_function("Store", "Soundex", 0);
        assert!(missing.is_function_not_found());
        assert!(!missing.is_ambiguous_function());
        assert_eq!(missing.unresolved_function_candidates(), Some(0));
        assert_eq!(
            missing.to_string(),
            "unresolved function: no overload of `Store.Soundex` matches the arguments"
        );

        let ambiguous = Error::unresolved_function("Store", "Soundex", 3);
        assert!(ambiguous.is_ambiguous_function());
        assert_eq!(ambiguous.unresolved_function_candidates(), Some(3));
        assert_eq!(
            ambiguous.to_string(),
            "unresolved function: 3 overloads of `Store.Soundex` are equally applicable"
        );
    }

    #[test]
    fn heterogeneous_initializer() {
        let err = Error::heterogeneous_initializer("Summary");
        assert!(err.is_heterogeneous_initializer());
        assert_eq!(
            err.to_string(),
            "unsupported heterogeneous initializers: type `Summary` is initialized with different shapes in the same query"
        );
    }
}

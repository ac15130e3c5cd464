use super::Error;

/// Error when an expression cannot be evaluated in process.
///
/// This occurs when:
/// - A funcletized sub-expression reads a value that is not available
/// - Operand types do not match the operator (adding a string to a bool)
/// - The algebra evaluator meets a node it has no client-side semantics for
#[derive(Debug)]
pub(super) struct ExpressionEvaluationFailed {
    message: Box<str>,
}

impl std::error::Error for ExpressionEvaluationFailed {}

impl core::fmt::Display for ExpressionEvaluationFailed {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "expression evaluation failed: {}", self.message)
    }
}

impl Error {
    /// Creates an expression evaluation failed error.
    pub fn expression_evaluation_failed(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::ExpressionEvaluationFailed(
            ExpressionEvaluationFailed {
                message: message.into().into(),
            },
        ))
    }

    /// Returns `true` if this error is an expression evaluation failure.
    pub fn is_expression_evaluation_failed(&self) -> bool {
        matches!(
            self.kind(),
            super::ErrorKind::ExpressionEvaluationFailed(_)
        )
    }
}

use super::Error;

/// Error when a query is well-formed but uses an operator where it is not
/// allowed.
///
/// These are programmer errors: the same query always fails the same way, so
/// they are never retried.
#[derive(Debug)]
pub(super) struct InvalidOperation {
    reason: Reason,
    message: Box<str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reason {
    CycleDetected,
    RootContextMisuse,
    SkipWithoutOrder,
    ThenByWithoutOrderBy,
    UnboundParameter,
    UnsupportedNested,
    Other,
}

impl std::error::Error for InvalidOperation {}

impl core::fmt::Display for InvalidOperation {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid operation: {}", self.message)
    }
}

impl Error {
    /// Creates a generic invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Error {
        Error::invalid_operation_with(Reason::Other, message.into())
    }

    /// A source expression node was reached again while it was still being
    /// visited.
    pub fn cycle_detected(node: impl core::fmt::Display) -> Error {
        Error::invalid_operation_with(
            Reason::CycleDetected,
            format!("cycle detected at expression node {node}"),
        )
    }

    /// The reserved root-context parameter appeared somewhere other than the
    /// receiver of an entity-set access.
    pub fn root_context_misuse(name: &str) -> Error {
        Error::invalid_operation_with(
            Reason::RootContextMisuse,
            format!("the context parameter `{name}` can only be used to access an entity set"),
        )
    }

    /// `Skip` was applied to a sequence with no explicit order.
    pub fn skip_without_order() -> Error {
        Error::invalid_operation_with(
            Reason::SkipWithoutOrder,
            "`Skip` is only supported for sorted input; call `OrderBy` first",
        )
    }

    /// `ThenBy` was applied to a sequence that is not sorted.
    pub fn then_by_without_order_by(method: &str) -> Error {
        Error::invalid_operation_with(
            Reason::ThenByWithoutOrderBy,
            format!("`{method}` must follow `OrderBy` or `OrderByDescending`"),
        )
    }

    /// A lambda parameter was referenced outside the lambda that declares it.
    pub fn unbound_parameter(name: &str) -> Error {
        Error::invalid_operation_with(
            Reason::UnboundParameter,
            format!("parameter `{name}` is not in scope"),
        )
    }

    /// `First` or `Single` was used below the root of the query.
    pub fn unsupported_nested(method: &str) -> Error {
        Error::invalid_operation_with(
            Reason::UnsupportedNested,
            format!("`{method}` can only be used as the final query operation"),
        )
    }

    fn invalid_operation_with(reason: Reason, message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidOperation(InvalidOperation {
            reason,
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is any invalid operation error.
    pub fn is_invalid_operation(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::InvalidOperation(_))
    }

    /// Returns `true` if the source tree contained a cycle.
    pub fn is_cycle_detected(&self) -> bool {
        self.is_invalid_operation_reason(Reason::CycleDetected)
    }

    /// Returns `true` if the root-context parameter was misused.
    pub fn is_root_context_misuse(&self) -> bool {
        self.is_invalid_operation_reason(Reason::RootContextMisuse)
    }

    /// Returns `true` if `Skip` was applied to unordered input.
    pub fn is_skip_without_order(&self) -> bool {
        self.is_invalid_operation_reason(Reason::SkipWithoutOrder)
    }

    /// Returns `true` if `ThenBy` was applied to unsorted input.
    pub fn is_then_by_without_order_by(&self) -> bool {
        self.is_invalid_operation_reason(Reason::ThenByWithoutOrderBy)
    }

    /// Returns `true` if a parameter was referenced out of scope.
    pub fn is_unbound_parameter(&self) -> bool {
        self.is_invalid_operation_reason(Reason::UnboundParameter)
    }

    /// Returns `true` if `First`/`Single` was used below the query root.
    pub fn is_unsupported_nested(&self) -> bool {
        self.is_invalid_operation_reason(Reason::UnsupportedNested)
    }

    fn is_invalid_operation_reason(&self, reason: Reason) -> bool {
        matches!(self.kind(), super::ErrorKind::InvalidOperation(err) if err.reason == reason)
    }
}

use super::Error;

/// Error when one materialized type is initialized two different ways.
///
/// Rows in the algebra carry no client-side type identity, so two
/// projections into the same type must agree on their members and member
/// order. Picking either shape would corrupt materialization of the other.
#[derive(Debug)]
pub(super) struct HeterogeneousInitializer {
    type_name: Box<str>,
}

impl std::error::Error for HeterogeneousInitializer {}

impl core::fmt::Display for HeterogeneousInitializer {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "unsupported heterogeneous initializers: type `{}` is initialized with different shapes in the same query",
            self.type_name
        )
    }
}

impl Error {
    /// Creates a heterogeneous initializer error for the given host type.
    pub fn heterogeneous_initializer(type_name: impl core::fmt::Display) -> Error {
        Error::from(super::ErrorKind::HeterogeneousInitializer(
            HeterogeneousInitializer {
                type_name: type_name.to_string().into(),
            },
        ))
    }

    /// Returns `true` if this error is a heterogeneous initializer error.
    pub fn is_heterogeneous_initializer(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::HeterogeneousInitializer(_))
    }
}

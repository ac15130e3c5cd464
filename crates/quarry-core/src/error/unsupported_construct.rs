use super::Error;

/// Error when the query uses something the translator has no rule for.
///
/// This occurs when:
/// - A method, member, or operator has no translation
/// - A projection constructs an entity, complex, or enumerable type
/// - A type test targets a type that is not an entity or complex type
///
/// The message names the offending construct.
#[derive(Debug)]
pub(super) struct UnsupportedConstruct {
    construct: Box<str>,
}

impl std::error::Error for UnsupportedConstruct {}

impl core::fmt::Display for UnsupportedConstruct {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "unsupported construct: {}", self.construct)
    }
}

impl Error {
    /// Creates an unsupported construct error describing `construct`.
    pub fn unsupported_construct(construct: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::UnsupportedConstruct(UnsupportedConstruct {
            construct: construct.into().into(),
        }))
    }

    /// Returns `true` if this error is an unsupported construct error.
    pub fn is_unsupported_construct(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::UnsupportedConstruct(_))
    }
}

use super::Error;

/// Error when a compiled-query parameter has no algebra representation.
#[derive(Debug)]
pub(super) struct UnsupportedParameterType {
    parameter: Box<str>,
    type_name: Box<str>,
}

impl std::error::Error for UnsupportedParameterType {}

impl core::fmt::Display for UnsupportedParameterType {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "unsupported parameter type: parameter `{}` has type `{}`",
            self.parameter, self.type_name
        )
    }
}

impl Error {
    /// Creates an unsupported parameter type error.
    pub fn unsupported_parameter_type(
        parameter: impl Into<String>,
        type_name: impl core::fmt::Display,
    ) -> Error {
        Error::from(super::ErrorKind::UnsupportedParameterType(
            UnsupportedParameterType {
                parameter: parameter.into().into(),
                type_name: type_name.to_string().into(),
            },
        ))
    }

    /// Returns `true` if this error is an unsupported parameter type error.
    pub fn is_unsupported_parameter_type(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::UnsupportedParameterType(_))
    }
}

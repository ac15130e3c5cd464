use super::Error;

/// Error when overload resolution for an external function fails.
///
/// `candidates` is the number of overloads that remained applicable: zero
/// means no function matched, more than one means the call is ambiguous.
#[derive(Debug)]
pub(super) struct UnresolvedFunction {
    namespace: Box<str>,
    name: Box<str>,
    candidates: usize,
}

impl std::error::Error for UnresolvedFunction {}

impl core::fmt::Display for UnresolvedFunction {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self.candidates {
            0 => write!(
                f,
                "unresolved function: no overload of `{}.{}` matches the arguments",
                self.namespace, self.name
            ),
            n => write!(
                f,
                "unresolved function: {} overloads of `{}.{}` are equally applicable",
                n, self.namespace, self.name
            ),
        }
    }
}

impl Error {
    /// Creates an unresolved function error.
    pub fn unresolved_function(
        namespace: impl Into<String>,
        name: impl Into<String>,
        candidates: usize,
    ) -> Error {
        Error::from(super::ErrorKind::UnresolvedFunction(UnresolvedFunction {
            namespace: namespace.into().into(),
            name: name.into().into(),
            candidates,
        }))
    }

    /// Returns `true` if overload resolution found no applicable function.
    pub fn is_function_not_found(&self) -> bool {
        matches!(
            self.kind(),
            super::ErrorKind::UnresolvedFunction(UnresolvedFunction { candidates: 0, .. })
        )
    }

    /// Returns `true` if overload resolution found several equally good
    /// functions.
    pub fn is_ambiguous_function(&self) -> bool {
        matches!(
            self.kind(),
            super::ErrorKind::UnresolvedFunction(UnresolvedFunction { candidates, .. }) if *candidates > 1
        )
    }

    /// Number of candidates left after overload resolution, if this is an
    /// unresolved function error.
    pub fn unresolved_function_candidates(&self) -> Option<usize> {
        match self.kind() {
            super::ErrorKind::UnresolvedFunction(err) => Some(err.candidates),
            _ => None,
        }
    }
}

use quarry_core::ast::MergeOption;

/// Settings for one compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Equality must yield a definite boolean even when one side is null,
    /// matching in-memory comparison semantics.
    pub user_null_semantics: bool,

    /// Escape character for `LIKE` patterns built from string matching
    /// methods. `None` when the backend has no escape support; those methods
    /// then fall back to canonical functions.
    pub like_escape: Option<char>,

    /// Merge option for the compiled query, unless the query sets its own
    pub merge_option: MergeOption,

    /// Prefix of generated parameter names
    pub parameter_prefix: &'static str,

    /// Prefix of generated binding variable names
    pub alias_prefix: &'static str,
}

impl Options {
    /// Store null semantics, `~` as the `LIKE` escape.
    pub const DEFAULT: Self = Self {
        user_null_semantics: false,
        like_escape: Some('~'),
        merge_option: MergeOption::AppendOnly,
        parameter_prefix: "p__linq__",
        alias_prefix: "LQ",
    };

    /// Equality behaves like comparison in memory.
    pub const CLIENT_NULL_SEMANTICS: Self = Self {
        user_null_semantics: true,
        ..Self::DEFAULT
    };
}

impl Default for Options {
    fn default() -> Options {
        Options::DEFAULT
    }
}

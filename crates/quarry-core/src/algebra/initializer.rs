use crate::schema::HostType;

/// Describes how a row-typed algebra node materializes into a host object.
///
/// Attached to [`RowType`](super::RowType) so the materializer knows which
/// host type to build and which member each row field populates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InitializerDescriptor {
    /// The host type the row materializes into
    pub host_type: HostType,

    /// Structural kind, including the fingerprint compared for equivalence
    pub kind: InitializerKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InitializerKind {
    /// A `{Key, Group}` row produced by `GroupBy`
    Grouping,

    /// `new T(args) { Member = value, ... }`
    MemberInit {
        /// Members populated through constructor arguments, in order
        constructor: Vec<String>,

        /// Members assigned in the initializer list, in order
        bindings: Vec<String>,
    },

    /// `new T(args)` where each argument populates a member
    Constructor { members: Vec<String> },

    /// `new T()` with no arguments and no bindings
    Empty,

    /// An `{Owner, Elements}` row produced by a one-to-many navigation
    EntityCollection { owner: String, navigation: String },
}

impl InitializerDescriptor {
    pub fn new(host_type: HostType, kind: InitializerKind) -> InitializerDescriptor {
        InitializerDescriptor { host_type, kind }
    }

    /// Returns `true` when `self` and `other` produce rows of the same
    /// shape for the same host type.
    pub fn is_structurally_equivalent(&self, other: &InitializerDescriptor) -> bool {
        if self.host_type != other.host_type {
            return false;
        }

        match (&self.kind, &other.kind) {
            // One grouping shape per generic instantiation
            (InitializerKind::Grouping, InitializerKind::Grouping) => true,
            (InitializerKind::Empty, InitializerKind::Empty) => true,
            (
                InitializerKind::MemberInit {
                    constructor: lhs_ctor,
                    bindings: lhs_bindings,
                },
                InitializerKind::MemberInit {
                    constructor: rhs_ctor,
                    bindings: rhs_bindings,
                },
            ) => lhs_ctor == rhs_ctor && lhs_bindings == rhs_bindings,
            (
                InitializerKind::Constructor { members: lhs },
                InitializerKind::Constructor { members: rhs },
            ) => lhs == rhs,
            (
                InitializerKind::EntityCollection {
                    owner: lhs_owner,
                    navigation: lhs_nav,
                },
                InitializerKind::EntityCollection {
                    owner: rhs_owner,
                    navigation: rhs_nav,
                },
            ) => lhs_owner == rhs_owner && lhs_nav == rhs_nav,
            _ => false,
        }
    }

    /// Host members populated by the row's fields, in field order.
    pub fn members(&self) -> Vec<&str> {
        match &self.kind {
            InitializerKind::Grouping => vec!["Key", "Group"],
            InitializerKind::MemberInit {
                constructor,
                bindings,
            } => constructor
                .iter()
                .chain(bindings)
                .map(String::as_str)
                .collect(),
            InitializerKind::Constructor { members } => members.iter().map(String::as_str).collect(),
            InitializerKind::Empty => vec![],
            InitializerKind::EntityCollection { .. } => vec!["Owner", "Elements"],
        }
    }
}

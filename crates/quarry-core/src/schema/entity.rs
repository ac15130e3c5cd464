use super::HostType;
use crate::algebra::Type;

/// An entity or complex type known to the model.
#[derive(Debug, Clone)]
pub struct EntityType {
    /// Name of the type, unique within the schema
    pub name: String,

    /// Base type, for types participating in an inheritance hierarchy
    pub base: Option<String>,

    /// Declared members, excluding inherited ones
    pub members: Vec<Member>,

    /// Names of the key members. Empty for complex types.
    pub key: Vec<String>,

    /// Complex types have no identity of their own
    pub complex: bool,
}

#[derive(Debug, Clone)]
pub struct Member {
    pub name: String,
    pub kind: MemberKind,
}

#[derive(Debug, Clone)]
pub enum MemberKind {
    /// A scalar or complex-typed structural property
    Property(HostType),

    /// A relationship to another entity type
    Navigation(Navigation),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Navigation {
    /// Entity type on the far side of the relationship
    pub target: String,

    /// `true` for one-to-many navigations
    pub many: bool,
}

/// A queryable collection of entities.
#[derive(Debug, Clone)]
pub struct EntitySet {
    pub name: String,
    pub entity: String,
}

impl EntityType {
    pub fn algebra_type(&self) -> Type {
        if self.complex {
            Type::Complex(self.name.clone())
        } else {
            Type::Entity(self.name.clone())
        }
    }

    pub fn host_type(&self) -> HostType {
        if self.complex {
            HostType::Complex(self.name.clone())
        } else {
            HostType::Entity(self.name.clone())
        }
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|member| member.name == name)
    }
}

impl Member {
    pub fn is_navigation(&self) -> bool {
        matches!(self.kind, MemberKind::Navigation(_))
    }

    pub fn host_type(&self) -> HostType {
        match &self.kind {
            MemberKind::Property(ty) => ty.clone(),
            MemberKind::Navigation(nav) if nav.many => {
                HostType::sequence(HostType::Entity(nav.target.clone()))
            }
            MemberKind::Navigation(nav) => HostType::Entity(nav.target.clone()),
        }
    }
}

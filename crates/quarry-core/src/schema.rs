mod builder;
pub use builder::Builder;

mod entity;
pub use entity::{EntitySet, EntityType, Member, MemberKind, Navigation};

mod function;
pub use function::{resolve_overload, Function};

mod host_type;
pub use host_type::HostType;

use crate::{algebra::Type, Result};
use indexmap::{IndexMap, IndexSet};

/// Metadata the query compiler needs from the model.
///
/// The compiler never inspects the model directly; every type, member, and
/// function lookup goes through this trait.
pub trait Resolver {
    /// Looks up an entity or complex type by name.
    fn entity_type(&self, name: &str) -> Option<&EntityType>;

    /// Looks up an entity set by name.
    fn entity_set(&self, name: &str) -> Option<&EntitySet>;

    /// All functions registered under `namespace.name`.
    fn functions_named(&self, namespace: &str, name: &str) -> Vec<&Function>;

    /// Whether reading `member` from a value of type `owner` may be repeated
    /// on every execution without side effects.
    fn is_reevaluable(&self, owner: &HostType, member: &str) -> bool;

    /// Maps a host type to its algebra representation, if it has one.
    fn type_for_host_type(&self, ty: &HostType) -> Option<Type> {
        match ty {
            HostType::Bool => Some(Type::Bool),
            HostType::I32 => Some(Type::I32),
            HostType::I64 => Some(Type::I64),
            HostType::F64 => Some(Type::F64),
            HostType::String => Some(Type::String),
            HostType::Bytes => Some(Type::Bytes),
            HostType::Guid => Some(Type::Guid),
            HostType::DateTime => Some(Type::DateTime),
            HostType::Nullable(inner) => self.type_for_host_type(inner),
            HostType::Entity(name) | HostType::Complex(name) => {
                self.entity_type(name).map(EntityType::algebra_type)
            }
            HostType::Sequence(element) => self.type_for_host_type(element).map(Type::collection),
            HostType::Class(_) | HostType::Grouping(..) | HostType::Object => None,
        }
    }

    /// Finds a member declared on `owner` or one of its base types.
    fn member_for(&self, owner: &str, name: &str) -> Option<&Member> {
        let mut current = self.entity_type(owner);

        while let Some(entity) = current {
            if let Some(member) = entity.member(name) {
                return Some(member);
            }
            current = entity.base.as_deref().and_then(|base| self.entity_type(base));
        }

        None
    }

    /// Key member names of an entity type, inherited from the root of its
    /// hierarchy.
    fn key_members(&self, entity: &str) -> Vec<String> {
        let mut current = self.entity_type(entity);

        while let Some(ty) = current {
            if !ty.key.is_empty() {
                return ty.key.clone();
            }
            current = ty.base.as_deref().and_then(|base| self.entity_type(base));
        }

        vec![]
    }

    /// Returns `true` if `ty` is `base` or derives from it.
    fn is_subtype(&self, ty: &str, base: &str) -> bool {
        let mut current = Some(ty);

        while let Some(name) = current {
            if name == base {
                return true;
            }
            current = self.entity_type(name).and_then(|ty| ty.base.as_deref());
        }

        false
    }

    /// Resolves the overload of `namespace.name` that best matches `args`.
    fn resolve_overload(&self, namespace: &str, name: &str, args: &[Type]) -> Result<&Function> {
        resolve_overload(
            namespace,
            name,
            self.functions_named(namespace, name),
            args,
        )
    }
}

/// In-memory model metadata.
///
/// Built with [`Builder`].
#[derive(Debug, Default)]
pub struct Schema {
    pub(crate) entities: IndexMap<String, EntityType>,
    pub(crate) entity_sets: IndexMap<String, EntitySet>,
    pub(crate) functions: IndexMap<(String, String), Vec<Function>>,
    pub(crate) reevaluable: IndexSet<(HostType, String)>,
}

impl Schema {
    pub fn builder() -> Builder {
        Builder::new()
    }

    pub fn entities(&self) -> impl ExactSizeIterator<Item = &EntityType> {
        self.entities.values()
    }
}

impl Resolver for Schema {
    fn entity_type(&self, name: &str) -> Option<&EntityType> {
        self.entities.get(name)
    }

    fn entity_set(&self, name: &str) -> Option<&EntitySet> {
        self.entity_sets.get(name)
    }

    fn functions_named(&self, namespace: &str, name: &str) -> Vec<&Function> {
        self.functions
            .get(&(namespace.to_string(), name.to_string()))
            .map(|functions| functions.iter().collect())
            .unwrap_or_default()
    }

    fn is_reevaluable(&self, owner: &HostType, member: &str) -> bool {
        match owner {
            // Client classes are plain data holders
            HostType::Class(_) => true,
            _ => self
                .reevaluable
                .contains(&(owner.clone(), member.to_string())),
        }
    }
}

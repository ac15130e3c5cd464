use super::{EntitySet, EntityType, Function, HostType, Member, MemberKind, Navigation, Schema};
use crate::{algebra::Type, bail, Result};
use indexmap::{IndexMap, IndexSet};

/// Builds a [`Schema`].
#[derive(Debug, Default)]
pub struct Builder {
    entities: IndexMap<String, EntityType>,
    entity_sets: IndexMap<String, EntitySet>,
    functions: Vec<Function>,
    reevaluable: IndexSet<(HostType, String)>,
}

/// Configures the members of one entity or complex type.
#[derive(Debug)]
pub struct EntityBuilder<'a> {
    ty: &'a mut EntityType,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an entity type.
    pub fn entity(&mut self, name: &str, f: impl FnOnce(&mut EntityBuilder<'_>)) -> &mut Self {
        self.declare(name, false, f)
    }

    /// Declares a complex type.
    pub fn complex(&mut self, name: &str, f: impl FnOnce(&mut EntityBuilder<'_>)) -> &mut Self {
        self.declare(name, true, f)
    }

    pub fn entity_set(&mut self, name: &str, entity: &str) -> &mut Self {
        self.entity_sets.insert(
            name.to_string(),
            EntitySet {
                name: name.to_string(),
                entity: entity.to_string(),
            },
        );
        self
    }

    pub fn function(&mut self, function: Function) -> &mut Self {
        self.functions.push(function);
        self
    }

    /// Marks `owner.member` as safe to re-read on every execution.
    pub fn reevaluable(&mut self, owner: HostType, member: &str) -> &mut Self {
        self.reevaluable.insert((owner, member.to_string()));
        self
    }

    pub fn build(&self) -> Result<Schema> {
        for entity in self.entities.values() {
            if let Some(base) = &entity.base {
                let Some(base_ty) = self.entities.get(base) else {
                    bail!("type `{}` derives from unknown type `{}`", entity.name, base);
                };
                if base_ty.complex != entity.complex {
                    bail!("type `{}` and its base `{}` differ in kind", entity.name, base);
                }
            }

            for key in &entity.key {
                if !self.declares_member(entity, key) {
                    bail!("key member `{}` is not declared on `{}`", key, entity.name);
                }
            }

            if !entity.complex && entity.base.is_none() && entity.key.is_empty() {
                bail!("entity type `{}` has no key", entity.name);
            }

            for member in &entity.members {
                match &member.kind {
                    MemberKind::Navigation(nav) if !self.entities.contains_key(&nav.target) => {
                        bail!(
                            "navigation `{}.{}` targets unknown type `{}`",
                            entity.name,
                            member.name,
                            nav.target
                        );
                    }
                    MemberKind::Property(HostType::Complex(name) | HostType::Entity(name))
                        if !self.entities.contains_key(name) =>
                    {
                        bail!(
                            "property `{}.{}` has unknown type `{}`",
                            entity.name,
                            member.name,
                            name
                        );
                    }
                    _ => {}
                }
            }
        }

        for set in self.entity_sets.values() {
            match self.entities.get(&set.entity) {
                Some(entity) if !entity.complex => {}
                _ => bail!(
                    "entity set `{}` refers to unknown entity type `{}`",
                    set.name,
                    set.entity
                ),
            }
        }

        let mut functions: IndexMap<(String, String), Vec<Function>> = IndexMap::new();
        for function in &self.functions {
            functions
                .entry((function.namespace.clone(), function.name.clone()))
                .or_default()
                .push(function.clone());
        }

        Ok(Schema {
            entities: self.entities.clone(),
            entity_sets: self.entity_sets.clone(),
            functions,
            reevaluable: self.reevaluable.clone(),
        })
    }

    fn declare(
        &mut self,
        name: &str,
        complex: bool,
        f: impl FnOnce(&mut EntityBuilder<'_>),
    ) -> &mut Self {
        let ty = self
            .entities
            .entry(name.to_string())
            .or_insert_with(|| EntityType {
                name: name.to_string(),
                base: None,
                members: vec![],
                key: vec![],
                complex,
            });
        f(&mut EntityBuilder { ty });
        self
    }

    fn declares_member(&self, entity: &EntityType, name: &str) -> bool {
        let mut current = Some(entity);
        while let Some(ty) = current {
            if ty.member(name).is_some() {
                return true;
            }
            current = ty.base.as_ref().and_then(|base| self.entities.get(base));
        }
        false
    }
}

impl EntityBuilder<'_> {
    pub fn base(&mut self, base: &str) -> &mut Self {
        self.ty.base = Some(base.to_string());
        self
    }

    pub fn key(&mut self, member: &str) -> &mut Self {
        self.ty.key.push(member.to_string());
        self
    }

    pub fn property(&mut self, name: &str, ty: HostType) -> &mut Self {
        self.member(name, MemberKind::Property(ty))
    }

    /// Declares a navigation to a single related entity.
    pub fn reference(&mut self, name: &str, target: &str) -> &mut Self {
        self.member(
            name,
            MemberKind::Navigation(Navigation {
                target: target.to_string(),
                many: false,
            }),
        )
    }

    /// Declares a navigation to a collection of related entities.
    pub fn collection(&mut self, name: &str, target: &str) -> &mut Self {
        self.member(
            name,
            MemberKind::Navigation(Navigation {
                target: target.to_string(),
                many: true,
            }),
        )
    }

    fn member(&mut self, name: &str, kind: MemberKind) -> &mut Self {
        self.ty.members.push(Member {
            name: name.to_string(),
            kind,
        });
        self
    }
}

impl Function {
    /// Marks the function as an aggregate over a collection argument.
    pub fn aggregate(mut self) -> Function {
        self.aggregate = true;
        self
    }

    pub fn with_param(mut self, ty: Type) -> Function {
        self.params.push(ty);
        self
    }
}

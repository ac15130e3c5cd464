//! Canonical initializer descriptors for one compilation.
//!
//! Every row a query materializes into a host object carries an
//! [`InitializerDescriptor`]. A host type may be built in several places in
//! one query (both sides of a union, say); the materializer can only handle
//! one shape per type, so later descriptors must match the first.

use indexmap::IndexMap;
use quarry_core::{
    algebra::{InitializerDescriptor, InitializerKind},
    schema::HostType,
    Error, Result,
};
use std::sync::Arc;
use tracing::{debug, instrument};

#[derive(Debug, Default)]
pub struct Registry {
    descriptors: IndexMap<Key, Arc<InitializerDescriptor>>,
}

/// Projections are keyed by host type alone. Entity collections of the same
/// element type come from different navigations and never conflict.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Key {
    host_type: HostType,
    navigation: Option<(String, String)>,
}

impl Key {
    fn of(descriptor: &InitializerDescriptor) -> Key {
        Key {
            host_type: descriptor.host_type.clone(),
            navigation: match &descriptor.kind {
                InitializerKind::EntityCollection { owner, navigation } => {
                    Some((owner.clone(), navigation.clone()))
                }
                _ => None,
            },
        }
    }
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Returns the registered descriptor equivalent to `candidate`,
    /// registering `candidate` if its host type has none yet.
    #[instrument(
        name = "initializer::canonicalize",
        level = "trace",
        skip(self, candidate),
        fields(host_type = %candidate.host_type)
    )]
    pub fn canonicalize(
        &mut self,
        candidate: InitializerDescriptor,
    ) -> Result<Arc<InitializerDescriptor>> {
        self.validate(&candidate)?;

        let key = Key::of(&candidate);
        if let Some(existing) = self.descriptors.get(&key) {
            return Ok(existing.clone());
        }

        debug!(kind = ?candidate.kind, "registering initializer");
        let descriptor = Arc::new(candidate);
        self.descriptors.insert(key, descriptor.clone());
        Ok(descriptor)
    }

    /// Fails if `candidate` conflicts with the descriptor already registered
    /// for its host type.
    pub fn validate(&self, candidate: &InitializerDescriptor) -> Result<()> {
        match self.descriptors.get(&Key::of(candidate)) {
            Some(existing) if !existing.is_structurally_equivalent(candidate) => {
                Err(Error::heterogeneous_initializer(&candidate.host_type))
            }
            _ => Ok(()),
        }
    }

    /// The projection, grouping, or empty initializer registered for
    /// `host_type`.
    pub fn get(&self, host_type: &HostType) -> Option<&Arc<InitializerDescriptor>> {
        self.descriptors.get(&Key {
            host_type: host_type.clone(),
            navigation: None,
        })
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

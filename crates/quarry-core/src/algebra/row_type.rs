use super::{InitializerDescriptor, Type};
use std::sync::Arc;

/// The type of a row: an ordered list of named, typed fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RowType {
    pub fields: Vec<(String, Type)>,

    /// Set when the row materializes into a host object
    pub initializer: Option<Arc<InitializerDescriptor>>,
}

impl RowType {
    pub fn new(fields: Vec<(String, Type)>) -> RowType {
        RowType {
            fields,
            initializer: None,
        }
    }

    pub fn with_initializer(mut self, initializer: Arc<InitializerDescriptor>) -> RowType {
        self.initializer = Some(initializer);
        self
    }

    pub fn field(&self, name: &str) -> Option<&Type> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, ty)| ty)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|(field, _)| field == name)
    }

    /// Returns `true` when both rows carry initializers describing different
    /// shapes.
    pub fn has_incompatible_initializer(&self, other: &RowType) -> bool {
        match (&self.initializer, &other.initializer) {
            (Some(lhs), Some(rhs)) => !Arc::ptr_eq(lhs, rhs) && !lhs.is_structurally_equivalent(rhs),
            _ => false,
        }
    }
}

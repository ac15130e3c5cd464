use super::Value;
use indexmap::IndexMap;

/// A record value with named fields.
///
/// Entity instances carry their type name so type tests can inspect them;
/// anonymous rows leave it unset.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValueRecord {
    pub type_name: Option<String>,
    pub fields: IndexMap<String, Value>,
}

impl ValueRecord {
    pub fn new() -> ValueRecord {
        ValueRecord::default()
    }

    /// Starts an entity record of the given type.
    pub fn entity(type_name: impl Into<String>) -> ValueRecord {
        ValueRecord {
            type_name: Some(type_name.into()),
            fields: IndexMap::new(),
        }
    }

    /// Adds a field, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> ValueRecord {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn is_same(&self, other: &ValueRecord) -> bool {
        self.type_name == other.type_name
            && self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(&other.fields)
                .all(|((lhs_name, lhs), (rhs_name, rhs))| lhs_name == rhs_name && lhs.is_same(rhs))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ValueRecord {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        ValueRecord {
            type_name: None,
            fields: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

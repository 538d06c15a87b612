//! Base entity: an identifier plus an attribute store.

use std::collections::BTreeSet;

use crate::domain::attribute::{Attribute, AttributeStore, ABSTRACT, DESCRIPTION, HIDDEN, NAME, TAGS};
use crate::domain::identifier::Identifier;

/// Identifier and attribute values shared by features and constraints.
#[derive(Debug)]
pub struct Element {
    identifier: Identifier,
    attributes: AttributeStore,
}

impl Element {
    pub fn new(identifier: Identifier) -> Self {
        Self {
            identifier,
            attributes: AttributeStore::new(),
        }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn attributes(&self) -> &AttributeStore {
        &self.attributes
    }

    pub(crate) fn attributes_mut(&mut self) -> &mut AttributeStore {
        &mut self.attributes
    }

    /// Number of explicitly stored attribute values.
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    pub fn attribute_value<V>(&self, attribute: &Attribute<V>) -> Option<V>
    where
        V: Clone + Send + Sync + 'static,
    {
        attribute.value(self)
    }

    pub fn has_attribute_value<V>(&self, attribute: &Attribute<V>) -> bool
    where
        V: Clone + Send + Sync + 'static,
    {
        attribute.is_set(self)
    }

    pub(crate) fn set_attribute_value<V>(&mut self, attribute: &Attribute<V>, value: V) -> Option<V>
    where
        V: Clone + Send + Sync + 'static,
    {
        attribute.set_value(self, value)
    }

    pub(crate) fn remove_attribute_value<V>(&mut self, attribute: &Attribute<V>) -> Option<V>
    where
        V: Clone + Send + Sync + 'static,
    {
        attribute.unset(self)
    }

    pub fn name(&self) -> String {
        NAME.value(self).unwrap_or_default()
    }

    pub fn description(&self) -> Option<String> {
        DESCRIPTION.value(self)
    }

    pub fn is_hidden(&self) -> bool {
        HIDDEN.value(self).unwrap_or_default()
    }

    pub fn is_abstract(&self) -> bool {
        ABSTRACT.value(self).unwrap_or_default()
    }

    pub fn tags(&self) -> BTreeSet<String> {
        TAGS.value(self).unwrap_or_default()
    }
}

/// Entities carrying an [`Element`].
pub trait Identifiable {
    fn element(&self) -> &Element;

    fn identifier(&self) -> &Identifier {
        self.element().identifier()
    }
}

impl Identifiable for Element {
    fn element(&self) -> &Element {
        self
    }
}

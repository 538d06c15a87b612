//! Typed, identity-keyed attributes and the per-element attribute store.

use std::any::Any;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use crate::domain::element::Element;

static NEXT_ATTRIBUTE_KEY: AtomicU64 = AtomicU64::new(0);

/// Identity of an attribute definition. Two attributes created separately never share a key,
/// even when their names are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeKey(u64);

impl AttributeKey {
    fn next() -> Self {
        Self(NEXT_ATTRIBUTE_KEY.fetch_add(1, Ordering::Relaxed))
    }
}

/// Function computing the value of an unset attribute from its element.
pub type DefaultValue<V> = Arc<dyn Fn(&Element) -> V + Send + Sync>;

/// Typed, named key for values stored on an [`Element`].
///
/// Cloning an attribute keeps its identity.
pub struct Attribute<V> {
    key: AttributeKey,
    name: Arc<str>,
    default: Option<DefaultValue<V>>,
    _value: PhantomData<fn() -> V>,
}

impl<V> Clone for Attribute<V> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            name: Arc::clone(&self.name),
            default: self.default.clone(),
            _value: PhantomData,
        }
    }
}

impl<V> fmt::Debug for Attribute<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("has_default", &self.default.is_some())
            .finish()
    }
}

impl<V> Attribute<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Attribute without default; unset reads yield `None`.
    pub fn new(name: &str) -> Self {
        Self {
            key: AttributeKey::next(),
            name: Arc::from(name),
            default: None,
            _value: PhantomData,
        }
    }

    /// Attribute whose unset reads are computed from the element.
    pub fn with_default<F>(name: &str, default: F) -> Self
    where
        F: Fn(&Element) -> V + Send + Sync + 'static,
    {
        Self {
            default: Some(Arc::new(default)),
            ..Self::new(name)
        }
    }

    /// Attribute whose unset reads yield a constant.
    pub fn with_default_value(name: &str, value: V) -> Self {
        Self::with_default(name, move |_| value.clone())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> AttributeKey {
        self.key
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Stored value, else the default, else `None`.
    pub fn value(&self, element: &Element) -> Option<V> {
        self.stored_value(element)
            .or_else(|| self.default.as_ref().map(|default| default(element)))
    }

    /// Explicitly stored value, ignoring the default.
    pub fn stored_value(&self, element: &Element) -> Option<V> {
        element
            .attributes()
            .get(self.key)
            .and_then(|value| value.downcast_ref::<V>())
            .cloned()
    }

    pub fn is_set(&self, element: &Element) -> bool {
        element.attributes().contains(self.key)
    }

    /// Stores `value` on the element, returning the previously stored value.
    pub fn set_value(&self, element: &mut Element, value: V) -> Option<V> {
        element
            .attributes_mut()
            .insert(self.key, &self.name, Box::new(value))
            .and_then(|previous| previous.downcast::<V>().ok())
            .map(|previous| *previous)
    }

    /// Removes the stored value; subsequent reads fall back to the default.
    pub fn unset(&self, element: &mut Element) -> Option<V> {
        element
            .attributes_mut()
            .remove(self.key)
            .and_then(|previous| previous.downcast::<V>().ok())
            .map(|previous| *previous)
    }
}

struct StoredValue {
    name: Arc<str>,
    value: Box<dyn Any + Send + Sync>,
}

/// Heterogeneous map from attribute identity to type-erased value.
#[derive(Default)]
pub struct AttributeStore {
    values: HashMap<AttributeKey, StoredValue>,
}

impl AttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, key: AttributeKey) -> Option<&(dyn Any + Send + Sync)> {
        self.values.get(&key).map(|stored| stored.value.as_ref())
    }

    fn contains(&self, key: AttributeKey) -> bool {
        self.values.contains_key(&key)
    }

    fn insert(
        &mut self,
        key: AttributeKey,
        name: &Arc<str>,
        value: Box<dyn Any + Send + Sync>,
    ) -> Option<Box<dyn Any + Send + Sync>> {
        self.values
            .insert(
                key,
                StoredValue {
                    name: Arc::clone(name),
                    value,
                },
            )
            .map(|previous| previous.value)
    }

    fn remove(&mut self, key: AttributeKey) -> Option<Box<dyn Any + Send + Sync>> {
        self.values.remove(&key).map(|stored| stored.value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Names of the explicitly stored attributes, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.values.values().map(|stored| &*stored.name).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for AttributeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

/// Display name; defaults to `@` followed by the identifier.
pub static NAME: LazyLock<Attribute<String>> =
    LazyLock::new(|| Attribute::with_default("name", |element| format!("@{}", element.identifier())));

pub static DESCRIPTION: LazyLock<Attribute<String>> = LazyLock::new(|| Attribute::new("description"));

pub static HIDDEN: LazyLock<Attribute<bool>> =
    LazyLock::new(|| Attribute::with_default_value("hidden", false));

pub static ABSTRACT: LazyLock<Attribute<bool>> =
    LazyLock::new(|| Attribute::with_default_value("abstract", false));

/// Free-form labels, mostly used on constraints.
pub static TAGS: LazyLock<Attribute<BTreeSet<String>>> =
    LazyLock::new(|| Attribute::with_default_value("tags", BTreeSet::new()));

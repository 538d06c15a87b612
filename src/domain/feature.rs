//! Features: named nodes of the feature tree.

use std::fmt;

use generational_arena::Index;
use tracing::debug;

use crate::domain::attribute::{Attribute, ABSTRACT, DESCRIPTION, HIDDEN, NAME};
use crate::domain::element::{Element, Identifiable};
use crate::domain::error::DomainResult;
use crate::domain::feature_model::{FeatureModel, ModelId};
use crate::domain::identifier::Identifier;
use crate::domain::role::{Analyzer, Mutable, Mutator};
use crate::domain::tree::{self, Ancestors, BreadthFirst, PreOrder};

/// Tree node of a [`FeatureModel`].
///
/// Parent and children are arena indices into the owning model; use
/// [`FeatureModel::analyze_feature`] to navigate the tree.
#[derive(Debug)]
pub struct Feature {
    element: Element,
    model: ModelId,
    pub(crate) parent: Option<Index>,
    pub(crate) children: Vec<Index>,
}

impl Feature {
    pub(crate) fn new(identifier: Identifier, model: ModelId) -> Self {
        Self {
            element: Element::new(identifier),
            model,
            parent: None,
            children: Vec::new(),
        }
    }

    pub(crate) fn element_mut(&mut self) -> &mut Element {
        &mut self.element
    }

    /// Model this feature was created in.
    pub fn model_id(&self) -> ModelId {
        self.model
    }

    pub fn name(&self) -> String {
        self.element.name()
    }

    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    pub fn children_count(&self) -> usize {
        self.children.len()
    }
}

impl Identifiable for Feature {
    fn element(&self) -> &Element {
        &self.element
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Feature{{name={}}}", self.name())
    }
}

/// State-changing operations on one feature.
#[derive(Debug)]
pub struct FeatureMutator<'a> {
    model: &'a mut FeatureModel,
    index: Index,
}

impl<'a> FeatureMutator<'a> {
    pub(crate) fn new(model: &'a mut FeatureModel, index: Index) -> Self {
        Self { model, index }
    }

    pub fn identifier(&self) -> Identifier {
        self.mutable().identifier().clone()
    }

    /// Inserts `child` below this feature at `index` (default: last).
    ///
    /// Fails if `child` already has a parent, is the root, is unknown to this model,
    /// or is this feature or one of its ancestors.
    pub fn add_child(&mut self, child: &Identifier, index: Option<usize>) -> DomainResult<()> {
        let child = self.model.member_index(child)?;
        self.model.attach(self.index, child, index)
    }

    /// Detaches this feature from its parent; the feature stays known to the model.
    pub fn remove_from_parent(&mut self) -> DomainResult<()> {
        self.model.detach(self.index)
    }

    /// Moves this feature below `new_parent` as its last child.
    ///
    /// All checks run before anything is detached, so a failure leaves the tree unchanged.
    pub fn set_parent(&mut self, new_parent: &Identifier) -> DomainResult<()> {
        let new_parent = self.model.member_index(new_parent)?;
        self.model.check_reattach(new_parent, self.index)?;
        if self.model.features[self.index].parent.is_some() {
            self.model.detach(self.index)?;
        }
        self.model.attach(new_parent, self.index, None)
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.set_attribute_value(&NAME, name.into());
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.set_attribute_value(&DESCRIPTION, description.into());
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.set_attribute_value(&HIDDEN, hidden);
    }

    pub fn set_abstract(&mut self, is_abstract: bool) {
        self.set_attribute_value(&ABSTRACT, is_abstract);
    }

    pub fn set_attribute_value<V>(&mut self, attribute: &Attribute<V>, value: V) -> Option<V>
    where
        V: Clone + Send + Sync + 'static,
    {
        debug!("feature {}: set {}", self.identifier(), attribute.name());
        self.model.features[self.index]
            .element_mut()
            .set_attribute_value(attribute, value)
    }

    pub fn remove_attribute_value<V>(&mut self, attribute: &Attribute<V>) -> Option<V>
    where
        V: Clone + Send + Sync + 'static,
    {
        self.model.features[self.index]
            .element_mut()
            .remove_attribute_value(attribute)
    }

    /// Deletes this feature from the model, see [`FeatureModelMutator::delete_feature`].
    ///
    /// [`FeatureModelMutator::delete_feature`]: crate::domain::FeatureModelMutator::delete_feature
    pub fn remove(self) -> DomainResult<()> {
        let identifier = self.identifier();
        self.model.mutate().delete_feature(&identifier)
    }
}

impl Mutator for FeatureMutator<'_> {
    type Target = Feature;

    fn mutable(&self) -> &Feature {
        &self.model.features[self.index]
    }
}

/// Read-only tree queries for one feature.
#[derive(Debug, Clone, Copy)]
pub struct FeatureAnalyzer<'a> {
    model: &'a FeatureModel,
    index: Index,
}

impl<'a> FeatureAnalyzer<'a> {
    pub(crate) fn new(model: &'a FeatureModel, index: Index) -> Self {
        Self { model, index }
    }

    fn feature(&self) -> &'a Feature {
        &self.model.features[self.index]
    }

    pub fn is_root(&self) -> bool {
        self.index == self.model.root
    }

    pub fn is_leaf(&self) -> bool {
        self.feature().children.is_empty()
    }

    /// Non-root feature without parent.
    pub fn is_detached(&self) -> bool {
        !self.is_root() && self.feature().parent.is_none()
    }

    pub fn children_count(&self) -> usize {
        self.feature().children.len()
    }

    pub fn parent(&self) -> Option<&'a Feature> {
        self.feature().parent.map(|parent| &self.model.features[parent])
    }

    pub fn children(&self) -> impl Iterator<Item = &'a Feature> + 'a {
        let model = self.model;
        self.feature()
            .children
            .iter()
            .map(move |&child| &model.features[child])
    }

    /// Number of ancestors; the root has depth `0`.
    pub fn depth(&self) -> usize {
        self.ancestors().count()
    }

    /// Parent chain up to the root (or to the top of a detached subtree).
    pub fn ancestors(&self) -> Ancestors<'a> {
        Ancestors::new(&self.model.features, self.index)
    }

    /// This feature and everything below it, depth-first pre-order.
    pub fn descendants(&self) -> PreOrder<'a> {
        PreOrder::new(&self.model.features, self.index)
    }

    /// This feature and everything below it, level by level.
    pub fn descendants_breadth_first(&self) -> BreadthFirst<'a> {
        BreadthFirst::new(&self.model.features, self.index)
    }

    /// Whether this feature lies on the parent chain of `other`.
    pub fn is_ancestor_of(&self, other: &Identifier) -> bool {
        match self.model.feature_slot(other) {
            Some(other) if other != self.index => {
                tree::is_ancestor_or_self(&self.model.features, self.index, other)
            }
            _ => false,
        }
    }
}

impl Analyzer for FeatureAnalyzer<'_> {
    type Target = Feature;

    fn analyzable(&self) -> &Feature {
        self.feature()
    }
}

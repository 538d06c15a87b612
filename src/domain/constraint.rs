//! Constraints: formulas over the features of one model.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use generational_arena::Index;
use tracing::debug;

use crate::domain::attribute::{Attribute, DESCRIPTION, TAGS};
use crate::domain::element::{Element, Identifiable};
use crate::domain::error::DomainResult;
use crate::domain::feature::Feature;
use crate::domain::feature_model::{FeatureModel, Lookup, ModelId};
use crate::domain::formula::Expression;
use crate::domain::identifier::Identifier;
use crate::domain::role::{Analyzer, Mutable, Mutator};

/// Restriction of the valid configurations of a [`FeatureModel`].
///
/// Holds its formula and, for every variable, the feature it was bound to when the
/// formula was set. Bindings survive renames; they are replaced as a whole on every
/// successful formula change.
#[derive(Debug)]
pub struct Constraint {
    element: Element,
    model: ModelId,
    formula: Expression,
    bindings: BTreeMap<String, Identifier>,
    contained_features: BTreeSet<Identifier>,
}

impl Constraint {
    /// Constraint with formula `true`, which references nothing.
    pub(crate) fn new(identifier: Identifier, model: ModelId) -> Self {
        Self {
            element: Element::new(identifier),
            model,
            formula: Expression::True,
            bindings: BTreeMap::new(),
            contained_features: BTreeSet::new(),
        }
    }

    pub(crate) fn element_mut(&mut self) -> &mut Element {
        &mut self.element
    }

    pub(crate) fn replace_formula(&mut self, formula: Expression, bindings: BTreeMap<String, Identifier>) {
        self.contained_features = bindings.values().cloned().collect();
        self.formula = formula;
        self.bindings = bindings;
    }

    pub fn model_id(&self) -> ModelId {
        self.model
    }

    pub fn formula(&self) -> &Expression {
        &self.formula
    }

    /// Variable names of the formula and the features they denote.
    pub fn bindings(&self) -> &BTreeMap<String, Identifier> {
        &self.bindings
    }

    pub fn binding(&self, variable: &str) -> Option<&Identifier> {
        self.bindings.get(variable)
    }

    /// Identifiers of the features referenced by the formula.
    pub fn contained_features(&self) -> &BTreeSet<Identifier> {
        &self.contained_features
    }

    pub fn references(&self, feature: &Identifier) -> bool {
        self.contained_features.contains(feature)
    }

    pub fn tags(&self) -> BTreeSet<String> {
        self.element.tags()
    }
}

impl Identifiable for Constraint {
    fn element(&self) -> &Element {
        &self.element
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Constraint{{formula={}}}", self.formula)
    }
}

/// State-changing operations on one constraint.
#[derive(Debug)]
pub struct ConstraintMutator<'a> {
    model: &'a mut FeatureModel,
    index: Index,
}

impl<'a> ConstraintMutator<'a> {
    pub(crate) fn new(model: &'a mut FeatureModel, index: Index) -> Self {
        Self { model, index }
    }

    pub fn identifier(&self) -> Identifier {
        self.mutable().identifier().clone()
    }

    /// Replaces the formula and recomputes the referenced features.
    ///
    /// Every variable must resolve to a feature of the model; otherwise the call fails
    /// with `UnknownReference` and the constraint keeps its previous formula and cache.
    pub fn set_formula(&mut self, formula: Expression) -> DomainResult<()> {
        let bindings = self.model.resolve_variables(&formula, Lookup::NameOrIdentifier)?;
        debug!(
            "constraint {}: formula {} binds {} variable(s)",
            self.identifier(),
            formula,
            bindings.len()
        );
        self.model.constraints[self.index].replace_formula(formula, bindings);
        Ok(())
    }

    pub fn set_tags(&mut self, tags: BTreeSet<String>) {
        self.set_attribute_value(&TAGS, tags);
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.set_attribute_value(&DESCRIPTION, description.into());
    }

    pub fn set_attribute_value<V>(&mut self, attribute: &Attribute<V>, value: V) -> Option<V>
    where
        V: Clone + Send + Sync + 'static,
    {
        self.model.constraints[self.index]
            .element_mut()
            .set_attribute_value(attribute, value)
    }

    pub fn remove_attribute_value<V>(&mut self, attribute: &Attribute<V>) -> Option<V>
    where
        V: Clone + Send + Sync + 'static,
    {
        self.model.constraints[self.index]
            .element_mut()
            .remove_attribute_value(attribute)
    }

    /// Detaches this constraint from the model's constraint sequence.
    pub fn remove(self) -> DomainResult<()> {
        let identifier = self.identifier();
        self.model.mutate().remove_constraint(&identifier)
    }
}

impl Mutator for ConstraintMutator<'_> {
    type Target = Constraint;

    fn mutable(&self) -> &Constraint {
        &self.model.constraints[self.index]
    }
}

/// Read-only queries for one constraint.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintAnalyzer<'a> {
    model: &'a FeatureModel,
    index: Index,
}

impl<'a> ConstraintAnalyzer<'a> {
    pub(crate) fn new(model: &'a FeatureModel, index: Index) -> Self {
        Self { model, index }
    }

    fn constraint(&self) -> &'a Constraint {
        &self.model.constraints[self.index]
    }

    /// Whether the constraint is implied by all other constraints and the tree.
    ///
    /// No reasoning backend is wired in yet, so every constraint counts as
    /// non-redundant. Pure and total over the current model state.
    pub fn is_redundant(&self) -> bool {
        false
    }

    /// Features referenced by the formula, in identifier order.
    pub fn contained_features(&self) -> Vec<&'a Feature> {
        self.constraint()
            .contained_features
            .iter()
            .filter_map(|identifier| self.model.feature(identifier))
            .collect()
    }

    /// Whether the constraint is currently part of the model's sequence.
    pub fn is_registered(&self) -> bool {
        self.model.sequence.contains(&self.index)
    }

    /// Position in the model's constraint sequence.
    pub fn index(&self) -> Option<usize> {
        self.model.sequence.iter().position(|&index| index == self.index)
    }
}

impl Analyzer for ConstraintAnalyzer<'_> {
    type Target = Constraint;

    fn analyzable(&self) -> &Constraint {
        self.constraint()
    }
}

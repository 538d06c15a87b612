//! The feature model aggregate.
//!
//! A [`FeatureModel`] exclusively owns its features and constraints in generational
//! arenas. Parent/child links and the constraint sequence are arena indices, so no
//! entity holds a reference back into the model.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use generational_arena::{Arena, Index};
use tracing::{debug, instrument, trace};
use uuid::Uuid;

use crate::domain::constraint::{Constraint, ConstraintAnalyzer, ConstraintMutator};
use crate::domain::element::Identifiable;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::feature::{Feature, FeatureAnalyzer, FeatureMutator};
use crate::domain::formula::{Expression, Formula};
use crate::domain::identifier::{Identifier, IdentifierFactory};
use crate::domain::role::{Analyzable, Analyzer, Mutable, Mutator};
use crate::domain::tree::{self, PreOrder};

/// Opaque identity of a feature model instance; features and constraints record the
/// model they were created in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelId(Uuid);

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// How formula variables are matched to features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lookup {
    /// Identifier of this model's chain first, then feature name.
    NameOrIdentifier,
    /// Feature name only, as used by serialized models.
    Name,
}

/// Feature tree plus constraints.
///
/// Entities are addressed by identifiers of the model's own chain; identifiers drawn
/// from another chain never denote an entity of this model, even if their values match.
#[derive(Debug)]
pub struct FeatureModel {
    id: ModelId,
    factory: IdentifierFactory,
    pub(crate) features: Arena<Feature>,
    feature_indices: HashMap<Identifier, Index>,
    pub(crate) root: Index,
    pub(crate) constraints: Arena<Constraint>,
    constraint_indices: HashMap<Identifier, Index>,
    /// Registered constraints, in order.
    pub(crate) sequence: Vec<Index>,
}

impl FeatureModel {
    /// Creates a model whose root feature takes the next identifier of `factory`.
    pub fn new(factory: IdentifierFactory) -> DomainResult<Self> {
        let id = ModelId(Uuid::new_v4());
        let root_identifier = factory.new_identifier()?;
        let mut features = Arena::new();
        let root = features.insert(Feature::new(root_identifier.clone(), id));
        debug!("created feature model {} with root {}", id, root_identifier);
        Ok(Self {
            id,
            factory,
            features,
            feature_indices: HashMap::from([(root_identifier, root)]),
            root,
            constraints: Arena::new(),
            constraint_indices: HashMap::new(),
            sequence: Vec::new(),
        })
    }

    pub fn id(&self) -> ModelId {
        self.id
    }

    pub fn identifier_factory(&self) -> &IdentifierFactory {
        &self.factory
    }

    /// Allocates an identifier from the model's chain without creating an entity.
    pub fn new_identifier(&self) -> DomainResult<Identifier> {
        self.factory.new_identifier()
    }

    /// Whether `identifier` was drawn from this model's chain.
    fn owns(&self, identifier: &Identifier) -> bool {
        identifier.factory().same_chain(&self.factory)
    }

    // ---- features ----

    pub fn root_feature(&self) -> &Feature {
        &self.features[self.root]
    }

    pub fn feature(&self, identifier: &Identifier) -> Option<&Feature> {
        self.feature_slot(identifier).map(|index| &self.features[index])
    }

    pub fn has_feature(&self, identifier: &Identifier) -> bool {
        self.feature_slot(identifier).is_some()
    }

    pub(crate) fn feature_slot(&self, identifier: &Identifier) -> Option<Index> {
        if !self.owns(identifier) {
            return None;
        }
        self.feature_indices.get(identifier).copied()
    }

    /// Features known to the model, including detached ones.
    pub fn number_of_features(&self) -> usize {
        self.features.len()
    }

    /// Features of the tree in depth-first pre-order, starting at the root.
    pub fn features(&self) -> PreOrder<'_> {
        PreOrder::new(&self.features, self.root)
    }

    /// Non-root features without parent, ordered by identifier.
    pub fn detached_features(&self) -> Vec<&Feature> {
        let mut detached: Vec<&Feature> = self
            .features
            .iter()
            .filter(|&(index, feature)| index != self.root && !feature.has_parent())
            .map(|(_, feature)| feature)
            .collect();
        detached.sort_by(|a, b| a.identifier().cmp(b.identifier()));
        detached
    }

    /// Looks up the feature a formula variable denotes.
    ///
    /// The name is first read as an identifier of this model's chain; failing that,
    /// [`feature_by_name`](Self::feature_by_name) decides.
    pub fn resolve_feature(&self, variable: &str) -> Option<&Feature> {
        if let Ok(identifier) = self.factory.parse(variable) {
            if let Some(feature) = self.feature(&identifier) {
                return Some(feature);
            }
        }
        self.feature_by_name(variable)
    }

    /// First feature called `name`: the tree in pre-order, then detached features.
    pub fn feature_by_name(&self, name: &str) -> Option<&Feature> {
        self.features()
            .chain(self.detached_features())
            .find(|feature| feature.name() == name)
    }

    /// Binds every variable of `formula` to a feature, failing on the first unknown one.
    pub(crate) fn resolve_variables(
        &self,
        formula: &Expression,
        lookup: Lookup,
    ) -> DomainResult<BTreeMap<String, Identifier>> {
        formula
            .variable_names()
            .into_iter()
            .map(|name| {
                let feature = match lookup {
                    Lookup::NameOrIdentifier => self.resolve_feature(&name),
                    Lookup::Name => self.feature_by_name(&name),
                };
                match feature {
                    Some(feature) => Ok((name, feature.identifier().clone())),
                    None => Err(DomainError::UnknownReference(name)),
                }
            })
            .collect()
    }

    pub fn mutate_feature(&mut self, identifier: &Identifier) -> DomainResult<FeatureMutator<'_>> {
        let index = self.feature_index(identifier)?;
        Ok(FeatureMutator::new(self, index))
    }

    pub fn analyze_feature(&self, identifier: &Identifier) -> DomainResult<FeatureAnalyzer<'_>> {
        let index = self.feature_index(identifier)?;
        Ok(FeatureAnalyzer::new(self, index))
    }

    fn feature_index(&self, identifier: &Identifier) -> DomainResult<Index> {
        self.feature_slot(identifier)
            .ok_or_else(|| DomainError::NotFound(format!("feature {}", identifier)))
    }

    /// Index of a feature that is about to be linked into the tree.
    pub(crate) fn member_index(&self, identifier: &Identifier) -> DomainResult<Index> {
        self.feature_slot(identifier).ok_or_else(|| {
            DomainError::structural(format!(
                "feature {} does not belong to feature model {}",
                identifier, self.id
            ))
        })
    }

    fn feature_identifier(&self, index: Index) -> &Identifier {
        self.features[index].identifier()
    }

    /// Checks that `child` may be moved below `parent`, ignoring its current parent.
    pub(crate) fn check_reattach(&self, parent: Index, child: Index) -> DomainResult<()> {
        if child == self.root {
            return Err(DomainError::structural("the root feature cannot become a child"));
        }
        // a feature without children is nobody's ancestor
        let cycle = if self.features[child].children.is_empty() {
            child == parent
        } else {
            tree::is_ancestor_or_self(&self.features, child, parent)
        };
        if cycle {
            return Err(DomainError::structural(format!(
                "adding feature {} below {} would create a cycle",
                self.feature_identifier(child),
                self.feature_identifier(parent)
            )));
        }
        Ok(())
    }

    #[instrument(level = "trace", skip(self))]
    pub(crate) fn attach(&mut self, parent: Index, child: Index, position: Option<usize>) -> DomainResult<()> {
        if self.features[child].has_parent() {
            return Err(DomainError::structural(format!(
                "feature {} already has a parent",
                self.feature_identifier(child)
            )));
        }
        self.check_reattach(parent, child)?;
        let len = self.features[parent].children.len();
        let position = position.unwrap_or(len);
        DomainError::check_index(position, len)?;

        self.features[parent].children.insert(position, child);
        self.features[child].parent = Some(parent);
        trace!(
            "attached {} below {} at {}",
            self.feature_identifier(child),
            self.feature_identifier(parent),
            position
        );
        Ok(())
    }

    #[instrument(level = "trace", skip(self))]
    pub(crate) fn detach(&mut self, child: Index) -> DomainResult<()> {
        if child == self.root {
            return Err(DomainError::structural("the root feature has no parent"));
        }
        let parent = self.features[child].parent.ok_or_else(|| {
            DomainError::structural(format!(
                "feature {} has no parent",
                self.feature_identifier(child)
            ))
        })?;
        self.features[parent].children.retain(|&index| index != child);
        self.features[child].parent = None;
        Ok(())
    }

    // ---- constraints ----

    /// Registered constraint with the given identifier.
    pub fn constraint(&self, identifier: &Identifier) -> Option<&Constraint> {
        self.constraint_slot(identifier)
            .filter(|index| self.sequence.contains(index))
            .map(|index| &self.constraints[index])
    }

    /// Whether a constraint with this identifier is registered.
    pub fn has_constraint(&self, identifier: &Identifier) -> bool {
        self.constraint(identifier).is_some()
    }

    pub fn constraint_index(&self, identifier: &Identifier) -> Option<usize> {
        let index = self.constraint_slot(identifier)?;
        self.sequence.iter().position(|&registered| registered == index)
    }

    /// Registered constraints in sequence order.
    pub fn constraints(&self) -> impl Iterator<Item = &Constraint> + '_ {
        self.sequence.iter().map(move |&index| &self.constraints[index])
    }

    pub fn number_of_constraints(&self) -> usize {
        self.sequence.len()
    }

    /// Mutator for a registered or detached constraint of this model.
    pub fn mutate_constraint(&mut self, identifier: &Identifier) -> DomainResult<ConstraintMutator<'_>> {
        let index = self.constraint_arena_index(identifier)?;
        Ok(ConstraintMutator::new(self, index))
    }

    pub fn analyze_constraint(&self, identifier: &Identifier) -> DomainResult<ConstraintAnalyzer<'_>> {
        let index = self.constraint_arena_index(identifier)?;
        Ok(ConstraintAnalyzer::new(self, index))
    }

    fn constraint_slot(&self, identifier: &Identifier) -> Option<Index> {
        if !self.owns(identifier) {
            return None;
        }
        self.constraint_indices.get(identifier).copied()
    }

    fn constraint_arena_index(&self, identifier: &Identifier) -> DomainResult<Index> {
        self.constraint_slot(identifier)
            .ok_or_else(|| DomainError::NotFound(format!("constraint {}", identifier)))
    }

    /// Index of a constraint that is about to be registered.
    fn member_constraint_index(&self, identifier: &Identifier) -> DomainResult<Index> {
        if !self.owns(identifier) {
            return Err(DomainError::structural(format!(
                "constraint {} does not belong to feature model {}",
                identifier, self.id
            )));
        }
        self.constraint_arena_index(identifier)
    }
}

impl Mutable for FeatureModel {
    type Mutator<'a> = FeatureModelMutator<'a>;

    fn mutate(&mut self) -> FeatureModelMutator<'_> {
        FeatureModelMutator { model: self }
    }
}

impl Analyzable for FeatureModel {
    type Analyzer<'a> = FeatureModelAnalyzer<'a>;

    fn analyze(&self) -> FeatureModelAnalyzer<'_> {
        FeatureModelAnalyzer { model: self }
    }
}

impl fmt::Display for FeatureModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        tree::render(&self.features, self.root, f)
    }
}

/// State-changing operations on a feature model.
#[derive(Debug)]
pub struct FeatureModelMutator<'a> {
    model: &'a mut FeatureModel,
}

impl FeatureModelMutator<'_> {
    /// Creates a feature below `parent` at `position` (default: last).
    pub fn create_feature(&mut self, parent: &Identifier, position: Option<usize>) -> DomainResult<Identifier> {
        let parent = self.model.feature_index(parent)?;
        if let Some(position) = position {
            DomainError::check_index(position, self.model.features[parent].children.len())?;
        }
        let (identifier, child) = self.insert_feature()?;
        self.model.attach(parent, child, position)?;
        Ok(identifier)
    }

    /// Creates a feature that is known to the model but not part of the tree.
    pub fn create_detached_feature(&mut self) -> DomainResult<Identifier> {
        Ok(self.insert_feature()?.0)
    }

    fn insert_feature(&mut self) -> DomainResult<(Identifier, Index)> {
        let identifier = self.model.factory.new_identifier()?;
        let index = self
            .model
            .features
            .insert(Feature::new(identifier.clone(), self.model.id));
        self.model.feature_indices.insert(identifier.clone(), index);
        debug!("created feature {}", identifier);
        Ok((identifier, index))
    }

    /// Removes a feature from the model.
    ///
    /// Its children take its place below its parent (or become detached when the
    /// feature itself was detached). Fails for the root and for features still
    /// referenced by a constraint.
    pub fn delete_feature(&mut self, identifier: &Identifier) -> DomainResult<()> {
        let index = self.model.feature_index(identifier)?;
        if index == self.model.root {
            return Err(DomainError::structural("the root feature cannot be deleted"));
        }
        if let Some((_, constraint)) = self
            .model
            .constraints
            .iter()
            .find(|(_, constraint)| constraint.references(identifier))
        {
            return Err(DomainError::structural(format!(
                "feature {} is referenced by constraint {}",
                identifier,
                constraint.identifier()
            )));
        }

        let children = std::mem::take(&mut self.model.features[index].children);
        let parent = self.model.features[index].parent;
        if let Some(parent) = parent {
            let siblings = &mut self.model.features[parent].children;
            if let Some(position) = siblings.iter().position(|&sibling| sibling == index) {
                siblings.remove(position);
                for (offset, &child) in children.iter().enumerate() {
                    siblings.insert(position + offset, child);
                }
            }
        }
        for &child in &children {
            self.model.features[child].parent = parent;
        }
        self.model.features.remove(index);
        self.model.feature_indices.remove(identifier);
        debug!("deleted feature {} ({} children moved up)", identifier, children.len());
        Ok(())
    }

    /// Replaces the constraint at `position` with the given, not yet registered one.
    pub fn set_constraint(&mut self, position: usize, identifier: &Identifier) -> DomainResult<()> {
        let index = self.model.member_constraint_index(identifier)?;
        if self.model.sequence.contains(&index) {
            return Err(DomainError::Duplicate(format!("constraint {}", identifier)));
        }
        let len = self.model.sequence.len();
        let slot = self
            .model
            .sequence
            .get_mut(position)
            .ok_or(DomainError::OutOfBounds { index: position, len })?;
        *slot = index;
        Ok(())
    }

    /// Clears the sequence, then adds every constraint in order.
    ///
    /// Stops at the first failing constraint; the ones before it stay registered.
    pub fn set_constraints<'i>(&mut self, identifiers: impl IntoIterator<Item = &'i Identifier>) -> DomainResult<()> {
        self.model.sequence.clear();
        for identifier in identifiers {
            self.add_constraint(identifier, None)?;
        }
        Ok(())
    }

    /// Registers a constraint at `position` (default: last).
    pub fn add_constraint(&mut self, identifier: &Identifier, position: Option<usize>) -> DomainResult<()> {
        let index = self.model.member_constraint_index(identifier)?;
        if self.model.sequence.contains(&index) {
            return Err(DomainError::Duplicate(format!("constraint {}", identifier)));
        }
        let len = self.model.sequence.len();
        let position = position.unwrap_or(len);
        DomainError::check_index(position, len)?;
        self.model.sequence.insert(position, index);
        debug!("registered constraint {} at {}", identifier, position);
        Ok(())
    }

    /// Creates a constraint that is known to the model but not registered.
    ///
    /// Variables are resolved by [`FeatureModel::resolve_feature`]. The identifier is
    /// drawn before the formula is checked, so a rejected formula still consumes one
    /// identifier.
    pub fn new_constraint(&mut self, formula: Expression) -> DomainResult<Identifier> {
        self.insert_constraint(formula, Lookup::NameOrIdentifier)
    }

    /// Like [`new_constraint`](Self::new_constraint), but variables only match feature names.
    pub fn new_constraint_by_name(&mut self, formula: Expression) -> DomainResult<Identifier> {
        self.insert_constraint(formula, Lookup::Name)
    }

    fn insert_constraint(&mut self, formula: Expression, lookup: Lookup) -> DomainResult<Identifier> {
        let identifier = self.model.factory.new_identifier()?;
        let mut constraint = Constraint::new(identifier.clone(), self.model.id);
        let bindings = self.model.resolve_variables(&formula, lookup)?;
        constraint.replace_formula(formula, bindings);
        let index = self.model.constraints.insert(constraint);
        self.model.constraint_indices.insert(identifier.clone(), index);
        Ok(identifier)
    }

    /// Creates a constraint and registers it at `position` (default: last).
    pub fn create_constraint(&mut self, formula: Expression, position: Option<usize>) -> DomainResult<Identifier> {
        let identifier = self.new_constraint(formula)?;
        self.register_new(identifier, position)
    }

    /// Like [`create_constraint`](Self::create_constraint), but variables only match feature names.
    pub fn create_constraint_by_name(
        &mut self,
        formula: Expression,
        position: Option<usize>,
    ) -> DomainResult<Identifier> {
        let identifier = self.new_constraint_by_name(formula)?;
        self.register_new(identifier, position)
    }

    fn register_new(&mut self, identifier: Identifier, position: Option<usize>) -> DomainResult<Identifier> {
        if let Err(e) = self.add_constraint(&identifier, position) {
            self.discard(&identifier);
            return Err(e);
        }
        Ok(identifier)
    }

    /// Unregisters a constraint; it stays known to the model and can be added again.
    pub fn remove_constraint(&mut self, identifier: &Identifier) -> DomainResult<()> {
        let position = self
            .model
            .constraint_index(identifier)
            .ok_or_else(|| DomainError::NotFound(format!("constraint {}", identifier)))?;
        self.model.sequence.remove(position);
        debug!("unregistered constraint {}", identifier);
        Ok(())
    }

    /// Unregisters the constraint at `position` and returns its identifier.
    pub fn remove_constraint_at(&mut self, position: usize) -> DomainResult<Identifier> {
        let len = self.model.sequence.len();
        if position >= len {
            return Err(DomainError::OutOfBounds { index: position, len });
        }
        let index = self.model.sequence.remove(position);
        Ok(self.model.constraints[index].identifier().clone())
    }

    /// Unregisters (if needed) and forgets a constraint.
    pub fn delete_constraint(&mut self, identifier: &Identifier) -> DomainResult<()> {
        self.model.constraint_arena_index(identifier)?;
        self.discard(identifier);
        Ok(())
    }

    fn discard(&mut self, identifier: &Identifier) {
        if let Some(index) = self.model.constraint_indices.remove(identifier) {
            self.model.sequence.retain(|&registered| registered != index);
            self.model.constraints.remove(index);
        }
    }
}

impl Mutator for FeatureModelMutator<'_> {
    type Target = FeatureModel;

    fn mutable(&self) -> &FeatureModel {
        self.model
    }
}

/// Derived, read-only queries over a feature model.
#[derive(Debug, Clone, Copy)]
pub struct FeatureModelAnalyzer<'a> {
    model: &'a FeatureModel,
}

impl<'a> FeatureModelAnalyzer<'a> {
    /// Constraints implied by the others; empty until a reasoning backend exists.
    pub fn redundant_constraints(&self) -> BTreeSet<Identifier> {
        self.model
            .sequence
            .iter()
            .map(|&index| ConstraintAnalyzer::new(self.model, index))
            .filter(|analyzer| analyzer.is_redundant())
            .map(|analyzer| analyzer.analyzable().identifier().clone())
            .collect()
    }

    /// Levels of the tree; a model with only a root has depth `1`.
    pub fn tree_depth(&self) -> usize {
        tree::depth(&self.model.features, self.model.root)
    }

    /// Features without children, in pre-order.
    pub fn leaf_features(&self) -> Vec<&'a Feature> {
        self.model
            .features()
            .filter(|feature| feature.children_count() == 0)
            .collect()
    }

    /// Tree of feature names, rooted at the root feature.
    pub fn to_tree(&self) -> termtree::Tree<String> {
        tree::to_tree(&self.model.features, self.model.root)
    }
}

impl Analyzer for FeatureModelAnalyzer<'_> {
    type Target = FeatureModel;

    fn analyzable(&self) -> &FeatureModel {
        self.model
    }
}

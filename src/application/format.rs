//! Textual formats for feature models.
//!
//! Only the tree below the root and the registered constraints are written; detached
//! features and unregistered constraints are not part of a serialized model.
//! Formula variables are written as the current names of the features they are bound
//! to, and read back by name only.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{
    Analyzable, Constraint, DomainError, Expression, Feature, FeatureModel, Identifiable, Identifier,
    IdentifierFactory, Mutable,
};

/// Converts feature models to and from text.
pub trait FeatureModelFormat: Send + Sync {
    fn name(&self) -> &'static str;

    /// File extension without leading dot.
    fn file_extension(&self) -> &'static str;

    fn serialize(&self, model: &FeatureModel) -> ApplicationResult<String>;

    /// Builds a new model whose identifiers are drawn from `factory`.
    fn parse(&self, text: &str, factory: IdentifierFactory) -> ApplicationResult<FeatureModel>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModelDocument {
    root: FeatureDocument,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    constraints: Vec<ConstraintDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct FeatureDocument {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    hidden: bool,
    #[serde(rename = "abstract", default, skip_serializing_if = "is_false")]
    is_abstract: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<FeatureDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConstraintDocument {
    formula: Expression,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    tags: BTreeSet<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Containers the formula opens when written: variables and negations are one object,
/// n-ary and binary operators an object holding an array. Constants are plain strings.
fn formula_nesting(formula: &Expression) -> usize {
    let mut deepest = 0;
    let mut stack = vec![(formula, 0)];
    while let Some((expression, above)) = stack.pop() {
        match expression {
            Expression::True | Expression::False => deepest = deepest.max(above),
            Expression::Variable(_) => deepest = deepest.max(above + 1),
            Expression::Not(operand) => stack.push((operand.as_ref(), above + 1)),
            Expression::And(operands) | Expression::Or(operands) => {
                deepest = deepest.max(above + 2);
                stack.extend(operands.iter().map(|operand| (operand, above + 2)));
            }
            Expression::Implies(left, right) | Expression::BiImplies(left, right) => {
                stack.push((left.as_ref(), above + 2));
                stack.push((right.as_ref(), above + 2));
            }
        }
    }
    deepest
}

/// JSON representation; output always ends with a newline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonFormat {
    pub pretty: bool,
}

impl Default for JsonFormat {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl JsonFormat {
    /// Deepest container nesting serde_json reads back.
    pub const MAX_NESTING: usize = 127;

    /// Deepest tree that fits: every level adds a feature object and a children array.
    pub const MAX_TREE_DEPTH: usize = Self::MAX_NESTING / 2;

    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn check_nesting(model: &FeatureModel) -> ApplicationResult<()> {
        let depth = model.analyze().tree_depth();
        if depth > Self::MAX_TREE_DEPTH {
            return Err(ApplicationError::NotRepresentable {
                reason: format!(
                    "feature tree has {} levels, at most {} can be read back",
                    depth,
                    Self::MAX_TREE_DEPTH
                ),
            });
        }
        for constraint in model.constraints() {
            // document object, constraints array, constraint object
            let nesting = 3 + formula_nesting(constraint.formula());
            if nesting > Self::MAX_NESTING {
                return Err(ApplicationError::NotRepresentable {
                    reason: format!(
                        "formula of constraint {} nests {} levels deep, at most {} can be read back",
                        constraint.identifier(),
                        nesting,
                        Self::MAX_NESTING
                    ),
                });
            }
        }
        Ok(())
    }

    fn feature_document(feature: &Feature, children: Vec<FeatureDocument>) -> FeatureDocument {
        let element = feature.element();
        FeatureDocument {
            name: element.name(),
            description: element.description(),
            hidden: element.is_hidden(),
            is_abstract: element.is_abstract(),
            children,
        }
    }

    /// Builds the root document bottom-up from the pre-order sequence.
    fn tree_document(model: &FeatureModel) -> ApplicationResult<FeatureDocument> {
        let features: Vec<&Feature> = model.features().collect();
        let mut built: HashMap<&Identifier, FeatureDocument> = HashMap::new();
        for feature in features.iter().rev() {
            let children = model
                .analyze_feature(feature.identifier())?
                .children()
                .filter_map(|child| built.remove(child.identifier()))
                .collect();
            built.insert(feature.identifier(), Self::feature_document(feature, children));
        }
        let root = model.root_feature();
        Ok(built
            .remove(root.identifier())
            .unwrap_or_else(|| Self::feature_document(root, Vec::new())))
    }

    /// Current name of the feature `variable` is bound to.
    ///
    /// Reading a model resolves each name to the first feature of the tree carrying it,
    /// so the bound feature has to be in the tree and be that first feature.
    fn variable_name(
        model: &FeatureModel,
        first_named: &HashMap<String, &Identifier>,
        constraint: &Constraint,
        variable: &str,
    ) -> ApplicationResult<String> {
        let identifier = constraint
            .binding(variable)
            .ok_or_else(|| DomainError::UnknownReference(variable.to_string()))?;
        let name = model
            .feature(identifier)
            .map(|feature| feature.name())
            .ok_or_else(|| DomainError::NotFound(format!("feature {}", identifier)))?;
        match first_named.get(&name) {
            Some(&first) if first == identifier => Ok(name),
            Some(first) => Err(ApplicationError::NotRepresentable {
                reason: format!(
                    "constraint {} references feature {} whose name {:?} is already taken by feature {}",
                    constraint.identifier(),
                    identifier,
                    name,
                    first
                ),
            }),
            None => Err(ApplicationError::NotRepresentable {
                reason: format!(
                    "constraint {} references feature {} which is not part of the tree",
                    constraint.identifier(),
                    identifier
                ),
            }),
        }
    }

    fn to_document(model: &FeatureModel) -> ApplicationResult<ModelDocument> {
        let root = Self::tree_document(model)?;
        let mut first_named: HashMap<String, &Identifier> = HashMap::new();
        for feature in model.features() {
            first_named.entry(feature.name()).or_insert(feature.identifier());
        }
        let constraints = model
            .constraints()
            .map(|constraint| {
                Ok(ConstraintDocument {
                    formula: constraint.formula().try_map_variables(&|variable: &str| {
                        Self::variable_name(model, &first_named, constraint, variable)
                    })?,
                    description: constraint.element().description(),
                    tags: constraint.tags(),
                })
            })
            .collect::<ApplicationResult<Vec<_>>>()?;
        Ok(ModelDocument { root, constraints })
    }

    /// Creates the features below the root in pre-order, so identifiers follow document order.
    fn build_children(model: &mut FeatureModel, root: &Identifier, children: &[FeatureDocument]) -> ApplicationResult<()> {
        let mut pending: Vec<(Identifier, &FeatureDocument)> =
            children.iter().rev().map(|document| (root.clone(), document)).collect();
        while let Some((parent, document)) = pending.pop() {
            let identifier = model.mutate().create_feature(&parent, None)?;
            Self::apply_feature(model, &identifier, document)?;
            pending.extend(
                document
                    .children
                    .iter()
                    .rev()
                    .map(|child| (identifier.clone(), child)),
            );
        }
        Ok(())
    }

    fn apply_feature(model: &mut FeatureModel, identifier: &Identifier, document: &FeatureDocument) -> ApplicationResult<()> {
        let mut feature = model.mutate_feature(identifier)?;
        feature.set_name(document.name.clone());
        if let Some(description) = &document.description {
            feature.set_description(description.clone());
        }
        if document.hidden {
            feature.set_hidden(true);
        }
        if document.is_abstract {
            feature.set_abstract(true);
        }
        Ok(())
    }
}

impl FeatureModelFormat for JsonFormat {
    fn name(&self) -> &'static str {
        "json"
    }

    fn file_extension(&self) -> &'static str {
        "json"
    }

    fn serialize(&self, model: &FeatureModel) -> ApplicationResult<String> {
        Self::check_nesting(model)?;
        let document = Self::to_document(model)?;
        let mut text = if self.pretty {
            serde_json::to_string_pretty(&document)?
        } else {
            serde_json::to_string(&document)?
        };
        text.push('\n');
        Ok(text)
    }

    fn parse(&self, text: &str, factory: IdentifierFactory) -> ApplicationResult<FeatureModel> {
        let document: ModelDocument = serde_json::from_str(text)?;
        let mut model = FeatureModel::new(factory)?;
        let root = model.root_feature().identifier().clone();
        Self::apply_feature(&mut model, &root, &document.root)?;
        Self::build_children(&mut model, &root, &document.root.children)?;

        for constraint in document.constraints {
            let identifier = model.mutate().create_constraint_by_name(constraint.formula, None)?;
            let mut mutator = model.mutate_constraint(&identifier)?;
            if let Some(description) = constraint.description {
                mutator.set_description(description);
            }
            if !constraint.tags.is_empty() {
                mutator.set_tags(constraint.tags);
            }
        }
        debug!(
            "parsed {} feature(s) and {} constraint(s)",
            model.number_of_features(),
            model.number_of_constraints()
        );
        Ok(model)
    }
}

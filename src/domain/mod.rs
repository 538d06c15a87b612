//! Domain layer: the feature model entity graph
//!
//! This layer is independent of external concerns (no I/O, no config loading).

pub mod attribute;
pub mod constraint;
pub mod element;
pub mod error;
pub mod feature;
pub mod feature_model;
pub mod formula;
pub mod identifier;
pub mod role;
pub mod tree;

pub use attribute::{Attribute, AttributeKey, AttributeStore, ABSTRACT, DESCRIPTION, HIDDEN, NAME, TAGS};
pub use constraint::{Constraint, ConstraintAnalyzer, ConstraintMutator};
pub use element::{Element, Identifiable};
pub use error::{DomainError, DomainResult};
pub use feature::{Feature, FeatureAnalyzer, FeatureMutator};
pub use feature_model::{FeatureModel, FeatureModelAnalyzer, FeatureModelMutator, ModelId};
pub use formula::{Expression, Formula};
pub use identifier::{Identifier, IdentifierFactory, IdentifierStrategy};
pub use role::{Analyzable, Analyzer, Mutable, Mutator};
pub use tree::{Ancestors, BreadthFirst, PreOrder};

//! Feature models for software product lines.
//!
//! A [`FeatureModel`] owns a tree of [`Feature`]s and a sequence of [`Constraint`]s
//! whose formulas reference features by name or identifier. All changes go through
//! mutators, derived queries through analyzers:
//!
//! ```
//! use featmodel::prelude::*;
//!
//! let mut model = FeatureModel::new(IdentifierFactory::counter())?;
//! let root = model.root_feature().identifier().clone();
//! let child = model.mutate().create_feature(&root, None)?;
//! model.mutate_feature(&child)?.set_name("Logging");
//!
//! let constraint = model
//!     .mutate()
//!     .create_constraint(Expression::implies(Expression::var("Logging"), Expression::var("1")), None)?;
//! assert_eq!(model.number_of_constraints(), 1);
//! assert_eq!(model.analyze_constraint(&constraint)?.contained_features().len(), 2);
//! # Ok::<(), featmodel::domain::DomainError>(())
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod util;

pub use domain::{Constraint, Feature, FeatureModel};

/// Common imports for working with feature models.
pub mod prelude {
    pub use crate::domain::{
        Analyzable, Analyzer, Attribute, Constraint, DomainError, DomainResult, Expression,
        Feature, FeatureModel, Formula, Identifiable, Identifier, IdentifierFactory, Mutable,
        Mutator,
    };
}

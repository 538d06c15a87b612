//! Formula collaborator.
//!
//! The feature model only needs [`Formula::variable_names`]; [`Expression`] is the
//! propositional formula type stored in constraints and written by the formats.

use std::collections::BTreeSet;
use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Anything that references variables by name.
pub trait Formula {
    /// Names of all variables occurring in the formula.
    fn variable_names(&self) -> BTreeSet<String>;
}

/// Propositional formula over feature names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expression {
    True,
    False,
    #[serde(rename = "var")]
    Variable(String),
    Not(Box<Expression>),
    And(Vec<Expression>),
    Or(Vec<Expression>),
    Implies(Box<Expression>, Box<Expression>),
    #[serde(rename = "iff")]
    BiImplies(Box<Expression>, Box<Expression>),
}

impl Default for Expression {
    fn default() -> Self {
        Self::True
    }
}

impl Expression {
    pub fn var(name: impl Into<String>) -> Self {
        Self::Variable(name.into())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(operand: Expression) -> Self {
        Self::Not(Box::new(operand))
    }

    pub fn and(operands: impl IntoIterator<Item = Expression>) -> Self {
        Self::And(operands.into_iter().collect())
    }

    pub fn or(operands: impl IntoIterator<Item = Expression>) -> Self {
        Self::Or(operands.into_iter().collect())
    }

    pub fn implies(left: Expression, right: Expression) -> Self {
        Self::Implies(Box::new(left), Box::new(right))
    }

    pub fn iff(left: Expression, right: Expression) -> Self {
        Self::BiImplies(Box::new(left), Box::new(right))
    }

    /// Renames every variable through `rename`, keeping the structure.
    ///
    /// Stops at the first variable `rename` rejects.
    pub fn try_map_variables<E, F>(&self, rename: &F) -> Result<Expression, E>
    where
        F: Fn(&str) -> Result<String, E>,
    {
        let map_all = |operands: &[Expression]| -> Result<Vec<Expression>, E> {
            operands.iter().map(|o| o.try_map_variables(rename)).collect()
        };
        Ok(match self {
            Self::True => Self::True,
            Self::False => Self::False,
            Self::Variable(name) => Self::Variable(rename(name)?),
            Self::Not(operand) => Self::not(operand.try_map_variables(rename)?),
            Self::And(operands) => Self::And(map_all(operands)?),
            Self::Or(operands) => Self::Or(map_all(operands)?),
            Self::Implies(left, right) => {
                Self::implies(left.try_map_variables(rename)?, right.try_map_variables(rename)?)
            }
            Self::BiImplies(left, right) => {
                Self::iff(left.try_map_variables(rename)?, right.try_map_variables(rename)?)
            }
        })
    }

    fn collect_variables(&self, names: &mut BTreeSet<String>) {
        match self {
            Self::True | Self::False => {}
            Self::Variable(name) => {
                names.insert(name.clone());
            }
            Self::Not(operand) => operand.collect_variables(names),
            Self::And(operands) | Self::Or(operands) => {
                for operand in operands {
                    operand.collect_variables(names);
                }
            }
            Self::Implies(left, right) | Self::BiImplies(left, right) => {
                left.collect_variables(names);
                right.collect_variables(names);
            }
        }
    }
}

impl Formula for Expression {
    fn variable_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_variables(&mut names);
        names
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => write!(f, "true"),
            Self::False => write!(f, "false"),
            Self::Variable(name) => write!(f, "{}", name),
            Self::Not(operand) => write!(f, "!{}", operand),
            Self::And(operands) => write!(f, "({})", operands.iter().join(" & ")),
            Self::Or(operands) => write!(f, "({})", operands.iter().join(" | ")),
            Self::Implies(left, right) => write!(f, "({} => {})", left, right),
            Self::BiImplies(left, right) => write!(f, "({} <=> {})", left, right),
        }
    }
}

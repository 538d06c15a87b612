//! Identifiers and identifier chains.
//!
//! Every identifier remembers the [`IdentifierFactory`] (its *chain*) it was drawn from.
//! Counter chains share one atomic counter between all identifiers derived from them,
//! UUID chains carry no shared state.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::error::{DomainError, DomainResult};

/// Allocation strategy of an identifier chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierStrategy {
    Counter,
    Uuid,
}

/// Source of fresh identifiers; also parses serialized identifiers back into the chain.
#[derive(Debug, Clone)]
pub enum IdentifierFactory {
    /// Monotonic counter holding the next value to hand out.
    Counter(Arc<AtomicU64>),
    Uuid,
}

impl Default for IdentifierFactory {
    fn default() -> Self {
        Self::counter()
    }
}

impl IdentifierFactory {
    /// Counter chain starting at `1`.
    pub fn counter() -> Self {
        Self::counter_from(1)
    }

    /// Counter chain whose first identifier is `seed`.
    pub fn counter_from(seed: u64) -> Self {
        Self::Counter(Arc::new(AtomicU64::new(seed)))
    }

    pub fn uuid() -> Self {
        Self::Uuid
    }

    pub fn strategy(&self) -> IdentifierStrategy {
        match self {
            Self::Counter(_) => IdentifierStrategy::Counter,
            Self::Uuid => IdentifierStrategy::Uuid,
        }
    }

    /// Allocates the next identifier of this chain.
    ///
    /// A counter chain never hands out `u64::MAX`; once it would have to, every further
    /// allocation fails with `Exhausted` and the counter stays where it is.
    pub fn new_identifier(&self) -> DomainResult<Identifier> {
        let value = match self {
            Self::Counter(next) => next
                .fetch_update(AtomicOrdering::SeqCst, AtomicOrdering::SeqCst, |current| {
                    current.checked_add(1)
                })
                .map(IdentifierValue::Counter)
                .map_err(|current| {
                    DomainError::Exhausted(format!("counter chain reached {}", current))
                })?,
            Self::Uuid => IdentifierValue::Uuid(Uuid::new_v4()),
        };
        Ok(Identifier {
            value,
            factory: self.clone(),
        })
    }

    /// Parses the `Display` form of an identifier of this chain.
    ///
    /// Parsing never advances a counter; the parsed identifier shares the chain.
    pub fn parse(&self, input: &str) -> DomainResult<Identifier> {
        let value = match self {
            Self::Counter(_) => input
                .parse::<u64>()
                .map(IdentifierValue::Counter)
                .map_err(|e| DomainError::Format {
                    input: input.to_string(),
                    reason: e.to_string(),
                })?,
            Self::Uuid => Uuid::parse_str(input)
                .map(IdentifierValue::Uuid)
                .map_err(|e| DomainError::Format {
                    input: input.to_string(),
                    reason: e.to_string(),
                })?,
        };
        Ok(Identifier {
            value,
            factory: self.clone(),
        })
    }

    /// Whether both factories hand out identifiers from the same chain.
    pub fn same_chain(&self, other: &IdentifierFactory) -> bool {
        match (self, other) {
            (Self::Counter(a), Self::Counter(b)) => Arc::ptr_eq(a, b),
            (Self::Uuid, Self::Uuid) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum IdentifierValue {
    Counter(u64),
    Uuid(Uuid),
}

/// Unique, serializable token assigned to every entity.
///
/// Equality, hashing and ordering only look at the value: counter identifiers
/// compare numerically and sort before UUID identifiers.
#[derive(Clone)]
pub struct Identifier {
    value: IdentifierValue,
    factory: IdentifierFactory,
}

impl Identifier {
    /// Allocates a fresh identifier from the chain this identifier belongs to.
    pub fn new_identifier(&self) -> DomainResult<Identifier> {
        self.factory.new_identifier()
    }

    pub fn factory(&self) -> &IdentifierFactory {
        &self.factory
    }

    pub fn strategy(&self) -> IdentifierStrategy {
        self.factory.strategy()
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Identifier {}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            IdentifierValue::Counter(n) => write!(f, "{}", n),
            IdentifierValue::Uuid(uuid) => write!(f, "{}", uuid.hyphenated()),
        }
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", self)
    }
}

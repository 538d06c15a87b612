//! Mutator/analyzer role pair.
//!
//! Every mutable entity hands out one kind of mutator (all state changes, invariant
//! checks) and one kind of analyzer (read-only derived queries). Both are borrow
//! handles bound to their entity: a mutator borrows the owning model exclusively, so at
//! most one can be alive per model.

/// Entity that can be changed through a dedicated mutator.
pub trait Mutable {
    type Mutator<'a>: Mutator
    where
        Self: 'a;

    fn mutate(&mut self) -> Self::Mutator<'_>;
}

/// Entity that exposes read-only derived queries through a dedicated analyzer.
pub trait Analyzable {
    type Analyzer<'a>: Analyzer
    where
        Self: 'a;

    fn analyze(&self) -> Self::Analyzer<'_>;
}

/// State-changing capability bound to one entity.
pub trait Mutator {
    type Target;

    /// The entity this mutator changes.
    fn mutable(&self) -> &Self::Target;
}

/// Read-only capability bound to one entity.
pub trait Analyzer {
    type Target;

    /// The entity this analyzer inspects.
    fn analyzable(&self) -> &Self::Target;
}

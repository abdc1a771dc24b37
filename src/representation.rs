use std::sync::Arc;

use enum_dispatch::enum_dispatch;

use crate::dense::DenseSketch;
use crate::exact::ExactSet;

/// Placeholder for a sketch that has not seen any element
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Empty;

/// Representation held by `Sketch`.
///
/// Transitions are `Empty -> Exact -> Dense` and never go back.
#[derive(Debug)]
#[enum_dispatch]
pub(crate) enum Representation {
    Empty(Empty),
    Exact(ExactSet),
    Dense(Arc<DenseSketch>),
}

/// Read-only operations which must be implemented by all representations.
#[enum_dispatch(Representation)]
pub(crate) trait RepresentationTrait {
    fn cardinality(&self) -> u64;
    fn size_of(&self) -> usize;
    fn kind(&self) -> RepresentationKind;
}

/// Representation types exposed by `Sketch::representation`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepresentationKind {
    Empty,
    Exact,
    Dense,
}

impl RepresentationTrait for Empty {
    fn cardinality(&self) -> u64 {
        0
    }

    fn size_of(&self) -> usize {
        0
    }

    fn kind(&self) -> RepresentationKind {
        RepresentationKind::Empty
    }
}

impl RepresentationTrait for ExactSet {
    fn cardinality(&self) -> u64 {
        ExactSet::cardinality(self)
    }

    fn size_of(&self) -> usize {
        ExactSet::size_of(self)
    }

    fn kind(&self) -> RepresentationKind {
        RepresentationKind::Exact
    }
}

impl RepresentationTrait for Arc<DenseSketch> {
    fn cardinality(&self) -> u64 {
        DenseSketch::cardinality(self)
    }

    fn size_of(&self) -> usize {
        DenseSketch::size_of(self)
    }

    fn kind(&self) -> RepresentationKind {
        RepresentationKind::Dense
    }
}

impl Default for Representation {
    fn default() -> Self {
        Representation::Empty(Empty)
    }
}

impl Clone for Representation {
    /// Deep copy; a cloned dense tier does not share registers with the source
    fn clone(&self) -> Self {
        match self {
            Representation::Empty(empty) => Representation::Empty(*empty),
            Representation::Exact(exact) => Representation::Exact(exact.clone()),
            Representation::Dense(dense) => Representation::Dense(Arc::new(DenseSketch::clone(dense))),
        }
    }
}

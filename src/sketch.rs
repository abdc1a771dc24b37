//! Sketch estimates the number of distinct byte sequences added to it.
//!
//! # Data-structure design rationale
//!
//! ## Two tiers
//! - Cardinality in [0..192] range - exact set of 64-bit hashes (at most ~3 KB)
//! - Cardinality in [193..] range - HyperLogLog with 2^14 six-bit registers (~0.81% standard error)
//!
//! The exact tier is replaced by the dense tier once it holds more than `EXACT_THRESHOLD`
//! hashes, at which point its memory cost would exceed the fixed dense footprint.
//!
//! ## Thread safety
//! All operations take `&self`. The active representation sits behind a `RwLock`:
//! - exact tier writes hold the write lock
//! - dense tier writes hold only the read lock and raise registers with atomic `fetch_max`
//! - migration swaps in an empty dense tier under the write lock, releases it, and only then
//!   replays the captured exact hashes; concurrent writers already land in the dense tier
//!   and since registers are monotone maxima the interleaving does not matter
//! - readers (estimate, snapshots, equality) wait for the replay to finish, so they never
//!   observe a dense tier missing hashes of already completed adds
//!
//! Equality and serialization snapshot one sketch at a time, so no thread ever holds
//! locks of two sketches at once.

use std::fmt::{Debug, Formatter};
use std::hash::{BuildHasher, BuildHasherDefault, Hasher};
use std::mem::size_of;
use std::sync::Arc;

use log::{debug, trace};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use wyhash::WyHash;

use crate::dense::DenseSketch;
use crate::error::SketchError;
use crate::exact::ExactSet;
use crate::representation::{Representation, RepresentationKind, RepresentationTrait};

/// Thread-safe distinct count sketch
pub struct Sketch<H: Hasher + Default = WyHash> {
    /// Active representation
    state: RwLock<Representation>,
    /// Held exclusively while exact hashes are replayed into a fresh dense tier
    replay: RwLock<()>,
    /// Zero-sized build hasher
    build_hasher: BuildHasherDefault<H>,
}

impl<H: Hasher + Default> Sketch<H> {
    /// Creates new empty instance of `Sketch`
    pub fn new() -> Self {
        Self::with_representation(Representation::default())
    }

    fn with_representation(representation: Representation) -> Self {
        Self {
            state: RwLock::new(representation),
            replay: RwLock::new(()),
            build_hasher: BuildHasherDefault::default(),
        }
    }

    /// Add byte sequence to `Sketch`.
    /// Returns true if this call changed the sketch state.
    #[inline]
    pub fn add(&self, data: &[u8]) -> bool {
        let mut hasher = self.build_hasher.build_hasher();
        hasher.write(data);
        self.add_hash(hasher.finish())
    }

    /// Add precomputed 64-bit hash to `Sketch`.
    /// Returns true if this call changed the sketch state.
    pub fn add_hash(&self, hash: u64) -> bool {
        {
            let state = self.state.read();
            // does not wait for an in-flight replay
            if let Representation::Dense(dense) = &*state {
                return dense.add(hash);
            }
        }

        let mut state = self.state.write();
        if matches!(*state, Representation::Empty(_)) {
            *state = Representation::Exact(ExactSet::new());
        }
        let changed = match &mut *state {
            // another thread migrated between the two lock acquisitions
            Representation::Dense(dense) => return dense.add(hash),
            Representation::Exact(exact) => {
                let changed = exact.add(hash);
                if !exact.needs_migration() {
                    return changed;
                }
                changed
            }
            Representation::Empty(_) => unreachable!("empty sketch must hold exact set"),
        };

        self.migrate(state);
        changed
    }

    /// Swap exact tier for a dense one and replay exact hashes outside of the state lock.
    /// The replay lock is taken before the state lock is released.
    fn migrate(&self, mut state: RwLockWriteGuard<'_, Representation>) {
        let dense = Arc::new(DenseSketch::new());
        let previous = std::mem::replace(&mut *state, Representation::Dense(Arc::clone(&dense)));
        let _replay = self.replay.write();
        drop(state);

        match previous {
            Representation::Exact(exact) => {
                debug!("migrating {} exact hashes to dense representation", exact.len());
                exact.migrate_into(&dense);
            }
            other => panic!("migration from {:?} representation", other.kind()),
        }
    }

    /// Acquire state for reading once no replay is in flight.
    ///
    /// A new migration needs the state write lock, so holding the returned guard
    /// keeps the state settled.
    fn settled(&self) -> RwLockReadGuard<'_, Representation> {
        let state = self.state.read();
        drop(self.replay.read());
        state
    }

    /// Return cardinality estimate
    pub fn cardinality(&self) -> u64 {
        self.settled().cardinality()
    }

    /// Return representation type of `Sketch`
    pub fn representation(&self) -> RepresentationKind {
        self.state.read().kind()
    }

    /// Return memory size of `Sketch`
    pub fn size_of(&self) -> usize {
        size_of::<Self>() + self.settled().size_of()
    }

    /// Return logical serialized form: exact hashes (sorted) or packed dense registers.
    /// Both are `None` for an empty sketch.
    pub fn to_parts(&self) -> (Option<Vec<u64>>, Option<Vec<u8>>) {
        match &*self.settled() {
            Representation::Empty(_) => (None, None),
            Representation::Exact(exact) => (Some(exact.sorted_hashes()), None),
            Representation::Dense(dense) => (None, Some(dense.to_packed())),
        }
    }

    /// Create new instance of `Sketch` from parts produced by `to_parts`
    pub fn from_parts(
        exact: Option<Vec<u64>>,
        dense: Option<Vec<u8>>,
    ) -> Result<Self, SketchError> {
        let representation = match (exact, dense) {
            (Some(_), Some(_)) => return Err(SketchError::BothRepresentations),
            (None, None) => Representation::default(),
            (None, Some(packed)) => {
                Representation::Dense(Arc::new(DenseSketch::from_packed(&packed)?))
            }
            (Some(hashes), None) if hashes.is_empty() => Representation::default(),
            (Some(hashes), None) => {
                let exact: ExactSet = hashes.into_iter().collect();
                if exact.needs_migration() {
                    trace!("loaded {} exact hashes, migrating to dense", exact.len());
                    let dense = DenseSketch::new();
                    exact.migrate_into(&dense);
                    Representation::Dense(Arc::new(dense))
                } else {
                    Representation::Exact(exact)
                }
            }
        };

        Ok(Self::with_representation(representation))
    }
}

impl<H: Hasher + Default> Default for Sketch<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Hasher + Default> Clone for Sketch<H> {
    /// Clone snapshot of current state
    fn clone(&self) -> Self {
        Self::with_representation(self.settled().clone())
    }
}

impl<H: Hasher + Default> PartialEq for Sketch<H> {
    /// Compare logical state of two sketches
    fn eq(&self, rhs: &Self) -> bool {
        std::ptr::eq(self, rhs) || self.to_parts() == rhs.to_parts()
    }
}

impl<H: Hasher + Default> Eq for Sketch<H> {}

impl<H: Hasher + Default> Debug for Sketch<H> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let state = self.settled();
        write!(
            f,
            "{{ representation: {:?}, estimate: {}, size: {} }}",
            state.kind(),
            state.cardinality(),
            size_of::<Self>() + state.size_of()
        )
    }
}

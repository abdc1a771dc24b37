//! `hll-sketch` estimates the number of distinct byte sequences added to a key of a cache server.
//!
//! Small cardinalities (up to 192) are counted exactly; above that the sketch migrates once,
//! irreversibly, to a HyperLogLog with 2^14 registers and LogLog-Beta bias correction.
//! All operations take `&self` and are safe to call from any number of threads.
//!
//! ```
//! use hll_sketch::Sketch;
//!
//! let sketch: Sketch = Sketch::new();
//! assert!(sketch.add(b"hll-0"));
//! assert!(!sketch.add(b"hll-0"));
//! assert_eq!(sketch.cardinality(), 1);
//! ```
pub mod dense;
pub mod error;
pub mod exact;
pub mod hash;
mod representation;
#[cfg(feature = "with_serde")]
mod serde;
pub mod sketch;

pub use dense::{DenseSketch, PACKED_LEN};
pub use error::SketchError;
pub use exact::{ExactSet, EXACT_THRESHOLD};
pub use hash::{split, MAX_RANK, PRECISION, REGISTER_COUNT, REGISTER_WIDTH};
pub use representation::RepresentationKind;
pub use sketch::Sketch;

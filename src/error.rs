use thiserror::Error;

/// Errors produced when rebuilding a `Sketch` from its serialized parts
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SketchError {
    /// Exact and dense parts are mutually exclusive
    #[error("both exact and dense representations are present")]
    BothRepresentations,
    /// Packed register buffer does not hold exactly `REGISTER_COUNT` registers
    #[error("dense representation must be {expected} bytes long, got {actual}")]
    DenseLength { expected: usize, actual: usize },
    /// Register value that no hash can produce
    #[error("register {bucket} holds rank {rank} which exceeds the maximum rank")]
    RankOutOfRange { bucket: usize, rank: u8 },
}

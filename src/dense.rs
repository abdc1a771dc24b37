//! ## Dense representation
//! Estimates large cardinality with HyperLogLog over `REGISTER_COUNT` registers.
//!
//! Registers live in an array of `AtomicU8` and are only ever raised with `fetch_max`,
//! so concurrent writers (including the one-time replay of the exact tier) never need a lock.
//!
//! Cardinality is computed on demand:
//! - linear counting while some registers are zero and the raw estimate is at most `5m/2`
//! - LogLog-Beta bias corrected estimate above that
//!
//! [LogLog-Beta paper](https://arxiv.org/pdf/1612.02284.pdf)
//!
//! Serialized form packs registers using `REGISTER_WIDTH` bits each (12288 bytes),
//! register `i` occupying bits `6i..6i+6` in little-endian bit order.

use std::fmt::{Debug, Formatter};
use std::mem::size_of;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::error::SketchError;
use crate::hash::{split, MAX_RANK, REGISTER_COUNT, REGISTER_WIDTH};

/// Length of the packed register buffer in bytes
pub const PACKED_LEN: usize = REGISTER_COUNT * REGISTER_WIDTH / 8;
/// Raw estimates up to `LINEAR_COUNTING_CUTOFF * m` use linear counting when zero registers remain
const LINEAR_COUNTING_CUTOFF: f64 = 2.5;

/// Fixed-size array of HyperLogLog registers
pub struct DenseSketch {
    registers: Box<[AtomicU8]>,
}

impl DenseSketch {
    /// Create new instance with all registers set to 0
    pub fn new() -> Self {
        Self {
            registers: (0..REGISTER_COUNT).map(|_| AtomicU8::new(0)).collect(),
        }
    }

    /// Raise `bucket` register to `rank`.
    /// Returns true if the register value increased.
    #[inline]
    pub fn observe(&self, bucket: u16, rank: u8) -> bool {
        self.registers[usize::from(bucket)].fetch_max(rank, Ordering::Relaxed) < rank
    }

    /// Insert 64-bit hash.
    /// Returns true if this call changed the sketch.
    #[inline]
    pub fn add(&self, hash: u64) -> bool {
        let (bucket, rank) = split(hash);
        self.observe(bucket, rank)
    }

    /// Return cardinality estimate
    pub fn cardinality(&self) -> u64 {
        let mut zeros = 0usize;
        let mut sum = 0.0f64;
        for register in self.registers.iter() {
            let rank = register.load(Ordering::Relaxed);
            zeros += usize::from(rank == 0);
            sum += (-f64::from(rank)).exp2();
        }
        estimate(zeros, sum)
    }

    /// Return number of registers still set to 0
    pub fn zero_registers(&self) -> usize {
        self.registers
            .iter()
            .filter(|r| r.load(Ordering::Relaxed) == 0)
            .count()
    }

    /// Return snapshot of register values
    pub fn registers(&self) -> Vec<u8> {
        self.registers
            .iter()
            .map(|r| r.load(Ordering::Relaxed))
            .collect()
    }

    /// Return memory size of `DenseSketch`
    pub fn size_of(&self) -> usize {
        size_of::<Self>() + self.registers.len() * size_of::<AtomicU8>()
    }

    /// Pack registers into `PACKED_LEN` bytes
    pub fn to_packed(&self) -> Vec<u8> {
        let mut data = vec![0u8; PACKED_LEN];
        for (idx, register) in self.registers.iter().enumerate() {
            set_packed(&mut data, idx, register.load(Ordering::Relaxed));
        }
        data
    }

    /// Create new instance from packed registers
    pub fn from_packed(data: &[u8]) -> Result<Self, SketchError> {
        if data.len() != PACKED_LEN {
            return Err(SketchError::DenseLength {
                expected: PACKED_LEN,
                actual: data.len(),
            });
        }

        let registers = (0..REGISTER_COUNT)
            .map(|bucket| match get_packed(data, bucket) {
                rank if rank > MAX_RANK => Err(SketchError::RankOutOfRange { bucket, rank }),
                rank => Ok(AtomicU8::new(rank)),
            })
            .collect::<Result<Box<[AtomicU8]>, _>>()?;

        Ok(Self { registers })
    }
}

impl Default for DenseSketch {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for DenseSketch {
    /// Clone snapshot of registers
    fn clone(&self) -> Self {
        Self {
            registers: self
                .registers
                .iter()
                .map(|r| AtomicU8::new(r.load(Ordering::Relaxed)))
                .collect(),
        }
    }
}

impl PartialEq for DenseSketch {
    /// Compare registers pairwise
    fn eq(&self, rhs: &Self) -> bool {
        self.registers
            .iter()
            .zip(rhs.registers.iter())
            .all(|(l, r)| l.load(Ordering::Relaxed) == r.load(Ordering::Relaxed))
    }
}

impl Eq for DenseSketch {}

impl Debug for DenseSketch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{ estimate: {}, zeros: {}, size: {} }}",
            self.cardinality(),
            self.zero_registers(),
            self.size_of()
        )
    }
}

/// Compute cardinality from number of zero registers and harmonic sum `Σ 2^-register`
fn estimate(zeros: usize, sum: f64) -> u64 {
    let m = REGISTER_COUNT as f64;
    let z = zeros as f64;
    let raw = alpha(REGISTER_COUNT) * m * m / sum;
    let estimate = if zeros > 0 && raw <= LINEAR_COUNTING_CUTOFF * m {
        m * (m / z).ln()
    } else {
        alpha(REGISTER_COUNT) * m * (m - z) / (sum + beta_horner(z))
    };
    (estimate.max(0.0) + 0.5) as u64
}

/// Parameter for bias correction
#[inline]
fn alpha(m: usize) -> f64 {
    0.7213 / (1.0 + 1.079 / (m as f64))
}

/// Computes LogLog-Beta estimate bias correction using Horner's method.
///
/// Wikipedia: https://en.wikipedia.org/wiki/Horner%27s_method
#[inline]
fn beta_horner(z: f64) -> f64 {
    let zl = (z + 1.0).ln();
    let mut res = 0.0;
    for i in (1..8).rev() {
        res = res * zl + BETA[i];
    }
    res * zl + BETA[0] * z
}

/// LogLog-Beta polynomial coefficients for 2^14 registers
const BETA: [f64; 8] = [
    -3.71009760230692e-01,
    9.78811941207509e-03,
    1.85796293324165e-01,
    2.03015527328432e-01,
    -1.16710521803686e-01,
    4.31106699492820e-02,
    -5.99583540511831e-03,
    4.49704299509437e-04,
];

/// Get `idx` register from packed buffer
#[inline]
fn get_packed(data: &[u8], idx: usize) -> u8 {
    let bit_idx = idx * REGISTER_WIDTH;
    let byte_idx = bit_idx / 8;
    let bit_pos = bit_idx % 8;
    let bits_1 = REGISTER_WIDTH.min(8 - bit_pos);
    let bits_2 = REGISTER_WIDTH - bits_1;
    let mask_1 = (1u8 << bits_1) - 1;

    let mut rank = (data[byte_idx] >> bit_pos) & mask_1;
    if bits_2 > 0 {
        let mask_2 = (1u8 << bits_2) - 1;
        rank |= (data[byte_idx + 1] & mask_2) << bits_1;
    }
    rank
}

/// Write `idx` register into zero-initialized packed buffer
#[inline]
fn set_packed(data: &mut [u8], idx: usize, rank: u8) {
    let bit_idx = idx * REGISTER_WIDTH;
    let byte_idx = bit_idx / 8;
    let bit_pos = bit_idx % 8;
    let bits_1 = REGISTER_WIDTH.min(8 - bit_pos);
    let bits_2 = REGISTER_WIDTH - bits_1;
    let mask_1 = (1u8 << bits_1) - 1;

    data[byte_idx] |= (rank & mask_1) << bit_pos;
    if bits_2 > 0 {
        let mask_2 = (1u8 << bits_2) - 1;
        data[byte_idx + 1] |= (rank >> bits_1) & mask_2;
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use test_case::test_case;
    use wyhash::wyhash;

    fn dense_with(n: u64, seed: u64) -> DenseSketch {
        let dense = DenseSketch::new();
        for i in 0..n {
            dense.add(wyhash(&i.to_le_bytes(), seed));
        }
        dense
    }

    #[test]
    fn test_empty() {
        let dense = DenseSketch::new();
        assert_eq!(dense.cardinality(), 0);
        assert_eq!(dense.zero_registers(), REGISTER_COUNT);
        assert_eq!(dense.to_packed(), vec![0u8; PACKED_LEN]);
    }

    #[test]
    fn test_observe_keeps_maximum() {
        let dense = DenseSketch::new();
        assert!(dense.observe(7, 3));
        assert!(!dense.observe(7, 3));
        assert!(!dense.observe(7, 2));
        assert!(dense.observe(7, 5));
        assert_eq!(dense.registers()[7], 5);
        assert_eq!(dense.zero_registers(), REGISTER_COUNT - 1);
    }

    #[test]
    fn test_add_duplicates() {
        let dense = dense_with(5000, 0);
        let estimate = dense.cardinality();
        for i in 0..5000u64 {
            assert!(!dense.add(wyhash(&i.to_le_bytes(), 0)));
        }
        assert_eq!(dense.cardinality(), estimate);
    }

    #[test_case(100)]
    #[test_case(1_000)]
    #[test_case(10_000)]
    #[test_case(50_000)]
    #[test_case(100_000)]
    #[test_case(1_000_000)]
    fn test_relative_error(n: u64) {
        // standard error for 2^14 registers is 0.81%
        let estimate = dense_with(n, 42).cardinality() as f64;
        let error = (estimate - n as f64).abs() / n as f64;
        assert!(error < 0.035, "n = {}, estimate = {}, error = {:.4}", n, estimate, error);
    }

    #[test_case(10_000, 15)]
    #[test_case(41_000, 14; "linear counting crossover")]
    #[test_case(200_000, 15)]
    fn test_relative_error_distribution(n: u64, min_within: usize) {
        let within = (0..20)
            .filter(|&seed| {
                let estimate = dense_with(n, seed).cardinality() as f64;
                (estimate - n as f64).abs() / (n as f64) <= 0.015
            })
            .count();
        assert!(
            within >= min_within,
            "only {} of 20 estimates within 1.5%",
            within
        );
    }

    #[test]
    #[ignore = "adds 40 million hashes, run with --ignored in release mode"]
    fn test_relative_error_ten_million() {
        let n = 10_000_000u64;
        let errors: Vec<f64> = (0..4)
            .map(|seed| {
                let estimate = dense_with(n, seed).cardinality() as f64;
                (estimate - n as f64) / n as f64
            })
            .collect();
        for error in errors.iter() {
            assert!(error.abs() < 0.03, "errors = {:?}", errors);
        }
        let mean_abs = errors.iter().map(|e| e.abs()).sum::<f64>() / errors.len() as f64;
        assert!(mean_abs < 0.015, "errors = {:?}", errors);
    }

    #[test]
    fn test_packed_layout() {
        let dense = DenseSketch::new();
        dense.observe(0, 0b10_1011);
        dense.observe(1, 0b11_0001);
        dense.observe(REGISTER_COUNT as u16 - 1, MAX_RANK);

        let packed = dense.to_packed();
        assert_eq!(packed.len(), PACKED_LEN);
        assert_eq!(packed[0], 0b0110_1011);
        assert_eq!(packed[1], 0b0000_1100);
        assert_eq!(packed[PACKED_LEN - 1], MAX_RANK << 2);

        let restored = DenseSketch::from_packed(&packed).unwrap();
        assert_eq!(restored, dense);
    }

    #[test]
    fn test_packed_restores_estimate() {
        let dense = dense_with(30_000, 7);
        let restored = DenseSketch::from_packed(&dense.to_packed()).unwrap();
        assert_eq!(restored.registers(), dense.registers());
        assert_eq!(restored.cardinality(), dense.cardinality());
    }

    #[test_case(0)]
    #[test_case(PACKED_LEN - 1)]
    #[test_case(PACKED_LEN + 1)]
    #[test_case(REGISTER_COUNT)]
    fn test_from_packed_invalid_length(len: usize) {
        let result = DenseSketch::from_packed(&vec![0u8; len]);
        assert_eq!(
            result.err(),
            Some(SketchError::DenseLength {
                expected: PACKED_LEN,
                actual: len
            })
        );
    }

    #[test]
    fn test_from_packed_rank_out_of_range() {
        let mut packed = vec![0u8; PACKED_LEN];
        set_packed(&mut packed, 3, 63);
        assert_eq!(
            DenseSketch::from_packed(&packed).err(),
            Some(SketchError::RankOutOfRange {
                bucket: 3,
                rank: 63
            })
        );
    }

    #[test]
    fn test_eq_and_clone() {
        let lhs = dense_with(1000, 1);
        let rhs = lhs.clone();
        assert_eq!(lhs, rhs);
        rhs.observe(0, MAX_RANK);
        assert_ne!(lhs, rhs);
    }
}

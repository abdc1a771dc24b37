//! ## Hash splitting
//! Every element is reduced to a 64-bit hash before it reaches any representation.
//! The dense tier consumes the hash as a `(bucket, rank)` pair:
//!
//! - 63..50 bits   - bucket index (top `PRECISION` bits, `0..16384`)
//! - 49..0 bits    - rank source; rank is `1 + leading zeros` of these 50 bits
//!
//! When all 50 rank bits are zero the rank is capped at `MAX_RANK`.

/// Number of hash bits used for the register index
pub const PRECISION: u32 = 14;
/// Number of HyperLogLog registers
pub const REGISTER_COUNT: usize = 1 << PRECISION;
/// Number of bits needed to store one register
pub const REGISTER_WIDTH: usize = 6;
/// Number of hash bits left for rank computation
const RANK_BITS: u32 = u64::BITS - PRECISION;
/// Largest rank `split` can produce
pub const MAX_RANK: u8 = RANK_BITS as u8 + 1;

/// Sentinel bit placed just below the rank bits so `leading_zeros` never exceeds `RANK_BITS`
const RANK_SENTINEL: u64 = 1 << (PRECISION - 1);

/// Split 64-bit `hash` into register index and rank
#[inline]
pub fn split(hash: u64) -> (u16, u8) {
    let bucket = (hash >> RANK_BITS) as u16;
    let rank = ((hash << PRECISION) | RANK_SENTINEL).leading_zeros() as u8 + 1;
    (bucket, rank)
}

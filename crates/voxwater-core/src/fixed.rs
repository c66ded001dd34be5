use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
///
/// Used for world-space positions and the per-cell unit size so that
/// world/grid conversions are bit-for-bit reproducible across hosts.
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of host time fed to the tick driver.
pub type Ticks = u64;

/// Convert an f64 to Fixed64. Use only for initialization, never in the tick loop.
///
/// # Panics
///
/// Panics on NaN or values outside the Q32.32 range.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Like [`f64_to_fixed64`], but `None` for NaN or out-of-range input.
#[inline]
pub fn checked_f64_to_fixed64(v: f64) -> Option<Fixed64> {
    Fixed64::checked_from_num(v)
}

/// Convert Fixed64 to f64. Use only for display and host interop.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

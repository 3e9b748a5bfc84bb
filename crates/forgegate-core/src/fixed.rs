use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
///
/// All world-space distances, timers, and rates in the simulation use this
/// type so that tick results are bit-identical across platforms.
pub type Fixed64 = I32F32;

/// Elapsed simulation time in seconds, fixed-point.
pub type Seconds = Fixed64;

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// Convert an f64 to Fixed64. Use only for initialization, never in sim loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display, never in sim loop.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Checked multiplication for Fixed64 that returns None on overflow.
#[inline]
pub fn checked_mul_64(a: Fixed64, b: Fixed64) -> Option<Fixed64> {
    a.checked_mul(b)
}

/// Checked division for Fixed64 that returns None on zero divisor.
#[inline]
pub fn checked_div_64(a: Fixed64, b: Fixed64) -> Option<Fixed64> {
    a.checked_div(b)
}

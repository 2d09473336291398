//! Echo-pulse revival after strong decoherence.

pub const GAMMA: f64 = 6e6; // s^-1
pub const C_TH: f64 = 1e-20;
pub const T_FINAL: f64 = 20.0; // μs
pub const N: usize = 2000;
pub const REVIVAL: f64 = 0.8; // echo efficiency

/// Decay rate in μs^-1, matching the time axis.
pub fn gamma_per_us(gamma: f64) -> f64 { gamma * 1e-6 }

//! Derivation of the exponential decay rate applied to coherence.
//!
//! Different setups arrive at the per-step decay factor by different routes,
//! so the route is an explicit input rather than a fixed formula.

use std::fmt;
use crate::error::{ DtcError, DtcResult };

/// How the coherence decay rate (in inverse seconds) is obtained.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum DecayRate {
    /// A rate used as-is.
    Direct { gamma: f64 },
    /// Environmental dephasing of a spatial superposition of two packets of
    /// width `width` separated by `separation`:
    /// ```text
    /// Γ = γ_env Δx^2 / (4 σ^2)
    /// ```
    Dephasing { gamma_env: f64, separation: f64, width: f64 },
    /// Environmental decoherence with an additional spontaneous-collapse
    /// contribution (CSL/GRW):
    /// ```text
    /// Γ = γ_env + λ
    /// ```
    Csl { gamma_env: f64, lambda: f64 },
}

fn check_rate(name: &'static str, x: f64) -> DtcResult<()> {
    if !x.is_finite() || x < 0.0 {
        Err(DtcError::invalid(name, format!("expected finite and >= 0, got {}", x)))
    } else {
        Ok(())
    }
}

impl DecayRate {
    /// Check that all contained parameters are physical.
    pub fn validate(&self) -> DtcResult<()> {
        match *self {
            Self::Direct { gamma } => check_rate("gamma", gamma),
            Self::Dephasing { gamma_env, separation, width } => {
                check_rate("gamma_env", gamma_env)?;
                if !separation.is_finite() {
                    return Err(DtcError::invalid(
                        "separation", "expected a finite value"));
                }
                if !width.is_finite() || width <= 0.0 {
                    return Err(DtcError::invalid(
                        "width", format!("expected finite and > 0, got {}", width)));
                }
                Ok(())
            },
            Self::Csl { gamma_env, lambda } => {
                check_rate("gamma_env", gamma_env)?;
                check_rate("lambda", lambda)
            },
        }
    }

    /// Total decay rate.
    pub fn rate(&self) -> f64 {
        match *self {
            Self::Direct { gamma } => gamma,
            Self::Dephasing { gamma_env, separation, width }
                => gamma_env * separation.powi(2) / (4.0 * width.powi(2)),
            Self::Csl { gamma_env, lambda } => gamma_env + lambda,
        }
    }

    /// Multiplicative decay factor `exp(-Γ dt)` for a single time step.
    pub fn decay_factor(&self, dt: f64) -> f64 { (-self.rate() * dt).exp() }

    /// Time for coherence to fall by half; infinite for zero rate.
    pub fn half_life(&self) -> f64 {
        let rate = self.rate();
        if rate > 0.0 { std::f64::consts::LN_2 / rate } else { f64::INFINITY }
    }
}

impl fmt::Display for DecayRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct { .. } => write!(f, "Γ = {:.3e} s^-1", self.rate()),
            Self::Dephasing { gamma_env, .. } => write!(
                f, "Γ = γ_env Δx²/4σ² = {:.3e} s^-1 (γ_env = {:.1e})",
                self.rate(), gamma_env,
            ),
            Self::Csl { gamma_env, lambda } => write!(
                f, "Γ = γ_env + λ = {:.3e} s^-1 (λ = {:.1e})",
                gamma_env + lambda, lambda,
            ),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn dephasing_rate() {
        // 100 nm separation, 5 nm packets: (Δx/2σ)^2 = 100
        let rate = DecayRate::Dephasing {
            gamma_env: 1e4,
            separation: 100e-9,
            width: 5e-9,
        };
        assert!((rate.rate() - 1e6).abs() / 1e6 < 1e-12);
        assert!(rate.validate().is_ok());
    }

    #[test]
    fn csl_adds_to_environment() {
        let rate = DecayRate::Csl { gamma_env: 1e5, lambda: 1e-11 };
        assert_eq!(rate.rate(), 1e5 + 1e-11);
    }

    #[test]
    fn decay_factor_and_half_life() {
        let rate = DecayRate::Direct { gamma: 2.0 };
        let half = rate.half_life();
        assert!((rate.decay_factor(half) - 0.5).abs() < 1e-12);
        assert_eq!(rate.decay_factor(0.0), 1.0);
        assert!(DecayRate::Direct { gamma: 0.0 }.half_life().is_infinite());
    }

    #[test]
    fn rejects_unphysical() {
        assert!(DecayRate::Direct { gamma: -1.0 }.validate().is_err());
        assert!(DecayRate::Direct { gamma: f64::NAN }.validate().is_err());
        let zero_width = DecayRate::Dephasing {
            gamma_env: 1.0,
            separation: 1.0,
            width: 0.0,
        };
        assert!(zero_width.validate().is_err());
    }
}

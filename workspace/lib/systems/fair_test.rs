//! Superconducting-qubit-like coherence decay compared across QM, CSL, and
//! DTC.

use dtc_sim::{ config::Config, error::DtcResult };

pub const GAMMA_ENV: f64 = 1e5; // s^-1; T2 ≈ 10 μs
pub const C_TH: f64 = 1e-20;
pub const T_FINAL: f64 = 600e-6; // s
pub const STEPS: usize = 5000;

pub const LAMBDA_ALLOWED: f64 = 1e-11; // s^-1; 2025 bound
pub const LAMBDA_ORIGINAL: f64 = 1e-17; // s^-1; original GRW/CSL
pub const SENSITIVITY_2026: f64 = 1e-12;

#[derive(Copy, Clone, Debug)]
pub struct Params {
    pub gamma_env: f64,
    pub threshold: f64,
    pub t_final: f64,
    pub steps: usize,
    pub lambda_allowed: f64,
    pub lambda_original: f64,
}

impl Params {
    pub fn from_config(config: &Config) -> DtcResult<Self> {
        Ok(Self {
            gamma_env: config.f64_or("gamma", GAMMA_ENV)?,
            threshold: config.f64_or("threshold", C_TH)?,
            t_final: config.f64_or("t_final", T_FINAL)?,
            steps: config.usize_or("steps", STEPS)?,
            lambda_allowed: config.f64_or("lambda_allowed", LAMBDA_ALLOWED)?,
            lambda_original: config.f64_or("lambda_original", LAMBDA_ORIGINAL)?,
        })
    }
}

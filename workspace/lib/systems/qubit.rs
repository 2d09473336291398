//! Two-level systems described by density matrices.

use dtc_sim::{ config::Config, density::LindbladParams, error::DtcResult };

// σz Hamiltonian with σz dephasing, arbitrary units
pub const OMEGA: f64 = 1.0;
pub const GAMMA: f64 = 0.3;
pub const C_TH: f64 = 0.15;
pub const DT: f64 = 0.005;
pub const STEPS: usize = 3000;
pub const GAMMA_COLLAPSE: f64 = 100.0; // pruning rate below threshold

pub fn lindblad(config: &Config) -> DtcResult<(LindbladParams, f64)> {
    let params = LindbladParams::sigma_z_dephasing(
        config.f64_or("omega", OMEGA)?,
        config.f64_or("gamma", GAMMA)?,
        config.f64_or("dt", DT)?,
        config.usize_or("steps", STEPS)?,
    );
    Ok((params, config.f64_or("threshold", C_TH)?))
}

pub fn prune_rate(config: &Config) -> DtcResult<f64> {
    config.f64_or("gamma_collapse", GAMMA_COLLAPSE)
}

// transmon/oscillator dephasing with CSL phase noise
pub const JITTER_GAMMA_ENV: f64 = 1e5; // s^-1
pub const JITTER_C_TH: f64 = 1e-20;
pub const JITTER_T_CHECK: f64 = 100e-6; // s
pub const JITTER_T_FINAL: f64 = 5e-4; // s
pub const JITTER_STEPS: usize = 15000;
pub const JITTER_NOISE: f64 = 1e-8;
pub const JITTER_LAMBDA: f64 = 1e-11; // s^-1; 2025 CSL bound

#[derive(Copy, Clone, Debug)]
pub struct JitterParams {
    pub gamma_env: f64,
    pub threshold: f64,
    pub t_check: f64,
    pub t_final: f64,
    pub steps: usize,
    pub noise: f64,
    pub lambda: f64,
}

impl JitterParams {
    pub fn from_config(config: &Config) -> DtcResult<Self> {
        Ok(Self {
            gamma_env: config.f64_or("gamma", JITTER_GAMMA_ENV)?,
            threshold: config.f64_or("threshold", JITTER_C_TH)?,
            t_check: config.f64_or("t_check", JITTER_T_CHECK)?,
            t_final: config.f64_or("t_final", JITTER_T_FINAL)?,
            steps: config.usize_or("steps", JITTER_STEPS)?,
            noise: config.f64_or("noise", JITTER_NOISE)?,
            lambda: config.f64_or("lambda", JITTER_LAMBDA)?,
        })
    }

    pub fn dt(&self) -> f64 { self.t_final / self.steps as f64 }
}

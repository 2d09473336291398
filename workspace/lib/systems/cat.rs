//! Mesoscopic "cat" superposition of two localized packets.

use ndarray as nd;
use dtc_sim::{
    config::Config,
    error::DtcResult,
    wavepacket::{ CatExperiment, CatState, Grid },
};

pub const DELTA_X: f64 = 100e-9; // m
pub const SIGMA_X: f64 = 5e-9; // m
pub const GAMMA_ENV: f64 = 1e4; // s^-1
pub const C_TH: f64 = 1e-20;
pub const FLOOR: f64 = 1e-40;

// Γ = γ_env (Δx / 2σ)^2 = 1e6 s^-1; starting from the cat's own coherence
// (≈ 124 on the default grid) the collapse lands near 51 μs
pub const T_FINAL: f64 = 200e-6; // s
pub const STEPS: usize = 12000;

pub const X_MAX: f64 = 400e-9; // m
pub const NX: usize = 2000;

/// Build the experiment and its time axis.
pub fn experiment(config: &Config)
    -> DtcResult<(CatExperiment, nd::Array1<f64>)>
{
    let x_max = config.f64_or("x_max", X_MAX)?;
    let grid = Grid::linspace(-x_max, x_max, config.usize_or("nx", NX)?)?;
    let state = CatState::new(
        grid,
        config.f64_or("separation", DELTA_X)?,
        config.f64_or("width", SIGMA_X)?,
    );
    let rate = state.dephasing_rate(config.f64_or("gamma", GAMMA_ENV)?);
    rate.validate()?;
    let experiment = CatExperiment {
        state,
        rate,
        threshold: config.f64_or("threshold", C_TH)?,
        floor: config.f64_or("floor", FLOOR)?,
    };
    let time: nd::Array1<f64> = nd::Array1::linspace(
        0.0,
        config.f64_or("t_final", T_FINAL)?,
        config.usize_or("steps", STEPS)?,
    );
    Ok((experiment, time))
}

//! Two-path ("double slit") particle.

use dtc_sim::{
    config::Config,
    error::DtcResult,
    mcwf::McwfParams,
    wavepacket::{ Grid, SlitGeometry },
};

// single-trial reference paths; lengths in arbitrary units, time in steps
pub const NX: usize = 1024;
pub const L: f64 = 20.0;
pub const GAMMA_STEP: f64 = 0.15;
pub const C_TH_STEP: f64 = 1e-4;
pub const STEPS: usize = 100;

pub fn grid(config: &Config) -> DtcResult<Grid> {
    let half = config.f64_or("length", L)? / 2.0;
    Grid::linspace(-half, half, config.usize_or("nx", NX)?)
}

pub fn geometry(config: &Config) -> DtcResult<SlitGeometry> {
    let default = SlitGeometry::default();
    Ok(SlitGeometry {
        slit_distance: config.f64_or("slit_distance", default.slit_distance)?,
        slit_width: config.f64_or("slit_width", default.slit_width)?,
        kick: config.f64_or("kick", default.kick)?,
        speed: config.f64_or("speed", default.speed)?,
    })
}

// stochastic unraveling
pub const GAMMA: f64 = 1e8; // s^-1
pub const C_TH: f64 = 0.5; // Joos-Zeh criterion
pub const GAMMA0: f64 = 1e12; // s^-1
pub const KAPPA: f64 = 1000.0;
pub const MCWF_STEPS: usize = 5000;
pub const NUM_TRAJ: usize = 500;
pub const X0: f64 = 2.0;
pub const V: f64 = 1e9; // arbitrary plot scale

pub fn mcwf(config: &Config) -> DtcResult<McwfParams> {
    let gamma = config.f64_or("gamma", GAMMA)?;
    let params = McwfParams {
        gamma,
        threshold: config.f64_or("threshold", C_TH)?,
        gamma0: config.f64_or("gamma0", GAMMA0)?,
        kappa: config.f64_or("kappa", KAPPA)?,
        t_max: config.f64_or("t_max", 5.0 / gamma)?,
        steps: config.usize_or("steps", MCWF_STEPS)?,
        x0: config.f64_or("x0", X0)?,
        speed: config.f64_or("speed", V)?,
    };
    params.validate()?;
    Ok(params)
}

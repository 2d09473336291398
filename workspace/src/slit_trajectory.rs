#![allow(dead_code, non_snake_case, non_upper_case_globals)]

use std::path::PathBuf;
use ndarray as nd;
use dtc_sim::{
    mkdir,
    write_npz,
    config::Config,
    report::{ Summary, report_output },
    wavepacket::SlitRun,
};
use lib::systems::slit::*;

fn main() -> anyhow::Result<()> {
    lib::init_logging();
    let config = Config::from_args()?;
    let grid = grid(&config)?;
    let geometry = geometry(&config)?;
    let steps = config.usize_or("steps", STEPS)?;
    let gamma = config.f64_or("gamma", GAMMA_STEP)?;
    let threshold = config.f64_or("threshold", C_TH_STEP)?;
    let mut rng = config.rng()?;
    let outdir = PathBuf::from("output");

    println!("building reference paths on {} grid points", grid.len());
    let (path_l, path_r) = geometry.path_trajectories(&grid, steps);
    let run = SlitRun::single(1.0, gamma, threshold, (&path_l, &path_r), &mut rng);

    let summary = Summary::new("Single-particle path selection", threshold)
        .with_time_unit(1.0, "steps")
        .with_trigger(run.snap.map(|k| k as f64), run.outcome);
    println!("{}", summary);

    let step: nd::Array1<f64> = (0..steps).map(|t| t as f64).collect();
    let outfile = outdir.join("slit_trajectory.npz");
    let res = mkdir!(outdir).and_then(|_| write_npz!(
        &outfile,
        arrays: {
            "step" => &step,
            "path_l" => &path_l,
            "path_r" => &path_r,
            "position" => &run.position,
        }
    ));
    report_output(res, &outfile);
    Ok(())
}

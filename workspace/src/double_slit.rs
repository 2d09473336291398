#![allow(dead_code, non_snake_case, non_upper_case_globals)]

use std::path::PathBuf;
use ndarray as nd;
use rand::Rng;
use dtc_sim::{
    mkdir,
    write_npz,
    config::Config,
    mcwf::Ensemble,
    report::report_output,
};
use lib::systems::slit;

fn main() -> anyhow::Result<()> {
    lib::init_logging();
    let config = Config::from_args()?;
    let params = slit::mcwf(&config)?;
    let num_traj = config.usize_or("trajectories", slit::NUM_TRAJ)?;
    let seed = match config.seed()? {
        Some(seed) => seed,
        None => rand::thread_rng().gen(),
    };
    let outdir = PathBuf::from("output");

    println!(
        "running {} DTC trajectories (Γ = {:.1e} s^-1, C_th = {})",
        num_traj, params.gamma, params.threshold,
    );
    let ensemble = Ensemble::run(&params, num_traj, seed)?;
    let time = params.time();
    let (n_l, n_r) = ensemble.balance();
    let mean_snap = ensemble.mean_snap();
    let dt = params.dt();

    println!("collapse rate: {:.1}%", 100.0 * ensemble.collapse_fraction());
    println!(
        "mean snap: step {:.0} (t = {:.3e} s)",
        mean_snap, mean_snap * dt,
    );
    println!("outcomes: L = {}, R = {}", n_l, n_r);

    let mean = ensemble.mean_position();
    let rep = ensemble.representative()
        .map(|t| t.position.clone())
        .unwrap_or_else(|| nd::Array1::zeros(params.steps));
    let path_l: nd::Array1<f64> = time.mapv(|t| params.paths(t).0);
    let path_r: nd::Array1<f64> = time.mapv(|t| params.paths(t).1);

    let outfile = outdir.join("double_slit.npz");
    let res = mkdir!(outdir).and_then(|_| write_npz!(
        &outfile,
        arrays: {
            "time" => &time,
            "mean_position" => &mean,
            "representative" => &rep,
            "path_l" => &path_l,
            "path_r" => &path_r,
            "balance" => &nd::array![n_l as f64, n_r as f64],
        }
    ));
    report_output(res, &outfile);
    Ok(())
}

#![allow(dead_code, non_snake_case, non_upper_case_globals)]

use std::path::PathBuf;
use ndarray as nd;
use dtc_sim::{
    mkdir,
    write_npz,
    config::Config,
    models::ParameterSpace,
    report::report_output,
};

fn main() -> anyhow::Result<()> {
    lib::init_logging();
    let config = Config::from_args()?;
    let n = config.usize_or("n", 500)?;
    let outdir = PathBuf::from("output");

    let mut space = ParameterSpace::standard(n);
    space.max_threshold = config.f64_or("max_threshold", space.max_threshold)?;
    let mask = space.mask();
    let allowed = mask.iter().filter(|m| **m == 1).count();
    println!(
        "allowed region: C_th ≤ {:.0e} ({} of {} grid points)",
        space.max_threshold, allowed, mask.len(),
    );
    println!(
        "chosen point (Γ0 = {:.0e} s^-1, C_th = {:.0e}): {}",
        ParameterSpace::CHOSEN_GAMMA0,
        ParameterSpace::CHOSEN_THRESHOLD,
        if space.chosen_allowed() { "allowed" } else { "EXCLUDED" },
    );

    let outfile = outdir.join("parameter_space.npz");
    let res = mkdir!(outdir).and_then(|_| write_npz!(
        &outfile,
        arrays: {
            "gamma0" => &space.gamma0,
            "threshold" => &space.threshold,
            "mask" => &mask,
            "chosen" => &nd::array![
                ParameterSpace::CHOSEN_GAMMA0,
                ParameterSpace::CHOSEN_THRESHOLD,
            ],
        }
    ));
    report_output(res, &outfile);
    Ok(())
}

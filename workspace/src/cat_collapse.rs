#![allow(dead_code, non_snake_case, non_upper_case_globals)]

use std::path::PathBuf;
use dtc_sim::{
    mkdir,
    write_npz,
    config::Config,
    report::{ Summary, report_output },
    wavepacket::probability_density,
};
use lib::systems::cat;

fn main() -> anyhow::Result<()> {
    lib::init_logging();
    let config = Config::from_args()?;
    let (experiment, time) = cat::experiment(&config)?;
    let mut rng = config.rng()?;
    let outdir = PathBuf::from("output");

    log::info!("running cat-state collapse over {} steps", time.len());
    log::info!("initial cat coherence: {:.3e}", experiment.state.coherence());
    let out = experiment.run(&time, &mut rng)?;

    let summary = Summary::new("Cat-state collapse", experiment.threshold)
        .with_rate(experiment.rate)
        .with_trajectory(&out.trajectory);
    println!("{}", summary);

    let outfile = outdir.join("cat_collapse.npz");
    let res = mkdir!(outdir).and_then(|_| write_npz!(
        &outfile,
        arrays: {
            "x" => experiment.state.grid.x(),
            "initial_density" => &probability_density(&experiment.state.cat),
            "final_density" => &probability_density(&out.final_state),
            "time" => &time,
            "dtc" => &out.trajectory.coherence,
            "decoherence" => &out.baseline,
        }
    ));
    report_output(res, &outfile);
    Ok(())
}

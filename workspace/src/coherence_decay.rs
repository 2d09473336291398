#![allow(dead_code, non_snake_case, non_upper_case_globals)]

use std::path::PathBuf;
use ndarray as nd;
use dtc_sim::{
    mkdir,
    write_npz,
    collapse::{ self, CollapseParams },
    config::Config,
    decay::DecayRate,
    models::{ ModelCurves, LOG_FLOOR },
    report::{ Summary, report_output },
};
use lib::systems::fair_test::*;

fn main() -> anyhow::Result<()> {
    lib::init_logging();
    let config = Config::from_args()?;
    let params = Params::from_config(&config)?;
    let outdir = PathBuf::from("output");

    let time: nd::Array1<f64>
        = nd::Array1::linspace(0.0, params.t_final, params.steps);
    let curves = ModelCurves::compute(
        params.gamma_env,
        params.threshold,
        &time,
        [
            ("csl_allowed", params.lambda_allowed),
            ("csl_original", params.lambda_original),
        ],
    );

    // the same curve from the step-wise process, as a cross-check
    let rate = DecayRate::Direct { gamma: params.gamma_env };
    let dt = if time.len() > 1 { time[1] - time[0] } else { 0.0 };
    let process
        = CollapseParams::from_rate(1.0, &rate, dt, params.threshold)?
        .with_floor(LOG_FLOOR);
    let mut rng = config.rng()?;
    let traj = collapse::run(&process, &time, &mut rng);
    if let (Some(a), Some(b)) = (curves.snap, traj.trigger.map(|t| t.step)) {
        if a.abs_diff(b) > 1 {
            log::warn!("closed-form snap at step {} but process triggered at {}", a, b);
        }
    }
    if let Some(t) = collapse::predicted_trigger_time(&rate, 1.0, params.threshold) {
        println!("predicted snap: {:.1} µs", t * 1e6);
    }

    let summary = Summary::new("DTC vs CSL coherence decay", params.threshold)
        .with_rate(rate)
        .with_trajectory(&traj);
    println!("{}", summary);
    for (label, curve) in curves.csl.iter() {
        let below = curve.iter().filter(|c| **c < SENSITIVITY_2026).count();
        println!(
            "{}: {} of {} samples below the projected 2026 sensitivity",
            label, below, curve.len(),
        );
    }

    let outfile = outdir.join("coherence_decay.npz");
    let res = mkdir!(outdir).and_then(|_| write_npz!(
        &outfile,
        arrays: {
            "time" => &time,
            "qm" => &curves.qm,
            "csl_allowed" => &curves.csl["csl_allowed"],
            "csl_original" => &curves.csl["csl_original"],
            "dtc" => &curves.dtc,
            "process" => &traj.coherence,
            "threshold" => &nd::array![params.threshold, SENSITIVITY_2026],
        }
    ));
    report_output(res, &outfile);
    Ok(())
}

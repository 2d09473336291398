#![allow(dead_code, non_snake_case, non_upper_case_globals)]

use std::path::PathBuf;
use ndarray as nd;
use dtc_sim::{
    mkdir,
    write_npz,
    config::Config,
    models::Lazarus,
    report::{ Summary, report_output },
};
use lib::systems::lazarus::*;

fn main() -> anyhow::Result<()> {
    lib::init_logging();
    let config = Config::from_args()?;
    let gamma = config.f64_or("gamma", GAMMA)?;
    let threshold = config.f64_or("threshold", C_TH)?;
    let t_final = config.f64_or("t_final", T_FINAL)?;
    let n = config.usize_or("n", N)?;
    let revival = config.f64_or("revival", REVIVAL)?;
    let outdir = PathBuf::from("output");

    println!("running Lazarus (echo) test");
    let time: nd::Array1<f64> = nd::Array1::linspace(0.0, t_final, n);
    let test = Lazarus::compute(gamma_per_us(gamma), threshold, &time, revival);

    let summary = Summary::new("Lazarus test: echo after decoherence", threshold)
        .with_time_unit(1.0, "µs")
        .with_trigger(test.snap.map(|k| time[k]), None);
    println!("{}", summary);
    if let Some(t_echo) = time.get(test.echo) {
        println!("echo pulse at t = {:.1} µs", t_echo);
    }
    if let (Some(q), Some(d)) = (test.qm.iter().next_back(), test.dtc.iter().next_back()) {
        println!("final coherence: QM {:.3e}, DTC {:.3e}", q, d);
    }

    let outfile = outdir.join("lazarus.npz");
    let res = mkdir!(outdir).and_then(|_| write_npz!(
        &outfile,
        arrays: {
            "time" => &time,
            "qm" => &test.qm,
            "dtc" => &test.dtc,
            "echo" => &nd::array![time.get(test.echo).copied().unwrap_or(0.0)],
        }
    ));
    report_output(res, &outfile);
    Ok(())
}

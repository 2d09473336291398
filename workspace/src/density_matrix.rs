#![allow(dead_code, non_snake_case, non_upper_case_globals)]

use std::path::PathBuf;
use ndarray as nd;
use dtc_sim::{
    mkdir,
    write_npz,
    config::Config,
    density::{ DensityMatrix, SnapMode, run_lindblad },
    report::{ Summary, report_output },
};
use lib::systems::qubit;

fn main() -> anyhow::Result<()> {
    lib::init_logging();
    let config = Config::from_args()?;
    let (params, threshold) = qubit::lindblad(&config)?;
    let rate = qubit::prune_rate(&config)?;
    let mut rng = config.rng()?;
    let outdir = PathBuf::from("output");

    let time: nd::Array1<f64>
        = nd::Array1::linspace(0.0, params.steps as f64 * params.dt, params.steps);

    // the DTC run stops at the snap; the QM run always covers the full time
    let dtc = run_lindblad(
        DensityMatrix::plus(), &params, Some(threshold), SnapMode::Stop, &mut rng);
    let qm = run_lindblad(
        DensityMatrix::plus(), &params, None, SnapMode::Stop, &mut rng);
    // continuous version: branch pruning switched on below threshold
    let pruned = run_lindblad(
        DensityMatrix::plus(), &params, Some(threshold), SnapMode::Prune { rate },
        &mut rng);

    let (snap_time, branch) = match dtc.trigger {
        Some((k, branch)) => (Some(time[k]), Some(branch)),
        None => (None, None),
    };
    let summary = Summary::new("Density matrix: DTC vs standard decoherence", threshold)
        .with_time_unit(1.0, "(arb. units)")
        .with_trigger(snap_time, branch);
    println!("{}", summary);
    println!(
        "QM coherence at end of run: {:.3e}",
        qm.coherence.iter().next_back().copied().unwrap_or(f64::NAN),
    );
    match pruned.onset {
        Some(k) => println!(
            "pruning (γ_c = {}) switched on at t = {:.2}; coherence one step later: {:.3e}",
            rate,
            time[k],
            pruned.coherence.get(k + 1).copied().unwrap_or(f64::NAN),
        ),
        None => println!("pruning never switched on"),
    }

    let outfile = outdir.join("density_matrix.npz");
    let res = mkdir!(outdir).and_then(|_| write_npz!(
        &outfile,
        arrays: {
            "time" => &time,
            "dtc" => &dtc.coherence,
            "qm" => &qm.coherence,
            "pruned" => &pruned.coherence,
            "qm_rho" => qm.final_state.array(),
        }
    ));
    report_output(res, &outfile);
    Ok(())
}

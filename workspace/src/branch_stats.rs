#![allow(dead_code, non_snake_case, non_upper_case_globals)]

use std::{
    path::PathBuf,
    sync::atomic::{ AtomicUsize, Ordering },
};
use ndarray as nd;
use rand::{ rngs::StdRng, Rng, SeedableRng };
use rayon::prelude::*;
use dtc_sim::{
    mkdir,
    print_flush,
    write_npz,
    collapse::{ Branch, CollapseParams, CollapseProcess },
    config::Config,
    decay::DecayRate,
    report::report_output,
};
use lib::systems::fair_test::*;

const TRIALS: usize = 10000;

/// Run one process to completion, returning its trigger step and branch.
fn trial(params: &CollapseParams, steps: usize, seed: u64)
    -> Option<(usize, Branch)>
{
    let mut rng = StdRng::seed_from_u64(seed);
    let mut process = CollapseProcess::new(*params);
    for _ in 1..steps {
        process.step(&mut rng);
        if process.is_collapsed() {
            break;
        }
    }
    process.collapse()
}

fn main() -> anyhow::Result<()> {
    lib::init_logging();
    let config = Config::from_args()?;
    let params = Params::from_config(&config)?;
    let trials = config.usize_or("trials", TRIALS)?;
    let seed = match config.seed()? {
        Some(seed) => seed,
        None => rand::thread_rng().gen(),
    };
    let outdir = PathBuf::from("output");

    let dt = params.t_final / (params.steps.max(2) - 1) as f64;
    let rate = DecayRate::Direct { gamma: params.gamma_env };
    let process = CollapseParams::from_rate(1.0, &rate, dt, params.threshold)?;

    let progress = AtomicUsize::new(0);
    print_flush!("  {} / {} ", 0, trials);
    let outcomes: Vec<Option<(usize, Branch)>>
        = (0..trials).into_par_iter()
        .map(|k| {
            let out = trial(&process, params.steps, seed.wrapping_add(k as u64));
            let n = progress.fetch_add(1, Ordering::SeqCst) + 1;
            if n % 500 == 0 || n == trials {
                print_flush!("\r  {} / {} ", n, trials);
            }
            out
        })
        .collect();
    println!();

    let collapsed: Vec<(usize, Branch)> = outcomes.iter().flatten().copied().collect();
    let n_l = collapsed.iter().filter(|(_, b)| *b == Branch::L).count();
    let n_r = collapsed.len() - n_l;
    let steps: nd::Array1<f64>
        = collapsed.iter().map(|(k, _)| *k as f64).collect();
    let branches: nd::Array1<u8>
        = collapsed.iter().map(|(_, b)| b.index() as u8).collect();

    println!("{} of {} trials collapsed", collapsed.len(), trials);
    if !collapsed.is_empty() {
        let n = collapsed.len() as f64;
        let frac_l = n_l as f64 / n;
        // binomial standard error around a fair coin
        let sigma = (0.25 / n).sqrt();
        println!(
            "L fraction: {:.4} ({:+.1}σ from 1/2), R: {}",
            frac_l, (frac_l - 0.5) / sigma, n_r,
        );
        let (min, max)
            = steps.iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), k| (lo.min(*k), hi.max(*k)));
        println!(
            "trigger time: {:.2} µs (min {:.2}, max {:.2})",
            steps.mean().unwrap_or(0.0) * dt * 1e6, min * dt * 1e6, max * dt * 1e6,
        );
        if min != max {
            log::warn!("trigger step varies across trials; it should be deterministic");
        }
    }

    let outfile = outdir.join("branch_stats.npz");
    let res = mkdir!(outdir).and_then(|_| write_npz!(
        &outfile,
        arrays: {
            "trigger_step" => &steps,
            "branch" => &branches,
            "dt" => &nd::array![dt],
        }
    ));
    report_output(res, &outfile);
    Ok(())
}

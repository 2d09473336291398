#![allow(dead_code, non_snake_case, non_upper_case_globals)]

use std::path::PathBuf;
use ndarray as nd;
use dtc_sim::{
    mkdir,
    write_npz,
    config::Config,
    models::BoundComparison,
    report::report_output,
};

fn main() -> anyhow::Result<()> {
    lib::init_logging();
    let config = Config::from_args()?;
    let outdir = PathBuf::from("output");

    let mut cmp = BoundComparison::lisa();
    cmp.upper_limit = config.f64_or("upper_limit", cmp.upper_limit)?;
    println!("LISA Pathfinder rotational noise limit: {:.1e} N² m² / Hz", cmp.upper_limit);
    for (model, prediction, verdict) in cmp.verdicts() {
        println!("  {:<24} {:>9.1e}  {}", model, prediction, verdict);
    }

    let outfile = outdir.join("lisa_bounds.npz");
    let res = mkdir!(outdir).and_then(|_| write_npz!(
        &outfile,
        arrays: {
            "predictions" => &cmp.log_values(),
            "upper_limit" => &nd::array![cmp.upper_limit],
        }
    ));
    report_output(res, &outfile);
    Ok(())
}

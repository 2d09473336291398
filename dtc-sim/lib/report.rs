//! Console diagnostics for finished runs.

use std::{ fmt, path::Path };
use crate::{
    collapse::{ Branch, Trajectory },
    decay::DecayRate,
    error::DtcResult,
};

/// Key results of a single collapse run.
#[derive(Clone, Debug)]
pub struct Summary {
    pub title: String,
    pub threshold: f64,
    pub rate: Option<DecayRate>,
    /// Trigger time, printed through `time_unit`.
    pub trigger_time: Option<f64>,
    pub branch: Option<Branch>,
    /// Factor and label used to print times.
    pub time_unit: (f64, &'static str),
}

impl Summary {
    pub fn new(title: &str, threshold: f64) -> Self {
        Self {
            title: title.to_string(),
            threshold,
            rate: None,
            trigger_time: None,
            branch: None,
            time_unit: (1e6, "µs"),
        }
    }

    /// Print times as `t * scale` followed by `label`.
    pub fn with_time_unit(mut self, scale: f64, label: &'static str) -> Self {
        self.time_unit = (scale, label);
        self
    }

    pub fn with_rate(mut self, rate: DecayRate) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn with_trajectory(mut self, traj: &Trajectory) -> Self {
        self.trigger_time = traj.trigger_time();
        self.branch = traj.branch();
        self
    }

    pub fn with_trigger(mut self, time: Option<f64>, branch: Option<Branch>)
        -> Self
    {
        self.trigger_time = time;
        self.branch = branch;
        self
    }
}

const RULE: &str = "==============================================";

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", RULE)?;
        writeln!(f, "{}", self.title)?;
        writeln!(f, "coherence threshold (C_th): {:.1e}", self.threshold)?;
        if let Some(rate) = &self.rate {
            writeln!(f, "decoherence rate: {}", rate)?;
        }
        match self.trigger_time {
            Some(t) => {
                let (scale, label) = self.time_unit;
                write!(f, "collapse triggered at t = {:.1} {}", t * scale, label)?;
                match self.branch {
                    Some(branch) => writeln!(f, " (branch {})", branch)?,
                    None => writeln!(f)?,
                }
            },
            None => writeln!(f, "no collapse within the simulated time")?,
        }
        write!(f, "{}", RULE)
    }
}

/// Report the result of writing an output file.
///
/// Failures are logged and printed, never propagated: the numerical results
/// have already been reported by the time output is written. Returns whether
/// the write succeeded.
pub fn report_output<P>(result: DtcResult<()>, path: P) -> bool
where P: AsRef<Path>
{
    let path = path.as_ref();
    match result {
        Ok(()) => {
            println!("saved {}", path.display());
            true
        },
        Err(err) => {
            log::error!("failed to write {}: {}", path.display(), err);
            println!(
                "output could not be written ({}); numerical results above are \
                unaffected",
                err,
            );
            false
        },
    }
}

//! The threshold-triggered collapse process.
//!
//! Coherence decays by a constant factor per time step. The first time the
//! decayed value falls strictly below a threshold, a single fair random bit
//! picks one of two branches and the state is replaced by that branch. From
//! then on the output coherence is pinned to a fixed floor value; the
//! transition never reverts.
//!
//! Where unspecified, step `0` is the initial state and every later step is
//! one application of the decay factor.

use std::fmt;
use ndarray as nd;
use rand::Rng;
use crate::{
    decay::DecayRate,
    error::{ DtcError, DtcResult },
};

/// One of the two mutually exclusive definite outcomes.
///
/// `L` and `R` double as the projectors P0 and P1 in two-level setups.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Branch {
    L,
    R,
}

impl Branch {
    /// Map a random bit to a branch.
    pub fn from_bit(bit: bool) -> Self { if bit { Self::L } else { Self::R } }

    /// Draw a branch with equal probability.
    pub fn sample<R>(rng: &mut R) -> Self
    where R: Rng + ?Sized
    {
        Self::from_bit(rng.gen::<bool>())
    }

    /// The branch that is discarded when `self` is chosen.
    pub fn other(self) -> Self {
        match self {
            Self::L => Self::R,
            Self::R => Self::L,
        }
    }

    /// Index of the basis state selected by this branch.
    pub fn index(self) -> usize {
        match self {
            Self::L => 0,
            Self::R => 1,
        }
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::L => write!(f, "L"),
            Self::R => write!(f, "R"),
        }
    }
}

/// State of the process.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Phase {
    /// Superposition with the given coherence.
    Coherent { coherence: f64 },
    /// Reduced onto `branch` at time step `step`.
    Collapsed { branch: Branch, step: usize },
}

impl Phase {
    pub fn is_collapsed(&self) -> bool { matches!(self, Self::Collapsed { .. }) }

    /// Coherence reported for this phase; collapsed states report `floor`.
    pub fn output(&self, floor: f64) -> f64 {
        match *self {
            Self::Coherent { coherence } => coherence,
            Self::Collapsed { .. } => floor,
        }
    }
}

/// Parameters of a single collapse run.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CollapseParams {
    /// Coherence at step 0.
    pub initial: f64,
    /// Multiplicative decay applied at every step, in `[0, 1]`.
    pub decay_factor: f64,
    /// Collapse happens when coherence falls strictly below this value.
    pub threshold: f64,
    /// Coherence reported after collapse.
    pub floor: f64,
}

impl CollapseParams {
    /// Create a new set of parameters with a zero post-collapse floor.
    pub fn new(initial: f64, decay_factor: f64, threshold: f64)
        -> DtcResult<Self>
    {
        if !initial.is_finite() || initial < 0.0 {
            return Err(DtcError::invalid(
                "initial", format!("expected finite and >= 0, got {}", initial)));
        }
        if !(0.0..=1.0).contains(&decay_factor) {
            return Err(DtcError::invalid(
                "decay_factor", format!("expected in [0, 1], got {}", decay_factor)));
        }
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(DtcError::invalid(
                "threshold", format!("expected finite and >= 0, got {}", threshold)));
        }
        Ok(Self { initial, decay_factor, threshold, floor: 0.0 })
    }

    /// Create a new set of parameters from a decay rate and a time step.
    pub fn from_rate(initial: f64, rate: &DecayRate, dt: f64, threshold: f64)
        -> DtcResult<Self>
    {
        rate.validate()?;
        if !dt.is_finite() || dt < 0.0 {
            return Err(DtcError::invalid(
                "dt", format!("expected finite and >= 0, got {}", dt)));
        }
        Self::new(initial, rate.decay_factor(dt), threshold)
    }

    /// Set the coherence reported after collapse (e.g. `1e-40` to keep
    /// log-scale output finite).
    pub fn with_floor(mut self, floor: f64) -> Self {
        self.floor = floor;
        self
    }
}

/// Advance the process by one step.
///
/// Returns the new phase, and the chosen branch if collapse happened on this
/// step. A collapsed phase is returned unchanged and never draws randomness.
pub fn advance<R>(
    phase: Phase,
    step: usize,
    params: &CollapseParams,
    rng: &mut R,
) -> (Phase, Option<Branch>)
where R: Rng + ?Sized
{
    match phase {
        Phase::Collapsed { .. } => (phase, None),
        Phase::Coherent { coherence } => {
            let coherence = coherence * params.decay_factor;
            if coherence < params.threshold {
                let branch = Branch::sample(rng);
                (Phase::Collapsed { branch, step }, Some(branch))
            } else {
                (Phase::Coherent { coherence }, None)
            }
        },
    }
}

/// Record of the single collapse event in a run.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Trigger {
    /// Index of the time step on which collapse happened.
    pub step: usize,
    /// Time of that step.
    pub time: f64,
    /// Chosen branch.
    pub branch: Branch,
}

/// Stateful driver around [`advance`].
#[derive(Clone, Debug)]
pub struct CollapseProcess {
    params: CollapseParams,
    phase: Phase,
    step: usize,
}

impl CollapseProcess {
    pub fn new(params: CollapseParams) -> Self {
        Self {
            params,
            phase: Phase::Coherent { coherence: params.initial },
            step: 0,
        }
    }

    pub fn params(&self) -> &CollapseParams { &self.params }

    pub fn phase(&self) -> Phase { self.phase }

    /// Number of steps taken so far.
    pub fn steps_taken(&self) -> usize { self.step }

    pub fn is_collapsed(&self) -> bool { self.phase.is_collapsed() }

    /// Step index and branch of the collapse, if it has happened.
    pub fn collapse(&self) -> Option<(usize, Branch)> {
        match self.phase {
            Phase::Collapsed { branch, step } => Some((step, branch)),
            Phase::Coherent { .. } => None,
        }
    }

    /// Current output coherence.
    pub fn coherence(&self) -> f64 { self.phase.output(self.params.floor) }

    /// Take one step and return the output coherence.
    pub fn step<R>(&mut self, rng: &mut R) -> f64
    where R: Rng + ?Sized
    {
        self.step += 1;
        let (phase, fired) = advance(self.phase, self.step, &self.params, rng);
        if let Some(branch) = fired {
            log::debug!("collapse onto {} at step {}", branch, self.step);
        }
        self.phase = phase;
        self.coherence()
    }
}

/// Output of a full run.
#[derive(Clone, Debug)]
pub struct Trajectory {
    pub time: nd::Array1<f64>,
    pub coherence: nd::Array1<f64>,
    pub trigger: Option<Trigger>,
}

impl Trajectory {
    pub fn collapsed(&self) -> bool { self.trigger.is_some() }

    pub fn branch(&self) -> Option<Branch> { self.trigger.map(|t| t.branch) }

    pub fn trigger_time(&self) -> Option<f64> { self.trigger.map(|t| t.time) }
}

/// Run the process over every point of `time`.
///
/// The first coherence value is `params.initial` at `time[0]`; each following
/// point is one step of the process.
pub fn run<R>(params: &CollapseParams, time: &nd::Array1<f64>, rng: &mut R)
    -> Trajectory
where R: Rng + ?Sized
{
    let n = time.len();
    let mut coherence: nd::Array1<f64> = nd::Array1::zeros(n);
    let mut process = CollapseProcess::new(*params);
    if let Some(c0) = coherence.get_mut(0) {
        *c0 = params.initial;
    }
    for k in 1..n {
        coherence[k] = process.step(rng);
    }
    let trigger
        = process.collapse()
        .map(|(step, branch)| Trigger { step, time: time[step], branch });
    match &trigger {
        Some(t) => log::info!(
            "collapse onto {} at t = {:.3e} (step {})", t.branch, t.time, t.step),
        None => log::info!(
            "no collapse within {} steps (final coherence {:.3e})",
            n.saturating_sub(1),
            process.coherence(),
        ),
    }
    Trajectory { time: time.clone(), coherence, trigger }
}

/// The reference trajectory: identical decay with no threshold rule.
pub fn pure_decoherence(initial: f64, decay_factor: f64, n: usize)
    -> nd::Array1<f64>
{
    std::iter::successors(Some(initial), |c| Some(c * decay_factor))
        .take(n)
        .collect()
}

/// Closed-form index of the first step whose decayed coherence is strictly
/// below `threshold`, or `None` if it never is.
///
/// Collapse is only checked after a decay step, so the result is at least 1.
pub fn predicted_trigger_step(initial: f64, decay_factor: f64, threshold: f64)
    -> Option<usize>
{
    if initial < threshold {
        return Some(1);
    }
    if decay_factor >= 1.0 {
        return None;
    }
    if decay_factor <= 0.0 {
        return (threshold > 0.0).then_some(1);
    }
    if threshold <= 0.0 {
        return None;
    }
    let k = (threshold / initial).ln() / decay_factor.ln();
    Some((k.floor() as usize + 1).max(1))
}

/// Closed-form trigger time `ln(C0 / C_th) / Γ` for continuous decay, or
/// `None` if the threshold is never reached.
pub fn predicted_trigger_time(rate: &DecayRate, initial: f64, threshold: f64)
    -> Option<f64>
{
    if initial < threshold {
        return Some(0.0);
    }
    let gamma = rate.rate();
    (gamma > 0.0 && threshold > 0.0)
        .then(|| (initial / threshold).ln() / gamma)
}

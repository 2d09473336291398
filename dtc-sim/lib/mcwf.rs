//! Monte Carlo wave function unraveling of a two-path particle with
//! environmental σ<sub>z</sub> jumps and a coherence-triggered collapse jump.
//!
//! Units have ħ = 1. The no-jump evolution uses the first-order propagator
//! `1 - i H_eff dt`, `H_eff = H - (i/2) γ L^† L`, followed by renormalization.

use ndarray as nd;
use num_complex::Complex64 as C64;
use rand::{ rngs::StdRng, Rng, SeedableRng };
use rayon::iter::{ IntoParallelIterator, ParallelIterator };
use crate::{
    collapse::Branch,
    error::{ DtcError, DtcResult },
};

/// Pure state of the two-path system in the (`L`, `R`) basis.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TwoPath(pub [C64; 2]);

impl TwoPath {
    /// `(|L⟩ + |R⟩) / √2`.
    pub fn plus() -> Self {
        let a = C64::from(std::f64::consts::FRAC_1_SQRT_2);
        Self([a, a])
    }

    pub fn branch(branch: Branch) -> Self {
        let mut amps = [C64::from(0.0); 2];
        amps[branch.index()] = C64::from(1.0);
        Self(amps)
    }

    pub fn norm(&self) -> f64 {
        self.0.iter().map(|a| a.norm_sqr()).sum::<f64>().sqrt()
    }

    pub fn normalized(mut self) -> Self {
        let n = self.norm();
        if n > 0.0 {
            self.0.iter_mut().for_each(|a| { *a /= n; });
        }
        self
    }

    /// Branch probabilities `(p_L, p_R)`.
    pub fn probabilities(&self) -> (f64, f64) {
        (self.0[0].norm_sqr(), self.0[1].norm_sqr())
    }

    /// `2|ρ01|^2` of `|ψ⟩⟨ψ|`.
    pub fn coherence(&self) -> f64 {
        2.0 * (self.0[0] * self.0[1].conj()).norm_sqr()
    }

    /// σ<sub>z</sub>|ψ⟩.
    pub fn sigma_z(self) -> Self { Self([self.0[0], -self.0[1]]) }
}

/// Parameters of a single trajectory.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct McwfParams {
    /// Environmental dephasing rate.
    pub gamma: f64,
    /// Coherence threshold at the center of the collapse-rate step.
    pub threshold: f64,
    /// Maximum collapse rate.
    pub gamma0: f64,
    /// Steepness of the collapse-rate step.
    pub kappa: f64,
    /// Total simulated time.
    pub t_max: f64,
    pub steps: usize,
    /// Initial half-separation of the two paths.
    pub x0: f64,
    /// Outward speed of each path.
    pub speed: f64,
}

impl McwfParams {
    pub fn validate(&self) -> DtcResult<()> {
        if self.steps < 2 {
            return Err(DtcError::invalid("steps", "need at least two time steps"));
        }
        if !(self.t_max > 0.0 && self.t_max.is_finite()) {
            return Err(DtcError::invalid("t_max", "expected finite and > 0"));
        }
        if self.gamma < 0.0 || self.gamma0 < 0.0 {
            return Err(DtcError::invalid("gamma", "rates must be non-negative"));
        }
        Ok(())
    }

    pub fn time(&self) -> nd::Array1<f64> {
        nd::Array1::linspace(0.0, self.t_max, self.steps)
    }

    pub fn dt(&self) -> f64 { self.t_max / (self.steps - 1) as f64 }

    /// Smoothed step collapse rate
    /// ```text
    /// Γ(C) = Γ0 / (1 + exp(-κ (C_th - C)))
    /// ```
    /// with the exponent clipped to ±500.
    pub fn collapse_rate(&self, coherence: f64) -> f64 {
        let exponent = (self.kappa * (self.threshold - coherence)).clamp(-500.0, 500.0);
        self.gamma0 / (1.0 + (-exponent).exp())
    }

    /// Positions `(x_L, x_R)` of the two paths at time `t`.
    pub fn paths(&self, t: f64) -> (f64, f64) {
        let offset = self.x0 + self.speed * t;
        (-offset, offset)
    }
}

/// Output of a single trajectory.
#[derive(Clone, Debug)]
pub struct McwfTrajectory {
    /// `⟨x⟩` at each time step.
    pub position: nd::Array1<f64>,
    /// Branch of the collapse jump, if one occurred.
    pub outcome: Option<Branch>,
    /// Step of the first jump of either kind.
    pub snap: Option<usize>,
}

/// Run a single trajectory.
pub fn trajectory<R>(params: &McwfParams, rng: &mut R) -> McwfTrajectory
where R: Rng + ?Sized
{
    let dt = params.dt();
    let time = params.time();
    let mut psi = TwoPath::plus();
    let mut outcome: Option<Branch> = None;
    let mut snap: Option<usize> = None;
    let mut position: nd::Array1<f64> = nd::Array1::zeros(params.steps);
    for (k, t) in time.iter().enumerate() {
        // L = σz, so L^† L = 1
        let p_decoh = params.gamma * dt;
        let p_trig = params.collapse_rate(psi.coherence()) * dt;
        let p_total = p_decoh + p_trig;
        if p_total > 0.0 && rng.gen::<f64>() < p_total {
            snap.get_or_insert(k);
            psi = if rng.gen::<f64>() < p_decoh / p_total {
                psi.sigma_z()
            } else {
                let (p_l, p_r) = psi.probabilities();
                let branch
                    = if rng.gen::<f64>() < p_l / (p_l + p_r) {
                        Branch::L
                    } else {
                        Branch::R
                    };
                outcome = Some(branch);
                TwoPath::branch(branch)
            };
        } else {
            // H = 0: 1 - i H_eff dt = (1 - γ dt / 2) 1
            let damp = 1.0 - params.gamma * dt / 2.0;
            psi = TwoPath([psi.0[0] * damp, psi.0[1] * damp]);
        }
        psi = psi.normalized();
        let (x_l, x_r) = params.paths(*t);
        let (p_l, p_r) = psi.probabilities();
        position[k] = x_l * p_l + x_r * p_r;
    }
    McwfTrajectory { position, outcome, snap }
}

/// Summary statistics over many independent trajectories.
#[derive(Clone, Debug)]
pub struct Ensemble {
    pub trajectories: Vec<McwfTrajectory>,
    pub steps: usize,
}

impl Ensemble {
    /// Run `n` trajectories in parallel. Trajectory `k` uses the seed
    /// `seed + k`, so results do not depend on scheduling.
    pub fn run(params: &McwfParams, n: usize, seed: u64) -> DtcResult<Self> {
        params.validate()?;
        let trajectories: Vec<McwfTrajectory>
            = (0..n).into_par_iter()
            .map(|k| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(k as u64));
                trajectory(params, &mut rng)
            })
            .collect();
        log::info!("ran {} trajectories of {} steps", n, params.steps);
        Ok(Self { trajectories, steps: params.steps })
    }

    pub fn len(&self) -> usize { self.trajectories.len() }

    pub fn is_empty(&self) -> bool { self.trajectories.is_empty() }

    /// Fraction of trajectories ending in a collapse jump.
    pub fn collapse_fraction(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let collapsed
            = self.trajectories.iter().filter(|t| t.outcome.is_some()).count();
        collapsed as f64 / self.len() as f64
    }

    /// Mean snap step, counting trajectories without a jump at the last step.
    pub fn mean_snap(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let last = self.steps.saturating_sub(1);
        self.trajectories.iter()
            .map(|t| t.snap.unwrap_or(last) as f64)
            .sum::<f64>()
            / self.len() as f64
    }

    /// Counts of `L` and `R` outcomes.
    pub fn balance(&self) -> (usize, usize) {
        self.trajectories.iter()
            .fold((0, 0), |(l, r), t| match t.outcome {
                Some(Branch::L) => (l + 1, r),
                Some(Branch::R) => (l, r + 1),
                None => (l, r),
            })
    }

    /// Element-wise mean of `⟨x⟩` over all trajectories.
    pub fn mean_position(&self) -> nd::Array1<f64> {
        let mut acc: nd::Array1<f64> = nd::Array1::zeros(self.steps);
        self.trajectories.iter().for_each(|t| { acc += &t.position; });
        if !self.is_empty() {
            acc /= self.len() as f64;
        }
        acc
    }

    /// The trajectory whose snap step is closest to the middle of the run.
    pub fn representative(&self) -> Option<&McwfTrajectory> {
        let mid = self.steps as f64 / 2.0;
        let last = self.steps.saturating_sub(1);
        self.trajectories.iter()
            .min_by(|a, b| {
                let da = (a.snap.unwrap_or(last) as f64 - mid).abs();
                let db = (b.snap.unwrap_or(last) as f64 - mid).abs();
                da.total_cmp(&db)
            })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn slow_params() -> McwfParams {
        // slow enough that trajectories stay coherent for a while
        McwfParams {
            gamma: 1e3,
            threshold: 0.5,
            gamma0: 1e4,
            kappa: 1000.0,
            t_max: 1e-3,
            steps: 2000,
            x0: 2.0,
            speed: 1e3,
        }
    }

    #[test]
    fn coherence_of_basis_states() {
        assert!((TwoPath::plus().coherence() - 0.5).abs() < 1e-15);
        assert_eq!(TwoPath::branch(Branch::L).coherence(), 0.0);
        assert_eq!(TwoPath::plus().sigma_z().coherence(), TwoPath::plus().coherence());
    }

    #[test]
    fn collapse_rate_is_a_step() {
        let params = slow_params();
        assert!((params.collapse_rate(0.5) - 5e3).abs() < 1e-9);
        assert!(params.collapse_rate(0.0) > 0.999 * params.gamma0);
        assert!(params.collapse_rate(1.0) < 1e-100);
    }

    #[test]
    fn collapsed_trajectory_follows_one_path() {
        let params = slow_params();
        let mut rng = StdRng::seed_from_u64(2024);
        let traj = trajectory(&params, &mut rng);
        if let Some(branch) = traj.outcome {
            let k = params.steps - 1;
            let (x_l, x_r) = params.paths(params.time()[k]);
            let expected = match branch { Branch::L => x_l, Branch::R => x_r };
            assert!((traj.position[k] - expected).abs() < 1e-9);
            assert!(traj.snap.is_some());
        } else {
            // superposition or σz-flipped superposition: ⟨x⟩ stays at 0
            assert!(traj.position.iter().all(|x| x.abs() < 1e-9));
        }
    }

    #[test]
    fn ensemble_is_reproducible_and_balanced() {
        let params = slow_params();
        let a = Ensemble::run(&params, 400, 11).unwrap();
        let b = Ensemble::run(&params, 400, 11).unwrap();
        assert_eq!(a.balance(), b.balance());
        assert_eq!(a.mean_snap(), b.mean_snap());
        let (l, r) = a.balance();
        assert!(l + r <= 400);
        if l + r > 100 {
            let frac = l as f64 / (l + r) as f64;
            assert!((frac - 0.5).abs() < 0.2, "{}", frac);
        }
        assert_eq!(a.mean_position().len(), params.steps);
        assert!(a.representative().is_some());
    }

    #[test]
    fn rejects_degenerate_params() {
        let mut params = slow_params();
        params.steps = 1;
        assert!(Ensemble::run(&params, 1, 0).is_err());
    }
}

//! Spatial superpositions of two Gaussian wave packets on a 1D grid.

use ndarray as nd;
use num_complex::Complex64 as C64;
use rand::Rng;
use crate::{
    collapse::{ self, Branch, CollapseParams, Trajectory },
    decay::DecayRate,
    error::{ DtcError, DtcResult },
};

/// Uniform 1D position grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    x: nd::Array1<f64>,
}

impl Grid {
    /// `n >= 2` evenly spaced points on `[min, max]`, `min < max`.
    pub fn linspace(min: f64, max: f64, n: usize) -> DtcResult<Self> {
        if n < 2 {
            return Err(DtcError::invalid(
                "n", format!("need at least two grid points, got {}", n)));
        }
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(DtcError::invalid(
                "max", format!("expected a finite range, got [{}, {}]", min, max)));
        }
        Ok(Self { x: nd::Array1::linspace(min, max, n) })
    }

    pub fn x(&self) -> &nd::Array1<f64> { &self.x }

    pub fn len(&self) -> usize { self.x.len() }

    pub fn is_empty(&self) -> bool { self.x.is_empty() }

    pub fn dx(&self) -> f64 { self.x[1] - self.x[0] }
}

/// `Σ |ψ|^2 dx`.
pub fn norm_sqr(psi: &nd::Array1<C64>, dx: f64) -> f64 {
    psi.iter().map(|a| a.norm_sqr()).sum::<f64>() * dx
}

/// Rescale `psi` so that `Σ |ψ|^2 dx = 1`.
pub fn normalize(psi: &mut nd::Array1<C64>, dx: f64) {
    let n = norm_sqr(psi, dx).sqrt();
    if n > 0.0 {
        psi.mapv_inplace(|a| a / n);
    }
}

/// Normalized Gaussian packet `exp(-(x - x0)^2 / (4σ^2))`, so that `|ψ|^2` has
/// standard deviation `width`.
pub fn gaussian(grid: &Grid, center: f64, width: f64) -> nd::Array1<C64> {
    let mut psi: nd::Array1<C64>
        = grid.x()
        .mapv(|x| C64::from((-(x - center).powi(2) / (4.0 * width.powi(2))).exp()));
    normalize(&mut psi, grid.dx());
    psi
}

/// `|ψ|^2`.
pub fn probability_density(psi: &nd::Array1<C64>) -> nd::Array1<f64> {
    psi.mapv(|a| a.norm_sqr())
}

/// `Σ x |ψ|^2 dx`.
pub fn center_of_mass(grid: &Grid, psi: &nd::Array1<C64>) -> f64 {
    grid.x().iter().zip(psi)
        .map(|(x, a)| x * a.norm_sqr())
        .sum::<f64>()
        * grid.dx()
}

/// Off-diagonal magnitude of `|ψ⟩⟨ψ|`, summed over all pairs of distinct grid
/// points and scaled by `dx`.
pub fn coherence(psi: &nd::Array1<C64>, dx: f64) -> f64 {
    let (sum_abs, sum_sqr)
        = psi.iter()
        .fold((0.0, 0.0), |(s, q), a| (s + a.norm(), q + a.norm_sqr()));
    (sum_abs * sum_abs - sum_sqr) * dx
}

/// Two separated packets and their equal superposition.
#[derive(Clone, Debug)]
pub struct CatState {
    pub grid: Grid,
    pub separation: f64,
    pub width: f64,
    pub left: nd::Array1<C64>,
    pub right: nd::Array1<C64>,
    pub cat: nd::Array1<C64>,
}

impl CatState {
    /// Packets at `∓separation / 2` with width `width`.
    pub fn new(grid: Grid, separation: f64, width: f64) -> Self {
        let left = gaussian(&grid, -separation / 2.0, width);
        let right = gaussian(&grid, separation / 2.0, width);
        let cat: nd::Array1<C64>
            = (&left + &right).mapv(|a| a / std::f64::consts::SQRT_2);
        Self { grid, separation, width, left, right, cat }
    }

    /// The surviving branch, renormalized.
    pub fn collapse(&self, branch: Branch) -> nd::Array1<C64> {
        let mut psi = match branch {
            Branch::L => self.left.clone(),
            Branch::R => self.right.clone(),
        };
        normalize(&mut psi, self.grid.dx());
        psi
    }

    /// Coherence of the superposition.
    pub fn coherence(&self) -> f64 { coherence(&self.cat, self.grid.dx()) }

    /// Effective dephasing rate of this superposition for an environmental
    /// rate `gamma_env`.
    pub fn dephasing_rate(&self, gamma_env: f64) -> DecayRate {
        DecayRate::Dephasing {
            gamma_env,
            separation: self.separation,
            width: self.width,
        }
    }
}

/// Result of [`CatExperiment::run`].
#[derive(Clone, Debug)]
pub struct CatOutcome {
    pub trajectory: Trajectory,
    pub baseline: nd::Array1<f64>,
    /// The collapsed branch, or the untouched superposition.
    pub final_state: nd::Array1<C64>,
}

/// Collapse of a two-packet superposition under environmental dephasing.
#[derive(Clone, Debug)]
pub struct CatExperiment {
    pub state: CatState,
    pub rate: DecayRate,
    pub threshold: f64,
    pub floor: f64,
}

impl CatExperiment {
    /// Coherence starts from that of the initial superposition.
    pub fn run<R>(&self, time: &nd::Array1<f64>, rng: &mut R)
        -> DtcResult<CatOutcome>
    where R: Rng + ?Sized
    {
        let dt = if time.len() > 1 { time[1] - time[0] } else { 0.0 };
        let initial = self.state.coherence();
        let params
            = CollapseParams::from_rate(initial, &self.rate, dt, self.threshold)?
            .with_floor(self.floor);
        let trajectory = collapse::run(&params, time, rng);
        let baseline
            = collapse::pure_decoherence(initial, params.decay_factor, time.len());
        let final_state = match trajectory.branch() {
            Some(branch) => self.state.collapse(branch),
            None => self.state.cat.clone(),
        };
        Ok(CatOutcome { trajectory, baseline, final_state })
    }
}

/// Two-slit geometry used to build reference paths.
#[derive(Copy, Clone, Debug)]
pub struct SlitGeometry {
    pub slit_distance: f64,
    /// Amplitude width `w` in `exp(-(x - x0)^2 / (2 w^2))`.
    pub slit_width: f64,
    /// Momentum kick applied with opposite signs to the two paths.
    pub kick: f64,
    /// Outward drift of each packet per step.
    pub speed: f64,
}

impl Default for SlitGeometry {
    fn default() -> Self {
        Self { slit_distance: 4.0, slit_width: 1.0, kick: 0.5, speed: 0.05 }
    }
}

impl SlitGeometry {
    fn packet(&self, grid: &Grid, center: f64, kick: f64) -> nd::Array1<C64> {
        // amplitude width w corresponds to a density width w / √2
        let mut psi = gaussian(grid, center, self.slit_width / std::f64::consts::SQRT_2);
        psi.iter_mut().zip(grid.x())
            .for_each(|(a, x)| { *a *= C64::from_polar(1.0, kick * x); });
        psi
    }

    /// Center-of-mass tracks `(L, R)` of the two diverging paths.
    pub fn path_trajectories(&self, grid: &Grid, steps: usize)
        -> (nd::Array1<f64>, nd::Array1<f64>)
    {
        let (l, r): (Vec<f64>, Vec<f64>)
            = (0..steps)
            .map(|t| {
                let shift = t as f64 * self.speed;
                let pos_l = -self.slit_distance / 2.0 - shift;
                let pos_r = self.slit_distance / 2.0 + shift;
                let phi_l = self.packet(grid, pos_l, self.kick);
                let phi_r = self.packet(grid, pos_r, -self.kick);
                (center_of_mass(grid, &phi_l), center_of_mass(grid, &phi_r))
            })
            .unzip();
        (l.into(), r.into())
    }
}

/// Single-trial position record of a two-path particle.
#[derive(Clone, Debug)]
pub struct SlitRun {
    /// `⟨x⟩` at each step: zero in superposition, the chosen path afterwards.
    pub position: nd::Array1<f64>,
    pub snap: Option<usize>,
    pub outcome: Option<Branch>,
}

impl SlitRun {
    /// Coherence `c0 exp(-γ t)` over integer steps `t`; the first step with
    /// coherence strictly below `threshold` selects a path at random.
    pub fn single<R>(
        c0: f64,
        gamma: f64,
        threshold: f64,
        paths: (&nd::Array1<f64>, &nd::Array1<f64>),
        rng: &mut R,
    ) -> Self
    where R: Rng + ?Sized
    {
        let (path_l, path_r) = paths;
        let steps = path_l.len().min(path_r.len());
        let snap
            = (0..steps)
            .find(|t| c0 * (-gamma * *t as f64).exp() < threshold);
        let outcome = snap.map(|_| Branch::sample(rng));
        let position: nd::Array1<f64>
            = (0..steps)
            .map(|t| match (snap, outcome) {
                (Some(s), Some(Branch::L)) if t >= s => path_l[t],
                (Some(s), Some(Branch::R)) if t >= s => path_r[t],
                _ => 0.0,
            })
            .collect();
        Self { position, snap, outcome }
    }
}

#[cfg(test)]
mod test {
    use rand::{ rngs::StdRng, SeedableRng };
    use super::*;

    fn cat() -> CatState {
        CatState::new(Grid::linspace(-400e-9, 400e-9, 2000).unwrap(), 100e-9, 5e-9)
    }

    #[test]
    fn packets_are_normalized() {
        let state = cat();
        let dx = state.grid.dx();
        assert!((norm_sqr(&state.left, dx) - 1.0).abs() < 1e-9);
        assert!((norm_sqr(&state.right, dx) - 1.0).abs() < 1e-9);
        // non-overlapping packets: the superposition is normalized too
        assert!((norm_sqr(&state.cat, dx) - 1.0).abs() < 1e-6);
        assert!((center_of_mass(&state.grid, &state.left) + 50e-9).abs() < 1e-12);
        assert!(center_of_mass(&state.grid, &state.cat).abs() < 1e-12);
    }

    #[test]
    fn collapse_discards_one_branch() {
        let state = cat();
        let psi = state.collapse(Branch::R);
        let rho = probability_density(&psi);
        let dx = state.grid.dx();
        let left_weight: f64
            = state.grid.x().iter().zip(rho.iter())
            .filter(|(x, _)| **x < 0.0)
            .map(|(_, p)| p * dx)
            .sum();
        assert!(left_weight < 1e-12);
        assert!(coherence(&psi, dx) < state.coherence());
    }

    #[test]
    fn cat_experiment_starts_from_cat_coherence() {
        let state = cat();
        let experiment = CatExperiment {
            rate: state.dephasing_rate(1e4),
            state,
            threshold: 1e-20,
            floor: 1e-40,
        };
        let c0 = experiment.state.coherence();
        assert!((124.0..125.0).contains(&c0), "{}", c0);
        let time: nd::Array1<f64> = nd::Array1::linspace(0.0, 200e-6, 12000);
        let out = experiment.run(&time, &mut StdRng::seed_from_u64(46)).unwrap();
        assert_eq!(out.trajectory.coherence[0], c0);
        assert_eq!(out.baseline[0], c0);

        // ln(C0 / C_th) / Γ with Γ = 1e6 s^-1: about 50.9 μs
        let t = out.trajectory.trigger_time().unwrap();
        let predicted = collapse::predicted_trigger_time(
            &experiment.rate, c0, experiment.threshold).unwrap();
        let dt = time[1] - time[0];
        assert!((t - predicted).abs() <= dt, "{} vs {}", t, predicted);
        assert!((50.8e-6..51.0e-6).contains(&t), "{}", t);

        let branch = out.trajectory.branch().unwrap();
        assert_eq!(out.final_state, experiment.state.collapse(branch));
        assert_eq!(out.baseline.len(), time.len());
        assert!(out.baseline[11999] > 0.0 && out.baseline[11999] < 1e-20);
    }

    #[test]
    fn grid_rejects_degenerate_ranges() {
        assert!(matches!(
            Grid::linspace(-1.0, 1.0, 1),
            Err(DtcError::InvalidParameter { name: "n", .. })
        ));
        assert!(Grid::linspace(1.0, -1.0, 10).is_err());
        assert!(Grid::linspace(0.0, f64::INFINITY, 10).is_err());
        assert_eq!(Grid::linspace(0.0, 1.0, 2).unwrap().dx(), 1.0);
    }

    #[test]
    fn paths_diverge() {
        let grid = Grid::linspace(-10.0, 10.0, 1024).unwrap();
        let geometry = SlitGeometry::default();
        let (l, r) = geometry.path_trajectories(&grid, 100);
        assert!((l[0] + 2.0).abs() < 1e-6);
        assert!((r[0] - 2.0).abs() < 1e-6);
        assert!(l[50] < l[0] && r[50] > r[0]);
        assert!((l[50] + r[50]).abs() < 1e-9);
    }

    #[test]
    fn slit_run_follows_chosen_path() {
        let l: nd::Array1<f64> = nd::Array1::linspace(-2.0, -7.0, 100);
        let r: nd::Array1<f64> = nd::Array1::linspace(2.0, 7.0, 100);
        let run = SlitRun::single(1.0, 0.15, 1e-4, (&l, &r), &mut StdRng::seed_from_u64(0));
        // exp(-0.15 t) < 1e-4 first at t = 62
        assert_eq!(run.snap, Some(62));
        assert!(run.position.iter().take(62).all(|x| *x == 0.0));
        let path = match run.outcome.unwrap() { Branch::L => &l, Branch::R => &r };
        assert_eq!(run.position[80], path[80]);

        let none = SlitRun::single(1.0, 0.0, 1e-4, (&l, &r), &mut StdRng::seed_from_u64(0));
        assert!(none.snap.is_none() && none.outcome.is_none());
        assert!(none.position.iter().all(|x| *x == 0.0));
    }
}

//! Two-level density matrix version of the collapse process.
//!
//! The basis is ordered as (`L`, `R`), i.e. (|0⟩, |1⟩), so that the two
//! branches are the projectors P0 and P1.

use ndarray as nd;
use num_complex::Complex64 as C64;
use num_traits::Zero;
use rand::Rng;
use rand_distr::StandardNormal;
use crate::{
    c,
    collapse::{ self, Branch, CollapseParams, Phase },
    error::{ DtcError, DtcResult },
};

/// Pauli σ<sub>z</sub>.
pub fn sigma_z() -> nd::Array2<C64> {
    nd::array![[c!(1.0), c!(0.0)], [c!(0.0), c!(-1.0)]]
}

/// Conjugate transpose.
pub fn dagger(a: &nd::Array2<C64>) -> nd::Array2<C64> {
    a.t().mapv(|x| x.conj())
}

/// Commutator `[a, b] = ab - ba`.
pub fn commutator(a: &nd::Array2<C64>, b: &nd::Array2<C64>)
    -> nd::Array2<C64>
{
    a.dot(b) - b.dot(a)
}

/// Anti-commutator `{a, b} = ab + ba`.
pub fn anticommutator(a: &nd::Array2<C64>, b: &nd::Array2<C64>)
    -> nd::Array2<C64>
{
    a.dot(b) + b.dot(a)
}

/// Lindblad dissipator for a single jump operator `l`:
/// ```text
/// D[L]ρ = L ρ L^† - (1/2) {L^† L, ρ}
/// ```
pub fn dissipator(l: &nd::Array2<C64>, rho: &nd::Array2<C64>)
    -> nd::Array2<C64>
{
    let l_dag = dagger(l);
    let l_dag_l = l_dag.dot(l);
    l.dot(rho).dot(&l_dag) - anticommutator(&l_dag_l, rho) * c!(0.5)
}

/// Sum of the dissipators of both branch projectors,
/// ```text
/// D[P0]ρ + D[P1]ρ
/// ```
/// which damps the off-diagonal elements at unit rate and leaves the
/// populations alone.
pub fn branch_pruning(rho: &nd::Array2<C64>) -> nd::Array2<C64> {
    [Branch::L, Branch::R].into_iter()
        .map(|b| dissipator(DensityMatrix::projector(b).array(), rho))
        .fold(nd::Array2::<C64>::zeros((2, 2)), |acc, d| acc + d)
}

/// A 2×2 density matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct DensityMatrix(nd::Array2<C64>);

impl DensityMatrix {
    /// Wrap an existing 2×2 matrix with non-zero trace. The trace is
    /// renormalized to 1.
    pub fn new(rho: nd::Array2<C64>) -> DtcResult<Self> {
        if rho.dim() != (2, 2) {
            return Err(DtcError::invalid(
                "rho", format!("expected a 2x2 matrix, got {:?}", rho.dim())));
        }
        let mut rho = Self(rho);
        if rho.trace().is_zero() {
            return Err(DtcError::invalid("rho", "expected a non-zero trace"));
        }
        rho.renormalize();
        Ok(rho)
    }

    /// `|ψ⟩⟨ψ|` for a (not necessarily normalized) two-component state.
    pub fn from_pure(psi: &nd::Array1<C64>) -> DtcResult<Self> {
        if psi.len() != 2 {
            return Err(DtcError::invalid(
                "psi", format!("expected 2 components, got {}", psi.len())));
        }
        let rho: nd::Array2<C64>
            = nd::Array2::from_shape_fn((2, 2), |(i, j)| psi[i] * psi[j].conj());
        Self::new(rho)
    }

    /// The equal superposition |+⟩⟨+|.
    pub fn plus() -> Self {
        Self(nd::Array2::from_elem((2, 2), c!(0.5)))
    }

    /// The projector onto a single branch.
    pub fn projector(branch: Branch) -> Self {
        let mut rho: nd::Array2<C64> = nd::Array2::zeros((2, 2));
        rho[[branch.index(), branch.index()]] = c!(1.0);
        Self(rho)
    }

    pub fn array(&self) -> &nd::Array2<C64> { &self.0 }

    pub fn into_array(self) -> nd::Array2<C64> { self.0 }

    pub fn trace(&self) -> C64 { self.0.diag().iter().sum() }

    fn renormalize(&mut self) {
        let tr = self.trace();
        if !tr.is_zero() {
            self.0 /= tr;
        }
    }

    /// `2|ρ01|`.
    pub fn coherence(&self) -> f64 { 2.0 * self.0[[0, 1]].norm() }

    /// `|ρ01| + |ρ10|`.
    pub fn coherence_l1(&self) -> f64 {
        self.0[[0, 1]].norm() + self.0[[1, 0]].norm()
    }

    /// Branch populations `(p_L, p_R)`.
    pub fn populations(&self) -> (f64, f64) { (self.0[[0, 0]].re, self.0[[1, 1]].re) }

    /// ⟨σ<sub>z</sub>⟩.
    pub fn sz(&self) -> f64 { (self.0[[0, 0]] - self.0[[1, 1]]).re }

    /// Multiply the off-diagonal element by `factor`, keeping the matrix
    /// Hermitian.
    pub fn dephase(&mut self, factor: f64) {
        self.0[[0, 1]] *= factor;
        self.0[[1, 0]] = self.0[[0, 1]].conj();
    }

    /// Random phase kick `exp(i s ξ √dt)`, `ξ ~ N(0, 1)`, on the off-diagonal
    /// element. The magnitude of the coherence is unchanged.
    pub fn jitter<R>(&mut self, rng: &mut R, strength: f64, dt: f64)
    where R: Rng + ?Sized
    {
        let xi: f64 = rng.sample(StandardNormal);
        self.0[[0, 1]] *= C64::from_polar(1.0, strength * xi * dt.sqrt());
        self.0[[1, 0]] = self.0[[0, 1]].conj();
    }

    /// One explicit Euler step of
    /// ```text
    /// dρ/dt = -i[H, ρ] + γ D[L]ρ
    /// ```
    /// followed by trace renormalization.
    pub fn lindblad_step(
        &mut self,
        h: &nd::Array2<C64>,
        gamma: f64,
        l: &nd::Array2<C64>,
        dt: f64,
    ) {
        self.pruned_lindblad_step(h, gamma, l, 0.0, dt);
    }

    /// Like [`Self::lindblad_step`], with the branch-pruning term
    /// `γ_c (D[P0]ρ + D[P1]ρ)` added at rate `prune`.
    pub fn pruned_lindblad_step(
        &mut self,
        h: &nd::Array2<C64>,
        gamma: f64,
        l: &nd::Array2<C64>,
        prune: f64,
        dt: f64,
    ) {
        let mut drho: nd::Array2<C64>
            = commutator(h, &self.0) * (-C64::i())
            + dissipator(l, &self.0) * c!(gamma);
        if prune != 0.0 {
            drho = drho + branch_pruning(&self.0) * c!(prune);
        }
        self.0 = &self.0 + &(drho * c!(dt));
        self.renormalize();
    }

    /// Replace the state with a single branch, `PρP / tr(PρP)`.
    ///
    /// For a two-level system this is exactly the branch projector.
    pub fn collapse(&mut self, branch: Branch) {
        *self = Self::projector(branch);
    }
}

/// Coherence and ⟨σ<sub>z</sub>⟩ histories of a density-matrix run.
#[derive(Clone, Debug)]
pub struct DensityRun {
    pub coherence: nd::Array1<f64>,
    pub sz: nd::Array1<f64>,
    /// Step and branch of the collapse, if any.
    pub trigger: Option<(usize, Branch)>,
    /// First step at which the monitored coherence was below threshold.
    pub onset: Option<usize>,
    pub final_state: DensityMatrix,
}

/// Dephasing with threshold collapse on `2|ρ01|`.
///
/// Returns `n` samples; sample 0 is the initial state. After collapse the
/// reported coherence is that of the branch projector, i.e. zero.
pub fn run_dephasing<R>(
    rho0: DensityMatrix,
    decay_factor: f64,
    threshold: f64,
    n: usize,
    rng: &mut R,
) -> DensityRun
where R: Rng + ?Sized
{
    let mut rho = rho0;
    let params = CollapseParams {
        initial: rho.coherence(),
        decay_factor,
        threshold,
        floor: 0.0,
    };
    let mut phase = Phase::Coherent { coherence: params.initial };
    let mut coherence: Vec<f64> = Vec::with_capacity(n);
    let mut sz: Vec<f64> = Vec::with_capacity(n);
    let mut trigger: Option<(usize, Branch)> = None;
    if n > 0 {
        coherence.push(rho.coherence());
        sz.push(rho.sz());
    }
    for k in 1..n {
        if !phase.is_collapsed() {
            rho.dephase(decay_factor);
        }
        let (next, fired) = collapse::advance(phase, k, &params, rng);
        if let Some(branch) = fired {
            log::debug!("density matrix collapse onto P{} at step {}", branch.index(), k);
            rho.collapse(branch);
            trigger = Some((k, branch));
        }
        phase = next;
        coherence.push(rho.coherence());
        sz.push(rho.sz());
    }
    DensityRun {
        coherence: coherence.into(),
        sz: sz.into(),
        trigger,
        onset: trigger.map(|(k, _)| k),
        final_state: rho,
    }
}

/// What happens to a Lindblad run once the threshold is crossed.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SnapMode {
    /// Record a single zero and stop the run.
    Stop,
    /// Keep recording zero coherence until the end of the run.
    Hold,
    /// No projection: while the coherence is below threshold, evolve with
    /// the extra pruning term `rate (D[P0]ρ + D[P1]ρ)`. No branch is drawn.
    Prune { rate: f64 },
}

/// Parameters for [`run_lindblad`].
#[derive(Clone, Debug)]
pub struct LindbladParams {
    pub hamiltonian: nd::Array2<C64>,
    pub jump: nd::Array2<C64>,
    pub gamma: f64,
    pub dt: f64,
    pub steps: usize,
}

impl LindbladParams {
    /// `H = ω σz` with σz dephasing at rate `gamma`.
    pub fn sigma_z_dephasing(omega: f64, gamma: f64, dt: f64, steps: usize)
        -> Self
    {
        Self {
            hamiltonian: sigma_z() * c!(omega),
            jump: sigma_z(),
            gamma,
            dt,
            steps,
        }
    }
}

/// Euler-integrated Lindblad evolution, monitoring `|ρ01| + |ρ10|`.
///
/// The coherence of the current state is recorded before each step. With
/// `threshold = Some(..)`, the first recorded value strictly below the
/// threshold is replaced by zero, a branch is drawn, and the run either stops
/// or holds zero depending on `mode`. In [`SnapMode::Prune`] the value is
/// kept and the pruning term is switched on for every step that starts below
/// the threshold. With `None` this is plain decoherence.
pub fn run_lindblad<R>(
    rho0: DensityMatrix,
    params: &LindbladParams,
    threshold: Option<f64>,
    mode: SnapMode,
    rng: &mut R,
) -> DensityRun
where R: Rng + ?Sized
{
    let mut rho = rho0;
    let mut coherence: Vec<f64> = Vec::with_capacity(params.steps);
    let mut sz: Vec<f64> = Vec::with_capacity(params.steps);
    let mut trigger: Option<(usize, Branch)> = None;
    let mut onset: Option<usize> = None;
    for k in 0..params.steps {
        if trigger.is_some() {
            coherence.push(0.0);
            sz.push(rho.sz());
            continue;
        }
        let c = rho.coherence_l1();
        let below = threshold.is_some_and(|th| c < th);
        if below && onset.is_none() {
            onset = Some(k);
        }
        if let SnapMode::Prune { rate } = mode {
            coherence.push(c);
            sz.push(rho.sz());
            let prune = if below { rate } else { 0.0 };
            rho.pruned_lindblad_step(
                &params.hamiltonian, params.gamma, &params.jump, prune, params.dt);
            continue;
        }
        if below {
            let branch = Branch::sample(rng);
            log::debug!("lindblad snap onto {} at step {}", branch, k);
            rho.collapse(branch);
            trigger = Some((k, branch));
            coherence.push(0.0);
            sz.push(rho.sz());
            if mode == SnapMode::Stop {
                break;
            }
            continue;
        }
        coherence.push(c);
        sz.push(rho.sz());
        rho.lindblad_step(&params.hamiltonian, params.gamma, &params.jump, params.dt);
    }
    DensityRun {
        coherence: coherence.into(),
        sz: sz.into(),
        trigger,
        onset,
        final_state: rho,
    }
}

/// Dephasing plus continuous stochastic phase noise, with no collapse rule.
pub fn run_csl_jitter<R>(
    rho0: DensityMatrix,
    decay_factor: f64,
    strength: f64,
    dt: f64,
    n: usize,
    rng: &mut R,
) -> DensityRun
where R: Rng + ?Sized
{
    let mut rho = rho0;
    let mut coherence: Vec<f64> = Vec::with_capacity(n);
    let mut sz: Vec<f64> = Vec::with_capacity(n);
    if n > 0 {
        coherence.push(rho.coherence());
        sz.push(rho.sz());
    }
    for _ in 1..n {
        rho.dephase(decay_factor);
        rho.jitter(rng, strength, dt);
        coherence.push(rho.coherence());
        sz.push(rho.sz());
    }
    DensityRun {
        coherence: coherence.into(),
        sz: sz.into(),
        trigger: None,
        onset: None,
        final_state: rho,
    }
}

#[cfg(test)]
mod test {
    use itertools::Itertools;
    use rand::{ rngs::StdRng, SeedableRng };
    use super::*;

    #[test]
    fn plus_state() {
        let rho = DensityMatrix::plus();
        assert!((rho.trace() - c!(1.0)).norm() < 1e-15);
        assert!((rho.coherence() - 1.0).abs() < 1e-15);
        assert!((rho.coherence_l1() - 1.0).abs() < 1e-15);
        assert!(rho.sz().abs() < 1e-15);
    }

    #[test]
    fn projectors() {
        let p0 = DensityMatrix::projector(Branch::L);
        assert_eq!(p0.populations(), (1.0, 0.0));
        assert_eq!(p0.coherence(), 0.0);
        assert_eq!(DensityMatrix::projector(Branch::R).sz(), -1.0);
    }

    #[test]
    fn dissipator_dephases_off_diagonal() {
        let rho = DensityMatrix::plus();
        let d = dissipator(&sigma_z(), rho.array());
        // D[σz]ρ = -2 ρ01 off the diagonal, zero on it
        assert!((d[[0, 1]] + rho.array()[[0, 1]] * 2.0).norm() < 1e-15);
        assert!(d[[0, 0]].norm() < 1e-15);
        assert!(d[[1, 1]].norm() < 1e-15);
    }

    #[test]
    fn dephasing_run_collapses_once() {
        let mut rng = StdRng::seed_from_u64(123);
        let factor = (-1e5_f64 * 5e-4 / 15000.0).exp();
        let run = run_dephasing(DensityMatrix::plus(), factor, 1e-20, 15000, &mut rng);
        let (step, branch) = run.trigger.unwrap();
        assert!(run.coherence.iter().skip(step).all(|c| *c == 0.0));
        assert!(
            run.coherence.iter().take(step)
                .tuple_windows()
                .all(|(a, b)| b <= a)
        );
        let expected_sz = match branch { Branch::L => 1.0, Branch::R => -1.0 };
        assert_eq!(run.sz[run.sz.len() - 1], expected_sz);
        assert_eq!(run.final_state, DensityMatrix::projector(branch));
        // ln(1e20) / (γ dt) ≈ 13815
        assert!(step.abs_diff(13816) <= 2, "{}", step);
    }

    #[test]
    fn lindblad_stop_and_hold() {
        let params = LindbladParams::sigma_z_dephasing(1.0, 0.3, 0.005, 3000);
        let stopped = run_lindblad(
            DensityMatrix::plus(), &params, Some(0.15), SnapMode::Stop,
            &mut StdRng::seed_from_u64(9),
        );
        let (step, _) = stopped.trigger.unwrap();
        assert!((600..700).contains(&step), "{}", step);
        assert_eq!(stopped.coherence.len(), step + 1);
        assert_eq!(stopped.coherence[step], 0.0);

        let held = run_lindblad(
            DensityMatrix::plus(), &params, Some(0.15), SnapMode::Hold,
            &mut StdRng::seed_from_u64(9),
        );
        assert_eq!(held.coherence.len(), 3000);
        assert_eq!(held.trigger, stopped.trigger);
        assert!(held.coherence.iter().skip(step).all(|c| *c == 0.0));

        let qm = run_lindblad(
            DensityMatrix::plus(), &params, None, SnapMode::Hold,
            &mut StdRng::seed_from_u64(9),
        );
        assert!(qm.trigger.is_none());
        assert_eq!(qm.coherence.len(), 3000);
        assert!(qm.coherence[2999] > 0.0);
        assert!(qm.coherence[2999] < 0.15);
        // dephasing leaves the populations alone
        assert!((qm.final_state.trace() - c!(1.0)).norm() < 1e-12);
        assert!(qm.final_state.sz().abs() < 1e-12);
    }

    #[test]
    fn pruning_speeds_up_decay_without_projecting() {
        let (omega, gamma, dt, rate) = (1.0, 0.3, 0.005, 100.0);
        let params = LindbladParams::sigma_z_dephasing(omega, gamma, dt, 3000);
        let pruned = run_lindblad(
            DensityMatrix::plus(), &params, Some(0.15), SnapMode::Prune { rate },
            &mut StdRng::seed_from_u64(9),
        );
        assert!(pruned.trigger.is_none());
        assert_eq!(pruned.coherence.len(), 3000);
        let onset = pruned.onset.unwrap();
        assert!((600..700).contains(&onset), "{}", onset);
        // never projected: the coherence shrinks but is not set to zero
        assert!(pruned.coherence.iter().take(onset + 20).all(|c| *c > 0.0));
        assert!(pruned.coherence[onset] > 0.1);

        // Euler factor on ρ01: 1 - (2γ + γ_c) dt - 2iω dt
        let fast = c!(1.0 - (2.0 * gamma + rate) * dt, -2.0 * omega * dt).norm();
        let ratio = pruned.coherence[onset + 1] / pruned.coherence[onset];
        assert!((ratio - fast).abs() < 1e-9, "{} vs {}", ratio, fast);
        let slow = c!(1.0 - 2.0 * gamma * dt, -2.0 * omega * dt).norm();
        let before = pruned.coherence[onset] / pruned.coherence[onset - 1];
        assert!((before - slow).abs() < 1e-9, "{} vs {}", before, slow);

        // populations are untouched by either dissipator
        assert!(pruned.final_state.sz().abs() < 1e-12);
        assert!((pruned.final_state.trace() - c!(1.0)).norm() < 1e-12);
    }

    #[test]
    fn pruning_term_only_touches_coherences() {
        let rho = DensityMatrix::plus();
        let d = branch_pruning(rho.array());
        assert!((d[[0, 1]] + rho.array()[[0, 1]]).norm() < 1e-15);
        assert!(d[[0, 0]].norm() < 1e-15);
        assert!(d[[1, 1]].norm() < 1e-15);
    }

    #[test]
    fn constructors_reject_bad_input() {
        assert!(matches!(
            DensityMatrix::new(nd::Array2::zeros((3, 3))),
            Err(DtcError::InvalidParameter { name: "rho", .. })
        ));
        assert!(DensityMatrix::new(nd::Array2::zeros((2, 2))).is_err());
        assert!(DensityMatrix::from_pure(&nd::array![c!(1.0)]).is_err());
        let rho = DensityMatrix::from_pure(&nd::array![c!(2.0), c!(0.0)]).unwrap();
        assert_eq!(rho, DensityMatrix::projector(Branch::L));
        assert_eq!(
            DensityMatrix::from_pure(&nd::array![c!(1.0), c!(1.0)]).unwrap(),
            DensityMatrix::plus(),
        );
    }

    #[test]
    fn jitter_keeps_magnitude() {
        let mut rng = StdRng::seed_from_u64(5);
        let factor = 0.999;
        let run = run_csl_jitter(DensityMatrix::plus(), factor, 1e3, 1e-6, 500, &mut rng);
        assert!(run.trigger.is_none());
        for (k, c) in run.coherence.iter().enumerate() {
            assert!((c - factor.powi(k as i32)).abs() < 1e-12);
        }
        assert!(run.final_state.array()[[0, 1]].im.abs() > 0.0);
        assert!(run.sz.iter().all(|s| s.abs() < 1e-15));
    }
}

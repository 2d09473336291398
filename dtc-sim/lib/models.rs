//! Comparison curves between standard decoherence, spontaneous-collapse
//! models, and decoherence-triggered collapse, plus experimental bounds.

use std::fmt;
use indexmap::IndexMap;
use ndarray as nd;
use crate::decay::DecayRate;

/// Coherence reported by the DTC curve after reduction, for log-scale output.
pub const LOG_FLOOR: f64 = 1e-40;

/// Index of the first element strictly below `threshold`.
pub fn first_below(curve: &nd::Array1<f64>, threshold: f64) -> Option<usize> {
    curve.iter().position(|c| *c < threshold)
}

/// `exp(-Γ t)`.
pub fn exponential(rate: &DecayRate, time: &nd::Array1<f64>) -> nd::Array1<f64> {
    let gamma = rate.rate();
    time.mapv(|t| (-gamma * t).exp())
}

/// Variance of ⟨σ<sub>z</sub>⟩ accumulated under CSL collapse noise of rate
/// `lambda` up to time `t`, `~ λ t`.
///
/// The density-matrix phase jitter only moves ρ01, so a sampled ⟨σz⟩
/// variance from it is identically zero; this is the estimate to report
/// instead.
pub fn csl_sz_variance(lambda: f64, t: f64) -> f64 { lambda * t }

/// QM, CSL, and DTC coherence curves over a common time axis.
#[derive(Clone, Debug)]
pub struct ModelCurves {
    pub time: nd::Array1<f64>,
    pub qm: nd::Array1<f64>,
    /// One curve per CSL collapse rate `λ`, keyed by a label.
    pub csl: IndexMap<String, nd::Array1<f64>>,
    pub dtc: nd::Array1<f64>,
    /// Index of the DTC snap.
    pub snap: Option<usize>,
}

impl ModelCurves {
    pub fn compute<'a, I>(
        gamma_env: f64,
        threshold: f64,
        time: &nd::Array1<f64>,
        lambdas: I,
    ) -> Self
    where I: IntoIterator<Item = (&'a str, f64)>
    {
        let qm = exponential(&DecayRate::Direct { gamma: gamma_env }, time);
        let csl: IndexMap<String, nd::Array1<f64>>
            = lambdas.into_iter()
            .map(|(label, lambda)| {
                let rate = DecayRate::Csl { gamma_env, lambda };
                (label.to_string(), exponential(&rate, time))
            })
            .collect();
        let snap = first_below(&qm, threshold);
        let mut dtc = qm.clone();
        if let Some(k) = snap {
            dtc.slice_mut(nd::s![k..]).fill(LOG_FLOOR);
        }
        Self { time: time.clone(), qm, csl, dtc, snap }
    }

    pub fn snap_time(&self) -> Option<f64> { self.snap.map(|k| self.time[k]) }
}

/// Echo ("Lazarus") test: decay for the first half of `time`, then an
/// imperfect revival that reverses the decay with efficiency
/// `revival_factor`.
#[derive(Clone, Debug)]
pub struct Lazarus {
    pub time: nd::Array1<f64>,
    /// Reversible curve: decay followed by revival.
    pub qm: nd::Array1<f64>,
    /// Irreversible curve: zero from the snap onward.
    pub dtc: nd::Array1<f64>,
    pub snap: Option<usize>,
    /// Index of the echo pulse.
    pub echo: usize,
}

impl Lazarus {
    /// `gamma` is in inverse units of `time`.
    pub fn compute(
        gamma: f64,
        threshold: f64,
        time: &nd::Array1<f64>,
        revival_factor: f64,
    ) -> Self
    {
        let n = time.len();
        let mid = n / 2;
        let decay: nd::Array1<f64>
            = time.slice(nd::s![..mid]).mapv(|t| (-gamma * t).exp());
        let c_mid = decay.iter().next_back().copied().unwrap_or(1.0);
        let t_mid = time.get(mid).copied().unwrap_or(0.0);
        let revival: nd::Array1<f64>
            = time.slice(nd::s![mid..])
            .mapv(|t| c_mid * (gamma * (t - t_mid)).exp() * revival_factor);
        let qm = nd::concatenate![nd::Axis(0), decay, revival];
        let snap = first_below(&decay, threshold);
        let dtc = match snap {
            Some(k) => {
                let mut dtc = qm.clone();
                dtc.slice_mut(nd::s![k..]).fill(0.0);
                dtc
            },
            None => qm.clone(),
        };
        Self { time: time.clone(), qm, dtc, snap, echo: mid }
    }
}

/// Whether a prediction is consistent with an experimental upper limit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Compatible,
    Violated,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compatible => write!(f, "compatible"),
            Self::Violated => write!(f, "VIOLATED"),
        }
    }
}

/// Model predictions compared against a single experimental upper limit.
#[derive(Clone, Debug)]
pub struct BoundComparison {
    pub upper_limit: f64,
    /// Predicted values by model, in insertion order.
    pub predictions: IndexMap<String, f64>,
}

impl BoundComparison {
    /// LISA Pathfinder 2025 rotational noise limit, N² m² / Hz.
    pub const LISA_UPPER_LIMIT: f64 = 5.7e-34;
    /// Stand-in for a zero prediction on a log axis.
    pub const ZERO_ON_LOG: f64 = 1e-36;

    pub fn new(upper_limit: f64) -> Self {
        Self { upper_limit, predictions: IndexMap::new() }
    }

    /// Standard QM, CSL with λ ≤ 1e-11 s⁻¹, and DTC against the LISA limit.
    pub fn lisa() -> Self {
        let mut cmp = Self::new(Self::LISA_UPPER_LIMIT);
        cmp.add("Standard QM", 0.0);
        cmp.add("CSL (λ ≤ 1e-11 s^-1)", 1e-23);
        cmp.add("DTC", 0.0);
        cmp
    }

    pub fn add(&mut self, model: &str, prediction: f64) {
        self.predictions.insert(model.to_string(), prediction);
    }

    pub fn verdict(&self, prediction: f64) -> Verdict {
        if prediction > self.upper_limit { Verdict::Violated } else { Verdict::Compatible }
    }

    /// `(model, prediction, verdict)` in insertion order.
    pub fn verdicts(&self) -> impl Iterator<Item = (&str, f64, Verdict)> + '_ {
        self.predictions.iter()
            .map(|(model, p)| (model.as_str(), *p, self.verdict(*p)))
    }

    /// Predictions with zeros replaced by [`Self::ZERO_ON_LOG`].
    pub fn log_values(&self) -> nd::Array1<f64> {
        self.predictions.values()
            .map(|p| if *p > 0.0 { *p } else { Self::ZERO_ON_LOG })
            .collect()
    }
}

/// Allowed region of (Γ0, C_th) parameter space.
#[derive(Clone, Debug)]
pub struct ParameterSpace {
    pub gamma0: nd::Array1<f64>,
    pub threshold: nd::Array1<f64>,
    /// Largest threshold compatible with current bounds.
    pub max_threshold: f64,
}

impl ParameterSpace {
    pub const CHOSEN_GAMMA0: f64 = 1e20;
    pub const CHOSEN_THRESHOLD: f64 = 1e-20;

    /// Log-spaced grid over Γ0 ∈ [1e15, 1e30] s⁻¹ and C_th ∈ [1e-25, 1e-10].
    pub fn standard(n: usize) -> Self {
        Self {
            gamma0: nd::Array1::logspace(10.0, 15.0, 30.0, n),
            threshold: nd::Array1::logspace(10.0, -25.0, -10.0, n),
            max_threshold: 1e-8,
        }
    }

    pub fn allowed(&self, _gamma0: f64, threshold: f64) -> bool {
        threshold <= self.max_threshold
    }

    /// Allowed mask over the grid, indexed `[threshold, gamma0]`.
    pub fn mask(&self) -> nd::Array2<u8> {
        nd::Array2::from_shape_fn(
            (self.threshold.len(), self.gamma0.len()),
            |(i, j)| self.allowed(self.gamma0[j], self.threshold[i]) as u8,
        )
    }

    pub fn chosen_allowed(&self) -> bool {
        self.allowed(Self::CHOSEN_GAMMA0, Self::CHOSEN_THRESHOLD)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn fair_test_time() -> nd::Array1<f64> {
        nd::Array1::linspace(0.0, 600e-6, 5000)
    }

    #[test]
    fn dtc_snaps_and_csl_tracks_qm() {
        let time = fair_test_time();
        let curves = ModelCurves::compute(
            1e5, 1e-20, &time,
            [("allowed", 1e-11), ("original", 1e-17)],
        );
        let t = curves.snap_time().unwrap();
        assert!((460e-6..461e-6).contains(&t));
        let k = curves.snap.unwrap();
        assert!(curves.dtc.iter().skip(k).all(|c| *c == LOG_FLOOR));
        assert_eq!(curves.dtc.slice(nd::s![..k]), curves.qm.slice(nd::s![..k]));
        assert_eq!(curves.csl.keys().collect::<Vec<_>>(), ["allowed", "original"]);
        let allowed = &curves.csl["allowed"];
        assert!(
            allowed.iter().zip(curves.qm.iter())
                .all(|(a, q)| *a <= *q && (q - a).abs() <= 1e-15 * q.max(1e-300))
        );
    }

    #[test]
    fn csl_variance_estimate() {
        let allowed = csl_sz_variance(1e-11, 100e-6);
        assert!((allowed - 1e-15).abs() < 1e-27);
        assert!(csl_sz_variance(1e-17, 100e-6) < allowed);
        assert_eq!(csl_sz_variance(0.0, 1.0), 0.0);
    }

    #[test]
    fn lazarus_is_irreversible() {
        let time: nd::Array1<f64> = nd::Array1::linspace(0.0, 20.0, 2000);
        let gamma = 6e6 * 1e-6; // per µs
        let test = Lazarus::compute(gamma, 1e-20, &time, 0.8);
        let snap = test.snap.unwrap();
        // ln(1e20) / 6 ≈ 7.68 µs
        assert!((time[snap] - 7.68).abs() < 0.02, "{}", time[snap]);
        assert_eq!(test.echo, 1000);
        assert!(test.dtc.iter().skip(snap).all(|c| *c == 0.0));
        // the reversible curve climbs back after the echo
        assert!(test.qm[1999] > test.qm[1000]);
        assert!(test.qm[1999] > 0.1);
    }

    #[test]
    fn lazarus_without_crossing_revives() {
        let time: nd::Array1<f64> = nd::Array1::linspace(0.0, 20.0, 2000);
        let test = Lazarus::compute(0.1, 1e-20, &time, 0.8);
        assert!(test.snap.is_none());
        assert_eq!(test.dtc, test.qm);
    }

    #[test]
    fn lisa_verdicts() {
        let cmp = BoundComparison::lisa();
        let verdicts: Vec<Verdict> = cmp.verdicts().map(|(_, _, v)| v).collect();
        assert_eq!(
            verdicts,
            [Verdict::Compatible, Verdict::Violated, Verdict::Compatible]
        );
        assert_eq!(cmp.log_values()[0], BoundComparison::ZERO_ON_LOG);
    }

    #[test]
    fn chosen_point_is_allowed() {
        let space = ParameterSpace::standard(50);
        assert!(space.chosen_allowed());
        assert!((space.gamma0[0] - 1e15).abs() / 1e15 < 1e-9);
        assert!((space.threshold[49] - 1e-10).abs() / 1e-10 < 1e-9);
        assert!(space.mask().iter().all(|m| *m == 1));
        assert!(!space.allowed(1e20, 1e-5));
    }
}

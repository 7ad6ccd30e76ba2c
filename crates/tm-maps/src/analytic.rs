//! Closed-form compressor map.
//!
//! Used where no tabulated data exists. With `N = N_c / N_ref` and
//! `dn = N - 1`:
//!
//! ```text
//! m_surge(N) = s0 + s1 dn + s2 dn²           m_choke(N) = c0 + c1 dn + c2 dn²
//! x          = (m_c - m_surge) / (m_choke - m_surge)
//! xs         = eps + (1 - 2 eps) sat(x)       smooth saturation into (0, 1)
//! bump(xs)   = xs^(α-1) (1-xs)^(β-1) / peak   normalized beta-distribution shape
//! pen(xs)    = (1 - p_s e^(-xs/w)) (1 - p_c e^(-(1-xs)/w))
//! PR         = 1 + (PR_design - 1) N^k bump(xs) pen(xs)
//!
//! eta_raw    = eta_peak - a (xs - x_eta(N))² - b dn² - q_s e^(-xs/w) - q_c e^(-(1-xs)/w)
//! eta        = smooth_clamp(eta_raw, eta_min, eta_max)
//! ```
//!
//! Every term is continuously differentiable in both inputs.

use crate::error::{MapError, MapResult};
use crate::map::{MachineKind, MapOutput, PerformanceMap, checked_output};
use crate::reference::ReferenceState;
use serde::{Deserialize, Serialize};

/// Distance kept from 0 and 1 by the saturating transform.
const SATURATION_EPS: f64 = 1e-6;

/// Sharpness of the softplus used by the efficiency clamp.
///
/// The clamp can undershoot `eta_min` by at most `ln 2 / ETA_CLAMP_SHARPNESS`.
const ETA_CLAMP_SHARPNESS: f64 = 1000.0;

/// Number of speeds checked for surge/choke crossing at construction.
const BOUNDARY_CHECK_POINTS: usize = 65;

/// Shape parameters of an [`AnalyticMap`], one flat key each when persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticParams {
    /// Corrected speed at N = 1 [rad/s]
    pub speed_ref: f64,
    /// Lowest valid normalized speed
    pub speed_min: f64,
    /// Highest valid normalized speed
    pub speed_max: f64,

    pub surge_c0: f64,
    pub surge_c1: f64,
    pub surge_c2: f64,
    pub choke_c0: f64,
    pub choke_c1: f64,
    pub choke_c2: f64,

    /// Peak pressure ratio at N = 1
    pub pr_design: f64,
    /// Peak pressure rise scales as N^pr_speed_exponent
    pub pr_speed_exponent: f64,
    /// Beta-bump shape, must exceed 1
    pub alpha: f64,
    /// Beta-bump shape, must exceed 1
    pub beta: f64,
    /// Softplus sharpness of the surge/choke saturation
    pub saturation_sharpness: f64,
    pub surge_penalty: f64,
    pub choke_penalty: f64,
    /// Decay length of the boundary penalties in normalized flow
    pub penalty_width: f64,

    pub eta_peak: f64,
    pub eta_peak_x0: f64,
    pub eta_peak_x1: f64,
    pub eta_flow_curvature: f64,
    pub eta_speed_curvature: f64,
    pub eta_surge_penalty: f64,
    pub eta_choke_penalty: f64,
    pub eta_min: f64,
    pub eta_max: f64,
}

impl Default for AnalyticParams {
    /// A representative single-stage centrifugal compressor.
    fn default() -> Self {
        Self {
            speed_ref: 3000.0,
            speed_min: 0.5,
            speed_max: 1.1,
            surge_c0: 6.0,
            surge_c1: 5.0,
            surge_c2: 1.0,
            choke_c0: 12.0,
            choke_c1: 8.0,
            choke_c2: 1.0,
            pr_design: 4.0,
            pr_speed_exponent: 2.0,
            alpha: 2.2,
            beta: 1.8,
            saturation_sharpness: 50.0,
            surge_penalty: 0.05,
            choke_penalty: 0.1,
            penalty_width: 0.05,
            eta_peak: 0.86,
            eta_peak_x0: 0.55,
            eta_peak_x1: 0.1,
            eta_flow_curvature: 0.6,
            eta_speed_curvature: 0.3,
            eta_surge_penalty: 0.05,
            eta_choke_penalty: 0.08,
            eta_min: 0.3,
            eta_max: 0.92,
        }
    }
}

impl AnalyticParams {
    fn surge_flow(&self, dn: f64) -> f64 {
        self.surge_c0 + dn * (self.surge_c1 + dn * self.surge_c2)
    }

    fn choke_flow(&self, dn: f64) -> f64 {
        self.choke_c0 + dn * (self.choke_c1 + dn * self.choke_c2)
    }

    fn validate(&self) -> MapResult<()> {
        let finite = [
            self.speed_ref,
            self.speed_min,
            self.speed_max,
            self.surge_c0,
            self.surge_c1,
            self.surge_c2,
            self.choke_c0,
            self.choke_c1,
            self.choke_c2,
            self.pr_design,
            self.pr_speed_exponent,
            self.alpha,
            self.beta,
            self.saturation_sharpness,
            self.surge_penalty,
            self.choke_penalty,
            self.penalty_width,
            self.eta_peak,
            self.eta_peak_x0,
            self.eta_peak_x1,
            self.eta_flow_curvature,
            self.eta_speed_curvature,
            self.eta_surge_penalty,
            self.eta_choke_penalty,
            self.eta_min,
            self.eta_max,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(MapError::NonFinite {
                what: "analytic map parameter",
            });
        }

        positive("speed_ref", self.speed_ref)?;
        positive("speed_min", self.speed_min)?;
        if self.speed_max <= self.speed_min {
            return invalid("speed_max", "must exceed speed_min");
        }
        if self.pr_design <= 1.0 {
            return invalid("pr_design", "must exceed 1");
        }
        if self.alpha <= 1.0 {
            return invalid("alpha", "must exceed 1");
        }
        if self.beta <= 1.0 {
            return invalid("beta", "must exceed 1");
        }
        positive("saturation_sharpness", self.saturation_sharpness)?;
        positive("penalty_width", self.penalty_width)?;
        unit_interval("surge_penalty", self.surge_penalty)?;
        unit_interval("choke_penalty", self.choke_penalty)?;
        if self.eta_min <= (2.0_f64).ln() / ETA_CLAMP_SHARPNESS {
            return invalid("eta_min", "must be positive with margin for the smooth clamp");
        }
        if self.eta_max <= self.eta_min || self.eta_max > 1.0 {
            return invalid("eta_max", "must lie in (eta_min, 1]");
        }

        for i in 0..BOUNDARY_CHECK_POINTS {
            let n = self.speed_min
                + (self.speed_max - self.speed_min) * i as f64 / (BOUNDARY_CHECK_POINTS - 1) as f64;
            let dn = n - 1.0;
            if self.choke_flow(dn) <= self.surge_flow(dn) {
                return invalid(
                    "choke_c0",
                    "choke flow must exceed surge flow across the speed range",
                );
            }
        }
        Ok(())
    }
}

fn invalid<T>(name: &'static str, what: &str) -> MapResult<T> {
    Err(MapError::InvalidParameter {
        name,
        what: what.to_string(),
    })
}

fn positive(name: &'static str, v: f64) -> MapResult<()> {
    if v > 0.0 {
        Ok(())
    } else {
        invalid(name, "must be positive")
    }
}

fn unit_interval(name: &'static str, v: f64) -> MapResult<()> {
    if (0.0..1.0).contains(&v) {
        Ok(())
    } else {
        invalid(name, "must lie in [0, 1)")
    }
}

/// `ln(1 + e^(k z)) / k`, evaluated without overflow.
fn softplus(z: f64, k: f64) -> f64 {
    let kz = k * z;
    kz.max(0.0) / k + (-kz.abs()).exp().ln_1p() / k
}

/// Smooth approximation of `clamp(x, 0, 1)`.
fn saturate(x: f64, k: f64) -> f64 {
    softplus(x, k) - softplus(x - 1.0, k)
}

/// Parametric compressor map; stateless evaluation, no grid.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticMap {
    reference: ReferenceState,
    params: AnalyticParams,
    /// Mode of the beta bump, cached for peak normalization
    bump_mode: f64,
}

impl AnalyticMap {
    /// Create a map after validating every shape parameter.
    pub fn new(reference: ReferenceState, params: AnalyticParams) -> MapResult<Self> {
        params.validate()?;
        let bump_mode = (params.alpha - 1.0) / (params.alpha + params.beta - 2.0);
        Ok(Self {
            reference,
            params,
            bump_mode,
        })
    }

    pub fn params(&self) -> &AnalyticParams {
        &self.params
    }

    /// Surge and choke corrected flow at a corrected speed.
    pub fn boundaries(&self, corrected_speed: f64) -> (f64, f64) {
        let dn = corrected_speed / self.params.speed_ref - 1.0;
        (self.params.surge_flow(dn), self.params.choke_flow(dn))
    }

    /// Beta-distribution bump normalized to a peak of exactly 1.
    fn bump(&self, xs: f64) -> f64 {
        let p = &self.params;
        let m = self.bump_mode;
        ((p.alpha - 1.0) * (xs / m).ln() + (p.beta - 1.0) * ((1.0 - xs) / (1.0 - m)).ln()).exp()
    }

    fn boundary_decay(&self, xs: f64) -> (f64, f64) {
        let w = self.params.penalty_width;
        ((-xs / w).exp(), (-(1.0 - xs) / w).exp())
    }
}

impl PerformanceMap for AnalyticMap {
    fn kind(&self) -> MachineKind {
        MachineKind::Compressor
    }

    fn reference(&self) -> &ReferenceState {
        &self.reference
    }

    fn evaluate(&self, corrected_speed: f64, axis_value: f64) -> MapResult<MapOutput> {
        let p = &self.params;
        let n = corrected_speed / p.speed_ref;
        if !(n > 0.0) {
            return Err(MapError::Undefined {
                what: format!("normalized speed must be positive, got {n}"),
            });
        }
        let dn = n - 1.0;
        let (surge, choke) = (p.surge_flow(dn), p.choke_flow(dn));
        let width = choke - surge;
        if !(width > 0.0) {
            return Err(MapError::Undefined {
                what: format!("surge and choke boundaries cross at normalized speed {n}"),
            });
        }

        let x = (axis_value - surge) / width;
        let xs = SATURATION_EPS
            + (1.0 - 2.0 * SATURATION_EPS) * saturate(x, p.saturation_sharpness);
        let (near_surge, near_choke) = self.boundary_decay(xs);

        let penalty = (1.0 - p.surge_penalty * near_surge) * (1.0 - p.choke_penalty * near_choke);
        let rise = (p.pr_design - 1.0) * n.powf(p.pr_speed_exponent);
        let pressure_ratio = 1.0 + rise * self.bump(xs) * penalty;

        let x_eta = p.eta_peak_x0 + p.eta_peak_x1 * dn;
        let eta_raw = p.eta_peak
            - p.eta_flow_curvature * (xs - x_eta).powi(2)
            - p.eta_speed_curvature * dn * dn
            - p.eta_surge_penalty * near_surge
            - p.eta_choke_penalty * near_choke;
        let above_min = p.eta_min + softplus(eta_raw - p.eta_min, ETA_CLAMP_SHARPNESS);
        let efficiency = p.eta_max - softplus(p.eta_max - above_min, ETA_CLAMP_SHARPNESS);

        checked_output(corrected_speed, axis_value, pressure_ratio, efficiency)
    }

    fn speed_range(&self) -> (f64, f64) {
        (
            self.params.speed_min * self.params.speed_ref,
            self.params.speed_max * self.params.speed_ref,
        )
    }

    fn axis_range(&self, corrected_speed: f64) -> (f64, f64) {
        let (surge, choke) = self.boundaries(corrected_speed);
        (surge.min(choke), surge.max(choke))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> AnalyticMap {
        AnalyticMap::new(ReferenceState::standard(), AnalyticParams::default()).unwrap()
    }

    #[test]
    fn default_params_are_valid() {
        let m = map();
        assert_eq!(m.kind(), MachineKind::Compressor);
        assert_eq!(m.speed_range(), (1500.0, 3300.0));
    }

    #[test]
    fn invalid_params_fail_at_construction() {
        let mut p = AnalyticParams::default();
        p.alpha = 1.0;
        assert!(AnalyticMap::new(ReferenceState::standard(), p).is_err());

        let mut p = AnalyticParams::default();
        p.choke_c0 = 5.0;
        assert!(matches!(
            AnalyticMap::new(ReferenceState::standard(), p),
            Err(MapError::InvalidParameter { .. })
        ));

        let mut p = AnalyticParams::default();
        p.eta_max = 0.2;
        assert!(AnalyticMap::new(ReferenceState::standard(), p).is_err());
    }

    #[test]
    fn softplus_is_stable() {
        assert!((softplus(0.0, 1.0) - 2.0_f64.ln()).abs() < 1e-15);
        assert!((softplus(1000.0, 10.0) - 1000.0).abs() < 1e-12);
        assert!(softplus(-1000.0, 10.0) >= 0.0);
        assert!(saturate(-5.0, 50.0) < 1e-12);
        assert!((saturate(6.0, 50.0) - 1.0).abs() < 1e-12);
        assert!((saturate(0.5, 50.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn pressure_ratio_rises_then_falls_across_the_flow_range() {
        let m = map();
        let speed = 3000.0;
        let (surge, choke) = m.axis_range(speed);
        let at = |f: f64| m.evaluate(speed, surge + f * (choke - surge)).unwrap().value;
        let peak_pos = (2.2 - 1.0) / (2.2 + 1.8 - 2.0);
        assert!(at(0.05) < at(peak_pos));
        assert!(at(0.95) < at(peak_pos));
        assert!(at(peak_pos) > 3.5 && at(peak_pos) <= 4.0 + 1e-12);
    }

    #[test]
    fn peak_rise_scales_with_speed() {
        let m = map();
        let peak = |s: f64| {
            let (lo, hi) = m.axis_range(s);
            (0..200)
                .map(|i| m.evaluate(s, lo + (hi - lo) * i as f64 / 199.0).unwrap().value)
                .fold(f64::MIN, f64::max)
        };
        assert!(peak(1500.0) < peak(2400.0));
        assert!(peak(2400.0) < peak(3000.0));
    }

    #[test]
    fn efficiency_stays_within_clamp() {
        let m = map();
        let p = m.params().clone();
        for s in [1500.0, 2200.0, 3000.0, 3300.0] {
            let (lo, hi) = m.axis_range(s);
            for i in 0..=50 {
                let q = lo - 1.0 + (hi - lo + 2.0) * i as f64 / 50.0;
                let eta = m.evaluate(s, q).unwrap().efficiency;
                assert!(eta > 0.0);
                assert!(eta <= p.eta_max + 1e-12);
                assert!(eta >= p.eta_min - 1e-3);
            }
        }
    }

    #[test]
    fn non_positive_speed_is_undefined() {
        assert!(matches!(
            map().evaluate(0.0, 8.0),
            Err(MapError::Undefined { .. })
        ));
    }
}

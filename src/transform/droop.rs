// src/transform/droop.rs
//! Probe shaft droop correction for the LaPD XY drive.
//!
//! A horizontal shaft extended a distance `r` from its fixed point sags by
//!
//! ```text
//! ds = (a3 r^3 + a2 r^2 + a1 r + a0) r cos(theta)
//! ```
//!
//! where `theta` is the shaft angle in the ball-valve frame. The default
//! coefficients were fitted (in cm) for a stainless steel 304 tube,
//! 0.375" OD with a 0.035" wall.

use super::{positive, TransformError};
use crate::numeric::RootError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroopConfig {
    /// Distance from the ball valve pivot to the vacuum feedthru.
    pub pivot_to_feedthru: f64,
    /// Fit coefficients `[a0, a1, a2, a3]`.
    #[serde(default = "default_coefficients")]
    pub coefficients: [f64; 4],
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

impl DroopConfig {
    pub fn new(pivot_to_feedthru: f64) -> Self {
        Self {
            pivot_to_feedthru,
            coefficients: default_coefficients(),
            tolerance: default_tolerance(),
            max_iterations: default_max_iterations(),
        }
    }
}

fn default_coefficients() -> [f64; 4] {
    [6.209e-06, -2.211e-07, 2.084e-09, -5.491e-09]
}
fn default_tolerance() -> f64 { 1e-10 }
fn default_max_iterations() -> usize { 100 }

/// Maps between ideal (straight shaft) and drooped LaPD coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct DroopCorrection {
    pivot_to_center: f64,
    /// +1 when the pivot sits on the +x side of the chamber.
    side: f64,
    pivot_to_feedthru: f64,
    coefficients: [f64; 4],
    tolerance: f64,
    max_iterations: usize,
}

impl DroopCorrection {
    pub fn new(config: &DroopConfig, pivot_to_center: f64, side: f64) -> Result<Self, TransformError> {
        if !config.pivot_to_feedthru.is_finite() || config.pivot_to_feedthru < 0.0 {
            return Err(TransformError::InvalidConfig(format!(
                "'pivot_to_feedthru' must be a finite non-negative number, got {}",
                config.pivot_to_feedthru
            )));
        }
        if config.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(TransformError::InvalidConfig(format!(
                "droop coefficients must be finite, got {:?}",
                config.coefficients
            )));
        }
        if config.max_iterations == 0 {
            return Err(TransformError::InvalidConfig(
                "droop 'max_iterations' must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            pivot_to_center,
            side: side.signum(),
            pivot_to_feedthru: config.pivot_to_feedthru,
            coefficients: config.coefficients,
            tolerance: positive("tolerance", config.tolerance)?,
            max_iterations: config.max_iterations,
        })
    }

    pub fn config(&self) -> DroopConfig {
        DroopConfig {
            pivot_to_feedthru: self.pivot_to_feedthru,
            coefficients: self.coefficients,
            tolerance: self.tolerance,
            max_iterations: self.max_iterations,
        }
    }

    fn to_ball_valve(&self, point: [f64; 2]) -> [f64; 2] {
        [self.pivot_to_center - self.side * point[0], point[1]]
    }

    fn from_ball_valve(&self, point: [f64; 2]) -> [f64; 2] {
        [self.side * (self.pivot_to_center - point[0]), point[1]]
    }

    /// Sag `(dx, dy)` of the shaft tip at a ball-valve frame position.
    pub fn droop_offset(&self, bv: [f64; 2]) -> [f64; 2] {
        let [a0, a1, a2, a3] = self.coefficients;
        let r = bv[0].hypot(bv[1]) + self.pivot_to_feedthru;
        let theta = bv[1].atan2(bv[0]);
        let delta = (((a3 * r + a2) * r + a1) * r + a0) * r * theta.cos();
        [-delta * theta.sin(), delta * theta.cos()]
    }

    /// Where the tip of a drooping shaft lands when the ideal straight
    /// shaft would reach `point`.
    pub fn to_droop(&self, point: [f64; 2]) -> [f64; 2] {
        let bv = self.to_ball_valve(point);
        let [dx, dy] = self.droop_offset(bv);
        self.from_ball_valve([bv[0] + dx, bv[1] + dy])
    }

    /// Ideal shaft position whose drooped tip lands on `point`.
    ///
    /// No closed form exists in this direction; a fixed-point iteration
    /// walks the ideal position until its drooped image matches.
    pub fn to_nondroop(&self, point: [f64; 2]) -> Result<[f64; 2], TransformError> {
        let mut guess = point;
        let mut residual = f64::INFINITY;
        for iteration in 0..self.max_iterations {
            let test = self.to_droop(guess);
            let err = [test[0] - point[0], test[1] - point[1]];
            residual = err[0].abs().max(err[1].abs());
            tracing::trace!(iteration, residual, "droop inversion step");
            if !residual.is_finite() {
                break;
            }
            if residual <= self.tolerance {
                return Ok(guess);
            }
            guess = [guess[0] - err[0], guess[1] - err[1]];
        }

        Err(TransformError::Convergence {
            point: point.to_vec(),
            source: RootError::NotConverged {
                iterations: self.max_iterations,
                residual,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn east() -> DroopCorrection {
        DroopCorrection::new(&DroopConfig::new(21.6), 58.771, 1.0).unwrap()
    }

    #[test]
    fn test_droop_pulls_tip_down() {
        let droop = east();
        for point in [[0.0, 0.0], [-20.0, 10.0], [10.0, -15.0]] {
            let drooped = droop.to_droop(point);
            assert!(drooped[1] < point[1], "{:?} -> {:?}", point, drooped);
        }
    }

    #[test]
    fn test_droop_magnitude_at_center() {
        // on the pivot axis theta is zero so only y moves
        let droop = east();
        let drooped = droop.to_droop([0.0, 0.0]);
        let r: f64 = 58.771 + 21.6;
        let [a0, a1, a2, a3] = default_coefficients();
        let expected = (a3 * r.powi(3) + a2 * r.powi(2) + a1 * r + a0) * r;
        assert!(drooped[0].abs() < 1e-12);
        assert!((drooped[1] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_nondroop_inverts_droop() {
        let droop = east();
        for point in [[0.0, 0.0], [-30.0, 20.0], [25.0, -35.0], [5.0, 5.0]] {
            let ideal = droop.to_nondroop(point).unwrap();
            let back = droop.to_droop(ideal);
            assert!((back[0] - point[0]).abs() < 1e-9);
            assert!((back[1] - point[1]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_west_side_mirrors_x() {
        let west = DroopCorrection::new(&DroopConfig::new(21.6), 58.771, -1.0).unwrap();
        let e = east().to_droop([10.0, 5.0]);
        let w = west.to_droop([-10.0, 5.0]);
        assert!((e[0] + w[0]).abs() < 1e-12);
        assert!((e[1] - w[1]).abs() < 1e-12);
    }

    #[test]
    fn test_iteration_cap_reports_convergence_error() {
        let mut config = DroopConfig::new(21.6);
        config.max_iterations = 1;
        let droop = DroopCorrection::new(&config, 58.771, 1.0).unwrap();
        assert!(matches!(
            droop.to_nondroop([-30.0, 20.0]),
            Err(TransformError::Convergence { .. })
        ));
    }

    #[test]
    fn test_negative_feedthru_rejected() {
        assert!(DroopCorrection::new(&DroopConfig::new(-1.0), 58.771, 1.0).is_err());
    }
}

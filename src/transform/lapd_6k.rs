// src/transform/lapd_6k.rs
//! LaPD 6K arm drive.
//!
//! Like the XY drive the shaft swings about the ball valve pivot, but the
//! swing comes from a lever arm fixed to the shaft at the pivot. A link of
//! length `link_length` joins the lever pin to a carriage riding a vertical
//! rail `pivot_to_drive` behind the pivot. For a shaft angle `theta` the
//! carriage height is
//!
//! ```text
//! h(theta) = -a sin(theta) + sqrt(L^2 - (pd - a cos(theta))^2)
//! ```
//!
//! and the drive's vertical axis reads `h(theta) - h(0)`. Going from the
//! drive back to motion space means solving `h(theta) = e1 + h(0)`, which
//! has no closed form and is done with a bracketed root search over
//! `[-max_angle, max_angle]`.

use super::{
    default_axes, default_drive_polarity, default_mspace_polarity, polarity, positive, two_axes,
    xy, Transform, TransformConfig, TransformError,
};
use crate::numeric::RootSolver;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaPD6KConfig {
    #[serde(default = "default_axes")]
    pub axes: Vec<String>,
    pub pivot_to_center: f64,
    /// Horizontal distance from the pivot to the carriage rail.
    pub pivot_to_drive: f64,
    /// Pivot to lever pin.
    pub arm_length: f64,
    /// Lever pin to carriage.
    pub link_length: f64,
    #[serde(default = "default_drive_polarity")]
    pub drive_polarity: [i8; 2],
    #[serde(default = "default_mspace_polarity")]
    pub mspace_polarity: [i8; 2],
    /// Largest shaft swing in degrees, either side of the chamber axis.
    #[serde(default = "default_max_angle")]
    pub max_angle: f64,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

fn default_max_angle() -> f64 { 45.0 }
fn default_tolerance() -> f64 { 1e-12 }
fn default_max_iterations() -> usize { 100 }

impl LaPD6KConfig {
    pub fn new(pivot_to_center: f64, pivot_to_drive: f64, arm_length: f64, link_length: f64) -> Self {
        Self {
            axes: default_axes(),
            pivot_to_center,
            pivot_to_drive,
            arm_length,
            link_length,
            drive_polarity: default_drive_polarity(),
            mspace_polarity: default_mspace_polarity(),
            max_angle: default_max_angle(),
            tolerance: default_tolerance(),
            max_iterations: default_max_iterations(),
        }
    }
}

/// Samples used to check the link geometry over the swing range.
const GEOMETRY_SAMPLES: usize = 64;

#[derive(Debug, Clone)]
pub struct LaPD6KTransform {
    config: LaPD6KConfig,
    drive_polarity: [f64; 2],
    mspace_polarity: [f64; 2],
    max_theta: f64,
    /// Carriage height with the shaft on the chamber axis.
    home_height: f64,
    solver: RootSolver,
}

impl LaPD6KTransform {
    pub fn new(config: &LaPD6KConfig) -> Result<Self, TransformError> {
        two_axes("lapd_6k", &config.axes)?;
        positive("pivot_to_center", config.pivot_to_center)?;
        positive("pivot_to_drive", config.pivot_to_drive)?;
        positive("arm_length", config.arm_length)?;
        positive("link_length", config.link_length)?;
        positive("tolerance", config.tolerance)?;
        if !(config.max_angle > 0.0 && config.max_angle < 90.0) {
            return Err(TransformError::InvalidConfig(format!(
                "'max_angle' must be within (0, 90) degrees, got {}",
                config.max_angle
            )));
        }
        if config.max_iterations == 0 {
            return Err(TransformError::InvalidConfig(
                "'max_iterations' must be at least 1".to_string(),
            ));
        }

        let mut transform = Self {
            config: config.clone(),
            drive_polarity: polarity("drive_polarity", config.drive_polarity)?,
            mspace_polarity: polarity("mspace_polarity", config.mspace_polarity)?,
            max_theta: config.max_angle.to_radians(),
            home_height: 0.0,
            solver: RootSolver::new(config.tolerance, config.max_iterations),
        };
        transform.home_height = transform.carriage_height(0.0).ok_or_else(|| {
            TransformError::InvalidConfig("link cannot reach the rail at zero swing".to_string())
        })?;
        transform.check_geometry()?;
        Ok(transform)
    }

    /// `None` when the link cannot reach the rail at this angle.
    fn carriage_height(&self, theta: f64) -> Option<f64> {
        let a = self.config.arm_length;
        let l = self.config.link_length;
        let reach = self.config.pivot_to_drive - a * theta.cos();
        let span = l * l - reach * reach;
        (span >= 0.0).then(|| -a * theta.sin() + span.sqrt())
    }

    /// The link must reach the rail over the whole swing and the carriage
    /// height must be strictly monotonic so every drive position has one
    /// shaft angle.
    fn check_geometry(&self) -> Result<(), TransformError> {
        let mut previous: Option<f64> = None;
        let mut direction = 0.0;
        for i in 0..=GEOMETRY_SAMPLES {
            let theta = -self.max_theta + 2.0 * self.max_theta * i as f64 / GEOMETRY_SAMPLES as f64;
            let height = self.carriage_height(theta).ok_or_else(|| {
                TransformError::InvalidConfig(format!(
                    "link cannot reach the rail at {:.2} degrees of swing",
                    theta.to_degrees()
                ))
            })?;
            if let Some(prev) = previous {
                let step = (height - prev).signum();
                if step == 0.0 || (direction != 0.0 && step != direction) {
                    return Err(TransformError::InvalidConfig(
                        "carriage height is not monotonic over the swing range".to_string(),
                    ));
                }
                direction = step;
            }
            previous = Some(height);
        }
        Ok(())
    }
}

impl Transform for LaPD6KTransform {
    fn transform_type(&self) -> &'static str {
        "lapd_6k"
    }

    fn axes(&self) -> &[String] {
        &self.config.axes
    }

    fn to_drive(&self, point: &[f64]) -> Result<Vec<f64>, TransformError> {
        let point = xy(point)?;
        let pc = self.config.pivot_to_center;
        let u = self.mspace_polarity[0] * point[0] + pc;
        let v = self.mspace_polarity[1] * point[1];
        if u.is_nan() || u <= 0.0 || !v.is_finite() {
            return Err(TransformError::Domain {
                point: point.to_vec(),
                reason: "point is not in front of the ball valve pivot".to_string(),
            });
        }

        let theta = v.atan2(u);
        if theta.abs() > self.max_theta {
            return Err(TransformError::Domain {
                point: point.to_vec(),
                reason: format!(
                    "shaft angle {:.3} degrees exceeds the {} degree swing",
                    theta.to_degrees(),
                    self.config.max_angle
                ),
            });
        }
        let height = self.carriage_height(theta).ok_or_else(|| TransformError::Domain {
            point: point.to_vec(),
            reason: "link cannot reach the rail".to_string(),
        })?;

        let e0 = u.hypot(v) - pc;
        let e1 = height - self.home_height;
        Ok(vec![
            self.drive_polarity[0] * e0,
            self.drive_polarity[1] * e1,
        ])
    }

    fn to_motion_space(&self, point: &[f64]) -> Result<Vec<f64>, TransformError> {
        let point = xy(point)?;
        let pc = self.config.pivot_to_center;
        let e0 = self.drive_polarity[0] * point[0];
        let e1 = self.drive_polarity[1] * point[1];
        if !e1.is_finite() || !e0.is_finite() || e0 + pc <= 0.0 {
            return Err(TransformError::Domain {
                point: point.to_vec(),
                reason: "drive position puts the probe behind the ball valve pivot".to_string(),
            });
        }

        let target = e1 + self.home_height;
        let theta = self
            .solver
            .solve(
                |theta| self.carriage_height(theta).unwrap_or(f64::NAN) - target,
                -self.max_theta,
                self.max_theta,
            )
            .map_err(|source| TransformError::Convergence {
                point: point.to_vec(),
                source,
            })?;

        let (s, c) = theta.sin_cos();
        let radius = e0 + pc;
        Ok(vec![
            self.mspace_polarity[0] * (radius * c - pc),
            self.mspace_polarity[1] * (radius * s),
        ])
    }

    fn config(&self) -> TransformConfig {
        TransformConfig::LaPD6K(self.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::RootError;

    fn transform() -> LaPD6KTransform {
        LaPD6KTransform::new(&LaPD6KConfig::new(58.771, 25.0, 20.0, 40.0)).unwrap()
    }

    #[test]
    fn test_center_is_drive_home() {
        let drive = transform().to_drive(&[0.0, 0.0]).unwrap();
        assert!(drive[0].abs() < 1e-12);
        assert!(drive[1].abs() < 1e-12);
    }

    #[test]
    fn test_round_trip() {
        let t = transform();
        for point in [[5.0, 5.0], [-20.0, 10.0], [30.0, -25.0], [0.0, 0.0]] {
            let drive = t.to_drive(&point).unwrap();
            let back = t.to_motion_space(&drive).unwrap();
            assert!((back[0] - point[0]).abs() < 1e-9, "{:?} -> {:?}", point, back);
            assert!((back[1] - point[1]).abs() < 1e-9, "{:?} -> {:?}", point, back);
        }
    }

    #[test]
    fn test_swing_limit() {
        let t = transform();
        // 50 degrees of swing
        assert!(matches!(
            t.to_drive(&[58.771 - 50.0 * 50f64.to_radians().cos(), 50.0 * 50f64.to_radians().sin()]),
            Err(TransformError::Domain { .. })
        ));
    }

    #[test]
    fn test_unreachable_drive_reports_convergence_error() {
        let t = transform();
        match t.to_motion_space(&[0.0, 100.0]) {
            Err(TransformError::Convergence { source, .. }) => {
                assert!(matches!(source, RootError::NotBracketed { .. }));
            }
            other => panic!("expected convergence failure, got {:?}", other),
        }
    }

    #[test]
    fn test_iteration_cap() {
        let mut config = LaPD6KConfig::new(58.771, 25.0, 20.0, 40.0);
        config.max_iterations = 1;
        config.tolerance = 1e-15;
        let t = LaPD6KTransform::new(&config).unwrap();
        let drive = transform().to_drive(&[-20.0, 10.0]).unwrap();
        assert!(matches!(
            t.to_motion_space(&drive),
            Err(TransformError::Convergence { .. })
        ));
    }

    #[test]
    fn test_short_link_rejected() {
        assert!(LaPD6KTransform::new(&LaPD6KConfig::new(58.771, 25.0, 20.0, 3.0)).is_err());
        let mut config = LaPD6KConfig::new(58.771, 25.0, 20.0, 40.0);
        config.max_angle = 95.0;
        assert!(LaPD6KTransform::new(&config).is_err());
    }
}

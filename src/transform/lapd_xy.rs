// src/transform/lapd_xy.rs
//! LaPD XY probe drive.
//!
//! The probe shaft passes through a ball valve pivot on the chamber wall.
//! The drive's first axis moves the shaft along itself, the second axis
//! moves the shaft's back end vertically at a distance `pivot_to_drive`
//! behind the pivot, swinging the shaft about the pivot.
//!
//! Conversions use per-point homogeneous matrices:
//!
//! ```text
//! [d0, d1, 1]^T = M_drive(p) . [p0, p1, 1]^T
//! [p0, p1, 1]^T = M_mspace(d) . [d0, d1, 1]^T
//! ```
//!
//! with `M_drive(p) . M_mspace(to_drive(p)) = I`.

use super::droop::{DroopConfig, DroopCorrection};
use super::{
    default_axes, default_drive_polarity, default_mspace_polarity, polarity, positive, two_axes,
    xy, Transform, TransformConfig, TransformError,
};
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaPDXYConfig {
    #[serde(default = "default_axes")]
    pub axes: Vec<String>,
    /// Distance from the ball valve pivot to the chamber center.
    pub pivot_to_center: f64,
    /// Distance from the ball valve pivot to the vertical drive axis.
    pub pivot_to_drive: f64,
    /// Vertical offset of the probe shaft from the drive's vertical axis.
    #[serde(default)]
    pub probe_axis_offset: f64,
    #[serde(default = "default_drive_polarity")]
    pub drive_polarity: [i8; 2],
    #[serde(default = "default_mspace_polarity")]
    pub mspace_polarity: [i8; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub droop_correct: Option<DroopConfig>,
}

impl LaPDXYConfig {
    pub fn new(pivot_to_center: f64, pivot_to_drive: f64) -> Self {
        Self {
            axes: default_axes(),
            pivot_to_center,
            pivot_to_drive,
            probe_axis_offset: 0.0,
            drive_polarity: default_drive_polarity(),
            mspace_polarity: default_mspace_polarity(),
            droop_correct: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LaPDXYTransform {
    axes: Vec<String>,
    pivot_to_center: f64,
    pivot_to_drive: f64,
    probe_axis_offset: f64,
    drive_polarity: [f64; 2],
    mspace_polarity: [f64; 2],
    droop: Option<DroopCorrection>,
}

impl LaPDXYTransform {
    pub fn new(config: &LaPDXYConfig) -> Result<Self, TransformError> {
        let axes = two_axes("lapd_xy", &config.axes)?;
        let pivot_to_center = positive("pivot_to_center", config.pivot_to_center)?;
        let pivot_to_drive = positive("pivot_to_drive", config.pivot_to_drive)?;

        let probe_axis_offset = config.probe_axis_offset;
        if !probe_axis_offset.is_finite() || probe_axis_offset < 0.0 {
            return Err(TransformError::InvalidConfig(format!(
                "'probe_axis_offset' must be a finite non-negative number, got {}",
                probe_axis_offset
            )));
        }
        if probe_axis_offset >= pivot_to_drive {
            return Err(TransformError::InvalidConfig(format!(
                "'probe_axis_offset' ({}) must be smaller than 'pivot_to_drive' ({})",
                probe_axis_offset, pivot_to_drive
            )));
        }

        let drive_polarity = polarity("drive_polarity", config.drive_polarity)?;
        let mspace_polarity = polarity("mspace_polarity", config.mspace_polarity)?;

        // pivot sits at x = -mspace_polarity[0] * pivot_to_center
        let droop = config
            .droop_correct
            .as_ref()
            .map(|d| DroopCorrection::new(d, pivot_to_center, -mspace_polarity[0]))
            .transpose()?;

        Ok(Self {
            axes,
            pivot_to_center,
            pivot_to_drive,
            probe_axis_offset,
            drive_polarity,
            mspace_polarity,
            droop,
        })
    }

    pub fn pivot_to_center(&self) -> f64 {
        self.pivot_to_center
    }

    pub fn pivot_to_drive(&self) -> f64 {
        self.pivot_to_drive
    }

    pub fn probe_axis_offset(&self) -> f64 {
        self.probe_axis_offset
    }

    pub fn droop_correct(&self) -> bool {
        self.droop.is_some()
    }

    fn polarity_matrices(&self) -> (Matrix3<f64>, Matrix3<f64>) {
        let dpol = Matrix3::from_diagonal(&Vector3::new(
            self.drive_polarity[0],
            self.drive_polarity[1],
            1.0,
        ));
        let mpol = Matrix3::from_diagonal(&Vector3::new(
            self.mspace_polarity[0],
            self.mspace_polarity[1],
            1.0,
        ));
        (dpol, mpol)
    }

    /// Vertical drive position for a shaft at angle `theta` about the pivot.
    fn vertical_drive(&self, theta: f64) -> f64 {
        -self.pivot_to_drive * theta.tan() + self.probe_axis_offset * (1.0 - 1.0 / theta.cos())
    }

    /// Matrix taking the (non-drooped) motion point `point` to the drive.
    pub fn matrix_to_drive(&self, point: &[f64]) -> Result<Matrix3<f64>, TransformError> {
        let point = xy(point)?;
        let pc = self.pivot_to_center;
        let u = self.mspace_polarity[0] * point[0] + pc;
        let v = self.mspace_polarity[1] * point[1];
        if u.is_nan() || u <= 0.0 || !v.is_finite() {
            return Err(TransformError::Domain {
                point: point.to_vec(),
                reason: "point is not in front of the ball valve pivot".to_string(),
            });
        }

        let theta = v.atan2(u);
        let (s, c) = theta.sin_cos();
        let e1 = self.vertical_drive(theta);

        let m = Matrix3::new(
            c, s, pc * (c - 1.0),
            -s, c, e1 - pc * s,
            0.0, 0.0, 1.0,
        );
        let (dpol, mpol) = self.polarity_matrices();
        Ok(dpol * m * mpol)
    }

    /// Matrix taking the drive point `point` to (non-drooped) motion space.
    pub fn matrix_to_motion_space(&self, point: &[f64]) -> Result<Matrix3<f64>, TransformError> {
        let point = xy(point)?;
        let pc = self.pivot_to_center;
        let pd = self.pivot_to_drive;
        let off = self.probe_axis_offset;
        let e0 = self.drive_polarity[0] * point[0];
        let e1 = self.drive_polarity[1] * point[1];
        if !e0.is_finite() || !e1.is_finite() {
            return Err(TransformError::Domain {
                point: point.to_vec(),
                reason: "drive coordinates must be finite".to_string(),
            });
        }

        let rise = e1 - off;
        let theta = (rise / -pd).atan() - (off / pd.hypot(rise)).asin();
        let (s, c) = theta.sin_cos();
        if c.is_nan() || c <= 0.0 || e0 + pc <= 0.0 {
            return Err(TransformError::Domain {
                point: point.to_vec(),
                reason: "drive position puts the probe behind the ball valve pivot".to_string(),
            });
        }

        let m = Matrix3::new(
            c, -s, pc * (c - 1.0) + s * e1,
            s, c, pc * s - c * e1,
            0.0, 0.0, 1.0,
        );
        let (dpol, mpol) = self.polarity_matrices();
        Ok(mpol * m * dpol)
    }

    fn apply(matrix: &Matrix3<f64>, point: [f64; 2]) -> Vec<f64> {
        let out = matrix * Vector3::new(point[0], point[1], 1.0);
        vec![out[0], out[1]]
    }
}

impl Transform for LaPDXYTransform {
    fn transform_type(&self) -> &'static str {
        "lapd_xy"
    }

    fn axes(&self) -> &[String] {
        &self.axes
    }

    fn to_drive(&self, point: &[f64]) -> Result<Vec<f64>, TransformError> {
        let mut p = xy(point)?;
        if let Some(droop) = &self.droop {
            p = droop.to_nondroop(p)?;
        }
        let m = self.matrix_to_drive(&p)?;
        Ok(Self::apply(&m, p))
    }

    fn to_motion_space(&self, point: &[f64]) -> Result<Vec<f64>, TransformError> {
        let m = self.matrix_to_motion_space(point)?;
        let p = Self::apply(&m, xy(point)?);
        match &self.droop {
            Some(droop) => Ok(droop.to_droop([p[0], p[1]]).to_vec()),
            None => Ok(p),
        }
    }

    fn config(&self) -> TransformConfig {
        TransformConfig::LaPDXY(LaPDXYConfig {
            axes: self.axes.clone(),
            pivot_to_center: self.pivot_to_center,
            pivot_to_drive: self.pivot_to_drive,
            probe_axis_offset: self.probe_axis_offset,
            drive_polarity: self.drive_polarity.map(|p| p as i8),
            mspace_polarity: self.mspace_polarity.map(|p| p as i8),
            droop_correct: self.droop.as_ref().map(DroopCorrection::config),
        })
    }
}

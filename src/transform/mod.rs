// src/transform/mod.rs
//! Coordinate transforms between motion space and drive space.
//!
//! Every transform is a pure function of its configuration and the input
//! point. Batches are converted point by point; [`Transform::convert`]
//! fails the whole batch on the first bad point while
//! [`Transform::convert_each`] reports one result per point.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [transform]
//! type = "lapd_xy"
//! axes = ["x", "y"]
//! pivot_to_center = 57.288
//! pivot_to_drive = 134.0
//! probe_axis_offset = 20.16
//!
//! [transform.droop_correct]
//! pivot_to_feedthru = 21.6
//! ```

pub mod droop;
pub mod identity;
pub mod lapd_6k;
pub mod lapd_xy;

pub use droop::{DroopConfig, DroopCorrection};
pub use identity::{IdentityConfig, IdentityTransform};
pub use lapd_6k::{LaPD6KConfig, LaPD6KTransform};
pub use lapd_xy::{LaPDXYConfig, LaPDXYTransform};

use crate::numeric::RootError;
use crate::points::{Points, ShapeError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransformError {
    #[error("Invalid transform configuration: {0}")]
    InvalidConfig(String),
    #[error("Point {point:?} is outside the transform domain: {reason}")]
    Domain { point: Vec<f64>, reason: String },
    #[error("Point {point:?} did not converge: {source}")]
    Convergence {
        point: Vec<f64>,
        #[source]
        source: RootError,
    },
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error("Point {index} of the batch failed: {source}")]
    Batch {
        index: usize,
        #[source]
        source: Box<TransformError>,
    },
}

/// Which way a conversion goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    ToDrive,
    ToMotionSpace,
}

/// Serialized transform, keyed on `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TransformConfig {
    #[serde(rename = "identity")]
    Identity(IdentityConfig),
    #[serde(rename = "lapd_xy")]
    LaPDXY(LaPDXYConfig),
    #[serde(rename = "lapd_6k")]
    LaPD6K(LaPD6KConfig),
}

impl TransformConfig {
    pub fn transform_type(&self) -> &'static str {
        match self {
            TransformConfig::Identity(_) => "identity",
            TransformConfig::LaPDXY(_) => "lapd_xy",
            TransformConfig::LaPD6K(_) => "lapd_6k",
        }
    }
}

/// Bidirectional mapping between motion space and drive space.
pub trait Transform: std::fmt::Debug + Send + Sync {
    fn transform_type(&self) -> &'static str;

    /// Drive axis names, in point order.
    fn axes(&self) -> &[String];

    fn ndims(&self) -> usize {
        self.axes().len()
    }

    /// Motion-space point to drive coordinates.
    fn to_drive(&self, point: &[f64]) -> Result<Vec<f64>, TransformError>;

    /// Drive coordinates to a motion-space point.
    fn to_motion_space(&self, point: &[f64]) -> Result<Vec<f64>, TransformError>;

    /// Concrete configuration that rebuilds this transform.
    fn config(&self) -> TransformConfig;

    fn convert_point(
        &self,
        point: &[f64],
        direction: Direction,
    ) -> Result<Vec<f64>, TransformError> {
        if point.len() != self.ndims() {
            return Err(ShapeError::Dimension {
                expected: self.ndims(),
                found: point.len(),
            }
            .into());
        }
        match direction {
            Direction::ToDrive => self.to_drive(point),
            Direction::ToMotionSpace => self.to_motion_space(point),
        }
    }

    /// Convert one point or a batch; the output mirrors the input shape.
    fn convert(&self, points: &Points, direction: Direction) -> Result<Points, TransformError> {
        points.check_ndims(self.ndims())?;
        let mut data = Vec::with_capacity(points.data().len());
        for (index, point) in points.iter().enumerate() {
            match self.convert_point(point, direction) {
                Ok(converted) => data.extend(converted),
                Err(err) if points.is_single() => return Err(err),
                Err(err) => {
                    return Err(TransformError::Batch {
                        index,
                        source: Box::new(err),
                    });
                }
            }
        }
        Ok(points.with_data(data)?)
    }

    /// Convert every point independently, keeping per-point failures.
    fn convert_each(
        &self,
        points: &Points,
        direction: Direction,
    ) -> Result<Vec<Result<Vec<f64>, TransformError>>, TransformError> {
        points.check_ndims(self.ndims())?;
        Ok(points
            .iter()
            .map(|point| self.convert_point(point, direction))
            .collect())
    }
}

/// Factory for creating transforms from their configuration.
pub fn create_transform(config: &TransformConfig) -> Result<Box<dyn Transform>, TransformError> {
    let transform: Box<dyn Transform> = match config {
        TransformConfig::Identity(c) => Box::new(IdentityTransform::new(c)?),
        TransformConfig::LaPDXY(c) => Box::new(LaPDXYTransform::new(c)?),
        TransformConfig::LaPD6K(c) => Box::new(LaPD6KTransform::new(c)?),
    };
    tracing::debug!(
        "Created '{}' transform over axes {:?}",
        transform.transform_type(),
        transform.axes()
    );
    Ok(transform)
}

pub(crate) fn default_axes() -> Vec<String> {
    vec!["x".to_string(), "y".to_string()]
}

fn default_drive_polarity() -> [i8; 2] {
    [1, 1]
}

fn default_mspace_polarity() -> [i8; 2] {
    [-1, 1]
}

/// Validate a `[±1, ±1]` polarity pair and widen it for arithmetic.
fn polarity(name: &str, values: [i8; 2]) -> Result<[f64; 2], TransformError> {
    if values.iter().any(|&v| !matches!(v, 1 | -1)) {
        return Err(TransformError::InvalidConfig(format!(
            "'{}' entries must be +1 or -1, got {:?}",
            name, values
        )));
    }
    Ok([f64::from(values[0]), f64::from(values[1])])
}

fn positive(name: &str, value: f64) -> Result<f64, TransformError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(TransformError::InvalidConfig(format!(
            "'{}' must be a positive finite number, got {}",
            name, value
        )));
    }
    Ok(value)
}

fn xy(point: &[f64]) -> Result<[f64; 2], TransformError> {
    match point {
        [x, y] => Ok([*x, *y]),
        _ => Err(ShapeError::Dimension {
            expected: 2,
            found: point.len(),
        }
        .into()),
    }
}

fn two_axes(transform_type: &str, axes: &[String]) -> Result<Vec<String>, TransformError> {
    if axes.len() != 2 {
        return Err(TransformError::InvalidConfig(format!(
            "'{}' transform needs exactly 2 axes, got {:?}",
            transform_type, axes
        )));
    }
    unique_axes(axes)
}

fn unique_axes(axes: &[String]) -> Result<Vec<String>, TransformError> {
    if axes.is_empty() {
        return Err(TransformError::InvalidConfig("no axes given".to_string()));
    }
    for (i, axis) in axes.iter().enumerate() {
        if axes[..i].contains(axis) {
            return Err(TransformError::InvalidConfig(format!(
                "duplicate axis name '{}'",
                axis
            )));
        }
    }
    Ok(axes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lapd_config() -> TransformConfig {
        TransformConfig::LaPDXY(LaPDXYConfig::new(57.288, 134.0))
    }

    #[test]
    fn test_factory_builds_each_type() {
        let identity = create_transform(&TransformConfig::Identity(IdentityConfig::default())).unwrap();
        assert_eq!(identity.transform_type(), "identity");

        let lapd = create_transform(&lapd_config()).unwrap();
        assert_eq!(lapd.transform_type(), "lapd_xy");
        assert_eq!(lapd.config(), lapd_config());
    }

    #[test]
    fn test_convert_mirrors_shape() {
        let t = create_transform(&lapd_config()).unwrap();
        let batch = Points::from_rows(&[vec![5.0, 5.0], vec![-10.0, 0.0], vec![0.0, 20.0]], 2).unwrap();
        let drive = t.convert(&batch, Direction::ToDrive).unwrap();
        assert_eq!(drive.shape(), batch.shape());

        let single = Points::single(&[5.0, 5.0]).unwrap();
        let drive_single = t.convert(&single, Direction::ToDrive).unwrap();
        assert_eq!(drive_single.shape(), &[2]);
        assert_eq!(drive_single.data(), drive.point(0).unwrap());
    }

    #[test]
    fn test_batch_failure_reports_index() {
        let t = create_transform(&lapd_config()).unwrap();
        // second point sits behind the pivot
        let batch = Points::from_rows(&[vec![0.0, 0.0], vec![100.0, 0.0], vec![1.0, 1.0]], 2).unwrap();
        match t.convert(&batch, Direction::ToDrive) {
            Err(TransformError::Batch { index, source }) => {
                assert_eq!(index, 1);
                assert!(matches!(*source, TransformError::Domain { .. }));
            }
            other => panic!("expected batch failure, got {:?}", other),
        }

        let each = t.convert_each(&batch, Direction::ToDrive).unwrap();
        assert!(each[0].is_ok());
        assert!(each[1].is_err());
        assert!(each[2].is_ok());
    }

    #[test]
    fn test_shape_error() {
        let t = create_transform(&lapd_config()).unwrap();
        let bad = Points::from_rows(&[vec![1.0, 2.0, 3.0]], 3).unwrap();
        assert!(matches!(
            t.convert(&bad, Direction::ToDrive),
            Err(TransformError::Shape(ShapeError::Dimension { expected: 2, found: 3 }))
        ));
    }

    #[test]
    fn test_polarity_validation() {
        assert!(polarity("drive_polarity", [1, -1]).is_ok());
        assert!(polarity("drive_polarity", [0, 1]).is_err());
        assert!(polarity("drive_polarity", [2, 1]).is_err());
    }
}

// src/space.rs
//! Discretized motion space.
//!
//! The grid is the product of per-axis `linspace(min, max, num)` arrays in
//! "ij" order: the first axis varies slowest.

use crate::mask::Mask;
use crate::points::{Points, ShapeError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpaceError {
    #[error("Motion space needs at least one axis")]
    NoAxes,
    #[error("Duplicate axis label '{0}'")]
    DuplicateLabel(String),
    #[error("Axis '{0}' has an empty label")]
    EmptyLabel(String),
    #[error("Axis '{label}' range [{min}, {max}] must be finite")]
    NonFinite { label: String, min: f64, max: f64 },
    #[error("Axis '{label}' needs at least one point")]
    NoPoints { label: String },
    #[error("Axis '{label}' range [{min}, {max}] must satisfy min < max")]
    InvalidRange { label: String, min: f64, max: f64 },
    #[error("Axis '{label}' has a zero-length range and {num} points")]
    DegenerateRange { label: String, num: usize },
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

/// Serialized axis definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    pub label: String,
    pub range: [f64; 2],
    pub num: usize,
}

impl AxisConfig {
    pub fn new(label: &str, range: [f64; 2], num: usize) -> Self {
        Self {
            label: label.to_string(),
            range,
            num,
        }
    }
}

/// `num` evenly spaced values over the closed interval `[start, stop]`.
///
/// The last value is pinned to `stop` so every consumer that builds the same
/// axis gets bit-identical coordinates.
pub fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            let mut values: Vec<f64> = (0..num).map(|i| start + i as f64 * step).collect();
            values[num - 1] = stop;
            values
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    label: String,
    min: f64,
    max: f64,
    coords: Vec<f64>,
}

impl Axis {
    fn from_config(config: &AxisConfig) -> Result<Self, SpaceError> {
        let label = config.label.trim();
        if label.is_empty() {
            return Err(SpaceError::EmptyLabel(config.label.clone()));
        }
        let [min, max] = config.range;
        if !min.is_finite() || !max.is_finite() {
            return Err(SpaceError::NonFinite {
                label: label.to_string(),
                min,
                max,
            });
        }
        if config.num == 0 {
            return Err(SpaceError::NoPoints {
                label: label.to_string(),
            });
        }
        if min > max {
            return Err(SpaceError::InvalidRange {
                label: label.to_string(),
                min,
                max,
            });
        }
        if min == max && config.num > 1 {
            return Err(SpaceError::DegenerateRange {
                label: label.to_string(),
                num: config.num,
            });
        }

        Ok(Self {
            label: label.to_string(),
            min,
            max,
            coords: linspace(min, max, config.num),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn range(&self) -> [f64; 2] {
        [self.min, self.max]
    }

    pub fn num(&self) -> usize {
        self.coords.len()
    }

    pub fn coords(&self) -> &[f64] {
        &self.coords
    }

    /// Grid spacing, zero for a single-point axis.
    pub fn step(&self) -> f64 {
        match self.coords.len() {
            0 | 1 => 0.0,
            n => (self.max - self.min) / (n - 1) as f64,
        }
    }

    /// Index of the nearest coordinate. Values beyond the range snap to the
    /// edge; `None` only for a non-finite value.
    pub fn nearest_index(&self, value: f64) -> Option<usize> {
        if !value.is_finite() {
            return None;
        }
        let step = self.step();
        if step == 0.0 {
            return Some(0);
        }
        let raw = ((value - self.min) / step).round();
        Some((raw.max(0.0) as usize).min(self.coords.len() - 1))
    }

    pub fn config(&self) -> AxisConfig {
        AxisConfig::new(&self.label, [self.min, self.max], self.coords.len())
    }
}

/// The rectilinear motion-space grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Space {
    axes: Vec<Axis>,
}

impl Space {
    pub fn new(configs: &[AxisConfig]) -> Result<Self, SpaceError> {
        if configs.is_empty() {
            return Err(SpaceError::NoAxes);
        }
        let mut axes: Vec<Axis> = Vec::with_capacity(configs.len());
        for config in configs {
            let axis = Axis::from_config(config)?;
            if axes.iter().any(|a| a.label == axis.label) {
                return Err(SpaceError::DuplicateLabel(axis.label));
            }
            axes.push(axis);
        }
        Ok(Self { axes })
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn ndims(&self) -> usize {
        self.axes.len()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.axes.iter().map(Axis::label).collect()
    }

    pub fn shape(&self) -> Vec<usize> {
        self.axes.iter().map(Axis::num).collect()
    }

    /// Total number of grid cells.
    pub fn size(&self) -> usize {
        self.axes.iter().map(Axis::num).product()
    }

    /// Multi-index of a flat row-major index.
    pub fn unravel(&self, mut flat: usize) -> Vec<usize> {
        let mut index = vec![0; self.axes.len()];
        for (slot, axis) in index.iter_mut().zip(&self.axes).rev() {
            *slot = flat % axis.num();
            flat /= axis.num();
        }
        index
    }

    pub fn grid_point(&self, flat: usize) -> Vec<f64> {
        self.unravel(flat)
            .into_iter()
            .zip(&self.axes)
            .map(|(i, axis)| axis.coords[i])
            .collect()
    }

    /// Every grid point, shape `[n0, ..., nk, N]`.
    pub fn grid_points(&self) -> Points {
        let n = self.ndims();
        let mut data = Vec::with_capacity(self.size() * n);
        for flat in 0..self.size() {
            data.extend(self.grid_point(flat));
        }
        let mut shape = self.shape();
        shape.push(n);
        Points::from_grid(data, shape)
    }

    /// Mask whose cells hold `allowed(grid_point)`.
    pub fn mask_where<F>(&self, allowed: F) -> Mask
    where
        F: Fn(&[f64]) -> bool,
    {
        let grid = self.grid_points();
        Mask::from_raw(self.shape(), grid.iter().map(allowed).collect())
    }

    /// Flat index of the grid cell nearest `point`.
    ///
    /// Points outside the range snap to the edge cell. `Ok(None)` means a
    /// coordinate is not finite.
    pub fn nearest_index(&self, point: &[f64]) -> Result<Option<usize>, SpaceError> {
        if point.len() != self.ndims() {
            return Err(ShapeError::Dimension {
                expected: self.ndims(),
                found: point.len(),
            }
            .into());
        }
        let mut flat = 0;
        for (value, axis) in point.iter().zip(&self.axes) {
            match axis.nearest_index(*value) {
                Some(i) => flat = flat * axis.num() + i,
                None => return Ok(None),
            }
        }
        Ok(Some(flat))
    }

    pub fn config(&self) -> Vec<AxisConfig> {
        self.axes.iter().map(Axis::config).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xy_space() -> Space {
        Space::new(&[
            AxisConfig::new("x", [-55.0, 55.0], 221),
            AxisConfig::new("y", [-55.0, 55.0], 221),
        ])
        .unwrap()
    }

    #[test]
    fn test_linspace_endpoints() {
        let values = linspace(-55.0, 55.0, 221);
        assert_eq!(values.len(), 221);
        assert_eq!(values[0], -55.0);
        assert_eq!(values[220], 55.0);
        assert!((values[110]).abs() < 1e-12);
        assert_eq!(linspace(3.0, 3.0, 1), vec![3.0]);
    }

    #[test]
    fn test_space_shape_and_order() {
        let space = xy_space();
        assert_eq!(space.shape(), vec![221, 221]);
        assert_eq!(space.size(), 221 * 221);
        // first axis slowest
        assert_eq!(space.grid_point(1), vec![-55.0, -54.5]);
        assert_eq!(space.grid_point(221), vec![-54.5, -55.0]);
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let err = Space::new(&[
            AxisConfig::new("x", [0.0, 1.0], 2),
            AxisConfig::new("x", [0.0, 1.0], 2),
        ])
        .unwrap_err();
        assert_eq!(err, SpaceError::DuplicateLabel("x".to_string()));
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(matches!(
            Space::new(&[AxisConfig::new("x", [1.0, 0.0], 3)]),
            Err(SpaceError::InvalidRange { .. })
        ));
        assert!(matches!(
            Space::new(&[AxisConfig::new("x", [1.0, 1.0], 3)]),
            Err(SpaceError::DegenerateRange { .. })
        ));
        assert!(matches!(
            Space::new(&[AxisConfig::new("x", [0.0, f64::INFINITY], 3)]),
            Err(SpaceError::NonFinite { .. })
        ));
        assert!(Space::new(&[AxisConfig::new("x", [1.0, 1.0], 1)]).is_ok());
        assert_eq!(Space::new(&[]), Err(SpaceError::NoAxes));
    }

    #[test]
    fn test_nearest_index() {
        let space = xy_space();
        assert_eq!(space.nearest_index(&[-55.0, -55.0]).unwrap(), Some(0));
        assert_eq!(space.nearest_index(&[-54.9, -54.6]).unwrap(), Some(1));
        assert_eq!(space.nearest_index(&[55.2, 0.0]).unwrap(), Some(220 * 221 + 110));
        assert_eq!(space.nearest_index(&[56.0, 0.0]).unwrap(), Some(220 * 221 + 110));
        assert_eq!(space.nearest_index(&[-300.0, 300.0]).unwrap(), Some(220));
        assert_eq!(space.nearest_index(&[f64::NAN, 0.0]).unwrap(), None);
        assert_eq!(space.nearest_index(&[0.0, f64::INFINITY]).unwrap(), None);
        assert!(space.nearest_index(&[0.0]).is_err());
    }
}

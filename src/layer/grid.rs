// src/layer/grid.rs
use super::{Layer, LayerConfig, LayerError, PerAxis};
use crate::points::Points;
use crate::space::{linspace, Space};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridLayerConfig {
    /// One `[min, max]` pair for every axis, or one pair per axis.
    pub limits: PerAxis<[f64; 2]>,
    #[serde(alias = "steps")]
    pub npoints: PerAxis<usize>,
}

impl GridLayerConfig {
    pub fn new(limits: PerAxis<[f64; 2]>, npoints: PerAxis<usize>) -> Self {
        Self { limits, npoints }
    }
}

/// Evenly spaced rectilinear sub-grid, limits inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayer {
    limits: Vec<[f64; 2]>,
    npoints: Vec<usize>,
    points: Points,
}

impl GridLayer {
    pub fn new(config: &GridLayerConfig, space: &Space) -> Result<Self, LayerError> {
        let ndims = space.ndims();
        let limits = config.limits.broadcast("grid", "limits", ndims)?;
        let npoints = config.npoints.broadcast("grid", "npoints", ndims)?;
        Self::from_parts("grid", limits, npoints)
    }

    fn from_parts(
        layer: &'static str,
        limits: Vec<[f64; 2]>,
        mut npoints: Vec<usize>,
    ) -> Result<Self, LayerError> {
        for (axis, (lims, num)) in limits.iter().zip(npoints.iter_mut()).enumerate() {
            if lims.iter().any(|v| !v.is_finite()) {
                return Err(LayerError::InvalidConfig {
                    layer,
                    reason: format!("limits {:?} on axis {} must be finite", lims, axis),
                });
            }
            if *num == 0 {
                return Err(LayerError::InvalidConfig {
                    layer,
                    reason: format!("axis {} needs at least one point", axis),
                });
            }
            if lims[0] == lims[1] {
                *num = 1;
            }
        }

        let coords: Vec<Vec<f64>> = limits
            .iter()
            .zip(&npoints)
            .map(|(lims, &num)| linspace(lims[0], lims[1], num))
            .collect();
        let points = mesh(&coords);

        Ok(Self {
            limits,
            npoints,
            points,
        })
    }

    pub fn limits(&self) -> &[[f64; 2]] {
        &self.limits
    }

    pub fn npoints(&self) -> &[usize] {
        &self.npoints
    }
}

/// Cartesian product of per-axis coordinates, first axis slowest.
fn mesh(coords: &[Vec<f64>]) -> Points {
    let ndims = coords.len();
    let total: usize = coords.iter().map(Vec::len).product();
    let mut data = Vec::with_capacity(total * ndims);
    let mut index = vec![0usize; ndims];
    for _ in 0..total {
        data.extend(index.iter().zip(coords).map(|(&i, c)| c[i]));
        for (slot, c) in index.iter_mut().zip(coords).rev() {
            *slot += 1;
            if *slot < c.len() {
                break;
            }
            *slot = 0;
        }
    }
    let mut shape: Vec<usize> = coords.iter().map(Vec::len).collect();
    shape.push(ndims);
    Points::from_grid(data, shape)
}

impl Layer for GridLayer {
    fn layer_type(&self) -> &'static str {
        "grid"
    }

    fn points(&self) -> &Points {
        &self.points
    }

    fn config(&self) -> LayerConfig {
        LayerConfig::Grid(GridLayerConfig {
            limits: PerAxis::Each(self.limits.clone()),
            npoints: PerAxis::Each(self.npoints.clone()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCNStepConfig {
    pub center: PerAxis<f64>,
    #[serde(alias = "steps")]
    pub npoints: PerAxis<usize>,
    pub step_size: PerAxis<f64>,
}

impl GridCNStepConfig {
    pub fn new(center: PerAxis<f64>, npoints: PerAxis<usize>, step_size: PerAxis<f64>) -> Self {
        Self {
            center,
            npoints,
            step_size,
        }
    }
}

/// A grid described by its center, point count and spacing.
///
/// Limits are `center ± 0.5 * (npoints - 1) * step_size` per axis.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCNStepLayer {
    center: Vec<f64>,
    step_size: Vec<f64>,
    grid: GridLayer,
}

impl GridCNStepLayer {
    pub fn new(config: &GridCNStepConfig, space: &Space) -> Result<Self, LayerError> {
        let ndims = space.ndims();
        let center = config.center.broadcast("grid_cnstep", "center", ndims)?;
        let npoints = config.npoints.broadcast("grid_cnstep", "npoints", ndims)?;
        let step_size = config.step_size.broadcast("grid_cnstep", "step_size", ndims)?;

        if let Some(bad) = step_size.iter().find(|s| !s.is_finite() || **s < 0.0) {
            return Err(LayerError::InvalidConfig {
                layer: "grid_cnstep",
                reason: format!("step_size must be finite and non-negative, got {}", bad),
            });
        }

        let limits = center
            .iter()
            .zip(&npoints)
            .zip(&step_size)
            .map(|((&c, &n), &step)| {
                let half = 0.5 * n.saturating_sub(1) as f64 * step;
                [c - half, c + half]
            })
            .collect();
        let grid = GridLayer::from_parts("grid_cnstep", limits, npoints)?;

        Ok(Self {
            center,
            step_size,
            grid,
        })
    }

    pub fn limits(&self) -> &[[f64; 2]] {
        self.grid.limits()
    }
}

impl Layer for GridCNStepLayer {
    fn layer_type(&self) -> &'static str {
        "grid_cnstep"
    }

    fn points(&self) -> &Points {
        self.grid.points()
    }

    fn config(&self) -> LayerConfig {
        LayerConfig::GridCNStep(GridCNStepConfig {
            center: PerAxis::Each(self.center.clone()),
            npoints: PerAxis::Each(self.grid.npoints().to_vec()),
            step_size: PerAxis::Each(self.step_size.clone()),
        })
    }
}

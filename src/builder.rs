// src/builder.rs
//! Motion builder.
//!
//! Builds the motion space, folds every exclusion into the mask in
//! configuration order and reduces the layers to the motion list. The
//! builder is immutable once constructed; a different configuration means a
//! new builder.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [motion_builder]
//! space = "lapd_xy"
//!
//! [[motion_builder.layers]]
//! type = "grid"
//! limits = [-30.0, 30.0]
//! npoints = 13
//! ```
//!
//! or with explicit axes:
//!
//! ```toml
//! [[motion_builder.space]]
//! label = "x"
//! range = [-55.0, 55.0]
//! num = 221
//!
//! [[motion_builder.space]]
//! label = "y"
//! range = [-55.0, 55.0]
//! num = 221
//! ```

use crate::exclusion::{create_exclusion, Exclusion, ExclusionConfig, ExclusionError, LaPDXYExclusionConfig};
use crate::layer::{create_layer, Layer, LayerConfig, LayerError};
use crate::mask::Mask;
use crate::points::{Points, ShapeError};
use crate::space::{AxisConfig, Space, SpaceError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the LaPD XY probe-drive preset.
pub const LAPD_XY_PRESET: &str = "lapd_xy";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MotionBuilderError {
    #[error("Unknown motion space preset '{0}'")]
    UnknownPreset(String),
    #[error("Only one governing exclusion is allowed, found '{first}' and '{second}'")]
    MultipleGoverning {
        first: &'static str,
        second: &'static str,
    },
    #[error("Governing exclusion '{exclusion}' must be the first exclusion, found at position {index}")]
    GoverningNotFirst { exclusion: &'static str, index: usize },
    #[error("Space error: {0}")]
    Space(#[from] SpaceError),
    #[error("Exclusion error: {0}")]
    Exclusion(#[from] ExclusionError),
    #[error("Layer error: {0}")]
    Layer(#[from] LayerError),
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

/// Either a named preset or explicit axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpaceConfig {
    Preset(String),
    Axes(Vec<AxisConfig>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionBuilderConfig {
    pub space: SpaceConfig,
    #[serde(default)]
    pub exclusions: Vec<ExclusionConfig>,
    #[serde(default)]
    pub layers: Vec<LayerConfig>,
}

impl MotionBuilderConfig {
    pub fn new(space: SpaceConfig) -> Self {
        Self {
            space,
            exclusions: Vec::new(),
            layers: Vec::new(),
        }
    }

    /// The LaPD XY preset with no layers.
    pub fn lapd_xy() -> Self {
        Self::new(SpaceConfig::Preset(LAPD_XY_PRESET.to_string()))
    }

    pub fn with_exclusion(mut self, exclusion: ExclusionConfig) -> Self {
        self.exclusions.push(exclusion);
        self
    }

    pub fn with_layer(mut self, layer: LayerConfig) -> Self {
        self.layers.push(layer);
        self
    }

    /// Expand a preset into explicit axes and its implied exclusions.
    ///
    /// The `lapd_xy` preset prepends a default `lapd_xy` exclusion unless the
    /// list already carries one.
    pub fn resolve(&self) -> Result<(Vec<AxisConfig>, Vec<ExclusionConfig>), MotionBuilderError> {
        match &self.space {
            SpaceConfig::Axes(axes) => Ok((axes.clone(), self.exclusions.clone())),
            SpaceConfig::Preset(name) if name.eq_ignore_ascii_case(LAPD_XY_PRESET) => {
                let axes = vec![
                    AxisConfig::new("x", [-55.0, 55.0], 221),
                    AxisConfig::new("y", [-55.0, 55.0], 221),
                ];
                let mut exclusions = self.exclusions.clone();
                if !exclusions.iter().any(|e| matches!(e, ExclusionConfig::LaPDXY(_))) {
                    exclusions.insert(0, ExclusionConfig::LaPDXY(LaPDXYExclusionConfig::default()));
                }
                Ok((axes, exclusions))
            }
            SpaceConfig::Preset(name) => Err(MotionBuilderError::UnknownPreset(name.clone())),
        }
    }
}

#[derive(Debug)]
pub struct MotionBuilder {
    space: Space,
    exclusions: Vec<Box<dyn Exclusion>>,
    layers: Vec<Box<dyn Layer>>,
    mask: Mask,
    motion_list: Points,
    dropped: usize,
}

impl MotionBuilder {
    pub fn new(config: &MotionBuilderConfig) -> Result<Self, MotionBuilderError> {
        let (axes, exclusion_configs) = config.resolve()?;
        let space = Space::new(&axes)?;

        let exclusions = exclusion_configs
            .iter()
            .map(|c| create_exclusion(c, &space))
            .collect::<Result<Vec<_>, _>>()?;
        check_topology(&exclusions)?;

        let mut mask = Mask::allowed(&space.shape());
        for exclusion in &exclusions {
            exclusion.update_mask(&space, &mut mask)?;
        }

        let layers = config
            .layers
            .iter()
            .map(|c| create_layer(c, &space))
            .collect::<Result<Vec<_>, _>>()?;

        let (motion_list, dropped) = reduce_layers(&space, &mask, &layers)?;
        if dropped > 0 {
            tracing::warn!(
                "Dropped {} candidate points with non-finite coordinates",
                dropped
            );
        }

        tracing::info!(
            "Motion builder ready: {:?} grid, {} of {} cells allowed, {} exclusions, {} layers, {} motion points",
            space.shape(),
            mask.allowed_count(),
            mask.len(),
            exclusions.len(),
            layers.len(),
            motion_list.len()
        );

        Ok(Self {
            space,
            exclusions,
            layers,
            mask,
            motion_list,
            dropped,
        })
    }

    pub fn space(&self) -> &Space {
        &self.space
    }

    pub fn exclusions(&self) -> &[Box<dyn Exclusion>] {
        &self.exclusions
    }

    pub fn layers(&self) -> &[Box<dyn Layer>] {
        &self.layers
    }

    /// Allowed cells of the motion-space grid.
    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    /// Layer points that land on allowed cells, in layer then generation
    /// order. Shape `[M, N]`.
    pub fn motion_list(&self) -> &Points {
        &self.motion_list
    }

    /// Total number of points generated by the layers.
    pub fn candidate_count(&self) -> usize {
        self.layers.iter().map(|l| l.points().len()).sum()
    }

    /// Candidates dropped for having a non-finite coordinate.
    pub fn dropped_count(&self) -> usize {
        self.dropped
    }

    /// Whether any exclusion rejects `point`, evaluated off the grid.
    pub fn is_excluded(&self, point: &[f64]) -> Result<bool, MotionBuilderError> {
        if point.len() != self.space.ndims() {
            return Err(ShapeError::Dimension {
                expected: self.space.ndims(),
                found: point.len(),
            }
            .into());
        }
        Ok(self.exclusions.iter().any(|e| e.is_excluded(point)))
    }

    /// Concrete configuration with presets expanded.
    pub fn config(&self) -> MotionBuilderConfig {
        MotionBuilderConfig {
            space: SpaceConfig::Axes(self.space.config()),
            exclusions: self.exclusions.iter().map(|e| e.config()).collect(),
            layers: self.layers.iter().map(|l| l.config()).collect(),
        }
    }
}

fn check_topology(exclusions: &[Box<dyn Exclusion>]) -> Result<(), MotionBuilderError> {
    let mut governing: Option<&'static str> = None;
    for (index, exclusion) in exclusions.iter().enumerate() {
        if !exclusion.governs() {
            continue;
        }
        if let Some(first) = governing {
            return Err(MotionBuilderError::MultipleGoverning {
                first,
                second: exclusion.exclusion_type(),
            });
        }
        if index != 0 {
            return Err(MotionBuilderError::GoverningNotFirst {
                exclusion: exclusion.exclusion_type(),
                index,
            });
        }
        governing = Some(exclusion.exclusion_type());
    }
    Ok(())
}

fn reduce_layers(
    space: &Space,
    mask: &Mask,
    layers: &[Box<dyn Layer>],
) -> Result<(Points, usize), MotionBuilderError> {
    let ndims = space.ndims();
    let mut data = Vec::new();
    let mut dropped = 0;
    for layer in layers {
        let mut kept = 0;
        for point in layer.points().iter() {
            match space.nearest_index(point)? {
                Some(flat) if mask.get(flat) == Some(true) => {
                    data.extend_from_slice(point);
                    kept += 1;
                }
                Some(_) => {}
                None => dropped += 1,
            }
        }
        tracing::debug!(
            "Layer '{}' kept {} of {} points",
            layer.layer_type(),
            kept,
            layer.points().len()
        );
    }
    let count = data.len() / ndims;
    Ok((Points::new(data, vec![count, ndims])?, dropped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exclusion::{CircularExclusionConfig, DividerExclusionConfig, DividerSide};
    use crate::layer::{GridLayerConfig, PerAxis, PointListConfig};

    fn axes() -> SpaceConfig {
        SpaceConfig::Axes(vec![
            AxisConfig::new("x", [-10.0, 10.0], 21),
            AxisConfig::new("y", [-10.0, 10.0], 21),
        ])
    }

    #[test]
    fn test_no_exclusions_keeps_everything() {
        let config = MotionBuilderConfig::new(axes()).with_layer(LayerConfig::Grid(GridLayerConfig::new(
            PerAxis::All([-10.0, 10.0]),
            PerAxis::All(21),
        )));
        let mb = MotionBuilder::new(&config).unwrap();
        assert_eq!(mb.mask().allowed_count(), 441);
        assert_eq!(mb.motion_list().len(), 441);
        assert_eq!(mb.motion_list().shape(), &[441, 2]);
    }

    #[test]
    fn test_mask_is_and_of_exclusions() {
        let config = MotionBuilderConfig::new(axes())
            .with_exclusion(ExclusionConfig::Circle(CircularExclusionConfig::new(8.0)))
            .with_exclusion(ExclusionConfig::Divider(DividerExclusionConfig::new(
                [0.0, 2.0],
                DividerSide::PlusE1,
            )));
        let mb = MotionBuilder::new(&config).unwrap();
        for flat in 0..mb.space().size() {
            let p = mb.space().grid_point(flat);
            let allowed = p[0] * p[0] + p[1] * p[1] <= 64.0 && p[1] <= 2.0;
            assert_eq!(mb.mask().get(flat), Some(allowed), "{:?}", p);
            assert_eq!(mb.is_excluded(&p).unwrap(), !allowed);
        }
    }

    #[test]
    fn test_motion_list_order_and_filtering() {
        let points = vec![
            vec![9.0, 9.0],
            vec![1.0, 0.0],
            vec![0.0, 30.0],
            vec![-2.0, 1.2],
            vec![10.4, 0.0],
        ];
        let config = MotionBuilderConfig::new(axes())
            .with_exclusion(ExclusionConfig::Circle(CircularExclusionConfig::new(8.0)))
            .with_layer(LayerConfig::PointList(PointListConfig::new(points)));
        let mb = MotionBuilder::new(&config).unwrap();
        // (0, 30) and (10.4, 0) snap to the masked-out edge cells (0, 10) and (10, 0)
        assert_eq!(mb.motion_list().to_rows(), vec![vec![1.0, 0.0], vec![-2.0, 1.2]]);
        assert_eq!(mb.candidate_count(), 5);
        assert_eq!(mb.dropped_count(), 0);
    }

    #[test]
    fn test_out_of_range_points_use_edge_cell() {
        let points = vec![vec![30.0, 0.0], vec![0.0, 0.0], vec![-12.0, -40.0]];
        let config = MotionBuilderConfig::new(axes())
            .with_layer(LayerConfig::PointList(PointListConfig::new(points.clone())));
        let mb = MotionBuilder::new(&config).unwrap();
        assert_eq!(mb.motion_list().to_rows(), points);
        assert_eq!(mb.dropped_count(), 0);

        // the edge cell (10, 0) is masked out, so (30, 0) goes with it
        let config = MotionBuilderConfig::new(axes())
            .with_exclusion(ExclusionConfig::Divider(DividerExclusionConfig::new(
                [f64::INFINITY, 9.5],
                DividerSide::PlusE0,
            )))
            .with_layer(LayerConfig::PointList(PointListConfig::new(points)));
        let mb = MotionBuilder::new(&config).unwrap();
        assert_eq!(mb.motion_list().to_rows(), vec![vec![0.0, 0.0], vec![-12.0, -40.0]]);
    }

    #[test]
    fn test_lapd_preset_expands() {
        let mb = MotionBuilder::new(&MotionBuilderConfig::lapd_xy()).unwrap();
        assert_eq!(mb.space().shape(), vec![221, 221]);
        assert_eq!(mb.exclusions().len(), 1);
        assert!(mb.exclusions()[0].governs());
        assert!(mb.motion_list().is_empty());

        let config = mb.config();
        assert!(matches!(config.space, SpaceConfig::Axes(ref axes) if axes.len() == 2));
        assert!(matches!(config.exclusions[0], ExclusionConfig::LaPDXY(_)));
    }

    #[test]
    fn test_unknown_preset() {
        let config = MotionBuilderConfig::new(SpaceConfig::Preset("lapd_6k_xyz".to_string()));
        assert_eq!(
            MotionBuilder::new(&config).unwrap_err(),
            MotionBuilderError::UnknownPreset("lapd_6k_xyz".to_string())
        );
    }

    #[test]
    fn test_governing_must_be_first() {
        let late = MotionBuilderConfig::new(axes())
            .with_exclusion(ExclusionConfig::Circle(CircularExclusionConfig::new(8.0)))
            .with_exclusion(ExclusionConfig::LaPDXY(LaPDXYExclusionConfig::default()));
        assert!(matches!(
            MotionBuilder::new(&late),
            Err(MotionBuilderError::GoverningNotFirst { index: 1, .. })
        ));

        let twice = MotionBuilderConfig::new(axes())
            .with_exclusion(ExclusionConfig::LaPDXY(LaPDXYExclusionConfig::default()))
            .with_exclusion(ExclusionConfig::LaPDXY(LaPDXYExclusionConfig::default()));
        assert!(matches!(
            MotionBuilder::new(&twice),
            Err(MotionBuilderError::MultipleGoverning { .. })
        ));
    }

    #[test]
    fn test_is_excluded_checks_dimension() {
        let mb = MotionBuilder::new(&MotionBuilderConfig::new(axes())).unwrap();
        assert!(matches!(mb.is_excluded(&[1.0]), Err(MotionBuilderError::Shape(_))));
        assert_eq!(mb.is_excluded(&[1.0, 1.0]), Ok(false));
    }
}

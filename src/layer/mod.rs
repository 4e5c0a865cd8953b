// src/layer/mod.rs
//! Point layers.
//!
//! A layer generates candidate points over the motion space without looking
//! at the mask. The builder concatenates every layer's points in
//! configuration order and keeps the ones that land on allowed cells.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [[motion_builder.layers]]
//! type = "grid"
//! limits = [[-20.0, 20.0], [-10.0, 10.0]]
//! npoints = [41, 21]
//!
//! [[motion_builder.layers]]
//! type = "grid_cnstep"
//! center = [0.0, 0.0]
//! npoints = 5
//! step_size = [1.0, 0.5]
//!
//! [[motion_builder.layers]]
//! type = "point_list"
//! points = [[0.0, 0.0], [12.5, -3.0]]
//! ```

pub mod grid;
pub mod point_list;

pub use grid::{GridCNStepConfig, GridCNStepLayer, GridLayer, GridLayerConfig};
pub use point_list::{PointListConfig, PointListLayer};

use crate::points::{Points, ShapeError};
use crate::space::Space;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LayerError {
    #[error("Invalid '{layer}' layer: {reason}")]
    InvalidConfig { layer: &'static str, reason: String },
    #[error("'{layer}' layer parameter '{name}' has {found} entries, motion space has {expected} axes")]
    Broadcast {
        layer: &'static str,
        name: &'static str,
        expected: usize,
        found: usize,
    },
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

/// A value given once for every axis or once per axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PerAxis<T> {
    All(T),
    Each(Vec<T>),
}

impl<T: Clone> PerAxis<T> {
    /// Expand to exactly `ndims` values. A one-element list broadcasts like
    /// a bare value.
    pub fn broadcast(
        &self,
        layer: &'static str,
        name: &'static str,
        ndims: usize,
    ) -> Result<Vec<T>, LayerError> {
        match self {
            PerAxis::All(value) => Ok(vec![value.clone(); ndims]),
            PerAxis::Each(values) if values.len() == ndims => Ok(values.clone()),
            PerAxis::Each(values) if values.len() == 1 => Ok(vec![values[0].clone(); ndims]),
            PerAxis::Each(values) => Err(LayerError::Broadcast {
                layer,
                name,
                expected: ndims,
                found: values.len(),
            }),
        }
    }
}

/// Serialized layer, keyed on `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LayerConfig {
    #[serde(rename = "grid")]
    Grid(GridLayerConfig),
    #[serde(rename = "grid_cnstep", alias = "grid_CNStep")]
    GridCNStep(GridCNStepConfig),
    #[serde(rename = "point_list")]
    PointList(PointListConfig),
}

pub trait Layer: std::fmt::Debug + Send + Sync {
    fn layer_type(&self) -> &'static str;

    /// Candidate points, shape `[...pattern..., N]`.
    fn points(&self) -> &Points;

    /// Concrete configuration that rebuilds this layer.
    fn config(&self) -> LayerConfig;
}

/// Factory for creating layers from their configuration.
pub fn create_layer(config: &LayerConfig, space: &Space) -> Result<Box<dyn Layer>, LayerError> {
    let layer: Box<dyn Layer> = match config {
        LayerConfig::Grid(c) => Box::new(GridLayer::new(c, space)?),
        LayerConfig::GridCNStep(c) => Box::new(GridCNStepLayer::new(c, space)?),
        LayerConfig::PointList(c) => Box::new(PointListLayer::new(c, space)?),
    };
    tracing::debug!(
        "Built '{}' layer with {} candidate points",
        layer.layer_type(),
        layer.points().len()
    );
    Ok(layer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::AxisConfig;

    fn space() -> Space {
        Space::new(&[
            AxisConfig::new("x", [-10.0, 10.0], 21),
            AxisConfig::new("y", [-10.0, 10.0], 21),
        ])
        .unwrap()
    }

    #[test]
    fn test_broadcast() {
        assert_eq!(PerAxis::All(3).broadcast("grid", "npoints", 2).unwrap(), vec![3, 3]);
        assert_eq!(
            PerAxis::Each(vec![3, 4]).broadcast("grid", "npoints", 2).unwrap(),
            vec![3, 4]
        );
        assert_eq!(PerAxis::Each(vec![5]).broadcast("grid", "npoints", 3).unwrap(), vec![5, 5, 5]);
        assert!(matches!(
            PerAxis::Each(vec![3, 4, 5]).broadcast("grid", "npoints", 2),
            Err(LayerError::Broadcast { expected: 2, found: 3, .. })
        ));
    }

    #[test]
    fn test_layers_parse_by_type() {
        let toml_str = r#"
            [[layers]]
            type = "grid"
            limits = [-5.0, 5.0]
            npoints = 3

            [[layers]]
            type = "grid_cnstep"
            center = [1.0, 2.0]
            npoints = [3, 1]
            step_size = 0.5

            [[layers]]
            type = "point_list"
            points = [[0.0, 0.0], [1.0, 1.0]]
        "#;
        #[derive(Deserialize)]
        struct Layers {
            layers: Vec<LayerConfig>,
        }
        let parsed: Layers = toml::from_str(toml_str).unwrap();
        let space = space();
        let sizes: Vec<usize> = parsed
            .layers
            .iter()
            .map(|c| create_layer(c, &space).unwrap().points().len())
            .collect();
        assert_eq!(sizes, vec![9, 3, 2]);
    }

    #[test]
    fn test_mixed_case_type_and_single_value_lists() {
        let toml_str = r#"
            [[layers]]
            type = "grid_CNStep"
            center = [0.0]
            npoints = [5]
            step_size = [0.5]

            [[layers]]
            type = "grid"
            limits = [[-2.0, 2.0]]
            npoints = [3]
        "#;
        #[derive(Deserialize)]
        struct Layers {
            layers: Vec<LayerConfig>,
        }
        let parsed: Layers = toml::from_str(toml_str).unwrap();
        assert!(matches!(parsed.layers[0], LayerConfig::GridCNStep(_)));
        let space = space();
        let sizes: Vec<usize> = parsed
            .layers
            .iter()
            .map(|c| create_layer(c, &space).unwrap().points().len())
            .collect();
        assert_eq!(sizes, vec![25, 9]);

        // exports under the canonical name
        let exported = toml::to_string(&create_layer(&parsed.layers[0], &space).unwrap().config()).unwrap();
        assert!(exported.contains("type = \"grid_cnstep\""));
    }

    #[test]
    fn test_unknown_layer_type() {
        let result: Result<LayerConfig, _> = toml::from_str("type = \"spiral\"\nturns = 3\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_rebuilds_identical_points() {
        let space = space();
        let configs = [
            LayerConfig::Grid(GridLayerConfig::new(PerAxis::All([-3.0, 3.0]), PerAxis::Each(vec![4, 7]))),
            LayerConfig::GridCNStep(GridCNStepConfig::new(
                PerAxis::Each(vec![0.5, -1.0]),
                PerAxis::All(5),
                PerAxis::All(0.3),
            )),
            LayerConfig::PointList(PointListConfig::new(vec![vec![0.1, 0.2], vec![-4.0, 9.5]])),
        ];
        for config in configs {
            let layer = create_layer(&config, &space).unwrap();
            let toml_str = toml::to_string(&layer.config()).unwrap();
            let parsed: LayerConfig = toml::from_str(&toml_str).unwrap();
            let rebuilt = create_layer(&parsed, &space).unwrap();
            assert_eq!(layer.points(), rebuilt.points());
        }
    }
}

// src/layer/point_list.rs
use super::{Layer, LayerConfig, LayerError};
use crate::points::Points;
use crate::space::Space;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointListConfig {
    pub points: Vec<Vec<f64>>,
}

impl PointListConfig {
    pub fn new(points: Vec<Vec<f64>>) -> Self {
        Self { points }
    }
}

/// An explicit ordered list of points, shape `[M, N]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PointListLayer {
    points: Points,
}

impl PointListLayer {
    pub fn new(config: &PointListConfig, space: &Space) -> Result<Self, LayerError> {
        if config.points.is_empty() {
            return Err(LayerError::InvalidConfig {
                layer: "point_list",
                reason: "needs at least one point".to_string(),
            });
        }
        if let Some(bad) = config.points.iter().find(|p| p.iter().any(|v| !v.is_finite())) {
            return Err(LayerError::InvalidConfig {
                layer: "point_list",
                reason: format!("point {:?} is not finite", bad),
            });
        }
        let points = Points::from_rows(&config.points, space.ndims())?;
        Ok(Self { points })
    }
}

impl Layer for PointListLayer {
    fn layer_type(&self) -> &'static str {
        "point_list"
    }

    fn points(&self) -> &Points {
        &self.points
    }

    fn config(&self) -> LayerConfig {
        LayerConfig::PointList(PointListConfig {
            points: self.points.to_rows(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::points::ShapeError;
    use crate::space::AxisConfig;

    fn space() -> Space {
        Space::new(&[
            AxisConfig::new("x", [-10.0, 10.0], 21),
            AxisConfig::new("y", [-10.0, 10.0], 21),
        ])
        .unwrap()
    }

    #[test]
    fn test_keeps_order() {
        let rows = vec![vec![3.0, 1.0], vec![-2.0, 0.5], vec![3.0, 1.0]];
        let layer = PointListLayer::new(&PointListConfig::new(rows.clone()), &space()).unwrap();
        assert_eq!(layer.points().shape(), &[3, 2]);
        assert_eq!(layer.points().to_rows(), rows);
    }

    #[test]
    fn test_wrong_dimension() {
        let config = PointListConfig::new(vec![vec![1.0, 2.0], vec![1.0, 2.0, 3.0]]);
        assert!(matches!(
            PointListLayer::new(&config, &space()),
            Err(LayerError::Shape(ShapeError::Dimension { expected: 2, found: 3 }))
        ));
    }

    #[test]
    fn test_empty_or_nan_rejected() {
        assert!(PointListLayer::new(&PointListConfig::new(vec![]), &space()).is_err());
        let nan = PointListConfig::new(vec![vec![f64::NAN, 0.0]]);
        assert!(PointListLayer::new(&nan, &space()).is_err());
    }
}

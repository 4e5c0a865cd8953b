// src/transform/identity.rs
use super::{default_axes, unique_axes, Transform, TransformConfig, TransformError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "default_axes")]
    pub axes: Vec<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            axes: default_axes(),
        }
    }
}

/// Drive space equals motion space.
#[derive(Debug, Clone)]
pub struct IdentityTransform {
    axes: Vec<String>,
}

impl IdentityTransform {
    pub fn new(config: &IdentityConfig) -> Result<Self, TransformError> {
        Ok(Self {
            axes: unique_axes(&config.axes)?,
        })
    }
}

impl Transform for IdentityTransform {
    fn transform_type(&self) -> &'static str {
        "identity"
    }

    fn axes(&self) -> &[String] {
        &self.axes
    }

    fn to_drive(&self, point: &[f64]) -> Result<Vec<f64>, TransformError> {
        Ok(point.to_vec())
    }

    fn to_motion_space(&self, point: &[f64]) -> Result<Vec<f64>, TransformError> {
        Ok(point.to_vec())
    }

    fn config(&self) -> TransformConfig {
        TransformConfig::Identity(IdentityConfig {
            axes: self.axes.clone(),
        })
    }
}

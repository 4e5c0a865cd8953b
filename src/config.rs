//! # Motion Group Configuration
//!
//! A motion group pairs one motion builder (space, exclusions, layers) with
//! an optional coordinate transform to the probe drive.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! name = "east port XY"
//!
//! [motion_builder]
//! space = "lapd_xy"
//!
//! [[motion_builder.exclusions]]
//! type = "lapd_xy"
//! port_location = "E"
//! cone_full_angle = 60.0
//!
//! [[motion_builder.layers]]
//! type = "grid"
//! limits = [-20.0, 20.0]
//! npoints = 21
//!
//! [transform]
//! type = "lapd_xy"
//! pivot_to_center = 58.771
//! pivot_to_drive = 134.0
//! ```
//!
//! - `space` is either a preset name or a list of `[[motion_builder.space]]`
//!   axis tables.
//! - Every exclusion, layer and transform table carries a `type` key; unknown
//!   types fail at load time.
//!
//! ## Example: Rust Usage
//!
//! ```rust
//! use probe_motion_rs::config::MotionGroupConfig;
//! let config = MotionGroupConfig::from_toml_str("[motion_builder]\nspace = \"lapd_xy\"\n").unwrap();
//! assert!(config.validate().is_ok());
//! ```

// src/config.rs - Motion group configuration file
use crate::builder::{MotionBuilder, MotionBuilderConfig, MotionBuilderError};
use crate::transform::{create_transform, Transform, TransformConfig, TransformError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Motion builder error: {0}")]
    MotionBuilder(#[from] MotionBuilderError),
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),
    #[error("Transform axes {transform:?} do not match motion space axes {space:?}")]
    AxisMismatch {
        transform: Vec<String>,
        space: Vec<String>,
    },
}

/// Top-level configuration for one probe drive.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MotionGroupConfig {
    #[serde(default = "default_name")]
    pub name: String,
    pub motion_builder: MotionBuilderConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformConfig>,
}

fn default_name() -> String { "motion_group".to_string() }

impl MotionGroupConfig {
    pub fn new(name: &str, motion_builder: MotionBuilderConfig) -> Self {
        Self {
            name: name.to_string(),
            motion_builder,
            transform: None,
        }
    }

    pub fn with_transform(mut self, transform: TransformConfig) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    /// Build every component once so configuration errors surface before
    /// anything runs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let builder = MotionBuilder::new(&self.motion_builder)?;
        if let Some(transform) = &self.transform {
            let transform = create_transform(transform)?;
            check_axes(&builder, transform.as_ref())?;
        }
        Ok(())
    }
}

/// Transform axes must name the motion space axes in order.
pub(crate) fn check_axes(builder: &MotionBuilder, transform: &dyn Transform) -> Result<(), ConfigError> {
    let space: Vec<String> = builder.space().labels().iter().map(|l| l.to_string()).collect();
    if transform.axes() != space.as_slice() {
        return Err(ConfigError::AxisMismatch {
            transform: transform.axes().to_vec(),
            space,
        });
    }
    Ok(())
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<MotionGroupConfig, ConfigError> {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::error!("Failed to parse config TOML: {}", e);
                Err(ConfigError::Toml(e))
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file '{}': {}", path.display(), e);
            Err(ConfigError::Io(e))
        }
    }
}

pub fn save_config<P: AsRef<Path>>(config: &MotionGroupConfig, path: P) -> Result<(), ConfigError> {
    let contents = config.to_toml_string()?;
    std::fs::write(path.as_ref(), contents)?;
    tracing::debug!("Saved motion group '{}' to '{}'", config.name, path.as_ref().display());
    Ok(())
}

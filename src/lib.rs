// src/lib.rs - Probe drive motion planning
//!
//! Discretizes a probe drive's motion space, masks out unreachable regions,
//! generates ordered motion lists from point layers and converts them to
//! drive coordinates.

pub mod builder;
pub mod config;
pub mod exclusion;
pub mod group;
pub mod layer;
pub mod mask;
pub mod numeric;
pub mod points;
pub mod space;
pub mod transform;

pub use builder::{MotionBuilder, MotionBuilderConfig, MotionBuilderError, SpaceConfig};
pub use config::{load_config, save_config, ConfigError, MotionGroupConfig};
pub use exclusion::{create_exclusion, Exclusion, ExclusionConfig, ExclusionError};
pub use group::MotionGroup;
pub use layer::{create_layer, Layer, LayerConfig, LayerError};
pub use mask::Mask;
pub use points::{Points, ShapeError};
pub use space::{AxisConfig, Space, SpaceError};
pub use transform::{create_transform, Direction, Transform, TransformConfig, TransformError};

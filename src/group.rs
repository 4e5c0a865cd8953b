// src/group.rs - A built motion group: builder plus drive transform
use crate::builder::MotionBuilder;
use crate::config::{check_axes, ConfigError, MotionGroupConfig};
use crate::points::{Points, ShapeError};
use crate::transform::{create_transform, Direction, Transform, TransformError};

/// Runtime form of a [`MotionGroupConfig`].
#[derive(Debug)]
pub struct MotionGroup {
    name: String,
    builder: MotionBuilder,
    transform: Option<Box<dyn Transform>>,
}

impl MotionGroup {
    pub fn new(config: &MotionGroupConfig) -> Result<Self, ConfigError> {
        let builder = MotionBuilder::new(&config.motion_builder)?;
        let transform = match &config.transform {
            Some(c) => {
                let transform = create_transform(c)?;
                check_axes(&builder, transform.as_ref())?;
                Some(transform)
            }
            None => None,
        };
        tracing::info!(
            "Motion group '{}' ready ({} transform)",
            config.name,
            transform.as_ref().map_or("no", |t| t.transform_type())
        );
        Ok(Self {
            name: config.name.clone(),
            builder,
            transform,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn builder(&self) -> &MotionBuilder {
        &self.builder
    }

    pub fn transform(&self) -> Option<&dyn Transform> {
        self.transform.as_deref()
    }

    /// The motion list in drive coordinates. Without a transform the drive
    /// and motion spaces coincide.
    pub fn drive_list(&self) -> Result<Points, TransformError> {
        let motion_list = self.builder.motion_list();
        match &self.transform {
            Some(t) => t.convert(motion_list, Direction::ToDrive),
            None => Ok(motion_list.clone()),
        }
    }

    /// Convert one point, passing it through when there is no transform.
    pub fn convert(&self, point: &[f64], direction: Direction) -> Result<Vec<f64>, TransformError> {
        let ndims = self.builder.space().ndims();
        if point.len() != ndims {
            return Err(ShapeError::Dimension {
                expected: ndims,
                found: point.len(),
            }
            .into());
        }
        match &self.transform {
            Some(t) => t.convert_point(point, direction),
            None => Ok(point.to_vec()),
        }
    }

    /// Concrete configuration with presets expanded.
    pub fn config(&self) -> MotionGroupConfig {
        MotionGroupConfig {
            name: self.name.clone(),
            motion_builder: self.builder.config(),
            transform: self.transform.as_ref().map(|t| t.config()),
        }
    }
}

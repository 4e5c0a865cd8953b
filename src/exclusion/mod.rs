// src/exclusion/mod.rs
//! Exclusion regions over the motion space.
//!
//! An exclusion is a geometric predicate. Applied to a builder it produces
//! an allowed-region [`Mask`] (the predicate negated at every grid point)
//! that is either AND-ed into the global mask or, for a governing
//! exclusion, replaces it.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [[motion_builder.exclusions]]
//! type = "lapd_xy"
//! port_location = "E"
//! cone_full_angle = 60
//!
//! [[motion_builder.exclusions]]
//! type = "circle"
//! radius = 40.0
//! center = [0.0, 0.0]
//! exclude = "outside"
//!
//! [[motion_builder.exclusions]]
//! type = "divider"
//! mb = [inf, -20.0]
//! exclude = "-e0"
//! ```

pub mod circular;
pub mod divider;
pub mod lapd;
pub mod shadow;

pub use circular::{CircleRegion, CircularExclusion, CircularExclusionConfig};
pub use divider::{DividerExclusion, DividerExclusionConfig, DividerSide};
pub use lapd::{LaPDXYExclusion, LaPDXYExclusionConfig, ObstructionConfig, PortLocation};
pub use shadow::{Shadow2DConfig, Shadow2DExclusion};

use crate::mask::Mask;
use crate::points::ShapeError;
use crate::space::Space;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExclusionError {
    #[error("Invalid '{exclusion}' exclusion: {reason}")]
    InvalidConfig {
        exclusion: &'static str,
        reason: String,
    },
    #[error("'{exclusion}' exclusion needs a {expected}D motion space, got {found}D")]
    Dimensionality {
        exclusion: &'static str,
        expected: usize,
        found: usize,
    },
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

/// Serialized exclusion, keyed on `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ExclusionConfig {
    #[serde(rename = "circle")]
    Circle(CircularExclusionConfig),
    #[serde(rename = "divider")]
    Divider(DividerExclusionConfig),
    #[serde(rename = "shadow_2d")]
    Shadow2D(Shadow2DConfig),
    #[serde(rename = "lapd_xy")]
    LaPDXY(LaPDXYExclusionConfig),
}

pub trait Exclusion: std::fmt::Debug + Send + Sync {
    fn exclusion_type(&self) -> &'static str;

    /// Evaluate the geometric predicate directly, on or off the grid.
    /// A point of the wrong dimension is excluded.
    fn is_excluded(&self, point: &[f64]) -> bool;

    /// A governing exclusion replaces the global mask instead of
    /// AND-ing into it.
    fn governs(&self) -> bool {
        false
    }

    /// Child exclusions a compound exclusion is built from.
    fn composed_exclusions(&self) -> Vec<&dyn Exclusion> {
        Vec::new()
    }

    /// Concrete configuration that rebuilds this exclusion.
    fn config(&self) -> ExclusionConfig;

    /// Allowed-region mask over `space`.
    fn mask(&self, space: &Space) -> Mask {
        space.mask_where(|p| !self.is_excluded(p))
    }

    /// Fold this exclusion into the builder's global mask.
    fn update_mask(&self, space: &Space, mask: &mut Mask) -> Result<(), ExclusionError> {
        let own = self.mask(space);
        if self.governs() {
            mask.replace(&own)?;
        } else {
            mask.and_assign(&own)?;
        }
        tracing::debug!(
            "Applied '{}' exclusion: {} of {} cells allowed",
            self.exclusion_type(),
            mask.allowed_count(),
            mask.len()
        );
        Ok(())
    }
}

/// Factory for creating exclusions from their configuration.
pub fn create_exclusion(
    config: &ExclusionConfig,
    space: &Space,
) -> Result<Box<dyn Exclusion>, ExclusionError> {
    let exclusion: Box<dyn Exclusion> = match config {
        ExclusionConfig::Circle(c) => Box::new(CircularExclusion::new(c, space)?),
        ExclusionConfig::Divider(c) => Box::new(DividerExclusion::new(c, space)?),
        ExclusionConfig::Shadow2D(c) => Box::new(Shadow2DExclusion::new(c, space)?),
        ExclusionConfig::LaPDXY(c) => Box::new(LaPDXYExclusion::new(c, space)?),
    };
    Ok(exclusion)
}

fn require_2d(exclusion: &'static str, space: &Space) -> Result<(), ExclusionError> {
    if space.ndims() != 2 {
        return Err(ExclusionError::Dimensionality {
            exclusion,
            expected: 2,
            found: space.ndims(),
        });
    }
    Ok(())
}

fn finite_point(exclusion: &'static str, name: &str, point: [f64; 2]) -> Result<(), ExclusionError> {
    if point.iter().any(|v| !v.is_finite()) {
        return Err(ExclusionError::InvalidConfig {
            exclusion,
            reason: format!("'{}' must be finite, got {:?}", name, point),
        });
    }
    Ok(())
}

fn positive(exclusion: &'static str, name: &str, value: f64) -> Result<(), ExclusionError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ExclusionError::InvalidConfig {
            exclusion,
            reason: format!("'{}' must be a positive finite number, got {}", name, value),
        });
    }
    Ok(())
}

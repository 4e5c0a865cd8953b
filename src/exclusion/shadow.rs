// src/exclusion/shadow.rs
use super::{finite_point, positive, require_2d, Exclusion, ExclusionConfig, ExclusionError};
use crate::space::Space;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shadow2DConfig {
    /// Where the probe enters, typically the ball valve pivot.
    pub source_point: [f64; 2],
    /// Center of the circular obstruction.
    pub center: [f64; 2],
    pub radius: f64,
}

impl Shadow2DConfig {
    pub fn new(source_point: [f64; 2], center: [f64; 2], radius: f64) -> Self {
        Self {
            source_point,
            center,
            radius,
        }
    }
}

/// Region a straight probe from `source_point` cannot reach because a
/// circular obstruction is in the way.
///
/// A point is excluded when the segment from the source to it touches the
/// obstruction disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Shadow2DExclusion {
    source: [f64; 2],
    center: [f64; 2],
    radius: f64,
}

impl Shadow2DExclusion {
    pub fn new(config: &Shadow2DConfig, space: &Space) -> Result<Self, ExclusionError> {
        require_2d("shadow_2d", space)?;
        Self::from_parts(config.source_point, config.center, config.radius)
    }

    pub(crate) fn from_parts(
        source: [f64; 2],
        center: [f64; 2],
        radius: f64,
    ) -> Result<Self, ExclusionError> {
        finite_point("shadow_2d", "source_point", source)?;
        finite_point("shadow_2d", "center", center)?;
        positive("shadow_2d", "radius", radius)?;
        let (dx, dy) = (source[0] - center[0], source[1] - center[1]);
        if dx * dx + dy * dy <= radius * radius {
            return Err(ExclusionError::InvalidConfig {
                exclusion: "shadow_2d",
                reason: format!(
                    "source point {:?} lies inside the obstruction at {:?} (radius {})",
                    source, center, radius
                ),
            });
        }
        Ok(Self {
            source,
            center,
            radius,
        })
    }
}

impl Exclusion for Shadow2DExclusion {
    fn exclusion_type(&self) -> &'static str {
        "shadow_2d"
    }

    fn is_excluded(&self, point: &[f64]) -> bool {
        let &[px, py] = point else {
            return true;
        };
        let [sx, sy] = self.source;
        let (dx, dy) = (px - sx, py - sy);
        let (cx, cy) = (self.center[0] - sx, self.center[1] - sy);

        // closest approach of the segment to the obstruction center
        let len2 = dx * dx + dy * dy;
        let t = if len2 > 0.0 {
            ((cx * dx + cy * dy) / len2).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let (ex, ey) = (t * dx - cx, t * dy - cy);
        ex * ex + ey * ey <= self.radius * self.radius
    }

    fn config(&self) -> ExclusionConfig {
        ExclusionConfig::Shadow2D(Shadow2DConfig {
            source_point: self.source,
            center: self.center,
            radius: self.radius,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::AxisConfig;

    fn shadow() -> Shadow2DExclusion {
        let space = Space::new(&[
            AxisConfig::new("x", [-55.0, 55.0], 11),
            AxisConfig::new("y", [-55.0, 55.0], 11),
        ])
        .unwrap();
        Shadow2DExclusion::new(&Shadow2DConfig::new([60.0, 0.0], [30.0, 0.0], 5.0), &space).unwrap()
    }

    #[test]
    fn test_shadow_behind_obstruction() {
        let s = shadow();
        assert!(s.is_excluded(&[0.0, 0.0]));
        assert!(s.is_excluded(&[-40.0, 5.0]));
        assert!(s.is_excluded(&[30.0, 0.0]));
    }

    #[test]
    fn test_between_source_and_obstruction_is_reachable() {
        let s = shadow();
        assert!(!s.is_excluded(&[40.0, 0.0]));
        assert!(!s.is_excluded(&[55.0, 3.0]));
    }

    #[test]
    fn test_outside_shadow_cone() {
        let s = shadow();
        assert!(!s.is_excluded(&[0.0, 30.0]));
        assert!(!s.is_excluded(&[-40.0, -30.0]));
    }

    #[test]
    fn test_source_inside_obstruction_rejected() {
        assert!(Shadow2DExclusion::from_parts([31.0, 0.0], [30.0, 0.0], 5.0).is_err());
        assert!(Shadow2DExclusion::from_parts([60.0, 0.0], [30.0, 0.0], 0.0).is_err());
    }
}

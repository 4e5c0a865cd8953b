// src/exclusion/circular.rs
use super::{finite_point, positive, require_2d, Exclusion, ExclusionConfig, ExclusionError};
use crate::space::Space;
use serde::{Deserialize, Serialize};

/// Which side of the circle is excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CircleRegion {
    Inside,
    Outside,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircularExclusionConfig {
    pub radius: f64,
    #[serde(default = "default_center")]
    pub center: [f64; 2],
    #[serde(default = "default_exclude")]
    pub exclude: CircleRegion,
}

fn default_center() -> [f64; 2] {
    [0.0, 0.0]
}

fn default_exclude() -> CircleRegion {
    CircleRegion::Outside
}

impl CircularExclusionConfig {
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            center: default_center(),
            exclude: default_exclude(),
        }
    }
}

/// Excludes the inside or the outside of a circle. The boundary belongs to
/// the inside.
#[derive(Debug, Clone, PartialEq)]
pub struct CircularExclusion {
    radius: f64,
    center: [f64; 2],
    exclude: CircleRegion,
}

impl CircularExclusion {
    pub fn new(config: &CircularExclusionConfig, space: &Space) -> Result<Self, ExclusionError> {
        require_2d("circle", space)?;
        positive("circle", "radius", config.radius)?;
        finite_point("circle", "center", config.center)?;
        Ok(Self::from_parts(config.radius, config.center, config.exclude))
    }

    pub(crate) fn from_parts(radius: f64, center: [f64; 2], exclude: CircleRegion) -> Self {
        Self {
            radius,
            center,
            exclude,
        }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn center(&self) -> [f64; 2] {
        self.center
    }

    fn is_inside(&self, x: f64, y: f64) -> bool {
        let dx = x - self.center[0];
        let dy = y - self.center[1];
        dx * dx + dy * dy <= self.radius * self.radius
    }
}

impl Exclusion for CircularExclusion {
    fn exclusion_type(&self) -> &'static str {
        "circle"
    }

    fn is_excluded(&self, point: &[f64]) -> bool {
        let &[x, y] = point else {
            return true;
        };
        match self.exclude {
            CircleRegion::Inside => self.is_inside(x, y),
            CircleRegion::Outside => !self.is_inside(x, y),
        }
    }

    fn config(&self) -> ExclusionConfig {
        ExclusionConfig::Circle(CircularExclusionConfig {
            radius: self.radius,
            center: self.center,
            exclude: self.exclude,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::AxisConfig;

    fn space() -> Space {
        Space::new(&[
            AxisConfig::new("x", [-55.0, 55.0], 221),
            AxisConfig::new("y", [-55.0, 55.0], 221),
        ])
        .unwrap()
    }

    #[test]
    fn test_outside_exclusion_counts_grid_points() {
        let space = space();
        let circle = CircularExclusion::new(&CircularExclusionConfig::new(50.0), &space).unwrap();
        let mask = circle.mask(&space);

        let coords = space.axes()[0].coords();
        let mut expected = 0;
        for x in coords {
            for y in coords {
                if x * x + y * y <= 2500.0 {
                    expected += 1;
                }
            }
        }
        assert_eq!(mask.allowed_count(), expected);
    }

    #[test]
    fn test_boundary_counts_as_inside() {
        let space = space();
        let outside = CircularExclusion::new(&CircularExclusionConfig::new(50.0), &space).unwrap();
        assert!(!outside.is_excluded(&[50.0, 0.0]));
        assert!(!outside.is_excluded(&[30.0, -40.0]));
        assert!(outside.is_excluded(&[50.0, 0.5]));

        let mut config = CircularExclusionConfig::new(10.0);
        config.center = [5.0, 5.0];
        config.exclude = CircleRegion::Inside;
        let inside = CircularExclusion::new(&config, &space).unwrap();
        assert!(inside.is_excluded(&[15.0, 5.0]));
        assert!(inside.is_excluded(&[5.0, 5.0]));
        assert!(!inside.is_excluded(&[0.0, -6.0]));
    }

    #[test]
    fn test_invalid_radius() {
        let space = space();
        assert!(CircularExclusion::new(&CircularExclusionConfig::new(0.0), &space).is_err());
        assert!(CircularExclusion::new(&CircularExclusionConfig::new(-3.0), &space).is_err());
        assert!(CircularExclusion::new(&CircularExclusionConfig::new(f64::NAN), &space).is_err());
    }

    #[test]
    fn test_exclude_parses_lowercase() {
        let config: CircularExclusionConfig =
            toml::from_str("radius = 20.0\nexclude = \"inside\"\n").unwrap();
        assert_eq!(config.exclude, CircleRegion::Inside);
        assert_eq!(config.center, [0.0, 0.0]);
        assert!(toml::from_str::<CircularExclusionConfig>("radius = 20.0\nexclude = \"left\"\n").is_err());
    }
}

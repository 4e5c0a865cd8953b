// src/exclusion/divider.rs
use super::{require_2d, Exclusion, ExclusionConfig, ExclusionError};
use crate::space::Space;
use serde::{Deserialize, Serialize};

/// Half-plane excluded by a divider line.
///
/// `+e1` excludes everything above the line (`y > m x + b`), `-e1`
/// everything below it. `+e0` excludes everything to the right of the line
/// (`x > (y - b) / m`), `-e0` everything to the left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DividerSide {
    #[serde(rename = "+e0")]
    PlusE0,
    #[serde(rename = "-e0")]
    MinusE0,
    #[serde(rename = "+e1")]
    PlusE1,
    #[serde(rename = "-e1")]
    MinusE1,
}

impl DividerSide {
    pub fn opposite(self) -> Self {
        match self {
            DividerSide::PlusE0 => DividerSide::MinusE0,
            DividerSide::MinusE0 => DividerSide::PlusE0,
            DividerSide::PlusE1 => DividerSide::MinusE1,
            DividerSide::MinusE1 => DividerSide::PlusE1,
        }
    }

    fn along_e0(self) -> bool {
        matches!(self, DividerSide::PlusE0 | DividerSide::MinusE0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividerExclusionConfig {
    /// `[slope, intercept]`; an infinite slope is the vertical line
    /// `x = intercept`.
    pub mb: [f64; 2],
    pub exclude: DividerSide,
}

impl DividerExclusionConfig {
    pub fn new(mb: [f64; 2], exclude: DividerSide) -> Self {
        Self { mb, exclude }
    }
}

/// Excludes one side of a straight line. Points on the line stay allowed.
#[derive(Debug, Clone, PartialEq)]
pub struct DividerExclusion {
    slope: f64,
    intercept: f64,
    exclude: DividerSide,
}

impl DividerExclusion {
    pub fn new(config: &DividerExclusionConfig, space: &Space) -> Result<Self, ExclusionError> {
        require_2d("divider", space)?;
        Self::from_parts(config.mb, config.exclude)
    }

    pub(crate) fn from_parts(mb: [f64; 2], exclude: DividerSide) -> Result<Self, ExclusionError> {
        let [slope, intercept] = mb;
        let invalid = |reason: String| ExclusionError::InvalidConfig {
            exclusion: "divider",
            reason,
        };
        if slope.is_nan() || !intercept.is_finite() {
            return Err(invalid(format!(
                "'mb' needs a slope (or inf) and a finite intercept, got {:?}",
                mb
            )));
        }
        if slope == 0.0 && exclude.along_e0() {
            return Err(invalid(format!(
                "a horizontal line cannot exclude along e0, got '{:?}'",
                exclude
            )));
        }
        if slope.is_infinite() && !exclude.along_e0() {
            return Err(invalid(format!(
                "a vertical line cannot exclude along e1, got '{:?}'",
                exclude
            )));
        }

        Ok(Self {
            slope,
            intercept,
            exclude,
        })
    }

    pub fn mb(&self) -> [f64; 2] {
        [self.slope, self.intercept]
    }

    pub fn exclude(&self) -> DividerSide {
        self.exclude
    }

    pub fn is_vertical(&self) -> bool {
        self.slope.is_infinite()
    }

    /// The side label whose half-plane does not contain the origin.
    ///
    /// Shallow lines are split along e1, steep and vertical lines along
    /// e0. A line through the origin yields the `+` side.
    pub fn side_away_from_origin(mb: [f64; 2]) -> DividerSide {
        let [slope, intercept] = mb;
        if slope.is_infinite() {
            return if intercept >= 0.0 {
                DividerSide::PlusE0
            } else {
                DividerSide::MinusE0
            };
        }
        if slope.abs() <= 1.0 {
            return if intercept >= 0.0 {
                DividerSide::PlusE1
            } else {
                DividerSide::MinusE1
            };
        }
        // x position of the line at y = 0
        if -intercept / slope >= 0.0 {
            DividerSide::PlusE0
        } else {
            DividerSide::MinusE0
        }
    }
}

impl Exclusion for DividerExclusion {
    fn exclusion_type(&self) -> &'static str {
        "divider"
    }

    fn is_excluded(&self, point: &[f64]) -> bool {
        let &[x, y] = point else {
            return true;
        };
        match self.exclude {
            DividerSide::PlusE1 => y > self.slope * x + self.intercept,
            DividerSide::MinusE1 => y < self.slope * x + self.intercept,
            DividerSide::PlusE0 | DividerSide::MinusE0 => {
                let line_x = if self.is_vertical() {
                    self.intercept
                } else {
                    (y - self.intercept) / self.slope
                };
                if self.exclude == DividerSide::PlusE0 {
                    x > line_x
                } else {
                    x < line_x
                }
            }
        }
    }

    fn config(&self) -> ExclusionConfig {
        ExclusionConfig::Divider(DividerExclusionConfig {
            mb: self.mb(),
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
            AxisConfig::new("x", [-10.0, 10.0], 21),
            AxisConfig::new("y", [-10.0, 10.0], 21),
        ])
        .unwrap()
    }

    fn divider(mb: [f64; 2], exclude: DividerSide) -> DividerExclusion {
        DividerExclusion::new(&DividerExclusionConfig::new(mb, exclude), &space()).unwrap()
    }

    #[test]
    fn test_e1_half_planes() {
        let above = divider([1.0, 2.0], DividerSide::PlusE1);
        assert!(above.is_excluded(&[0.0, 3.0]));
        assert!(!above.is_excluded(&[0.0, 1.0]));
        assert!(!above.is_excluded(&[1.0, 3.0]));

        let below = divider([1.0, 2.0], DividerSide::MinusE1);
        assert!(below.is_excluded(&[0.0, 1.0]));
        assert!(!below.is_excluded(&[0.0, 3.0]));
    }

    #[test]
    fn test_e0_half_planes() {
        let right = divider([2.0, 0.0], DividerSide::PlusE0);
        assert!(right.is_excluded(&[3.0, 2.0]));
        assert!(!right.is_excluded(&[0.0, 2.0]));
        assert!(!right.is_excluded(&[1.0, 2.0]));

        let left = divider([2.0, 0.0], DividerSide::MinusE0);
        assert!(left.is_excluded(&[0.0, 2.0]));
        assert!(!left.is_excluded(&[3.0, 2.0]));
    }

    #[test]
    fn test_vertical_line() {
        let vertical = divider([f64::INFINITY, -4.0], DividerSide::MinusE0);
        assert!(vertical.is_excluded(&[-5.0, 100.0]));
        assert!(!vertical.is_excluded(&[-4.0, -3.0]));
        assert!(!vertical.is_excluded(&[0.0, 0.0]));

        let neg_inf = divider([f64::NEG_INFINITY, 3.0], DividerSide::PlusE0);
        assert!(neg_inf.is_excluded(&[3.5, 0.0]));
    }

    #[test]
    fn test_invalid_combinations() {
        let space = space();
        for (mb, side) in [
            ([0.0, 1.0], DividerSide::PlusE0),
            ([f64::INFINITY, 1.0], DividerSide::MinusE1),
            ([f64::NAN, 1.0], DividerSide::PlusE1),
            ([1.0, f64::INFINITY], DividerSide::PlusE1),
        ] {
            assert!(DividerExclusion::new(&DividerExclusionConfig::new(mb, side), &space).is_err());
        }
    }

    #[test]
    fn test_side_away_from_origin() {
        for mb in [[0.3, 5.0], [-0.2, -7.0], [4.0, 10.0], [-3.0, 9.0], [f64::INFINITY, -2.0]] {
            let side = DividerExclusion::side_away_from_origin(mb);
            let d = DividerExclusion::from_parts(mb, side).unwrap();
            assert!(!d.is_excluded(&[0.0, 0.0]), "{:?} {:?}", mb, side);
            let d = DividerExclusion::from_parts(mb, side.opposite()).unwrap();
            assert!(d.is_excluded(&[0.0, 0.0]), "{:?} {:?}", mb, side);
        }
    }

    #[test]
    fn test_parses_signed_labels() {
        let config: DividerExclusionConfig = toml::from_str("mb = [inf, 2.5]\nexclude = \"+e0\"\n").unwrap();
        assert!(config.mb[0].is_infinite());
        assert_eq!(config.exclude, DividerSide::PlusE0);
    }
}

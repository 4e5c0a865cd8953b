// src/exclusion/lapd.rs
//! Governing exclusion for a probe inserted through a LaPD ball valve.
//!
//! The allowed region is the part of the chamber a straight probe can reach
//! from the insertion point:
//!
//! ```text
//! allowed = (chamber | port) & cone_upper & cone_lower & shadows
//! ```
//!
//! * `chamber`: circle of the chamber diameter, outside excluded;
//! * `cone_upper` / `cone_lower`: the two edges of the swing cone through
//!   the insertion point;
//! * `port`: the chord joining the points where the cone edges meet the
//!   chamber wall, keeping the sliver of port between wall and pivot;
//! * `shadows`: one shadow per configured obstruction.

use super::circular::{CircleRegion, CircularExclusion};
use super::divider::DividerExclusion;
use super::shadow::Shadow2DExclusion;
use super::{positive, require_2d, Exclusion, ExclusionConfig, ExclusionError};
use crate::mask::Mask;
use crate::points::ShapeError;
use crate::space::Space;
use serde::{Deserialize, Serialize};

/// Port angle, either in degrees or by name (`E`, `T`, `W`, `B`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortLocation {
    Angle(f64),
    Named(String),
}

impl PortLocation {
    /// Angle in degrees.
    pub fn degrees(&self) -> Result<f64, ExclusionError> {
        let angle = match self {
            PortLocation::Angle(angle) => *angle,
            PortLocation::Named(name) => match name.to_lowercase().as_str() {
                "e" | "east" => 0.0,
                "t" | "top" => 90.0,
                "w" | "west" => 180.0,
                "b" | "bot" | "bottom" => 270.0,
                _ => {
                    return Err(ExclusionError::InvalidConfig {
                        exclusion: "lapd_xy",
                        reason: format!("unknown port location '{}'", name),
                    });
                }
            },
        };
        if !(angle > -180.0 && angle < 360.0) {
            return Err(ExclusionError::InvalidConfig {
                exclusion: "lapd_xy",
                reason: format!(
                    "port location {} must be within (-180, 360) degrees",
                    angle
                ),
            });
        }
        Ok(angle)
    }
}

/// Circular obstruction inside the chamber that casts a shadow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstructionConfig {
    pub center: [f64; 2],
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaPDXYExclusionConfig {
    #[serde(default = "default_diameter")]
    pub diameter: f64,
    /// Distance from the chamber center to the ball valve pivot.
    #[serde(default = "default_pivot_radius")]
    pub pivot_radius: f64,
    #[serde(default = "default_port_location")]
    pub port_location: PortLocation,
    /// Full opening angle of the swing cone, in degrees.
    #[serde(default = "default_cone_full_angle")]
    pub cone_full_angle: f64,
    #[serde(default = "default_include_cone")]
    pub include_cone: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub obstructions: Vec<ObstructionConfig>,
}

fn default_diameter() -> f64 { 100.0 }
fn default_pivot_radius() -> f64 { 58.771 }
fn default_port_location() -> PortLocation { PortLocation::Named("E".to_string()) }
fn default_cone_full_angle() -> f64 { 80.0 }
fn default_include_cone() -> bool { true }

impl Default for LaPDXYExclusionConfig {
    fn default() -> Self {
        Self {
            diameter: default_diameter(),
            pivot_radius: default_pivot_radius(),
            port_location: default_port_location(),
            cone_full_angle: default_cone_full_angle(),
            include_cone: default_include_cone(),
            obstructions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
struct Cone {
    upper: DividerExclusion,
    lower: DividerExclusion,
    port: DividerExclusion,
}

#[derive(Debug, Clone)]
pub struct LaPDXYExclusion {
    diameter: f64,
    pivot_radius: f64,
    port_degrees: f64,
    cone_full_angle: f64,
    include_cone: bool,
    obstructions: Vec<ObstructionConfig>,
    chamber: CircularExclusion,
    cone: Option<Cone>,
    shadows: Vec<Shadow2DExclusion>,
}

/// Below this a line direction's x component counts as vertical.
const VERTICAL_EPS: f64 = 1e-12;

fn line_through(p: [f64; 2], direction: [f64; 2]) -> [f64; 2] {
    if direction[0].abs() <= VERTICAL_EPS * direction[1].abs() {
        return [f64::INFINITY, p[0]];
    }
    let slope = direction[1] / direction[0];
    [slope, p[1] - slope * p[0]]
}

impl LaPDXYExclusion {
    pub fn new(config: &LaPDXYExclusionConfig, space: &Space) -> Result<Self, ExclusionError> {
        require_2d("lapd_xy", space)?;
        positive("lapd_xy", "diameter", config.diameter)?;
        positive("lapd_xy", "pivot_radius", config.pivot_radius)?;
        let port_degrees = config.port_location.degrees()?;
        let invalid = |reason: String| ExclusionError::InvalidConfig {
            exclusion: "lapd_xy",
            reason,
        };

        let radius = 0.5 * config.diameter;
        let chamber = CircularExclusion::from_parts(radius, [0.0, 0.0], CircleRegion::Outside);

        let theta = port_degrees.to_radians();
        let (sin_t, cos_t) = theta.sin_cos();
        let pivot = [config.pivot_radius * cos_t, config.pivot_radius * sin_t];

        let cone = if config.include_cone {
            if !(config.cone_full_angle > 0.0 && config.cone_full_angle < 180.0) {
                return Err(invalid(format!(
                    "'cone_full_angle' must be within (0, 180) degrees, got {}",
                    config.cone_full_angle
                )));
            }
            if config.pivot_radius <= radius {
                return Err(invalid(format!(
                    "'pivot_radius' ({}) must lie outside the chamber wall (radius {})",
                    config.pivot_radius, radius
                )));
            }
            let alpha = 0.5 * config.cone_full_angle.to_radians();
            let (sin_a, cos_a) = alpha.sin_cos();
            let reach = config.pivot_radius * sin_a / radius;
            if reach > 1.0 {
                return Err(invalid(format!(
                    "a {} degree cone from radius {} never meets the chamber wall",
                    config.cone_full_angle, config.pivot_radius
                )));
            }

            // cone edge trajectories rotated from the east port frame
            let edge = |sign: f64| {
                let (tx, ty) = (-cos_a, sign * sin_a);
                let direction = [tx * cos_t - ty * sin_t, tx * sin_t + ty * cos_t];
                let mb = line_through(pivot, direction);
                DividerExclusion::from_parts(mb, DividerExclusion::side_away_from_origin(mb))
            };
            let upper = edge(1.0)?;
            let lower = edge(-1.0)?;

            // angle subtended at the chamber center by half the port chord
            let beta = reach.asin() - alpha;
            let pt1 = [radius * (theta + beta).cos(), radius * (theta + beta).sin()];
            let pt2 = [radius * (theta - beta).cos(), radius * (theta - beta).sin()];
            let port_mb = line_through(pt1, [pt2[0] - pt1[0], pt2[1] - pt1[1]]);
            let port_side = DividerExclusion::side_away_from_origin(port_mb).opposite();
            let port = DividerExclusion::from_parts(port_mb, port_side)?;

            Some(Cone { upper, lower, port })
        } else {
            None
        };

        let shadows = config
            .obstructions
            .iter()
            .map(|ob| Shadow2DExclusion::from_parts(pivot, ob.center, ob.radius))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            diameter: config.diameter,
            pivot_radius: config.pivot_radius,
            port_degrees,
            cone_full_angle: config.cone_full_angle,
            include_cone: config.include_cone,
            obstructions: config.obstructions.clone(),
            chamber,
            cone,
            shadows,
        })
    }

    /// Where the probe enters the chamber.
    pub fn insertion_point(&self) -> [f64; 2] {
        let theta = self.port_degrees.to_radians();
        [self.pivot_radius * theta.cos(), self.pivot_radius * theta.sin()]
    }

    pub fn port_degrees(&self) -> f64 {
        self.port_degrees
    }

    /// Child exclusion by its role name.
    pub fn exclusion_by_name(&self, name: &str) -> Option<&dyn Exclusion> {
        match name {
            "chamber" => Some(&self.chamber),
            "divider_upper" => self.cone.as_ref().map(|c| &c.upper as &dyn Exclusion),
            "divider_lower" => self.cone.as_ref().map(|c| &c.lower as &dyn Exclusion),
            "divider_port" => self.cone.as_ref().map(|c| &c.port as &dyn Exclusion),
            _ => name
                .strip_prefix("shadow_")
                .and_then(|i| i.parse::<usize>().ok())
                .and_then(|i| self.shadows.get(i))
                .map(|s| s as &dyn Exclusion),
        }
    }
}

impl Exclusion for LaPDXYExclusion {
    fn exclusion_type(&self) -> &'static str {
        "lapd_xy"
    }

    fn is_excluded(&self, point: &[f64]) -> bool {
        if point.len() != 2 {
            return true;
        }
        let mut allowed = !self.chamber.is_excluded(point);
        if let Some(cone) = &self.cone {
            allowed = (allowed || !cone.port.is_excluded(point))
                && !cone.upper.is_excluded(point)
                && !cone.lower.is_excluded(point);
        }
        allowed = allowed && self.shadows.iter().all(|s| !s.is_excluded(point));
        !allowed
    }

    fn governs(&self) -> bool {
        true
    }

    fn composed_exclusions(&self) -> Vec<&dyn Exclusion> {
        let mut children: Vec<&dyn Exclusion> = vec![&self.chamber];
        if let Some(cone) = &self.cone {
            children.push(&cone.upper);
            children.push(&cone.lower);
            children.push(&cone.port);
        }
        children.extend(self.shadows.iter().map(|s| s as &dyn Exclusion));
        children
    }

    fn config(&self) -> ExclusionConfig {
        ExclusionConfig::LaPDXY(LaPDXYExclusionConfig {
            diameter: self.diameter,
            pivot_radius: self.pivot_radius,
            port_location: PortLocation::Angle(self.port_degrees),
            cone_full_angle: self.cone_full_angle,
            include_cone: self.include_cone,
            obstructions: self.obstructions.clone(),
        })
    }

    /// Built by combining the child masks.
    fn mask(&self, space: &Space) -> Mask {
        let mut mask = self.chamber.mask(space);
        match self.combine_children(space, &mut mask) {
            Ok(()) => mask,
            Err(err) => {
                tracing::warn!("Falling back to predicate mask for 'lapd_xy': {}", err);
                space.mask_where(|p| !self.is_excluded(p))
            }
        }
    }
}

impl LaPDXYExclusion {
    fn combine_children(&self, space: &Space, mask: &mut Mask) -> Result<(), ShapeError> {
        if let Some(cone) = &self.cone {
            mask.or_assign(&cone.port.mask(space))?;
            mask.and_assign(&cone.upper.mask(space))?;
            mask.and_assign(&cone.lower.mask(space))?;
        }
        for shadow in &self.shadows {
            mask.and_assign(&shadow.mask(space))?;
        }
        Ok(())
    }
}

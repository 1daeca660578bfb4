//! Game-side collaborators of the planner: combatants, terrain, weapons,
//! physics, and the live session the plans are applied to.

pub mod physics;
pub mod session;
pub mod snapshot;
pub mod team;
pub mod terrain;
pub mod weapon;

pub use physics::{BallisticPredictor, PhysicsSystem, TrajectoryPredictor};
pub use session::{GameSession, SessionCommand, TurnPhase};
pub use snapshot::SessionSnapshot;
pub use team::{Combatant, CombatantId, Team, TeamId};
pub use terrain::{Terrain, TerrainQuery};
pub use weapon::{WeaponClass, WeaponKind, WeaponStats};

use serde::{Deserialize, Serialize};

/// 2D point / vector in world space (x right, y down)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector for an aim angle (y down, so negative angles point up)
    pub fn from_angle(angle: f32) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    pub fn distance(self, other: Vec2) -> f32 {
        self.distance_sq(other).sqrt()
    }

    pub fn distance_sq(self, other: Vec2) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;

    fn add(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, factor: f32) -> Vec2 {
        Vec2::new(self.x * factor, self.y * factor)
    }
}

/// Angle for a launch `elevation` radians above horizontal toward `facing`
pub fn angle_from_elevation(facing: f32, elevation: f32) -> f32 {
    if facing >= 0.0 {
        -elevation
    } else {
        elevation - std::f32::consts::PI
    }
}

/// Elevation above horizontal of the line from `from` to `to` (positive = up)
pub fn elevation_toward(from: Vec2, to: Vec2) -> f32 {
    (from.y - to.y).atan2((to.x - from.x).abs())
}

/// Horizontal sign of an aim angle
pub fn facing_for_angle(angle: f32) -> f32 {
    if angle.cos() >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

//! Flight prediction and terrain-following walk physics

use crate::util::time::{tick_delta, ticks_for_millis};

use super::terrain::TerrainQuery;
use super::weapon::{WeaponClass, WeaponKind};
use super::{Combatant, Vec2};

/// Downward acceleration (world units per second squared)
pub const GRAVITY: f32 = 900.0;
/// Horizontal acceleration per unit of wind
pub const WIND_ACCELERATION: f32 = 150.0;
/// Walking speed on flat ground
pub const WALK_SPEED: f32 = 70.0;
/// Tallest step a walker climbs without jumping
pub const MAX_CLIMB: f32 = 7.0;
/// Deepest drop a walker follows without falling
pub const MAX_DROP: f32 = 7.0;
pub const JUMP_VELOCITY: Vec2 = Vec2::new(120.0, -280.0);
/// Hit-scan ray march step
const RAY_STEP: f32 = 4.0;
/// Weapon is held slightly above and in front of the body center
const HAND_OFFSET: f32 = 3.0;
/// Airborne ticks simulated after a step so the walker ends at rest
const SETTLE_TICKS: u32 = 120;

/// Predicts a shot's flight path. The last point is the deemed impact.
pub trait TrajectoryPredictor: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    fn predict(
        &self,
        weapon: WeaponKind,
        shooter: &Combatant,
        angle: f32,
        power: f32,
        wind: f32,
        terrain: &dyn TerrainQuery,
        width: f32,
        height: f32,
    ) -> Vec<Vec2>;
}

/// Fixed-step ballistic integrator for projectiles and ray march for hit-scan
#[derive(Debug, Clone, Copy, Default)]
pub struct BallisticPredictor;

impl BallisticPredictor {
    fn muzzle(shooter: &Combatant, direction: Vec2, projectile_radius: f32) -> Vec2 {
        let hand = Vec2::new(shooter.facing * HAND_OFFSET, -HAND_OFFSET);
        shooter.position + hand + direction * (shooter.radius + projectile_radius + 2.0)
    }

    fn out_of_bounds(p: Vec2, width: f32, height: f32) -> bool {
        p.x < 0.0 || p.x > width || p.y > height
    }
}

impl TrajectoryPredictor for BallisticPredictor {
    fn predict(
        &self,
        weapon: WeaponKind,
        shooter: &Combatant,
        angle: f32,
        power: f32,
        wind: f32,
        terrain: &dyn TerrainQuery,
        width: f32,
        height: f32,
    ) -> Vec<Vec2> {
        let stats = weapon.stats();
        let direction = Vec2::from_angle(angle);
        let mut pos = Self::muzzle(shooter, direction, stats.projectile_radius);
        let mut points = vec![pos];

        match stats.class {
            WeaponClass::Arcing => {
                let dt = tick_delta();
                let mut vel = direction * (stats.max_speed * power.clamp(0.0, 1.0));
                let wind_accel = wind * WIND_ACCELERATION * stats.wind_influence;
                let max_ticks = (stats.fuse / dt).ceil() as u32;

                for _ in 0..max_ticks {
                    vel.y += GRAVITY * dt;
                    vel.x += wind_accel * dt;
                    pos = pos + vel * dt;
                    points.push(pos);
                    if Self::out_of_bounds(pos, width, height) || terrain.is_solid(pos.x, pos.y) {
                        break;
                    }
                }
            }
            WeaponClass::HitScan | WeaponClass::Burst => {
                let steps = (stats.range / RAY_STEP).ceil() as u32;
                for _ in 0..steps {
                    pos = pos + direction * RAY_STEP;
                    points.push(pos);
                    if pos.y < 0.0
                        || Self::out_of_bounds(pos, width, height)
                        || terrain.is_solid(pos.x, pos.y)
                    {
                        break;
                    }
                }
            }
        }

        points
    }
}

/// Where a walker ends up after trying to move onto column `x`
enum Footing {
    Ground(f32),
    Blocked,
    Air,
}

/// Physics system for moving combatants over terrain
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Walk (optionally starting with a jump) for `duration_ms`, then let the
    /// walker settle. Returns the distance between start and end positions.
    pub fn simulate_walk(
        combatant: &mut Combatant,
        terrain: &dyn TerrainQuery,
        direction: f32,
        duration_ms: u64,
        jump: bool,
        water_y: f32,
    ) -> f32 {
        let start = combatant.position;
        if !combatant.alive {
            return 0.0;
        }

        let dt = tick_delta();
        let direction = if direction >= 0.0 { 1.0 } else { -1.0 };
        combatant.facing = direction;

        if jump && combatant.grounded {
            combatant.velocity = Vec2::new(direction * JUMP_VELOCITY.x, JUMP_VELOCITY.y);
            combatant.grounded = false;
        }

        let walk_ticks = ticks_for_millis(duration_ms);
        for _ in 0..walk_ticks {
            if combatant.grounded {
                Self::walk_tick(combatant, terrain, direction, dt);
            } else {
                Self::air_tick(combatant, terrain, dt);
            }
            if Self::drowned(combatant, water_y, terrain.height()) {
                return start.distance(combatant.position);
            }
        }

        for _ in 0..SETTLE_TICKS {
            if combatant.grounded {
                break;
            }
            Self::air_tick(combatant, terrain, dt);
            if Self::drowned(combatant, water_y, terrain.height()) {
                break;
            }
        }

        start.distance(combatant.position)
    }

    fn footing(terrain: &dyn TerrainQuery, x: f32, feet: f32) -> Footing {
        if terrain.is_solid(x, feet - MAX_CLIMB - 0.5) {
            return Footing::Blocked;
        }
        let mut y = feet - MAX_CLIMB;
        while y <= feet + MAX_DROP {
            if terrain.is_solid(x, y) {
                return Footing::Ground(y);
            }
            y += 1.0;
        }
        Footing::Air
    }

    fn walk_tick(combatant: &mut Combatant, terrain: &dyn TerrainQuery, direction: f32, dt: f32) {
        let next_x = combatant.position.x + direction * WALK_SPEED * dt;
        if next_x < combatant.radius || next_x > terrain.width() - combatant.radius {
            combatant.velocity = Vec2::ZERO;
            return;
        }

        let feet = combatant.position.y + combatant.radius;
        match Self::footing(terrain, next_x, feet) {
            Footing::Ground(y) => {
                combatant.position = Vec2::new(next_x, y - combatant.radius);
                combatant.velocity = Vec2::new(direction * WALK_SPEED, 0.0);
            }
            Footing::Blocked => {
                combatant.velocity = Vec2::ZERO;
            }
            Footing::Air => {
                combatant.position.x = next_x;
                combatant.velocity = Vec2::new(direction * WALK_SPEED, 0.0);
                combatant.grounded = false;
            }
        }
    }

    fn air_tick(combatant: &mut Combatant, terrain: &dyn TerrainQuery, dt: f32) {
        combatant.velocity.y += GRAVITY * dt;
        let mut next = combatant.position + combatant.velocity * dt;

        // Side or ceiling contact
        if terrain.is_solid(next.x, next.y) {
            if terrain.is_solid(next.x, combatant.position.y) {
                combatant.velocity.x = 0.0;
                next.x = combatant.position.x;
            }
            if combatant.velocity.y < 0.0 && terrain.is_solid(next.x, next.y - combatant.radius) {
                combatant.velocity.y = 0.0;
                next.y = combatant.position.y;
            }
        }

        let feet = next.y + combatant.radius;
        if combatant.velocity.y >= 0.0 && terrain.is_solid(next.x, feet) {
            let mut ground = feet;
            while ground > feet - 2.0 * combatant.radius && terrain.is_solid(next.x, ground - 1.0) {
                ground -= 1.0;
            }
            combatant.position = Vec2::new(next.x, ground - combatant.radius);
            combatant.velocity = Vec2::ZERO;
            combatant.grounded = true;
            return;
        }

        combatant.position = next;
    }

    fn drowned(combatant: &mut Combatant, water_y: f32, height: f32) -> bool {
        if combatant.position.y + combatant.radius > water_y || combatant.position.y > height {
            combatant.alive = false;
            combatant.health = 0.0;
            combatant.grounded = false;
            return true;
        }
        false
    }

    /// Distance from a point to the closest point of a path
    pub fn min_distance_to_path(path: &[Vec2], point: Vec2) -> (f32, Vec2) {
        path.iter()
            .map(|p| (p.distance(point), *p))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .unwrap_or((f32::INFINITY, point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{TeamId, Terrain};

    fn grounded_on(terrain: &Terrain, x: f32) -> Combatant {
        let y = terrain.surface_y(x) - 10.0;
        Combatant::new("walker", TeamId(1), x, y)
    }

    #[test]
    fn walking_on_flat_ground_moves_horizontally() {
        let terrain = Terrain::flat(800, 400, 300.0);
        let mut walker = grounded_on(&terrain, 200.0);
        let moved = PhysicsSystem::simulate_walk(&mut walker, &terrain, 1.0, 260, false, 380.0);
        assert!(moved > 10.0);
        assert!(walker.position.x > 200.0);
        assert!(walker.grounded);
        assert_eq!(walker.facing, 1.0);
    }

    #[test]
    fn wall_blocks_walking() {
        let terrain = Terrain::from_surface(800, 400, 4, |x| if x > 220.0 { 200.0 } else { 300.0 });
        let mut walker = grounded_on(&terrain, 205.0);
        PhysicsSystem::simulate_walk(&mut walker, &terrain, 1.0, 520, false, 380.0);
        assert!(walker.position.x < 221.0);
    }

    #[test]
    fn arcing_shot_lands_on_terrain() {
        let terrain = Terrain::flat(800, 400, 300.0);
        let shooter = grounded_on(&terrain, 100.0);
        let path = BallisticPredictor.predict(
            WeaponKind::Grenade,
            &shooter,
            -0.8,
            0.6,
            0.0,
            &terrain,
            800.0,
            400.0,
        );
        let impact = path.last().copied().unwrap();
        assert!(impact.x > shooter.position.x);
        assert!(impact.y >= 299.0);
    }

    #[test]
    fn rifle_ray_stops_at_range() {
        let terrain = Terrain::flat(2000, 400, 300.0);
        let shooter = grounded_on(&terrain, 100.0);
        let path = BallisticPredictor.predict(
            WeaponKind::Rifle,
            &shooter,
            0.0,
            1.0,
            0.0,
            &terrain,
            2000.0,
            400.0,
        );
        let travelled = path.first().unwrap().distance(*path.last().unwrap());
        assert!(travelled <= 900.0 + 0.01);
    }
}

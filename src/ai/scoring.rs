//! Candidate scoring: simulate one (weapon, angle, power) and rate it
//!
//! The score is a plain sum of named terms so every decision can be audited
//! through its [`ScoreBreakdown`].

use serde::{Deserialize, Serialize};

use crate::game::{
    facing_for_angle, Combatant, PhysicsSystem, TerrainQuery, Vec2, WeaponClass, WeaponKind,
};

use super::personality::Personality;
use super::PlanningContext;

/// Distance of the aim point from the shooter
const AIM_DISTANCE: f32 = 80.0;
/// Column spacing when scanning for cover between shooter and target
const RIDGE_SCAN_STEP: f32 = 4.0;

/// Every term that went into a candidate's score
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub total: f32,
    pub damage: f32,
    pub splash_proximity: f32,
    pub arc_bonus: f32,
    pub water_bonus: f32,
    pub weapon_bias: f32,
    pub self_damage: f32,
    pub risk_multiplier: f32,
    /// Impact (or closest ray point) to target center
    pub target_distance: f32,
    /// Impact to shooter center
    pub self_distance: f32,
    pub hit_factor: f32,
    pub expected_hits: f32,
    pub direct_hit: bool,
}

impl ScoreBreakdown {
    pub fn format_short(&self) -> String {
        format!(
            "Total: {:.1} [D: {:.1}, Sp: {:.2}, Arc: {:.2}, W: {:.0}, B: {:.2}, Self: {:.1}x{:.1}]",
            self.total,
            self.damage,
            self.splash_proximity,
            self.arc_bonus,
            self.water_bonus,
            self.weapon_bias,
            self.self_damage,
            self.risk_multiplier
        )
    }
}

/// One fully specified hypothetical shot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotCandidate {
    pub weapon: WeaponKind,
    pub angle: f32,
    pub power: f32,
    pub aim_point: Vec2,
    pub impact_point: Vec2,
    pub score: f32,
    pub breakdown: ScoreBreakdown,
}

/// Points the combatant's facing at an aim direction until dropped
struct FacingOverride<'a> {
    combatant: &'a mut Combatant,
    saved: f32,
}

impl<'a> FacingOverride<'a> {
    fn new(combatant: &'a mut Combatant, facing: f32) -> Self {
        let saved = combatant.facing;
        combatant.facing = facing;
        Self { combatant, saved }
    }
}

impl Drop for FacingOverride<'_> {
    fn drop(&mut self) {
        self.combatant.facing = self.saved;
    }
}

/// `falloff(distance)^exponent`, zero outside the blast
fn blast_factor(distance: f32, radius: f32, exponent: f32) -> f32 {
    if radius <= 0.0 {
        return 0.0;
    }
    let falloff = (1.0 - distance / radius).clamp(0.0, 1.0);
    if falloff <= 0.0 {
        0.0
    } else {
        falloff.powf(exponent)
    }
}

/// Highest terrain (smallest y) strictly between the two columns
fn ridge_between(terrain: &dyn TerrainQuery, a: f32, b: f32) -> Option<f32> {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut x = lo + RIDGE_SCAN_STEP;
    let mut ridge: Option<f32> = None;
    while x < hi {
        let y = terrain.surface_y(x);
        ridge = Some(ridge.map_or(y, |r: f32| r.min(y)));
        x += RIDGE_SCAN_STEP;
    }
    ridge
}

/// Simulate and score one candidate shot
#[allow(clippy::too_many_arguments)]
pub fn score_candidate(
    ctx: &PlanningContext<'_>,
    shooter: &mut Combatant,
    target: &Combatant,
    weapon: WeaponKind,
    angle: f32,
    power: f32,
    cinematic: bool,
    personality: Personality,
) -> ShotCandidate {
    let stats = weapon.stats();
    let weights = ctx.scoring;

    let path = {
        let aimed = FacingOverride::new(shooter, facing_for_angle(angle));
        ctx.predictor.predict(
            weapon,
            &*aimed.combatant,
            angle,
            power,
            ctx.wind,
            ctx.terrain,
            ctx.width,
            ctx.height,
        )
    };

    let aim_point = shooter.position + Vec2::from_angle(angle) * AIM_DISTANCE;
    let terminal = path.last().copied().unwrap_or(shooter.position);
    let (closest_distance, closest_point) =
        PhysicsSystem::min_distance_to_path(&path, target.position);

    let mut breakdown = ScoreBreakdown {
        weapon_bias: personality.weapon_bias(weapon),
        risk_multiplier: personality.risk_multiplier(),
        ..Default::default()
    };

    let impact = match stats.class {
        WeaponClass::Arcing => {
            let contact = target.radius + stats.projectile_radius;
            let direct = stats.direct_hit && closest_distance <= contact;
            let impact = if direct { closest_point } else { terminal };
            let radius = stats.explosion_radius;
            breakdown.direct_hit = direct;
            breakdown.target_distance = impact.distance(target.position);
            breakdown.self_distance = impact.distance(shooter.position);
            breakdown.damage = stats.damage
                * blast_factor(breakdown.target_distance, radius, weights.falloff_exponent);
            breakdown.splash_proximity =
                (1.0 - breakdown.target_distance / (2.0 * radius)).clamp(0.0, 1.0);
            breakdown.self_damage = stats.damage
                * blast_factor(breakdown.self_distance, radius, weights.falloff_exponent);

            if cinematic {
                breakdown.arc_bonus = arc_over_cover(ctx, shooter, target, &path);
                let target_near_water =
                    ctx.water_y - (target.position.y + target.radius) <= weights.water_margin;
                let lands_in_water = impact.y >= ctx.water_y
                    && (impact.x - target.position.x).abs() <= 2.0 * radius;
                if target_near_water && lands_in_water {
                    breakdown.water_bonus = 1.0;
                }
            }
            impact
        }
        WeaponClass::HitScan | WeaponClass::Burst => {
            let hit_radius = target.radius * weights.hit_radius_scale;
            let hit_factor = (1.0 - closest_distance / hit_radius).clamp(0.0, 1.0);
            breakdown.hit_factor = hit_factor;
            breakdown.target_distance = closest_distance;
            breakdown.self_distance = terminal.distance(shooter.position);
            breakdown.direct_hit = hit_factor > 0.0;
            breakdown.damage = stats.damage * hit_factor;
            if stats.class == WeaponClass::Burst {
                let range = shooter.position.distance(target.position);
                let range_factor = (1.0 - range / weights.burst_range).clamp(0.0, 1.0);
                breakdown.expected_hits =
                    stats.burst_count as f32 * weights.burst_hit_rate * range_factor;
                breakdown.damage *= breakdown.expected_hits;
            } else {
                breakdown.expected_hits = hit_factor;
            }
            if hit_factor > 0.0 {
                closest_point
            } else {
                terminal
            }
        }
    };

    breakdown.total = (breakdown.damage
        + breakdown.splash_proximity * weights.splash
        + breakdown.arc_bonus * weights.arc_bonus
        + breakdown.water_bonus * weights.water_bonus)
        * breakdown.weapon_bias
        - breakdown.self_damage * breakdown.risk_multiplier * weights.self_damage;

    ShotCandidate {
        weapon,
        angle,
        power,
        aim_point,
        impact_point: impact,
        score: breakdown.total,
        breakdown,
    }
}

/// Bonus in `[0, 1]` for lobbing over a ridge that hides the target
fn arc_over_cover(
    ctx: &PlanningContext<'_>,
    shooter: &Combatant,
    target: &Combatant,
    path: &[Vec2],
) -> f32 {
    let Some(ridge_y) = ridge_between(ctx.terrain, shooter.position.x, target.position.x) else {
        return 0.0;
    };
    let cover = shooter.position.y.min(target.position.y) - ridge_y;
    if cover <= 0.0 {
        return 0.0;
    }
    let apex_y = path.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
    if apex_y >= ridge_y {
        return 0.0;
    }
    (cover / ctx.scoring.arc_reference_height).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringWeights;
    use crate::game::{BallisticPredictor, Team, TeamId, Terrain, TrajectoryPredictor};
    use std::f32::consts::PI;

    /// Flies from the shooter through fixed waypoints
    struct ScriptedPath(Vec<Vec2>);

    impl TrajectoryPredictor for ScriptedPath {
        fn predict(
            &self,
            _weapon: WeaponKind,
            shooter: &Combatant,
            _angle: f32,
            _power: f32,
            _wind: f32,
            _terrain: &dyn TerrainQuery,
            _width: f32,
            _height: f32,
        ) -> Vec<Vec2> {
            let mut path = vec![shooter.position];
            path.extend_from_slice(&self.0);
            path
        }
    }

    fn world() -> (Terrain, Vec<Team>) {
        let terrain = Terrain::flat(1000, 500, 400.0);
        let red = Team::with_positions(TeamId(1), "red", &[(200.0, 390.0)]);
        let blue = Team::with_positions(TeamId(2), "blue", &[(500.0, 390.0)]);
        (terrain, vec![red, blue])
    }

    fn context<'a>(
        teams: &'a [Team],
        terrain: &'a Terrain,
        predictor: &'a dyn TrajectoryPredictor,
        water_y: f32,
    ) -> PlanningContext<'a> {
        PlanningContext::new(teams, terrain, predictor, 0.0, water_y, ScoringWeights::default())
    }

    /// Score a shot fired by the first red at the first blue
    fn score(
        ctx: &PlanningContext<'_>,
        weapon: WeaponKind,
        angle: f32,
        power: f32,
        cinematic: bool,
        personality: Personality,
    ) -> ShotCandidate {
        let mut shooter = ctx.teams[0].combatants[0].clone();
        let target = &ctx.teams[1].combatants[0];
        score_candidate(ctx, &mut shooter, target, weapon, angle, power, cinematic, personality)
    }

    #[test]
    fn direct_bazooka_impact_scores_full_damage_plus_splash() {
        let (terrain, teams) = world();
        let predictor = ScriptedPath(vec![Vec2::new(500.0, 390.0)]);
        let ctx = context(&teams, &terrain, &predictor, 480.0);

        let c = score(&ctx, WeaponKind::Bazooka, -0.5, 0.8, false, Personality::Generalist);
        assert!(c.breakdown.direct_hit);
        assert!((c.breakdown.damage - 50.0).abs() < 1e-3);
        assert!((c.breakdown.splash_proximity - 1.0).abs() < 1e-6);
        assert_eq!(c.breakdown.self_damage, 0.0);
        assert!((c.score - 72.0).abs() < 1e-3);
    }

    #[test]
    fn self_damage_is_weighted_by_risk() {
        let (terrain, teams) = world();
        // Lands on the shooter's own feet
        let predictor = ScriptedPath(vec![Vec2::new(200.0, 400.0)]);
        let ctx = context(&teams, &terrain, &predictor, 480.0);

        let generalist = score(
            &ctx,
            WeaponKind::Grenade,
            -0.5,
            0.3,
            false,
            Personality::Generalist,
        );
        let marksman = score(&ctx, WeaponKind::Grenade, -0.5, 0.3, false, Personality::Marksman);
        assert!(generalist.score < 0.0);
        assert!(marksman.score < generalist.score * 1.1);
        let self_damage_gap = marksman.breakdown.self_damage - generalist.breakdown.self_damage;
        assert!(self_damage_gap.abs() < 1e-6);
    }

    #[test]
    fn facing_is_restored_after_scoring() {
        let (terrain, teams) = world();
        let ctx = context(&teams, &terrain, &BallisticPredictor, 480.0);
        let mut shooter = teams[0].combatants[0].clone();
        shooter.facing = 1.0;
        let target = &teams[1].combatants[0];
        score_candidate(
            &ctx,
            &mut shooter,
            target,
            WeaponKind::Bazooka,
            PI - 0.4,
            0.7,
            true,
            Personality::Demolisher,
        );
        assert_eq!(shooter.facing, 1.0);
    }

    #[test]
    fn lob_over_a_ridge_earns_the_arc_bonus() {
        // A 150px ridge between the two combatants
        let terrain = Terrain::from_surface(1000, 500, 4, |x| {
            if (300.0..400.0).contains(&x) {
                250.0
            } else {
                400.0
            }
        });
        let (_, teams) = world();
        let over = ScriptedPath(vec![Vec2::new(350.0, 100.0), Vec2::new(500.0, 390.0)]);
        let ctx = context(&teams, &terrain, &over, 480.0);

        let cinematic = score(&ctx, WeaponKind::Grenade, -1.0, 0.7, true, Personality::Generalist);
        let plain = score(&ctx, WeaponKind::Grenade, -1.0, 0.7, false, Personality::Generalist);
        assert_eq!(cinematic.breakdown.arc_bonus, 1.0);
        assert_eq!(cinematic.breakdown.water_bonus, 0.0);
        assert_eq!(plain.breakdown.arc_bonus, 0.0);
        assert!((cinematic.score - plain.score - 18.0).abs() < 1e-3);

        // Same impact, but the path never rises above the ridge
        let under = ScriptedPath(vec![Vec2::new(350.0, 300.0), Vec2::new(500.0, 390.0)]);
        let ctx = context(&teams, &terrain, &under, 480.0);
        let low = score(&ctx, WeaponKind::Grenade, -0.3, 0.7, true, Personality::Generalist);
        assert_eq!(low.breakdown.arc_bonus, 0.0);
    }

    #[test]
    fn splash_into_the_water_earns_the_water_bonus() {
        let terrain = Terrain::flat(1000, 500, 450.0);
        let teams = vec![
            Team::with_positions(TeamId(1), "red", &[(200.0, 440.0)]),
            Team::with_positions(TeamId(2), "blue", &[(500.0, 440.0)]),
        ];
        // Target feet sit 30px above the water; the shell drops just past it
        let splash = ScriptedPath(vec![Vec2::new(400.0, 300.0), Vec2::new(520.0, 490.0)]);
        let ctx = context(&teams, &terrain, &splash, 480.0);

        let cinematic = score(&ctx, WeaponKind::Bazooka, -0.8, 0.6, true, Personality::Generalist);
        let plain = score(&ctx, WeaponKind::Bazooka, -0.8, 0.6, false, Personality::Generalist);
        assert!(!cinematic.breakdown.direct_hit);
        assert_eq!(cinematic.breakdown.water_bonus, 1.0);
        assert_eq!(cinematic.breakdown.arc_bonus, 0.0);
        assert_eq!(plain.breakdown.water_bonus, 0.0);
        assert!((cinematic.score - plain.score - 70.0).abs() < 1e-3);

        // A target well above the water gets nothing for the same splash
        let high = context(&teams, &terrain, &splash, 600.0);
        let dry = score(&high, WeaponKind::Bazooka, -0.8, 0.6, true, Personality::Generalist);
        assert_eq!(dry.breakdown.water_bonus, 0.0);
    }

    #[test]
    fn rifle_on_the_level_hits_and_has_no_splash() {
        let (terrain, teams) = world();
        let ctx = context(&teams, &terrain, &BallisticPredictor, 480.0);
        let shooter = &teams[0].combatants[0];
        let target = &teams[1].combatants[0];
        let dy = target.position.y - (shooter.position.y - 3.0);
        let angle = dy.atan2(target.position.x - shooter.position.x);

        let c = score(&ctx, WeaponKind::Rifle, angle, 1.0, false, Personality::Marksman);
        assert!(c.breakdown.hit_factor > 0.5);
        assert_eq!(c.breakdown.splash_proximity, 0.0);
        assert_eq!(c.breakdown.self_damage, 0.0);
        assert!(c.score > 35.0 * 0.5);
    }

    #[test]
    fn uzi_out_of_burst_range_is_worthless() {
        let terrain = Terrain::flat(1000, 500, 400.0);
        let teams = vec![
            Team::with_positions(TeamId(1), "red", &[(100.0, 390.0)]),
            Team::with_positions(TeamId(2), "blue", &[(750.0, 390.0)]),
        ];
        let predictor = ScriptedPath(vec![Vec2::new(750.0, 390.0)]);
        let ctx = context(&teams, &terrain, &predictor, 480.0);
        let c = score(&ctx, WeaponKind::Uzi, 0.0, 1.0, false, Personality::Commando);
        assert_eq!(c.breakdown.expected_hits, 0.0);
        assert_eq!(c.score, 0.0);
    }
}

//! Fixed candidate set for a shooter/target pair

use crate::game::{Combatant, Vec2, WeaponKind};

use super::personality::Personality;
use super::scoring::{score_candidate, ShotCandidate};
use super::PlanningContext;

/// Angle offsets around the lifted base angle for arcing weapons
pub const ARC_ANGLE_OFFSETS: [f32; 9] = [0.0, -0.1, 0.1, -0.2, 0.2, -0.35, 0.35, -0.5, 0.5];
/// Launch powers tried for arcing weapons
pub const ARC_POWERS: [f32; 5] = [0.35, 0.5, 0.65, 0.8, 0.95];
/// Upward tilt applied to the direct angle before offsets for arcing weapons
pub const ARC_LIFT: f32 = 0.45;

/// Upper bound on candidates produced by one call
pub const MAX_CANDIDATES: usize =
    2 * ARC_ANGLE_OFFSETS.len() * ARC_POWERS.len() + 2;

/// Direct angle from shooter to target
pub fn direct_angle(shooter: Vec2, target: Vec2) -> f32 {
    (target.y - shooter.y).atan2(target.x - shooter.x)
}

/// Tilt `angle` upward by `lift`, keeping its horizontal side
pub fn lifted(angle: f32, lift: f32) -> f32 {
    if angle.cos() >= 0.0 {
        angle - lift
    } else {
        angle + lift
    }
}

/// Score every candidate across all weapons
pub fn generate_candidates(
    ctx: &PlanningContext<'_>,
    shooter: &mut Combatant,
    target: &Combatant,
    cinematic: bool,
    personality: Personality,
) -> Vec<ShotCandidate> {
    let base = direct_angle(shooter.position, target.position);
    let mut candidates = Vec::with_capacity(MAX_CANDIDATES);

    for weapon in WeaponKind::ALL {
        if weapon.stats().is_hit_scan() {
            candidates.push(score_candidate(
                ctx,
                shooter,
                target,
                weapon,
                base,
                1.0,
                cinematic,
                personality,
            ));
            continue;
        }

        let arc_base = lifted(base, ARC_LIFT);
        for offset in ARC_ANGLE_OFFSETS {
            for power in ARC_POWERS {
                candidates.push(score_candidate(
                    ctx,
                    shooter,
                    target,
                    weapon,
                    arc_base + offset,
                    power,
                    cinematic,
                    personality,
                ));
            }
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringWeights;
    use crate::game::{BallisticPredictor, Team, TeamId, Terrain};

    #[test]
    fn produces_the_fixed_candidate_count() {
        let terrain = Terrain::flat(1000, 500, 400.0);
        let teams = vec![
            Team::with_positions(TeamId(1), "red", &[(200.0, 390.0)]),
            Team::with_positions(TeamId(2), "blue", &[(600.0, 390.0)]),
        ];
        let ctx = PlanningContext::new(
            &teams,
            &terrain,
            &BallisticPredictor,
            0.0,
            480.0,
            ScoringWeights::default(),
        );
        let mut shooter = teams[0].combatants[0].clone();
        let candidates = generate_candidates(
            &ctx,
            &mut shooter,
            &teams[1].combatants[0],
            false,
            Personality::Generalist,
        );

        assert_eq!(candidates.len(), 92);
        assert_eq!(candidates.len(), MAX_CANDIDATES);
        let hit_scan: Vec<_> = candidates
            .iter()
            .filter(|c| matches!(c.weapon, WeaponKind::Rifle | WeaponKind::Uzi))
            .collect();
        assert_eq!(hit_scan.len(), 2);
        assert!(hit_scan.iter().all(|c| c.power == 1.0));
    }

    #[test]
    fn lift_points_arcs_upward_on_both_sides() {
        let right = lifted(0.0, ARC_LIFT);
        assert!(Vec2::from_angle(right).y < 0.0);
        let left = lifted(std::f32::consts::PI, ARC_LIFT);
        assert!(Vec2::from_angle(left).y < 0.0);
        assert!(Vec2::from_angle(left).x < 0.0);
    }
}

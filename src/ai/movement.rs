//! Repositioning search on a detached copy of the shooter
//!
//! Each step first asks the shot planner (perfect precision) whether the
//! current spot already offers a net-positive shot. Otherwise the copy walks
//! one short step, toward the target unless a crater escape is in progress.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::{AiSettings, PrecisionMode};
use crate::game::{Combatant, PhysicsSystem, Vec2};
use crate::util::random::RandomSource;

use super::personality::Personality;
use super::shot::plan_shot;
use super::PlanningContext;

/// Hard cap on time spent walking in one turn
pub const MAX_MOVEMENT_MS: u64 = 9_000;
/// Reserve kept between the movement budget and the end of the think time
pub const MOVEMENT_SAFETY_MS: u64 = 150;
/// At or below this much turn time left, nobody moves
pub const MIN_TURN_TIME_FOR_MOVEMENT_MS: u64 = 2_500;
pub const MAX_STEPS: usize = 24;
pub const STEP_MS: u64 = 260;
/// Displacement under which a step counts as stuck
pub const STUCK_DISPLACEMENT: f32 = 1.5;
/// Stuck streak that triggers a jump
const JUMP_ON_STREAK: u32 = 2;
/// Stuck streak that starts a crater escape
const ESCAPE_ON_STREAK: u32 = 3;
const ESCAPE_STEPS: u32 = 3;
/// Stuck streak at which the search gives up
const ABANDON_STREAK: u32 = 12;
/// Distance above the water line at which the walk stops
const WATER_CAUTION: f32 = 30.0;

/// One replayable walk step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementStep {
    /// -1 left, 1 right
    pub direction: f32,
    pub duration_ms: u64,
    pub jump: bool,
    pub from: Vec2,
    pub to: Vec2,
    pub stuck: bool,
}

/// Outcome of a movement search
#[derive(Debug, Clone)]
pub struct MovementResult {
    pub steps: Vec<MovementStep>,
    pub time_used_ms: u64,
    /// The detached copy after all steps
    pub shooter: Combatant,
    pub found_shot: bool,
    /// Repeated stuck steps and no shot: the shooter is probably in a hole
    pub escape_suggested: bool,
    pub abandoned: bool,
}

impl MovementResult {
    fn stationary(shooter: Combatant) -> Self {
        Self {
            steps: Vec::new(),
            time_used_ms: 0,
            shooter,
            found_shot: false,
            escape_suggested: false,
            abandoned: false,
        }
    }
}

/// Walking time available this turn
pub fn movement_budget(time_left_ms: u64, think_time_ms: u64) -> u64 {
    if time_left_ms <= MIN_TURN_TIME_FOR_MOVEMENT_MS {
        return 0;
    }
    time_left_ms
        .saturating_sub(think_time_ms + MOVEMENT_SAFETY_MS)
        .min(MAX_MOVEMENT_MS)
}

#[allow(clippy::too_many_arguments)]
pub fn plan_movement(
    ctx: &PlanningContext<'_>,
    shooter: &Combatant,
    target: &Combatant,
    cinematic: bool,
    personality: Personality,
    settings: &AiSettings,
    time_left_ms: u64,
    rng: &mut dyn RandomSource,
) -> MovementResult {
    let mut walker = shooter.detached_clone();
    let budget = movement_budget(time_left_ms, settings.think_time_ms);
    if !settings.movement_enabled || budget == 0 {
        trace!(budget, enabled = settings.movement_enabled, "Movement skipped");
        return MovementResult::stationary(walker);
    }

    let probe = AiSettings {
        precision: PrecisionMode::Perfect,
        ..settings.clone()
    };
    let toward = if target.position.x >= shooter.position.x { 1.0 } else { -1.0 };

    let mut result = MovementResult::stationary(walker.clone());
    let mut stuck_streak = 0u32;
    let mut escape_left = 0u32;
    let mut last_stuck = false;
    let mut saw_repeated_stuck = false;

    for _ in 0..MAX_STEPS {
        let remaining = budget.saturating_sub(result.time_used_ms);
        if remaining == 0 {
            break;
        }
        if plan_shot(ctx, &mut walker, target, cinematic, personality, &probe, rng).is_some() {
            result.found_shot = true;
            break;
        }

        let escaping = escape_left > 0;
        let direction = if escaping { -toward } else { toward };
        let jump = stuck_streak == JUMP_ON_STREAK || (escaping && last_stuck);
        let duration_ms = remaining.min(STEP_MS);

        let before = walker.clone();
        let displacement = PhysicsSystem::simulate_walk(
            &mut walker,
            ctx.terrain,
            direction,
            duration_ms,
            jump,
            ctx.water_y,
        );
        if !walker.alive {
            // Never hand the executor a step that drowns the shooter
            debug!(x = before.position.x, "Step would drown the shooter, stopping");
            walker = before;
            break;
        }

        let stuck = displacement < STUCK_DISPLACEMENT;
        result.steps.push(MovementStep {
            direction,
            duration_ms,
            jump,
            from: before.position,
            to: walker.position,
            stuck,
        });
        result.time_used_ms += duration_ms;
        trace!(direction, duration_ms, jump, displacement, stuck, "Movement step");

        if escaping {
            escape_left -= 1;
        }
        last_stuck = stuck;
        stuck_streak = if stuck { stuck_streak + 1 } else { 0 };

        if stuck_streak >= ABANDON_STREAK {
            result.abandoned = true;
            break;
        }
        if stuck_streak >= ESCAPE_ON_STREAK && escape_left == 0 {
            escape_left = ESCAPE_STEPS;
            saw_repeated_stuck = true;
        }
        if walker.position.y + walker.radius >= ctx.water_y - WATER_CAUTION {
            break;
        }
    }

    result.escape_suggested = saw_repeated_stuck && !result.found_shot;
    result.shooter = walker;

    debug!(
        steps = result.steps.len(),
        time_used_ms = result.time_used_ms,
        found_shot = result.found_shot,
        escape_suggested = result.escape_suggested,
        abandoned = result.abandoned,
        "Movement planned"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringWeights;
    use crate::game::{BallisticPredictor, Team, TeamId, Terrain, TerrainQuery};
    use crate::util::random::SequenceRandom;

    fn far_duel(terrain: &Terrain, shooter_x: f32) -> Vec<Team> {
        let y = terrain.surface_y(shooter_x) - 10.0;
        let ty = terrain.surface_y(3900.0) - 10.0;
        vec![
            Team::with_positions(TeamId(1), "red", &[(shooter_x, y)]),
            Team::with_positions(TeamId(2), "blue", &[(3900.0, ty)]),
        ]
    }

    #[test]
    fn budget_rules() {
        assert_eq!(movement_budget(2_500, 900), 0);
        assert_eq!(movement_budget(30_000, 900), 9_000);
        assert_eq!(movement_budget(4_000, 900), 2_950);
        assert_eq!(movement_budget(2_600, 3_000), 0);
    }

    #[test]
    fn disabled_movement_takes_no_steps() {
        let terrain = Terrain::flat(4000, 500, 400.0);
        let teams = far_duel(&terrain, 100.0);
        let ctx = PlanningContext::new(
            &teams,
            &terrain,
            &BallisticPredictor,
            0.0,
            480.0,
            ScoringWeights::default(),
        );
        let settings = AiSettings {
            movement_enabled: false,
            ..AiSettings::default()
        };
        let mut rng = SequenceRandom::constant(0.5);
        let result = plan_movement(
            &ctx,
            &teams[0].combatants[0],
            &teams[1].combatants[0],
            false,
            Personality::Generalist,
            &settings,
            30_000,
            &mut rng,
        );
        assert!(result.steps.is_empty());
        assert_eq!(result.time_used_ms, 0);
        assert_ne!(result.shooter.id, teams[0].combatants[0].id);
    }

    #[test]
    fn walks_toward_an_unreachable_target_within_budget() {
        let terrain = Terrain::flat(4000, 500, 400.0);
        let teams = far_duel(&terrain, 100.0);
        let ctx = PlanningContext::new(
            &teams,
            &terrain,
            &BallisticPredictor,
            0.0,
            480.0,
            ScoringWeights::default(),
        );
        let mut rng = SequenceRandom::constant(0.5);
        let live = &teams[0].combatants[0];
        let result = plan_movement(
            &ctx,
            live,
            &teams[1].combatants[0],
            false,
            Personality::Generalist,
            &AiSettings::default(),
            30_000,
            &mut rng,
        );

        assert_eq!(result.steps.len(), MAX_STEPS);
        assert_eq!(result.time_used_ms, MAX_STEPS as u64 * STEP_MS);
        assert!(result
            .steps
            .iter()
            .all(|s| s.direction == 1.0 && !s.stuck && s.duration_ms <= STEP_MS));
        assert!(!result.found_shot);
        assert!(!result.escape_suggested);
        assert!(result.shooter.position.x > live.position.x + 100.0);
        // The live combatant is untouched
        assert_eq!(teams[0].combatants[0].position.x, 100.0);
    }

    #[test]
    fn target_in_range_stops_before_the_first_step() {
        let terrain = Terrain::flat(1000, 500, 400.0);
        let teams = vec![
            Team::with_positions(TeamId(1), "red", &[(200.0, 390.0)]),
            Team::with_positions(TeamId(2), "blue", &[(520.0, 390.0)]),
        ];
        let ctx = PlanningContext::new(
            &teams,
            &terrain,
            &BallisticPredictor,
            0.0,
            480.0,
            ScoringWeights::default(),
        );
        let mut rng = SequenceRandom::constant(0.5);
        let result = plan_movement(
            &ctx,
            &teams[0].combatants[0],
            &teams[1].combatants[0],
            false,
            Personality::Generalist,
            &AiSettings::default(),
            30_000,
            &mut rng,
        );
        assert!(result.found_shot);
        assert!(result.steps.is_empty());
    }

    #[test]
    fn walled_pit_triggers_jump_and_crater_escape() {
        // Deep pit between x=150 and x=250, high plateau elsewhere
        let terrain = Terrain::from_surface(4000, 500, 4, |x| {
            if (150.0..250.0).contains(&x) {
                400.0
            } else {
                100.0
            }
        });
        let teams = far_duel(&terrain, 200.0);
        let ctx = PlanningContext::new(
            &teams,
            &terrain,
            &BallisticPredictor,
            0.0,
            480.0,
            ScoringWeights::default(),
        );
        let mut rng = SequenceRandom::constant(0.5);
        let result = plan_movement(
            &ctx,
            &teams[0].combatants[0],
            &teams[1].combatants[0],
            false,
            Personality::Generalist,
            &AiSettings::default(),
            30_000,
            &mut rng,
        );

        assert!(!result.found_shot);
        assert!(result.steps.iter().any(|s| s.stuck));
        assert!(result.steps.iter().any(|s| s.jump));
        assert!(result.steps.iter().any(|s| s.direction == -1.0));
        assert!(result.escape_suggested);
        assert!(result.shooter.alive);
    }
}

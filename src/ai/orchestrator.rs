//! Turn orchestration: target, movement, shot or panic, timing

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::AiSettings;
use crate::game::{CombatantId, TeamId, Vec2, WeaponKind};
use crate::util::random::RandomSource;
use crate::util::time::Timer;

use super::movement::{plan_movement, MovementStep};
use super::panic::{plan_panic_shot, PanicStrategy};
use super::personality::{Personality, PersonalityRegistry};
use super::scoring::{ScoreBreakdown, ShotCandidate};
use super::shot::plan_shot;
use super::targeting::select_target;
use super::PlanningContext;

/// Margin between the shot and the end of the turn
pub const FIRE_SAFETY_MS: u64 = 220;
/// Margin for panic shots
pub const PANIC_FIRE_SAFETY_MS: u64 = 80;

/// Which combatant a plan aims at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRef {
    pub team_id: TeamId,
    pub index: usize,
    pub combatant_id: CombatantId,
}

/// Walk steps to replay before firing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedMovement {
    pub steps: Vec<MovementStep>,
    pub time_used_ms: u64,
}

/// Short description of a combatant for the debug trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatantSummary {
    pub name: String,
    pub position: Vec2,
    pub health: f32,
}

/// Everything a planning pass looked at, for offline inspection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugTrace {
    pub shooter: CombatantSummary,
    pub target: CombatantSummary,
    pub wind: f32,
    pub candidate_count: usize,
    pub top: Vec<ShotCandidate>,
    pub chosen: Option<ScoreBreakdown>,
    pub fired: Option<ScoreBreakdown>,
    pub movement: Vec<MovementStep>,
    pub panic: Option<PanicStrategy>,
    pub elapsed_ms: u64,
}

/// Immutable decision for one turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnPlan {
    pub weapon: WeaponKind,
    pub angle: f32,
    pub power: f32,
    pub fire_delay_ms: u64,
    pub target: TargetRef,
    pub movement: Option<PlannedMovement>,
    /// Present only for panic shots
    pub panic: Option<PanicStrategy>,
    pub cinematic: bool,
    pub personality: Personality,
    pub debug: Option<DebugTrace>,
}

impl TurnPlan {
    pub fn movement_window_ms(&self) -> u64 {
        self.movement
            .as_ref()
            .map(|m| m.steps.iter().map(|s| s.duration_ms).sum())
            .unwrap_or(0)
    }

    pub fn pre_fire_window_ms(&self) -> u64 {
        self.movement_window_ms() + self.fire_delay_ms
    }

    pub fn is_panic(&self) -> bool {
        self.panic.is_some()
    }
}

/// Delay between the end of movement and the shot
pub fn fire_delay(settings: &AiSettings, time_left_ms: u64, movement_ms: u64, panic: bool) -> u64 {
    let (think, safety) = if panic {
        (settings.panic_think_time_ms, PANIC_FIRE_SAFETY_MS)
    } else {
        (settings.think_time_ms, FIRE_SAFETY_MS)
    };
    think.min(time_left_ms.saturating_sub(movement_ms + safety))
}

/// Plan the turn of `teams[shooter_team].combatants[shooter_index]`
#[allow(clippy::too_many_arguments)]
pub fn plan_turn(
    ctx: &PlanningContext<'_>,
    shooter_team: usize,
    shooter_index: usize,
    time_left_ms: u64,
    settings: &AiSettings,
    personalities: &PersonalityRegistry,
    rng: &mut dyn RandomSource,
) -> Option<TurnPlan> {
    let timer = Timer::new();
    let shooter = ctx.teams.get(shooter_team)?.combatants.get(shooter_index)?;
    if !shooter.alive {
        return None;
    }
    let personality = settings
        .personality
        .unwrap_or_else(|| personalities.get(shooter.id));

    let pick = select_target(shooter, ctx.teams, shooter_team, ctx.width, personality, rng);
    let Some(pick) = pick else {
        debug!(shooter = %shooter.name, "No living enemy to target");
        return None;
    };
    let target_team = &ctx.teams[pick.team];
    let target = &target_team.combatants[pick.index];
    let cinematic = rng.next_unit() < settings.cinematic_chance;

    let movement = plan_movement(
        ctx,
        shooter,
        target,
        cinematic,
        personality,
        settings,
        time_left_ms,
        rng,
    );
    let mut moved = movement.shooter.clone();

    let (fired, chosen, ranked, panic) =
        match plan_shot(ctx, &mut moved, target, cinematic, personality, settings, rng) {
            Some(selection) => (
                selection.fired,
                Some(selection.chosen.breakdown),
                selection.ranked,
                None,
            ),
            None => {
                let strategy = if movement.escape_suggested {
                    PanicStrategy::EscapeArc
                } else {
                    PanicStrategy::Default
                };
                let shot = plan_panic_shot(ctx, &mut moved, target, strategy, personality);
                (shot.candidate, None, Vec::new(), Some(strategy))
            }
        };

    let delay = fire_delay(settings, time_left_ms, movement.time_used_ms, panic.is_some());

    let debug_trace = settings.debug.then(|| DebugTrace {
        shooter: CombatantSummary {
            name: shooter.name.clone(),
            position: moved.position,
            health: shooter.health,
        },
        target: CombatantSummary {
            name: target.name.clone(),
            position: target.position,
            health: target.health,
        },
        wind: ctx.wind,
        candidate_count: ranked.len(),
        top: ranked.iter().take(settings.debug_top_n).cloned().collect(),
        chosen,
        fired: Some(fired.breakdown),
        movement: movement.steps.clone(),
        panic,
        elapsed_ms: timer.elapsed_ms(),
    });
    if let Some(trace) = &debug_trace {
        match serde_json::to_string(trace) {
            Ok(json) => debug!(trace = %json, "Planner trace"),
            Err(e) => debug!(error = %e, "Planner trace not serializable"),
        }
        for candidate in &trace.top {
            debug!(
                weapon = %candidate.weapon,
                angle = candidate.angle,
                power = candidate.power,
                "{}",
                candidate.breakdown.format_short()
            );
        }
    }

    let plan = TurnPlan {
        weapon: fired.weapon,
        angle: fired.angle,
        power: fired.power,
        fire_delay_ms: delay,
        target: TargetRef {
            team_id: target_team.id,
            index: pick.index,
            combatant_id: target.id,
        },
        movement: (!movement.steps.is_empty()).then(|| PlannedMovement {
            steps: movement.steps,
            time_used_ms: movement.time_used_ms,
        }),
        panic,
        cinematic,
        personality,
        debug: debug_trace,
    };

    info!(
        shooter = %shooter.name,
        enemy = %target.name,
        personality = %personality,
        weapon = %plan.weapon,
        angle = plan.angle,
        power = plan.power,
        score = fired.score,
        fire_delay_ms = plan.fire_delay_ms,
        movement_ms = plan.movement_window_ms(),
        panic = ?plan.panic,
        elapsed_ms = timer.elapsed_ms(),
        "Turn planned"
    );

    Some(plan)
}

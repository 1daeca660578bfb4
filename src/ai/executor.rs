//! Applies a turn plan to the live session on a timed schedule
//!
//! One task walks the schedule in order: movement steps at their cumulative
//! offsets, the aim preview when movement ends, the shot after the fire
//! delay. Every action waits out its deadline, then any pause, then checks
//! the plan token; a mismatch ends execution without touching the session.

use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::config::AiSettings;
use crate::game::session::ShotReport;
use crate::game::{Combatant, GameSession, TrajectoryPredictor, WeaponKind};

use super::gateway::PlanToken;
use super::orchestrator::TurnPlan;
use super::panic::{plan_panic_shot, PanicStrategy};
use super::scoring::score_candidate;
use super::shot::plan_shot;
use super::targeting::select_target;
use super::PlanningContext;

/// How often a paused session is re-checked
pub const PAUSE_POLL: Duration = Duration::from_millis(16);

/// How a plan execution ended
#[derive(Debug, Clone)]
pub enum ExecutionOutcome {
    /// The shot went off
    Fired {
        weapon: WeaponKind,
        angle: f32,
        power: f32,
        /// The planned shot was replaced by the fire-time safety check
        corrected: bool,
        report: Option<ShotReport>,
    },
    /// The session moved on; nothing further was applied
    Stale,
    /// No living enemy was left at fire time
    NoTarget,
}

impl ExecutionOutcome {
    pub fn fired(&self) -> bool {
        matches!(self, ExecutionOutcome::Fired { .. })
    }
}

/// Executes plans against one session
#[derive(Clone)]
pub struct PlanExecutor {
    session: Arc<Mutex<GameSession>>,
    predictor: Arc<dyn TrajectoryPredictor>,
    settings: AiSettings,
    seed: u64,
}

impl PlanExecutor {
    pub fn new(
        session: Arc<Mutex<GameSession>>,
        predictor: Arc<dyn TrajectoryPredictor>,
        settings: AiSettings,
        seed: u64,
    ) -> Self {
        Self {
            session,
            predictor,
            settings,
            seed,
        }
    }

    /// Start executing `plan`. The outcome is delivered through the handle.
    pub fn execute(&self, plan: TurnPlan, token: PlanToken) -> JoinHandle<ExecutionOutcome> {
        let executor = self.clone();
        tokio::spawn(async move { executor.run(plan, token).await })
    }

    async fn run(self, plan: TurnPlan, token: PlanToken) -> ExecutionOutcome {
        let start = Instant::now();
        let mut offset_ms = 0u64;

        if let Some(movement) = &plan.movement {
            for (i, step) in movement.steps.iter().enumerate() {
                if !self.ready(start, offset_ms, &token).await {
                    info!(turn = token.turn_index, step = i, "Plan stale before movement step");
                    return ExecutionOutcome::Stale;
                }
                self.session
                    .lock()
                    .issue_move(step.direction, step.duration_ms, step.jump);
                debug!(
                    step = i,
                    direction = step.direction,
                    duration_ms = step.duration_ms,
                    jump = step.jump,
                    "Movement step applied"
                );
                offset_ms += step.duration_ms;
            }
        }

        if !self.ready(start, plan.movement_window_ms(), &token).await {
            info!(turn = token.turn_index, "Plan stale before aiming");
            return ExecutionOutcome::Stale;
        }
        self.session.lock().begin_aim(plan.angle);

        if !self.ready(start, plan.pre_fire_window_ms(), &token).await {
            info!(turn = token.turn_index, "Plan stale before firing");
            return ExecutionOutcome::Stale;
        }
        self.fire(&plan, &token)
    }

    /// Wait for the deadline and any pause, then check the token
    async fn ready(&self, start: Instant, offset_ms: u64, token: &PlanToken) -> bool {
        sleep_until(start + Duration::from_millis(offset_ms)).await;
        loop {
            let paused = self.session.lock().paused;
            if !paused {
                break;
            }
            sleep(PAUSE_POLL).await;
        }
        let session = self.session.lock();
        token.matches(&session)
    }

    fn fire(&self, plan: &TurnPlan, token: &PlanToken) -> ExecutionOutcome {
        let mut session = self.session.lock();
        if !token.matches(&session) {
            info!(turn = token.turn_index, "Plan stale at fire time");
            return ExecutionOutcome::Stale;
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed ^ token.turn_index);
        let decision = {
            let Some(mut shooter) = session.active_combatant().cloned() else {
                return ExecutionOutcome::Stale;
            };
            let Some(target) = self.live_target(&session, plan, &shooter, &mut rng) else {
                warn!(turn = token.turn_index, "No living target at fire time");
                return ExecutionOutcome::NoTarget;
            };
            let ctx = PlanningContext::from_session(
                &session,
                self.predictor.as_ref(),
                self.settings.scoring,
            );
            self.checked_shot(&ctx, plan, &mut shooter, &target, &mut rng)
        };

        let (weapon, angle, power, corrected) = decision;
        session.set_weapon(weapon);
        let report = session.fire(angle, power);
        ExecutionOutcome::Fired {
            weapon,
            angle,
            power,
            corrected,
            report,
        }
    }

    /// The planned target if still alive, else a fresh pick
    fn live_target(
        &self,
        session: &GameSession,
        plan: &TurnPlan,
        shooter: &Combatant,
        rng: &mut ChaCha8Rng,
    ) -> Option<Combatant> {
        let planned = session
            .team_index(plan.target.team_id)
            .and_then(|idx| {
                let team = &session.teams[idx];
                team.index_of(plan.target.combatant_id)
                    .and_then(|i| team.combatants.get(i))
            })
            .filter(|c| c.alive);
        if let Some(target) = planned {
            return Some(target.clone());
        }

        debug!(combatant = %plan.target.combatant_id, "Planned target gone, retargeting");
        let pick = select_target(
            shooter,
            &session.teams,
            session.active_team,
            session.width(),
            plan.personality,
            rng,
        )?;
        Some(session.teams[pick.team].combatants[pick.index].clone())
    }

    /// Re-simulate the planned shot and replace it when it would likely
    /// hit the shooter
    fn checked_shot(
        &self,
        ctx: &PlanningContext<'_>,
        plan: &TurnPlan,
        shooter: &mut Combatant,
        target: &Combatant,
        rng: &mut ChaCha8Rng,
    ) -> (WeaponKind, f32, f32, bool) {
        let stats = plan.weapon.stats();
        if !stats.is_area() {
            return (plan.weapon, plan.angle, plan.power, false);
        }

        let resim = score_candidate(
            ctx,
            shooter,
            target,
            plan.weapon,
            plan.angle,
            plan.power,
            plan.cinematic,
            plan.personality,
        );
        if resim.breakdown.self_distance > stats.explosion_radius + shooter.radius {
            return (plan.weapon, plan.angle, plan.power, false);
        }

        warn!(
            self_distance = resim.breakdown.self_distance,
            weapon = %plan.weapon,
            "Self-hit likely at fire time, replanning"
        );
        let replanned = plan_shot(
            ctx,
            shooter,
            target,
            plan.cinematic,
            plan.personality,
            &self.settings,
            rng,
        );
        if let Some(selection) = replanned {
            let fired = selection.fired;
            return (fired.weapon, fired.angle, fired.power, true);
        }

        let strategy = plan.panic.unwrap_or(PanicStrategy::Default);
        let shot = plan_panic_shot(ctx, shooter, target, strategy, plan.personality);
        (shot.candidate.weapon, shot.candidate.angle, shot.candidate.power, true)
    }
}

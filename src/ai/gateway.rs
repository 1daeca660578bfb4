//! Planning gateway: worker offload with inline fallback and staleness checks

use parking_lot::Mutex;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{AiOverrides, AiSettings};
use crate::game::{
    CombatantId, GameSession, SessionSnapshot, TeamId, TrajectoryPredictor, TurnPhase,
};
use crate::worker::{PlanRequest, PlanningError, PlanningWorkerHandle, WirePlan};

use super::orchestrator::{plan_turn, TurnPlan};
use super::personality::PersonalityRegistry;
use super::PlanningContext;

/// State a plan was computed against. A plan only applies while the session
/// still matches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanToken {
    pub turn_index: u64,
    pub team_id: TeamId,
    pub combatant_id: CombatantId,
    pub phase: TurnPhase,
}

impl PlanToken {
    /// `None` when there is no active combatant
    pub fn capture(session: &GameSession) -> Option<Self> {
        let team = session.active_team()?;
        let combatant = team.active()?;
        Some(Self {
            turn_index: session.turn_index,
            team_id: team.id,
            combatant_id: combatant.id,
            phase: session.phase,
        })
    }

    pub fn matches(&self, session: &GameSession) -> bool {
        Self::capture(session).as_ref() == Some(self)
    }
}

/// Entry point for computing a turn plan against a live session
pub struct PlanningGateway {
    worker: Option<PlanningWorkerHandle>,
    predictor: Arc<dyn TrajectoryPredictor>,
    personalities: Arc<PersonalityRegistry>,
    defaults: AiSettings,
    rng: Mutex<ChaCha8Rng>,
    next_request_id: AtomicU64,
}

impl PlanningGateway {
    pub fn new(
        predictor: Arc<dyn TrajectoryPredictor>,
        personalities: Arc<PersonalityRegistry>,
        defaults: AiSettings,
        seed: u64,
    ) -> Self {
        Self {
            worker: None,
            predictor,
            personalities,
            defaults,
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
            next_request_id: AtomicU64::new(1),
        }
    }

    /// Offload planning to `worker`
    pub fn with_worker(mut self, worker: PlanningWorkerHandle) -> Self {
        self.worker = Some(worker);
        self
    }

    /// Plan the active combatant's turn.
    ///
    /// Returns the plan together with the token it is valid for, or `None`
    /// when there is nothing to do or the session moved on while planning.
    pub async fn request_plan(
        &self,
        session: &Arc<Mutex<GameSession>>,
        overrides: &AiOverrides,
    ) -> Option<(TurnPlan, PlanToken)> {
        let settings = self.defaults.with_overrides(overrides);

        let (token, snapshot) = {
            let session = session.lock();
            let token = PlanToken::capture(&session)?;
            let snapshot = self.worker.as_ref().map(|_| self.encode_snapshot(&session));
            (token, snapshot)
        };

        let plan = match (&self.worker, snapshot) {
            (Some(worker), Some(Ok(bytes))) => {
                match self.offload(worker, bytes, &settings).await {
                    Ok(Some(wire)) => self
                        .rehydrate(session, &token, wire)
                        .or_else(|| self.plan_inline(session, &token, &settings)),
                    Ok(None) => {
                        debug!(turn = token.turn_index, "Worker found nothing to plan");
                        None
                    }
                    Err(e) => {
                        warn!(error = %e, "Worker planning failed, planning inline");
                        self.plan_inline(session, &token, &settings)
                    }
                }
            }
            (Some(_), Some(Err(e))) => {
                warn!(error = %e, "Snapshot encoding failed, planning inline");
                self.plan_inline(session, &token, &settings)
            }
            _ => self.plan_inline(session, &token, &settings),
        }?;

        if !token.matches(&session.lock()) {
            info!(turn = token.turn_index, "Session moved on while planning, plan dropped");
            return None;
        }
        Some((plan, token))
    }

    fn encode_snapshot(&self, session: &GameSession) -> Result<Vec<u8>, PlanningError> {
        let snapshot = SessionSnapshot::capture(session, &self.personalities)
            .ok_or(PlanningError::NoActiveTeam)?;
        Ok(snapshot.to_bytes()?)
    }

    async fn offload(
        &self,
        worker: &PlanningWorkerHandle,
        snapshot: Vec<u8>,
        settings: &AiSettings,
    ) -> Result<Option<WirePlan>, PlanningError> {
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let seed = self.rng.lock().next_u64();
        debug!(request_id, bytes = snapshot.len(), "Offloading plan to worker");
        worker
            .plan(PlanRequest {
                request_id,
                snapshot,
                settings: settings.clone(),
                seed,
            })
            .await
    }

    /// Resolve the worker's positional target against the live teams
    fn rehydrate(
        &self,
        session: &Arc<Mutex<GameSession>>,
        token: &PlanToken,
        wire: WirePlan,
    ) -> Option<TurnPlan> {
        let session = session.lock();
        let target_id = session
            .team_index(wire.target_team)
            .and_then(|idx| session.teams[idx].combatants.get(wire.target_index))
            .map(|c| c.id);
        match target_id {
            Some(id) => Some(wire.into_plan(id)),
            None => {
                warn!(
                    turn = token.turn_index,
                    team_id = %wire.target_team,
                    index = wire.target_index,
                    "Worker target does not resolve, planning inline"
                );
                None
            }
        }
    }

    /// Plan on the calling task, only while the token still holds
    fn plan_inline(
        &self,
        session: &Arc<Mutex<GameSession>>,
        token: &PlanToken,
        settings: &AiSettings,
    ) -> Option<TurnPlan> {
        let session = session.lock();
        if !token.matches(&session) {
            debug!(turn = token.turn_index, "Stale before inline planning");
            return None;
        }
        let team_idx = session.active_team;
        let shooter_idx = session.active_team()?.active_index;
        let ctx =
            PlanningContext::from_session(&session, self.predictor.as_ref(), settings.scoring);
        let mut rng = self.rng.lock();
        plan_turn(
            &ctx,
            team_idx,
            shooter_idx,
            session.turn_time_left_ms,
            settings,
            &self.personalities,
            &mut *rng,
        )
    }
}

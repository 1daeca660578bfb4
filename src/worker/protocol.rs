//! Planning worker protocol message definitions
//! These are the only types that cross the worker boundary

use serde::{Deserialize, Serialize};

use crate::ai::movement::MovementStep;
use crate::ai::orchestrator::{DebugTrace, PlannedMovement, TargetRef, TurnPlan};
use crate::ai::{PanicStrategy, Personality};
use crate::config::AiSettings;
use crate::game::{CombatantId, TeamId, WeaponKind};

/// Request sent from the gateway to the worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRequest {
    /// Echoed back in the response
    pub request_id: u64,
    /// `SessionSnapshot` encoded as JSON
    pub snapshot: Vec<u8>,
    /// Effective settings for this turn
    pub settings: AiSettings,
    /// Seed for the worker's private random stream
    pub seed: u64,
}

/// Response sent from the worker to the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlanResponse {
    /// Planning finished; `None` when there was nothing to plan
    Plan {
        request_id: u64,
        plan: Option<WirePlan>,
    },

    /// Planning could not run
    Error { request_id: u64, message: String },
}

impl PlanResponse {
    pub fn request_id(&self) -> u64 {
        match self {
            PlanResponse::Plan { request_id, .. } | PlanResponse::Error { request_id, .. } => {
                *request_id
            }
        }
    }
}

/// A turn plan with its target given by position only.
///
/// The combatant identity is resolved against the live teams on arrival.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WirePlan {
    pub weapon: WeaponKind,
    pub angle: f32,
    pub power: f32,
    pub fire_delay_ms: u64,
    pub target_team: TeamId,
    pub target_index: usize,
    pub movement: Vec<MovementStep>,
    pub movement_time_ms: u64,
    pub panic: Option<PanicStrategy>,
    pub cinematic: bool,
    pub personality: Personality,
    pub debug: Option<DebugTrace>,
}

impl From<TurnPlan> for WirePlan {
    fn from(plan: TurnPlan) -> Self {
        let (movement, movement_time_ms) = match plan.movement {
            Some(m) => (m.steps, m.time_used_ms),
            None => (Vec::new(), 0),
        };
        Self {
            weapon: plan.weapon,
            angle: plan.angle,
            power: plan.power,
            fire_delay_ms: plan.fire_delay_ms,
            target_team: plan.target.team_id,
            target_index: plan.target.index,
            movement,
            movement_time_ms,
            panic: plan.panic,
            cinematic: plan.cinematic,
            personality: plan.personality,
            debug: plan.debug,
        }
    }
}

impl WirePlan {
    /// Rebuild a plan aimed at the live combatant `target_id`
    pub fn into_plan(self, target_id: CombatantId) -> TurnPlan {
        TurnPlan {
            weapon: self.weapon,
            angle: self.angle,
            power: self.power,
            fire_delay_ms: self.fire_delay_ms,
            target: TargetRef {
                team_id: self.target_team,
                index: self.target_index,
                combatant_id: target_id,
            },
            movement: (!self.movement.is_empty()).then(|| PlannedMovement {
                steps: self.movement,
                time_used_ms: self.movement_time_ms,
            }),
            panic: self.panic,
            cinematic: self.cinematic,
            personality: self.personality,
            debug: self.debug,
        }
    }
}

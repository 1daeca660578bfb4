//! Turn planning for computer-controlled teams
//!
//! Leaves first: personalities and targeting, candidate scoring and
//! generation, shot and panic planning, movement search, orchestration into a
//! [`TurnPlan`], the async gateway, and the executor that applies a plan.

pub mod candidates;
pub mod executor;
pub mod gateway;
pub mod movement;
pub mod orchestrator;
pub mod panic;
pub mod personality;
pub mod scoring;
pub mod shot;
pub mod targeting;

pub use executor::{ExecutionOutcome, PlanExecutor};
pub use gateway::{PlanToken, PlanningGateway};
pub use orchestrator::{plan_turn, TargetRef, TurnPlan};
pub use panic::PanicStrategy;
pub use personality::{Personality, PersonalityRegistry};
pub use scoring::{ScoreBreakdown, ShotCandidate};

use crate::config::ScoringWeights;
use crate::game::{GameSession, Team, Terrain, TerrainQuery, TrajectoryPredictor};

/// Read-only view of the world a planning pass runs against. Built from the
/// live session inline, or from an owned snapshot inside the worker.
#[derive(Clone, Copy)]
pub struct PlanningContext<'a> {
    pub teams: &'a [Team],
    pub terrain: &'a Terrain,
    pub predictor: &'a dyn TrajectoryPredictor,
    pub wind: f32,
    pub water_y: f32,
    pub width: f32,
    pub height: f32,
    pub scoring: ScoringWeights,
}

impl<'a> PlanningContext<'a> {
    pub fn new(
        teams: &'a [Team],
        terrain: &'a Terrain,
        predictor: &'a dyn TrajectoryPredictor,
        wind: f32,
        water_y: f32,
        scoring: ScoringWeights,
    ) -> Self {
        Self {
            teams,
            terrain,
            predictor,
            wind,
            water_y,
            width: terrain.width(),
            height: terrain.height(),
            scoring,
        }
    }

    pub fn from_session(
        session: &'a GameSession,
        predictor: &'a dyn TrajectoryPredictor,
        scoring: ScoringWeights,
    ) -> Self {
        Self::new(
            &session.teams,
            &session.terrain,
            predictor,
            session.wind,
            session.water_y,
            scoring,
        )
    }
}

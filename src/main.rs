//! Artillery Bot - headless demo duel
//!
//! Two computer-controlled teams play each other on generated hills:
//! - Personalities and opening combatants are assigned up front
//! - Each turn is planned through the gateway (worker or inline)
//! - Plans are executed on the live session in real time

use std::sync::Arc;

use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use artillery_bot::ai::personality::assign_personalities;
use artillery_bot::ai::targeting::select_opening_combatant;
use artillery_bot::ai::{ExecutionOutcome, PersonalityRegistry, PlanExecutor, PlanningGateway};
use artillery_bot::config::{AiOverrides, Config};
use artillery_bot::game::team::COMBATANT_RADIUS;
use artillery_bot::game::{
    BallisticPredictor, GameSession, Team, TeamId, Terrain, TerrainQuery, TrajectoryPredictor,
    TurnPhase,
};
use artillery_bot::worker::PlanningWorker;

const ARENA_WIDTH: u32 = 1600;
const ARENA_HEIGHT: u32 = 720;
const WATER_Y: f32 = 690.0;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    info!("Starting artillery duel demo");
    info!(
        seed = config.seed,
        turns = config.demo_turns,
        worker = config.use_worker,
        precision = ?config.ai.precision,
        "Demo configuration"
    );

    let predictor: Arc<dyn TrajectoryPredictor> = Arc::new(BallisticPredictor);
    let terrain = Terrain::rolling_hills(ARENA_WIDTH, ARENA_HEIGHT, 450.0, 70.0);
    let mut teams = vec![
        place_team(&terrain, TeamId(1), "red", &[1020.0, 1140.0, 1260.0, 1380.0]),
        place_team(&terrain, TeamId(2), "blue", &[220.0, 340.0, 460.0, 580.0]),
    ];

    let personalities = Arc::new(PersonalityRegistry::new());
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    for idx in 0..teams.len() {
        let enemies: Vec<&Team> = teams
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != idx)
            .map(|(_, t)| t)
            .collect();
        assign_personalities(&teams[idx], &enemies, &mut rng, &personalities);
    }
    for idx in 0..teams.len() {
        select_opening_combatant(&mut teams, idx);
    }

    let session = Arc::new(Mutex::new(GameSession::new(
        terrain,
        teams,
        WATER_Y,
        config.seed,
        predictor.clone(),
    )));

    let mut gateway = PlanningGateway::new(
        predictor.clone(),
        personalities.clone(),
        config.ai.clone(),
        config.seed,
    );
    if config.use_worker {
        gateway = gateway.with_worker(PlanningWorker::spawn(predictor.clone()));
    }
    let executor = PlanExecutor::new(session.clone(), predictor, config.ai.clone(), config.seed);

    tokio::select! {
        _ = run_duel(&session, &gateway, &executor, config.demo_turns) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, stopping the duel");
        }
    }

    let session = session.lock();
    for team in &session.teams {
        let health: f32 = team.combatants.iter().filter(|c| c.alive).map(|c| c.health).sum();
        info!(
            team_id = %team.id,
            team = %team.name,
            alive = team.alive_count(),
            health,
            "Final standing"
        );
    }
    info!(turns = session.turn_index, commands = session.commands.len(), "Demo complete");
    Ok(())
}

/// Play up to `turns` turns or until one team is left
async fn run_duel(
    session: &Arc<Mutex<GameSession>>,
    gateway: &PlanningGateway,
    executor: &PlanExecutor,
    turns: u32,
) {
    let overrides = AiOverrides::default();

    for _ in 0..turns {
        if session.lock().phase == TurnPhase::GameOver {
            break;
        }

        match gateway.request_plan(session, &overrides).await {
            Some((plan, token)) => match executor.execute(plan, token).await {
                Ok(ExecutionOutcome::Fired {
                    weapon,
                    corrected,
                    report,
                    ..
                }) => {
                    let (hits, kills) = report.map_or((0, 0), |r| (r.hits.len(), r.kills.len()));
                    info!(weapon = %weapon, corrected, hits, kills, "Turn played");
                }
                Ok(outcome) => warn!(?outcome, "Turn ended without a shot"),
                Err(e) => error!(error = %e, "Plan execution task failed"),
            },
            None => {
                let turn = session.lock().turn_index;
                warn!(turn, "No plan for this turn");
            }
        }

        session.lock().advance_turn();
    }
}

/// Team standing on the terrain at the given columns
fn place_team(terrain: &Terrain, id: TeamId, name: &str, xs: &[f32]) -> Team {
    let positions: Vec<(f32, f32)> = xs
        .iter()
        .map(|&x| (x, terrain.surface_y(x) - COMBATANT_RADIUS))
        .collect();
    Team::with_positions(id, name, &positions)
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

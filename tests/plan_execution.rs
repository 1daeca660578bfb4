use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use artillery_bot::ai::movement::MovementStep;
use artillery_bot::ai::orchestrator::{PlannedMovement, TargetRef};
use artillery_bot::ai::{ExecutionOutcome, Personality, PlanExecutor, PlanToken, TurnPlan};
use artillery_bot::config::{AiSettings, PrecisionMode};
use artillery_bot::game::{
    BallisticPredictor, GameSession, SessionCommand, Team, TeamId, Terrain, TrajectoryPredictor,
    Vec2, WeaponKind,
};

fn shared_session() -> Arc<Mutex<GameSession>> {
    let terrain = Terrain::flat(1000, 500, 400.0);
    let red = Team::with_positions(TeamId(1), "red", &[(200.0, 390.0)]);
    let blue = Team::with_positions(TeamId(2), "blue", &[(520.0, 390.0)]);
    Arc::new(Mutex::new(GameSession::new(
        terrain,
        vec![red, blue],
        480.0,
        7,
        Arc::new(BallisticPredictor),
    )))
}

fn executor(session: &Arc<Mutex<GameSession>>) -> PlanExecutor {
    let predictor: Arc<dyn TrajectoryPredictor> = Arc::new(BallisticPredictor);
    let settings = AiSettings {
        precision: PrecisionMode::Perfect,
        ..AiSettings::default()
    };
    PlanExecutor::new(session.clone(), predictor, settings, 1)
}

fn step(direction: f32, duration_ms: u64) -> MovementStep {
    MovementStep {
        direction,
        duration_ms,
        jump: false,
        from: Vec2::ZERO,
        to: Vec2::ZERO,
        stuck: false,
    }
}

fn rifle_plan(session: &GameSession, steps: Vec<MovementStep>, fire_delay_ms: u64) -> TurnPlan {
    let time_used_ms: u64 = steps.iter().map(|s| s.duration_ms).sum();
    TurnPlan {
        weapon: WeaponKind::Rifle,
        angle: 0.0,
        power: 1.0,
        fire_delay_ms,
        target: TargetRef {
            team_id: TeamId(2),
            index: 0,
            combatant_id: session.teams[1].combatants[0].id,
        },
        movement: (!steps.is_empty()).then_some(PlannedMovement { steps, time_used_ms }),
        panic: None,
        cinematic: false,
        personality: Personality::Generalist,
        debug: None,
    }
}

fn count(session: &Arc<Mutex<GameSession>>, pred: impl Fn(&SessionCommand) -> bool) -> usize {
    session.lock().commands.iter().filter(|c| pred(c)).count()
}

fn is_fire(c: &SessionCommand) -> bool {
    matches!(c, SessionCommand::Fire { .. })
}

#[tokio::test(start_paused = true)]
async fn fire_waits_for_the_whole_movement_window() {
    let session = shared_session();
    let (plan, token) = {
        let s = session.lock();
        (rifle_plan(&s, vec![step(1.0, 260), step(1.0, 260)], 100), PlanToken::capture(&s).unwrap())
    };
    let start = Instant::now();
    let handle = executor(&session).execute(plan, token);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(count(&session, |c| matches!(c, SessionCommand::Move { .. })), 2);
    assert_eq!(count(&session, is_fire), 0);

    let outcome = handle.await.unwrap();
    assert!(outcome.fired());
    assert!(start.elapsed() >= Duration::from_millis(620));

    let commands = session.lock().commands.clone();
    let kinds: Vec<&str> = commands
        .iter()
        .map(|c| match c {
            SessionCommand::SelectCombatant { .. } => "select",
            SessionCommand::Move { .. } => "move",
            SessionCommand::AimPreview { .. } => "aim",
            SessionCommand::SetWeapon { .. } => "weapon",
            SessionCommand::Fire { .. } => "fire",
        })
        .collect();
    assert_eq!(kinds, vec!["move", "move", "aim", "weapon", "fire"]);
}

#[tokio::test(start_paused = true)]
async fn stale_token_applies_nothing() {
    let session = shared_session();
    let (plan, token) = {
        let s = session.lock();
        (rifle_plan(&s, vec![step(1.0, 260)], 100), PlanToken::capture(&s).unwrap())
    };
    session.lock().advance_turn();

    let outcome = executor(&session).execute(plan, token).await.unwrap();
    assert!(matches!(outcome, ExecutionOutcome::Stale));
    assert!(session.lock().commands.is_empty());
}

#[tokio::test(start_paused = true)]
async fn turn_ending_mid_plan_cancels_the_shot() {
    let session = shared_session();
    let (plan, token) = {
        let s = session.lock();
        (rifle_plan(&s, Vec::new(), 500), PlanToken::capture(&s).unwrap())
    };
    let handle = executor(&session).execute(plan, token);

    tokio::time::sleep(Duration::from_millis(100)).await;
    session.lock().advance_turn();

    assert!(matches!(handle.await.unwrap(), ExecutionOutcome::Stale));
    assert_eq!(count(&session, is_fire), 0);
}

#[tokio::test(start_paused = true)]
async fn pause_holds_execution_until_released() {
    let session = shared_session();
    session.lock().set_paused(true);
    let (plan, token) = {
        let s = session.lock();
        (rifle_plan(&s, Vec::new(), 100), PlanToken::capture(&s).unwrap())
    };
    let handle = executor(&session).execute(plan, token);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(session.lock().commands.is_empty());
    assert!(!handle.is_finished());

    session.lock().set_paused(false);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(handle.is_finished());
    assert!(handle.await.unwrap().fired());
}

#[tokio::test(start_paused = true)]
async fn likely_self_hit_is_replaced_at_fire_time() {
    let session = shared_session();
    let (mut plan, token) = {
        let s = session.lock();
        (rifle_plan(&s, Vec::new(), 50), PlanToken::capture(&s).unwrap())
    };
    // Straight down at the shooter's own feet
    plan.weapon = WeaponKind::Bazooka;
    plan.angle = FRAC_PI_2;
    plan.power = 0.3;

    match executor(&session).execute(plan, token).await.unwrap() {
        ExecutionOutcome::Fired { corrected, angle, .. } => {
            assert!(corrected);
            assert_ne!(angle, FRAC_PI_2);
        }
        other => panic!("expected a shot, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn dead_target_with_no_replacement_means_no_shot() {
    let session = shared_session();
    let (plan, token) = {
        let s = session.lock();
        (rifle_plan(&s, Vec::new(), 50), PlanToken::capture(&s).unwrap())
    };
    session.lock().teams[1].combatants[0].alive = false;

    let outcome = executor(&session).execute(plan, token).await.unwrap();
    assert!(matches!(outcome, ExecutionOutcome::NoTarget));
    assert_eq!(count(&session, is_fire), 0);
}

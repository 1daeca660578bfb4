//! Live duel session: the authoritative state plans are applied to

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use super::physics::{PhysicsSystem, TrajectoryPredictor};
use super::team::{CombatantId, Team, TeamId};
use super::terrain::{Terrain, TerrainQuery};
use super::weapon::{WeaponClass, WeaponKind};
use super::{Combatant, Vec2};

/// Default length of a turn
pub const TURN_DURATION_MS: u64 = 30_000;
/// Largest wind magnitude rolled between turns
pub const MAX_WIND: f32 = 1.0;

/// Turn phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    /// Active combatant may move and aim
    Aim,
    /// A shot is in flight
    Firing,
    /// Waiting for the world to come to rest
    Settling,
    /// One team (or none) left standing
    GameOver,
}

/// Side effect issued against the session, recorded in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionCommand {
    SelectCombatant { team_id: TeamId, index: usize },
    Move { direction: f32, duration_ms: u64, jump: bool },
    AimPreview { angle: f32 },
    SetWeapon { weapon: WeaponKind },
    Fire { weapon: WeaponKind, angle: f32, power: f32 },
}

/// Outcome of a resolved shot
#[derive(Debug, Clone)]
pub struct ShotReport {
    pub weapon: WeaponKind,
    pub impact: Vec2,
    pub hits: Vec<(CombatantId, f32)>,
    pub kills: Vec<CombatantId>,
}

/// Session state (owned by the session's context)
pub struct GameSession {
    pub turn_index: u64,
    pub phase: TurnPhase,
    pub teams: Vec<Team>,
    /// Index into `teams` of the team taking its turn
    pub active_team: usize,
    pub wind: f32,
    pub turn_time_left_ms: u64,
    pub paused: bool,
    pub terrain: Terrain,
    pub water_y: f32,
    pub current_weapon: WeaponKind,
    pub commands: Vec<SessionCommand>,
    predictor: Arc<dyn TrajectoryPredictor>,
    rng: ChaCha8Rng,
}

impl GameSession {
    pub fn new(
        terrain: Terrain,
        teams: Vec<Team>,
        water_y: f32,
        seed: u64,
        predictor: Arc<dyn TrajectoryPredictor>,
    ) -> Self {
        Self {
            turn_index: 0,
            phase: TurnPhase::Aim,
            teams,
            active_team: 0,
            wind: 0.0,
            turn_time_left_ms: TURN_DURATION_MS,
            paused: false,
            terrain,
            water_y,
            current_weapon: WeaponKind::Bazooka,
            commands: Vec::new(),
            predictor,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn width(&self) -> f32 {
        self.terrain.width()
    }

    pub fn height(&self) -> f32 {
        self.terrain.height()
    }

    pub fn active_team(&self) -> Option<&Team> {
        self.teams.get(self.active_team)
    }

    pub fn active_combatant(&self) -> Option<&Combatant> {
        self.active_team().and_then(|t| t.active())
    }

    pub fn active_combatant_mut(&mut self) -> Option<&mut Combatant> {
        self.teams
            .get_mut(self.active_team)
            .and_then(|t| t.active_mut())
    }

    pub fn team_index(&self, team_id: TeamId) -> Option<usize> {
        self.teams.iter().position(|t| t.id == team_id)
    }

    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            debug!(paused, "Session pause toggled");
        }
        self.paused = paused;
    }

    /// Make `index` the active combatant of `team_id`
    pub fn select_combatant(&mut self, team_id: TeamId, index: usize) -> bool {
        let Some(team_idx) = self.team_index(team_id) else {
            return false;
        };
        let team = &mut self.teams[team_idx];
        if index >= team.combatants.len() {
            return false;
        }
        team.active_index = index;
        self.commands.push(SessionCommand::SelectCombatant { team_id, index });
        true
    }

    /// Walk the active combatant
    pub fn issue_move(&mut self, direction: f32, duration_ms: u64, jump: bool) {
        self.commands.push(SessionCommand::Move {
            direction,
            duration_ms,
            jump,
        });
        let water_y = self.water_y;
        let Some(team) = self.teams.get_mut(self.active_team) else {
            return;
        };
        let Some(combatant) = team.combatants.get_mut(team.active_index) else {
            return;
        };
        PhysicsSystem::simulate_walk(
            combatant,
            &self.terrain,
            direction,
            duration_ms,
            jump,
            water_y,
        );
        self.turn_time_left_ms = self.turn_time_left_ms.saturating_sub(duration_ms);
    }

    /// Start the pre-shot aiming visual
    pub fn begin_aim(&mut self, angle: f32) {
        self.commands.push(SessionCommand::AimPreview { angle });
        if let Some(c) = self.active_combatant_mut() {
            c.facing = if angle.cos() >= 0.0 { 1.0 } else { -1.0 };
        }
    }

    pub fn set_weapon(&mut self, weapon: WeaponKind) {
        self.current_weapon = weapon;
        self.commands.push(SessionCommand::SetWeapon { weapon });
    }

    /// Fire the current weapon and resolve the shot
    pub fn fire(&mut self, angle: f32, power: f32) -> Option<ShotReport> {
        let weapon = self.current_weapon;
        let shooter = self.active_combatant()?.clone();
        if !shooter.alive {
            return None;
        }
        self.commands.push(SessionCommand::Fire {
            weapon,
            angle,
            power,
        });
        self.phase = TurnPhase::Firing;

        let path = self.predictor.predict(
            weapon,
            &shooter,
            angle,
            power,
            self.wind,
            &self.terrain,
            self.width(),
            self.height(),
        );
        let report = self.resolve_shot(weapon, &shooter, &path);

        info!(
            turn = self.turn_index,
            shooter = %shooter.name,
            weapon = %weapon,
            impact_x = report.impact.x,
            impact_y = report.impact.y,
            hits = report.hits.len(),
            kills = report.kills.len(),
            "Shot resolved"
        );

        self.phase = TurnPhase::Settling;
        Some(report)
    }

    fn resolve_shot(
        &mut self,
        weapon: WeaponKind,
        shooter: &Combatant,
        path: &[Vec2],
    ) -> ShotReport {
        let stats = weapon.stats();
        let mut hits = Vec::new();
        let mut kills = Vec::new();
        let mut impact = path.last().copied().unwrap_or(shooter.position);

        match stats.class {
            WeaponClass::Arcing => {
                if stats.direct_hit {
                    // Rockets detonate on the first body they touch
                    if let Some(contact) = path.iter().find(|p| {
                        self.teams.iter().flat_map(|t| t.combatants.iter()).any(|c| {
                            let contact = c.radius + stats.projectile_radius;
                            c.alive && c.id != shooter.id && c.position.distance(**p) <= contact
                        })
                    }) {
                        impact = *contact;
                    }
                }
                for combatant in self.teams.iter_mut().flat_map(|t| t.combatants.iter_mut()) {
                    if !combatant.alive {
                        continue;
                    }
                    let dist = combatant.position.distance(impact);
                    let falloff = (1.0 - dist / stats.explosion_radius).clamp(0.0, 1.0);
                    if falloff <= 0.0 {
                        continue;
                    }
                    let damage = stats.damage * falloff;
                    hits.push((combatant.id, damage));
                    if combatant.apply_damage(damage) {
                        kills.push(combatant.id);
                    }
                }
                self.terrain.carve_circle(impact, stats.explosion_radius * 0.6);
            }
            WeaponClass::HitScan | WeaponClass::Burst => {
                let bullets = stats.burst_count.max(1) as f32;
                'ray: for point in path {
                    for combatant in self.teams.iter_mut().flat_map(|t| t.combatants.iter_mut()) {
                        if combatant.alive
                            && combatant.id != shooter.id
                            && combatant.position.distance(*point) <= combatant.radius
                        {
                            impact = *point;
                            let damage = stats.damage * bullets;
                            hits.push((combatant.id, damage));
                            if combatant.apply_damage(damage) {
                                kills.push(combatant.id);
                            }
                            break 'ray;
                        }
                    }
                }
            }
        }

        ShotReport {
            weapon,
            impact,
            hits,
            kills,
        }
    }

    /// Count teams with at least one living combatant
    pub fn teams_alive(&self) -> usize {
        self.teams.iter().filter(|t| t.alive_count() > 0).count()
    }

    /// Pass the turn to the next team with a living combatant
    pub fn advance_turn(&mut self) {
        if self.teams_alive() <= 1 {
            self.phase = TurnPhase::GameOver;
            info!(turn = self.turn_index, "Duel over");
            return;
        }

        let team_count = self.teams.len();
        for step in 1..=team_count {
            let idx = (self.active_team + step) % team_count;
            let team = &mut self.teams[idx];
            if team.alive_count() == 0 {
                continue;
            }
            let len = team.combatants.len();
            for offset in 1..=len {
                let candidate = (team.active_index + offset) % len;
                if team.combatants[candidate].alive {
                    team.active_index = candidate;
                    break;
                }
            }
            self.active_team = idx;
            break;
        }

        self.turn_index += 1;
        self.phase = TurnPhase::Aim;
        self.turn_time_left_ms = TURN_DURATION_MS;
        self.wind = self.rng.gen_range(-MAX_WIND..MAX_WIND);
        debug!(turn = self.turn_index, team = self.active_team, wind = self.wind, "Turn advanced");
    }
}

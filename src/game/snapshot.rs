//! Copy-only session snapshots for the planning worker

use serde::{Deserialize, Serialize};

use crate::ai::personality::{Personality, PersonalityRegistry};

use super::session::{GameSession, TurnPhase};
use super::team::{Combatant, CombatantId, Team, TeamId};
use super::terrain::Terrain;
use super::Vec2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatantSnapshot {
    pub id: CombatantId,
    pub name: String,
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub health: f32,
    pub alive: bool,
    pub facing: f32,
    pub grounded: bool,
    pub personality: Personality,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamSnapshot {
    pub id: TeamId,
    pub name: String,
    pub active_index: usize,
    pub combatants: Vec<CombatantSnapshot>,
}

/// Everything a planner needs, fully owned
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub turn_index: u64,
    pub phase: TurnPhase,
    pub terrain: Terrain,
    pub water_y: f32,
    pub teams: Vec<TeamSnapshot>,
    pub active_team_id: TeamId,
    pub active_index: usize,
    pub wind: f32,
    pub time_left_ms: u64,
}

impl SessionSnapshot {
    /// Copy the session, tagging each combatant with its registered personality
    pub fn capture(session: &GameSession, personalities: &PersonalityRegistry) -> Option<Self> {
        let active = session.active_team()?;
        let teams = session
            .teams
            .iter()
            .map(|team| TeamSnapshot {
                id: team.id,
                name: team.name.clone(),
                active_index: team.active_index,
                combatants: team
                    .combatants
                    .iter()
                    .map(|c| CombatantSnapshot {
                        id: c.id,
                        name: c.name.clone(),
                        position: c.position,
                        velocity: c.velocity,
                        radius: c.radius,
                        health: c.health,
                        alive: c.alive,
                        facing: c.facing,
                        grounded: c.grounded,
                        personality: personalities.get(c.id),
                    })
                    .collect(),
            })
            .collect();

        Some(Self {
            turn_index: session.turn_index,
            phase: session.phase,
            terrain: session.terrain.clone(),
            water_y: session.water_y,
            teams,
            active_team_id: active.id,
            active_index: active.active_index,
            wind: session.wind,
            time_left_ms: session.turn_time_left_ms,
        })
    }

    /// Rebuild owned teams and a private personality registry
    pub fn restore_teams(&self) -> (Vec<Team>, PersonalityRegistry) {
        let registry = PersonalityRegistry::new();
        let teams = self
            .teams
            .iter()
            .map(|t| Team {
                id: t.id,
                name: t.name.clone(),
                active_index: t.active_index,
                combatants: t
                    .combatants
                    .iter()
                    .map(|c| {
                        registry.set(c.id, c.personality);
                        Combatant {
                            id: c.id,
                            name: c.name.clone(),
                            team_id: t.id,
                            position: c.position,
                            velocity: c.velocity,
                            radius: c.radius,
                            facing: c.facing,
                            grounded: c.grounded,
                            health: c.health,
                            alive: c.alive,
                        }
                    })
                    .collect(),
            })
            .collect();
        (teams, registry)
    }

    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

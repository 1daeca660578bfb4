//! Combatants and teams

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::Vec2;

/// Default combatant hitbox radius
pub const COMBATANT_RADIUS: f32 = 10.0;

/// Starting (and reference maximum) health
pub const STARTING_HEALTH: f32 = 100.0;

/// Stable identity of a combatant, independent of its position in a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombatantId(pub Uuid);

impl CombatantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CombatantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamId(pub u32);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team-{}", self.0)
    }
}

/// A single controllable unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    pub team_id: TeamId,

    // Position and movement
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    /// +1 facing right, -1 facing left
    pub facing: f32,
    pub grounded: bool,

    // Combat
    pub health: f32,
    pub alive: bool,
}

impl Combatant {
    pub fn new(name: impl Into<String>, team_id: TeamId, x: f32, y: f32) -> Self {
        Self {
            id: CombatantId::new(),
            name: name.into(),
            team_id,
            position: Vec2::new(x, y),
            velocity: Vec2::ZERO,
            radius: COMBATANT_RADIUS,
            facing: 1.0,
            grounded: true,
            health: STARTING_HEALTH,
            alive: true,
        }
    }

    /// Copy with the same fields but a fresh identity, for simulations that
    /// must never be mistaken for (or write back into) the live combatant
    pub fn detached_clone(&self) -> Self {
        Self {
            id: CombatantId::new(),
            ..self.clone()
        }
    }

    /// Apply damage, returns true if this killed the combatant
    pub fn apply_damage(&mut self, damage: f32) -> bool {
        if !self.alive {
            return false;
        }
        self.health = (self.health - damage).max(0.0);
        if self.health <= 0.0 {
            self.alive = false;
            return true;
        }
        false
    }
}

/// Ordered list of combatants under one team id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub combatants: Vec<Combatant>,
    /// Index of the combatant whose turn it is when this team is active
    pub active_index: usize,
}

impl Team {
    pub fn new(id: TeamId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            combatants: Vec::new(),
            active_index: 0,
        }
    }

    /// Build a team with one grounded combatant per `(x, y)` position
    pub fn with_positions(id: TeamId, name: impl Into<String>, positions: &[(f32, f32)]) -> Self {
        let name = name.into();
        let combatants = positions
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Combatant::new(format!("{}-{}", name, i + 1), id, x, y))
            .collect();
        Self {
            id,
            name,
            combatants,
            active_index: 0,
        }
    }

    pub fn active(&self) -> Option<&Combatant> {
        self.combatants.get(self.active_index)
    }

    pub fn active_mut(&mut self) -> Option<&mut Combatant> {
        self.combatants.get_mut(self.active_index)
    }

    pub fn alive_count(&self) -> usize {
        self.combatants.iter().filter(|c| c.alive).count()
    }

    pub fn index_of(&self, id: CombatantId) -> Option<usize> {
        self.combatants.iter().position(|c| c.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_clone_keeps_fields_but_not_identity() {
        let live = Combatant::new("red-1", TeamId(1), 100.0, 200.0);
        let copy = live.detached_clone();
        assert_ne!(copy.id, live.id);
        assert_eq!(copy.position, live.position);
        assert_eq!(copy.health, live.health);
    }

    #[test]
    fn lethal_damage_marks_dead_once() {
        let mut c = Combatant::new("blue-1", TeamId(2), 0.0, 0.0);
        assert!(!c.apply_damage(40.0));
        assert!(c.apply_damage(80.0));
        assert!(!c.alive);
        assert_eq!(c.health, 0.0);
        assert!(!c.apply_damage(10.0));
    }
}

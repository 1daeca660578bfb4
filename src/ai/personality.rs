//! Behavior archetypes and their side-table association with combatants

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::game::{CombatantId, Team, WeaponKind};
use crate::util::random::RandomSource;

use super::targeting::farthest_combatant_index;

/// Behavior archetype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    /// Balanced
    #[default]
    Generalist,
    /// Precision shots, finishes wounded targets
    Marksman,
    /// Loves explosives
    Demolisher,
    /// Aggressive, favors rapid fire and accepts more risk
    Commando,
}

impl Personality {
    /// Draw order for random assignment
    pub const POOL: [Personality; 4] = [
        Personality::Generalist,
        Personality::Marksman,
        Personality::Demolisher,
        Personality::Commando,
    ];

    /// Target selection weights
    pub fn targeting_weights(self) -> TargetingWeights {
        let (health, distance) = match self {
            Personality::Generalist => (0.45, 0.55),
            Personality::Marksman => (0.65, 0.35),
            Personality::Demolisher => (0.4, 0.6),
            Personality::Commando => (0.3, 0.7),
        };
        TargetingWeights { health, distance }
    }

    /// Multiplier on expected self-damage
    pub fn risk_multiplier(self) -> f32 {
        match self {
            Personality::Generalist | Personality::Demolisher => 1.0,
            Personality::Marksman => 1.2,
            Personality::Commando => 0.8,
        }
    }

    /// Preference multiplier applied to a weapon's score
    pub fn weapon_bias(self, weapon: WeaponKind) -> f32 {
        use WeaponKind::*;
        match (self, weapon) {
            (Personality::Generalist, _) => 1.0,
            (Personality::Marksman, Bazooka) => 0.95,
            (Personality::Marksman, Grenade) => 0.85,
            (Personality::Marksman, Rifle) => 1.3,
            (Personality::Marksman, Uzi) => 0.9,
            (Personality::Demolisher, Bazooka) => 1.25,
            (Personality::Demolisher, Grenade) => 1.3,
            (Personality::Demolisher, Rifle) => 0.8,
            (Personality::Demolisher, Uzi) => 0.85,
            (Personality::Commando, Bazooka) => 0.95,
            (Personality::Commando, Grenade) => 0.9,
            (Personality::Commando, Rifle) => 1.0,
            (Personality::Commando, Uzi) => 1.3,
        }
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Personality::Generalist => "generalist",
            Personality::Marksman => "marksman",
            Personality::Demolisher => "demolisher",
            Personality::Commando => "commando",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetingWeights {
    pub health: f32,
    pub distance: f32,
}

/// Identity-keyed personality table.
///
/// Holds only ids, never combatants, so an entry neither keeps a combatant
/// alive nor disappears with it; callers prune explicitly.
#[derive(Debug, Default)]
pub struct PersonalityRegistry {
    entries: DashMap<CombatantId, Personality>,
}

impl PersonalityRegistry {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Personality of `id`, Generalist when unassigned
    pub fn get(&self, id: CombatantId) -> Personality {
        self.entries.get(&id).map(|p| *p.value()).unwrap_or_default()
    }

    pub fn set(&self, id: CombatantId, personality: Personality) {
        self.entries.insert(id, personality);
    }

    pub fn remove(&self, id: CombatantId) -> Option<Personality> {
        self.entries.remove(&id).map(|(_, p)| p)
    }

    /// Drop entries whose ids are not in `keep`
    pub fn retain_ids(&self, keep: &[CombatantId]) {
        self.entries.retain(|id, _| keep.contains(id));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Assign a random personality to every combatant of `team`, then force the
/// farthest combatant to Commando. Returns the assignments in team order.
pub fn assign_personalities(
    team: &Team,
    enemies: &[&Team],
    rng: &mut dyn RandomSource,
    registry: &PersonalityRegistry,
) -> Vec<Personality> {
    if team.combatants.is_empty() {
        return Vec::new();
    }

    let pool = Personality::POOL;
    let mut assigned: Vec<Personality> = team
        .combatants
        .iter()
        .map(|_| {
            let idx = (rng.next_unit() * pool.len() as f64).floor() as usize;
            pool[idx.min(pool.len() - 1)]
        })
        .collect();

    if let Some(farthest) = farthest_combatant_index(team, enemies) {
        assigned[farthest] = Personality::Commando;
    }

    for (combatant, personality) in team.combatants.iter().zip(&assigned) {
        registry.set(combatant.id, *personality);
        debug!(
            team_id = %team.id,
            combatant = %combatant.name,
            personality = %personality,
            "Personality assigned"
        );
    }

    assigned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::TeamId;
    use crate::util::random::SequenceRandom;

    #[test]
    fn unassigned_reads_as_generalist_and_entries_are_removable() {
        let registry = PersonalityRegistry::new();
        let id = CombatantId::new();
        assert_eq!(registry.get(id), Personality::Generalist);
        registry.set(id, Personality::Demolisher);
        assert_eq!(registry.get(id), Personality::Demolisher);
        assert_eq!(registry.remove(id), Some(Personality::Demolisher));
        assert_eq!(registry.get(id), Personality::Generalist);
    }

    #[test]
    fn retain_prunes_unknown_ids() {
        let registry = PersonalityRegistry::new();
        let keep = CombatantId::new();
        registry.set(keep, Personality::Marksman);
        registry.set(CombatantId::new(), Personality::Commando);
        registry.retain_ids(&[keep]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(keep), Personality::Marksman);
    }

    #[test]
    fn empty_team_is_a_no_op() {
        let registry = PersonalityRegistry::new();
        let team = Team::new(TeamId(1), "empty");
        let mut rng = SequenceRandom::constant(0.5);
        assert!(assign_personalities(&team, &[], &mut rng, &registry).is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn draw_of_one_clamps_to_last_pool_entry() {
        let registry = PersonalityRegistry::new();
        let team = Team::with_positions(TeamId(1), "solo", &[(10.0, 0.0), (5.0, 0.0)]);
        let enemy = Team::with_positions(TeamId(2), "far", &[(900.0, 0.0)]);
        // SequenceRandom clamps 1.0 just below one
        let mut rng = SequenceRandom::new(vec![1.0, 0.3]);
        let assigned = assign_personalities(&team, &[&enemy], &mut rng, &registry);
        assert_eq!(assigned[0], Personality::Commando);
        // Team is left of the enemy, so the minimum-x combatant is forced
        assert_eq!(assigned[1], Personality::Commando);
    }
}

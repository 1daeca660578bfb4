//! Target selection and the farthest-combatant rule

use tracing::trace;

use crate::game::{Combatant, Team};
use crate::util::random::RandomSource;

use super::personality::Personality;

/// Health at which a target scores zero on the health term
const REFERENCE_HEALTH: f32 = 100.0;
/// Half-width of the tie-breaking jitter
const TARGET_JITTER: f64 = 0.01;

/// Index of a combatant within `teams`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetPick {
    pub team: usize,
    pub index: usize,
}

/// Pick the most attractive living enemy of `shooter`
pub fn select_target(
    shooter: &Combatant,
    teams: &[Team],
    shooter_team: usize,
    arena_width: f32,
    personality: Personality,
    rng: &mut dyn RandomSource,
) -> Option<TargetPick> {
    let weights = personality.targeting_weights();
    let max_dist = arena_width.max(1.0);
    let mut best: Option<(f32, TargetPick)> = None;

    for (team_idx, team) in teams.iter().enumerate() {
        if team_idx == shooter_team {
            continue;
        }
        for (index, enemy) in team.combatants.iter().enumerate() {
            if !enemy.alive {
                continue;
            }
            let dist = shooter.position.distance(enemy.position);
            let distance_score = (1.0 - dist / max_dist).clamp(0.0, 1.0);
            let health_score = (1.0 - enemy.health / REFERENCE_HEALTH).clamp(0.0, 1.0);
            let jitter = rng.uniform(-TARGET_JITTER, TARGET_JITTER) as f32;
            let score = distance_score * weights.distance + health_score * weights.health + jitter;

            trace!(enemy = %enemy.name, score, dist, "Target scored");

            if best.map_or(true, |(s, _)| score > s) {
                best = Some((score, TargetPick { team: team_idx, index }));
            }
        }
    }

    best.map(|(_, pick)| pick)
}

fn living_or_all(team: &Team) -> Vec<(usize, &Combatant)> {
    let living: Vec<(usize, &Combatant)> = team
        .combatants
        .iter()
        .enumerate()
        .filter(|(_, c)| c.alive)
        .collect();
    if living.is_empty() {
        team.combatants.iter().enumerate().collect()
    } else {
        living
    }
}

/// Combatant of `team` farthest from the enemy side.
///
/// A team whose mean x is at or right of the enemies' picks its rightmost
/// member, otherwise its leftmost. Dead combatants count only when the whole
/// side is dead. The first member wins ties.
pub fn farthest_combatant_index(team: &Team, enemies: &[&Team]) -> Option<usize> {
    let own = living_or_all(team);
    if own.is_empty() {
        return None;
    }
    let own_mean = own.iter().map(|(_, c)| c.position.x).sum::<f32>() / own.len() as f32;

    let enemy_pool: Vec<(usize, &Combatant)> = {
        let living: Vec<(usize, &Combatant)> = enemies
            .iter()
            .flat_map(|t| t.combatants.iter().enumerate())
            .filter(|(_, c)| c.alive)
            .collect();
        if living.is_empty() {
            enemies
                .iter()
                .flat_map(|t| t.combatants.iter().enumerate())
                .collect()
        } else {
            living
        }
    };
    let enemy_mean = if enemy_pool.is_empty() {
        0.0
    } else {
        enemy_pool.iter().map(|(_, c)| c.position.x).sum::<f32>() / enemy_pool.len() as f32
    };

    let on_right = own_mean >= enemy_mean;
    let mut best = own[0];
    for &(idx, c) in own.iter().skip(1) {
        let better = if on_right {
            c.position.x > best.1.position.x
        } else {
            c.position.x < best.1.position.x
        };
        if better {
            best = (idx, c);
        }
    }
    Some(best.0)
}

/// Choose and activate the opening combatant of `teams[team_idx]`
pub fn select_opening_combatant(teams: &mut [Team], team_idx: usize) -> Option<usize> {
    let chosen = {
        let team = teams.get(team_idx)?;
        let enemies: Vec<&Team> = teams
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != team_idx)
            .map(|(_, t)| t)
            .collect();
        farthest_combatant_index(team, &enemies)?
    };
    teams[team_idx].active_index = chosen;
    Some(chosen)
}

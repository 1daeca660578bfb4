//! Fallback shots for turns with no net-positive attack

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::f32::consts::FRAC_PI_2;
use std::fmt;
use tracing::{debug, warn};

use crate::game::{angle_from_elevation, elevation_toward, Combatant, WeaponKind};

use super::personality::Personality;
use super::scoring::{score_candidate, ShotCandidate};
use super::PlanningContext;

const DEFAULT_ELEVATION_OFFSETS: [f32; 8] = [-0.2, -0.1, 0.0, 0.1, 0.2, 0.35, 0.5, 0.7];
const DEFAULT_POWERS: [f32; 4] = [0.45, 0.6, 0.75, 0.9];

const ESCAPE_ELEVATIONS: [f32; 5] = [1.05, 1.15, 1.25, 1.35, 1.45];
const ESCAPE_POWERS: [f32; 4] = [0.55, 0.7, 0.85, 1.0];
/// Elevation at which the steepness bonus starts
const ESCAPE_STEEP_FROM: f32 = 0.9;
const ESCAPE_STEEP_BONUS: f32 = 15.0;
const ESCAPE_DISTANCE_BONUS_CAP: f32 = 40.0;
const ESCAPE_DISTANCE_BONUS_RATE: f32 = 0.25;
const ESCAPE_NEAR_PENALTY: f32 = 80.0;
/// Self-distance (in explosion radii) beyond which distance is rewarded
const ESCAPE_SAFE_RADII: f32 = 2.2;
/// Self-distance (in explosion radii) below which the near penalty applies
const ESCAPE_NEAR_RADII: f32 = 1.8;

const FALLBACK_ELEVATION: f32 = 1.2;
const FALLBACK_POWER: f32 = 0.75;

/// How a panic shot is searched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanicStrategy {
    /// Lob toward the target, ranked purely by score
    #[default]
    Default,
    /// Steep launch away from the target, for shooters stuck in a hole
    EscapeArc,
}

impl fmt::Display for PanicStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanicStrategy::Default => f.write_str("default"),
            PanicStrategy::EscapeArc => f.write_str("escape_arc"),
        }
    }
}

/// Chosen panic shot and how it was found
#[derive(Debug, Clone)]
pub struct PanicShot {
    pub candidate: ShotCandidate,
    pub strategy: PanicStrategy,
    /// Candidates that survived ranking
    pub considered: usize,
    /// True when the search produced nothing and the hard-coded shot was used
    pub fallback: bool,
}

struct Ranked {
    candidate: ShotCandidate,
    rank: f32,
}

/// Always produces a shot with the heaviest arcing weapon
pub fn plan_panic_shot(
    ctx: &PlanningContext<'_>,
    shooter: &mut Combatant,
    target: &Combatant,
    strategy: PanicStrategy,
    personality: Personality,
) -> PanicShot {
    let weapon = WeaponKind::heaviest_arcing();
    let toward = if target.position.x >= shooter.position.x { 1.0 } else { -1.0 };

    let mut ranked: Vec<Ranked> = match strategy {
        PanicStrategy::Default => default_search(ctx, shooter, target, weapon, toward, personality),
        PanicStrategy::EscapeArc => escape_search(
            ctx,
            shooter,
            target,
            weapon,
            -toward,
            personality,
        ),
    };
    ranked.retain(|r| r.rank.is_finite());
    ranked.sort_by(|a, b| {
        b.rank.total_cmp(&a.rank).then_with(|| {
            b.candidate
                .breakdown
                .self_distance
                .partial_cmp(&a.candidate.breakdown.self_distance)
                .unwrap_or(Ordering::Equal)
        })
    });

    let considered = ranked.len();
    if let Some(best) = ranked.into_iter().next() {
        debug!(
            strategy = %strategy,
            angle = best.candidate.angle,
            power = best.candidate.power,
            rank = best.rank,
            considered,
            "Panic shot planned"
        );
        return PanicShot {
            candidate: best.candidate,
            strategy,
            considered,
            fallback: false,
        };
    }

    warn!(strategy = %strategy, "Panic search empty, using fallback shot");
    let angle = angle_from_elevation(-toward, FALLBACK_ELEVATION);
    let candidate = score_candidate(
        ctx,
        shooter,
        target,
        weapon,
        angle,
        FALLBACK_POWER,
        false,
        personality,
    );
    PanicShot {
        candidate,
        strategy,
        considered: 0,
        fallback: true,
    }
}

fn default_search(
    ctx: &PlanningContext<'_>,
    shooter: &mut Combatant,
    target: &Combatant,
    weapon: WeaponKind,
    toward: f32,
    personality: Personality,
) -> Vec<Ranked> {
    let base = elevation_toward(shooter.position, target.position).max(0.0);
    let mut out = Vec::with_capacity(DEFAULT_ELEVATION_OFFSETS.len() * DEFAULT_POWERS.len());
    for offset in DEFAULT_ELEVATION_OFFSETS {
        let angle = angle_from_elevation(toward, base + offset);
        for power in DEFAULT_POWERS {
            let candidate = score_candidate(
                ctx,
                shooter,
                target,
                weapon,
                angle,
                power,
                false,
                personality,
            );
            out.push(Ranked {
                rank: candidate.score,
                candidate,
            });
        }
    }
    out
}

fn escape_search(
    ctx: &PlanningContext<'_>,
    shooter: &mut Combatant,
    target: &Combatant,
    weapon: WeaponKind,
    away: f32,
    personality: Personality,
) -> Vec<Ranked> {
    let radius = weapon.stats().explosion_radius;
    let mut out = Vec::with_capacity(ESCAPE_ELEVATIONS.len() * ESCAPE_POWERS.len());
    for elevation in ESCAPE_ELEVATIONS {
        let angle = angle_from_elevation(away, elevation);
        let steep_span = FRAC_PI_2 - ESCAPE_STEEP_FROM;
        let steep = ((elevation - ESCAPE_STEEP_FROM) / steep_span).clamp(0.0, 1.0);
        for power in ESCAPE_POWERS {
            let candidate = score_candidate(
                ctx,
                shooter,
                target,
                weapon,
                angle,
                power,
                false,
                personality,
            );
            let self_distance = candidate.breakdown.self_distance;
            let distance_bonus = if self_distance > ESCAPE_SAFE_RADII * radius {
                ((self_distance - ESCAPE_SAFE_RADII * radius) * ESCAPE_DISTANCE_BONUS_RATE)
                    .min(ESCAPE_DISTANCE_BONUS_CAP)
            } else {
                0.0
            };
            let near_penalty = if self_distance < ESCAPE_NEAR_RADII * radius {
                ESCAPE_NEAR_PENALTY
            } else {
                0.0
            };
            out.push(Ranked {
                rank: candidate.score + distance_bonus + steep * ESCAPE_STEEP_BONUS - near_penalty,
                candidate,
            });
        }
    }
    out
}

//! Shot selection among the generated candidates

use tracing::{debug, trace};

use crate::config::{AiSettings, PrecisionMode};
use crate::game::Combatant;
use crate::util::random::RandomSource;

use super::candidates::generate_candidates;
use super::personality::Personality;
use super::scoring::{score_candidate, ShotCandidate};
use super::PlanningContext;

/// Floor on a candidate's pick weight in noisy mode
const MIN_PICK_WEIGHT: f32 = 0.001;
/// Lowest power a jittered arcing shot may use
const MIN_NOISY_POWER: f32 = 0.05;

/// Result of a successful shot planning pass
#[derive(Debug, Clone)]
pub struct ShotSelection {
    /// Candidate the planner settled on
    pub chosen: ShotCandidate,
    /// What will actually be fired (differs from `chosen` in noisy mode)
    pub fired: ShotCandidate,
    /// Finite-scored candidates of this pass, best first
    pub ranked: Vec<ShotCandidate>,
}

/// Plan a shot at `target`, or `None` when no candidate is net-positive
pub fn plan_shot(
    ctx: &PlanningContext<'_>,
    shooter: &mut Combatant,
    target: &Combatant,
    cinematic: bool,
    personality: Personality,
    settings: &AiSettings,
    rng: &mut dyn RandomSource,
) -> Option<ShotSelection> {
    let mut ranked = generate_candidates(ctx, shooter, target, cinematic, personality);
    ranked.retain(|c| c.score.is_finite());
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

    let Some(best) = ranked.first() else {
        trace!("No finite-scored candidate");
        return None;
    };
    if best.score <= 0.0 {
        trace!(best = best.score, "No net-positive shot");
        return None;
    }

    let (chosen, fired) = match settings.precision {
        PrecisionMode::Perfect => (best.clone(), best.clone()),
        PrecisionMode::Noisy => {
            let chosen = pick_weighted(&ranked, settings.top_k, rng).clone();
            let fired = jitter(
                ctx,
                shooter,
                target,
                &chosen,
                cinematic,
                personality,
                settings,
                rng,
            );
            (chosen, fired)
        }
    };

    debug!(
        weapon = %chosen.weapon,
        angle = chosen.angle,
        power = chosen.power,
        score = chosen.score,
        fired_score = fired.score,
        "Shot planned"
    );

    Some(ShotSelection {
        chosen,
        fired,
        ranked,
    })
}

/// Score-weighted pick among the first `top_k` of `ranked`
fn pick_weighted<'c>(
    ranked: &'c [ShotCandidate],
    top_k: usize,
    rng: &mut dyn RandomSource,
) -> &'c ShotCandidate {
    let top = &ranked[..top_k.clamp(1, ranked.len())];
    let weights: Vec<f32> = top
        .iter()
        .map(|c| (c.score + MIN_PICK_WEIGHT).max(MIN_PICK_WEIGHT))
        .collect();
    let total: f32 = weights.iter().sum();

    let mut roll = rng.next_unit() as f32 * total;
    for (candidate, weight) in top.iter().zip(&weights) {
        if roll < *weight {
            return candidate;
        }
        roll -= weight;
    }
    &top[top.len() - 1]
}

#[allow(clippy::too_many_arguments)]
fn jitter(
    ctx: &PlanningContext<'_>,
    shooter: &mut Combatant,
    target: &Combatant,
    chosen: &ShotCandidate,
    cinematic: bool,
    personality: Personality,
    settings: &AiSettings,
    rng: &mut dyn RandomSource,
) -> ShotCandidate {
    let angle_noise = settings.angle_noise as f64;
    let angle = chosen.angle + rng.uniform(-angle_noise, angle_noise) as f32;
    let power = if chosen.weapon.stats().is_hit_scan() {
        1.0
    } else {
        let power_noise = settings.power_noise as f64;
        (chosen.power + rng.uniform(-power_noise, power_noise) as f32).clamp(MIN_NOISY_POWER, 1.0)
    };
    score_candidate(ctx, shooter, target, chosen.weapon, angle, power, cinematic, personality)
}

//! Configuration module - environment variable parsing and planner settings

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::ai::personality::Personality;

/// How the shot planner picks among scored candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecisionMode {
    /// Always the best candidate
    Perfect,
    /// Weighted pick among the top candidates, then aim jitter
    Noisy,
}

impl FromStr for PrecisionMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "perfect" => Ok(Self::Perfect),
            "noisy" => Ok(Self::Noisy),
            _ => Err(()),
        }
    }
}

/// Tunable constants of the candidate score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub splash: f32,
    pub arc_bonus: f32,
    pub water_bonus: f32,
    pub self_damage: f32,
    /// Exponent applied to the explosion falloff
    pub falloff_exponent: f32,
    /// Target radius multiplier for hit-scan hit factor
    pub hit_radius_scale: f32,
    /// Fraction of burst bullets expected to land at point blank
    pub burst_hit_rate: f32,
    /// Range at which burst weapons stop being worth anything
    pub burst_range: f32,
    /// Ridge height giving the full arc-over-cover bonus
    pub arc_reference_height: f32,
    /// How close to the water line a target must stand for the water bonus
    pub water_margin: f32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            splash: 22.0,
            arc_bonus: 18.0,
            water_bonus: 70.0,
            self_damage: 1.1,
            falloff_exponent: 0.6,
            hit_radius_scale: 1.1,
            burst_hit_rate: 0.35,
            burst_range: 600.0,
            arc_reference_height: 120.0,
            water_margin: 40.0,
        }
    }
}

/// Effective planner settings for one turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiSettings {
    /// Forced personality; the registry decides when absent
    pub personality: Option<Personality>,
    pub think_time_ms: u64,
    pub panic_think_time_ms: u64,
    pub cinematic_chance: f64,
    pub precision: PrecisionMode,
    pub top_k: usize,
    pub angle_noise: f32,
    pub power_noise: f32,
    pub debug: bool,
    pub debug_top_n: usize,
    pub movement_enabled: bool,
    pub scoring: ScoringWeights,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            personality: None,
            think_time_ms: 900,
            panic_think_time_ms: 350,
            cinematic_chance: 0.12,
            precision: PrecisionMode::Noisy,
            top_k: 3,
            angle_noise: 0.06,
            power_noise: 0.08,
            debug: false,
            debug_top_n: 5,
            movement_enabled: true,
            scoring: ScoringWeights::default(),
        }
    }
}

/// Per-call overrides layered over [`AiSettings`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiOverrides {
    pub personality: Option<Personality>,
    pub think_time_ms: Option<u64>,
    pub cinematic_chance: Option<f64>,
    pub precision: Option<PrecisionMode>,
    pub top_k: Option<usize>,
    pub angle_noise: Option<f32>,
    pub power_noise: Option<f32>,
    pub debug: Option<bool>,
    pub movement_enabled: Option<bool>,
}

impl AiSettings {
    /// Apply `overrides` on top of these defaults
    pub fn with_overrides(&self, overrides: &AiOverrides) -> AiSettings {
        AiSettings {
            personality: overrides.personality.or(self.personality),
            think_time_ms: overrides.think_time_ms.unwrap_or(self.think_time_ms),
            panic_think_time_ms: self.panic_think_time_ms,
            cinematic_chance: overrides
                .cinematic_chance
                .unwrap_or(self.cinematic_chance)
                .clamp(0.0, 1.0),
            precision: overrides.precision.unwrap_or(self.precision),
            top_k: overrides.top_k.unwrap_or(self.top_k).max(1),
            angle_noise: overrides.angle_noise.unwrap_or(self.angle_noise).max(0.0),
            power_noise: overrides.power_noise.unwrap_or(self.power_noise).max(0.0),
            debug: overrides.debug.unwrap_or(self.debug),
            debug_top_n: self.debug_top_n,
            movement_enabled: overrides.movement_enabled.unwrap_or(self.movement_enabled),
            scoring: self.scoring,
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Planner defaults
    pub ai: AiSettings,
    /// Offload planning to the background worker
    pub use_worker: bool,
    /// Seed for every random stream in the demo duel
    pub seed: u64,
    /// Turns to play before the demo stops
    pub demo_turns: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = AiSettings::default();

        let precision = match env::var("AI_PRECISION") {
            Ok(raw) => raw
                .parse::<PrecisionMode>()
                .map_err(|_| ConfigError::Invalid("AI_PRECISION", raw))?,
            Err(_) => defaults.precision,
        };

        let ai = AiSettings {
            think_time_ms: parse_var("AI_THINK_TIME_MS", defaults.think_time_ms)?,
            panic_think_time_ms: parse_var("AI_PANIC_THINK_TIME_MS", defaults.panic_think_time_ms)?,
            cinematic_chance: parse_var("AI_CINEMATIC_CHANCE", defaults.cinematic_chance)?,
            precision,
            top_k: parse_var("AI_TOP_K", defaults.top_k)?,
            debug: parse_var("AI_DEBUG", defaults.debug)?,
            movement_enabled: parse_var("AI_MOVEMENT", defaults.movement_enabled)?,
            ..defaults
        };

        Ok(Self {
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            ai,
            use_worker: parse_var("AI_WORKER", true)?,
            seed: parse_var("AI_SEED", 0x5eed_u64)?,
            demo_turns: parse_var("DEMO_TURNS", 12)?,
        })
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1:?}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_only_given_fields() {
        let defaults = AiSettings::default();
        let overrides = AiOverrides {
            precision: Some(PrecisionMode::Perfect),
            top_k: Some(0),
            cinematic_chance: Some(3.0),
            ..Default::default()
        };
        let resolved = defaults.with_overrides(&overrides);
        assert_eq!(resolved.precision, PrecisionMode::Perfect);
        assert_eq!(resolved.top_k, 1);
        assert_eq!(resolved.cinematic_chance, 1.0);
        assert_eq!(resolved.think_time_ms, defaults.think_time_ms);
        assert!(resolved.movement_enabled);
    }

    #[test]
    fn precision_parses_case_insensitively() {
        assert_eq!("PERFECT".parse::<PrecisionMode>(), Ok(PrecisionMode::Perfect));
        assert!("sloppy".parse::<PrecisionMode>().is_err());
    }
}

//! Time utilities for turn planning

use std::time::Instant;

/// Fixed physics step used by the walk and flight integrators (60 Hz)
pub const SIMULATION_TPS: u32 = 60;

/// Delta time for one physics step (in seconds)
pub fn tick_delta() -> f32 {
    1.0 / SIMULATION_TPS as f32
}

/// Number of whole physics steps that fit in `millis`
pub fn ticks_for_millis(millis: u64) -> u32 {
    ((millis as f64 / 1000.0) * SIMULATION_TPS as f64).round() as u32
}

/// A simple timer for measuring planning latency
#[derive(Debug, Clone)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_round_to_nearest_step() {
        assert_eq!(ticks_for_millis(1000), 60);
        assert_eq!(ticks_for_millis(260), 16);
        assert_eq!(ticks_for_millis(0), 0);
    }

    #[test]
    fn timer_starts_near_zero() {
        let timer = Timer::default();
        assert!(timer.elapsed_ms() < 1_000);
    }
}

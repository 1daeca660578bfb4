//! Shared helpers

pub mod random;
pub mod time;

//! Artillery Bot - turn planner for computer-controlled teams
//!
//! This crate decides what a computer-controlled team does with its turn in
//! a physics-driven artillery duel:
//! - Personality assignment and target selection
//! - Candidate scoring over a fixed shot set, with panic fallbacks
//! - A movement search on a detached copy of the shooter
//! - Offloading to a background worker, guarded by plan tokens
//! - Timed, pause-aware execution against the live session

pub mod ai;
pub mod config;
pub mod game;
pub mod util;
pub mod worker;

//! Clinic scheduling model
//!
//! Everything in here is pure and clock-free: callers pass in "now" so
//! the same rules run on the server, in the views and in tests.

pub mod grid;
pub mod merge;
pub mod models;
pub mod rules;
pub mod slot_key;
pub mod week;

pub use models::*;

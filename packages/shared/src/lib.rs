//! Utilities shared between the coachlive server binary and its tests.

pub mod logger;
pub mod time;

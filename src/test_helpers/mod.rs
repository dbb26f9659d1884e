//! Tools for testing the MAC without real hardware

pub mod aether;
pub mod run;
pub mod time;

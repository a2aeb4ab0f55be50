//! Frameprobe Core
//!
//! Client-side core for the frame-analysis service.
//! Handles request building, job submission and polling, result normalization,
//! severity classification, exports and settings.

pub mod analysis;
pub mod export;
pub mod fs;
pub mod polling;
pub mod service;
pub mod session;
pub mod settings;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;

#[cfg(test)]
mod tests_scenarios;

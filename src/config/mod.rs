//! Configuration module for halfsies
//!
//! - Data directory resolution
//! - Household settings persistence

pub mod paths;
pub mod settings;

pub use paths::HalfsiesPaths;
pub use settings::{EmailSettings, Settings};

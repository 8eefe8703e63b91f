//! Foundation module - Core utilities shared by the scene
//!
//! - Logging setup and macro re-exports

pub mod logging;

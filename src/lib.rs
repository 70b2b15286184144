//! Library Application
//!
//! Book catalogue service: application modules, bootstrap, and utilities.

pub mod bootstrap;
pub mod modules;
pub mod utils;

/// Re-export commonly used types
pub use modules::*;

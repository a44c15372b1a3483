//! Request handlers.

pub mod analysis;
pub mod health;

pub use analysis::*;
pub use health::*;

//! Shared types for the Parley assistant front end.

mod conversation;
mod turn;

pub use conversation::*;
pub use turn::*;

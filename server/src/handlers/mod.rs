//! Request handlers for peer operations.

mod edits;
mod tracking;

pub use edits::*;
pub use tracking::*;

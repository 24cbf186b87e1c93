//! Action journal.
//!
//! Records every transaction step the engine completes:
//! - Position closes
//! - Swaps into the priority token
//! - Single-sided position opens

mod events;
mod journal;

pub use events::*;
pub use journal::*;

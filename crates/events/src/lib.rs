//! Hookwire Events - Cancelable, priority-ordered event bus
//!
//! Events are plain structs implementing [`Event`]. Units register handlers
//! under their own name so they can remove them as a batch when they shut
//! down.

mod bus;
mod event;

pub use bus::*;
pub use event::*;

//! Hookwire Core - Fundamental types and utilities

mod error;
mod types;
mod positions;
mod tiles;

pub use error::*;
pub use types::*;
pub use positions::*;
pub use tiles::*;

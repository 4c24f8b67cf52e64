//! Bump arenas and the registry that hands them out
//!
//! - [`Arena`]: fixed buffer, bump allocation, reclamation of the tail block only
//! - [`ArenaRegistry`]: one arena per `(element type, capacity)` binding
//! - [`ArenaStats`]: activity counters

mod bump;
mod registry;
mod stats;

pub use bump::Arena;
pub use registry::{ArenaRegistry, BindingInfo, BindingKey};
pub use stats::ArenaStats;

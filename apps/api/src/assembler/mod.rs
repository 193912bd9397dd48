// Layout Assembler
// Implements: section planning, slot mapping, constraint tagging, candidate scoring,
// beam search. Pure and synchronous; handlers run the search inside spawn_blocking.

pub mod constraints;
pub mod handlers;
pub mod planner;
pub mod scoring;
pub mod search;
pub mod slots;
pub mod tone;

pub use search::{AssemblyConfig, AssemblyError};

// Revision Engine
// Implements: pure layout transforms, free-text command interpretation,
// layout diffing with impact estimates, and bounded undo/redo sessions.
//
// Every edit produces a new Layout value; history snapshots are never mutated.

pub mod diff;
pub mod handlers;
pub mod history;
pub mod interpreter;
pub mod sessions;
pub mod transforms;

pub use history::DEFAULT_HISTORY_CAP;
pub use interpreter::CommandInterpreter;
pub use sessions::{SessionStore, DEFAULT_SESSION_TTL_SECS};

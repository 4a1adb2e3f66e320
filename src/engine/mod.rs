//! Session engine: the state machine a UI binds to.
//!
//! ## Key Types
//!
//! - `MatchEngine`: Owns and mutates the session
//! - `SessionEvent`: What changed, in order
//! - `Outcome`: Won or lost

mod events;
mod match_engine;

pub use events::{Outcome, SessionEvent};
pub use match_engine::{MatchEngine, StartTicket};

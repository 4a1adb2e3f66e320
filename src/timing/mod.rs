//! Time: delayed callbacks on a virtual clock and countdown formatting.

mod clock;
mod scheduler;

pub use clock::format_clock;
pub use scheduler::{Fired, Scheduler, TimerId, TimerTask};

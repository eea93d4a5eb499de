//! Plutus Clock Infrastructure
//!
//! Time sources behind the `Clock` port:
//! - `SystemClock` for production wall-clock time
//! - `ManualClock` for deterministic tests (settable, advanceable)

mod manual;
mod system;

pub use manual::ManualClock;
pub use system::SystemClock;

// Re-export the Clock trait for convenience
pub use plutus_ports::Clock;

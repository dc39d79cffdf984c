//! System wiring, startup, and shutdown.

pub mod market_system;
pub mod tracing;

pub use self::market_system::*;
pub use self::tracing::*;

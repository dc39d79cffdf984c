//! Records mirrored from the marketplace backend.
//!
//! Every record carries a canonical `id`; the backend's own key names are
//! mapped onto it in [`crate::ingest`] before deserialization.

pub mod item;
pub mod notification;
pub mod offer;
pub mod order;
pub mod profile;
pub mod reaction;
pub mod wire;

pub use item::*;
pub use notification::*;
pub use offer::*;
pub use order::*;
pub use profile::*;
pub use reaction::*;

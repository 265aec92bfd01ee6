//! Common types used by the various provider components.
pub mod util;

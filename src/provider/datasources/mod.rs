//! The data sources of the provider.

mod account;
mod collections;

pub use self::account::*;
pub use self::collections::*;

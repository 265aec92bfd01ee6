//! The managed resources of the provider.

mod collections;
mod definitions;
mod engine;
mod group;
mod group_membership;
mod template;
mod workload;

pub use self::collections::*;
pub use self::definitions::*;
pub use self::engine::*;
pub use self::group::*;
pub use self::group_membership::*;
pub use self::template::*;
pub use self::workload::*;

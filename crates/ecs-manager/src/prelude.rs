//! Convenience re-exports — `use ecs_manager::prelude::*` for the common items.

pub use crate::ecs::{Bundle, Component, Entity, Schedule, System, World};
pub use crate::error::{EcsError, Result};
pub use crate::manager::Manager;
#[cfg(feature = "diagnostics")]
pub use crate::diag::DiagSnapshot;

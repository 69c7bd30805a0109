//! # ecs-manager — A Small Entity-Component-System Registry
//!
//! Entities are bare ids, components are plain Rust values attached to them,
//! and systems are behaviour that runs over the matching entities once per
//! tick. The [`Manager`] ties the storage ([`World`](ecs::World)) and the
//! ordered system list ([`Schedule`](ecs::Schedule)) together.
//!
//! Start with `use ecs_manager::prelude::*` and create a [`Manager`].
//!
//! ## Features
//!
//! - `diagnostics` (default): per-system timings, per-tick entity counters
//!   and a JSON-serializable [`DiagSnapshot`](diag::DiagSnapshot).
//!
//! ## Logging
//!
//! The crate logs through the `log` facade: `trace` for individual entity and
//! component changes, `debug` for system registration, flushes and resets.
//! Install any logger (e.g. `env_logger`) to see it.

pub mod ecs;
pub mod error;
pub mod manager;
pub mod prelude;

#[cfg(feature = "diagnostics")]
pub mod diag;

pub use error::{EcsError, Result};
pub use manager::Manager;

//! # Sparse-Set ECS
//!
//! The storage and dispatch half of the crate. Entities are plain ids,
//! components live in one hash map per type, and systems are anything that
//! can be called with `&mut World`.
//!
//! ## Module Overview
//!
//! - [`entity`] — Monotonic entity ids
//! - [`component`] — Type-keyed columns (`HashMap<Entity, T>`) behind a type-erased trait
//! - [`world`] — Central container (entity table, columns, pending destructions)
//! - [`query`] — Single-type, multi-type and closure-based iteration
//! - [`system`] — System trait and schedule runner

pub mod component;
pub mod entity;
pub mod query;
pub mod system;
pub mod world;

pub use component::Component;
pub use entity::Entity;
pub use query::{ComponentSet, QueryMany, QueryOne, QueryParam};
pub use system::{Schedule, System};
pub use world::{Bundle, World};

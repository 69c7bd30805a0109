//! Diagnostics snapshot — entity counters, component populations and system
//! timings, serializable to JSON.
//!
//! Enabled by the `diagnostics` feature flag. Call
//! [`Manager::diagnostics`](crate::Manager::diagnostics) once per tick (or
//! whenever you want a reading); the per-tick counters reset on every call.
//!
//! This is a read-only view for tooling. It never contains component values
//! and can't be loaded back into a world.

use serde::Serialize;

use crate::ecs::system::Schedule;
use crate::ecs::world::World;

/// Everything the registry knows about itself at one point in time.
#[derive(Debug, Clone, Serialize)]
pub struct DiagSnapshot {
    pub entity_stats: EntityStatsSnapshot,
    /// Component types with at least one instance, largest population first.
    pub component_types: Vec<ComponentTypeSnapshot>,
    /// Timings from the most recent tick, in run order.
    pub system_timings: Vec<SystemTimingSnapshot>,
}

/// Entity table statistics gathered by `World::diagnostics_entity_stats()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityStatsSnapshot {
    pub alive_count: usize,
    pub pending_count: usize,
    /// Ids handed out since the world was created or last cleared.
    pub total_allocated: u64,
    pub created_this_tick: u32,
    pub destroyed_this_tick: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentTypeSnapshot {
    pub name: String,
    pub entity_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemTimingSnapshot {
    pub name: String,
    pub duration_us: f64,
}

impl DiagSnapshot {
    pub(crate) fn collect<A>(world: &mut World, schedule: &Schedule<A>) -> Self {
        Self {
            entity_stats: world.diagnostics_entity_stats(),
            component_types: world.diagnostics_component_types(),
            system_timings: schedule
                .timings
                .iter()
                .map(|t| SystemTimingSnapshot {
                    name: t.name.clone(),
                    duration_us: t.duration_us,
                })
                .collect(),
        }
    }

    /// Serialize the snapshot as a single-line JSON object.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Strip module paths from every identifier in a type name
/// (`alloc::vec::Vec<game::Position>` → `Vec<Position>`).
pub(crate) fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut start = 0;
    for (i, c) in full.char_indices() {
        if matches!(c, '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | '&' | ';') {
            out.push_str(last_segment(&full[start..i]));
            out.push(c);
            start = i + c.len_utf8();
        }
    }
    out.push_str(last_segment(&full[start..]));
    out
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

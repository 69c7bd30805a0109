//! # System — Behaviour That Runs Every Tick
//!
//! A system is a unit of behaviour that reads and writes the [`World`] once
//! per tick. Anything implementing [`System`] can be registered, including
//! plain closures and functions.
//!
//! ## Design Philosophy
//!
//! - A system receives the world as an argument instead of holding a
//!   reference to it, so there is no ownership tangle between systems and
//!   the registry that stores them.
//! - Every system in a schedule gets the same tick arguments (`&A`), e.g. a
//!   frame delta.
//! - Systems run sequentially, in the order they were added. Removing one
//!   never reorders the rest.
//!
//! ## Schedule
//!
//! A [`Schedule`] is just a `Vec` of systems. Each entry remembers the
//! concrete type it was registered as, so systems can later be removed by
//! type.
//!
//! ## Comparison
//!
//! - **hecs**: No system concept at all.
//! - **bevy_ecs**: Parameter injection, parallel execution, run conditions.
//!
//! We're closer to hecs: systems are just functions over the world, and the
//! schedule is a list.

use std::any::TypeId;

use log::debug;

use super::world::World;

/// Behaviour that runs once per tick.
///
/// `A` is the per-tick argument type handed to every system, `()` by
/// default.
///
/// # Example
///
/// ```ignore
/// struct Gravity(f32);
///
/// impl System<f32> for Gravity {
///     fn process(&mut self, world: &mut World, dt: &f32) {
///         for (_, vel) in world.query_one_mut::<Velocity>() {
///             vel.dy -= self.0 * dt;
///         }
///     }
/// }
/// ```
pub trait System<A = ()> {
    fn process(&mut self, world: &mut World, args: &A);

    /// Short name used in logs and diagnostics.
    fn name(&self) -> &str {
        short_system_name(std::any::type_name::<Self>())
    }
}

/// Blanket impl: any `FnMut(&mut World, &A)` is a `System<A>`.
impl<A, F: FnMut(&mut World, &A)> System<A> for F {
    fn process(&mut self, world: &mut World, args: &A) {
        (self)(world, args);
    }
}

/// A registered system plus the bookkeeping needed to find it again.
struct NamedSystem<A> {
    name: String,
    type_id: TypeId,
    system: Box<dyn System<A>>,
}

/// Per-system timing recorded during a single tick.
#[cfg(feature = "diagnostics")]
pub(crate) struct SystemTiming {
    pub name: String,
    pub duration_us: f64,
}

/// An ordered list of systems to run.
pub struct Schedule<A = ()> {
    systems: Vec<NamedSystem<A>>,
    /// Per-system timings from the most recent `run()` call.
    #[cfg(feature = "diagnostics")]
    pub(crate) timings: Vec<SystemTiming>,
}

impl<A> Schedule<A> {
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
            #[cfg(feature = "diagnostics")]
            timings: Vec::new(),
        }
    }

    /// Add a system to the end of the schedule.
    pub fn add_system<S: System<A> + 'static>(&mut self, system: S) {
        let name = system.name().to_string();
        debug!("registered system `{name}` at position {}", self.systems.len());
        self.systems.push(NamedSystem {
            name,
            type_id: TypeId::of::<S>(),
            system: Box::new(system),
        });
    }

    /// Remove the first system registered as type `S` and hand it back.
    ///
    /// Returns `None` if no such system is registered. Only one instance is
    /// removed per call; the remaining systems keep their order.
    pub fn remove_system<S: System<A> + 'static>(&mut self) -> Option<Box<dyn System<A>>> {
        let type_id = TypeId::of::<S>();
        let index = self.systems.iter().position(|ns| ns.type_id == type_id)?;
        let removed = self.systems.remove(index);
        debug!("removed system `{}` from position {index}", removed.name);
        Some(removed.system)
    }

    /// Check whether a system of type `S` is registered.
    pub fn contains<S: System<A> + 'static>(&self) -> bool {
        let type_id = TypeId::of::<S>();
        self.systems.iter().any(|ns| ns.type_id == type_id)
    }

    /// Run all systems in order on the given world.
    pub fn run(&mut self, world: &mut World, args: &A) {
        #[cfg(feature = "diagnostics")]
        {
            self.timings.clear();
            for ns in &mut self.systems {
                let start = std::time::Instant::now();
                ns.system.process(world, args);
                let elapsed = start.elapsed();
                self.timings.push(SystemTiming {
                    name: ns.name.clone(),
                    duration_us: elapsed.as_secs_f64() * 1_000_000.0,
                });
            }
        }
        #[cfg(not(feature = "diagnostics"))]
        {
            for ns in &mut self.systems {
                ns.system.process(world, args);
            }
        }
    }

    /// Names of the registered systems, in run order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.systems.iter().map(|ns| ns.name.as_str())
    }

    /// Returns the number of systems in this schedule.
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}

impl<A> Default for Schedule<A> {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip the module path from a fully-qualified type name, keeping only the
/// last meaningful segment (e.g. `game::systems::Movement` → `Movement`,
/// `{{closure}}` → `<closure>`).
fn short_system_name(full: &str) -> &str {
    // Generic arguments may contain `::` too; only look before the first `<`.
    let head = full.split('<').next().unwrap_or(full);
    let name = head.rsplit("::").next().unwrap_or(head);
    if name.contains("closure") { "<closure>" } else { name }
}

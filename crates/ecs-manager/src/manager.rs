//! # Manager — Storage Plus Dispatch
//!
//! [`Manager`] bundles a [`World`] with a [`Schedule`] and drives them one
//! tick at a time:
//!
//! ```text
//! tick(args)
//!   1. world.flush_removals()   ← entities marked last tick disappear here
//!   2. for each system, in registration order:
//!          system.process(&mut world, &args)
//! ```
//!
//! The manager derefs to its world, so storage operations read naturally:
//! `manager.create_entity(..)`, `manager.query_one::<T>()`.
//!
//! Systems never hold a reference back to the manager. They get the world
//! and the tick arguments as parameters, which keeps ownership one-way.

use std::ops::{Deref, DerefMut};

use log::debug;

use crate::ecs::system::{Schedule, System};
use crate::ecs::world::World;

/// Entity/component registry with an ordered list of systems.
///
/// `A` is the argument type passed to every system on [`tick`](Self::tick),
/// e.g. `f32` for a frame delta. It defaults to `()`.
///
/// # Example
///
/// ```ignore
/// let mut manager: Manager<f32> = Manager::new();
/// manager.create_entity((Position { x: 0.0 }, Velocity { dx: 2.0 }));
/// manager.add_system(|world: &mut World, dt: &f32| {
///     world.query_mut::<(&mut Position, &Velocity)>(|_, (pos, vel)| pos.x += vel.dx * dt);
/// });
/// manager.tick(&(1.0 / 60.0));
/// ```
pub struct Manager<A = ()> {
    world: World,
    schedule: Schedule<A>,
}

impl<A> Manager<A> {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            schedule: Schedule::new(),
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    // ── Systems ──────────────────────────────────────────────────────

    /// Append a system. It runs after every system added before it.
    ///
    /// The same system type may be added more than once.
    pub fn add_system<S: System<A> + 'static>(&mut self, system: S) {
        self.schedule.add_system(system);
    }

    /// Remove the first registered system of type `S` and return it.
    ///
    /// Returns `None` if none is registered.
    pub fn remove_system<S: System<A> + 'static>(&mut self) -> Option<Box<dyn System<A>>> {
        self.schedule.remove_system::<S>()
    }

    pub fn has_system<S: System<A> + 'static>(&self) -> bool {
        self.schedule.contains::<S>()
    }

    pub fn system_count(&self) -> usize {
        self.schedule.len()
    }

    /// Names of the registered systems, in run order.
    pub fn system_names(&self) -> impl Iterator<Item = &str> {
        self.schedule.names()
    }

    // ── Tick ─────────────────────────────────────────────────────────

    /// Run one update: destroy pending entities, then call every system once,
    /// in order, with the same `args`.
    pub fn tick(&mut self, args: &A) {
        self.world.flush_removals();
        self.schedule.run(&mut self.world, args);
    }

    /// Drop all entities and components and restart ids from 1.
    ///
    /// Registered systems are kept.
    pub fn clear(&mut self) {
        self.world.clear();
        debug!("manager cleared, {} systems kept", self.schedule.len());
    }

    /// Take a diagnostics reading and reset the per-tick entity counters.
    #[cfg(feature = "diagnostics")]
    pub fn diagnostics(&mut self) -> crate::diag::DiagSnapshot {
        crate::diag::DiagSnapshot::collect(&mut self.world, &self.schedule)
    }
}

impl<A> Default for Manager<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Deref for Manager<A> {
    type Target = World;

    fn deref(&self) -> &World {
        &self.world
    }
}

impl<A> DerefMut for Manager<A> {
    fn deref_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::Entity;
    use crate::error::EcsError;

    #[derive(Debug, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Debug, PartialEq)]
    struct Velocity {
        x: f32,
        y: f32,
    }

    struct Lifetime(u32);

    /// Appends its label to a shared `Vec<&str>` component on entity 1.
    struct Trace(&'static str);

    impl System for Trace {
        fn process(&mut self, world: &mut World, _args: &()) {
            let log = world
                .get_component_mut::<Vec<&'static str>>(Entity(1))
                .unwrap();
            log.push(self.0);
        }
    }

    struct Noop;

    impl System for Noop {
        fn process(&mut self, _world: &mut World, _args: &()) {}
    }

    fn movement(world: &mut World, dt: &f32) {
        world.query_mut::<(&mut Position, &Velocity)>(|_, (pos, vel)| {
            pos.x += vel.x * dt;
            pos.y += vel.y * dt;
        });
    }

    fn expire(world: &mut World, _dt: &f32) {
        let mut expired = Vec::new();
        for (entity, life) in world.query_one_mut::<Lifetime>() {
            life.0 = life.0.saturating_sub(1);
            if life.0 == 0 {
                expired.push(entity);
            }
        }
        for entity in expired {
            world.destroy_entity(entity);
        }
    }

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn systems_run_in_order_once_per_tick() {
        init_logging();
        let mut manager: Manager = Manager::new();
        let log = manager.create_entity((Vec::<&'static str>::new(),));
        assert_eq!(log, Entity(1));

        manager.add_system(Trace("a"));
        manager.add_system(Trace("b"));
        manager.add_system(Trace("c"));
        manager.tick(&());
        manager.tick(&());

        assert_eq!(
            manager.get_component::<Vec<&'static str>>(log).unwrap(),
            &vec!["a", "b", "c", "a", "b", "c"]
        );
    }

    #[test]
    fn remove_system_takes_first_instance() {
        let mut manager: Manager = Manager::new();
        let log = manager.create_entity((Vec::<&'static str>::new(),));
        manager.add_system(Trace("first"));
        manager.add_system(Noop);
        manager.add_system(Trace("second"));

        assert!(manager.remove_system::<Trace>().is_some());
        assert_eq!(manager.system_count(), 2);
        assert!(manager.has_system::<Trace>());
        assert!(manager.has_system::<Noop>());

        manager.tick(&());
        assert_eq!(
            manager.get_component::<Vec<&'static str>>(log).unwrap(),
            &vec!["second"]
        );

        assert!(manager.remove_system::<Trace>().is_some());
        assert!(manager.remove_system::<Trace>().is_none());
        assert!(!manager.has_system::<Trace>());
    }

    #[test]
    fn tick_passes_args_to_systems() {
        let mut manager: Manager<f32> = Manager::new();
        let e = manager.create_entity((Position { x: 0.0, y: 0.0 }, Velocity { x: 2.0, y: -4.0 }));
        manager.add_system(movement);

        manager.tick(&0.5);
        manager.tick(&0.5);
        assert_eq!(
            manager.get_component::<Position>(e).unwrap(),
            &Position { x: 2.0, y: -4.0 }
        );
    }

    #[test]
    fn deferred_destroy_visible_until_next_tick() {
        let mut manager: Manager<f32> = Manager::new();
        let short = manager.create_entity((Lifetime(1), Position { x: 0.0, y: 0.0 }));
        let long = manager.create_entity((Lifetime(3),));
        manager.add_system(expire);

        manager.tick(&0.0);
        // Marked during the tick, still fully present.
        assert!(manager.is_pending(short));
        assert!(manager.contains_entity(short));
        assert!(manager.get_component::<Position>(short).is_ok());

        manager.tick(&0.0);
        assert!(!manager.contains_entity(short));
        assert_eq!(
            manager.get_component::<Position>(short),
            Err(EcsError::EntityNotFound(short))
        );
        assert_eq!(manager.get_component::<Lifetime>(long).unwrap().0, 1);
    }

    #[test]
    fn destroy_before_tick_flushes_first() {
        let mut manager: Manager = Manager::new();
        let e = manager.create_entity((Position { x: 0.0, y: 0.0 },));
        manager.destroy_entity(e);
        manager.add_system(|world: &mut World, _: &()| {
            assert_eq!(world.query_one::<Position>().count(), 0);
        });
        manager.tick(&());
        assert_eq!(manager.entity_count(), 0);
    }

    #[test]
    fn clear_keeps_systems_and_restarts_ids() {
        let mut manager: Manager = Manager::new();
        manager.create_entity((Position { x: 1.0, y: 1.0 },));
        manager.create_entity(());
        manager.add_system(Noop);

        manager.clear();
        assert_eq!(manager.entity_count(), 0);
        assert_eq!(manager.component_type_count(), 0);
        assert_eq!(manager.system_count(), 1);
        assert_eq!(manager.create_entity(()), Entity(1));
    }

    #[test]
    fn system_can_create_entities() {
        let mut manager: Manager = Manager::new();
        manager.add_system(|world: &mut World, _: &()| {
            world.create_entity((Lifetime(1),));
        });
        manager.tick(&());
        manager.tick(&());
        assert_eq!(manager.query_one::<Lifetime>().count(), 2);
    }

    #[test]
    fn world_accessors_match_deref() {
        let mut manager: Manager = Manager::new();
        let e = manager.world_mut().create_entity((Velocity { x: 1.0, y: 0.0 },));
        assert!(manager.world().has_component::<Velocity>(e));
        assert!(manager.has_component::<Velocity>(e));
    }
}

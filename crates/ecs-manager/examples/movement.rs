//! Movement — particles that fall, drift and expire.
//!
//! Run with `RUST_LOG=info cargo run --example movement`, or
//! `RUST_LOG=ecs_manager=trace` to watch every entity change.

use ecs_manager::prelude::*;
use log::info;

#[derive(Debug)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Debug)]
struct Velocity {
    dx: f32,
    dy: f32,
}

/// Ticks left before the particle is destroyed.
struct Lifetime(u32);

struct Gravity(f32);

impl System<f32> for Gravity {
    fn process(&mut self, world: &mut World, dt: &f32) {
        for (_, vel) in world.query_one_mut::<Velocity>() {
            vel.dy -= self.0 * dt;
        }
    }
}

const DT: f32 = 0.1;

fn main() {
    env_logger::init();

    let mut manager: Manager<f32> = Manager::new();

    for i in 0..5 {
        let i = i as f32;
        manager.create_entity((
            Position { x: i, y: 10.0 },
            Velocity { dx: 1.0 - i * 0.5, dy: 0.0 },
            Lifetime(4 + i as u32 * 2),
        ));
    }
    // A static marker: has a position but never moves or expires.
    let marker = manager.create_entity((Position { x: 0.0, y: 0.0 },));

    manager.add_system(Gravity(9.8));
    manager.add_system(movement);
    manager.add_system(expire);

    for frame in 1..=12 {
        manager.tick(&DT);
        info!(
            "frame {frame}: {} entities, {} pending",
            manager.entity_count(),
            manager.pending_count()
        );

        #[cfg(feature = "diagnostics")]
        match manager.diagnostics().to_json() {
            Ok(json) => info!("diagnostics: {json}"),
            Err(err) => log::warn!("failed to serialize diagnostics: {err}"),
        }
    }

    if let Ok(pos) = manager.get_component::<Position>(marker) {
        info!("marker {marker} still at {pos:?}");
    }

    // Gravity no longer applies; everything left keeps its velocity.
    manager.remove_system::<Gravity>();
    manager.tick(&DT);
    for (entity, (pos, vel)) in manager.query_many::<(Position, Velocity)>() {
        info!("{entity}: {pos:?} {vel:?}");
    }
}

fn movement(world: &mut World, dt: &f32) {
    world.query_mut::<(&mut Position, &Velocity)>(|_, (pos, vel)| {
        pos.x += vel.dx * dt;
        pos.y += vel.dy * dt;
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
        info!("entity {entity} expired");
        world.destroy_entity(entity);
    }
}

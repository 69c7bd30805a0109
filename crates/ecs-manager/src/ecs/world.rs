//! # World — Entity & Component Storage
//!
//! The [`World`] owns every entity and component. It's the single source of
//! truth that systems read from and write to.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │ World                                               │
//! │                                                     │
//! │  EntityAllocator: monotonically increasing ids      │
//! │                                                     │
//! │  columns: HashMap<TypeId, Box<dyn ErasedColumn>>    │
//! │    one Column<T> per component type                 │
//! │    key set = component-type index                   │
//! │                                                     │
//! │  entities: HashMap<Entity, HashSet<TypeId>>         │
//! │    entity table: which types each entity holds      │
//! │                                                     │
//! │  pending: HashSet<Entity>                           │
//! │    marked for destruction at the next flush         │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! `columns` and `entities` mirror each other: entity `E` is a key of
//! column `T` exactly when `T` is in `entities[E]`. Empty columns and empty
//! entity rows are removed on the spot, so neither map ever holds a dangling
//! empty entry.
//!
//! ## Deferred Destruction
//!
//! [`World::destroy_entity`] only marks an entity. Nothing about it changes
//! until [`World::flush_removals`] runs (the [`Manager`](crate::Manager)
//! does this at the start of every tick). Systems can therefore destroy
//! entities they are iterating over, as long as they go through the deferred
//! path. [`World::destroy_entity_immediate`] bypasses the queue.
//!
//! ## Comparison
//!
//! - **hecs**: Archetype tables, despawn is immediate, no pending set.
//! - **bevy_ecs**: Archetypes plus `Commands` for deferring *all* structural
//!   changes.
//!
//! We only defer entity destruction, which covers the common "kill it while
//! iterating" case without a command buffer.

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};

use log::{debug, trace};

use super::component::{Column, ColumnMap, Component, downcast, downcast_mut};
use super::entity::{Entity, EntityAllocator};
use super::query::{ComponentSet, QueryMany, QueryOne, QueryParam};
use crate::error::{EcsError, Result};

/// Central container for entity and component data.
pub struct World {
    allocator: EntityAllocator,
    /// Component-type index and storage, keyed by component `TypeId`.
    columns: ColumnMap,
    /// Entity table: entity → component types it currently holds.
    entities: HashMap<Entity, HashSet<TypeId>>,
    /// Entities waiting for the next `flush_removals()`.
    pending: HashSet<Entity>,
    /// Entities created since the last diagnostics read.
    #[cfg(feature = "diagnostics")]
    created_this_tick: u32,
    /// Entities destroyed since the last diagnostics read.
    #[cfg(feature = "diagnostics")]
    destroyed_this_tick: u32,
}

impl World {
    pub fn new() -> Self {
        Self {
            allocator: EntityAllocator::new(),
            columns: HashMap::new(),
            entities: HashMap::new(),
            pending: HashSet::new(),
            #[cfg(feature = "diagnostics")]
            created_this_tick: 0,
            #[cfg(feature = "diagnostics")]
            destroyed_this_tick: 0,
        }
    }

    // ── Create / Destroy ─────────────────────────────────────────────

    /// Create an entity, attaching every component in `bundle`.
    ///
    /// Pass `()` for an entity with no components.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let e = world.create_entity((Position { x: 0.0, y: 0.0 }, Velocity { dx: 1.0, dy: 0.0 }));
    /// let bare = world.create_entity(());
    /// ```
    pub fn create_entity<B: Bundle>(&mut self, bundle: B) -> Entity {
        let entity = self.allocator.allocate();
        // After `clear()` a stale handle may already have given this id a row.
        self.entities.entry(entity).or_default();
        bundle.add_to(self, entity);
        #[cfg(feature = "diagnostics")]
        {
            self.created_this_tick += 1;
        }
        trace!("created entity {entity}");
        entity
    }

    /// Mark an entity for destruction at the next [`flush_removals`](Self::flush_removals).
    ///
    /// Until then the entity and its components stay fully visible. Marking
    /// twice is a no-op. Returns `true` if the entity was newly marked.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        let newly_marked = self.pending.insert(entity);
        if newly_marked {
            trace!("entity {entity} marked for destruction");
        }
        newly_marked
    }

    /// Destroy an entity right now, removing it from every component index.
    ///
    /// Also takes it off the pending list if it was marked.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityNotFound`] if the entity has no row in the entity table.
    pub fn destroy_entity_immediate(&mut self, entity: Entity) -> Result<()> {
        let types = self
            .entities
            .remove(&entity)
            .ok_or(EcsError::EntityNotFound(entity))?;

        for tid in types {
            if let Some(column) = self.columns.get_mut(&tid) {
                column.remove_entity(entity);
                if column.is_empty() {
                    self.columns.remove(&tid);
                }
            }
        }
        self.pending.remove(&entity);

        #[cfg(feature = "diagnostics")]
        {
            self.destroyed_this_tick += 1;
        }
        trace!("destroyed entity {entity}");
        Ok(())
    }

    /// Destroy every entity marked by [`destroy_entity`](Self::destroy_entity)
    /// and empty the pending set. Returns how many entities were destroyed.
    ///
    /// Marked ids that no longer exist (destroyed immediately in the meantime,
    /// or left without components) are skipped.
    pub fn flush_removals(&mut self) -> usize {
        if self.pending.is_empty() {
            return 0;
        }

        let mut pending: Vec<Entity> = self.pending.drain().collect();
        pending.sort_unstable();

        let mut destroyed = 0;
        for entity in pending {
            match self.destroy_entity_immediate(entity) {
                Ok(()) => destroyed += 1,
                Err(err) => debug!("skipping pending destruction: {err}"),
            }
        }
        debug!("flushed {destroyed} pending entities");
        destroyed
    }

    /// Drop every entity, component and pending mark, and restart entity ids
    /// from 1.
    ///
    /// Handles kept from before the reset alias the ids handed out after it.
    pub fn clear(&mut self) {
        self.columns.clear();
        self.entities.clear();
        self.pending.clear();
        self.allocator.reset();
        #[cfg(feature = "diagnostics")]
        {
            self.created_this_tick = 0;
            self.destroyed_this_tick = 0;
        }
        debug!("world cleared");
    }

    // ── Per-Entity Component Access ──────────────────────────────────

    /// Attach a component to an entity.
    ///
    /// If the entity already has a component of this type, it is replaced.
    /// An entity without a row (e.g. one whose last component was removed)
    /// gets a fresh row.
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) {
        let tid = TypeId::of::<T>();
        let column = self
            .columns
            .entry(tid)
            .or_insert_with(|| Box::new(Column::<T>::new()));
        downcast_mut::<T>(&mut **column).insert(entity, component);
        self.entities.entry(entity).or_default().insert(tid);
        trace!("added `{}` to entity {entity}", std::any::type_name::<T>());
    }

    /// Detach and return the entity's component of type `T`.
    ///
    /// The component-type index entry is dropped once empty, and so is the
    /// entity's row. The entity id itself stays usable for new components.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityNotFound`] or [`EcsError::ComponentNotFound`] if there
    /// is nothing to remove.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Result<T> {
        let known = self.entities.contains_key(&entity);
        let tid = TypeId::of::<T>();

        let Some(column) = self.columns.get_mut(&tid) else {
            return Err(not_found::<T>(known, entity));
        };
        let removed = downcast_mut::<T>(&mut **column).remove(entity);
        let now_empty = column.is_empty();
        let Some(value) = removed else {
            return Err(not_found::<T>(known, entity));
        };

        if now_empty {
            self.columns.remove(&tid);
        }
        if let Some(types) = self.entities.get_mut(&entity) {
            types.remove(&tid);
            if types.is_empty() {
                self.entities.remove(&entity);
            }
        }
        trace!("removed `{}` from entity {entity}", std::any::type_name::<T>());
        Ok(value)
    }

    /// Get a shared reference to a component on a specific entity.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityNotFound`] or [`EcsError::ComponentNotFound`].
    pub fn get_component<T: Component>(&self, entity: Entity) -> Result<&T> {
        self.column::<T>()
            .and_then(|column| column.get(entity))
            .ok_or_else(|| not_found::<T>(self.contains_entity(entity), entity))
    }

    /// Get a mutable reference to a component on a specific entity.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityNotFound`] or [`EcsError::ComponentNotFound`].
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T> {
        let known = self.entities.contains_key(&entity);
        self.columns
            .get_mut(&TypeId::of::<T>())
            .and_then(|column| downcast_mut::<T>(&mut **column).get_mut(entity))
            .ok_or_else(|| not_found::<T>(known, entity))
    }

    /// All components attached to an entity, in no particular order.
    ///
    /// Meant for inspection or for moving an entity to another world; use
    /// `downcast_ref` on each item.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityNotFound`] if the entity has no row.
    pub fn get_all_components(&self, entity: Entity) -> Result<Vec<&dyn Any>> {
        let types = self
            .entities
            .get(&entity)
            .ok_or(EcsError::EntityNotFound(entity))?;
        Ok(types
            .iter()
            .filter_map(|tid| self.columns.get(tid)?.get_any(entity))
            .collect())
    }

    /// Check whether an entity has a component of type `T`. Unknown entities
    /// simply don't.
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.entities
            .get(&entity)
            .is_some_and(|types| types.contains(&TypeId::of::<T>()))
    }

    // ── Bookkeeping ──────────────────────────────────────────────────

    /// Check if an entity has a row in the entity table.
    pub fn contains_entity(&self, entity: Entity) -> bool {
        self.entities.contains_key(&entity)
    }

    /// Check if an entity is waiting for the next flush.
    pub fn is_pending(&self, entity: Entity) -> bool {
        self.pending.contains(&entity)
    }

    /// Number of rows in the entity table.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of entities marked for deferred destruction.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Number of component types with at least one instance.
    pub fn component_type_count(&self) -> usize {
        self.columns.len()
    }

    pub(crate) fn column<T: Component>(&self) -> Option<&Column<T>> {
        self.columns
            .get(&TypeId::of::<T>())
            .map(|column| downcast::<T>(&**column))
    }

    /// Intersect the index sets of every requested type.
    ///
    /// Walks the smallest set and probes the others. Any type without an
    /// index yields no matches.
    pub(crate) fn matching(&self, type_ids: &[TypeId]) -> Vec<Entity> {
        let mut columns = Vec::with_capacity(type_ids.len());
        for tid in type_ids {
            match self.columns.get(tid) {
                Some(column) => columns.push(&**column),
                None => return Vec::new(),
            }
        }
        columns.sort_by_key(|column| column.len());

        let Some((smallest, rest)) = columns.split_first() else {
            return Vec::new();
        };
        smallest
            .entities()
            .filter(|&entity| rest.iter().all(|column| column.contains(entity)))
            .collect()
    }

    // ── Query ────────────────────────────────────────────────────────

    /// Iterate `(Entity, &T)` for every entity holding a `T`.
    ///
    /// Order is unspecified. Call again for a fresh view.
    pub fn query_one<T: Component>(&self) -> QueryOne<'_, T> {
        QueryOne::new(self.column::<T>())
    }

    /// Iterate `(Entity, &mut T)` for every entity holding a `T`.
    pub fn query_one_mut<T: Component>(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.columns
            .get_mut(&TypeId::of::<T>())
            .map(|column| downcast_mut::<T>(&mut **column))
            .into_iter()
            .flat_map(|column| column.iter_mut())
            .map(|(&entity, value)| (entity, value))
    }

    /// Iterate entities that hold *every* type in `Q`, yielding their
    /// components in the order requested.
    ///
    /// If any type in `Q` has never been attached (or has no instances left),
    /// the iterator is empty.
    ///
    /// # Example
    ///
    /// ```ignore
    /// for (entity, (pos, vel)) in world.query_many::<(Position, Velocity)>() {
    ///     println!("{entity}: {pos:?} moving {vel:?}");
    /// }
    /// ```
    pub fn query_many<Q: ComponentSet>(&self) -> QueryMany<'_, Q> {
        QueryMany::new(self, self.matching(&Q::type_ids()))
    }

    /// Closure-based query with mutable access.
    ///
    /// Takes a closure that receives `(Entity, Q::Item)` for each entity that
    /// holds every requested type.
    ///
    /// # Panics
    ///
    /// Panics if the same component type is requested twice, since that would
    /// hand out two references to the same column. A panic inside `f` is
    /// propagated after the extracted columns are put back.
    ///
    /// # Example
    ///
    /// ```ignore
    /// world.query_mut::<(&mut Position, &Velocity)>(|entity, (pos, vel)| {
    ///     pos.x += vel.dx;
    /// });
    /// ```
    pub fn query_mut<Q: QueryParam>(&mut self, mut f: impl FnMut(Entity, Q::Item<'_>)) {
        let type_ids = Q::type_ids();
        for (i, tid) in type_ids.iter().enumerate() {
            assert!(
                !type_ids[..i].contains(tid),
                "query_mut: component type requested more than once in `{}`",
                std::any::type_name::<Q>()
            );
        }

        let matches = self.matching(&type_ids);
        if matches.is_empty() {
            return;
        }

        let mut guard = RestoreColumns::<Q> {
            cols: Some(Q::extract(&mut self.columns)),
            columns: &mut self.columns,
        };
        let Some(cols) = guard.cols.as_mut() else {
            return;
        };
        for entity in matches {
            if let Some(item) = Q::fetch(cols, entity) {
                f(entity, item);
            }
        }
    }

    // ── Diagnostics ──────────────────────────────────────────────────

    /// Per-type populations, largest first.
    #[cfg(feature = "diagnostics")]
    pub(crate) fn diagnostics_component_types(&self) -> Vec<crate::diag::ComponentTypeSnapshot> {
        let mut types: Vec<_> = self
            .columns
            .values()
            .map(|column| crate::diag::ComponentTypeSnapshot {
                name: crate::diag::short_type_name(column.type_name()),
                entity_count: column.len(),
            })
            .collect();
        types.sort_by(|a, b| {
            b.entity_count
                .cmp(&a.entity_count)
                .then_with(|| a.name.cmp(&b.name))
        });
        types
    }

    /// Collect entity statistics and reset the per-tick counters.
    #[cfg(feature = "diagnostics")]
    pub(crate) fn diagnostics_entity_stats(&mut self) -> crate::diag::EntityStatsSnapshot {
        let stats = crate::diag::EntityStatsSnapshot {
            alive_count: self.entities.len(),
            pending_count: self.pending.len(),
            total_allocated: self.allocator.total_allocated(),
            created_this_tick: self.created_this_tick,
            destroyed_this_tick: self.destroyed_this_tick,
        };
        self.created_this_tick = 0;
        self.destroyed_this_tick = 0;
        stats
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Puts extracted query columns back into the world when dropped, so a
/// panicking `query_mut` closure can't leave rows pointing at missing columns.
struct RestoreColumns<'w, Q: QueryParam> {
    cols: Option<Q::Column>,
    columns: &'w mut ColumnMap,
}

impl<Q: QueryParam> Drop for RestoreColumns<'_, Q> {
    fn drop(&mut self) {
        if let Some(cols) = self.cols.take() {
            Q::restore(cols, self.columns);
        }
    }
}

fn not_found<T: 'static>(entity_known: bool, entity: Entity) -> EcsError {
    if entity_known {
        EcsError::component_not_found::<T>(entity)
    } else {
        EcsError::EntityNotFound(entity)
    }
}

// ── Bundle Trait (tuple support) ─────────────────────────────────────────

/// A set of components attached together by [`World::create_entity`].
///
/// Implemented for `()` and for tuples of up to 8 components. A tuple that
/// repeats a type keeps the last value, just like repeated `add_component`.
pub trait Bundle {
    fn add_to(self, world: &mut World, entity: Entity);
}

impl Bundle for () {
    fn add_to(self, _world: &mut World, _entity: Entity) {}
}

macro_rules! impl_bundle {
    ($($T:ident),+) => {
        impl<$($T: Component),+> Bundle for ($($T,)+) {
            #[allow(non_snake_case)]
            fn add_to(self, world: &mut World, entity: Entity) {
                let ($($T,)+) = self;
                $(world.add_component(entity, $T);)+
            }
        }
    };
}

impl_bundle!(A);
impl_bundle!(A, B);
impl_bundle!(A, B, C);
impl_bundle!(A, B, C, D);
impl_bundle!(A, B, C, D, E);
impl_bundle!(A, B, C, D, E, F);
impl_bundle!(A, B, C, D, E, F, G);
impl_bundle!(A, B, C, D, E, F, G, H);

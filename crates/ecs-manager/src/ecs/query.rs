//! # Query — Iterating Over Entities by Component Type
//!
//! Queries are how systems read and write component data. A query names the
//! component types it needs, and the world finds every entity holding all of
//! them.
//!
//! ## How Queries Work
//!
//! ```text
//! world.query_many::<(Position, Velocity)>()
//!
//! 1. Compute TypeIds: [TypeId::of::<Position>(), TypeId::of::<Velocity>()]
//! 2. Look up each type's index set. Any missing → no matches.
//! 3. Walk the smallest set, keep entities present in all the others.
//! 4. Yield (Entity, (&Position, &Velocity)) one at a time.
//! ```
//!
//! The intersection is computed up front (the sets are small and bounded),
//! then results are produced lazily. Nothing is cached: calling the query
//! again re-reads the current state.
//!
//! ## Three Flavours
//!
//! - [`QueryOne`]: one type, `(Entity, &T)`.
//! - [`QueryMany`]: several types via [`ComponentSet`], shared references.
//! - [`World::query_mut`](super::world::World::query_mut): closure-based,
//!   any mix of `&T` and `&mut T` via [`QueryParam`].
//!
//! Rust's `Iterator` trait can't hand out `&mut` borrows into two columns of
//! the same map at once. The closure form works around this by temporarily
//! removing the needed columns from the world's column map, giving us owned
//! access that satisfies the borrow checker, then restoring them afterward.
//!
//! Because every query borrows the world, structural changes while iterating
//! are rejected at compile time. Collect entity ids first, then mutate, or
//! use deferred destruction.
//!
//! ## Comparison
//!
//! - **hecs**: `Query` trait on tuples, iterator based, archetype matching.
//! - **bevy_ecs**: Same core idea plus filters and change detection.

use std::any::TypeId;
use std::collections::hash_map;
use std::marker::PhantomData;

use super::component::{Column, ColumnMap, Component, ErasedColumn, downcast, downcast_mut};
use super::entity::Entity;
use super::world::World;

// ── Single-Type Query ────────────────────────────────────────────────────

/// Iterator over `(Entity, &T)` for every entity holding a `T`.
///
/// Created by [`World::query_one`](super::world::World::query_one).
pub struct QueryOne<'w, T> {
    inner: Option<hash_map::Iter<'w, Entity, T>>,
}

impl<'w, T: Component> QueryOne<'w, T> {
    pub(crate) fn new(column: Option<&'w Column<T>>) -> Self {
        Self {
            inner: column.map(Column::iter),
        }
    }
}

impl<'w, T: Component> Iterator for QueryOne<'w, T> {
    type Item = (Entity, &'w T);

    fn next(&mut self) -> Option<Self::Item> {
        let (&entity, value) = self.inner.as_mut()?.next()?;
        Some((entity, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner
            .as_ref()
            .map_or((0, Some(0)), |iter| iter.size_hint())
    }
}

// ── Multi-Type Query ─────────────────────────────────────────────────────

/// A tuple of component types fetched together by
/// [`World::query_many`](super::world::World::query_many).
///
/// Implemented for tuples of 1 to 8 component types: `(A,)`, `(A, B)`, ...
pub trait ComponentSet {
    /// Shared references to each component, in tuple order.
    type Refs<'w>;

    /// The component TypeIds this set needs.
    fn type_ids() -> Vec<TypeId>;

    /// Fetch every component for `entity`. `None` if any is missing.
    fn fetch(world: &World, entity: Entity) -> Option<Self::Refs<'_>>;
}

macro_rules! impl_component_set {
    ($($T:ident),+) => {
        impl<$($T: Component),+> ComponentSet for ($($T,)+) {
            type Refs<'w> = ($(&'w $T,)+);

            fn type_ids() -> Vec<TypeId> {
                vec![$(TypeId::of::<$T>()),+]
            }

            fn fetch(world: &World, entity: Entity) -> Option<Self::Refs<'_>> {
                Some(($(world.column::<$T>()?.get(entity)?,)+))
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);
impl_component_set!(A, B, C, D, E, F);
impl_component_set!(A, B, C, D, E, F, G);
impl_component_set!(A, B, C, D, E, F, G, H);

/// Iterator over `(Entity, Q::Refs)` for every entity holding all of `Q`.
///
/// Created by [`World::query_many`](super::world::World::query_many).
pub struct QueryMany<'w, Q> {
    world: &'w World,
    matches: std::vec::IntoIter<Entity>,
    _marker: PhantomData<Q>,
}

impl<'w, Q: ComponentSet> QueryMany<'w, Q> {
    pub(crate) fn new(world: &'w World, matches: Vec<Entity>) -> Self {
        Self {
            world,
            matches: matches.into_iter(),
            _marker: PhantomData,
        }
    }
}

impl<'w, Q: ComponentSet> Iterator for QueryMany<'w, Q> {
    type Item = (Entity, Q::Refs<'w>);

    fn next(&mut self) -> Option<Self::Item> {
        // The world is borrowed for 'w, so every match is still valid; the
        // loop only guards against a set that was intersected incorrectly.
        for entity in self.matches.by_ref() {
            if let Some(refs) = Q::fetch(self.world, entity) {
                return Some((entity, refs));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.matches.len()))
    }
}

// ── Closure-Based Mutable Query ──────────────────────────────────────────

/// Trait for types that can be fetched from an extracted column.
///
/// Implemented for `&T` (shared read) and `&mut T` (exclusive write).
/// Tuple impls allow combining them: `(&A, &mut B, &C)`.
///
/// The `Column` associated type enables the extract/restore pattern: columns
/// are temporarily taken out of the world's column map so the borrow checker
/// can see that independent columns don't alias.
pub trait QueryParam {
    /// The item yielded per entity.
    type Item<'w>;

    /// Owned column data extracted from the world.
    type Column;

    /// The component TypeIds this parameter needs.
    fn type_ids() -> Vec<TypeId>;

    /// Extract the needed column(s) from the column map.
    ///
    /// Callers guarantee every column is present.
    fn extract(columns: &mut ColumnMap) -> Self::Column;

    /// Restore the column(s) back into the column map.
    fn restore(col: Self::Column, columns: &mut ColumnMap);

    /// Fetch the item for `entity` from the extracted column(s).
    fn fetch(col: &mut Self::Column, entity: Entity) -> Option<Self::Item<'_>>;
}

fn take_column<T: Component>(columns: &mut ColumnMap) -> (TypeId, Box<dyn ErasedColumn>) {
    let tid = TypeId::of::<T>();
    let col = columns.remove(&tid).unwrap_or_else(|| {
        panic!(
            "Query extract: column for `{}` not found",
            std::any::type_name::<T>()
        )
    });
    (tid, col)
}

/// Shared read access to a component.
impl<T: Component> QueryParam for &T {
    type Item<'w> = &'w T;
    type Column = (TypeId, Box<dyn ErasedColumn>);

    fn type_ids() -> Vec<TypeId> {
        vec![TypeId::of::<T>()]
    }

    fn extract(columns: &mut ColumnMap) -> Self::Column {
        take_column::<T>(columns)
    }

    fn restore(col: Self::Column, columns: &mut ColumnMap) {
        columns.insert(col.0, col.1);
    }

    fn fetch(col: &mut Self::Column, entity: Entity) -> Option<Self::Item<'_>> {
        downcast::<T>(&*col.1).get(entity)
    }
}

/// Exclusive write access to a component.
impl<T: Component> QueryParam for &mut T {
    type Item<'w> = &'w mut T;
    type Column = (TypeId, Box<dyn ErasedColumn>);

    fn type_ids() -> Vec<TypeId> {
        vec![TypeId::of::<T>()]
    }

    fn extract(columns: &mut ColumnMap) -> Self::Column {
        take_column::<T>(columns)
    }

    fn restore(col: Self::Column, columns: &mut ColumnMap) {
        columns.insert(col.0, col.1);
    }

    fn fetch(col: &mut Self::Column, entity: Entity) -> Option<Self::Item<'_>> {
        downcast_mut::<T>(&mut *col.1).get_mut(entity)
    }
}

/// Implement `QueryParam` for tuples of params.
///
/// This lets you write `world.query_mut::<(&A, &mut B)>(|e, (a, b)| { ... })`
/// and get `(Entity, (&A, &mut B))` per matching entity.
macro_rules! impl_query_param_tuple {
    ($($P:ident),+) => {
        impl<$($P: QueryParam),+> QueryParam for ($($P,)+) {
            type Item<'w> = ($($P::Item<'w>,)+);
            type Column = ($($P::Column,)+);

            fn type_ids() -> Vec<TypeId> {
                let mut ids = Vec::new();
                $(ids.extend($P::type_ids());)+
                ids
            }

            #[allow(non_snake_case)]
            fn extract(columns: &mut ColumnMap) -> Self::Column {
                ($($P::extract(columns),)+)
            }

            #[allow(non_snake_case)]
            fn restore(col: Self::Column, columns: &mut ColumnMap) {
                let ($($P,)+) = col;
                $($P::restore($P, columns);)+
            }

            #[allow(non_snake_case)]
            fn fetch(col: &mut Self::Column, entity: Entity) -> Option<Self::Item<'_>> {
                let ($($P,)+) = col;
                Some(($($P::fetch($P, entity)?,)+))
            }
        }
    };
}

impl_query_param_tuple!(A);
impl_query_param_tuple!(A, B);
impl_query_param_tuple!(A, B, C);
impl_query_param_tuple!(A, B, C, D);
impl_query_param_tuple!(A, B, C, D, E);
impl_query_param_tuple!(A, B, C, D, E, F);
impl_query_param_tuple!(A, B, C, D, E, F, G);
impl_query_param_tuple!(A, B, C, D, E, F, G, H);

#[cfg(test)]
mod tests {
    use super::*;

    struct Health(u32);
    struct Armor(u32);

    #[test]
    fn query_one_size_hint_empty() {
        let world = World::new();
        let query = world.query_one::<Health>();
        assert_eq!(query.size_hint(), (0, Some(0)));
    }

    #[test]
    fn query_one_yields_each_holder_once() {
        let mut world = World::new();
        let a = world.create_entity((Health(1),));
        let b = world.create_entity((Health(2), Armor(5)));

        let mut seen: Vec<_> = world.query_one::<Health>().map(|(e, h)| (e, h.0)).collect();
        seen.sort();
        assert_eq!(seen, vec![(a, 1), (b, 2)]);
    }

    #[test]
    fn component_set_type_ids_in_order() {
        assert_eq!(
            <(Health, Armor) as ComponentSet>::type_ids(),
            vec![TypeId::of::<Health>(), TypeId::of::<Armor>()]
        );
    }

    #[test]
    fn component_set_fetch_requires_all() {
        let mut world = World::new();
        let e = world.create_entity((Health(1),));
        assert!(<(Health,) as ComponentSet>::fetch(&world, e).is_some());
        assert!(<(Health, Armor) as ComponentSet>::fetch(&world, e).is_none());
    }

    #[test]
    fn query_param_tuple_type_ids() {
        assert_eq!(
            <(&Health, &mut Armor) as QueryParam>::type_ids(),
            vec![TypeId::of::<Health>(), TypeId::of::<Armor>()]
        );
    }

    #[test]
    fn query_mut_reads_and_writes_separate_columns() {
        let mut world = World::new();
        let e = world.create_entity((Health(10), Armor(3)));

        world.query_mut::<(&mut Health, &Armor)>(|_, (health, armor)| {
            health.0 -= armor.0;
        });
        assert_eq!(world.get_component::<Health>(e).unwrap().0, 7);
    }

    #[test]
    fn query_mut_single_param_tuple() {
        let mut world = World::new();
        world.create_entity((Armor(1),));
        world.create_entity((Armor(2),));

        let mut total = 0;
        world.query_mut::<(&Armor,)>(|_, (armor,)| total += armor.0);
        assert_eq!(total, 3);
    }
}

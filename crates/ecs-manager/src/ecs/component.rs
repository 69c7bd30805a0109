//! # Component — Type-Keyed Sparse Storage
//!
//! In an ECS, components are plain data: a `Position`, a `Velocity`, a
//! `Health`. Any `'static + Send + Sync` value can be a component; its
//! [`TypeId`](std::any::TypeId) is the only thing used to classify it.
//!
//! ## Storage Layout
//!
//! Each component type gets one homogeneous [`Column`]: a
//! `HashMap<Entity, T>`. The column's key set doubles as the
//! *component-type index*: "which entities have a `T`?" is just
//! `column.keys()`.
//!
//! ```text
//! columns: HashMap<TypeId, Box<dyn ErasedColumn>>
//!   Position → Column<Position> { 1: (0,0), 4: (3,1) }
//!   Velocity → Column<Velocity> { 4: (1,0) }
//! ```
//!
//! The world needs to drop a whole entity without knowing its component
//! types statically, so columns are stored behind the [`ErasedColumn`] trait
//! and downcast back to `Column<T>` when a typed reference is needed.
//!
//! ## Comparison
//!
//! - **Archetype ECS (hecs, bevy_ecs)**: Entities with the same component set
//!   share a table. Great iteration locality, expensive add/remove.
//! - **Here**: One sparse map per type. Add/remove is a single hash insert,
//!   multi-type queries intersect key sets.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::collections::hash_map;

use super::entity::Entity;

/// Marker trait for anything that can be attached to an entity.
///
/// Blanket-implemented; there is nothing to implement by hand.
pub trait Component: 'static + Send + Sync {}

impl<T: 'static + Send + Sync> Component for T {}

/// Map of component type → type-erased column.
pub type ColumnMap = HashMap<TypeId, Box<dyn ErasedColumn>>;

/// Type-erased view of a [`Column`].
///
/// Lets the world remove an entity from every column it appears in and
/// intersect key sets without knowing the component types.
pub trait ErasedColumn: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    /// Drop the component stored for `entity`. Returns `false` if there was none.
    fn remove_entity(&mut self, entity: Entity) -> bool;
    fn contains(&self, entity: Entity) -> bool;
    fn get_any(&self, entity: Entity) -> Option<&dyn Any>;
    /// Entities holding this component type, in map order.
    fn entities(&self) -> Box<dyn Iterator<Item = Entity> + '_>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Fully-qualified name of the stored component type.
    fn type_name(&self) -> &'static str;
}

/// Homogeneous storage for one component type.
pub(crate) struct Column<T> {
    data: HashMap<Entity, T>,
}

impl<T: Component> Column<T> {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    /// Insert or overwrite the component for `entity`.
    pub fn insert(&mut self, entity: Entity, value: T) -> Option<T> {
        self.data.insert(entity, value)
    }

    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        self.data.remove(&entity)
    }

    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.data.get(&entity)
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.data.get_mut(&entity)
    }

    pub fn iter(&self) -> hash_map::Iter<'_, Entity, T> {
        self.data.iter()
    }

    pub fn iter_mut(&mut self) -> hash_map::IterMut<'_, Entity, T> {
        self.data.iter_mut()
    }
}

impl<T: Component> ErasedColumn for Column<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.data.remove(&entity).is_some()
    }

    fn contains(&self, entity: Entity) -> bool {
        self.data.contains_key(&entity)
    }

    fn get_any(&self, entity: Entity) -> Option<&dyn Any> {
        self.data.get(&entity).map(|value| value as &dyn Any)
    }

    fn entities(&self) -> Box<dyn Iterator<Item = Entity> + '_> {
        Box::new(self.data.keys().copied())
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Recover the typed column behind a type-erased one.
///
/// # Panics
///
/// Panics if the column doesn't store `T`. Columns are keyed by
/// `TypeId::of::<T>()`, so this indicates a framework bug.
pub(crate) fn downcast<T: Component>(column: &dyn ErasedColumn) -> &Column<T> {
    column
        .as_any()
        .downcast_ref::<Column<T>>()
        .unwrap_or_else(|| {
            panic!(
                "Component type mismatch: column `{}` is not a column of `{}`",
                column.type_name(),
                std::any::type_name::<T>()
            )
        })
}

/// Mutable counterpart of [`downcast`].
///
/// # Panics
///
/// Panics if the column doesn't store `T`.
pub(crate) fn downcast_mut<T: Component>(column: &mut dyn ErasedColumn) -> &mut Column<T> {
    let name = column.type_name();
    column
        .as_any_mut()
        .downcast_mut::<Column<T>>()
        .unwrap_or_else(|| {
            panic!(
                "Component type mismatch: column `{}` is not a column of `{}`",
                name,
                std::any::type_name::<T>()
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get() {
        let mut col = Column::new();
        col.insert(Entity(1), 1.0f32);
        col.insert(Entity(2), 2.0f32);
        assert_eq!(col.get(Entity(1)), Some(&1.0));
        assert_eq!(col.get(Entity(2)), Some(&2.0));
        assert_eq!(col.get(Entity(3)), None);
        assert_eq!(col.len(), 2);
    }

    #[test]
    fn insert_overwrites() {
        let mut col = Column::new();
        assert_eq!(col.insert(Entity(1), 10u32), None);
        assert_eq!(col.insert(Entity(1), 20u32), Some(10));
        assert_eq!(col.get(Entity(1)), Some(&20));
        assert_eq!(col.len(), 1);
    }

    #[test]
    fn erased_remove_and_contains() {
        let mut col: Box<dyn ErasedColumn> = Box::new(Column::<u64>::new());
        downcast_mut::<u64>(&mut *col).insert(Entity(7), 99);
        assert!(col.contains(Entity(7)));
        assert!(col.remove_entity(Entity(7)));
        assert!(!col.remove_entity(Entity(7)));
        assert!(col.is_empty());
    }

    #[test]
    fn erased_get_any_downcasts() {
        let mut col = Column::new();
        col.insert(Entity(3), String::from("hello"));
        let erased: &dyn ErasedColumn = &col;
        let value = erased.get_any(Entity(3)).unwrap();
        assert_eq!(value.downcast_ref::<String>().unwrap(), "hello");
        assert!(erased.type_name().ends_with("String"));
    }

    #[test]
    fn entities_lists_keys() {
        let mut col = Column::new();
        col.insert(Entity(1), ());
        col.insert(Entity(5), ());
        let erased: &dyn ErasedColumn = &col;
        let mut ids: Vec<_> = erased.entities().collect();
        ids.sort();
        assert_eq!(ids, vec![Entity(1), Entity(5)]);
    }

    #[test]
    #[should_panic(expected = "Component type mismatch")]
    fn downcast_wrong_type_panics() {
        let col = Column::<u32>::new();
        downcast::<u64>(&col);
    }

    #[test]
    fn drop_called_on_remove() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static DROP_COUNT: AtomicUsize = AtomicUsize::new(0);

        struct Tracked;
        impl Drop for Tracked {
            fn drop(&mut self) {
                DROP_COUNT.fetch_add(1, Ordering::SeqCst);
            }
        }

        DROP_COUNT.store(0, Ordering::SeqCst);
        let mut col: Box<dyn ErasedColumn> = Box::new(Column::<Tracked>::new());
        downcast_mut::<Tracked>(&mut *col).insert(Entity(1), Tracked);
        downcast_mut::<Tracked>(&mut *col).insert(Entity(2), Tracked);
        col.remove_entity(Entity(1));
        assert_eq!(DROP_COUNT.load(Ordering::SeqCst), 1); // only the removed one
        drop(col);
        assert_eq!(DROP_COUNT.load(Ordering::SeqCst), 2); // remaining one dropped
    }
}

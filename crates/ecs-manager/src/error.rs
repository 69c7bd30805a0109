//! Errors returned by fallible registry operations.

use thiserror::Error;

use crate::ecs::Entity;

/// Lookup and removal failures.
///
/// Both variants mean "the data you asked for isn't there". Use
/// [`World::has_component`](crate::ecs::World::has_component) first when
/// absence is an expected case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EcsError {
    /// The entity has no row in the entity table: it was never created,
    /// it has been destroyed, or its last component was removed.
    #[error("entity {0} not found")]
    EntityNotFound(Entity),
    /// The entity exists but holds no component of the requested type.
    #[error("entity {entity} has no `{component}` component")]
    ComponentNotFound {
        entity: Entity,
        component: &'static str,
    },
}

impl EcsError {
    pub(crate) fn component_not_found<T: 'static>(entity: Entity) -> Self {
        Self::ComponentNotFound {
            entity,
            component: std::any::type_name::<T>(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EcsError>;

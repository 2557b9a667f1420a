//! Services consulted while preparing and restoring objects
//!
//! The hooks never reach for global state: callers pass a
//! [`SerializationContext`] holding the persistence manager and the object
//! registry.

use crate::value::ObjectRef;

/// Identity lookups of the persistence layer
#[cfg_attr(test, mockall::automock)]
pub trait PersistenceManager {
    /// Object is a persistable entity
    fn is_entity(&self, object: &ObjectRef) -> bool;

    /// Entity has not been persisted yet
    fn is_new_object(&self, object: &ObjectRef) -> bool;

    fn identifier_by_object(&self, object: &ObjectRef) -> Option<String>;

    /// Fetch a persisted entity
    fn object_by_identifier(&self, identifier: &str, entity_type: &str) -> Option<ObjectRef>;
}

/// Object configuration lookups
#[cfg_attr(test, mockall::automock)]
pub trait ObjectRegistry {
    /// Configured object name of an implementation class
    fn object_name_by_class_name(&self, class_name: &str) -> String;

    /// Object is shared process wide and obtained again on restore
    fn is_singleton(&self, object_name: &str) -> bool;
}

/// Services for one prepare or restore call
#[derive(Clone, Copy)]
pub struct SerializationContext<'a> {
    pub persistence: &'a dyn PersistenceManager,
    pub objects: &'a dyn ObjectRegistry,
}

impl<'a> SerializationContext<'a> {
    #[must_use]
    pub fn new(persistence: &'a dyn PersistenceManager, objects: &'a dyn ObjectRegistry) -> Self {
        Self {
            persistence,
            objects,
        }
    }

    /// Entity which already has a storage identity
    #[must_use]
    pub fn is_persisted_entity(&self, object: &ObjectRef) -> bool {
        self.persistence.is_entity(object) && !self.persistence.is_new_object(object)
    }
}

impl std::fmt::Debug for SerializationContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializationContext").finish_non_exhaustive()
    }
}

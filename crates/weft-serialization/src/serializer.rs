//! Prepare-for-storage and restore-after-load hooks
//!
//! Persisted entities referenced by an object are not serialized with it.
//! They are replaced by placeholders naming entity type and identifier and
//! fetched again from the persistence layer after loading.

use crate::context::SerializationContext;
use crate::error::SerializationError;
use crate::value::{ObjectRef, Value};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Bookkeeping fields of proxied objects which are never serialized
pub const INTERNAL_FIELDS: &[&str] = &[
    "Weft_Aop_Proxy_targetMethodsAndGroupedAdvices",
    "Weft_Aop_Proxy_groupedAdviceChains",
    "Weft_Aop_Proxy_methodIsInAdviceMode",
    "Weft_Injected_Properties",
    "Weft_Persistence_RelatedEntities",
];

/// Placeholder for a persisted entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedEntity {
    /// Field holding the entity
    pub property_name: String,
    pub entity_type: String,
    pub identifier: String,
    /// Path inside the field, `None` if the field holds the entity itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_path: Option<String>,
}

/// Serialized form of an object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredObject {
    pub class_name: String,
    pub fields: IndexMap<String, Value>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub related_entities: IndexMap<String, RelatedEntity>,
}

/// Live state of a proxied object
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectState {
    class_name: String,
    fields: IndexMap<String, Value>,
    injected: IndexSet<String>,
    related_entities: IndexMap<String, RelatedEntity>,
}

impl ObjectState {
    #[must_use]
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.set_field(name, value);
        self
    }

    /// Mark a field as filled by dependency injection
    #[must_use]
    pub fn with_injected(mut self, name: impl Into<String>) -> Self {
        self.injected.insert(name.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Placeholders recorded by the last prepare, keyed by field path
    #[must_use]
    pub fn related_entities(&self) -> &IndexMap<String, RelatedEntity> {
        &self.related_entities
    }

    /// Prepare the object for serialization
    ///
    /// Returns the names of the fields to serialize as they are. Persisted
    /// entities held directly by a field are recorded as placeholders and
    /// their field is left out; persisted entities inside containers are
    /// recorded with their path and replaced by null. Fields holding a
    /// singleton are left out, the singleton is obtained again on restore.
    pub fn prepare_for_storage(
        &mut self,
        transient_fields: &[&str],
        context: &SerializationContext<'_>,
    ) -> Result<Vec<String>, SerializationError> {
        self.related_entities.clear();
        let names: Vec<String> = self.fields.keys().cloned().collect();
        let mut fields_to_serialize = Vec::with_capacity(names.len());

        for name in names {
            if INTERNAL_FIELDS.contains(&name.as_str())
                || self.injected.contains(&name)
                || transient_fields.contains(&name.as_str())
            {
                continue;
            }
            let Some(value) = self.fields.get(&name) else {
                continue;
            };

            if value.is_container() {
                let mut entities = Vec::new();
                collect_persisted_entities(value, "", context, &mut entities);
                for (path, object) in entities {
                    let entity = related_entity(&name, Some(path.clone()), &object, context)?;
                    let nulled = self
                        .fields
                        .get_mut(&name)
                        .is_some_and(|field| field.set_path(&path, Value::Null));
                    if !nulled {
                        return Err(SerializationError::invalid_path(&name, &path));
                    }
                    self.related_entities.insert(format!("{name}.{path}"), entity);
                }
                fields_to_serialize.push(name);
                continue;
            }

            if let Value::Object(object) = value {
                if context.is_persisted_entity(object) {
                    let entity = related_entity(&name, None, object, context)?;
                    tracing::trace!("Replacing entity {} in {} by its identifier", entity.identifier, name);
                    self.related_entities.insert(name, entity);
                    continue;
                }
                let object_name = context.objects.object_name_by_class_name(&object.class_name);
                if context.objects.is_singleton(&object_name) {
                    continue;
                }
            }
            fields_to_serialize.push(name);
        }

        Ok(fields_to_serialize)
    }

    /// Reinstate the entities recorded as placeholders, then drop the
    /// placeholders
    ///
    /// Nothing is changed if any entity cannot be resolved.
    pub fn restore_after_load(
        &mut self,
        context: &SerializationContext<'_>,
    ) -> Result<(), SerializationError> {
        let mut resolved = Vec::with_capacity(self.related_entities.len());
        for entity in self.related_entities.values() {
            let object = context
                .persistence
                .object_by_identifier(&entity.identifier, &entity.entity_type)
                .ok_or_else(|| SerializationError::UnresolvedEntity {
                    entity_type: entity.entity_type.clone(),
                    identifier: entity.identifier.clone(),
                })?;
            resolved.push((entity, object));
        }

        for (entity, object) in resolved {
            match &entity.entity_path {
                Some(path) => {
                    let field = self
                        .fields
                        .get_mut(&entity.property_name)
                        .ok_or_else(|| SerializationError::UnknownField(entity.property_name.clone()))?;
                    if !field.set_path(path, Value::Object(object)) {
                        return Err(SerializationError::invalid_path(&entity.property_name, path));
                    }
                }
                None => {
                    self.fields
                        .insert(entity.property_name.clone(), Value::Object(object));
                }
            }
        }
        self.related_entities.clear();
        Ok(())
    }

    /// Serialized form holding the given fields and the placeholders
    #[must_use]
    pub fn stored(&self, field_names: &[String]) -> StoredObject {
        StoredObject {
            class_name: self.class_name.clone(),
            fields: field_names
                .iter()
                .filter_map(|name| self.fields.get(name).map(|value| (name.clone(), value.clone())))
                .collect(),
            related_entities: self.related_entities.clone(),
        }
    }

    /// Live state from a serialized form; placeholders still need
    /// [`restore_after_load`](Self::restore_after_load)
    #[must_use]
    pub fn from_stored(stored: StoredObject) -> Self {
        Self {
            class_name: stored.class_name,
            fields: stored.fields,
            injected: IndexSet::new(),
            related_entities: stored.related_entities,
        }
    }
}

fn collect_persisted_entities(
    value: &Value,
    prefix: &str,
    context: &SerializationContext<'_>,
    entities: &mut Vec<(String, ObjectRef)>,
) {
    for (segment, child) in value.entries() {
        let path = if prefix.is_empty() {
            segment
        } else {
            format!("{prefix}.{segment}")
        };
        if child.is_container() {
            collect_persisted_entities(child, &path, context, entities);
        } else if let Value::Object(object) = child {
            if context.is_persisted_entity(object) {
                entities.push((path, object.clone()));
            }
        }
    }
}

fn related_entity(
    property_name: &str,
    entity_path: Option<String>,
    object: &ObjectRef,
    context: &SerializationContext<'_>,
) -> Result<RelatedEntity, SerializationError> {
    let identifier = context.persistence.identifier_by_object(object).ok_or_else(|| {
        SerializationError::MissingIdentifier {
            class_name: object.class_name.clone(),
        }
    })?;
    Ok(RelatedEntity {
        property_name: property_name.to_string(),
        entity_type: context.objects.object_name_by_class_name(&object.class_name),
        identifier,
        entity_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{MockObjectRegistry, MockPersistenceManager, ObjectRegistry, PersistenceManager};
    use pretty_assertions::assert_eq;
    use std::collections::{HashMap, HashSet};

    /// Helper: persistence layer and object registry over fixed tables.
    #[derive(Default)]
    struct World {
        /// handle -> (identifier, is new)
        entities: HashMap<u64, (String, bool)>,
        singletons: HashSet<String>,
    }

    impl World {
        fn shop() -> Self {
            let mut world = Self::default();
            world.entities.insert(1, ("product-1".into(), false));
            world.entities.insert(2, ("product-2".into(), false));
            world.entities.insert(3, ("draft".into(), true));
            world.singletons.insert("Acme\\Logger".into());
            world
        }
    }

    impl PersistenceManager for World {
        fn is_entity(&self, object: &ObjectRef) -> bool {
            self.entities.contains_key(&object.handle)
        }

        fn is_new_object(&self, object: &ObjectRef) -> bool {
            self.entities.get(&object.handle).is_some_and(|(_, new)| *new)
        }

        fn identifier_by_object(&self, object: &ObjectRef) -> Option<String> {
            self.entities.get(&object.handle).map(|(identifier, _)| identifier.clone())
        }

        fn object_by_identifier(&self, identifier: &str, entity_type: &str) -> Option<ObjectRef> {
            self.entities
                .iter()
                .find(|(_, (known, _))| known == identifier)
                .map(|(handle, _)| ObjectRef::new(entity_type, *handle + 100))
        }
    }

    impl ObjectRegistry for World {
        fn object_name_by_class_name(&self, class_name: &str) -> String {
            class_name.to_string()
        }

        fn is_singleton(&self, object_name: &str) -> bool {
            self.singletons.contains(object_name)
        }
    }

    fn product(handle: u64) -> Value {
        Value::Object(ObjectRef::new("Acme\\Product", handle))
    }

    fn cart() -> ObjectState {
        ObjectState::new("Acme\\Cart")
            .with_field("title", Value::String("Mine".into()))
            .with_field("featured", product(1))
            .with_field(
                "items",
                Value::List(vec![
                    Value::Map(IndexMap::from([
                        ("product".to_string(), product(2)),
                        ("quantity".to_string(), Value::Int(3)),
                    ])),
                    product(3),
                ]),
            )
            .with_field("logger", Value::Object(ObjectRef::new("Acme\\Logger", 9)))
            .with_field("cache", Value::Null)
            .with_field("session", Value::Null)
            .with_field("Weft_Aop_Proxy_methodIsInAdviceMode", Value::List(Vec::new()))
            .with_injected("session")
    }

    #[test]
    fn prepare_records_placeholders_and_selects_fields() {
        let world = World::shop();
        let context = SerializationContext::new(&world, &world);
        let mut cart = cart();

        let fields = cart.prepare_for_storage(&["cache"], &context).unwrap();

        assert_eq!(fields, vec!["title", "items"]);
        assert_eq!(
            cart.related_entities().get("featured"),
            Some(&RelatedEntity {
                property_name: "featured".into(),
                entity_type: "Acme\\Product".into(),
                identifier: "product-1".into(),
                entity_path: None,
            })
        );
        let nested = &cart.related_entities()["items.0.product"];
        assert_eq!(nested.entity_path.as_deref(), Some("0.product"));
        assert_eq!(nested.identifier, "product-2");

        let items = cart.field("items").unwrap();
        assert_eq!(items.get_path("0.product"), Some(&Value::Null));
        assert_eq!(items.get_path("0.quantity"), Some(&Value::Int(3)));
        assert_eq!(items.get_path("1"), Some(&product(3)));
    }

    #[test]
    fn stored_object_round_trip_restores_entities() {
        let world = World::shop();
        let context = SerializationContext::new(&world, &world);
        let mut cart = cart();
        let fields = cart.prepare_for_storage(&[], &context).unwrap();

        let json = serde_json::to_string(&cart.stored(&fields)).unwrap();
        let mut loaded = ObjectState::from_stored(serde_json::from_str(&json).unwrap());
        assert!(loaded.field("featured").is_none());

        loaded.restore_after_load(&context).unwrap();

        assert_eq!(
            loaded.field("featured"),
            Some(&Value::Object(ObjectRef::new("Acme\\Product", 101)))
        );
        assert_eq!(
            loaded.field("items").unwrap().get_path("0.product"),
            Some(&Value::Object(ObjectRef::new("Acme\\Product", 102)))
        );
        assert!(loaded.related_entities().is_empty());
        assert!(loaded.field("logger").is_none());
    }

    #[test]
    fn entities_under_dotted_map_keys_round_trip() {
        let world = World::shop();
        let context = SerializationContext::new(&world, &world);
        let mut catalog = ObjectState::new("Acme\\Catalog")
            .with_field("byVersion", Value::Map(IndexMap::from([("1.0".to_string(), product(1))])));

        let fields = catalog.prepare_for_storage(&[], &context).unwrap();

        assert_eq!(fields, vec!["byVersion"]);
        assert_eq!(
            catalog.related_entities().keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["byVersion.1\\.0"]
        );
        assert_eq!(
            catalog.field("byVersion"),
            Some(&Value::Map(IndexMap::from([("1.0".to_string(), Value::Null)])))
        );

        catalog.restore_after_load(&context).unwrap();
        assert_eq!(
            catalog.field("byVersion"),
            Some(&Value::Map(IndexMap::from([(
                "1.0".to_string(),
                Value::Object(ObjectRef::new("Acme\\Product", 101))
            )])))
        );
        assert!(catalog.related_entities().is_empty());
    }

    #[test]
    fn unresolved_entity_leaves_state_untouched() {
        let mut persistence = MockPersistenceManager::new();
        persistence.expect_object_by_identifier().returning(|_, _| None);
        let objects = MockObjectRegistry::new();
        let context = SerializationContext::new(&persistence, &objects);

        let mut state = ObjectState::from_stored(StoredObject {
            class_name: "Acme\\Cart".into(),
            fields: IndexMap::new(),
            related_entities: IndexMap::from([(
                "featured".to_string(),
                RelatedEntity {
                    property_name: "featured".into(),
                    entity_type: "Acme\\Product".into(),
                    identifier: "gone".into(),
                    entity_path: None,
                },
            )]),
        });
        let before = state.clone();

        let err = state.restore_after_load(&context).unwrap_err();
        assert_eq!(
            err,
            SerializationError::UnresolvedEntity {
                entity_type: "Acme\\Product".into(),
                identifier: "gone".into(),
            }
        );
        assert_eq!(state, before);
    }

    #[test]
    fn persisted_entity_without_identifier_is_an_error() {
        let mut persistence = MockPersistenceManager::new();
        persistence.expect_is_entity().returning(|_| true);
        persistence.expect_is_new_object().returning(|_| false);
        persistence.expect_identifier_by_object().returning(|_| None);
        let objects = MockObjectRegistry::new();
        let context = SerializationContext::new(&persistence, &objects);

        let mut state = ObjectState::new("Acme\\Cart").with_field("featured", product(1));
        let err = state.prepare_for_storage(&[], &context).unwrap_err();
        assert!(matches!(err, SerializationError::MissingIdentifier { .. }));
    }

    #[test]
    fn plain_values_are_serialized_as_is() {
        let mut persistence = MockPersistenceManager::new();
        persistence.expect_is_entity().returning(|_| false);
        let mut objects = MockObjectRegistry::new();
        objects
            .expect_object_name_by_class_name()
            .returning(|class_name| class_name.to_string());
        objects.expect_is_singleton().returning(|_| false);
        let context = SerializationContext::new(&persistence, &objects);

        let mut state = ObjectState::new("Acme\\Cart")
            .with_field("count", Value::Int(1))
            .with_field("helper", Value::Object(ObjectRef::new("Acme\\Helper", 5)))
            .with_field("tags", Value::Collection(vec![Value::String("a".into())]));

        let fields = state.prepare_for_storage(&[], &context).unwrap();
        assert_eq!(fields, vec!["count", "helper", "tags"]);
        assert!(state.related_entities().is_empty());
    }
}

use crate::{
    context::DataPlugin,
    entity::EntityId,
    property::Property,
    property_map::PropertyMap,
};
use std::marker::PhantomData;

/// Stores all data associated to entities of kind `E` and their properties.
pub struct EntityData<E: EntityId> {
    /// How many entities exist.
    pub(crate) entity_count: usize,
    /// Map from type `T: Property` to `PropertyStore`, a wrapper for `Vec<Option<T>>`
    pub(crate) properties_map: PropertyMap,
    phantom: PhantomData<E>,
}

impl<E: EntityId> Default for EntityData<E> {
    fn default() -> Self {
        EntityData {
            entity_count: 0,
            properties_map: PropertyMap::default(),
            phantom: PhantomData,
        }
    }
}

impl<E: EntityId> DataPlugin for EntityData<E> {
    const new: &'static dyn Fn() -> Self = &EntityData::<E>::default;
}

impl<E: EntityId> EntityData<E> {
    /// Appends `count` entities and returns the index of the first one.
    pub fn add_entities(&mut self, count: usize) -> usize {
        let first = self.entity_count;
        self.entity_count += count;
        first
    }

    pub fn get_property<T: Property<Entity = E>>(&self, entity_id: E) -> Option<T> {
        self.properties_map
            .get_store::<T>()
            .and_then(|property_store| property_store.get(entity_id.index()))
    }

    pub fn get_property_mut<T: Property<Entity = E>>(&mut self, entity_id: E) -> &mut Option<T> {
        self.properties_map
            .get_store_mut::<T>()
            .get_mut(entity_id.index())
    }

    pub fn set_property<T: Property<Entity = E>>(&mut self, entity_id: E, value: T) {
        *self.get_property_mut(entity_id) = Some(value);
    }
}

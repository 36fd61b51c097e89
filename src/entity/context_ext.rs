use crate::{
    context::Context,
    entity::{EntityData, EntityId, InitializationList, Query},
    property::Property,
};
use log::trace;
use std::marker::PhantomData;

pub trait ContextEntityExt {
    /// Creates `count` new entities of kind `E` with no properties set and returns their ids.
    fn add_entities<E: EntityId>(&mut self, count: usize) -> EntityIterator<E>;

    fn get_entity_count<E: EntityId>(&self) -> usize;

    /// Iterates over every entity of kind `E` in index order.
    fn entity_iter<E: EntityId>(&self) -> EntityIterator<E>;

    /// Gets a copy of the value of the property for the given entity, or `None` if it was
    /// never set.
    fn get_property<T: Property>(&self, entity_id: T::Entity) -> Option<T>;

    fn set_property<T: Property>(&mut self, entity_id: T::Entity, value: T);

    /// Sets the property only if it has never been set. Returns whether the write happened.
    fn set_property_once<T: Property>(&mut self, entity_id: T::Entity, value: T) -> bool;

    /// Sets every property in the tuple `properties` on `entity_id`.
    fn set_properties<E: EntityId, L: InitializationList<E>>(&mut self, entity_id: E, properties: L);

    /// Returns every entity matching a query, for example
    /// `context.query_entities((EpiState::Infectious, Quarantined(false)))`.
    fn query_entities<E: EntityId, Q: Query<E>>(&self, query: Q) -> Vec<E>;

    /// Get the count of all entities matching a given set of criteria. Unlike
    /// [`ContextEntityExt::query_entities`], this does not allocate a list.
    fn query_entity_count<E: EntityId, Q: Query<E>>(&self, query: Q) -> usize;

    /// Determine whether an entity matches a given expression.
    fn match_entity<E: EntityId, Q: Query<E>>(&self, entity_id: E, query: Q) -> bool;
}

impl ContextEntityExt for Context {
    fn add_entities<E: EntityId>(&mut self, count: usize) -> EntityIterator<E> {
        let first = self
            .get_data_container_mut::<EntityData<E>>()
            .add_entities(count);
        EntityIterator::new(first, first + count)
    }

    fn get_entity_count<E: EntityId>(&self) -> usize {
        match self.get_data_container::<EntityData<E>>() {
            None => 0,
            Some(entity_data) => entity_data.entity_count,
        }
    }

    fn entity_iter<E: EntityId>(&self) -> EntityIterator<E> {
        EntityIterator::new(0, self.get_entity_count::<E>())
    }

    fn get_property<T: Property>(&self, entity_id: T::Entity) -> Option<T> {
        self.get_data_container::<EntityData<T::Entity>>()
            .and_then(|entity_data| entity_data.get_property::<T>(entity_id))
    }

    fn set_property<T: Property>(&mut self, entity_id: T::Entity, value: T) {
        self.get_data_container_mut::<EntityData<T::Entity>>()
            .set_property(entity_id, value);
    }

    fn set_property_once<T: Property>(&mut self, entity_id: T::Entity, value: T) -> bool {
        let property: &mut Option<T> = self
            .get_data_container_mut::<EntityData<T::Entity>>()
            .get_property_mut(entity_id);

        match property {
            Some(_) => {
                trace!("{} already set for {entity_id:?}", T::name());
                false
            }
            None => {
                *property = Some(value);
                true
            }
        }
    }

    fn set_properties<E: EntityId, L: InitializationList<E>>(&mut self, entity_id: E, properties: L) {
        let entity_data = self.get_data_container_mut::<EntityData<E>>();
        properties.set_properties(entity_data, entity_id);
    }

    fn query_entities<E: EntityId, Q: Query<E>>(&self, query: Q) -> Vec<E> {
        let Some(entity_data) = self.get_data_container::<EntityData<E>>() else {
            return Vec::new();
        };
        self.entity_iter::<E>()
            .filter(|entity_id| query.match_entity(entity_data, *entity_id))
            .collect()
    }

    fn query_entity_count<E: EntityId, Q: Query<E>>(&self, query: Q) -> usize {
        let Some(entity_data) = self.get_data_container::<EntityData<E>>() else {
            return 0;
        };
        self.entity_iter::<E>()
            .filter(|entity_id| query.match_entity(entity_data, *entity_id))
            .count()
    }

    fn match_entity<E: EntityId, Q: Query<E>>(&self, entity_id: E, query: Q) -> bool {
        self.get_data_container::<EntityData<E>>()
            .is_some_and(|entity_data| query.match_entity(entity_data, entity_id))
    }
}

/// Iterates over a range of entity ids. Note that this doesn't hold a reference to the
/// `Context`, so entities can be mutated while iterating.
pub struct EntityIterator<E: EntityId> {
    next: usize,
    end: usize,
    phantom: PhantomData<E>,
}

impl<E: EntityId> EntityIterator<E> {
    fn new(next: usize, end: usize) -> Self {
        EntityIterator {
            next,
            end,
            phantom: PhantomData,
        }
    }
}

impl<E: EntityId> Iterator for EntityIterator<E> {
    type Item = E;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next < self.end {
            let entity_id = E::from_index(self.next);
            self.next += 1;
            Some(entity_id)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.next;
        (remaining, Some(remaining))
    }
}

impl<E: EntityId> ExactSizeIterator for EntityIterator<E> {}

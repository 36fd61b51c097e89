/*!

Per-entity-kind property storage: one column per property type, keyed by `TypeId`.

*/

use crate::{property::Property, type_of, HashMap, TypeId};
use std::any::Any;

/// One property column. `values[i]` is the value for the entity with index `i`.
pub struct PropertyStore<T: Property> {
    values: Vec<Option<T>>,
}

impl<T: Property> Default for PropertyStore<T> {
    fn default() -> Self {
        PropertyStore { values: Vec::new() }
    }
}

impl<T: Property> PropertyStore<T> {
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<T> {
        self.values.get(index).copied().flatten()
    }

    /// Mutable access to the cell at `index`, growing the column with unset cells as needed.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> &mut Option<T> {
        if index >= self.values.len() {
            self.values.resize_with(index + 1, || None);
        }
        &mut self.values[index]
    }
}

/// Maps `T: Property` to its `PropertyStore<T>`. A column is created on first write.
#[derive(Default)]
pub struct PropertyMap {
    // Always `PropertyStore<T>` under `type_of::<T>()`.
    stores: HashMap<TypeId, Box<dyn Any>>,
}

impl PropertyMap {
    pub fn get_store<T: Property>(&self) -> Option<&PropertyStore<T>> {
        self.stores
            .get(&type_of::<T>())
            .and_then(|store| store.downcast_ref())
    }

    pub fn get_store_mut<T: Property>(&mut self) -> &mut PropertyStore<T> {
        self.stores
            .entry(type_of::<T>())
            .or_insert_with(|| Box::new(PropertyStore::<T>::default()))
            .downcast_mut()
            .unwrap() // Will never panic as the entry for `T` always holds a `PropertyStore<T>`
    }

    /// Number of property types with a column.
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

use crate::{type_of, HashMap, TypeId};
use std::any::Any;

/// A type that can construct an empty instance of itself, so that `Context` can create it on
/// first use. Every data container stored in a `Context` implements this.
pub trait DataPlugin: Any + 'static {
    /// A constant reference to a constructor
    #[allow(non_upper_case_globals)]
    const new: &'static dyn Fn() -> Self;
}

impl<T: 'static> DataPlugin for Vec<T> {
    const new: &'static dyn Fn() -> Self = &Vec::<T>::new;
}

/// Owns every piece of mutable state belonging to a single trial.
///
/// A `Context` is never shared between trials. Workers build their own, which is why it is
/// neither `Send` nor `Sync`.
pub struct Context {
    // This is actually a `HashMap<TypeId, Box<dyn DataPlugin>>` but must be declared this way to
    // avoid having to implement an `as_any()` method on everything.
    data_plugins: HashMap<TypeId, Box<dyn Any>>,
    current_step: usize,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    pub fn new() -> Self {
        Context {
            data_plugins: HashMap::default(),
            current_step: 0,
        }
    }

    /// Returns a mutable reference for the data container for `T`, creating it if it doesn't exist yet.
    pub fn get_data_container_mut<T: DataPlugin>(&mut self) -> &mut T {
        self.data_plugins
            .entry(type_of::<T>())
            .or_insert_with(|| Box::new(<T as DataPlugin>::new()))
            .downcast_mut::<T>()
            .unwrap() // Will never panic as data container has the matching type
    }

    /// Returns a reference to the data container for `T` if it exists.
    /// If you need a mutable reference or lazy instantiation, use `Context::get_data_container_mut()`.
    pub fn get_data_container<T: DataPlugin>(&self) -> Option<&T> {
        self.data_plugins
            .get(&type_of::<T>())
            .and_then(|data| data.downcast_ref::<T>())
    }

    /// The timestep currently being simulated.
    #[must_use]
    pub fn get_current_step(&self) -> usize {
        self.current_step
    }

    pub(crate) fn advance_step(&mut self) {
        self.current_step += 1;
    }
}

use crate::{
    entity::{EntityData, EntityId},
    property::Property,
};
use seq_macro::seq;

/// A trait that contains the initialization values for an entity. Do not use this directly,
/// but instead use the tuple syntax:
/// `context.set_properties(node, (Adopter(true), EpiState::Susceptible))`.
pub trait InitializationList<E: EntityId> {
    fn set_properties(self, entity_data: &mut EntityData<E>, entity_id: E);
}

impl<E: EntityId> InitializationList<E> for () {
    fn set_properties(self, _entity_data: &mut EntityData<E>, _entity_id: E) {}
}

// Implement the versions with 1..12 parameters.
macro_rules! impl_initialization_list {
    ($ct:expr) => {
        seq!(N in 0..$ct {
            impl<
                E: EntityId,
                #(
                    T~N : Property<Entity = E>,
                )*
            > InitializationList<E> for (
                #(
                    T~N,
                )*
            )
            {
                fn set_properties(self, entity_data: &mut EntityData<E>, entity_id: E) {
                    #(
                       entity_data.set_property(entity_id, self.N);
                    )*
                }
            }
        });
    }
}

seq!(Z in 1..12 {
    impl_initialization_list!(Z);
});

use crate::{
    entity::{EntityData, EntityId},
    property::Property,
};
use seq_macro::seq;

/// Encapsulates a query.
///
/// [`ContextEntityExt::query_entities`](crate::entity::ContextEntityExt::query_entities)
/// actually takes an instance of [`Query`], but because we implement `Query` for tuples of
/// property values, that's invisible to the caller:
/// `context.query_entity_count((EpiState::Infectious,))`.
pub trait Query<E: EntityId> {
    /// Checks that the given entity matches every property value in the query. An unset
    /// property never matches.
    fn match_entity(&self, entity_data: &EntityData<E>, entity_id: E) -> bool;
}

// The empty query matches everything.
impl<E: EntityId> Query<E> for () {
    fn match_entity(&self, _entity_data: &EntityData<E>, _entity_id: E) -> bool {
        true
    }
}

macro_rules! impl_query {
    ($ct:expr) => {
        seq!(N in 0..$ct {
            impl<
                E: EntityId,
                #(
                    T~N : Property<Entity = E>,
                )*
            > Query<E> for (
                #(
                    T~N,
                )*
            )
            {
                fn match_entity(&self, entity_data: &EntityData<E>, entity_id: E) -> bool {
                    #(
                        if entity_data.get_property::<T~N>(entity_id) != Some(self.N) {
                            return false;
                        }
                    )*
                    true
                }
            }
        });
    }
}

seq!(Z in 1..8 {
    impl_query!(Z);
});

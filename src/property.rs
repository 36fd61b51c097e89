use crate::entity::EntityId;
use std::{any::type_name, fmt::Debug};

/// A value attached to one kind of entity (a node or an edge). Each property type gets its own
/// column in the owning entity's `PropertyMap`; an unset cell reads as `None`.
pub trait Property: Copy + Debug + PartialEq + 'static {
    /// The kind of entity this property belongs to.
    type Entity: EntityId;

    #[must_use]
    #[inline]
    fn name() -> &'static str {
        type_name::<Self>()
    }
}

/// Implements [`Property`] for an existing type:
///
/// ```ignore
/// #[derive(Copy, Clone, Debug, PartialEq)]
/// pub struct Adopter(pub bool);
/// define_property!(Adopter, NodeId);
/// ```
#[macro_export]
macro_rules! define_property {
    ($property:ident, $entity:ty) => {
        impl $crate::property::Property for $property {
            type Entity = $entity;

            fn name() -> &'static str {
                stringify!($property)
            }
        }
    };
}
pub use define_property;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NodeId;

    #[derive(Copy, Clone, Debug, PartialEq)]
    struct Age(u8);
    define_property!(Age, NodeId);

    #[derive(Copy, Clone, Debug, PartialEq)]
    struct Height(u32);
    impl Property for Height {
        type Entity = NodeId;
    }

    #[test]
    fn property_names() {
        assert_eq!(Age::name(), "Age");
        assert!(Height::name().ends_with("Height"));
    }
}

//! Domain types and models

pub mod event;
pub mod key;
pub mod object;

pub use event::DeletedObject;
pub use key::{
    deletion_handling_key_func, meta_namespace_key_func, split_meta_namespace_key, ResourceKey,
};
pub use object::{ListMeta, ObjectMeta, Resource, ResourceList};

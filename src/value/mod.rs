use gc_arena::Mutation;

pub mod layout;
pub mod object;
pub mod storage;

#[cfg(test)]
mod object_tests;

pub use object::{HeapStorage, Object, ObjectHandle, ObjectRef, Vector};

pub type GCHandle<'gc> = &'gc Mutation<'gc>;

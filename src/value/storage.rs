use crate::{
    memory::Primitive,
    value::{
        layout::{FieldLayout, FieldLayoutManager, HasLayout, Scalar},
        object::ObjectRef,
    },
};
use gc_arena::{Collect, Collection};
use std::{marker::PhantomData, sync::Arc};

/// Byte storage for an object's instance fields.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldStorage<'gc> {
    layout: Arc<FieldLayoutManager>,
    storage: Vec<u8>,
    _contains_gc: PhantomData<&'gc ()>,
}

unsafe impl Collect for FieldStorage<'_> {
    #[inline]
    fn trace(&self, cc: &Collection) {
        for position in self.layout.reference_positions() {
            // SAFETY: reference fields only ever hold null or a live handle.
            unsafe { ObjectRef::read(&self.storage[position..]) }.trace(cc);
        }
    }
}

impl<'gc> FieldStorage<'gc> {
    pub fn new(layout: Arc<FieldLayoutManager>) -> Self {
        Self {
            storage: vec![0; layout.size()],
            layout,
            _contains_gc: PhantomData,
        }
    }

    pub fn layout(&self) -> &FieldLayoutManager {
        &self.layout
    }

    pub fn get(&self) -> &[u8] {
        &self.storage
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.storage.as_ptr()
    }

    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.storage.as_mut_ptr()
    }

    pub fn field_bytes(&self, field: &FieldLayout) -> &[u8] {
        &self.storage[field.as_range()]
    }

    pub fn field_bytes_mut(&mut self, field: &FieldLayout) -> &mut [u8] {
        &mut self.storage[field.as_range()]
    }

    pub fn read<T: Primitive>(&self, field: &FieldLayout) -> T {
        debug_assert_eq!(T::SIZE, field.kind.size(), "field is {:?}", field.kind);
        T::read_from(self.field_bytes(field))
    }

    pub fn write<T: Primitive>(&mut self, field: &FieldLayout, value: T) {
        debug_assert_eq!(T::SIZE, field.kind.size(), "field is {:?}", field.kind);
        value.write_to(self.field_bytes_mut(field));
    }

    pub fn read_ref(&self, field: &FieldLayout) -> ObjectRef<'gc> {
        assert_eq!(field.kind, Scalar::ObjectRef, "field does not hold a reference");
        // SAFETY: the slot was written by `write_ref` or is still zeroed.
        unsafe { ObjectRef::read(self.field_bytes(field)) }
    }

    pub fn write_ref(&mut self, field: &FieldLayout, value: ObjectRef<'gc>) {
        assert_eq!(field.kind, Scalar::ObjectRef, "field does not hold a reference");
        value.write(self.field_bytes_mut(field));
    }
}

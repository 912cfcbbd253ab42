use crate::{
    error::DmaError,
    memory::Primitive,
    types::TypeDescription,
    value::{
        layout::{ArrayLayoutManager, FieldLayout, HasLayout, Scalar},
        storage::FieldStorage,
        GCHandle,
    },
};
use gc_arena::{lock::RefLock, Collect, Collection, Gc};
use std::{
    fmt::{Debug, Formatter},
    hash::{Hash, Hasher},
    marker::PhantomData,
    mem::size_of,
};

type ObjectInner<'gc> = RefLock<HeapStorage<'gc>>;
pub type ObjectHandle<'gc> = Gc<'gc, ObjectInner<'gc>>;

/// A nullable reference into the managed heap.
///
/// In storage a reference is exactly the handle's pointer bits.
#[derive(Copy, Clone)]
#[repr(transparent)]
pub struct ObjectRef<'gc>(pub Option<ObjectHandle<'gc>>);

unsafe impl<'gc> Collect for ObjectRef<'gc> {
    fn trace(&self, cc: &Collection) {
        if let Some(h) = self.0 {
            h.trace(cc);
        }
    }
}

const _: () = assert!(ObjectRef::SIZE == size_of::<usize>());

impl PartialEq for ObjectRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self.0, other.0) {
            (Some(l), Some(r)) => Gc::ptr_eq(l, r),
            (None, None) => true,
            _ => false,
        }
    }
}

impl Eq for ObjectRef<'_> {}

impl Hash for ObjectRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_ptr().hash(state);
    }
}

impl Debug for ObjectRef<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            None => f.write_str("NULL"),
            Some(gc) => {
                let handle = gc.borrow();
                let desc = match &*handle {
                    HeapStorage::Obj(o) => o.description.name().to_string(),
                    HeapStorage::Vec(v) => format!("{}[{}]", v.layout.element.type_tag(), v.len()),
                };
                write!(f, "{} @ {:#?}", desc, Gc::as_ptr(gc))
            }
        }
    }
}

impl<'gc> ObjectRef<'gc> {
    pub const SIZE: usize = size_of::<ObjectRef>();
    pub const NULL: Self = ObjectRef(None);

    pub fn new(gc: GCHandle<'gc>, value: HeapStorage<'gc>) -> Self {
        Self(Some(Gc::new(gc, RefLock::new(value))))
    }

    /// Allocates a zeroed instance of `description`.
    pub fn new_object(gc: GCHandle<'gc>, description: &TypeDescription) -> Result<Self, DmaError> {
        Ok(Self::new(gc, HeapStorage::Obj(Object::new(description)?)))
    }

    pub fn new_vector(gc: GCHandle<'gc>, element: Scalar, length: usize) -> Self {
        Self::new(gc, HeapStorage::Vec(Vector::new(element, length)))
    }

    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    pub fn as_ptr(&self) -> *const u8 {
        match self.0 {
            None => std::ptr::null(),
            Some(h) => Gc::as_ptr(h) as *const u8,
        }
    }

    /// Reinterprets the first [`Self::SIZE`] bytes of `source` as a reference.
    ///
    /// # Safety
    /// The bytes must be zero or the pointer bits of a handle that is alive in
    /// the current arena. Nothing here can tell a forged value from a real one.
    pub unsafe fn read(source: &[u8]) -> Self {
        let ptr = usize::from_ne_bytes(
            source[..Self::SIZE]
                .try_into()
                .expect("reference slot is pointer-sized"),
        ) as *const ObjectInner<'gc>;

        if ptr.is_null() {
            ObjectRef(None)
        } else {
            ObjectRef(Some(Gc::from_ptr(ptr)))
        }
    }

    pub fn write(&self, dest: &mut [u8]) {
        let ptr_bytes = (self.as_ptr() as usize).to_ne_bytes();
        dest[..ptr_bytes.len()].copy_from_slice(&ptr_bytes);
    }

    /// The runtime type. Vectors declare no fields and report the root type.
    pub fn type_description(&self) -> Option<TypeDescription> {
        let handle = self.0?;
        let storage = handle.borrow();
        Some(match &*storage {
            HeapStorage::Obj(o) => o.description.clone(),
            HeapStorage::Vec(_) => TypeDescription::object(),
        })
    }

    pub fn as_object<T>(&self, op: impl FnOnce(&Object<'gc>) -> T) -> T {
        let ObjectRef(Some(o)) = self else {
            panic!("called ObjectRef::as_object on a null reference")
        };
        let heap = o.borrow();
        let HeapStorage::Obj(instance) = &*heap else {
            panic!("called ObjectRef::as_object on non-object heap reference")
        };

        op(instance)
    }

    pub fn as_object_mut<T>(&self, gc: GCHandle<'gc>, op: impl FnOnce(&mut Object<'gc>) -> T) -> T {
        let ObjectRef(Some(o)) = self else {
            panic!("called ObjectRef::as_object_mut on a null reference")
        };
        let mut heap = o.borrow_mut(gc);
        let HeapStorage::Obj(instance) = &mut *heap else {
            panic!("called ObjectRef::as_object_mut on non-object heap reference")
        };

        op(instance)
    }

    pub fn as_vector<T>(&self, op: impl FnOnce(&Vector<'gc>) -> T) -> T {
        let ObjectRef(Some(o)) = self else {
            panic!("called ObjectRef::as_vector on a null reference")
        };
        let heap = o.borrow();
        let HeapStorage::Vec(instance) = &*heap else {
            panic!("called ObjectRef::as_vector on non-vector heap reference")
        };

        op(instance)
    }

    pub fn as_vector_mut<T>(&self, gc: GCHandle<'gc>, op: impl FnOnce(&mut Vector<'gc>) -> T) -> T {
        let ObjectRef(Some(o)) = self else {
            panic!("called ObjectRef::as_vector_mut on a null reference")
        };
        let mut heap = o.borrow_mut(gc);
        let HeapStorage::Vec(instance) = &mut *heap else {
            panic!("called ObjectRef::as_vector_mut on non-vector heap reference")
        };

        op(instance)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum HeapStorage<'gc> {
    Vec(Vector<'gc>),
    Obj(Object<'gc>),
}

unsafe impl<'gc> Collect for HeapStorage<'gc> {
    fn trace(&self, cc: &Collection) {
        match self {
            Self::Vec(v) => v.trace(cc),
            Self::Obj(o) => o.trace(cc),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Collect)]
#[collect(no_drop)]
pub struct Object<'gc> {
    pub description: TypeDescription,
    pub instance_storage: FieldStorage<'gc>,
}

impl<'gc> Object<'gc> {
    pub fn new(description: &TypeDescription) -> Result<Self, DmaError> {
        Ok(Self {
            description: description.clone(),
            instance_storage: FieldStorage::new(description.instance_layout()?),
        })
    }

    pub fn size_bytes(&self) -> usize {
        self.instance_storage.layout().size()
    }

    /// Placement of the named instance field, looked up through the ancestors.
    pub fn field_layout(&self, name: &str) -> FieldLayout {
        let field = self
            .description
            .find_field(name)
            .filter(|f| !f.is_static())
            .unwrap_or_else(|| {
                panic!("instance field {} not found on {:?}", name, self.description)
            });
        *self
            .instance_storage
            .layout()
            .get(&field.key())
            .unwrap_or_else(|| panic!("field {:?} missing from instance layout", field))
    }

    pub fn get_field<T: Primitive>(&self, name: &str) -> T {
        let field = self.field_layout(name);
        self.instance_storage.read(&field)
    }

    pub fn set_field<T: Primitive>(&mut self, name: &str, value: T) {
        let field = self.field_layout(name);
        self.instance_storage.write(&field, value);
    }

    pub fn get_ref_field(&self, name: &str) -> ObjectRef<'gc> {
        let field = self.field_layout(name);
        self.instance_storage.read_ref(&field)
    }

    pub fn set_ref_field(&mut self, name: &str, value: ObjectRef<'gc>) {
        let field = self.field_layout(name);
        self.instance_storage.write_ref(&field, value);
    }
}

/// A one-dimensional array with elements stored inline.
#[derive(Clone, Debug, PartialEq)]
pub struct Vector<'gc> {
    pub layout: ArrayLayoutManager,
    storage: Vec<u8>,
    _contains_gc: PhantomData<&'gc ()>,
}

unsafe impl Collect for Vector<'_> {
    #[inline]
    fn trace(&self, cc: &Collection) {
        if self.layout.element.is_gc_ptr() {
            for i in 0..self.layout.length {
                // SAFETY: reference elements only ever hold null or a live handle.
                unsafe { ObjectRef::read(&self.storage[self.layout.element_range(i)]) }.trace(cc);
            }
        }
    }
}

impl<'gc> Vector<'gc> {
    pub fn new(element: Scalar, length: usize) -> Self {
        let layout = ArrayLayoutManager::new(element, length);
        Self {
            storage: vec![0; layout.size()],
            layout,
            _contains_gc: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.layout.length
    }

    pub fn is_empty(&self) -> bool {
        self.layout.length == 0
    }

    pub fn size_bytes(&self) -> usize {
        self.storage.len()
    }

    /// Offset of element 0 from [`Vector::as_ptr`].
    pub fn base_offset(&self) -> usize {
        self.layout.base_offset()
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

    pub fn get_element<T: Primitive>(&self, index: usize) -> T {
        debug_assert_eq!(T::SIZE, self.layout.element.size());
        T::read_from(&self.storage[self.layout.element_range(index)])
    }

    pub fn set_element<T: Primitive>(&mut self, index: usize, value: T) {
        debug_assert_eq!(T::SIZE, self.layout.element.size());
        let range = self.layout.element_range(index);
        value.write_to(&mut self.storage[range]);
    }

    pub fn get_ref(&self, index: usize) -> ObjectRef<'gc> {
        assert!(self.layout.element.is_gc_ptr(), "vector does not hold references");
        // SAFETY: reference elements only ever hold null or a live handle.
        unsafe { ObjectRef::read(&self.storage[self.layout.element_range(index)]) }
    }

    pub fn set_ref(&mut self, index: usize, value: ObjectRef<'gc>) {
        assert!(self.layout.element.is_gc_ptr(), "vector does not hold references");
        let range = self.layout.element_range(index);
        value.write(&mut self.storage[range]);
    }
}

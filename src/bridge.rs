//! Conversion between live heap references and numeric addresses.
//!
//! Both directions go through a scratch one-element reference vector: the
//! reference is stored as an element and its raw bits are read back through
//! the native capability, or raw bits are written into the slot and read back
//! as a reference. The slot lives in process memory, so only [`NativeMemory`]
//! can reach it. An address is only meaningful inside the
//! [`gc_arena::Arena::mutate`] call that produced it.
use crate::{
    error::DmaError,
    memory::{Dma, NativeMemory},
    utils::Address,
    value::{layout::Scalar, GCHandle, Object, ObjectRef, Vector},
};
use tracing::trace;

/// Width of the raw reference bits read from and written to a vector slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReferenceEncoding {
    /// 32-bit slots, for heaps whose references are 4 bytes.
    Compressed32,
    Uncompressed64,
}

impl ReferenceEncoding {
    /// The encoding matching this heap's reference size.
    pub const fn native() -> Self {
        if ObjectRef::SIZE == 4 {
            ReferenceEncoding::Compressed32
        } else {
            ReferenceEncoding::Uncompressed64
        }
    }

    pub const fn width(self) -> usize {
        match self {
            ReferenceEncoding::Compressed32 => 4,
            ReferenceEncoding::Uncompressed64 => 8,
        }
    }
}

impl Default for ReferenceEncoding {
    fn default() -> Self {
        Self::native()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BridgeConfig {
    pub encoding: ReferenceEncoding,
}

pub struct Bridge {
    dma: Dma<NativeMemory>,
    config: BridgeConfig,
}

impl Bridge {
    pub fn native() -> Result<Self, DmaError> {
        Self::new(Dma::native()?, BridgeConfig::default())
    }

    /// Fails unless the encoding is exactly as wide as a heap reference. A
    /// narrower one would lose address bits and forge references on the way back.
    pub fn new(dma: Dma<NativeMemory>, config: BridgeConfig) -> Result<Self, DmaError> {
        if config.encoding.width() != ObjectRef::SIZE {
            return Err(DmaError::Unsupported(
                "reference encoding does not match the heap reference size",
            ));
        }
        Ok(Self { dma, config })
    }

    pub fn config(&self) -> BridgeConfig {
        self.config
    }

    pub fn dma(&self) -> &Dma<NativeMemory> {
        &self.dma
    }

    fn element_slot(vector: &mut Vector<'_>) -> Address {
        Address::from_mut_ptr(vector.as_mut_ptr()) + vector.base_offset() as u64
    }

    unsafe fn read_slot(&self, slot: Address) -> Address {
        match self.config.encoding {
            ReferenceEncoding::Compressed32 => Address::from_i32_bits(self.dma.read_i32(slot)),
            ReferenceEncoding::Uncompressed64 => Address::new(self.dma.read_i64(slot) as u64),
        }
    }

    unsafe fn write_slot(&self, slot: Address, address: Address) {
        match self.config.encoding {
            ReferenceEncoding::Compressed32 => {
                self.dma.write_i32(slot, address.as_u64() as u32 as i32)
            }
            ReferenceEncoding::Uncompressed64 => self.dma.write_i64(slot, address.as_u64() as i64),
        }
    }

    /// The numeric heap address of `obj`. A null reference is [`Address::NULL`].
    pub fn address_of<'gc>(&self, gc: GCHandle<'gc>, obj: ObjectRef<'gc>) -> Address {
        let holder = ObjectRef::new_vector(gc, Scalar::ObjectRef, 1);
        let slot = holder.as_vector_mut(gc, |v| {
            v.set_ref(0, obj);
            Self::element_slot(v)
        });

        // SAFETY: `slot` is the first element of a vector alive for this whole call.
        let address = unsafe { self.read_slot(slot) };
        trace!(%address, encoding = ?self.config.encoding, "resolved object address");
        address
    }

    /// Reinterprets `address` as a heap reference.
    ///
    /// # Safety
    /// `address` must have come from [`Bridge::address_of`] on an object that
    /// is still alive, within the same mutation. Anything else yields a forged
    /// reference and undefined behavior on first use or at the next collection.
    pub unsafe fn object_at<'gc>(&self, gc: GCHandle<'gc>, address: Address) -> ObjectRef<'gc> {
        let holder = ObjectRef::new_vector(gc, Scalar::ObjectRef, 1);
        let slot = holder.as_vector_mut(gc, |v| Self::element_slot(v));

        self.write_slot(slot, address);
        let obj = holder.as_vector(|v| v.get_ref(0));
        holder.as_vector_mut(gc, |v| v.set_ref(0, ObjectRef::NULL));

        trace!(%address, encoding = ?self.config.encoding, "materialized object reference");
        obj
    }

    /// [`Bridge::object_at`] converted to a typed view without any check.
    ///
    /// # Safety
    /// As for [`Bridge::object_at`], and the object must have the shape `V`
    /// expects.
    pub unsafe fn object_at_as<'gc, V: ManagedView<'gc>>(
        &self,
        gc: GCHandle<'gc>,
        address: Address,
    ) -> V {
        V::from_ref_unchecked(self.object_at(gc, address))
    }
}

/// A typed window onto a heap reference.
pub trait ManagedView<'gc>: Sized {
    /// # Safety
    /// `obj` must be null or hold the kind of storage the view assumes.
    unsafe fn from_ref_unchecked(obj: ObjectRef<'gc>) -> Self;

    fn as_object_ref(&self) -> ObjectRef<'gc>;
}

impl<'gc> ManagedView<'gc> for ObjectRef<'gc> {
    unsafe fn from_ref_unchecked(obj: ObjectRef<'gc>) -> Self {
        obj
    }

    fn as_object_ref(&self) -> ObjectRef<'gc> {
        *self
    }
}

/// A reference known to point at an object instance.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InstanceRef<'gc>(ObjectRef<'gc>);

impl<'gc> ManagedView<'gc> for InstanceRef<'gc> {
    unsafe fn from_ref_unchecked(obj: ObjectRef<'gc>) -> Self {
        InstanceRef(obj)
    }

    fn as_object_ref(&self) -> ObjectRef<'gc> {
        self.0
    }
}

impl<'gc> InstanceRef<'gc> {
    pub fn with<T>(&self, op: impl FnOnce(&Object<'gc>) -> T) -> T {
        self.0.as_object(op)
    }

    pub fn with_mut<T>(&self, gc: GCHandle<'gc>, op: impl FnOnce(&mut Object<'gc>) -> T) -> T {
        self.0.as_object_mut(gc, op)
    }
}

/// A reference known to point at a vector.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ArrayRef<'gc>(ObjectRef<'gc>);

impl<'gc> ManagedView<'gc> for ArrayRef<'gc> {
    unsafe fn from_ref_unchecked(obj: ObjectRef<'gc>) -> Self {
        ArrayRef(obj)
    }

    fn as_object_ref(&self) -> ObjectRef<'gc> {
        self.0
    }
}

impl<'gc> ArrayRef<'gc> {
    pub fn len(&self) -> usize {
        self.0.as_vector(|v| v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn with<T>(&self, op: impl FnOnce(&Vector<'gc>) -> T) -> T {
        self.0.as_vector(op)
    }

    pub fn with_mut<T>(&self, gc: GCHandle<'gc>, op: impl FnOnce(&mut Vector<'gc>) -> T) -> T {
        self.0.as_vector_mut(gc, op)
    }
}

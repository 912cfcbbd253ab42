use super::{NativeMemory, Primitive, RawMemory};
use crate::{error::DmaError, utils::Address};
use std::{cmp::Ordering, sync::Arc};
use tracing::trace;

/// C-like direct memory access over a [`RawMemory`] capability.
///
/// No operation checks bounds, ownership or alignment. The address-taking
/// operations are `unsafe` and their only contract is the one documented on
/// each of them.
pub struct Dma<M: RawMemory = NativeMemory> {
    memory: Arc<M>,
}

impl<M: RawMemory> Clone for Dma<M> {
    fn clone(&self) -> Self {
        Self {
            memory: self.memory.clone(),
        }
    }
}

impl Dma<NativeMemory> {
    /// Direct access to process memory through the shared native capability.
    pub fn native() -> Result<Self, DmaError> {
        NativeMemory::acquire().map(Self::new)
    }
}

impl<M: RawMemory> Dma<M> {
    pub fn new(memory: Arc<M>) -> Self {
        Self { memory }
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    /// Allocates `size` bytes of unmanaged memory and returns the address of the first byte.
    ///
    /// A zero-byte request returns [`Address::NULL`]. The contents are uninitialised.
    pub fn allocate(&self, size: u64) -> Result<Address, DmaError> {
        if size == 0 {
            return Ok(Address::NULL);
        }
        let bytes = usize::try_from(size)
            .ok()
            .filter(|&s| s <= isize::MAX as usize)
            .ok_or(DmaError::InvalidSize(size))?;

        let address = self.memory.allocate(bytes)?;
        trace!(%address, size, "allocated unmanaged region");
        Ok(address)
    }

    /// Returns a region to the allocator. Releasing [`Address::NULL`] does nothing.
    ///
    /// # Safety
    /// `address` must be the base of a live region from [`Dma::allocate`] on the
    /// same capability. Double release and use after release are undefined.
    pub unsafe fn release(&self, address: Address) {
        if address.is_null() {
            return;
        }
        trace!(%address, "releasing unmanaged region");
        self.memory.release(address);
    }

    /// Copies `n` bytes from `src` to `dest`.
    ///
    /// Callers must not rely on overlapping ranges being handled, even though
    /// [`NativeMemory`] happens to.
    ///
    /// # Safety
    /// Both ranges must be valid for `n` bytes.
    pub unsafe fn copy(&self, dest: Address, src: Address, n: usize) {
        if n == 0 {
            return;
        }
        self.memory.copy(dest, src, n);
    }

    /// Writes `value` into each of the `n` bytes starting at `dest`.
    ///
    /// # Safety
    /// `[dest, dest + n)` must be valid for writes.
    pub unsafe fn fill(&self, dest: Address, value: u8, n: usize) {
        if n == 0 {
            return;
        }
        self.memory.fill(dest, value, n);
    }

    /// Compares the first `n` bytes at `a` and `b`.
    ///
    /// Scans upward from offset 0 and stops at the first byte that differs;
    /// that byte alone decides the result. Bytes are ordered as signed 8-bit
    /// values, so `0x80` sorts below `0x7F`.
    ///
    /// # Safety
    /// Both ranges must be valid for `n` bytes of reads.
    pub unsafe fn compare(&self, a: Address, b: Address, n: usize) -> Ordering {
        for i in 0..n as u64 {
            let left = self.peek(a + i) as i8;
            let right = self.peek(b + i) as i8;
            match left.cmp(&right) {
                Ordering::Equal => {}
                decided => return decided,
            }
        }
        Ordering::Equal
    }

    /// [`Dma::compare`] as `-1`, `0` or `1`.
    ///
    /// # Safety
    /// See [`Dma::compare`].
    pub unsafe fn compare_sign(&self, a: Address, b: Address, n: usize) -> i32 {
        self.compare(a, b, n) as i32
    }

    /// # Safety
    /// `address` must be valid for a one-byte read.
    pub unsafe fn peek(&self, address: Address) -> u8 {
        self.memory.get_u8(address)
    }

    /// # Safety
    /// `address` must be valid for a one-byte write.
    pub unsafe fn poke(&self, address: Address, value: u8) {
        self.memory.put_u8(address, value);
    }

    /// Snapshots `size` bytes starting at `address`, read one byte at a time in
    /// ascending address order.
    ///
    /// # Safety
    /// `[address, address + size)` must be valid for reads.
    pub unsafe fn read_bytes(&self, address: Address, size: usize) -> Vec<u8> {
        let mut output = Vec::with_capacity(size);
        for i in 0..size as u64 {
            output.push(self.peek(address + i));
        }
        output
    }

    /// Reads `T::SIZE` bytes at `address` in native byte order. No alignment is required.
    ///
    /// # Safety
    /// `[address, address + T::SIZE)` must be valid for reads. Whether an
    /// unaligned address works is up to the platform.
    pub unsafe fn read<T: Primitive>(&self, address: Address) -> T {
        let mut bytes = T::Bytes::default();
        self.memory.read_raw(address, bytes.as_mut());
        T::from_ne_bytes(bytes)
    }

    /// Writes `value` as `T::SIZE` bytes at `address` in native byte order.
    ///
    /// # Safety
    /// `[address, address + T::SIZE)` must be valid for writes.
    pub unsafe fn write<T: Primitive>(&self, address: Address, value: T) {
        self.memory.write_raw(address, value.to_ne_bytes().as_ref());
    }
}

macro_rules! typed_accessors {
    ($($read:ident, $write:ident => $t:ty;)*) => {
        impl<M: RawMemory> Dma<M> {
            $(
                #[doc = concat!("Reads a `", stringify!($t), "` at `address`.")]
                ///
                /// # Safety
                /// See [`Dma::read`].
                #[inline]
                pub unsafe fn $read(&self, address: Address) -> $t {
                    self.read::<$t>(address)
                }

                #[doc = concat!("Writes a `", stringify!($t), "` at `address`.")]
                ///
                /// # Safety
                /// See [`Dma::write`].
                #[inline]
                pub unsafe fn $write(&self, address: Address, value: $t) {
                    self.write::<$t>(address, value)
                }
            )*
        }
    };
}

typed_accessors! {
    read_i8, write_i8 => i8;
    read_i16, write_i16 => i16;
    read_char, write_char => u16;
    read_i32, write_i32 => i32;
    read_i64, write_i64 => i64;
    read_f32, write_f32 => f32;
    read_f64, write_f64 => f64;
}

//! Raw memory access by numeric address.
//!
//! Everything here goes through a [`RawMemory`] capability. The process-wide
//! native capability is [`NativeMemory`]; [`SandboxMemory`] stands in for it
//! where real addresses are not wanted.
use crate::{error::DmaError, utils::Address};

mod access;
mod native;
mod sandbox;
mod scalar;

pub use access::Dma;
pub use native::NativeMemory;
pub use sandbox::SandboxMemory;
pub use scalar::Primitive;

/// The unsafe-operations capability.
///
/// None of the address-taking methods validate their arguments. Lengths are
/// never zero when called through [`Dma`].
pub trait RawMemory: Send + Sync {
    /// Requests `size` bytes. The capability does not remember the size.
    fn allocate(&self, size: usize) -> Result<Address, DmaError>;

    /// # Safety
    /// `address` must have come from [`RawMemory::allocate`] on this capability
    /// and must not have been released already.
    unsafe fn release(&self, address: Address);

    /// # Safety
    /// Both `[src, src + n)` and `[dest, dest + n)` must be valid for the access.
    unsafe fn copy(&self, dest: Address, src: Address, n: usize);

    /// # Safety
    /// `[dest, dest + n)` must be valid for writes.
    unsafe fn fill(&self, dest: Address, value: u8, n: usize);

    /// # Safety
    /// `address` must be valid for a one-byte read.
    unsafe fn get_u8(&self, address: Address) -> u8;

    /// # Safety
    /// `address` must be valid for a one-byte write.
    unsafe fn put_u8(&self, address: Address, value: u8);

    /// Reads exactly `dest.len()` bytes starting at `address`, with no alignment requirement.
    ///
    /// # Safety
    /// `[address, address + dest.len())` must be valid for reads.
    unsafe fn read_raw(&self, address: Address, dest: &mut [u8]);

    /// Writes exactly `src.len()` bytes starting at `address`, with no alignment requirement.
    ///
    /// # Safety
    /// `[address, address + src.len())` must be valid for writes.
    unsafe fn write_raw(&self, address: Address, src: &[u8]);
}

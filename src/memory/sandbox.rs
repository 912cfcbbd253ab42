use super::RawMemory;
use crate::{error::DmaError, utils::Address};
use parking_lot::Mutex;
use std::collections::BTreeMap;

const SANDBOX_BASE: u64 = 0x1000_0000;
const REGION_ALIGN: u64 = 16;
// unmapped gap after each region, so running off the end is caught
const GUARD_BYTES: u64 = 16;

fn align_up(value: u64, align: u64) -> u64 {
    value.div_ceil(align) * align
}

struct SandboxState {
    regions: BTreeMap<u64, Box<[u8]>>,
    next_base: u64,
    in_use: usize,
}

/// A [`RawMemory`] double whose addresses are synthetic.
///
/// Regions are owned buffers keyed by base address. Touching a byte outside a
/// live region panics instead of corrupting the test process.
pub struct SandboxMemory {
    state: Mutex<SandboxState>,
    capacity: usize,
}

impl Default for SandboxMemory {
    fn default() -> Self {
        Self::with_capacity(usize::MAX)
    }
}

impl SandboxMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sandbox that refuses to hold more than `capacity` live bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(SandboxState {
                regions: BTreeMap::new(),
                next_base: SANDBOX_BASE,
                in_use: 0,
            }),
            capacity,
        }
    }

    pub fn live_regions(&self) -> usize {
        self.state.lock().regions.len()
    }

    pub fn bytes_in_use(&self) -> usize {
        self.state.lock().in_use
    }

    fn with_span<T>(&self, address: Address, len: usize, op: impl FnOnce(&mut [u8]) -> T) -> T {
        let mut state = self.state.lock();
        let Some((&base, region)) = state.regions.range_mut(..=address.as_u64()).next_back() else {
            panic!("sandbox access to unmapped address {}", address)
        };

        let start = (address.as_u64() - base) as usize;
        match start.checked_add(len) {
            Some(end) if end <= region.len() => op(&mut region[start..end]),
            _ => panic!(
                "sandbox access of {} bytes at {} overruns region {:#x} ({} bytes)",
                len,
                address,
                base,
                region.len()
            ),
        }
    }
}

impl RawMemory for SandboxMemory {
    fn allocate(&self, size: usize) -> Result<Address, DmaError> {
        let mut state = self.state.lock();
        let fits = state
            .in_use
            .checked_add(size)
            .is_some_and(|total| total <= self.capacity);
        if !fits {
            return Err(DmaError::OutOfMemory { size: size as u64 });
        }

        let base = state.next_base;
        let span = align_up(size.max(1) as u64, REGION_ALIGN);
        state.next_base = base + span + GUARD_BYTES;
        state.regions.insert(base, vec![0; size].into_boxed_slice());
        state.in_use += size;
        Ok(Address(base))
    }

    unsafe fn release(&self, address: Address) {
        let mut state = self.state.lock();
        let Some(region) = state.regions.remove(&address.as_u64()) else {
            panic!("sandbox release of {} which is not a live region base", address)
        };
        state.in_use -= region.len();
    }

    unsafe fn copy(&self, dest: Address, src: Address, n: usize) {
        let staged = self.with_span(src, n, |bytes| bytes.to_vec());
        self.with_span(dest, n, |bytes| bytes.copy_from_slice(&staged));
    }

    unsafe fn fill(&self, dest: Address, value: u8, n: usize) {
        self.with_span(dest, n, |bytes| bytes.fill(value));
    }

    unsafe fn get_u8(&self, address: Address) -> u8 {
        self.with_span(address, 1, |bytes| bytes[0])
    }

    unsafe fn put_u8(&self, address: Address, value: u8) {
        self.with_span(address, 1, |bytes| bytes[0] = value);
    }

    unsafe fn read_raw(&self, address: Address, dest: &mut [u8]) {
        self.with_span(address, dest.len(), |bytes| dest.copy_from_slice(bytes));
    }

    unsafe fn write_raw(&self, address: Address, src: &[u8]) {
        self.with_span(address, src.len(), |bytes| bytes.copy_from_slice(src));
    }
}

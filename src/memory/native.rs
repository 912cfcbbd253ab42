use super::RawMemory;
use crate::{error::DmaError, utils::Address};
use libloading::{Library, Symbol};
use std::{
    ffi::c_void,
    fmt::{self, Debug, Formatter},
    ptr,
    sync::{Arc, OnceLock},
};
use tracing::debug;

type MallocFn = unsafe extern "C" fn(usize) -> *mut c_void;
type FreeFn = unsafe extern "C" fn(*mut c_void);

static NATIVE: OnceLock<Result<Arc<NativeMemory>, DmaError>> = OnceLock::new();

/// The process allocator plus plain loads and stores.
///
/// Allocation goes through the C runtime's `malloc`/`free`, so a region is
/// released with nothing but its base address. `copy` is a memmove and
/// tolerates overlap, but that is a property of this capability only.
pub struct NativeMemory {
    malloc: MallocFn,
    free: FreeFn,
    // never unloaded; the resolved symbols point into it
    _runtime: Library,
}

impl NativeMemory {
    /// Returns the process-wide capability, resolving it on first use.
    pub fn acquire() -> Result<Arc<Self>, DmaError> {
        NATIVE
            .get_or_init(|| Self::load().map(Arc::new))
            .clone()
    }

    fn load() -> Result<Self, DmaError> {
        let runtime = open_c_runtime()?;

        // SAFETY: the signatures are the C standard library's.
        let (malloc, free) = unsafe {
            let malloc: Symbol<MallocFn> = runtime.get(b"malloc\0").map_err(bootstrap_error)?;
            let free: Symbol<FreeFn> = runtime.get(b"free\0").map_err(bootstrap_error)?;
            (*malloc, *free)
        };
        debug!("resolved C runtime allocator");

        Ok(Self {
            malloc,
            free,
            _runtime: runtime,
        })
    }
}

#[cfg(unix)]
fn open_c_runtime() -> Result<Library, DmaError> {
    Ok(libloading::os::unix::Library::this().into())
}

#[cfg(windows)]
fn open_c_runtime() -> Result<Library, DmaError> {
    // SAFETY: loading the universal CRT runs no user initialisers.
    unsafe { Library::new("ucrtbase.dll") }.map_err(bootstrap_error)
}

#[cfg(not(any(unix, windows)))]
fn open_c_runtime() -> Result<Library, DmaError> {
    Err(DmaError::Unsupported("no C runtime to load an allocator from"))
}

fn bootstrap_error(e: libloading::Error) -> DmaError {
    DmaError::Bootstrap(e.to_string())
}

impl Debug for NativeMemory {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeMemory")
            .field("malloc", &(self.malloc as *const ()))
            .field("free", &(self.free as *const ()))
            .finish()
    }
}

impl RawMemory for NativeMemory {
    fn allocate(&self, size: usize) -> Result<Address, DmaError> {
        // SAFETY: malloc has no preconditions.
        let ptr = unsafe { (self.malloc)(size) };
        if ptr.is_null() {
            return Err(DmaError::OutOfMemory { size: size as u64 });
        }
        Ok(Address::from_mut_ptr(ptr))
    }

    unsafe fn release(&self, address: Address) {
        (self.free)(address.as_mut_ptr());
    }

    unsafe fn copy(&self, dest: Address, src: Address, n: usize) {
        ptr::copy(src.as_ptr::<u8>(), dest.as_mut_ptr::<u8>(), n);
    }

    unsafe fn fill(&self, dest: Address, value: u8, n: usize) {
        ptr::write_bytes(dest.as_mut_ptr::<u8>(), value, n);
    }

    unsafe fn get_u8(&self, address: Address) -> u8 {
        ptr::read(address.as_ptr::<u8>())
    }

    unsafe fn put_u8(&self, address: Address, value: u8) {
        ptr::write(address.as_mut_ptr::<u8>(), value);
    }

    unsafe fn read_raw(&self, address: Address, dest: &mut [u8]) {
        ptr::copy_nonoverlapping(address.as_ptr::<u8>(), dest.as_mut_ptr(), dest.len());
    }

    unsafe fn write_raw(&self, address: Address, src: &[u8]) {
        ptr::copy_nonoverlapping(src.as_ptr(), address.as_mut_ptr::<u8>(), src.len());
    }
}

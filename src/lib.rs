//! Direct memory access by numeric address.
//!
//! [`memory::Dma`] allocates, frees, copies, fills, compares and type-puns raw
//! memory through a [`memory::RawMemory`] capability. With the `managed`
//! feature the crate also hosts a small garbage-collected object heap, and can
//! measure the shallow footprint of its objects ([`introspect`]) or convert
//! between live references and their addresses ([`bridge`]).
//!
//! Nothing here checks bounds, lifetimes or types.
pub mod error;
pub mod memory;
pub mod utils;

#[cfg(feature = "managed")]
pub mod bridge;
#[cfg(feature = "managed")]
pub mod introspect;
#[cfg(feature = "managed")]
pub mod types;
#[cfg(feature = "managed")]
pub mod value;


pub use error::DmaError;
pub use memory::{Dma, NativeMemory, RawMemory, SandboxMemory};
pub use utils::Address;

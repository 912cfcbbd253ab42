use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DmaError {
    #[error("Out of memory: could not allocate {size} bytes")]
    OutOfMemory { size: u64 },

    #[error("Invalid allocation size: {0}")]
    InvalidSize(u64),

    #[error("Failed to acquire native memory capability: {0}")]
    Bootstrap(String),

    #[error("Unsupported on this target: {0}")]
    Unsupported(&'static str),

    #[error("Static field {type_name}::{field} has no instance offset")]
    StaticField { type_name: String, field: String },

    #[error("Invalid layout for {type_name}: {reason}")]
    Layout { type_name: String, reason: String },

    #[error("Null reference")]
    NullReference,
}

//! Shallow footprint of managed objects.
//!
//! The footprint is derived from field offsets alone: the furthest declared
//! instance field, rounded up past the next 8-byte boundary. It does not look
//! at the heap's actual storage size.
use crate::{
    error::DmaError,
    types::{FieldDescription, TypeDescription},
    value::ObjectRef,
};
use enum_dispatch::enum_dispatch;
use std::collections::HashSet;
use tracing::trace;

/// Where field declarations and offsets come from.
#[enum_dispatch]
pub trait LayoutProvider {
    /// Fields declared directly on `td`, static ones included.
    fn declared_fields(&self, td: &TypeDescription) -> Result<Vec<FieldDescription>, DmaError>;

    /// Offset of an instance field from the start of the object's field storage.
    fn field_offset(&self, field: &FieldDescription) -> Result<u64, DmaError>;
}

/// Answers from the layouts computed for the managed heap.
#[derive(Clone, Copy, Debug, Default)]
pub struct ManagedLayout;

impl LayoutProvider for ManagedLayout {
    fn declared_fields(&self, td: &TypeDescription) -> Result<Vec<FieldDescription>, DmaError> {
        Ok(td.fields().collect())
    }

    fn field_offset(&self, field: &FieldDescription) -> Result<u64, DmaError> {
        if field.is_static() {
            return Err(DmaError::StaticField {
                type_name: field.parent.name().to_string(),
                field: field.name().to_string(),
            });
        }

        let layout = field.parent.instance_layout()?;
        layout
            .get(&field.key())
            .map(|f| f.position as u64)
            .ok_or_else(|| DmaError::Layout {
                type_name: field.parent.name().to_string(),
                reason: format!("no instance slot for field {}", field.name()),
            })
    }
}

/// A runtime that exposes no field layout.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoLayout;

impl LayoutProvider for NoLayout {
    fn declared_fields(&self, _td: &TypeDescription) -> Result<Vec<FieldDescription>, DmaError> {
        Err(DmaError::Unsupported("field declarations are not available"))
    }

    fn field_offset(&self, _field: &FieldDescription) -> Result<u64, DmaError> {
        Err(DmaError::Unsupported("field offsets are not available"))
    }
}

#[enum_dispatch(LayoutProvider)]
#[derive(Clone, Copy, Debug)]
pub enum Introspector {
    ManagedLayout,
    NoLayout,
}

impl Default for Introspector {
    fn default() -> Self {
        ManagedLayout.into()
    }
}

/// `((max_offset / 8) + 1) * 8`. An offset already on a boundary still gains
/// a full word.
pub const fn padded_size(max_offset: u64) -> u64 {
    ((max_offset / 8) + 1) * 8
}

/// Shallow size of `obj`, see [`shallow_size_of_type`].
pub fn shallow_size(provider: &impl LayoutProvider, obj: ObjectRef<'_>) -> Result<u64, DmaError> {
    let td = obj.type_description().ok_or(DmaError::NullReference)?;
    shallow_size_of_type(provider, &td)
}

/// Shallow size of an instance of `td`.
///
/// Instance fields are gathered from `td` and every ancestor below the
/// universal root, deduplicated, and only the largest offset counts. A type
/// with no parent of its own still counts its fields.
pub fn shallow_size_of_type(
    provider: &impl LayoutProvider,
    td: &TypeDescription,
) -> Result<u64, DmaError> {
    let root = TypeDescription::object();
    let mut fields = HashSet::new();
    for level in td.ancestors().take_while(|t| *t != root) {
        for field in provider.declared_fields(&level)? {
            if !field.is_static() {
                fields.insert(field);
            }
        }
    }

    let mut max_offset = 0;
    for field in &fields {
        max_offset = max_offset.max(provider.field_offset(field)?);
    }

    let size = padded_size(max_offset);
    trace!(
        type_name = td.name(),
        fields = fields.len(),
        max_offset,
        size,
        "computed shallow size"
    );
    Ok(size)
}

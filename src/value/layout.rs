use crate::{
    error::DmaError,
    types::{FieldKey, TypeDescription},
};
use std::{collections::HashMap, mem::size_of, ops::Range};
use tracing::trace;

pub trait HasLayout {
    fn size(&self) -> usize;
    fn alignment(&self) -> usize;
}

/// Storage kind of a single field or vector element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scalar {
    ObjectRef,
    Int8,
    UInt8,
    Int16,
    /// 16-bit character code unit.
    UInt16,
    Int32,
    Int64,
    NativeInt,
    Float32,
    Float64,
}

impl HasLayout for Scalar {
    fn size(&self) -> usize {
        match self {
            Scalar::Int8 | Scalar::UInt8 => 1,
            Scalar::Int16 | Scalar::UInt16 => 2,
            Scalar::Int32 | Scalar::Float32 => 4,
            Scalar::Int64 | Scalar::Float64 => 8,
            Scalar::ObjectRef | Scalar::NativeInt => size_of::<usize>(),
        }
    }

    fn alignment(&self) -> usize {
        self.size()
    }
}

impl Scalar {
    pub fn is_gc_ptr(&self) -> bool {
        matches!(self, Scalar::ObjectRef)
    }

    pub fn type_tag(&self) -> &'static str {
        match self {
            Scalar::ObjectRef => "obj",
            Scalar::Int8 => "i8",
            Scalar::UInt8 => "u8",
            Scalar::Int16 => "i16",
            Scalar::UInt16 => "char",
            Scalar::Int32 => "i32",
            Scalar::Int64 => "i64",
            Scalar::NativeInt => "ptr",
            Scalar::Float32 => "f32",
            Scalar::Float64 => "f64",
        }
    }
}

/// How a type places its own fields after those of its parent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Layout {
    /// Reordered by descending alignment to minimise padding.
    #[default]
    Automatic,
    /// Declaration order; a packing of 0 means 8.
    Sequential { packing: usize },
    /// Every field carries its own offset, relative to the end of the parent.
    Explicit { size: Option<usize> },
}

pub fn align_up(value: usize, align: usize) -> usize {
    let misalignment = value % align;
    if misalignment == 0 {
        value
    } else {
        value + align - misalignment
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldLayout {
    pub position: usize,
    pub kind: Scalar,
}

impl FieldLayout {
    pub fn as_range(&self) -> Range<usize> {
        self.position..self.position + self.kind.size()
    }
}

/// Instance field placement for one type, inherited fields included.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldLayoutManager {
    pub fields: HashMap<FieldKey, FieldLayout>,
    pub total_size: usize,
    pub alignment: usize,
}

impl HasLayout for FieldLayoutManager {
    fn size(&self) -> usize {
        self.total_size
    }

    fn alignment(&self) -> usize {
        self.alignment
    }
}

impl FieldLayoutManager {
    pub fn empty() -> Self {
        Self {
            fields: HashMap::new(),
            total_size: 0,
            alignment: 1,
        }
    }

    /// Lays out the instance fields of `td`, starting after its parent's.
    pub fn instance_fields(td: &TypeDescription) -> Result<Self, DmaError> {
        let base = match td.parent() {
            Some(parent) => (*parent.instance_layout()?).clone(),
            None => Self::empty(),
        };

        let own = td
            .definition()
            .fields
            .iter()
            .enumerate()
            .filter(|(_, f)| !f.static_member)
            .map(|(index, f)| (td.field_key(index), f.kind, f.offset));

        let layout = Self::create(td, own, td.definition().layout, base)?;
        trace!(
            type_name = td.name(),
            size = layout.total_size,
            fields = layout.fields.len(),
            "computed instance layout"
        );
        Ok(layout)
    }

    fn create(
        td: &TypeDescription,
        fields: impl IntoIterator<Item = (FieldKey, Scalar, Option<usize>)>,
        layout: Layout,
        base: Self,
    ) -> Result<Self, DmaError> {
        let Self {
            fields: mut mapping,
            total_size: base_size,
            alignment: base_alignment,
        } = base;
        let mut max_alignment = base_alignment.max(1);
        let mut fields: Vec<_> = fields.into_iter().collect();

        let total_size = match layout {
            Layout::Automatic => {
                fields.sort_by_key(|(_, kind, _)| std::cmp::Reverse(kind.alignment()));

                let mut offset = base_size;
                for (key, kind, _) in fields {
                    let field_align = kind.alignment();
                    max_alignment = max_alignment.max(field_align);
                    let position = align_up(offset, field_align);
                    mapping.insert(key, FieldLayout { position, kind });
                    offset = position + kind.size();
                }

                align_up(offset, max_alignment)
            }
            Layout::Sequential { packing } => {
                let packing = if packing == 0 { 8 } else { packing };

                let mut offset = base_size;
                for (key, kind, _) in fields {
                    let field_align = kind.alignment().min(packing);
                    max_alignment = max_alignment.max(field_align);
                    let position = align_up(offset, field_align);
                    mapping.insert(key, FieldLayout { position, kind });
                    offset = position + kind.size();
                }

                align_up(offset, max_alignment)
            }
            Layout::Explicit { size } => {
                let mut end = base_size;
                for (key, kind, explicit) in fields {
                    let Some(o) = explicit else {
                        return Err(DmaError::Layout {
                            type_name: td.name().to_string(),
                            reason: format!(
                                "explicit layout requires an offset for field #{}",
                                key.index
                            ),
                        });
                    };
                    max_alignment = max_alignment.max(kind.alignment());
                    let position = base_size + o;
                    mapping.insert(key, FieldLayout { position, kind });
                    end = end.max(position + kind.size());
                }

                match size {
                    Some(declared) => (base_size + declared).max(end),
                    None => end,
                }
            }
        };

        Ok(Self {
            fields: mapping,
            total_size,
            alignment: max_alignment,
        })
    }

    pub fn get(&self, key: &FieldKey) -> Option<&FieldLayout> {
        self.fields.get(key)
    }

    /// Positions of every reference-typed field.
    pub fn reference_positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.fields
            .values()
            .filter(|f| f.kind.is_gc_ptr())
            .map(|f| f.position)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArrayLayoutManager {
    pub element: Scalar,
    pub length: usize,
}

impl HasLayout for ArrayLayoutManager {
    fn size(&self) -> usize {
        self.element.size() * self.length
    }

    fn alignment(&self) -> usize {
        self.element.alignment()
    }
}

impl ArrayLayoutManager {
    pub fn new(element: Scalar, length: usize) -> Self {
        Self { element, length }
    }

    /// Offset of element 0 from the start of vector storage.
    pub fn base_offset(&self) -> usize {
        0
    }

    pub fn element_range(&self, index: usize) -> Range<usize> {
        let start = self.base_offset() + index * self.element.size();
        start..start + self.element.size()
    }
}

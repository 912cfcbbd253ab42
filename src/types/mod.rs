use crate::{
    error::DmaError,
    value::layout::{FieldLayoutManager, Layout, Scalar},
};
use gc_arena::Collect;
use std::{
    fmt::{Debug, Formatter},
    hash::{Hash, Hasher},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, OnceLock,
    },
};

pub mod members;

pub use members::{FieldDefinition, FieldDescription, FieldKey};

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);
static OBJECT: OnceLock<TypeDescription> = OnceLock::new();

/// Process-unique identity of a type definition.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeToken(pub u64);

pub struct TypeDefinition {
    pub token: TypeToken,
    pub name: String,
    pub extends: Option<TypeDescription>,
    pub fields: Vec<FieldDefinition>,
    pub layout: Layout,
    instance_layout: OnceLock<Result<Arc<FieldLayoutManager>, DmaError>>,
}

/// Shared handle to a managed type. Equality is identity of the definition.
#[derive(Clone, Collect)]
#[collect(require_static)]
pub struct TypeDescription(Arc<TypeDefinition>);

impl Debug for TypeDescription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.name)
    }
}

impl PartialEq for TypeDescription {
    fn eq(&self, other: &Self) -> bool {
        self.0.token == other.0.token
    }
}

impl Eq for TypeDescription {}

impl Hash for TypeDescription {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.token.hash(state);
    }
}

impl TypeDescription {
    /// The universal root type. It declares no fields.
    pub fn object() -> Self {
        OBJECT
            .get_or_init(|| TypeBuilder::root("Object").build())
            .clone()
    }

    pub fn definition(&self) -> &TypeDefinition {
        &self.0
    }

    pub fn token(&self) -> TypeToken {
        self.0.token
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn parent(&self) -> Option<&TypeDescription> {
        self.0.extends.as_ref()
    }

    /// This type followed by each of its ancestors, ending at the root.
    pub fn ancestors(&self) -> impl Iterator<Item = TypeDescription> {
        std::iter::successors(Some(self.clone()), |t| t.parent().cloned())
    }

    /// Fields declared directly on this type, static ones included.
    pub fn fields(&self) -> impl Iterator<Item = FieldDescription> + '_ {
        (0..self.0.fields.len()).map(|index| FieldDescription {
            parent: self.clone(),
            index,
        })
    }

    /// Finds a field by name on this type or the nearest ancestor declaring it.
    pub fn find_field(&self, name: &str) -> Option<FieldDescription> {
        self.ancestors().find_map(|t| {
            let index = t.0.fields.iter().position(|f| f.name == name)?;
            Some(FieldDescription { parent: t, index })
        })
    }

    pub fn field_key(&self, index: usize) -> FieldKey {
        FieldKey {
            owner: self.0.token,
            index,
        }
    }

    /// Instance field layout, computed on first use and shared afterwards.
    pub fn instance_layout(&self) -> Result<Arc<FieldLayoutManager>, DmaError> {
        self.0
            .instance_layout
            .get_or_init(|| FieldLayoutManager::instance_fields(self).map(Arc::new))
            .clone()
    }
}

/// Declares a managed type.
///
/// ```
/// use dma_rs::{types::TypeBuilder, value::layout::Scalar};
///
/// let point = TypeBuilder::new("Point")
///     .field("x", Scalar::Int32)
///     .field("y", Scalar::Int32)
///     .static_field("origin", Scalar::ObjectRef)
///     .build();
/// assert_eq!(point.instance_layout().unwrap().total_size, 8);
/// ```
pub struct TypeBuilder {
    name: String,
    extends: Option<TypeDescription>,
    fields: Vec<FieldDefinition>,
    layout: Layout,
}

impl TypeBuilder {
    /// A type extending the universal root.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            extends: Some(TypeDescription::object()),
            ..Self::root(name)
        }
    }

    /// A type with no parent.
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extends: None,
            fields: vec![],
            layout: Layout::Automatic,
        }
    }

    pub fn extends(mut self, parent: &TypeDescription) -> Self {
        self.extends = Some(parent.clone());
        self
    }

    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn field(mut self, name: impl Into<String>, kind: Scalar) -> Self {
        self.fields.push(FieldDefinition::instance(name, kind));
        self
    }

    /// An instance field at an explicit offset, for [`Layout::Explicit`].
    pub fn field_at(mut self, name: impl Into<String>, kind: Scalar, offset: usize) -> Self {
        self.fields.push(FieldDefinition {
            offset: Some(offset),
            ..FieldDefinition::instance(name, kind)
        });
        self
    }

    pub fn static_field(mut self, name: impl Into<String>, kind: Scalar) -> Self {
        self.fields.push(FieldDefinition {
            static_member: true,
            ..FieldDefinition::instance(name, kind)
        });
        self
    }

    pub fn build(self) -> TypeDescription {
        TypeDescription(Arc::new(TypeDefinition {
            token: TypeToken(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed)),
            name: self.name,
            extends: self.extends,
            fields: self.fields,
            layout: self.layout,
            instance_layout: OnceLock::new(),
        }))
    }
}

use crate::{
    types::{TypeDescription, TypeToken},
    value::layout::Scalar,
};
use std::{
    fmt::{Debug, Formatter},
    hash::{Hash, Hasher},
};

#[derive(Clone, Debug, PartialEq)]
pub struct FieldDefinition {
    pub name: String,
    pub kind: Scalar,
    pub static_member: bool,
    /// Only meaningful under explicit layout.
    pub offset: Option<usize>,
}

impl FieldDefinition {
    pub fn instance(name: impl Into<String>, kind: Scalar) -> Self {
        Self {
            name: name.into(),
            kind,
            static_member: false,
            offset: None,
        }
    }
}

/// Key of a field inside a computed layout.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldKey {
    pub owner: TypeToken,
    pub index: usize,
}

/// A field together with the type that declares it.
#[derive(Clone)]
pub struct FieldDescription {
    pub parent: TypeDescription,
    pub index: usize,
}

impl FieldDescription {
    pub fn definition(&self) -> &FieldDefinition {
        &self.parent.definition().fields[self.index]
    }

    pub fn name(&self) -> &str {
        &self.definition().name
    }

    pub fn is_static(&self) -> bool {
        self.definition().static_member
    }

    pub fn key(&self) -> FieldKey {
        self.parent.field_key(self.index)
    }
}

impl Debug for FieldDescription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let definition = self.definition();
        if definition.static_member {
            write!(f, "static ")?;
        }

        write!(
            f,
            "{} {}::{}",
            definition.kind.type_tag(),
            self.parent.name(),
            definition.name
        )
    }
}

impl PartialEq for FieldDescription {
    fn eq(&self, other: &Self) -> bool {
        self.parent == other.parent && self.index == other.index
    }
}

impl Eq for FieldDescription {}

impl Hash for FieldDescription {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

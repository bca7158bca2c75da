use serde::{Deserialize, Serialize};

use super::MetaId;

/// Index of a resolved type in the `MetaGraph` type arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeIdx(pub u32);

/// Resolved type reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Type {
    Void,
    Bool,
    SignedChar,
    UnsignedChar,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    Unichar,
    Float,
    Double,
    CString,
    Selector,
    Class,
    /// `Protocol *`.
    Protocol,
    Instancetype,
    /// `id`, optionally qualified by protocols.
    Id {
        #[serde(skip_serializing_if = "Vec::is_empty")]
        protocols: Vec<MetaId>,
    },
    /// Pointer to an interface instance, with closed type arguments only.
    Interface {
        interface: MetaId,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        protocols: Vec<MetaId>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        type_arguments: Vec<TypeIdx>,
    },
    TypeParameter {
        name: String,
    },
    Pointer {
        pointee: TypeIdx,
    },
    /// Return type first, then parameters.
    Block {
        signature: Vec<TypeIdx>,
    },
    FunctionPointer {
        signature: Vec<TypeIdx>,
    },
    ConstantArray {
        element: TypeIdx,
        size: u64,
    },
    IncompleteArray {
        element: TypeIdx,
    },
    Struct {
        meta: MetaId,
    },
    /// Unions are referenced by name only.
    Union {
        name: String,
    },
    Enum {
        meta: MetaId,
    },
}

impl Type {
    /// True for free type parameters.
    pub fn is_type_parameter(&self) -> bool {
        matches!(self, Type::TypeParameter { .. })
    }
}

//! Metadata entities produced by the factory.
//!
//! Entities live in the `MetaGraph` arena and refer to each other through
//! `MetaId`. Inheritance chains and property/accessor cross references are
//! therefore plain indices and never form ownership cycles.

mod graph;
mod types;

use bitflags::bitflags;
use bridgemeta_common::Version;
use serde::{Deserialize, Serialize};

use crate::source::DeclId;

pub use graph::{GraphDump, MetaGraph};
pub use types::{Type, TypeIdx};

/// Index of an entity in the `MetaGraph` arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetaId(pub u32);

/// Entity kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetaKind {
    Struct,
    /// Never produced by the factory, which rejects unions.
    Union,
    Function,
    Enum,
    Var,
    Interface,
    Protocol,
    Category,
    Method,
    Property,
    EnumConstant,
}

impl MetaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetaKind::Struct => "struct",
            MetaKind::Union => "union",
            MetaKind::Function => "function",
            MetaKind::Enum => "enum",
            MetaKind::Var => "var",
            MetaKind::Interface => "interface",
            MetaKind::Protocol => "protocol",
            MetaKind::Category => "category",
            MetaKind::Method => "method",
            MetaKind::Property => "property",
            MetaKind::EnumConstant => "enum_constant",
        }
    }
}

bitflags! {
    /// Kind-specific semantic facts about an entity.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct MetaFlags: u16 {
        /// Takes a C variadic argument list.
        const VARIADIC                 = 0b0000_0000_0001;
        /// The variadic list is nil-terminated.
        const NULL_TERMINATED_VARIADIC = 0b0000_0000_0010;
        /// The caller owns the returned object.
        const OWNS_RETURNED            = 0b0000_0000_0100;
        /// Last parameter is an `Error **` output parameter.
        const HAS_ERROR_OUT_PARAM      = 0b0000_0000_1000;
        /// Method of the `init` family.
        const INITIALIZER              = 0b0000_0001_0000;
        /// Returns `instancetype`.
        const RETURNS_SELF             = 0b0000_0010_0000;
        /// `@optional` protocol member.
        const OPTIONAL                 = 0b0000_0100_0000;
        /// Class method or class property.
        const STATIC                   = 0b0000_1000_0000;
        /// Getter or setter of a declared property.
        const PROPERTY_ACCESSOR        = 0b0001_0000_0000;
    }
}

/// One metadata entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Meta {
    /// Original foreign identifier or selector.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demangled_name: Option<String>,
    /// Public identifier handed to generators.
    pub bridge_name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub argument_labels: Vec<String>,
    pub is_renamed: bool,
    pub module: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub introduced: Option<Version>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<Version>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obsoleted: Option<Version>,
    pub flags: MetaFlags,
    /// Originating declaration; `None` for entities synthesized by filters.
    #[serde(skip)]
    pub source: Option<DeclId>,
    pub detail: MetaDetail,
}

/// Kind-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetaDetail {
    Struct(RecordMeta),
    Function(FunctionMeta),
    Enum(EnumMeta),
    Var(VarMeta),
    Interface(InterfaceMeta),
    Protocol(ProtocolMeta),
    Category(CategoryMeta),
    Method(MethodMeta),
    Property(PropertyMeta),
    EnumConstant(EnumConstantMeta),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeIdx,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordMeta {
    pub fields: Vec<RecordField>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FunctionMeta {
    /// Return type first, then parameters.
    pub signature: Vec<TypeIdx>,
}

/// Integer constant, signed when the source value needs a sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum IntegerValue {
    Signed(i64),
    Unsigned(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumField {
    pub name: String,
    /// Name without the enum's common prefix, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripped_name: Option<String>,
    pub value: IntegerValue,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnumMeta {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub prefix: String,
    pub fields: Vec<EnumField>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConstantValue {
    Integer(IntegerValue),
    Float(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarMeta {
    #[serde(rename = "type")]
    pub ty: TypeIdx,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<ConstantValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnumConstantMeta {
    pub value: IntegerValue,
}

/// Members shared by interfaces, protocols and categories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Members {
    pub instance_methods: Vec<MetaId>,
    pub static_methods: Vec<MetaId>,
    pub instance_properties: Vec<MetaId>,
    pub static_properties: Vec<MetaId>,
    pub protocols: Vec<MetaId>,
}

impl Members {
    /// Every method and property id, instance members first.
    pub fn all_members(&self) -> impl Iterator<Item = MetaId> + '_ {
        self.instance_methods
            .iter()
            .chain(&self.static_methods)
            .chain(&self.instance_properties)
            .chain(&self.static_properties)
            .copied()
    }

    /// Mutable access to the four member lists.
    pub fn member_lists_mut(&mut self) -> [&mut Vec<MetaId>; 4] {
        [
            &mut self.instance_methods,
            &mut self.static_methods,
            &mut self.instance_properties,
            &mut self.static_properties,
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InterfaceMeta {
    pub members: Members,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<MetaId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub type_parameters: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProtocolMeta {
    pub members: Members,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryMeta {
    pub members: Members,
    pub extended_interface: MetaId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MethodMeta {
    /// Return type first, then parameters.
    pub signature: Vec<TypeIdx>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub constructor_tokens: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PropertyMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub getter: Option<MetaId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setter: Option<MetaId>,
}

impl Meta {
    /// Entity with identification fields only; filled in by the factory.
    pub fn new(name: impl Into<String>, module: impl Into<String>, detail: MetaDetail) -> Self {
        let name = name.into();
        Self {
            bridge_name: name.clone(),
            name,
            demangled_name: None,
            argument_labels: Vec::new(),
            is_renamed: false,
            module: module.into(),
            introduced: None,
            deprecated: None,
            obsoleted: None,
            flags: MetaFlags::empty(),
            source: None,
            detail,
        }
    }

    pub fn kind(&self) -> MetaKind {
        match &self.detail {
            MetaDetail::Struct(_) => MetaKind::Struct,
            MetaDetail::Function(_) => MetaKind::Function,
            MetaDetail::Enum(_) => MetaKind::Enum,
            MetaDetail::Var(_) => MetaKind::Var,
            MetaDetail::Interface(_) => MetaKind::Interface,
            MetaDetail::Protocol(_) => MetaKind::Protocol,
            MetaDetail::Category(_) => MetaKind::Category,
            MetaDetail::Method(_) => MetaKind::Method,
            MetaDetail::Property(_) => MetaKind::Property,
            MetaDetail::EnumConstant(_) => MetaKind::EnumConstant,
        }
    }

    /// Top-level module: the part of `module` before the first `.`.
    pub fn top_module(&self) -> &str {
        self.module.split('.').next().unwrap_or_default()
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(MetaFlags::STATIC)
    }

    pub fn members(&self) -> Option<&Members> {
        match &self.detail {
            MetaDetail::Interface(d) => Some(&d.members),
            MetaDetail::Protocol(d) => Some(&d.members),
            MetaDetail::Category(d) => Some(&d.members),
            _ => None,
        }
    }

    pub fn members_mut(&mut self) -> Option<&mut Members> {
        match &mut self.detail {
            MetaDetail::Interface(d) => Some(&mut d.members),
            MetaDetail::Protocol(d) => Some(&mut d.members),
            MetaDetail::Category(d) => Some(&mut d.members),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&MethodMeta> {
        match &self.detail {
            MetaDetail::Method(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_property(&self) -> Option<&PropertyMeta> {
        match &self.detail {
            MetaDetail::Property(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_interface(&self) -> Option<&InterfaceMeta> {
        match &self.detail {
            MetaDetail::Interface(i) => Some(i),
            _ => None,
        }
    }
}

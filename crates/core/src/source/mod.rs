//! Declaration source structs for serde deserialization.
//!
//! The AST walker that feeds the pipeline is an external collaborator. It
//! hands over a `TranslationUnit`: a flat arena of declarations addressed by
//! `DeclId` plus an arena of foreign type references addressed by
//! `ForeignTypeId`. Ids are the declaration handles; the factory caches on
//! them and never looks past them once a `Meta` exists.

mod builder;

use std::fs;
use std::path::Path;

use bridgemeta_common::Version;
use serde::{Deserialize, Serialize};

pub use builder::UnitBuilder;

/// Handle of a declaration inside a `TranslationUnit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeclId(pub u32);

/// Handle of a foreign type reference inside a `TranslationUnit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ForeignTypeId(pub u32);

/// Root of the declaration stream for one translation unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationUnit {
    #[serde(default)]
    pub decls: Vec<Decl>,
    #[serde(default)]
    pub types: Vec<ForeignType>,
}

/// One foreign declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decl {
    /// Identifier, or the full selector for methods (`initWithName:age:`).
    pub name: String,
    /// Full module name, e.g. `UIKit.UIView`.
    #[serde(default)]
    pub module: String,
    /// Runtime name for symbols whose runtime name is mangled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub availability: Vec<AvailabilityAttr>,
    #[serde(default)]
    pub attributes: DeclAttributes,
    #[serde(flatten)]
    pub body: DeclBody,
}

/// Availability attribute for one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityAttr {
    pub platform: String,
    #[serde(default)]
    pub introduced: Option<Version>,
    #[serde(default)]
    pub deprecated: Option<Version>,
    #[serde(default)]
    pub obsoleted: Option<Version>,
    #[serde(default)]
    pub unavailable: bool,
}

/// Attributes that do not depend on the declaration kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeclAttributes {
    /// `NS_RETURNS_RETAINED` / `CF_RETURNS_RETAINED`.
    pub returns_retained: bool,
    /// `NS_RETURNS_NOT_RETAINED` / `CF_RETURNS_NOT_RETAINED`.
    pub returns_not_retained: bool,
    /// `NS_REQUIRES_NIL_TERMINATION` (sentinel): the variadic list is nil-terminated.
    pub sentinel: bool,
    /// Unconditionally unavailable (`__attribute__((unavailable))`).
    pub unavailable: bool,
}

/// Kind-specific part of a declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeclBody {
    Function(FunctionDecl),
    Record(RecordDecl),
    Var(VarDecl),
    Enum(EnumDecl),
    EnumConstant(EnumConstantDecl),
    Interface(InterfaceDecl),
    Protocol(ProtocolDecl),
    Category(CategoryDecl),
    Method(MethodDecl),
    Property(PropertyDecl),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDecl {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ForeignTypeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub return_type: ForeignTypeId,
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    #[serde(default)]
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ForeignTypeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDecl {
    #[serde(default)]
    pub is_union: bool,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
}

/// Raw integer constant as evaluated by the front end.
///
/// `bits` holds the two's complement bit pattern truncated to `width` bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInteger {
    pub bits: u64,
    pub width: u32,
    /// The constant's type is unsigned.
    #[serde(default)]
    pub unsigned: bool,
}

impl RawInteger {
    pub fn signed(bits: u64, width: u32) -> Self {
        Self {
            bits,
            width,
            unsigned: false,
        }
    }

    pub fn unsigned(bits: u64, width: u32) -> Self {
        Self {
            bits,
            width,
            unsigned: true,
        }
    }
}

/// Initializer of a global variable, as classified by the front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Initializer {
    Integer(RawInteger),
    Float { value: f64 },
    Struct,
    Complex,
    Vector,
    NonConstant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    #[serde(rename = "type")]
    pub ty: ForeignTypeId,
    #[serde(default)]
    pub initializer: Option<Initializer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDecl {
    #[serde(default)]
    pub integer_type: Option<ForeignTypeId>,
    #[serde(default)]
    pub constants: Vec<DeclId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumConstantDecl {
    pub value: RawInteger,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDecl {
    #[serde(default)]
    pub superclass: Option<DeclId>,
    #[serde(default)]
    pub protocols: Vec<DeclId>,
    #[serde(default)]
    pub methods: Vec<DeclId>,
    #[serde(default)]
    pub properties: Vec<DeclId>,
    #[serde(default)]
    pub type_parameters: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolDecl {
    #[serde(default)]
    pub protocols: Vec<DeclId>,
    #[serde(default)]
    pub methods: Vec<DeclId>,
    #[serde(default)]
    pub properties: Vec<DeclId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDecl {
    pub interface: DeclId,
    #[serde(default)]
    pub protocols: Vec<DeclId>,
    #[serde(default)]
    pub methods: Vec<DeclId>,
    #[serde(default)]
    pub properties: Vec<DeclId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    #[serde(default)]
    pub class_method: bool,
    pub return_type: ForeignTypeId,
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    #[serde(default)]
    pub variadic: bool,
    /// Implicitly declared getter or setter of a `@property`.
    #[serde(default)]
    pub property_accessor: bool,
    /// Declared under `@optional` in a protocol.
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDecl {
    #[serde(default)]
    pub getter: Option<DeclId>,
    #[serde(default)]
    pub setter: Option<DeclId>,
    #[serde(default)]
    pub class_property: bool,
    #[serde(default)]
    pub optional: bool,
}

/// Foreign type reference, mirroring the front end's type shapes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ForeignType {
    Void,
    Bool,
    Char,
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
    Float,
    Double,
    LongDouble,
    Int128,
    UnsignedInt128,
    Vector,
    ExtVector,
    Complex,
    /// `char *` and `const char *`.
    CString,
    Selector,
    Class,
    Instancetype,
    Id {
        #[serde(default)]
        protocols: Vec<DeclId>,
    },
    ObjectPointer {
        interface: DeclId,
        #[serde(default)]
        protocols: Vec<DeclId>,
        #[serde(default)]
        type_arguments: Vec<ForeignTypeId>,
    },
    /// `Protocol *`.
    ProtocolObject,
    Pointer {
        pointee: ForeignTypeId,
    },
    Block {
        return_type: ForeignTypeId,
        #[serde(default)]
        params: Vec<ForeignTypeId>,
    },
    FunctionPointer {
        return_type: ForeignTypeId,
        #[serde(default)]
        params: Vec<ForeignTypeId>,
    },
    ConstantArray {
        element: ForeignTypeId,
        size: u64,
    },
    IncompleteArray {
        element: ForeignTypeId,
    },
    Record {
        decl: DeclId,
    },
    Enum {
        decl: DeclId,
    },
    Typedef {
        name: String,
        underlying: ForeignTypeId,
    },
    TypeParameter {
        name: String,
    },
}

/// Declaration shape, used for dispatch and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Function,
    Record,
    Var,
    Enum,
    EnumConstant,
    Interface,
    Protocol,
    Category,
    Method,
    Property,
}

impl DeclKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclKind::Function => "function",
            DeclKind::Record => "record",
            DeclKind::Var => "var",
            DeclKind::Enum => "enum",
            DeclKind::EnumConstant => "enum constant",
            DeclKind::Interface => "interface",
            DeclKind::Protocol => "protocol",
            DeclKind::Category => "category",
            DeclKind::Method => "method",
            DeclKind::Property => "property",
        }
    }

    /// Methods and properties only exist inside containers.
    pub fn is_top_level(&self) -> bool {
        !matches!(self, DeclKind::Method | DeclKind::Property)
    }
}

/// Borrowed view over the members of an interface, protocol or category.
#[derive(Debug, Clone, Copy)]
pub struct ContainerDecl<'a> {
    pub protocols: &'a [DeclId],
    pub methods: &'a [DeclId],
    pub properties: &'a [DeclId],
}

impl DeclBody {
    pub fn kind(&self) -> DeclKind {
        match self {
            DeclBody::Function(_) => DeclKind::Function,
            DeclBody::Record(_) => DeclKind::Record,
            DeclBody::Var(_) => DeclKind::Var,
            DeclBody::Enum(_) => DeclKind::Enum,
            DeclBody::EnumConstant(_) => DeclKind::EnumConstant,
            DeclBody::Interface(_) => DeclKind::Interface,
            DeclBody::Protocol(_) => DeclKind::Protocol,
            DeclBody::Category(_) => DeclKind::Category,
            DeclBody::Method(_) => DeclKind::Method,
            DeclBody::Property(_) => DeclKind::Property,
        }
    }

    /// Member lists for container declarations.
    pub fn container(&self) -> Option<ContainerDecl<'_>> {
        match self {
            DeclBody::Interface(d) => Some(ContainerDecl {
                protocols: &d.protocols,
                methods: &d.methods,
                properties: &d.properties,
            }),
            DeclBody::Protocol(d) => Some(ContainerDecl {
                protocols: &d.protocols,
                methods: &d.methods,
                properties: &d.properties,
            }),
            DeclBody::Category(d) => Some(ContainerDecl {
                protocols: &d.protocols,
                methods: &d.methods,
                properties: &d.properties,
            }),
            _ => None,
        }
    }
}

impl Decl {
    pub fn new(name: impl Into<String>, module: impl Into<String>, body: DeclBody) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            runtime_name: None,
            availability: Vec::new(),
            attributes: DeclAttributes::default(),
            body,
        }
    }

    #[must_use]
    pub fn with_availability(mut self, attr: AvailabilityAttr) -> Self {
        self.availability.push(attr);
        self
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: DeclAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    #[must_use]
    pub fn with_runtime_name(mut self, runtime_name: impl Into<String>) -> Self {
        self.runtime_name = Some(runtime_name.into());
        self
    }

    pub fn kind(&self) -> DeclKind {
        self.body.kind()
    }

    /// Availability attribute for `platform`, if declared.
    pub fn availability_for(&self, platform: &str) -> Option<&AvailabilityAttr> {
        self.availability
            .iter()
            .find(|attr| attr.platform.eq_ignore_ascii_case(platform))
    }
}

impl AvailabilityAttr {
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            introduced: None,
            deprecated: None,
            obsoleted: None,
            unavailable: false,
        }
    }

    #[must_use]
    pub fn introduced(mut self, version: Version) -> Self {
        self.introduced = Some(version);
        self
    }

    #[must_use]
    pub fn deprecated(mut self, version: Version) -> Self {
        self.deprecated = Some(version);
        self
    }

    #[must_use]
    pub fn obsoleted(mut self, version: Version) -> Self {
        self.obsoleted = Some(version);
        self
    }
}

impl TranslationUnit {
    /// Parse a translation unit from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("Failed to parse translation unit: {e}"))
    }

    /// Parse a translation unit from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, String> {
        serde_yaml::from_str(yaml).map_err(|e| format!("Failed to parse translation unit: {e}"))
    }

    /// Load a translation unit, choosing YAML for `.yaml`/`.yml` and JSON otherwise.
    pub fn load(path: &Path) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
        if is_yaml {
            Self::from_yaml(&contents)
        } else {
            Self::from_json(&contents)
        }
    }

    pub fn decl(&self, id: DeclId) -> Option<&Decl> {
        self.decls.get(id.0 as usize)
    }

    pub fn foreign_type(&self, id: ForeignTypeId) -> Option<&ForeignType> {
        self.types.get(id.0 as usize)
    }

    /// Top-level declarations in traversal order.
    pub fn top_level(&self) -> impl Iterator<Item = DeclId> + '_ {
        self.decls
            .iter()
            .enumerate()
            .filter(|(_, decl)| decl.kind().is_top_level())
            .map(|(i, _)| DeclId(i as u32))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const UNIT_JSON: &str = r#"{
  "types": [
    { "kind": "void" },
    { "kind": "object_pointer", "interface": 0 },
    { "kind": "typedef", "name": "BOOL", "underlying": 3 },
    { "kind": "signed_char" }
  ],
  "decls": [
    {
      "name": "Widget",
      "module": "UIKit.Widget",
      "kind": "interface",
      "methods": [1],
      "availability": [{ "platform": "ios", "introduced": "11.0" }]
    },
    {
      "name": "isEnabled",
      "module": "UIKit.Widget",
      "kind": "method",
      "return_type": 2,
      "property_accessor": true
    },
    {
      "name": "WidgetCount",
      "module": "UIKit.Widget",
      "kind": "var",
      "type": 3,
      "initializer": { "kind": "integer", "bits": 4, "width": 32 }
    }
  ]
}"#;

    #[test]
    fn test_parse_unit_json() {
        let unit = TranslationUnit::from_json(UNIT_JSON).unwrap();
        assert_eq!(unit.decls.len(), 3);
        assert_eq!(unit.types.len(), 4);

        let widget = unit.decl(DeclId(0)).unwrap();
        assert_eq!(widget.kind(), DeclKind::Interface);
        let container = widget.body.container().unwrap();
        assert_eq!(container.methods, &[DeclId(1)]);
        assert_eq!(
            widget.availability_for("iOS").unwrap().introduced.unwrap().major,
            Some(11)
        );

        let DeclBody::Var(var) = &unit.decl(DeclId(2)).unwrap().body else {
            panic!("expected var");
        };
        assert_eq!(
            var.initializer,
            Some(Initializer::Integer(RawInteger::signed(4, 32)))
        );
    }

    #[test]
    fn test_load_picks_format_from_extension() {
        let dir = tempfile::TempDir::new().unwrap();
        let json = dir.path().join("unit.json");
        fs::write(&json, UNIT_JSON).unwrap();
        assert_eq!(
            TranslationUnit::load(&json).unwrap(),
            TranslationUnit::from_json(UNIT_JSON).unwrap()
        );

        let yaml = dir.path().join("unit.YML");
        fs::write(
            &yaml,
            "types:\n  - kind: void\ndecls:\n  - name: KitInit\n    module: Kit\n    kind: function\n    return_type: 0\n",
        )
        .unwrap();
        let unit = TranslationUnit::load(&yaml).unwrap();
        assert_eq!(unit.types, vec![ForeignType::Void]);
        assert_eq!(unit.decl(DeclId(0)).unwrap().kind(), DeclKind::Function);

        let err = TranslationUnit::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(err.starts_with("Failed to read"));
    }

    #[test]
    fn test_top_level_skips_members() {
        let unit = TranslationUnit::from_json(UNIT_JSON).unwrap();
        let roots: Vec<_> = unit.top_level().collect();
        assert_eq!(roots, vec![DeclId(0), DeclId(2)]);
    }

    #[test]
    fn test_parse_unit_yaml() {
        let yaml = r"
types:
  - kind: int
decls:
  - name: CGFloatMax
    kind: function
    return_type: 0
    params:
      - { name: a, type: 0 }
";
        let unit = TranslationUnit::from_yaml(yaml).unwrap();
        let DeclBody::Function(function) = &unit.decls[0].body else {
            panic!("expected function");
        };
        assert_eq!(function.params.len(), 1);
        assert!(!function.variadic);
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = TranslationUnit::from_json("{ \"decls\": [ { \"name\": 1 } ] }").unwrap_err();
        assert!(err.starts_with("Failed to parse translation unit"));
    }
}

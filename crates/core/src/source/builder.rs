//! Programmatic construction of translation units.

use super::{Decl, DeclBody, DeclId, ForeignType, ForeignTypeId, RecordDecl, TranslationUnit};

/// Builds a `TranslationUnit` declaration by declaration.
///
/// Foreign types are interned, so asking twice for `ForeignType::Int` yields
/// the same `ForeignTypeId`. Declarations that are referenced before they are
/// defined (an interface and its own methods, a property and its accessors)
/// can be reserved first and filled in with `define`.
#[derive(Debug, Default)]
pub struct UnitBuilder {
    unit: TranslationUnit,
}

impl UnitBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a foreign type.
    pub fn ty(&mut self, ty: ForeignType) -> ForeignTypeId {
        if let Some(pos) = self.unit.types.iter().position(|existing| *existing == ty) {
            return ForeignTypeId(pos as u32);
        }
        self.unit.types.push(ty);
        ForeignTypeId((self.unit.types.len() - 1) as u32)
    }

    /// `Interface *`.
    pub fn object(&mut self, interface: DeclId) -> ForeignTypeId {
        self.ty(ForeignType::ObjectPointer {
            interface,
            protocols: Vec::new(),
            type_arguments: Vec::new(),
        })
    }

    /// `T *`.
    pub fn pointer(&mut self, pointee: ForeignTypeId) -> ForeignTypeId {
        self.ty(ForeignType::Pointer { pointee })
    }

    /// `BOOL`, spelled as the usual `signed char` typedef.
    pub fn objc_bool(&mut self) -> ForeignTypeId {
        let underlying = self.ty(ForeignType::SignedChar);
        self.ty(ForeignType::Typedef {
            name: "BOOL".to_string(),
            underlying,
        })
    }

    pub fn push(&mut self, decl: Decl) -> DeclId {
        self.unit.decls.push(decl);
        DeclId((self.unit.decls.len() - 1) as u32)
    }

    /// Reserve an id for a declaration defined later.
    pub fn reserve(&mut self, name: &str) -> DeclId {
        self.push(Decl::new(
            name,
            "",
            DeclBody::Record(RecordDecl {
                is_union: false,
                fields: Vec::new(),
            }),
        ))
    }

    /// Fill in a reserved declaration.
    pub fn define(&mut self, id: DeclId, decl: Decl) {
        if let Some(slot) = self.unit.decls.get_mut(id.0 as usize) {
            *slot = decl;
        }
    }

    pub fn finish(self) -> TranslationUnit {
        self.unit
    }
}

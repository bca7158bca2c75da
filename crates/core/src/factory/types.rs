//! Foreign type resolution, memoized per `ForeignTypeId`.

use super::MetaFactory;
use crate::error::{CreationError, CreationResult};
use crate::meta::{MetaId, Type, TypeIdx};
use crate::source::{DeclBody, DeclId, ForeignType, ForeignTypeId};

/// Typedef chains longer than this are treated as malformed.
const MAX_TYPEDEF_DEPTH: usize = 64;

static INSTANCETYPE: ForeignType = ForeignType::Instancetype;

impl<'a> MetaFactory<'a> {
    pub(crate) fn resolve_type(&mut self, id: ForeignTypeId) -> CreationResult<TypeIdx> {
        if let Some(idx) = self.type_cache.get(&id) {
            return Ok(*idx);
        }
        let unit = self.unit;
        let foreign = unit
            .foreign_type(id)
            .ok_or_else(|| CreationError::invalid(format!("dangling type id {}", id.0)))?;

        if !self.resolving.insert(id) {
            return Err(CreationError::invalid(format!("cyclic type id {}", id.0)));
        }
        let converted = self.convert(foreign);
        self.resolving.remove(&id);

        let idx = self.graph.add_type(converted?);
        self.type_cache.insert(id, idx);
        self.type_log.push(id);
        Ok(idx)
    }

    fn convert(&mut self, foreign: &'a ForeignType) -> CreationResult<Type> {
        let ty = match foreign {
            ForeignType::Void => Type::Void,
            ForeignType::Bool => Type::Bool,
            ForeignType::Char | ForeignType::SignedChar => Type::SignedChar,
            ForeignType::UnsignedChar => Type::UnsignedChar,
            ForeignType::Short => Type::Short,
            ForeignType::UnsignedShort => Type::UnsignedShort,
            ForeignType::Int => Type::Int,
            ForeignType::UnsignedInt => Type::UnsignedInt,
            ForeignType::Long => Type::Long,
            ForeignType::UnsignedLong => Type::UnsignedLong,
            ForeignType::LongLong => Type::LongLong,
            ForeignType::UnsignedLongLong => Type::UnsignedLongLong,
            ForeignType::Float => Type::Float,
            ForeignType::Double => Type::Double,
            ForeignType::LongDouble => return Err(unsupported("long double")),
            ForeignType::Int128 | ForeignType::UnsignedInt128 => {
                return Err(unsupported("128-bit integer"));
            }
            ForeignType::Vector | ForeignType::ExtVector => return Err(unsupported("vector")),
            ForeignType::Complex => return Err(unsupported("complex")),
            ForeignType::CString => Type::CString,
            ForeignType::Selector => Type::Selector,
            ForeignType::Class => Type::Class,
            ForeignType::Instancetype => Type::Instancetype,
            ForeignType::ProtocolObject => Type::Protocol,
            ForeignType::Id { protocols } => Type::Id {
                protocols: self.qualifying_protocols(protocols),
            },
            ForeignType::ObjectPointer {
                interface,
                protocols,
                type_arguments,
            } => {
                let meta = self.dependency(*interface, "")?;
                let mut arguments = Vec::with_capacity(type_arguments.len());
                for argument in type_arguments {
                    arguments.push(self.resolve_type(*argument)?);
                }
                let closed = arguments
                    .iter()
                    .all(|idx| self.graph.ty(*idx).is_some_and(|t| !t.is_type_parameter()));
                Type::Interface {
                    interface: meta,
                    protocols: self.qualifying_protocols(protocols),
                    type_arguments: if closed { arguments } else { Vec::new() },
                }
            }
            ForeignType::Pointer { pointee } => Type::Pointer {
                pointee: self.resolve_type(*pointee)?,
            },
            ForeignType::Block {
                return_type,
                params,
            } => Type::Block {
                signature: self.type_list(*return_type, params)?,
            },
            ForeignType::FunctionPointer {
                return_type,
                params,
            } => Type::FunctionPointer {
                signature: self.type_list(*return_type, params)?,
            },
            ForeignType::ConstantArray { element, size } => Type::ConstantArray {
                element: self.resolve_type(*element)?,
                size: *size,
            },
            ForeignType::IncompleteArray { element } => Type::IncompleteArray {
                element: self.resolve_type(*element)?,
            },
            ForeignType::Record { decl } => {
                let unit = self.unit;
                match unit.decl(*decl).map(|d| &d.body) {
                    Some(DeclBody::Record(record)) if record.is_union => Type::Union {
                        name: unit.decl(*decl).map(|d| d.name.clone()).unwrap_or_default(),
                    },
                    _ => Type::Struct {
                        meta: self.dependency(*decl, "")?,
                    },
                }
            }
            ForeignType::Enum { decl } => Type::Enum {
                meta: self.dependency(*decl, "")?,
            },
            ForeignType::TypeParameter { name } => Type::TypeParameter { name: name.clone() },
            ForeignType::Typedef { name, underlying } => match special_typedef(name) {
                Some(ty) => ty,
                None => {
                    let idx = self.resolve_type(*underlying)?;
                    self.graph.ty(idx).cloned().ok_or_else(|| {
                        CreationError::invalid(format!("typedef '{name}' has no underlying type"))
                    })?
                }
            },
        };
        Ok(ty)
    }

    fn type_list(
        &mut self,
        return_type: ForeignTypeId,
        params: &[ForeignTypeId],
    ) -> CreationResult<Vec<TypeIdx>> {
        let mut signature = Vec::with_capacity(params.len() + 1);
        signature.push(self.resolve_type(return_type)?);
        for param in params {
            signature.push(self.resolve_type(*param)?);
        }
        Ok(signature)
    }

    /// Protocol qualifiers that build; the rest are dropped.
    fn qualifying_protocols(&mut self, protocols: &[DeclId]) -> Vec<MetaId> {
        protocols
            .iter()
            .filter_map(|protocol| self.create(*protocol).ok())
            .collect()
    }

    /// Foreign type with typedefs stripped.
    pub(crate) fn peel_typedefs(&self, mut id: ForeignTypeId) -> Option<&'a ForeignType> {
        let unit = self.unit;
        for _ in 0..MAX_TYPEDEF_DEPTH {
            match unit.foreign_type(id)? {
                ForeignType::Typedef { name, .. } if name == "instancetype" => {
                    return Some(&INSTANCETYPE);
                }
                ForeignType::Typedef { underlying, .. } => id = *underlying,
                other => return Some(other),
            }
        }
        None
    }

    /// `Error **`, where `Error` is the configured error interface.
    pub(crate) fn is_error_out_param(&self, id: ForeignTypeId) -> bool {
        let Some(ForeignType::Pointer { pointee }) = self.peel_typedefs(id) else {
            return false;
        };
        let Some(ForeignType::ObjectPointer { interface, .. }) = self.peel_typedefs(*pointee) else {
            return false;
        };
        self.unit
            .decl(*interface)
            .is_some_and(|decl| decl.name == self.ctx.error_interface)
    }

    pub(crate) fn is_instancetype(&self, id: ForeignTypeId) -> bool {
        matches!(self.peel_typedefs(id), Some(ForeignType::Instancetype))
    }
}

fn special_typedef(name: &str) -> Option<Type> {
    match name {
        "BOOL" => Some(Type::Bool),
        "unichar" => Some(Type::Unichar),
        "instancetype" => Some(Type::Instancetype),
        _ => None,
    }
}

fn unsupported(what: &str) -> CreationError {
    CreationError::skip(format!("{what} types are not supported"))
}

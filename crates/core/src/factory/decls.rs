//! Per-kind construction routines.

use tracing::trace;

use super::MetaFactory;
use crate::availability::{self, AvailabilityWindow};
use crate::error::{CreationError, CreationResult};
use crate::meta::{
    CategoryMeta, ConstantValue, EnumConstantMeta, EnumField, EnumMeta, FunctionMeta,
    InterfaceMeta, Meta, MetaDetail, MetaFlags, MethodMeta, PropertyMeta, ProtocolMeta,
    RecordField, RecordMeta, TypeIdx, VarMeta,
};
use crate::naming::{self, DerivedNames, MethodFamily};
use crate::source::{
    CategoryDecl, Decl, DeclAttributes, DeclBody, DeclId, EnumDecl, ForeignTypeId, FunctionDecl,
    Initializer, InterfaceDecl, MethodDecl, ParamDecl, PropertyDecl, RecordDecl, VarDecl,
};

use super::enums::{common_prefix, integer_value};

impl<'a> MetaFactory<'a> {
    /// Dispatch on the declaration shape.
    pub(super) fn build(
        &mut self,
        id: DeclId,
        decl: &'a Decl,
        context_name: &str,
    ) -> CreationResult<Meta> {
        let window = self.gate(decl)?;
        trace!(decl = %decl.name, kind = decl.kind().as_str(), "Building entity.");

        let mut meta = match &decl.body {
            DeclBody::Function(f) => self.function(decl, f)?,
            DeclBody::Record(r) => self.record(decl, r)?,
            DeclBody::Var(v) => self.var(decl, v)?,
            DeclBody::Enum(e) => self.enumeration(decl, e)?,
            DeclBody::EnumConstant(c) => self.named(
                decl,
                context_name,
                MetaDetail::EnumConstant(EnumConstantMeta {
                    value: integer_value(c.value),
                }),
            ),
            DeclBody::Interface(i) => self.interface(decl, i)?,
            DeclBody::Protocol(_) => {
                let members = self.gather_members(decl, &decl.name);
                self.named(decl, context_name, MetaDetail::Protocol(ProtocolMeta { members }))
            }
            DeclBody::Category(c) => self.category(decl, c)?,
            DeclBody::Method(m) => self.method(decl, m, context_name)?,
            DeclBody::Property(p) => self.property(decl, p, context_name)?,
        };

        meta.source = Some(id);
        meta.introduced = window.introduced;
        meta.deprecated = window.deprecated;
        meta.obsoleted = window.obsoleted;
        Ok(meta)
    }

    /// Availability window of `decl` for the configured platform.
    fn gate(&self, decl: &Decl) -> CreationResult<AvailabilityWindow> {
        if decl.attributes.unavailable {
            return Err(CreationError::skip(format!("'{}' is marked unavailable", decl.name)));
        }
        let Some(attr) = decl.availability_for(&self.ctx.platform) else {
            return Ok(AvailabilityWindow::default());
        };
        if attr.unavailable {
            return Err(CreationError::skip(format!(
                "'{}' is unavailable on {}",
                decl.name, self.ctx.platform
            )));
        }
        let window = AvailabilityWindow {
            introduced: attr.introduced,
            deprecated: attr.deprecated,
            obsoleted: attr.obsoleted,
        };
        availability::check(&window, self.ctx)?;
        Ok(window)
    }

    /// Entity with identification fields from `decl` and `names`.
    fn identified(decl: &Decl, names: DerivedNames, detail: MetaDetail) -> Meta {
        let mut meta = Meta::new(decl.name.as_str(), decl.module.as_str(), detail);
        meta.demangled_name.clone_from(&decl.runtime_name);
        meta.bridge_name = names.bridge_name;
        meta.argument_labels = names.argument_labels;
        meta.is_renamed = names.renamed;
        meta
    }

    fn named(&self, decl: &Decl, owner: &str, detail: MetaDetail) -> Meta {
        let names = naming::entity_names(self.ctx, &decl.name, owner);
        Self::identified(decl, names, detail)
    }

    fn function(&mut self, decl: &Decl, f: &FunctionDecl) -> CreationResult<Meta> {
        let mut flags = variadic_flags(&decl.name, f.variadic, &decl.attributes)?;
        if f.params.last().is_some_and(|p| self.is_error_out_param(p.ty)) {
            flags |= MetaFlags::HAS_ERROR_OUT_PARAM;
        }
        let attrs = &decl.attributes;
        if !attrs.returns_not_retained
            && (attrs.returns_retained || naming::follows_create_rule(&decl.name))
        {
            flags |= MetaFlags::OWNS_RETURNED;
        }

        let signature = self.signature(f.return_type, &f.params)?;
        let mut meta = self.named(decl, "", MetaDetail::Function(FunctionMeta { signature }));
        meta.flags = flags;
        Ok(meta)
    }

    fn record(&mut self, decl: &Decl, r: &RecordDecl) -> CreationResult<Meta> {
        if r.is_union {
            return Err(CreationError::skip(format!("union '{}' is not supported", decl.name)));
        }
        let mut fields = Vec::with_capacity(r.fields.len());
        for field in &r.fields {
            let ty = self.resolve_type(field.ty).map_err(|cause| {
                CreationError::dependency(format!("field '{}'", field.name), cause)
            })?;
            fields.push(RecordField {
                name: field.name.clone(),
                ty,
            });
        }
        Ok(self.named(decl, "", MetaDetail::Struct(RecordMeta { fields })))
    }

    fn var(&mut self, decl: &Decl, v: &VarDecl) -> CreationResult<Meta> {
        let value = match &v.initializer {
            None => None,
            Some(Initializer::Integer(raw)) => Some(ConstantValue::Integer(integer_value(*raw))),
            Some(Initializer::Float { value }) => Some(ConstantValue::Float(*value)),
            Some(other) => {
                return Err(CreationError::UnsupportedValue(format!(
                    "{} initializer of '{}'",
                    initializer_kind(other),
                    decl.name
                )));
            }
        };
        let ty = self.resolve_type(v.ty)?;
        Ok(self.named(decl, "", MetaDetail::Var(VarMeta { ty, value })))
    }

    fn enumeration(&mut self, decl: &Decl, e: &EnumDecl) -> CreationResult<Meta> {
        let unit = self.unit;
        let mut constants = Vec::with_capacity(e.constants.len());
        for id in &e.constants {
            let constant = unit.decl(*id).ok_or_else(|| {
                CreationError::invalid(format!("enum '{}' refers to missing constant #{}", decl.name, id.0))
            })?;
            let DeclBody::EnumConstant(c) = &constant.body else {
                return Err(CreationError::invalid(format!(
                    "enum '{}' member '{}' is a {}",
                    decl.name,
                    constant.name,
                    constant.kind().as_str()
                )));
            };
            constants.push((constant.name.as_str(), c.value));
        }

        let names: Vec<&str> = constants.iter().map(|(name, _)| *name).collect();
        let prefix = common_prefix(&names);
        let fields = constants
            .into_iter()
            .map(|(name, raw)| EnumField {
                name: name.to_string(),
                stripped_name: (!prefix.is_empty()).then(|| name[prefix.len()..].to_string()),
                value: integer_value(raw),
            })
            .collect();

        Ok(self.named(
            decl,
            "",
            MetaDetail::Enum(EnumMeta {
                prefix: prefix.to_string(),
                fields,
            }),
        ))
    }

    fn interface(&mut self, decl: &Decl, i: &InterfaceDecl) -> CreationResult<Meta> {
        let base = match i.superclass {
            Some(superclass) => Some(self.dependency(superclass, "")?),
            None => None,
        };
        let members = self.gather_members(decl, &decl.name);
        Ok(self.named(
            decl,
            "",
            MetaDetail::Interface(InterfaceMeta {
                members,
                base,
                type_parameters: i.type_parameters.clone(),
            }),
        ))
    }

    fn category(&mut self, decl: &Decl, c: &CategoryDecl) -> CreationResult<Meta> {
        let extended_interface = self.dependency(c.interface, "")?;
        let unit = self.unit;
        let owner = unit.decl(c.interface).map_or(decl.name.as_str(), |d| d.name.as_str());
        let members = self.gather_members(decl, owner);
        Ok(self.named(
            decl,
            "",
            MetaDetail::Category(CategoryMeta {
                members,
                extended_interface,
            }),
        ))
    }

    fn method(&mut self, decl: &Decl, m: &MethodDecl, owner: &str) -> CreationResult<Meta> {
        let mut flags = variadic_flags(&decl.name, m.variadic, &decl.attributes)?;
        let has_error_param = m.params.last().is_some_and(|p| self.is_error_out_param(p.ty));
        if has_error_param {
            flags |= MetaFlags::HAS_ERROR_OUT_PARAM;
        }

        let family = naming::method_family(&decl.name);
        if family == MethodFamily::Init {
            flags |= MetaFlags::INITIALIZER;
        }
        let attrs = &decl.attributes;
        if !attrs.returns_not_retained && (attrs.returns_retained || family.owns_returned()) {
            flags |= MetaFlags::OWNS_RETURNED;
        }
        if self.is_instancetype(m.return_type) {
            flags |= MetaFlags::RETURNS_SELF;
        }
        flags.set(MetaFlags::STATIC, m.class_method);
        flags.set(MetaFlags::OPTIONAL, m.optional);
        flags.set(MetaFlags::PROPERTY_ACCESSOR, m.property_accessor);

        let signature = self.signature(m.return_type, &m.params)?;
        let names = naming::method_names(self.ctx, &decl.name, owner, has_error_param);
        let constructor_tokens = names.constructor_tokens.clone();
        let mut meta = Self::identified(
            decl,
            names,
            MetaDetail::Method(MethodMeta {
                signature,
                constructor_tokens,
            }),
        );
        meta.flags = flags;
        Ok(meta)
    }

    fn property(&mut self, decl: &Decl, p: &PropertyDecl, owner: &str) -> CreationResult<Meta> {
        let getter = match p.getter {
            Some(getter) => Some(self.dependency(getter, owner)?),
            None => None,
        };
        let setter = match p.setter {
            Some(setter) => Some(self.dependency(setter, owner)?),
            None => None,
        };
        let mut meta = self.named(decl, owner, MetaDetail::Property(PropertyMeta { getter, setter }));
        meta.flags.set(MetaFlags::STATIC, p.class_property);
        meta.flags.set(MetaFlags::OPTIONAL, p.optional);
        Ok(meta)
    }

    /// Return type followed by parameter types.
    fn signature(
        &mut self,
        return_type: ForeignTypeId,
        params: &[ParamDecl],
    ) -> CreationResult<Vec<TypeIdx>> {
        let mut signature = Vec::with_capacity(params.len() + 1);
        signature.push(self.resolve_type(return_type)?);
        for param in params {
            signature.push(self.resolve_type(param.ty)?);
        }
        Ok(signature)
    }
}

/// Only nil-terminated variadics can be bridged.
fn variadic_flags(name: &str, variadic: bool, attrs: &DeclAttributes) -> CreationResult<MetaFlags> {
    if !variadic {
        return Ok(MetaFlags::empty());
    }
    if !attrs.sentinel {
        return Err(CreationError::skip(format!("'{name}' is variadic")));
    }
    Ok(MetaFlags::VARIADIC | MetaFlags::NULL_TERMINATED_VARIADIC)
}

fn initializer_kind(initializer: &Initializer) -> &'static str {
    match initializer {
        Initializer::Integer(_) => "integer",
        Initializer::Float { .. } => "float",
        Initializer::Struct => "struct",
        Initializer::Complex => "complex",
        Initializer::Vector => "vector",
        Initializer::NonConstant => "non-constant",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use bridgemeta_common::Version;

    use crate::context::ResolutionContext;
    use crate::factory::MetaFactory;
    use crate::meta::{ConstantValue, IntegerValue, MetaDetail, MetaFlags, MetaKind};
    use crate::naming::CONSTRUCTOR_MARKER;
    use crate::source::{
        AvailabilityAttr, CategoryDecl, Decl, DeclAttributes, DeclBody, DeclId, EnumConstantDecl,
        EnumDecl, ForeignType, FunctionDecl, Initializer, InterfaceDecl, MethodDecl, ParamDecl,
        PropertyDecl, RawInteger, TranslationUnit, UnitBuilder, VarDecl,
    };

    fn method_decl(selector: &str, builder: &mut UnitBuilder, params: Vec<ParamDecl>) -> Decl {
        let instancetype = builder.ty(ForeignType::Instancetype);
        Decl::new(
            selector,
            "Kit.Person",
            DeclBody::Method(MethodDecl {
                class_method: false,
                return_type: instancetype,
                params,
                variadic: false,
                property_accessor: false,
                optional: false,
            }),
        )
    }

    fn build(unit: &TranslationUnit, decl: DeclId) -> crate::meta::Meta {
        let ctx = ResolutionContext::default();
        let mut factory = MetaFactory::new(unit, &ctx);
        let id = factory.create(decl).unwrap();
        factory.graph().get(id).unwrap().clone()
    }

    #[test]
    fn test_initializer_method() {
        let mut builder = UnitBuilder::new();
        let string = builder.ty(ForeignType::CString);
        let int = builder.ty(ForeignType::Int);
        let params = vec![
            ParamDecl {
                name: "name".into(),
                ty: string,
            },
            ParamDecl {
                name: "age".into(),
                ty: int,
            },
        ];
        let decl = method_decl("initWithName:age:", &mut builder, params);
        let id = builder.push(decl);
        let unit = builder.finish();

        let meta = build(&unit, id);
        assert_eq!(meta.bridge_name, CONSTRUCTOR_MARKER);
        assert_eq!(meta.argument_labels, vec!["name", "age"]);
        let MetaDetail::Method(method) = &meta.detail else {
            panic!("expected method");
        };
        assert_eq!(method.constructor_tokens, vec!["name", "age"]);
        assert_eq!(method.signature.len(), 3);
        assert!(meta.flags.contains(MetaFlags::INITIALIZER));
        assert!(meta.flags.contains(MetaFlags::OWNS_RETURNED));
        assert!(meta.flags.contains(MetaFlags::RETURNS_SELF));
    }

    #[test]
    fn test_error_out_param_truncates_tokens() {
        let mut builder = UnitBuilder::new();
        let error = builder.push(Decl::new(
            "NSError",
            "Foundation.NSError",
            DeclBody::Interface(InterfaceDecl::default()),
        ));
        let url = builder.ty(ForeignType::CString);
        let error_ptr = builder.object(error);
        let error_out = builder.pointer(error_ptr);
        let params = vec![
            ParamDecl {
                name: "url".into(),
                ty: url,
            },
            ParamDecl {
                name: "error".into(),
                ty: error_out,
            },
        ];
        let decl = method_decl("initWithContentsOfURL:error:", &mut builder, params);
        let id = builder.push(decl);
        let unit = builder.finish();

        let meta = build(&unit, id);
        assert!(meta.flags.contains(MetaFlags::HAS_ERROR_OUT_PARAM));
        assert_eq!(meta.argument_labels, vec!["contentsOfURL"]);
    }

    #[test]
    fn test_variadic_needs_sentinel() {
        let mut builder = UnitBuilder::new();
        let void = builder.ty(ForeignType::Void);
        let body = DeclBody::Function(FunctionDecl {
            return_type: void,
            params: Vec::new(),
            variadic: true,
        });
        let plain = builder.push(Decl::new("NSLog", "Foundation", body.clone()));
        let sentinel = builder.push(Decl::new("NSArrayOf", "Foundation", body).with_attributes(
            DeclAttributes {
                sentinel: true,
                ..DeclAttributes::default()
            },
        ));
        let unit = builder.finish();
        let ctx = ResolutionContext::default();
        let mut factory = MetaFactory::new(&unit, &ctx);

        assert!(factory.create(plain).unwrap_err().is_skip());
        let id = factory.create(sentinel).unwrap();
        let flags = factory.graph().get(id).unwrap().flags;
        assert!(flags.contains(MetaFlags::VARIADIC | MetaFlags::NULL_TERMINATED_VARIADIC));
    }

    #[test]
    fn test_function_ownership() {
        let mut builder = UnitBuilder::new();
        let void = builder.ty(ForeignType::Void);
        let body = DeclBody::Function(FunctionDecl {
            return_type: void,
            params: Vec::new(),
            variadic: false,
        });
        let create = builder.push(Decl::new("CGColorCreate", "CoreGraphics", body.clone()));
        let get = builder.push(Decl::new("CGColorGetAlpha", "CoreGraphics", body.clone()));
        let not_retained = builder.push(
            Decl::new("CGPathCreateCopy", "CoreGraphics", body).with_attributes(DeclAttributes {
                returns_not_retained: true,
                ..DeclAttributes::default()
            }),
        );
        let unit = builder.finish();
        let ctx = ResolutionContext::default();
        let mut factory = MetaFactory::new(&unit, &ctx);

        for (decl, owns) in [(create, true), (get, false), (not_retained, false)] {
            let id = factory.create(decl).unwrap();
            assert_eq!(
                factory.graph().get(id).unwrap().flags.contains(MetaFlags::OWNS_RETURNED),
                owns
            );
        }
    }

    #[test]
    fn test_var_values() {
        let mut builder = UnitBuilder::new();
        let double = builder.ty(ForeignType::Double);
        let var = |name: &str, initializer| {
            Decl::new(
                name,
                "Kit",
                DeclBody::Var(VarDecl {
                    ty: double,
                    initializer,
                }),
            )
        };
        let float = builder.push(var("KitScale", Some(Initializer::Float { value: 2.5 })));
        let count = Initializer::Integer(RawInteger::signed(7, 32));
        let int = builder.push(var("KitCount", Some(count)));
        let extern_var = builder.push(var("KitName", None));
        let structured = builder.push(var("KitOrigin", Some(Initializer::Struct)));
        let unit = builder.finish();
        let ctx = ResolutionContext::default();
        let mut factory = MetaFactory::new(&unit, &ctx);

        let value = |factory: &MetaFactory<'_>, id| match &factory.graph().get(id).unwrap().detail {
            MetaDetail::Var(var) => var.value,
            _ => panic!("expected var"),
        };
        let id = factory.create(float).unwrap();
        assert_eq!(value(&factory, id), Some(ConstantValue::Float(2.5)));
        let id = factory.create(int).unwrap();
        assert_eq!(
            value(&factory, id),
            Some(ConstantValue::Integer(IntegerValue::Unsigned(7)))
        );
        let id = factory.create(extern_var).unwrap();
        assert_eq!(value(&factory, id), None);

        let err = factory.create(structured).unwrap_err();
        assert!(matches!(err, crate::error::CreationError::UnsupportedValue(_)));
        assert!(err.is_skip());
    }

    #[test]
    fn test_enum_prefix_and_values() {
        let mut builder = UnitBuilder::new();
        let values = [
            ("NSOrderedAscending", u64::MAX),
            ("NSOrderedSame", 0),
            ("NSOrderedDescending", 1),
        ];
        let constants: Vec<DeclId> = values
            .into_iter()
            .map(|(name, bits)| {
                builder.push(Decl::new(
                    name,
                    "Foundation",
                    DeclBody::EnumConstant(EnumConstantDecl {
                        value: RawInteger::signed(bits, 64),
                    }),
                ))
            })
            .collect();
        let id = builder.push(Decl::new(
            "NSComparisonResult",
            "Foundation",
            DeclBody::Enum(EnumDecl {
                integer_type: None,
                constants,
            }),
        ));
        let unit = builder.finish();

        let meta = build(&unit, id);
        let MetaDetail::Enum(e) = &meta.detail else {
            panic!("expected enum");
        };
        assert_eq!(e.prefix, "NSOrdered");
        assert_eq!(e.fields[0].stripped_name.as_deref(), Some("Ascending"));
        assert_eq!(e.fields[0].value, IntegerValue::Signed(-1));
        assert_eq!(e.fields[1].value, IntegerValue::Unsigned(0));
    }

    #[test]
    fn test_availability_gate_on_entities() {
        let mut builder = UnitBuilder::new();
        let id = builder.push(
            Decl::new("UIMenu", "UIKit", DeclBody::Interface(InterfaceDecl::default()))
                .with_availability(AvailabilityAttr::new("ios").introduced(Version::new(11, 0, 0)))
                .with_availability(AvailabilityAttr::new("macos").introduced(Version::new(99, 0, 0))),
        );
        let unit = builder.finish();

        let old = ResolutionContext::default().with_target_version(Version::new(10, 15, 0));
        let mut factory = MetaFactory::new(&unit, &old);
        assert!(factory.create(id).unwrap_err().is_skip());

        let new = ResolutionContext::default().with_target_version(Version::new(12, 0, 0));
        let mut factory = MetaFactory::new(&unit, &new);
        let meta_id = factory.create(id).unwrap();
        assert_eq!(
            factory.graph().get(meta_id).unwrap().introduced,
            Some(Version::new(11, 0, 0))
        );
    }

    #[test]
    fn test_property_and_base_dependencies() {
        let mut builder = UnitBuilder::new();
        let bool_ty = builder.objc_bool();
        let long_double = builder.ty(ForeignType::LongDouble);
        let base = builder.push(Decl::new(
            "Responder",
            "Kit",
            DeclBody::Interface(InterfaceDecl::default()),
        ));
        let getter = builder.push(Decl::new(
            "isHidden",
            "Kit",
            DeclBody::Method(MethodDecl {
                class_method: false,
                return_type: bool_ty,
                params: Vec::new(),
                variadic: false,
                property_accessor: true,
                optional: false,
            }),
        ));
        let hidden = builder.push(Decl::new(
            "hidden",
            "Kit",
            DeclBody::Property(PropertyDecl {
                getter: Some(getter),
                ..PropertyDecl::default()
            }),
        ));
        let bad_getter = builder.push(Decl::new(
            "precision",
            "Kit",
            DeclBody::Method(MethodDecl {
                class_method: false,
                return_type: long_double,
                params: Vec::new(),
                variadic: false,
                property_accessor: true,
                optional: false,
            }),
        ));
        let precision = builder.push(Decl::new(
            "precision",
            "Kit",
            DeclBody::Property(PropertyDecl {
                getter: Some(bad_getter),
                ..PropertyDecl::default()
            }),
        ));
        let view = builder.push(Decl::new(
            "View",
            "Kit",
            DeclBody::Interface(InterfaceDecl {
                superclass: Some(base),
                methods: vec![getter, bad_getter],
                properties: vec![hidden, precision],
                ..InterfaceDecl::default()
            }),
        ));
        let extension = builder.push(Decl::new(
            "Layout",
            "Kit",
            DeclBody::Category(CategoryDecl {
                interface: view,
                protocols: Vec::new(),
                methods: Vec::new(),
                properties: Vec::new(),
            }),
        ));
        let unit = builder.finish();
        let ctx = ResolutionContext::default();
        let mut factory = MetaFactory::new(&unit, &ctx);

        let view_id = factory.create(view).unwrap();
        let graph = factory.graph();
        let view_meta = graph.get(view_id).unwrap();
        let interface = view_meta.as_interface().unwrap();
        assert_eq!(graph.get(interface.base.unwrap()).unwrap().name, "Responder");
        assert_eq!(interface.members.instance_properties.len(), 1);
        let property = graph.get(interface.members.instance_properties[0]).unwrap();
        assert_eq!(property.kind(), MetaKind::Property);
        let getter_id = property.as_property().unwrap().getter.unwrap();
        assert!(graph.get(getter_id).unwrap().flags.contains(MetaFlags::PROPERTY_ACCESSOR));

        let err = factory.create(precision).unwrap_err();
        assert!(err.is_skip());
        assert_eq!(err.chain().len(), 2);

        let category_id = factory.create(extension).unwrap();
        let category_meta = factory.graph().get(category_id).unwrap();
        let MetaDetail::Category(category) = &category_meta.detail else {
            panic!("expected category");
        };
        assert_eq!(category.extended_interface, view_id);
    }
}

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::{Meta, MetaDetail, MetaId, Type, TypeIdx};

/// Arena of entities and resolved types for one batch run.
///
/// A slot is reserved before an entity's dependencies are resolved and
/// filled once construction succeeds. Slots of failed constructions stay
/// empty. Entities are never removed individually.
#[derive(Debug, Default)]
pub struct MetaGraph {
    slots: Vec<Option<Meta>>,
    types: Vec<Type>,
}

impl MetaGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve an empty slot.
    pub fn reserve(&mut self) -> MetaId {
        self.slots.push(None);
        MetaId((self.slots.len() - 1) as u32)
    }

    /// Populate a reserved slot.
    pub fn fill(&mut self, id: MetaId, meta: Meta) {
        if let Some(slot) = self.slots.get_mut(id.0 as usize) {
            *slot = Some(meta);
        }
    }

    /// Add a fully built entity.
    pub fn insert(&mut self, meta: Meta) -> MetaId {
        self.slots.push(Some(meta));
        MetaId((self.slots.len() - 1) as u32)
    }

    pub fn get(&self, id: MetaId) -> Option<&Meta> {
        self.slots.get(id.0 as usize).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: MetaId) -> Option<&mut Meta> {
        self.slots.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    /// Bridge name of an entity, empty for vacant slots.
    pub fn bridge_name(&self, id: MetaId) -> &str {
        self.get(id).map_or("", |meta| meta.bridge_name.as_str())
    }

    /// Populated entities in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (MetaId, &Meta)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|meta| (MetaId(i as u32), meta)))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn add_type(&mut self, ty: Type) -> TypeIdx {
        self.types.push(ty);
        TypeIdx((self.types.len() - 1) as u32)
    }

    pub fn ty(&self, idx: TypeIdx) -> Option<&Type> {
        self.types.get(idx.0 as usize)
    }

    pub fn types(&self) -> &[Type] {
        &self.types
    }

    /// Serializable view of the entities reachable from `modules`.
    pub fn dump<'a>(&'a self, modules: &'a BTreeMap<String, Vec<MetaId>>) -> GraphDump<'a> {
        let mut seen_metas = BTreeSet::new();
        let mut seen_types = BTreeSet::new();
        let mut pending: Vec<MetaId> = modules.values().flatten().copied().collect();
        let mut pending_types = Vec::new();

        while !pending.is_empty() || !pending_types.is_empty() {
            while let Some(idx) = pending_types.pop() {
                if !seen_types.insert(idx) {
                    continue;
                }
                if let Some(ty) = self.ty(idx) {
                    type_edges(ty, &mut pending, &mut pending_types);
                }
            }
            if let Some(id) = pending.pop() {
                if !seen_metas.insert(id) {
                    continue;
                }
                if let Some(meta) = self.get(id) {
                    meta_edges(meta, &mut pending, &mut pending_types);
                }
            }
        }

        GraphDump {
            modules,
            entities: seen_metas
                .into_iter()
                .filter_map(|id| self.get(id).map(|meta| (id, meta)))
                .collect(),
            types: seen_types
                .into_iter()
                .filter_map(|idx| self.ty(idx).map(|ty| (idx, ty)))
                .collect(),
        }
    }
}

fn meta_edges(meta: &Meta, metas: &mut Vec<MetaId>, types: &mut Vec<TypeIdx>) {
    if let Some(members) = meta.members() {
        metas.extend(members.all_members());
        metas.extend(&members.protocols);
    }
    match &meta.detail {
        MetaDetail::Struct(record) => types.extend(record.fields.iter().map(|f| f.ty)),
        MetaDetail::Function(function) => types.extend(&function.signature),
        MetaDetail::Var(var) => types.push(var.ty),
        MetaDetail::Interface(interface) => metas.extend(interface.base),
        MetaDetail::Category(category) => metas.push(category.extended_interface),
        MetaDetail::Method(method) => types.extend(&method.signature),
        MetaDetail::Property(property) => {
            metas.extend(property.getter);
            metas.extend(property.setter);
        }
        MetaDetail::Enum(_) | MetaDetail::Protocol(_) | MetaDetail::EnumConstant(_) => {}
    }
}

fn type_edges(ty: &Type, metas: &mut Vec<MetaId>, types: &mut Vec<TypeIdx>) {
    match ty {
        Type::Id { protocols } => metas.extend(protocols),
        Type::Interface {
            interface,
            protocols,
            type_arguments,
        } => {
            metas.push(*interface);
            metas.extend(protocols);
            types.extend(type_arguments);
        }
        Type::Pointer { pointee } => types.push(*pointee),
        Type::Block { signature } | Type::FunctionPointer { signature } => {
            types.extend(signature);
        }
        Type::ConstantArray { element, .. } | Type::IncompleteArray { element } => {
            types.push(*element);
        }
        Type::Struct { meta } | Type::Enum { meta } => metas.push(*meta),
        _ => {}
    }
}

/// Debug dump of a finalized graph.
#[derive(Debug, Serialize)]
pub struct GraphDump<'a> {
    pub modules: &'a BTreeMap<String, Vec<MetaId>>,
    pub entities: BTreeMap<MetaId, &'a Meta>,
    pub types: BTreeMap<TypeIdx, &'a Type>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::meta::{FunctionMeta, InterfaceMeta, MethodMeta};

    #[test]
    fn test_reserve_then_fill() {
        let mut graph = MetaGraph::new();
        let id = graph.reserve();
        assert!(graph.get(id).is_none());
        assert!(graph.is_empty());

        graph.fill(id, Meta::new("f", "M", MetaDetail::Function(FunctionMeta::default())));
        assert_eq!(graph.get(id).unwrap().name, "f");
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.bridge_name(id), "f");
    }

    #[test]
    fn test_dump_follows_members_and_types() {
        let mut graph = MetaGraph::new();
        let void = graph.add_type(Type::Void);
        let method = graph.insert(Meta::new(
            "run",
            "M",
            MetaDetail::Method(MethodMeta {
                signature: vec![void],
                constructor_tokens: Vec::new(),
            }),
        ));
        let mut interface = InterfaceMeta::default();
        interface.members.instance_methods.push(method);
        let root = graph.insert(Meta::new("Runner", "M", MetaDetail::Interface(interface)));
        let orphan = graph.insert(Meta::new("g", "M", MetaDetail::Function(FunctionMeta::default())));

        let modules = BTreeMap::from([("M".to_string(), vec![root])]);
        let dump = graph.dump(&modules);
        assert!(dump.entities.contains_key(&root));
        assert!(dump.entities.contains_key(&method));
        assert!(!dump.entities.contains_key(&orphan));
        assert!(dump.types.contains_key(&void));
    }
}

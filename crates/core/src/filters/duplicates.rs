//! Duplicate member removal.

use std::collections::HashSet;

use super::{GraphFilter, edit_members};
use crate::meta::{MetaDetail, MetaGraph, MetaId, MetaKind, Type};
use crate::pipeline::PipelineReport;

/// Identity of a member for duplicate detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MemberKey {
    kind: MetaKind,
    name: String,
    is_static: bool,
    signature: Vec<Type>,
}

fn member_key(graph: &MetaGraph, id: MetaId) -> Option<MemberKey> {
    let meta = graph.get(id)?;
    let signature_of = |method: MetaId| -> Vec<Type> {
        graph
            .get(method)
            .and_then(|m| m.as_method())
            .map(|m| m.signature.iter().filter_map(|t| graph.ty(*t).cloned()).collect())
            .unwrap_or_default()
    };
    let signature = match &meta.detail {
        MetaDetail::Method(_) => signature_of(id),
        MetaDetail::Property(p) => p.getter.map(signature_of).unwrap_or_default(),
        _ => Vec::new(),
    };
    Some(MemberKey {
        kind: meta.kind(),
        name: meta.name.clone(),
        is_static: meta.is_static(),
        signature,
    })
}

/// Removes repeated members of a container and interface members that are
/// identical to a member inherited from the base chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveDuplicateMembers;

impl GraphFilter for RemoveDuplicateMembers {
    fn name(&self) -> &'static str {
        "duplicate member removal"
    }

    fn apply(&self, graph: &mut MetaGraph, entities: &mut Vec<MetaId>, report: &mut PipelineReport) {
        for &id in entities.iter() {
            let inherited = inherited_keys(graph, id);
            let mut removed = 0;
            edit_members(graph, id, |graph, members| {
                for list in members.member_lists_mut() {
                    let before = list.len();
                    let mut seen = HashSet::new();
                    list.retain(|member| {
                        let Some(meta) = graph.get(*member) else {
                            return false;
                        };
                        if !seen.insert((meta.name.clone(), meta.is_static())) {
                            return false;
                        }
                        member_key(graph, *member).is_none_or(|key| !inherited.contains(&key))
                    });
                    removed += before - list.len();
                }
            });
            report.removed_members += removed;
        }
    }
}

/// Member keys of every interface above `id` in its base chain.
fn inherited_keys(graph: &MetaGraph, id: MetaId) -> HashSet<MemberKey> {
    let mut keys = HashSet::new();
    let mut visited = HashSet::from([id]);
    let mut current = graph.get(id).and_then(|m| m.as_interface()).and_then(|i| i.base);
    while let Some(base) = current {
        if !visited.insert(base) {
            break;
        }
        let Some(meta) = graph.get(base) else {
            break;
        };
        if let Some(members) = meta.members() {
            keys.extend(members.all_members().filter_map(|m| member_key(graph, m)));
        }
        current = meta.as_interface().and_then(|i| i.base);
    }
    keys
}

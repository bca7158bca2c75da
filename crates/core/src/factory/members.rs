//! Member gathering for interfaces, protocols and categories.

use tracing::{debug, warn};

use super::MetaFactory;
use crate::meta::{MetaGraph, MetaId, MetaKind, Members};
use crate::source::{Decl, DeclId};

impl MetaFactory<'_> {
    /// Create the conformed protocols, methods and properties of a container.
    ///
    /// Members that fail to build are dropped. Each member list is sorted
    /// case-insensitively by bridge name.
    pub(super) fn gather_members(&mut self, container: &Decl, owner: &str) -> Members {
        let mut members = Members::default();
        let Some(decls) = container.body.container() else {
            return members;
        };

        for &protocol in decls.protocols {
            if let Some(id) = self.member(container, protocol, "")
                && self.graph.get(id).is_none_or(|m| m.kind() == MetaKind::Protocol)
            {
                members.protocols.push(id);
            }
        }
        for &method in decls.methods {
            if let Some(id) = self.member(container, method, owner) {
                if self.is_static(id) {
                    members.static_methods.push(id);
                } else {
                    members.instance_methods.push(id);
                }
            }
        }
        for &property in decls.properties {
            if let Some(id) = self.member(container, property, owner) {
                if self.is_static(id) {
                    members.static_properties.push(id);
                } else {
                    members.instance_properties.push(id);
                }
            }
        }

        sort_members(&self.graph, &mut members);
        members
    }

    fn member(&mut self, container: &Decl, decl: DeclId, owner: &str) -> Option<MetaId> {
        match self.create_with(decl, false, owner) {
            Ok(id) => Some(id),
            Err(err) if err.is_skip() => {
                debug!(container = %container.name, member = decl.0, reason = %err, "Dropped member.");
                None
            }
            Err(err) => {
                warn!(
                    container = %container.name,
                    member = decl.0,
                    chain = ?err.chain(),
                    "Dropped member."
                );
                None
            }
        }
    }

    fn is_static(&self, id: MetaId) -> bool {
        self.graph.get(id).is_some_and(|m| m.is_static())
    }
}

/// Sort the four member lists by lowercase bridge name.
pub(crate) fn sort_members(graph: &MetaGraph, members: &mut Members) {
    for list in members.member_lists_mut() {
        sort_by_bridge_name(graph, list);
    }
}

pub(crate) fn sort_by_bridge_name(graph: &MetaGraph, list: &mut [MetaId]) {
    list.sort_by_cached_key(|id| graph.bridge_name(*id).to_lowercase());
}

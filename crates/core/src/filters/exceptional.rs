//! Declarations that need special casing before any other pass.

use std::collections::HashSet;

use tracing::debug;

use super::{GraphFilter, edit_members};
use crate::meta::{MetaGraph, MetaId, MetaKind};
use crate::pipeline::PipelineReport;

/// Manual memory-management selectors that bridges must never expose.
const MEMORY_MANAGEMENT_SELECTORS: [&str; 5] =
    ["retain", "release", "autorelease", "retainCount", "dealloc"];

/// Drops memory-management methods and renames protocols that share their
/// native name with an interface of the same top-level module.
#[derive(Debug, Clone, Copy, Default)]
pub struct HandleExceptionalDecls;

impl GraphFilter for HandleExceptionalDecls {
    fn name(&self) -> &'static str {
        "exceptional declarations"
    }

    fn apply(&self, graph: &mut MetaGraph, entities: &mut Vec<MetaId>, report: &mut PipelineReport) {
        for &id in entities.iter() {
            let mut removed = 0;
            edit_members(graph, id, |graph, members| {
                for list in [&mut members.instance_methods, &mut members.static_methods] {
                    let before = list.len();
                    list.retain(|m| {
                        graph
                            .get(*m)
                            .is_none_or(|meta| !MEMORY_MANAGEMENT_SELECTORS.contains(&meta.name.as_str()))
                    });
                    removed += before - list.len();
                }
            });
            report.removed_members += removed;
        }

        let interfaces: HashSet<(String, String)> = entities
            .iter()
            .filter_map(|id| graph.get(*id))
            .filter(|meta| meta.kind() == MetaKind::Interface)
            .map(|meta| (meta.top_module().to_string(), meta.name.clone()))
            .collect();

        for &id in entities.iter() {
            let Some(meta) = graph.get_mut(id) else {
                continue;
            };
            if meta.kind() != MetaKind::Protocol
                || !interfaces.contains(&(meta.top_module().to_string(), meta.name.clone()))
            {
                continue;
            }
            meta.bridge_name = format!("{}Protocol", meta.name);
            meta.is_renamed = true;
            report.renamed += 1;
            debug!(
                protocol = %meta.name,
                bridge_name = %meta.bridge_name,
                "Renamed protocol shadowed by interface."
            );
        }
    }
}

//! Folds categories into the interfaces they extend.

use tracing::debug;

use super::{GraphFilter, edit_members};
use crate::factory::sort_members;
use crate::meta::{MetaDetail, MetaGraph, MetaId};
use crate::pipeline::PipelineReport;

/// Appends each category's protocols and members to its extended interface
/// and removes the category from the entity list.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeCategories;

impl GraphFilter for MergeCategories {
    fn name(&self) -> &'static str {
        "category merging"
    }

    fn apply(&self, graph: &mut MetaGraph, entities: &mut Vec<MetaId>, report: &mut PipelineReport) {
        let mut kept = Vec::with_capacity(entities.len());
        for &id in entities.iter() {
            let Some(MetaDetail::Category(category)) = graph.get(id).map(|meta| &meta.detail) else {
                kept.push(id);
                continue;
            };
            let extended = category.extended_interface;
            let additions = category.members.clone();

            let merged = edit_members(graph, extended, |graph, members| {
                for protocol in additions.protocols {
                    if !members.protocols.contains(&protocol) {
                        members.protocols.push(protocol);
                    }
                }
                members.instance_methods.extend(additions.instance_methods);
                members.static_methods.extend(additions.static_methods);
                members.instance_properties.extend(additions.instance_properties);
                members.static_properties.extend(additions.static_properties);
                sort_members(graph, members);
            });

            if merged {
                report.merged_categories += 1;
                debug!(
                    category = %graph.get(id).map_or("", |m| m.name.as_str()),
                    interface = %graph.bridge_name(extended),
                    "Merged category."
                );
            }
        }
        *entities = kept;
    }
}

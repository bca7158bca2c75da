//! Method/property name shadowing across the inheritance hierarchy.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info};

use super::{GraphFilter, edit_members};
use crate::factory::sort_by_bridge_name;
use crate::meta::{Meta, MetaDetail, MetaFlags, MetaGraph, MetaId, MetaKind, PropertyMeta};
use crate::pipeline::{MethodCollision, PipelineReport};

/// Keeps the hierarchy property-shaped.
///
/// For every interface:
/// - an instance property whose accessor the superclass or a conformed
///   protocol only declares as a bare method gets a property synthesized on
///   that ancestor, wrapping the method;
/// - a class method already exposed by an ancestor's class property
///   accessor is removed from the subclass;
/// - instance methods sharing bridge name and arity are reported.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveShadowing;

impl GraphFilter for ResolveShadowing {
    fn name(&self) -> &'static str {
        "name shadowing"
    }

    fn apply(&self, graph: &mut MetaGraph, entities: &mut Vec<MetaId>, report: &mut PipelineReport) {
        for &id in entities.iter() {
            if graph.get(id).is_none_or(|m| m.kind() != MetaKind::Interface) {
                continue;
            }
            synthesize_ancestor_properties(graph, id, report);
            remove_shadowed_static_methods(graph, id, report);
            detect_method_collisions(graph, id, report);
        }
    }
}

/// Getter and setter selectors of a property.
fn accessor_selectors(graph: &MetaGraph, property: MetaId) -> Option<(String, String)> {
    let meta = graph.get(property)?;
    let detail = meta.as_property()?;
    let getter = detail
        .getter
        .and_then(|g| graph.get(g))
        .map_or_else(|| meta.name.clone(), |g| g.name.clone());
    let setter = detail.setter.and_then(|s| graph.get(s)).map_or_else(
        || {
            let mut chars = meta.name.chars();
            let capitalized: String = chars
                .next()
                .map(|c| c.to_ascii_uppercase())
                .into_iter()
                .chain(chars)
                .collect();
            format!("set{capitalized}:")
        },
        |s| s.name.clone(),
    );
    Some((getter, setter))
}

fn synthesize_ancestor_properties(graph: &mut MetaGraph, id: MetaId, report: &mut PipelineReport) {
    let Some(meta) = graph.get(id) else {
        return;
    };
    let Some(members) = meta.members() else {
        return;
    };
    let mut ancestors: Vec<MetaId> = meta.as_interface().and_then(|i| i.base).into_iter().collect();
    ancestors.extend(&members.protocols);
    let properties = members.instance_properties.clone();

    for property in properties {
        let Some((getter_sel, setter_sel)) = accessor_selectors(graph, property) else {
            continue;
        };
        let Some(template) = graph.get(property).cloned() else {
            continue;
        };

        for &ancestor in &ancestors {
            let Some(ancestor_meta) = graph.get(ancestor) else {
                continue;
            };
            let Some(ancestor_members) = ancestor_meta.members() else {
                continue;
            };
            if ancestor_members
                .instance_properties
                .iter()
                .any(|p| graph.get(*p).is_some_and(|p| p.name == template.name))
            {
                continue;
            }

            let bare = |selector: &str| {
                ancestor_members.instance_methods.iter().copied().find(|m| {
                    graph.get(*m).is_some_and(|m| {
                        m.name == selector && !m.flags.contains(MetaFlags::PROPERTY_ACCESSOR)
                    })
                })
            };
            let getter = bare(&getter_sel);
            let setter = bare(&setter_sel);
            if getter.is_none() && setter.is_none() {
                continue;
            }

            let module = ancestor_meta.module.clone();
            let ancestor_name = ancestor_meta.name.clone();
            let optional = [getter, setter]
                .into_iter()
                .flatten()
                .any(|m| graph.get(m).is_some_and(|m| m.flags.contains(MetaFlags::OPTIONAL)));

            for accessor in [getter, setter].into_iter().flatten() {
                if let Some(method) = graph.get_mut(accessor) {
                    method.flags |= MetaFlags::PROPERTY_ACCESSOR;
                }
            }

            let mut synthesized = Meta::new(
                template.name.as_str(),
                module,
                MetaDetail::Property(PropertyMeta { getter, setter }),
            );
            synthesized.bridge_name.clone_from(&template.bridge_name);
            synthesized.is_renamed = template.is_renamed;
            synthesized.flags.set(MetaFlags::OPTIONAL, optional);
            let synthesized = graph.insert(synthesized);

            edit_members(graph, ancestor, |graph, members| {
                members
                    .instance_methods
                    .retain(|m| Some(*m) != getter && Some(*m) != setter);
                members.instance_properties.push(synthesized);
                sort_by_bridge_name(graph, &mut members.instance_properties);
            });
            report.synthesized_properties += 1;
            debug!(
                ancestor = %ancestor_name,
                property = %template.name,
                "Synthesized property over accessor method."
            );
        }
    }
}

fn remove_shadowed_static_methods(graph: &mut MetaGraph, id: MetaId, report: &mut PipelineReport) {
    let mut inherited_accessors = HashSet::new();
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
            for &property in &members.static_properties {
                if let Some((getter, setter)) = accessor_selectors(graph, property) {
                    inherited_accessors.insert(getter);
                    inherited_accessors.insert(setter);
                }
            }
        }
        current = meta.as_interface().and_then(|i| i.base);
    }
    if inherited_accessors.is_empty() {
        return;
    }

    let mut removed = 0;
    edit_members(graph, id, |graph, members| {
        let before = members.static_methods.len();
        members
            .static_methods
            .retain(|m| graph.get(*m).is_none_or(|m| !inherited_accessors.contains(&m.name)));
        removed = before - members.static_methods.len();
    });
    report.removed_members += removed;
}

fn detect_method_collisions(graph: &MetaGraph, id: MetaId, report: &mut PipelineReport) {
    let Some(meta) = graph.get(id) else {
        return;
    };
    let Some(members) = meta.members() else {
        return;
    };

    let mut buckets: BTreeMap<(String, usize), Vec<String>> = BTreeMap::new();
    for &method in &members.instance_methods {
        let Some(method_meta) = graph.get(method) else {
            continue;
        };
        let arity = method_meta
            .as_method()
            .map_or(0, |m| m.signature.len().saturating_sub(1));
        buckets
            .entry((method_meta.bridge_name.clone(), arity))
            .or_default()
            .push(method_meta.name.clone());
    }

    for ((bridge_name, arity), selectors) in buckets {
        if selectors.len() < 2 {
            continue;
        }
        info!(
            interface = %meta.name,
            bridge_name = %bridge_name,
            arity,
            ?selectors,
            "Methods share a bridge name and arity."
        );
        report.method_collisions.push(MethodCollision {
            container: meta.name.clone(),
            bridge_name,
            arity,
            selectors,
        });
    }
}

//! Global bridge-name collision resolution.
//!
//! Entities are bucketed by `(top-level module, bridge name)`. In each bucket
//! with more than one entity the highest ranked kind keeps the name and the
//! others get a kind suffix plus, when needed, a numeric disambiguator.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::GraphFilter;
use crate::meta::{MetaGraph, MetaId, MetaKind};
use crate::pipeline::PipelineReport;

/// Lower ranks keep their name.
pub fn kind_rank(kind: MetaKind) -> u8 {
    match kind {
        MetaKind::Interface => 0,
        MetaKind::Protocol => 1,
        MetaKind::Function => 2,
        MetaKind::Var => 3,
        MetaKind::Struct => 4,
        MetaKind::Union => 5,
        MetaKind::Enum => 6,
        MetaKind::EnumConstant => 7,
        MetaKind::Category | MetaKind::Method | MetaKind::Property => 8,
    }
}

/// Token appended to a renamed entity's bridge name.
pub fn kind_suffix(kind: MetaKind) -> &'static str {
    match kind {
        MetaKind::Interface => "Interface",
        MetaKind::Protocol => "Protocol",
        MetaKind::Function => "Function",
        MetaKind::Var => "Var",
        MetaKind::Struct => "Struct",
        MetaKind::Union => "Union",
        MetaKind::Enum => "Enum",
        MetaKind::Method => "Method",
        MetaKind::EnumConstant | MetaKind::Category | MetaKind::Property => "Decl",
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveCollisions;

impl GraphFilter for ResolveCollisions {
    fn name(&self) -> &'static str {
        "name collisions"
    }

    fn apply(&self, graph: &mut MetaGraph, entities: &mut Vec<MetaId>, report: &mut PipelineReport) {
        let mut order: Vec<(String, String)> = Vec::new();
        let mut buckets: HashMap<(String, String), Vec<MetaId>> = HashMap::new();
        let mut names: HashMap<String, HashSet<String>> = HashMap::new();

        for &id in entities.iter() {
            let Some(meta) = graph.get(id) else {
                continue;
            };
            let module = meta.top_module().to_string();
            let key = (module.clone(), meta.bridge_name.clone());
            names.entry(module).or_default().insert(meta.bridge_name.clone());
            let bucket = buckets.entry(key.clone()).or_default();
            if bucket.is_empty() {
                order.push(key);
            }
            bucket.push(id);
        }

        let mut queued = Vec::new();
        for key in &order {
            let Some(bucket) = buckets.get_mut(key) else {
                continue;
            };
            if bucket.len() < 2 {
                continue;
            }
            bucket.sort_by_key(|id| graph.get(*id).map_or(u8::MAX, |m| kind_rank(m.kind())));
            queued.extend(bucket.iter().skip(1).map(|id| (key.0.clone(), *id)));
        }

        for (module, id) in queued {
            let Some(meta) = graph.get_mut(id) else {
                continue;
            };
            let table = names.entry(module).or_default();
            let stem = format!("{}{}", meta.bridge_name, kind_suffix(meta.kind()));
            let mut disambiguator = 1u32;
            let candidate = loop {
                let candidate = if disambiguator == 1 {
                    stem.clone()
                } else {
                    format!("{stem}{disambiguator}")
                };
                if table.insert(candidate.clone()) {
                    break candidate;
                }
                disambiguator += 1;
            };
            debug!(
                from = %meta.bridge_name,
                to = %candidate,
                kind = meta.kind().as_str(),
                "Resolved name collision."
            );
            meta.bridge_name = candidate;
            meta.is_renamed = true;
            report.renamed += 1;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::filters::testing;
    use crate::meta::{FunctionMeta, Meta, MetaDetail, Members, RecordMeta};

    fn function(graph: &mut MetaGraph, name: &str, module: &str) -> MetaId {
        graph.insert(Meta::new(name, module, MetaDetail::Function(FunctionMeta::default())))
    }

    fn record(graph: &mut MetaGraph, name: &str, module: &str) -> MetaId {
        graph.insert(Meta::new(name, module, MetaDetail::Struct(RecordMeta::default())))
    }

    #[test]
    fn test_two_interfaces_named_widget() {
        let mut graph = MetaGraph::new();
        let first = testing::interface(&mut graph, "Widget", "UIKit.A", Members::default(), None);
        let second = testing::interface(&mut graph, "Widget", "UIKit.B", Members::default(), None);
        let mut entities = vec![first, second];
        let mut report = PipelineReport::default();

        ResolveCollisions.apply(&mut graph, &mut entities, &mut report);

        assert_eq!(graph.bridge_name(first), "Widget");
        assert_eq!(graph.bridge_name(second), "WidgetInterface");
        assert!(graph.get(second).unwrap().is_renamed);
        assert_eq!(report.renamed, 1);
    }

    #[test]
    fn test_rank_decides_winner() {
        let mut graph = MetaGraph::new();
        let rect = record(&mut graph, "Frame", "Kit");
        let make_frame = function(&mut graph, "Frame", "Kit");
        let class = testing::interface(&mut graph, "Frame", "Kit", Members::default(), None);
        let mut entities = vec![rect, make_frame, class];
        let mut report = PipelineReport::default();

        ResolveCollisions.apply(&mut graph, &mut entities, &mut report);

        assert_eq!(graph.bridge_name(class), "Frame");
        assert_eq!(graph.bridge_name(make_frame), "FrameFunction");
        assert_eq!(graph.bridge_name(rect), "FrameStruct");
    }

    #[test]
    fn test_numeric_disambiguator_when_candidate_taken() {
        let mut graph = MetaGraph::new();
        let taken = function(&mut graph, "PointStruct", "Kit");
        let winner = testing::interface(&mut graph, "Point", "Kit", Members::default(), None);
        let a = record(&mut graph, "Point", "Kit");
        let b = record(&mut graph, "Point", "Kit");
        let mut entities = vec![taken, winner, a, b];
        let mut report = PipelineReport::default();

        ResolveCollisions.apply(&mut graph, &mut entities, &mut report);

        assert_eq!(graph.bridge_name(taken), "PointStruct");
        assert_eq!(graph.bridge_name(a), "PointStruct2");
        assert_eq!(graph.bridge_name(b), "PointStruct3");
    }

    #[test]
    fn test_modules_are_independent() {
        let mut graph = MetaGraph::new();
        let a = function(&mut graph, "run", "Alpha");
        let b = function(&mut graph, "run", "Beta.Sub");
        let mut entities = vec![a, b];
        let mut report = PipelineReport::default();

        ResolveCollisions.apply(&mut graph, &mut entities, &mut report);

        assert_eq!(graph.bridge_name(a), "run");
        assert_eq!(graph.bridge_name(b), "run");
        assert_eq!(report.renamed, 0);
    }

    #[test]
    fn test_suffixes() {
        assert_eq!(kind_suffix(MetaKind::Method), "Method");
        assert_eq!(kind_suffix(MetaKind::EnumConstant), "Decl");
        assert!(kind_rank(MetaKind::Interface) < kind_rank(MetaKind::Protocol));
        assert!(kind_rank(MetaKind::Enum) < kind_rank(MetaKind::EnumConstant));
    }
}

//! Batch driver: ingestion, normalization and module partition.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::context::ResolutionContext;
use crate::factory::{FactoryStats, MetaFactory};
use crate::filters::default_filters;
use crate::meta::{GraphDump, Meta, MetaGraph, MetaId};
use crate::source::TranslationUnit;

/// A declaration that failed with an error (not a skip).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub decl: String,
    pub module: String,
    /// Outermost failure first.
    pub chain: Vec<String>,
}

/// Instance methods of one interface sharing bridge name and arity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodCollision {
    pub container: String,
    pub bridge_name: String,
    pub arity: usize,
    pub selectors: Vec<String>,
}

/// What happened during a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Declarations rejected by the inclusion policy.
    pub excluded: usize,
    pub errors: Vec<FailureRecord>,
    pub removed_members: usize,
    pub merged_categories: usize,
    pub synthesized_properties: usize,
    pub method_collisions: Vec<MethodCollision>,
    pub renamed: usize,
    pub factory: FactoryStats,
}

/// Entities partitioned by top-level module, ready for emitters.
#[derive(Debug)]
pub struct FinalizedGraph {
    pub graph: MetaGraph,
    /// Top-level module to entities, in ingestion order.
    pub modules: BTreeMap<String, Vec<MetaId>>,
}

impl FinalizedGraph {
    /// Entities of one top-level module.
    pub fn module(&self, name: &str) -> impl Iterator<Item = (MetaId, &Meta)> + '_ {
        self.modules
            .get(name)
            .into_iter()
            .flatten()
            .filter_map(|id| self.graph.get(*id).map(|meta| (*id, meta)))
    }

    /// Entity of `module` with the given bridge name.
    pub fn find(&self, module: &str, bridge_name: &str) -> Option<(MetaId, &Meta)> {
        self.module(module).find(|(_, meta)| meta.bridge_name == bridge_name)
    }

    /// Check that no two entities of a module share a bridge name.
    pub fn verify_unique_names(&self) -> Result<(), String> {
        for (module, ids) in &self.modules {
            let mut seen: HashMap<&str, MetaId> = HashMap::new();
            for id in ids {
                let name = self.graph.bridge_name(*id);
                if let Some(previous) = seen.insert(name, *id) {
                    return Err(format!(
                        "Module {module} has duplicate bridge name '{name}' (entities {} and {})",
                        previous.0, id.0
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn dump(&self) -> GraphDump<'_> {
        self.graph.dump(&self.modules)
    }
}

/// Build the finalized graph for one translation unit.
///
/// Failures are isolated per declaration: skips are counted, errors are
/// logged with their chain and recorded in the report.
pub fn build_graph(unit: &TranslationUnit, ctx: &ResolutionContext) -> (FinalizedGraph, PipelineReport) {
    let mut report = PipelineReport::default();
    let mut factory = MetaFactory::new(unit, ctx);
    let mut entities = Vec::new();

    for decl_id in unit.top_level() {
        let Some(decl) = unit.decl(decl_id) else {
            continue;
        };
        let decision = ctx.policy.decide(&decl.module, &decl.name);
        if !decision.included {
            report.excluded += 1;
            debug!(
                decl = %decl.name,
                module = %decl.module,
                provenance = decision.provenance.as_deref().unwrap_or(""),
                "Excluded declaration."
            );
            continue;
        }

        match factory.create(decl_id) {
            Ok(id) => {
                report.created += 1;
                entities.push(id);
            }
            Err(err) if err.is_skip() => {
                report.skipped += 1;
                debug!(decl = %decl.name, reason = %err, "Skipped declaration.");
            }
            Err(err) => {
                report.failed += 1;
                let chain = err.chain();
                warn!(decl = %decl.name, module = %decl.module, ?chain, "Failed to create entity.");
                report.errors.push(FailureRecord {
                    decl: decl.name.clone(),
                    module: decl.module.clone(),
                    chain,
                });
            }
        }
    }

    report.factory = factory.stats();
    let mut graph = factory.into_graph();

    for filter in default_filters() {
        filter.apply(&mut graph, &mut entities, &mut report);
        debug!(filter = filter.name(), entities = entities.len(), "Applied filter.");
    }

    let mut modules: BTreeMap<String, Vec<MetaId>> = BTreeMap::new();
    for id in entities {
        if let Some(meta) = graph.get(id) {
            modules.entry(meta.top_module().to_string()).or_default().push(id);
        }
    }

    info!(
        created = report.created,
        skipped = report.skipped,
        failed = report.failed,
        excluded = report.excluded,
        modules = modules.len(),
        renamed = report.renamed,
        "Built metadata graph."
    );

    (FinalizedGraph { graph, modules }, report)
}

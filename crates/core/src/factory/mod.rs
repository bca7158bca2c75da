//! Declaration to entity conversion.
//!
//! `MetaFactory::create` is the only way entities enter the graph. Every
//! declaration is built at most once per run: the cache maps a `DeclId` to
//! the entity id or to the failure it produced. The slot is reserved before
//! dependencies are resolved, so a request for an entity that is still being
//! built (a method returning its own class, a self-referential struct)
//! receives the reserved id instead of recursing.
//!
//! When a build fails, every entity and type resolved while it was running
//! is forgotten, since any of them may refer to the failed slot. Later
//! requests rebuild them and see the recorded failure.

mod decls;
mod enums;
mod members;
mod types;

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, trace};

use crate::context::ResolutionContext;
use crate::error::{CreationError, CreationResult};
use crate::meta::{MetaGraph, MetaId, TypeIdx};
use crate::source::{DeclId, ForeignTypeId, TranslationUnit};

pub use enums::{common_prefix, integer_value};
pub(crate) use members::{sort_by_bridge_name, sort_members};

#[derive(Debug, Clone)]
enum CacheEntry {
    Ready(MetaId),
    Failed(CreationError),
}

/// Counters for one factory run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FactoryStats {
    /// Kind-specific construction routines executed.
    pub constructions: usize,
    /// Requests answered from the cache, successes and failures alike.
    pub cache_hits: usize,
    /// Constructions that failed.
    pub failures: usize,
}

/// Builds entities from one translation unit into a `MetaGraph`.
#[derive(Debug)]
pub struct MetaFactory<'a> {
    unit: &'a TranslationUnit,
    ctx: &'a ResolutionContext,
    graph: MetaGraph,
    cache: HashMap<DeclId, CacheEntry>,
    type_cache: HashMap<ForeignTypeId, TypeIdx>,
    /// Declarations and types cached so far, in insertion order.
    decl_log: Vec<DeclId>,
    type_log: Vec<ForeignTypeId>,
    /// Types being converted within the current declaration build.
    resolving: HashSet<ForeignTypeId>,
    stats: FactoryStats,
}

impl<'a> MetaFactory<'a> {
    pub fn new(unit: &'a TranslationUnit, ctx: &'a ResolutionContext) -> Self {
        Self {
            unit,
            ctx,
            graph: MetaGraph::new(),
            cache: HashMap::new(),
            type_cache: HashMap::new(),
            decl_log: Vec::new(),
            type_log: Vec::new(),
            resolving: HashSet::new(),
            stats: FactoryStats::default(),
        }
    }

    /// Create (or fetch) the entity for `decl`.
    pub fn create(&mut self, decl: DeclId) -> CreationResult<MetaId> {
        self.create_with(decl, false, "")
    }

    /// Create the entity for `decl`.
    ///
    /// Without `reset_cached`, a cached entity id or cached failure is
    /// returned as is. With it, the declaration is rebuilt into a new slot.
    /// `context_name` is the owning container's native name, used as the
    /// owner key for rename lookups of members.
    pub fn create_with(
        &mut self,
        decl: DeclId,
        reset_cached: bool,
        context_name: &str,
    ) -> CreationResult<MetaId> {
        if !reset_cached && let Some(entry) = self.cache.get(&decl) {
            self.stats.cache_hits += 1;
            trace!(decl = decl.0, "Cache hit.");
            return match entry {
                CacheEntry::Ready(id) => Ok(*id),
                CacheEntry::Failed(err) => Err(err.clone()),
            };
        }

        let unit = self.unit;
        let source = unit
            .decl(decl)
            .ok_or_else(|| CreationError::invalid(format!("dangling declaration id {}", decl.0)))?;

        let decl_mark = self.decl_log.len();
        let type_mark = self.type_log.len();
        let slot = self.graph.reserve();
        self.cache.insert(decl, CacheEntry::Ready(slot));
        self.decl_log.push(decl);
        self.stats.constructions += 1;

        let outer = std::mem::take(&mut self.resolving);
        let built = self.build(decl, source, context_name);
        self.resolving = outer;

        match built {
            Ok(meta) => {
                debug!(
                    decl = %source.name,
                    kind = meta.kind().as_str(),
                    bridge_name = %meta.bridge_name,
                    "Created entity."
                );
                self.graph.fill(slot, meta);
                Ok(slot)
            }
            Err(err) => {
                self.stats.failures += 1;
                self.forget_since(decl_mark, type_mark);
                self.cache.insert(decl, CacheEntry::Failed(err.clone()));
                Err(err)
            }
        }
    }

    /// Drop cached successes and types recorded after the marks. Cached
    /// failures stay.
    fn forget_since(&mut self, decl_mark: usize, type_mark: usize) {
        for id in self.type_log.drain(type_mark..) {
            self.type_cache.remove(&id);
        }
        for decl in self.decl_log.drain(decl_mark..) {
            if let Some(CacheEntry::Ready(stale)) = self.cache.get(&decl) {
                trace!(
                    decl = decl.0,
                    slot = stale.0,
                    "Forgetting entity built under a failure."
                );
                self.cache.remove(&decl);
            }
        }
    }

    /// Create a dependency, wrapping its failure as a failure of the caller.
    fn dependency(&mut self, decl: DeclId, context_name: &str) -> CreationResult<MetaId> {
        self.create_with(decl, false, context_name)
            .map_err(|cause| CreationError::dependency(self.describe(decl), cause))
    }

    fn describe(&self, decl: DeclId) -> String {
        self.unit
            .decl(decl)
            .map_or_else(|| format!("#{}", decl.0), |d| format!("{} '{}'", d.kind().as_str(), d.name))
    }

    pub fn graph(&self) -> &MetaGraph {
        &self.graph
    }

    pub fn stats(&self) -> FactoryStats {
        self.stats
    }

    pub fn into_graph(self) -> MetaGraph {
        self.graph
    }
}

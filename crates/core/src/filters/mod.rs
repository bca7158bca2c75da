//! Whole-graph normalization passes.
//!
//! Filters run strictly in `default_filters` order after every declaration
//! has been ingested. Each one mutates the graph and the top-level entity
//! list in place and relies on the earlier ones having completed.

mod categories;
mod collisions;
mod duplicates;
mod exceptional;
mod shadowing;

use crate::meta::{Meta, MetaGraph, MetaId, Members};
use crate::pipeline::PipelineReport;

pub use categories::MergeCategories;
pub use collisions::{ResolveCollisions, kind_rank, kind_suffix};
pub use duplicates::RemoveDuplicateMembers;
pub use exceptional::HandleExceptionalDecls;
pub use shadowing::ResolveShadowing;

/// One normalization pass.
pub trait GraphFilter {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Transform the graph and the top-level entity list.
    fn apply(&self, graph: &mut MetaGraph, entities: &mut Vec<MetaId>, report: &mut PipelineReport);
}

/// The five passes in pipeline order.
pub fn default_filters() -> Vec<Box<dyn GraphFilter>> {
    vec![
        Box::new(HandleExceptionalDecls),
        Box::new(MergeCategories),
        Box::new(RemoveDuplicateMembers),
        Box::new(ResolveShadowing),
        Box::new(ResolveCollisions),
    ]
}

/// Run `edit` on the members of `id` with the rest of the graph readable.
///
/// The members are moved out of the entity for the duration of the call.
/// Returns false when `id` is not a populated container.
pub(crate) fn edit_members(
    graph: &mut MetaGraph,
    id: MetaId,
    edit: impl FnOnce(&MetaGraph, &mut Members),
) -> bool {
    let Some(mut members) = graph
        .get_mut(id)
        .and_then(Meta::members_mut)
        .map(std::mem::take)
    else {
        return false;
    };
    edit(graph, &mut members);
    if let Some(slot) = graph.get_mut(id).and_then(Meta::members_mut) {
        *slot = members;
    }
    true
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::context::ResolutionContext;
    use crate::meta::{
        InterfaceMeta, Meta, MetaDetail, MetaFlags, MetaGraph, MetaId, Members, MethodMeta,
        PropertyMeta, ProtocolMeta, Type,
    };
    use crate::naming;

    pub fn method(graph: &mut MetaGraph, selector: &str, flags: MetaFlags, params: usize) -> MetaId {
        let void = graph.add_type(Type::Void);
        let mut signature = vec![void];
        for _ in 0..params {
            signature.push(graph.add_type(Type::Int));
        }
        let names = naming::method_names(&ResolutionContext::default(), selector, "", false);
        let mut meta = Meta::new(
            selector,
            "",
            MetaDetail::Method(MethodMeta {
                signature,
                constructor_tokens: names.constructor_tokens,
            }),
        );
        meta.bridge_name = names.bridge_name;
        meta.argument_labels = names.argument_labels;
        meta.flags = flags;
        graph.insert(meta)
    }

    pub fn property(
        graph: &mut MetaGraph,
        name: &str,
        getter: Option<MetaId>,
        setter: Option<MetaId>,
        flags: MetaFlags,
    ) -> MetaId {
        let mut meta = Meta::new(name, "", MetaDetail::Property(PropertyMeta { getter, setter }));
        meta.flags = flags;
        graph.insert(meta)
    }

    pub fn interface(
        graph: &mut MetaGraph,
        name: &str,
        module: &str,
        members: Members,
        base: Option<MetaId>,
    ) -> MetaId {
        graph.insert(Meta::new(
            name,
            module,
            MetaDetail::Interface(InterfaceMeta {
                members,
                base,
                type_parameters: Vec::new(),
            }),
        ))
    }

    pub fn protocol(graph: &mut MetaGraph, name: &str, module: &str, members: Members) -> MetaId {
        graph.insert(Meta::new(name, module, MetaDetail::Protocol(ProtocolMeta { members })))
    }
}

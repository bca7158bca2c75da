//! Metadata graph construction for foreign-interface bridges.
//!
//! `build_graph` turns a `TranslationUnit` of foreign declarations into a
//! `FinalizedGraph`: entities created by the `MetaFactory`, normalized by the
//! filters in `filters`, and partitioned by top-level module with unique
//! bridge names per module.

pub mod availability;
pub mod context;
pub mod error;
pub mod factory;
pub mod filters;
pub mod meta;
pub mod naming;
pub mod pipeline;
pub mod policy;
pub mod source;

pub use context::ResolutionContext;
pub use error::{CreationError, CreationResult};
pub use factory::{FactoryStats, MetaFactory};
pub use meta::{Meta, MetaDetail, MetaFlags, MetaGraph, MetaId, MetaKind, Type, TypeIdx};
pub use pipeline::{FinalizedGraph, PipelineReport, build_graph};
pub use source::{DeclId, TranslationUnit};

//! # travcore
//!
//! A generic traversal engine for immutable IR trees and DAGs: inspect,
//! modify, or transform a tree through one shared driver (component D),
//! parameterized over a [`flavor::Flavor`] - [`Inspector`], [`Modifier`], or
//! [`Transform`] - rather than three independent walkers.
//!
//! ## Layout
//!
//! - [`node`] - the minimal capability a concrete IR node type provides
//!   (component's seam with the driver: kind, children, identity).
//! - [`context`] - the ancestor context stack (component A) a hook sees
//!   during descent.
//! - [`config`] - [`config::TraversalConfig`], the knobs a pass chooses
//!   before calling `apply` (visit-once default, loop policy, stack growth).
//! - [`flavor`] - the generic [`flavor::Flavor`] seam the driver is built
//!   against.
//! - [`driver`] - component D: the single recursive `apply_visitor` every
//!   flavor shares.
//! - [`change_tracker`] (component B) and [`visit_registry`] (component C) -
//!   the two memo structures backing Modifier/Transform and Inspector
//!   respectively.
//! - [`inspector`], [`modifier`], [`transform`] - the three pass-author-facing
//!   traits (component E) and their `apply` entry points.
//! - [`flow`] - the control-flow extension (component F): join-point merging
//!   and named globals, layered on Inspector only.
//! - [`adaptors`] - one-shot utility functions (component G) plus the
//!   read/write context capability.
//! - [`pass`] - pass identity, profiling, and the `Backtrack` capability a
//!   pass author exposes to the surrounding pass pipeline.
//!
//! A concrete IR crate depends on this one, implements [`node::Node`] for its
//! own node types, and writes passes against [`Inspector`], [`Modifier`], or
//! [`Transform`] - this crate never defines a node vocabulary of its own
//! (see [`node`]'s module docs for why that boundary is deliberate).

pub mod adaptors;
pub mod change_tracker;
pub mod config;
pub mod context;
pub mod driver;
pub mod fixtures;
pub mod flavor;
pub mod flow;
pub mod inspector;
pub mod modifier;
pub mod node;
pub mod pass;
pub mod transform;
pub mod visit_registry;

pub use adaptors::{for_all_matching, modify_all_matching, transform_all_matching, Access, ReadWriteContext};
pub use change_tracker::{ChangeOnceHandle, ChangeTracker};
pub use config::TraversalConfig;
pub use context::ContextFrame;
pub use driver::apply_visitor;
pub use flavor::{Consult, Descend, Flavor};
pub use flow::{ControlFlowInspector, FlowHandle, GuardGlobal};
pub use inspector::Inspector;
pub use modifier::Modifier;
pub use node::{node_ref, ChildSlot, ChildSlots, Node, NodeIdentity, NodeKind, NodeRef};
pub use pass::{Backtrack, PassIdentity, Profile};
pub use transform::{Transform, TransformHandle};
pub use visit_registry::{VisitOnceHandle, VisitRegistry};

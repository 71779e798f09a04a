//! The flavor interface (component E's shared seam) the driver (component D)
//! is generic over.
//!
//! Inspector, Modifier, and Transform differ in what `preorder`/`postorder`
//! return and in which memo they consult, but the driver's recursion shape -
//! push a context frame, consult the memo, invoke hooks, descend children,
//! record the result, pop the frame - is identical across all three. Each
//! concrete flavor module (`inspector`, `modifier`, `transform`) adapts its
//! pass-author-facing trait onto this one so `driver::apply_visitor` never
//! needs to know which flavor it is running.

use travcore_error::Result;

use crate::context::ContextFrame;
use crate::node::{NodeIdentity, NodeRef};

/// Whether the driver should descend into a node's children after `preorder`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descend {
    Continue,
    Prune,
}

/// What a flavor's memo reports about a node the driver is about to descend
/// into, folded into one shape regardless of whether the memo underneath is
/// the change tracker or the visit-once registry.
pub enum Consult {
    /// First arrival.
    Fresh,
    /// Already resolved and visit-once is in effect; return this instead of
    /// descending again.
    AlreadyVisited(NodeRef),
    /// Currently being visited - a cycle.
    Cycle,
}

/// The generic hook set the driver calls at each node, implemented once per
/// flavor as an adapter over that flavor's pass-author-facing trait.
pub trait Flavor {
    /// Ask the memo about `id` before doing any work for this node. `node`
    /// is handed back alongside `id` so an Inspector's `AlreadyVisited` case
    /// (whose recorded result is always the same identity) doesn't need its
    /// own parallel identity-to-node table.
    fn consult(&self, id: NodeIdentity, node: &NodeRef) -> Consult;

    /// Record that descent into `id` has begun.
    fn begin(&self, id: NodeIdentity);

    /// `preorder`: inspect or rebuild `node`, returning the node to carry
    /// forward and whether to descend into its children.
    fn preorder(&mut self, ctx: &ContextFrame, node: NodeRef) -> Result<(NodeRef, Descend)>;

    /// Apply the result of visiting one child back onto the (possibly
    /// rebuilt) parent, returning the parent to use from here on.
    fn apply_child_result(
        &mut self,
        ctx: &ContextFrame,
        parent: NodeRef,
        child_index: usize,
        child_result: NodeRef,
    ) -> NodeRef;

    /// `postorder`: called once all children (if any) have been visited.
    fn postorder(&mut self, ctx: &ContextFrame, node: NodeRef) -> Result<NodeRef>;

    /// Called instead of `preorder`/`postorder` on a DAG re-arrival while
    /// visit-once is off. No frame is pushed for a revisit, so the hook only
    /// sees the enclosing (parent) frame, if any.
    fn revisit(&mut self, parent_ctx: Option<&ContextFrame>, node: &NodeRef) -> Result<()>;

    /// Called on a cycle (re-arrival while the first descent is still in
    /// progress). Default policy is fatal; flavors may override.
    fn loop_revisit(
        &mut self,
        parent_ctx: Option<&ContextFrame>,
        node: &NodeRef,
    ) -> Result<NodeRef>;

    /// Record the terminal result of a completed descent into `id`.
    fn finish(&self, id: NodeIdentity, result: &NodeRef);

    /// Control-flow extension hook; `Ok(true)` means the driver should defer
    /// this node to the join-point table and return `node` unchanged without
    /// visiting it. Flavors without control flow always return `Ok(false)`.
    fn join_flows(&mut self, _ctx: Option<&ContextFrame>, _node: &NodeRef) -> Result<bool> {
        Ok(false)
    }

    /// When set, descent into children is unconditionally skipped before
    /// `preorder` runs, regardless of what `preorder` would otherwise decide.
    /// Reserved for pass styles that walk their own children manually instead
    /// of relying on the driver's automatic descent.
    fn skip_children_before_preorder(&self) -> bool {
        false
    }

    /// Whether `postorder` still fires on a node whose `preorder` pruned
    /// descent. Inspector and Modifier prune by returning `false` from
    /// `preorder`, and a pruned node's `postorder` never fires. Transform
    /// prunes via the separate `prune()` flag while `preorder` still returns a
    /// node, and its `postorder` always runs over that node regardless.
    fn postorder_runs_after_prune(&self) -> bool {
        false
    }
}

//! Component F - the control-flow extension, layered on Inspector only.
//!
//! A join point is a node with more than one incoming edge in the
//! control-flow view (found by a lightweight counting pre-pass), and a pass
//! reaching one for the n-th time stashes or merges its own state into a
//! shared table rather than visiting the node right away. The node is
//! finally visited once, on the arrival that closes out the last incoming
//! edge, using the merged state.
//!
//! Two differences from a plain [`crate::inspector::Inspector`] motivate a
//! separate trait rather than reusing its hook signatures:
//! - hooks need a [`FlowHandle`] (branch forking, named globals) instead of a
//!   bare [`crate::visit_registry::VisitOnceHandle`];
//! - the pass itself carries the per-branch analysis state that is cloned and
//!   merged, so the trait needs `flow_clone`/`flow_merge` on `Self`.
//!
//! Branching is not automatic: the generic driver has no notion of "this
//! node's children are alternative control-flow paths" - that's an IR-level
//! concept this crate leaves to the pass author. A pass that wants
//! independent state per branch calls [`FlowHandle::visit_branch`] explicitly
//! from its own `preorder`/`postorder`, the same way a
//! [`crate::transform::Transform`] pass manually drives
//! [`crate::transform::TransformHandle::transform_child`] when it wants to
//! deviate from automatic declared-order descent.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use travcore_error::{Error, Result};

use crate::config::TraversalConfig;
use crate::context::ContextFrame;
use crate::flavor::{Consult, Descend, Flavor};
use crate::node::{NodeIdentity, NodeRef};
use crate::visit_registry::{VisitLookup, VisitRegistry};

/// The hooks a pass author implements to run a branch-aware, state-merging
/// Inspector over a control-flow graph embedded in the IR.
pub trait ControlFlowInspector: Sized {
    /// Called on first arrival at a node, before its children (or, for a join
    /// point, once the final incoming edge's state has been merged in).
    fn preorder(&mut self, node: &NodeRef, ctx: &ContextFrame, handle: &FlowHandle<Self>) -> Result<bool> {
        let _ = (node, ctx, handle);
        Ok(true)
    }

    /// Called once all children have been visited. Never fires if `preorder`
    /// pruned this node.
    fn postorder(&mut self, node: &NodeRef, ctx: &ContextFrame, handle: &FlowHandle<Self>) -> Result<()> {
        let _ = (node, ctx, handle);
        Ok(())
    }

    /// Called instead of `preorder`/`postorder` on a DAG revisit outside of
    /// join-point handling (i.e. visit-once is off and a non-join node is
    /// reached again).
    fn revisit(&mut self, node: &NodeRef, ctx: Option<&ContextFrame>) -> Result<()> {
        let _ = (node, ctx);
        Ok(())
    }

    /// Called on a genuine cycle. Fatal by default.
    fn loop_revisit(&mut self, node: &NodeRef, ctx: Option<&ContextFrame>) -> Result<()> {
        let _ = ctx;
        Err(Error::loop_detected(NodeIdentity::of(node)))
    }

    /// A deep-enough copy of this pass's analysis state to let one branch
    /// proceed independently of its siblings.
    fn flow_clone(&self) -> Self;

    /// Merge `other`'s state into `self`, leaving `other` conceptually spent.
    /// Must be commutative and associative in effect across however many
    /// incoming edges a join point has: implementations should document the
    /// lattice their per-node analysis forms.
    fn flow_merge(&mut self, other: &Self);

    /// Exclude `node` from join-point treatment even though it has more than
    /// one incoming edge. Default: no exclusions.
    fn filter_join_point(&self, node: &NodeRef) -> bool {
        let _ = node;
        false
    }
}

struct JoinEntry<P> {
    stored: P,
    remaining: usize,
}

/// State shared across every [`FlowRunner`] instance spawned for one
/// `control_flow::apply` call, including the clones [`FlowHandle::visit_branch`]
/// spins up for sibling branches - they must all dedup against the same
/// registry and merge into the same join table.
struct FlowShared<P> {
    registry: Rc<VisitRegistry>,
    join_points: HashMap<NodeIdentity, usize>,
    join_table: RefCell<HashMap<NodeIdentity, JoinEntry<P>>>,
    globals: RefCell<HashMap<String, P>>,
}

/// Handed to a [`ControlFlowInspector`] hook in place of a plain
/// [`crate::visit_registry::VisitOnceHandle`]: branch forking and the
/// named-globals capability live here.
pub struct FlowHandle<'p, P> {
    shared: &'p FlowShared<P>,
    config: &'p TraversalConfig,
}

impl<'p, P: ControlFlowInspector> FlowHandle<'p, P> {
    /// A deep-enough copy of `pass` to explore one branch independently.
    pub fn fork(&self, pass: &P) -> P {
        pass.flow_clone()
    }

    /// Visit `child` as an independent branch, using `pass`'s current state
    /// (typically a [`fork`](Self::fork) of the branching node's state).
    /// Shares this call's dedup registry and join-point table, so sibling
    /// branches that reconverge on a shared node merge correctly.
    pub fn visit_branch(&self, pass: &mut P, ctx: &ContextFrame, child: NodeRef) -> Result<()> {
        let mut runner = FlowRunner { pass, shared: self.shared, config: self.config };
        crate::driver::apply_visitor(&mut runner, self.config, Some(ctx), child, 0, None)?;
        Ok(())
    }

    /// Publish `pass`'s current state into named slot `key`, merging with
    /// whatever is already published there.
    pub fn merge_global_to(&self, key: &str, pass: &P) {
        let mut globals = self.shared.globals.borrow_mut();
        match globals.get_mut(key) {
            Some(existing) => existing.flow_merge(pass),
            None => {
                globals.insert(key.to_string(), pass.flow_clone());
            }
        }
    }

    /// Absorb whatever state is published at `key` into `pass`, if any.
    pub fn merge_global_from(&self, key: &str, pass: &mut P) {
        if let Some(published) = self.shared.globals.borrow().get(key) {
            pass.flow_merge(published);
        }
    }

    /// Remove the published state at `key`.
    pub fn erase_global(&self, key: &str) {
        self.shared.globals.borrow_mut().remove(key);
    }

    /// Is state currently published at `key`?
    pub fn check_global(&self, key: &str) -> bool {
        self.shared.globals.borrow().contains_key(key)
    }

    /// Remove every published global.
    pub fn clear_globals(&self) {
        self.shared.globals.borrow_mut().clear();
    }

    /// A scoped guard ensuring `key` is not already published when acquired,
    /// and erasing it on drop regardless of how the scope exits.
    pub fn guard_global(&self, key: impl Into<String>) -> Result<GuardGlobal<'p, P>> {
        let key = key.into();
        if self.check_global(&key) {
            return Err(Error::global_in_use(key));
        }
        Ok(GuardGlobal { shared: self.shared, key })
    }
}

/// RAII guard returned by [`FlowHandle::guard_global`]; erases its key from
/// the named-globals map on drop, on every exit path.
pub struct GuardGlobal<'p, P> {
    shared: &'p FlowShared<P>,
    key: String,
}

impl<'p, P> Drop for GuardGlobal<'p, P> {
    fn drop(&mut self) {
        self.shared.globals.borrow_mut().remove(&self.key);
    }
}

/// Adapts a [`ControlFlowInspector`] onto the generic [`Flavor`] interface.
struct FlowRunner<'p, P: ControlFlowInspector> {
    pass: &'p mut P,
    shared: &'p FlowShared<P>,
    config: &'p TraversalConfig,
}

impl<'p, P: ControlFlowInspector> Flavor for FlowRunner<'p, P> {
    fn consult(&self, id: NodeIdentity, node: &NodeRef) -> Consult {
        match self.shared.registry.enter(id) {
            VisitLookup::Fresh => Consult::Fresh,
            VisitLookup::AlreadyVisited => Consult::AlreadyVisited(node.clone()),
            VisitLookup::Cycle => Consult::Cycle,
        }
    }

    fn begin(&self, id: NodeIdentity) {
        self.shared.registry.mark_visiting(id);
    }

    fn preorder(&mut self, ctx: &ContextFrame, node: NodeRef) -> Result<(NodeRef, Descend)> {
        let handle = FlowHandle { shared: self.shared, config: self.config };
        let descend = if self.pass.preorder(&node, ctx, &handle)? {
            Descend::Continue
        } else {
            Descend::Prune
        };
        Ok((node, descend))
    }

    fn apply_child_result(
        &mut self,
        _ctx: &ContextFrame,
        parent: NodeRef,
        _child_index: usize,
        _child_result: NodeRef,
    ) -> NodeRef {
        parent
    }

    fn postorder(&mut self, ctx: &ContextFrame, node: NodeRef) -> Result<NodeRef> {
        let handle = FlowHandle { shared: self.shared, config: self.config };
        self.pass.postorder(&node, ctx, &handle)?;
        Ok(node)
    }

    fn revisit(&mut self, parent_ctx: Option<&ContextFrame>, node: &NodeRef) -> Result<()> {
        self.pass.revisit(node, parent_ctx)
    }

    fn loop_revisit(&mut self, parent_ctx: Option<&ContextFrame>, node: &NodeRef) -> Result<NodeRef> {
        self.pass.loop_revisit(node, parent_ctx)?;
        Ok(node.clone())
    }

    fn finish(&self, id: NodeIdentity, result: &NodeRef) {
        debug_assert_eq!(NodeIdentity::of(result), id, "control-flow Inspector must never change identity");
        self.shared.registry.exit(id);
    }

    fn join_flows(&mut self, _ctx: Option<&ContextFrame>, node: &NodeRef) -> Result<bool> {
        let id = NodeIdentity::of(node);
        let incoming = self.shared.join_points.get(&id).copied().unwrap_or(0);
        if incoming <= 1 || self.pass.filter_join_point(node) {
            return Ok(false);
        }

        let mut table = self.shared.join_table.borrow_mut();
        match table.remove(&id) {
            None => {
                // First arrival: stash a clone of our current state and defer.
                table.insert(
                    id,
                    JoinEntry {
                        stored: self.pass.flow_clone(),
                        remaining: incoming - 1,
                    },
                );
                Ok(true)
            }
            Some(mut entry) => {
                entry.stored.flow_merge(self.pass);
                if entry.remaining <= 1 {
                    // Final arrival: adopt the merged state and continue
                    // visiting `node` for real.
                    *self.pass = entry.stored;
                    Ok(false)
                } else {
                    table.insert(
                        id,
                        JoinEntry {
                            stored: entry.stored,
                            remaining: entry.remaining - 1,
                        },
                    );
                    Ok(true)
                }
            }
        }
    }
}

/// Lightweight pre-pass: count, for each node identity, how many times a
/// plain DFS (no dedup) reaches it. A count greater than one means more than
/// one incoming edge in the control-flow view.
fn count_incoming_edges(root: &NodeRef) -> HashMap<NodeIdentity, usize> {
    let mut counts = HashMap::new();
    let mut on_stack: Vec<NodeIdentity> = Vec::new();
    fn walk(node: &NodeRef, counts: &mut HashMap<NodeIdentity, usize>, on_stack: &mut Vec<NodeIdentity>) {
        let id = NodeIdentity::of(node);
        if on_stack.contains(&id) {
            // A back-edge: well-formed input has none. Don't count it as a
            // join-point arrival and don't loop forever on malformed input
            // during setup - the real driver's loop detection handles this
            // input at traversal time instead.
            return;
        }
        *counts.entry(id).or_insert(0) += 1;
        on_stack.push(id);
        for slot in node.children() {
            walk(&slot.node, counts, on_stack);
        }
        on_stack.pop();
    }
    walk(root, &mut counts, &mut on_stack);
    counts
}

/// Run `pass` as a control-flow-aware Inspector over `root`.
pub fn apply<P: ControlFlowInspector>(pass: &mut P, root: NodeRef, config: &TraversalConfig) -> Result<()> {
    let join_points = count_incoming_edges(&root);
    let shared = FlowShared {
        registry: Rc::new(VisitRegistry::new(config.default_visit_once)),
        join_points,
        join_table: RefCell::new(HashMap::new()),
        globals: RefCell::new(HashMap::new()),
    };

    let mut runner = FlowRunner { pass, shared: &shared, config };
    crate::driver::apply_visitor(&mut runner, config, None, root, 0, None)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, Expr};
    use crate::node::node_ref;

    /// Sums every `Lit` value it reaches, merging branch totals at shared
    /// nodes by addition.
    #[derive(Clone)]
    struct SumLits {
        total: i64,
        lit_postorders: usize,
    }

    impl ControlFlowInspector for SumLits {
        fn postorder(&mut self, node: &NodeRef, _ctx: &ContextFrame, _handle: &FlowHandle<Self>) -> Result<()> {
            if let Some(Expr::Lit(value)) = node.as_any().downcast_ref::<Expr>() {
                self.total += value;
                self.lit_postorders += 1;
            }
            Ok(())
        }

        fn flow_clone(&self) -> Self {
            self.clone()
        }

        fn flow_merge(&mut self, other: &Self) {
            self.total += other.total;
            self.lit_postorders += other.lit_postorders;
        }
    }

    #[test]
    fn shared_join_point_is_visited_once_with_merged_state() {
        let tree = node_ref(Expr::diamond(5));
        let mut pass = SumLits { total: 0, lit_postorders: 0 };
        apply(&mut pass, tree, &TraversalConfig::default()).unwrap();

        // Two incoming edges into the shared Lit(5), but its postorder only
        // fires on the arrival that closes out the join.
        assert_eq!(pass.lit_postorders, 1);
        assert_eq!(pass.total, 5);
    }

    #[test]
    fn non_join_tree_behaves_like_a_plain_inspector() {
        let tree = node_ref(Expr::add(Expr::lit(2), Expr::lit(3)));
        let mut pass = SumLits { total: 0, lit_postorders: 0 };
        apply(&mut pass, tree, &TraversalConfig::default()).unwrap();

        assert_eq!(pass.lit_postorders, 2);
        assert_eq!(pass.total, 5);
    }

    #[test]
    fn loop_revisit_is_fatal_by_default() {
        let root = fixtures::self_loop();
        let mut pass = SumLits { total: 0, lit_postorders: 0 };
        let err = apply(&mut pass, root, &TraversalConfig::default()).unwrap_err();
        assert_eq!(err.kind(), travcore_error::ErrorKind::LoopDetected);
    }

    #[derive(Clone)]
    struct GlobalUser {
        seen: Vec<&'static str>,
    }

    impl ControlFlowInspector for GlobalUser {
        fn preorder(&mut self, node: &NodeRef, _ctx: &ContextFrame, handle: &FlowHandle<Self>) -> Result<bool> {
            if node.kind() == crate::node::NodeKind("add") {
                let _guard = handle.guard_global("pass::in_progress")?;
                self.seen.push("entered");
            }
            Ok(true)
        }

        fn flow_clone(&self) -> Self {
            self.clone()
        }

        fn flow_merge(&mut self, other: &Self) {
            self.seen.extend(other.seen.iter().copied());
        }
    }

    #[test]
    fn guard_global_releases_its_key_on_scope_exit() {
        let tree = node_ref(Expr::add(Expr::lit(1), Expr::lit(2)));
        let mut pass = GlobalUser { seen: Vec::new() };
        apply(&mut pass, tree, &TraversalConfig::default()).unwrap();
        assert_eq!(pass.seen, vec!["entered"]);
    }
}

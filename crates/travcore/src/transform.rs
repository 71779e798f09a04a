//! The Transform flavor (component E): functional rebuild with structural
//! sharing, backed by the change tracker (component B).
//!
//! A Transform hook receives and returns an owned `NodeRef`. If every child
//! of a node resolves to the identity it started with, the parent reuses its
//! original object instead of rebuilding - `with_children` is only called
//! once a child's returned identity actually differs. `prune()` suppresses
//! automatic descent into the node's own children (for a pass that wants to
//! walk some or all of them manually via `transform_child`); unlike
//! Inspector/Modifier, a pruned Transform node's `postorder` still runs.

use travcore_error::{Error, Result};

use crate::change_tracker::{ChangeOnceHandle, ChangeTracker};
use crate::config::TraversalConfig;
use crate::context::ContextFrame;
use crate::flavor::{Consult, Descend, Flavor};
use crate::node::{NodeIdentity, NodeRef};

/// The hooks a pass author implements to rebuild a tree.
pub trait Transform {
    /// Called on first arrival at a node, before its children. Returning a
    /// node whose identity differs from the one passed in replaces it for the
    /// rest of this descent; call `handle.prune()` to additionally suppress
    /// automatic descent into its children.
    fn preorder(&mut self, node: NodeRef, ctx: &ContextFrame, handle: &TransformHandle) -> Result<NodeRef> {
        let _ = (ctx, handle);
        Ok(node)
    }

    /// Called once all children have been visited (or immediately after
    /// `preorder` if it pruned), with the node as descent currently has it.
    fn postorder(&mut self, node: NodeRef, ctx: &ContextFrame, handle: &TransformHandle) -> Result<NodeRef> {
        let _ = (ctx, handle);
        Ok(node)
    }

    /// Called instead of `preorder`/`postorder` when a DAG node is reached
    /// again while visit-once is in effect.
    fn revisit(&mut self, original: &NodeRef, replacement: &NodeRef, ctx: Option<&ContextFrame>) -> Result<()> {
        let _ = (original, replacement, ctx);
        Ok(())
    }

    /// Called on a genuine cycle. Fatal by default.
    fn loop_revisit(&mut self, node: &NodeRef, ctx: Option<&ContextFrame>) -> Result<()> {
        let _ = ctx;
        Err(Error::loop_detected(NodeIdentity::of(node)))
    }

    /// When true, the driver never descends into a node's children on its
    /// own - every node's descent is this pass's responsibility, driven
    /// entirely through [`TransformHandle::transform_child`] calls from
    /// `preorder`. Unlike calling `handle.prune()` per node, this is a
    /// whole-pass policy: it applies uniformly, so a node whose `preorder`
    /// forgets to prune still never gets an automatic descent underneath it.
    /// False by default, matching ordinary automatic declared-order descent.
    fn skip_children_before_preorder(&self) -> bool {
        false
    }
}

/// Handed to `preorder`/`postorder` so a hook can suppress automatic descent
/// and, if it does, drive specific children itself via
/// [`transform_child`](TransformHandle::transform_child).
pub struct TransformHandle<'c> {
    tracker: &'c ChangeTracker,
    config: &'c TraversalConfig,
    once: ChangeOnceHandle<'c>,
    pruned: std::cell::Cell<bool>,
}

impl<'c> TransformHandle<'c> {
    fn new(tracker: &'c ChangeTracker, config: &'c TraversalConfig, current: NodeIdentity) -> Self {
        TransformHandle {
            tracker,
            config,
            once: ChangeOnceHandle::new(tracker, current),
            pruned: std::cell::Cell::new(false),
        }
    }

    /// Suppress automatic descent into this node's declared children. Only
    /// meaningful when called from `preorder`; `postorder` has already
    /// decided whether to descend by the time it runs.
    pub fn prune(&self) {
        self.pruned.set(true);
    }

    fn pruned(&self) -> bool {
        self.pruned.get()
    }

    /// The current node's next DAG arrival is treated as a fresh descent.
    pub fn visit_again(&self) {
        self.once.visit_again();
    }

    /// Restore visit-once for the current node.
    pub fn visit_once(&self) {
        self.once.visit_once();
    }

    /// Apply this same Transform (`pass`) to a single child, outside of the
    /// driver's automatic declared-order descent. Always implies `prune()`:
    /// a pass that manually walks even one child is responsible for the rest
    /// of its children too, exactly as the original `transform_child`
    /// contract required.
    pub fn transform_child<P: Transform>(&self, pass: &mut P, ctx: &ContextFrame, child: NodeRef) -> Result<NodeRef> {
        self.pruned.set(true);
        let mut runner = TransformRunner::new(pass, self.tracker, self.config);
        crate::driver::apply_visitor(&mut runner, self.config, Some(ctx), child, 0, None)
    }

    /// Revisit a node reached through a reference the hook is not permitted
    /// to replace (e.g. a side-table entry rather than a tree child slot).
    /// Errors with `ConstReplacement` if the traversal would have produced a
    /// different identity - this is a read-only visit, not a rebuild site.
    pub fn visit_const<P: Transform>(&self, pass: &mut P, ctx: &ContextFrame, node: &NodeRef) -> Result<()> {
        let mut runner = TransformRunner::new(pass, self.tracker, self.config);
        let id = NodeIdentity::of(node);
        let result = crate::driver::apply_visitor(&mut runner, self.config, Some(ctx), node.clone(), 0, None)?;
        if NodeIdentity::of(&result) != id {
            return Err(Error::const_replacement(id));
        }
        Ok(())
    }
}

/// Adapts a user's [`Transform`] onto the generic [`Flavor`] interface.
pub struct TransformRunner<'p, P: Transform> {
    pass: &'p mut P,
    tracker: &'p ChangeTracker,
    config: &'p TraversalConfig,
}

impl<'p, P: Transform> TransformRunner<'p, P> {
    pub fn new(pass: &'p mut P, tracker: &'p ChangeTracker, config: &'p TraversalConfig) -> Self {
        TransformRunner { pass, tracker, config }
    }
}

impl<'p, P: Transform> Flavor for TransformRunner<'p, P> {
    fn consult(&self, id: NodeIdentity, _node: &NodeRef) -> Consult {
        self.tracker.consult(id)
    }

    fn begin(&self, id: NodeIdentity) {
        let _ = self.tracker.begin(id);
    }

    fn preorder(&mut self, ctx: &ContextFrame, node: NodeRef) -> Result<(NodeRef, Descend)> {
        let handle = TransformHandle::new(self.tracker, self.config, NodeIdentity::of(&node));
        let result = self.pass.preorder(node, ctx, &handle)?;
        let descend = if handle.pruned() { Descend::Prune } else { Descend::Continue };
        Ok((result, descend))
    }

    fn apply_child_result(
        &mut self,
        ctx: &ContextFrame,
        parent: NodeRef,
        child_index: usize,
        child_result: NodeRef,
    ) -> NodeRef {
        let original_child_id = ctx
            .original()
            .children()
            .get(child_index)
            .map(|slot| NodeIdentity::of(&slot.node));
        if original_child_id == Some(NodeIdentity::of(&child_result)) {
            // unchanged: reuse the parent's current object, no rebuild.
            return parent;
        }
        let mut new_children: Vec<NodeRef> = parent.children().into_iter().map(|slot| slot.node).collect();
        if child_index < new_children.len() {
            new_children[child_index] = child_result;
        }
        parent.with_children(new_children)
    }

    fn postorder(&mut self, ctx: &ContextFrame, node: NodeRef) -> Result<NodeRef> {
        let handle = TransformHandle::new(self.tracker, self.config, NodeIdentity::of(&node));
        self.pass.postorder(node, ctx, &handle)
    }

    fn revisit(&mut self, parent_ctx: Option<&ContextFrame>, node: &NodeRef) -> Result<()> {
        let id = NodeIdentity::of(node);
        match self.tracker.lookup(id) {
            crate::change_tracker::ChangeLookup::Done(replacement) => {
                self.pass.revisit(node, &replacement, parent_ctx)
            }
            _ => self.pass.revisit(node, node, parent_ctx),
        }
    }

    fn loop_revisit(
        &mut self,
        parent_ctx: Option<&ContextFrame>,
        node: &NodeRef,
    ) -> Result<NodeRef> {
        self.pass.loop_revisit(node, parent_ctx)?;
        Ok(node.clone())
    }

    fn finish(&self, id: NodeIdentity, result: &NodeRef) {
        self.tracker.finish(id, result);
    }

    fn postorder_runs_after_prune(&self) -> bool {
        true
    }

    fn skip_children_before_preorder(&self) -> bool {
        self.pass.skip_children_before_preorder()
    }
}

/// Run `pass` as a Transform over `root`. If nothing changes anywhere in the
/// tree, the result is `root` unchanged (the structural-sharing rule applied
/// all the way to the top).
pub fn apply<P: Transform>(pass: &mut P, root: NodeRef, config: &TraversalConfig) -> Result<NodeRef> {
    let tracker = ChangeTracker::new(config.default_visit_once);
    let mut runner = TransformRunner::new(pass, &tracker, config);
    crate::driver::apply_visitor(&mut runner, config, None, root, 0, None)
}

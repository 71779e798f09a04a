//! The Modifier flavor (component E): in-place mutation on owned clones,
//! backed by the change tracker (component B).
//!
//! Unlike Inspector, a Modifier hook gets a `&mut dyn Node` - but never a
//! reference into the original tree. The driver clones every node before the
//! first hook sees it (`Node::clone_boxed`), so mutating `node` in `preorder`
//! or `postorder` never touches anything the caller still holds a `NodeRef`
//! to. Every visited node comes back with a new identity, whether or not a
//! hook actually changed anything - there is no structural-sharing rule for
//! Modifier (that's a Transform-only concern; see `transform.rs`).

use travcore_error::{Error, Result};

use crate::change_tracker::{ChangeOnceHandle, ChangeTracker};
use crate::context::ContextFrame;
use crate::flavor::{Consult, Descend, Flavor};
use crate::node::{Node, NodeIdentity, NodeRef};

/// The hooks a pass author implements to mutate a tree in place.
///
/// All methods have permissive defaults - a pass that implements none of them
/// still clones every node it visits (an Inspector should be preferred when
/// no mutation is actually needed).
pub trait Modifier {
    /// Called on first arrival at a node, before its children, with mutable
    /// access to the owned clone the driver just produced. Return `false` to
    /// prune - children are not visited and `postorder` does not fire for
    /// this node.
    fn preorder(&mut self, node: &mut dyn Node, ctx: &ContextFrame, once: &ChangeOnceHandle) -> Result<bool> {
        let _ = (node, ctx, once);
        Ok(true)
    }

    /// Called once all children have been visited, again with mutable access
    /// to the (possibly already-edited) clone. Never fires if `preorder`
    /// pruned this node.
    fn postorder(&mut self, node: &mut dyn Node, ctx: &ContextFrame, once: &ChangeOnceHandle) -> Result<()> {
        let _ = (node, ctx, once);
        Ok(())
    }

    /// Called instead of `preorder`/`postorder` when a DAG node is reached
    /// again while visit-once is in effect. `original` is the node as first
    /// seen; `replacement` is the clone that descent produced last time.
    fn revisit(&mut self, original: &NodeRef, replacement: &NodeRef, ctx: Option<&ContextFrame>) -> Result<()> {
        let _ = (original, replacement, ctx);
        Ok(())
    }

    /// Called when a node is reached again while its first descent is still
    /// in progress - a cycle through the IR. Fatal by default.
    fn loop_revisit(&mut self, node: &NodeRef, ctx: Option<&ContextFrame>) -> Result<()> {
        let _ = ctx;
        Err(Error::loop_detected(NodeIdentity::of(node)))
    }
}

/// Adapts a user's [`Modifier`] onto the generic [`Flavor`] interface.
pub struct ModifierRunner<'p, P: Modifier> {
    pass: &'p mut P,
    tracker: ChangeTracker,
}

impl<'p, P: Modifier> ModifierRunner<'p, P> {
    pub fn new(pass: &'p mut P, tracker: ChangeTracker) -> Self {
        ModifierRunner { pass, tracker }
    }
}

impl<'p, P: Modifier> Flavor for ModifierRunner<'p, P> {
    fn consult(&self, id: NodeIdentity, _node: &NodeRef) -> Consult {
        self.tracker.consult(id)
    }

    fn begin(&self, id: NodeIdentity) {
        let _ = self.tracker.begin(id);
    }

    fn preorder(&mut self, ctx: &ContextFrame, node: NodeRef) -> Result<(NodeRef, Descend)> {
        let mut owned = node.clone_boxed();
        let once = ChangeOnceHandle::new(&self.tracker, NodeIdentity::of(&node));
        let descend = if self.pass.preorder(owned.as_mut(), ctx, &once)? {
            Descend::Continue
        } else {
            Descend::Prune
        };
        Ok((NodeRef::from(owned), descend))
    }

    fn apply_child_result(
        &mut self,
        _ctx: &ContextFrame,
        parent: NodeRef,
        child_index: usize,
        child_result: NodeRef,
    ) -> NodeRef {
        let mut owned = parent.clone_boxed();
        owned.set_child(child_index, child_result);
        NodeRef::from(owned)
    }

    fn postorder(&mut self, ctx: &ContextFrame, node: NodeRef) -> Result<NodeRef> {
        let mut owned = node.clone_boxed();
        let once = ChangeOnceHandle::new(&self.tracker, NodeIdentity::of(&node));
        self.pass.postorder(owned.as_mut(), ctx, &once)?;
        Ok(NodeRef::from(owned))
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
}

/// Run `pass` as a Modifier over `root`. Returns the mutated clone's
/// identity, which always differs from `root`'s, even when no hook actually
/// changed anything - every visited node passes through at least one
/// `clone_boxed`.
pub fn apply<P: Modifier>(
    pass: &mut P,
    root: NodeRef,
    config: &crate::config::TraversalConfig,
) -> Result<NodeRef> {
    let tracker = ChangeTracker::new(config.default_visit_once);
    let mut runner = ModifierRunner::new(pass, tracker);
    crate::driver::apply_visitor(&mut runner, config, None, root, 0, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TraversalConfig;
    use crate::fixtures::Expr;
    use crate::node::node_ref;

    struct IncrementLits {
        visits: usize,
    }

    impl Modifier for IncrementLits {
        fn preorder(
            &mut self,
            node: &mut dyn Node,
            _ctx: &ContextFrame,
            _once: &ChangeOnceHandle,
        ) -> Result<bool> {
            self.visits += 1;
            if let Some(lit) = node.as_any_mut().downcast_mut::<Expr>() {
                if let Expr::Lit(value) = lit {
                    *value += 1;
                }
            }
            Ok(true)
        }
    }

    #[test]
    fn modifier_increments_every_lit_and_rebuilds_identity() {
        let tree = node_ref(Expr::add(Expr::lit(1), Expr::lit(2)));
        let mut pass = IncrementLits { visits: 0 };
        let result = apply(&mut pass, tree.clone(), &TraversalConfig::default()).unwrap();

        assert_ne!(NodeIdentity::of(&result), NodeIdentity::of(&tree));
        assert_eq!(pass.visits, 3);

        let slots = result.children();
        let Expr::Lit(lhs) = slots[0].node.as_any().downcast_ref::<Expr>().unwrap() else {
            panic!("expected Lit");
        };
        let Expr::Lit(rhs) = slots[1].node.as_any().downcast_ref::<Expr>().unwrap() else {
            panic!("expected Lit");
        };
        assert_eq!((*lhs, *rhs), (2, 3));

        // the original tree is untouched
        let original_slots = tree.children();
        let Expr::Lit(orig_lhs) = original_slots[0].node.as_any().downcast_ref::<Expr>().unwrap() else {
            panic!("expected Lit");
        };
        assert_eq!(*orig_lhs, 1);
    }

    #[test]
    fn modifier_dedups_a_shared_child_and_reuses_its_result() {
        let tree = node_ref(Expr::diamond(10));
        let mut pass = IncrementLits { visits: 0 };
        let result = apply(&mut pass, tree, &TraversalConfig::default()).unwrap();

        // Add(Lit, Lit) visited: add + one distinct lit = 2 preorder calls.
        assert_eq!(pass.visits, 2);
        let slots = result.children();
        assert_eq!(NodeIdentity::of(&slots[0].node), NodeIdentity::of(&slots[1].node));
    }
}

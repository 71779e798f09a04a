//! The Inspector flavor (component E): read-only traversal backed by the
//! visit-once registry (component C).
//!
//! An `Inspector` never rebuilds the tree - `apply_visitor`'s result is
//! always the input identity - so its only decision per node is whether to
//! descend into children (`preorder` returning `false` prunes) and what to do
//! when the same identity is reached a second time (`revisit`, or `loop_revisit`
//! on a genuine cycle).

use std::rc::Rc;

use travcore_error::Result;

use crate::context::ContextFrame;
use crate::flavor::{Consult, Descend, Flavor};
use crate::node::{NodeIdentity, NodeRef};
use crate::visit_registry::{VisitLookup, VisitOnceHandle, VisitRegistry};

/// The hooks a pass author implements to inspect a tree without modifying it.
///
/// All methods have permissive defaults - a pass that implements none of them
/// walks the whole tree once per node and does nothing.
pub trait Inspector {
    /// Called on first arrival at a node, before its children. Return `false`
    /// to prune - children are not visited and `postorder` does not fire for
    /// this node. `once` lets the hook call `visit_again()`/`visit_once()` on
    /// the current node's DAG dedup policy.
    fn preorder(&mut self, node: &NodeRef, ctx: &ContextFrame, once: &VisitOnceHandle) -> Result<bool> {
        let _ = (node, ctx, once);
        Ok(true)
    }

    /// Called once all children have been visited. Never fires if `preorder`
    /// pruned this node.
    fn postorder(&mut self, node: &NodeRef, ctx: &ContextFrame, once: &VisitOnceHandle) -> Result<()> {
        let _ = (node, ctx, once);
        Ok(())
    }

    /// Called instead of `preorder`/`postorder` when a DAG node is reached
    /// again while visit-once is in effect. `ctx` is the *caller's* frame
    /// (the new arrival's parent), since no frame is pushed for a revisit.
    fn revisit(&mut self, node: &NodeRef, ctx: Option<&ContextFrame>) -> Result<()> {
        let _ = (node, ctx);
        Ok(())
    }

    /// Called when a node is reached again while its first descent is still
    /// in progress - a cycle through the IR. Fatal by default.
    fn loop_revisit(&mut self, node: &NodeRef, ctx: Option<&ContextFrame>) -> Result<()> {
        let _ = ctx;
        Err(travcore_error::Error::loop_detected(NodeIdentity::of(node)))
    }
}

/// Adapts a user's [`Inspector`] onto the generic [`Flavor`] interface the
/// driver runs. Holds the shared visit-once registry behind an `Rc` so
/// control-flow Inspectors can share one registry across `flow_clone`d
/// branches without this struct needing to know about branching at all.
pub struct InspectorRunner<'p, P: Inspector> {
    pass: &'p mut P,
    registry: Rc<VisitRegistry>,
}

impl<'p, P: Inspector> InspectorRunner<'p, P> {
    pub fn new(pass: &'p mut P, registry: Rc<VisitRegistry>) -> Self {
        InspectorRunner { pass, registry }
    }
}

impl<'p, P: Inspector> Flavor for InspectorRunner<'p, P> {
    fn consult(&self, id: NodeIdentity, node: &NodeRef) -> Consult {
        match self.registry.enter(id) {
            VisitLookup::Fresh => Consult::Fresh,
            VisitLookup::AlreadyVisited => Consult::AlreadyVisited(node.clone()),
            VisitLookup::Cycle => Consult::Cycle,
        }
    }

    fn begin(&self, id: NodeIdentity) {
        self.registry.mark_visiting(id);
    }

    fn preorder(&mut self, ctx: &ContextFrame, node: NodeRef) -> Result<(NodeRef, Descend)> {
        let once = VisitOnceHandle::new(&self.registry, NodeIdentity::of(&node));
        let descend = if self.pass.preorder(&node, ctx, &once)? {
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
        // Inspector never rebuilds: the driver threads the child's returned
        // identity for bookkeeping only, and the parent's own identity never
        // changes underneath it.
        parent
    }

    fn postorder(&mut self, ctx: &ContextFrame, node: NodeRef) -> Result<NodeRef> {
        let once = VisitOnceHandle::new(&self.registry, NodeIdentity::of(&node));
        self.pass.postorder(&node, ctx, &once)?;
        Ok(node)
    }

    fn revisit(&mut self, parent_ctx: Option<&ContextFrame>, node: &NodeRef) -> Result<()> {
        self.pass.revisit(node, parent_ctx)
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
        debug_assert_eq!(
            NodeIdentity::of(result),
            id,
            "Inspector must never change a node's identity"
        );
        self.registry.exit(id);
    }
}

/// Run `pass` as an Inspector over `root`. Returns `root`'s identity
/// unchanged on success; `preorder`/`postorder`/`revisit`/`loop_revisit`
/// errors propagate out unchanged, per the crate's error-handling policy.
pub fn apply<P: Inspector>(
    pass: &mut P,
    root: NodeRef,
    config: &crate::config::TraversalConfig,
) -> Result<NodeRef> {
    let registry = Rc::new(VisitRegistry::new(config.default_visit_once));
    let mut runner = InspectorRunner::new(pass, registry);
    crate::driver::apply_visitor(&mut runner, config, None, root, 0, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TraversalConfig;
    use crate::fixtures::{self, Expr};
    use crate::node::{node_ref, NodeKind};
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingInspector {
        events: RefCell<Vec<String>>,
    }

    impl Inspector for RecordingInspector {
        fn preorder(
            &mut self,
            node: &NodeRef,
            _ctx: &ContextFrame,
            _once: &VisitOnceHandle,
        ) -> Result<bool> {
            self.events
                .borrow_mut()
                .push(format!("pre:{}", node.kind()));
            Ok(true)
        }

        fn postorder(
            &mut self,
            node: &NodeRef,
            _ctx: &ContextFrame,
            _once: &VisitOnceHandle,
        ) -> Result<()> {
            self.events
                .borrow_mut()
                .push(format!("post:{}", node.kind()));
            Ok(())
        }

        fn revisit(&mut self, node: &NodeRef, _ctx: Option<&ContextFrame>) -> Result<()> {
            self.events
                .borrow_mut()
                .push(format!("revisit:{}", node.kind()));
            Ok(())
        }
    }

    #[test]
    fn noop_inspector_visits_in_tree_order() {
        let tree = node_ref(Expr::add(Expr::lit(1), Expr::lit(2)));
        let mut pass = RecordingInspector::default();
        let result = apply(&mut pass, tree.clone(), &TraversalConfig::default()).unwrap();

        assert_eq!(NodeIdentity::of(&result), NodeIdentity::of(&tree));
        assert_eq!(
            *pass.events.borrow(),
            vec!["pre:add", "pre:lit", "post:lit", "pre:lit", "post:lit", "post:add"]
        );
    }

    struct PruneAdd {
        events: RefCell<Vec<String>>,
    }

    impl Inspector for PruneAdd {
        fn preorder(
            &mut self,
            node: &NodeRef,
            _ctx: &ContextFrame,
            _once: &VisitOnceHandle,
        ) -> Result<bool> {
            self.events.borrow_mut().push(format!("pre:{}", node.kind()));
            Ok(node.kind() != NodeKind("add"))
        }
        fn postorder(
            &mut self,
            node: &NodeRef,
            _ctx: &ContextFrame,
            _once: &VisitOnceHandle,
        ) -> Result<()> {
            self.events.borrow_mut().push(format!("post:{}", node.kind()));
            Ok(())
        }
    }

    #[test]
    fn pruning_add_skips_children_and_its_own_postorder() {
        let tree = node_ref(Expr::add(Expr::lit(1), Expr::lit(2)));
        let mut pruner = PruneAdd {
            events: RefCell::new(Vec::new()),
        };
        apply(&mut pruner, tree, &TraversalConfig::default()).unwrap();
        assert_eq!(*pruner.events.borrow(), vec!["pre:add"]);
    }

    #[test]
    fn dag_dedup_fires_preorder_once_and_revisit_once() {
        let tree = node_ref(Expr::diamond(1));
        let mut pass = RecordingInspector::default();
        apply(&mut pass, tree, &TraversalConfig::default()).unwrap();

        let events = pass.events.borrow();
        assert_eq!(
            events.iter().filter(|e| e.as_str() == "pre:lit").count(),
            1
        );
        assert_eq!(
            events.iter().filter(|e| e.as_str() == "revisit:lit").count(),
            1
        );
        assert_eq!(events.iter().filter(|e| e.as_str() == "pre:add").count(), 1);
        assert_eq!(
            events.iter().filter(|e| e.as_str() == "post:add").count(),
            1
        );
    }

    #[test]
    fn cycle_through_ir_fails_with_loop_detected() {
        let tree = fixtures::self_loop();
        let mut pass = RecordingInspector::default();
        let err = apply(&mut pass, tree, &TraversalConfig::default()).unwrap_err();
        assert_eq!(err.kind(), travcore_error::ErrorKind::LoopDetected);
    }
}

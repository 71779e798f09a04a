//! Integration tests driving the public `travcore` API end to end, the way a
//! real pass pipeline would chain several passes over one tree rather than
//! exercising a single flavor in isolation (see each module's own
//! `#[cfg(test)]` block for that).

mod common;

use travcore::fixtures::Expr;
use travcore::node::{node_ref, NodeRef};
use travcore::{
    for_all_matching, modify_all_matching, transform_all_matching, ContextFrame,
    ControlFlowInspector, FlowHandle, Node, NodeIdentity, TraversalConfig,
};
use travcore_error::Result;

/// `((1 + 2) + (3 + 4))` - deep enough that a single-node replacement has to
/// rebuild two levels of ancestors, and wide enough to give the adaptors more
/// than one node of each kind to find.
fn wide_tree() -> NodeRef {
    node_ref(Expr::add_ref(
        node_ref(Expr::add(Expr::lit(1), Expr::lit(2))),
        node_ref(Expr::add(Expr::lit(3), Expr::lit(4))),
    ))
}

#[test]
fn transform_then_inspect_preserves_sharing_on_the_untouched_half() {
    common::init_tracing();
    let tree = wide_tree();
    let lhs_before = tree.children()[0].node.clone();
    let rhs_before = tree.children()[1].node.clone();

    // Replace every Lit(1) with Lit(100) - only the left subtree changes.
    let doubled = transform_all_matching::<Expr, _>(
        tree.clone(),
        |e| match e {
            Expr::Lit(1) => node_ref(Expr::lit(100)),
            other => node_ref(other.clone()),
        },
        &TraversalConfig::default(),
    )
    .unwrap();

    assert_ne!(NodeIdentity::of(&doubled), NodeIdentity::of(&tree));
    let lhs_after = doubled.children()[0].node.clone();
    let rhs_after = doubled.children()[1].node.clone();
    assert_ne!(NodeIdentity::of(&lhs_after), NodeIdentity::of(&lhs_before));
    assert_eq!(NodeIdentity::of(&rhs_after), NodeIdentity::of(&rhs_before));

    // A plain Inspector pass over the rebuilt tree sees the replaced value
    // and nothing else changed.
    let mut lits = Vec::new();
    for_all_matching::<Expr, _>(
        doubled,
        |e| {
            if let Expr::Lit(v) = e {
                lits.push(*v);
            }
        },
        &TraversalConfig::default(),
    )
    .unwrap();
    assert_eq!(lits, vec![100, 2, 3, 4]);
}

#[test]
fn modify_all_matching_mutates_a_fresh_root_and_leaves_the_input_alone() {
    common::init_tracing();
    let tree = wide_tree();
    let original_lits = collect_lits(&tree);

    let incremented = modify_all_matching::<Expr, _>(
        tree.clone(),
        |e| {
            if let Expr::Lit(v) = e {
                *v += 10;
            }
        },
        &TraversalConfig::default(),
    )
    .unwrap();

    assert_eq!(collect_lits(&tree), original_lits);
    assert_eq!(
        collect_lits(&incremented),
        original_lits.iter().map(|v| v + 10).collect::<Vec<_>>()
    );
}

fn collect_lits(root: &NodeRef) -> Vec<i64> {
    let mut out = Vec::new();
    for_all_matching::<Expr, _>(
        root.clone(),
        |e| {
            if let Expr::Lit(v) = e {
                out.push(*v);
            }
        },
        &TraversalConfig::default(),
    )
    .unwrap();
    out
}

/// Tracks the set of `Lit` values reachable through each branch of a
/// control-flow graph, merging by union at shared join points - integers
/// stand in for the assigned-variable-name sets a real dataflow pass tracks.
#[derive(Clone, Default)]
struct ReachableLits {
    seen: Vec<i64>,
}

impl ControlFlowInspector for ReachableLits {
    fn postorder(
        &mut self,
        node: &NodeRef,
        _ctx: &ContextFrame,
        _handle: &FlowHandle<Self>,
    ) -> Result<()> {
        if let Some(Expr::Lit(value)) = node.as_any().downcast_ref::<Expr>() {
            self.seen.push(*value);
        }
        Ok(())
    }

    fn flow_clone(&self) -> Self {
        self.clone()
    }

    fn flow_merge(&mut self, other: &Self) {
        self.seen.extend(other.seen.iter().copied());
    }
}

#[test]
fn control_flow_pass_merges_branch_state_at_a_shared_join_point() {
    common::init_tracing();
    // Two branches both read the same shared Lit(7); each top-level Add also
    // owns a private Lit.
    let shared = node_ref(Expr::lit(7));
    let left = node_ref(Expr::add_ref(node_ref(Expr::lit(1)), shared.clone()));
    let right = node_ref(Expr::add_ref(node_ref(Expr::lit(2)), shared));
    let tree = node_ref(Expr::add_ref(left, right));

    let mut pass = ReachableLits::default();
    travcore::flow::apply(&mut pass, tree, &TraversalConfig::default()).unwrap();

    pass.seen.sort();
    assert_eq!(pass.seen, vec![1, 2, 7]);
}

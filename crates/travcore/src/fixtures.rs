//! A minimal arithmetic expression IR used across this crate's own tests.
//!
//! `Add` and `Lit` are enough to build every tree this crate's test suite
//! needs: noop inspection, pruning, DAG dedup, single-node replacement,
//! identity shortcuts, control-flow joins, and hand-built cycles. Kept
//! separate from the engine so the engine never depends on a specific node
//! shape.

use crate::node::{ChildSlot, ChildSlots, Node, NodeKind, NodeRef};

/// A toy expression node: either an integer literal or the sum of two
/// sub-expressions.
#[derive(Debug, Clone)]
pub enum Expr {
    Lit(i64),
    Add(NodeRef, NodeRef),
}

impl Expr {
    pub fn lit(value: i64) -> Self {
        Expr::Lit(value)
    }

    pub fn add(lhs: Expr, rhs: Expr) -> Self {
        Expr::Add(NodeRef::new(lhs), NodeRef::new(rhs))
    }

    pub fn add_ref(lhs: NodeRef, rhs: NodeRef) -> Self {
        Expr::Add(lhs, rhs)
    }

    /// Build `Add(x, x)` where both slots share one `Lit` allocation - the
    /// smallest possible DAG.
    pub fn diamond(value: i64) -> Self {
        let shared = NodeRef::new(Expr::Lit(value));
        Expr::Add(shared.clone(), shared)
    }
}

impl Node for Expr {
    fn kind(&self) -> NodeKind {
        match self {
            Expr::Lit(_) => NodeKind("lit"),
            Expr::Add(_, _) => NodeKind("add"),
        }
    }

    fn children(&self) -> ChildSlots {
        match self {
            Expr::Lit(_) => ChildSlots::new(),
            Expr::Add(lhs, rhs) => ChildSlots::from_iter([
                ChildSlot {
                    index: 0,
                    name: Some("lhs"),
                    node: lhs.clone(),
                },
                ChildSlot {
                    index: 1,
                    name: Some("rhs"),
                    node: rhs.clone(),
                },
            ]),
        }
    }

    fn with_children(&self, mut new_children: Vec<NodeRef>) -> NodeRef {
        match self {
            Expr::Lit(value) => {
                assert!(new_children.is_empty(), "Lit has no children to replace");
                NodeRef::new(Expr::Lit(*value))
            }
            Expr::Add(_, _) => {
                assert_eq!(new_children.len(), 2, "Add has exactly two children");
                let rhs = new_children.pop().unwrap();
                let lhs = new_children.pop().unwrap();
                NodeRef::new(Expr::Add(lhs, rhs))
            }
        }
    }

    fn set_child(&mut self, index: usize, new_child: NodeRef) {
        match self {
            Expr::Lit(_) => panic!("Lit has no child slot {index}"),
            Expr::Add(lhs, rhs) => match index {
                0 => *lhs = new_child,
                1 => *rhs = new_child,
                _ => panic!("Add has no child slot {index}"),
            },
        }
    }

    fn clone_boxed(&self) -> Box<dyn Node> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

/// A node whose only child is itself, for exercising the `LoopDetected` path.
///
/// `Expr` has no interior mutability, so the self-reference is built with
/// `Rc::new_cyclic`: the closure receives a `Weak` handle to the allocation
/// being constructed before it exists, and `children()` upgrades it on every
/// call. The upgrade is infallible here because the returned `NodeRef` keeps
/// the strong count above zero for as long as anyone can reach this node.
#[derive(Debug)]
struct SelfLoop {
    this: std::cell::RefCell<std::rc::Weak<SelfLoop>>,
}

impl Node for SelfLoop {
    fn kind(&self) -> NodeKind {
        NodeKind("self_loop")
    }

    fn children(&self) -> ChildSlots {
        let me: std::rc::Rc<SelfLoop> = self
            .this
            .borrow()
            .upgrade()
            .expect("self_loop fixture is still alive while walked");
        let node: NodeRef = me;
        ChildSlots::from_iter([ChildSlot {
            index: 0,
            name: None,
            node,
        }])
    }

    fn with_children(&self, _new_children: Vec<NodeRef>) -> NodeRef {
        unimplemented!("self_loop is an Inspector-only fixture, never transformed")
    }

    fn set_child(&mut self, _index: usize, _new_child: NodeRef) {
        unimplemented!("self_loop is an Inspector-only fixture, never modified")
    }

    fn clone_boxed(&self) -> Box<dyn Node> {
        unimplemented!("self_loop is an Inspector-only fixture, never cloned")
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

/// Build a tree that closes a cycle on itself: `n.children[0] == n`.
pub fn self_loop() -> NodeRef {
    std::rc::Rc::new_cyclic(|weak| SelfLoop {
        this: std::cell::RefCell::new(weak.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeIdentity;

    #[test]
    fn diamond_shares_one_lit_allocation() {
        let tree = NodeRef::new(Expr::diamond(1));
        let slots = tree.children();
        assert!(std::rc::Rc::ptr_eq(&slots[0].node, &slots[1].node));
    }

    #[test]
    fn self_loop_child_is_its_own_identity() {
        let root = self_loop();
        let child = root.children().remove(0).node;
        assert_eq!(NodeIdentity::of(&root), NodeIdentity::of(&child));
    }
}

//! Utility adaptors (component G): one-shot helpers that run a single user
//! hook over every node of a chosen kind, plus the read/write context
//! capability passes can query from any hook.
//!
//! Each adaptor is a thin façade over one flavor: it builds an anonymous pass
//! whose `postorder` downcasts the visited node via [`Node::as_any`] and
//! calls the supplied closure only on a match, then runs that pass the normal
//! way. Nodes of any other kind are still traversed - the closure is simply
//! never called for them - exactly as a hand-written pass author would write
//! this themselves if they didn't have the adaptor.

use std::marker::PhantomData;

use travcore_error::Result;

use crate::change_tracker::ChangeOnceHandle;
use crate::config::TraversalConfig;
use crate::context::ContextFrame;
use crate::inspector::{self, Inspector};
use crate::modifier::{self, Modifier};
use crate::node::{Node, NodeKind, NodeRef};
use crate::transform::{self, Transform, TransformHandle};
use crate::visit_registry::VisitOnceHandle;

/// Invoke `f` in postorder for every node downcastable to `N`, read-only.
/// Equivalent to running an [`Inspector`] whose only hook is `postorder`.
pub fn for_all_matching<N, F>(root: NodeRef, f: F, config: &TraversalConfig) -> Result<()>
where
    N: 'static,
    F: FnMut(&N),
{
    struct Adaptor<N, F> {
        f: F,
        _marker: PhantomData<N>,
    }

    impl<N: 'static, F: FnMut(&N)> Inspector for Adaptor<N, F> {
        fn postorder(&mut self, node: &NodeRef, _ctx: &ContextFrame, _once: &VisitOnceHandle) -> Result<()> {
            if let Some(typed) = node.as_any().downcast_ref::<N>() {
                (self.f)(typed);
            }
            Ok(())
        }
    }

    let mut pass = Adaptor { f, _marker: PhantomData };
    inspector::apply(&mut pass, root, config)?;
    Ok(())
}

/// Invoke `f` in postorder for every node downcastable to `N`, with mutable
/// access to the owned clone the driver produces. Returns the new root.
/// Equivalent to running a [`Modifier`] whose only hook is `postorder`.
pub fn modify_all_matching<N, F>(root: NodeRef, f: F, config: &TraversalConfig) -> Result<NodeRef>
where
    N: 'static,
    F: FnMut(&mut N),
{
    struct Adaptor<N, F> {
        f: F,
        _marker: PhantomData<N>,
    }

    impl<N: 'static, F: FnMut(&mut N)> Modifier for Adaptor<N, F> {
        fn postorder(&mut self, node: &mut dyn Node, _ctx: &ContextFrame, _once: &ChangeOnceHandle) -> Result<()> {
            if let Some(typed) = node.as_any_mut().downcast_mut::<N>() {
                (self.f)(typed);
            }
            Ok(())
        }
    }

    let mut pass = Adaptor { f, _marker: PhantomData };
    modifier::apply(&mut pass, root, config)
}

/// Invoke `f` in postorder for every node downcastable to `N`, returning the
/// node to replace it with (or the input, unchanged). Returns the new root.
/// Equivalent to running a [`Transform`] whose only hook is `postorder`.
pub fn transform_all_matching<N, F>(root: NodeRef, f: F, config: &TraversalConfig) -> Result<NodeRef>
where
    N: 'static,
    F: FnMut(&N) -> NodeRef,
{
    struct Adaptor<N, F> {
        f: F,
        _marker: PhantomData<N>,
    }

    impl<N: 'static, F: FnMut(&N) -> NodeRef> Transform for Adaptor<N, F> {
        fn postorder(&mut self, node: NodeRef, _ctx: &ContextFrame, _handle: &TransformHandle) -> Result<NodeRef> {
            if let Some(typed) = node.as_any().downcast_ref::<N>() {
                Ok((self.f)(typed))
            } else {
                Ok(node)
            }
        }
    }

    let mut pass = Adaptor { f, _marker: PhantomData };
    transform::apply(&mut pass, root, config)
}

/// Whether the current node sits in a position that writes, reads, or both.
///
/// Conservative by design: when a classifier can't decide, both flags come
/// back `true` rather than picking one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    pub write: bool,
    pub read: bool,
}

impl Access {
    pub const READ: Access = Access { write: false, read: true };
    pub const WRITE: Access = Access { write: true, read: false };
    pub const BOTH: Access = Access { write: true, read: true };
}

/// A pass's policy for classifying ancestor slots as write/read positions.
///
/// This crate's core has no node vocabulary of its own - it doesn't know
/// which child slots of which node kinds are assignment targets, out
/// parameters, or anything else that implies a write. A pass provides that
/// vocabulary by implementing [`classify_slot`], and the default
/// [`access`](ReadWriteContext::access) walks the ancestor chain asking it at
/// each level until one answers.
pub trait ReadWriteContext {
    /// Does sitting in the named child slot of a node of kind `ancestor_kind`
    /// imply a write, a read, or no opinion (`None`, keep walking up)?
    fn classify_slot(&self, ancestor_kind: NodeKind, child_name: Option<&'static str>) -> Option<Access>;

    /// Walk from `ctx` up through its ancestors, returning the first
    /// classified access. Conservatively returns [`Access::BOTH`] if no
    /// ancestor's slot classifies the position.
    fn access(&self, ctx: &ContextFrame) -> Access {
        let mut cursor = Some(ctx);
        while let Some(frame) = cursor {
            if let Some(parent) = frame.parent() {
                // `parent`'s child_index/child_name describe the slot it is
                // currently descending into, i.e. the slot `frame` occupies.
                if let Some(found) = self.classify_slot(parent.node().kind(), parent.child_name()) {
                    return found;
                }
            }
            cursor = frame.parent();
        }
        Access::BOTH
    }

    /// Convenience: might the current position write?
    fn is_write(&self, ctx: &ContextFrame) -> bool {
        self.access(ctx).write
    }

    /// Convenience: might the current position read?
    fn is_read(&self, ctx: &ContextFrame) -> bool {
        self.access(ctx).read
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Expr;
    use crate::node::node_ref;

    #[test]
    fn for_all_matching_collects_every_lit_in_postorder() {
        let tree = node_ref(Expr::add(Expr::lit(1), Expr::lit(2)));
        let mut values = Vec::new();
        for_all_matching::<Expr, _>(
            tree,
            |expr| {
                if let Expr::Lit(v) = expr {
                    values.push(*v);
                }
            },
            &TraversalConfig::default(),
        )
        .unwrap();
        assert_eq!(values, vec![1, 2]);
    }

    #[test]
    fn modify_all_matching_doubles_every_lit() {
        let tree = node_ref(Expr::add(Expr::lit(1), Expr::lit(2)));
        let result = modify_all_matching::<Expr, _>(
            tree,
            |expr| {
                if let Expr::Lit(v) = expr {
                    *v *= 2;
                }
            },
            &TraversalConfig::default(),
        )
        .unwrap();

        let slots = result.children();
        let Expr::Lit(lhs) = slots[0].node.as_any().downcast_ref::<Expr>().unwrap() else {
            panic!("expected Lit");
        };
        let Expr::Lit(rhs) = slots[1].node.as_any().downcast_ref::<Expr>().unwrap() else {
            panic!("expected Lit");
        };
        assert_eq!((*lhs, *rhs), (2, 4));
    }

    #[test]
    fn transform_all_matching_replaces_every_lit_with_its_negation() {
        let tree = node_ref(Expr::add(Expr::lit(1), Expr::lit(2)));
        let result = transform_all_matching::<Expr, _>(
            tree,
            |expr| {
                let Expr::Lit(v) = expr else { unreachable!() };
                node_ref(Expr::Lit(-v))
            },
            &TraversalConfig::default(),
        )
        .unwrap();

        let slots = result.children();
        let Expr::Lit(lhs) = slots[0].node.as_any().downcast_ref::<Expr>().unwrap() else {
            panic!("expected Lit");
        };
        assert_eq!(*lhs, -1);
    }

    struct LhsIsWrite;
    impl ReadWriteContext for LhsIsWrite {
        fn classify_slot(&self, ancestor_kind: NodeKind, child_name: Option<&'static str>) -> Option<Access> {
            if ancestor_kind == NodeKind("add") && child_name == Some("lhs") {
                Some(Access::WRITE)
            } else if ancestor_kind == NodeKind("add") && child_name == Some("rhs") {
                Some(Access::READ)
            } else {
                None
            }
        }
    }

    #[test]
    fn classify_slot_picks_the_nearest_ancestors_opinion() {
        let root = ContextFrame::root(node_ref(Expr::add(Expr::lit(1), Expr::lit(2))));
        let lhs = ContextFrame::child_of(&root, node_ref(Expr::lit(1)));
        root.set_child_slot(0, Some("lhs"));

        let policy = LhsIsWrite;
        assert!(policy.is_write(&lhs));
        assert!(!policy.is_read(&lhs));
    }

    #[test]
    fn classify_slot_defaults_to_both_when_undecided() {
        let root = ContextFrame::root(node_ref(Expr::lit(5)));
        let policy = LhsIsWrite;
        assert_eq!(policy.access(&root), Access::BOTH);
    }
}

//! The ancestor context stack (component A) a hook sees during descent.
//!
//! A [`ContextFrame`] is created when the driver descends into a node and
//! dropped when it ascends back out - its lifetime is borrowed from the
//! recursive call that owns it, not heap-allocated, so the chain from the
//! currently visited node back to the root costs nothing beyond the call
//! stack itself. Hooks never see a global "current node"; everything they can
//! ask about context goes through the frame the driver hands them.

use std::cell::Cell;
use std::cell::RefCell;

use crate::node::{NodeIdentity, NodeKind, NodeRef};

/// One level of in-progress traversal.
///
/// `node` may be rewritten mid-descent (Transform replaces it once a hook
/// returns something new); `original` never changes after the frame is
/// created and is what `ancestor_of_kind`/`contains_identity` fall back to
/// when a hook wants to recognise a node regardless of whether it has
/// already been rebuilt on this pass.
pub struct ContextFrame<'ctx> {
    parent: Option<&'ctx ContextFrame<'ctx>>,
    node: RefCell<NodeRef>,
    original: NodeRef,
    child_index: Cell<usize>,
    child_name: Cell<Option<&'static str>>,
    depth: usize,
}

impl<'ctx> ContextFrame<'ctx> {
    /// Build the root frame (`depth == 0`, no parent).
    pub fn root(node: NodeRef) -> Self {
        ContextFrame {
            parent: None,
            node: RefCell::new(node.clone()),
            original: node,
            child_index: Cell::new(0),
            child_name: Cell::new(None),
            depth: 0,
        }
    }

    /// Build the frame for a descent from `parent` into `node`.
    pub fn child_of(parent: &'ctx ContextFrame<'ctx>, node: NodeRef) -> Self {
        ContextFrame {
            parent: Some(parent),
            node: RefCell::new(node.clone()),
            original: node,
            child_index: Cell::new(0),
            child_name: Cell::new(None),
            depth: parent.depth + 1,
        }
    }

    /// The node currently being visited at this frame, possibly already
    /// rebuilt by a Transform hook earlier in this same descent.
    pub fn node(&self) -> NodeRef {
        self.node.borrow().clone()
    }

    /// Overwrite the frame's current node. Called by the driver after a
    /// flavor's `preorder` hook returns a replacement; never called by hooks
    /// directly.
    pub(crate) fn set_node(&self, node: NodeRef) {
        *self.node.borrow_mut() = node;
    }

    /// The node as it stood before any replacement on this pass.
    pub fn original(&self) -> &NodeRef {
        &self.original
    }

    /// Distance from the root frame; the root is depth `0`.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The enclosing frame, or `None` at the root.
    pub fn parent(&self) -> Option<&'ctx ContextFrame<'ctx>> {
        self.parent
    }

    /// Index of the child slot currently being descended into.
    pub fn child_index(&self) -> usize {
        self.child_index.get()
    }

    /// Textual label of the child slot currently being descended into, if any.
    pub fn child_name(&self) -> Option<&'static str> {
        self.child_name.get()
    }

    /// Record which slot the driver is about to descend into. Called once per
    /// child before `apply_visitor` recurses.
    pub(crate) fn set_child_slot(&self, index: usize, name: Option<&'static str>) {
        self.child_index.set(index);
        self.child_name.set(name);
    }

    /// Walk the parent chain and return the nearest ancestor frame whose
    /// current node or original node is of kind `kind`.
    pub fn ancestor_of_kind(&self, kind: NodeKind) -> Option<&'ctx ContextFrame<'ctx>> {
        let mut cursor = self.parent;
        while let Some(frame) = cursor {
            if frame.node().kind() == kind || frame.original.kind() == kind {
                return Some(frame);
            }
            cursor = frame.parent;
        }
        None
    }

    /// Is `id` the identity of this frame or any ancestor's current/original
    /// node? Used to keep the `current -> parent -> ... -> root` chain free
    /// of duplicate identities.
    pub fn contains_identity(&self, id: NodeIdentity) -> bool {
        let mut cursor = Some(self);
        while let Some(frame) = cursor {
            if NodeIdentity::of(&frame.node()) == id || NodeIdentity::of(&frame.original) == id {
                return true;
            }
            cursor = frame.parent;
        }
        false
    }
}

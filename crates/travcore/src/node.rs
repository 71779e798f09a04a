//! The minimal Node capability the traversal core consumes from a concrete IR.
//!
//! This module defines the seam between the traversal engine and whatever
//! tree/DAG of IR nodes a downstream crate builds. The core is deliberately
//! ignorant of node kinds, fields, and constructors (see the crate's top-level
//! docs for why that boundary exists) - it only asks that a node can report its
//! kind, enumerate its children, be cloned, and be rebuilt with substituted
//! children.
//!
//! # Identity
//!
//! Nodes are immutable, reference-identified values: equal value does not imply
//! equal identity, and the core never compares nodes structurally. Identity is
//! modeled as the address of the allocation behind an `Rc<dyn Node>`, which lets
//! [`NodeRef`] clones (cheap, shared) be told apart from a genuinely new node
//! produced by a Transform pass.
//!
//! # Thread Safety
//!
//! `NodeRef` is `Rc`-based, matching the single-threaded, synchronous scheduling
//! model described in the crate's resource-model docs: traversal never crosses
//! a thread boundary, so there is no need to pay for atomic refcounting.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

/// Most IR nodes have a handful of child slots (binary operators, short
/// argument lists, a handful of statements); `children()` returns this
/// inline-storage vector instead of a heap-allocated `Vec` so enumerating a
/// node the driver is about to descend into doesn't allocate in the common
/// case.
pub type ChildSlots = SmallVec<[ChildSlot; 4]>;

/// A runtime-dispatchable kind tag for an IR node.
///
/// The traversal core treats this as an opaque, comparable tag; it never
/// interprets the string itself. Downstream crates typically back this with a
/// `#[derive(Display)]` enum and hand out `NodeKind(Self::VARIANT_NAME)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKind(pub &'static str);

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identity of a node for the lifetime of a single pass.
///
/// Two [`NodeRef`]s referring to the same allocation always produce the same
/// `NodeIdentity`; a node rebuilt by `with_children` always produces a
/// different one, even if its children are unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeIdentity(usize);

impl NodeIdentity {
    pub fn of(node: &NodeRef) -> Self {
        NodeIdentity(Rc::as_ptr(node) as *const () as usize)
    }
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{:x}", self.0)
    }
}

/// One immediate child of a node, as enumerated in declared (source) order.
#[derive(Clone)]
pub struct ChildSlot {
    /// Position among this node's children, starting at 0.
    pub index: usize,
    /// Optional textual label for the slot (e.g. "lhs", "condition", "body").
    pub name: Option<&'static str>,
    /// The child occupying this slot.
    pub node: NodeRef,
}

/// The capability a concrete IR node type must provide to be walked by this
/// crate.
///
/// Implementors are expected to be cheap to enumerate (`children`) and cheap
/// to clone (`clone_boxed`); both are called once per visit by the driver.
pub trait Node: fmt::Debug {
    /// The runtime kind tag used for dispatch and kind-tests.
    fn kind(&self) -> NodeKind;

    /// Enumerate this node's immediate children in declared order.
    fn children(&self) -> ChildSlots;

    /// Construct a new node identical to `self` except that `new_children`
    /// replaces the full child list. Used by the Transform flavor to rebuild a
    /// parent once one of its children changes identity; callers normally
    /// reuse the unchanged entries from `children()` and substitute only the
    /// slots that actually changed.
    fn with_children(&self, new_children: Vec<NodeRef>) -> NodeRef;

    /// Overwrite a single child slot in place. Used by the Modifier flavor on
    /// the owned clone the driver produced via `clone_boxed` - never on a node
    /// still shared through a `NodeRef`.
    ///
    /// # Panics
    /// Implementations should panic if `index` is out of bounds; the driver
    /// never calls this with an index it did not just read from `children()`.
    fn set_child(&mut self, index: usize, new_child: NodeRef);

    /// Produce an owned, independently mutable copy of this node.
    fn clone_boxed(&self) -> Box<dyn Node>;

    /// Expose this node for downcasting to its concrete type. Backs the
    /// `*_all_matching` adaptors, which dispatch on a concrete Rust type the
    /// way the original dispatched on a C++ subclass via RTTI.
    fn as_any(&self) -> &dyn Any;

    /// Mutable counterpart of [`as_any`](Node::as_any), used by
    /// `modify_all_matching`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A shared handle to an immutable IR node.
///
/// Cloning a `NodeRef` is a refcount bump, not a deep copy; the identity
/// captured by [`NodeIdentity::of`] is stable across such clones.
pub type NodeRef = Rc<dyn Node>;

/// Convenience constructor mirroring `Rc::new` for readability at call sites.
pub fn node_ref<N: Node + 'static>(node: N) -> NodeRef {
    Rc::new(node)
}

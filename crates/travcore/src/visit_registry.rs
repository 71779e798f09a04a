//! Component C - the visit-once registry Inspector consults for DAG dedup and
//! loop detection.
//!
//! Unlike the change tracker, this registry is shared: a control-flow
//! Inspector's `flow_clone`d branches must all see the same record of what
//! has already been entered (see the design note on sharing dedup memos
//! across clones), so the registry is built to live behind an `Rc` from the
//! start rather than being cloned per branch.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::node::NodeIdentity;

struct VisitRecord {
    done: bool,
    visit_once: bool,
}

/// What the driver learns when it asks the registry about a node it is about
/// to descend into.
pub enum VisitLookup {
    /// First arrival; proceed to `preorder`.
    Fresh,
    /// Already finished and visit-once is in effect; fire `revisit` instead.
    AlreadyVisited,
    /// A descent into this identity is already in progress - a cycle.
    Cycle,
}

/// Per-pass record of which node identities have been entered, and whether
/// each one should be skipped (visit-once) or walked again on a later
/// arrival.
pub struct VisitRegistry {
    records: RefCell<HashMap<NodeIdentity, VisitRecord>>,
    default_visit_once: bool,
}

impl VisitRegistry {
    pub fn new(default_visit_once: bool) -> Self {
        VisitRegistry {
            records: RefCell::new(HashMap::new()),
            default_visit_once,
        }
    }

    /// Called by the driver when descent reaches `id`.
    pub fn enter(&self, id: NodeIdentity) -> VisitLookup {
        match self.records.borrow().get(&id) {
            None => VisitLookup::Fresh,
            Some(record) if !record.done => VisitLookup::Cycle,
            Some(record) if record.visit_once => VisitLookup::AlreadyVisited,
            Some(_) => VisitLookup::Fresh,
        }
    }

    /// Mark `id` as currently being descended into.
    pub fn mark_visiting(&self, id: NodeIdentity) {
        self.records.borrow_mut().insert(
            id,
            VisitRecord {
                done: false,
                visit_once: self.default_visit_once,
            },
        );
    }

    /// Mark `id` as finished; postorder has fired for it.
    pub fn exit(&self, id: NodeIdentity) {
        let mut records = self.records.borrow_mut();
        let visit_once = records
            .get(&id)
            .map(|r| r.visit_once)
            .unwrap_or(self.default_visit_once);
        records.insert(
            id,
            VisitRecord {
                done: true,
                visit_once,
            },
        );
    }

    /// Has `id` already completed its postorder on this pass?
    pub fn is_done(&self, id: NodeIdentity) -> bool {
        matches!(self.records.borrow().get(&id), Some(r) if r.done)
    }

    /// Turn visit-once off for `id`: future arrivals at this identity will
    /// fire `preorder`/`postorder` again instead of `revisit`.
    pub fn visit_again(&self, id: NodeIdentity) {
        if let Some(record) = self.records.borrow_mut().get_mut(&id) {
            record.visit_once = false;
        }
    }

    /// Turn visit-once back on for `id`.
    pub fn visit_once(&self, id: NodeIdentity) {
        if let Some(record) = self.records.borrow_mut().get_mut(&id) {
            record.visit_once = true;
        }
    }

    /// Whether a second arrival at `id` is currently configured to be
    /// skipped in favour of `revisit`.
    pub fn is_visit_once(&self, id: NodeIdentity) -> bool {
        self.records
            .borrow()
            .get(&id)
            .map(|r| r.visit_once)
            .unwrap_or(self.default_visit_once)
    }
}

/// Handed to an Inspector's `preorder`/`postorder` so it can toggle
/// visit-once for the node it is currently visiting, without the pass
/// needing a reference to the registry itself.
pub struct VisitOnceHandle<'a> {
    registry: &'a VisitRegistry,
    current: NodeIdentity,
}

impl<'a> VisitOnceHandle<'a> {
    pub(crate) fn new(registry: &'a VisitRegistry, current: NodeIdentity) -> Self {
        VisitOnceHandle { registry, current }
    }

    /// The current node's next DAG arrival fires `preorder`/`postorder` again
    /// instead of being skipped in favour of `revisit`.
    pub fn visit_again(&self) {
        self.registry.visit_again(self.current);
    }

    /// Restore visit-once for the current node.
    pub fn visit_once(&self) {
        self.registry.visit_once(self.current);
    }
}

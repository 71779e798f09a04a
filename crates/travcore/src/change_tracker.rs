//! Component B - the per-pass change tracker Modifier and Transform consult
//! to decide whether a parent needs to be rebuilt.
//!
//! Keyed by the *original* node's identity, it remembers whether a descent
//! returned the same identity (`Unchanged`), a different one (`Replaced`), or
//! is still in progress (`Visiting`, the cycle-detection flag). A parent asks
//! the tracker what each child resolved to: if every child came back
//! `Unchanged`, the parent reuses its own original identity instead of
//! rebuilding (structural sharing).

use std::cell::RefCell;
use std::collections::HashMap;

use travcore_error::{Error, Result};

use crate::node::{NodeIdentity, NodeRef};

/// The recorded outcome of resolving one original node on this pass.
#[derive(Clone)]
enum Outcome {
    /// The descent finished and returned the same identity it was given.
    Unchanged(NodeRef),
    /// The descent finished and returned a different node.
    Replaced(NodeRef),
    /// The descent is still in progress.
    Visiting,
}

struct ChangeRecord {
    outcome: Outcome,
    visit_once: bool,
}

/// What the driver learns when it asks the tracker about a node it is about
/// to descend into.
pub enum ChangeLookup {
    /// No record yet; this is a fresh descent.
    NotSeen,
    /// A descent is already in progress for this identity.
    Visiting,
    /// A previous descent finished with this result, and visit-once is still
    /// in effect: later arrivals should reuse `result` rather than re-descend.
    Done(NodeRef),
    /// A previous descent finished, but a hook called `visit_again` on this
    /// identity: the next arrival should be treated as a fresh descent.
    ForgetAndRevisit(NodeRef),
}

/// A single pass's memo of original-node-identity to [`ChangeRecord`].
///
/// Not shared across flavor instances: Modifier and Transform never clone
/// visitor state the way control-flow Inspectors do, so one tracker per
/// `apply` call is enough.
pub struct ChangeTracker {
    records: RefCell<HashMap<NodeIdentity, ChangeRecord>>,
    default_visit_once: bool,
}

impl ChangeTracker {
    pub fn new(default_visit_once: bool) -> Self {
        ChangeTracker {
            records: RefCell::new(HashMap::new()),
            default_visit_once,
        }
    }

    /// Record that descent into `id` has begun. Fails with `LoopDetected` if
    /// `id` is already `Visiting` - a back-edge in the IR.
    pub fn begin(&self, id: NodeIdentity) -> Result<()> {
        let mut records = self.records.borrow_mut();
        if let Some(ChangeRecord {
            outcome: Outcome::Visiting,
            ..
        }) = records.get(&id)
        {
            return Err(Error::loop_detected(id));
        }
        records.insert(
            id,
            ChangeRecord {
                outcome: Outcome::Visiting,
                visit_once: self.default_visit_once,
            },
        );
        Ok(())
    }

    /// Record the terminal outcome of a descent: `Unchanged` if `result` is
    /// the same identity as `original`, `Replaced(result)` otherwise.
    pub fn finish(&self, original: NodeIdentity, result: &NodeRef) {
        let outcome = if NodeIdentity::of(result) == original {
            Outcome::Unchanged(result.clone())
        } else {
            Outcome::Replaced(result.clone())
        };
        let visit_once = self
            .records
            .borrow()
            .get(&original)
            .map(|r| r.visit_once)
            .unwrap_or(self.default_visit_once);
        self.records
            .borrow_mut()
            .insert(original, ChangeRecord { outcome, visit_once });
    }

    /// Remove any record of `id` so a later re-descent is a fresh visit. Used
    /// by hooks that call `visit_again` on an already-resolved node.
    pub fn forget(&self, id: NodeIdentity) {
        self.records.borrow_mut().remove(&id);
    }

    /// Turn visit-once off for `id`: the next arrival at this identity will be
    /// treated as a fresh descent instead of reusing the recorded result.
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

    /// Look up the current state of `id` without mutating it.
    pub fn lookup(&self, id: NodeIdentity) -> ChangeLookup {
        match self.records.borrow().get(&id) {
            None => ChangeLookup::NotSeen,
            Some(ChangeRecord {
                outcome: Outcome::Visiting,
                ..
            }) => ChangeLookup::Visiting,
            Some(ChangeRecord {
                outcome: Outcome::Unchanged(node) | Outcome::Replaced(node),
                visit_once: true,
            }) => ChangeLookup::Done(node.clone()),
            Some(ChangeRecord {
                outcome: Outcome::Unchanged(node) | Outcome::Replaced(node),
                visit_once: false,
            }) => ChangeLookup::ForgetAndRevisit(node.clone()),
        }
    }

    /// [`lookup`](Self::lookup) folded onto [`crate::flavor::Consult`], the
    /// shape `driver::apply_visitor` actually wants. Shared by Modifier and
    /// Transform so the "forget on `ForgetAndRevisit`, then report fresh"
    /// dance only has to be written once.
    pub fn consult(&self, id: NodeIdentity) -> crate::flavor::Consult {
        use crate::flavor::Consult;
        match self.lookup(id) {
            ChangeLookup::NotSeen => Consult::Fresh,
            ChangeLookup::Visiting => Consult::Cycle,
            ChangeLookup::Done(node) => Consult::AlreadyVisited(node),
            ChangeLookup::ForgetAndRevisit(_) => {
                self.forget(id);
                Consult::Fresh
            }
        }
    }
}

/// Handed to a Modifier/Transform hook so it can toggle visit-once for the
/// node it is currently visiting, mirroring [`crate::visit_registry::VisitOnceHandle`]
/// but backed by the change tracker instead of the plain registry.
pub struct ChangeOnceHandle<'a> {
    tracker: &'a ChangeTracker,
    current: NodeIdentity,
}

impl<'a> ChangeOnceHandle<'a> {
    pub(crate) fn new(tracker: &'a ChangeTracker, current: NodeIdentity) -> Self {
        ChangeOnceHandle { tracker, current }
    }

    /// The current node's next DAG arrival is treated as a fresh descent
    /// instead of reusing the recorded result.
    pub fn visit_again(&self) {
        self.tracker.visit_again(self.current);
    }

    /// Restore visit-once for the current node.
    pub fn visit_once(&self) {
        self.tracker.visit_once(self.current);
    }
}

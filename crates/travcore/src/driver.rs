//! Component D - the generic depth-first driver every flavor shares.
//!
//! `apply_visitor` is flavor-agnostic: it pushes context frames, consults
//! whatever memo the flavor hands back, and dispatches the six-step
//! algorithm described in the traversal design (defer for control flow,
//! consult the memo, push a frame, run `preorder`, descend children, run
//! `postorder`, record and pop). Everything flavor-specific - what
//! `preorder`/`postorder` return, which memo backs `consult`, how a parent
//! gets rebuilt after a child changes - lives behind the [`Flavor`] trait.

use tracing::{debug, trace, warn};

use travcore_error::Result;

use crate::config::TraversalConfig;
use crate::context::ContextFrame;
use crate::flavor::{Consult, Descend, Flavor};
use crate::node::{NodeIdentity, NodeRef};

/// Visit `node`, which sits in slot `child_index` (optionally named
/// `child_name`) of `parent_ctx` (or is the pass root, when `parent_ctx` is
/// `None`). Returns the node to store back in that slot.
pub fn apply_visitor<'ctx, F: Flavor>(
    flavor: &mut F,
    config: &TraversalConfig,
    parent_ctx: Option<&'ctx ContextFrame<'ctx>>,
    node: NodeRef,
    child_index: usize,
    child_name: Option<&'static str>,
) -> Result<NodeRef> {
    let depth = parent_ctx.map(|f| f.depth() + 1).unwrap_or(0);
    if depth >= config.stack_growth_depth {
        let bytes = config.stack_growth_bytes;
        stacker::maybe_grow(bytes / 4, bytes, || {
            apply_visitor_inner(flavor, config, parent_ctx, node, child_index, child_name)
        })
    } else {
        apply_visitor_inner(flavor, config, parent_ctx, node, child_index, child_name)
    }
}

fn apply_visitor_inner<'ctx, F: Flavor>(
    flavor: &mut F,
    config: &TraversalConfig,
    parent_ctx: Option<&'ctx ContextFrame<'ctx>>,
    node: NodeRef,
    child_index: usize,
    child_name: Option<&'static str>,
) -> Result<NodeRef> {
    // Step 1: control-flow defer. Only control-flow-enabled Inspectors ever
    // return true here; everyone else's `join_flows` is the default no-op.
    if flavor.join_flows(parent_ctx, &node)? {
        trace!(node = %NodeIdentity::of(&node), "deferred to join-point table");
        return Ok(node);
    }

    let id = NodeIdentity::of(&node);

    // Step 2: consult the memo.
    match flavor.consult(id, &node) {
        Consult::AlreadyVisited(result) => {
            trace!(node = %id, "revisit (already resolved)");
            flavor.revisit(parent_ctx, &node)?;
            return Ok(result);
        }
        Consult::Cycle => {
            if config.fatal_loop_revisit {
                warn!(node = %id, "cycle detected, invoking loop_revisit");
                return flavor.loop_revisit(parent_ctx, &node);
            }
            trace!(node = %id, "cycle detected, suppressed by config.fatal_loop_revisit=false");
            return Ok(node);
        }
        Consult::Fresh => {
            flavor.begin(id);
        }
    }

    // Step 3: push the context frame for this descent.
    let frame = match parent_ctx {
        Some(parent) => ContextFrame::child_of(parent, node.clone()),
        None => ContextFrame::root(node.clone()),
    };
    if let Some(parent) = parent_ctx {
        parent.set_child_slot(child_index, child_name);
    }
    debug!(node = %id, depth = frame.depth(), "preorder");

    // Step 4: preorder.
    let (mut current, descend) = flavor.preorder(&frame, node)?;
    frame.set_node(current.clone());

    // Step 5: descend into children, unless pruned or the driver-level
    // `dont_forward_children_before_preorder` policy suppresses it outright.
    let should_descend = descend == Descend::Continue && !flavor.skip_children_before_preorder();
    if should_descend {
        for slot in current.children() {
            frame.set_child_slot(slot.index, slot.name);
            let child_result = apply_visitor(
                flavor,
                config,
                Some(&frame),
                slot.node,
                slot.index,
                slot.name,
            )?;
            current = flavor.apply_child_result(&frame, current, slot.index, child_result);
            frame.set_node(current.clone());
        }
    }

    // Step 6: postorder. A pruned Inspector/Modifier node never reaches
    // postorder; a pruned Transform node still does (`prune()` only
    // suppresses descent, not the rebuild).
    let result = if descend == Descend::Prune && !flavor.postorder_runs_after_prune() {
        current
    } else {
        flavor.postorder(&frame, current)?
    };
    trace!(node = %id, result = %NodeIdentity::of(&result), "postorder");

    // Step 7: record and return; the frame is dropped as this call returns.
    flavor.finish(id, &result);
    Ok(result)
}

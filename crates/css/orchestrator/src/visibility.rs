//! Effective visibility of output nodes.
//!
//! A node is hidden when anything on its ancestor chain is `VisibleFalse`.
//! Otherwise the nearest node (itself included) that is either
//! `VisibleTrue` or blocks output decides: `VisibleTrue` shows it, a
//! blocking node hides it. Without either the node is shown.

use crate::tree::{NodeKind, Tree, Visibility};
use core::iter::once;
use indextree::NodeId;
use log::trace;

/// Whether `id` is emitted by a serializer.
pub fn is_effectively_visible(tree: &Tree, id: NodeId) -> bool {
    let mut decided = None;
    for current in once(id).chain(tree.ancestors(id)) {
        let Some(node) = tree.node(current) else {
            continue;
        };
        match node.visibility {
            Visibility::VisibleFalse => return false,
            Visibility::VisibleTrue => decided = decided.or(Some(true)),
            Visibility::Inherit if node.blocks_output => decided = decided.or(Some(false)),
            Visibility::Inherit => {}
        }
    }
    decided.unwrap_or(true)
}

/// Children of `id` that are effectively visible, in order.
pub fn visible_children(tree: &Tree, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    tree.children(id)
        .into_iter()
        .filter(move |child| is_effectively_visible(tree, *child))
}

/// Remove rule blocks without children, then conditional at-rules left
/// empty. Returns the number of removed nodes.
pub fn prune_empty(tree: &mut Tree) -> usize {
    let mut removed = 0usize;
    let mut order = tree.descendants(tree.root());
    order.reverse();
    for id in order {
        let prunable = matches!(
            tree.kind(id),
            Some(NodeKind::RuleBlock { .. } | NodeKind::ConditionalAtRule { .. })
        );
        if prunable && tree.children(id).is_empty() {
            trace!(target: "css_orchestrator", "pruning empty {:?}", tree.kind(id));
            tree.remove(id);
            removed = removed.saturating_add(1);
        }
    }
    removed
}

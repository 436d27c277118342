//! At-rule bubbling.
//!
//! A conditional at-rule nested in at-rules of the same kind is moved out
//! next to its outermost ancestor, with a prelude that is the cartesian
//! product of the whole chain: `@media A { @media B {} }` becomes
//! `@media A {} @media A and B {}`.

use crate::tree::{NodeKind, Tree};
use css_media_queries::{FeatureList, permute};
use indextree::NodeId;
use log::debug;
use std::collections::BTreeMap;

/// Same-kind chain from the outermost conditional at-rule down to `id`.
///
/// Returns `None` when `id` is not a conditional at-rule or when any
/// enclosing at-rule has a different kind.
fn same_kind_chain(tree: &Tree, id: NodeId) -> Option<Vec<(NodeId, &FeatureList)>> {
    let Some(NodeKind::ConditionalAtRule { name, features }) = tree.kind(id) else {
        return None;
    };
    let mut chain = vec![(id, features)];
    for ancestor in tree.ancestors(id) {
        match tree.kind(ancestor) {
            Some(NodeKind::ConditionalAtRule {
                name: outer,
                features: outer_features,
            }) if outer.eq_ignore_ascii_case(name) => chain.push((ancestor, outer_features)),
            Some(NodeKind::ConditionalAtRule { .. } | NodeKind::AtRule { .. }) => return None,
            _ => {}
        }
    }
    chain.reverse();
    Some(chain)
}

/// Combined feature list of `id` and its same-kind ancestors, outermost
/// first. A node with a different-kind at-rule above it, or no at-rule
/// ancestor at all, keeps its own features.
pub fn flatten_nested_at_rule(tree: &Tree, id: NodeId) -> Option<FeatureList> {
    let own = match tree.kind(id) {
        Some(NodeKind::ConditionalAtRule { features, .. }) => features.clone(),
        _ => return None,
    };
    let Some(chain) = same_kind_chain(tree, id) else {
        return Some(own);
    };
    let path: Vec<FeatureList> = chain
        .into_iter()
        .map(|(_, features)| features.clone())
        .collect();
    Some(permute(&path))
}

/// Move every nested conditional at-rule out of its same-kind ancestors,
/// keeping document order. Returns the number of moved at-rules.
pub fn bubble_at_rules(tree: &mut Tree) -> usize {
    // Features are computed before any move so each chain is seen as written.
    let mut moves = Vec::new();
    for id in tree.descendants(tree.root()) {
        let Some(chain) = same_kind_chain(tree, id) else {
            continue;
        };
        let Some(&(outermost, _)) = chain.first() else {
            continue;
        };
        if outermost == id {
            continue;
        }
        let path: Vec<FeatureList> = chain
            .iter()
            .map(|&(_, features)| features.clone())
            .collect();
        moves.push((id, outermost, permute(&path)));
    }

    let mut last_placed: BTreeMap<NodeId, NodeId> = BTreeMap::new();
    for (id, outermost, combined) in &moves {
        if let Some(node) = tree.node_mut(*id)
            && let NodeKind::ConditionalAtRule { features, .. } = &mut node.kind
        {
            debug!(target: "css_bubbling", "bubbling '{features}' to '{combined}'");
            features.clone_from(combined);
        }
        let anchor = last_placed.get(outermost).copied().unwrap_or(*outermost);
        tree.detach(*id);
        tree.insert_after(anchor, *id);
        last_placed.insert(*outermost, *id);
    }
    moves.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use css_media_queries::parse_feature_list;

    fn media(tree: &mut Tree, parent: NodeId, prelude: &str) -> NodeId {
        tree.append(
            parent,
            NodeKind::ConditionalAtRule {
                name: "media".to_owned(),
                features: parse_feature_list(prelude),
            },
        )
    }

    fn preludes(tree: &Tree) -> Vec<String> {
        tree.children(tree.root())
            .into_iter()
            .filter_map(|id| match tree.kind(id) {
                Some(NodeKind::ConditionalAtRule { features, .. }) => Some(features.to_string()),
                _ => None,
            })
            .collect()
    }

    /// Nested media queries combine into one list per level.
    ///
    /// # Panics
    /// Panics if assertions fail.
    #[test]
    fn bubbles_in_document_order() {
        let mut tree = Tree::new("test.less");
        let root = tree.root();
        let outer = media(&mut tree, root, "(orientation: landscape), (orientation: portrait)");
        let middle = media(&mut tree, outer, "(min-width: 200px)");
        media(&mut tree, middle, "print");
        media(&mut tree, outer, "(max-width: 900px)");

        assert_eq!(
            flatten_nested_at_rule(&tree, middle).map(|list| list.to_string()),
            Some(
                "(orientation: landscape) and (min-width: 200px), \
                 (orientation: portrait) and (min-width: 200px)"
                    .to_owned()
            )
        );
        assert_eq!(bubble_at_rules(&mut tree), 3);
        assert_eq!(
            preludes(&tree),
            vec![
                "(orientation: landscape), (orientation: portrait)".to_owned(),
                "(orientation: landscape) and (min-width: 200px), \
                 (orientation: portrait) and (min-width: 200px)"
                    .to_owned(),
                "(orientation: landscape) and (min-width: 200px) and print, \
                 (orientation: portrait) and (min-width: 200px) and print"
                    .to_owned(),
                "(orientation: landscape) and (max-width: 900px), \
                 (orientation: portrait) and (max-width: 900px)"
                    .to_owned(),
            ]
        );
    }

    /// A different kind of at-rule in between stops bubbling.
    ///
    /// # Panics
    /// Panics if assertions fail.
    #[test]
    fn different_kinds_stay() {
        let mut tree = Tree::new("test.less");
        let root = tree.root();
        let outer = media(&mut tree, root, "screen");
        let supports = tree.append(
            outer,
            NodeKind::ConditionalAtRule {
                name: "supports".to_owned(),
                features: parse_feature_list("(display: grid)"),
            },
        );
        let inner = media(&mut tree, supports, "print");
        assert_eq!(bubble_at_rules(&mut tree), 0);
        assert_eq!(tree.parent(inner), Some(supports));
        assert_eq!(
            flatten_nested_at_rule(&tree, inner).map(|list| list.to_string()),
            Some("print".to_owned())
        );
    }
}

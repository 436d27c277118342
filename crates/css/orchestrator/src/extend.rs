//! Extend resolution over the output tree.
//!
//! Every `:extend` clause found on a rule block selector is applied to the
//! rule blocks of its at-rule block, nested at-rules included (or of the top
//! level, never inside an at-rule) until a pass adds nothing. Selectors produced by an extension remember which extenders
//! produced them, on the output node, so an extender is never applied to its
//! own product, cycles end and later runs add nothing.

use crate::error::ErrorKind;
use crate::tree::{NodeKind, Tree};
use css_selectors::{ExtendClause, ExtendMode, Selector, find_matches, matches_exact, replace_matches};
use indextree::NodeId;
use log::{debug, trace};
use std::collections::{BTreeMap, BTreeSet};

/// Outcome of one extend resolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExtendReport {
    /// Passes over the clauses, including the final one that added nothing.
    pub passes: usize,
    /// Selectors added to rule blocks.
    pub added: usize,
    /// Applications refused because the extender already produced the selector.
    pub cycles_skipped: usize,
}

/// A rule block under resolution.
struct Block {
    id: NodeId,
    /// Enclosing at-rules, innermost first; empty at the top level.
    scopes: Vec<NodeId>,
    selectors: Vec<Selector>,
    /// Keys of the extenders each selector was produced by.
    provenance: Vec<BTreeSet<String>>,
}

/// One clause together with the selector that declared it.
struct Extension {
    extender: Selector,
    key: String,
    clause: ExtendClause,
    /// Nearest enclosing at-rule of the declaring block.
    scope: Option<NodeId>,
}

impl Extension {
    fn reaches(&self, block: &Block) -> bool {
        self.scope
            .map_or(block.scopes.is_empty(), |scope| block.scopes.contains(&scope))
    }
}

fn enclosing_at_rules(tree: &Tree, id: NodeId) -> Vec<NodeId> {
    tree.ancestors(id)
        .filter(|ancestor| {
            matches!(
                tree.kind(*ancestor),
                Some(NodeKind::ConditionalAtRule { .. } | NodeKind::AtRule { .. })
            )
        })
        .collect()
}

fn collect_blocks(tree: &Tree) -> Vec<Block> {
    tree.descendants(tree.root())
        .into_iter()
        .filter_map(|id| {
            let node = tree.node(id)?;
            let NodeKind::RuleBlock { selectors, .. } = &node.kind else {
                return None;
            };
            let mut provenance = node.extended_by.clone();
            provenance.resize(selectors.len(), BTreeSet::new());
            Some(Block {
                id,
                scopes: enclosing_at_rules(tree, id),
                provenance,
                selectors: selectors.clone(),
            })
        })
        .collect()
}

fn collect_extensions(blocks: &[Block]) -> Vec<Extension> {
    blocks
        .iter()
        .flat_map(|block| {
            block.selectors.iter().flat_map(move |selector| {
                let extender = selector.without_extends();
                selector.extends.iter().map(move |clause| Extension {
                    key: extender.key(),
                    extender: extender.clone(),
                    clause: clause.clone(),
                    scope: block.scopes.first().copied(),
                })
            })
        })
        .collect()
}

/// Selector that `extension` produces from `selector`, if it matches.
fn produce(extension: &Extension, selector: &Selector) -> Option<Selector> {
    let target = &extension.clause.target;
    match extension.clause.mode {
        ExtendMode::Exact => {
            matches_exact(target, selector).then(|| extension.extender.clone())
        }
        ExtendMode::All => (!find_matches(target, selector).is_empty())
            .then(|| replace_matches(selector, target, &extension.extender)),
    }
}

/// Rule blocks of each at-rule scope, by index into `blocks`, in document
/// order. Exact clauses only look up blocks declaring their target.
fn index_blocks(blocks: &[Block]) -> BTreeMap<String, Vec<usize>> {
    let mut index: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (position, block) in blocks.iter().enumerate() {
        for selector in &block.selectors {
            let entry = index.entry(selector.key()).or_default();
            if entry.last() != Some(&position) {
                entry.push(position);
            }
        }
    }
    index
}

/// Apply `extension` to one block. Returns the number of selectors added.
fn apply(
    extension: &Extension,
    block: &mut Block,
    applied: &mut BTreeSet<(String, String, NodeId)>,
    report: &mut ExtendReport,
) -> usize {
    let mut added = 0usize;
    let existing = block.selectors.len();
    for index in 0..existing {
        let (Some(selector), Some(origin)) = (block.selectors.get(index), block.provenance.get(index))
        else {
            continue;
        };
        if selector.same_elements(&extension.extender) {
            continue;
        }
        let Some(produced) = produce(extension, selector) else {
            continue;
        };
        if origin.contains(&extension.key) {
            report.cycles_skipped = report.cycles_skipped.saturating_add(1);
            debug!(
                target: "css_extend",
                "{} skipped: '{}' was produced by '{}'",
                ErrorKind::CircularExtend,
                selector,
                extension.key
            );
            continue;
        }
        if block
            .selectors
            .iter()
            .any(|present| present.same_elements(&produced))
            || !applied.insert((extension.key.clone(), produced.key(), block.id))
        {
            continue;
        }
        let mut lineage = origin.clone();
        lineage.insert(extension.key.clone());
        trace!(target: "css_extend", "'{}' adds '{produced}'", extension.key);
        block.selectors.push(produced);
        block.provenance.push(lineage);
        added = added.saturating_add(1);
    }
    added
}

/// Resolve every extend clause of `tree` in place.
///
/// Never fails: cycles are skipped. Clauses stay on their selectors, so a
/// second run finds nothing new to add.
pub fn resolve_extends(tree: &mut Tree) -> ExtendReport {
    let mut blocks = collect_blocks(tree);
    let extensions = collect_extensions(&blocks);
    let mut report = ExtendReport::default();
    if extensions.is_empty() {
        return report;
    }
    let mut applied = BTreeSet::new();
    loop {
        report.passes = report.passes.saturating_add(1);
        let index = index_blocks(&blocks);
        let mut added = 0usize;
        for extension in &extensions {
            let targets: Vec<usize> = match extension.clause.mode {
                ExtendMode::Exact => index
                    .get(&extension.clause.target.key())
                    .cloned()
                    .unwrap_or_default(),
                ExtendMode::All => (0..blocks.len()).collect(),
            };
            for position in targets {
                let Some(block) = blocks.get_mut(position) else {
                    continue;
                };
                if !extension.reaches(block) {
                    continue;
                }
                added = added.saturating_add(apply(extension, block, &mut applied, &mut report));
            }
        }
        report.added = report.added.saturating_add(added);
        if added == 0 {
            break;
        }
    }
    for block in blocks {
        if let Some(node) = tree.node_mut(block.id)
            && let NodeKind::RuleBlock { selectors, .. } = &mut node.kind
        {
            *selectors = block.selectors;
            node.extended_by = block.provenance;
        }
    }
    debug!(target: "css_extend", "{report:?}");
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use css_selectors::{parse_selector, selector_list_to_string};

    fn block(tree: &mut Tree, parent: NodeId, selector: &str) -> NodeId {
        tree.append(
            parent,
            NodeKind::RuleBlock {
                selectors: vec![parse_selector(selector)],
                guard: None,
            },
        )
    }

    fn selectors_of(tree: &Tree, id: NodeId) -> String {
        match tree.kind(id) {
            Some(NodeKind::RuleBlock { selectors, .. }) => selector_list_to_string(selectors),
            _ => String::new(),
        }
    }

    /// Extends chain transitively and a second run adds nothing.
    ///
    /// # Panics
    /// Panics if assertions fail.
    #[test]
    fn transitive_and_idempotent() {
        let mut tree = Tree::new("test.less");
        let root = tree.root();
        let first = block(&mut tree, root, ".a");
        block(&mut tree, root, ".b:extend(.a)");
        block(&mut tree, root, ".c:extend(.b)");
        let report = resolve_extends(&mut tree);
        assert_eq!(selectors_of(&tree, first), ".a, .b, .c");
        assert!(report.added >= 2);
        assert_eq!(resolve_extends(&mut tree).added, 0);
        assert_eq!(selectors_of(&tree, first), ".a, .b, .c");
    }

    /// Mutual extends terminate.
    ///
    /// # Panics
    /// Panics if assertions fail.
    #[test]
    fn cycles_terminate() {
        let mut tree = Tree::new("test.less");
        let root = tree.root();
        let first = block(&mut tree, root, ".a:extend(.b)");
        let second = block(&mut tree, root, ".b:extend(.a)");
        resolve_extends(&mut tree);
        assert_eq!(selectors_of(&tree, first), ".a, .b");
        assert_eq!(selectors_of(&tree, second), ".b, .a");
    }

    /// `all` replaces the matched run inside compound and complex selectors.
    ///
    /// # Panics
    /// Panics if assertions fail.
    #[test]
    fn all_mode_replaces_runs() {
        let mut tree = Tree::new("test.less");
        let root = tree.root();
        let compound = block(&mut tree, root, ".x .a:hover");
        block(&mut tree, root, ".b:extend(.a all)");
        resolve_extends(&mut tree);
        assert_eq!(selectors_of(&tree, compound), ".x .a:hover, .x .b:hover");
    }

    /// A second run leaves `all`-mode products alone: the extender is not
    /// applied to the selector it produced.
    ///
    /// # Panics
    /// Panics if assertions fail.
    #[test]
    fn all_mode_rerun_adds_nothing() {
        let mut tree = Tree::new("test.less");
        let root = tree.root();
        let descendant = block(&mut tree, root, ".a .c");
        block(&mut tree, root, ".a.b:extend(.a all)");
        assert_eq!(resolve_extends(&mut tree).added, 1);
        assert_eq!(selectors_of(&tree, descendant), ".a .c, .a.b .c");
        assert_eq!(resolve_extends(&mut tree).added, 0);
        assert_eq!(selectors_of(&tree, descendant), ".a .c, .a.b .c");
    }
}

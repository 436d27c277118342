//! Shared helpers: evaluation with default collaborators and a compact
//! serializer that prints only effectively visible nodes.

#![allow(dead_code, reason = "each test file uses a subset of the helpers")]

use core::error::Error;
use css_orchestrator::visibility::visible_children;
use css_orchestrator::{
    ErrorKind, EvalError, EvalOptions, ImportResolver, NoFunctions, NoImports, NodeKind, Tree,
    evaluate,
};
use css_selectors::selector_list_to_string;
use indextree::NodeId;

/// Evaluate with default options and no collaborators.
///
/// # Errors
/// Returns the evaluation error.
pub fn eval(tree: Tree) -> Result<Tree, Box<dyn Error>> {
    eval_with(tree, &EvalOptions::default(), &NoImports)
}

/// Evaluate with the given options and import resolver.
///
/// # Errors
/// Returns the evaluation error.
pub fn eval_with(
    tree: Tree,
    options: &EvalOptions,
    imports: &dyn ImportResolver,
) -> Result<Tree, Box<dyn Error>> {
    let _ = env_logger::builder().is_test(true).try_init();
    Ok(evaluate(tree, options, imports, &NoFunctions)?)
}

/// The typed error of a failed evaluation with the given collaborators.
pub fn error_in(
    tree: Tree,
    options: &EvalOptions,
    imports: &dyn ImportResolver,
) -> Option<EvalError> {
    let _ = env_logger::builder().is_test(true).try_init();
    evaluate(tree, options, imports, &NoFunctions)
        .err()
        .and_then(|error| error.downcast_ref::<EvalError>().cloned())
}

/// The typed error of a failed evaluation under `options`.
pub fn error_with(tree: Tree, options: &EvalOptions) -> Option<EvalError> {
    error_in(tree, options, &NoImports)
}

/// The typed error of a failed evaluation with default options.
pub fn error_of(tree: Tree) -> Option<EvalError> {
    error_with(tree, &EvalOptions::default())
}

/// Kind of the evaluation error, if evaluation failed with one.
pub fn error_kind(tree: Tree) -> Option<ErrorKind> {
    error_of(tree).map(|error| error.kind)
}

fn render_node(tree: &Tree, id: NodeId) -> Option<String> {
    let body = || {
        visible_children(tree, id)
            .filter_map(|child| render_node(tree, child))
            .collect::<Vec<_>>()
            .join(" ")
    };
    let text = match tree.kind(id)? {
        NodeKind::RuleBlock { selectors, .. } => {
            let inner = body();
            if inner.is_empty() {
                return None;
            }
            format!("{} {{ {inner} }}", selector_list_to_string(selectors))
        }
        NodeKind::ResolvedDeclaration {
            name,
            value,
            important,
        } => {
            let flag = if *important { " !important" } else { "" };
            format!("{name}: {value}{flag};")
        }
        NodeKind::ConditionalAtRule { name, features } => {
            let inner = body();
            if inner.is_empty() {
                return None;
            }
            format!("@{name} {features} {{ {inner} }}")
        }
        NodeKind::AtRule { name, prelude } => format!("@{name} {prelude} {{ {} }}", body()),
        NodeKind::Import { path, .. } => format!("@import \"{path}\";"),
        NodeKind::Comment { text } => text.clone(),
        NodeKind::Root
        | NodeKind::Declaration { .. }
        | NodeKind::VariableDecl { .. }
        | NodeKind::MixinDefinition(_)
        | NodeKind::MixinInvocation(_)
        | NodeKind::Extend { .. }
        | NodeKind::DetachedBlock { .. }
        | NodeKind::DetachedCall { .. } => return None,
    };
    Some(text)
}

/// One line per visible top-level node.
pub fn render(tree: &Tree) -> Vec<String> {
    visible_children(tree, tree.root())
        .filter_map(|id| render_node(tree, id))
        .collect()
}

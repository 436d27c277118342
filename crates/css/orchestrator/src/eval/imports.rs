//! `@import` handling: opaque passthrough, once/multiple bookkeeping and
//! grafting resolved trees into the working source tree.

use super::{Context, Evaluator};
use crate::error::EvalError;
use crate::tree::{ImportOptions, NodeKind, SourcePos};
use indextree::NodeId;
use log::debug;

/// Imports of plain CSS files are never resolved.
fn is_css_path(path: &str) -> bool {
    let without_query = path.split(['?', '#']).next().unwrap_or(path);
    without_query
        .rsplit('.')
        .next()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("css"))
        && without_query.contains('.')
}

impl Evaluator<'_> {
    /// Evaluate an import directive in the frame of `ctx`. Definitions and
    /// variables of the imported tree become visible to the importing scope.
    pub(crate) fn eval_import(
        &mut self,
        id: NodeId,
        path: &str,
        options: ImportOptions,
        ctx: &Context,
        pos: &SourcePos,
    ) -> Result<(), EvalError> {
        let scope = self.scopes.snapshot(ctx.frame);
        let path = self.interpolate(path, scope, pos, false)?;
        if options.opaque || is_css_path(&path) {
            debug!(target: "css_imports", "passing '{path}' through as an opaque import");
            let kind = NodeKind::Import {
                path,
                options: ImportOptions {
                    opaque: true,
                    ..options
                },
            };
            self.emit(ctx.container, kind, pos.clone(), ctx);
            return Ok(());
        }
        // A grafted import is walked again, e.g. inside a mixin body.
        if self.source.children(id).is_empty() {
            if !options.multiple && !self.imported.insert(path.clone()) {
                debug!(target: "css_imports", "'{path}' already imported, skipped");
                return Ok(());
            }
            let tree = match self.imports.resolve(&path, &options) {
                Ok(tree) => tree,
                Err(error) if options.optional => {
                    debug!(target: "css_imports", "optional import '{path}' skipped: {error:#}");
                    return Ok(());
                }
                Err(error) => {
                    return Err(EvalError::import_failure(
                        &path,
                        format!("{error:#}"),
                        pos.clone(),
                    ));
                }
            };
            let grafted = self.source.graft(id, &tree);
            if options.reference {
                for top in &grafted {
                    if let Some(node) = self.source.node_mut(*top) {
                        node.blocks_output = true;
                    }
                }
            }
            debug!(
                target: "css_imports",
                "imported '{path}': {} top-level nodes, reference: {}",
                grafted.len(),
                options.reference
            );
        }
        self.walk_children(id, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The `.css` extension is recognized with queries and in any case.
    ///
    /// # Panics
    /// Panics if assertions fail.
    #[test]
    fn css_extension() {
        assert!(is_css_path("reset.css"));
        assert!(is_css_path("theme/print.CSS?v=2"));
        assert!(!is_css_path("mixins.less"));
        assert!(!is_css_path("css"));
    }
}

//! Evaluation core of the stylesheet preprocessor.
//!
//! `evaluate` turns a parsed tree (variables, nesting, mixins, extends,
//! nested at-rules) into a resolved tree ready for serialization. The work
//! happens in passes over an arena-backed [`Tree`]: the primary walk
//! ([`Evaluator`]) binds scopes and expands mixins and imports, then extend
//! resolution, at-rule bubbling and pruning of empty blocks run over the
//! output. Serializers decide what to print with
//! [`visibility::is_effectively_visible`].

#![forbid(unsafe_code)]

pub mod bubbling;
pub mod builder;
pub mod collaborators;
mod error;
mod eval;
pub mod extend;
mod mixins;
pub mod options;
pub mod scope;
pub mod tree;
pub mod value;
pub mod visibility;

use anyhow::Result;

pub use collaborators::{
    FunctionOutcome, FunctionRegistry, ImportResolver, NoFunctions, NoImports, StaticImports,
};
pub use error::{ErrorKind, EvalError};
pub use eval::{Evaluator, ExprEnv};
pub use extend::{ExtendReport, resolve_extends};
pub use options::{EvalOptions, MathMode};
pub use tree::{Node, NodeKind, SourcePos, Tree, Visibility};
pub use value::Value;

/// Resolve `tree` with the given options and collaborators.
///
/// # Errors
/// Returns the first evaluation failure. An [`EvalError`] can be recovered
/// with `downcast_ref`.
#[inline]
pub fn evaluate(
    tree: Tree,
    options: &EvalOptions,
    imports: &dyn ImportResolver,
    functions: &dyn FunctionRegistry,
) -> Result<Tree> {
    Evaluator::new(tree, options, imports, functions).run()
}

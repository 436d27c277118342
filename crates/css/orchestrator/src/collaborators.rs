//! Interfaces to the outside world: import resolution and user functions.

use crate::tree::{ImportOptions, Tree};
use crate::value::Value;
use anyhow::{Result, anyhow};
use std::collections::BTreeMap;

/// Locates and parses imported stylesheets.
pub trait ImportResolver {
    /// Return the parsed tree for `path`.
    ///
    /// # Errors
    /// Returns an error when the path cannot be located or parsed.
    fn resolve(&self, path: &str, options: &ImportOptions) -> Result<Tree>;
}

/// Result of calling a user function.
#[derive(Clone, Debug, PartialEq)]
pub enum FunctionOutcome {
    Value(Value),
    /// No function of that name; the call is emitted as written.
    NotRegistered,
}

/// User-supplied functions looked up by name.
pub trait FunctionRegistry {
    /// Call `name` with evaluated arguments.
    ///
    /// # Errors
    /// Returns an error when the function rejects its arguments.
    fn call(&self, name: &str, args: &[Value]) -> Result<FunctionOutcome>;
}

/// Resolver for evaluations without imports; every import fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoImports;

impl ImportResolver for NoImports {
    fn resolve(&self, path: &str, _options: &ImportOptions) -> Result<Tree> {
        Err(anyhow!("no import resolver configured for '{path}'"))
    }
}

/// Registry without functions.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoFunctions;

impl FunctionRegistry for NoFunctions {
    fn call(&self, _name: &str, _args: &[Value]) -> Result<FunctionOutcome> {
        Ok(FunctionOutcome::NotRegistered)
    }
}

/// Resolver over trees registered up front by path.
#[derive(Clone, Debug, Default)]
pub struct StaticImports {
    files: BTreeMap<String, Tree>,
}

impl StaticImports {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, tree: Tree) {
        self.files.insert(path.into(), tree);
    }
}

impl ImportResolver for StaticImports {
    fn resolve(&self, path: &str, _options: &ImportOptions) -> Result<Tree> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("file '{path}' not found"))
    }
}

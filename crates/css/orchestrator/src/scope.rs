//! Bindings stored in the scope chain.

use crate::value::Value;
use css_variables::{ScopeArena, ScopeRef};
use indextree::NodeId;

/// A callable definition: a mixin or a ruleset usable as one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MixinBinding {
    /// Source node of the definition.
    pub node: NodeId,
    /// Lexical scope of the definition, including the definition itself.
    pub scope: ScopeRef,
    /// The definition came from a reference import.
    pub blocked: bool,
    /// A plain rule block (`.btn { }`) rather than a mixin definition.
    pub ruleset: bool,
}

/// What a name is bound to. Variables are keyed `@name`, mixins by their
/// selector-style name (`.m`, `#m`), so the two never collide.
#[derive(Clone, Debug, PartialEq)]
pub enum Binding {
    Variable(Value),
    Mixin(MixinBinding),
}

pub type Scopes = ScopeArena<Binding>;

/// Key under which variable `name` (without `@`) is bound.
#[inline]
pub fn variable_key(name: &str) -> String {
    format!("@{name}")
}

/// Current value of variable `name` (without `@`) as seen from `scope`.
pub fn lookup_variable<'scopes>(
    scopes: &'scopes Scopes,
    scope: ScopeRef,
    name: &str,
) -> Option<&'scopes Value> {
    match scopes.lookup_last(scope, &variable_key(name), |binding| {
        matches!(binding, Binding::Variable(_))
    }) {
        Some(Binding::Variable(value)) => Some(value),
        _ => None,
    }
}

/// Every definition for mixin `name` in the first frame that has one,
/// in definition order.
pub fn lookup_mixins(scopes: &Scopes, scope: ScopeRef, name: &str) -> Vec<MixinBinding> {
    scopes
        .lookup_all(scope, name, |binding| matches!(binding, Binding::Mixin(_)))
        .into_iter()
        .filter_map(|binding| match binding {
            Binding::Mixin(mixin) => Some(*mixin),
            Binding::Variable(_) => None,
        })
        .collect()
}

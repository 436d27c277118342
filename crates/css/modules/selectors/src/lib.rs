//! Selector model for the preprocessor: element sequences, parent (`&`) joining
//! and the matching primitives used by `:extend`.
//!
//! A selector is kept as a flat sequence of elements. Each element is one simple
//! selector fragment (`div`, `.a`, `#id`, `:hover`, `[type=text]`, `&`) and
//! carries the combinator that links it to the element before it. Compound
//! selectors are runs of elements joined with `Combinator::None`.

#![forbid(unsafe_code)]

mod extend_match;
mod nesting;
mod parser;

use core::fmt;
use smallvec::SmallVec;

pub use extend_match::{find_matches, matches_exact, replace_matches};
pub use nesting::{PARENT_MARKER, contains_parent_marker, join_selector_lists};
pub use parser::{parse_selector, parse_selector_list, split_top_level};

/// Combinator linking an element to the element on its left.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Combinator {
    /// Attached to the previous element (same compound selector).
    #[default]
    None,
    /// Whitespace.
    Descendant,
    /// `>`
    Child,
    /// `+`
    AdjacentSibling,
    /// `~`
    GeneralSibling,
}

impl Combinator {
    /// Text emitted in front of an element that uses this combinator.
    pub const fn as_css(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Descendant => " ",
            Self::Child => " > ",
            Self::AdjacentSibling => " + ",
            Self::GeneralSibling => " ~ ",
        }
    }
}

/// One simple selector fragment with its leading combinator.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Element {
    pub combinator: Combinator,
    pub value: String,
}

impl Element {
    #[inline]
    pub fn new(combinator: Combinator, value: impl Into<String>) -> Self {
        Self {
            combinator,
            value: value.into(),
        }
    }
}

/// How an extend target is matched against declared selectors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExtendMode {
    /// The whole selector must be structurally equal to the target.
    Exact,
    /// The target may appear as a contiguous run of elements anywhere.
    All,
}

/// `:extend(target [all])` attached to the selector that owns it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtendClause {
    pub target: Selector,
    pub mode: ExtendMode,
}

/// An ordered sequence of elements plus any extend clauses declared on it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selector {
    pub elements: SmallVec<Element, 4>,
    pub extends: Vec<ExtendClause>,
}

impl Selector {
    /// Build a selector from elements, without extends.
    pub fn from_elements<I: IntoIterator<Item = Element>>(elements: I) -> Self {
        Self {
            elements: elements.into_iter().collect(),
            extends: Vec::new(),
        }
    }

    /// The same selector with its extend clauses dropped.
    pub fn without_extends(&self) -> Self {
        Self::from_elements(self.elements.iter().cloned())
    }

    /// Structural equality over elements only. The leading combinator of the
    /// first element is ignored, so `.a` and ` .a` compare equal.
    pub fn same_elements(&self, other: &Self) -> bool {
        if self.elements.len() != other.elements.len() {
            return false;
        }
        self.elements
            .iter()
            .zip(other.elements.iter())
            .enumerate()
            .all(|(index, (left, right))| {
                left.value == right.value && (index == 0 || left.combinator == right.combinator)
            })
    }

    /// Canonical text used as a structural identity key.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// True when the selector is a single class or id element, i.e. usable as a
    /// mixin name (`.btn`, `#namespace`).
    pub fn mixin_name(&self) -> Option<&str> {
        match self.elements.as_slice() {
            [only] if only.value.starts_with('.') || only.value.starts_with('#') => {
                Some(only.value.as_str())
            }
            _ => None,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, element) in self.elements.iter().enumerate() {
            if index > 0 {
                formatter.write_str(element.combinator.as_css())?;
            } else if !matches!(
                element.combinator,
                Combinator::None | Combinator::Descendant
            ) {
                formatter.write_str(element.combinator.as_css().trim_start())?;
            }
            formatter.write_str(&element.value)?;
        }
        Ok(())
    }
}

/// Join a selector list into `a, b, c` text.
pub fn selector_list_to_string(selectors: &[Selector]) -> String {
    selectors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

//! Resolving nested selectors against their parent rule's selectors.

use crate::{Combinator, Element, Selector};

/// Element prefix that refers to the enclosing rule's selector.
pub const PARENT_MARKER: char = '&';

/// True if any element of `selector` references the parent selector.
pub fn contains_parent_marker(selector: &Selector) -> bool {
    selector
        .elements
        .iter()
        .any(|element| element.value.starts_with(PARENT_MARKER))
}

/// Splice `parent` into `child` wherever `&` appears. A suffix glued to the
/// marker (`&-title`) is appended to the last parent element.
fn substitute_parent(parent: &Selector, child: &Selector) -> Selector {
    let mut joined = Selector::default();
    for element in &child.elements {
        let Some(suffix) = element.value.strip_prefix(PARENT_MARKER) else {
            joined.elements.push(element.clone());
            continue;
        };
        for (index, parent_element) in parent.elements.iter().enumerate() {
            let combinator = if index == 0 {
                element.combinator
            } else {
                parent_element.combinator
            };
            joined
                .elements
                .push(Element::new(combinator, parent_element.value.clone()));
        }
        if !suffix.is_empty()
            && let Some(last) = joined.elements.last_mut()
        {
            last.value.push_str(suffix);
        }
    }
    joined.extends.clone_from(&child.extends);
    joined
}

/// Prefix `child` with `parent` using an implicit descendant combinator
/// unless the child starts with an explicit one.
fn prefix_parent(parent: &Selector, child: &Selector) -> Selector {
    let mut joined = parent.without_extends();
    for (index, element) in child.elements.iter().enumerate() {
        let mut next = element.clone();
        if index == 0 && next.combinator == Combinator::None {
            next.combinator = Combinator::Descendant;
        }
        joined.elements.push(next);
    }
    joined.extends.clone_from(&child.extends);
    joined
}

/// Resolve a nested rule's selector list against its parent's list.
///
/// With no parents the children are returned as-is, minus bare `&` elements.
pub fn join_selector_lists(parents: &[Selector], children: &[Selector]) -> Vec<Selector> {
    if parents.is_empty() {
        return children
            .iter()
            .map(|child| {
                let mut stripped = child.clone();
                stripped.elements.retain(|element| element.value != "&");
                if let Some(first) = stripped.elements.first_mut()
                    && let Some(rest) = first.value.strip_prefix(PARENT_MARKER)
                {
                    first.value = rest.to_owned();
                }
                stripped
            })
            .collect();
    }
    let mut joined = Vec::with_capacity(parents.len().saturating_mul(children.len()));
    for parent in parents {
        for child in children {
            if contains_parent_marker(child) {
                joined.push(substitute_parent(parent, child));
            } else {
                joined.push(prefix_parent(parent, child));
            }
        }
    }
    joined
}

//! Matching primitives for `:extend`.

use crate::{Combinator, Element, Selector};

/// Exact mode: the whole candidate equals the target.
#[inline]
pub fn matches_exact(target: &Selector, candidate: &Selector) -> bool {
    !target.elements.is_empty() && target.same_elements(candidate)
}

/// True when `target` matches `candidate` starting at element `start`.
/// The first target element's combinator is not compared.
fn matches_at(target: &[Element], candidate: &[Element], start: usize) -> bool {
    let Some(window) = candidate.get(start..start.saturating_add(target.len())) else {
        return false;
    };
    window.len() == target.len()
        && window
            .iter()
            .zip(target)
            .enumerate()
            .all(|(offset, (have, want))| {
                have.value == want.value && (offset == 0 || have.combinator == want.combinator)
            })
}

/// All-mode: start indices of non-overlapping runs of `candidate` that
/// match `target`, left to right.
pub fn find_matches(target: &Selector, candidate: &Selector) -> Vec<usize> {
    let wanted = target.elements.as_slice();
    let have = candidate.elements.as_slice();
    let mut found = Vec::new();
    if wanted.is_empty() || wanted.len() > have.len() {
        return found;
    }
    let mut start = 0usize;
    while start.saturating_add(wanted.len()) <= have.len() {
        if matches_at(wanted, have, start) {
            found.push(start);
            start = start.saturating_add(wanted.len());
        } else {
            start = start.saturating_add(1);
        }
    }
    found
}

/// Replace every match of `target` inside `candidate` with `replacement`.
///
/// The first replacement element inherits the combinator of the run it
/// replaces, so `.x .a` with `.a` replaced by `.c.d` becomes `.x .c.d`.
pub fn replace_matches(candidate: &Selector, target: &Selector, replacement: &Selector) -> Selector {
    let starts = find_matches(target, candidate);
    if starts.is_empty() {
        return candidate.without_extends();
    }
    let width = target.elements.len();
    let mut rebuilt = Selector::default();
    let mut cursor = 0usize;
    for start in starts {
        rebuilt
            .elements
            .extend(candidate.elements.get(cursor..start).unwrap_or(&[]).iter().cloned());
        let leading = candidate
            .elements
            .get(start)
            .map_or(Combinator::None, |element| element.combinator);
        for (index, element) in replacement.elements.iter().enumerate() {
            let combinator = if index == 0 {
                leading
            } else {
                element.combinator
            };
            rebuilt
                .elements
                .push(Element::new(combinator, element.value.clone()));
        }
        cursor = start.saturating_add(width);
    }
    rebuilt
        .elements
        .extend(candidate.elements.get(cursor..).unwrap_or(&[]).iter().cloned());
    rebuilt
}

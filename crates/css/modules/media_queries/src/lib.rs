//! Media Queries Level 4: query lists and nested-query combination.
//! See <https://www.w3.org/TR/mediaqueries-4/>
//!
//! Conditional at-rule preludes are modelled as an OR of AND groups: each
//! alternative (a comma-separated query) is a list of terms joined by `and`.
//! Nested blocks combine their ancestors' lists with a cartesian product.

#![forbid(unsafe_code)]

use core::fmt;
use core::mem::take;
use cssparser::{ParseError, Parser, ParserInput, Token};
use log::trace;

/// A query list in OR-of-AND form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeatureList {
    /// Comma-separated alternatives; each holds its `and`-joined terms.
    pub alternatives: Vec<Vec<String>>,
}

impl FeatureList {
    #[inline]
    pub const fn new(alternatives: Vec<Vec<String>>) -> Self {
        Self { alternatives }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }
}

impl fmt::Display for FeatureList {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, terms) in self.alternatives.iter().enumerate() {
            if index > 0 {
                formatter.write_str(", ")?;
            }
            formatter.write_str(&terms.join(" and "))?;
        }
        Ok(())
    }
}

fn push_term(terms: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        terms.push(trimmed.to_owned());
    }
}

/// Consume the body of the block `parser` just entered, so the next
/// position read lies after its closing token.
fn skip_block(parser: &mut Parser<'_, '_>) {
    let skipped: Result<(), ParseError<'_, ()>> = parser.parse_nested_block(|nested| {
        while nested.next_including_whitespace().is_ok() {}
        Ok(())
    });
    if let Err(error) = skipped {
        trace!(target: "css_bubbling", "unterminated block in prelude: {error:?}");
    }
}

/// Split a prelude into alternatives (top-level commas) and terms
/// (top-level `and`). Term text is kept verbatim apart from surrounding
/// whitespace; parenthesised features are never split.
pub fn parse_feature_list(text: &str) -> FeatureList {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    let mut alternatives = Vec::new();
    let mut terms = Vec::new();
    let mut start = parser.position();
    loop {
        let before = parser.position();
        let token = match parser.next_including_whitespace() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        match token {
            Token::Comma => {
                push_term(&mut terms, parser.slice(start..before));
                if !terms.is_empty() {
                    alternatives.push(take(&mut terms));
                }
                start = parser.position();
            }
            Token::Ident(ref word) if word.eq_ignore_ascii_case("and") => {
                push_term(&mut terms, parser.slice(start..before));
                start = parser.position();
            }
            Token::ParenthesisBlock
            | Token::SquareBracketBlock
            | Token::CurlyBracketBlock
            | Token::Function(_) => skip_block(&mut parser),
            _ => {}
        }
    }
    push_term(&mut terms, parser.slice_from(start));
    if !terms.is_empty() {
        alternatives.push(terms);
    }
    FeatureList { alternatives }
}

/// Iterative cartesian product over the alternatives of several lists.
///
/// Yields one combined term list per tuple, outer list varying slowest.
/// Lists without alternatives are neutral. `restart` rewinds the iterator.
#[derive(Clone, Debug)]
pub struct Permutations<'lists> {
    lists: Vec<&'lists FeatureList>,
    indices: Vec<usize>,
    exhausted: bool,
}

impl<'lists> Permutations<'lists> {
    pub fn new(lists: &'lists [FeatureList]) -> Self {
        let kept: Vec<&FeatureList> = lists.iter().filter(|list| !list.is_empty()).collect();
        let exhausted = kept.is_empty();
        Self {
            indices: vec![0; kept.len()],
            lists: kept,
            exhausted,
        }
    }

    pub fn restart(&mut self) {
        self.indices.iter_mut().for_each(|index| *index = 0);
        self.exhausted = self.lists.is_empty();
    }

    /// Odometer step: bump the innermost position, carrying outward.
    fn advance(&mut self) {
        for position in (0..self.indices.len()).rev() {
            let Some(index) = self.indices.get_mut(position) else {
                continue;
            };
            let limit = self
                .lists
                .get(position)
                .map_or(0, |list| list.alternatives.len());
            *index = index.saturating_add(1);
            if *index < limit {
                return;
            }
            *index = 0;
        }
        self.exhausted = true;
    }
}

impl Iterator for Permutations<'_> {
    type Item = Vec<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let combined: Vec<String> = self
            .lists
            .iter()
            .zip(&self.indices)
            .filter_map(|(list, index)| list.alternatives.get(*index))
            .flat_map(|terms| terms.iter().cloned())
            .collect();
        self.advance();
        Some(combined)
    }
}

/// Combine the feature lists of nested conditional blocks, outermost first.
///
/// No lists give an empty list and a single list is returned unchanged.
pub fn permute(lists: &[FeatureList]) -> FeatureList {
    if let [single] = lists {
        return single.clone();
    }
    let alternatives: Vec<Vec<String>> = Permutations::new(lists).collect();
    trace!(
        target: "css_bubbling",
        "permuted {} feature lists into {} alternatives",
        lists.len(),
        alternatives.len()
    );
    FeatureList { alternatives }
}

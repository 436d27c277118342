//! Selector parsing, including `:extend(...)` suffixes and `&` references.

use crate::{Combinator, Element, ExtendClause, ExtendMode, Selector};

#[derive(Clone, Debug, PartialEq, Eq)]
/// Internal tokenizer token kinds.
pub enum Tok {
    /// An explicit combinator token (`>`, `+`, `~`).
    Combinator(Combinator),
    /// Whitespace that implies a descendant combinator.
    DescendantWS,
    /// A simple selector fragment.
    Simple(String),
    /// Raw argument text of a `:extend(...)` pseudo.
    Extend(String),
}

/// Tokenizer over a selector string.
pub struct SelectorTokenizer {
    /// Underlying owned bytes for the selector.
    input_bytes: Vec<u8>,
    /// Current cursor index into `input_bytes`.
    index: usize,
    /// Whether we should emit a descendant whitespace token on `next()` call.
    pending_whitespace: bool,
}

impl SelectorTokenizer {
    /// Construct a tokenizer from input.
    #[inline]
    pub(crate) fn new(input: &str) -> Self {
        Self {
            input_bytes: input.trim().as_bytes().to_vec(),
            index: 0,
            pending_whitespace: false,
        }
    }

    /// Return the next selector token, if any.
    #[inline]
    pub(crate) fn next(&mut self) -> Option<Tok> {
        if self.pending_whitespace {
            self.pending_whitespace = false;
            return Some(Tok::DescendantWS);
        }
        self.skip_whitespace_descendant();
        if self.pending_whitespace {
            self.pending_whitespace = false;
            return Some(Tok::DescendantWS);
        }
        let &current = self.input_bytes.get(self.index)?;
        let token = match current {
            b'>' => {
                self.index = self.index.saturating_add(1);
                Tok::Combinator(Combinator::Child)
            }
            b'+' => {
                self.index = self.index.saturating_add(1);
                Tok::Combinator(Combinator::AdjacentSibling)
            }
            b'~' => {
                self.index = self.index.saturating_add(1);
                Tok::Combinator(Combinator::GeneralSibling)
            }
            b'*' => {
                self.index = self.index.saturating_add(1);
                Tok::Simple("*".to_owned())
            }
            b'.' | b'#' | b'&' => {
                self.index = self.index.saturating_add(1);
                let ident = self.consume_ident();
                Tok::Simple(format!("{}{ident}", char::from(current)))
            }
            b'[' => Tok::Simple(self.consume_balanced(b'[', b']')),
            b':' => self.consume_pseudo(),
            _ => {
                let ident = self.consume_ident();
                if ident.is_empty() {
                    // Stray byte: keep it as its own fragment.
                    self.index = self.index.saturating_add(1);
                    Tok::Simple(char::from(current).to_string())
                } else {
                    Tok::Simple(ident)
                }
            }
        };
        Some(token)
    }

    /// Skip whitespace and mark that a descendant combinator may follow.
    ///
    /// Whitespace next to an explicit combinator is swallowed by the caller.
    #[inline]
    fn skip_whitespace_descendant(&mut self) {
        let start = self.index;
        self.skip_spaces();
        if self.index > start && self.index < self.input_bytes.len() {
            self.pending_whitespace = true;
        }
    }

    /// Consume an identifier: ASCII alphanumerics, `-`, `_`, escapes, non-ASCII
    /// bytes and `@{name}` interpolation blocks.
    #[inline]
    fn consume_ident(&mut self) -> String {
        let start = self.index;
        while let Some(&byte) = self.input_bytes.get(self.index) {
            if byte == b'@' && self.input_bytes.get(self.index.saturating_add(1)) == Some(&b'{') {
                while let Some(&inner) = self.input_bytes.get(self.index) {
                    self.index = self.index.saturating_add(1);
                    if inner == b'}' {
                        break;
                    }
                }
            } else if byte == b'\\' {
                self.index = self.index.saturating_add(2);
            } else if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' || byte >= 0x80
            {
                self.index = self.index.saturating_add(1);
            } else {
                break;
            }
        }
        let end = self.index.min(self.input_bytes.len());
        let slice = self.input_bytes.get(start..end).unwrap_or(&[]);
        String::from_utf8_lossy(slice).into_owned()
    }

    /// Consume a bracketed run, honouring nesting and quotes. Returns the text
    /// including both delimiters.
    #[inline]
    fn consume_balanced(&mut self, open: u8, close: u8) -> String {
        let start = self.index;
        let mut depth = 0usize;
        let mut quote: Option<u8> = None;
        while let Some(&byte) = self.input_bytes.get(self.index) {
            self.index = self.index.saturating_add(1);
            if let Some(active) = quote {
                if byte == active {
                    quote = None;
                }
                continue;
            }
            if byte == b'"' || byte == b'\'' {
                quote = Some(byte);
            } else if byte == open {
                depth = depth.saturating_add(1);
            } else if byte == close {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    break;
                }
            }
        }
        let slice = self.input_bytes.get(start..self.index).unwrap_or(&[]);
        String::from_utf8_lossy(slice).into_owned()
    }

    /// Consume `:name`, `::name` or `:name(args)`. `:extend(...)` is returned as
    /// its own token so the caller can attach the clauses.
    #[inline]
    fn consume_pseudo(&mut self) -> Tok {
        let start = self.index;
        while self.input_bytes.get(self.index) == Some(&b':') {
            self.index = self.index.saturating_add(1);
        }
        let name = self.consume_ident();
        let mut text = String::from_utf8_lossy(self.input_bytes.get(start..self.index).unwrap_or(&[]))
            .into_owned();
        if self.input_bytes.get(self.index) == Some(&b'(') {
            let args = self.consume_balanced(b'(', b')');
            if name.eq_ignore_ascii_case("extend") {
                let inner = args
                    .strip_prefix('(')
                    .and_then(|rest| rest.strip_suffix(')'))
                    .unwrap_or(&args);
                return Tok::Extend(inner.to_owned());
            }
            text.push_str(&args);
        }
        Tok::Simple(text)
    }

    /// Skip ASCII whitespace.
    #[inline]
    fn skip_spaces(&mut self) {
        while matches!(self.input_bytes.get(self.index), Some(byte) if byte.is_ascii_whitespace()) {
            self.index = self.index.saturating_add(1);
        }
    }
}

/// Split `text` on `separator` bytes that are not nested inside brackets,
/// parentheses or quotes.
pub fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0usize;
    for (offset, character) in text.char_indices() {
        if let Some(active) = quote {
            if character == active {
                quote = None;
            }
            continue;
        }
        match character {
            '"' | '\'' => quote = Some(character),
            '(' | '[' | '{' => depth = depth.saturating_add(1),
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ if character == separator && depth == 0 => {
                parts.push(text.get(start..offset).unwrap_or_default());
                start = offset.saturating_add(character.len_utf8());
            }
            _ => {}
        }
    }
    parts.push(text.get(start..).unwrap_or_default());
    parts
}

/// Parse the argument text of `:extend(...)` into clauses.
fn parse_extend_arguments(args: &str) -> Vec<ExtendClause> {
    split_top_level(args, ',')
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (target_text, mode) = match part.strip_suffix(" all") {
                Some(head) => (head.trim_end(), ExtendMode::All),
                None => (part, ExtendMode::Exact),
            };
            ExtendClause {
                target: parse_selector(target_text).without_extends(),
                mode,
            }
        })
        .collect()
}

/// Parse a selector list from text. Empty entries are dropped.
pub fn parse_selector_list(input: &str) -> Vec<Selector> {
    split_top_level(input, ',')
        .into_iter()
        .map(parse_selector)
        .filter(|selector| !selector.elements.is_empty() || !selector.extends.is_empty())
        .collect()
}

/// Parse one selector (permissive, no error reporting).
pub fn parse_selector(input: &str) -> Selector {
    let mut tokens = SelectorTokenizer::new(input);
    let mut selector = Selector::default();
    let mut pending: Option<Combinator> = None;

    while let Some(token) = tokens.next() {
        match token {
            Tok::Combinator(comb) => pending = Some(comb),
            Tok::DescendantWS => {
                if pending.is_none() {
                    pending = Some(Combinator::Descendant);
                }
            }
            Tok::Simple(value) => {
                if value.is_empty() {
                    continue;
                }
                let combinator = pending.take().unwrap_or(Combinator::None);
                selector.elements.push(Element { combinator, value });
            }
            Tok::Extend(args) => {
                pending = None;
                selector.extends.extend(parse_extend_arguments(&args));
            }
        }
    }
    selector
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Compound and descendant runs get the right combinators.
    ///
    /// # Panics
    /// Panics if assertions fail.
    #[test]
    fn parses_combinators() {
        let selector = parse_selector("ul > li.item  a:hover");
        let shape: Vec<(Combinator, &str)> = selector
            .elements
            .iter()
            .map(|element| (element.combinator, element.value.as_str()))
            .collect();
        assert_eq!(
            shape,
            vec![
                (Combinator::None, "ul"),
                (Combinator::Child, "li"),
                (Combinator::None, ".item"),
                (Combinator::Descendant, "a"),
                (Combinator::None, ":hover"),
            ]
        );
    }

    /// `:extend` is lifted out of the element list.
    ///
    /// # Panics
    /// Panics if assertions fail.
    #[test]
    fn parses_extend_clauses() {
        let selector = parse_selector(".b:extend(.a, .c .d all)");
        assert_eq!(selector.to_string(), ".b");
        assert_eq!(selector.extends.len(), 2);
        assert_eq!(selector.extends[0].target.to_string(), ".a");
        assert_eq!(selector.extends[0].mode, ExtendMode::Exact);
        assert_eq!(selector.extends[1].target.to_string(), ".c .d");
        assert_eq!(selector.extends[1].mode, ExtendMode::All);
    }

    /// Commas inside pseudo arguments do not split the list.
    ///
    /// # Panics
    /// Panics if assertions fail.
    #[test]
    fn list_split_respects_parentheses() {
        let list = parse_selector_list(".a:not(.b, .c), [data-x=\"1,2\"]");
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].to_string(), ".a:not(.b, .c)");
        assert_eq!(list[1].to_string(), "[data-x=\"1,2\"]");
    }

    /// Parent references and interpolation blocks stay in one element.
    ///
    /// # Panics
    /// Panics if assertions fail.
    #[test]
    fn keeps_parent_suffix_and_interpolation() {
        let selector = parse_selector("&-title .col-@{index}");
        assert_eq!(selector.elements[0].value, "&-title");
        assert_eq!(selector.elements[1].value, ".col-@{index}");
    }
}

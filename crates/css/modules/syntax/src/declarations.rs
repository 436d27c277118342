//! Declaration lists (`name: value; ...`) split into raw name/value pairs.

use cssparser::{
    AtRuleParser, BasicParseErrorKind, CowRcStr, DeclarationParser, ParseError, Parser,
    ParserInput, ParserState, QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser,
};

/// A declaration with its value still in source form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeclarationText {
    /// Property name as written; variables keep their leading `@`.
    pub name: String,
    /// Raw value text without a trailing `!important`.
    pub value: String,
    pub important: bool,
}

/// Parse `!important` at the end of a value, returning (`value_without_important`, `important_flag`).
pub fn split_important_tail(value: &str) -> (String, bool) {
    let trimmed = value.trim();
    if let Some(pos) = trimmed.rfind("!important")
        && let Some(prefix) = trimmed.get(..pos)
        && trimmed.get(pos..).is_some_and(|tail| tail.trim_end() == "!important")
    {
        return (prefix.trim_end().to_owned(), true);
    }
    (trimmed.to_owned(), false)
}

/// Records property names with their raw value slices.
struct BodyDeclParser;

impl<'input> DeclarationParser<'input> for BodyDeclParser {
    type Declaration = DeclarationText;
    type Error = ();

    fn parse_value<'tokens>(
        &mut self,
        name: CowRcStr<'input>,
        input: &mut Parser<'input, 'tokens>,
        _decl_start: &ParserState,
    ) -> Result<Self::Declaration, ParseError<'input, Self::Error>> {
        let start = input.position();
        while input.next_including_whitespace_and_comments().is_ok() {}
        let (value, important) = split_important_tail(input.slice_from(start));
        Ok(DeclarationText {
            name: name.to_string(),
            value,
            important,
        })
    }
}

impl<'input> AtRuleParser<'input> for BodyDeclParser {
    type Prelude = String;
    type AtRule = DeclarationText;
    type Error = ();

    /// `@name: value` arrives as an at-rule; keep the prelude text and
    /// turn it into a variable declaration.
    fn parse_prelude<'tokens>(
        &mut self,
        name: CowRcStr<'input>,
        input: &mut Parser<'input, 'tokens>,
    ) -> Result<Self::Prelude, ParseError<'input, Self::Error>> {
        let start = input.position();
        while input.next_including_whitespace_and_comments().is_ok() {}
        Ok(format!("@{name}{}", input.slice_from(start)))
    }

    fn parse_block<'tokens>(
        &mut self,
        _prelude: Self::Prelude,
        _state: &ParserState,
        input: &mut Parser<'input, 'tokens>,
    ) -> Result<Self::AtRule, ParseError<'input, Self::Error>> {
        Err(input.new_error(BasicParseErrorKind::AtRuleBodyInvalid))
    }

    fn rule_without_block(
        &mut self,
        prelude: Self::Prelude,
        _state: &ParserState,
    ) -> Result<Self::AtRule, Self::Error> {
        let (name, value) = prelude.split_once(':').ok_or(())?;
        let (value, important) = split_important_tail(value);
        Ok(DeclarationText {
            name: name.trim().to_owned(),
            value,
            important,
        })
    }
}

impl<'input> QualifiedRuleParser<'input> for BodyDeclParser {
    type Prelude = ();
    type QualifiedRule = DeclarationText;
    type Error = ();

    fn parse_prelude<'tokens>(
        &mut self,
        input: &mut Parser<'input, 'tokens>,
    ) -> Result<Self::Prelude, ParseError<'input, Self::Error>> {
        Err(input.new_error(BasicParseErrorKind::QualifiedRuleInvalid))
    }

    fn parse_block<'tokens>(
        &mut self,
        _prelude: Self::Prelude,
        _state: &ParserState,
        input: &mut Parser<'input, 'tokens>,
    ) -> Result<Self::QualifiedRule, ParseError<'input, Self::Error>> {
        Err(input.new_error(BasicParseErrorKind::QualifiedRuleInvalid))
    }
}

impl RuleBodyItemParser<'_, DeclarationText, ()> for BodyDeclParser {
    fn parse_declarations(&self) -> bool {
        true
    }

    fn parse_qualified(&self) -> bool {
        false
    }
}

/// Parse a semicolon-separated declaration list. Malformed items are skipped.
pub fn parse_declarations(text: &str) -> Vec<DeclarationText> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    let mut body = BodyDeclParser;
    RuleBodyParser::new(&mut parser, &mut body)
        .flatten()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Properties, variables and `!important` are recognised.
    ///
    /// # Panics
    /// Panics if assertions fail.
    #[test]
    fn splits_declarations() {
        let parsed = parse_declarations("color: red !important; @gap: 4px; width: calc(1px + 2px)");
        let names: Vec<&str> = parsed.iter().map(|decl| decl.name.as_str()).collect();
        assert_eq!(names, vec!["color", "@gap", "width"]);
        assert_eq!(parsed.first().map(|decl| decl.important), Some(true));
        assert_eq!(parsed.get(1).map(|decl| decl.value.as_str()), Some("4px"));
        assert_eq!(
            parsed.get(2).map(|decl| decl.value.as_str()),
            Some("calc(1px + 2px)")
        );
    }

    /// Only a trailing `!important` counts.
    ///
    /// # Panics
    /// Panics if assertions fail.
    #[test]
    fn important_tail() {
        assert_eq!(split_important_tail(" red ! important"), ("red ! important".to_owned(), false));
        assert_eq!(split_important_tail("1px !important "), ("1px".to_owned(), true));
    }
}

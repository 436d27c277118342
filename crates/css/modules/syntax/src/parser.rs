//! Expression and guard-condition parsing over the token tree.
//!
//! Precedence, loosest first: comma lists, space lists, `+`/`-`, `*`/`/`,
//! unary minus. A `+`/`-` written with space before and none after (`1px -@a`)
//! starts a new space-list item instead of subtracting.

use crate::lexer::{Tok, TokKind, lex};
use crate::{CompareOp, Condition, Expr, ListSeparator, SyntaxError};
use css_values_units::Operator;
use cssparser::{Parser, ParserInput};

/// Parse a property or variable value.
///
/// Empty input yields an empty `Expr::Raw`.
///
/// # Errors
/// Returns a `SyntaxError` when operators lack operands or tokens are
/// misplaced.
pub fn parse_expression(text: &str) -> Result<Expr, SyntaxError> {
    let toks = tokenize(text)?;
    if toks.is_empty() {
        return Ok(Expr::Raw(String::new()));
    }
    parse_list(&toks)
}

/// Parse the condition of a `when` guard (without the `when` keyword).
///
/// Commas and `or` separate alternatives, `and` binds tighter, `not`
/// negates the following condition.
///
/// # Errors
/// Returns a `SyntaxError` for empty or malformed conditions.
pub fn parse_condition(text: &str) -> Result<Condition, SyntaxError> {
    let toks = tokenize(text)?;
    condition_or(&toks)
}

fn tokenize(text: &str) -> Result<Vec<Tok>, SyntaxError> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    lex(&mut parser)
}

/// Split `toks` at every top-level token accepted by `is_separator`.
fn split_on<'toks>(toks: &'toks [Tok], is_separator: impl Fn(&Tok) -> bool) -> Vec<&'toks [Tok]> {
    toks.split(|tok| is_separator(tok)).collect()
}

fn is_word(tok: &Tok, word: &str) -> bool {
    matches!(&tok.kind, TokKind::Word(text) if text.eq_ignore_ascii_case(word))
}

fn describe(tok: &Tok) -> String {
    match &tok.kind {
        TokKind::Atom(expr) => expr.to_string(),
        TokKind::Word(text) => text.clone(),
        TokKind::Op(symbol) | TokKind::Compare(symbol) => symbol.to_string(),
        TokKind::Comma => ",".to_owned(),
        TokKind::Group(_) => "(".to_owned(),
    }
}

/// Comma-separated arguments of a function call. No tokens means no
/// arguments.
pub fn parse_arguments(toks: &[Tok]) -> Result<Vec<Expr>, SyntaxError> {
    if toks.is_empty() {
        return Ok(Vec::new());
    }
    split_on(toks, |tok| tok.kind == TokKind::Comma)
        .into_iter()
        .map(parse_space_list)
        .collect()
}

fn parse_list(toks: &[Tok]) -> Result<Expr, SyntaxError> {
    let mut items = parse_arguments(toks)?;
    if items.len() == 1
        && let Some(only) = items.pop()
    {
        return Ok(only);
    }
    Ok(Expr::List {
        separator: ListSeparator::Comma,
        items,
    })
}

fn parse_space_list(toks: &[Tok]) -> Result<Expr, SyntaxError> {
    let mut cursor = Cursor { toks, pos: 0 };
    let mut items = Vec::new();
    while !cursor.at_end() {
        items.push(cursor.additive()?);
    }
    if items.len() == 1
        && let Some(only) = items.pop()
    {
        return Ok(only);
    }
    if items.is_empty() {
        return Err(SyntaxError::UnexpectedEnd);
    }
    Ok(Expr::List {
        separator: ListSeparator::Space,
        items,
    })
}

struct Cursor<'toks> {
    toks: &'toks [Tok],
    pos: usize,
}

impl<'toks> Cursor<'toks> {
    fn at_end(&self) -> bool {
        self.pos >= self.toks.len()
    }

    fn peek(&self) -> Option<&'toks Tok> {
        self.toks.get(self.pos)
    }

    fn peek_after(&self) -> Option<&'toks Tok> {
        self.toks.get(self.pos.saturating_add(1))
    }

    fn bump(&mut self) -> Option<&'toks Tok> {
        let tok = self.toks.get(self.pos)?;
        self.pos = self.pos.saturating_add(1);
        Some(tok)
    }

    /// `+`/`-` with space before and none after belongs to the next item.
    fn binary_additive(&self) -> Option<Operator> {
        let tok = self.peek()?;
        let TokKind::Op(symbol @ ('+' | '-')) = tok.kind else {
            return None;
        };
        let detached_sign =
            tok.space_before && self.peek_after().is_some_and(|next| !next.space_before);
        if detached_sign {
            return None;
        }
        Operator::from_symbol(symbol)
    }

    fn additive(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.multiplicative()?;
        while let Some(operator) = self.binary_additive() {
            self.bump();
            let right = self.multiplicative()?;
            left = Expr::Binary {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn multiplicative(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.unary()?;
        while let Some(Tok {
            kind: TokKind::Op(symbol @ ('*' | '/')),
            ..
        }) = self.peek()
        {
            let operator = Operator::from_symbol(*symbol).ok_or(SyntaxError::UnexpectedEnd)?;
            self.bump();
            let right = self.unary()?;
            left = Expr::Binary {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, SyntaxError> {
        let tok = self.bump().ok_or(SyntaxError::UnexpectedEnd)?;
        match &tok.kind {
            TokKind::Op('-') => Ok(Expr::Negate(Box::new(self.unary()?))),
            TokKind::Op('+') => self.unary(),
            TokKind::Atom(expr) => Ok(expr.clone()),
            TokKind::Word(text) => Ok(Expr::Keyword(text.clone())),
            TokKind::Group(inner) if inner.is_empty() => Err(SyntaxError::UnexpectedEnd),
            TokKind::Group(inner) => Ok(Expr::Paren(Box::new(parse_list(inner)?))),
            TokKind::Op(_) | TokKind::Compare(_) | TokKind::Comma => {
                Err(SyntaxError::UnexpectedToken(describe(tok)))
            }
        }
    }
}

fn condition_or(toks: &[Tok]) -> Result<Condition, SyntaxError> {
    let mut parts = split_on(toks, |tok| tok.kind == TokKind::Comma || is_word(tok, "or"))
        .into_iter()
        .map(condition_and);
    let mut condition = parts.next().ok_or(SyntaxError::UnexpectedEnd)??;
    for part in parts {
        condition = Condition::Or(Box::new(condition), Box::new(part?));
    }
    Ok(condition)
}

fn condition_and(toks: &[Tok]) -> Result<Condition, SyntaxError> {
    let mut parts = split_on(toks, |tok| is_word(tok, "and"))
        .into_iter()
        .map(condition_not);
    let mut condition = parts.next().ok_or(SyntaxError::UnexpectedEnd)??;
    for part in parts {
        condition = Condition::And(Box::new(condition), Box::new(part?));
    }
    Ok(condition)
}

fn condition_not(toks: &[Tok]) -> Result<Condition, SyntaxError> {
    match toks {
        [] => Err(SyntaxError::UnexpectedEnd),
        [first, rest @ ..] if is_word(first, "not") => {
            Ok(Condition::Not(Box::new(condition_not(rest)?)))
        }
        [
            Tok {
                kind: TokKind::Group(inner),
                ..
            },
        ] => condition_group(inner),
        _ => comparison(toks),
    }
}

/// Contents of a parenthesised condition: either a nested boolean
/// condition or a single comparison/truth test.
fn condition_group(inner: &[Tok]) -> Result<Condition, SyntaxError> {
    let nested = inner
        .iter()
        .any(|tok| is_word(tok, "and") || is_word(tok, "or"))
        || inner.first().is_some_and(|tok| is_word(tok, "not"))
        || matches!(
            inner,
            [Tok {
                kind: TokKind::Group(_),
                ..
            }]
        );
    if nested {
        condition_or(inner)
    } else {
        comparison(inner)
    }
}

fn comparison(toks: &[Tok]) -> Result<Condition, SyntaxError> {
    let Some(first) = toks
        .iter()
        .position(|tok| matches!(tok.kind, TokKind::Compare(_)))
    else {
        return Ok(Condition::Truthy(parse_space_list(toks)?));
    };
    let mut symbols = String::new();
    let mut end = first;
    while let Some(Tok {
        kind: TokKind::Compare(symbol),
        space_before,
    }) = toks.get(end)
    {
        if end > first && *space_before {
            break;
        }
        symbols.push(*symbol);
        end = end.saturating_add(1);
    }
    let op = CompareOp::from_symbols(&symbols).ok_or(SyntaxError::UnexpectedToken(symbols))?;
    let left = toks.get(..first).ok_or(SyntaxError::UnexpectedEnd)?;
    let right = toks.get(end..).ok_or(SyntaxError::UnexpectedEnd)?;
    Ok(Condition::Compare {
        op,
        left: parse_space_list(left)?,
        right: parse_space_list(right)?,
    })
}

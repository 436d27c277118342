//! Token tree built on `cssparser`: parenthesised groups are nested, function
//! calls are shaped into `Expr::Call` right away and whitespace is folded into
//! a flag on the following token.

use crate::parser::parse_arguments;
use crate::{Expr, SyntaxError};
use css_values_units::Dimension;
use cssparser::{ParseError as CssParseError, Parser, Token};

#[derive(Clone, Debug, PartialEq)]
pub enum TokKind {
    /// A complete operand.
    Atom(Expr),
    /// Identifier; guards look for `and`/`or`/`not`.
    Word(String),
    /// One of `+ - * /`.
    Op(char),
    /// One of `= < >`.
    Compare(char),
    Comma,
    Group(Vec<Tok>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tok {
    pub kind: TokKind,
    /// Whitespace separated this token from the previous one.
    pub space_before: bool,
}

impl Tok {
    /// Whether the token can end an operand.
    const fn is_operand(&self) -> bool {
        matches!(
            self.kind,
            TokKind::Atom(_) | TokKind::Word(_) | TokKind::Group(_)
        )
    }
}

type Nested<'input, T> = Result<T, CssParseError<'input, ()>>;

/// Tokenize the remainder of `parser`.
pub fn lex(parser: &mut Parser<'_, '_>) -> Result<Vec<Tok>, SyntaxError> {
    let mut toks: Vec<Tok> = Vec::new();
    let mut space_before = false;
    loop {
        let start = parser.position();
        let token = match parser.next_including_whitespace() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        let kind = match token {
            Token::WhiteSpace(_) => {
                space_before = true;
                continue;
            }
            Token::Number {
                value, has_sign, ..
            } => {
                let number = precise(parser.slice_from(start), value);
                push_numeric(&mut toks, Dimension::number(number), has_sign, space_before);
                space_before = false;
                continue;
            }
            Token::Percentage {
                unit_value,
                has_sign,
                ..
            } => {
                let text = parser.slice_from(start).trim_end_matches('%');
                let dimension = Dimension::new(precise(text, unit_value * 100.0), "%");
                push_numeric(&mut toks, dimension, has_sign, space_before);
                space_before = false;
                continue;
            }
            Token::Dimension {
                value,
                unit,
                has_sign,
                ..
            } => {
                let text = parser.slice_from(start);
                let digits = text.get(..text.len().saturating_sub(unit.len())).unwrap_or(text);
                let dimension = Dimension::new(precise(digits, value), unit.as_ref());
                push_numeric(&mut toks, dimension, has_sign, space_before);
                space_before = false;
                continue;
            }
            Token::Hash(value) | Token::IDHash(value) => {
                TokKind::Atom(Expr::Keyword(format!("#{value}")))
            }
            Token::Ident(name) => TokKind::Word(name.to_string()),
            Token::AtKeyword(name) => TokKind::Atom(Expr::Variable(name.to_string())),
            Token::QuotedString(text) => TokKind::Atom(Expr::Quoted {
                text: text.to_string(),
                quote: parser.slice_from(start).chars().next().unwrap_or('"'),
                escaped: false,
            }),
            Token::UnquotedUrl(url) => TokKind::Atom(Expr::Raw(format!("url({url})"))),
            Token::Function(name) => {
                let inner: Nested<'_, Result<Vec<Tok>, SyntaxError>> =
                    parser.parse_nested_block(|nested| Ok(lex(nested)));
                let call = inner
                    .ok()
                    .and_then(Result::ok)
                    .and_then(|args| parse_arguments(&args).ok())
                    .map(|args| Expr::Call {
                        name: name.to_string(),
                        args,
                    });
                TokKind::Atom(call.unwrap_or_else(|| Expr::Raw(parser.slice_from(start).to_owned())))
            }
            Token::ParenthesisBlock => {
                let inner: Nested<'_, Result<Vec<Tok>, SyntaxError>> =
                    parser.parse_nested_block(|nested| Ok(lex(nested)));
                match inner {
                    Ok(group) => TokKind::Group(group?),
                    Err(_) => return Err(SyntaxError::UnexpectedToken("(".to_owned())),
                }
            }
            Token::SquareBracketBlock | Token::CurlyBracketBlock => {
                let skipped: Nested<'_, ()> = parser.parse_nested_block(|nested| {
                    while nested.next_including_whitespace().is_ok() {}
                    Ok(())
                });
                if skipped.is_err() {
                    return Err(SyntaxError::UnexpectedToken(parser.slice_from(start).to_owned()));
                }
                TokKind::Atom(Expr::Raw(parser.slice_from(start).to_owned()))
            }
            Token::Delim(symbol @ ('+' | '-' | '*' | '/')) => TokKind::Op(symbol),
            Token::Delim(symbol @ ('=' | '<' | '>')) => TokKind::Compare(symbol),
            Token::Delim('~') => escaped_string(parser)
                .map_or_else(|| TokKind::Atom(Expr::Raw("~".to_owned())), TokKind::Atom),
            Token::Comma => TokKind::Comma,
            _ => TokKind::Atom(Expr::Raw(parser.slice_from(start).trim().to_owned())),
        };
        toks.push(Tok { kind, space_before });
        space_before = false;
    }
    Ok(toks)
}

/// Re-read a numeric literal from source text; `cssparser` only keeps `f32`.
fn precise(text: &str, fallback: f32) -> f64 {
    text.parse::<f64>().unwrap_or_else(|_| f64::from(fallback))
}

/// A signed number glued to a preceding operand (`@a+5`) is an operator
/// followed by an unsigned number.
fn push_numeric(toks: &mut Vec<Tok>, dimension: Dimension, has_sign: bool, space_before: bool) {
    let glued = has_sign && !space_before && toks.last().is_some_and(Tok::is_operand);
    if glued {
        let symbol = if dimension.value < 0.0 { '-' } else { '+' };
        toks.push(Tok {
            kind: TokKind::Op(symbol),
            space_before: false,
        });
        toks.push(Tok {
            kind: TokKind::Atom(Expr::Dimension(Dimension {
                value: dimension.value.abs(),
                unit: dimension.unit,
            })),
            space_before: false,
        });
    } else {
        toks.push(Tok {
            kind: TokKind::Atom(Expr::Dimension(dimension)),
            space_before,
        });
    }
}

/// `~"text"` right after the tilde.
fn escaped_string(parser: &mut Parser<'_, '_>) -> Option<Expr> {
    let state = parser.state();
    let start = parser.position();
    if let Ok(Token::QuotedString(text)) = parser.next_including_whitespace().cloned() {
        return Some(Expr::Quoted {
            text: text.to_string(),
            quote: parser.slice_from(start).chars().next().unwrap_or('"'),
            escaped: true,
        });
    }
    parser.reset(&state);
    None
}

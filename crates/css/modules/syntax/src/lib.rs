//! CSS Syntax Module Level 3: value and guard expressions for the preprocessor.
//! See <https://www.w3.org/TR/css-syntax-3/>
//!
//! Values are tokenized with `cssparser` and shaped into a small expression
//! tree (arithmetic, lists, calls, variables). Guard conditions reuse the same
//! tokens with comparison and boolean operators on top.

#![forbid(unsafe_code)]

mod declarations;
mod lexer;
mod parser;

use core::error::Error;
use core::fmt;
use css_values_units::{Dimension, Operator};

pub use declarations::{DeclarationText, parse_declarations, split_important_tail};
pub use parser::{parse_condition, parse_expression};

/// Separator of a value list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListSeparator {
    Space,
    Comma,
}

impl ListSeparator {
    #[inline]
    pub const fn as_css(self) -> &'static str {
        match self {
            Self::Space => " ",
            Self::Comma => ", ",
        }
    }
}

/// An unevaluated value expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Number, percentage or dimension literal.
    Dimension(Dimension),
    /// Identifier, including hex colors as written (`#abc`).
    Keyword(String),
    /// String literal; `escaped` strings (`~"..."`) print without quotes.
    Quoted {
        text: String,
        quote: char,
        escaped: bool,
    },
    /// `@name` reference, stored without the `@`.
    Variable(String),
    /// Function call with comma-separated arguments.
    Call { name: String, args: Vec<Self> },
    Binary {
        operator: Operator,
        left: Box<Self>,
        right: Box<Self>,
    },
    Negate(Box<Self>),
    Paren(Box<Self>),
    List {
        separator: ListSeparator,
        items: Vec<Self>,
    },
    /// Text passed through untouched (urls, brackets, unknown tokens).
    Raw(String),
}

impl Expr {
    #[inline]
    pub fn keyword(text: impl Into<String>) -> Self {
        Self::Keyword(text.into())
    }

    #[inline]
    pub fn variable(name: impl Into<String>) -> Self {
        Self::Variable(name.into())
    }

    #[inline]
    pub fn quoted(text: impl Into<String>) -> Self {
        Self::Quoted {
            text: text.into(),
            quote: '"',
            escaped: false,
        }
    }

    /// Whether a call to `name` appears anywhere in the expression.
    pub fn mentions_call(&self, name: &str) -> bool {
        match self {
            Self::Call { name: called, args } => {
                called.eq_ignore_ascii_case(name) || args.iter().any(|arg| arg.mentions_call(name))
            }
            Self::Binary { left, right, .. } => {
                left.mentions_call(name) || right.mentions_call(name)
            }
            Self::Negate(inner) | Self::Paren(inner) => inner.mentions_call(name),
            Self::List { items, .. } => items.iter().any(|item| item.mentions_call(name)),
            Self::Dimension(_)
            | Self::Keyword(_)
            | Self::Quoted { .. }
            | Self::Variable(_)
            | Self::Raw(_) => false,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dimension(dimension) => write!(formatter, "{dimension}"),
            Self::Keyword(text) | Self::Raw(text) => formatter.write_str(text),
            Self::Quoted {
                text,
                escaped: true,
                ..
            } => formatter.write_str(text),
            Self::Quoted {
                text,
                quote,
                escaped: false,
            } => write!(formatter, "{quote}{text}{quote}"),
            Self::Variable(name) => write!(formatter, "@{name}"),
            Self::Call { name, args } => {
                write!(formatter, "{name}(")?;
                write_joined(formatter, args, ", ")?;
                formatter.write_str(")")
            }
            Self::Binary {
                operator: Operator::Divide,
                left,
                right,
            } => write!(formatter, "{left}/{right}"),
            Self::Binary {
                operator,
                left,
                right,
            } => write!(formatter, "{left} {} {right}", operator.symbol()),
            Self::Negate(inner) => write!(formatter, "-{inner}"),
            Self::Paren(inner) => write!(formatter, "({inner})"),
            Self::List { separator, items } => write_joined(formatter, items, separator.as_css()),
        }
    }
}

fn write_joined(formatter: &mut fmt::Formatter<'_>, items: &[Expr], separator: &str) -> fmt::Result {
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            formatter.write_str(separator)?;
        }
        write!(formatter, "{item}")?;
    }
    Ok(())
}

/// Comparison operators allowed in guards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Less,
    LessOrEqual,
    Equal,
    GreaterOrEqual,
    Greater,
}

impl CompareOp {
    /// Accepts `<`, `<=`, `=<`, `=`, `>=`, `=>` and `>`.
    pub fn from_symbols(symbols: &str) -> Option<Self> {
        let op = match symbols {
            "<" => Self::Less,
            "<=" | "=<" => Self::LessOrEqual,
            "=" => Self::Equal,
            ">=" | "=>" => Self::GreaterOrEqual,
            ">" => Self::Greater,
            _ => return None,
        };
        Some(op)
    }

    pub const fn as_css(self) -> &'static str {
        match self {
            Self::Less => "<",
            Self::LessOrEqual => "=<",
            Self::Equal => "=",
            Self::GreaterOrEqual => ">=",
            Self::Greater => ">",
        }
    }
}

/// A guard condition (`when ...`).
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    Compare {
        op: CompareOp,
        left: Expr,
        right: Expr,
    },
    /// Holds when the expression evaluates to the keyword `true`.
    Truthy(Expr),
    Not(Box<Self>),
    And(Box<Self>, Box<Self>),
    Or(Box<Self>, Box<Self>),
}

impl Condition {
    /// Whether the condition calls `default()`.
    pub fn uses_default(&self) -> bool {
        match self {
            Self::Compare { left, right, .. } => {
                left.mentions_call("default") || right.mentions_call("default")
            }
            Self::Truthy(expr) => expr.mentions_call("default"),
            Self::Not(inner) => inner.uses_default(),
            Self::And(left, right) | Self::Or(left, right) => {
                left.uses_default() || right.uses_default()
            }
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compare { op, left, right } => {
                write!(formatter, "({left} {} {right})", op.as_css())
            }
            Self::Truthy(expr) => write!(formatter, "({expr})"),
            Self::Not(inner) => write!(formatter, "not {inner}"),
            Self::And(left, right) => write!(formatter, "{left} and {right}"),
            Self::Or(left, right) => write!(formatter, "{left}, {right}"),
        }
    }
}

/// Failure to shape tokens into an expression or condition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyntaxError {
    /// A token that cannot appear at this point.
    UnexpectedToken(String),
    /// Input ended where an operand was required.
    UnexpectedEnd,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedToken(token) => write!(formatter, "unexpected token '{token}'"),
            Self::UnexpectedEnd => formatter.write_str("unexpected end of expression"),
        }
    }
}

impl Error for SyntaxError {}

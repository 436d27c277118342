//! Evaluated values.

use core::cmp::Ordering;
use core::fmt;
use css_syntax::ListSeparator;
use css_values_units::{Color, Dimension, compare_dimensions, named_color, parse_hex_color};
use css_variables::ScopeRef;
use indextree::NodeId;

/// A detached ruleset together with the scope it was defined in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Closure {
    /// Source node whose children are the body.
    pub body: NodeId,
    pub scope: ScopeRef,
    /// The definition came from a reference import.
    pub blocked: bool,
}

/// A fully evaluated value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Dimension(Dimension),
    Color(Color),
    Keyword(String),
    Quoted {
        text: String,
        quote: char,
        escaped: bool,
    },
    List {
        separator: ListSeparator,
        items: Vec<Self>,
    },
    /// A function nobody evaluated, emitted as written.
    Call { name: String, args: Vec<Self> },
    Raw(String),
    Detached(Closure),
}

impl Value {
    #[inline]
    pub fn keyword(text: impl Into<String>) -> Self {
        Self::Keyword(text.into())
    }

    #[inline]
    pub fn boolean(flag: bool) -> Self {
        Self::keyword(if flag { "true" } else { "false" })
    }

    /// The keyword `true` is the only truthy value.
    pub fn is_true(&self) -> bool {
        matches!(self, Self::Keyword(text) if text.eq_ignore_ascii_case("true"))
    }

    /// Colors, including named and hex keywords.
    pub fn as_color(&self) -> Option<Color> {
        match self {
            Self::Color(color) => Some(*color),
            Self::Keyword(text) if text.starts_with('#') => parse_hex_color(text),
            Self::Keyword(text) => named_color(text),
            _ => None,
        }
    }

    pub const fn as_dimension(&self) -> Option<&Dimension> {
        match self {
            Self::Dimension(dimension) => Some(dimension),
            _ => None,
        }
    }

    pub const fn is_number(&self) -> bool {
        matches!(self, Self::Dimension(_))
    }

    pub const fn is_string(&self) -> bool {
        matches!(self, Self::Quoted { .. })
    }

    pub fn is_keyword(&self) -> bool {
        matches!(self, Self::Keyword(text) if !text.starts_with('#'))
    }

    pub fn is_url(&self) -> bool {
        match self {
            Self::Call { name, .. } => name.eq_ignore_ascii_case("url"),
            Self::Raw(text) => text.get(..4).is_some_and(|head| head.eq_ignore_ascii_case("url(")),
            _ => false,
        }
    }

    pub fn has_unit(&self, unit: &str) -> bool {
        self.as_dimension()
            .is_some_and(|dimension| dimension.unit_str().eq_ignore_ascii_case(unit))
    }

    pub const fn is_ruleset(&self) -> bool {
        matches!(self, Self::Detached(_))
    }

    /// Text of strings and keywords, used where quoting does not matter.
    pub fn plain_text(&self) -> String {
        match self {
            Self::Quoted { text, .. } | Self::Keyword(text) | Self::Raw(text) => text.clone(),
            other => other.to_string(),
        }
    }

    /// Equality used by guards and pattern parameters: numbers compare after
    /// unit conversion, colors by channels, strings and keywords by text.
    pub fn loose_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Dimension(left), Self::Dimension(right)) => {
                compare_dimensions(left, right) == Some(Ordering::Equal)
            }
            (Self::List { items: left, .. }, Self::List { items: right, .. }) => {
                left.len() == right.len()
                    && left.iter().zip(right).all(|(lhs, rhs)| lhs.loose_eq(rhs))
            }
            (Self::Color(_), _) | (_, Self::Color(_)) => {
                matches!((self.as_color(), other.as_color()), (Some(lhs), Some(rhs)) if lhs == rhs)
            }
            (
                Self::Quoted { .. } | Self::Keyword(_) | Self::Raw(_),
                Self::Quoted { .. } | Self::Keyword(_) | Self::Raw(_),
            ) => self.plain_text() == other.plain_text(),
            _ => self == other,
        }
    }

    /// Ordering for `<`, `>` and friends; only numbers are ordered.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Dimension(left), Self::Dimension(right)) => compare_dimensions(left, right),
            _ if self.loose_eq(other) => Some(Ordering::Equal),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dimension(dimension) => write!(formatter, "{dimension}"),
            Self::Color(color) => write!(formatter, "{color}"),
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
            Self::List { separator, items } => {
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        formatter.write_str(separator.as_css())?;
                    }
                    write!(formatter, "{item}")?;
                }
                Ok(())
            }
            Self::Call { name, args } => {
                write!(formatter, "{name}(")?;
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        formatter.write_str(", ")?;
                    }
                    write!(formatter, "{arg}")?;
                }
                formatter.write_str(")")
            }
            Self::Detached(_) => Ok(()),
        }
    }
}

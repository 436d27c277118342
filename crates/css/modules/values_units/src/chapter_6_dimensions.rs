//! CSS Values & Units Level 3: §5/§6/§7 Percentages, dimensions and unit conversion
//! See <https://www.w3.org/TR/css-values-3/#dimensions>

use crate::ParseError;
use crate::chapter_4_numbers::format_number;
use core::f64::consts::PI;
use core::fmt;
use cssparser::{Parser, Token};

/// Families of mutually convertible units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitGroup {
    /// Absolute lengths (§6.2), canonical unit `px`.
    Length,
    /// Durations (§7.3), canonical unit `s`.
    Duration,
    /// Angles (§7.1), canonical unit `deg`.
    Angle,
}

/// Conversion factor from `unit` to the canonical unit of its group.
fn canonical_factor(unit: &str) -> Option<(UnitGroup, f64)> {
    let factor = match unit {
        "px" => (UnitGroup::Length, 1.0),
        "cm" => (UnitGroup::Length, 96.0 / 2.54),
        "mm" => (UnitGroup::Length, 96.0 / 25.4),
        "q" => (UnitGroup::Length, 96.0 / 101.6),
        "in" => (UnitGroup::Length, 96.0),
        "pt" => (UnitGroup::Length, 96.0 / 72.0),
        "pc" => (UnitGroup::Length, 16.0),
        "s" => (UnitGroup::Duration, 1.0),
        "ms" => (UnitGroup::Duration, 0.001),
        "deg" => (UnitGroup::Angle, 1.0),
        "rad" => (UnitGroup::Angle, 180.0 / PI),
        "grad" => (UnitGroup::Angle, 0.9),
        "turn" => (UnitGroup::Angle, 360.0),
        _ => return None,
    };
    Some(factor)
}

/// Conversion group of a unit, if it has one.
pub fn unit_group(unit: &str) -> Option<UnitGroup> {
    canonical_factor(&unit.to_ascii_lowercase()).map(|(group, _)| group)
}

/// A number with an optional unit (`10`, `10px`, `50%`).
#[derive(Clone, Debug, PartialEq)]
pub struct Dimension {
    pub value: f64,
    /// Lowercased unit; `None` for plain numbers.
    pub unit: Option<String>,
}

impl Dimension {
    #[inline]
    pub const fn number(value: f64) -> Self {
        Self { value, unit: None }
    }

    #[inline]
    pub fn new(value: f64, unit: impl Into<String>) -> Self {
        let unit = unit.into().to_ascii_lowercase();
        Self {
            value,
            unit: if unit.is_empty() { None } else { Some(unit) },
        }
    }

    #[inline]
    pub fn unit_str(&self) -> &str {
        self.unit.as_deref().unwrap_or("")
    }

    #[inline]
    pub const fn is_unitless(&self) -> bool {
        self.unit.is_none()
    }

    /// Convert into `unit` when both units belong to the same group.
    /// Unitless values adopt the requested unit unchanged.
    pub fn convert_to(&self, unit: &str) -> Option<Self> {
        let Some(current) = self.unit.as_deref() else {
            return Some(Self::new(self.value, unit));
        };
        if current.eq_ignore_ascii_case(unit) {
            return Some(self.clone());
        }
        let (from_group, from_factor) = canonical_factor(current)?;
        let (to_group, to_factor) = canonical_factor(&unit.to_ascii_lowercase())?;
        if from_group != to_group {
            return None;
        }
        Some(Self::new(self.value * from_factor / to_factor, unit))
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}{}", format_number(self.value), self.unit_str())
    }
}

/// Parse a number, percentage or dimension token.
///
/// # Errors
/// Returns `ParseError::UnexpectedToken` when the next token is not numeric.
pub fn parse_dimension(input: &mut Parser) -> Result<Dimension, ParseError> {
    match input.next() {
        Ok(token) => match token.clone() {
            Token::Number { value, .. } => Ok(Dimension::number(f64::from(value))),
            Token::Percentage { unit_value, .. } => {
                Ok(Dimension::new(f64::from(unit_value) * 100.0, "%"))
            }
            Token::Dimension { value, unit, .. } => {
                Ok(Dimension::new(f64::from(value), unit.as_ref()))
            }
            _ => Err(ParseError::UnexpectedToken),
        },
        Err(_) => Err(ParseError::UnexpectedToken),
    }
}

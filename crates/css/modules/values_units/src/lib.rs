//! CSS Values and Units: numeric and color semantics for preprocessor math.
//! See <https://www.w3.org/TR/css-values-3/>

#![forbid(unsafe_code)]

// Per-chapter modules mirroring the CSS Values table of contents.
pub mod chapter_4_numbers;
pub mod chapter_6_dimensions;
pub mod chapter_9_colors;
pub mod operations;

// Re-exports for ergonomic access from other crates.
pub use chapter_4_numbers::format_number;
pub use chapter_6_dimensions::{Dimension, UnitGroup, parse_dimension, unit_group};
pub use chapter_9_colors::{Color, hex_value, named_color, parse_color, parse_hex_color};
use core::error::Error;
use core::fmt;

pub use operations::{
    Operator, color_with_number, compare_dimensions, operate_colors, operate_dimensions,
};

/// Parse error for Values & Units parsing utilities in this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// The next token did not match the expected grammar.
    UnexpectedToken,
}

/// Failure of an arithmetic operation on values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperationError {
    /// Operand units cannot be converted into each other (strict units only).
    IncompatibleUnits { left: String, right: String },
    /// Division by a zero-valued operand.
    DivisionByZero,
    /// The operator is not defined for these operand kinds.
    Unsupported { operator: char, operands: &'static str },
}

impl fmt::Display for OperationError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IncompatibleUnits { left, right } => {
                write!(formatter, "incompatible units '{left}' and '{right}'")
            }
            Self::DivisionByZero => formatter.write_str("division by zero"),
            Self::Unsupported { operator, operands } => {
                write!(formatter, "operator '{operator}' is not defined for {operands}")
            }
        }
    }
}

impl Error for OperationError {}

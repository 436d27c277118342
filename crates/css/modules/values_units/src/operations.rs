//! Arithmetic and comparison over dimensions and colors.

use crate::{Color, Dimension, OperationError};
use core::cmp::Ordering;

/// Binary arithmetic operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    pub const fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Subtract => '-',
            Self::Multiply => '*',
            Self::Divide => '/',
        }
    }

    pub const fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(Self::Add),
            '-' => Some(Self::Subtract),
            '*' => Some(Self::Multiply),
            '/' => Some(Self::Divide),
            _ => None,
        }
    }

    fn apply(self, left: f64, right: f64) -> Result<f64, OperationError> {
        match self {
            Self::Add => Ok(left + right),
            Self::Subtract => Ok(left - right),
            Self::Multiply => Ok(left * right),
            Self::Divide if right == 0.0 => Err(OperationError::DivisionByZero),
            Self::Divide => Ok(left / right),
        }
    }
}

/// Bring `right` into the unit of `left` for an operation.
///
/// Returns the unit of the result and the right-hand magnitude to use.
fn align_units(
    left: &Dimension,
    right: &Dimension,
    strict: bool,
) -> Result<(Option<String>, f64), OperationError> {
    match (&left.unit, &right.unit) {
        (None, None) => Ok((None, right.value)),
        (Some(unit), None) => Ok((Some(unit.clone()), right.value)),
        (None, Some(unit)) => Ok((Some(unit.clone()), right.value)),
        (Some(left_unit), Some(right_unit)) => match right.convert_to(left_unit) {
            Some(converted) => Ok((Some(left_unit.clone()), converted.value)),
            None if strict => Err(OperationError::IncompatibleUnits {
                left: left_unit.clone(),
                right: right_unit.clone(),
            }),
            None => Ok((Some(left_unit.clone()), right.value)),
        },
    }
}

/// Apply `operator` to two dimensions.
///
/// The result takes the left operand's unit (or the right one's when the
/// left is unitless). Convertible units are converted first; other unit
/// mismatches keep the left unit unless `strict` is set.
///
/// # Errors
/// Returns `OperationError::IncompatibleUnits` in strict mode and
/// `OperationError::DivisionByZero` for a zero divisor.
pub fn operate_dimensions(
    operator: Operator,
    left: &Dimension,
    right: &Dimension,
    strict: bool,
) -> Result<Dimension, OperationError> {
    let (unit, right_value) = align_units(left, right, strict)?;
    let value = operator.apply(left.value, right_value)?;
    Ok(Dimension { value, unit })
}

/// Channel-wise arithmetic on two colors. Alpha follows the left operand.
///
/// # Errors
/// Returns `OperationError::DivisionByZero` when dividing by a zero channel.
pub fn operate_colors(
    operator: Operator,
    left: &Color,
    right: &Color,
) -> Result<Color, OperationError> {
    let lhs = left.channels();
    let rhs = right.channels();
    let mut out = [0.0; 3];
    for (slot, (left_channel, right_channel)) in out.iter_mut().zip(lhs.into_iter().zip(rhs)) {
        *slot = operator.apply(left_channel, right_channel)?;
    }
    Ok(Color::from_channels(out, left.alpha))
}

/// Arithmetic between a color and a plain number applied to every channel.
/// `color_first` tells whether the color is the left operand.
///
/// # Errors
/// Returns `OperationError::DivisionByZero` when dividing by zero.
pub fn color_with_number(
    operator: Operator,
    color: &Color,
    number: f64,
    color_first: bool,
) -> Result<Color, OperationError> {
    let mut out = color.channels();
    for channel in &mut out {
        *channel = if color_first {
            operator.apply(*channel, number)?
        } else {
            operator.apply(number, *channel)?
        };
    }
    Ok(Color::from_channels(out, color.alpha))
}

/// Compare two dimensions, converting units where possible. Values with
/// unrelated units are unordered.
pub fn compare_dimensions(left: &Dimension, right: &Dimension) -> Option<Ordering> {
    let right_value = match (&left.unit, &right.unit) {
        (Some(unit), Some(_)) => right.convert_to(unit)?.value,
        _ => right.value,
    };
    left.value.partial_cmp(&right_value)
}

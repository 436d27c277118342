//! CSS Values & Units Level 3: §9 Colors (subset)
//! See <https://www.w3.org/TR/css-color-3/>

use crate::ParseError;
use core::fmt;
use cssparser::{ParseError as CssParseError, Parser, Token};

/// Bit count used to duplicate a single hex nibble into a full byte.
const NIBBLE_SHIFT: u32 = 4;

/// An sRGB color with a fractional alpha channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    /// Opacity in `0.0..=1.0`.
    pub alpha: f64,
}

impl Color {
    #[inline]
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: 1.0,
        }
    }

    /// Build a color from unclamped channel values, clamping into range.
    pub fn from_channels(channels: [f64; 3], alpha: f64) -> Self {
        let [red, green, blue] = channels.map(clamp_channel);
        Self {
            red,
            green,
            blue,
            alpha: alpha.clamp(0.0, 1.0),
        }
    }

    #[inline]
    pub fn channels(&self) -> [f64; 3] {
        [
            f64::from(self.red),
            f64::from(self.green),
            f64::from(self.blue),
        ]
    }
}

/// Round and clamp a channel into `0..=255`.
fn clamp_channel(value: f64) -> u8 {
    let bounded = value.round().clamp(0.0, 255.0);
    // In range after the clamp above.
    bounded as u8
}

impl fmt::Display for Color {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.alpha >= 1.0 {
            write!(
                formatter,
                "#{:02x}{:02x}{:02x}",
                self.red, self.green, self.blue
            )
        } else {
            write!(
                formatter,
                "rgba({}, {}, {}, {})",
                self.red,
                self.green,
                self.blue,
                crate::format_number(self.alpha)
            )
        }
    }
}

/// Convert an ASCII hex digit to its numeric value.
pub const fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Parse a 3-, 4-, 6- or 8-digit hex color, with or without the leading `#`.
pub fn parse_hex_color(text: &str) -> Option<Color> {
    let trimmed = text.trim().trim_start_matches('#');
    let digits: Vec<u8> = trimmed
        .bytes()
        .map(hex_value)
        .collect::<Option<Vec<u8>>>()?;
    let bytes: Vec<u8> = match digits.len() {
        3 | 4 => digits
            .iter()
            .map(|nibble| nibble.wrapping_shl(NIBBLE_SHIFT) | nibble)
            .collect(),
        6 | 8 => digits
            .chunks(2)
            .map(|pair| match pair {
                [high, low] => high.wrapping_shl(NIBBLE_SHIFT) | low,
                _ => 0,
            })
            .collect(),
        _ => return None,
    };
    let alpha = bytes.get(3).map_or(1.0, |value| f64::from(*value) / 255.0);
    match bytes.as_slice() {
        [red, green, blue, ..] => Some(Color {
            red: *red,
            green: *green,
            blue: *blue,
            alpha,
        }),
        _ => None,
    }
}

/// Map a CSS named color (common subset) to an RGBA value.
pub fn named_color(name: &str) -> Option<Color> {
    let color = match name.to_ascii_lowercase().as_str() {
        "black" => Color::rgb(0, 0, 0),
        "white" => Color::rgb(255, 255, 255),
        "red" => Color::rgb(255, 0, 0),
        "green" => Color::rgb(0, 128, 0),
        "lime" => Color::rgb(0, 255, 0),
        "blue" => Color::rgb(0, 0, 255),
        "yellow" => Color::rgb(255, 255, 0),
        "orange" => Color::rgb(255, 165, 0),
        "purple" => Color::rgb(128, 0, 128),
        "gray" | "grey" => Color::rgb(128, 128, 128),
        "silver" => Color::rgb(192, 192, 192),
        "navy" => Color::rgb(0, 0, 128),
        "teal" => Color::rgb(0, 128, 128),
        "maroon" => Color::rgb(128, 0, 0),
        "transparent" => Color {
            alpha: 0.0,
            ..Color::rgb(0, 0, 0)
        },
        _ => return None,
    };
    Some(color)
}

/// Parse `rgb()`/`rgba()` arguments: integer channels and an optional
/// fractional alpha.
fn parse_rgb_function(name: &str, input: &mut Parser) -> Option<Color> {
    let lowercase = name.to_ascii_lowercase();
    let mut comps: Vec<f64> = Vec::with_capacity(4);
    while let Ok(token) = input.next() {
        match token.clone() {
            Token::Number { value, .. } => comps.push(f64::from(value)),
            Token::Percentage { unit_value, .. } if comps.len() == 3 => {
                comps.push(f64::from(unit_value));
            }
            Token::Comma => {}
            _ => return None,
        }
    }
    match (lowercase.as_str(), comps.as_slice()) {
        ("rgb" | "rgba", [red, green, blue]) => {
            Some(Color::from_channels([*red, *green, *blue], 1.0))
        }
        ("rgb" | "rgba", [red, green, blue, alpha]) => {
            Some(Color::from_channels([*red, *green, *blue], *alpha))
        }
        _ => None,
    }
}

/// Parse a CSS <color> (subset).
///
/// Supports hex forms, a set of named colors and `rgb()`/`rgba()`.
///
/// # Errors
/// Returns `ParseError::UnexpectedToken` for unsupported or malformed input.
pub fn parse_color(input: &mut Parser) -> Result<Color, ParseError> {
    let token_initial = match input.next() {
        Ok(initial) => initial.clone(),
        Err(_) => return Err(ParseError::UnexpectedToken),
    };
    match token_initial {
        Token::Hash(value) | Token::IDHash(value) => {
            parse_hex_color(value.as_ref()).ok_or(ParseError::UnexpectedToken)
        }
        Token::Ident(name) => named_color(name.as_ref()).ok_or(ParseError::UnexpectedToken),
        Token::Function(name) => {
            let result: Result<Option<Color>, CssParseError<'_, ()>> =
                input.parse_nested_block(|nested| Ok(parse_rgb_function(name.as_ref(), nested)));
            match result {
                Ok(Some(color)) => Ok(color),
                _ => Err(ParseError::UnexpectedToken),
            }
        }
        _ => Err(ParseError::UnexpectedToken),
    }
}

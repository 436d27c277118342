//! Evaluation options.

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// When arithmetic operators are evaluated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MathMode {
    /// Every operator is evaluated.
    Always,
    /// `/` divides only inside parentheses; other operators always apply.
    #[default]
    ParensDivision,
    /// Operators apply only inside parentheses.
    Parens,
}

/// Options of one evaluation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalOptions {
    pub math: MathMode,
    /// Mixing unrelated units is an error instead of keeping the left unit.
    pub strict_units: bool,
    /// Maximum nesting of mixin and detached-ruleset calls.
    pub max_call_depth: usize,
    /// Global variables (name without `@` to value text).
    pub globals: BTreeMap<String, String>,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            math: MathMode::default(),
            strict_units: false,
            max_call_depth: 256,
            globals: BTreeMap::new(),
        }
    }
}

impl EvalOptions {
    /// Read options from JSON; missing fields keep their defaults.
    ///
    /// # Errors
    /// Returns an error when the text is not valid JSON for these options.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("invalid evaluation options")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Partial JSON keeps defaults for the rest.
    ///
    /// # Errors
    /// Returns an error if the options fail to parse.
    #[test]
    fn parses_partial_json() -> Result<()> {
        let options = EvalOptions::from_json(
            r##"{ "math": "always", "globals": { "brand": "#336699" } }"##,
        )?;
        assert_eq!(options.math, MathMode::Always);
        assert_eq!(options.max_call_depth, 256);
        assert_eq!(options.globals.get("brand").map(String::as_str), Some("#336699"));
        let invalid = EvalOptions::from_json(r#"{ "math": "sometimes" }"#).err();
        assert_eq!(
            invalid.map(|error| error.to_string()).as_deref(),
            Some("invalid evaluation options")
        );
        Ok(())
    }
}

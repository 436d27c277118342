//! Expression evaluation, string interpolation and the built-in functions.

use super::Evaluator;
use crate::collaborators::FunctionOutcome;
use crate::error::EvalError;
use crate::options::MathMode;
use crate::scope::lookup_variable;
use crate::tree::SourcePos;
use crate::value::Value;
use css_syntax::Expr;
use css_values_units::{
    Color, Dimension, OperationError, Operator, color_with_number, operate_colors,
    operate_dimensions,
};
use css_variables::ScopeRef;

/// Functions whose arguments are emitted as written, without arithmetic.
const LITERAL_FUNCTIONS: [&str; 5] = ["calc", "url", "var", "env", "attr"];

/// Scope and flags for evaluating one expression.
#[derive(Clone, Debug)]
pub struct ExprEnv {
    pub scope: ScopeRef,
    /// Position reported by errors.
    pub pos: SourcePos,
    /// Inside parentheses (affects the math mode).
    pub parens: bool,
    /// Arithmetic is enabled; off inside `calc()` and friends.
    pub math: bool,
    /// Value of `default()` while evaluating a guard.
    pub default: Option<bool>,
}

impl ExprEnv {
    #[inline]
    pub const fn new(scope: ScopeRef, pos: SourcePos) -> Self {
        Self {
            scope,
            pos,
            parens: false,
            math: true,
            default: None,
        }
    }
}

impl Evaluator<'_> {
    /// Evaluate `expr` to a value.
    ///
    /// # Errors
    /// Returns `UndefinedVariable` for unknown variables and
    /// `InvalidOperationType` for unsupported arithmetic or failing functions.
    pub(crate) fn eval_expr(&self, expr: &Expr, env: &ExprEnv) -> Result<Value, EvalError> {
        match expr {
            Expr::Dimension(dimension) => Ok(Value::Dimension(dimension.clone())),
            Expr::Keyword(text) => Ok(Value::Keyword(text.clone())),
            Expr::Raw(text) => Ok(Value::Raw(text.clone())),
            Expr::Quoted {
                text,
                quote,
                escaped,
            } => Ok(Value::Quoted {
                text: self.interpolate(text, env.scope, &env.pos, false)?,
                quote: *quote,
                escaped: *escaped,
            }),
            Expr::Variable(name) => lookup_variable(&self.scopes, env.scope, name)
                .cloned()
                .ok_or_else(|| EvalError::undefined_variable(name, env.pos.clone())),
            Expr::Call { name, args } => self.eval_call(name, args, env),
            Expr::Binary {
                operator,
                left,
                right,
            } => {
                let lhs = self.eval_expr(left, env)?;
                let rhs = self.eval_expr(right, env)?;
                if self.computes(*operator, env) {
                    self.operate(*operator, &lhs, &rhs, &env.pos)
                } else if *operator == Operator::Divide {
                    Ok(Value::Raw(format!("{lhs}/{rhs}")))
                } else {
                    Ok(Value::Raw(format!("{lhs} {} {rhs}", operator.symbol())))
                }
            }
            Expr::Negate(inner) => match self.eval_expr(inner, env)? {
                Value::Dimension(dimension) if env.math => Ok(Value::Dimension(Dimension {
                    value: -dimension.value,
                    unit: dimension.unit,
                })),
                other => Ok(Value::Raw(format!("-{other}"))),
            },
            Expr::Paren(inner) => {
                let mut nested = env.clone();
                nested.parens = true;
                match self.eval_expr(inner, &nested)? {
                    value @ (Value::Dimension(_) | Value::Color(_)) if env.math => Ok(value),
                    other => Ok(Value::Raw(format!("({other})"))),
                }
            }
            Expr::List { separator, items } => {
                let values = items
                    .iter()
                    .map(|item| self.eval_expr(item, env))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::List {
                    separator: *separator,
                    items: values,
                })
            }
        }
    }

    /// Whether `operator` is evaluated under the configured math mode.
    fn computes(&self, operator: Operator, env: &ExprEnv) -> bool {
        env.math
            && match self.options.math {
                MathMode::Always => true,
                MathMode::ParensDivision => operator != Operator::Divide || env.parens,
                MathMode::Parens => env.parens,
            }
    }

    fn operate(
        &self,
        operator: Operator,
        lhs: &Value,
        rhs: &Value,
        pos: &SourcePos,
    ) -> Result<Value, EvalError> {
        let outcome = if let (Value::Dimension(left), Value::Dimension(right)) = (lhs, rhs) {
            operate_dimensions(operator, left, right, self.options.strict_units)
                .map(Value::Dimension)
        } else {
            match (lhs.as_color(), rhs.as_color()) {
                (Some(left), Some(right)) => {
                    operate_colors(operator, &left, &right).map(Value::Color)
                }
                (Some(color), None) => number_operand(rhs, operator)
                    .and_then(|number| color_with_number(operator, &color, number, true))
                    .map(Value::Color),
                (None, Some(color)) => number_operand(lhs, operator)
                    .and_then(|number| color_with_number(operator, &color, number, false))
                    .map(Value::Color),
                (None, None) => Err(OperationError::Unsupported {
                    operator: operator.symbol(),
                    operands: "non-numeric operands",
                }),
            }
        };
        outcome.map_err(|error| {
            EvalError::invalid_operation(
                format!("{error} in '{lhs} {} {rhs}'", operator.symbol()),
                pos.clone(),
            )
        })
    }

    fn eval_call(&self, name: &str, args: &[Expr], env: &ExprEnv) -> Result<Value, EvalError> {
        let lowered = name.to_ascii_lowercase();
        let mut arg_env = env.clone();
        if LITERAL_FUNCTIONS.contains(&lowered.as_str()) {
            arg_env.math = false;
        }
        let values = args
            .iter()
            .map(|arg| self.eval_expr(arg, &arg_env))
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(value) = builtin(&lowered, &values, env) {
            return Ok(value);
        }
        match self.functions.call(name, &values) {
            Ok(FunctionOutcome::Value(value)) => Ok(value),
            Ok(FunctionOutcome::NotRegistered) => Ok(Value::Call {
                name: name.to_owned(),
                args: values,
            }),
            Err(error) => Err(EvalError::invalid_operation(
                format!("function '{name}' failed: {error:#}"),
                env.pos.clone(),
            )),
        }
    }

    /// Replace `@{name}` (and bare `@name` when `bare` is set) with variable
    /// values. Strings contribute their text without quotes.
    pub(crate) fn interpolate(
        &self,
        text: &str,
        scope: ScopeRef,
        pos: &SourcePos,
        bare: bool,
    ) -> Result<String, EvalError> {
        if !text.contains('@') {
            return Ok(text.to_owned());
        }
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(at) = rest.find('@') {
            out.push_str(rest.get(..at).unwrap_or_default());
            let after = rest.get(at.saturating_add(1)..).unwrap_or_default();
            if let Some(braced) = after.strip_prefix('{')
                && let Some(close) = braced.find('}')
            {
                let name = braced.get(..close).unwrap_or_default();
                out.push_str(&self.variable_text(name, scope, pos)?);
                rest = braced.get(close.saturating_add(1)..).unwrap_or_default();
                continue;
            }
            let name_len = identifier_len(after);
            if bare && name_len > 0 {
                let name = after.get(..name_len).unwrap_or_default();
                out.push_str(&self.variable_text(name, scope, pos)?);
                rest = after.get(name_len..).unwrap_or_default();
            } else {
                out.push('@');
                rest = after;
            }
        }
        out.push_str(rest);
        Ok(out)
    }

    fn variable_text(&self, name: &str, scope: ScopeRef, pos: &SourcePos) -> Result<String, EvalError> {
        lookup_variable(&self.scopes, scope, name)
            .map(Value::plain_text)
            .ok_or_else(|| EvalError::undefined_variable(name, pos.clone()))
    }
}

fn identifier_len(text: &str) -> usize {
    text.bytes()
        .take_while(|byte| byte.is_ascii_alphanumeric() || *byte == b'-' || *byte == b'_')
        .count()
}

fn number_operand(value: &Value, operator: Operator) -> Result<f64, OperationError> {
    value
        .as_dimension()
        .map(|dimension| dimension.value)
        .ok_or(OperationError::Unsupported {
            operator: operator.symbol(),
            operands: "a color and a non-number",
        })
}

/// Built-in functions evaluated before the registry: type checks,
/// `default()` inside guards and `rgb()`/`rgba()`.
fn builtin(name: &str, args: &[Value], env: &ExprEnv) -> Option<Value> {
    match (name, args) {
        ("default", []) => env.default.map(Value::boolean),
        ("isnumber", [value]) => Some(Value::boolean(value.is_number())),
        ("iscolor", [value]) => Some(Value::boolean(value.as_color().is_some())),
        ("isstring", [value]) => Some(Value::boolean(value.is_string())),
        ("iskeyword", [value]) => Some(Value::boolean(
            value.is_keyword() && value.as_color().is_none(),
        )),
        ("isurl", [value]) => Some(Value::boolean(value.is_url())),
        ("ispixel", [value]) => Some(Value::boolean(value.has_unit("px"))),
        ("ispercentage", [value]) => Some(Value::boolean(value.has_unit("%"))),
        ("isem", [value]) => Some(Value::boolean(value.has_unit("em"))),
        ("isunit", [value, unit]) => Some(Value::boolean(value.has_unit(&unit.plain_text()))),
        ("isruleset", [value]) => Some(Value::boolean(value.is_ruleset())),
        ("rgb" | "rgba", [red, green, blue]) => rgb_color(red, green, blue, None),
        ("rgb" | "rgba", [red, green, blue, alpha]) => rgb_color(red, green, blue, Some(alpha)),
        _ => None,
    }
}

/// A channel is a number in `0..=255` or a percentage.
fn channel(value: &Value) -> Option<f64> {
    let dimension = value.as_dimension()?;
    match dimension.unit.as_deref() {
        None => Some(dimension.value),
        Some("%") => Some(dimension.value * 2.55),
        Some(_) => None,
    }
}

fn rgb_color(red: &Value, green: &Value, blue: &Value, alpha: Option<&Value>) -> Option<Value> {
    let alpha = match alpha {
        None => 1.0,
        Some(value) => {
            let dimension = value.as_dimension()?;
            match dimension.unit.as_deref() {
                None => dimension.value,
                Some("%") => dimension.value / 100.0,
                Some(_) => return None,
            }
        }
    };
    Some(Value::Color(Color::from_channels(
        [channel(red)?, channel(green)?, channel(blue)?],
        alpha,
    )))
}

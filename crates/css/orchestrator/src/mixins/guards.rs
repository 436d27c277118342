//! Guard evaluation (`when` conditions on mixins and rulesets).

use crate::error::EvalError;
use crate::eval::{Evaluator, ExprEnv};
use core::cmp::Ordering;
use css_syntax::{CompareOp, Condition};

impl Evaluator<'_> {
    /// Whether `condition` holds in `env`.
    ///
    /// Comparisons between values without an order (a keyword against a
    /// number) are false rather than errors.
    ///
    /// # Errors
    /// Propagates errors of the operand expressions.
    pub(crate) fn eval_condition(&self, condition: &Condition, env: &ExprEnv) -> Result<bool, EvalError> {
        match condition {
            Condition::Compare { op, left, right } => {
                let lhs = self.eval_expr(left, env)?;
                let rhs = self.eval_expr(right, env)?;
                if *op == CompareOp::Equal {
                    return Ok(lhs.loose_eq(&rhs));
                }
                Ok(lhs.compare(&rhs).is_some_and(|ordering| match op {
                    CompareOp::Less => ordering == Ordering::Less,
                    CompareOp::LessOrEqual => ordering != Ordering::Greater,
                    CompareOp::Equal => ordering == Ordering::Equal,
                    CompareOp::GreaterOrEqual => ordering != Ordering::Less,
                    CompareOp::Greater => ordering == Ordering::Greater,
                }))
            }
            Condition::Truthy(expr) => Ok(self.eval_expr(expr, env)?.is_true()),
            Condition::Not(inner) => Ok(!self.eval_condition(inner, env)?),
            Condition::And(left, right) => {
                Ok(self.eval_condition(left, env)? && self.eval_condition(right, env)?)
            }
            Condition::Or(left, right) => {
                Ok(self.eval_condition(left, env)? || self.eval_condition(right, env)?)
            }
        }
    }
}

//! Matching invocation arguments against a definition's parameters.

use crate::tree::{MixinParam, MixinSignature, Variadic};
use crate::value::Value;
use css_syntax::Expr;

/// How one parameter gets its value.
#[derive(Clone, Debug, PartialEq)]
pub enum Slot {
    Bound(Value),
    /// Evaluated in the mixin's frame after the earlier parameters are bound.
    Default(Expr),
}

/// One parameter of a plan; pattern parameters have no name.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamSlot {
    pub name: Option<String>,
    pub slot: Slot,
}

/// Accepted binding of arguments to one definition.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Plan {
    pub slots: Vec<ParamSlot>,
    /// Positional arguments left over for the variadic parameter.
    pub rest: Vec<Value>,
    /// Name of a `@rest...` parameter.
    pub rest_name: Option<String>,
}

/// Value of a pattern parameter. Only literals can be patterns.
fn literal_value(expr: &Expr) -> Option<Value> {
    match expr {
        Expr::Dimension(dimension) => Some(Value::Dimension(dimension.clone())),
        Expr::Keyword(text) => Some(Value::Keyword(text.clone())),
        Expr::Raw(text) => Some(Value::Raw(text.clone())),
        Expr::Quoted {
            text,
            quote,
            escaped,
        } => Some(Value::Quoted {
            text: text.clone(),
            quote: *quote,
            escaped: *escaped,
        }),
        Expr::Negate(inner) => match literal_value(inner)? {
            Value::Dimension(mut dimension) => {
                dimension.value = -dimension.value;
                Some(Value::Dimension(dimension))
            }
            _ => None,
        },
        Expr::Variable(_)
        | Expr::Call { .. }
        | Expr::Binary { .. }
        | Expr::Paren(_)
        | Expr::List { .. } => None,
    }
}

/// Match `args` (optionally named, already evaluated) against `signature`.
///
/// Returns `None` when the definition is incompatible: a required parameter
/// is missing, a pattern does not match, a named argument names no
/// parameter, or there are surplus positionals without a variadic.
pub fn plan(signature: &MixinSignature, args: &[(Option<String>, Value)]) -> Option<Plan> {
    let mut named: Vec<(&str, &Value)> = Vec::new();
    let mut positional = Vec::new();
    for (name, value) in args {
        match name {
            Some(name) => named.push((name.as_str(), value)),
            None => positional.push(value),
        }
    }
    let declares = |wanted: &str| {
        signature.params.iter().any(
            |param| matches!(param, MixinParam::Named { name, .. } if name == wanted),
        )
    };
    if named.iter().any(|&(name, _)| !declares(name)) {
        return None;
    }

    let mut remaining = positional.into_iter();
    let mut slots = Vec::with_capacity(signature.params.len());
    for param in &signature.params {
        match param {
            MixinParam::Named { name, default } => {
                let by_name = named
                    .iter()
                    .rev()
                    .find(|&&(given, _)| given == name.as_str())
                    .map(|(_, value)| (*value).clone());
                let slot = if let Some(value) = by_name {
                    Slot::Bound(value)
                } else if let Some(value) = remaining.next() {
                    Slot::Bound(value.clone())
                } else {
                    Slot::Default(default.clone()?)
                };
                slots.push(ParamSlot {
                    name: Some(name.clone()),
                    slot,
                });
            }
            MixinParam::Pattern(expr) => {
                let expected = literal_value(expr)?;
                let given = remaining.next()?;
                if !expected.loose_eq(given) {
                    return None;
                }
                slots.push(ParamSlot {
                    name: None,
                    slot: Slot::Bound(given.clone()),
                });
            }
        }
    }

    let rest: Vec<Value> = remaining.cloned().collect();
    let rest_name = match &signature.variadic {
        Some(Variadic::Named(name)) => Some(name.clone()),
        Some(Variadic::Anonymous) => None,
        None if rest.is_empty() => None,
        None => return None,
    };
    Some(Plan {
        slots,
        rest,
        rest_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use css_values_units::Dimension;

    fn signature(params: Vec<MixinParam>, variadic: Option<Variadic>) -> MixinSignature {
        MixinSignature {
            name: ".m".to_owned(),
            params,
            variadic,
            guard: None,
        }
    }

    fn named(name: &str, default: Option<Expr>) -> MixinParam {
        MixinParam::Named {
            name: name.to_owned(),
            default,
        }
    }

    fn px(value: f64) -> Value {
        Value::Dimension(Dimension::new(value, "px"))
    }

    /// Required parameters need an argument; defaults fill the rest.
    ///
    /// # Panics
    /// Panics if assertions fail.
    #[test]
    fn arity() {
        let sig = signature(
            vec![
                named("a", None),
                named("b", Some(Expr::Dimension(Dimension::new(2.0, "px")))),
            ],
            None,
        );
        assert!(plan(&sig, &[]).is_none());
        let one = plan(&sig, &[(None, px(1.0))]);
        assert_eq!(
            one.map(|found| found.slots.into_iter().map(|param| param.slot).collect::<Vec<_>>()),
            Some(vec![
                Slot::Bound(px(1.0)),
                Slot::Default(Expr::Dimension(Dimension::new(2.0, "px")))
            ])
        );
        assert!(plan(&sig, &[(None, px(1.0)), (None, px(2.0)), (None, px(3.0))]).is_none());
    }

    /// Named arguments bind by name and must name a parameter.
    ///
    /// # Panics
    /// Panics if assertions fail.
    #[test]
    fn named_arguments() {
        let sig = signature(vec![named("a", None), named("b", None)], None);
        let found = plan(&sig, &[(Some("b".to_owned()), px(2.0)), (None, px(1.0))]);
        assert_eq!(
            found.map(|bound| bound.slots.into_iter().map(|param| param.slot).collect::<Vec<_>>()),
            Some(vec![Slot::Bound(px(1.0)), Slot::Bound(px(2.0))])
        );
        assert!(plan(&sig, &[(Some("zzz".to_owned()), px(2.0))]).is_none());
    }

    /// Patterns only accept equal literals; variadics collect the rest.
    ///
    /// # Panics
    /// Panics if assertions fail.
    #[test]
    fn patterns_and_rest() {
        let sig = signature(
            vec![MixinParam::Pattern(Expr::keyword("dark")), named("c", None)],
            Some(Variadic::Named("rest".to_owned())),
        );
        assert!(plan(&sig, &[(None, Value::keyword("light")), (None, px(1.0))]).is_none());
        let found = plan(
            &sig,
            &[
                (None, Value::keyword("dark")),
                (None, px(1.0)),
                (None, px(2.0)),
                (None, px(3.0)),
            ],
        );
        assert_eq!(found.as_ref().map(|bound| bound.rest.len()), Some(2));
        assert_eq!(
            found.and_then(|bound| bound.rest_name),
            Some("rest".to_owned())
        );
    }
}

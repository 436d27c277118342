//! Helpers that append nodes to a [`Tree`] from snippets of source text.
//!
//! They cover single constructs (a rule header, a declaration list, a mixin
//! header or call) so an external parser, or a test, can assemble trees
//! without dealing with expression and selector syntax itself.

use crate::tree::{
    ArgValue, ImportOptions, MixinArg, MixinCall, MixinParam, MixinSignature, NodeKind, Tree,
    Variadic,
};
use anyhow::{Context as _, Result, anyhow};
use css_media_queries::parse_feature_list;
use css_selectors::{parse_selector, parse_selector_list, split_top_level};
use css_syntax::{Condition, parse_condition, parse_declarations, parse_expression, split_important_tail};
use indextree::NodeId;

/// At-rules whose preludes are feature lists and which bubble.
const CONDITIONAL_AT_RULES: [&str; 3] = ["media", "container", "supports"];

/// Split `header` at a top-level ` when ` into the head and the guard text.
fn split_guard(header: &str) -> (&str, Option<&str>) {
    let mut depth = 0usize;
    for (offset, character) in header.char_indices() {
        match character {
            '(' | '[' => depth = depth.saturating_add(1),
            ')' | ']' => depth = depth.saturating_sub(1),
            ' ' if depth == 0 => {
                if let Some(rest) = header.get(offset..)
                    && let Some(guard) = rest.strip_prefix(" when ")
                {
                    return (header.get(..offset).unwrap_or_default(), Some(guard));
                }
            }
            _ => {}
        }
    }
    (header, None)
}

fn guard(text: Option<&str>) -> Result<Option<Condition>> {
    text.map(|condition| {
        parse_condition(condition).with_context(|| format!("invalid guard '{condition}'"))
    })
    .transpose()
}

/// Name and parenthesised argument text of `name(args)`; no parentheses
/// means no arguments.
fn split_call(text: &str) -> Result<(&str, &str)> {
    let trimmed = text.trim();
    let Some(open) = trimmed.find('(') else {
        return Ok((trimmed, ""));
    };
    let name = trimmed.get(..open).unwrap_or_default().trim();
    let inner = trimmed
        .get(open.saturating_add(1)..)
        .and_then(|rest| rest.trim_end().strip_suffix(')'))
        .ok_or_else(|| anyhow!("unbalanced parentheses in '{trimmed}'"))?;
    Ok((name, inner))
}

/// Arguments are separated by `;` when one is present, otherwise by `,`.
fn split_arguments(text: &str) -> Vec<&str> {
    let separator = if split_top_level(text, ';').len() > 1 {
        ';'
    } else {
        ','
    };
    split_top_level(text, separator)
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

/// `@name: rest` with a plain identifier as name.
fn named_part(part: &str) -> Option<(&str, &str)> {
    let (head, rest) = part.split_once(':')?;
    let name = head.trim().strip_prefix('@')?;
    let plain = !name.is_empty()
        && name
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_');
    plain.then_some((name, rest.trim()))
}

/// Parse a mixin header such as `.m(@a; @b: 2px; @rest...) when (@a > 0)`.
///
/// # Errors
/// Returns an error for unbalanced parentheses or invalid defaults,
/// patterns and guards.
pub fn parse_mixin_signature(header: &str) -> Result<MixinSignature> {
    let (head, guard_text) = split_guard(header);
    let (name, params_text) = split_call(head)?;
    let mut params = Vec::new();
    let mut variadic = None;
    for part in split_arguments(params_text) {
        if variadic.is_some() {
            return Err(anyhow!("parameter '{part}' follows a variadic parameter"));
        }
        if part == "..." {
            variadic = Some(Variadic::Anonymous);
        } else if let Some(rest) = part.strip_suffix("...")
            && let Some(rest_name) = rest.strip_prefix('@')
        {
            variadic = Some(Variadic::Named(rest_name.to_owned()));
        } else if let Some((param, default)) = named_part(part) {
            let expr = parse_expression(default)
                .with_context(|| format!("invalid default for '@{param}'"))?;
            params.push(MixinParam::Named {
                name: param.to_owned(),
                default: Some(expr),
            });
        } else if let Some(param) = part.strip_prefix('@') {
            params.push(MixinParam::Named {
                name: param.to_owned(),
                default: None,
            });
        } else {
            let pattern =
                parse_expression(part).with_context(|| format!("invalid pattern '{part}'"))?;
            params.push(MixinParam::Pattern(pattern));
        }
    }
    Ok(MixinSignature {
        name: name.to_owned(),
        params,
        variadic,
        guard: guard(guard_text)?,
    })
}

/// Append a rule block; `header` may carry a guard (`.a when (@x)`).
///
/// # Errors
/// Returns an error when the guard is invalid.
pub fn append_rule(tree: &mut Tree, parent: NodeId, header: &str) -> Result<NodeId> {
    let (selectors, guard_text) = split_guard(header);
    let kind = NodeKind::RuleBlock {
        selectors: parse_selector_list(selectors),
        guard: guard(guard_text)?,
    };
    Ok(tree.append(parent, kind))
}

/// Append every declaration of `text` (`color: red; @gap: 4px`). Names
/// starting with `@` become variable declarations.
///
/// # Errors
/// Returns an error when a value is not a valid expression.
pub fn append_declarations(tree: &mut Tree, parent: NodeId, text: &str) -> Result<Vec<NodeId>> {
    parse_declarations(text)
        .into_iter()
        .map(|declaration| {
            let value = parse_expression(&declaration.value)
                .with_context(|| format!("invalid value for '{}'", declaration.name))?;
            let kind = match declaration.name.strip_prefix('@') {
                Some(name) => NodeKind::VariableDecl {
                    name: name.to_owned(),
                    value,
                },
                None => NodeKind::Declaration {
                    name: declaration.name,
                    value,
                    important: declaration.important,
                },
            };
            Ok(tree.append(parent, kind))
        })
        .collect()
}

/// Append a mixin definition from its header.
///
/// # Errors
/// See [`parse_mixin_signature`].
pub fn append_mixin(tree: &mut Tree, parent: NodeId, header: &str) -> Result<NodeId> {
    let signature = parse_mixin_signature(header)?;
    Ok(tree.append(parent, NodeKind::MixinDefinition(signature)))
}

/// Append a mixin call such as `.m(1px; @b: 2) !important`. Arguments
/// written as `{ ... }` become detached rulesets held by `DetachedBlock`
/// children of the call.
///
/// # Errors
/// Returns an error for unbalanced parentheses or invalid argument values.
pub fn append_call(tree: &mut Tree, parent: NodeId, text: &str) -> Result<NodeId> {
    let (without_important, important) = split_important_tail(text.trim().trim_end_matches(';'));
    let (name, args_text) = split_call(&without_important)?;
    let mut args = Vec::new();
    let mut bodies = Vec::new();
    for part in split_arguments(args_text) {
        let (arg_name, value_text) = match named_part(part) {
            Some((arg_name, value_text)) => (Some(arg_name.to_owned()), value_text),
            None => (None, part),
        };
        let value = if let Some(body) = value_text
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
        {
            bodies.push(body);
            ArgValue::Ruleset {
                child: bodies.len().saturating_sub(1),
            }
        } else {
            ArgValue::Expr(
                parse_expression(value_text)
                    .with_context(|| format!("invalid argument '{value_text}'"))?,
            )
        };
        args.push(MixinArg {
            name: arg_name,
            value,
        });
    }
    let call = tree.append(
        parent,
        NodeKind::MixinInvocation(MixinCall {
            name: name.to_owned(),
            args,
            important,
        }),
    );
    for body in bodies {
        let block = tree.append(
            call,
            NodeKind::DetachedBlock {
                name: String::new(),
            },
        );
        append_declarations(tree, block, body)?;
    }
    Ok(call)
}

/// Append `@name prelude { }`: a conditional at-rule for `@media`,
/// `@container` and `@supports`, a plain at-rule otherwise.
pub fn append_at_rule(tree: &mut Tree, parent: NodeId, name: &str, prelude: &str) -> NodeId {
    let kind = if CONDITIONAL_AT_RULES
        .iter()
        .any(|conditional| conditional.eq_ignore_ascii_case(name))
    {
        NodeKind::ConditionalAtRule {
            name: name.to_owned(),
            features: parse_feature_list(prelude),
        }
    } else {
        NodeKind::AtRule {
            name: name.to_owned(),
            prelude: prelude.to_owned(),
        }
    };
    tree.append(parent, kind)
}

/// Append an in-body extend such as `&:extend(.a all)`.
///
/// # Errors
/// Returns an error when the text declares no extend clause.
pub fn append_extend(tree: &mut Tree, parent: NodeId, text: &str) -> Result<NodeId> {
    let clauses = parse_selector(text.trim().trim_end_matches(';')).extends;
    if clauses.is_empty() {
        return Err(anyhow!("no extend clause in '{text}'"));
    }
    Ok(tree.append(parent, NodeKind::Extend { clauses }))
}

/// Append `@name: { }`; the returned node receives the body.
pub fn append_detached(tree: &mut Tree, parent: NodeId, name: &str) -> NodeId {
    tree.append(
        parent,
        NodeKind::DetachedBlock {
            name: name.trim_start_matches('@').to_owned(),
        },
    )
}

/// Append `@name();`.
pub fn append_detached_call(tree: &mut Tree, parent: NodeId, name: &str) -> NodeId {
    tree.append(
        parent,
        NodeKind::DetachedCall {
            name: name.trim_start_matches('@').to_owned(),
        },
    )
}

/// Append an import directive.
pub fn append_import(tree: &mut Tree, parent: NodeId, path: &str, options: ImportOptions) -> NodeId {
    tree.append(
        parent,
        NodeKind::Import {
            path: path.to_owned(),
            options,
        },
    )
}

//! Mixin invocation.
//!
//! An invocation collects the definitions visible under its name (the first
//! frame that has any wins), drops those whose parameters cannot take the
//! arguments, evaluates guards in a fresh frame per definition and expands
//! every selected body at the call site, in definition order. Guards that
//! call `default()` are evaluated last: `default()` is true iff no other
//! definition was selected.
//!
//! Selected bodies are expanded straight into the caller's output block; no
//! intermediate rule block is synthesized, which renders the same.

mod args;
mod guards;

use args::{Plan, Slot, plan};

use crate::error::EvalError;
use crate::eval::{Context, Evaluator, ExprEnv};
use crate::scope::{Binding, MixinBinding, lookup_mixins, variable_key};
use crate::tree::{ArgValue, MixinCall, NodeKind, SourcePos};
use crate::value::{Closure, Value};
use css_syntax::{Condition, ListSeparator};
use css_variables::FrameId;
use indextree::NodeId;
use log::{debug, trace};

/// A definition whose parameters accept the arguments, with its bound frame.
struct Candidate {
    binding: MixinBinding,
    frame: FrameId,
    guard: Option<Condition>,
}

impl Evaluator<'_> {
    /// Expand the call at `id` into `ctx`'s output.
    ///
    /// # Errors
    /// `UndefinedMixin` when nothing is bound under the name,
    /// `NoMatchingGuard` when no definition accepts the arguments and guards,
    /// and any error raised while evaluating arguments or bodies.
    pub(crate) fn invoke_mixin(
        &mut self,
        id: NodeId,
        call: &MixinCall,
        ctx: &Context,
        pos: &SourcePos,
    ) -> Result<(), EvalError> {
        let scope = self.scopes.snapshot(ctx.frame);
        let found = lookup_mixins(&self.scopes, scope, &call.name);
        if found.is_empty() {
            return Err(EvalError::undefined_mixin(&call.name, pos.clone()));
        }
        let callable: Vec<MixinBinding> = found
            .into_iter()
            .filter(|binding| !(binding.ruleset && self.active.contains(&binding.node)))
            .collect();
        if callable.is_empty() {
            trace!(target: "css_mixins", "'{}' refers only to rulesets being evaluated", call.name);
            return Ok(());
        }

        let args = self.eval_arguments(id, call, ctx, pos)?;
        let mut candidates = Vec::with_capacity(callable.len());
        for binding in callable {
            let Some((guard, accepted)) = self.plan_candidate(binding, &args) else {
                continue;
            };
            let frame = self.scopes.push_frame(Some(binding.scope));
            self.bind_plan(frame, accepted, pos)?;
            candidates.push(Candidate {
                binding,
                frame,
                guard,
            });
        }
        let selected = self.select_candidates(&candidates, pos)?;
        if selected.is_empty() {
            return Err(EvalError::no_matching_guard(&call.name, pos.clone()));
        }
        debug!(
            target: "css_mixins",
            "{} at {pos}: {} of {} compatible definitions selected",
            call.name,
            selected.len(),
            candidates.len()
        );

        self.enter_call(pos)?;
        let mut result = Ok(());
        for candidate in selected {
            let mut body = ctx.for_definition(candidate.frame, candidate.binding.blocked);
            body.important |= call.important;
            let node = candidate.binding.node;
            if candidate.binding.ruleset {
                self.active.push(node);
            }
            result = self.walk_children(node, &body);
            if candidate.binding.ruleset {
                self.active.pop();
            }
            if result.is_err() {
                break;
            }
        }
        self.leave_call();
        result
    }

    /// Evaluate the arguments in the caller's scope.
    fn eval_arguments(
        &self,
        id: NodeId,
        call: &MixinCall,
        ctx: &Context,
        pos: &SourcePos,
    ) -> Result<Vec<(Option<String>, Value)>, EvalError> {
        let env = self.env(ctx, pos);
        let bodies = self.source.children(id);
        call.args
            .iter()
            .map(|arg| {
                let value = match &arg.value {
                    ArgValue::Expr(expr) => self.eval_expr(expr, &env)?,
                    ArgValue::Ruleset { child } => {
                        let body = bodies.get(*child).copied().ok_or_else(|| {
                            EvalError::invalid_operation(
                                format!("missing detached ruleset argument {child}"),
                                pos.clone(),
                            )
                        })?;
                        Value::Detached(Closure {
                            body,
                            scope: env.scope,
                            blocked: ctx.blocked,
                        })
                    }
                };
                Ok((arg.name.clone(), value))
            })
            .collect()
    }

    /// Guard and argument plan of one definition, or `None` when its
    /// parameters cannot take `args`. Rulesets take no arguments.
    fn plan_candidate(
        &self,
        binding: MixinBinding,
        args: &[(Option<String>, Value)],
    ) -> Option<(Option<Condition>, Plan)> {
        match self.source.kind(binding.node)? {
            NodeKind::MixinDefinition(signature) => {
                plan(signature, args).map(|accepted| (signature.guard.clone(), accepted))
            }
            NodeKind::RuleBlock { guard, .. } if args.is_empty() => {
                Some((guard.clone(), Plan::default()))
            }
            _ => None,
        }
    }

    /// Bind parameters, the variadic rest and `@arguments` in `frame`.
    fn bind_plan(&mut self, frame: FrameId, accepted: Plan, pos: &SourcePos) -> Result<(), EvalError> {
        let mut arguments = Vec::with_capacity(accepted.slots.len().saturating_add(accepted.rest.len()));
        for param in accepted.slots {
            let value = match param.slot {
                Slot::Bound(value) => value,
                Slot::Default(expr) => {
                    let env = ExprEnv::new(self.scopes.snapshot(frame), pos.clone());
                    self.eval_expr(&expr, &env)?
                }
            };
            if let Some(name) = param.name {
                self.scopes
                    .bind(frame, variable_key(&name), Binding::Variable(value.clone()));
            }
            arguments.push(value);
        }
        if let Some(name) = accepted.rest_name {
            let rest = Value::List {
                separator: ListSeparator::Space,
                items: accepted.rest.clone(),
            };
            self.scopes
                .bind(frame, variable_key(&name), Binding::Variable(rest));
        }
        arguments.extend(accepted.rest);
        self.scopes.bind(
            frame,
            variable_key("arguments"),
            Binding::Variable(Value::List {
                separator: ListSeparator::Space,
                items: arguments,
            }),
        );
        Ok(())
    }

    /// Candidates whose guards hold, in definition order.
    fn select_candidates<'cand>(
        &self,
        candidates: &'cand [Candidate],
        pos: &SourcePos,
    ) -> Result<Vec<&'cand Candidate>, EvalError> {
        let mut selected = vec![false; candidates.len()];
        let mut deferred = Vec::new();
        for (index, candidate) in candidates.iter().enumerate() {
            let holds = match &candidate.guard {
                None => true,
                Some(guard) if guard.uses_default() => {
                    deferred.push(index);
                    false
                }
                Some(guard) => self.eval_condition(guard, &self.guard_env(candidate, pos, None))?,
            };
            if let Some(flag) = selected.get_mut(index) {
                *flag = holds;
            }
        }
        let default = !selected.contains(&true);
        for index in deferred {
            let (Some(candidate), Some(flag)) = (candidates.get(index), selected.get_mut(index))
            else {
                continue;
            };
            if let Some(guard) = &candidate.guard {
                *flag = self.eval_condition(guard, &self.guard_env(candidate, pos, Some(default)))?;
            }
        }
        Ok(candidates
            .iter()
            .zip(selected)
            .filter_map(|(candidate, holds)| holds.then_some(candidate))
            .collect())
    }

    fn guard_env(&self, candidate: &Candidate, pos: &SourcePos, default: Option<bool>) -> ExprEnv {
        let mut env = ExprEnv::new(self.scopes.snapshot(candidate.frame), pos.clone());
        env.parens = true;
        env.default = default;
        env
    }
}

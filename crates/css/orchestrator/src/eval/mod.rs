//! The primary walk: one depth-first pass over the source tree that binds
//! variables and mixins, expands invocations and imports, and writes the
//! resolved output tree.
//!
//! Nested rule blocks are flattened into the nearest output container (the
//! root or an at-rule), right after their parent's block, so declarations of
//! the parent that follow a nested block still land in the parent.

mod expr;
mod imports;

pub use expr::ExprEnv;

use crate::collaborators::{FunctionRegistry, ImportResolver};
use crate::error::EvalError;
use crate::options::EvalOptions;
use crate::scope::{Binding, MixinBinding, Scopes, lookup_variable, variable_key};
use crate::tree::{Node, NodeKind, SourcePos, Tree, Visibility};
use crate::value::{Closure, Value};
use crate::{bubbling, extend, visibility};
use anyhow::{Context as _, Result};
use css_media_queries::parse_feature_list;
use css_selectors::{ExtendClause, Selector, join_selector_lists, parse_selector};
use css_syntax::{Condition, parse_expression};
use css_variables::{FrameId, ScopeRef};
use indextree::NodeId;
use log::{debug, trace};
use std::collections::BTreeSet;

/// Where output goes and under which scope and visibility the current
/// source node is evaluated.
#[derive(Clone, Debug)]
pub struct Context {
    pub frame: FrameId,
    /// Resolved selectors of the enclosing rule; empty at top level.
    pub selectors: Vec<Selector>,
    /// Output node receiving rule blocks and at-rules.
    pub container: NodeId,
    /// Output node receiving declarations.
    pub target: Option<NodeId>,
    /// Output is produced on behalf of a reference import.
    pub blocked: bool,
    /// Explicit visibility given to produced nodes.
    pub visibility: Visibility,
    /// Produced declarations are forced `!important`.
    pub important: bool,
}

impl Context {
    /// Whether nodes produced in this context end up in the output.
    pub const fn emits(&self) -> bool {
        match self.visibility {
            Visibility::VisibleTrue => true,
            Visibility::VisibleFalse => false,
            Visibility::Inherit => !self.blocked,
        }
    }

    /// Context for the children of `node`.
    fn enter(&self, node: &Node) -> Self {
        let mut next = self.clone();
        next.blocked |= node.blocks_output;
        if node.visibility != Visibility::Inherit {
            next.visibility = node.visibility;
        }
        next
    }

    /// Context for the body of a definition evaluated at this call site.
    /// A blocked definition called from an emitting site is forced visible.
    pub fn for_definition(&self, frame: FrameId, definition_blocked: bool) -> Self {
        let mut next = self.clone();
        next.frame = frame;
        if definition_blocked {
            if self.emits() {
                next.visibility = Visibility::VisibleTrue;
            }
            next.blocked = true;
        }
        next
    }
}

/// Evaluation state for one input tree.
pub struct Evaluator<'env> {
    pub(crate) options: &'env EvalOptions,
    pub(crate) imports: &'env dyn ImportResolver,
    pub(crate) functions: &'env dyn FunctionRegistry,
    /// Input plus grafted imports.
    pub(crate) source: Tree,
    pub(crate) out: Tree,
    pub(crate) scopes: Scopes,
    /// Current mixin/detached call nesting.
    pub(crate) depth: usize,
    /// Rulesets whose bodies are being evaluated.
    pub(crate) active: Vec<NodeId>,
    /// Paths already imported once.
    pub(crate) imported: BTreeSet<String>,
}

impl<'env> Evaluator<'env> {
    pub fn new(
        source: Tree,
        options: &'env EvalOptions,
        imports: &'env dyn ImportResolver,
        functions: &'env dyn FunctionRegistry,
    ) -> Self {
        let out = Tree::new(source.file());
        Self {
            options,
            imports,
            functions,
            source,
            out,
            scopes: Scopes::new(),
            depth: 0,
            active: Vec::new(),
            imported: BTreeSet::new(),
        }
    }

    /// Run every pass and return the resolved tree.
    ///
    /// # Errors
    /// Returns the first `EvalError` raised by the walk, or an error when a
    /// global variable cannot be parsed.
    pub fn run(mut self) -> Result<Tree> {
        let frame = self.scopes.push_frame(None);
        self.bind_globals(frame)?;
        let ctx = Context {
            frame,
            selectors: Vec::new(),
            container: self.out.root(),
            target: None,
            blocked: false,
            visibility: Visibility::Inherit,
            important: false,
        };
        self.walk_children(self.source.root(), &ctx)?;
        debug!(
            target: "css_orchestrator",
            "primary walk done: {} frames, {} output nodes",
            self.scopes.len(),
            self.out.descendants(self.out.root()).len()
        );
        let report = extend::resolve_extends(&mut self.out);
        debug!(target: "css_orchestrator", "extend pass: {report:?}");
        bubbling::bubble_at_rules(&mut self.out);
        visibility::prune_empty(&mut self.out);
        Ok(self.out)
    }

    fn bind_globals(&mut self, frame: FrameId) -> Result<()> {
        let pos = SourcePos::new("<globals>", 0, 0);
        let options = self.options;
        for (name, text) in &options.globals {
            let expr = parse_expression(text)
                .with_context(|| format!("invalid value for global variable '@{name}'"))?;
            let env = ExprEnv::new(self.scopes.snapshot(frame), pos.clone());
            let value = self.eval_expr(&expr, &env)?;
            self.scopes
                .bind(frame, variable_key(name), Binding::Variable(value));
        }
        Ok(())
    }

    /// Expression environment for the current state of `ctx`'s frame.
    pub(crate) fn env(&self, ctx: &Context, pos: &SourcePos) -> ExprEnv {
        ExprEnv::new(self.scopes.snapshot(ctx.frame), pos.clone())
    }

    /// Append an output node carrying the context's visibility state.
    pub(crate) fn emit(&mut self, parent: NodeId, kind: NodeKind, pos: SourcePos, ctx: &Context) -> NodeId {
        let mut node = Node::new(kind, pos);
        node.blocks_output = ctx.blocked;
        node.visibility = ctx.visibility;
        self.out.append_node(parent, node)
    }

    pub(crate) fn walk_children(&mut self, parent: NodeId, ctx: &Context) -> Result<(), EvalError> {
        for child in self.source.children(parent) {
            self.eval_node(child, ctx)?;
        }
        Ok(())
    }

    fn eval_node(&mut self, id: NodeId, outer: &Context) -> Result<(), EvalError> {
        let Some(node) = self.source.node(id).cloned() else {
            return Ok(());
        };
        let ctx = outer.enter(&node);
        let pos = node.pos;
        trace!(target: "css_orchestrator", "evaluating {:?} at {pos}", node.kind);
        match node.kind {
            NodeKind::Root => self.walk_children(id, &ctx),
            NodeKind::RuleBlock { selectors, guard } => {
                self.eval_rule_block(id, &selectors, guard.as_ref(), &ctx, &pos)
            }
            NodeKind::Declaration {
                name,
                value,
                important,
            } => {
                let scope = self.scopes.snapshot(ctx.frame);
                let name = self.interpolate(&name, scope, &pos, false)?;
                let value = self.eval_expr(&value, &self.env(&ctx, &pos))?;
                self.emit_declaration(name, value, important, &ctx, pos)
            }
            NodeKind::ResolvedDeclaration {
                name,
                value,
                important,
            } => self.emit_declaration(name, value, important, &ctx, pos),
            NodeKind::VariableDecl { name, value } => {
                let value = self.eval_expr(&value, &self.env(&ctx, &pos))?;
                trace!(target: "css_orchestrator", "@{name} = {value}");
                self.scopes
                    .bind(ctx.frame, variable_key(&name), Binding::Variable(value));
                Ok(())
            }
            NodeKind::MixinDefinition(signature) => {
                self.bind_definition(id, &signature.name, &ctx, false);
                Ok(())
            }
            NodeKind::MixinInvocation(call) => self.invoke_mixin(id, &call, &ctx, &pos),
            NodeKind::ConditionalAtRule { name, features } => {
                let scope = self.scopes.snapshot(ctx.frame);
                let text = self.interpolate(&features.to_string(), scope, &pos, true)?;
                let kind = NodeKind::ConditionalAtRule {
                    name,
                    features: parse_feature_list(&text),
                };
                self.eval_conditional(id, kind, &ctx, pos)
            }
            NodeKind::AtRule { name, prelude } => {
                let scope = self.scopes.snapshot(ctx.frame);
                let prelude = self.interpolate(&prelude, scope, &pos, true)?;
                let rule = self.emit(ctx.container, NodeKind::AtRule { name, prelude }, pos, &ctx);
                let inner = Context {
                    frame: self.scopes.push_frame(Some(scope)),
                    selectors: Vec::new(),
                    container: rule,
                    target: Some(rule),
                    ..ctx
                };
                self.walk_children(id, &inner)
            }
            NodeKind::Extend { clauses } => {
                self.attach_extends(&clauses, &ctx);
                Ok(())
            }
            NodeKind::DetachedBlock { name } => {
                let closure = Closure {
                    body: id,
                    scope: self.scopes.snapshot(ctx.frame),
                    blocked: ctx.blocked,
                };
                self.scopes.bind(
                    ctx.frame,
                    variable_key(&name),
                    Binding::Variable(Value::Detached(closure)),
                );
                Ok(())
            }
            NodeKind::DetachedCall { name } => self.call_detached(&name, &ctx, &pos),
            NodeKind::Import { path, options } => self.eval_import(id, &path, options, &ctx, &pos),
            NodeKind::Comment { text } => {
                let parent = ctx.target.unwrap_or(ctx.container);
                self.emit(parent, NodeKind::Comment { text }, pos, &ctx);
                Ok(())
            }
        }
    }

    fn emit_declaration(
        &mut self,
        name: String,
        value: Value,
        important: bool,
        ctx: &Context,
        pos: SourcePos,
    ) -> Result<(), EvalError> {
        if value.is_ruleset() {
            return Err(EvalError::invalid_operation(
                format!("detached ruleset used as the value of '{name}'"),
                pos,
            ));
        }
        let parent = ctx.target.unwrap_or(ctx.container);
        let kind = NodeKind::ResolvedDeclaration {
            name,
            value,
            important: important || ctx.important,
        };
        self.emit(parent, kind, pos, ctx);
        Ok(())
    }

    /// Bind a mixin definition or a callable ruleset in the current frame.
    /// The captured scope includes the binding itself so guards can recurse.
    fn bind_definition(&mut self, id: NodeId, name: &str, ctx: &Context, ruleset: bool) {
        let visible = self.scopes.snapshot(ctx.frame).visible.saturating_add(1);
        let binding = MixinBinding {
            node: id,
            scope: ScopeRef {
                frame: ctx.frame,
                visible,
            },
            blocked: ctx.blocked,
            ruleset,
        };
        self.scopes
            .bind(ctx.frame, name.to_owned(), Binding::Mixin(binding));
    }

    fn eval_rule_block(
        &mut self,
        id: NodeId,
        selectors: &[Selector],
        guard: Option<&Condition>,
        ctx: &Context,
        pos: &SourcePos,
    ) -> Result<(), EvalError> {
        if let [only] = selectors
            && let Some(name) = only.mixin_name()
        {
            self.bind_definition(id, name, ctx, true);
        }
        if let Some(condition) = guard {
            let mut env = self.env(ctx, pos);
            env.parens = true;
            if !self.eval_condition(condition, &env)? {
                trace!(target: "css_orchestrator", "rule guard {condition} failed at {pos}");
                return Ok(());
            }
        }
        let resolved = self.resolve_selectors(selectors, ctx, pos)?;
        let block = self.emit(
            ctx.container,
            NodeKind::RuleBlock {
                selectors: resolved.clone(),
                guard: None,
            },
            pos.clone(),
            ctx,
        );
        let inner = Context {
            frame: self
                .scopes
                .push_frame(Some(self.scopes.snapshot(ctx.frame))),
            selectors: resolved,
            target: Some(block),
            ..ctx.clone()
        };
        self.active.push(id);
        let result = self.walk_children(id, &inner);
        self.active.pop();
        result
    }

    /// Interpolate `@{name}` in selectors and join them with the enclosing
    /// rule's selectors.
    fn resolve_selectors(
        &self,
        selectors: &[Selector],
        ctx: &Context,
        pos: &SourcePos,
    ) -> Result<Vec<Selector>, EvalError> {
        let scope = self.scopes.snapshot(ctx.frame);
        let mut interpolated = Vec::with_capacity(selectors.len());
        for selector in selectors {
            let needs_text = selector
                .elements
                .iter()
                .any(|element| element.value.contains("@{"));
            if needs_text {
                let text = self.interpolate(&selector.to_string(), scope, pos, false)?;
                let mut reparsed = parse_selector(&text);
                reparsed.extends.clone_from(&selector.extends);
                interpolated.push(reparsed);
            } else {
                interpolated.push(selector.clone());
            }
        }
        Ok(join_selector_lists(&ctx.selectors, &interpolated))
    }

    fn eval_conditional(
        &mut self,
        id: NodeId,
        kind: NodeKind,
        ctx: &Context,
        pos: SourcePos,
    ) -> Result<(), EvalError> {
        let rule = self.emit(ctx.container, kind, pos.clone(), ctx);
        let target = if ctx.selectors.is_empty() {
            None
        } else {
            let selectors = ctx.selectors.iter().map(Selector::without_extends).collect();
            Some(self.emit(
                rule,
                NodeKind::RuleBlock {
                    selectors,
                    guard: None,
                },
                pos,
                ctx,
            ))
        };
        let inner = Context {
            frame: self
                .scopes
                .push_frame(Some(self.scopes.snapshot(ctx.frame))),
            container: rule,
            target,
            ..ctx.clone()
        };
        self.walk_children(id, &inner)
    }

    /// `&:extend(...)` applies to every selector of the enclosing output block.
    fn attach_extends(&mut self, clauses: &[ExtendClause], ctx: &Context) {
        let Some(target) = ctx.target else {
            debug!(target: "css_extend", "extend outside of a rule block ignored");
            return;
        };
        if let Some(Node {
            kind: NodeKind::RuleBlock { selectors, .. },
            ..
        }) = self.out.node_mut(target)
        {
            for selector in selectors {
                selector.extends.extend(clauses.iter().cloned());
            }
        }
    }

    fn call_detached(&mut self, name: &str, ctx: &Context, pos: &SourcePos) -> Result<(), EvalError> {
        let scope = self.scopes.snapshot(ctx.frame);
        let closure = match lookup_variable(&self.scopes, scope, name) {
            Some(Value::Detached(closure)) => *closure,
            Some(_) => {
                return Err(EvalError::invalid_operation(
                    format!("'@{name}' is not a detached ruleset"),
                    pos.clone(),
                ));
            }
            None => return Err(EvalError::undefined_variable(name, pos.clone())),
        };
        self.enter_call(pos)?;
        let frame = self.scopes.push_frame(Some(closure.scope));
        let body = ctx.for_definition(frame, closure.blocked);
        let result = self.walk_children(closure.body, &body);
        self.leave_call();
        result
    }

    /// Count one level of call nesting.
    pub(crate) fn enter_call(&mut self, pos: &SourcePos) -> Result<(), EvalError> {
        if self.depth >= self.options.max_call_depth {
            return Err(EvalError::call_depth_exceeded(
                self.options.max_call_depth,
                pos.clone(),
            ));
        }
        self.depth = self.depth.saturating_add(1);
        Ok(())
    }

    pub(crate) fn leave_call(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

#![cfg(test)]

mod common;

use common::{error_kind, error_with, eval, eval_with, render};
use core::error::Error;
use css_orchestrator::builder::{
    append_declarations, append_detached, append_detached_call, append_rule,
};
use css_orchestrator::{
    ErrorKind, EvalOptions, FunctionOutcome, FunctionRegistry, MathMode, NoImports, Tree, Value,
    evaluate,
};

/// Tree with one `.x` rule holding `declarations`.
fn single_rule(declarations: &str) -> Result<Tree, Box<dyn Error>> {
    let mut tree = Tree::new("main.less");
    let root = tree.root();
    let rule = append_rule(&mut tree, root, ".x")?;
    append_declarations(&mut tree, rule, declarations)?;
    Ok(tree)
}

/// Inner frames shadow outer ones without changing them.
///
/// # Errors
/// Returns an error if building or evaluating the tree fails.
#[test]
fn shadowing() -> Result<(), Box<dyn Error>> {
    let mut tree = Tree::new("main.less");
    let root = tree.root();
    append_declarations(&mut tree, root, "@c: red")?;
    let inner = append_rule(&mut tree, root, ".x")?;
    append_declarations(&mut tree, inner, "@c: blue; color: @c")?;
    let outer = append_rule(&mut tree, root, ".y")?;
    append_declarations(&mut tree, outer, "color: @c")?;

    assert_eq!(
        render(&eval(tree)?),
        vec![".x { color: blue; }".to_owned(), ".y { color: red; }".to_owned()]
    );
    Ok(())
}

/// Variables are bound in order; the last definition in a frame wins from
/// then on.
///
/// # Errors
/// Returns an error if building or evaluating the tree fails.
#[test]
fn ordered_bindings() -> Result<(), Box<dyn Error>> {
    let out = eval(single_rule("@a: 1px; @a: 2px; width: @a")?)?;
    assert_eq!(render(&out), vec![".x { width: 2px; }".to_owned()]);

    let mut tree = Tree::new("main.less");
    let root = tree.root();
    let rule = append_rule(&mut tree, root, ".x")?;
    append_declarations(&mut tree, rule, "color: @later")?;
    append_declarations(&mut tree, root, "@later: red")?;
    assert_eq!(
        error_kind(tree),
        Some(ErrorKind::UndefinedVariable {
            name: "later".to_owned()
        })
    );
    Ok(())
}

/// Globals from the options are visible everywhere.
///
/// # Errors
/// Returns an error if building or evaluating the tree fails.
#[test]
fn global_variables() -> Result<(), Box<dyn Error>> {
    let mut options = EvalOptions::default();
    options
        .globals
        .insert("brand".to_owned(), "#336699".to_owned());
    let out = eval_with(single_rule("color: @brand")?, &options, &NoImports)?;
    assert_eq!(render(&out), vec![".x { color: #336699; }".to_owned()]);
    Ok(())
}

/// Division outside parentheses is kept by default; the other modes
/// compute everything or only parenthesised operations.
///
/// # Errors
/// Returns an error if building or evaluating the tree fails.
#[test]
fn math_modes() -> Result<(), Box<dyn Error>> {
    let declarations = "a: 10px/2; b: (10px/2); c: 1px + 2px";
    let default = eval(single_rule(declarations)?)?;
    assert_eq!(
        render(&default),
        vec![".x { a: 10px/2; b: 5px; c: 3px; }".to_owned()]
    );

    let always = EvalOptions {
        math: MathMode::Always,
        ..EvalOptions::default()
    };
    let computed = eval_with(single_rule(declarations)?, &always, &NoImports)?;
    assert_eq!(
        render(&computed),
        vec![".x { a: 5px; b: 5px; c: 3px; }".to_owned()]
    );

    let parens = EvalOptions {
        math: MathMode::Parens,
        ..EvalOptions::default()
    };
    let kept = eval_with(single_rule(declarations)?, &parens, &NoImports)?;
    assert_eq!(
        render(&kept),
        vec![".x { a: 10px/2; b: 5px; c: 1px + 2px; }".to_owned()]
    );
    Ok(())
}

/// Hex colors take part in arithmetic; mixed units follow the options.
///
/// # Errors
/// Returns an error if building or evaluating the tree fails.
#[test]
fn color_and_unit_arithmetic() -> Result<(), Box<dyn Error>> {
    let out = eval(single_rule("color: #112233 * 2; width: 1px + 1em")?)?;
    assert_eq!(
        render(&out),
        vec![".x { color: #224466; width: 2px; }".to_owned()]
    );

    let strict = EvalOptions {
        strict_units: true,
        ..EvalOptions::default()
    };
    let error = error_with(single_rule("width: 1px + 1em")?, &strict);
    assert!(matches!(
        error.map(|failure| failure.kind),
        Some(ErrorKind::InvalidOperationType { .. })
    ));
    Ok(())
}

/// `@{name}` is replaced in selectors and strings.
///
/// # Errors
/// Returns an error if building or evaluating the tree fails.
#[test]
fn interpolation() -> Result<(), Box<dyn Error>> {
    let mut tree = Tree::new("main.less");
    let root = tree.root();
    append_declarations(&mut tree, root, "@name: banner; @who: \"world\"")?;
    let rule = append_rule(&mut tree, root, ".@{name}")?;
    append_declarations(&mut tree, rule, "content: \"hello @{who}\"")?;

    assert_eq!(
        render(&eval(tree)?),
        vec![".banner { content: \"hello world\"; }".to_owned()]
    );
    Ok(())
}

/// `calc()` keeps its arguments as written; `rgb()` builds a color.
///
/// # Errors
/// Returns an error if building or evaluating the tree fails.
#[test]
fn builtin_functions() -> Result<(), Box<dyn Error>> {
    let out = eval(single_rule("width: calc(100% - 10px); color: rgb(255, 0, 0)")?)?;
    assert_eq!(
        render(&out),
        vec![".x { width: calc(100% - 10px); color: #ff0000; }".to_owned()]
    );
    Ok(())
}

struct Doubling;

impl FunctionRegistry for Doubling {
    fn call(&self, name: &str, args: &[Value]) -> anyhow::Result<FunctionOutcome> {
        if name != "double" {
            return Ok(FunctionOutcome::NotRegistered);
        }
        let [Value::Dimension(dimension)] = args else {
            return Err(anyhow::anyhow!("double() takes one number"));
        };
        let mut doubled = dimension.clone();
        doubled.value *= 2.0;
        Ok(FunctionOutcome::Value(Value::Dimension(doubled)))
    }
}

/// Registered functions are called; unknown ones pass through.
///
/// # Errors
/// Returns an error if building or evaluating the tree fails.
#[test]
fn registered_functions() -> Result<(), Box<dyn Error>> {
    let tree = single_rule("width: double(4px); other: unknown(1, 2)")?;
    let out = evaluate(tree, &EvalOptions::default(), &NoImports, &Doubling)?;
    assert_eq!(
        render(&out),
        vec![".x { width: 8px; other: unknown(1, 2); }".to_owned()]
    );

    let failing = single_rule("width: double(red)")?;
    let error = evaluate(failing, &EvalOptions::default(), &NoImports, &Doubling)
        .err()
        .ok_or("evaluation should fail")?;
    assert!(error.to_string().contains("double() takes one number"));
    Ok(())
}

/// A detached ruleset sees the bindings of its definition point.
///
/// # Errors
/// Returns an error if building or evaluating the tree fails.
#[test]
fn detached_rulesets_capture_their_scope() -> Result<(), Box<dyn Error>> {
    let mut tree = Tree::new("main.less");
    let root = tree.root();
    append_declarations(&mut tree, root, "@c: red")?;
    let rules = append_detached(&mut tree, root, "@rules");
    append_declarations(&mut tree, rules, "color: @c")?;
    append_declarations(&mut tree, root, "@c: blue")?;
    let caller = append_rule(&mut tree, root, ".x")?;
    append_detached_call(&mut tree, caller, "@rules");
    let reader = append_rule(&mut tree, root, ".y")?;
    append_declarations(&mut tree, reader, "color: @c")?;

    assert_eq!(
        render(&eval(tree)?),
        vec![".x { color: red; }".to_owned(), ".y { color: blue; }".to_owned()]
    );
    Ok(())
}

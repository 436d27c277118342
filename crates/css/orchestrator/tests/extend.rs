#![cfg(test)]

mod common;

use common::{eval, render};
use core::error::Error;
use css_orchestrator::builder::{append_at_rule, append_declarations, append_extend, append_rule};
use css_orchestrator::{Tree, resolve_extends};

/// Extends chain transitively into one block.
///
/// # Errors
/// Returns an error if building or evaluating the tree fails.
#[test]
fn extends_are_transitive() -> Result<(), Box<dyn Error>> {
    let mut tree = Tree::new("main.less");
    let root = tree.root();
    let base = append_rule(&mut tree, root, ".a")?;
    append_declarations(&mut tree, base, "color: black")?;
    append_rule(&mut tree, root, ".b:extend(.a)")?;
    append_rule(&mut tree, root, ".c:extend(.b)")?;

    let out = eval(tree)?;
    assert_eq!(render(&out), vec![".a, .b, .c { color: black; }".to_owned()]);
    Ok(())
}

/// Resolving the output again adds nothing.
///
/// # Errors
/// Returns an error if building or evaluating the tree fails.
#[test]
fn resolution_is_idempotent() -> Result<(), Box<dyn Error>> {
    let mut tree = Tree::new("main.less");
    let root = tree.root();
    let base = append_rule(&mut tree, root, ".a")?;
    append_declarations(&mut tree, base, "color: black")?;
    let middle = append_rule(&mut tree, root, ".b:extend(.a)")?;
    append_declarations(&mut tree, middle, "width: 1px")?;
    append_rule(&mut tree, root, ".c:extend(.b)")?;

    let mut out = eval(tree)?;
    let before = render(&out);
    assert_eq!(
        before,
        vec![
            ".a, .b, .c { color: black; }".to_owned(),
            ".b, .c { width: 1px; }".to_owned(),
        ]
    );
    let again = resolve_extends(&mut out);
    assert_eq!(again.added, 0);
    assert_eq!(render(&out), before);
    Ok(())
}

/// Extends inside an at-rule only see that at-rule, and top-level extends
/// never reach into one.
///
/// # Errors
/// Returns an error if building or evaluating the tree fails.
#[test]
fn extends_stay_inside_their_at_rule() -> Result<(), Box<dyn Error>> {
    let mut tree = Tree::new("main.less");
    let root = tree.root();
    let media = append_at_rule(&mut tree, root, "media", "print");
    let inside = append_rule(&mut tree, media, ".inside")?;
    append_declarations(&mut tree, inside, "color: red")?;
    append_rule(&mut tree, media, ".x:extend(.outside)")?;
    append_rule(&mut tree, media, ".y:extend(.inside)")?;
    let outside = append_rule(&mut tree, root, ".outside")?;
    append_declarations(&mut tree, outside, "color: blue")?;
    append_rule(&mut tree, root, ".z:extend(.inside)")?;

    let out = eval(tree)?;
    assert_eq!(
        render(&out),
        vec![
            "@media print { .inside, .y { color: red; } }".to_owned(),
            ".outside { color: blue; }".to_owned(),
        ]
    );
    Ok(())
}

/// `&:extend(...)` in a body extends the enclosing rule's selectors.
///
/// # Errors
/// Returns an error if building or evaluating the tree fails.
#[test]
fn in_body_extend() -> Result<(), Box<dyn Error>> {
    let mut tree = Tree::new("main.less");
    let root = tree.root();
    let base = append_rule(&mut tree, root, ".a")?;
    append_declarations(&mut tree, base, "color: red")?;
    let extender = append_rule(&mut tree, root, ".b")?;
    append_extend(&mut tree, extender, "&:extend(.a);")?;
    append_declarations(&mut tree, extender, "width: 1px")?;

    let out = eval(tree)?;
    assert_eq!(
        render(&out),
        vec![
            ".a, .b { color: red; }".to_owned(),
            ".b { width: 1px; }".to_owned()
        ]
    );
    Ok(())
}

/// `all` matches inside compound selectors; nested selectors match after
/// joining with their parent.
///
/// # Errors
/// Returns an error if building or evaluating the tree fails.
#[test]
fn all_mode_and_nested_targets() -> Result<(), Box<dyn Error>> {
    let mut tree = Tree::new("main.less");
    let root = tree.root();
    let hover = append_rule(&mut tree, root, ".x .a:hover")?;
    append_declarations(&mut tree, hover, "color: red")?;
    let parent = append_rule(&mut tree, root, ".parent")?;
    let child = append_rule(&mut tree, parent, ".child")?;
    append_declarations(&mut tree, child, "color: green")?;
    append_rule(&mut tree, root, ".b:extend(.a all)")?;
    append_rule(&mut tree, root, ".other:extend(.parent .child)")?;

    let out = eval(tree)?;
    assert_eq!(
        render(&out),
        vec![
            ".x .a:hover, .x .b:hover { color: red; }".to_owned(),
            ".parent .child, .other { color: green; }".to_owned(),
        ]
    );
    Ok(())
}

/// Mutual extends terminate without growing.
///
/// # Errors
/// Returns an error if building or evaluating the tree fails.
#[test]
fn circular_extends_are_ignored() -> Result<(), Box<dyn Error>> {
    let mut tree = Tree::new("main.less");
    let root = tree.root();
    let first = append_rule(&mut tree, root, ".a:extend(.b)")?;
    append_declarations(&mut tree, first, "color: red")?;
    let second = append_rule(&mut tree, root, ".b:extend(.a)")?;
    append_declarations(&mut tree, second, "color: blue")?;

    let out = eval(tree)?;
    assert_eq!(
        render(&out),
        vec![
            ".a, .b { color: red; }".to_owned(),
            ".b, .a { color: blue; }".to_owned()
        ]
    );
    Ok(())
}

/// `all`-mode output is stable under another resolution.
///
/// # Errors
/// Returns an error if building or evaluating the tree fails.
#[test]
fn all_mode_resolution_is_idempotent() -> Result<(), Box<dyn Error>> {
    let mut tree = Tree::new("main.less");
    let root = tree.root();
    let base = append_rule(&mut tree, root, ".a .c")?;
    append_declarations(&mut tree, base, "color: black")?;
    let extender = append_rule(&mut tree, root, ".a.b:extend(.a all)")?;
    append_declarations(&mut tree, extender, "width: 1px")?;

    let mut out = eval(tree)?;
    let before = render(&out);
    assert_eq!(
        before,
        vec![
            ".a .c, .a.b .c { color: black; }".to_owned(),
            ".a.b { width: 1px; }".to_owned(),
        ]
    );
    assert_eq!(resolve_extends(&mut out).added, 0);
    assert_eq!(resolve_extends(&mut out).added, 0);
    assert_eq!(render(&out), before);
    Ok(())
}

/// A clause in an at-rule reaches rule blocks in at-rules nested inside it;
/// a clause in the nested at-rule does not reach out.
///
/// # Errors
/// Returns an error if building or evaluating the tree fails.
#[test]
fn extends_reach_nested_at_rules() -> Result<(), Box<dyn Error>> {
    let mut tree = Tree::new("main.less");
    let root = tree.root();
    let outer = append_at_rule(&mut tree, root, "media", "screen");
    let shallow = append_rule(&mut tree, outer, ".shallow")?;
    append_declarations(&mut tree, shallow, "color: red")?;
    append_rule(&mut tree, outer, ".x:extend(.deep)")?;
    let inner = append_at_rule(&mut tree, outer, "media", "(min-width: 10px)");
    let deep = append_rule(&mut tree, inner, ".deep")?;
    append_declarations(&mut tree, deep, "color: blue")?;
    append_rule(&mut tree, inner, ".y:extend(.shallow)")?;

    let out = eval(tree)?;
    assert_eq!(
        render(&out),
        vec![
            "@media screen { .shallow { color: red; } }".to_owned(),
            "@media screen and (min-width: 10px) { .deep, .x { color: blue; } }".to_owned(),
        ]
    );
    Ok(())
}


#![cfg(test)]

mod common;

use common::{error_in, eval, eval_with, render};
use core::error::Error;
use css_orchestrator::builder::{
    append_call, append_declarations, append_import, append_mixin, append_rule,
};
use css_orchestrator::tree::ImportOptions;
use css_orchestrator::{ErrorKind, EvalOptions, StaticImports, Tree};

fn library() -> Result<Tree, Box<dyn Error>> {
    let mut tree = Tree::new("lib.less");
    let root = tree.root();
    let mixin = append_mixin(&mut tree, root, ".m()")?;
    append_declarations(&mut tree, mixin, "color: red")?;
    let hidden = append_rule(&mut tree, root, ".hidden")?;
    append_declarations(&mut tree, hidden, "color: blue")?;
    let inside = append_rule(&mut tree, root, ".inside")?;
    append_call(&mut tree, inside, ".m();")?;
    Ok(tree)
}

fn part() -> Result<Tree, Box<dyn Error>> {
    let mut tree = Tree::new("part.less");
    let root = tree.root();
    let rule = append_rule(&mut tree, root, ".p")?;
    append_declarations(&mut tree, rule, "color: red")?;
    Ok(tree)
}

const REFERENCE: ImportOptions = ImportOptions {
    reference: true,
    opaque: false,
    multiple: false,
    optional: false,
};

/// Reference imports emit nothing by themselves, but what an emitting rule
/// pulls out of them is shown.
///
/// # Errors
/// Returns an error if building or evaluating the tree fails.
#[test]
fn reference_import_shows_only_used_parts() -> Result<(), Box<dyn Error>> {
    let mut imports = StaticImports::new();
    imports.insert("lib.less", library()?);
    let mut tree = Tree::new("main.less");
    let root = tree.root();
    append_import(&mut tree, root, "lib.less", REFERENCE);
    let site = append_rule(&mut tree, root, ".x")?;
    append_call(&mut tree, site, ".m();")?;
    append_call(&mut tree, site, ".hidden;")?;

    let out = eval_with(tree, &EvalOptions::default(), &imports)?;
    assert_eq!(render(&out), vec![".x { color: red; color: blue; }".to_owned()]);
    Ok(())
}

/// Without a call from emitting code, a reference import stays silent.
///
/// # Errors
/// Returns an error if building or evaluating the tree fails.
#[test]
fn reference_import_alone_is_silent() -> Result<(), Box<dyn Error>> {
    let mut imports = StaticImports::new();
    imports.insert("lib.less", library()?);
    let mut tree = Tree::new("main.less");
    let root = tree.root();
    append_import(&mut tree, root, "lib.less", REFERENCE);

    let out = eval_with(tree, &EvalOptions::default(), &imports)?;
    assert!(render(&out).is_empty());
    Ok(())
}

/// `.css` paths pass through as literal imports.
///
/// # Errors
/// Returns an error if building or evaluating the tree fails.
#[test]
fn css_imports_are_opaque() -> Result<(), Box<dyn Error>> {
    let mut tree = Tree::new("main.less");
    let root = tree.root();
    append_import(&mut tree, root, "reset.css", ImportOptions::default());

    let out = eval(tree)?;
    assert_eq!(render(&out), vec!["@import \"reset.css\";".to_owned()]);
    Ok(())
}

/// A path is imported once unless `multiple` is given.
///
/// # Errors
/// Returns an error if building or evaluating the tree fails.
#[test]
fn once_and_multiple() -> Result<(), Box<dyn Error>> {
    let mut imports = StaticImports::new();
    imports.insert("part.less", part()?);

    let mut once = Tree::new("main.less");
    let once_root = once.root();
    append_import(&mut once, once_root, "part.less", ImportOptions::default());
    append_import(&mut once, once_root, "part.less", ImportOptions::default());
    let single = eval_with(once, &EvalOptions::default(), &imports)?;
    assert_eq!(render(&single), vec![".p { color: red; }".to_owned()]);

    let multiple = ImportOptions {
        multiple: true,
        ..ImportOptions::default()
    };
    let mut twice = Tree::new("main.less");
    let twice_root = twice.root();
    append_import(&mut twice, twice_root, "part.less", multiple);
    append_import(&mut twice, twice_root, "part.less", multiple);
    let repeated = eval_with(twice, &EvalOptions::default(), &imports)?;
    assert_eq!(render(&repeated).len(), 2);
    Ok(())
}

/// Missing optional imports are skipped; missing required ones fail.
///
/// # Errors
/// Returns an error if building or evaluating the tree fails.
#[test]
fn missing_imports() -> Result<(), Box<dyn Error>> {
    let imports = StaticImports::new();
    let optional = ImportOptions {
        optional: true,
        ..ImportOptions::default()
    };
    let mut tree = Tree::new("main.less");
    let root = tree.root();
    append_import(&mut tree, root, "nope.less", optional);
    let rule = append_rule(&mut tree, root, ".x")?;
    append_declarations(&mut tree, rule, "color: red")?;
    let out = eval_with(tree, &EvalOptions::default(), &imports)?;
    assert_eq!(render(&out), vec![".x { color: red; }".to_owned()]);

    let mut required = Tree::new("main.less");
    let required_root = required.root();
    append_import(&mut required, required_root, "nope.less", ImportOptions::default());
    let error = error_in(required, &EvalOptions::default(), &imports);
    assert!(matches!(
        error.map(|failure| failure.kind),
        Some(ErrorKind::ImportResolutionFailure { path, .. }) if path == "nope.less"
    ));
    Ok(())
}

/// An import inside a mixin body provides its definitions on every call.
///
/// # Errors
/// Returns an error if building or evaluating the tree fails.
#[test]
fn imports_in_mixin_bodies() -> Result<(), Box<dyn Error>> {
    let mut defs = Tree::new("defs.less");
    let defs_root = defs.root();
    let inner = append_mixin(&mut defs, defs_root, ".inner()")?;
    append_declarations(&mut defs, inner, "color: red")?;
    let mut imports = StaticImports::new();
    imports.insert("defs.less", defs);

    let mut tree = Tree::new("main.less");
    let root = tree.root();
    let mixin = append_mixin(&mut tree, root, ".m()")?;
    append_import(&mut tree, mixin, "defs.less", ImportOptions::default());
    append_call(&mut tree, mixin, ".inner();")?;
    let first = append_rule(&mut tree, root, ".a")?;
    append_call(&mut tree, first, ".m();")?;
    let second = append_rule(&mut tree, root, ".b")?;
    append_call(&mut tree, second, ".m();")?;

    let out = eval_with(tree, &EvalOptions::default(), &imports)?;
    assert_eq!(
        render(&out),
        vec![".a { color: red; }".to_owned(), ".b { color: red; }".to_owned()]
    );
    Ok(())
}

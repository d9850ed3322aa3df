#![allow(dead_code)]

use std::path::Path;

use sable::expand::CfgSet;
use sable::parse::{self, ParseError, ParseSess};
use sable::{ast, hir, lower, MemorySourceLoader, Name, Sources};

/// Parse a crate whose root is `lib.rs`, with any extra files served from
/// memory.
pub fn parse_files(files: &[(&str, &str)]) -> Result<ast::Crate, ParseError> {
    parse_files_with_cfg(files, CfgSet::new())
}

pub fn parse_files_with_cfg(
    files: &[(&str, &str)],
    cfg: CfgSet,
) -> Result<ast::Crate, ParseError> {
    let mut sources = Sources::new();
    let mut loader = MemorySourceLoader::new();
    for (path, text) in files {
        loader.insert(*path, *text);
    }

    let mut sess = ParseSess {
        sources: &mut sources,
        loader: &mut loader,
        cfg: &cfg,
    };

    parse::parse_crate(&mut sess, Path::new("lib.rs"), Name::new("testcrate"))
}

/// Parse a single-file crate.
pub fn parse_one(text: &str) -> Result<ast::Crate, ParseError> {
    parse_files(&[("lib.rs", text)])
}

/// Parse, expand, and lower a single-file crate.
pub fn lower_one(text: &str) -> hir::Crate {
    let mut sources = Sources::new();
    let mut loader = MemorySourceLoader::new();
    loader.insert("lib.rs", text);
    let cfg = CfgSet::new();

    let mut sess = ParseSess {
        sources: &mut sources,
        loader: &mut loader,
        cfg: &cfg,
    };

    let mut krate = parse::parse_crate(&mut sess, Path::new("lib.rs"), Name::new("testcrate"))
        .expect("parse");
    sable::expand::expand_crate(&mut sess, &mut krate).expect("expand");

    lower::lower_crate(&krate, Default::default()).expect("lower")
}

/// Find an item in a crate's AST root by name.
pub fn root_item<'a>(krate: &'a ast::Crate, name: &str) -> &'a ast::Named<ast::Item> {
    krate
        .root
        .items
        .iter()
        .find(|i| i.name.map(|n| n.name) == Some(Name::new(name)))
        .unwrap_or_else(|| panic!("no item named `{}`", name))
}

/// Look up a type item in a lowered crate's root module.
pub fn root_type_item<'a>(krate: &'a hir::Crate, name: &str) -> &'a hir::TypeItem {
    &krate
        .root_module
        .type_items
        .get(&Name::new(name))
        .unwrap_or_else(|| panic!("no type item named `{}`", name))
        .ent
}

/// Look up a value item in a lowered crate's root module.
pub fn root_value_item<'a>(krate: &'a hir::Crate, name: &str) -> &'a hir::ValueItem {
    &krate
        .root_module
        .value_items
        .get(&Name::new(name))
        .unwrap_or_else(|| panic!("no value item named `{}`", name))
        .ent
}

mod common;

use std::path::PathBuf;

use common::{parse_files, root_item};
use sable::ast::{FileInfo, Item, Module};
use sable::expand::CfgSet;
use sable::parse::{self, ParseErrorKind, ParseSess};
use sable::{MemorySourceLoader, Name, Source, Sources};

fn module<'a>(krate: &'a sable::ast::Crate, name: &str) -> &'a Module {
    match &root_item(krate, name).data {
        Item::Module(m) => m,
        other => panic!("expected module `{}`, got {}", name, other.tag()),
    }
}

#[test]
fn file_module_does_not_control_its_directory() {
    let krate = parse_files(&[
        ("lib.rs", "mod a;"),
        ("a.rs", "pub fn in_a() {}"),
    ])
    .unwrap();

    let a = module(&krate, "a");
    assert_eq!(a.file.path, PathBuf::from("a.rs"));
    assert!(!a.file.controls_dir);
}

#[test]
fn mod_rs_controls_its_directory() {
    let krate = parse_files(&[
        ("lib.rs", "mod a;"),
        ("a/mod.rs", "mod b;"),
        ("a/b.rs", "pub fn in_b() {}"),
    ])
    .unwrap();

    let a = module(&krate, "a");
    assert_eq!(a.file.path, PathBuf::from("a/mod.rs"));
    assert!(a.file.controls_dir);

    let b = match &a.items[0].data {
        Item::Module(m) => m,
        other => panic!("expected module, got {}", other.tag()),
    };
    assert_eq!(b.file.path, PathBuf::from("a/b.rs"));
    assert!(!b.file.controls_dir);
}

#[test]
fn non_controlling_file_loads_from_sibling_directory() {
    // `a.rs` does not control its directory, so `mod c;` inside it probes
    // `a/c.rs`.
    let krate = parse_files(&[
        ("lib.rs", "mod a;"),
        ("a.rs", "mod c;"),
        ("a/c.rs", "pub fn in_c() {}"),
    ])
    .unwrap();

    let a = module(&krate, "a");
    let c = match &a.items[0].data {
        Item::Module(m) => m,
        other => panic!("expected module, got {}", other.tag()),
    };
    assert_eq!(c.file.path, PathBuf::from("a/c.rs"));
    assert!(!c.file.controls_dir);
}

#[test]
fn missing_submodule_from_non_controlling_file() {
    let err = parse_files(&[("lib.rs", "mod a;"), ("a.rs", "mod missing;")]).unwrap_err();
    assert!(matches!(
        err.kind(),
        ParseErrorKind::ModOutsideController { .. }
    ));
}

#[test]
fn ambiguous_module_file_is_an_error() {
    let err = parse_files(&[
        ("lib.rs", "mod a;"),
        ("a.rs", ""),
        ("a/mod.rs", ""),
    ])
    .unwrap_err();

    assert!(matches!(err.kind(), ParseErrorKind::ModAmbiguous { .. }));
}

#[test]
fn missing_module_file_is_an_error() {
    let err = parse_files(&[("lib.rs", "mod nope;")]).unwrap_err();
    assert!(matches!(err.kind(), ParseErrorKind::ModNotFound { .. }));
}

#[test]
fn path_attribute_overrides_resolution() {
    // `#[path = "other.rs"] mod m;` loads `other.rs` and the module
    // controls its directory.
    let krate = parse_files(&[
        ("lib.rs", "#[path = \"other.rs\"] mod m;"),
        ("other.rs", "pub fn in_m() {}"),
    ])
    .unwrap();

    let m = module(&krate, "m");
    assert_eq!(m.file.path, PathBuf::from("other.rs"));
    assert!(m.file.controls_dir);
}

#[test]
fn inline_modules_anchor_their_children() {
    let krate = parse_files(&[
        ("lib.rs", "mod a { mod b; }"),
        ("a/b.rs", "pub fn in_b() {}"),
    ])
    .unwrap();

    let a = module(&krate, "a");
    assert!(a.file.controls_dir);

    let b = match &a.items[0].data {
        Item::Module(m) => m,
        other => panic!("expected module, got {}", other.tag()),
    };
    assert_eq!(b.file.path, PathBuf::from("a/b.rs"));
}

#[test]
fn cfg_disabled_module_is_not_loaded() {
    // The file does not exist; the failing cfg must prevent the probe.
    let krate = parse_files(&[(
        "lib.rs",
        "#[cfg(nonexistent)] mod missing;",
    )])
    .unwrap();

    assert!(matches!(root_item(&krate, "missing").data, Item::None));
}

#[test]
fn stdin_disables_module_loading() {
    let mut sources = Sources::new();
    let mut loader = MemorySourceLoader::new();
    let cfg = CfgSet::new();

    let id = sources.insert(Source::new("-", "mod a;"));

    let mut sess = ParseSess {
        sources: &mut sources,
        loader: &mut loader,
        cfg: &cfg,
    };

    let err = parse::parse_crate_source(
        &mut sess,
        id,
        FileInfo {
            path: PathBuf::from("-"),
            controls_dir: true,
        },
        Name::new("testcrate"),
    )
    .unwrap_err();

    assert!(matches!(err.kind(), ParseErrorKind::ModFromStdin));
}

#[test]
fn resolution_is_deterministic() {
    let files: &[(&str, &str)] = &[
        ("lib.rs", "mod a; mod d;"),
        ("a/mod.rs", "mod b; #[path = \"c_file.rs\"] mod c;"),
        ("a/b.rs", ""),
        ("a/c_file.rs", ""),
        ("d.rs", ""),
    ];

    fn collect(module: &Module, out: &mut Vec<(PathBuf, bool)>) {
        out.push((module.file.path.clone(), module.file.controls_dir));
        for item in &module.items {
            if let Item::Module(sub) = &item.data {
                collect(sub, out);
            }
        }
    }

    let mut first = Vec::new();
    collect(&parse_files(files).unwrap().root, &mut first);

    let mut second = Vec::new();
    collect(&parse_files(files).unwrap().root, &mut second);

    assert_eq!(first, second);
    assert_eq!(first.len(), 5, "root, a, b, c, d");
}

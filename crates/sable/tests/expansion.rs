use std::path::Path;

use sable::ast::{Expr, ExprKind, Item, Literal, PathClass};
use sable::expand::{self, CfgSet};
use sable::parse::{self, ParseSess};
use sable::{ast, MemorySourceLoader, Name, Sources};

fn parse_and_expand(text: &str) -> ast::Crate {
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
    expand::expand_crate(&mut sess, &mut krate).expect("expand");
    krate
}

/// The body tail of the named root function.
fn body_tail<'a>(krate: &'a ast::Crate, name: &str) -> &'a Expr {
    let item = krate
        .root
        .items
        .iter()
        .find(|i| i.name.map(|n| n.name) == Some(Name::new(name)))
        .unwrap_or_else(|| panic!("no item named `{}`", name));

    let f = match &item.data {
        Item::Function(f) => f,
        other => panic!("expected function, got {}", other.tag()),
    };

    let block = match &f.code.as_ref().expect("body").kind {
        ExprKind::Block(block) => block,
        other => panic!("expected block body, got {:?}", other),
    };

    block.tail.as_deref().expect("tail expression")
}

/// Decompose a formatter call into its constructor name and arguments.
fn formatter_call<'a>(expr: &'a Expr) -> (&'a str, &'a [Expr]) {
    match &expr.kind {
        ExprKind::Call { callee, args } => match &callee.kind {
            ExprKind::Path(path) => {
                let ctor = path
                    .nodes()
                    .last()
                    .expect("constructor path")
                    .name
                    .name
                    .as_str();
                (ctor, args)
            }
            other => panic!("expected path callee, got {:?}", other),
        },
        other => panic!("expected call, got {:?}", other),
    }
}

/// The elements of a `&[...]` argument.
fn array_items(expr: &Expr) -> &[Expr] {
    match &expr.kind {
        ExprKind::Borrow { expr, .. } => match &expr.kind {
            ExprKind::Array(items) => items,
            other => panic!("expected array, got {:?}", other),
        },
        other => panic!("expected borrow, got {:?}", other),
    }
}

#[test]
fn macro_rules_definitions_are_captured() {
    let krate = parse_and_expand(
        r#"
        #[macro_export]
        macro_rules! exported { () => {} }

        macro_rules! private { () => {} }
        "#,
    );

    let defs: Vec<_> = krate
        .root
        .items
        .iter()
        .filter_map(|i| match &i.data {
            Item::MacroRules(def) => Some((i.name.unwrap().name, def.exported)),
            _ => None,
        })
        .collect();

    assert_eq!(
        defs,
        vec![(Name::new("exported"), true), (Name::new("private"), false)]
    );

    // Exported definitions surface on the lowered crate.
    let lowered = sable::lower::lower_crate(&krate, Default::default()).unwrap();
    assert!(lowered.exported_macros.contains_key(&Name::new("exported")));
    assert!(!lowered.exported_macros.contains_key(&Name::new("private")));
}

#[test]
fn simple_format_args_uses_new_v1() {
    let krate = parse_and_expand(
        r#"
        fn f(x: u32, y: u32) -> u32 {
            format_args!("a {} b {}", x, y)
        }
        "#,
    );

    let (ctor, args) = formatter_call(body_tail(&krate, "f"));
    assert_eq!(ctor, "new_v1");
    assert_eq!(args.len(), 2);

    // N+1 literal pieces for N fragments.
    let pieces = array_items(&args[0]);
    assert_eq!(pieces.len(), 3);
    assert!(matches!(&pieces[0].kind, ExprKind::Lit(Literal::Str(s)) if &**s == "a "));
    assert!(matches!(&pieces[1].kind, ExprKind::Lit(Literal::Str(s)) if &**s == " b "));
    assert!(matches!(&pieces[2].kind, ExprKind::Lit(Literal::Str(s)) if &**s == ""));

    // Each consumed argument is referenced exactly once.
    let formatters = array_items(&args[1]);
    assert_eq!(formatters.len(), 2);

    let referenced: Vec<_> = formatters
        .iter()
        .map(|f| {
            let (ctor, args) = formatter_call(f);
            assert_eq!(ctor, "new");
            match &args[0].kind {
                ExprKind::Borrow { expr, .. } => match &expr.kind {
                    ExprKind::Path(p) => match &p.class {
                        PathClass::Local(id) => id.name,
                        other => panic!("expected local path, got {:?}", other),
                    },
                    other => panic!("expected path argument, got {:?}", other),
                },
                other => panic!("expected borrowed argument, got {:?}", other),
            }
        })
        .collect();

    assert_eq!(referenced, vec![Name::new("x"), Name::new("y")]);
}

#[test]
fn formatted_arguments_with_named_and_star_precision() {
    // `format_args!("{x:>5.*}", 3, x=value)`: one fragment, width 5,
    // precision from the free argument, Display, referencing `value`.
    let krate = parse_and_expand(
        r#"
        fn f(value: u32) -> u32 {
            format_args!("{x:>5.*}", 3, x = value)
        }
        "#,
    );

    let (ctor, args) = formatter_call(body_tail(&krate, "f"));
    assert_eq!(ctor, "new_v1_formatted");
    assert_eq!(args.len(), 3);

    let pieces = array_items(&args[0]);
    assert_eq!(pieces.len(), 2, "one fragment, two pieces");

    // Exactly one formatter entry, referencing `value`.
    let formatters = array_items(&args[1]);
    assert_eq!(formatters.len(), 1);
    let (_, fmt_args) = formatter_call(&formatters[0]);
    assert!(matches!(
        &fmt_args[0].kind,
        ExprKind::Borrow { expr, .. }
            if matches!(&expr.kind, ExprKind::Path(p)
                if matches!(&p.class, PathClass::Local(id) if id.name == "value"))
    ));

    // The trait selector is Display.
    match &fmt_args[1].kind {
        ExprKind::Path(p) => {
            let segments: Vec<_> =
                p.nodes().iter().map(|n| n.name.name.as_str()).collect();
            assert!(segments.ends_with(&["fmt", "Display", "fmt"]));
        }
        other => panic!("expected trait path, got {:?}", other),
    }

    // The spec entry: position 0, right-aligned, width 5, precision from
    // the argument at concatenated index 1 (the free argument).
    let specs = array_items(&args[2]);
    assert_eq!(specs.len(), 1);
    let (spec_ctor, spec_args) = formatter_call(&specs[0]);
    assert_eq!(spec_ctor, "new");

    assert!(matches!(
        spec_args[0].kind,
        ExprKind::Lit(Literal::Int { value: 0, .. })
    ));

    match &spec_args[2].kind {
        ExprKind::Path(p) => {
            let segments: Vec<_> =
                p.nodes().iter().map(|n| n.name.name.as_str()).collect();
            assert!(segments.ends_with(&["Alignment", "Right"]));
        }
        other => panic!("expected alignment path, got {:?}", other),
    }

    let (prec_ctor, prec_args) = formatter_call(&spec_args[4]);
    assert_eq!(prec_ctor, "Param");
    assert!(matches!(
        prec_args[0].kind,
        ExprKind::Lit(Literal::Int { value: 1, .. })
    ));

    let (width_ctor, width_args) = formatter_call(&spec_args[5]);
    assert_eq!(width_ctor, "Is");
    assert!(matches!(
        width_args[0].kind,
        ExprKind::Lit(Literal::Int { value: 5, .. })
    ));
}

#[test]
fn duplicate_named_argument_is_rejected() {
    let mut sources = Sources::new();
    let mut loader = MemorySourceLoader::new();
    loader.insert(
        "lib.rs",
        r#"
        fn f(a: u32) -> u32 {
            format_args!("{x}", x = a, x = a)
        }
        "#,
    );
    let cfg = CfgSet::new();

    let mut sess = ParseSess {
        sources: &mut sources,
        loader: &mut loader,
        cfg: &cfg,
    };

    let mut krate = parse::parse_crate(&mut sess, Path::new("lib.rs"), Name::new("testcrate"))
        .expect("parse");
    let err = expand::expand_crate(&mut sess, &mut krate).unwrap_err();

    assert!(matches!(
        err.kind(),
        parse::ParseErrorKind::FormatDuplicateNamed { .. }
    ));
}

#[test]
fn unknown_macros_are_left_alone() {
    let krate = parse_and_expand(
        r#"
        fn f() -> u32 {
            other_macro!(1, 2)
        }
        "#,
    );

    assert!(matches!(
        body_tail(&krate, "f").kind,
        ExprKind::MacroCall(..)
    ));
}

#[test]
fn no_std_prefix_changes_paths() {
    let krate = parse_and_expand(
        r#"
        #![no_std]

        fn f(x: u32) -> u32 {
            format_args!("{}", x)
        }
        "#,
    );

    let (_, args) = formatter_call(body_tail(&krate, "f"));
    let _ = args;

    let callee_path = match &body_tail(&krate, "f").kind {
        ExprKind::Call { callee, .. } => match &callee.kind {
            ExprKind::Path(p) => p.clone(),
            other => panic!("expected path, got {:?}", other),
        },
        other => panic!("expected call, got {:?}", other),
    };

    match &callee_path.class {
        PathClass::Absolute { crate_name, .. } => {
            assert_eq!(*crate_name, Name::new("core"));
        }
        other => panic!("expected absolute path, got {:?}", other),
    }
}

mod common;

use common::{parse_one, root_item};
use sable::ast::{
    EnumVariantData, GenericBoundKind, Item, PathClass, PatternData, StaticClass,
    StructData, TypeData, Visibility,
};
use sable::parse::ParseErrorKind;
use sable::Name;

#[test]
fn unit_tuple_and_named_structs() {
    let krate = parse_one(
        r#"
        struct Unit;
        struct Pair(u32, u64);
        struct Named { a: u32, b: Pair }
        "#,
    )
    .unwrap();

    assert!(matches!(
        root_item(&krate, "Unit").data,
        Item::Struct(ref s) if matches!(s.data, StructData::Unit)
    ));
    assert!(matches!(
        root_item(&krate, "Pair").data,
        Item::Struct(ref s) if matches!(s.data, StructData::Tuple(ref f) if f.len() == 2)
    ));
    assert!(matches!(
        root_item(&krate, "Named").data,
        Item::Struct(ref s) if matches!(s.data, StructData::Named(ref f) if f.len() == 2)
    ));
}

#[test]
fn restricted_visibility_forms() {
    let krate = parse_one(
        r#"
        mod outer {
            mod inner {
                pub(crate) struct A;
                pub(self) struct B;
                pub(super) struct C;
                pub(in outer) struct D;
            }
        }
        "#,
    )
    .unwrap();

    let outer = match &root_item(&krate, "outer").data {
        Item::Module(m) => m,
        other => panic!("expected module, got {}", other.tag()),
    };
    let inner = match &outer.items[0].data {
        Item::Module(m) => m,
        other => panic!("expected module, got {}", other.tag()),
    };

    let path_of = |n: usize| match &inner.items[n].vis {
        Visibility::Restricted { path } => path
            .nodes()
            .iter()
            .map(|node| node.name.name.as_str())
            .collect::<Vec<_>>(),
        other => panic!("expected restricted visibility, got {:?}", other),
    };

    assert_eq!(path_of(0), Vec::<&str>::new());
    assert_eq!(path_of(1), vec!["outer", "inner"]);
    assert_eq!(path_of(2), vec!["outer"]);
    assert_eq!(path_of(3), vec!["outer"]);
}

#[test]
fn tuple_struct_visibility_disambiguation() {
    // `pub (Type,)` must parse the parenthesis as the field list, while
    // the exact restricted spellings still work in field position.
    let krate = parse_one(
        r#"
        pub struct S(pub(crate) u32, String);
        "#,
    )
    .unwrap();

    let s = match &root_item(&krate, "S").data {
        Item::Struct(s) => s,
        other => panic!("expected struct, got {}", other.tag()),
    };

    let fields = match &s.data {
        StructData::Tuple(fields) => fields,
        other => panic!("expected tuple struct, got {:?}", other),
    };

    assert_eq!(fields.len(), 2);
    assert!(matches!(fields[0].vis, Visibility::Restricted { .. }));
    assert!(matches!(fields[1].vis, Visibility::Inherited));
}

#[test]
fn enum_variant_shapes() {
    let krate = parse_one(
        r#"
        enum E<T> {
            A,
            B(T),
            C { x: u32 },
            D = 3,
        }
        "#,
    )
    .unwrap();

    let e = match &root_item(&krate, "E").data {
        Item::Enum(e) => e,
        other => panic!("expected enum, got {}", other.tag()),
    };

    assert_eq!(e.variants.len(), 4);
    assert!(matches!(e.variants[0].data, EnumVariantData::Unit));
    assert!(matches!(e.variants[1].data, EnumVariantData::Tuple(ref t) if t.len() == 1));
    assert!(matches!(e.variants[2].data, EnumVariantData::Struct(ref f) if f.len() == 1));
    assert!(matches!(e.variants[3].data, EnumVariantData::Value(..)));
}

#[test]
fn generics_bounds_and_where_clauses() {
    let krate = parse_one(
        r#"
        fn f<'a, T: Clone + 'a, U>(x: &'a T) -> U
        where
            U: Default,
            for<'b> T: PartialEq<&'b T>,
            T: ?Sized,
        {
        }
        trait Clone {}
        trait Default {}
        trait PartialEq<R> {}
        trait Sized {}
        "#,
    )
    .unwrap();

    let f = match &root_item(&krate, "f").data {
        Item::Function(f) => f,
        other => panic!("expected function, got {}", other.tag()),
    };

    assert_eq!(f.params.lifetimes.len(), 1);
    assert_eq!(f.params.types.len(), 2);

    let mut is_trait = 0;
    let mut ty_lifetime = 0;
    let mut maybe_trait = 0;
    let mut with_outer_hrbs = 0;

    for bound in &f.params.bounds {
        match &bound.kind {
            GenericBoundKind::IsTrait { outer_hrbs, .. } => {
                is_trait += 1;
                if !outer_hrbs.is_empty() {
                    with_outer_hrbs += 1;
                }
            }
            GenericBoundKind::TypeLifetime { .. } => ty_lifetime += 1,
            GenericBoundKind::MaybeTrait { .. } => maybe_trait += 1,
            other => panic!("unexpected bound {:?}", other),
        }
    }

    assert_eq!(is_trait, 3, "Clone, Default, PartialEq");
    assert_eq!(ty_lifetime, 1, "T: 'a");
    assert_eq!(maybe_trait, 1, "T: ?Sized");
    assert_eq!(with_outer_hrbs, 1, "the where-clause binder");
}

#[test]
fn self_argument_shapes() {
    let krate = parse_one(
        r#"
        trait T {
            fn a(self);
            fn b(&self);
            fn c(&mut self);
            fn d(&'a self);
            fn e(self: Box<Self>);
        }
        "#,
    )
    .unwrap();

    let t = match &root_item(&krate, "T").data {
        Item::Trait(t) => t,
        other => panic!("expected trait, got {}", other.tag()),
    };

    for item in &t.items {
        let f = match &item.data {
            Item::Function(f) => f,
            other => panic!("expected method, got {}", other.tag()),
        };
        let (pat, ty) = &f.args[0];
        let binding = pat.binding.as_ref().expect("self binding");
        assert_eq!(binding.name.name, "self");

        match item.name.unwrap().name.as_str() {
            "a" => assert!(matches!(ty.data, TypeData::Generic { .. })),
            "b" => {
                assert!(matches!(ty.data, TypeData::Borrow { is_mut: false, .. }))
            }
            "c" => assert!(matches!(ty.data, TypeData::Borrow { is_mut: true, .. })),
            "d" => assert!(matches!(
                ty.data,
                TypeData::Borrow {
                    lifetime: Some(..),
                    ..
                }
            )),
            "e" => assert!(matches!(ty.data, TypeData::Path(..))),
            other => panic!("unexpected method {}", other),
        }
    }
}

#[test]
fn impl_blocks() {
    let krate = parse_one(
        r#"
        struct S;
        trait Marker {}

        impl S {
            fn inherent(&self) {}
            const K: u32 = 1;
        }

        impl Marker for S {}
        impl !Marker for u32 {}
        "#,
    )
    .unwrap();

    let impls: Vec<_> = krate
        .root
        .items
        .iter()
        .filter(|i| matches!(i.data, Item::Impl(..) | Item::NegImpl(..)))
        .collect();
    assert_eq!(impls.len(), 3);

    match &impls[0].data {
        Item::Impl(impl_) => {
            assert!(impl_.def.trait_.is_none());
            assert_eq!(impl_.items.len(), 2);
        }
        other => panic!("expected impl, got {}", other.tag()),
    }

    match &impls[1].data {
        Item::Impl(impl_) => assert!(impl_.def.trait_.is_some()),
        other => panic!("expected impl, got {}", other.tag()),
    }

    assert!(matches!(impls[2].data, Item::NegImpl(..)));
}

#[test]
fn use_trees_flatten() {
    let krate = parse_one(
        r#"
        use a::b;
        use a::b as c;
        use a::{d, e::f, self};
        use a::*;
        use super::g;
        use ::h::i;
        "#,
    )
    .unwrap();

    let mut entries = Vec::new();
    for item in &krate.root.items {
        if let Item::Use(u) = &item.data {
            for entry in &u.entries {
                entries.push((entry.name.map(|n| n.as_str()), entry.path.clone()));
            }
        }
    }

    let names: Vec<_> = entries.iter().map(|(n, _)| *n).collect();
    assert_eq!(
        names,
        vec![
            Some("b"),
            Some("c"),
            Some("d"),
            Some("f"),
            Some("a"),
            None,
            Some("g"),
            Some("i"),
        ]
    );

    assert!(matches!(
        entries[6].1.class,
        PathClass::Super { count: 1, .. }
    ));
}

#[test]
fn extern_items() {
    let krate = parse_one(
        r#"
        extern crate other;
        extern crate other as renamed;

        extern "C" {
            fn strlen(s: *const u8) -> usize;
            static ERRNO: i32;
            type Opaque;
        }

        extern "C" fn callback(x: i32) {}
        "#,
    )
    .unwrap();

    assert!(matches!(
        root_item(&krate, "other").data,
        Item::Crate { name } if name == Name::new("other")
    ));
    assert!(matches!(
        root_item(&krate, "renamed").data,
        Item::Crate { name } if name == Name::new("other")
    ));

    let block = krate
        .root
        .items
        .iter()
        .find_map(|i| match &i.data {
            Item::ExternBlock(b) => Some(b),
            _ => None,
        })
        .expect("extern block");

    assert_eq!(block.abi, Name::new("C"));
    assert_eq!(block.items.len(), 3);

    let f = match &block.items[0].data {
        Item::Function(f) => f,
        other => panic!("expected prototype, got {}", other.tag()),
    };
    assert!(f.code.is_none());
    assert!(f.is_unsafe);
}

#[test]
fn variadic_prototype() {
    let krate = parse_one(
        r#"
        extern "C" {
            fn printf(fmt: *const u8, ...) -> i32;
        }
        "#,
    )
    .unwrap();

    let block = krate
        .root
        .items
        .iter()
        .find_map(|i| match &i.data {
            Item::ExternBlock(b) => Some(b),
            _ => None,
        })
        .expect("extern block");

    match &block.items[0].data {
        Item::Function(f) => {
            assert!(f.is_variadic);
            assert_eq!(f.args.len(), 1);
        }
        other => panic!("expected prototype, got {}", other.tag()),
    }
}

#[test]
fn macro_invocations_capture_token_trees() {
    let krate = parse_one(
        r#"
        macro_rules! my_macro { () => {} }

        make_things!(a, b, c);
        "#,
    )
    .unwrap();

    // Before expansion, `macro_rules!` is itself just an invocation.
    let mut invocations = 0;
    for item in &krate.root.items {
        if let Item::MacroInvocation(inv) = &item.data {
            invocations += 1;
            if inv.name == Name::new("make_things") {
                assert_eq!(inv.input.len(), 5, "a , b , c");
            }
        }
    }
    assert_eq!(invocations, 2);
}

#[test]
fn patterns_in_function_arguments() {
    let krate = parse_one(
        r#"
        struct Point { x: u32, y: u32 }
        fn f((a, b): (u32, u32), Point { x, .. }: Point, _: u32, mut c: u32) {}
        "#,
    )
    .unwrap();

    let f = match &root_item(&krate, "f").data {
        Item::Function(f) => f,
        other => panic!("expected function, got {}", other.tag()),
    };

    assert!(matches!(f.args[0].0.data, PatternData::Tuple(..)));
    assert!(matches!(
        f.args[1].0.data,
        PatternData::Struct {
            is_exhaustive: false,
            ..
        }
    ));
    assert!(matches!(f.args[2].0.data, PatternData::Any));
    assert!(f.args[3].0.binding.as_ref().unwrap().is_mut);
}

#[test]
fn statics_and_consts() {
    let krate = parse_one(
        r#"
        static A: u32 = 1;
        static mut B: u32 = 2;
        const C: u32 = 3;
        "#,
    )
    .unwrap();

    let class_of = |name: &str| match &root_item(&krate, name).data {
        Item::Static(s) => s.class,
        other => panic!("expected static, got {}", other.tag()),
    };

    assert_eq!(class_of("A"), StaticClass::Static);
    assert_eq!(class_of("B"), StaticClass::Mut);
    assert_eq!(class_of("C"), StaticClass::Const);
}

#[test]
fn nested_generics_close_with_shift() {
    let krate = parse_one(
        r#"
        struct Vec<T>(T);
        struct Wrap<T>(Vec<Vec<T>>);
        "#,
    )
    .unwrap();

    assert!(matches!(root_item(&krate, "Wrap").data, Item::Struct(..)));
}

#[test]
fn unexpected_token_is_reported() {
    let err = parse_one("struct S(,);").unwrap_err();
    assert!(matches!(err.kind(), ParseErrorKind::Unexpected { .. }));
}

#[test]
fn cfg_filtering_drops_items() {
    let krate = parse_one(
        r#"
        #[cfg(nonexistent)]
        fn gone() {}

        fn kept() {}
        "#,
    )
    .unwrap();

    assert!(matches!(root_item(&krate, "gone").data, Item::None));
    assert!(matches!(root_item(&krate, "kept").data, Item::Function(..)));
}

#[test]
fn attribute_lists_merge_idempotently() {
    use sable::expand::{CfgOracle, CfgSet};
    use sable::Span;

    let krate = parse_one(
        r#"
        #[cfg(enabled)]
        #[inline]
        fn f() {}
        "#,
    )
    .unwrap();

    let attrs = &root_item(&krate, "f").attrs;
    let mut doubled = attrs.clone();
    doubled.append(attrs.clone());

    let mut cfg = CfgSet::new();
    cfg.set_flag("enabled");

    let eval = |attrs: &sable::ast::AttributeList| {
        attrs
            .iter()
            .filter(|a| a.name == "cfg")
            .flat_map(|a| a.items().unwrap_or(&[]))
            .all(|cond| cfg.check_cfg(Span::empty(), cond).unwrap())
    };

    // Merging a list with itself changes neither cfg evaluation nor
    // first-match lookup.
    assert_eq!(eval(attrs), eval(&doubled));
    assert_eq!(
        attrs.get("inline").is_some(),
        doubled.get("inline").is_some()
    );
}

#[test]
fn cfg_attr_attaches_conditionally() {
    let mut cfg = sable::expand::CfgSet::new();
    cfg.set_flag("enabled");

    let krate = common::parse_files_with_cfg(
        &[(
            "lib.rs",
            r#"
            #[cfg_attr(enabled, no_mangle)]
            #[cfg_attr(disabled, link_name = "x")]
            fn f() {}
            "#,
        )],
        cfg,
    )
    .unwrap();

    let item = root_item(&krate, "f");
    assert!(item.attrs.has("no_mangle"));
    assert!(!item.attrs.has("link_name"));
}

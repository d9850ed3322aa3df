mod common;

use common::{lower_one, parse_one, root_type_item, root_value_item};
use sable::hir::{
    EnumClass, EnumRepr, GenericBound, Publicity, Receiver, Repr, SimplePath, TypeItem,
    TypeRef, ValueItem,
};
use sable::lower::{lower_crate, LowerErrorKind};
use sable::{hir, Name};

fn simple(components: &[&str]) -> SimplePath {
    SimplePath::new(Name::empty(), components.iter().map(|c| Name::new(c)).collect())
}

#[test]
fn tuple_struct_with_restricted_visibility() {
    // `pub struct S(pub(crate) u32, String);` has two tuple fields:
    // the first visible crate-wide, the second private to the
    // declaring module.
    let krate = lower_one(
        r#"
        pub struct String;
        mod m {
            pub struct S(pub(crate) u32, super::String);
        }
        "#,
    );

    let m = match root_type_item(&krate, "m") {
        TypeItem::Module(m) => m,
        other => panic!("expected module, got {:?}", other),
    };
    let s = match &m.type_items[&Name::new("S")].ent {
        TypeItem::Struct(s) => s,
        other => panic!("expected struct, got {:?}", other),
    };

    let fields = match &s.data {
        hir::StructData::Tuple(fields) => fields,
        other => panic!("expected tuple struct, got {:?}", other),
    };

    assert_eq!(fields.len(), 2);

    // `pub(crate)` restricts to the crate root, which contains every
    // module of the crate.
    let elsewhere = simple(&["deep", "inner"]);
    assert!(fields[0].publicity.is_visible(&elsewhere));
    assert!(fields[0].publicity.is_visible(&SimplePath::crate_root()));

    // The unannotated field is private to `m`.
    assert!(fields[1].publicity.is_visible(&simple(&["m"])));
    assert!(!fields[1].publicity.is_visible(&elsewhere));
    assert!(!fields[1].publicity.is_visible(&SimplePath::crate_root()));

    // The tuple struct also provides a constructor in the value namespace.
    assert!(matches!(
        &m.value_items[&Name::new("S")].ent,
        ValueItem::StructConstructor { ty } if *ty == simple(&["m", "S"])
    ));
}

#[test]
fn data_enum_synthesizes_sibling_structs() {
    // `enum E<T> { A, B(T), C { x: u32 } }` lowers to the Data class
    // and adds `E#B<T>` and `E#C<T>` to the module.
    let krate = lower_one(
        r#"
        enum E<T> {
            A,
            B(T),
            C { x: u32 },
        }
        "#,
    );

    let e = match root_type_item(&krate, "E") {
        TypeItem::Enum(e) => e,
        other => panic!("expected enum, got {:?}", other),
    };

    let variants = match &e.class {
        EnumClass::Data(variants) => variants,
        other => panic!("expected data enum, got {:?}", other),
    };

    assert_eq!(variants.len(), 3);
    assert_eq!(variants[0].ty, TypeRef::unit());
    assert!(!variants[0].is_struct);
    assert!(!variants[1].is_struct);
    assert!(variants[2].is_struct);

    // One synthesized struct per payload variant, reachable by path.
    let b = match root_type_item(&krate, "E#B") {
        TypeItem::Struct(s) => s,
        other => panic!("expected sibling struct, got {:?}", other),
    };
    assert_eq!(b.params.types.len(), 1);
    assert!(matches!(&b.data, hir::StructData::Tuple(f) if f.len() == 1));

    let c = match root_type_item(&krate, "E#C") {
        TypeItem::Struct(s) => s,
        other => panic!("expected sibling struct, got {:?}", other),
    };
    assert!(matches!(&c.data, hir::StructData::Named(f) if f.len() == 1));

    // The variant types point at the siblings, parameterized by the
    // enum's own parameter.
    match &variants[1].ty {
        TypeRef::Path(hir::Path::Generic(gp)) => {
            assert_eq!(gp.path, simple(&["E#B"]));
            assert_eq!(gp.params.types.len(), 1);
            assert!(matches!(
                gp.params.types[0],
                TypeRef::Generic { index: 0, .. }
            ));
        }
        other => panic!("expected path to sibling, got {:?}", other),
    }
}

#[test]
fn value_enum_with_repr() {
    let krate = lower_one(
        r#"
        #[repr(u8)]
        enum E {
            A,
            B = 5,
        }
        "#,
    );

    let e = match root_type_item(&krate, "E") {
        TypeItem::Enum(e) => e,
        other => panic!("expected enum, got {:?}", other),
    };

    match &e.class {
        EnumClass::Value { repr, variants } => {
            assert_eq!(*repr, EnumRepr::U8);
            assert_eq!(variants.len(), 2);
            assert!(!variants[0].expr.is_valid());
            assert!(variants[1].expr.is_valid());
        }
        other => panic!("expected value enum, got {:?}", other),
    }
}

#[test]
fn empty_enum_is_a_value_enum() {
    let krate = lower_one("enum Never {}");

    let e = match root_type_item(&krate, "Never") {
        TypeItem::Enum(e) => e,
        other => panic!("expected enum, got {:?}", other),
    };

    assert!(e.is_value());
    assert_eq!(e.num_variants(), 0);
}

#[test]
fn mixed_enum_is_rejected() {
    let krate = parse_one("enum E { A = 1, B(u32) }").unwrap();
    let err = lower_crate(&krate, Default::default()).unwrap_err();
    assert!(matches!(
        err.kind(),
        LowerErrorKind::EnumMixedVariants { .. }
    ));
}

#[test]
fn receiver_classification() {
    // The five receiver shapes, in order: Value, BorrowShared,
    // BorrowUnique, Box, Custom.
    let krate = lower_one(
        r#"
        #[lang = "owned_box"]
        pub struct Box<T>(T);
        pub struct Rc<T>(T);
        pub struct T;

        impl T {
            fn a(self) {}
            fn b(&self) {}
            fn c(&mut self) {}
            fn d(self: Box<Self>) {}
            fn e(self: Rc<Self>) {}
            fn free() {}
        }
        "#,
    );

    let head = TypeRef::new_path(hir::GenericPath::new(
        simple(&["T"]),
        Default::default(),
    ));

    let impl_ = krate
        .type_impls
        .for_type(&head)
        .next()
        .expect("inherent impl on T");

    let receiver = |name: &str| impl_.methods[&Name::new(name)].data.receiver;

    assert_eq!(receiver("a"), Receiver::Value);
    assert_eq!(receiver("b"), Receiver::BorrowShared);
    assert_eq!(receiver("c"), Receiver::BorrowUnique);
    assert_eq!(receiver("d"), Receiver::Box);
    assert_eq!(receiver("e"), Receiver::Custom);
    assert_eq!(receiver("free"), Receiver::Free);
}

#[test]
fn unsupported_receiver_is_rejected() {
    let krate = parse_one(
        r#"
        pub struct Pair<A, B>(A, B);
        pub struct T;
        impl T {
            fn f(self: Pair<Self, u32>) {}
        }
        "#,
    )
    .unwrap();

    let err = lower_crate(&krate, Default::default()).unwrap_err();
    assert!(matches!(
        err.kind(),
        LowerErrorKind::UnsupportedReceiver { .. }
    ));
}

#[test]
fn struct_repr_combinations() {
    let krate = lower_one(
        r#"
        #[repr(C)] struct A(u32);
        #[repr(packed)] struct B(u32);
        #[repr(C, packed)] struct C(u32);
        #[repr(simd)] struct D(u32);
        #[repr(transparent)] struct E(u32);
        #[repr(align(16))] struct F(u32);
        #[repr(C)] #[repr(packed)] struct G(u32);
        "#,
    );

    let repr_of = |name: &str| match root_type_item(&krate, name) {
        TypeItem::Struct(s) => (s.repr, s.forced_alignment),
        other => panic!("expected struct, got {:?}", other),
    };

    assert_eq!(repr_of("A"), (Repr::C, 0));
    assert_eq!(repr_of("B"), (Repr::Packed, 0));
    assert_eq!(repr_of("C"), (Repr::Packed, 0));
    assert_eq!(repr_of("D"), (Repr::Simd, 0));
    assert_eq!(repr_of("E"), (Repr::Transparent, 0));
    assert_eq!(repr_of("F"), (Repr::Aligned(16), 16));
    assert_eq!(repr_of("G"), (Repr::Packed, 0));
}

#[test]
fn packed_and_align_conflict() {
    let krate = parse_one("#[repr(packed, align(8))] struct S(u32);").unwrap();
    let err = lower_crate(&krate, Default::default()).unwrap_err();
    assert!(matches!(err.kind(), LowerErrorKind::ReprConflict { .. }));
}

#[test]
fn unknown_repr_is_rejected() {
    let krate = parse_one("#[repr(sideways)] struct S(u32);").unwrap();
    let err = lower_crate(&krate, Default::default()).unwrap_err();
    assert!(matches!(err.kind(), LowerErrorKind::UnknownRepr { .. }));
}

#[test]
fn linkage_rules() {
    let krate = lower_one(
        r#"
        extern "C" {
            #[link_name = "external_name"]
            fn a();

            fn c();
        }

        #[no_mangle]
        fn b() {}

        fn d() {}
        "#,
    );

    let linkage_of = |name: &str| match root_value_item(&krate, name) {
        ValueItem::Function(f) => f.linkage.name,
        other => panic!("expected function, got {:?}", other),
    };

    assert_eq!(linkage_of("a"), Some(Name::new("external_name")));
    assert_eq!(linkage_of("b"), Some(Name::new("b")));
    assert_eq!(linkage_of("c"), Some(Name::new("c")));
    assert_eq!(linkage_of("d"), None);
}

#[test]
fn conflicting_linkage_is_rejected() {
    let krate = parse_one(
        r#"
        #[link_name = "x"]
        #[no_mangle]
        fn f() {}
        "#,
    )
    .unwrap();

    let err = lower_crate(&krate, Default::default()).unwrap_err();
    assert!(matches!(err.kind(), LowerErrorKind::LinkageConflict));
}

#[test]
fn maybe_sized_flips_parameter_flag() {
    let krate = lower_one(
        r#"
        #[lang = "sized"]
        trait Sized {}

        struct Holder<T: ?Sized, U>(U);
        "#,
    );

    let s = match root_type_item(&krate, "Holder") {
        TypeItem::Struct(s) => s,
        other => panic!("expected struct, got {:?}", other),
    };

    assert!(!s.params.types[0].is_sized);
    assert!(s.params.types[1].is_sized);
}

#[test]
fn maybe_trait_on_non_sized_is_rejected() {
    let krate = parse_one(
        r#"
        #[lang = "sized"]
        trait Sized {}
        trait Other {}
        struct S<T: ?Other>(T);
        "#,
    )
    .unwrap();

    let err = lower_crate(&krate, Default::default()).unwrap_err();
    assert!(matches!(
        err.kind(),
        LowerErrorKind::MaybeTraitNotSized { .. }
    ));
}

#[test]
fn trait_lowering_synthesizes_self_bound() {
    let krate = lower_one(
        r#"
        trait Animal<Food> {
            type Output;
            const LEGS: u32 = 4;
            fn eat(&self, food: Food) -> Self::Output;
        }
        "#,
    );

    let t = match root_type_item(&krate, "Animal") {
        TypeItem::Trait(t) => t,
        other => panic!("expected trait, got {:?}", other),
    };

    // The synthesized `Self: Animal<Food>` bound.
    let self_bound = t
        .params
        .bounds
        .iter()
        .find_map(|b| match b {
            GenericBound::TraitBound { ty, trait_ } if ty.is_self() => Some(trait_),
            _ => None,
        })
        .expect("self bound present");

    assert_eq!(self_bound.path.path, simple(&["Animal"]));
    assert_eq!(self_bound.path.params.types.len(), 1);

    // The indexing post-pass bound the cache to the trait's own path.
    assert_eq!(self_bound.trait_ref.get(), Some(&simple(&["Animal"])));

    assert!(t.types.contains_key(&Name::new("Output")));
    assert!(t.values.contains_key(&Name::new("LEGS")));
    assert!(t.values.contains_key(&Name::new("eat")));

    // Downstream caches are left empty.
    assert!(t.value_indexes.is_empty());
    assert!(t.type_indexes.is_empty());
    assert!(t.all_parent_traits.is_empty());
    assert!(t.vtable_path.is_none());
}

#[test]
fn marker_traits_and_impl_classification() {
    let krate = lower_one(
        r#"
        auto trait Send {}
        trait Render {
            fn go(&self);
        }
        struct S;

        impl Render for S {
            fn go(&self) {}
        }
        impl Send for S {}
        impl !Send for u32 {}
        impl S {
            fn helper(&self) {}
        }
        "#,
    );

    let render = simple(&["Render"]);
    let send = simple(&["Send"]);

    let trait_group = krate.trait_impls.get(&render).expect("trait impls");
    assert_eq!(trait_group.iter().count(), 1);
    let ti = trait_group.iter().next().unwrap();
    assert!(ti.methods.contains_key(&Name::new("go")));

    let marker_group = krate.marker_impls.get(&send).expect("marker impls");
    let markers: Vec<_> = marker_group.iter().collect();
    assert_eq!(markers.len(), 2);
    assert_eq!(
        markers.iter().filter(|m| m.is_positive).count(),
        1,
        "one positive, one negative"
    );

    assert_eq!(krate.type_impls.iter().count(), 1);
}

#[test]
fn lang_item_conflict_across_crates() {
    // Two loaded crates define `panic_fmt` with different paths.
    let mut ext_a = hir::Crate {
        name: Name::new("a"),
        ..Default::default()
    };
    ext_a
        .lang_items
        .insert(Name::new("panic_fmt"), SimplePath::new(Name::new("a"), vec![Name::new("pa")]));

    let mut ext_b = hir::Crate {
        name: Name::new("b"),
        ..Default::default()
    };
    ext_b
        .lang_items
        .insert(Name::new("panic_fmt"), SimplePath::new(Name::new("b"), vec![Name::new("pb")]));

    let mut ext = std::collections::HashMap::new();
    ext.insert(Name::new("a"), hir::ExternCrate {
        hir: Box::new(ext_a),
        filename: "liba".into(),
    });
    ext.insert(Name::new("b"), hir::ExternCrate {
        hir: Box::new(ext_b),
        filename: "libb".into(),
    });

    let krate = parse_one("fn main() {}").unwrap();
    let err = lower_crate(&krate, ext).unwrap_err();
    assert!(matches!(
        err.kind(),
        LowerErrorKind::LangItemConflict { .. }
    ));
}

#[test]
fn equal_lang_items_merge_silently() {
    let path = SimplePath::new(Name::new("core"), vec![Name::new("p")]);

    let mut ext_a = hir::Crate {
        name: Name::new("a"),
        ..Default::default()
    };
    ext_a.lang_items.insert(Name::new("panic_fmt"), path.clone());

    let mut ext_b = hir::Crate {
        name: Name::new("b"),
        ..Default::default()
    };
    ext_b.lang_items.insert(Name::new("panic_fmt"), path.clone());

    let mut ext = std::collections::HashMap::new();
    ext.insert(Name::new("a"), hir::ExternCrate {
        hir: Box::new(ext_a),
        filename: "liba".into(),
    });
    ext.insert(Name::new("b"), hir::ExternCrate {
        hir: Box::new(ext_b),
        filename: "libb".into(),
    });

    let krate = parse_one("fn main() {}").unwrap();
    let lowered = lower_crate(&krate, ext).unwrap();
    assert_eq!(lowered.lang_items[&Name::new("panic_fmt")], path);
}

#[test]
fn use_entries_become_imports() {
    let krate = lower_one(
        r#"
        mod inner {
            pub struct S;
            pub enum E {
                A,
                B,
            }
            pub fn f() {}
        }

        use inner::S;
        use inner::E::B;
        use inner::f as g;
        "#,
    );

    assert!(matches!(
        root_type_item(&krate, "S"),
        TypeItem::Import { path, is_variant: false, .. } if *path == simple(&["inner", "S"])
    ));

    // A unit struct's constructor comes along in the value namespace.
    assert!(matches!(
        root_value_item(&krate, "S"),
        ValueItem::Import { .. }
    ));

    assert!(matches!(
        root_value_item(&krate, "B"),
        ValueItem::Import { path, is_variant: true, index: 1 }
            if *path == simple(&["inner", "E", "B"])
    ));

    assert!(matches!(
        root_value_item(&krate, "g"),
        ValueItem::Import { path, .. } if *path == simple(&["inner", "f"])
    ));
}

#[test]
fn paths_resolve_relative_to_their_module() {
    let krate = lower_one(
        r#"
        pub struct Top;

        mod inner {
            pub struct Local;

            pub fn uses_local(x: Local) {}
            pub fn uses_top(x: super::Top) {}
            pub fn uses_absolute(x: ::Top) {}
            pub fn uses_self(x: self::Local) {}
        }
        "#,
    );

    let inner = match root_type_item(&krate, "inner") {
        TypeItem::Module(m) => m,
        other => panic!("expected module, got {:?}", other),
    };

    let arg_path = |name: &str| {
        let f = match &inner.value_items[&Name::new(name)].ent {
            ValueItem::Function(f) => f,
            other => panic!("expected function, got {:?}", other),
        };
        match &f.args[0].1 {
            TypeRef::Path(hir::Path::Generic(gp)) => gp.path.clone(),
            other => panic!("expected path type, got {:?}", other),
        }
    };

    assert_eq!(arg_path("uses_local"), simple(&["inner", "Local"]));
    assert_eq!(arg_path("uses_top"), simple(&["Top"]));
    assert_eq!(arg_path("uses_absolute"), simple(&["Top"]));
    assert_eq!(arg_path("uses_self"), simple(&["inner", "Local"]));
}

#[test]
fn generic_parameters_lower_by_index() {
    let krate = lower_one(
        r#"
        struct Wrap<A, B>(A, B);
        "#,
    );

    let s = match root_type_item(&krate, "Wrap") {
        TypeItem::Struct(s) => s,
        other => panic!("expected struct, got {:?}", other),
    };

    let fields = match &s.data {
        hir::StructData::Tuple(fields) => fields,
        other => panic!("expected tuple struct, got {:?}", other),
    };

    assert!(matches!(fields[0].ent, TypeRef::Generic { index: 0, .. }));
    assert!(matches!(fields[1].ent, TypeRef::Generic { index: 1, .. }));
}

#[test]
fn trait_objects_split_markers_from_data_traits() {
    let krate = lower_one(
        r#"
        auto trait Send {}
        trait Draw {
            fn draw(&self);
        }

        fn takes(x: &(Draw + Send)) {}
        "#,
    );

    let f = match root_value_item(&krate, "takes") {
        ValueItem::Function(f) => f,
        other => panic!("expected function, got {:?}", other),
    };

    match &f.args[0].1 {
        TypeRef::Borrow { inner, .. } => match &**inner {
            TypeRef::TraitObject {
                trait_, markers, ..
            } => {
                assert_eq!(
                    trait_.as_ref().map(|t| t.path.path.clone()),
                    Some(simple(&["Draw"]))
                );
                assert_eq!(markers.len(), 1);
                assert_eq!(markers[0].path, simple(&["Send"]));
            }
            other => panic!("expected trait object, got {:?}", other),
        },
        other => panic!("expected borrow, got {:?}", other),
    }
}

#[test]
fn extern_block_members_join_the_module() {
    let krate = lower_one(
        r#"
        #[link(name = "m")]
        extern "C" {
            fn sqrt(x: f64) -> f64;
            static COUNTER: u32;
        }
        "#,
    );

    match root_value_item(&krate, "sqrt") {
        ValueItem::Function(f) => {
            assert!(f.is_unsafe);
            assert_eq!(f.abi, Name::new("C"));
            assert_eq!(f.linkage.name, Some(Name::new("sqrt")));
        }
        other => panic!("expected function, got {:?}", other),
    }

    match root_value_item(&krate, "COUNTER") {
        ValueItem::Static(s) => {
            assert_eq!(s.linkage.name, Some(Name::new("COUNTER")));
            assert!(!s.value.is_valid());
        }
        other => panic!("expected static, got {:?}", other),
    }

    assert_eq!(krate.ext_libs, vec![hir::ExternLibrary { name: "m".into() }]);
}

#[test]
fn array_sizes_constant_fold_when_trivial() {
    let krate = lower_one(
        r#"
        struct S {
            fixed: [u8; 16],
            dynamic: [u8; 8 + 8],
            slice_ref: &[u8],
        }
        "#,
    );

    let s = match root_type_item(&krate, "S") {
        TypeItem::Struct(s) => s,
        other => panic!("expected struct, got {:?}", other),
    };

    let fields = match &s.data {
        hir::StructData::Named(fields) => fields,
        other => panic!("expected named struct, got {:?}", other),
    };

    assert!(matches!(
        &fields[0].1.ent,
        TypeRef::Array { size: hir::ArraySize::Fixed(16), .. }
    ));
    assert!(matches!(
        &fields[1].1.ent,
        TypeRef::Array { size: hir::ArraySize::Expr(..), .. }
    ));
    assert!(matches!(
        &fields[2].1.ent,
        TypeRef::Borrow { inner, .. } if matches!(**inner, TypeRef::Slice { .. })
    ));
}

#[test]
fn tuple_pattern_lowering_expands_rest_markers() {
    let krate = lower_one(
        r#"
        struct Triple(u32, u32, u32);
        fn f(Triple(a, ..): Triple) {}
        "#,
    );

    let f = match root_value_item(&krate, "f") {
        ValueItem::Function(f) => f,
        other => panic!("expected function, got {:?}", other),
    };

    match &f.args[0].0.data {
        hir::PatternData::StructTuple { subs, .. } => {
            assert_eq!(subs.len(), 3, "dense vector padded to field count");
            assert!(subs[0].binding.is_some());
            assert!(matches!(subs[1].data, hir::PatternData::Any));
            assert!(matches!(subs[2].data, hir::PatternData::Any));
        }
        other => panic!("expected tuple-struct pattern, got {:?}", other),
    }
}

#[test]
fn mismatched_pattern_field_count_is_rejected() {
    let krate = parse_one(
        r#"
        struct Pair(u32, u32);
        fn f(Pair(a): Pair) {}
        "#,
    )
    .unwrap();

    let err = lower_crate(&krate, Default::default()).unwrap_err();
    assert!(matches!(
        err.kind(),
        LowerErrorKind::PatternFieldMismatch {
            expected: 2,
            actual: 1,
        }
    ));
}

#[test]
fn absolute_path_forms_round_trip() {
    // The rendered absolute form and the relative form of the same path
    // lower to structurally equal paths.
    let krate = lower_one(
        r#"
        mod m {
            pub mod n {
                pub struct S;
            }
        }

        type A = ::m::n::S;
        type B = m::n::S;
        type C = self::m::n::S;
        "#,
    );

    let expected = simple(&["m", "n", "S"]);

    for name in ["A", "B", "C"] {
        let alias = match root_type_item(&krate, name) {
            TypeItem::TypeAlias(t) => t,
            other => panic!("expected alias, got {:?}", other),
        };
        match &alias.ty {
            TypeRef::Path(hir::Path::Generic(gp)) => {
                assert_eq!(gp.path, expected, "alias {}", name)
            }
            other => panic!("expected path type, got {:?}", other),
        }
    }
}

#[test]
fn restricted_publicity_checks() {
    let global = Publicity::new_global();
    let none = Publicity::new_none();
    let scoped = Publicity::new_priv(simple(&["a", "b"]));

    let inside = simple(&["a", "b", "c"]);
    let outside = simple(&["a", "x"]);

    assert!(global.is_visible(&inside));
    assert!(!none.is_visible(&inside));
    assert!(scoped.is_visible(&simple(&["a", "b"])));
    assert!(scoped.is_visible(&inside));
    assert!(!scoped.is_visible(&outside));
}

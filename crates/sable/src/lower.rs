//! AST → HIR lowering.
//!
//! One traversal of the crate's root module lowers every declaration; impl
//! blocks are processed in a second pass once all types are known; a final
//! indexing pass binds trait-bound caches. All crate-wide state lives in
//! [LoweringContext], threaded through every transform.

mod generics;
mod impls;
mod index;
mod item;
mod path;
mod pattern;
mod ty;

use std::collections::HashMap;

use thiserror::Error;

use crate::ast;
use crate::hir;
use crate::name::Name;
use crate::span::{Span, Spanned};

/// A lowering result.
pub type Result<T, E = LowerError> = std::result::Result<T, E>;

/// A user error raised during lowering. Violated compiler invariants abort
/// instead.
#[derive(Debug)]
pub struct LowerError {
    span: Span,
    kind: LowerErrorKind,
}

impl LowerError {
    /// Construct a new lowering error.
    pub fn new<S>(spanned: S, kind: LowerErrorKind) -> Self
    where
        S: Spanned,
    {
        Self {
            span: spanned.span(),
            kind,
        }
    }

    /// Get the kind of the error.
    pub fn kind(&self) -> &LowerErrorKind {
        &self.kind
    }
}

impl std::fmt::Display for LowerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.kind.fmt(f)
    }
}

impl std::error::Error for LowerError {}

impl Spanned for LowerError {
    fn span(&self) -> Span {
        self.span
    }
}

/// The kind of a lowering error.
#[derive(Debug, Error)]
pub enum LowerErrorKind {
    /// An enum mixing value-only and data-bearing variants.
    #[error("enum `{name}` has both value and data variants")]
    EnumMixedVariants {
        /// The enum name.
        name: Name,
    },
    /// A `repr` token with no known meaning.
    #[error("unknown repr `{what}`")]
    UnknownRepr {
        /// The repr token.
        what: Box<str>,
    },
    /// Two `repr` items that cannot be combined.
    #[error("conflicting repr attributes: `{prev}` and `{new}`")]
    ReprConflict {
        /// The representation already in force.
        prev: Box<str>,
        /// The conflicting token.
        new: Box<str>,
    },
    /// An attribute with the wrong payload shape.
    #[error("malformed `{name}` attribute")]
    MalformedAttribute {
        /// The attribute name.
        name: Name,
    },
    /// A `?Trait` bound naming anything but the sized marker.
    #[error("`?{trait_}` bound on a trait that is not the sized marker")]
    MaybeTraitNotSized {
        /// The named trait.
        trait_: Box<str>,
    },
    /// A `!Trait` bound, which is not supported.
    #[error("negative trait bounds are not supported")]
    NegativeBound,
    /// A tuple pattern with the wrong number of fields.
    #[error("pattern has a mismatched field count: {expected} expected, got {actual}")]
    PatternFieldMismatch {
        /// The number of fields on the type.
        expected: usize,
        /// The number of sub-patterns given.
        actual: usize,
    },
    /// A tuple pattern with too many fields around its rest marker.
    #[error("pattern has too many fields: {max} max, got {actual}")]
    PatternTooManyFields {
        /// The number of fields on the type.
        max: usize,
        /// The number of sub-patterns given.
        actual: usize,
    },
    /// A tuple pattern on something that is not a tuple struct or variant.
    #[error("tuple pattern on non-tuple `{path}`")]
    PatternNotTuple {
        /// The matched path.
        path: Box<str>,
    },
    /// A `self` type that fits no receiver class.
    #[error("unsupported receiver type `{ty}`")]
    UnsupportedReceiver {
        /// The offending type.
        ty: Box<str>,
    },
    /// Conflicting linkage attributes on one item.
    #[error("conflicting linkage attributes")]
    LinkageConflict,
    /// Conflicting definitions of one lang item.
    #[error("conflicting definitions of lang item `{name}`: {prev} and {new}")]
    LangItemConflict {
        /// The lang item name.
        name: Name,
        /// The existing definition.
        prev: Box<str>,
        /// The new definition.
        new: Box<str>,
    },
    /// Two items with the same name in one namespace.
    #[error("duplicate definition of `{name}`")]
    ItemConflict {
        /// The item name.
        name: Name,
    },
    /// Generic parameters on an extern type.
    #[error("generic parameters on extern type")]
    GenericsOnExternType,
    /// A trait object naming more than one non-marker trait.
    #[error("multiple data traits in trait object")]
    MultipleDataTraits,
    /// A path that names nothing.
    #[error("unresolved path `{path}`")]
    UnresolvedPath {
        /// The path.
        path: Box<str>,
    },
    /// An array size beyond the supported range.
    #[error("array size out of bounds")]
    ArraySizeOverflow,
    /// `#[link]` without a `name` entry.
    #[error("#[link] needs `name`")]
    LinkNeedsName,
}

/// Everything a lowering transform can reach: the source AST, crate
/// identity, lang items, loaded extern crates, and the resolution scopes of
/// the current traversal position.
pub struct LoweringContext<'a> {
    /// The crate being lowered.
    pub ast: &'a ast::Crate,
    /// The name of the crate being lowered.
    pub crate_name: Name,
    /// The name of the core crate, used for implicit lang items.
    pub core_crate: Name,
    /// Whether the crate is built as a test harness.
    pub test_harness: bool,
    /// The path of the sized marker, once known.
    pub path_sized: Option<hir::SimplePath>,
    /// Lang items recorded so far.
    pub lang_items: HashMap<Name, hir::SimplePath>,
    /// Loaded external crates.
    pub ext_crates: HashMap<Name, hir::ExternCrate>,
    /// Native libraries named by `#[link]` attributes.
    pub ext_libs: Vec<hir::ExternLibrary>,

    /// The module path of the current traversal position.
    pub(crate) mod_stack: Vec<Name>,
    /// Generic parameters in scope, innermost frame last.
    pub(crate) generic_scopes: Vec<Vec<(Name, u16)>>,
    /// Canonical names of synthesized enum-variant structs, interned once
    /// per `(enum path, variant)` pair.
    pub(crate) variant_struct_names: HashMap<(hir::SimplePath, Name), Name>,
}

impl<'a> LoweringContext<'a> {
    fn new(ast: &'a ast::Crate, ext_crates: HashMap<Name, hir::ExternCrate>) -> Self {
        let core_crate = if ast.attrs.has("no_core") {
            ast.name
        } else {
            Name::new("core")
        };

        Self {
            ast,
            crate_name: ast.name,
            core_crate,
            test_harness: ast.test_harness,
            path_sized: None,
            lang_items: HashMap::new(),
            ext_crates,
            ext_libs: Vec::new(),
            mod_stack: Vec::new(),
            generic_scopes: Vec::new(),
            variant_struct_names: HashMap::new(),
        }
    }

    /// The absolute path of the module currently being lowered.
    pub fn current_module_path(&self) -> hir::SimplePath {
        hir::SimplePath::new(Name::empty(), self.mod_stack.clone())
    }

    /// Open a generic scope for the given parameters. Parameter indices
    /// encode the nesting level in their high byte.
    pub(crate) fn push_generic_frame(&mut self, params: &ast::GenericParams) {
        let level = (self.generic_scopes.len() as u16) << 8;
        let frame = params
            .types
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.name, level | i as u16))
            .collect();
        self.generic_scopes.push(frame);
    }

    /// Close the innermost generic scope.
    pub(crate) fn pop_generic_frame(&mut self) {
        self.generic_scopes.pop();
    }

    /// Look up a generic parameter by name, innermost scope first.
    pub(crate) fn lookup_generic(&self, name: Name) -> Option<u16> {
        for frame in self.generic_scopes.iter().rev() {
            if let Some((_, index)) = frame.iter().find(|(n, _)| *n == name) {
                return Some(*index);
            }
        }
        None
    }

    /// The canonical name of the sibling struct synthesized for a data
    /// enum variant, interned once per variant.
    pub(crate) fn variant_struct_name(
        &mut self,
        enum_path: &hir::SimplePath,
        variant: Name,
    ) -> Name {
        let key = (enum_path.clone(), variant);
        if let Some(name) = self.variant_struct_names.get(&key) {
            return *name;
        }

        let enum_name = enum_path.components.last().copied().unwrap_or(variant);
        let name = Name::new(&format!("{}#{}", enum_name, variant));
        self.variant_struct_names.insert(key, name);
        name
    }
}

/// Convert an expanded AST crate into its HIR.
///
/// `ext_crates` are the already-loaded dependencies, keyed by crate name;
/// their lang items are merged into the result.
pub fn lower_crate(
    ast: &ast::Crate,
    ext_crates: HashMap<Name, hir::ExternCrate>,
) -> Result<hir::Crate> {
    let mut ctx = LoweringContext::new(ast, ext_crates);

    log::debug!("lowering crate `{}`", ctx.crate_name);

    // Lang items must be known before declarations lower: receiver
    // classification and `?Sized` handling depend on them.
    ctx.collect_lang_items()?;
    ctx.merge_extern_lang_items()?;
    ctx.path_sized = ctx.lang_items.get(&Name::new("sized")).cloned();

    let mut krate = hir::Crate {
        name: ctx.crate_name,
        ..Default::default()
    };

    // Declarations first: one traversal of the module tree.
    krate.root_module = ctx.lower_module(&ast.root, Vec::new())?;

    // Impls second, so method signatures can refer to any declaration.
    ctx.lower_module_impls(&ast.root, &mut krate)?;

    // Collect exported macros and proc-macro re-exports.
    ctx.collect_macros(&ast.root, &mut krate);

    krate.lang_items = std::mem::take(&mut ctx.lang_items);
    krate.ext_libs = std::mem::take(&mut ctx.ext_libs);
    krate.ext_crates = std::mem::take(&mut ctx.ext_crates);

    // The core crate resolves a fixed set of ops items by literal name when
    // they are not otherwise tagged.
    if ctx.crate_name == ctx.core_crate {
        add_implicit_core_items(&mut krate);
    }

    // Indexing post-pass: bind trait-bound caches now that forward
    // references can resolve.
    index::index_crate(&krate)?;

    Ok(krate)
}

const IMPLICIT_CORE_ITEMS: &[(&str, &str)] = &[
    ("boxed_trait", "Boxed"),
    ("placer_trait", "Placer"),
    ("place_trait", "Place"),
    ("box_place_trait", "BoxPlace"),
    ("in_place_trait", "InPlace"),
];

/// Resolve the implicit `ops::...` lang items by literal lookup under the
/// root module.
fn add_implicit_core_items(krate: &mut hir::Crate) {
    let ops = Name::new("ops");

    for (lang, item) in IMPLICIT_CORE_ITEMS {
        let lang = Name::new(lang);
        if krate.lang_items.contains_key(&lang) {
            continue;
        }

        let path = hir::SimplePath::new(Name::empty(), vec![ops, Name::new(item)]);

        let resolved = match krate.typeitem_by_path(&path) {
            Some(hir::TypeItem::Import {
                path: target,
                is_variant,
                ..
            }) if !*is_variant => Some(target.clone()),
            Some(hir::TypeItem::Import { .. }) | None => None,
            Some(..) => Some(path),
        };

        if let Some(resolved) = resolved {
            krate.lang_items.insert(lang, resolved);
        }
    }
}

impl<'a> LoweringContext<'a> {
    /// Record every `#[lang = "..."]` tag in the current crate.
    fn collect_lang_items(&mut self) -> Result<()> {
        fn walk(
            ctx_lang: &mut HashMap<Name, hir::SimplePath>,
            module: &ast::Module,
            path: &hir::SimplePath,
        ) -> Result<()> {
            for item in &module.items {
                let Some(name) = item.name else { continue };
                let item_path = path.child(name.name);

                if let Some(attr) = item.attrs.get("lang") {
                    let lang = match attr.as_str() {
                        Some(s) => Name::new(s),
                        None => {
                            return Err(LowerError::new(
                                attr.span,
                                LowerErrorKind::MalformedAttribute { name: attr.name },
                            ));
                        }
                    };

                    if let Some(prev) = ctx_lang.get(&lang) {
                        if *prev != item_path {
                            return Err(LowerError::new(attr.span, {
                                LowerErrorKind::LangItemConflict {
                                    name: lang,
                                    prev: prev.to_string().into_boxed_str(),
                                    new: item_path.to_string().into_boxed_str(),
                                }
                            }));
                        }
                    } else {
                        ctx_lang.insert(lang, item_path.clone());
                    }
                }

                if let ast::Item::Module(sub) = &item.data {
                    walk(ctx_lang, sub, &item_path)?;
                }
            }

            Ok(())
        }

        let root = hir::SimplePath::crate_root();
        walk(&mut self.lang_items, &self.ast.root, &root)
    }

    /// Merge lang items defined by loaded extern crates. Equal definitions
    /// merge silently; conflicting ones are a hard error.
    fn merge_extern_lang_items(&mut self) -> Result<()> {
        for ext in self.ext_crates.values() {
            for (name, path) in &ext.hir.lang_items {
                match self.lang_items.get(name) {
                    None => {
                        self.lang_items.insert(*name, path.clone());
                    }
                    Some(prev) if prev == path => {}
                    // Bare markers from both sides are compatible.
                    Some(prev)
                        if prev.components.is_empty() && path.components.is_empty() => {}
                    Some(prev) => {
                        return Err(LowerError::new(Span::empty(), {
                            LowerErrorKind::LangItemConflict {
                                name: *name,
                                prev: prev.to_string().into_boxed_str(),
                                new: path.to_string().into_boxed_str(),
                            }
                        }));
                    }
                }
            }
        }

        Ok(())
    }

    /// Collect exported macro-rules definitions and proc-macro re-exports
    /// into the crate tables.
    fn collect_macros(&mut self, module: &ast::Module, krate: &mut hir::Crate) {
        for item in &module.items {
            match &item.data {
                ast::Item::MacroRules(def) if def.exported => {
                    if let Some(name) = item.name {
                        krate
                            .exported_macros
                            .entry(name.name)
                            .or_insert_with(|| def.clone());
                    }
                }
                ast::Item::Module(sub) => self.collect_macros(sub, krate),
                _ => {}
            }
        }
    }
}

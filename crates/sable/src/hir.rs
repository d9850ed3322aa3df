//! The high-level IR: the expanded and desugared module tree.
//!
//! Lowering is single-assignment: nodes are not mutated once built, apart
//! from the designated cache fields which downstream passes fill in.

mod expr;
mod generics;
mod path;
mod pattern;
mod types;

pub use self::expr::ExprPtr;
pub use self::generics::{GenericBound, GenericParams, TypeParamDef};
pub use self::path::{GenericPath, Path, PathParams, SimplePath, TraitPath};
pub use self::pattern::{BindMode, Pattern, PatternBinding, PatternData, PatternValue};
pub use self::types::{
    ArraySize, BorrowKind, CoreType, FunctionType, TypeRef, SELF_PARAM_INDEX,
};

pub use crate::ast::MacroRulesDef;

use core::fmt;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::name::Name;

/// Who may see an item.
#[derive(Debug, Clone)]
pub enum Publicity {
    /// Public everywhere.
    Global,
    /// Visible only within the named module subtree.
    Priv(Arc<SimplePath>),
    /// Synthesized by the compiler; visible nowhere.
    None,
}

impl Publicity {
    /// Construct global visibility.
    pub fn new_global() -> Self {
        Publicity::Global
    }

    /// Construct compiler-internal visibility.
    pub fn new_none() -> Self {
        Publicity::None
    }

    /// Construct visibility restricted to the given module subtree.
    pub fn new_priv(path: SimplePath) -> Self {
        Publicity::Priv(Arc::new(path))
    }

    /// Test if the item is public everywhere.
    pub fn is_global(&self) -> bool {
        matches!(self, Publicity::Global)
    }

    /// Test if the item is visible from the given module.
    pub fn is_visible(&self, consumer: &SimplePath) -> bool {
        match self {
            Publicity::Global => true,
            Publicity::Priv(path) => path.contains(consumer),
            Publicity::None => false,
        }
    }
}

impl fmt::Display for Publicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Publicity::Global => write!(f, "pub"),
            Publicity::Priv(path) => write!(f, "pub(in {})", path),
            Publicity::None => write!(f, "pub(none)"),
        }
    }
}

/// An item with its visibility.
#[derive(Debug, Clone)]
pub struct VisEnt<T> {
    /// The visibility of the item.
    pub publicity: Publicity,
    /// The item.
    pub ent: T,
}

/// Symbol linkage for functions and statics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkageType {
    /// Default linkage.
    Auto,
    /// Multiple definitions are allowed.
    Weak,
    /// The symbol is forced to be externally visible.
    External,
}

/// A linkage record: a type and the external symbol name.
#[derive(Debug, Clone)]
pub struct Linkage {
    /// The linkage type.
    pub kind: LinkageType,
    /// The external symbol name, if one applies.
    pub name: Option<Name>,
}

impl Default for Linkage {
    fn default() -> Self {
        Self {
            kind: LinkageType::Auto,
            name: None,
        }
    }
}

/// The shape of a method's `self` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receiver {
    /// Not a method.
    Free,
    /// `self`.
    Value,
    /// `&move self`.
    BorrowOwned,
    /// `&mut self`.
    BorrowUnique,
    /// `&self`.
    BorrowShared,
    /// `self: Box<Self>`.
    Box,
    /// `self: Wrapper<Self>` for some other single-parameter type.
    Custom,
}

/// A lowered function.
#[derive(Debug, Clone)]
pub struct Function {
    /// Whether the body must be kept for downstream consumers.
    pub save_code: bool,
    /// Linkage, per the attribute precedence rules.
    pub linkage: Linkage,
    /// The receiver classification.
    pub receiver: Receiver,
    /// The ABI.
    pub abi: Name,
    /// Whether the function is `unsafe`.
    pub is_unsafe: bool,
    /// Whether the function is `const`.
    pub is_const: bool,
    /// Generic parameters.
    pub params: GenericParams,
    /// The arguments.
    pub args: Vec<(Pattern, TypeRef)>,
    /// Whether the argument list is variadic.
    pub is_variadic: bool,
    /// The return type.
    pub ret: TypeRef,
    /// The body.
    pub code: ExprPtr,
}

/// A lowered `static`.
#[derive(Debug, Clone)]
pub struct Static {
    /// Linkage.
    pub linkage: Linkage,
    /// Whether the static is mutable.
    pub is_mut: bool,
    /// The type.
    pub ty: TypeRef,
    /// The initializer.
    pub value: ExprPtr,
}

/// A lowered `const`.
#[derive(Debug, Clone)]
pub struct Constant {
    /// Generic parameters.
    pub params: GenericParams,
    /// The type.
    pub ty: TypeRef,
    /// The value.
    pub value: ExprPtr,
}

/// A lowered type alias.
#[derive(Debug, Clone)]
pub struct TypeAlias {
    /// Generic parameters.
    pub params: GenericParams,
    /// The aliased type.
    pub ty: TypeRef,
}

/// An opaque extern type.
#[derive(Debug, Clone, Default)]
pub struct ExternType;

/// The representation of a struct, resolved from `repr(...)` attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repr {
    /// Default layout.
    Rust,
    /// `repr(C)`.
    C,
    /// `repr(packed)`, possibly combined with `C`.
    Packed,
    /// `repr(simd)`.
    Simd,
    /// `repr(transparent)`.
    Transparent,
    /// `repr(align(N))`, carrying the alignment.
    Aligned(u32),
}

/// The fields of a struct.
#[derive(Debug, Clone)]
pub enum StructData {
    /// A unit struct.
    Unit,
    /// A tuple struct.
    Tuple(Vec<VisEnt<TypeRef>>),
    /// A struct with named fields.
    Named(Vec<(Name, VisEnt<TypeRef>)>),
}

/// A lowered struct.
#[derive(Debug, Clone)]
pub struct Struct {
    /// Generic parameters.
    pub params: GenericParams,
    /// The representation tag.
    pub repr: Repr,
    /// The fields.
    pub data: StructData,
    /// A forced alignment, non-zero when `repr(align(N))` applies.
    pub forced_alignment: u32,
}

impl Struct {
    /// The number of fields, if the struct has a fixed shape.
    pub fn field_count(&self) -> usize {
        match &self.data {
            StructData::Unit => 0,
            StructData::Tuple(fields) => fields.len(),
            StructData::Named(fields) => fields.len(),
        }
    }
}

/// The representation of a union.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnionRepr {
    /// Default layout.
    Rust,
    /// `repr(C)`.
    C,
}

/// A lowered union.
#[derive(Debug, Clone)]
pub struct Union {
    /// Generic parameters.
    pub params: GenericParams,
    /// The representation.
    pub repr: UnionRepr,
    /// The fields.
    pub fields: Vec<(Name, VisEnt<TypeRef>)>,
}

/// The representation of a value enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumRepr {
    Rust,
    C,
    Usize,
    U8,
    U16,
    U32,
    U64,
}

/// A variant of a value enum.
#[derive(Debug, Clone)]
pub struct ValueVariant {
    /// The variant name.
    pub name: Name,
    /// The discriminant expression, if written.
    pub expr: ExprPtr,
    /// The evaluated discriminant; filled by constant evaluation.
    pub value: u64,
}

/// A variant of a data enum.
#[derive(Debug, Clone)]
pub struct DataVariant {
    /// The variant name.
    pub name: Name,
    /// Whether the variant is struct-like, keeping it out of the value
    /// namespace.
    pub is_struct: bool,
    /// The variant payload type: unit, or a path to the synthesized
    /// sibling struct.
    pub ty: TypeRef,
}

/// The class of a lowered enum.
#[derive(Debug, Clone)]
pub enum EnumClass {
    /// An enum whose variants all carry plain values.
    Value {
        /// The representation.
        repr: EnumRepr,
        /// The variants.
        variants: Vec<ValueVariant>,
    },
    /// An enum with at least one payload-bearing variant.
    Data(Vec<DataVariant>),
}

/// A lowered enum.
#[derive(Debug, Clone)]
pub struct Enum {
    /// Generic parameters.
    pub params: GenericParams,
    /// The class and variants.
    pub class: EnumClass,
}

impl Enum {
    /// The number of variants.
    pub fn num_variants(&self) -> usize {
        match &self.class {
            EnumClass::Value { variants, .. } => variants.len(),
            EnumClass::Data(variants) => variants.len(),
        }
    }

    /// Find a variant by name.
    pub fn find_variant(&self, name: Name) -> Option<usize> {
        match &self.class {
            EnumClass::Value { variants, .. } => {
                variants.iter().position(|v| v.name == name)
            }
            EnumClass::Data(variants) => variants.iter().position(|v| v.name == name),
        }
    }

    /// Test if this is a value enum.
    pub fn is_value(&self) -> bool {
        matches!(self.class, EnumClass::Value { .. })
    }
}

/// An associated type declaration in a trait.
#[derive(Debug, Clone)]
pub struct AssociatedType {
    /// Whether the type must be `Sized`.
    pub is_sized: bool,
    /// A lifetime bound, if declared.
    pub lifetime_bound: Option<Name>,
    /// Trait bounds on the type.
    pub trait_bounds: Vec<TraitPath>,
    /// The default, if declared.
    pub default: Option<TypeRef>,
}

/// A value item declared in a trait.
#[derive(Debug, Clone)]
pub enum TraitValueItem {
    /// An associated constant.
    Constant(Constant),
    /// An associated static.
    Static(Static),
    /// A method.
    Function(Function),
}

/// A lowered trait.
#[derive(Debug, Clone)]
pub struct Trait {
    /// Generic parameters, including the synthesized `Self: ThisTrait`
    /// bound.
    pub params: GenericParams,
    /// The lifetime supertrait, if declared.
    pub lifetime: Option<Name>,
    /// Parent traits, in declaration order.
    pub parent_traits: Vec<TraitPath>,
    /// Whether the trait is a marker.
    pub is_marker: bool,
    /// Associated type declarations.
    pub types: HashMap<Name, AssociatedType>,
    /// Associated value declarations.
    pub values: HashMap<Name, TraitValueItem>,

    /// Vtable value slots; populated by downstream resolution.
    pub value_indexes: HashMap<Name, Vec<(usize, GenericPath)>>,
    /// Vtable type slots; populated by downstream resolution.
    pub type_indexes: HashMap<Name, usize>,
    /// Flattened parent traits; populated by downstream resolution.
    pub all_parent_traits: Vec<TraitPath>,
    /// The vtable path; populated by downstream resolution.
    pub vtable_path: Option<SimplePath>,
}

impl Trait {
    /// Construct a trait with empty caches.
    pub fn new(
        params: GenericParams,
        lifetime: Option<Name>,
        parent_traits: Vec<TraitPath>,
    ) -> Self {
        Self {
            params,
            lifetime,
            parent_traits,
            is_marker: false,
            types: HashMap::new(),
            values: HashMap::new(),
            value_indexes: HashMap::new(),
            type_indexes: HashMap::new(),
            all_parent_traits: Vec::new(),
            vtable_path: None,
        }
    }
}

/// A procedural macro presented by this crate.
#[derive(Debug, Clone)]
pub struct ProcMacro {
    /// The macro name.
    pub name: Name,
    /// The path to the handler.
    pub path: SimplePath,
    /// Attribute names handed to the handler.
    pub attributes: Vec<String>,
}

/// An entry in a module's type namespace.
#[derive(Debug, Clone)]
pub enum TypeItem {
    /// A re-export of another item.
    Import {
        /// The imported path.
        path: SimplePath,
        /// Whether the import names an enum variant.
        is_variant: bool,
        /// The variant index when `is_variant`.
        index: usize,
    },
    Module(Module),
    TypeAlias(TypeAlias),
    ExternType(ExternType),
    Enum(Enum),
    Struct(Struct),
    Union(Union),
    Trait(Trait),
}

/// An entry in a module's value namespace.
#[derive(Debug, Clone)]
pub enum ValueItem {
    /// A re-export of another item.
    Import {
        /// The imported path.
        path: SimplePath,
        /// Whether the import names an enum variant.
        is_variant: bool,
        /// The variant index when `is_variant`.
        index: usize,
    },
    Constant(Constant),
    Static(Static),
    /// The value of a unit struct.
    StructConstant {
        /// The struct's path.
        ty: SimplePath,
    },
    Function(Function),
    /// The constructor function of a tuple struct.
    StructConstructor {
        /// The struct's path.
        ty: SimplePath,
    },
}

/// An entry in a module's macro namespace.
#[derive(Debug, Clone)]
pub enum MacroItem {
    /// A re-export of another macro.
    Import {
        /// The imported path.
        path: SimplePath,
    },
    MacroRules(MacroRulesDef),
    ProcMacro(ProcMacro),
}

/// A lowered module: three independent name tables plus the in-scope trait
/// list.
#[derive(Debug, Clone, Default)]
pub struct Module {
    /// Traits in scope in this module.
    pub traits: Vec<SimplePath>,
    /// The type namespace.
    pub type_items: HashMap<Name, VisEnt<TypeItem>>,
    /// The value namespace.
    pub value_items: HashMap<Name, VisEnt<ValueItem>>,
    /// The macro namespace.
    pub macro_items: HashMap<Name, VisEnt<MacroItem>>,
}

impl Module {
    /// Insert into the type namespace. Returns false when the key is taken.
    pub fn add_type_item(&mut self, name: Name, ent: VisEnt<TypeItem>) -> bool {
        insert_new(&mut self.type_items, name, ent)
    }

    /// Insert into the value namespace. Returns false when the key is
    /// taken.
    pub fn add_value_item(&mut self, name: Name, ent: VisEnt<ValueItem>) -> bool {
        insert_new(&mut self.value_items, name, ent)
    }

    /// Insert into the macro namespace. Returns false when the key is
    /// taken.
    pub fn add_macro_item(&mut self, name: Name, ent: VisEnt<MacroItem>) -> bool {
        insert_new(&mut self.macro_items, name, ent)
    }
}

fn insert_new<T>(map: &mut HashMap<Name, T>, name: Name, ent: T) -> bool {
    use std::collections::hash_map::Entry;

    match map.entry(name) {
        Entry::Occupied(..) => false,
        Entry::Vacant(e) => {
            e.insert(ent);
            true
        }
    }
}

/// An item in an inherent impl, with visibility and specialization flag.
#[derive(Debug, Clone)]
pub struct VisImplEnt<T> {
    /// The visibility of the item.
    pub publicity: Publicity,
    /// Whether the item was declared `default`.
    pub is_specializable: bool,
    /// The item.
    pub data: T,
}

/// An item in a trait impl, with specialization flag.
#[derive(Debug, Clone)]
pub struct ImplEnt<T> {
    /// Whether the item was declared `default`.
    pub is_specializable: bool,
    /// The item.
    pub data: T,
}

/// An inherent impl block.
#[derive(Debug, Clone)]
pub struct TypeImpl {
    /// Generic parameters.
    pub params: GenericParams,
    /// The implementing type.
    pub ty: TypeRef,
    /// The methods.
    pub methods: HashMap<Name, VisImplEnt<Function>>,
    /// The associated constants.
    pub constants: HashMap<Name, VisImplEnt<Constant>>,
    /// The module the impl appeared in.
    pub src_module: SimplePath,
}

/// A trait impl block.
#[derive(Debug, Clone)]
pub struct TraitImpl {
    /// Generic parameters.
    pub params: GenericParams,
    /// Arguments to the implemented trait.
    pub trait_args: PathParams,
    /// The implementing type.
    pub ty: TypeRef,
    /// The methods.
    pub methods: HashMap<Name, ImplEnt<Function>>,
    /// The associated constants.
    pub constants: HashMap<Name, ImplEnt<Constant>>,
    /// The associated statics.
    pub statics: HashMap<Name, ImplEnt<Static>>,
    /// The associated types.
    pub types: HashMap<Name, ImplEnt<TypeRef>>,
    /// The module the impl appeared in.
    pub src_module: SimplePath,
}

/// A marker (or negative) impl.
#[derive(Debug, Clone)]
pub struct MarkerImpl {
    /// Generic parameters.
    pub params: GenericParams,
    /// Arguments to the implemented trait.
    pub trait_args: PathParams,
    /// False for `impl !Trait for T`.
    pub is_positive: bool,
    /// The implementing type.
    pub ty: TypeRef,
    /// The module the impl appeared in.
    pub src_module: SimplePath,
}

/// Impl blocks partitioned for lookup: by head-type path, by shape for
/// primitive and tuple heads, and a generic remainder.
#[derive(Debug, Clone)]
pub struct ImplGroup<T> {
    /// Impls on a named type, keyed by its canonical path.
    pub named: BTreeMap<SimplePath, Vec<T>>,
    /// Impls on primitive and tuple types.
    pub non_named: Vec<T>,
    /// Everything else: generic parameters and unresolved heads.
    pub generic: Vec<T>,
}

impl<T> Default for ImplGroup<T> {
    fn default() -> Self {
        Self {
            named: BTreeMap::new(),
            non_named: Vec::new(),
            generic: Vec::new(),
        }
    }
}

impl<T> ImplGroup<T> {
    /// File an impl under the partition derived from its head type.
    pub fn insert(&mut self, ty: &TypeRef, item: T) {
        if let Some(path) = ty.sort_path() {
            self.named.entry(path.clone()).or_default().push(item);
            return;
        }

        match ty {
            TypeRef::Generic { .. } | TypeRef::Infer | TypeRef::ErasedType { .. } => {
                self.generic.push(item);
            }
            _ => self.non_named.push(item),
        }
    }

    /// All impls that can apply to the given concrete type: the named list
    /// when the type sorts under a path, else the non-named list, plus the
    /// generic remainder in either case.
    pub fn for_type<'a>(&'a self, ty: &TypeRef) -> impl Iterator<Item = &'a T> {
        let primary: &[T] = match ty.sort_path() {
            Some(path) => self.named.get(path).map(Vec::as_slice).unwrap_or(&[]),
            None => &self.non_named,
        };

        primary.iter().chain(self.generic.iter())
    }

    /// Iterate over every impl in the group.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.named
            .values()
            .flatten()
            .chain(self.non_named.iter())
            .chain(self.generic.iter())
    }
}

/// A loaded external crate.
#[derive(Debug, Clone)]
pub struct ExternCrate {
    /// The crate's HIR.
    pub hir: Box<Crate>,
    /// The filename the crate was loaded from.
    pub filename: String,
}

/// A native library to link against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternLibrary {
    /// The library name.
    pub name: String,
}

/// A fully lowered crate.
#[derive(Debug, Clone, Default)]
pub struct Crate {
    /// The crate name.
    pub name: Name,
    /// The root module.
    pub root_module: Module,

    /// Inherent impls.
    pub type_impls: ImplGroup<TypeImpl>,
    /// Trait impls, grouped per trait.
    pub trait_impls: BTreeMap<SimplePath, ImplGroup<TraitImpl>>,
    /// Marker impls (including negative impls), grouped per trait.
    pub marker_impls: BTreeMap<SimplePath, ImplGroup<MarkerImpl>>,

    /// Macros exported by this crate.
    pub exported_macros: HashMap<Name, MacroRulesDef>,
    /// Procedural macros re-exported by this crate.
    pub proc_macro_reexports: HashMap<Name, SimplePath>,
    /// Procedural macros presented by this crate.
    pub proc_macros: Vec<ProcMacro>,

    /// Language items visible through this crate, including those of
    /// loaded extern crates.
    pub lang_items: HashMap<Name, SimplePath>,

    /// Loaded extern crates, keyed by crate name.
    pub ext_crates: HashMap<Name, ExternCrate>,
    /// Referenced native libraries.
    pub ext_libs: Vec<ExternLibrary>,
}

impl Crate {
    /// Look up a lang item, if defined.
    pub fn lang_item(&self, name: &str) -> Option<&SimplePath> {
        self.lang_items.get(&Name::new(name))
    }

    fn module_containing(&self, path: &SimplePath) -> Option<&Module> {
        let mut module = if path.crate_name.is_empty() {
            &self.root_module
        } else {
            &self.ext_crates.get(&path.crate_name)?.hir.root_module
        };

        let components = path.components.split_last()?.1;
        for c in components {
            match &module.type_items.get(c)?.ent {
                TypeItem::Module(m) => module = m,
                _ => return None,
            }
        }

        Some(module)
    }

    /// Look up a type-namespace item by absolute path.
    pub fn typeitem_by_path(&self, path: &SimplePath) -> Option<&TypeItem> {
        let module = self.module_containing(path)?;
        let last = path.components.last()?;
        Some(&module.type_items.get(last)?.ent)
    }

    /// Look up a value-namespace item by absolute path.
    pub fn valueitem_by_path(&self, path: &SimplePath) -> Option<&ValueItem> {
        let module = self.module_containing(path)?;
        let last = path.components.last()?;
        Some(&module.value_items.get(last)?.ent)
    }

    /// Look up a struct by absolute path.
    pub fn struct_by_path(&self, path: &SimplePath) -> Option<&Struct> {
        match self.typeitem_by_path(path)? {
            TypeItem::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Look up an enum by absolute path.
    pub fn enum_by_path(&self, path: &SimplePath) -> Option<&Enum> {
        match self.typeitem_by_path(path)? {
            TypeItem::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// Look up a trait by absolute path.
    pub fn trait_by_path(&self, path: &SimplePath) -> Option<&Trait> {
        match self.typeitem_by_path(path)? {
            TypeItem::Trait(t) => Some(t),
            _ => None,
        }
    }
}

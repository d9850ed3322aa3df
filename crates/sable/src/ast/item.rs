use std::path::PathBuf;

use crate::ast::attrs::AttributeList;
use crate::ast::expr::Expr;
use crate::ast::generics::GenericParams;
use crate::ast::path::Path;
use crate::ast::pattern::Pattern;
use crate::ast::types::TypeRef;
use crate::lex::{Ident, TokenStream};
use crate::name::Name;
use crate::span::Span;

/// The default ABI.
pub const ABI_SABLE: &str = "Sable";

/// The visibility written on an item.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Visibility {
    /// No visibility given; private to the enclosing module subtree.
    #[default]
    Inherited,
    /// `pub`.
    Public,
    /// `pub(crate)`, `pub(self)`, `pub(super...)` or `pub(in path)`, already
    /// resolved to an absolute module path by the parser.
    Restricted {
        /// The module subtree the item is visible in.
        path: Path,
    },
}

impl Visibility {
    /// Test if the visibility is plain `pub`.
    pub fn is_public(&self) -> bool {
        matches!(self, Visibility::Public)
    }
}

/// Source-file provenance of a module.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FileInfo {
    /// The effective file path that produced the module. `-` for stdin.
    pub path: PathBuf,
    /// Whether child `mod name;` declarations may resolve to files in this
    /// module's directory.
    pub controls_dir: bool,
}

impl FileInfo {
    /// Test if the module came from stdin, which disables out-of-line
    /// module loading.
    pub fn is_stdin(&self) -> bool {
        self.path.as_os_str() == "-"
    }
}

/// An item with its surrounding metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Named<T> {
    /// The span of the whole declaration.
    pub span: Span,
    /// Attributes on the item.
    pub attrs: AttributeList,
    /// The declared visibility.
    pub vis: Visibility,
    /// The item name. Absent for impls and macro invocations.
    pub name: Option<Ident>,
    /// The item itself.
    pub data: T,
}

/// A module: a named collection of items with file provenance.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    /// File provenance, driving child module resolution.
    pub file: FileInfo,
    /// The items of the module, in source order.
    pub items: Vec<Named<Item>>,
}

impl Module {
    /// Construct a new module with the given provenance.
    pub fn new(file: FileInfo) -> Self {
        Self {
            file,
            items: Vec::new(),
        }
    }

    /// Append an item.
    pub fn push(&mut self, item: Named<Item>) {
        self.items.push(item);
    }
}

/// A parsed crate: the root module plus crate-level attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Crate {
    /// The crate name, set by the driver.
    pub name: Name,
    /// The root module.
    pub root: Module,
    /// Crate-level (`#![...]`) attributes.
    pub attrs: AttributeList,
    /// Whether the crate is compiled as a test harness, which suppresses
    /// linkage derivation for items with bodies.
    pub test_harness: bool,
}

/// One entry of a `use` item: the resolved path and the local name.
#[derive(Debug, Clone, PartialEq)]
pub struct UseEntry {
    /// The span of the entry.
    pub span: Span,
    /// The imported path.
    pub path: Path,
    /// The local name; absent for glob imports.
    pub name: Option<Name>,
}

/// A `use` item, flattened into a list of entries.
#[derive(Debug, Clone, PartialEq)]
pub struct UseItem {
    /// The entries.
    pub entries: Vec<UseEntry>,
}

/// A type alias, `type Name<...> = T;`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAlias {
    /// Generic parameters.
    pub params: GenericParams,
    /// The aliased type. Invalid for extern type declarations.
    pub ty: TypeRef,
}

/// A field of a tuple struct.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleField {
    /// Attributes on the field.
    pub attrs: AttributeList,
    /// The field visibility.
    pub vis: Visibility,
    /// The field type.
    pub ty: TypeRef,
}

/// A named field of a struct, union, or struct-like enum variant.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedField {
    /// Attributes on the field.
    pub attrs: AttributeList,
    /// The field visibility.
    pub vis: Visibility,
    /// The field name.
    pub name: Ident,
    /// The field type.
    pub ty: TypeRef,
}

/// The shape of a struct.
#[derive(Debug, Clone, PartialEq)]
pub enum StructData {
    /// `struct S;`
    Unit,
    /// `struct S(...);`
    Tuple(Vec<TupleField>),
    /// `struct S { ... }`
    Named(Vec<NamedField>),
}

/// A struct declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Struct {
    /// Generic parameters.
    pub params: GenericParams,
    /// The shape and fields.
    pub data: StructData,
}

/// The payload of an enum variant.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumVariantData {
    /// A bare unit variant.
    Unit,
    /// A unit variant with an explicit discriminant.
    Value(Expr),
    /// A tuple variant.
    Tuple(Vec<TypeRef>),
    /// A struct variant.
    Struct(Vec<NamedField>),
}

/// One variant of an enum.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumVariant {
    /// The span of the variant.
    pub span: Span,
    /// Attributes on the variant.
    pub attrs: AttributeList,
    /// The variant name.
    pub name: Ident,
    /// The payload.
    pub data: EnumVariantData,
}

/// An enum declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Enum {
    /// Generic parameters.
    pub params: GenericParams,
    /// The variants, in declaration order.
    pub variants: Vec<EnumVariant>,
}

/// A union declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Union {
    /// Generic parameters.
    pub params: GenericParams,
    /// The fields.
    pub fields: Vec<NamedField>,
}

/// A trait declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Trait {
    /// Generic parameters. Lifetime supertraits are folded in as bounds on
    /// `Self`.
    pub params: GenericParams,
    /// Parent traits, in declaration order.
    pub supertraits: Vec<crate::ast::types::PolyTraitRef>,
    /// Whether the trait is `unsafe`.
    pub is_unsafe: bool,
    /// Whether the trait is an `auto` marker trait.
    pub is_marker: bool,
    /// Associated items.
    pub items: Vec<Named<Item>>,
}

/// The head of an impl block.
#[derive(Debug, Clone, PartialEq)]
pub struct ImplDef {
    /// Whether the impl is `unsafe`.
    pub is_unsafe: bool,
    /// Generic parameters.
    pub params: GenericParams,
    /// The implemented trait, if any.
    pub trait_: Option<Path>,
    /// The implementing type.
    pub ty: TypeRef,
}

/// An associated item inside an impl block.
#[derive(Debug, Clone, PartialEq)]
pub struct ImplItem {
    /// The span of the declaration.
    pub span: Span,
    /// Attributes on the item.
    pub attrs: AttributeList,
    /// The declared visibility.
    pub vis: Visibility,
    /// Whether the item was marked `default` (specializable).
    pub is_specializable: bool,
    /// The item name. Absent for macro invocations.
    pub name: Option<Ident>,
    /// The item itself: an associated const, type, static, method, or
    /// macro invocation.
    pub data: Item,
}

/// An impl block.
#[derive(Debug, Clone, PartialEq)]
pub struct Impl {
    /// The head of the block.
    pub def: ImplDef,
    /// Associated items.
    pub items: Vec<ImplItem>,
}

/// A function declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// The span of the signature.
    pub span: Span,
    /// Generic parameters.
    pub params: GenericParams,
    /// The ABI.
    pub abi: Name,
    /// Whether the function is `unsafe`.
    pub is_unsafe: bool,
    /// Whether the function is `const`.
    pub is_const: bool,
    /// Whether the argument list ends with `...`.
    pub is_variadic: bool,
    /// The arguments. A recognized `self` argument appears first as a
    /// synthetic `self: Type` pair.
    pub args: Vec<(Pattern, TypeRef)>,
    /// The return type.
    pub ret: TypeRef,
    /// The body, absent for prototypes.
    pub code: Option<Expr>,
}

/// The class of a `static` or `const` item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaticClass {
    /// `const`.
    Const,
    /// `static`.
    Static,
    /// `static mut`.
    Mut,
}

/// A `static` or `const` item.
#[derive(Debug, Clone, PartialEq)]
pub struct Static {
    /// The class of the item.
    pub class: StaticClass,
    /// The declared type.
    pub ty: TypeRef,
    /// The value, absent in extern blocks and trait declarations.
    pub value: Option<Expr>,
}

/// An `extern "ABI" { ... }` block.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternBlock {
    /// The ABI of the block.
    pub abi: Name,
    /// The contained prototypes.
    pub items: Vec<Named<Item>>,
}

/// An unexpanded macro invocation, `name! ident? ( tokens )`.
///
/// The raw token tree is carried until the invocation is expanded in place.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroInvocation {
    /// The span of the invocation.
    pub span: Span,
    /// The macro name.
    pub name: Name,
    /// The optional identifier between `!` and the delimiter.
    pub ident: Option<Name>,
    /// The captured token tree.
    pub input: TokenStream,
}

/// A `macro_rules!`-style definition, kept as raw tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroRulesDef {
    /// Whether the definition carries `#[macro_export]`.
    pub exported: bool,
    /// The raw rules.
    pub body: TokenStream,
}

/// An item.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Item {
    /// A filtered-out or otherwise absent item.
    #[default]
    None,
    /// A module.
    Module(Module),
    /// An `extern crate` declaration.
    Crate {
        /// The external crate name.
        name: Name,
    },
    /// A `use` item.
    Use(UseItem),
    /// A type alias.
    TypeAlias(TypeAlias),
    /// A struct.
    Struct(Struct),
    /// An enum.
    Enum(Enum),
    /// A union.
    Union(Union),
    /// A trait.
    Trait(Trait),
    /// An impl block.
    Impl(Impl),
    /// A negative impl, `impl !Trait for T {}`.
    NegImpl(ImplDef),
    /// A function.
    Function(Function),
    /// A static or const.
    Static(Static),
    /// An extern block.
    ExternBlock(ExternBlock),
    /// An unexpanded macro invocation.
    MacroInvocation(MacroInvocation),
    /// A macro-rules definition.
    MacroRules(MacroRulesDef),
}

impl Item {
    /// A short tag for diagnostics.
    pub fn tag(&self) -> &'static str {
        match self {
            Item::None => "none",
            Item::Module(..) => "module",
            Item::Crate { .. } => "extern crate",
            Item::Use(..) => "use",
            Item::TypeAlias(..) => "type alias",
            Item::Struct(..) => "struct",
            Item::Enum(..) => "enum",
            Item::Union(..) => "union",
            Item::Trait(..) => "trait",
            Item::Impl(..) => "impl",
            Item::NegImpl(..) => "negative impl",
            Item::Function(..) => "function",
            Item::Static(..) => "static",
            Item::ExternBlock(..) => "extern block",
            Item::MacroInvocation(..) => "macro invocation",
            Item::MacroRules(..) => "macro definition",
        }
    }
}

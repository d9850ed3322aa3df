//! The surface AST produced by the parser.
//!
//! After initial construction the tree is only mutated in two ways: macro
//! expansion splices expansion results over `MacroInvocation` nodes, and
//! `#[cfg]`-filtered items are replaced by [Item::None]. Everything else is
//! immutable through to lowering.

pub mod attrs;
pub mod expr;
pub mod generics;
pub mod item;
pub mod path;
pub mod pattern;
pub mod types;

pub use self::attrs::{AttrPayload, Attribute, AttributeList};
pub use self::expr::{BinaryOp, Block, Expr, ExprKind, FieldName, Literal, Stmt, UnaryOp};
pub use self::generics::{
    GenericBound, GenericBoundKind, GenericParams, HigherRankedBounds, LifetimeParam,
    LifetimeRef, TypeParam,
};
pub use self::item::{
    Crate, Enum, EnumVariant, EnumVariantData, ExternBlock, FileInfo, Function, Impl,
    ImplDef, ImplItem, Item, MacroInvocation, MacroRulesDef, Module, Named, NamedField,
    Static, StaticClass, Struct, StructData, Trait, TupleField, TypeAlias, Union,
    UseEntry, UseItem, Visibility, ABI_SABLE,
};
pub use self::path::{Path, PathClass, PathNode, PathParams};
pub use self::pattern::{
    BindMode, Pattern, PatternBinding, PatternData, PatternValue, TuplePat,
};
pub use self::types::{CoreType, FunctionType, PolyTraitRef, TypeData, TypeRef};

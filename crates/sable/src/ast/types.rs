use crate::ast::expr::Expr;
use crate::ast::generics::{HigherRankedBounds, LifetimeRef};
use crate::ast::path::Path;
use crate::lex::Ident;
use crate::name::Name;
use crate::span::{Span, Spanned};

/// The index reserved for the implicit `Self` type parameter.
pub const SELF_PARAM_INDEX: u16 = 0xFFFF;

/// A built-in primitive type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoreType {
    Bool,
    Char,
    Str,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    F32,
    F64,
}

impl CoreType {
    /// Recognize a primitive type name.
    pub fn from_name(s: &str) -> Option<Self> {
        Some(match s {
            "bool" => Self::Bool,
            "char" => Self::Char,
            "str" => Self::Str,
            "u8" => Self::U8,
            "u16" => Self::U16,
            "u32" => Self::U32,
            "u64" => Self::U64,
            "u128" => Self::U128,
            "usize" => Self::Usize,
            "i8" => Self::I8,
            "i16" => Self::I16,
            "i32" => Self::I32,
            "i64" => Self::I64,
            "i128" => Self::I128,
            "isize" => Self::Isize,
            "f32" => Self::F32,
            "f64" => Self::F64,
            _ => return None,
        })
    }

    /// The type name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Char => "char",
            Self::Str => "str",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::U128 => "u128",
            Self::Usize => "usize",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::I128 => "i128",
            Self::Isize => "isize",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }
}

/// A trait reference with an optional `for<...>` binder, as it appears in
/// trait objects and erased types.
#[derive(Debug, Clone, PartialEq)]
pub struct PolyTraitRef {
    /// The higher-ranked lifetimes bound for this reference.
    pub hrbs: HigherRankedBounds,
    /// The trait path.
    pub path: Path,
}

/// A function pointer type.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionType {
    /// Whether the function is `unsafe`.
    pub is_unsafe: bool,
    /// The ABI, if explicitly given.
    pub abi: Option<Name>,
    /// Argument types.
    pub args: Vec<TypeRef>,
    /// Return type.
    pub ret: Box<TypeRef>,
}

/// The data of a surface type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeData {
    /// A type that failed to construct.
    Invalid,
    /// `_`.
    Infer,
    /// `!`.
    Bang,
    /// A primitive type.
    Primitive(CoreType),
    /// A tuple. The empty tuple is the unit type.
    Tuple(Vec<TypeRef>),
    /// `&T` / `&'a mut T`.
    Borrow {
        /// The lifetime, if given.
        lifetime: Option<LifetimeRef>,
        /// Whether this is a unique borrow.
        is_mut: bool,
        /// The inner type.
        inner: Box<TypeRef>,
    },
    /// `*const T` / `*mut T`.
    Pointer {
        /// Whether this is a mutable pointer.
        is_mut: bool,
        /// The inner type.
        inner: Box<TypeRef>,
    },
    /// `[T; size]`, or `[T]` when no size is given.
    Array {
        /// The element type.
        inner: Box<TypeRef>,
        /// The size expression, absent for slices.
        size: Option<Box<Expr>>,
    },
    /// A path type.
    Path(Path),
    /// `(Trait + Marker + 'a)` or `&Trait`.
    TraitObject {
        /// The traits named by the object.
        traits: Vec<PolyTraitRef>,
        /// The object lifetime, if given.
        lifetime: Option<LifetimeRef>,
    },
    /// `impl Trait`.
    ErasedType {
        /// The bounds of the erased type.
        traits: Vec<PolyTraitRef>,
        /// Lifetime bounds.
        lifetimes: Vec<LifetimeRef>,
    },
    /// A function pointer type.
    Function(FunctionType),
    /// A generic parameter by name and index. The parser only mints this for
    /// `Self`; other parameters are resolved during lowering.
    Generic {
        /// The parameter name.
        name: Ident,
        /// The declaration index, [SELF_PARAM_INDEX] for `Self`.
        index: u16,
    },
}

/// A surface type together with its span.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeRef {
    /// The span of the type.
    pub span: Span,
    /// The data of the type.
    pub data: TypeData,
}

impl TypeRef {
    /// Construct a type.
    pub fn new(span: Span, data: TypeData) -> Self {
        Self { span, data }
    }

    /// The unit type.
    pub fn unit(span: Span) -> Self {
        Self::new(span, TypeData::Tuple(Vec::new()))
    }

    /// The implicit `Self` type.
    pub fn self_type(span: Span) -> Self {
        Self::new(
            span,
            TypeData::Generic {
                name: Ident::new("Self"),
                index: SELF_PARAM_INDEX,
            },
        )
    }

    /// An invalid type.
    pub fn invalid(span: Span) -> Self {
        Self::new(span, TypeData::Invalid)
    }

    /// Test if the type is a plain path.
    pub fn is_path(&self) -> bool {
        matches!(self.data, TypeData::Path(..))
    }

    /// Take the path out of a path type.
    pub fn into_path(self) -> Option<Path> {
        match self.data {
            TypeData::Path(path) => Some(path),
            _ => None,
        }
    }
}

impl Spanned for TypeRef {
    fn span(&self) -> Span {
        self.span
    }
}

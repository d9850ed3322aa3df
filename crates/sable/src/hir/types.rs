use core::fmt;

use crate::hir::expr::ExprPtr;
use crate::hir::path::{GenericPath, Path, SimplePath, TraitPath};
use crate::name::Name;

pub use crate::ast::CoreType;

/// The index reserved for the implicit `Self` type parameter.
pub const SELF_PARAM_INDEX: u16 = 0xFFFF;

/// The flavor of a borrow or pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BorrowKind {
    /// `&` / `*const`.
    Shared,
    /// `&mut` / `*mut`.
    Unique,
    /// `&move`.
    Owned,
}

/// The size of an array type: a known constant, or an expression left for
/// constant evaluation.
#[derive(Debug, Clone)]
pub enum ArraySize {
    /// A known element count.
    Fixed(u64),
    /// An unevaluated size expression.
    Expr(ExprPtr),
}

impl PartialEq for ArraySize {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ArraySize::Fixed(a), ArraySize::Fixed(b)) => a == b,
            _ => false,
        }
    }
}

/// A function pointer type.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionType {
    /// Whether the function is `unsafe`.
    pub is_unsafe: bool,
    /// The ABI.
    pub abi: Name,
    /// The return type.
    pub ret: Box<TypeRef>,
    /// The argument types.
    pub args: Vec<TypeRef>,
}

/// A canonicalized type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    /// The `!` type.
    Diverge,
    /// A type to be inferred.
    Infer,
    /// A primitive type.
    Primitive(CoreType),
    /// A tuple. The empty tuple is unit.
    Tuple(Vec<TypeRef>),
    /// A borrow.
    Borrow {
        /// The borrow class.
        kind: BorrowKind,
        /// The borrowed type.
        inner: Box<TypeRef>,
    },
    /// A raw pointer.
    Pointer {
        /// The pointer class.
        kind: BorrowKind,
        /// The pointee type.
        inner: Box<TypeRef>,
    },
    /// An array type.
    Array {
        /// The element type.
        inner: Box<TypeRef>,
        /// The element count.
        size: ArraySize,
    },
    /// A slice type.
    Slice {
        /// The element type.
        inner: Box<TypeRef>,
    },
    /// A path to a named type.
    Path(Path),
    /// A trait object.
    TraitObject {
        /// The principal (data) trait, if any.
        trait_: Option<TraitPath>,
        /// Marker traits.
        markers: Vec<GenericPath>,
        /// The object lifetime.
        lifetime: Option<Name>,
    },
    /// An erased `impl Trait` type.
    ErasedType {
        /// The defining item; bound by a later pass.
        origin: Path,
        /// The index of this erased type within the defining item.
        index: usize,
        /// The bounds of the erased type.
        traits: Vec<TraitPath>,
        /// The lifetime bound.
        lifetime: Option<Name>,
    },
    /// A function pointer type.
    Function(FunctionType),
    /// A reference to a generic parameter.
    Generic {
        /// The parameter name.
        name: Name,
        /// The declaration index, [SELF_PARAM_INDEX] for `Self`.
        index: u16,
    },
}

impl TypeRef {
    /// The unit type.
    pub fn unit() -> Self {
        TypeRef::Tuple(Vec::new())
    }

    /// The implicit `Self` parameter.
    pub fn self_generic() -> Self {
        TypeRef::Generic {
            name: Name::new("Self"),
            index: SELF_PARAM_INDEX,
        }
    }

    /// Construct a borrow.
    pub fn new_borrow(kind: BorrowKind, inner: TypeRef) -> Self {
        TypeRef::Borrow {
            kind,
            inner: Box::new(inner),
        }
    }

    /// Construct a pointer.
    pub fn new_pointer(kind: BorrowKind, inner: TypeRef) -> Self {
        TypeRef::Pointer {
            kind,
            inner: Box::new(inner),
        }
    }

    /// Construct a slice.
    pub fn new_slice(inner: TypeRef) -> Self {
        TypeRef::Slice {
            inner: Box::new(inner),
        }
    }

    /// Construct an array.
    pub fn new_array(inner: TypeRef, size: ArraySize) -> Self {
        TypeRef::Array {
            inner: Box::new(inner),
            size,
        }
    }

    /// Construct a path type.
    pub fn new_path(path: impl Into<Path>) -> Self {
        TypeRef::Path(path.into())
    }

    /// The path impl-group lookups sort this type under, if any.
    pub fn sort_path(&self) -> Option<&SimplePath> {
        match self {
            TypeRef::Path(Path::Generic(gp)) => Some(&gp.path),
            _ => None,
        }
    }

    /// Test if this is the implicit `Self` parameter.
    pub fn is_self(&self) -> bool {
        matches!(
            self,
            TypeRef::Generic {
                index: SELF_PARAM_INDEX,
                ..
            }
        )
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Diverge => write!(f, "!"),
            TypeRef::Infer => write!(f, "_"),
            TypeRef::Primitive(p) => write!(f, "{}", p.as_str()),
            TypeRef::Tuple(items) => {
                write!(f, "(")?;
                for (n, item) in items.iter().enumerate() {
                    if n > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            TypeRef::Borrow { kind, inner } => match kind {
                BorrowKind::Shared => write!(f, "&{}", inner),
                BorrowKind::Unique => write!(f, "&mut {}", inner),
                BorrowKind::Owned => write!(f, "&move {}", inner),
            },
            TypeRef::Pointer { kind, inner } => match kind {
                BorrowKind::Unique => write!(f, "*mut {}", inner),
                _ => write!(f, "*const {}", inner),
            },
            TypeRef::Array { inner, size } => match size {
                ArraySize::Fixed(n) => write!(f, "[{}; {}]", inner, n),
                ArraySize::Expr(..) => write!(f, "[{}; _]", inner),
            },
            TypeRef::Slice { inner } => write!(f, "[{}]", inner),
            TypeRef::Path(path) => write!(f, "{}", path),
            TypeRef::TraitObject { trait_, .. } => match trait_ {
                Some(t) => write!(f, "({} + ...)", t),
                None => write!(f, "(...)"),
            },
            TypeRef::ErasedType { .. } => write!(f, "impl ..."),
            TypeRef::Function(ft) => write!(f, "fn(...) -> {}", ft.ret),
            TypeRef::Generic { name, .. } => write!(f, "{}", name),
        }
    }
}

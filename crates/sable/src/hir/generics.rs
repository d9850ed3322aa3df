use crate::hir::path::TraitPath;
use crate::hir::types::TypeRef;
use crate::name::Name;

/// A declared type parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeParamDef {
    /// The parameter name.
    pub name: Name,
    /// The default type, if declared.
    pub default: Option<TypeRef>,
    /// Whether the parameter is `Sized`; flipped by `?Sized` bounds.
    pub is_sized: bool,
}

/// A single lowered bound.
#[derive(Debug, Clone, PartialEq)]
pub enum GenericBound {
    /// `'a: 'b`.
    Lifetime {
        /// The constrained lifetime.
        test: Name,
        /// The lifetime it must outlive.
        bound: Name,
    },
    /// `T: 'a`.
    TypeLifetime {
        /// The constrained type.
        ty: TypeRef,
        /// The lifetime it must outlive.
        bound: Name,
    },
    /// `T: Trait`.
    TraitBound {
        /// The constrained type.
        ty: TypeRef,
        /// The trait.
        trait_: TraitPath,
    },
    /// `T = U`.
    TypeEquality {
        /// The left-hand type.
        ty: TypeRef,
        /// The replacement.
        other: TypeRef,
    },
}

/// Lowered generic parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenericParams {
    /// Type parameters, in declaration order.
    pub types: Vec<TypeParamDef>,
    /// Lifetime parameters, in declaration order.
    pub lifetimes: Vec<Name>,
    /// The bounds.
    pub bounds: Vec<GenericBound>,
}

impl GenericParams {
    /// Find the declaration index of a type parameter.
    pub fn find_type(&self, name: Name) -> Option<usize> {
        self.types.iter().position(|t| t.name == name)
    }
}

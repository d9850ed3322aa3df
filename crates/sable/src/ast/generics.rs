use crate::ast::attrs::AttributeList;
use crate::ast::path::Path;
use crate::ast::types::TypeRef;
use crate::lex::Ident;
use crate::span::Span;

/// A reference to a lifetime, like `'a`.
#[derive(Debug, Clone, PartialEq)]
pub struct LifetimeRef {
    /// The name of the lifetime, without the quote.
    pub name: Ident,
}

impl LifetimeRef {
    /// Construct a new lifetime reference.
    pub fn new(name: Ident) -> Self {
        Self { name }
    }

    /// The `'static` lifetime.
    pub fn new_static() -> Self {
        Self {
            name: Ident::new("static"),
        }
    }

    /// Test if this is `'static`.
    pub fn is_static(&self) -> bool {
        self.name.name == "static"
    }
}

/// A declared lifetime parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct LifetimeParam {
    /// The span of the declaration.
    pub span: Span,
    /// Attributes on the parameter.
    pub attrs: AttributeList,
    /// The name of the lifetime.
    pub name: Ident,
}

/// A declared type parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeParam {
    /// The span of the declaration.
    pub span: Span,
    /// Attributes on the parameter.
    pub attrs: AttributeList,
    /// The name of the parameter.
    pub name: Ident,
    /// The default type, if given.
    pub default: Option<TypeRef>,
}

/// A `for<'a, ...>` binder.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HigherRankedBounds {
    /// The lifetimes bound by the binder.
    pub lifetimes: Vec<LifetimeParam>,
}

impl HigherRankedBounds {
    /// Test if the binder is empty.
    pub fn is_empty(&self) -> bool {
        self.lifetimes.is_empty()
    }
}

/// The kind of a single bound.
#[derive(Debug, Clone, PartialEq)]
pub enum GenericBoundKind {
    /// `'a: 'b`.
    Lifetime {
        /// The lifetime being constrained.
        test: LifetimeRef,
        /// The lifetime it must outlive.
        bound: LifetimeRef,
    },
    /// `T: 'a`.
    TypeLifetime {
        /// The constrained type.
        ty: TypeRef,
        /// The lifetime it must outlive.
        bound: LifetimeRef,
    },
    /// `T: Trait`, with optional binders in both positions.
    IsTrait {
        /// The binder applying to the whole `+`-separated list.
        outer_hrbs: HigherRankedBounds,
        /// The constrained type.
        ty: TypeRef,
        /// The binder bound tightly to this trait reference.
        inner_hrbs: HigherRankedBounds,
        /// The trait.
        trait_: Path,
    },
    /// `T: ?Trait`. Only recognized for the `Sized` marker.
    MaybeTrait {
        /// The constrained type.
        ty: TypeRef,
        /// The trait.
        trait_: Path,
    },
    /// `T: !Trait`.
    NotTrait {
        /// The constrained type.
        ty: TypeRef,
        /// The trait.
        trait_: Path,
    },
    /// `T = U`.
    Equality {
        /// The left-hand type.
        ty: TypeRef,
        /// The replacement type.
        other: TypeRef,
    },
}

/// A single bound with its span.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericBound {
    /// The span of the bound.
    pub span: Span,
    /// The kind of the bound.
    pub kind: GenericBoundKind,
}

/// An ordered set of generic parameters plus an unordered set of bounds.
///
/// Bounds written inline on parameters and bounds from `where` clauses end
/// up in the same set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenericParams {
    /// Declared lifetime parameters, in order.
    pub lifetimes: Vec<LifetimeParam>,
    /// Declared type parameters, in order.
    pub types: Vec<TypeParam>,
    /// The collected bounds.
    pub bounds: Vec<GenericBound>,
}

impl GenericParams {
    /// Test if no parameters and no bounds were declared.
    pub fn is_empty(&self) -> bool {
        self.lifetimes.is_empty() && self.types.is_empty() && self.bounds.is_empty()
    }

    /// Add a bound.
    pub fn add_bound(&mut self, bound: GenericBound) {
        self.bounds.push(bound);
    }
}

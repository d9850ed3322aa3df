use core::fmt;
use std::cell::OnceCell;

use crate::hir::types::TypeRef;
use crate::name::Name;

/// A fully resolved item path: a crate name plus components. The empty
/// crate name denotes the current crate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SimplePath {
    /// The crate the path is anchored in.
    pub crate_name: Name,
    /// The path components.
    pub components: Vec<Name>,
}

impl SimplePath {
    /// Construct a new path.
    pub fn new(crate_name: Name, components: Vec<Name>) -> Self {
        Self {
            crate_name,
            components,
        }
    }

    /// The root of the current crate.
    pub fn crate_root() -> Self {
        Self::new(Name::empty(), Vec::new())
    }

    /// Extend the path with one component.
    pub fn child(&self, component: Name) -> Self {
        let mut components = self.components.clone();
        components.push(component);
        Self {
            crate_name: self.crate_name,
            components,
        }
    }

    /// The path without its final component.
    pub fn parent(&self) -> Self {
        let mut components = self.components.clone();
        components.pop();
        Self {
            crate_name: self.crate_name,
            components,
        }
    }

    /// Test if `other` is this path or inside its subtree.
    pub fn contains(&self, other: &SimplePath) -> bool {
        self.crate_name == other.crate_name
            && other.components.len() >= self.components.len()
            && self
                .components
                .iter()
                .zip(&other.components)
                .all(|(a, b)| a == b)
    }
}

impl fmt::Display for SimplePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.crate_name.is_empty() {
            write!(f, "::{:?}", self.crate_name.as_str())?;
        }
        for c in &self.components {
            write!(f, "::{}", c)?;
        }
        if self.crate_name.is_empty() && self.components.is_empty() {
            write!(f, "::")?;
        }
        Ok(())
    }
}

/// Ordered type arguments plus associated-type bindings on a path.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathParams {
    /// The type arguments.
    pub types: Vec<TypeRef>,
    /// The associated-type bindings, in source order.
    pub bindings: Vec<(Name, TypeRef)>,
}

impl PathParams {
    /// Test if no parameters are present.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.bindings.is_empty()
    }
}

/// A path with type parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenericPath {
    /// The resolved path.
    pub path: SimplePath,
    /// The parameters.
    pub params: PathParams,
}

impl GenericPath {
    /// Construct a new generic path.
    pub fn new(path: SimplePath, params: PathParams) -> Self {
        Self { path, params }
    }
}

impl fmt::Display for GenericPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)?;
        if !self.params.is_empty() {
            write!(f, "<...>")?;
        }
        Ok(())
    }
}

/// A trait reference: a generic path plus associated-type bound map and
/// higher-ranked lifetimes.
#[derive(Debug, Clone, Default)]
pub struct TraitPath {
    /// The trait path.
    pub path: GenericPath,
    /// Associated-type equality bounds, `Trait<Item = T>`.
    pub type_bounds: Vec<(Name, TypeRef)>,
    /// Higher-ranked lifetimes bound over the reference.
    pub hrls: Vec<Name>,
    /// Cache binding the reference to its definitive trait, set by the
    /// indexing post-pass. The lowerer leaves this empty.
    pub trait_ref: OnceCell<SimplePath>,
}

impl TraitPath {
    /// Construct a new trait path with empty bounds.
    pub fn new(path: GenericPath) -> Self {
        Self {
            path,
            type_bounds: Vec::new(),
            hrls: Vec::new(),
            trait_ref: OnceCell::new(),
        }
    }
}

// The resolution cache does not take part in equality.
impl PartialEq for TraitPath {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
            && self.type_bounds == other.type_bounds
            && self.hrls == other.hrls
    }
}

impl fmt::Display for TraitPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.path.fmt(f)
    }
}

/// A resolved path in any of its four forms.
#[derive(Debug, Clone, PartialEq)]
pub enum Path {
    /// A plain generic path.
    Generic(GenericPath),
    /// `<Type>::item`, selected from the type's inherent impls.
    UfcsInherent {
        /// The base type.
        ty: Box<TypeRef>,
        /// The selected item.
        item: Name,
        /// Parameters on the item.
        params: PathParams,
    },
    /// `<Type as Trait>::item` with a known trait.
    UfcsKnown {
        /// The base type.
        ty: Box<TypeRef>,
        /// The trait the item is selected through.
        trait_: GenericPath,
        /// The selected item.
        item: Name,
        /// Parameters on the item.
        params: PathParams,
    },
    /// `<Type>::item` before the trait is known.
    UfcsUnknown {
        /// The base type.
        ty: Box<TypeRef>,
        /// The selected item.
        item: Name,
        /// Parameters on the item.
        params: PathParams,
    },
}

impl Path {
    /// The underlying generic path, if this is the `Generic` form.
    pub fn as_generic(&self) -> Option<&GenericPath> {
        match self {
            Path::Generic(gp) => Some(gp),
            _ => None,
        }
    }
}

impl From<GenericPath> for Path {
    fn from(path: GenericPath) -> Self {
        Path::Generic(path)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Path::Generic(gp) => gp.fmt(f),
            Path::UfcsInherent { item, .. } => write!(f, "<_>::{}", item),
            Path::UfcsKnown { trait_, item, .. } => {
                write!(f, "<_ as {}>::{}", trait_, item)
            }
            Path::UfcsUnknown { item, .. } => write!(f, "<_ as ?>::{}", item),
        }
    }
}

use core::fmt;

use crate::ast::generics::LifetimeRef;
use crate::ast::types::TypeRef;
use crate::lex::Ident;
use crate::name::Name;
use crate::span::{bug, Span, Spanned};

/// Parameters attached to a single path node, like `Map<K, V, Item = T>`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathParams {
    /// Lifetime arguments.
    pub lifetimes: Vec<LifetimeRef>,
    /// Type arguments.
    pub types: Vec<TypeRef>,
    /// Associated-type bindings.
    pub bindings: Vec<(Ident, TypeRef)>,
}

impl PathParams {
    /// Test if no parameters are present.
    pub fn is_empty(&self) -> bool {
        self.lifetimes.is_empty() && self.types.is_empty() && self.bindings.is_empty()
    }
}

/// One component of a path.
#[derive(Debug, Clone, PartialEq)]
pub struct PathNode {
    /// The name of the component.
    pub name: Ident,
    /// Parameters attached to the component.
    pub params: PathParams,
}

impl PathNode {
    /// Construct a parameter-less node.
    pub fn new(name: Ident) -> Self {
        Self {
            name,
            params: PathParams::default(),
        }
    }
}

/// The class of a path.
#[derive(Debug, Clone, PartialEq)]
pub enum PathClass {
    /// A path that failed to construct.
    Invalid,
    /// A single unqualified identifier.
    Local(Ident),
    /// A multi-component relative path.
    Relative {
        /// The components.
        nodes: Vec<PathNode>,
    },
    /// A `self::` path.
    Self_ {
        /// The components after `self::`.
        nodes: Vec<PathNode>,
    },
    /// A `super::` path, ascending `count` levels.
    Super {
        /// How many `super` components were given.
        count: usize,
        /// The components after the last `super::`.
        nodes: Vec<PathNode>,
    },
    /// An absolute path. An empty crate name refers to the current crate.
    Absolute {
        /// The crate the path is anchored in.
        crate_name: Name,
        /// The components.
        nodes: Vec<PathNode>,
    },
    /// A UFCS path, `<Type as Trait>::item` or `<Type>::item`.
    Ufcs {
        /// The base type.
        ty: Box<TypeRef>,
        /// The trait the item is selected through, if any.
        trait_: Option<Box<Path>>,
        /// The trailing components.
        nodes: Vec<PathNode>,
    },
}

/// A path in the surface syntax.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    /// The span of the whole path.
    pub span: Span,
    /// The class of the path.
    pub class: PathClass,
}

impl Path {
    /// Construct an absolute path in the given crate.
    pub fn absolute(span: Span, crate_name: Name, nodes: Vec<PathNode>) -> Self {
        Self {
            span,
            class: PathClass::Absolute { crate_name, nodes },
        }
    }

    /// Construct a single-identifier local path.
    pub fn local(span: Span, name: Ident) -> Self {
        Self {
            span,
            class: PathClass::Local(name),
        }
    }

    /// An invalid path.
    pub fn invalid(span: Span) -> Self {
        Self {
            span,
            class: PathClass::Invalid,
        }
    }

    /// Test if the path is valid.
    pub fn is_valid(&self) -> bool {
        !matches!(self.class, PathClass::Invalid)
    }

    /// Access the node list of the path, if its class has one.
    pub fn nodes(&self) -> &[PathNode] {
        match &self.class {
            PathClass::Relative { nodes }
            | PathClass::Self_ { nodes }
            | PathClass::Super { nodes, .. }
            | PathClass::Absolute { nodes, .. }
            | PathClass::Ufcs { nodes, .. } => nodes,
            _ => &[],
        }
    }

    /// Mutable access to the node list of the path.
    pub fn nodes_mut(&mut self) -> &mut Vec<PathNode> {
        let span = self.span;
        let class_dbg = format!("{:?}", self.class);
        match &mut self.class {
            PathClass::Relative { nodes }
            | PathClass::Self_ { nodes }
            | PathClass::Super { nodes, .. }
            | PathClass::Absolute { nodes, .. }
            | PathClass::Ufcs { nodes, .. } => nodes,
            _ => bug!(span, "node access on {} path", class_dbg),
        }
    }

    /// Append a node to the path.
    pub fn push(&mut self, node: PathNode) {
        self.nodes_mut().push(node);
    }

    /// If the path is a single identifier, return it.
    pub fn as_single_name(&self) -> Option<Name> {
        match &self.class {
            PathClass::Local(id) => Some(id.name),
            PathClass::Relative { nodes } if nodes.len() == 1 && nodes[0].params.is_empty() => {
                Some(nodes[0].name.name)
            }
            _ => None,
        }
    }
}

impl Spanned for Path {
    fn span(&self) -> Span {
        self.span
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn nodes(f: &mut fmt::Formatter<'_>, nodes: &[PathNode], mut lead: bool) -> fmt::Result {
            for node in nodes {
                if lead {
                    write!(f, "::")?;
                }
                lead = true;
                write!(f, "{}", node.name)?;
                if !node.params.is_empty() {
                    write!(f, "<...>")?;
                }
            }
            Ok(())
        }

        match &self.class {
            PathClass::Invalid => write!(f, "<invalid>"),
            PathClass::Local(id) => write!(f, "{}", id),
            PathClass::Relative { nodes: n } => nodes(f, n, false),
            PathClass::Self_ { nodes: n } => {
                write!(f, "self")?;
                nodes(f, n, true)
            }
            PathClass::Super { count, nodes: n } => {
                for i in 0..*count {
                    if i > 0 {
                        write!(f, "::")?;
                    }
                    write!(f, "super")?;
                }
                nodes(f, n, true)
            }
            PathClass::Absolute { crate_name, nodes: n } => {
                if !crate_name.is_empty() {
                    write!(f, "::{:?}", crate_name.as_str())?;
                    nodes(f, n, true)
                } else {
                    write!(f, "::")?;
                    nodes(f, n, false)
                }
            }
            PathClass::Ufcs { ty, trait_, nodes: n } => {
                match trait_ {
                    Some(t) => write!(f, "<{:?} as {}>", ty.data, t)?,
                    None => write!(f, "<{:?}>", ty.data)?,
                }
                nodes(f, n, true)
            }
        }
    }
}

use crate::ast::item::MacroInvocation;
use crate::ast::path::Path;
use crate::lex::{FloatClass, Ident, IntClass};
use crate::span::{Span, Spanned};

/// How a pattern binding captures its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindMode {
    /// Capture by move.
    Move,
    /// Capture by shared reference (`ref`).
    Ref,
    /// Capture by unique reference (`ref mut`).
    MutRef,
}

/// A name bound by a pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternBinding {
    /// The bound name.
    pub name: Ident,
    /// The capture mode.
    pub mode: BindMode,
    /// Whether the binding itself is mutable.
    pub is_mut: bool,
}

/// A literal value usable in a value or range pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternValue {
    /// An integer, with the sign applied by the parser.
    Integer {
        /// The magnitude.
        value: u128,
        /// Whether a leading `-` was attached.
        negated: bool,
        /// The numeric-class suffix, if any.
        class: Option<IntClass>,
    },
    /// A float.
    Float {
        /// The value.
        value: f64,
        /// The numeric-class suffix, if any.
        class: Option<FloatClass>,
    },
    /// A character.
    Char(char),
    /// A byte.
    Byte(u8),
    /// A string.
    String(Box<str>),
    /// A byte string.
    ByteString(Box<[u8]>),
    /// A named constant.
    Named(Path),
}

/// The sub-patterns of a tuple-shaped pattern.
///
/// Either `has_rest` is set and both lists may be non-empty, or `has_rest`
/// is unset and `trailing` must be empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TuplePat {
    /// Sub-patterns before the `..` marker.
    pub leading: Vec<Pattern>,
    /// Whether a `..` marker was present.
    pub has_rest: bool,
    /// Sub-patterns after the `..` marker.
    pub trailing: Vec<Pattern>,
}

/// The data of a pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternData {
    /// `_`.
    Any,
    /// A bare identifier that is either a binding or a unit-like constant;
    /// disambiguated during resolution and illegal after it.
    MaybeBind(Ident),
    /// `&pat` / `&mut pat`.
    Ref {
        /// Whether the reference is unique.
        is_mut: bool,
        /// The inner pattern.
        inner: Box<Pattern>,
    },
    /// `box pat`.
    Box_ {
        /// The inner pattern.
        inner: Box<Pattern>,
    },
    /// A tuple pattern.
    Tuple(TuplePat),
    /// A tuple-struct or tuple-variant pattern, `Path(pats...)`.
    StructTuple {
        /// The struct or variant path.
        path: Path,
        /// The sub-patterns.
        pat: TuplePat,
    },
    /// A struct pattern with named fields.
    Struct {
        /// The struct or variant path.
        path: Path,
        /// The named sub-patterns.
        fields: Vec<(Ident, Pattern)>,
        /// Whether the pattern is exhaustive (no `..`).
        is_exhaustive: bool,
    },
    /// A value or range pattern.
    Value {
        /// The value, or the start of the range.
        start: PatternValue,
        /// The end of the range, if this is a range pattern.
        end: Option<PatternValue>,
    },
    /// `[a, b, c]`.
    Slice {
        /// The sub-patterns.
        pats: Vec<Pattern>,
    },
    /// `[a, rest.., b]`.
    SplitSlice {
        /// Sub-patterns before the rest marker.
        leading: Vec<Pattern>,
        /// The binding of the rest, if named.
        rest_bind: Option<PatternBinding>,
        /// Sub-patterns after the rest marker.
        trailing: Vec<Pattern>,
    },
    /// An unexpanded macro invocation in pattern position.
    Macro(Box<MacroInvocation>),
}

/// A pattern, with an optional outer binding (`name @ pat`).
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    /// The span of the pattern.
    pub span: Span,
    /// An outer binding applying to the whole pattern.
    pub binding: Option<PatternBinding>,
    /// The data of the pattern.
    pub data: PatternData,
}

impl Pattern {
    /// Construct a new pattern without an outer binding.
    pub fn new(span: Span, data: PatternData) -> Self {
        Self {
            span,
            binding: None,
            data,
        }
    }

    /// Construct a plain binding pattern for the given name.
    pub fn bind(span: Span, name: Ident) -> Self {
        Self {
            span,
            binding: Some(PatternBinding {
                name,
                mode: BindMode::Move,
                is_mut: false,
            }),
            data: PatternData::Any,
        }
    }

    /// A wildcard pattern.
    pub fn any(span: Span) -> Self {
        Self::new(span, PatternData::Any)
    }
}

impl Spanned for Pattern {
    fn span(&self) -> Span {
        self.span
    }
}

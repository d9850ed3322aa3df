use crate::hir::path::{GenericPath, Path};
use crate::hir::types::{BorrowKind, CoreType};
use crate::name::Name;

/// How a binding captures its value. `MaybeBind` never survives into the
/// HIR; every binding has a definite intent here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindMode {
    /// Capture by move.
    Move,
    /// Capture by shared reference.
    Ref,
    /// Capture by unique reference.
    MutRef,
}

/// A name bound by a pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternBinding {
    /// The bound name.
    pub name: Name,
    /// The capture intent.
    pub mode: BindMode,
    /// Whether the binding is mutable.
    pub is_mut: bool,
}

/// A literal value in a value or range pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternValue {
    /// An integer.
    Integer {
        /// The magnitude.
        value: u128,
        /// Whether the value is negated.
        negated: bool,
        /// The numeric class, if annotated.
        ty: Option<CoreType>,
    },
    /// A float.
    Float {
        /// The value.
        value: f64,
        /// The numeric class, if annotated.
        ty: Option<CoreType>,
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

/// The data of a lowered pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternData {
    /// Matches anything.
    Any,
    /// `box pat`.
    Box_(Box<Pattern>),
    /// A reference pattern.
    Ref {
        /// The borrow class.
        kind: BorrowKind,
        /// The inner pattern.
        inner: Box<Pattern>,
    },
    /// A tuple pattern of known arity.
    Tuple(Vec<Pattern>),
    /// A tuple pattern with a rest marker; arity is resolved by type
    /// checking.
    SplitTuple {
        /// Sub-patterns before the rest.
        leading: Vec<Pattern>,
        /// Sub-patterns after the rest.
        trailing: Vec<Pattern>,
    },
    /// A tuple-struct pattern with a dense sub-pattern vector.
    StructTuple {
        /// The struct path.
        path: GenericPath,
        /// One sub-pattern per field.
        subs: Vec<Pattern>,
    },
    /// A struct pattern.
    Struct {
        /// The struct path.
        path: GenericPath,
        /// The named sub-patterns.
        fields: Vec<(Name, Pattern)>,
        /// Whether every field is named.
        is_exhaustive: bool,
    },
    /// An enum tuple-variant pattern with a dense sub-pattern vector.
    EnumTuple {
        /// The variant path.
        path: GenericPath,
        /// The index of the variant in its enum.
        variant: usize,
        /// One sub-pattern per field.
        subs: Vec<Pattern>,
    },
    /// An enum struct-variant pattern.
    EnumStruct {
        /// The variant path.
        path: GenericPath,
        /// The index of the variant in its enum.
        variant: usize,
        /// The named sub-patterns.
        fields: Vec<(Name, Pattern)>,
        /// Whether every field is named.
        is_exhaustive: bool,
    },
    /// A single value.
    Value {
        /// The matched value.
        value: PatternValue,
    },
    /// An inclusive range.
    Range {
        /// The start of the range.
        start: PatternValue,
        /// The end of the range.
        end: PatternValue,
    },
    /// A fixed-length slice pattern.
    Slice(Vec<Pattern>),
    /// A slice pattern with a rest marker.
    SplitSlice {
        /// Sub-patterns before the rest.
        leading: Vec<Pattern>,
        /// The binding of the rest, if named.
        rest_bind: Option<PatternBinding>,
        /// Sub-patterns after the rest.
        trailing: Vec<Pattern>,
    },
}

/// A lowered pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    /// The outer binding, if any.
    pub binding: Option<PatternBinding>,
    /// The data of the pattern.
    pub data: PatternData,
}

impl Pattern {
    /// A wildcard pattern.
    pub fn any() -> Self {
        Self {
            binding: None,
            data: PatternData::Any,
        }
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Self::any()
    }
}

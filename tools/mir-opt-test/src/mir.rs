//! The fixture-level MIR data model.
//!
//! This mirrors the shape the optimizer consumes; the fixture parser fills
//! it in directly, bypassing the front end's lowering pipeline.

use sable::hir::{BorrowKind, Path, PathParams, TypeRef};
use sable::Name;

/// The root of an lvalue.
#[derive(Debug, Clone, PartialEq)]
pub enum Storage {
    /// The return slot.
    Return,
    /// A local variable.
    Local(usize),
    /// An argument slot.
    Argument(usize),
    /// A static, by path.
    Static(Path),
}

/// One projection applied to an lvalue root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrapper {
    /// `.N` field access.
    Field(usize),
    /// `#N` enum-variant downcast.
    Downcast(usize),
    /// `*` dereference.
    Deref,
}

/// A place: a root plus projections.
#[derive(Debug, Clone, PartialEq)]
pub struct LValue {
    /// The root of the place.
    pub root: Storage,
    /// Projections, applied left to right.
    pub wrappers: Vec<Wrapper>,
}

impl LValue {
    /// Construct a place with no projections.
    pub fn new(root: Storage) -> Self {
        Self {
            root,
            wrappers: Vec::new(),
        }
    }
}

/// A constant literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Bool(bool),
    Int(i128),
    Float(f64),
}

/// An operand: a place or a constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    LValue(LValue),
    Constant(Constant),
}

/// A named binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinOp {
    /// Recognize the operator spelling used in fixtures.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "ADD" => Self::Add,
            "SUB" => Self::Sub,
            "MUL" => Self::Mul,
            "DIV" => Self::Div,
            "REM" => Self::Rem,
            "BIT_AND" => Self::BitAnd,
            "BIT_OR" => Self::BitOr,
            "BIT_XOR" => Self::BitXor,
            "SHL" => Self::Shl,
            "SHR" => Self::Shr,
            "EQ" => Self::Eq,
            "NE" => Self::Ne,
            "LT" => Self::Lt,
            "LE" => Self::Le,
            "GT" => Self::Gt,
            "GE" => Self::Ge,
            _ => return None,
        })
    }
}

/// The right-hand side of an assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum RValue {
    /// Read of a place.
    Use(LValue),
    /// A constant.
    Constant(Constant),
    /// A borrow of a place.
    Borrow {
        /// The borrow class.
        kind: BorrowKind,
        /// The borrowed place.
        val: LValue,
    },
    /// A binary operation.
    BinOp {
        /// The left operand.
        lhs: Param,
        /// The operator.
        op: BinOp,
        /// The right operand.
        rhs: Param,
    },
    /// A tuple constructor.
    Tuple(Vec<Param>),
}

/// A statement inside a block.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `ASSIGN dst = rvalue`.
    Assign {
        /// The destination.
        dst: LValue,
        /// The source.
        src: RValue,
    },
    /// `DROP lv (if flag)?`.
    Drop {
        /// The dropped place.
        slot: LValue,
        /// The guarding drop flag, if any.
        flag: Option<usize>,
    },
}

/// What a call jumps to.
#[derive(Debug, Clone, PartialEq)]
pub enum CallTarget {
    /// An indirect call through a place.
    Value(LValue),
    /// A direct call by path.
    Path(Path),
    /// An intrinsic by name.
    Intrinsic {
        /// The intrinsic name.
        name: Name,
        /// Its type parameters.
        params: PathParams,
    },
}

/// A block terminator. Block references are indices after the final
/// remapping pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
    /// Not yet assigned; invalid in a parsed fixture.
    Incomplete,
    /// `RETURN`.
    Return,
    /// `DIVERGE`.
    Diverge,
    /// `GOTO bb`.
    Goto(usize),
    /// `PANIC bb`.
    Panic {
        /// The landing block.
        dst: usize,
    },
    /// `CALL dst = target(args) => ret else panic`.
    Call {
        /// Where execution resumes on return.
        ret_block: usize,
        /// Where execution resumes on unwind.
        panic_block: usize,
        /// The destination of the return value.
        dst: LValue,
        /// The callee.
        target: CallTarget,
        /// The arguments.
        args: Vec<Param>,
    },
    /// `IF v => a else b`.
    If {
        /// The condition.
        cond: LValue,
        /// The block taken when true.
        bb_true: usize,
        /// The block taken when false.
        bb_false: usize,
    },
    /// `SWITCH v { bb, bb, ... }`.
    Switch {
        /// The matched value.
        val: LValue,
        /// One target per variant.
        targets: Vec<usize>,
    },
}

/// A basic block.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    /// The statements, in order.
    pub statements: Vec<Statement>,
    /// The terminator.
    pub terminator: Terminator,
}

/// A function body in fixture form.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// Argument types, in slot order.
    pub args: Vec<TypeRef>,
    /// The return type.
    pub ret: TypeRef,
    /// Local variable types, in slot order.
    pub locals: Vec<TypeRef>,
    /// Initial values of the drop flags.
    pub drop_flags: Vec<bool>,
    /// The basic blocks.
    pub blocks: Vec<BasicBlock>,
}

impl Default for Function {
    fn default() -> Self {
        Self {
            args: Vec::new(),
            ret: TypeRef::unit(),
            locals: Vec::new(),
            drop_flags: Vec::new(),
            blocks: Vec::new(),
        }
    }
}

//! Macro expansion.
//!
//! [expand_crate] walks the parsed tree and expands the built-in macros in
//! place: `macro_rules!` definitions are captured into [ast::Item::MacroRules]
//! nodes, and `format_args!` invocations in expression position are replaced
//! by their synthesized call trees. Unknown invocations are left in the tree
//! for the driver to judge.

mod cfg;
pub mod format_args;

pub use self::cfg::{CfgOracle, CfgSet};

use crate::ast;
use crate::lex::TtStream;
use crate::name::Name;
use crate::parse::{ParseError, ParseSess, Parser, Result};

/// The path prefix used for standard-library items in macro output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdPrefix {
    /// Freestanding: items live in the current crate.
    None,
    /// `#![no_std]`: items live in `::"core"`.
    Core,
    /// Items live in `::"std"`.
    Std,
}

impl StdPrefix {
    fn of_crate(krate: &ast::Crate) -> Self {
        if krate.attrs.has("no_core") {
            StdPrefix::None
        } else if krate.attrs.has("no_std") {
            StdPrefix::Core
        } else {
            StdPrefix::Std
        }
    }

    pub(crate) fn crate_name(self) -> Option<Name> {
        match self {
            StdPrefix::None => None,
            StdPrefix::Core => Some(Name::new("core")),
            StdPrefix::Std => Some(Name::new("std")),
        }
    }
}

/// Expand built-in macros across the whole crate, in place.
pub fn expand_crate(sess: &mut ParseSess<'_>, krate: &mut ast::Crate) -> Result<()> {
    let prefix = StdPrefix::of_crate(krate);
    let mut root = std::mem::take(&mut krate.root);
    let result = expand_module(sess, prefix, &mut root);
    krate.root = root;
    result
}

fn expand_module(
    sess: &mut ParseSess<'_>,
    prefix: StdPrefix,
    module: &mut ast::Module,
) -> Result<()> {
    for item in &mut module.items {
        // `macro_rules! name { ... }` arrives as a plain invocation and is
        // rewritten into a definition node.
        if let ast::Item::MacroInvocation(inv) = &item.data {
            if inv.name == "macro_rules" {
                let Some(macro_name) = inv.ident else {
                    return Err(ParseError::msg(
                        inv.span,
                        "macro_rules! requires a name",
                    ));
                };

                let def = ast::MacroRulesDef {
                    exported: item.attrs.has("macro_export"),
                    body: inv.input.clone(),
                };

                item.name = Some(crate::lex::Ident::new(macro_name.as_str()));
                item.data = ast::Item::MacroRules(def);
                continue;
            }
        }

        match &mut item.data {
            ast::Item::Module(sub) => expand_module(sess, prefix, sub)?,
            ast::Item::Function(f) => {
                if let Some(code) = &mut f.code {
                    expand_expr(sess, prefix, code)?;
                }
            }
            ast::Item::Static(s) => {
                if let Some(value) = &mut s.value {
                    expand_expr(sess, prefix, value)?;
                }
            }
            ast::Item::Impl(impl_) => {
                for ii in &mut impl_.items {
                    if let ast::Item::Function(f) = &mut ii.data {
                        if let Some(code) = &mut f.code {
                            expand_expr(sess, prefix, code)?;
                        }
                    }
                }
            }
            ast::Item::Trait(t) => {
                for ti in &mut t.items {
                    if let ast::Item::Function(f) = &mut ti.data {
                        if let Some(code) = &mut f.code {
                            expand_expr(sess, prefix, code)?;
                        }
                    }
                }
            }
            _ => {}
        }
    }

    Ok(())
}

/// Expand macros in expression position, splicing results in place.
fn expand_expr(
    sess: &mut ParseSess<'_>,
    prefix: StdPrefix,
    expr: &mut ast::Expr,
) -> Result<()> {
    if let ast::ExprKind::MacroCall(inv) = &expr.kind {
        if inv.name == "format_args" {
            let tokens = format_args::expand_format_args(sess, prefix, inv)?;

            // The expander's output re-enters the parser as a token
            // stream.
            let mut parser = Parser::new(sess, Box::new(TtStream::new(tokens, inv.span)));
            let mut expansion = parser.parse_expr()?;

            expand_expr(sess, prefix, &mut expansion)?;
            *expr = expansion;
            return Ok(());
        }
    }

    match &mut expr.kind {
        ast::ExprKind::Lit(..)
        | ast::ExprKind::Path(..)
        | ast::ExprKind::MacroCall(..) => {}
        ast::ExprKind::Unary { expr, .. } => expand_expr(sess, prefix, expr)?,
        ast::ExprKind::Binary { lhs, rhs, .. }
        | ast::ExprKind::Assign { lhs, rhs } => {
            expand_expr(sess, prefix, lhs)?;
            expand_expr(sess, prefix, rhs)?;
        }
        ast::ExprKind::Call { callee, args } => {
            expand_expr(sess, prefix, callee)?;
            for arg in args {
                expand_expr(sess, prefix, arg)?;
            }
        }
        ast::ExprKind::Field { expr, .. } => expand_expr(sess, prefix, expr)?,
        ast::ExprKind::Index { expr, index } => {
            expand_expr(sess, prefix, expr)?;
            expand_expr(sess, prefix, index)?;
        }
        ast::ExprKind::Tuple(items) | ast::ExprKind::Array(items) => {
            for item in items {
                expand_expr(sess, prefix, item)?;
            }
        }
        ast::ExprKind::Paren(inner)
        | ast::ExprKind::Borrow { expr: inner, .. }
        | ast::ExprKind::Cast { expr: inner, .. } => expand_expr(sess, prefix, inner)?,
        ast::ExprKind::Block(block) => expand_block(sess, prefix, block)?,
        ast::ExprKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            expand_expr(sess, prefix, cond)?;
            expand_block(sess, prefix, then_branch)?;
            if let Some(else_branch) = else_branch {
                expand_expr(sess, prefix, else_branch)?;
            }
        }
        ast::ExprKind::Return(value) => {
            if let Some(value) = value {
                expand_expr(sess, prefix, value)?;
            }
        }
    }

    Ok(())
}

fn expand_block(
    sess: &mut ParseSess<'_>,
    prefix: StdPrefix,
    block: &mut ast::Block,
) -> Result<()> {
    for stmt in &mut block.stmts {
        match stmt {
            ast::Stmt::Let { init, .. } => {
                if let Some(init) = init {
                    expand_expr(sess, prefix, init)?;
                }
            }
            ast::Stmt::Expr(expr) => expand_expr(sess, prefix, expr)?,
        }
    }

    if let Some(tail) = &mut block.tail {
        expand_expr(sess, prefix, tail)?;
    }

    Ok(())
}

//! The fixture-file parser.
//!
//! Reads a sequence of attributed function definitions. Block labels may
//! be referenced before they are defined; references are collected lazily
//! and remapped to real block indices once the function body is complete.

use std::collections::{HashMap, VecDeque};
use std::path::Path as FsPath;

use anyhow::{anyhow, bail, Context, Result};

use sable::hir::{self, BorrowKind, CoreType, TypeRef};
use sable::lex::{Delimiter, Kind, Lexer, Token, TokenSource};
use sable::{Name, Source, SourceId};

use crate::mir;

/// A single `#[test = "template"]` pairing.
#[derive(Debug, Clone, PartialEq)]
pub struct Test {
    /// The function run through the optimizer.
    pub input_function: hir::SimplePath,
    /// The function the optimized output must match.
    pub output_template_function: hir::SimplePath,
}

/// A parsed fixture file.
#[derive(Debug, Default)]
pub struct TestFile {
    /// The file's basename.
    pub filename: String,
    /// The functions defined in the file.
    pub functions: HashMap<Name, mir::Function>,
    /// The test pairings declared via attributes.
    pub tests: Vec<Test>,
}

impl TestFile {
    /// Load and parse a fixture file.
    pub fn load_from_file(path: &FsPath) -> Result<TestFile> {
        let source = Source::from_path(path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        let mut rv = TestFile {
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            ..Default::default()
        };

        let mut lex = Lex::new(Lexer::new(&source, SourceId::EMPTY));

        while lex.lookahead(0)? != Kind::Eof {
            // Attributes: `#[name = "value"]`.
            let mut attrs: Vec<(Name, String)> = Vec::new();
            while lex.consume_if(&Kind::Pound)? {
                lex.expect(&Kind::Open(Delimiter::Bracket))?;
                let name = lex.expect_ident()?;
                lex.expect(&Kind::Eq)?;
                let value = lex.expect_str()?;
                lex.expect(&Kind::Close(Delimiter::Bracket))?;
                attrs.push((name, value));
            }

            if !lex.consume_if(&Kind::Fn)? {
                let token = lex.next()?;
                bail!("expected `fn` at {}, got `{}`", token.span, token.kind);
            }

            let (name, function) = parse_function(&mut lex)?;
            log::debug!("fn {} ({} blocks)", name, function.blocks.len());
            rv.functions.insert(name, function);

            for (attr, value) in attrs {
                if attr == "test" {
                    rv.tests.push(Test {
                        input_function: hir::SimplePath::new(Name::empty(), vec![name]),
                        output_template_function: hir::SimplePath::new(
                            Name::empty(),
                            vec![Name::new(&value)],
                        ),
                    });
                }
            }
        }

        Ok(rv)
    }
}

struct Lex {
    source: Lexer,
    buf: VecDeque<Token>,
}

impl Lex {
    fn new(source: Lexer) -> Self {
        Self {
            source,
            buf: VecDeque::new(),
        }
    }

    fn fill(&mut self, n: usize) -> Result<()> {
        while self.buf.len() < n {
            let token = self
                .source
                .next_token()
                .map_err(|e| anyhow!("lex error: {}", e))?;
            self.buf.push_back(token);
        }
        Ok(())
    }

    fn next(&mut self) -> Result<Token> {
        self.fill(1)?;
        Ok(self.buf.pop_front().expect("buffer filled"))
    }

    fn putback(&mut self, token: Token) {
        self.buf.push_front(token);
    }

    fn lookahead(&mut self, k: usize) -> Result<Kind> {
        self.fill(k + 1)?;
        Ok(self.buf[k].kind.clone())
    }

    fn consume_if(&mut self, kind: &Kind) -> Result<bool> {
        if self.lookahead(0)? == *kind {
            self.next()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: &Kind) -> Result<Token> {
        let token = self.next()?;
        if token.kind == *kind {
            Ok(token)
        } else {
            bail!(
                "expected `{}` at {}, got `{}`",
                kind,
                token.span,
                token.kind
            )
        }
    }

    fn expect_ident(&mut self) -> Result<Name> {
        let token = self.next()?;
        match token.kind {
            Kind::Ident(id) => Ok(id.name),
            _ => bail!("expected ident at {}, got `{}`", token.span, token.kind),
        }
    }

    fn expect_str(&mut self) -> Result<String> {
        let token = self.next()?;
        match token.kind {
            Kind::Str(s) => Ok(s.into_string()),
            _ => bail!("expected string at {}, got `{}`", token.span, token.kind),
        }
    }

    fn expect_int(&mut self) -> Result<u128> {
        let token = self.next()?;
        match token.kind {
            Kind::Int { value, .. } => Ok(value),
            _ => bail!("expected integer at {}, got `{}`", token.span, token.kind),
        }
    }
}

/// Names bound inside one function body.
struct Scope {
    values: HashMap<Name, mir::Storage>,
    drop_flags: HashMap<Name, usize>,
}

/// Lazily interned block labels, resolved after the body is parsed.
#[derive(Default)]
struct BlockLabels {
    lookup: HashMap<Name, usize>,
    names: Vec<Name>,
}

impl BlockLabels {
    fn reference(&mut self, name: Name) -> usize {
        if let Some(&index) = self.lookup.get(&name) {
            return index;
        }
        let index = self.names.len();
        self.names.push(name);
        self.lookup.insert(name, index);
        index
    }
}

fn parse_function(lex: &mut Lex) -> Result<(Name, mir::Function)> {
    let name = lex.expect_ident()?;

    if lex.consume_if(&Kind::Lt)? {
        bail!("generic functions are not supported in fixtures");
    }

    let mut function = mir::Function::default();
    let mut scope = Scope {
        values: HashMap::new(),
        drop_flags: HashMap::new(),
    };
    scope
        .values
        .insert(Name::new("retval"), mir::Storage::Return);

    // Arguments.
    lex.expect(&Kind::Open(Delimiter::Parenthesis))?;
    while lex.lookahead(0)? != Kind::Close(Delimiter::Parenthesis) {
        let arg_name = lex.expect_ident()?;
        lex.expect(&Kind::Colon)?;
        let ty = parse_type(lex)?;

        scope
            .values
            .insert(arg_name, mir::Storage::Argument(function.args.len()));
        function.args.push(ty);

        if !lex.consume_if(&Kind::Comma)? {
            break;
        }
    }
    lex.expect(&Kind::Close(Delimiter::Parenthesis))?;

    if lex.consume_if(&Kind::Arrow)? {
        function.ret = parse_type(lex)?;
    }

    lex.expect(&Kind::Open(Delimiter::Brace))?;

    // Variable list: typed locals and boolean drop flags.
    while lex.consume_if(&Kind::Let)? {
        let var_name = lex.expect_ident()?;

        if lex.consume_if(&Kind::Eq)? {
            let token = lex.next()?;
            let value = match token.kind {
                Kind::True => true,
                Kind::False => false,
                _ => bail!(
                    "expected `true` or `false` at {}, got `{}`",
                    token.span,
                    token.kind
                ),
            };
            lex.expect(&Kind::Semi)?;

            scope
                .drop_flags
                .insert(var_name, function.drop_flags.len());
            function.drop_flags.push(value);
        } else {
            lex.expect(&Kind::Colon)?;
            let ty = parse_type(lex)?;
            lex.expect(&Kind::Semi)?;

            scope
                .values
                .insert(var_name, mir::Storage::Local(function.locals.len()));
            function.locals.push(ty);
        }
    }

    // Basic blocks: `label: { stmts... } TERMINATOR;`.
    let mut labels = BlockLabels::default();
    let mut real_blocks: HashMap<Name, usize> = HashMap::new();

    while lex.lookahead(0)? != Kind::Close(Delimiter::Brace) {
        let label = lex.expect_ident()?;
        real_blocks.insert(label, function.blocks.len());

        lex.expect(&Kind::Colon)?;
        lex.expect(&Kind::Open(Delimiter::Brace))?;

        let mut statements = Vec::new();
        while lex.lookahead(0)? != Kind::Close(Delimiter::Brace) {
            statements.push(parse_statement(lex, &scope)?);
            lex.expect(&Kind::Semi)?;
        }
        lex.expect(&Kind::Close(Delimiter::Brace))?;

        let terminator = parse_terminator(lex, &scope, &mut labels)?;
        lex.expect(&Kind::Semi)?;

        function.blocks.push(mir::BasicBlock {
            statements,
            terminator,
        });
    }
    lex.expect(&Kind::Close(Delimiter::Brace))?;

    // Convert block references into real indices.
    let resolve = |index: usize| -> Result<usize> {
        let label = labels.names[index];
        real_blocks
            .get(&label)
            .copied()
            .ok_or_else(|| anyhow!("undefined block label `{}`", label))
    };

    for block in &mut function.blocks {
        match &mut block.terminator {
            mir::Terminator::Incomplete
            | mir::Terminator::Return
            | mir::Terminator::Diverge => {}
            mir::Terminator::Goto(bb) => *bb = resolve(*bb)?,
            mir::Terminator::Panic { dst } => *dst = resolve(*dst)?,
            mir::Terminator::Call {
                ret_block,
                panic_block,
                ..
            } => {
                *ret_block = resolve(*ret_block)?;
                *panic_block = resolve(*panic_block)?;
            }
            mir::Terminator::If {
                bb_true, bb_false, ..
            } => {
                *bb_true = resolve(*bb_true)?;
                *bb_false = resolve(*bb_false)?;
            }
            mir::Terminator::Switch { targets, .. } => {
                for target in targets {
                    *target = resolve(*target)?;
                }
            }
        }
    }

    Ok((name, function))
}

fn parse_statement(lex: &mut Lex, scope: &Scope) -> Result<mir::Statement> {
    let token = lex.next()?;
    let keyword = match &token.kind {
        Kind::Ident(id) => id.name,
        _ => bail!("expected statement at {}, got `{}`", token.span, token.kind),
    };

    match keyword.as_str() {
        "ASSIGN" => {
            let dst = parse_lvalue(lex, scope)?;
            lex.expect(&Kind::Eq)?;
            let src = parse_rvalue(lex, scope)?;
            Ok(mir::Statement::Assign { dst, src })
        }
        "DROP" => {
            let slot = parse_lvalue(lex, scope)?;
            let flag = if lex.consume_if(&Kind::If)? {
                let flag_name = lex.expect_ident()?;
                let index = scope
                    .drop_flags
                    .get(&flag_name)
                    .copied()
                    .ok_or_else(|| anyhow!("unknown drop flag `{}`", flag_name))?;
                Some(index)
            } else {
                None
            };
            Ok(mir::Statement::Drop { slot, flag })
        }
        other => bail!("unknown statement `{}`", other),
    }
}

fn parse_rvalue(lex: &mut Lex, scope: &Scope) -> Result<mir::RValue> {
    let token = lex.next()?;

    Ok(match token.kind {
        Kind::True => mir::RValue::Constant(mir::Constant::Bool(true)),
        Kind::False => mir::RValue::Constant(mir::Constant::Bool(false)),
        Kind::Plus | Kind::Dash => {
            let negate = token.kind == Kind::Dash;
            let token = lex.next()?;
            match token.kind {
                Kind::Int { value, .. } => {
                    let value = i128::try_from(value)
                        .map_err(|_| anyhow!("integer constant out of range"))?;
                    mir::RValue::Constant(mir::Constant::Int(if negate {
                        -value
                    } else {
                        value
                    }))
                }
                Kind::Float { value, .. } => {
                    mir::RValue::Constant(mir::Constant::Float(if negate {
                        -value
                    } else {
                        value
                    }))
                }
                _ => bail!(
                    "expected number at {}, got `{}`",
                    token.span,
                    token.kind
                ),
            }
        }
        Kind::Int { value, .. } => {
            let value = i128::try_from(value)
                .map_err(|_| anyhow!("integer constant out of range"))?;
            mir::RValue::Constant(mir::Constant::Int(value))
        }
        Kind::Float { value, .. } => mir::RValue::Constant(mir::Constant::Float(value)),
        Kind::Amp => {
            let kind = if lex.consume_if(&Kind::Move)? {
                BorrowKind::Owned
            } else if lex.consume_if(&Kind::Mut)? {
                BorrowKind::Unique
            } else {
                BorrowKind::Shared
            };
            mir::RValue::Borrow {
                kind,
                val: parse_lvalue(lex, scope)?,
            }
        }
        Kind::Ident(id) => {
            // A named operator, or an lvalue.
            if lex.consume_if(&Kind::Open(Delimiter::Parenthesis))? {
                let op = mir::BinOp::from_name(id.name.as_str())
                    .ok_or_else(|| anyhow!("unknown operator `{}`", id.name))?;

                let lhs = parse_param(lex, scope)?;
                lex.expect(&Kind::Comma)?;
                let rhs = parse_param(lex, scope)?;
                lex.expect(&Kind::Close(Delimiter::Parenthesis))?;

                mir::RValue::BinOp { lhs, op, rhs }
            } else {
                lex.putback(token);
                mir::RValue::Use(parse_lvalue(lex, scope)?)
            }
        }
        Kind::ColonColon | Kind::Lt | Kind::LtLt => {
            lex.putback(token);
            mir::RValue::Use(parse_lvalue(lex, scope)?)
        }
        Kind::Open(Delimiter::Parenthesis) => {
            let mut vals = Vec::new();
            while lex.lookahead(0)? != Kind::Close(Delimiter::Parenthesis) {
                vals.push(parse_param(lex, scope)?);
                if !lex.consume_if(&Kind::Comma)? {
                    break;
                }
            }
            lex.expect(&Kind::Close(Delimiter::Parenthesis))?;
            mir::RValue::Tuple(vals)
        }
        other => bail!("expected rvalue at {}, got `{}`", token.span, other),
    })
}

fn parse_param(lex: &mut Lex, scope: &Scope) -> Result<mir::Param> {
    Ok(match lex.lookahead(0)? {
        Kind::True => {
            lex.next()?;
            mir::Param::Constant(mir::Constant::Bool(true))
        }
        Kind::False => {
            lex.next()?;
            mir::Param::Constant(mir::Constant::Bool(false))
        }
        Kind::Int { .. } | Kind::Float { .. } | Kind::Plus | Kind::Dash => {
            match parse_rvalue(lex, scope)? {
                mir::RValue::Constant(c) => mir::Param::Constant(c),
                _ => unreachable!("numeric tokens parse to constants"),
            }
        }
        _ => mir::Param::LValue(parse_lvalue(lex, scope)?),
    })
}

fn parse_lvalue_root(lex: &mut Lex, scope: &Scope) -> Result<mir::Storage> {
    if lex.lookahead(0)? == Kind::ColonColon {
        return Ok(mir::Storage::Static(parse_path(lex)?));
    }

    let name = lex.expect_ident()?;
    scope
        .values
        .get(&name)
        .cloned()
        .ok_or_else(|| anyhow!("unknown value `{}`", name))
}

fn parse_lvalue(lex: &mut Lex, scope: &Scope) -> Result<mir::LValue> {
    let root = parse_lvalue_root(lex, scope)?;
    let mut wrappers = Vec::new();

    loop {
        match lex.lookahead(0)? {
            Kind::Dot => {
                lex.next()?;
                wrappers.push(mir::Wrapper::Field(lex.expect_int()? as usize));
            }
            Kind::Pound => {
                lex.next()?;
                wrappers.push(mir::Wrapper::Downcast(lex.expect_int()? as usize));
            }
            Kind::Star => {
                lex.next()?;
                wrappers.push(mir::Wrapper::Deref);
            }
            _ => break,
        }
    }

    Ok(mir::LValue { root, wrappers })
}

fn parse_terminator(
    lex: &mut Lex,
    scope: &Scope,
    labels: &mut BlockLabels,
) -> Result<mir::Terminator> {
    let keyword = lex.expect_ident()?;

    let mut bb_name = |lex: &mut Lex| -> Result<usize> {
        let label = lex.expect_ident()?;
        Ok(labels.reference(label))
    };

    Ok(match keyword.as_str() {
        "RETURN" => mir::Terminator::Return,
        "DIVERGE" => mir::Terminator::Diverge,
        "GOTO" => mir::Terminator::Goto(bb_name(lex)?),
        "PANIC" => mir::Terminator::Panic { dst: bb_name(lex)? },
        "CALL" => {
            let dst = parse_lvalue(lex, scope)?;
            lex.expect(&Kind::Eq)?;

            let target = match lex.lookahead(0)? {
                Kind::Open(Delimiter::Parenthesis) => {
                    lex.next()?;
                    let value = parse_lvalue(lex, scope)?;
                    lex.expect(&Kind::Close(Delimiter::Parenthesis))?;
                    mir::CallTarget::Value(value)
                }
                Kind::Str(..) => {
                    let name = lex.expect_str()?;
                    let params = parse_path_params(lex)?;
                    mir::CallTarget::Intrinsic {
                        name: Name::new(&name),
                        params,
                    }
                }
                _ => mir::CallTarget::Path(parse_path(lex)?),
            };

            let mut args = Vec::new();
            lex.expect(&Kind::Open(Delimiter::Parenthesis))?;
            while lex.lookahead(0)? != Kind::Close(Delimiter::Parenthesis) {
                args.push(parse_param(lex, scope)?);
                if !lex.consume_if(&Kind::Comma)? {
                    break;
                }
            }
            lex.expect(&Kind::Close(Delimiter::Parenthesis))?;

            lex.expect(&Kind::FatArrow)?;
            let ret_block = bb_name(lex)?;
            lex.expect(&Kind::Else)?;
            let panic_block = bb_name(lex)?;

            mir::Terminator::Call {
                ret_block,
                panic_block,
                dst,
                target,
                args,
            }
        }
        "IF" => {
            let cond = parse_lvalue(lex, scope)?;
            lex.expect(&Kind::FatArrow)?;
            let bb_true = bb_name(lex)?;
            lex.expect(&Kind::Else)?;
            let bb_false = bb_name(lex)?;
            mir::Terminator::If {
                cond,
                bb_true,
                bb_false,
            }
        }
        "SWITCH" => {
            let val = parse_lvalue(lex, scope)?;
            let mut targets = Vec::new();

            lex.expect(&Kind::Open(Delimiter::Brace))?;
            while lex.lookahead(0)? != Kind::Close(Delimiter::Brace) {
                targets.push(bb_name(lex)?);
                if !lex.consume_if(&Kind::Comma)? {
                    break;
                }
            }
            lex.expect(&Kind::Close(Delimiter::Brace))?;

            mir::Terminator::Switch { val, targets }
        }
        other => bail!("unknown terminator `{}`", other),
    })
}

fn parse_path_params(lex: &mut Lex) -> Result<hir::PathParams> {
    let mut params = hir::PathParams::default();

    if lex.consume_if(&Kind::Lt)? {
        while lex.lookahead(0)? != Kind::Gt {
            params.types.push(parse_type(lex)?);
            if !lex.consume_if(&Kind::Comma)? {
                break;
            }
        }
        lex.expect(&Kind::Gt)?;
    }

    Ok(params)
}

fn parse_path(lex: &mut Lex) -> Result<hir::Path> {
    lex.expect(&Kind::ColonColon)?;
    let crate_name = lex.expect_str()?;

    let mut components = Vec::new();
    while lex.consume_if(&Kind::ColonColon)? {
        components.push(lex.expect_ident()?);
    }

    let path = hir::SimplePath::new(Name::new(&crate_name), components);
    let params = parse_path_params(lex)?;

    Ok(hir::Path::Generic(hir::GenericPath::new(path, params)))
}

fn parse_type(lex: &mut Lex) -> Result<TypeRef> {
    let token = lex.next()?;

    Ok(match token.kind {
        Kind::Open(Delimiter::Parenthesis) => {
            let mut items = Vec::new();
            while lex.lookahead(0)? != Kind::Close(Delimiter::Parenthesis) {
                items.push(parse_type(lex)?);
                if !lex.consume_if(&Kind::Comma)? {
                    break;
                }
            }
            lex.expect(&Kind::Close(Delimiter::Parenthesis))?;
            TypeRef::Tuple(items)
        }
        Kind::Ident(id) => match CoreType::from_name(id.name.as_str()) {
            Some(core) => TypeRef::Primitive(core),
            None => bail!("unknown type `{}` at {}", id.name, token.span),
        },
        Kind::AmpAmp => {
            // Split into two borrow levels.
            lex.putback(Token::new(Kind::Amp, token.span));
            TypeRef::new_borrow(BorrowKind::Shared, parse_type(lex)?)
        }
        Kind::Amp => {
            let kind = if lex.consume_if(&Kind::Move)? {
                BorrowKind::Owned
            } else if lex.consume_if(&Kind::Mut)? {
                BorrowKind::Unique
            } else {
                BorrowKind::Shared
            };
            TypeRef::new_borrow(kind, parse_type(lex)?)
        }
        other => bail!("expected type at {}, got `{}`", token.span, other),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse_fixture(text: &str) -> TestFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(text.as_bytes()).expect("write fixture");
        TestFile::load_from_file(file.path()).expect("parse fixture")
    }

    #[test]
    fn simple_function() {
        let file = parse_fixture(
            r#"
            #[test="ident_exp"]
            fn ident(a: i32) -> i32 {
                let v: i32;
                entry: {
                    ASSIGN v = a;
                    ASSIGN retval = v;
                } RETURN;
            }
            fn ident_exp(a: i32) -> i32 {
                entry: {
                    ASSIGN retval = a;
                } RETURN;
            }
            "#,
        );

        assert_eq!(file.functions.len(), 2);
        assert_eq!(file.tests.len(), 1);
        assert_eq!(
            file.tests[0].input_function,
            hir::SimplePath::new(Name::empty(), vec![Name::new("ident")])
        );

        let f = &file.functions[&Name::new("ident")];
        assert_eq!(f.args, vec![TypeRef::Primitive(CoreType::I32)]);
        assert_eq!(f.locals.len(), 1);
        assert_eq!(f.blocks.len(), 1);
        assert_eq!(f.blocks[0].statements.len(), 2);
        assert_eq!(f.blocks[0].terminator, mir::Terminator::Return);
    }

    #[test]
    fn forward_block_references() {
        let file = parse_fixture(
            r#"
            fn loops(flag: bool) {
                start: {
                } GOTO second;
                second: {
                } IF flag => start else done;
                done: {
                } RETURN;
            }
            "#,
        );

        let f = &file.functions[&Name::new("loops")];
        assert_eq!(f.blocks[0].terminator, mir::Terminator::Goto(1));
        assert_eq!(
            f.blocks[1].terminator,
            mir::Terminator::If {
                cond: mir::LValue::new(mir::Storage::Argument(0)),
                bb_true: 0,
                bb_false: 2,
            }
        );
    }

    #[test]
    fn statements_and_rvalues() {
        let file = parse_fixture(
            r#"
            fn ops(a: usize, b: usize) -> usize {
                let t: (usize, usize);
                let flag = true;
                entry: {
                    ASSIGN t = (a, b);
                    ASSIGN retval = ADD(t.0, t.1);
                    DROP t if flag;
                } RETURN;
            }
            "#,
        );

        let f = &file.functions[&Name::new("ops")];
        assert_eq!(f.drop_flags, vec![true]);

        let stmts = &f.blocks[0].statements;
        assert!(matches!(&stmts[0], mir::Statement::Assign {
            src: mir::RValue::Tuple(vals),
            ..
        } if vals.len() == 2));
        assert!(matches!(&stmts[1], mir::Statement::Assign {
            src: mir::RValue::BinOp {
                op: mir::BinOp::Add,
                ..
            },
            ..
        }));
        assert!(matches!(&stmts[2], mir::Statement::Drop {
            flag: Some(0),
            ..
        }));
    }

    #[test]
    fn call_terminator() {
        let file = parse_fixture(
            r#"
            fn calls(a: i32) -> i32 {
                entry: {
                } CALL retval = ::"other"::helper(a, 1) => done else panic_bb;
                done: {
                } RETURN;
                panic_bb: {
                } DIVERGE;
            }
            "#,
        );

        let f = &file.functions[&Name::new("calls")];
        match &f.blocks[0].terminator {
            mir::Terminator::Call {
                ret_block,
                panic_block,
                target,
                args,
                ..
            } => {
                assert_eq!(*ret_block, 1);
                assert_eq!(*panic_block, 2);
                assert_eq!(args.len(), 2);
                assert!(matches!(target, mir::CallTarget::Path(..)));
            }
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn borrows_and_statics() {
        let file = parse_fixture(
            r#"
            fn borrows(a: i32) {
                let r: &i32;
                let m: &mut i32;
                entry: {
                    ASSIGN r = &a;
                    ASSIGN m = &mut a;
                    ASSIGN r = &::"other"::GLOBAL;
                } RETURN;
            }
            "#,
        );

        let f = &file.functions[&Name::new("borrows")];
        assert_eq!(
            f.locals[0],
            TypeRef::new_borrow(BorrowKind::Shared, TypeRef::Primitive(CoreType::I32))
        );

        let stmts = &f.blocks[0].statements;
        assert!(matches!(&stmts[1], mir::Statement::Assign {
            src: mir::RValue::Borrow {
                kind: BorrowKind::Unique,
                ..
            },
            ..
        }));
        assert!(matches!(&stmts[2], mir::Statement::Assign {
            src: mir::RValue::Borrow {
                val: mir::LValue {
                    root: mir::Storage::Static(..),
                    ..
                },
                ..
            },
            ..
        }));
    }

    #[test]
    fn switch_terminator() {
        let file = parse_fixture(
            r#"
            fn switches(v: u8) {
                entry: {
                } SWITCH v { a, b, a };
                a: {
                } RETURN;
                b: {
                } RETURN;
            }
            "#,
        );

        let f = &file.functions[&Name::new("switches")];
        assert_eq!(
            f.blocks[0].terminator,
            mir::Terminator::Switch {
                val: mir::LValue::new(mir::Storage::Argument(0)),
                targets: vec![1, 2, 1],
            }
        );
    }
}

//! The parser.
//!
//! [Parser] consumes any [TokenSource] (the lexer for source files, a
//! [TtStream][crate::lex::TtStream] for macro expansion output) and builds
//! the surface AST. Parsing a crate recursively loads submodule files
//! through the session's [SourceLoader][crate::source::SourceLoader].

mod attr;
mod error;
mod expr;
mod generics;
mod item;
mod module;
mod path;
mod pattern;
mod ty;

pub use self::error::{ParseError, ParseErrorKind, Result};
pub use self::path::PathGenericMode;

use std::collections::VecDeque;
use std::path::Path as FsPath;

use crate::ast;
use crate::expand::CfgOracle;
use crate::lex::{Kind, Lexer, Token, TokenSource};
use crate::name::Name;
use crate::source::{SourceLoader, Sources};
use crate::span::Span;

/// Shared parsing state: the source registry, the file loader, and the
/// configuration oracle.
pub struct ParseSess<'a> {
    /// The registry of all loaded sources.
    pub sources: &'a mut Sources,
    /// The loader used to resolve `mod name;` declarations.
    pub loader: &'a mut dyn SourceLoader,
    /// The `cfg` oracle.
    pub cfg: &'a dyn CfgOracle,
}

/// An in-progress span, opened with [Parser::start_span].
#[derive(Debug, Clone, Copy)]
pub struct ProtoSpan {
    start: Span,
}

/// The parser.
pub struct Parser<'s, 'a> {
    sess: &'s mut ParseSess<'a>,
    source: Box<dyn TokenSource>,
    buffer: VecDeque<Token>,
    last_span: Span,
}

impl<'s, 'a> Parser<'s, 'a> {
    /// Construct a parser over the given token source.
    pub fn new(sess: &'s mut ParseSess<'a>, source: Box<dyn TokenSource>) -> Self {
        Self {
            sess,
            source,
            buffer: VecDeque::new(),
            last_span: Span::empty(),
        }
    }

    pub(crate) fn sess(&mut self) -> &mut ParseSess<'a> {
        self.sess
    }

    pub(crate) fn cfg(&self) -> &'a dyn CfgOracle {
        self.sess.cfg
    }

    fn fill(&mut self, n: usize) -> Result<()> {
        while self.buffer.len() < n {
            let token = self.source.next_token()?;
            self.buffer.push_back(token);
        }
        Ok(())
    }

    /// Consume and return the next token.
    pub fn next(&mut self) -> Result<Token> {
        self.fill(1)?;
        let token = self.buffer.pop_front().expect("buffer filled");
        if token.kind != Kind::Eof {
            self.last_span = token.span;
        }
        Ok(token)
    }

    /// Put a single token back in front of the stream.
    pub fn putback(&mut self, token: Token) {
        self.buffer.push_front(token);
    }

    /// Peek at the kind of the `k`-th upcoming token, `k <= 2`.
    pub fn lookahead(&mut self, k: usize) -> Result<Kind> {
        debug_assert!(k <= 2, "parser only looks ahead up to two tokens");
        self.fill(k + 1)?;
        Ok(self.buffer[k].kind.clone())
    }

    /// Peek at the span of the next token.
    pub fn peek_span(&mut self) -> Result<Span> {
        self.fill(1)?;
        Ok(self.buffer[0].span)
    }

    /// The span of the most recently consumed token.
    pub fn last_span(&self) -> Span {
        self.last_span
    }

    /// A zero-width span at the next token, for errors and synthesized
    /// nodes.
    pub fn point_span(&mut self) -> Span {
        self.peek_span().unwrap_or(self.last_span)
    }

    /// Open a span at the position `next` will next return from.
    pub fn start_span(&mut self) -> ProtoSpan {
        let start = self.peek_span().unwrap_or(self.last_span);
        ProtoSpan { start }
    }

    /// Close a span at the position `next` last returned from.
    pub fn end_span(&mut self, proto: ProtoSpan) -> Span {
        proto.start.join(self.last_span)
    }

    /// Open a hygiene scope on the underlying token source.
    pub fn push_hygiene(&mut self) {
        self.source.push_hygiene();
    }

    /// Close the innermost hygiene scope.
    pub fn pop_hygiene(&mut self) {
        self.source.pop_hygiene();
    }

    /// Consume the next token if it is the given payload-free kind.
    pub fn eat(&mut self, kind: &Kind) -> Result<bool> {
        if self.lookahead(0)? == *kind {
            self.next()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Consume the next token, requiring the given payload-free kind.
    pub fn expect(&mut self, kind: &Kind) -> Result<Token> {
        let token = self.next()?;
        if token.kind == *kind {
            Ok(token)
        } else {
            Err(Self::unexpected(&token, &[kind.description()]))
        }
    }

    /// Consume the next token, requiring an identifier.
    pub fn expect_ident(&mut self) -> Result<(crate::lex::Ident, Span)> {
        let token = self.next()?;
        match token.kind {
            Kind::Ident(id) => Ok((id, token.span)),
            _ => Err(Self::unexpected(&token, &["ident"])),
        }
    }

    /// Consume the next token if it is a lifetime, returning its
    /// identifier.
    pub fn eat_lifetime(&mut self) -> Result<Option<crate::lex::Ident>> {
        if let Kind::Lifetime(id) = self.lookahead(0)? {
            self.next()?;
            return Ok(Some(id));
        }
        Ok(None)
    }

    /// Consume the next token, requiring a lifetime.
    pub fn expect_lifetime(&mut self) -> Result<crate::lex::Ident> {
        let token = self.next()?;
        match token.kind {
            Kind::Lifetime(id) => Ok(id),
            _ => Err(Self::unexpected(&token, &["lifetime"])),
        }
    }

    /// Consume the next token, requiring a string literal.
    pub fn expect_str(&mut self) -> Result<(Box<str>, Span)> {
        let token = self.next()?;
        match token.kind {
            Kind::Str(s) => Ok((s, token.span)),
            _ => Err(Self::unexpected(&token, &["string"])),
        }
    }

    /// Consume a `>`, splitting composite operators so that `Vec<Vec<T>>`
    /// closes both lists.
    pub fn expect_gt(&mut self) -> Result<()> {
        let token = self.next()?;
        let span = token.span;
        let rest = Span::new(span.source, span.start as usize + 1, span.end as usize);

        match token.kind {
            Kind::Gt => Ok(()),
            Kind::GtGt => {
                self.putback(Token::new(Kind::Gt, rest));
                Ok(())
            }
            Kind::GtEq => {
                self.putback(Token::new(Kind::Eq, rest));
                Ok(())
            }
            Kind::GtGtEq => {
                self.putback(Token::new(Kind::GtEq, rest));
                Ok(())
            }
            _ => Err(Self::unexpected(&token, &[">"])),
        }
    }

    /// Consume a `<`, splitting `<<`.
    pub fn eat_lt(&mut self) -> Result<bool> {
        match self.lookahead(0)? {
            Kind::Lt => {
                self.next()?;
                Ok(true)
            }
            Kind::LtLt => {
                let token = self.next()?;
                let span = token.span;
                let rest = Span::new(span.source, span.start as usize + 1, span.end as usize);
                self.putback(Token::new(Kind::Lt, rest));
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Consume a `&`, splitting `&&`.
    pub fn eat_amp(&mut self) -> Result<bool> {
        match self.lookahead(0)? {
            Kind::Amp => {
                self.next()?;
                Ok(true)
            }
            Kind::AmpAmp => {
                let token = self.next()?;
                let span = token.span;
                let rest = Span::new(span.source, span.start as usize + 1, span.end as usize);
                self.putback(Token::new(Kind::Amp, rest));
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Build an `Unexpected` error for the given token.
    pub fn unexpected(token: &Token, expected: &[&str]) -> ParseError {
        ParseError::new(
            token.span,
            ParseErrorKind::Unexpected {
                actual: token.kind.description().into(),
                expected: expected.join(" or ").into_boxed_str(),
            },
        )
    }
}

/// Parse a crate from the named root file.
///
/// Reads the file through the session's loader, parses the root module, and
/// recursively loads `mod name;` files per the module-resolution rules. The
/// root file controls its directory.
pub fn parse_crate(
    sess: &mut ParseSess<'_>,
    path: &FsPath,
    crate_name: Name,
) -> Result<ast::Crate> {
    log::debug!("parsing crate `{}` from {}", crate_name, path.display());

    let source = sess
        .loader
        .load(path)
        .map_err(|e| ParseError::new(Span::empty(), ParseErrorKind::SourceError {
            path: e.path,
            error: e.error,
        }))?;
    let id = sess.sources.insert(source);
    let lexer = Lexer::new(sess.sources.get(id).expect("just inserted"), id);

    let file = ast::FileInfo {
        path: path.to_owned(),
        controls_dir: true,
    };

    parse_crate_tokens(sess, Box::new(lexer), file, crate_name)
}

/// Parse a crate from an already-registered source, used for stdin (path
/// `-`, which disables out-of-line module loading) and for tests.
pub fn parse_crate_source(
    sess: &mut ParseSess<'_>,
    id: crate::span::SourceId,
    file: ast::FileInfo,
    crate_name: Name,
) -> Result<ast::Crate> {
    let lexer = Lexer::new(
        sess.sources.get(id).expect("registered source"),
        id,
    );
    parse_crate_tokens(sess, Box::new(lexer), file, crate_name)
}

fn parse_crate_tokens(
    sess: &mut ParseSess<'_>,
    source: Box<dyn TokenSource>,
    file: ast::FileInfo,
    crate_name: Name,
) -> Result<ast::Crate> {
    let mut parser = Parser::new(sess, source);

    let mut attrs = ast::AttributeList::new();
    parser.parse_parent_attrs(&mut attrs)?;

    let mut root = ast::Module::new(file);
    parser.parse_mod_items(&mut root, &[])?;

    let token = parser.next()?;
    if token.kind != Kind::Eof {
        return Err(Parser::unexpected(&token, &["end of input"]));
    }

    Ok(ast::Crate {
        name: crate_name,
        root,
        attrs,
        test_harness: false,
    })
}

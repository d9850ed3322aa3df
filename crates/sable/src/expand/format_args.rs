//! The `format_args!` expander.
//!
//! Parses the formatting DSL inside the macro's string literal into a
//! sequence of fragments, then synthesizes a token tree invoking the
//! runtime formatting constructors. The output is reparsed as an
//! expression, so this module both produces and consumes tokens.

use std::collections::HashMap;

use crate::ast;
use crate::expand::StdPrefix;
use crate::lex::{Delimiter, Interpolated, Kind, Token, TokenStream, TtStream};
use crate::parse::{ParseError, ParseErrorKind, ParseSess, Parser, Result};
use crate::span::Span;

/// The formatting trait a fragment selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatTrait {
    Display,
    Debug,
    Binary,
    Octal,
    LowerHex,
    UpperHex,
    Pointer,
    LowerExp,
    UpperExp,
}

impl FormatTrait {
    /// The name of the trait in the formatting module.
    pub fn name(self) -> &'static str {
        match self {
            Self::Display => "Display",
            Self::Debug => "Debug",
            Self::Binary => "Binary",
            Self::Octal => "Octal",
            Self::LowerHex => "LowerHex",
            Self::UpperHex => "UpperHex",
            Self::Pointer => "Pointer",
            Self::LowerExp => "LowerExp",
            Self::UpperExp => "UpperExp",
        }
    }
}

/// Alignment inside the padded width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Unspec,
    Left,
    Center,
    Right,
}

/// Explicit sign handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sign {
    #[default]
    Unspec,
    Plus,
    Minus,
}

/// A width or precision: a literal count, or a count taken from an
/// argument (by its resolved index).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Count {
    Literal(usize),
    Arg(usize),
}

/// The options of one fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FmtOptions {
    /// Alignment within the width.
    pub align: Align,
    /// The fill character; a space when unspecified.
    pub fill: Option<char>,
    /// Sign handling.
    pub sign: Sign,
    /// The `#` flag.
    pub alternate: bool,
    /// The `0` flag.
    pub zero_pad: bool,
    /// The minimum width.
    pub width: Option<Count>,
    /// The precision.
    pub precision: Option<Count>,
}

impl FmtOptions {
    fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// One formatting fragment: the literal text preceding a `{...}` and its
/// decoded contents. Argument indices address the concatenation
/// `named ++ free`.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// Literal text preceding the fragment.
    pub leading_text: String,
    /// The resolved argument index.
    pub arg_index: usize,
    /// The trait used for formatting.
    pub trait_: FormatTrait,
    /// The options.
    pub options: FmtOptions,
}

/// An argument reference as written, before index resolution.
#[derive(Debug, Clone, PartialEq)]
enum ArgRef {
    /// No reference: take the next free argument.
    Next,
    /// A positional reference into the free arguments.
    Index(usize),
    /// A named reference.
    Named(String),
}

#[derive(Debug)]
struct RawFragment {
    leading_text: String,
    arg: ArgRef,
    trait_: FormatTrait,
    options: FmtOptions,
    /// A `.*` precision, which consumes one free argument before the
    /// fragment's own slot.
    prec_star: bool,
    /// Raw positional references for `width$` and `prec$`.
    width_arg: Option<usize>,
    prec_arg: Option<usize>,
}

struct Cur<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Cur<'a> {
    fn new(s: &'a str) -> Self {
        Self {
            chars: s.chars().peekable(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        self.chars.next()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn number(&mut self) -> Option<usize> {
        let mut value: usize = 0;
        let mut any = false;
        while let Some(c) = self.peek() {
            match c.to_digit(10) {
                Some(d) => {
                    any = true;
                    value = value * 10 + d as usize;
                    self.bump();
                }
                None => break,
            }
        }
        any.then_some(value)
    }
}

/// Parse a format string into fragments plus the trailing literal text.
///
/// `named` maps named arguments to their indices and `n_free` is the
/// number of positional arguments; fragment indices come back resolved
/// into the concatenation `named ++ free`. Resolution runs as a second
/// pass so that a `.*` precision can consume its free argument ahead of
/// the fragment's own.
pub fn parse_format_string(
    span: Span,
    format_string: &str,
    named: &HashMap<String, usize>,
    n_free: usize,
) -> Result<(Vec<Fragment>, String)> {
    let raw = parse_fragments(span, format_string)?;
    resolve_indices(span, raw, named, n_free)
}

fn parse_fragments(span: Span, format_string: &str) -> Result<(Vec<RawFragment>, String)> {
    let mut cur = Cur::new(format_string);
    let mut frags = Vec::new();
    let mut literal = String::new();

    while let Some(c) = cur.bump() {
        if c != '{' {
            if c == '}' {
                // `}}` escapes to a single brace; a lone `}` passes
                // through.
                cur.eat('}');
            }
            literal.push(c);
            continue;
        }

        if cur.eat('{') {
            literal.push('{');
            continue;
        }

        let arg = match cur.peek() {
            Some(c) if c.is_ascii_digit() => {
                ArgRef::Index(cur.number().expect("digit present"))
            }
            Some(c) if unicode_ident::is_xid_start(c) || c == '_' => {
                let mut name = String::new();
                while let Some(c) = cur.peek() {
                    if unicode_ident::is_xid_continue(c) {
                        name.push(c);
                        cur.bump();
                    } else {
                        break;
                    }
                }
                ArgRef::Named(name)
            }
            _ => ArgRef::Next,
        };

        let mut options = FmtOptions::default();
        let mut prec_star = false;
        let mut width_arg = None;
        let mut prec_arg = None;
        let trait_;

        if cur.eat(':') {
            // Fill is any character directly followed by an alignment.
            let mut peeked = cur.chars.clone();
            peeked.next();
            if matches!(peeked.next(), Some('<') | Some('^') | Some('>')) {
                options.fill = cur.bump();
            }

            if cur.eat('<') {
                options.align = Align::Left;
            } else if cur.eat('^') {
                options.align = Align::Center;
            } else if cur.eat('>') {
                options.align = Align::Right;
            }

            if cur.eat('+') {
                options.sign = Sign::Plus;
            } else if cur.eat('-') {
                options.sign = Sign::Minus;
            }

            if cur.eat('#') {
                options.alternate = true;
            }

            if cur.eat('0') {
                options.zero_pad = true;
            }

            if let Some(value) = cur.number() {
                if cur.eat('$') {
                    width_arg = Some(value);
                } else {
                    options.width = Some(Count::Literal(value));
                }
            }

            if cur.eat('.') {
                if cur.eat('*') {
                    prec_star = true;
                } else if let Some(value) = cur.number() {
                    if cur.eat('$') {
                        prec_arg = Some(value);
                    } else {
                        options.precision = Some(Count::Literal(value));
                    }
                } else {
                    return Err(ParseError::new(
                        span,
                        ParseErrorKind::FormatUnexpectedEnd,
                    ));
                }
            }

            trait_ = match cur.bump() {
                Some('}') => FormatTrait::Display,
                Some(c) => {
                    let t = match c {
                        '?' => FormatTrait::Debug,
                        'b' => FormatTrait::Binary,
                        'o' => FormatTrait::Octal,
                        'x' => FormatTrait::LowerHex,
                        'X' => FormatTrait::UpperHex,
                        'p' => FormatTrait::Pointer,
                        'e' => FormatTrait::LowerExp,
                        'E' => FormatTrait::UpperExp,
                        other => {
                            return Err(ParseError::new(
                                span,
                                ParseErrorKind::FormatUnknownType { c: other },
                            ));
                        }
                    };
                    if cur.bump() != Some('}') {
                        return Err(ParseError::new(
                            span,
                            ParseErrorKind::FormatUnknownType { c },
                        ));
                    }
                    t
                }
                None => {
                    return Err(ParseError::new(
                        span,
                        ParseErrorKind::FormatUnexpectedEnd,
                    ));
                }
            };
        } else {
            match cur.bump() {
                Some('}') => trait_ = FormatTrait::Display,
                Some(c) => {
                    return Err(ParseError::new(span, ParseErrorKind::FormatMalformed {
                        c,
                    }));
                }
                None => {
                    return Err(ParseError::new(
                        span,
                        ParseErrorKind::FormatUnexpectedEnd,
                    ));
                }
            }
        }

        frags.push(RawFragment {
            leading_text: std::mem::take(&mut literal),
            arg,
            trait_,
            options,
            prec_star,
            width_arg,
            prec_arg,
        });
    }

    Ok((frags, literal))
}

/// The second pass: number every argument reference into the
/// concatenation `named ++ free`.
fn resolve_indices(
    span: Span,
    raw: (Vec<RawFragment>, String),
    named: &HashMap<String, usize>,
    n_free: usize,
) -> Result<(Vec<Fragment>, String)> {
    let (raw_frags, tail) = raw;
    let n_named = named.len();
    let mut next_free = 0usize;

    let positional = |index: usize| -> Result<usize> {
        if index >= n_free {
            return Err(ParseError::new(span, ParseErrorKind::FormatBadPositional {
                index,
            }));
        }
        Ok(n_named + index)
    };

    let mut frags = Vec::with_capacity(raw_frags.len());

    for mut frag in raw_frags {
        // A `.*` precision draws from the free pool before the fragment's
        // own slot.
        if frag.prec_star {
            if next_free == n_free {
                return Err(ParseError::new(span, ParseErrorKind::FormatNotEnoughArgs {
                    expected: n_free + 1,
                }));
            }
            frag.options.precision = Some(Count::Arg(n_named + next_free));
            next_free += 1;
        }

        if let Some(index) = frag.width_arg {
            frag.options.width = Some(Count::Arg(positional(index)?));
        }
        if let Some(index) = frag.prec_arg {
            frag.options.precision = Some(Count::Arg(positional(index)?));
        }

        let arg_index = match &frag.arg {
            ArgRef::Named(name) => match named.get(name.as_str()) {
                Some(index) => *index,
                None => {
                    return Err(ParseError::new(
                        span,
                        ParseErrorKind::FormatUnknownNamed {
                            name: name.clone().into_boxed_str(),
                        },
                    ));
                }
            },
            ArgRef::Index(index) => positional(*index)?,
            ArgRef::Next => {
                if next_free == n_free {
                    return Err(ParseError::new(
                        span,
                        ParseErrorKind::FormatNotEnoughArgs {
                            expected: n_free + 1,
                        },
                    ));
                }
                let index = n_named + next_free;
                next_free += 1;
                index
            }
        };

        frags.push(Fragment {
            leading_text: frag.leading_text,
            arg_index,
            trait_: frag.trait_,
            options: frag.options,
        });
    }

    Ok((frags, tail))
}

struct TokenBuilder {
    tokens: Vec<Token>,
    span: Span,
    prefix: StdPrefix,
}

impl TokenBuilder {
    fn push(&mut self, kind: Kind) {
        self.tokens.push(Token::new(kind, self.span));
    }

    /// Append `::<crate>::seg::seg...` naming a standard-library item.
    fn push_path(&mut self, segments: &[&str]) {
        if let Some(crate_name) = self.prefix.crate_name() {
            self.push(Kind::ColonColon);
            self.push(Kind::Str(crate_name.as_str().into()));
        }

        let mut first = self.prefix == StdPrefix::None;
        for seg in segments {
            if !first {
                self.push(Kind::ColonColon);
            }
            first = false;
            self.push(Kind::Ident(crate::lex::Ident::new(*seg)));
        }
    }

    fn push_usize(&mut self, value: usize) {
        self.push(Kind::Int {
            value: value as u128,
            class: None,
        });
    }

    fn push_expr(&mut self, expr: &ast::Expr) {
        self.push(Kind::Interpolated(Box::new(Interpolated::Expr(expr.clone()))));
    }

    fn push_count(&mut self, count: Option<Count>) {
        match count {
            None => {
                self.push_path(&["fmt", "rt", "v1", "Count", "Implied"]);
            }
            Some(Count::Literal(value)) => {
                self.push_path(&["fmt", "rt", "v1", "Count", "Is"]);
                self.push(Kind::Open(Delimiter::Parenthesis));
                self.push_usize(value);
                self.push(Kind::Close(Delimiter::Parenthesis));
            }
            Some(Count::Arg(index)) => {
                self.push_path(&["fmt", "rt", "v1", "Count", "Param"]);
                self.push(Kind::Open(Delimiter::Parenthesis));
                self.push_usize(index);
                self.push(Kind::Close(Delimiter::Parenthesis));
            }
        }
    }
}

const FLAG_SIGN_PLUS: u128 = 1;
const FLAG_SIGN_MINUS: u128 = 2;
const FLAG_ALTERNATE: u128 = 4;
const FLAG_ZERO_PAD: u128 = 8;

/// Expand a `format_args!` invocation into the token tree of a runtime
/// formatter call.
pub fn expand_format_args(
    sess: &mut ParseSess<'_>,
    prefix: StdPrefix,
    inv: &ast::MacroInvocation,
) -> Result<TokenStream> {
    let span = inv.span;

    if inv.ident.is_some() {
        return Err(ParseError::msg(span, "format_args! doesn't take an ident"));
    }

    let mut parser = Parser::new(sess, Box::new(TtStream::new(inv.input.clone(), span)));

    let fmt_expr = parser.parse_expr()?;
    let format_string = match fmt_expr.as_str_lit() {
        Some(s) => s.to_owned(),
        None => {
            return Err(ParseError::msg(
                fmt_expr.span,
                "format_args! requires a string literal",
            ));
        }
    };

    let mut named_index: HashMap<String, usize> = HashMap::new();
    let mut named_args: Vec<ast::Expr> = Vec::new();
    let mut free_args: Vec<ast::Expr> = Vec::new();

    while parser.eat(&Kind::Comma)? {
        if parser.lookahead(0)? == Kind::Eof {
            break;
        }

        let named = matches!(parser.lookahead(0)?, Kind::Ident(..))
            && parser.lookahead(1)? == Kind::Eq;

        if named {
            let (id, id_span) = parser.expect_ident()?;
            parser.expect(&Kind::Eq)?;
            let expr = parser.parse_expr()?;

            let name = id.name.as_str().to_owned();
            if named_index.contains_key(&name) {
                return Err(ParseError::new(
                    id_span,
                    ParseErrorKind::FormatDuplicateNamed {
                        name: name.into_boxed_str(),
                    },
                ));
            }

            named_index.insert(name, named_args.len());
            named_args.push(expr);
        } else {
            free_args.push(parser.parse_expr()?);
        }
    }

    let token = parser.next()?;
    if token.kind != Kind::Eof {
        return Err(Parser::unexpected(&token, &["`,`"]));
    }

    let (fragments, tail) =
        parse_format_string(span, &format_string, &named_index, free_args.len())?;

    log::trace!(
        "format_args!: {} fragments, {} named, {} free",
        fragments.len(),
        named_args.len(),
        free_args.len()
    );

    // Fragment indices address `named ++ free`.
    let mut all_args = named_args;
    all_args.extend(free_args);

    let is_simple = fragments
        .iter()
        .enumerate()
        .all(|(n, f)| f.arg_index == n && f.options.is_default());

    let mut b = TokenBuilder {
        tokens: Vec::new(),
        span,
        prefix,
    };

    let ctor: &[&str] = if is_simple {
        &["fmt", "Arguments", "new_v1"]
    } else {
        &["fmt", "Arguments", "new_v1_formatted"]
    };
    b.push_path(ctor);
    b.push(Kind::Open(Delimiter::Parenthesis));

    // Literal pieces: N+1 entries for N fragments.
    b.push(Kind::Amp);
    b.push(Kind::Open(Delimiter::Bracket));
    for frag in &fragments {
        b.push(Kind::Str(frag.leading_text.clone().into_boxed_str()));
        b.push(Kind::Comma);
    }
    b.push(Kind::Str(tail.into_boxed_str()));
    b.push(Kind::Close(Delimiter::Bracket));
    b.push(Kind::Comma);

    // One formatter entry per fragment, each referencing its argument.
    b.push(Kind::Amp);
    b.push(Kind::Open(Delimiter::Bracket));
    for frag in &fragments {
        b.push_path(&["fmt", "ArgumentV1", "new"]);
        b.push(Kind::Open(Delimiter::Parenthesis));
        b.push(Kind::Amp);
        b.push_expr(&all_args[frag.arg_index]);
        b.push(Kind::Comma);
        b.push_path(&["fmt", frag.trait_.name(), "fmt"]);
        b.push(Kind::Close(Delimiter::Parenthesis));
        b.push(Kind::Comma);
    }
    b.push(Kind::Close(Delimiter::Bracket));

    if !is_simple {
        // The spec array carries per-fragment position and options.
        b.push(Kind::Comma);
        b.push(Kind::Amp);
        b.push(Kind::Open(Delimiter::Bracket));

        for (n, frag) in fragments.iter().enumerate() {
            let opts = &frag.options;

            b.push_path(&["fmt", "rt", "v1", "Argument", "new"]);
            b.push(Kind::Open(Delimiter::Parenthesis));

            b.push_usize(n);
            b.push(Kind::Comma);

            b.push(Kind::Char(opts.fill.unwrap_or(' ')));
            b.push(Kind::Comma);

            let align = match opts.align {
                Align::Left => "Left",
                Align::Center => "Center",
                Align::Right => "Right",
                Align::Unspec => "Unknown",
            };
            b.push_path(&["fmt", "rt", "v1", "Alignment", align]);
            b.push(Kind::Comma);

            let mut flags = 0u128;
            if opts.sign == Sign::Plus {
                flags |= FLAG_SIGN_PLUS;
            }
            if opts.sign == Sign::Minus {
                flags |= FLAG_SIGN_MINUS;
            }
            if opts.alternate {
                flags |= FLAG_ALTERNATE;
            }
            if opts.zero_pad {
                flags |= FLAG_ZERO_PAD;
            }
            b.push(Kind::Int {
                value: flags,
                class: None,
            });
            b.push(Kind::Comma);

            b.push_count(opts.precision);
            b.push(Kind::Comma);
            b.push_count(opts.width);

            b.push(Kind::Close(Delimiter::Parenthesis));
            b.push(Kind::Comma);
        }

        b.push(Kind::Close(Delimiter::Bracket));
    }

    b.push(Kind::Close(Delimiter::Parenthesis));

    Ok(TokenStream::from(b.tokens))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_named() -> HashMap<String, usize> {
        HashMap::new()
    }

    #[test]
    fn plain_fragments() {
        let (frags, tail) =
            parse_format_string(Span::empty(), "a {} b {} c", &no_named(), 2).unwrap();
        assert_eq!(frags.len(), 2);
        assert_eq!(frags[0].leading_text, "a ");
        assert_eq!(frags[0].arg_index, 0);
        assert_eq!(frags[0].trait_, FormatTrait::Display);
        assert_eq!(frags[1].leading_text, " b ");
        assert_eq!(frags[1].arg_index, 1);
        assert_eq!(tail, " c");
    }

    #[test]
    fn escaped_braces() {
        let (frags, tail) =
            parse_format_string(Span::empty(), "{{}} {}", &no_named(), 1).unwrap();
        assert_eq!(frags.len(), 1);
        assert_eq!(frags[0].leading_text, "{} ");
        assert_eq!(tail, "");
    }

    #[test]
    fn trait_selectors() {
        let cases = [
            ("{:?}", FormatTrait::Debug),
            ("{:b}", FormatTrait::Binary),
            ("{:o}", FormatTrait::Octal),
            ("{:x}", FormatTrait::LowerHex),
            ("{:X}", FormatTrait::UpperHex),
            ("{:p}", FormatTrait::Pointer),
            ("{:e}", FormatTrait::LowerExp),
            ("{:E}", FormatTrait::UpperExp),
        ];

        for (input, want) in cases {
            let (frags, _) =
                parse_format_string(Span::empty(), input, &no_named(), 1).unwrap();
            assert_eq!(frags[0].trait_, want, "{}", input);
        }
    }

    #[test]
    fn options() {
        let (frags, _) =
            parse_format_string(Span::empty(), "{:*^+#08.3x}", &no_named(), 1).unwrap();
        let opts = &frags[0].options;
        assert_eq!(opts.fill, Some('*'));
        assert_eq!(opts.align, Align::Center);
        assert_eq!(opts.sign, Sign::Plus);
        assert!(opts.alternate);
        assert!(opts.zero_pad);
        assert_eq!(opts.width, Some(Count::Literal(8)));
        assert_eq!(opts.precision, Some(Count::Literal(3)));
        assert_eq!(frags[0].trait_, FormatTrait::LowerHex);
    }

    #[test]
    fn named_and_star_precision() {
        // `"{x:>5.*}"` with one free argument and `x` named: the
        // precision consumes free index 0 ahead of the fragment.
        let mut named = HashMap::new();
        named.insert("x".to_owned(), 0usize);

        let (frags, _) =
            parse_format_string(Span::empty(), "{x:>5.*}", &named, 1).unwrap();

        assert_eq!(frags.len(), 1);
        let frag = &frags[0];
        assert_eq!(frag.arg_index, 0, "named argument at concat index 0");
        assert_eq!(frag.trait_, FormatTrait::Display);
        assert_eq!(frag.options.align, Align::Right);
        assert_eq!(frag.options.width, Some(Count::Literal(5)));
        assert_eq!(frag.options.precision, Some(Count::Arg(1)));
    }

    #[test]
    fn unknown_named_argument() {
        let err = parse_format_string(Span::empty(), "{missing}", &no_named(), 0)
            .unwrap_err();
        assert!(matches!(
            err.kind(),
            ParseErrorKind::FormatUnknownNamed { .. }
        ));
    }

    #[test]
    fn not_enough_arguments() {
        let err = parse_format_string(Span::empty(), "{} {}", &no_named(), 1).unwrap_err();
        assert!(matches!(
            err.kind(),
            ParseErrorKind::FormatNotEnoughArgs { expected: 2 }
        ));
    }

    #[test]
    fn positional_references() {
        let (frags, _) =
            parse_format_string(Span::empty(), "{1} {0} {0:4$}", &no_named(), 5).unwrap();
        assert_eq!(frags[0].arg_index, 1);
        assert_eq!(frags[1].arg_index, 0);
        assert_eq!(frags[2].options.width, Some(Count::Arg(4)));
    }
}

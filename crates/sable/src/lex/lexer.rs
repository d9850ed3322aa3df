use std::sync::Arc;

use crate::lex::{FloatClass, Hygiene, Ident, IntClass, Kind, Token, TokenSource};
use crate::lex::token::Delimiter;
use crate::name::Name;
use crate::parse::{ParseError, ParseErrorKind};
use crate::source::Source;
use crate::span::{SourceId, Span};

/// The lexer, producing [Token]s from one source text.
///
/// The lexer owns its text; any file handle used to produce the text is
/// closed before the lexer is constructed. It performs no grammar checks:
/// unknown punctuation sequences split greedily into known operators,
/// longest match first.
pub struct Lexer {
    text: Arc<str>,
    source: SourceId,
    pos: usize,
    hygiene: Vec<Hygiene>,
    next_hygiene: u32,
}

impl Lexer {
    /// Construct a lexer over the given registered source.
    pub fn new(source: &Source, id: SourceId) -> Self {
        Self {
            text: source.text().clone(),
            source: id,
            pos: 0,
            hygiene: vec![Hygiene::ROOT],
            next_hygiene: 1,
        }
    }

    /// Construct a lexer directly over a string, for tests and embedded
    /// fragments.
    pub fn from_str(text: &str, id: SourceId) -> Self {
        Self {
            text: Arc::from(text),
            source: id,
            pos: 0,
            hygiene: vec![Hygiene::ROOT],
            next_hygiene: 1,
        }
    }

    fn rest(&self) -> &str {
        &self.text[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek2(&self) -> Option<char> {
        let mut it = self.rest().chars();
        it.next();
        it.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(self.source, start, self.pos)
    }

    fn error(&self, start: usize, kind: ParseErrorKind) -> ParseError {
        ParseError::new(self.span_from(start), kind)
    }

    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek2() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.peek2() == Some('*') => {
                    let start = self.pos;
                    self.bump();
                    self.bump();
                    let mut depth = 1usize;
                    loop {
                        match (self.peek(), self.peek2()) {
                            (Some('*'), Some('/')) => {
                                self.bump();
                                self.bump();
                                depth -= 1;
                                if depth == 0 {
                                    break;
                                }
                            }
                            (Some('/'), Some('*')) => {
                                self.bump();
                                self.bump();
                                depth += 1;
                            }
                            (Some(_), _) => {
                                self.bump();
                            }
                            (None, _) => {
                                return Err(
                                    self.error(start, ParseErrorKind::UnterminatedComment)
                                );
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn current_hygiene(&self) -> Hygiene {
        *self.hygiene.last().unwrap_or(&Hygiene::ROOT)
    }

    fn lex_ident(&mut self, start: usize) -> Kind {
        while let Some(c) = self.peek() {
            if unicode_ident::is_xid_continue(c) {
                self.bump();
            } else {
                break;
            }
        }

        let text = &self.text[start..self.pos];

        if text == "_" {
            return Kind::Underscore;
        }

        if let Some(kw) = Kind::from_keyword(text) {
            return kw;
        }

        Kind::Ident(Ident::with_hygiene(Name::new(text), self.current_hygiene()))
    }

    fn lex_number(&mut self, start: usize) -> Result<Kind, ParseError> {
        let radix = if self.rest().starts_with("0x") {
            self.bump();
            self.bump();
            16
        } else if self.rest().starts_with("0o") {
            self.bump();
            self.bump();
            8
        } else if self.rest().starts_with("0b") {
            self.bump();
            self.bump();
            2
        } else {
            10
        };

        let mut value: u128 = 0;
        let mut any = radix == 10;

        while let Some(c) = self.peek() {
            if c == '_' {
                self.bump();
                continue;
            }

            let digit = match c.to_digit(radix) {
                Some(d) => d,
                None => break,
            };

            self.bump();
            any = true;
            value = value
                .checked_mul(radix as u128)
                .and_then(|v| v.checked_add(digit as u128))
                .ok_or_else(|| self.error(start, ParseErrorKind::IntegerOverflow))?;
        }

        if !any {
            return Err(self.error(start, ParseErrorKind::MalformedNumber));
        }

        // A fractional part or exponent makes this a float literal. A lone
        // `.` followed by an identifier is field access, not a fraction.
        let mut is_float = false;

        if radix == 10 {
            if self.peek() == Some('.')
                && self
                    .peek2()
                    .map(|c| c.is_ascii_digit())
                    .unwrap_or(false)
            {
                is_float = true;
                self.bump();
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() || c == '_' {
                        self.bump();
                    } else {
                        break;
                    }
                }
            }

            if matches!(self.peek(), Some('e') | Some('E'))
                && self
                    .peek2()
                    .map(|c| c.is_ascii_digit() || c == '+' || c == '-')
                    .unwrap_or(false)
            {
                is_float = true;
                self.bump();
                if matches!(self.peek(), Some('+') | Some('-')) {
                    self.bump();
                }
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        self.bump();
                    } else {
                        break;
                    }
                }
            }
        }

        let digits_end = self.pos;

        // Trailing identifier characters form a suffix.
        while let Some(c) = self.peek() {
            if unicode_ident::is_xid_continue(c) {
                self.bump();
            } else {
                break;
            }
        }

        let suffix = &self.text[digits_end..self.pos];

        if is_float {
            let digits: String = self.text[start..digits_end]
                .chars()
                .filter(|c| *c != '_')
                .collect();
            let value: f64 = digits
                .parse()
                .map_err(|_| self.error(start, ParseErrorKind::MalformedNumber))?;

            let class = if suffix.is_empty() {
                None
            } else {
                Some(FloatClass::from_suffix(suffix).ok_or_else(|| {
                    self.error(start, ParseErrorKind::UnknownNumberSuffix {
                        suffix: suffix.into(),
                    })
                })?)
            };

            return Ok(Kind::Float { value, class });
        }

        if suffix.is_empty() {
            return Ok(Kind::Int { value, class: None });
        }

        if let Some(class) = IntClass::from_suffix(suffix) {
            return Ok(Kind::Int {
                value,
                class: Some(class),
            });
        }

        if let Some(class) = FloatClass::from_suffix(suffix) {
            return Ok(Kind::Float {
                value: value as f64,
                class: Some(class),
            });
        }

        Err(self.error(start, ParseErrorKind::UnknownNumberSuffix {
            suffix: suffix.into(),
        }))
    }

    /// Read one escape sequence, after the backslash has been consumed.
    fn lex_escape(&mut self, start: usize) -> Result<char, ParseError> {
        let c = self
            .bump()
            .ok_or_else(|| self.error(start, ParseErrorKind::UnterminatedString))?;

        Ok(match c {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            '0' => '\0',
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            'x' => {
                let hi = self.bump();
                let lo = self.bump();
                let (hi, lo) = match (
                    hi.and_then(|c| c.to_digit(16)),
                    lo.and_then(|c| c.to_digit(16)),
                ) {
                    (Some(hi), Some(lo)) => (hi, lo),
                    _ => return Err(self.error(start, ParseErrorKind::BadEscape { c })),
                };
                char::from_u32(hi * 16 + lo)
                    .ok_or_else(|| self.error(start, ParseErrorKind::BadEscape { c }))?
            }
            'u' => {
                if self.bump() != Some('{') {
                    return Err(self.error(start, ParseErrorKind::BadEscape { c }));
                }
                let mut v: u32 = 0;
                loop {
                    match self.bump() {
                        Some('}') => break,
                        Some(d) => {
                            let d = d
                                .to_digit(16)
                                .ok_or_else(|| self.error(start, ParseErrorKind::BadEscape { c }))?;
                            v = v * 16 + d;
                        }
                        None => {
                            return Err(self.error(start, ParseErrorKind::UnterminatedString))
                        }
                    }
                }
                char::from_u32(v)
                    .ok_or_else(|| self.error(start, ParseErrorKind::BadEscape { c }))?
            }
            other => return Err(self.error(start, ParseErrorKind::BadEscape { c: other })),
        })
    }

    fn lex_string(&mut self, start: usize) -> Result<String, ParseError> {
        let mut value = String::new();

        loop {
            match self.bump() {
                Some('"') => break,
                Some('\\') => {
                    // An escaped newline swallows following whitespace.
                    if self.peek() == Some('\n') {
                        self.bump();
                        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
                            self.bump();
                        }
                        continue;
                    }
                    value.push(self.lex_escape(start)?);
                }
                Some(c) => value.push(c),
                None => return Err(self.error(start, ParseErrorKind::UnterminatedString)),
            }
        }

        Ok(value)
    }

    fn lex_char(&mut self, start: usize) -> Result<char, ParseError> {
        let c = match self.bump() {
            Some('\\') => self.lex_escape(start)?,
            Some(c) => c,
            None => return Err(self.error(start, ParseErrorKind::UnterminatedString)),
        };

        if self.bump() != Some('\'') {
            return Err(self.error(start, ParseErrorKind::UnterminatedString));
        }

        Ok(c)
    }

    /// Lex `'`-introduced tokens: either a lifetime or a character literal.
    fn lex_quote(&mut self, start: usize) -> Result<Kind, ParseError> {
        // An escape is always a char literal.
        if self.peek() == Some('\\') {
            return Ok(Kind::Char(self.lex_char(start)?));
        }

        // `'x'` is a char literal, `'x` a lifetime.
        match (self.peek(), self.peek2()) {
            (Some(c), Some('\'')) if c != '\'' => {
                return Ok(Kind::Char(self.lex_char(start)?));
            }
            (Some(c), _) if unicode_ident::is_xid_start(c) || c == '_' => {
                let name_start = self.pos;
                while let Some(c) = self.peek() {
                    if unicode_ident::is_xid_continue(c) {
                        self.bump();
                    } else {
                        break;
                    }
                }
                let name = &self.text[name_start..self.pos];
                Ok(Kind::Lifetime(Ident::with_hygiene(
                    Name::new(name),
                    self.current_hygiene(),
                )))
            }
            _ => Ok(Kind::Char(self.lex_char(start)?)),
        }
    }

    /// Greedy longest-match continuation over the operator table.
    fn followed(&mut self, options: &[(&str, Kind)], fallback: Kind) -> Kind {
        for (text, kind) in options {
            if self.rest().starts_with(text) {
                self.pos += text.len();
                return kind.clone();
            }
        }
        fallback
    }

    fn lex_punct(&mut self, start: usize, c: char) -> Result<Kind, ParseError> {
        Ok(match c {
            '(' => Kind::Open(Delimiter::Parenthesis),
            ')' => Kind::Close(Delimiter::Parenthesis),
            '{' => Kind::Open(Delimiter::Brace),
            '}' => Kind::Close(Delimiter::Brace),
            '[' => Kind::Open(Delimiter::Bracket),
            ']' => Kind::Close(Delimiter::Bracket),
            ',' => Kind::Comma,
            ';' => Kind::Semi,
            '#' => Kind::Pound,
            '$' => Kind::Dollar,
            '@' => Kind::At,
            '?' => Kind::Question,
            ':' => self.followed(&[(":", Kind::ColonColon)], Kind::Colon),
            '.' => self.followed(
                &[
                    ("..", Kind::DotDotDot),
                    (".=", Kind::DotDotEq),
                    (".", Kind::DotDot),
                ],
                Kind::Dot,
            ),
            '=' => self.followed(
                &[("=", Kind::EqEq), (">", Kind::FatArrow)],
                Kind::Eq,
            ),
            '!' => self.followed(&[("=", Kind::BangEq)], Kind::Bang),
            '<' => self.followed(
                &[
                    ("<=", Kind::LtLtEq),
                    ("<", Kind::LtLt),
                    ("=", Kind::LtEq),
                ],
                Kind::Lt,
            ),
            '>' => self.followed(
                &[
                    (">=", Kind::GtGtEq),
                    (">", Kind::GtGt),
                    ("=", Kind::GtEq),
                ],
                Kind::Gt,
            ),
            '&' => self.followed(
                &[("&", Kind::AmpAmp), ("=", Kind::AmpEq)],
                Kind::Amp,
            ),
            '|' => self.followed(
                &[("|", Kind::PipePipe), ("=", Kind::PipeEq)],
                Kind::Pipe,
            ),
            '+' => self.followed(&[("=", Kind::PlusEq)], Kind::Plus),
            '-' => self.followed(
                &[("=", Kind::DashEq), (">", Kind::Arrow)],
                Kind::Dash,
            ),
            '*' => self.followed(&[("=", Kind::StarEq)], Kind::Star),
            '/' => self.followed(&[("=", Kind::SlashEq)], Kind::Slash),
            '%' => self.followed(&[("=", Kind::PercentEq)], Kind::Percent),
            '^' => self.followed(&[("=", Kind::CaretEq)], Kind::Caret),
            other => {
                return Err(self.error(start, ParseErrorKind::UnexpectedChar { c: other }));
            }
        })
    }
}

impl TokenSource for Lexer {
    fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_trivia()?;

        let start = self.pos;

        let c = match self.bump() {
            Some(c) => c,
            None => {
                return Ok(Token::new(Kind::Eof, self.span_from(start)));
            }
        };

        let kind = match c {
            c if unicode_ident::is_xid_start(c) || c == '_' => {
                // Byte and byte-string literals.
                if c == 'b' {
                    match self.peek() {
                        Some('\'') => {
                            self.bump();
                            let c = self.lex_char(start)?;
                            if !c.is_ascii() {
                                return Err(
                                    self.error(start, ParseErrorKind::MalformedNumber)
                                );
                            }
                            let kind = Kind::Byte(c as u8);
                            return Ok(Token::new(kind, self.span_from(start)));
                        }
                        Some('"') => {
                            self.bump();
                            let s = self.lex_string(start)?;
                            let kind = Kind::ByteStr(s.into_bytes().into_boxed_slice());
                            return Ok(Token::new(kind, self.span_from(start)));
                        }
                        _ => {}
                    }
                }
                self.lex_ident(start)
            }
            c if c.is_ascii_digit() => {
                self.pos = start;
                self.lex_number(start)?
            }
            '"' => Kind::Str(self.lex_string(start)?.into_boxed_str()),
            '\'' => self.lex_quote(start)?,
            other => self.lex_punct(start, other)?,
        };

        Ok(Token::new(kind, self.span_from(start)))
    }

    fn push_hygiene(&mut self) {
        let h = Hygiene(self.next_hygiene);
        self.next_hygiene += 1;
        self.hygiene.push(h);
    }

    fn pop_hygiene(&mut self) {
        if self.hygiene.len() > 1 {
            self.hygiene.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(text: &str) -> Vec<Kind> {
        let mut lexer = Lexer::from_str(text, SourceId::EMPTY);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token().unwrap();
            if tok.kind == Kind::Eof {
                break;
            }
            out.push(tok.kind);
        }
        out
    }

    #[test]
    fn keywords_and_idents() {
        let kinds = lex_all("fn foo _ _bar");
        assert_eq!(kinds.len(), 4);
        assert_eq!(kinds[0], Kind::Fn);
        assert!(matches!(&kinds[1], Kind::Ident(id) if id.name == "foo"));
        assert_eq!(kinds[2], Kind::Underscore);
        assert!(matches!(&kinds[3], Kind::Ident(id) if id.name == "_bar"));
    }

    #[test]
    fn numbers() {
        let kinds = lex_all("0 42usize 0xff 0b1010 1_000 3.25 1e3 2f32");
        assert_eq!(kinds[0], Kind::Int { value: 0, class: None });
        assert_eq!(kinds[1], Kind::Int { value: 42, class: Some(IntClass::Usize) });
        assert_eq!(kinds[2], Kind::Int { value: 255, class: None });
        assert_eq!(kinds[3], Kind::Int { value: 10, class: None });
        assert_eq!(kinds[4], Kind::Int { value: 1000, class: None });
        assert_eq!(kinds[5], Kind::Float { value: 3.25, class: None });
        assert_eq!(kinds[6], Kind::Float { value: 1000.0, class: None });
        assert_eq!(kinds[7], Kind::Float { value: 2.0, class: Some(FloatClass::F32) });
    }

    #[test]
    fn big_magnitude() {
        let kinds = lex_all("340282366920938463463374607431768211455");
        assert_eq!(kinds[0], Kind::Int { value: u128::MAX, class: None });
    }

    #[test]
    fn strings_unescaped() {
        let kinds = lex_all(r#""hello\nworld" b"ab\0" 'x' '\n' b'z'"#);
        assert_eq!(kinds[0], Kind::Str("hello\nworld".into()));
        assert_eq!(kinds[1], Kind::ByteStr(b"ab\0".to_vec().into_boxed_slice()));
        assert_eq!(kinds[2], Kind::Char('x'));
        assert_eq!(kinds[3], Kind::Char('\n'));
        assert_eq!(kinds[4], Kind::Byte(b'z'));
    }

    #[test]
    fn lifetimes_vs_chars() {
        let kinds = lex_all("'a 'static 'a'");
        assert!(matches!(&kinds[0], Kind::Lifetime(id) if id.name == "a"));
        assert!(matches!(&kinds[1], Kind::Lifetime(id) if id.name == "static"));
        assert_eq!(kinds[2], Kind::Char('a'));
    }

    #[test]
    fn punctuation_longest_match() {
        let kinds = lex_all(":: -> => >>= .. ..= ... << && ||");
        assert_eq!(
            kinds,
            vec![
                Kind::ColonColon,
                Kind::Arrow,
                Kind::FatArrow,
                Kind::GtGtEq,
                Kind::DotDot,
                Kind::DotDotEq,
                Kind::DotDotDot,
                Kind::LtLt,
                Kind::AmpAmp,
                Kind::PipePipe,
            ]
        );
    }

    #[test]
    fn comments() {
        let kinds = lex_all("a // line\nb /* block /* nested */ */ c");
        assert_eq!(kinds.len(), 3);
    }

    #[test]
    fn hygiene_scopes() {
        let mut lexer = Lexer::from_str("a a", SourceId::EMPTY);
        let outer = lexer.next_token().unwrap();
        lexer.push_hygiene();
        let inner = lexer.next_token().unwrap();
        lexer.pop_hygiene();

        let (outer, inner) = match (outer.kind, inner.kind) {
            (Kind::Ident(a), Kind::Ident(b)) => (a, b),
            _ => panic!("expected identifiers"),
        };

        assert_eq!(outer.name, inner.name);
        assert_ne!(outer.hygiene, inner.hygiene);
    }
}

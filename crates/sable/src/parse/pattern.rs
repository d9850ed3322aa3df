use crate::ast::{
    BindMode, Path, Pattern, PatternBinding, PatternData, PatternValue, TuplePat,
};
use crate::lex::{Delimiter, Interpolated, Kind};
use crate::parse::{Parser, PathGenericMode, Result};

impl<'s, 'a> Parser<'s, 'a> {
    /// Parse a pattern.
    ///
    /// In irrefutable positions (`refutable = false`) a bare identifier is
    /// a binding; in refutable positions it stays ambiguous as `MaybeBind`
    /// until resolution.
    pub fn parse_pattern(&mut self, refutable: bool) -> Result<Pattern> {
        if let Kind::Interpolated(frag) = self.lookahead(0)? {
            if let Interpolated::Pat(pat) = *frag {
                self.next()?;
                return Ok(pat);
            }
        }

        let ps = self.start_span();

        // Explicit binding prefixes.
        let binding = match self.lookahead(0)? {
            Kind::Ref => {
                self.next()?;
                let mode = if self.eat(&Kind::Mut)? {
                    BindMode::MutRef
                } else {
                    BindMode::Ref
                };
                let (name, _) = self.expect_ident()?;
                Some(PatternBinding {
                    name,
                    mode,
                    is_mut: false,
                })
            }
            Kind::Mut => {
                self.next()?;
                let (name, _) = self.expect_ident()?;
                Some(PatternBinding {
                    name,
                    mode: BindMode::Move,
                    is_mut: true,
                })
            }
            Kind::Ident(name)
                if self.lookahead(1)? == Kind::At
                    || (!refutable
                        && !matches!(
                            self.lookahead(1)?,
                            Kind::ColonColon
                                | Kind::Open(Delimiter::Parenthesis)
                                | Kind::Open(Delimiter::Brace)
                                | Kind::Bang
                        )) =>
            {
                self.next()?;
                Some(PatternBinding {
                    name,
                    mode: BindMode::Move,
                    is_mut: false,
                })
            }
            _ => None,
        };

        if let Some(binding) = binding {
            if self.eat(&Kind::At)? {
                let mut inner = self.parse_pattern(refutable)?;
                inner.span = self.end_span(ps);
                inner.binding = Some(binding);
                return Ok(inner);
            }

            return Ok(Pattern {
                span: self.end_span(ps),
                binding: Some(binding),
                data: PatternData::Any,
            });
        }

        self.parse_pattern_data(ps, refutable)
    }

    fn parse_pattern_data(
        &mut self,
        ps: crate::parse::ProtoSpan,
        refutable: bool,
    ) -> Result<Pattern> {
        match self.lookahead(0)? {
            Kind::Underscore => {
                self.next()?;
                Ok(Pattern::any(self.end_span(ps)))
            }
            Kind::Amp | Kind::AmpAmp => {
                self.eat_amp()?;
                let is_mut = self.eat(&Kind::Mut)?;
                let inner = Box::new(self.parse_pattern(refutable)?);
                Ok(Pattern::new(
                    self.end_span(ps),
                    PatternData::Ref { is_mut, inner },
                ))
            }
            Kind::Box_ => {
                self.next()?;
                let inner = Box::new(self.parse_pattern(refutable)?);
                Ok(Pattern::new(self.end_span(ps), PatternData::Box_ { inner }))
            }
            Kind::Open(Delimiter::Parenthesis) => {
                self.next()?;
                let pat = self.parse_tuple_pat(refutable, Delimiter::Parenthesis)?;
                Ok(Pattern::new(self.end_span(ps), PatternData::Tuple(pat)))
            }
            Kind::Open(Delimiter::Bracket) => {
                self.next()?;
                self.parse_slice_pat(ps, refutable)
            }
            // A macro invocation in pattern position.
            Kind::Ident(..) if self.lookahead(1)? == Kind::Bang => {
                let inv = self.parse_macro_invocation_bare()?;
                Ok(Pattern::new(
                    self.end_span(ps),
                    PatternData::Macro(Box::new(inv)),
                ))
            }
            Kind::Ident(id)
                if refutable
                    && !matches!(
                        self.lookahead(1)?,
                        Kind::ColonColon
                            | Kind::Open(Delimiter::Parenthesis)
                            | Kind::Open(Delimiter::Brace)
                            | Kind::DotDotDot
                            | Kind::DotDotEq
                    ) =>
            {
                self.next()?;
                Ok(Pattern::new(
                    self.end_span(ps),
                    PatternData::MaybeBind(id),
                ))
            }
            Kind::Ident(..)
            | Kind::ColonColon
            | Kind::Crate
            | Kind::SelfValue
            | Kind::SelfType
            | Kind::Super
            | Kind::Lt
            | Kind::LtLt => {
                let path = self.parse_path(PathGenericMode::Expr)?;
                self.parse_path_pattern(ps, refutable, path)
            }
            _ => {
                let start = match self.parse_pattern_value()? {
                    Some(value) => value,
                    None => {
                        let token = self.next()?;
                        return Err(Self::unexpected(&token, &["pattern"]));
                    }
                };
                let end = self.parse_range_end()?;
                Ok(Pattern::new(
                    self.end_span(ps),
                    PatternData::Value { start, end },
                ))
            }
        }
    }

    /// Continue a pattern that started with a path: a tuple-struct pattern,
    /// a struct pattern, a range, or a named constant.
    fn parse_path_pattern(
        &mut self,
        ps: crate::parse::ProtoSpan,
        refutable: bool,
        path: Path,
    ) -> Result<Pattern> {
        match self.lookahead(0)? {
            Kind::Open(Delimiter::Parenthesis) => {
                self.next()?;
                let pat = self.parse_tuple_pat(refutable, Delimiter::Parenthesis)?;
                Ok(Pattern::new(
                    self.end_span(ps),
                    PatternData::StructTuple { path, pat },
                ))
            }
            Kind::Open(Delimiter::Brace) => {
                self.next()?;
                let (fields, is_exhaustive) = self.parse_struct_pat_fields(refutable)?;
                Ok(Pattern::new(
                    self.end_span(ps),
                    PatternData::Struct {
                        path,
                        fields,
                        is_exhaustive,
                    },
                ))
            }
            Kind::DotDotDot | Kind::DotDotEq => {
                self.next()?;
                let end = match self.parse_pattern_value()? {
                    Some(value) => value,
                    None => {
                        let token = self.next()?;
                        return Err(Self::unexpected(&token, &["pattern value"]));
                    }
                };
                Ok(Pattern::new(
                    self.end_span(ps),
                    PatternData::Value {
                        start: PatternValue::Named(path),
                        end: Some(end),
                    },
                ))
            }
            _ => Ok(Pattern::new(
                self.end_span(ps),
                PatternData::Value {
                    start: PatternValue::Named(path),
                    end: None,
                },
            )),
        }
    }

    /// Parse the comma-separated body of a tuple or tuple-struct pattern,
    /// with the open delimiter consumed. A `..` marker splits leading from
    /// trailing sub-patterns.
    pub(crate) fn parse_tuple_pat(
        &mut self,
        refutable: bool,
        delim: Delimiter,
    ) -> Result<TuplePat> {
        let close = Kind::Close(delim);
        let mut pat = TuplePat::default();

        loop {
            if self.eat(&close)? {
                return Ok(pat);
            }

            if self.eat(&Kind::DotDot)? {
                pat.has_rest = true;
                break;
            }

            pat.leading.push(self.parse_pattern(refutable)?);

            if !self.eat(&Kind::Comma)? {
                self.expect(&close)?;
                return Ok(pat);
            }
        }

        // After the rest marker.
        loop {
            if self.eat(&close)? {
                break;
            }
            pat.trailing.push(self.parse_pattern(refutable)?);
            if !self.eat(&Kind::Comma)? {
                self.expect(&close)?;
                break;
            }
        }

        Ok(pat)
    }

    fn parse_slice_pat(
        &mut self,
        ps: crate::parse::ProtoSpan,
        refutable: bool,
    ) -> Result<Pattern> {
        let close = Kind::Close(Delimiter::Bracket);
        let mut leading = Vec::new();
        let mut trailing = Vec::new();
        let mut rest_bind = None;
        let mut split = false;

        loop {
            if self.eat(&close)? {
                let span = self.end_span(ps);
                return Ok(if split {
                    Pattern::new(
                        span,
                        PatternData::SplitSlice {
                            leading,
                            rest_bind,
                            trailing,
                        },
                    )
                } else {
                    Pattern::new(span, PatternData::Slice { pats: leading })
                });
            }

            // `..` or `name..` marks the split point.
            if self.eat(&Kind::DotDot)? {
                split = true;
            } else {
                let pat = self.parse_pattern(refutable)?;
                if !split && self.eat(&Kind::DotDot)? {
                    match (pat.binding, &pat.data) {
                        (Some(binding), PatternData::Any) => {
                            split = true;
                            rest_bind = Some(binding);
                        }
                        _ => {
                            return Err(crate::parse::ParseError::msg(
                                pat.span,
                                "slice rest binding must be a plain name",
                            ));
                        }
                    }
                } else if split {
                    trailing.push(pat);
                } else {
                    leading.push(pat);
                }
            }

            if !self.eat(&Kind::Comma)? {
                self.expect(&close)?;
                let span = self.end_span(ps);
                return Ok(if split {
                    Pattern::new(
                        span,
                        PatternData::SplitSlice {
                            leading,
                            rest_bind,
                            trailing,
                        },
                    )
                } else {
                    Pattern::new(span, PatternData::Slice { pats: leading })
                });
            }
        }
    }

    fn parse_struct_pat_fields(
        &mut self,
        refutable: bool,
    ) -> Result<(Vec<(crate::lex::Ident, Pattern)>, bool)> {
        let close = Kind::Close(Delimiter::Brace);
        let mut fields = Vec::new();
        let mut is_exhaustive = true;

        loop {
            if self.eat(&close)? {
                break;
            }

            if self.eat(&Kind::DotDot)? {
                is_exhaustive = false;
                self.expect(&close)?;
                break;
            }

            let ps = self.start_span();

            // `ref`/`mut` shorthand bindings.
            let mode = if self.eat(&Kind::Ref)? {
                if self.eat(&Kind::Mut)? {
                    Some((BindMode::MutRef, false))
                } else {
                    Some((BindMode::Ref, false))
                }
            } else if self.eat(&Kind::Mut)? {
                Some((BindMode::Move, true))
            } else {
                None
            };

            let (name, _) = self.expect_ident()?;

            let pat = if mode.is_none() && self.eat(&Kind::Colon)? {
                self.parse_pattern(refutable)?
            } else {
                let (mode, is_mut) = mode.unwrap_or((BindMode::Move, false));
                Pattern {
                    span: self.end_span(ps),
                    binding: Some(PatternBinding { name, mode, is_mut }),
                    data: PatternData::Any,
                }
            };

            fields.push((name, pat));

            if !self.eat(&Kind::Comma)? {
                self.expect(&close)?;
                break;
            }
        }

        Ok((fields, is_exhaustive))
    }

    /// Parse a literal or named value usable in a value pattern. Returns
    /// `None` without consuming anything if the next token cannot start
    /// one.
    fn parse_pattern_value(&mut self) -> Result<Option<PatternValue>> {
        let negated = match self.lookahead(0)? {
            Kind::Dash => {
                self.next()?;
                true
            }
            _ => false,
        };

        let value = match self.lookahead(0)? {
            Kind::Int { value, class } => {
                self.next()?;
                PatternValue::Integer {
                    value,
                    negated,
                    class,
                }
            }
            Kind::Float { value, class } => {
                self.next()?;
                PatternValue::Float {
                    value: if negated { -value } else { value },
                    class,
                }
            }
            Kind::Char(c) => {
                self.next()?;
                PatternValue::Char(c)
            }
            Kind::Byte(b) => {
                self.next()?;
                PatternValue::Byte(b)
            }
            Kind::Str(s) => {
                self.next()?;
                PatternValue::String(s)
            }
            Kind::ByteStr(s) => {
                self.next()?;
                PatternValue::ByteString(s)
            }
            Kind::Ident(..) | Kind::ColonColon | Kind::SelfValue | Kind::Super => {
                let path = self.parse_path(PathGenericMode::Expr)?;
                PatternValue::Named(path)
            }
            _ if negated => {
                let token = self.next()?;
                return Err(Self::unexpected(&token, &["integer", "float"]));
            }
            _ => return Ok(None),
        };

        Ok(Some(value))
    }

    fn parse_range_end(&mut self) -> Result<Option<PatternValue>> {
        if !self.eat(&Kind::DotDotDot)? && !self.eat(&Kind::DotDotEq)? {
            return Ok(None);
        }

        match self.parse_pattern_value()? {
            Some(value) => Ok(Some(value)),
            None => {
                let token = self.next()?;
                Err(Self::unexpected(&token, &["pattern value"]))
            }
        }
    }
}

use crate::ast::{AttrPayload, Attribute, AttributeList};
use crate::lex::{Delimiter, Interpolated, Kind};
use crate::name::Name;
use crate::parse::{ParseError, ParseErrorKind, Parser, Result};

impl<'s, 'a> Parser<'s, 'a> {
    /// Parse any number of `#[...]` attributes, expanding `cfg_attr` in
    /// place.
    pub fn parse_item_attrs(&mut self) -> Result<AttributeList> {
        let mut rv = AttributeList::new();

        while self.lookahead(0)? == Kind::Pound
            && self.lookahead(1)? == Kind::Open(Delimiter::Bracket)
        {
            self.expect(&Kind::Pound)?;
            self.expect(&Kind::Open(Delimiter::Bracket))?;
            let attr = self.parse_meta_item()?;
            self.expect(&Kind::Close(Delimiter::Bracket))?;
            self.push_cfg_attr(&mut rv, attr)?;
        }

        Ok(rv)
    }

    /// Parse any number of `#![...]` attributes into the given list.
    pub fn parse_parent_attrs(&mut self, out: &mut AttributeList) -> Result<()> {
        while self.lookahead(0)? == Kind::Pound && self.lookahead(1)? == Kind::Bang {
            self.expect(&Kind::Pound)?;
            self.expect(&Kind::Bang)?;
            self.expect(&Kind::Open(Delimiter::Bracket))?;
            let attr = self.parse_meta_item()?;
            self.expect(&Kind::Close(Delimiter::Bracket))?;
            self.push_cfg_attr(out, attr)?;
        }

        Ok(())
    }

    /// Append an attribute, applying the `cfg_attr(cond, attr...)` rewrite.
    fn push_cfg_attr(&mut self, out: &mut AttributeList, attr: Attribute) -> Result<()> {
        if attr.name != "cfg_attr" {
            out.push(attr);
            return Ok(());
        }

        let items = attr.items().ok_or_else(|| {
            ParseError::new(attr.span, ParseErrorKind::MalformedAttribute {
                name: attr.name,
            })
        })?;

        let (cond, rest) = match items.split_first() {
            Some((cond, rest)) if !rest.is_empty() => (cond, rest),
            _ => {
                return Err(ParseError::new(
                    attr.span,
                    ParseErrorKind::MalformedAttribute { name: attr.name },
                ));
            }
        };

        if self.cfg().check_cfg(attr.span, cond)? {
            for item in rest {
                out.push(item.clone());
            }
        }

        Ok(())
    }

    /// Evaluate every `cfg(...)` attribute in the list. An item whose
    /// attributes fail the check is dropped from the AST.
    pub fn attrs_cfg_ok(&mut self, attrs: &AttributeList) -> Result<bool> {
        for attr in attrs {
            if attr.name != "cfg" {
                continue;
            }

            let items = attr.items().ok_or_else(|| {
                ParseError::new(attr.span, ParseErrorKind::MalformedAttribute {
                    name: attr.name,
                })
            })?;

            for cond in items {
                if !self.cfg().check_cfg(attr.span, cond)? {
                    return Ok(false);
                }
            }
        }

        Ok(true)
    }

    /// Parse a single meta item, the inside of `#[...]`.
    pub fn parse_meta_item(&mut self) -> Result<Attribute> {
        if let Kind::Interpolated(frag) = self.lookahead(0)? {
            if let Interpolated::Attr(attr) = *frag {
                self.next()?;
                return Ok(attr);
            }
        }

        let ps = self.start_span();
        let token = self.next()?;

        let name = match token.kind {
            Kind::Ident(id) => id.name,
            // Bare integers appear inside list payloads like `align(8)`.
            Kind::Int { value, .. } => {
                return Ok(Attribute {
                    span: self.end_span(ps),
                    name: Name::empty(),
                    payload: AttrPayload::Int(value),
                });
            }
            _ => return Err(Self::unexpected(&token, &["ident", "integer"])),
        };

        match self.lookahead(0)? {
            Kind::Eq => {
                self.next()?;
                let token = self.next()?;
                let payload = match token.kind {
                    Kind::Str(s) => AttrPayload::Str(s),
                    Kind::Int { value, .. } => AttrPayload::Int(value),
                    Kind::Interpolated(frag) => match *frag {
                        // Macro-produced values must evaluate to a string.
                        Interpolated::Expr(expr) => match expr.as_str_lit() {
                            Some(s) => AttrPayload::Str(s.into()),
                            None => {
                                return Err(ParseError::new(
                                    expr.span,
                                    ParseErrorKind::MalformedAttribute { name },
                                ));
                            }
                        },
                        _ => {
                            return Err(ParseError::new(
                                token.span,
                                ParseErrorKind::MalformedAttribute { name },
                            ));
                        }
                    },
                    _ => return Err(Self::unexpected(&token, &["string", "integer"])),
                };

                Ok(Attribute {
                    span: self.end_span(ps),
                    name,
                    payload,
                })
            }
            Kind::Open(Delimiter::Parenthesis) => {
                self.next()?;
                let mut items = Vec::new();
                loop {
                    if self.eat(&Kind::Close(Delimiter::Parenthesis))? {
                        break;
                    }
                    items.push(self.parse_meta_item()?);
                    if !self.eat(&Kind::Comma)? {
                        self.expect(&Kind::Close(Delimiter::Parenthesis))?;
                        break;
                    }
                }

                Ok(Attribute {
                    span: self.end_span(ps),
                    name,
                    payload: AttrPayload::List(items),
                })
            }
            _ => Ok(Attribute {
                span: self.end_span(ps),
                name,
                payload: AttrPayload::Flag,
            }),
        }
    }
}

use crate::ast::{
    CoreType, FunctionType, LifetimeRef, PolyTraitRef, TypeData, TypeRef,
};
use crate::lex::{Delimiter, Interpolated, Kind};
use crate::name::Name;
use crate::parse::{Parser, PathGenericMode, Result};

impl<'s, 'a> Parser<'s, 'a> {
    /// Parse a type. A trailing `+` extends a path type into a trait
    /// object.
    pub fn parse_type(&mut self) -> Result<TypeRef> {
        self.parse_type_ext(true)
    }

    /// Parse a type without consuming a trailing `+`, for positions where
    /// `+` separates bounds.
    pub fn parse_type_no_plus(&mut self) -> Result<TypeRef> {
        self.parse_type_ext(false)
    }

    fn parse_type_ext(&mut self, allow_plus: bool) -> Result<TypeRef> {
        if let Kind::Interpolated(frag) = self.lookahead(0)? {
            if let Interpolated::Ty(ty) = *frag {
                self.next()?;
                return Ok(ty);
            }
        }

        let ps = self.start_span();

        let ty = match self.lookahead(0)? {
            Kind::Bang => {
                self.next()?;
                TypeRef::new(self.end_span(ps), TypeData::Bang)
            }
            Kind::Underscore => {
                self.next()?;
                TypeRef::new(self.end_span(ps), TypeData::Infer)
            }
            Kind::Open(Delimiter::Parenthesis) => {
                self.next()?;

                if self.eat(&Kind::Close(Delimiter::Parenthesis))? {
                    return Ok(TypeRef::unit(self.end_span(ps)));
                }

                let first = self.parse_type()?;

                if self.eat(&Kind::Close(Delimiter::Parenthesis))? {
                    // `(T)` is transparent; `(Trait + Send)` already came
                    // back as a trait object from the inner parse.
                    first
                } else {
                    let mut items = vec![first];
                    while self.eat(&Kind::Comma)? {
                        if self.lookahead(0)? == Kind::Close(Delimiter::Parenthesis) {
                            break;
                        }
                        items.push(self.parse_type()?);
                    }
                    self.expect(&Kind::Close(Delimiter::Parenthesis))?;
                    TypeRef::new(self.end_span(ps), TypeData::Tuple(items))
                }
            }
            Kind::Open(Delimiter::Bracket) => {
                self.next()?;
                let inner = Box::new(self.parse_type()?);
                let size = if self.eat(&Kind::Semi)? {
                    Some(Box::new(self.parse_expr()?))
                } else {
                    None
                };
                self.expect(&Kind::Close(Delimiter::Bracket))?;
                TypeRef::new(self.end_span(ps), TypeData::Array { inner, size })
            }
            Kind::Amp | Kind::AmpAmp => {
                // `&&T` splits into two borrow levels; the inner one is
                // picked up by the recursive type parse.
                self.eat_amp()?;
                self.parse_borrow_inner(ps)?
            }
            Kind::Star => {
                self.next()?;
                let token = self.next()?;
                let is_mut = match token.kind {
                    Kind::Const => false,
                    Kind::Mut => true,
                    _ => return Err(Self::unexpected(&token, &["const", "mut"])),
                };
                let inner = Box::new(self.parse_type_ext(false)?);
                TypeRef::new(self.end_span(ps), TypeData::Pointer { is_mut, inner })
            }
            Kind::Fn | Kind::Unsafe | Kind::Extern => self.parse_fn_type(ps)?,
            Kind::Impl => {
                self.next()?;
                let (traits, lifetimes) = self.parse_trait_list()?;
                TypeRef::new(
                    self.end_span(ps),
                    TypeData::ErasedType { traits, lifetimes },
                )
            }
            Kind::For => {
                self.next()?;
                let hrbs = self.parse_hrb()?;
                let path = self.parse_path(PathGenericMode::Type)?;
                let first = PolyTraitRef { hrbs, path };
                self.parse_trait_object_rest(ps, first, allow_plus)?
            }
            Kind::SelfType => {
                // `Self::Item` is a path selection; bare `Self` the
                // implicit parameter.
                if self.lookahead(1)? == Kind::ColonColon {
                    let path = self.parse_path(PathGenericMode::Type)?;
                    TypeRef::new(self.end_span(ps), TypeData::Path(path))
                } else {
                    self.next()?;
                    TypeRef::self_type(self.end_span(ps))
                }
            }
            Kind::Ident(id) => {
                // Primitive type names, unless part of a longer path.
                let prim = CoreType::from_name(id.name.as_str());
                if let Some(core) = prim {
                    if self.lookahead(1)? != Kind::ColonColon {
                        self.next()?;
                        return Ok(TypeRef::new(
                            self.end_span(ps),
                            TypeData::Primitive(core),
                        ));
                    }
                }

                let path = self.parse_path(PathGenericMode::Type)?;
                let first = PolyTraitRef {
                    hrbs: Default::default(),
                    path,
                };
                self.parse_trait_object_rest(ps, first, allow_plus)?
            }
            Kind::ColonColon | Kind::Crate | Kind::Super | Kind::SelfValue | Kind::Lt
            | Kind::LtLt => {
                let path = self.parse_path(PathGenericMode::Type)?;
                let first = PolyTraitRef {
                    hrbs: Default::default(),
                    path,
                };
                self.parse_trait_object_rest(ps, first, allow_plus)?
            }
            _ => {
                let token = self.next()?;
                return Err(Self::unexpected(&token, &["type"]));
            }
        };

        Ok(ty)
    }

    fn parse_borrow_inner(&mut self, ps: crate::parse::ProtoSpan) -> Result<TypeRef> {
        let lifetime = self.eat_lifetime()?.map(LifetimeRef::new);
        let is_mut = self.eat(&Kind::Mut)?;
        let inner = Box::new(self.parse_type_ext(false)?);

        Ok(TypeRef::new(
            self.end_span(ps),
            TypeData::Borrow {
                lifetime,
                is_mut,
                inner,
            },
        ))
    }

    fn parse_fn_type(&mut self, ps: crate::parse::ProtoSpan) -> Result<TypeRef> {
        let is_unsafe = self.eat(&Kind::Unsafe)?;

        let abi = if self.eat(&Kind::Extern)? {
            if let Kind::Str(..) = self.lookahead(0)? {
                let (s, _) = self.expect_str()?;
                Some(Name::new(&s))
            } else {
                Some(Name::new("C"))
            }
        } else {
            None
        };

        self.expect(&Kind::Fn)?;
        self.expect(&Kind::Open(Delimiter::Parenthesis))?;

        let mut args = Vec::new();
        loop {
            if self.eat(&Kind::Close(Delimiter::Parenthesis))? {
                break;
            }
            args.push(self.parse_type()?);
            if !self.eat(&Kind::Comma)? {
                self.expect(&Kind::Close(Delimiter::Parenthesis))?;
                break;
            }
        }

        let ret = if self.eat(&Kind::Arrow)? {
            self.parse_type_ext(false)?
        } else {
            TypeRef::unit(self.last_span().tail())
        };

        Ok(TypeRef::new(
            self.end_span(ps),
            TypeData::Function(FunctionType {
                is_unsafe,
                abi,
                args,
                ret: Box::new(ret),
            }),
        ))
    }

    /// After a leading trait reference, collect `+ Trait + 'a ...` into a
    /// trait object, or return the bare path type.
    fn parse_trait_object_rest(
        &mut self,
        ps: crate::parse::ProtoSpan,
        first: PolyTraitRef,
        allow_plus: bool,
    ) -> Result<TypeRef> {
        let bare = first.hrbs.is_empty();

        if !allow_plus || self.lookahead(0)? != Kind::Plus {
            let span = self.end_span(ps);
            if bare {
                return Ok(TypeRef::new(span, TypeData::Path(first.path)));
            }
            return Ok(TypeRef::new(
                span,
                TypeData::TraitObject {
                    traits: vec![first],
                    lifetime: None,
                },
            ));
        }

        let mut traits = vec![first];
        let mut lifetime = None;

        while self.eat(&Kind::Plus)? {
            if let Some(id) = self.eat_lifetime()? {
                lifetime.get_or_insert(LifetimeRef::new(id));
                continue;
            }

            let hrbs = self.parse_hrb_opt()?;
            let path = self.parse_path(PathGenericMode::Type)?;
            traits.push(PolyTraitRef { hrbs, path });
        }

        Ok(TypeRef::new(
            self.end_span(ps),
            TypeData::TraitObject { traits, lifetime },
        ))
    }

    /// Parse the `+`-separated trait and lifetime list of an `impl Trait`
    /// type.
    fn parse_trait_list(&mut self) -> Result<(Vec<PolyTraitRef>, Vec<LifetimeRef>)> {
        let mut traits = Vec::new();
        let mut lifetimes = Vec::new();

        loop {
            if let Some(id) = self.eat_lifetime()? {
                lifetimes.push(LifetimeRef::new(id));
            } else {
                let hrbs = self.parse_hrb_opt()?;
                let path = self.parse_path(PathGenericMode::Type)?;
                traits.push(PolyTraitRef { hrbs, path });
            }

            if !self.eat(&Kind::Plus)? {
                break;
            }
        }

        Ok((traits, lifetimes))
    }
}

use crate::ast::{
    GenericBound, GenericBoundKind, GenericParams, HigherRankedBounds, LifetimeParam,
    LifetimeRef, TypeParam, TypeRef,
};
use crate::lex::{Delimiter, Kind};
use crate::parse::{Parser, PathGenericMode, Result};

impl<'s, 'a> Parser<'s, 'a> {
    /// Parse a `for<'a, ...>` binder, with `for` already consumed. Empty and
    /// comma-terminated lists are accepted.
    pub(crate) fn parse_hrb(&mut self) -> Result<HigherRankedBounds> {
        let mut rv = HigherRankedBounds::default();
        self.expect(&Kind::Lt)?;

        loop {
            if matches!(self.lookahead(0)?, Kind::Gt | Kind::GtGt | Kind::GtEq | Kind::GtGtEq)
            {
                break;
            }

            let ps = self.start_span();
            let attrs = self.parse_item_attrs()?;
            let name = self.expect_lifetime()?;
            rv.lifetimes.push(LifetimeParam {
                span: self.end_span(ps),
                attrs,
                name,
            });

            if !self.eat(&Kind::Comma)? {
                break;
            }
        }

        self.expect_gt()?;
        Ok(rv)
    }

    /// Parse an optional `for<...>` binder.
    pub(crate) fn parse_hrb_opt(&mut self) -> Result<HigherRankedBounds> {
        if self.eat(&Kind::For)? {
            self.parse_hrb()
        } else {
            Ok(HigherRankedBounds::default())
        }
    }

    /// Parse the `+`-separated bound list after a `:`, adding each bound on
    /// `checked_ty` to the parameter set.
    ///
    /// `outer_hrbs` is the binder that prefixed the whole clause (in
    /// `where for<'a> T: ...` position); a binder attached to a single trait
    /// reference inside the list is kept separately.
    pub(crate) fn parse_type_bounds(
        &mut self,
        params: &mut GenericParams,
        checked_ty: &TypeRef,
        outer_hrbs: HigherRankedBounds,
    ) -> Result<()> {
        let mut outer = Some(outer_hrbs);

        loop {
            let ps = self.start_span();

            if let Some(id) = self.eat_lifetime()? {
                params.add_bound(GenericBound {
                    span: self.end_span(ps),
                    kind: GenericBoundKind::TypeLifetime {
                        ty: checked_ty.clone(),
                        bound: LifetimeRef::new(id),
                    },
                });
            } else if self.eat(&Kind::Question)? {
                // The only valid ?Trait is the sized marker, which has no
                // generics worth binding.
                let _hrbs = self.parse_hrb_opt()?;
                let trait_ = self.parse_path(PathGenericMode::Type)?;
                params.add_bound(GenericBound {
                    span: self.end_span(ps),
                    kind: GenericBoundKind::MaybeTrait {
                        ty: checked_ty.clone(),
                        trait_,
                    },
                });
            } else if self.eat(&Kind::Bang)? {
                let trait_ = self.parse_path(PathGenericMode::Type)?;
                params.add_bound(GenericBound {
                    span: self.end_span(ps),
                    kind: GenericBoundKind::NotTrait {
                        ty: checked_ty.clone(),
                        trait_,
                    },
                });
            } else {
                let inner_hrbs = self.parse_hrb_opt()?;
                let trait_ = self.parse_path(PathGenericMode::Type)?;

                // If more bounds follow, later entries reuse the outer
                // binder.
                let this_outer = if self.lookahead(0)? == Kind::Plus {
                    outer.clone().unwrap_or_default()
                } else {
                    outer.take().unwrap_or_default()
                };

                params.add_bound(GenericBound {
                    span: self.end_span(ps),
                    kind: GenericBoundKind::IsTrait {
                        outer_hrbs: this_outer,
                        ty: checked_ty.clone(),
                        inner_hrbs,
                        trait_,
                    },
                });
            }

            if !self.eat(&Kind::Plus)? {
                break;
            }
        }

        Ok(())
    }

    /// Parse generic parameter declarations after the opening `<`. The
    /// closing `>` is left for the caller. Trailing commas are accepted;
    /// each parameter consumes its own attribute list. Defaults and bounds
    /// are collected into the shared bound set.
    pub(crate) fn parse_generic_params(&mut self) -> Result<GenericParams> {
        let mut ret = GenericParams::default();

        loop {
            if matches!(self.lookahead(0)?, Kind::Gt | Kind::GtGt | Kind::GtEq | Kind::GtGtEq)
            {
                break;
            }

            let ps = self.start_span();
            let attrs = self.parse_item_attrs()?;

            match self.lookahead(0)? {
                Kind::Ident(..) => {
                    let (name, name_span) = self.expect_ident()?;
                    let param_ty = TypeRef::new(
                        name_span,
                        crate::ast::TypeData::Path(crate::ast::Path::local(name_span, name)),
                    );

                    let mut default = None;

                    if self.eat(&Kind::Colon)? {
                        self.parse_type_bounds(
                            &mut ret,
                            &param_ty,
                            HigherRankedBounds::default(),
                        )?;
                    }

                    if self.eat(&Kind::Eq)? {
                        default = Some(self.parse_type()?);
                    }

                    ret.types.push(TypeParam {
                        span: self.end_span(ps),
                        attrs,
                        name,
                        default,
                    });
                }
                Kind::Lifetime(..) => {
                    let name = self.expect_lifetime()?;
                    let test = LifetimeRef::new(name);

                    if self.eat(&Kind::Colon)? {
                        loop {
                            let bps = self.start_span();
                            let bound = LifetimeRef::new(self.expect_lifetime()?);
                            ret.add_bound(GenericBound {
                                span: self.end_span(bps),
                                kind: GenericBoundKind::Lifetime {
                                    test: test.clone(),
                                    bound,
                                },
                            });
                            if !self.eat(&Kind::Plus)? {
                                break;
                            }
                        }
                    }

                    ret.lifetimes.push(LifetimeParam {
                        span: self.end_span(ps),
                        attrs,
                        name,
                    });
                }
                _ => {
                    let token = self.next()?;
                    return Err(Self::unexpected(&token, &["ident", "lifetime"]));
                }
            }

            if !self.eat(&Kind::Comma)? {
                break;
            }
        }

        Ok(ret)
    }

    /// Parse the contents of a `where` clause into the same bound set as
    /// inline parameter bounds. Stops before `{`, `;` or `=`.
    pub(crate) fn parse_where_clause(&mut self, params: &mut GenericParams) -> Result<()> {
        loop {
            match self.lookahead(0)? {
                Kind::Open(Delimiter::Brace) | Kind::Semi | Kind::Eq => break,
                _ => {}
            }

            if let Some(id) = self.eat_lifetime()? {
                let test = LifetimeRef::new(id);
                self.expect(&Kind::Colon)?;
                loop {
                    let bps = self.start_span();
                    let bound = LifetimeRef::new(self.expect_lifetime()?);
                    params.add_bound(GenericBound {
                        span: self.end_span(bps),
                        kind: GenericBoundKind::Lifetime {
                            test: test.clone(),
                            bound,
                        },
                    });
                    if !self.eat(&Kind::Plus)? {
                        break;
                    }
                }
            } else if self.eat(&Kind::For)? {
                let hrbs = self.parse_hrb()?;
                let ty = self.parse_type_no_plus()?;
                self.expect(&Kind::Colon)?;
                self.parse_type_bounds(params, &ty, hrbs)?;
            } else {
                let ps = self.start_span();
                let ty = self.parse_type_no_plus()?;

                if self.eat(&Kind::Eq)? {
                    let other = self.parse_type()?;
                    params.add_bound(GenericBound {
                        span: self.end_span(ps),
                        kind: GenericBoundKind::Equality { ty, other },
                    });
                } else {
                    self.expect(&Kind::Colon)?;
                    self.parse_type_bounds(params, &ty, HigherRankedBounds::default())?;
                }
            }

            if !self.eat(&Kind::Comma)? {
                break;
            }
        }

        Ok(())
    }
}

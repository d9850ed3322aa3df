use crate::ast::{
    AttributeList, Enum, EnumVariant, EnumVariantData, Expr, ExprKind, ExternBlock,
    FileInfo, Function, HigherRankedBounds, Impl, ImplDef, ImplItem, Item,
    MacroInvocation, Module, Named, NamedField, Path, PathClass, PathNode, PolyTraitRef,
    Static, StaticClass, Struct, StructData, Trait, TupleField, TypeAlias, TypeData,
    TypeRef, Union, UseEntry, UseItem, Visibility,
};
use crate::ast::item::ABI_SABLE;
use crate::lex::{Delimiter, Ident, Interpolated, Kind, TokenStream};
use crate::name::Name;
use crate::parse::{ParseError, Parser, PathGenericMode, Result};
use crate::span::Span;

impl<'s, 'a> Parser<'s, 'a> {
    /// Parse items into the given module until a closing brace or the end
    /// of input.
    pub fn parse_mod_items(
        &mut self,
        module: &mut Module,
        mod_path: &[Name],
    ) -> Result<()> {
        let file = module.file.clone();

        loop {
            match self.lookahead(0)? {
                Kind::Close(Delimiter::Brace) | Kind::Eof => return Ok(()),
                _ => {}
            }

            let attrs = self.parse_item_attrs()?;
            let item = self.parse_mod_item(&file, mod_path, attrs)?;
            module.push(item);
        }
    }

    /// Parse one module-level item, attributes already consumed.
    pub fn parse_mod_item(
        &mut self,
        file: &FileInfo,
        mod_path: &[Name],
        mut attrs: AttributeList,
    ) -> Result<Named<Item>> {
        if let Kind::Interpolated(frag) = self.lookahead(0)? {
            if let Interpolated::Item(mut item) = *frag {
                self.next()?;
                item.attrs.append(attrs);
                return Ok(item);
            }
        }

        let ps = self.start_span();

        // Items filtered by a failing cfg are parsed and dropped.
        let cfg_ok = self.attrs_cfg_ok(&attrs)?;

        if let Some(inv) = self.parse_macro_invocation_opt()? {
            return Ok(Named {
                span: self.end_span(ps),
                attrs,
                vis: Visibility::Inherited,
                name: None,
                data: if cfg_ok {
                    Item::MacroInvocation(inv)
                } else {
                    Item::None
                },
            });
        }

        let vis = self.parse_visibility(true, mod_path)?;

        let mut name = None;
        let data;

        match self.lookahead(0)? {
            Kind::Use => {
                self.next()?;
                data = Item::Use(self.parse_use()?);
                self.expect(&Kind::Semi)?;
            }
            Kind::Extern => {
                self.next()?;
                let (n, d) = self.parse_extern_item(&mut attrs, mod_path)?;
                name = n;
                data = d;
            }
            Kind::Const => {
                self.next()?;
                match self.lookahead(0)? {
                    Kind::Ident(..) => {
                        let (id, _) = self.expect_ident()?;
                        name = Some(id);
                        data = Item::Static(self.parse_const_body()?);
                    }
                    Kind::Unsafe => {
                        self.next()?;
                        self.expect(&Kind::Fn)?;
                        let (id, _) = self.expect_ident()?;
                        name = Some(id);
                        data = Item::Function(self.parse_fn_with_body(
                            Name::new(ABI_SABLE),
                            false,
                            true,
                            true,
                        )?);
                    }
                    Kind::Fn => {
                        self.next()?;
                        let (id, _) = self.expect_ident()?;
                        name = Some(id);
                        data = Item::Function(self.parse_fn_with_body(
                            Name::new(ABI_SABLE),
                            false,
                            false,
                            true,
                        )?);
                    }
                    _ => {
                        let token = self.next()?;
                        return Err(Self::unexpected(&token, &["ident", "fn"]));
                    }
                }
            }
            Kind::Static => {
                self.next()?;
                let class = if self.eat(&Kind::Mut)? {
                    StaticClass::Mut
                } else {
                    StaticClass::Static
                };
                let (id, _) = self.expect_ident()?;
                name = Some(id);

                self.expect(&Kind::Colon)?;
                let ty = self.parse_type()?;
                self.expect(&Kind::Eq)?;
                let value = self.parse_expr()?;
                self.expect(&Kind::Semi)?;

                data = Item::Static(Static {
                    class,
                    ty,
                    value: Some(value),
                });
            }
            Kind::Unsafe => {
                self.next()?;
                match self.lookahead(0)? {
                    Kind::Extern => {
                        self.next()?;
                        let abi = if let Kind::Str(..) = self.lookahead(0)? {
                            let (s, _) = self.expect_str()?;
                            Name::new(&s)
                        } else {
                            Name::new("C")
                        };
                        self.expect(&Kind::Fn)?;
                        let (id, _) = self.expect_ident()?;
                        name = Some(id);
                        data = Item::Function(self.parse_fn_with_body(abi, false, true, false)?);
                    }
                    Kind::Fn => {
                        self.next()?;
                        let (id, _) = self.expect_ident()?;
                        name = Some(id);
                        data = Item::Function(self.parse_fn_with_body(
                            Name::new(ABI_SABLE),
                            false,
                            true,
                            false,
                        )?);
                    }
                    Kind::Trait => {
                        self.next()?;
                        let (id, _) = self.expect_ident()?;
                        name = Some(id);
                        let mut tr = self.parse_trait_def(mod_path)?;
                        tr.is_unsafe = true;
                        data = Item::Trait(tr);
                    }
                    Kind::Impl => {
                        self.next()?;
                        let item = self.parse_impl(mod_path, true)?;
                        return Ok(Named {
                            span: self.end_span(ps),
                            attrs,
                            vis,
                            name: None,
                            data: if cfg_ok { item } else { Item::None },
                        });
                    }
                    Kind::Ident(id) if id.name == "auto" => {
                        self.next()?;
                        self.expect(&Kind::Trait)?;
                        let (id, _) = self.expect_ident()?;
                        name = Some(id);
                        let mut tr = self.parse_trait_def(mod_path)?;
                        tr.is_unsafe = true;
                        tr.is_marker = true;
                        data = Item::Trait(tr);
                    }
                    _ => {
                        let token = self.next()?;
                        return Err(Self::unexpected(&token, &["fn", "trait", "impl"]));
                    }
                }
            }
            Kind::Fn => {
                self.next()?;
                let (id, _) = self.expect_ident()?;
                name = Some(id);
                data = Item::Function(self.parse_fn_with_body(
                    Name::new(ABI_SABLE),
                    false,
                    false,
                    false,
                )?);
            }
            Kind::Type => {
                self.next()?;
                let (id, _) = self.expect_ident()?;
                name = Some(id);
                data = Item::TypeAlias(self.parse_type_alias()?);
            }
            Kind::Struct => {
                self.next()?;
                let (id, _) = self.expect_ident()?;
                name = Some(id);
                data = Item::Struct(self.parse_struct(mod_path)?);
            }
            Kind::Enum => {
                self.next()?;
                let (id, _) = self.expect_ident()?;
                name = Some(id);
                data = Item::Enum(self.parse_enum()?);
            }
            Kind::Ident(id) if id.name == "union" => {
                self.next()?;
                let (id, _) = self.expect_ident()?;
                name = Some(id);
                data = Item::Union(self.parse_union(mod_path)?);
            }
            Kind::Ident(id) if id.name == "auto" => {
                self.next()?;
                self.expect(&Kind::Trait)?;
                let (id, _) = self.expect_ident()?;
                name = Some(id);
                let mut tr = self.parse_trait_def(mod_path)?;
                tr.is_marker = true;
                data = Item::Trait(tr);
            }
            Kind::Impl => {
                self.next()?;
                let item = self.parse_impl(mod_path, false)?;
                return Ok(Named {
                    span: self.end_span(ps),
                    attrs,
                    vis,
                    name: None,
                    data: if cfg_ok { item } else { Item::None },
                });
            }
            Kind::Trait => {
                self.next()?;
                let (id, _) = self.expect_ident()?;
                name = Some(id);
                data = Item::Trait(self.parse_trait_def(mod_path)?);
            }
            Kind::Mod => {
                self.next()?;
                let (id, _) = self.expect_ident()?;
                name = Some(id);

                let path_attr = attrs.get("path").and_then(|a| a.as_str()).map(str::to_owned);

                match self.lookahead(0)? {
                    Kind::Open(Delimiter::Brace) => {
                        self.next()?;
                        let fi = self.inline_mod_file(
                            file,
                            mod_path,
                            id.name,
                            path_attr.as_deref(),
                        );
                        let mut submod = Module::new(fi);
                        let mut sub_path: Vec<Name> = mod_path.to_vec();
                        sub_path.push(id.name);

                        self.parse_parent_attrs(&mut attrs)?;
                        self.parse_mod_items(&mut submod, &sub_path)?;
                        self.expect(&Kind::Close(Delimiter::Brace))?;

                        data = Item::Module(submod);
                    }
                    Kind::Semi => {
                        self.next()?;

                        if !cfg_ok {
                            data = Item::None;
                        } else {
                            let span = self.last_span();
                            let submod = self.load_module_file(
                                file,
                                mod_path,
                                id,
                                &mut attrs,
                                path_attr.as_deref(),
                                span,
                            )?;
                            data = Item::Module(submod);
                        }
                    }
                    _ => {
                        let token = self.next()?;
                        return Err(Self::unexpected(&token, &["{", ";"]));
                    }
                }
            }
            _ => {
                let token = self.next()?;
                return Err(Self::unexpected(&token, &["item"]));
            }
        }

        Ok(Named {
            span: self.end_span(ps),
            attrs,
            vis,
            name,
            data: if cfg_ok { data } else { Item::None },
        })
    }

    /// Parse visibility, `pub` and its restricted forms.
    ///
    /// Inside tuple-struct field position `allow_restricted` is off:
    /// `pub (Type,)` would otherwise be indistinguishable from
    /// `pub(restricted)`, so only the exact restricted spellings are taken.
    pub fn parse_visibility(
        &mut self,
        allow_restricted: bool,
        mod_path: &[Name],
    ) -> Result<Visibility> {
        if let Kind::Interpolated(frag) = self.lookahead(0)? {
            if let Interpolated::Vis(vis) = *frag {
                self.next()?;
                return Ok(vis);
            }
        }

        // A bare `crate` visibility qualifier.
        if self.lookahead(0)? == Kind::Crate && self.lookahead(1)? != Kind::ColonColon {
            let token = self.next()?;
            return Ok(Visibility::Restricted {
                path: Path::absolute(token.span, Name::empty(), Vec::new()),
            });
        }

        if self.lookahead(0)? != Kind::Pub {
            return Ok(Visibility::Inherited);
        }

        let ps = self.start_span();
        self.next()?;

        if self.lookahead(0)? != Kind::Open(Delimiter::Parenthesis) {
            return Ok(Visibility::Public);
        }

        if !allow_restricted {
            let second = self.lookahead(1)?;
            let third = self.lookahead(2)?;
            let close = Kind::Close(Delimiter::Parenthesis);

            let restricted = second == Kind::In
                || (second == Kind::Crate && third == close)
                || (second == Kind::Super && third == close)
                || (second == Kind::SelfValue && third == close);

            if !restricted {
                return Ok(Visibility::Public);
            }
        }

        self.expect(&Kind::Open(Delimiter::Parenthesis))?;

        let mut nodes: Vec<PathNode> = Vec::new();

        let token = self.next()?;
        match token.kind {
            Kind::Crate => {}
            Kind::SelfValue => {
                nodes = mod_path.iter().map(|n| PathNode::new(Ident::new(n.as_str()))).collect();
            }
            Kind::Super => {
                let mut components: Vec<Name> = mod_path.to_vec();
                components.pop();
                while self.lookahead(0)? == Kind::ColonColon
                    && self.lookahead(1)? == Kind::Super
                {
                    self.next()?;
                    self.next()?;
                    components.pop();
                }
                nodes = components
                    .into_iter()
                    .map(|n| PathNode::new(Ident::new(n.as_str())))
                    .collect();
                while self.eat(&Kind::ColonColon)? {
                    let (id, _) = self.expect_ident()?;
                    nodes.push(PathNode::new(id));
                }
            }
            Kind::In => {
                let (id, _) = self.expect_ident()?;
                nodes.push(PathNode::new(id));
                while self.eat(&Kind::ColonColon)? {
                    let (id, _) = self.expect_ident()?;
                    nodes.push(PathNode::new(id));
                }
            }
            _ => return Err(Self::unexpected(&token, &["crate", "self", "super", "in"])),
        }

        self.expect(&Kind::Close(Delimiter::Parenthesis))?;

        Ok(Visibility::Restricted {
            path: Path::absolute(self.end_span(ps), Name::empty(), nodes),
        })
    }

    /// Continue an item that started with `extern`: an extern crate, an
    /// extern block, or an extern function.
    fn parse_extern_item(
        &mut self,
        attrs: &mut AttributeList,
        mod_path: &[Name],
    ) -> Result<(Option<Ident>, Item)> {
        match self.lookahead(0)? {
            Kind::Str(..) => {
                let (abi, _) = self.expect_str()?;
                let abi = Name::new(&abi);
                match self.lookahead(0)? {
                    Kind::Fn => {
                        self.next()?;
                        let (id, _) = self.expect_ident()?;
                        let f = self.parse_fn_with_body(abi, false, false, false)?;
                        Ok((Some(id), Item::Function(f)))
                    }
                    Kind::Open(Delimiter::Brace) => {
                        self.next()?;
                        let block = self.parse_extern_block(abi, attrs, mod_path)?;
                        Ok((None, Item::ExternBlock(block)))
                    }
                    _ => {
                        let token = self.next()?;
                        Err(Self::unexpected(&token, &["fn", "{"]))
                    }
                }
            }
            Kind::Fn => {
                self.next()?;
                let (id, _) = self.expect_ident()?;
                let f = self.parse_fn_with_body(Name::new("C"), false, false, false)?;
                Ok((Some(id), Item::Function(f)))
            }
            Kind::Open(Delimiter::Brace) => {
                self.next()?;
                let block = self.parse_extern_block(Name::new("C"), attrs, mod_path)?;
                Ok((None, Item::ExternBlock(block)))
            }
            Kind::Crate => {
                self.next()?;
                let token = self.next()?;
                let (name, local) = match token.kind {
                    // `extern crate "crate-name" as name;`
                    Kind::Str(s) => {
                        self.expect(&Kind::As)?;
                        let (id, _) = self.expect_ident()?;
                        (Name::new(&s), id)
                    }
                    Kind::Ident(id) => {
                        if self.eat(&Kind::As)? {
                            let (local, _) = self.expect_ident()?;
                            (id.name, local)
                        } else {
                            (id.name, id)
                        }
                    }
                    _ => return Err(Self::unexpected(&token, &["string", "ident"])),
                };
                self.expect(&Kind::Semi)?;
                Ok((Some(local), Item::Crate { name }))
            }
            _ => {
                let token = self.next()?;
                Err(Self::unexpected(&token, &["string", "fn", "{", "crate"]))
            }
        }
    }

    fn parse_const_body(&mut self) -> Result<Static> {
        self.expect(&Kind::Colon)?;
        let ty = self.parse_type()?;
        self.expect(&Kind::Eq)?;
        let value = self.parse_expr()?;
        self.expect(&Kind::Semi)?;

        Ok(Static {
            class: StaticClass::Const,
            ty,
            value: Some(value),
        })
    }

    /// Parse a function signature after `fn name`, through the optional
    /// `where` clause.
    pub(crate) fn parse_function_def(
        &mut self,
        abi: Name,
        allow_self: bool,
        can_be_prototype: bool,
        is_unsafe: bool,
        is_const: bool,
    ) -> Result<Function> {
        let ps = self.start_span();

        let mut params = Default::default();
        if self.eat_lt()? {
            params = self.parse_generic_params()?;
            self.expect_gt()?;
        }

        self.expect(&Kind::Open(Delimiter::Parenthesis))?;

        let mut args: Vec<(crate::ast::Pattern, TypeRef)> = Vec::new();

        self.parse_self_arg(&mut args, allow_self)?;

        let mut is_variadic = false;

        if !args.is_empty() && self.lookahead(0)? != Kind::Close(Delimiter::Parenthesis) {
            self.expect(&Kind::Comma)?;
        }

        loop {
            if self.eat(&Kind::Close(Delimiter::Parenthesis))? {
                break;
            }
            if self.eat(&Kind::DotDotDot)? {
                is_variadic = true;
                self.expect(&Kind::Close(Delimiter::Parenthesis))?;
                break;
            }

            args.push(self.parse_function_arg(!can_be_prototype)?);

            if !self.eat(&Kind::Comma)? {
                self.expect(&Kind::Close(Delimiter::Parenthesis))?;
                break;
            }
        }

        let ret = if self.eat(&Kind::Arrow)? {
            self.parse_type()?
        } else {
            TypeRef::unit(self.last_span().tail())
        };

        if self.eat(&Kind::Where)? {
            self.parse_where_clause(&mut params)?;
        }

        Ok(Function {
            span: self.end_span(ps),
            params,
            abi,
            is_unsafe,
            is_const,
            is_variadic,
            args,
            ret,
            code: None,
        })
    }

    /// Recognize a leading `self` argument in its four shapes, synthesizing
    /// a `self: Type` binding pair.
    fn parse_self_arg(
        &mut self,
        args: &mut Vec<(crate::ast::Pattern, TypeRef)>,
        allow_self: bool,
    ) -> Result<()> {
        let self_err = |span: Span| ParseError::msg(span, "self binding not expected here");

        match self.lookahead(0)? {
            Kind::Amp => {
                // Peek through `&`, an optional lifetime, and an optional
                // `mut` for `self`.
                let is_self = match (self.lookahead(1)?, self.lookahead(2)?) {
                    (Kind::SelfValue, _) => true,
                    (Kind::Mut, Kind::SelfValue) => true,
                    (Kind::Lifetime(..), Kind::SelfValue) => true,
                    (Kind::Lifetime(..), Kind::Mut) => true,
                    _ => false,
                };

                if !is_self {
                    return Ok(());
                }

                let ps = self.start_span();
                self.next()?;

                let lifetime = self.eat_lifetime()?.map(crate::ast::LifetimeRef::new);
                let is_mut = self.eat(&Kind::Mut)?;
                let token = self.expect(&Kind::SelfValue)?;
                let span = self.end_span(ps);

                if !allow_self {
                    return Err(self_err(token.span));
                }

                let ty = TypeRef::new(
                    span,
                    TypeData::Borrow {
                        lifetime,
                        is_mut,
                        inner: Box::new(TypeRef::self_type(span)),
                    },
                );
                args.push((crate::ast::Pattern::bind(span, Ident::new("self")), ty));
            }
            Kind::Mut if self.lookahead(1)? == Kind::SelfValue => {
                let ps = self.start_span();
                self.next()?;
                let token = self.next()?;
                let span = self.end_span(ps);

                if !allow_self {
                    return Err(self_err(token.span));
                }

                let ty = if self.eat(&Kind::Colon)? {
                    self.parse_type()?
                } else {
                    TypeRef::self_type(span)
                };
                args.push((crate::ast::Pattern::bind(span, Ident::new("self")), ty));
            }
            Kind::SelfValue => {
                let token = self.next()?;

                if !allow_self {
                    return Err(self_err(token.span));
                }

                let ty = if self.eat(&Kind::Colon)? {
                    self.parse_type()?
                } else {
                    TypeRef::self_type(token.span)
                };
                args.push((crate::ast::Pattern::bind(token.span, Ident::new("self")), ty));
            }
            _ => {}
        }

        Ok(())
    }

    /// Parse one function argument: named `pattern: type` when
    /// `expect_named` (or when the tokens force it), bare `type` in
    /// prototype form.
    fn parse_function_arg(
        &mut self,
        expect_named: bool,
    ) -> Result<(crate::ast::Pattern, TypeRef)> {
        let named = expect_named
            || self.lookahead(0)? == Kind::Underscore
            || self.lookahead(0)? == Kind::Mut
            || (matches!(self.lookahead(0)?, Kind::Ident(..))
                && self.lookahead(1)? == Kind::Colon);

        let pat = if named {
            let pat = self.parse_pattern(false)?;
            self.expect(&Kind::Colon)?;
            pat
        } else {
            crate::ast::Pattern::any(self.point_span())
        };

        let ty = self.parse_type()?;
        Ok((pat, ty))
    }

    /// Parse a function definition followed by a mandatory body.
    pub(crate) fn parse_fn_with_body(
        &mut self,
        abi: Name,
        allow_self: bool,
        is_unsafe: bool,
        is_const: bool,
    ) -> Result<Function> {
        let mut f = self.parse_function_def(abi, allow_self, false, is_unsafe, is_const)?;

        // The body gets its own hygiene scope.
        self.push_hygiene();
        let block = self.parse_block()?;
        self.pop_hygiene();

        let span = block.span;
        f.code = Some(Expr::new(span, ExprKind::Block(block)));
        Ok(f)
    }

    fn parse_type_alias(&mut self) -> Result<TypeAlias> {
        let mut params = Default::default();

        if self.eat_lt()? {
            params = self.parse_generic_params()?;
            self.expect_gt()?;
        }

        if self.eat(&Kind::Where)? {
            self.parse_where_clause(&mut params)?;
        }

        self.expect(&Kind::Eq)?;
        let ty = self.parse_type()?;
        self.expect(&Kind::Semi)?;

        Ok(TypeAlias { params, ty })
    }

    fn parse_struct(&mut self, mod_path: &[Name]) -> Result<Struct> {
        let mut params = Default::default();

        if self.eat_lt()? {
            params = self.parse_generic_params()?;
            self.expect_gt()?;
            if self.eat(&Kind::Where)? {
                self.parse_where_clause(&mut params)?;
            }
        }

        match self.lookahead(0)? {
            Kind::Open(Delimiter::Parenthesis) => {
                self.next()?;
                let mut fields = Vec::new();

                loop {
                    if self.eat(&Kind::Close(Delimiter::Parenthesis))? {
                        break;
                    }

                    let attrs = self.parse_item_attrs()?;
                    // Restricted visibility is disabled here due to the
                    // `pub (Type,)` ambiguity.
                    let vis = self.parse_visibility(false, mod_path)?;
                    let ty = self.parse_type()?;
                    fields.push(TupleField { attrs, vis, ty });

                    if !self.eat(&Kind::Comma)? {
                        self.expect(&Kind::Close(Delimiter::Parenthesis))?;
                        break;
                    }
                }

                if self.eat(&Kind::Where)? {
                    self.parse_where_clause(&mut params)?;
                }
                self.expect(&Kind::Semi)?;

                Ok(Struct {
                    params,
                    data: StructData::Tuple(fields),
                })
            }
            Kind::Semi => {
                self.next()?;
                Ok(Struct {
                    params,
                    data: StructData::Unit,
                })
            }
            Kind::Open(Delimiter::Brace) => {
                self.next()?;
                let fields = self.parse_named_fields(mod_path)?;
                Ok(Struct {
                    params,
                    data: StructData::Named(fields),
                })
            }
            _ => {
                let token = self.next()?;
                Err(Self::unexpected(&token, &["(", "{", ";"]))
            }
        }
    }

    /// Parse `name: Type` fields up to and including the closing brace.
    fn parse_named_fields(&mut self, mod_path: &[Name]) -> Result<Vec<NamedField>> {
        let mut fields = Vec::new();

        loop {
            if self.eat(&Kind::Close(Delimiter::Brace))? {
                break;
            }

            let attrs = self.parse_item_attrs()?;
            let vis = self.parse_visibility(true, mod_path)?;
            let (name, _) = self.expect_ident()?;
            self.expect(&Kind::Colon)?;
            let ty = self.parse_type()?;
            fields.push(NamedField {
                attrs,
                vis,
                name,
                ty,
            });

            if !self.eat(&Kind::Comma)? {
                self.expect(&Kind::Close(Delimiter::Brace))?;
                break;
            }
        }

        Ok(fields)
    }

    fn parse_enum(&mut self) -> Result<Enum> {
        let mut params = Default::default();

        if self.eat_lt()? {
            params = self.parse_generic_params()?;
            self.expect_gt()?;
            if self.eat(&Kind::Where)? {
                self.parse_where_clause(&mut params)?;
            }
        }

        self.expect(&Kind::Open(Delimiter::Brace))?;

        let mut variants = Vec::new();

        loop {
            if self.eat(&Kind::Close(Delimiter::Brace))? {
                break;
            }

            let ps = self.start_span();
            let attrs = self.parse_item_attrs()?;
            let (name, _) = self.expect_ident()?;

            let data = match self.lookahead(0)? {
                Kind::Open(Delimiter::Parenthesis) => {
                    self.next()?;
                    let mut types = Vec::new();
                    loop {
                        if self.eat(&Kind::Close(Delimiter::Parenthesis))? {
                            break;
                        }
                        let _field_attrs = self.parse_item_attrs()?;
                        types.push(self.parse_type()?);
                        if !self.eat(&Kind::Comma)? {
                            self.expect(&Kind::Close(Delimiter::Parenthesis))?;
                            break;
                        }
                    }
                    EnumVariantData::Tuple(types)
                }
                Kind::Open(Delimiter::Brace) => {
                    self.next()?;
                    let mut fields = Vec::new();
                    loop {
                        if self.eat(&Kind::Close(Delimiter::Brace))? {
                            break;
                        }
                        let attrs = self.parse_item_attrs()?;
                        let (name, _) = self.expect_ident()?;
                        self.expect(&Kind::Colon)?;
                        let ty = self.parse_type()?;
                        fields.push(NamedField {
                            attrs,
                            // Variant fields are always visible with the
                            // variant.
                            vis: Visibility::Public,
                            name,
                            ty,
                        });
                        if !self.eat(&Kind::Comma)? {
                            self.expect(&Kind::Close(Delimiter::Brace))?;
                            break;
                        }
                    }
                    EnumVariantData::Struct(fields)
                }
                Kind::Eq => {
                    self.next()?;
                    EnumVariantData::Value(self.parse_expr()?)
                }
                _ => EnumVariantData::Unit,
            };

            variants.push(EnumVariant {
                span: self.end_span(ps),
                attrs,
                name,
                data,
            });

            if !self.eat(&Kind::Comma)? {
                self.expect(&Kind::Close(Delimiter::Brace))?;
                break;
            }
        }

        Ok(Enum { params, variants })
    }

    fn parse_union(&mut self, mod_path: &[Name]) -> Result<Union> {
        let mut params = Default::default();

        if self.eat_lt()? {
            params = self.parse_generic_params()?;
            self.expect_gt()?;
            if self.eat(&Kind::Where)? {
                self.parse_where_clause(&mut params)?;
            }
        }

        self.expect(&Kind::Open(Delimiter::Brace))?;
        let fields = self.parse_named_fields(mod_path)?;

        Ok(Union { params, fields })
    }

    fn parse_trait_def(&mut self, mod_path: &[Name]) -> Result<Trait> {
        let mut params = Default::default();

        if self.eat_lt()? {
            params = self.parse_generic_params()?;
            self.expect_gt()?;
        }

        let mut supertraits = Vec::new();

        if self.eat(&Kind::Colon)? {
            loop {
                if let Some(id) = self.eat_lifetime()? {
                    // Lifetime supertraits become bounds on Self.
                    let span = self.last_span();
                    params.add_bound(crate::ast::GenericBound {
                        span,
                        kind: crate::ast::GenericBoundKind::TypeLifetime {
                            ty: TypeRef::self_type(span),
                            bound: crate::ast::LifetimeRef::new(id),
                        },
                    });
                } else {
                    let hrbs = self.parse_hrb_opt()?;
                    let path = self.parse_path(PathGenericMode::Type)?;
                    supertraits.push(PolyTraitRef { hrbs, path });
                }

                if !self.eat(&Kind::Plus)? {
                    break;
                }
            }
        }

        if self.eat(&Kind::Where)? {
            self.parse_where_clause(&mut params)?;
        }

        self.expect(&Kind::Open(Delimiter::Brace))?;

        let mut items = Vec::new();
        while !self.eat(&Kind::Close(Delimiter::Brace))? {
            items.push(self.parse_trait_item(mod_path)?);
        }

        Ok(Trait {
            params,
            supertraits,
            is_unsafe: false,
            is_marker: false,
            items,
        })
    }

    fn parse_trait_item(&mut self, _mod_path: &[Name]) -> Result<Named<Item>> {
        let attrs = self.parse_item_attrs()?;
        let ps = self.start_span();

        if let Some(inv) = self.parse_macro_invocation_opt()? {
            return Ok(Named {
                span: self.end_span(ps),
                attrs,
                vis: Visibility::Inherited,
                name: None,
                data: Item::MacroInvocation(inv),
            });
        }

        // `default` on trait items is accepted and currently unused.
        if let Kind::Ident(id) = self.lookahead(0)? {
            if id.name == "default" {
                self.next()?;
            }
        }

        let mut fn_is_unsafe = false;
        let mut abi = Name::new(ABI_SABLE);

        let name;
        let data;

        match self.lookahead(0)? {
            Kind::Static => {
                self.next()?;
                let class = if self.eat(&Kind::Mut)? {
                    StaticClass::Mut
                } else {
                    StaticClass::Static
                };
                let (id, _) = self.expect_ident()?;
                name = id;
                self.expect(&Kind::Colon)?;
                let ty = self.parse_type()?;
                let value = if self.eat(&Kind::Eq)? {
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                self.expect(&Kind::Semi)?;
                data = Item::Static(Static { class, ty, value });
            }
            Kind::Const => {
                self.next()?;
                let (id, _) = self.expect_ident()?;
                name = id;
                self.expect(&Kind::Colon)?;
                let ty = self.parse_type()?;
                let value = if self.eat(&Kind::Eq)? {
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                self.expect(&Kind::Semi)?;
                data = Item::Static(Static {
                    class: StaticClass::Const,
                    ty,
                    value,
                });
            }
            Kind::Type => {
                self.next()?;
                let (id, _) = self.expect_ident()?;
                name = id;

                let mut atype_params = Default::default();
                if self.eat(&Kind::Colon)? {
                    let self_ty = TypeRef::self_type(self.point_span());
                    self.parse_type_bounds(
                        &mut atype_params,
                        &self_ty,
                        HigherRankedBounds::default(),
                    )?;
                }

                let ty = if self.eat(&Kind::Eq)? {
                    self.parse_type()?
                } else {
                    TypeRef::invalid(self.point_span())
                };
                self.expect(&Kind::Semi)?;

                data = Item::TypeAlias(TypeAlias {
                    params: atype_params,
                    ty,
                });
            }
            Kind::Unsafe | Kind::Extern | Kind::Fn => {
                if self.eat(&Kind::Unsafe)? {
                    fn_is_unsafe = true;
                }
                if self.eat(&Kind::Extern)? {
                    abi = if let Kind::Str(..) = self.lookahead(0)? {
                        let (s, _) = self.expect_str()?;
                        Name::new(&s)
                    } else {
                        Name::new("C")
                    };
                }
                self.expect(&Kind::Fn)?;
                let (id, _) = self.expect_ident()?;
                name = id;

                // Self allowed, prototype form allowed.
                let mut f = self.parse_function_def(abi, true, true, fn_is_unsafe, false)?;

                if self.lookahead(0)? == Kind::Open(Delimiter::Brace) {
                    self.push_hygiene();
                    let block = self.parse_block()?;
                    self.pop_hygiene();
                    let span = block.span;
                    f.code = Some(Expr::new(span, ExprKind::Block(block)));
                } else {
                    self.expect(&Kind::Semi)?;
                }

                data = Item::Function(f);
            }
            _ => {
                let token = self.next()?;
                return Err(Self::unexpected(
                    &token,
                    &["static", "const", "type", "fn"],
                ));
            }
        }

        Ok(Named {
            span: self.end_span(ps),
            attrs,
            vis: Visibility::Inherited,
            name: Some(name),
            data,
        })
    }

    /// Parse an impl block after the `impl` keyword.
    fn parse_impl(&mut self, mod_path: &[Name], is_unsafe: bool) -> Result<Item> {
        let mut params = Default::default();

        if self.eat_lt()? {
            params = self.parse_generic_params()?;
            self.expect_gt()?;
        }

        // `impl !Trait for Type {}`: negative impls must name a trait and
        // have an empty body.
        if self.eat(&Kind::Bang)? {
            let trait_ = self.parse_path(PathGenericMode::Type)?;
            self.expect(&Kind::For)?;
            let ty = self.parse_type()?;

            if self.eat(&Kind::Where)? {
                self.parse_where_clause(&mut params)?;
            }

            self.expect(&Kind::Open(Delimiter::Brace))?;
            self.expect(&Kind::Close(Delimiter::Brace))?;

            return Ok(Item::NegImpl(ImplDef {
                is_unsafe,
                params,
                trait_: Some(trait_),
                ty,
            }));
        }

        let first = self.parse_type()?;

        let (trait_, ty) = if self.eat(&Kind::For)? {
            // All traits parse as valid types, so the first type doubles as
            // the trait path.
            let span = first.span;
            let trait_path = first
                .into_path()
                .ok_or_else(|| ParseError::msg(span, "trait to implement was not a path"))?;

            let ty = if self.eat(&Kind::DotDot)? {
                // A default impl has no concrete type.
                TypeRef::invalid(self.point_span())
            } else {
                self.parse_type()?
            };

            (Some(trait_path), ty)
        } else {
            (None, first)
        };

        if self.eat(&Kind::Where)? {
            self.parse_where_clause(&mut params)?;
        }

        self.expect(&Kind::Open(Delimiter::Brace))?;

        let def = ImplDef {
            is_unsafe,
            params,
            trait_,
            ty,
        };

        let mut items = Vec::new();
        while !self.eat(&Kind::Close(Delimiter::Brace))? {
            items.push(self.parse_impl_item(mod_path)?);
        }

        Ok(Item::Impl(Impl { def, items }))
    }

    fn parse_impl_item(&mut self, mod_path: &[Name]) -> Result<ImplItem> {
        let attrs = self.parse_item_attrs()?;
        let ps = self.start_span();

        if let Some(inv) = self.parse_macro_invocation_opt()? {
            return Ok(ImplItem {
                span: self.end_span(ps),
                attrs,
                vis: Visibility::Inherited,
                is_specializable: false,
                name: None,
                data: Item::MacroInvocation(inv),
            });
        }

        let vis = self.parse_visibility(true, mod_path)?;

        let mut is_specializable = false;
        if let Kind::Ident(id) = self.lookahead(0)? {
            if id.name == "default" {
                self.next()?;
                is_specializable = true;
            }
        }

        let name;
        let data;

        match self.lookahead(0)? {
            Kind::Type => {
                self.next()?;
                let (id, _) = self.expect_ident()?;
                name = id;
                self.expect(&Kind::Eq)?;
                let ty = self.parse_type()?;
                self.expect(&Kind::Semi)?;
                data = Item::TypeAlias(TypeAlias {
                    params: Default::default(),
                    ty,
                });
            }
            _ => {
                let mut is_unsafe = self.eat(&Kind::Unsafe)?;
                let is_const = self.eat(&Kind::Const)?;

                // `const NAME: T = ...;` associated constant.
                if is_const && !is_unsafe && matches!(self.lookahead(0)?, Kind::Ident(..)) {
                    let (id, _) = self.expect_ident()?;
                    name = id;
                    data = Item::Static(self.parse_const_body()?);
                } else {
                    // `const unsafe fn` spells the qualifiers in either
                    // order.
                    if !is_unsafe {
                        is_unsafe = self.eat(&Kind::Unsafe)?;
                    }

                    let abi = if self.eat(&Kind::Extern)? {
                        if let Kind::Str(..) = self.lookahead(0)? {
                            let (s, _) = self.expect_str()?;
                            Name::new(&s)
                        } else {
                            Name::new("C")
                        }
                    } else {
                        Name::new(ABI_SABLE)
                    };

                    self.expect(&Kind::Fn)?;
                    let (id, _) = self.expect_ident()?;
                    name = id;
                    data = Item::Function(self.parse_fn_with_body(
                        abi, true, is_unsafe, is_const,
                    )?);
                }
            }
        }

        Ok(ImplItem {
            span: self.end_span(ps),
            attrs,
            vis,
            is_specializable,
            name: Some(name),
            data,
        })
    }

    fn parse_extern_block(
        &mut self,
        abi: Name,
        block_attrs: &mut AttributeList,
        mod_path: &[Name],
    ) -> Result<ExternBlock> {
        self.parse_parent_attrs(block_attrs)?;

        let mut items = Vec::new();

        while !self.eat(&Kind::Close(Delimiter::Brace))? {
            let attrs = self.parse_item_attrs()?;
            let ps = self.start_span();
            let vis = self.parse_visibility(true, mod_path)?;

            let token = self.next()?;
            let (name, data) = match token.kind {
                Kind::Fn => {
                    let (id, _) = self.expect_ident()?;
                    // Prototype form: no self, unsafe to call.
                    let f = self.parse_function_def(abi, false, true, true, false)?;
                    self.expect(&Kind::Semi)?;
                    (id, Item::Function(f))
                }
                Kind::Static => {
                    let class = if self.eat(&Kind::Mut)? {
                        StaticClass::Mut
                    } else {
                        StaticClass::Static
                    };
                    let (id, _) = self.expect_ident()?;
                    self.expect(&Kind::Colon)?;
                    let ty = self.parse_type()?;
                    self.expect(&Kind::Semi)?;
                    (id, Item::Static(Static {
                        class,
                        ty,
                        value: None,
                    }))
                }
                Kind::Type => {
                    let (id, _) = self.expect_ident()?;
                    self.expect(&Kind::Semi)?;
                    // An extern type: a type alias with no aliased type.
                    (id, Item::TypeAlias(TypeAlias {
                        params: Default::default(),
                        ty: TypeRef::invalid(self.last_span()),
                    }))
                }
                _ => {
                    return Err(Self::unexpected(&token, &["fn", "static", "type"]));
                }
            };

            items.push(Named {
                span: self.end_span(ps),
                attrs,
                vis,
                name: Some(name),
                data,
            });
        }

        Ok(ExternBlock { abi, items })
    }

    /// Parse a `use` item into its flattened entries.
    fn parse_use(&mut self) -> Result<UseItem> {
        let ps = self.start_span();
        let mut entries = Vec::new();

        let mut path = match self.lookahead(0)? {
            Kind::SelfValue => {
                self.next()?;
                self.expect(&Kind::ColonColon)?;
                Path {
                    span: self.end_span(ps),
                    class: PathClass::Self_ { nodes: Vec::new() },
                }
            }
            Kind::Super => {
                self.next()?;
                let mut count = 1;
                while self.lookahead(0)? == Kind::ColonColon
                    && self.lookahead(1)? == Kind::Super
                {
                    self.next()?;
                    self.next()?;
                    count += 1;
                }
                self.expect(&Kind::ColonColon)?;
                Path {
                    span: self.end_span(ps),
                    class: PathClass::Super {
                        count,
                        nodes: Vec::new(),
                    },
                }
            }
            Kind::Crate => {
                self.next()?;
                self.expect(&Kind::ColonColon)?;
                Path::absolute(self.end_span(ps), Name::empty(), Vec::new())
            }
            Kind::ColonColon => {
                self.next()?;
                // Macro output names crates as `::"name"::...`.
                let crate_name = if let Kind::Str(..) = self.lookahead(0)? {
                    let (s, _) = self.expect_str()?;
                    self.expect(&Kind::ColonColon)?;
                    Name::new(&s)
                } else {
                    Name::empty()
                };
                Path::absolute(self.end_span(ps), crate_name, Vec::new())
            }
            // Plain `use a::b;` is crate-relative.
            _ => Path::absolute(self.point_span(), Name::empty(), Vec::new()),
        };

        self.parse_use_inner(&mut entries, &mut path)?;

        Ok(UseItem { entries })
    }

    /// Parse the tail of a use tree, appending entries. `path` is the
    /// prefix accumulated so far and is restored around nested braces.
    fn parse_use_inner(
        &mut self,
        entries: &mut Vec<UseEntry>,
        path: &mut Path,
    ) -> Result<()> {
        loop {
            let token = self.next()?;
            match token.kind {
                Kind::Ident(id) => {
                    path.push(PathNode::new(id));
                }
                Kind::SelfValue => {
                    // `self` in a brace group imports the prefix itself.
                    let name = match path.nodes().last() {
                        Some(node) => node.name.name,
                        None => {
                            return Err(ParseError::msg(token.span, "`use self` with no path"));
                        }
                    };
                    let name = if self.eat(&Kind::As)? {
                        let (id, _) = self.expect_ident()?;
                        id.name
                    } else {
                        name
                    };
                    entries.push(UseEntry {
                        span: self.last_span(),
                        path: path.clone(),
                        name: Some(name),
                    });
                    return Ok(());
                }
                Kind::Open(Delimiter::Brace) => {
                    if self.lookahead(0)? == Kind::Close(Delimiter::Brace) {
                        let token = self.next()?;
                        return Err(Self::unexpected(&token, &["use entry"]));
                    }

                    loop {
                        if self.eat(&Kind::Close(Delimiter::Brace))? {
                            return Ok(());
                        }

                        let depth = path.nodes().len();
                        self.parse_use_inner(entries, path)?;
                        path.nodes_mut().truncate(depth);

                        if !self.eat(&Kind::Comma)? {
                            self.expect(&Kind::Close(Delimiter::Brace))?;
                            return Ok(());
                        }
                    }
                }
                Kind::Star => {
                    entries.push(UseEntry {
                        span: token.span,
                        path: path.clone(),
                        name: None,
                    });
                    return Ok(());
                }
                _ => return Err(Self::unexpected(&token, &["ident", "{", "*"])),
            }

            if !self.eat(&Kind::ColonColon)? {
                break;
            }
        }

        // The loop consumed at least one identifier.
        let name = if self.eat(&Kind::As)? {
            let (id, _) = self.expect_ident()?;
            id.name
        } else {
            path.nodes()
                .last()
                .map(|node| node.name.name)
                .expect("use path has at least one node")
        };

        entries.push(UseEntry {
            span: self.last_span(),
            path: path.clone(),
            name: Some(name),
        });

        Ok(())
    }

    /// Recognize `name! ...` or an interpolated path followed by `!` as a
    /// macro invocation. At the item level a non-braced invocation must be
    /// terminated by `;`.
    pub(crate) fn parse_macro_invocation_opt(
        &mut self,
    ) -> Result<Option<MacroInvocation>> {
        let is_inv = match self.lookahead(0)? {
            Kind::Ident(..) => self.lookahead(1)? == Kind::Bang,
            Kind::Interpolated(frag) => {
                matches!(*frag, Interpolated::Path(..)) && self.lookahead(1)? == Kind::Bang
            }
            _ => false,
        };

        if !is_inv {
            return Ok(None);
        }

        let ps = self.start_span();
        let name = self.parse_macro_name()?;
        self.expect(&Kind::Bang)?;

        // Braced invocations take no trailing semicolon.
        let braced = self.lookahead(0)? == Kind::Open(Delimiter::Brace)
            || (matches!(self.lookahead(0)?, Kind::Ident(..))
                && self.lookahead(1)? == Kind::Open(Delimiter::Brace));

        let inv = self.parse_macro_invocation_tail(ps, name)?;

        if !braced {
            self.expect(&Kind::Semi)?;
        }

        Ok(Some(inv))
    }

    /// Parse `name! ident? ( tokens )` with any delimiter, capturing the
    /// raw token tree.
    pub(crate) fn parse_macro_invocation_bare(&mut self) -> Result<MacroInvocation> {
        let ps = self.start_span();
        let name = self.parse_macro_name()?;
        self.expect(&Kind::Bang)?;
        self.parse_macro_invocation_tail(ps, name)
    }

    fn parse_macro_name(&mut self) -> Result<Name> {
        let path = self.parse_path(PathGenericMode::None)?;
        match path.as_single_name() {
            Some(name) => Ok(name),
            None => Err(ParseError::msg(
                path.span,
                "macro invocations use single-component names",
            )),
        }
    }

    fn parse_macro_invocation_tail(
        &mut self,
        ps: crate::parse::ProtoSpan,
        name: Name,
    ) -> Result<MacroInvocation> {
        let ident = if let Kind::Ident(id) = self.lookahead(0)? {
            self.next()?;
            Some(id.name)
        } else {
            None
        };

        let input = self.capture_token_tree()?;

        Ok(MacroInvocation {
            span: self.end_span(ps),
            name,
            ident,
            input,
        })
    }

    /// Capture a delimited token tree, returning the tokens inside the
    /// outer delimiters.
    pub(crate) fn capture_token_tree(&mut self) -> Result<TokenStream> {
        let open = self.next()?;
        let delim = match open.kind {
            Kind::Open(delim) => delim,
            _ => return Err(Self::unexpected(&open, &["(", "[", "{"])),
        };

        let mut depth = 1usize;
        let mut tokens = Vec::new();

        loop {
            let token = self.next()?;
            match token.kind {
                Kind::Open(..) => depth += 1,
                Kind::Close(actual) => {
                    depth -= 1;
                    if depth == 0 {
                        if actual != delim {
                            return Err(Self::unexpected(
                                &token,
                                &[Kind::Close(delim).description()],
                            ));
                        }
                        break;
                    }
                }
                Kind::Eof => {
                    return Err(Self::unexpected(&token, &["token tree"]));
                }
                _ => {}
            }
            tokens.push(token);
        }

        Ok(TokenStream::from(tokens))
    }
}

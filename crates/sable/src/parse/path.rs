use crate::ast::{Path, PathClass, PathNode, PathParams, TypeRef};
use crate::lex::{Interpolated, Kind};
use crate::name::Name;
use crate::parse::{Parser, Result};

/// Where generic arguments are permitted while parsing a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathGenericMode {
    /// No generic arguments, e.g. macro names.
    None,
    /// Expression position: generics only after `::`, `a::b::<T>`.
    Expr,
    /// Type position: generics directly after a node, `a::b<T>`.
    Type,
}

impl<'s, 'a> Parser<'s, 'a> {
    /// Parse a path.
    pub fn parse_path(&mut self, mode: PathGenericMode) -> Result<Path> {
        if let Kind::Interpolated(frag) = self.lookahead(0)? {
            if let Interpolated::Path(path) = *frag {
                self.next()?;
                return Ok(path);
            }
        }

        let ps = self.start_span();

        match self.lookahead(0)? {
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

                let nodes = self.parse_path_nodes(mode)?;
                Ok(Path {
                    span: self.end_span(ps),
                    class: PathClass::Absolute { crate_name, nodes },
                })
            }
            Kind::Crate => {
                self.next()?;
                let nodes = if self.eat(&Kind::ColonColon)? {
                    self.parse_path_nodes(mode)?
                } else {
                    Vec::new()
                };
                Ok(Path {
                    span: self.end_span(ps),
                    class: PathClass::Absolute {
                        crate_name: Name::empty(),
                        nodes,
                    },
                })
            }
            Kind::SelfValue => {
                self.next()?;
                let nodes = if self.eat(&Kind::ColonColon)? {
                    self.parse_path_nodes(mode)?
                } else {
                    Vec::new()
                };
                Ok(Path {
                    span: self.end_span(ps),
                    class: PathClass::Self_ { nodes },
                })
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
                let nodes = if self.eat(&Kind::ColonColon)? {
                    self.parse_path_nodes(mode)?
                } else {
                    Vec::new()
                };
                Ok(Path {
                    span: self.end_span(ps),
                    class: PathClass::Super { count, nodes },
                })
            }
            Kind::Lt | Kind::LtLt => self.parse_ufcs_path(mode),
            Kind::SelfType => {
                // `Self::item` is a UFCS selection off the Self type.
                let token = self.next()?;
                let ty = TypeRef::self_type(token.span);
                let mut nodes = Vec::new();
                while self.lookahead(0)? == Kind::ColonColon
                    && matches!(self.lookahead(1)?, Kind::Ident(..))
                {
                    self.next()?;
                    nodes.push(self.parse_path_node(mode)?);
                }
                Ok(Path {
                    span: self.end_span(ps),
                    class: PathClass::Ufcs {
                        ty: Box::new(ty),
                        trait_: None,
                        nodes,
                    },
                })
            }
            Kind::Ident(..) => {
                let nodes = self.parse_path_nodes(mode)?;
                let span = self.end_span(ps);

                if nodes.len() == 1 && nodes[0].params.is_empty() {
                    return Ok(Path::local(span, nodes.into_iter().next().unwrap().name));
                }

                Ok(Path {
                    span,
                    class: PathClass::Relative { nodes },
                })
            }
            _ => {
                let token = self.next()?;
                Err(Self::unexpected(&token, &["path"]))
            }
        }
    }

    /// Parse a `<Type as Trait>::...` or `<Type>::...` path, with the leading
    /// `<` not yet consumed.
    fn parse_ufcs_path(&mut self, mode: PathGenericMode) -> Result<Path> {
        let ps = self.start_span();
        self.eat_lt()?;

        let ty = self.parse_type()?;
        let trait_ = if self.eat(&Kind::As)? {
            Some(Box::new(self.parse_path(PathGenericMode::Type)?))
        } else {
            None
        };
        self.expect_gt()?;

        let mut nodes = Vec::new();
        while self.lookahead(0)? == Kind::ColonColon
            && matches!(self.lookahead(1)?, Kind::Ident(..))
        {
            self.next()?;
            nodes.push(self.parse_path_node(mode)?);
        }

        Ok(Path {
            span: self.end_span(ps),
            class: PathClass::Ufcs {
                ty: Box::new(ty),
                trait_,
                nodes,
            },
        })
    }

    /// Parse a `::`-separated run of path nodes, with generic argument
    /// placement decided by `mode`.
    fn parse_path_nodes(&mut self, mode: PathGenericMode) -> Result<Vec<PathNode>> {
        let mut nodes = Vec::new();

        loop {
            nodes.push(self.parse_path_node(mode)?);

            if self.lookahead(0)? != Kind::ColonColon {
                break;
            }

            match self.lookahead(1)? {
                Kind::Ident(..) => {
                    self.next()?;
                }
                Kind::Lt | Kind::LtLt if mode == PathGenericMode::Expr => {
                    // Turbofish on the node just parsed.
                    self.next()?;
                    self.eat_lt()?;
                    let params = self.parse_path_params()?;
                    nodes.last_mut().expect("at least one node").params = params;
                    if self.lookahead(0)? == Kind::ColonColon
                        && matches!(self.lookahead(1)?, Kind::Ident(..))
                    {
                        self.next()?;
                        continue;
                    }
                    break;
                }
                _ => break,
            }
        }

        Ok(nodes)
    }

    fn parse_path_node(&mut self, mode: PathGenericMode) -> Result<PathNode> {
        let (name, _) = self.expect_ident()?;
        let mut params = PathParams::default();

        if mode == PathGenericMode::Type
            && matches!(self.lookahead(0)?, Kind::Lt | Kind::LtLt)
        {
            self.eat_lt()?;
            params = self.parse_path_params()?;
        }

        Ok(PathNode { name, params })
    }

    /// Parse generic arguments after the opening `<`, consuming the closing
    /// `>`.
    pub fn parse_path_params(&mut self) -> Result<PathParams> {
        let mut params = PathParams::default();

        loop {
            match self.lookahead(0)? {
                Kind::Gt | Kind::GtGt | Kind::GtEq | Kind::GtGtEq => break,
                Kind::Lifetime(id) => {
                    self.next()?;
                    params.lifetimes.push(crate::ast::LifetimeRef::new(id));
                }
                Kind::Ident(..) if self.lookahead(1)? == Kind::Eq => {
                    let (name, _) = self.expect_ident()?;
                    self.expect(&Kind::Eq)?;
                    let ty = self.parse_type()?;
                    params.bindings.push((name, ty));
                }
                _ => {
                    params.types.push(self.parse_type()?);
                }
            }

            if !self.eat(&Kind::Comma)? {
                break;
            }
        }

        self.expect_gt()?;
        Ok(params)
    }
}

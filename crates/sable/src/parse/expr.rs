use crate::ast::{
    BinaryOp, Block, Expr, ExprKind, FieldName, Literal, Stmt, UnaryOp,
};
use crate::lex::{Delimiter, Interpolated, Kind};
use crate::parse::{Parser, PathGenericMode, Result};

fn binop_from_kind(kind: &Kind) -> Option<BinaryOp> {
    Some(match kind {
        Kind::Plus => BinaryOp::Add,
        Kind::Dash => BinaryOp::Sub,
        Kind::Star => BinaryOp::Mul,
        Kind::Slash => BinaryOp::Div,
        Kind::Percent => BinaryOp::Rem,
        Kind::AmpAmp => BinaryOp::And,
        Kind::PipePipe => BinaryOp::Or,
        Kind::Amp => BinaryOp::BitAnd,
        Kind::Pipe => BinaryOp::BitOr,
        Kind::Caret => BinaryOp::BitXor,
        Kind::LtLt => BinaryOp::Shl,
        Kind::GtGt => BinaryOp::Shr,
        Kind::EqEq => BinaryOp::Eq,
        Kind::BangEq => BinaryOp::Ne,
        Kind::Lt => BinaryOp::Lt,
        Kind::LtEq => BinaryOp::Le,
        Kind::Gt => BinaryOp::Gt,
        Kind::GtEq => BinaryOp::Ge,
        _ => return None,
    })
}

impl<'s, 'a> Parser<'s, 'a> {
    /// Parse an expression.
    ///
    /// This is the embedded-expression grammar: enough for array sizes,
    /// discriminants, initializers, format-macro arguments and simple
    /// function bodies.
    pub fn parse_expr(&mut self) -> Result<Expr> {
        let ps = self.start_span();
        let lhs = self.parse_binary_expr(0)?;

        if self.eat(&Kind::Eq)? {
            let rhs = self.parse_expr()?;
            return Ok(Expr::new(
                self.end_span(ps),
                ExprKind::Assign {
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
            ));
        }

        Ok(lhs)
    }

    fn parse_binary_expr(&mut self, min_prec: u8) -> Result<Expr> {
        let ps = self.start_span();
        let mut lhs = self.parse_unary_expr()?;

        loop {
            let op = match binop_from_kind(&self.lookahead(0)?) {
                Some(op) if op.precedence() >= min_prec => op,
                _ => break,
            };

            self.next()?;
            let rhs = self.parse_binary_expr(op.precedence() + 1)?;

            lhs = Expr::new(
                self.end_span(ps),
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
            );
        }

        Ok(lhs)
    }

    fn parse_unary_expr(&mut self) -> Result<Expr> {
        let ps = self.start_span();

        let op = match self.lookahead(0)? {
            Kind::Dash => Some(UnaryOp::Neg),
            Kind::Bang => Some(UnaryOp::Not),
            Kind::Star => Some(UnaryOp::Deref),
            Kind::Amp | Kind::AmpAmp => {
                self.eat_amp()?;
                let is_mut = self.eat(&Kind::Mut)?;
                let expr = Box::new(self.parse_unary_expr()?);
                return Ok(Expr::new(
                    self.end_span(ps),
                    ExprKind::Borrow { is_mut, expr },
                ));
            }
            _ => None,
        };

        if let Some(op) = op {
            self.next()?;
            let expr = Box::new(self.parse_unary_expr()?);
            return Ok(Expr::new(self.end_span(ps), ExprKind::Unary { op, expr }));
        }

        self.parse_postfix_expr(ps)
    }

    fn parse_postfix_expr(&mut self, ps: crate::parse::ProtoSpan) -> Result<Expr> {
        let mut expr = self.parse_primary_expr()?;

        loop {
            match self.lookahead(0)? {
                Kind::Open(Delimiter::Parenthesis) => {
                    self.next()?;
                    let mut args = Vec::new();
                    loop {
                        if self.eat(&Kind::Close(Delimiter::Parenthesis))? {
                            break;
                        }
                        args.push(self.parse_expr()?);
                        if !self.eat(&Kind::Comma)? {
                            self.expect(&Kind::Close(Delimiter::Parenthesis))?;
                            break;
                        }
                    }
                    expr = Expr::new(
                        self.end_span(ps),
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                    );
                }
                Kind::Dot => {
                    self.next()?;
                    let token = self.next()?;
                    let name = match token.kind {
                        Kind::Ident(id) => FieldName::Named(id),
                        Kind::Int { value, class: None } if value <= u32::MAX as u128 => {
                            FieldName::Index(value as u32)
                        }
                        _ => return Err(Self::unexpected(&token, &["field name"])),
                    };
                    expr = Expr::new(
                        self.end_span(ps),
                        ExprKind::Field {
                            expr: Box::new(expr),
                            name,
                        },
                    );
                }
                Kind::Open(Delimiter::Bracket) => {
                    self.next()?;
                    let index = Box::new(self.parse_expr()?);
                    self.expect(&Kind::Close(Delimiter::Bracket))?;
                    expr = Expr::new(
                        self.end_span(ps),
                        ExprKind::Index {
                            expr: Box::new(expr),
                            index,
                        },
                    );
                }
                Kind::As => {
                    self.next()?;
                    let ty = self.parse_type_no_plus()?;
                    expr = Expr::new(
                        self.end_span(ps),
                        ExprKind::Cast {
                            expr: Box::new(expr),
                            ty,
                        },
                    );
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_primary_expr(&mut self) -> Result<Expr> {
        if let Kind::Interpolated(frag) = self.lookahead(0)? {
            if let Interpolated::Expr(expr) = *frag {
                self.next()?;
                return Ok(expr);
            }
        }

        let ps = self.start_span();

        let lit = match self.lookahead(0)? {
            Kind::True => Some(Literal::Bool(true)),
            Kind::False => Some(Literal::Bool(false)),
            Kind::Int { value, class } => Some(Literal::Int { value, class }),
            Kind::Float { value, class } => Some(Literal::Float { value, class }),
            Kind::Char(c) => Some(Literal::Char(c)),
            Kind::Byte(b) => Some(Literal::Byte(b)),
            Kind::Str(s) => Some(Literal::Str(s)),
            Kind::ByteStr(s) => Some(Literal::ByteStr(s)),
            _ => None,
        };

        if let Some(lit) = lit {
            self.next()?;
            return Ok(Expr::new(self.end_span(ps), ExprKind::Lit(lit)));
        }

        match self.lookahead(0)? {
            Kind::Open(Delimiter::Parenthesis) => {
                self.next()?;

                if self.eat(&Kind::Close(Delimiter::Parenthesis))? {
                    return Ok(Expr::new(self.end_span(ps), ExprKind::Tuple(Vec::new())));
                }

                let first = self.parse_expr()?;

                if self.eat(&Kind::Close(Delimiter::Parenthesis))? {
                    return Ok(Expr::new(
                        self.end_span(ps),
                        ExprKind::Paren(Box::new(first)),
                    ));
                }

                let mut items = vec![first];
                while self.eat(&Kind::Comma)? {
                    if self.lookahead(0)? == Kind::Close(Delimiter::Parenthesis) {
                        break;
                    }
                    items.push(self.parse_expr()?);
                }
                self.expect(&Kind::Close(Delimiter::Parenthesis))?;
                Ok(Expr::new(self.end_span(ps), ExprKind::Tuple(items)))
            }
            Kind::Open(Delimiter::Bracket) => {
                self.next()?;
                let mut items = Vec::new();
                loop {
                    if self.eat(&Kind::Close(Delimiter::Bracket))? {
                        break;
                    }
                    items.push(self.parse_expr()?);
                    if !self.eat(&Kind::Comma)? {
                        self.expect(&Kind::Close(Delimiter::Bracket))?;
                        break;
                    }
                }
                Ok(Expr::new(self.end_span(ps), ExprKind::Array(items)))
            }
            Kind::Open(Delimiter::Brace) => {
                let block = self.parse_block()?;
                Ok(Expr::new(self.end_span(ps), ExprKind::Block(block)))
            }
            Kind::If => self.parse_if_expr(),
            Kind::Return => {
                self.next()?;
                let value = match self.lookahead(0)? {
                    Kind::Semi | Kind::Comma | Kind::Close(..) | Kind::Eof => None,
                    _ => Some(Box::new(self.parse_expr()?)),
                };
                Ok(Expr::new(self.end_span(ps), ExprKind::Return(value)))
            }
            Kind::Ident(..) if self.lookahead(1)? == Kind::Bang => {
                let inv = self.parse_macro_invocation_bare()?;
                Ok(Expr::new(self.end_span(ps), ExprKind::MacroCall(inv)))
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
                Ok(Expr::new(self.end_span(ps), ExprKind::Path(path)))
            }
            _ => {
                let token = self.next()?;
                Err(Self::unexpected(&token, &["expression"]))
            }
        }
    }

    fn parse_if_expr(&mut self) -> Result<Expr> {
        let ps = self.start_span();
        self.expect(&Kind::If)?;

        let cond = Box::new(self.parse_expr()?);
        let then_branch = self.parse_block()?;

        let else_branch = if self.eat(&Kind::Else)? {
            if self.lookahead(0)? == Kind::If {
                Some(Box::new(self.parse_if_expr()?))
            } else {
                let bps = self.start_span();
                let block = self.parse_block()?;
                Some(Box::new(Expr::new(
                    self.end_span(bps),
                    ExprKind::Block(block),
                )))
            }
        } else {
            None
        };

        Ok(Expr::new(
            self.end_span(ps),
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            },
        ))
    }

    /// Parse a block, `{ stmts... tail? }`.
    pub(crate) fn parse_block(&mut self) -> Result<Block> {
        let ps = self.start_span();
        self.expect(&Kind::Open(Delimiter::Brace))?;

        let mut stmts = Vec::new();
        let mut tail = None;

        loop {
            if self.eat(&Kind::Close(Delimiter::Brace))? {
                break;
            }

            if let Kind::Interpolated(frag) = self.lookahead(0)? {
                if let Interpolated::Stmt(stmt) = *frag {
                    self.next()?;
                    stmts.push(stmt);
                    continue;
                }
            }

            if self.eat(&Kind::Semi)? {
                continue;
            }

            if self.lookahead(0)? == Kind::Let {
                let sps = self.start_span();
                self.next()?;
                let pat = self.parse_pattern(false)?;
                let ty = if self.eat(&Kind::Colon)? {
                    Some(self.parse_type()?)
                } else {
                    None
                };
                let init = if self.eat(&Kind::Eq)? {
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                self.expect(&Kind::Semi)?;
                stmts.push(Stmt::Let {
                    span: self.end_span(sps),
                    pat,
                    ty,
                    init,
                });
                continue;
            }

            let expr = self.parse_expr()?;

            if self.eat(&Kind::Semi)? {
                stmts.push(Stmt::Expr(expr));
                continue;
            }

            // Block-shaped expressions may stand as statements without a
            // semicolon.
            if self.lookahead(0)? != Kind::Close(Delimiter::Brace)
                && matches!(expr.kind, ExprKind::Block(..) | ExprKind::If { .. })
            {
                stmts.push(Stmt::Expr(expr));
                continue;
            }

            tail = Some(Box::new(expr));
            self.expect(&Kind::Close(Delimiter::Brace))?;
            break;
        }

        Ok(Block {
            span: self.end_span(ps),
            stmts,
            tail,
        })
    }
}

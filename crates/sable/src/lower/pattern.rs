use crate::ast;
use crate::hir;
use crate::lower::path::AstRef;
use crate::lower::{LowerError, LowerErrorKind, LoweringContext, Result};
use crate::span::bug;

fn lower_binding(binding: &ast::PatternBinding) -> hir::PatternBinding {
    hir::PatternBinding {
        name: binding.name.name,
        mode: match binding.mode {
            ast::BindMode::Move => hir::BindMode::Move,
            ast::BindMode::Ref => hir::BindMode::Ref,
            ast::BindMode::MutRef => hir::BindMode::MutRef,
        },
        is_mut: binding.is_mut,
    }
}

fn lower_value(
    ctx: &mut LoweringContext<'_>,
    value: &ast::PatternValue,
) -> Result<hir::PatternValue> {
    Ok(match value {
        ast::PatternValue::Integer {
            value,
            negated,
            class,
        } => hir::PatternValue::Integer {
            value: *value,
            negated: *negated,
            ty: class.map(int_class_type),
        },
        ast::PatternValue::Float { value, class } => hir::PatternValue::Float {
            value: *value,
            ty: class.map(|c| match c {
                crate::lex::FloatClass::F32 => hir::CoreType::F32,
                crate::lex::FloatClass::F64 => hir::CoreType::F64,
            }),
        },
        ast::PatternValue::Char(c) => hir::PatternValue::Char(*c),
        ast::PatternValue::Byte(b) => hir::PatternValue::Byte(*b),
        ast::PatternValue::String(s) => hir::PatternValue::String(s.clone()),
        ast::PatternValue::ByteString(s) => hir::PatternValue::ByteString(s.clone()),
        ast::PatternValue::Named(path) => {
            hir::PatternValue::Named(ctx.lower_path(path)?)
        }
    })
}

fn int_class_type(class: crate::lex::IntClass) -> hir::CoreType {
    use crate::lex::IntClass;

    match class {
        IntClass::I8 => hir::CoreType::I8,
        IntClass::I16 => hir::CoreType::I16,
        IntClass::I32 => hir::CoreType::I32,
        IntClass::I64 => hir::CoreType::I64,
        IntClass::I128 => hir::CoreType::I128,
        IntClass::Isize => hir::CoreType::Isize,
        IntClass::U8 => hir::CoreType::U8,
        IntClass::U16 => hir::CoreType::U16,
        IntClass::U32 => hir::CoreType::U32,
        IntClass::U64 => hir::CoreType::U64,
        IntClass::U128 => hir::CoreType::U128,
        IntClass::Usize => hir::CoreType::Usize,
    }
}

impl<'a> LoweringContext<'a> {
    /// Lower a pattern.
    pub(crate) fn lower_pattern(&mut self, pat: &ast::Pattern) -> Result<hir::Pattern> {
        let binding = pat.binding.as_ref().map(lower_binding);

        let data = match &pat.data {
            ast::PatternData::Any => hir::PatternData::Any,
            ast::PatternData::MaybeBind(id) => {
                // An ambiguous identifier binds unless it resolves to a
                // unit variant or constant.
                let probe = ast::Path::local(pat.span, *id);
                if let Ok(resolved) = self.resolve_path_class(&probe) {
                    if let Ok(simple) = self.lower_simple_path(&resolved, false) {
                        if matches!(
                            self.find_ast_item(&simple),
                            Some(AstRef::EnumVariant(..)) | Some(AstRef::Static(..))
                        ) {
                            let value =
                                hir::PatternValue::Named(self.lower_path(&resolved)?);
                            return Ok(hir::Pattern {
                                binding,
                                data: hir::PatternData::Value { value },
                            });
                        }
                    }
                }

                return Ok(hir::Pattern {
                    binding: Some(hir::PatternBinding {
                        name: id.name,
                        mode: hir::BindMode::Move,
                        is_mut: false,
                    }),
                    data: hir::PatternData::Any,
                });
            }
            ast::PatternData::Ref { is_mut, inner } => hir::PatternData::Ref {
                kind: if *is_mut {
                    hir::BorrowKind::Unique
                } else {
                    hir::BorrowKind::Shared
                },
                inner: Box::new(self.lower_pattern(inner)?),
            },
            ast::PatternData::Box_ { inner } => {
                hir::PatternData::Box_(Box::new(self.lower_pattern(inner)?))
            }
            ast::PatternData::Tuple(tup) => {
                let leading = self.lower_pattern_vec(&tup.leading)?;
                let trailing = self.lower_pattern_vec(&tup.trailing)?;

                if tup.has_rest {
                    hir::PatternData::SplitTuple { leading, trailing }
                } else {
                    debug_assert!(trailing.is_empty());
                    hir::PatternData::Tuple(leading)
                }
            }
            ast::PatternData::StructTuple { path, pat: tup } => {
                self.lower_struct_tuple_pattern(pat, path, tup)?
            }
            ast::PatternData::Struct {
                path,
                fields,
                is_exhaustive,
            } => {
                let mut lowered = Vec::with_capacity(fields.len());
                for (name, sub) in fields {
                    lowered.push((name.name, self.lower_pattern(sub)?));
                }

                let simple = self.lower_simple_path(path, true)?;
                let gp = self.lower_generic_path(path, false)?;

                match self.find_ast_item(&simple) {
                    Some(AstRef::EnumVariant(_, variant)) => hir::PatternData::EnumStruct {
                        path: gp,
                        variant,
                        fields: lowered,
                        is_exhaustive: *is_exhaustive,
                    },
                    Some(AstRef::Struct(..)) | Some(AstRef::TypeAlias(..)) => {
                        hir::PatternData::Struct {
                            path: gp,
                            fields: lowered,
                            is_exhaustive: *is_exhaustive,
                        }
                    }
                    _ => bug!(
                        pat.span,
                        "struct pattern does not name a struct or variant: {}",
                        path
                    ),
                }
            }
            ast::PatternData::Value { start, end } => {
                let start = lower_value(self, start)?;
                match end {
                    Some(end) => hir::PatternData::Range {
                        start,
                        end: lower_value(self, end)?,
                    },
                    None => hir::PatternData::Value { value: start },
                }
            }
            ast::PatternData::Slice { pats } => {
                hir::PatternData::Slice(self.lower_pattern_vec(pats)?)
            }
            ast::PatternData::SplitSlice {
                leading,
                rest_bind,
                trailing,
            } => hir::PatternData::SplitSlice {
                leading: self.lower_pattern_vec(leading)?,
                rest_bind: rest_bind.as_ref().map(lower_binding),
                trailing: self.lower_pattern_vec(trailing)?,
            },
            ast::PatternData::Macro(inv) => {
                bug!(pat.span, "unexpanded macro `{}!` in pattern", inv.name)
            }
        };

        Ok(hir::Pattern { binding, data })
    }

    fn lower_pattern_vec(&mut self, pats: &[ast::Pattern]) -> Result<Vec<hir::Pattern>> {
        let mut out = Vec::with_capacity(pats.len());
        for pat in pats {
            out.push(self.lower_pattern(pat)?);
        }
        Ok(out)
    }

    /// Lower a tuple-struct pattern against its struct or variant,
    /// producing a dense sub-pattern vector of the field count. A rest
    /// marker pads with wildcards; without one the lengths must match
    /// exactly.
    fn lower_struct_tuple_pattern(
        &mut self,
        pat: &ast::Pattern,
        path: &ast::Path,
        tup: &ast::TuplePat,
    ) -> Result<hir::PatternData> {
        let simple = self.lower_simple_path(path, true)?;

        let (field_count, variant) = match self.find_ast_item(&simple) {
            Some(AstRef::Struct(s)) => match &s.data {
                ast::StructData::Tuple(fields) => (fields.len(), None),
                _ => {
                    return Err(LowerError::new(
                        pat.span,
                        LowerErrorKind::PatternNotTuple {
                            path: path.to_string().into_boxed_str(),
                        },
                    ));
                }
            },
            Some(AstRef::EnumVariant(e, index)) => {
                match &e.variants[index].data {
                    ast::EnumVariantData::Tuple(types) => (types.len(), Some(index)),
                    _ => {
                        return Err(LowerError::new(
                            pat.span,
                            LowerErrorKind::PatternNotTuple {
                                path: path.to_string().into_boxed_str(),
                            },
                        ));
                    }
                }
            }
            _ => bug!(
                pat.span,
                "tuple pattern does not name a struct or variant: {}",
                path
            ),
        };

        let leading_count = tup.leading.len();
        let trailing_count = tup.trailing.len();

        let mut subs = Vec::with_capacity(field_count);

        if tup.has_rest {
            if leading_count + trailing_count > field_count {
                return Err(LowerError::new(
                    pat.span,
                    LowerErrorKind::PatternTooManyFields {
                        max: field_count,
                        actual: leading_count + trailing_count,
                    },
                ));
            }

            for sub in &tup.leading {
                subs.push(self.lower_pattern(sub)?);
            }
            for _ in 0..(field_count - leading_count - trailing_count) {
                subs.push(hir::Pattern::any());
            }
            for sub in &tup.trailing {
                subs.push(self.lower_pattern(sub)?);
            }
        } else {
            debug_assert!(trailing_count == 0);

            if leading_count != field_count {
                return Err(LowerError::new(
                    pat.span,
                    LowerErrorKind::PatternFieldMismatch {
                        expected: field_count,
                        actual: leading_count,
                    },
                ));
            }

            subs = self.lower_pattern_vec(&tup.leading)?;
        }

        let gp = self.lower_generic_path(path, false)?;

        Ok(match variant {
            Some(variant) => hir::PatternData::EnumTuple {
                path: gp,
                variant,
                subs,
            },
            None => hir::PatternData::StructTuple { path: gp, subs },
        })
    }
}

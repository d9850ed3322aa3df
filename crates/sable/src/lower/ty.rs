use crate::ast;
use crate::hir;
use crate::lower::{LowerError, LowerErrorKind, LoweringContext, Result};
use crate::span::bug;

impl<'a> LoweringContext<'a> {
    /// Lower a surface type to its canonical form.
    pub(crate) fn lower_type(&mut self, ty: &ast::TypeRef) -> Result<hir::TypeRef> {
        match &ty.data {
            ast::TypeData::Invalid => bug!(ty.span, "invalid type reached lowering"),
            ast::TypeData::Bang => Ok(hir::TypeRef::Diverge),
            ast::TypeData::Infer => Ok(hir::TypeRef::Infer),
            ast::TypeData::Primitive(core) => Ok(hir::TypeRef::Primitive(*core)),
            ast::TypeData::Tuple(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.lower_type(item)?);
                }
                Ok(hir::TypeRef::Tuple(out))
            }
            ast::TypeData::Borrow { is_mut, inner, .. } => {
                let kind = if *is_mut {
                    hir::BorrowKind::Unique
                } else {
                    hir::BorrowKind::Shared
                };
                Ok(hir::TypeRef::new_borrow(kind, self.lower_type(inner)?))
            }
            ast::TypeData::Pointer { is_mut, inner } => {
                let kind = if *is_mut {
                    hir::BorrowKind::Unique
                } else {
                    hir::BorrowKind::Shared
                };
                Ok(hir::TypeRef::new_pointer(kind, self.lower_type(inner)?))
            }
            ast::TypeData::Array { inner, size } => {
                let inner = self.lower_type(inner)?;

                match size {
                    Some(expr) => {
                        // Unannotated integer sizes don't need an
                        // expression carried forward.
                        let size = match expr.as_uint_lit() {
                            Some(value) => {
                                let value = u64::try_from(value).map_err(|_| {
                                    LowerError::new(
                                        ty.span,
                                        LowerErrorKind::ArraySizeOverflow,
                                    )
                                })?;
                                hir::ArraySize::Fixed(value)
                            }
                            None => {
                                hir::ArraySize::Expr(hir::ExprPtr::new((**expr).clone()))
                            }
                        };
                        Ok(hir::TypeRef::new_array(inner, size))
                    }
                    None => Ok(hir::TypeRef::new_slice(inner)),
                }
            }
            ast::TypeData::Path(path) => self.lower_path_type(ty, path),
            ast::TypeData::TraitObject { traits, lifetime } => {
                self.lower_trait_object(ty, traits, lifetime.as_ref())
            }
            ast::TypeData::ErasedType { traits, lifetimes } => {
                let mut lowered = Vec::with_capacity(traits.len());
                for t in traits {
                    lowered.push(self.lower_trait_path(&t.path, &t.hrbs)?);
                }

                // The origin is bound by a later pass once the defining
                // item is known.
                Ok(hir::TypeRef::ErasedType {
                    origin: hir::Path::Generic(hir::GenericPath::default()),
                    index: 0,
                    traits: lowered,
                    lifetime: lifetimes.first().map(|l| l.name.name),
                })
            }
            ast::TypeData::Function(ft) => {
                let mut args = Vec::with_capacity(ft.args.len());
                for arg in &ft.args {
                    args.push(self.lower_type(arg)?);
                }

                Ok(hir::TypeRef::Function(hir::FunctionType {
                    is_unsafe: ft.is_unsafe,
                    abi: ft.abi.unwrap_or_else(|| crate::name::Name::new(
                        ast::ABI_SABLE,
                    )),
                    ret: Box::new(self.lower_type(&ft.ret)?),
                    args,
                }))
            }
            ast::TypeData::Generic { name, index } => Ok(hir::TypeRef::Generic {
                name: name.name,
                index: *index,
            }),
        }
    }

    /// Lower a path type: a generic parameter, a named type, or a trait
    /// used as an unparenthesised object type.
    fn lower_path_type(
        &mut self,
        ty: &ast::TypeRef,
        path: &ast::Path,
    ) -> Result<hir::TypeRef> {
        // Generic parameters shadow items.
        if let ast::PathClass::Local(id) = &path.class {
            if let Some(index) = self.lookup_generic(id.name) {
                return Ok(hir::TypeRef::Generic {
                    name: id.name,
                    index,
                });
            }
        }

        if let ast::PathClass::Ufcs { .. } = &path.class {
            return Ok(hir::TypeRef::new_path(self.lower_path(path)?));
        }

        // A path naming a trait is an object type with a single entry.
        let simple = self.lower_simple_path(path, true)?;
        if self.trait_is_marker(&simple).is_some() {
            let refs = [ast::PolyTraitRef {
                hrbs: Default::default(),
                path: path.clone(),
            }];
            return self.lower_trait_object(ty, &refs, None);
        }

        Ok(hir::TypeRef::new_path(self.lower_path(path)?))
    }

    /// Lower a trait-object type, splitting the data trait from markers.
    fn lower_trait_object(
        &mut self,
        ty: &ast::TypeRef,
        traits: &[ast::PolyTraitRef],
        lifetime: Option<&ast::LifetimeRef>,
    ) -> Result<hir::TypeRef> {
        let mut principal: Option<hir::TraitPath> = None;
        let mut markers = Vec::new();

        for t in traits {
            let simple = self.lower_simple_path(&t.path, true)?;
            let is_marker = self.trait_is_marker(&simple).ok_or_else(|| {
                LowerError::new(t.path.span, LowerErrorKind::UnresolvedPath {
                    path: t.path.to_string().into_boxed_str(),
                })
            })?;

            if is_marker {
                markers.push(self.lower_generic_path(&t.path, false)?);
            } else {
                if principal.is_some() {
                    return Err(LowerError::new(
                        ty.span,
                        LowerErrorKind::MultipleDataTraits,
                    ));
                }
                principal = Some(self.lower_trait_path(&t.path, &t.hrbs)?);
            }
        }

        Ok(hir::TypeRef::TraitObject {
            trait_: principal,
            markers,
            lifetime: lifetime.map(|l| l.name.name),
        })
    }
}

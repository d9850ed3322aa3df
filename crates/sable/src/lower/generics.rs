use crate::ast;
use crate::hir;
use crate::lower::{LowerError, LowerErrorKind, LoweringContext, Result};
use crate::span::bug;

impl<'a> LoweringContext<'a> {
    /// Lower generic parameters and their bound set.
    ///
    /// `self_is_sized` is provided in trait scope; a `Self: ?Sized` bound
    /// flips it. `?Sized` on a parameter flips that parameter's flag. Any
    /// other `?Trait` is a hard error, as is `!Trait`.
    pub(crate) fn lower_generic_params(
        &mut self,
        gp: &ast::GenericParams,
        mut self_is_sized: Option<&mut bool>,
    ) -> Result<hir::GenericParams> {
        let mut rv = hir::GenericParams::default();

        for tp in &gp.types {
            let default = match &tp.default {
                Some(ty) => Some(self.lower_type(ty)?),
                None => None,
            };
            rv.types.push(hir::TypeParamDef {
                name: tp.name.name,
                default,
                is_sized: true,
            });
        }

        for lp in &gp.lifetimes {
            rv.lifetimes.push(lp.name.name);
        }

        for bound in &gp.bounds {
            match &bound.kind {
                ast::GenericBoundKind::Lifetime { test, bound: b } => {
                    rv.bounds.push(hir::GenericBound::Lifetime {
                        test: test.name.name,
                        bound: b.name.name,
                    });
                }
                ast::GenericBoundKind::TypeLifetime { ty, bound: b } => {
                    rv.bounds.push(hir::GenericBound::TypeLifetime {
                        ty: self.lower_type(ty)?,
                        bound: b.name.name,
                    });
                }
                ast::GenericBoundKind::IsTrait {
                    ty,
                    inner_hrbs,
                    trait_,
                    ..
                } => {
                    rv.bounds.push(hir::GenericBound::TraitBound {
                        ty: self.lower_type(ty)?,
                        trait_: self.lower_trait_path(trait_, inner_hrbs)?,
                    });
                }
                ast::GenericBoundKind::MaybeTrait { ty, trait_ } => {
                    let ty = self.lower_type(ty)?;
                    let (name, index) = match &ty {
                        hir::TypeRef::Generic { name, index } => (*name, *index),
                        _ => bug!(bound.span, "?Trait bound on non-parameter {}", ty),
                    };

                    let trait_path = self.lower_generic_path(trait_, false)?;
                    if Some(&trait_path.path) != self.path_sized.as_ref() {
                        return Err(LowerError::new(
                            bound.span,
                            LowerErrorKind::MaybeTraitNotSized {
                                trait_: trait_path.path.to_string().into_boxed_str(),
                            },
                        ));
                    }

                    if index == hir::SELF_PARAM_INDEX {
                        match self_is_sized.as_deref_mut() {
                            Some(flag) => *flag = false,
                            None => {
                                bug!(bound.span, "`Self: ?Sized` outside of trait scope")
                            }
                        }
                    } else {
                        // The low byte is the declaration index within its
                        // frame; the bound applies to this item's own
                        // parameters.
                        let slot = rv
                            .types
                            .iter_mut()
                            .find(|t| t.name == name)
                            .unwrap_or_else(|| {
                                bug!(bound.span, "?Sized on unknown parameter {}", name)
                            });
                        slot.is_sized = false;
                    }
                }
                ast::GenericBoundKind::NotTrait { .. } => {
                    return Err(LowerError::new(bound.span, LowerErrorKind::NegativeBound));
                }
                ast::GenericBoundKind::Equality { ty, other } => {
                    rv.bounds.push(hir::GenericBound::TypeEquality {
                        ty: self.lower_type(ty)?,
                        other: self.lower_type(other)?,
                    });
                }
            }
        }

        Ok(rv)
    }
}

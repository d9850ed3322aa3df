use crate::ast;
use crate::hir;
use crate::lower::{LowerError, LowerErrorKind, LoweringContext, Result};
use crate::span::bug;

impl<'a> LoweringContext<'a> {
    /// The second lowering pass: walk every module and classify its impl
    /// blocks into trait impls, marker impls, and inherent impls. Runs
    /// after all declarations so signatures can refer to types from
    /// anywhere in the crate.
    pub(crate) fn lower_module_impls(
        &mut self,
        ast_mod: &ast::Module,
        krate: &mut hir::Crate,
    ) -> Result<()> {
        for item in &ast_mod.items {
            if let (ast::Item::Module(sub), Some(name)) = (&item.data, item.name) {
                self.mod_stack.push(name.name);
                let result = self.lower_module_impls(sub, krate);
                self.mod_stack.pop();
                result?;
            }
        }

        for item in &ast_mod.items {
            match &item.data {
                ast::Item::Impl(impl_) => self.lower_impl_block(impl_, krate)?,
                ast::Item::NegImpl(def) => self.lower_neg_impl(def, krate)?,
                _ => {}
            }
        }

        Ok(())
    }

    fn lower_impl_block(&mut self, impl_: &ast::Impl, krate: &mut hir::Crate) -> Result<()> {
        let src_module = self.current_module_path();

        self.push_generic_frame(&impl_.def.params);
        let result = self.lower_impl_block_inner(impl_, krate, src_module);
        self.pop_generic_frame();
        result
    }

    fn lower_impl_block_inner(
        &mut self,
        impl_: &ast::Impl,
        krate: &mut hir::Crate,
        src_module: hir::SimplePath,
    ) -> Result<()> {
        let def = &impl_.def;
        let params = self.lower_generic_params(&def.params, None)?;

        let Some(trait_path) = &def.trait_ else {
            // Inherent impl.
            let ty = self.lower_type(&def.ty)?;
            log::trace!("impl {}", ty);

            let mut methods = std::collections::HashMap::new();
            let mut constants = std::collections::HashMap::new();

            for item in &impl_.items {
                let Some(name) = item.name else { continue };
                let publicity = self.lower_publicity(&item.vis)?;

                match &item.data {
                    ast::Item::None | ast::Item::MacroInvocation(..) => {}
                    ast::Item::Function(f) => {
                        let lowered =
                            self.lower_function(name.name, &item.attrs, f, Some(&ty))?;
                        methods.insert(name.name, hir::VisImplEnt {
                            publicity,
                            is_specializable: item.is_specializable,
                            data: lowered,
                        });
                    }
                    ast::Item::Static(s) if s.class == ast::StaticClass::Const => {
                        constants.insert(name.name, hir::VisImplEnt {
                            publicity,
                            is_specializable: item.is_specializable,
                            data: hir::Constant {
                                params: hir::GenericParams::default(),
                                ty: self.lower_type(&s.ty)?,
                                value: s.value.clone().into(),
                            },
                        });
                    }
                    _ => bug!(item.span, "unexpected {} in inherent impl", item.data.tag()),
                }
            }

            let sort = ty.clone();
            krate.type_impls.insert(&sort, hir::TypeImpl {
                params,
                ty,
                methods,
                constants,
                src_module,
            });

            return Ok(());
        };

        // Default impls carry no type and no information beyond the
        // trait's own flags.
        if matches!(def.ty.data, ast::TypeData::Invalid) {
            return Ok(());
        }

        let trait_simple = self.lower_simple_path(trait_path, true)?;
        let is_marker = self.trait_is_marker(&trait_simple).ok_or_else(|| {
            LowerError::new(trait_path.span, LowerErrorKind::UnresolvedPath {
                path: trait_path.to_string().into_boxed_str(),
            })
        })?;

        let trait_gp = self.lower_generic_path(trait_path, false)?;
        let trait_name = trait_gp.path.clone();
        let trait_args = trait_gp.params;

        let ty = self.lower_type(&def.ty)?;
        log::trace!("impl {} for {}", trait_name, ty);

        if is_marker {
            let sort = ty.clone();
            krate
                .marker_impls
                .entry(trait_name)
                .or_default()
                .insert(&sort, hir::MarkerImpl {
                    params,
                    trait_args,
                    is_positive: true,
                    ty,
                    src_module,
                });
            return Ok(());
        }

        let mut methods = std::collections::HashMap::new();
        let mut constants = std::collections::HashMap::new();
        let mut statics = std::collections::HashMap::new();
        let mut types = std::collections::HashMap::new();

        for item in &impl_.items {
            let Some(name) = item.name else { continue };

            match &item.data {
                ast::Item::None | ast::Item::MacroInvocation(..) => {}
                ast::Item::Function(f) => {
                    let lowered =
                        self.lower_function(name.name, &item.attrs, f, Some(&ty))?;
                    methods.insert(name.name, hir::ImplEnt {
                        is_specializable: item.is_specializable,
                        data: lowered,
                    });
                }
                ast::Item::Static(s) if s.class == ast::StaticClass::Const => {
                    constants.insert(name.name, hir::ImplEnt {
                        is_specializable: item.is_specializable,
                        data: hir::Constant {
                            params: hir::GenericParams::default(),
                            ty: self.lower_type(&s.ty)?,
                            value: s.value.clone().into(),
                        },
                    });
                }
                ast::Item::Static(s) => {
                    statics.insert(name.name, hir::ImplEnt {
                        is_specializable: item.is_specializable,
                        data: hir::Static {
                            linkage: hir::Linkage::default(),
                            is_mut: s.class == ast::StaticClass::Mut,
                            ty: self.lower_type(&s.ty)?,
                            value: s.value.clone().into(),
                        },
                    });
                }
                ast::Item::TypeAlias(alias) => {
                    types.insert(name.name, hir::ImplEnt {
                        is_specializable: item.is_specializable,
                        data: self.lower_type(&alias.ty)?,
                    });
                }
                _ => bug!(item.span, "unexpected {} in trait impl", item.data.tag()),
            }
        }

        let sort = ty.clone();
        krate
            .trait_impls
            .entry(trait_name)
            .or_default()
            .insert(&sort, hir::TraitImpl {
                params,
                trait_args,
                ty,
                methods,
                constants,
                statics,
                types,
                src_module,
            });

        Ok(())
    }

    fn lower_neg_impl(&mut self, def: &ast::ImplDef, krate: &mut hir::Crate) -> Result<()> {
        let src_module = self.current_module_path();

        self.push_generic_frame(&def.params);

        let result = (|| {
            let params = self.lower_generic_params(&def.params, None)?;

            let trait_path = match &def.trait_ {
                Some(path) => path,
                None => bug!(crate::span::Span::empty(), "negative impl without a trait"),
            };

            let trait_gp = self.lower_generic_path(trait_path, false)?;
            let ty = self.lower_type(&def.ty)?;

            let sort = ty.clone();
            krate
                .marker_impls
                .entry(trait_gp.path.clone())
                .or_default()
                .insert(&sort, hir::MarkerImpl {
                    params,
                    trait_args: trait_gp.params,
                    is_positive: false,
                    ty,
                    src_module,
                });

            Ok(())
        })();

        self.pop_generic_frame();
        result
    }
}

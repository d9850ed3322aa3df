use crate::ast;
use crate::hir;
use crate::lower::path::AstRef;
use crate::lower::{LowerError, LowerErrorKind, LoweringContext, Result};
use crate::name::Name;
use crate::span::{bug, Span};

fn repr_name(repr: hir::Repr) -> &'static str {
    match repr {
        hir::Repr::Rust => "Rust",
        hir::Repr::C => "C",
        hir::Repr::Packed => "packed",
        hir::Repr::Simd => "simd",
        hir::Repr::Transparent => "transparent",
        hir::Repr::Aligned(..) => "align",
    }
}

impl<'a> LoweringContext<'a> {
    /// Lower a visibility annotation into a publicity record. Restricted
    /// visibility becomes the named module subtree; inherited visibility
    /// the current one.
    pub(crate) fn lower_publicity(&mut self, vis: &ast::Visibility) -> Result<hir::Publicity> {
        Ok(match vis {
            ast::Visibility::Public => hir::Publicity::new_global(),
            ast::Visibility::Inherited => {
                hir::Publicity::new_priv(self.current_module_path())
            }
            ast::Visibility::Restricted { path } => {
                hir::Publicity::new_priv(self.lower_simple_path(path, false)?)
            }
        })
    }

    /// Lower one module's declarations. Impl blocks are left for the
    /// second pass.
    pub(crate) fn lower_module(
        &mut self,
        ast_mod: &ast::Module,
        traits: Vec<hir::SimplePath>,
    ) -> Result<hir::Module> {
        let mod_path = self.current_module_path();
        log::trace!("lowering module {}", mod_path);

        let mut module = hir::Module {
            traits,
            ..Default::default()
        };

        // Traits declared here join the in-scope list.
        for item in &ast_mod.items {
            if let (ast::Item::Trait(..), Some(name)) = (&item.data, item.name) {
                let path = mod_path.child(name.name);
                if !module.traits.contains(&path) {
                    module.traits.push(path);
                }
            }
        }

        for item in &ast_mod.items {
            self.lower_mod_item(&mod_path, &mut module, item)?;
        }

        // Imports are lowered once all local declarations are known.
        for item in &ast_mod.items {
            if let ast::Item::Use(use_item) = &item.data {
                for entry in &use_item.entries {
                    self.lower_use_entry(&mut module, item, entry)?;
                }
            }
        }

        Ok(module)
    }

    fn lower_mod_item(
        &mut self,
        mod_path: &hir::SimplePath,
        module: &mut hir::Module,
        item: &ast::Named<ast::Item>,
    ) -> Result<()> {
        let publicity = self.lower_publicity(&item.vis)?;

        let conflict = |name: Name, span: Span| {
            LowerError::new(span, LowerErrorKind::ItemConflict { name })
        };

        match &item.data {
            // Handled elsewhere or not at all at this stage.
            ast::Item::None
            | ast::Item::Use(..)
            | ast::Item::Impl(..)
            | ast::Item::NegImpl(..)
            | ast::Item::MacroInvocation(..) => Ok(()),

            ast::Item::MacroRules(def) => {
                let name = expect_name(item);
                let ent = hir::VisEnt {
                    publicity,
                    ent: hir::MacroItem::MacroRules(def.clone()),
                };
                if !module.add_macro_item(name.name, ent) {
                    return Err(conflict(name.name, item.span));
                }
                Ok(())
            }

            ast::Item::ExternBlock(block) => {
                self.lower_extern_block(module, item, block)
            }

            ast::Item::Module(sub) => {
                let name = expect_name(item);

                self.mod_stack.push(name.name);
                let traits = module.traits.clone();
                let lowered = self.lower_module(sub, traits);
                self.mod_stack.pop();

                let ent = hir::VisEnt {
                    publicity,
                    ent: hir::TypeItem::Module(lowered?),
                };
                if !module.add_type_item(name.name, ent) {
                    return Err(conflict(name.name, item.span));
                }
                Ok(())
            }

            ast::Item::Crate { name: ext_name } => {
                // `extern crate` becomes a namespace import of the foreign
                // crate root.
                let name = expect_name(item);
                let ent = hir::VisEnt {
                    publicity,
                    ent: hir::TypeItem::Import {
                        path: hir::SimplePath::new(*ext_name, Vec::new()),
                        is_variant: false,
                        index: 0,
                    },
                };
                if !module.add_type_item(name.name, ent) {
                    return Err(conflict(name.name, item.span));
                }
                Ok(())
            }

            ast::Item::TypeAlias(alias) => {
                let name = expect_name(item);

                let ti = if matches!(alias.ty.data, ast::TypeData::Invalid) {
                    if !alias.params.is_empty() {
                        return Err(LowerError::new(
                            item.span,
                            LowerErrorKind::GenericsOnExternType,
                        ));
                    }
                    hir::TypeItem::ExternType(hir::ExternType)
                } else {
                    self.push_generic_frame(&alias.params);
                    let params = self.lower_generic_params(&alias.params, None);
                    let ty = params.and_then(|params| {
                        Ok(hir::TypeAlias {
                            params,
                            ty: self.lower_type(&alias.ty)?,
                        })
                    });
                    self.pop_generic_frame();
                    hir::TypeItem::TypeAlias(ty?)
                };

                let ent = hir::VisEnt {
                    publicity,
                    ent: ti,
                };
                if !module.add_type_item(name.name, ent) {
                    return Err(conflict(name.name, item.span));
                }
                Ok(())
            }

            ast::Item::Struct(s) => {
                let name = expect_name(item);
                let item_path = mod_path.child(name.name);

                // Unit and tuple structs contribute to the value namespace
                // as well.
                let value = match s.data {
                    ast::StructData::Unit => Some(hir::ValueItem::StructConstant {
                        ty: item_path.clone(),
                    }),
                    ast::StructData::Tuple(..) => {
                        Some(hir::ValueItem::StructConstructor {
                            ty: item_path.clone(),
                        })
                    }
                    ast::StructData::Named(..) => None,
                };

                if let Some(value) = value {
                    let ent = hir::VisEnt {
                        publicity: publicity.clone(),
                        ent: value,
                    };
                    if !module.add_value_item(name.name, ent) {
                        return Err(conflict(name.name, item.span));
                    }
                }

                let lowered = self.lower_struct(s, &item.attrs)?;
                let ent = hir::VisEnt {
                    publicity,
                    ent: hir::TypeItem::Struct(lowered),
                };
                if !module.add_type_item(name.name, ent) {
                    return Err(conflict(name.name, item.span));
                }
                Ok(())
            }

            ast::Item::Enum(e) => {
                let name = expect_name(item);
                let (lowered, siblings) =
                    self.lower_enum(mod_path, name.name, e, &item.attrs, item.span)?;

                // Each payload variant contributed an anonymous sibling
                // struct to the enclosing module.
                for (sibling_name, sibling) in siblings {
                    let ent = hir::VisEnt {
                        publicity: publicity.clone(),
                        ent: hir::TypeItem::Struct(sibling),
                    };
                    if !module.add_type_item(sibling_name, ent) {
                        return Err(conflict(sibling_name, item.span));
                    }
                }

                let ent = hir::VisEnt {
                    publicity,
                    ent: hir::TypeItem::Enum(lowered),
                };
                if !module.add_type_item(name.name, ent) {
                    return Err(conflict(name.name, item.span));
                }
                Ok(())
            }

            ast::Item::Union(u) => {
                let name = expect_name(item);
                let lowered = self.lower_union(u, &item.attrs)?;
                let ent = hir::VisEnt {
                    publicity,
                    ent: hir::TypeItem::Union(lowered),
                };
                if !module.add_type_item(name.name, ent) {
                    return Err(conflict(name.name, item.span));
                }
                Ok(())
            }

            ast::Item::Trait(t) => {
                let name = expect_name(item);
                let trait_path = mod_path.child(name.name);
                let lowered = self.lower_trait(&trait_path, t)?;
                let ent = hir::VisEnt {
                    publicity,
                    ent: hir::TypeItem::Trait(lowered),
                };
                if !module.add_type_item(name.name, ent) {
                    return Err(conflict(name.name, item.span));
                }
                Ok(())
            }

            ast::Item::Function(f) => {
                let name = expect_name(item);
                let lowered = self.lower_function(name.name, &item.attrs, f, None)?;
                let ent = hir::VisEnt {
                    publicity,
                    ent: hir::ValueItem::Function(lowered),
                };
                if !module.add_value_item(name.name, ent) {
                    return Err(conflict(name.name, item.span));
                }
                Ok(())
            }

            ast::Item::Static(s) => {
                let name = expect_name(item);
                let vi = self.lower_static_item(name.name, s)?;
                let ent = hir::VisEnt {
                    publicity,
                    ent: vi,
                };
                if !module.add_value_item(name.name, ent) {
                    return Err(conflict(name.name, item.span));
                }
                Ok(())
            }
        }
    }

    fn lower_static_item(&mut self, name: Name, s: &ast::Static) -> Result<hir::ValueItem> {
        Ok(match s.class {
            ast::StaticClass::Const => hir::ValueItem::Constant(hir::Constant {
                params: hir::GenericParams::default(),
                ty: self.lower_type(&s.ty)?,
                value: s.value.clone().into(),
            }),
            ast::StaticClass::Static | ast::StaticClass::Mut => {
                let mut linkage = hir::Linkage::default();
                // A static without a value is external; its symbol is its
                // own name.
                if s.value.is_none() {
                    linkage.name = Some(name);
                }

                hir::ValueItem::Static(hir::Static {
                    linkage,
                    is_mut: s.class == ast::StaticClass::Mut,
                    ty: self.lower_type(&s.ty)?,
                    value: s.value.clone().into(),
                })
            }
        })
    }

    /// Lower the members of an `extern` block straight into the module,
    /// and record any `#[link]` library.
    fn lower_extern_block(
        &mut self,
        module: &mut hir::Module,
        item: &ast::Named<ast::Item>,
        block: &ast::ExternBlock,
    ) -> Result<()> {
        for attr in &item.attrs {
            if attr.name != "link" {
                continue;
            }

            let name = attr
                .items()
                .and_then(|items| items.iter().find(|i| i.name == "name"))
                .and_then(|i| i.as_str());

            match name {
                Some(name) => self.ext_libs.push(hir::ExternLibrary {
                    name: name.to_owned(),
                }),
                None => {
                    return Err(LowerError::new(attr.span, LowerErrorKind::LinkNeedsName));
                }
            }
        }

        for member in &block.items {
            let publicity = self.lower_publicity(&member.vis)?;
            let name = expect_name(member);

            match &member.data {
                ast::Item::Function(f) => {
                    let lowered =
                        self.lower_function(name.name, &member.attrs, f, None)?;
                    let ent = hir::VisEnt {
                        publicity,
                        ent: hir::ValueItem::Function(lowered),
                    };
                    if !module.add_value_item(name.name, ent) {
                        return Err(LowerError::new(
                            member.span,
                            LowerErrorKind::ItemConflict { name: name.name },
                        ));
                    }
                }
                ast::Item::Static(s) => {
                    let vi = self.lower_static_item(name.name, s)?;
                    let ent = hir::VisEnt {
                        publicity,
                        ent: vi,
                    };
                    if !module.add_value_item(name.name, ent) {
                        return Err(LowerError::new(
                            member.span,
                            LowerErrorKind::ItemConflict { name: name.name },
                        ));
                    }
                }
                ast::Item::TypeAlias(..) => {
                    let ent = hir::VisEnt {
                        publicity,
                        ent: hir::TypeItem::ExternType(hir::ExternType),
                    };
                    if !module.add_type_item(name.name, ent) {
                        return Err(LowerError::new(
                            member.span,
                            LowerErrorKind::ItemConflict { name: name.name },
                        ));
                    }
                }
                _ => bug!(member.span, "unexpected item in extern block"),
            }
        }

        Ok(())
    }

    /// Lower one `use` entry into namespace imports. Glob entries are left
    /// for downstream resolution.
    fn lower_use_entry(
        &mut self,
        module: &mut hir::Module,
        item: &ast::Named<ast::Item>,
        entry: &ast::UseEntry,
    ) -> Result<()> {
        let Some(local_name) = entry.name else {
            return Ok(());
        };

        let publicity = self.lower_publicity(&item.vis)?;
        let target = self.lower_simple_path(&entry.path, false)?;

        enum Ns {
            Type { is_variant: bool, index: usize },
            Value { is_variant: bool, index: usize },
            Macro,
        }

        let mut namespaces = Vec::new();

        match self.find_ast_item(&target) {
            Some(AstRef::EnumVariant(_, index)) => {
                namespaces.push(Ns::Type {
                    is_variant: true,
                    index,
                });
                namespaces.push(Ns::Value {
                    is_variant: true,
                    index,
                });
            }
            Some(AstRef::Struct(s)) => {
                namespaces.push(Ns::Type {
                    is_variant: false,
                    index: 0,
                });
                if !matches!(s.data, ast::StructData::Named(..)) {
                    namespaces.push(Ns::Value {
                        is_variant: false,
                        index: 0,
                    });
                }
            }
            Some(AstRef::Enum(..))
            | Some(AstRef::Union(..))
            | Some(AstRef::Trait(..))
            | Some(AstRef::TypeAlias(..))
            | Some(AstRef::Module(..)) => {
                namespaces.push(Ns::Type {
                    is_variant: false,
                    index: 0,
                });
            }
            Some(AstRef::Function(..)) | Some(AstRef::Static(..)) => {
                namespaces.push(Ns::Value {
                    is_variant: false,
                    index: 0,
                });
            }
            None => {
                // A macro, or an item in a crate we can't inspect: import
                // in every namespace and let resolution sort it out.
                if self.ast_macro_exists(&target) {
                    namespaces.push(Ns::Macro);
                } else {
                    namespaces.push(Ns::Type {
                        is_variant: false,
                        index: 0,
                    });
                    namespaces.push(Ns::Value {
                        is_variant: false,
                        index: 0,
                    });
                }
            }
        }

        for ns in namespaces {
            match ns {
                Ns::Type { is_variant, index } => {
                    let ent = hir::VisEnt {
                        publicity: publicity.clone(),
                        ent: hir::TypeItem::Import {
                            path: target.clone(),
                            is_variant,
                            index,
                        },
                    };
                    // Duplicate imports are tolerated; the first wins.
                    module.add_type_item(local_name, ent);
                }
                Ns::Value { is_variant, index } => {
                    let ent = hir::VisEnt {
                        publicity: publicity.clone(),
                        ent: hir::ValueItem::Import {
                            path: target.clone(),
                            is_variant,
                            index,
                        },
                    };
                    module.add_value_item(local_name, ent);
                }
                Ns::Macro => {
                    let ent = hir::VisEnt {
                        publicity: publicity.clone(),
                        ent: hir::MacroItem::Import {
                            path: target.clone(),
                        },
                    };
                    module.add_macro_item(local_name, ent);
                }
            }
        }

        Ok(())
    }

    fn ast_macro_exists(&self, path: &hir::SimplePath) -> bool {
        let Some((last, parents)) = path.components.split_last() else {
            return false;
        };
        let Some(module) = self.ast_module_at(parents) else {
            return false;
        };

        module.items.iter().any(|i| {
            i.name.map(|n| n.name) == Some(*last)
                && matches!(i.data, ast::Item::MacroRules(..))
        })
    }

    /// Lower a struct declaration, resolving its `repr` attributes.
    pub(crate) fn lower_struct(
        &mut self,
        s: &ast::Struct,
        attrs: &ast::AttributeList,
    ) -> Result<hir::Struct> {
        self.push_generic_frame(&s.params);

        let result = (|| {
            let params = self.lower_generic_params(&s.params, None)?;

            let data = match &s.data {
                ast::StructData::Unit => hir::StructData::Unit,
                ast::StructData::Tuple(fields) => {
                    let mut out = Vec::with_capacity(fields.len());
                    for field in fields {
                        out.push(hir::VisEnt {
                            publicity: self.lower_publicity(&field.vis)?,
                            ent: self.lower_type(&field.ty)?,
                        });
                    }
                    hir::StructData::Tuple(out)
                }
                ast::StructData::Named(fields) => {
                    let mut out = Vec::with_capacity(fields.len());
                    for field in fields {
                        out.push((field.name.name, hir::VisEnt {
                            publicity: self.lower_publicity(&field.vis)?,
                            ent: self.lower_type(&field.ty)?,
                        }));
                    }
                    hir::StructData::Named(out)
                }
            };

            Ok((params, data))
        })();

        self.pop_generic_frame();
        let (params, data) = result?;

        let (repr, forced_alignment) = self.resolve_struct_repr(attrs)?;

        Ok(hir::Struct {
            params,
            repr,
            data,
            forced_alignment,
        })
    }

    /// Accumulate `repr(...)` flags into a single tag. Permitted
    /// combinations: `C`, `packed`, `C + packed`, `simd`, `transparent`,
    /// `align(N)` (also with `C`). `packed` and `align` conflict.
    fn resolve_struct_repr(
        &mut self,
        attrs: &ast::AttributeList,
    ) -> Result<(hir::Repr, u32)> {
        let mut repr = hir::Repr::Rust;
        let mut forced_alignment = 0u32;

        for attr in attrs.iter().filter(|a| a.name == "repr") {
            let items = attr.items().ok_or_else(|| {
                LowerError::new(attr.span, LowerErrorKind::MalformedAttribute {
                    name: attr.name,
                })
            })?;

            for entry in items {
                let conflict = |prev: hir::Repr, new: &str| {
                    LowerError::new(entry.span, LowerErrorKind::ReprConflict {
                        prev: repr_name(prev).into(),
                        new: new.into(),
                    })
                };

                match entry.name.as_str() {
                    "C" => match repr {
                        hir::Repr::Rust => repr = hir::Repr::C,
                        hir::Repr::C | hir::Repr::Packed | hir::Repr::Aligned(..) => {}
                        _ => return Err(conflict(repr, "C")),
                    },
                    "packed" => match repr {
                        hir::Repr::Rust | hir::Repr::C => repr = hir::Repr::Packed,
                        hir::Repr::Packed => {}
                        _ => return Err(conflict(repr, "packed")),
                    },
                    "simd" => match repr {
                        hir::Repr::Rust => repr = hir::Repr::Simd,
                        _ => return Err(conflict(repr, "simd")),
                    },
                    "transparent" => match repr {
                        hir::Repr::Rust => repr = hir::Repr::Transparent,
                        _ => return Err(conflict(repr, "transparent")),
                    },
                    "align" => {
                        let value = entry
                            .items()
                            .and_then(|items| items.first())
                            .and_then(|i| match i.payload {
                                ast::AttrPayload::Int(v) => u32::try_from(v).ok(),
                                _ => None,
                            })
                            .ok_or_else(|| {
                                LowerError::new(entry.span, {
                                    LowerErrorKind::MalformedAttribute { name: entry.name }
                                })
                            })?;

                        match repr {
                            hir::Repr::Rust | hir::Repr::C => {
                                repr = hir::Repr::Aligned(value);
                                forced_alignment = value;
                            }
                            _ => return Err(conflict(repr, "align")),
                        }
                    }
                    other => {
                        return Err(LowerError::new(entry.span, LowerErrorKind::UnknownRepr {
                            what: other.into(),
                        }));
                    }
                }
            }
        }

        Ok((repr, forced_alignment))
    }

    /// Lower an enum.
    ///
    /// Every payload-bearing variant produces an anonymous sibling struct
    /// whose generic parameters mirror the enum's; the variant's type
    /// becomes a path to that struct parameterized by the enum's own
    /// parameters. An enum mixing explicit discriminants with payload
    /// variants is a hard error. The empty enum is a value enum.
    pub(crate) fn lower_enum(
        &mut self,
        mod_path: &hir::SimplePath,
        enum_name: Name,
        e: &ast::Enum,
        attrs: &ast::AttributeList,
        span: Span,
    ) -> Result<(hir::Enum, Vec<(Name, hir::Struct)>)> {
        let has_value = e
            .variants
            .iter()
            .any(|v| matches!(v.data, ast::EnumVariantData::Value(..)));
        let has_data = e.variants.iter().any(|v| {
            matches!(
                v.data,
                ast::EnumVariantData::Tuple(..) | ast::EnumVariantData::Struct(..)
            )
        });

        if has_value && has_data {
            return Err(LowerError::new(span, LowerErrorKind::EnumMixedVariants {
                name: enum_name,
            }));
        }

        self.push_generic_frame(&e.params);

        let result = if !has_data {
            self.lower_value_enum(e, attrs)
                .map(|class| (class, Vec::new()))
        } else {
            self.lower_data_enum(mod_path, enum_name, e)
        };

        let params = result
            .and_then(|(class, siblings)| {
                let params = self.lower_generic_params(&e.params, None)?;
                Ok((params, class, siblings))
            });

        self.pop_generic_frame();
        let (params, class, siblings) = params?;

        Ok((hir::Enum { params, class }, siblings))
    }

    fn lower_value_enum(
        &mut self,
        e: &ast::Enum,
        attrs: &ast::AttributeList,
    ) -> Result<hir::EnumClass> {
        let mut variants = Vec::with_capacity(e.variants.len());

        for variant in &e.variants {
            let expr = match &variant.data {
                ast::EnumVariantData::Unit => hir::ExprPtr::none(),
                ast::EnumVariantData::Value(expr) => hir::ExprPtr::new(expr.clone()),
                _ => bug!(variant.span, "data variant in value enum"),
            };

            variants.push(hir::ValueVariant {
                name: variant.name.name,
                expr,
                value: 0,
            });
        }

        let mut repr = hir::EnumRepr::Rust;

        if let Some(attr) = attrs.get("repr") {
            let entry = attr
                .items()
                .filter(|items| items.len() == 1)
                .map(|items| &items[0])
                .filter(|entry| entry.is_flag())
                .ok_or_else(|| {
                    LowerError::new(attr.span, LowerErrorKind::MalformedAttribute {
                        name: attr.name,
                    })
                })?;

            repr = match entry.name.as_str() {
                "C" => hir::EnumRepr::C,
                "u8" => hir::EnumRepr::U8,
                "u16" => hir::EnumRepr::U16,
                "u32" => hir::EnumRepr::U32,
                "u64" => hir::EnumRepr::U64,
                "usize" => hir::EnumRepr::Usize,
                other => {
                    return Err(LowerError::new(entry.span, LowerErrorKind::UnknownRepr {
                        what: other.into(),
                    }));
                }
            };
        }

        Ok(hir::EnumClass::Value { repr, variants })
    }

    fn lower_data_enum(
        &mut self,
        mod_path: &hir::SimplePath,
        enum_name: Name,
        e: &ast::Enum,
    ) -> Result<(hir::EnumClass, Vec<(Name, hir::Struct)>)> {
        let enum_path = mod_path.child(enum_name);
        let mut variants = Vec::with_capacity(e.variants.len());
        let mut siblings = Vec::new();

        for variant in &e.variants {
            let data = match &variant.data {
                ast::EnumVariantData::Unit => {
                    variants.push(hir::DataVariant {
                        name: variant.name.name,
                        is_struct: false,
                        ty: hir::TypeRef::unit(),
                    });
                    continue;
                }
                ast::EnumVariantData::Value(..) => {
                    bug!(variant.span, "value variant in data enum")
                }
                ast::EnumVariantData::Tuple(types) => {
                    let mut fields = Vec::with_capacity(types.len());
                    for ty in types {
                        fields.push(hir::VisEnt {
                            publicity: hir::Publicity::new_global(),
                            ent: self.lower_type(ty)?,
                        });
                    }
                    hir::StructData::Tuple(fields)
                }
                ast::EnumVariantData::Struct(ast_fields) => {
                    let mut fields = Vec::with_capacity(ast_fields.len());
                    for field in ast_fields {
                        fields.push((field.name.name, hir::VisEnt {
                            publicity: hir::Publicity::new_global(),
                            ent: self.lower_type(&field.ty)?,
                        }));
                    }
                    hir::StructData::Named(fields)
                }
            };

            let ty_name = self.variant_struct_name(&enum_path, variant.name.name);

            siblings.push((ty_name, hir::Struct {
                params: self.lower_generic_params(&e.params, None)?,
                repr: hir::Repr::Rust,
                data,
                forced_alignment: 0,
            }));

            // The variant's type is a path to the sibling struct carrying
            // the enum's own parameters in declaration order.
            let mut params = hir::PathParams::default();
            for tp in &e.params.types {
                let index = self
                    .lookup_generic(tp.name.name)
                    .unwrap_or_else(|| bug!(variant.span, "enum parameter out of scope"));
                params.types.push(hir::TypeRef::Generic {
                    name: tp.name.name,
                    index,
                });
            }

            let ty_path = hir::GenericPath::new(mod_path.child(ty_name), params);
            variants.push(hir::DataVariant {
                name: variant.name.name,
                is_struct: matches!(variant.data, ast::EnumVariantData::Struct(..)),
                ty: hir::TypeRef::new_path(ty_path),
            });
        }

        Ok((hir::EnumClass::Data(variants), siblings))
    }

    /// Lower a union.
    pub(crate) fn lower_union(
        &mut self,
        u: &ast::Union,
        attrs: &ast::AttributeList,
    ) -> Result<hir::Union> {
        let mut repr = hir::UnionRepr::Rust;

        if let Some(attr) = attrs.get("repr") {
            let entry = attr
                .items()
                .filter(|items| items.len() == 1)
                .map(|items| &items[0])
                .ok_or_else(|| {
                    LowerError::new(attr.span, LowerErrorKind::MalformedAttribute {
                        name: attr.name,
                    })
                })?;

            repr = match entry.name.as_str() {
                "C" => hir::UnionRepr::C,
                other => {
                    return Err(LowerError::new(entry.span, LowerErrorKind::UnknownRepr {
                        what: other.into(),
                    }));
                }
            };
        }

        self.push_generic_frame(&u.params);

        let result = (|| {
            let params = self.lower_generic_params(&u.params, None)?;

            let mut fields = Vec::with_capacity(u.fields.len());
            for field in &u.fields {
                fields.push((field.name.name, hir::VisEnt {
                    publicity: self.lower_publicity(&field.vis)?,
                    ent: self.lower_type(&field.ty)?,
                }));
            }

            Ok(hir::Union {
                params,
                repr,
                fields,
            })
        })();

        self.pop_generic_frame();
        result
    }

    /// Lower a trait declaration, synthesizing the `Self: ThisTrait`
    /// bound used by downstream resolution.
    pub(crate) fn lower_trait(
        &mut self,
        trait_path: &hir::SimplePath,
        t: &ast::Trait,
    ) -> Result<hir::Trait> {
        self.push_generic_frame(&t.params);

        let result = (|| {
            let mut self_is_sized = true;
            let mut params = self.lower_generic_params(&t.params, Some(&mut self_is_sized))?;

            let mut parents = Vec::with_capacity(t.supertraits.len());
            for st in &t.supertraits {
                parents.push(self.lower_trait_path(&st.path, &st.hrbs)?);
            }

            // Downstream resolution leans on every trait carrying a bound
            // of its own Self.
            let mut this_params = hir::PathParams::default();
            for tp in &params.types {
                let index = self
                    .lookup_generic(tp.name)
                    .expect("trait parameter in scope");
                this_params.types.push(hir::TypeRef::Generic {
                    name: tp.name,
                    index,
                });
            }
            params.bounds.push(hir::GenericBound::TraitBound {
                ty: hir::TypeRef::self_generic(),
                trait_: hir::TraitPath::new(hir::GenericPath::new(
                    trait_path.clone(),
                    this_params,
                )),
            });

            let mut rv = hir::Trait::new(params, None, parents);
            rv.is_marker = t.is_marker;

            for item in &t.items {
                let Some(name) = item.name else { continue };

                match &item.data {
                    ast::Item::None | ast::Item::MacroInvocation(..) => {}
                    ast::Item::TypeAlias(alias) => {
                        let assoc = self.lower_associated_type(item, alias)?;
                        rv.types.insert(name.name, assoc);
                    }
                    ast::Item::Function(f) => {
                        let self_ty = hir::TypeRef::self_generic();
                        let mut f =
                            self.lower_function(name.name, &item.attrs, f, Some(&self_ty))?;
                        f.save_code = true;
                        rv.values
                            .insert(name.name, hir::TraitValueItem::Function(f));
                    }
                    ast::Item::Static(s) => {
                        let value = match s.class {
                            ast::StaticClass::Const => {
                                hir::TraitValueItem::Constant(hir::Constant {
                                    params: hir::GenericParams::default(),
                                    ty: self.lower_type(&s.ty)?,
                                    value: s.value.clone().into(),
                                })
                            }
                            _ => hir::TraitValueItem::Static(hir::Static {
                                linkage: hir::Linkage::default(),
                                is_mut: s.class == ast::StaticClass::Mut,
                                ty: self.lower_type(&s.ty)?,
                                value: s.value.clone().into(),
                            }),
                        };
                        rv.values.insert(name.name, value);
                    }
                    _ => bug!(item.span, "unexpected {} in trait", item.data.tag()),
                }
            }

            Ok(rv)
        })();

        self.pop_generic_frame();
        result
    }

    /// Lower an associated type declaration, separating its bounds into
    /// the sized flag, a single lifetime bound, and trait bounds.
    fn lower_associated_type(
        &mut self,
        item: &ast::Named<ast::Item>,
        alias: &ast::TypeAlias,
    ) -> Result<hir::AssociatedType> {
        let mut is_sized = true;
        let params = self.lower_generic_params(&alias.params, Some(&mut is_sized))?;

        let mut lifetime_bound = None;
        let mut trait_bounds = Vec::new();

        for bound in params.bounds {
            match bound {
                hir::GenericBound::TypeLifetime { ty, bound } => {
                    if !ty.is_self() {
                        bug!(item.span, "invalid lifetime bound on associated type");
                    }
                    lifetime_bound = Some(bound);
                }
                hir::GenericBound::TraitBound { ty, trait_ } => {
                    if !ty.is_self() {
                        bug!(item.span, "invalid trait bound on associated type");
                    }
                    trait_bounds.push(trait_);
                }
                _ => bug!(item.span, "unexpected bound on associated type"),
            }
        }

        let default = if matches!(alias.ty.data, ast::TypeData::Invalid) {
            None
        } else {
            Some(self.lower_type(&alias.ty)?)
        };

        Ok(hir::AssociatedType {
            is_sized,
            lifetime_bound,
            trait_bounds,
            default,
        })
    }

    /// Lower a function, classifying its receiver and deriving linkage.
    ///
    /// `self_ty` is the real self type in impl scope, the `Self` parameter
    /// in trait scope, and absent for free functions.
    pub(crate) fn lower_function(
        &mut self,
        name: Name,
        attrs: &ast::AttributeList,
        f: &ast::Function,
        self_ty: Option<&hir::TypeRef>,
    ) -> Result<hir::Function> {
        self.push_generic_frame(&f.params);

        let result = (|| {
            let params = self.lower_generic_params(&f.params, None)?;

            let mut args = Vec::with_capacity(f.args.len());
            for (pat, ty) in &f.args {
                args.push((self.lower_pattern(pat)?, self.lower_type(ty)?));
            }

            let receiver = self.classify_receiver(f.span, &args, self_ty)?;
            let linkage = self.derive_linkage(name, attrs, f)?;

            // `inline` is a downstream hint that the body must be kept.
            let save_code = match attrs.get("inline") {
                Some(attr) => !attr
                    .items()
                    .map(|items| items.iter().any(|i| i.name == "never"))
                    .unwrap_or(false),
                None => false,
            };

            Ok(hir::Function {
                save_code,
                linkage,
                receiver,
                abi: f.abi,
                is_unsafe: f.is_unsafe,
                is_const: f.is_const,
                params,
                args,
                is_variadic: f.is_variadic,
                ret: self.lower_type(&f.ret)?,
                code: f.code.clone().into(),
            })
        })();

        self.pop_generic_frame();
        result
    }

    /// Classify the method receiver from the lowered type of the `self`
    /// argument. The self type is normalized once, then matched
    /// structurally.
    fn classify_receiver(
        &mut self,
        span: Span,
        args: &[(hir::Pattern, hir::TypeRef)],
        self_ty: Option<&hir::TypeRef>,
    ) -> Result<hir::Receiver> {
        let is_self_arg = args
            .first()
            .and_then(|(pat, _)| pat.binding.as_ref())
            .map(|b| b.name == "self")
            .unwrap_or(false);

        if !is_self_arg {
            return Ok(hir::Receiver::Free);
        }

        let arg_ty = &args[0].1;
        let matches_self =
            |ty: &hir::TypeRef| ty.is_self() || self_ty.map_or(false, |s| ty == s);

        let unsupported = || {
            LowerError::new(span, LowerErrorKind::UnsupportedReceiver {
                ty: arg_ty.to_string().into_boxed_str(),
            })
        };

        if matches_self(arg_ty) {
            return Ok(hir::Receiver::Value);
        }

        match arg_ty {
            hir::TypeRef::Borrow { kind, inner } if matches_self(inner) => {
                Ok(match kind {
                    hir::BorrowKind::Owned => hir::Receiver::BorrowOwned,
                    hir::BorrowKind::Unique => hir::Receiver::BorrowUnique,
                    hir::BorrowKind::Shared => hir::Receiver::BorrowShared,
                })
            }
            hir::TypeRef::Path(hir::Path::Generic(gp)) => {
                let types = &gp.params.types;

                if types.len() != 1 || !matches_self(&types[0]) {
                    return Err(unsupported());
                }

                let owned_box = self.lang_items.get(&Name::new("owned_box"));
                if Some(&gp.path) == owned_box {
                    Ok(hir::Receiver::Box)
                } else {
                    // Any other single-parameter path wrapping Self.
                    Ok(hir::Receiver::Custom)
                }
            }
            _ => Err(unsupported()),
        }
    }

    /// Derive linkage from attributes, first match wins: test-harness
    /// bodies get none; `link_name`; `no_mangle`; `lang = "panic_fmt"`;
    /// otherwise prototypes keep their own name.
    fn derive_linkage(
        &mut self,
        name: Name,
        attrs: &ast::AttributeList,
        f: &ast::Function,
    ) -> Result<hir::Linkage> {
        let mut linkage = hir::Linkage::default();

        let link_name = attrs.get("link_name");
        let no_mangle = attrs.get("no_mangle");

        if link_name.is_some() && no_mangle.is_some() {
            let span = link_name.map(|a| a.span).unwrap_or_default();
            return Err(LowerError::new(span, LowerErrorKind::LinkageConflict));
        }

        if self.test_harness && f.code.is_some() {
            // Test harness code keeps default linkage.
        } else if let Some(attr) = link_name {
            let value = attr.as_str().ok_or_else(|| {
                LowerError::new(attr.span, LowerErrorKind::MalformedAttribute {
                    name: attr.name,
                })
            })?;
            linkage.name = Some(Name::new(value));
        } else if no_mangle.is_some() {
            linkage.name = Some(name);
        } else if attrs.get("lang").and_then(|a| a.as_str()) == Some("panic_fmt") {
            linkage.name = Some(Name::new("rust_begin_unwind"));
        }

        // Prototypes are external symbols under their own name.
        if linkage.name.is_none() && f.code.is_none() {
            linkage.name = Some(name);
        }

        Ok(linkage)
    }
}

fn expect_name(item: &ast::Named<ast::Item>) -> crate::lex::Ident {
    match item.name {
        Some(name) => name,
        None => bug!(item.span, "unnamed {} item", item.data.tag()),
    }
}

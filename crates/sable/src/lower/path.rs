use crate::ast;
use crate::hir;
use crate::lower::{LowerError, LowerErrorKind, LoweringContext, Result};
use crate::name::Name;
use crate::span::bug;

/// What an absolute path names in the crate under compilation.
pub(crate) enum AstRef<'a> {
    Struct(&'a ast::Struct),
    Enum(&'a ast::Enum),
    /// An enum variant, with its index.
    EnumVariant(&'a ast::Enum, usize),
    Union(&'a ast::Union),
    Trait(&'a ast::Trait),
    TypeAlias(&'a ast::TypeAlias),
    Function(&'a ast::Function),
    Static(&'a ast::Static),
    Module(&'a ast::Module),
}

impl<'a> LoweringContext<'a> {
    /// The AST module at the given component path, in the current crate.
    pub(crate) fn ast_module_at(&self, components: &[Name]) -> Option<&'a ast::Module> {
        let mut module = &self.ast.root;

        'components: for c in components {
            for item in &module.items {
                if item.name.map(|n| n.name) == Some(*c) {
                    if let ast::Item::Module(sub) = &item.data {
                        module = sub;
                        continue 'components;
                    }
                }
            }
            return None;
        }

        Some(module)
    }

    /// Find the item an absolute path names in the current crate's AST.
    /// Two-level lookup handles enum variants.
    pub(crate) fn find_ast_item(&self, path: &hir::SimplePath) -> Option<AstRef<'a>> {
        if !path.crate_name.is_empty() && path.crate_name != self.crate_name {
            return None;
        }

        let (last, parents) = path.components.split_last()?;

        if let Some(module) = self.ast_module_at(parents) {
            for item in &module.items {
                if item.name.map(|n| n.name) != Some(*last) {
                    continue;
                }
                match &item.data {
                    ast::Item::Struct(s) => return Some(AstRef::Struct(s)),
                    ast::Item::Enum(e) => return Some(AstRef::Enum(e)),
                    ast::Item::Union(u) => return Some(AstRef::Union(u)),
                    ast::Item::Trait(t) => return Some(AstRef::Trait(t)),
                    ast::Item::TypeAlias(t) => return Some(AstRef::TypeAlias(t)),
                    ast::Item::Function(f) => return Some(AstRef::Function(f)),
                    ast::Item::Static(s) => return Some(AstRef::Static(s)),
                    ast::Item::Module(m) => return Some(AstRef::Module(m)),
                    _ => {}
                }
            }
        }

        // `Enum::Variant` paths resolve through the enclosing enum.
        let (enum_name, enum_parents) = parents.split_last()?;
        let module = self.ast_module_at(enum_parents)?;

        for item in &module.items {
            if item.name.map(|n| n.name) != Some(*enum_name) {
                continue;
            }
            if let ast::Item::Enum(e) = &item.data {
                let index = e.variants.iter().position(|v| v.name.name == *last)?;
                return Some(AstRef::EnumVariant(e, index));
            }
        }

        None
    }

    /// Test if an absolute path names a trait, and whether that trait is a
    /// marker. Searches the current crate's AST and loaded extern crates.
    pub(crate) fn trait_is_marker(&self, path: &hir::SimplePath) -> Option<bool> {
        if path.crate_name.is_empty() || path.crate_name == self.crate_name {
            if let Some(AstRef::Trait(t)) = self.find_ast_item(path) {
                return Some(t.is_marker);
            }
            return None;
        }

        let ext = self.ext_crates.get(&path.crate_name)?;
        let local = hir::SimplePath::new(Name::empty(), path.components.clone());
        Some(ext.hir.trait_by_path(&local)?.is_marker)
    }

    /// Rewrite any path class into absolute form, resolving relative paths
    /// against the module stack, imports, and extern crates.
    pub(crate) fn resolve_path_class(&self, path: &ast::Path) -> Result<ast::Path> {
        match &path.class {
            ast::PathClass::Absolute { .. } => Ok(path.clone()),
            ast::PathClass::Local(id) => {
                self.resolve_relative(path, &[ast::PathNode::new(*id)])
            }
            ast::PathClass::Relative { nodes } => self.resolve_relative(path, nodes),
            ast::PathClass::Self_ { nodes } => {
                let mut all: Vec<ast::PathNode> = self.mod_nodes();
                all.extend(nodes.iter().cloned());
                Ok(ast::Path::absolute(path.span, Name::empty(), all))
            }
            ast::PathClass::Super { count, nodes } => {
                let mut all = self.mod_nodes();
                for _ in 0..*count {
                    all.pop();
                }
                all.extend(nodes.iter().cloned());
                Ok(ast::Path::absolute(path.span, Name::empty(), all))
            }
            ast::PathClass::Invalid | ast::PathClass::Ufcs { .. } => {
                bug!(path.span, "path class {:?} cannot be made absolute", path.class)
            }
        }
    }

    fn mod_nodes(&self) -> Vec<ast::PathNode> {
        self.mod_stack
            .iter()
            .map(|n| ast::PathNode::new(crate::lex::Ident::new(n.as_str())))
            .collect()
    }

    /// Resolve a relative path: search the current module and its
    /// ancestors for an item, an import, or an extern crate matching the
    /// first component.
    fn resolve_relative(
        &self,
        path: &ast::Path,
        nodes: &[ast::PathNode],
    ) -> Result<ast::Path> {
        let first = match nodes.first() {
            Some(node) => node.name.name,
            None => bug!(path.span, "empty relative path"),
        };

        for depth in (0..=self.mod_stack.len()).rev() {
            let components = &self.mod_stack[..depth];
            let Some(module) = self.ast_module_at(components) else {
                continue;
            };

            for item in &module.items {
                // An extern crate declaration re-anchors the path.
                if let ast::Item::Crate { name } = &item.data {
                    if item.name.map(|n| n.name) == Some(first) {
                        return Ok(ast::Path::absolute(
                            path.span,
                            *name,
                            nodes[1..].to_vec(),
                        ));
                    }
                }

                if item.name.map(|n| n.name) == Some(first)
                    && !matches!(item.data, ast::Item::None)
                {
                    let mut all: Vec<ast::PathNode> = components
                        .iter()
                        .map(|n| ast::PathNode::new(crate::lex::Ident::new(n.as_str())))
                        .collect();
                    all.extend(nodes.iter().cloned());
                    return Ok(ast::Path::absolute(path.span, Name::empty(), all));
                }

                // Imports redirect the prefix.
                if let ast::Item::Use(use_item) = &item.data {
                    for entry in &use_item.entries {
                        if entry.name != Some(first) {
                            continue;
                        }

                        let mut base =
                            self.resolve_use_target(&entry.path, components, path.span)?;
                        base.extend(nodes[1..].iter().cloned());

                        let crate_name = match &entry.path.class {
                            ast::PathClass::Absolute { crate_name, .. } => *crate_name,
                            _ => Name::empty(),
                        };

                        return Ok(ast::Path::absolute(path.span, crate_name, base));
                    }
                }
            }
        }

        Err(LowerError::new(path.span, LowerErrorKind::UnresolvedPath {
            path: path.to_string().into_boxed_str(),
        }))
    }

    /// The absolute components a use entry's path refers to, evaluated in
    /// the module it was written in.
    fn resolve_use_target(
        &self,
        target: &ast::Path,
        module: &[Name],
        span: crate::span::Span,
    ) -> Result<Vec<ast::PathNode>> {
        match &target.class {
            ast::PathClass::Absolute { nodes, .. } => Ok(nodes.clone()),
            ast::PathClass::Self_ { nodes } => {
                let mut all: Vec<ast::PathNode> = module
                    .iter()
                    .map(|n| ast::PathNode::new(crate::lex::Ident::new(n.as_str())))
                    .collect();
                all.extend(nodes.iter().cloned());
                Ok(all)
            }
            ast::PathClass::Super { count, nodes } => {
                let keep = module.len().saturating_sub(*count);
                let mut all: Vec<ast::PathNode> = module[..keep]
                    .iter()
                    .map(|n| ast::PathNode::new(crate::lex::Ident::new(n.as_str())))
                    .collect();
                all.extend(nodes.iter().cloned());
                Ok(all)
            }
            _ => bug!(span, "use entry with unresolved path class"),
        }
    }

    /// Lower an absolute path to a [hir::SimplePath]. Only the final node
    /// may carry generic arguments, and then only when
    /// `allow_final_generic` is set.
    pub(crate) fn lower_simple_path(
        &self,
        path: &ast::Path,
        allow_final_generic: bool,
    ) -> Result<hir::SimplePath> {
        let resolved = self.resolve_path_class(path)?;

        match &resolved.class {
            ast::PathClass::Absolute { crate_name, nodes } => {
                for (n, node) in nodes.iter().enumerate() {
                    if !node.params.is_empty()
                        && !(allow_final_generic && n == nodes.len() - 1)
                    {
                        bug!(path.span, "path parameters on a non-final node in {}", path);
                    }
                }

                let crate_name = if *crate_name == self.crate_name {
                    Name::empty()
                } else {
                    *crate_name
                };

                Ok(hir::SimplePath::new(
                    crate_name,
                    nodes.iter().map(|n| n.name.name).collect(),
                ))
            }
            _ => bug!(path.span, "non-absolute path after resolution: {}", path),
        }
    }

    /// Lower path parameters. Associated bindings are only allowed where
    /// the caller says so.
    pub(crate) fn lower_path_params(
        &mut self,
        params: &ast::PathParams,
        allow_assoc: bool,
        span: crate::span::Span,
    ) -> Result<hir::PathParams> {
        if !allow_assoc && !params.bindings.is_empty() {
            bug!(span, "associated type bindings where none are allowed");
        }

        let mut out = hir::PathParams::default();
        for ty in &params.types {
            out.types.push(self.lower_type(ty)?);
        }
        for (name, ty) in &params.bindings {
            out.bindings.push((name.name, self.lower_type(ty)?));
        }

        Ok(out)
    }

    /// Lower a path to a [hir::GenericPath]; generic arguments may only
    /// appear on the final node.
    pub(crate) fn lower_generic_path(
        &mut self,
        path: &ast::Path,
        allow_assoc: bool,
    ) -> Result<hir::GenericPath> {
        if let ast::PathClass::Ufcs { ty, trait_, nodes } = &path.class {
            // `<Self>` in trait-path position unwraps to the inner path.
            if trait_.is_none() && nodes.is_empty() {
                if let ast::TypeData::Path(inner) = &ty.data {
                    return self.lower_generic_path(inner, false);
                }
            }
            bug!(path.span, "UFCS path where a generic path is required: {}", path);
        }

        let resolved = self.resolve_path_class(path)?;
        let simple = self.lower_simple_path(&resolved, true)?;

        let params = match resolved.nodes().last() {
            Some(node) => self.lower_path_params(&node.params, allow_assoc, path.span)?,
            None => hir::PathParams::default(),
        };

        let gp = hir::GenericPath::new(simple, params);
        log::trace!("{} => {}", path, gp);
        Ok(gp)
    }

    /// Lower a trait reference. Associated-type bindings move into the
    /// trait path's bound map; `hrls` carries the binder lifetimes.
    pub(crate) fn lower_trait_path(
        &mut self,
        path: &ast::Path,
        hrbs: &ast::HigherRankedBounds,
    ) -> Result<hir::TraitPath> {
        let mut gp = self.lower_generic_path(path, true)?;
        let type_bounds = std::mem::take(&mut gp.params.bindings);

        Ok(hir::TraitPath {
            path: gp,
            type_bounds,
            hrls: hrbs.lifetimes.iter().map(|l| l.name.name).collect(),
            trait_ref: Default::default(),
        })
    }

    /// Lower a path in any class to a full [hir::Path].
    pub(crate) fn lower_path(&mut self, path: &ast::Path) -> Result<hir::Path> {
        let (ty, trait_, nodes) = match &path.class {
            ast::PathClass::Invalid => {
                bug!(path.span, "invalid path reached lowering")
            }
            ast::PathClass::Ufcs { ty, trait_, nodes } => (ty, trait_, nodes),
            _ => {
                return Ok(hir::Path::Generic(self.lower_generic_path(path, false)?));
            }
        };

        if nodes.is_empty() {
            if trait_.is_some() {
                bug!(path.span, "UFCS path with a trait and no item: {}", path);
            }
            let ty = self.lower_type(ty)?;
            match ty {
                hir::TypeRef::Path(inner) => return Ok(inner),
                _ => bug!(path.span, "UFCS path with no item on non-path type"),
            }
        }

        if nodes.len() > 1 {
            bug!(path.span, "UFCS path with multiple items: {}", path);
        }

        // Associated bindings are not allowed in UFCS paths.
        let params = self.lower_path_params(&nodes[0].params, false, path.span)?;
        let item = nodes[0].name.name;
        let ty = Box::new(self.lower_type(ty)?);

        match trait_ {
            Some(trait_path) => Ok(hir::Path::UfcsKnown {
                ty,
                trait_: self.lower_generic_path(trait_path, false)?,
                item,
                params,
            }),
            // Selection off a generic parameter goes through a trait that
            // is not yet known.
            None if matches!(*ty, hir::TypeRef::Generic { .. }) => {
                Ok(hir::Path::UfcsUnknown { ty, item, params })
            }
            None => Ok(hir::Path::UfcsInherent { ty, item, params }),
        }
    }
}

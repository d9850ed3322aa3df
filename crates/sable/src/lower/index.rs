use crate::hir;
use crate::lower::{LowerError, LowerErrorKind, Result};
use crate::name::Name;
use crate::span::Span;

/// The indexing post-pass: bind every trait bound's resolution cache to
/// the definitive trait located by its path.
///
/// This runs strictly after modules and impls are lowered, because forward
/// references are legal.
pub(crate) fn index_crate(krate: &hir::Crate) -> Result<()> {
    visit_module(krate, &krate.root_module)?;

    for impl_ in krate.type_impls.iter() {
        visit_params(krate, &impl_.params)?;
        for method in impl_.methods.values() {
            visit_params(krate, &method.data.params)?;
        }
    }

    for group in krate.trait_impls.values() {
        for impl_ in group.iter() {
            visit_params(krate, &impl_.params)?;
            for method in impl_.methods.values() {
                visit_params(krate, &method.data.params)?;
            }
        }
    }

    for group in krate.marker_impls.values() {
        for impl_ in group.iter() {
            visit_params(krate, &impl_.params)?;
        }
    }

    Ok(())
}

fn visit_module(krate: &hir::Crate, module: &hir::Module) -> Result<()> {
    for ent in module.type_items.values() {
        match &ent.ent {
            hir::TypeItem::Module(sub) => visit_module(krate, sub)?,
            hir::TypeItem::Struct(s) => visit_params(krate, &s.params)?,
            hir::TypeItem::Enum(e) => visit_params(krate, &e.params)?,
            hir::TypeItem::Union(u) => visit_params(krate, &u.params)?,
            hir::TypeItem::TypeAlias(t) => visit_params(krate, &t.params)?,
            hir::TypeItem::Trait(t) => {
                visit_params(krate, &t.params)?;
                for value in t.values.values() {
                    if let hir::TraitValueItem::Function(f) = value {
                        visit_params(krate, &f.params)?;
                    }
                }
            }
            hir::TypeItem::Import { .. } | hir::TypeItem::ExternType(..) => {}
        }
    }

    for ent in module.value_items.values() {
        match &ent.ent {
            hir::ValueItem::Function(f) => visit_params(krate, &f.params)?,
            hir::ValueItem::Constant(c) => visit_params(krate, &c.params)?,
            _ => {}
        }
    }

    Ok(())
}

fn visit_params(krate: &hir::Crate, params: &hir::GenericParams) -> Result<()> {
    for bound in &params.bounds {
        if let hir::GenericBound::TraitBound { trait_, .. } = bound {
            bind_trait(krate, trait_)?;
        }
    }
    Ok(())
}

fn bind_trait(krate: &hir::Crate, trait_: &hir::TraitPath) -> Result<()> {
    let path = &trait_.path.path;

    let found = if path.crate_name.is_empty() {
        krate.trait_by_path(path).is_some()
    } else {
        match krate.ext_crates.get(&path.crate_name) {
            Some(ext) => {
                let local = hir::SimplePath::new(Name::empty(), path.components.clone());
                ext.hir.trait_by_path(&local).is_some()
            }
            // A dependency that was never loaded can't be checked; leave
            // the cache unbound for the driver to resolve.
            None => return Ok(()),
        }
    };

    if !found {
        return Err(LowerError::new(Span::empty(), LowerErrorKind::UnresolvedPath {
            path: path.to_string().into_boxed_str(),
        }));
    }

    let _ = trait_.trait_ref.set(path.clone());
    Ok(())
}

use std::path::{Path as FsPath, PathBuf};

use crate::ast::{AttributeList, FileInfo, Module};
use crate::lex::{Ident, Lexer};
use crate::name::Name;
use crate::parse::{ParseError, ParseErrorKind, Parser, Result};
use crate::span::Span;

/// Strip the last path segment, treating a trailing separator as marking a
/// directory. Inline modules record their directory as `dir/`, which keeps
/// resolution anchored there.
fn dirname(path: &FsPath) -> PathBuf {
    let s = path.to_string_lossy();
    match s.rfind('/') {
        Some(i) => PathBuf::from(&s[..i]),
        None => PathBuf::new(),
    }
}

fn as_dir(path: &FsPath) -> PathBuf {
    PathBuf::from(format!("{}/", path.display()))
}

impl<'s, 'a> Parser<'s, 'a> {
    /// Compute the file provenance of an inline `mod name { ... }`.
    ///
    /// The module is anchored in a directory derived from the parent's
    /// provenance so that `mod child;` declarations inside it resolve
    /// consistently.
    pub(crate) fn inline_mod_file(
        &mut self,
        parent: &FileInfo,
        mod_path: &[Name],
        name: Name,
        path_attr: Option<&str>,
    ) -> FileInfo {
        if parent.is_stdin() {
            return FileInfo {
                path: PathBuf::from("-"),
                controls_dir: true,
            };
        }

        let parent_dir = dirname(&parent.path);

        let (sub_path, controls_dir) = match path_attr {
            Some(attr) => (parent_dir.join(attr), true),
            None if parent.controls_dir => (parent_dir.join(name.as_str()), true),
            None => {
                let parent_name = mod_path.last().map(|n| n.as_str()).unwrap_or("");
                (parent_dir.join(parent_name).join(name.as_str()), false)
            }
        };

        FileInfo {
            path: as_dir(&sub_path),
            controls_dir,
        }
    }

    /// Resolve and parse the file behind `mod name;`.
    ///
    /// Resolution rules, in order: an explicit `#[path]` attribute is
    /// appended to the parent's directory; a controlling parent probes
    /// `name/mod.rs` and `name.rs`, requiring exactly one; any other parent
    /// probes `name.rs` in the sibling directory named after it. Stdin
    /// disables out-of-line loading entirely.
    pub(crate) fn load_module_file(
        &mut self,
        parent: &FileInfo,
        mod_path: &[Name],
        name: Ident,
        attrs: &mut AttributeList,
        path_attr: Option<&str>,
        span: Span,
    ) -> Result<Module> {
        if parent.is_stdin() {
            return Err(ParseError::new(span, ParseErrorKind::ModFromStdin));
        }

        let parent_dir = dirname(&parent.path);

        let (file_path, controls_dir) = if let Some(attr) = path_attr {
            (parent_dir.join(attr), true)
        } else if parent.controls_dir {
            let file = parent_dir.join(format!("{}.rs", name.name));
            let dir_file = parent_dir.join(name.name.as_str()).join("mod.rs");

            let have_file = self.sess().loader.exists(&file);
            let have_dir = self.sess().loader.exists(&dir_file);

            match (have_file, have_dir) {
                (true, true) => {
                    return Err(ParseError::new(span, ParseErrorKind::ModAmbiguous {
                        name: name.name,
                        file,
                        dir_file,
                    }));
                }
                (true, false) => (file, false),
                (false, true) => (dir_file, true),
                (false, false) => {
                    return Err(ParseError::new(span, ParseErrorKind::ModNotFound {
                        name: name.name,
                        dir: parent_dir,
                    }));
                }
            }
        } else {
            let parent_name = mod_path.last().map(|n| n.as_str()).unwrap_or("");
            let file = parent_dir
                .join(parent_name)
                .join(format!("{}.rs", name.name));

            if !self.sess().loader.exists(&file) {
                return Err(ParseError::new(span, ParseErrorKind::ModOutsideController {
                    name: name.name,
                }));
            }

            (file, false)
        };

        log::debug!("mod {} -> {}", name.name, file_path.display());

        let source = self.sess().loader.load(&file_path).map_err(|e| {
            ParseError::new(span, ParseErrorKind::SourceError {
                path: e.path,
                error: e.error,
            })
        })?;

        let id = self.sess().sources.insert(source);
        let lexer = Lexer::new(
            self.sess().sources.get(id).expect("just inserted"),
            id,
        );

        let file = FileInfo {
            path: file_path,
            controls_dir,
        };
        let mut module = Module::new(file);

        let mut sub_mod_path: Vec<Name> = mod_path.to_vec();
        sub_mod_path.push(name.name);

        let mut sub = Parser::new(self.sess(), Box::new(lexer));
        sub.parse_parent_attrs(attrs)?;
        sub.parse_mod_items(&mut module, &sub_mod_path)?;

        let token = sub.next()?;
        if token.kind != crate::lex::Kind::Eof {
            return Err(Parser::unexpected(&token, &["end of input"]));
        }

        Ok(module)
    }
}

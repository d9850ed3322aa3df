//! The front end of the Sable compiler.
//!
//! The pipeline turns source text into a fully typed, lowered intermediate
//! representation ready for MIR construction and semantic testing:
//!
//! 1. [lex]: source bytes to tokens with spans and hygiene contexts.
//! 2. [parse]: tokens to the surface [ast], loading submodule files as
//!    `mod` declarations are encountered.
//! 3. [expand]: in-place expansion of built-in macros and `cfg` handling.
//! 4. [lower]: the dependency-ordered rewrite producing the canonical
//!    [hir].
//!
//! ```no_run
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut sources = sable::Sources::new();
//! let mut loader = sable::FileSourceLoader::new();
//! let cfg = sable::expand::CfgSet::new();
//!
//! let mut sess = sable::parse::ParseSess {
//!     sources: &mut sources,
//!     loader: &mut loader,
//!     cfg: &cfg,
//! };
//!
//! let mut krate = sable::parse::parse_crate(
//!     &mut sess,
//!     Path::new("src/lib.rs"),
//!     sable::Name::new("demo"),
//! )?;
//! sable::expand::expand_crate(&mut sess, &mut krate)?;
//!
//! let hir = sable::lower::lower_crate(&krate, Default::default())?;
//! # let _ = hir;
//! # Ok(())
//! # }
//! ```

pub mod ast;
#[cfg(feature = "emit")]
pub mod emit;
pub mod expand;
pub mod hir;
pub mod lex;
pub mod lower;
mod name;
pub mod parse;
mod source;
mod span;

pub use self::name::Name;
pub use self::source::{
    FileSourceLoader, LoadError, MemorySourceLoader, Source, SourceLoader, Sources,
};
pub use self::span::{SourceId, Span, Spanned};

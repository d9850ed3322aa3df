//! Tokens and the lexer.
//!
//! Source text is turned into a stream of [Token]s by the [Lexer]. Macro
//! expansion re-enters the same token model through [TtStream], which also
//! carries [Interpolated] fragments: single virtual tokens holding an
//! already-parsed AST subtree.

mod lexer;
mod stream;
mod token;

pub use self::lexer::Lexer;
pub use self::stream::{TokenSource, TokenStream, TtStream};
pub use self::token::{
    Delimiter, FloatClass, Hygiene, Ident, IntClass, Interpolated, Kind, Token,
};

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::name::Name;
use crate::span::{Span, Spanned};

/// A parse result.
pub type Result<T, E = ParseError> = std::result::Result<T, E>;

/// An error raised while lexing, parsing, or expanding macros.
#[derive(Debug)]
pub struct ParseError {
    span: Span,
    kind: ParseErrorKind,
}

impl ParseError {
    /// Construct a new parse error.
    pub fn new<S>(spanned: S, kind: ParseErrorKind) -> Self
    where
        S: Spanned,
    {
        Self {
            span: spanned.span(),
            kind,
        }
    }

    /// Construct a generic error with a message.
    pub fn msg<S>(spanned: S, message: impl Into<Box<str>>) -> Self
    where
        S: Spanned,
    {
        Self::new(
            spanned,
            ParseErrorKind::Generic {
                message: message.into(),
            },
        )
    }

    /// Get the kind of the error.
    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }

    /// Convert into the kind of the error.
    pub fn into_kind(self) -> ParseErrorKind {
        self.kind
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.kind.fmt(f)
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.kind.source()
    }
}

impl Spanned for ParseError {
    fn span(&self) -> Span {
        self.span
    }
}

/// The kind of a parse error.
#[derive(Debug, Error)]
pub enum ParseErrorKind {
    /// A token that doesn't fit the grammar at this point.
    #[error("unexpected token `{actual}`, expected {expected}")]
    Unexpected {
        /// Description of the actual token.
        actual: Box<str>,
        /// Description of what was expected.
        expected: Box<str>,
    },
    /// A malformed construct with a free-form description.
    #[error("{message}")]
    Generic {
        /// The message.
        message: Box<str>,
    },

    /// An unterminated block comment.
    #[error("unterminated block comment")]
    UnterminatedComment,
    /// An unterminated string or character literal.
    #[error("unterminated literal")]
    UnterminatedString,
    /// An unknown escape sequence.
    #[error("invalid escape sequence `\\{c}`")]
    BadEscape {
        /// The escape character.
        c: char,
    },
    /// A character with no possible token interpretation.
    #[error("unexpected character `{c}`")]
    UnexpectedChar {
        /// The character.
        c: char,
    },
    /// A numeric literal with an unrecognized suffix.
    #[error("unknown numeric suffix `{suffix}`")]
    UnknownNumberSuffix {
        /// The suffix.
        suffix: Box<str>,
    },
    /// A numeric literal too large for 128 bits.
    #[error("integer literal out of range")]
    IntegerOverflow,
    /// A numeric literal with no digits or an unparseable body.
    #[error("malformed numeric literal")]
    MalformedNumber,

    /// `mod name;` while reading from stdin.
    #[error("cannot load module from file when reading stdin")]
    ModFromStdin,
    /// `mod name;` resolving to zero files.
    #[error("can't find file for module `{name}` in `{dir}`")]
    ModNotFound {
        /// The module name.
        name: Name,
        /// The directory that was searched.
        dir: PathBuf,
    },
    /// `mod name;` resolving to two files.
    #[error("both `{file}` and `{dir_file}` exist for module `{name}`")]
    ModAmbiguous {
        /// The module name.
        name: Name,
        /// The `name.rs` candidate.
        file: PathBuf,
        /// The `name/mod.rs` candidate.
        dir_file: PathBuf,
    },
    /// `mod name;` in a file that does not control its directory.
    #[error("can't load module `{name}` from a file outside of mod.rs or the crate root")]
    ModOutsideController {
        /// The module name.
        name: Name,
    },
    /// A source file failed to load.
    #[error("failed to load `{path}`: {error}")]
    SourceError {
        /// The path that failed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// A malformed attribute payload.
    #[error("malformed `{name}` attribute")]
    MalformedAttribute {
        /// The attribute name.
        name: Name,
    },

    /// A named format argument that is not in the format string's argument
    /// map.
    #[error("named argument `{name}` not found")]
    FormatUnknownNamed {
        /// The name.
        name: Box<str>,
    },
    /// A named format argument defined twice.
    #[error("duplicate definition of named argument `{name}`")]
    FormatDuplicateNamed {
        /// The name.
        name: Box<str>,
    },
    /// A format string consuming more arguments than were passed.
    #[error("not enough arguments passed, expected at least {expected}")]
    FormatNotEnoughArgs {
        /// The minimum number of arguments required.
        expected: usize,
    },
    /// An unknown trailing type specifier in a format fragment.
    #[error("unknown formatting type specifier `{c}`")]
    FormatUnknownType {
        /// The specifier character.
        c: char,
    },
    /// A format string ending inside a fragment.
    #[error("unexpected end of format string")]
    FormatUnexpectedEnd,
    /// A malformed format fragment.
    #[error("malformed formatting fragment at `{c}`")]
    FormatMalformed {
        /// The offending character.
        c: char,
    },
    /// A positional format argument reference out of range.
    #[error("invalid positional argument reference {index}")]
    FormatBadPositional {
        /// The referenced index.
        index: usize,
    },
}

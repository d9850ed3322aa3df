//! Terminal rendering of diagnostics, behind the `emit` feature.

use std::fmt;
use std::io;

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use crate::source::Sources;
use crate::span::{SourceId, Spanned};

/// Render an error against its source text on standard error.
pub fn emit<E>(sources: &Sources, error: &E) -> io::Result<()>
where
    E: Spanned + fmt::Display,
{
    let mut files = SimpleFiles::new();
    let mut ids = Vec::new();

    for (id, source) in sources.iter() {
        let file_id = files.add(source.name().display().to_string(), source.text().to_string());
        ids.push((id, file_id));
    }

    let span = error.span();
    let mut diagnostic: Diagnostic<usize> = Diagnostic::error().with_message(error.to_string());

    if span.source != SourceId::EMPTY {
        if let Some((_, file_id)) = ids.iter().find(|(id, _)| *id == span.source) {
            diagnostic =
                diagnostic.with_labels(vec![Label::primary(*file_id, span.range())]);
        }
    }

    let writer = StandardStream::stderr(ColorChoice::Auto);
    let config = term::Config::default();
    let mut lock = writer.lock();

    term::emit(&mut lock, &config, &files, &diagnostic)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}

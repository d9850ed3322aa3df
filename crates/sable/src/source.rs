use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::span::{SourceId, Span};

/// A single registered source text.
#[derive(Debug, Clone)]
pub struct Source {
    /// The logical name of the source, usually the path it was read from.
    name: PathBuf,
    /// The source text.
    text: Arc<str>,
    /// Byte offsets at which each line starts.
    line_starts: Vec<usize>,
}

impl Source {
    /// Construct a new source from a name and its text.
    pub fn new(name: impl Into<PathBuf>, text: impl AsRef<str>) -> Self {
        let text: Arc<str> = Arc::from(text.as_ref());

        let mut line_starts = vec![0];
        for (n, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(n + 1);
            }
        }

        Self {
            name: name.into(),
            text,
            line_starts,
        }
    }

    /// Read a source from the given filesystem path.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::new(path, text))
    }

    /// The name of the source.
    pub fn name(&self) -> &Path {
        &self.name
    }

    /// The full text of the source.
    pub fn text(&self) -> &Arc<str> {
        &self.text
    }

    /// Slice out the text covered by the given span.
    pub fn get(&self, span: Span) -> Option<&str> {
        self.text.get(span.range())
    }

    /// Translate a byte offset into a zero-based `(line, column)` pair.
    pub fn position(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(n) => n,
            Err(n) => n.saturating_sub(1),
        };

        (line, offset - self.line_starts[line])
    }
}

/// The collection of all sources loaded during a compilation.
#[derive(Debug, Default)]
pub struct Sources {
    sources: Vec<Source>,
}

impl Sources {
    /// Construct a new empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source, returning its id.
    pub fn insert(&mut self, source: Source) -> SourceId {
        let id = SourceId::new(self.sources.len());
        self.sources.push(source);
        id
    }

    /// Get a registered source.
    pub fn get(&self, id: SourceId) -> Option<&Source> {
        self.sources.get(id.into_index())
    }

    /// Get the path a source was registered under.
    pub fn path(&self, id: SourceId) -> Option<&Path> {
        Some(self.get(id)?.name())
    }

    /// Iterate over all registered sources.
    pub fn iter(&self) -> impl Iterator<Item = (SourceId, &Source)> {
        self.sources
            .iter()
            .enumerate()
            .map(|(n, s)| (SourceId::new(n), s))
    }
}

/// The error raised when a source could not be produced by a loader.
#[derive(Debug)]
pub struct LoadError {
    /// The path that failed to load.
    pub path: PathBuf,
    /// The underlying I/O error.
    pub error: io::Error,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to load `{}`: {}", self.path.display(), self.error)
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// A source loader.
///
/// The parser resolves `mod name;` declarations against one of these instead
/// of touching the filesystem directly, so tests can provide an in-memory
/// layout.
pub trait SourceLoader {
    /// Test if the given path names a loadable source.
    fn exists(&self, path: &Path) -> bool;

    /// Load the source at the given path.
    fn load(&mut self, path: &Path) -> Result<Source, LoadError>;
}

/// A filesystem-based source loader.
#[derive(Default)]
pub struct FileSourceLoader;

impl FileSourceLoader {
    /// Construct a new filesystem-based source loader.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SourceLoader for FileSourceLoader {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn load(&mut self, path: &Path) -> Result<Source, LoadError> {
        Source::from_path(path).map_err(|error| LoadError {
            path: path.to_owned(),
            error,
        })
    }
}

/// A source loader serving from an in-memory map of paths to texts.
#[derive(Default)]
pub struct MemorySourceLoader {
    files: Vec<(PathBuf, String)>,
}

impl MemorySourceLoader {
    /// Construct a new empty in-memory loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file to the loader.
    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.files.push((path.into(), text.into()));
    }

    fn find(&self, path: &Path) -> Option<&(PathBuf, String)> {
        self.files.iter().find(|(p, _)| p == path)
    }
}

impl SourceLoader for MemorySourceLoader {
    fn exists(&self, path: &Path) -> bool {
        self.find(path).is_some()
    }

    fn load(&mut self, path: &Path) -> Result<Source, LoadError> {
        match self.find(path) {
            Some((p, text)) => Ok(Source::new(p.clone(), text)),
            None => Err(LoadError {
                path: path.to_owned(),
                error: io::Error::new(io::ErrorKind::NotFound, "no such in-memory source"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions() {
        let s = Source::new("test.rs", "fn a() {}\nfn b() {}\n");
        assert_eq!(s.position(0), (0, 0));
        assert_eq!(s.position(3), (0, 3));
        assert_eq!(s.position(10), (1, 0));
        assert_eq!(s.position(13), (1, 3));
    }

    #[test]
    fn memory_loader() {
        let mut loader = MemorySourceLoader::new();
        loader.insert("src/lib.rs", "mod a;");
        assert!(loader.exists(Path::new("src/lib.rs")));
        assert!(!loader.exists(Path::new("src/a.rs")));
        assert!(loader.load(Path::new("src/a.rs")).is_err());
    }
}

use core::fmt;
use std::collections::HashMap;
use std::sync::Mutex;

use once_cell::sync::Lazy;

/// An interned identifier or crate name.
///
/// Names are cheap to copy and compare, and resolve back to their text for
/// the lifetime of the process. Ordering is by intern id, which is stable
/// within a single run.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(u32);

static INTERNER: Lazy<Mutex<Interner>> = Lazy::new(|| Mutex::new(Interner::default()));

#[derive(Default)]
struct Interner {
    strings: Vec<&'static str>,
    lookup: HashMap<&'static str, u32>,
}

impl Interner {
    fn intern(&mut self, s: &str) -> u32 {
        if let Some(&id) = self.lookup.get(s) {
            return id;
        }

        // The interner owns every string for the lifetime of the process, so
        // leaking here is the ownership model rather than a leak.
        let s: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let id = self.strings.len() as u32;
        self.strings.push(s);
        self.lookup.insert(s, id);
        id
    }
}

impl Name {
    /// Intern the given string.
    pub fn new(s: &str) -> Self {
        Self(INTERNER.lock().unwrap().intern(s))
    }

    /// The empty name, used for the current crate in paths.
    pub fn empty() -> Self {
        Self::new("")
    }

    /// Resolve the name back into its text.
    pub fn as_str(self) -> &'static str {
        INTERNER.lock().unwrap().strings[self.0 as usize]
    }

    /// Test if this is the empty name.
    pub fn is_empty(self) -> bool {
        self.as_str().is_empty()
    }
}

impl Default for Name {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_round_trip() {
        let a = Name::new("foo");
        let b = Name::new("foo");
        let c = Name::new("bar");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str(), "foo");
        assert_eq!(a, "foo");
    }
}

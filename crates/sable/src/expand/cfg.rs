use std::collections::{HashMap, HashSet};

use crate::ast::{AttrPayload, Attribute};
use crate::parse::{ParseError, ParseErrorKind, Result};
use crate::span::Span;

/// The configuration oracle consulted for `cfg(...)` and `cfg_attr(...)`.
pub trait CfgOracle {
    /// Evaluate one condition meta-item, like `unix`, `feature = "x"`,
    /// `any(...)`, `all(...)` or `not(...)`.
    fn check_cfg(&self, span: Span, cond: &Attribute) -> Result<bool>;
}

/// A configuration described by a set of flags and key/value pairs.
#[derive(Debug, Default)]
pub struct CfgSet {
    flags: HashSet<String>,
    values: HashMap<String, Vec<String>>,
}

impl CfgSet {
    /// Construct an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a flag, like `unix`.
    pub fn set_flag(&mut self, name: impl Into<String>) {
        self.flags.insert(name.into());
    }

    /// Add a key/value pair, like `target_os = "linux"`. Keys may carry
    /// multiple values.
    pub fn set_value(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.entry(name.into()).or_default().push(value.into());
    }
}

impl CfgOracle for CfgSet {
    fn check_cfg(&self, span: Span, cond: &Attribute) -> Result<bool> {
        match (cond.name.as_str(), &cond.payload) {
            ("any", AttrPayload::List(items)) => {
                for item in items {
                    if self.check_cfg(span, item)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            ("all", AttrPayload::List(items)) => {
                for item in items {
                    if !self.check_cfg(span, item)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            ("not", AttrPayload::List(items)) if items.len() == 1 => {
                Ok(!self.check_cfg(span, &items[0])?)
            }
            (name, AttrPayload::Flag) => Ok(self.flags.contains(name)),
            (name, AttrPayload::Str(value)) => Ok(self
                .values
                .get(name)
                .map(|vs| vs.iter().any(|v| v == &**value))
                .unwrap_or(false)),
            _ => Err(ParseError::new(cond.span, ParseErrorKind::MalformedAttribute {
                name: cond.name,
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Attribute;

    fn flag(name: &str) -> Attribute {
        Attribute::flag(Span::empty(), name)
    }

    fn value(name: &str, v: &str) -> Attribute {
        Attribute::string(Span::empty(), name, v)
    }

    #[test]
    fn flags_and_values() {
        let mut cfg = CfgSet::new();
        cfg.set_flag("unix");
        cfg.set_value("target_os", "linux");

        let sp = Span::empty();
        assert!(cfg.check_cfg(sp, &flag("unix")).unwrap());
        assert!(!cfg.check_cfg(sp, &flag("windows")).unwrap());
        assert!(cfg.check_cfg(sp, &value("target_os", "linux")).unwrap());
        assert!(!cfg.check_cfg(sp, &value("target_os", "macos")).unwrap());
    }

    #[test]
    fn combinators() {
        let mut cfg = CfgSet::new();
        cfg.set_flag("unix");

        let sp = Span::empty();
        let any = Attribute::list(sp, "any", vec![flag("windows"), flag("unix")]);
        let all = Attribute::list(sp, "all", vec![flag("windows"), flag("unix")]);
        let not = Attribute::list(sp, "not", vec![flag("windows")]);

        assert!(cfg.check_cfg(sp, &any).unwrap());
        assert!(!cfg.check_cfg(sp, &all).unwrap());
        assert!(cfg.check_cfg(sp, &not).unwrap());
    }
}

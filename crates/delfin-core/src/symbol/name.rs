use std::fmt;

/// A case-folded identifier. Every name-table key goes through
/// [`canonicalize`], so lookups never compare raw spellings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalName(String);

impl CanonicalName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn canonicalize(name: &str) -> CanonicalName {
    CanonicalName(name.to_lowercase())
}

//! Registry keys.
//!
//! Entries are tracked either under caller-chosen string names or under
//! sequence numbers generated by [`Janitor::add`](crate::Janitor::add).
//! Labels attach to sequence keys only.

use std::fmt;

/// Names a caller may not use for entries, because each one is a public
/// operation of the registry itself. Writing such a key fails with
/// [`RegistryError::ReservedKey`](crate::RegistryError) instead of silently
/// shadowing the operation.
pub const RESERVED_KEYS: &[&str] = &[
    "add",
    "add_labeled",
    "set",
    "remove",
    "labels",
    "list",
    "len",
    "is_empty",
    "clean",
    "destroy",
    "adopt",
    "interval",
    "delayed",
    "events",
    "bus",
];

/// Key of a registry entry.
///
/// `Seq` keys are allocated internally for anonymous obligations; `Name`
/// keys are chosen by the caller through [`Janitor::set`](crate::Janitor::set).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// Internally generated sequence number.
    Seq(u64),
    /// Caller-chosen name.
    Name(String),
}

impl Key {
    /// True when the key names a built-in registry operation.
    pub fn is_reserved(&self) -> bool {
        matches!(self, Key::Name(name) if RESERVED_KEYS.contains(&name.as_str()))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Seq(n) => write!(f, "seq:{n}"),
            Key::Name(name) => f.write_str(name),
        }
    }
}

impl From<u64> for Key {
    fn from(n: u64) -> Self {
        Key::Seq(n)
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

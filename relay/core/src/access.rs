//! Privileged identifier checks
//!
//! An empty admin list means open mode: everyone is privileged.

use std::collections::BTreeSet;

/// Set of privileged identifiers
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdminList {
    admins: BTreeSet<String>,
}

impl AdminList {
    /// Build from identifiers; duplicates collapse
    pub fn new(admins: impl IntoIterator<Item = String>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
        }
    }

    /// Whether `nick` may use privileged commands
    #[must_use]
    pub fn is_admin(&self, nick: &str) -> bool {
        self.admins.is_empty() || self.admins.contains(nick)
    }

    /// Whether no admins are configured
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.admins.is_empty()
    }

    /// Number of configured admins
    #[must_use]
    pub fn len(&self) -> usize {
        self.admins.len()
    }

    /// Whether the list is empty (same as [`is_open`](Self::is_open))
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.admins.is_empty()
    }

    /// Configured admins in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.admins.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list_is_open() {
        let admins = AdminList::default();
        assert!(admins.is_open());
        assert!(admins.is_admin("anyone"));
        assert!(admins.is_admin(""));
    }

    #[test]
    fn test_membership() {
        let admins = AdminList::new(["alice".to_string(), "bob".to_string(), "alice".to_string()]);
        assert_eq!(admins.len(), 2);
        assert!(admins.is_admin("alice"));
        assert!(!admins.is_admin("Alice"));
        assert!(!admins.is_admin("mallory"));
        assert_eq!(admins.iter().collect::<Vec<_>>(), vec!["alice", "bob"]);
    }
}

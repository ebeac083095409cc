//! Stable content identity for fetched items.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::domain::item::Item;
use crate::error::{MonitorError, MonitorResult};

/// Lowercase hex SHA-256 digest identifying an item across runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Digest of the UTF-8 bytes of `text`.
    pub fn digest(text: &str) -> Self {
        let digest = Sha256::digest(text.as_bytes());
        Self(format!("{digest:x}"))
    }

    /// Wraps an already computed digest, e.g. one read back from history.
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computes the identity key of an item.
///
/// The link is used when it is non-empty, otherwise the title. Emptiness is
/// tested on the raw string, so a whitespace-only link is still hashed. Fails
/// with [`MonitorError::InvalidInput`] when both are empty.
pub fn hash_item(item: &Item) -> MonitorResult<IdentityKey> {
    let input = if !item.link.is_empty() {
        item.link.as_str()
    } else if !item.title.is_empty() {
        item.title.as_str()
    } else {
        return Err(MonitorError::InvalidInput(format!(
            "item from {} has neither link nor title",
            item.source
        )));
    };

    Ok(IdentityKey::digest(input))
}

#[cfg(test)]
mod tests {
    use super::{IdentityKey, hash_item};
    use crate::domain::item::Item;
    use crate::error::MonitorError;

    #[test]
    fn link_takes_precedence_over_title() {
        let item = Item::new("Some title", "https://example.com/a", "feed");

        let key = hash_item(&item).expect("hash should succeed");

        assert_eq!(key, IdentityKey::digest("https://example.com/a"));
    }

    #[test]
    fn title_is_used_when_link_is_empty() {
        let item = Item::new("Only a title", "", "feed");

        let key = hash_item(&item).expect("hash should succeed");

        assert_eq!(key, IdentityKey::digest("Only a title"));
    }

    #[test]
    fn same_link_gives_same_key_regardless_of_title_and_source() {
        let a = Item::new("First", "https://example.com/deal", "a");
        let b = Item::new("Second", "https://example.com/deal", "b");

        assert_eq!(hash_item(&a).unwrap(), hash_item(&b).unwrap());
    }

    #[test]
    fn key_is_64_lowercase_hex_chars() {
        let key = IdentityKey::digest("abc");

        assert_eq!(
            key.as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn whitespace_link_is_hashed_as_is() {
        let item = Item::new("A title", " ", "feed");

        let key = hash_item(&item).expect("hash should succeed");

        assert_eq!(key, IdentityKey::digest(" "));
    }

    #[test]
    fn empty_link_and_title_is_invalid_input() {
        let item = Item::new("", "", "feed");

        let result = hash_item(&item);

        assert!(matches!(result, Err(MonitorError::InvalidInput(_))));
    }
}

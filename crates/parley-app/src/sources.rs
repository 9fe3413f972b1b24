//! Peer nicknames.

use std::collections::HashMap;

use parley_proto::PeerAddress;

/// Two-way mapping between peer addresses and display nicknames.
///
/// Lookups of an unknown address return [`SourceTable::UNKNOWN`] instead of
/// failing.
#[derive(Debug, Clone, Default)]
pub struct SourceTable {
    nicks: HashMap<PeerAddress, String>,
    addresses: HashMap<String, PeerAddress>,
}

impl SourceTable {
    /// Label for addresses that were never registered.
    pub const UNKNOWN: &'static str = "unknown";

    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `address` as `nick`.
    ///
    /// Returns `false` and leaves the table untouched if the address is
    /// already known or another address already goes by `nick`.
    pub fn insert(&mut self, address: PeerAddress, nick: String) -> bool {
        if self.nicks.contains_key(&address) || self.addresses.contains_key(&nick) {
            return false;
        }
        self.addresses.insert(nick.clone(), address.clone());
        self.nicks.insert(address, nick);
        true
    }

    /// Forget `address`, returning the nickname it had.
    pub fn remove(&mut self, address: &PeerAddress) -> Option<String> {
        let nick = self.nicks.remove(address)?;
        self.addresses.remove(&nick);
        Some(nick)
    }

    /// Nickname for `address`, or [`Self::UNKNOWN`].
    pub fn nickname(&self, address: &PeerAddress) -> &str {
        self.nicks.get(address).map_or(Self::UNKNOWN, String::as_str)
    }

    /// Address registered under `nick`.
    pub fn address(&self, nick: &str) -> Option<&PeerAddress> {
        self.addresses.get(nick)
    }

    /// Whether `address` is registered.
    pub fn contains(&self, address: &PeerAddress) -> bool {
        self.nicks.contains_key(address)
    }

    /// Registered peers.
    pub fn len(&self) -> usize {
        self.nicks.len()
    }

    /// Whether no peer is registered.
    pub fn is_empty(&self) -> bool {
        self.nicks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(byte: u8) -> PeerAddress {
        PeerAddress::from_bytes(vec![byte; 20]).unwrap()
    }

    #[test]
    fn lookups_both_ways() {
        let mut table = SourceTable::new();
        assert!(table.insert(address(1), "alice".into()));
        assert_eq!(table.nickname(&address(1)), "alice");
        assert_eq!(table.address("alice"), Some(&address(1)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn unknown_address_falls_back() {
        let table = SourceTable::new();
        assert_eq!(table.nickname(&address(9)), SourceTable::UNKNOWN);
        assert!(table.is_empty());
    }

    #[test]
    fn duplicate_address_is_ignored() {
        let mut table = SourceTable::new();
        assert!(table.insert(address(1), "alice".into()));
        assert!(!table.insert(address(1), "mallory".into()));
        assert_eq!(table.nickname(&address(1)), "alice");
        assert_eq!(table.address("mallory"), None);
    }

    #[test]
    fn nickname_is_claimed_once() {
        let mut table = SourceTable::new();
        assert!(table.insert(address(1), "alice".into()));
        assert!(!table.insert(address(2), "alice".into()));
        assert_eq!(table.address("alice"), Some(&address(1)));
        assert!(!table.contains(&address(2)));
    }

    #[test]
    fn remove_frees_address_and_nickname() {
        let mut table = SourceTable::new();
        table.insert(address(1), "alice".into());

        assert_eq!(table.remove(&address(1)), Some("alice".into()));
        assert_eq!(table.remove(&address(1)), None);
        assert!(table.is_empty());
        assert_eq!(table.address("alice"), None);
        assert!(table.insert(address(2), "alice".into()));
    }
}

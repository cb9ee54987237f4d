// Copyright 2025
//! # Interface Directory
//!
//! Resolves between interface names and kernel interface indexes.
//!
//! Every lookup takes a fresh snapshot of the system's active interfaces via
//! `if_nameindex(3)`. Interfaces can appear and disappear while the listener runs,
//! so nothing here is cached: an interface removed mid-run resolves to "not found"
//! rather than a stale name.
//!
//! ## Example
//!
//! ```rust,no_run
//! use mcastwatch::iface;
//!
//! let index = iface::index_of("eth0").expect("eth0 not found");
//! let lookup = iface::name_of(index, 100).unwrap();
//! println!("eth0 has index {} ({:?})", index, lookup);
//! ```

use nix::net::if_::if_nameindex;

use crate::error::ListenError;

/// One active interface at snapshot time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceEntry {
    /// Kernel-assigned index, positive and stable for the process lifetime.
    pub index: u32,
    /// Interface name, unique among active interfaces.
    pub name: String,
}

/// A point-in-time enumeration of the system's active interfaces.
///
/// Snapshots are cheap and deliberately short-lived; take a new one per lookup
/// instead of holding on to a table that can go stale.
#[derive(Debug)]
pub struct InterfaceTable {
    entries: Vec<InterfaceEntry>,
}

impl InterfaceTable {
    /// Enumerate all currently active interfaces.
    ///
    /// Fails if the enumeration itself fails (e.g. insufficient privilege or
    /// kernel resource exhaustion); whether that is fatal is the caller's call.
    pub fn snapshot() -> Result<Self, ListenError> {
        let ini = if_nameindex().map_err(|e| ListenError::sys("if_nameindex", e))?;
        let entries = ini
            .iter()
            .map(|iface| InterfaceEntry {
                index: iface.index(),
                name: iface.name().to_string_lossy().into_owned(),
            })
            .collect();
        Ok(InterfaceTable { entries })
    }

    /// All entries in the snapshot, in enumeration order.
    pub fn entries(&self) -> impl Iterator<Item = &InterfaceEntry> {
        self.entries.iter()
    }

    /// Index of the first entry with an exact name match.
    pub fn index_of(&self, name: &str) -> Option<u32> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.index)
    }

    /// Name of the entry with the given index.
    pub fn name_of(&self, index: u32) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.index == index)
            .map(|e| e.name.as_str())
    }
}

/// Result of a bounded index-to-name lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameLookup {
    /// The full name fit in the requested capacity.
    Full(String),
    /// The name was cut to fit; display-only callers tolerate this.
    Truncated(String),
}

impl NameLookup {
    /// The resolved name, whole or truncated.
    pub fn as_str(&self) -> &str {
        match self {
            NameLookup::Full(s) | NameLookup::Truncated(s) => s,
        }
    }
}

/// Resolve an interface name to its kernel index.
///
/// Enumerates afresh and returns the first exact match. `InterfaceNotFound` covers
/// both a missing name and a failed enumeration surfaced by [`InterfaceTable`];
/// at startup callers treat either as a fatal configuration error.
pub fn index_of(name: &str) -> Result<u32, ListenError> {
    let table = InterfaceTable::snapshot()?;
    table
        .index_of(name)
        .ok_or_else(|| ListenError::InterfaceNotFound(name.to_string()))
}

/// Resolve an interface index to its name, bounded by a byte capacity.
///
/// `capacity` counts a reserved terminator byte, so at most `capacity - 1` bytes of
/// name are kept. A name that does not fit is cut on a char boundary and returned
/// as [`NameLookup::Truncated`] rather than failed. An index with no current entry
/// (e.g. the unknown sentinel) yields `IndexNotFound`; callers print a placeholder
/// rather than aborting.
pub fn name_of(index: u32, capacity: usize) -> Result<NameLookup, ListenError> {
    if capacity < 2 {
        return Err(ListenError::NameCapacity(capacity));
    }

    let table = InterfaceTable::snapshot()?;
    let name = table
        .name_of(index)
        .ok_or(ListenError::IndexNotFound(index))?;

    let budget = capacity - 1;
    if name.len() <= budget {
        return Ok(NameLookup::Full(name.to_string()));
    }

    let mut cut = budget;
    while !name.is_char_boundary(cut) {
        cut -= 1;
    }
    Ok(NameLookup::Truncated(name[..cut].to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_not_empty() {
        // Every Linux host has at least the loopback interface.
        let table = InterfaceTable::snapshot().expect("Failed to enumerate interfaces");
        assert!(table.entries().count() > 0);
    }

    #[test]
    fn test_name_index_roundtrip() {
        // name -> index -> name is a bijection over the live snapshot.
        let table = InterfaceTable::snapshot().expect("Failed to enumerate interfaces");
        for entry in table.entries() {
            let index = index_of(&entry.name).expect("Failed to resolve name");
            assert_eq!(index, entry.index);

            let lookup = name_of(index, 100).expect("Failed to resolve index");
            assert_eq!(lookup, NameLookup::Full(entry.name.clone()));
        }
    }

    #[test]
    fn test_unknown_name() {
        let err = index_of("no-such-iface-0").unwrap_err();
        assert!(matches!(err, ListenError::InterfaceNotFound(_)));
    }

    #[test]
    fn test_unknown_index() {
        let err = name_of(u32::MAX, 100).unwrap_err();
        assert!(matches!(err, ListenError::IndexNotFound(_)));
    }

    #[test]
    fn test_capacity_too_small() {
        let err = name_of(1, 1).unwrap_err();
        assert!(matches!(err, ListenError::NameCapacity(1)));
    }

    #[test]
    fn test_truncation() {
        let table = InterfaceTable::snapshot().expect("Failed to enumerate interfaces");
        let entry = table.entries().next().expect("No interfaces").clone();
        if entry.name.len() < 2 {
            return;
        }

        // Capacity equal to the name length leaves room for one byte fewer than
        // the name needs, so the result must come back flagged and cut.
        match name_of(entry.index, entry.name.len()).expect("Failed to resolve index") {
            NameLookup::Truncated(s) => {
                assert_eq!(s, &entry.name[..entry.name.len() - 1]);
            }
            NameLookup::Full(s) => panic!("expected truncation, got full name {s:?}"),
        }

        // One extra byte of capacity fits the whole name.
        match name_of(entry.index, entry.name.len() + 1).expect("Failed to resolve index") {
            NameLookup::Full(s) => assert_eq!(s, entry.name),
            NameLookup::Truncated(s) => panic!("unexpected truncation to {s:?}"),
        }
    }
}

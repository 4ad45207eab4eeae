//! The `map` module provides [`AddressDataMap`], the ordered list of
//! `(absolute address, payload)` entries produced by the parser and consumed
//! by the image writer.
//!
//! Entries keep the order in which data records were read. Writing to an address
//! that is already present replaces its payload but keeps its position. Sorting by
//! address is an explicit step (see [`MapOrder`]).

use crate::record::{StartAddress, encode_hex};
use indexmap::IndexMap;

/// Ordering policy applied to the entries of an [`AddressDataMap`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MapOrder {
    /// Input order of the data records
    #[default]
    Insertion,
    /// Numeric address order
    Ascending,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressDataMap {
    /// Entry point decoded from a start address record (informational)
    pub start_address: Option<StartAddress>,
    /// Data payloads in the current order
    entries: IndexMap<usize, Vec<u8>>,
}

impl<'a> IntoIterator for &'a AddressDataMap {
    type Item = (&'a usize, &'a Vec<u8>);
    type IntoIter = indexmap::map::Iter<'a, usize, Vec<u8>>;
    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl AddressDataMap {
    /// Creates an empty map.
    ///
    /// # Examples
    /// ```
    /// use hex2binlib::AddressDataMap;
    ///
    /// let map = AddressDataMap::new();
    /// assert!(map.is_empty());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a payload at the provided address.
    /// Returns the previous payload if the address was already present; the entry
    /// keeps its original position in that case.
    ///
    /// # Examples
    /// ```
    /// use hex2binlib::AddressDataMap;
    ///
    /// let mut map = AddressDataMap::new();
    /// map.insert(0x10, vec![0x01]);
    /// map.insert(0x00, vec![0x02]);
    ///
    /// assert_eq!(map.insert(0x10, vec![0x03]), Some(vec![0x01]));
    /// assert_eq!(map.addresses(), vec![0x10, 0x00]);
    /// ```
    pub fn insert(&mut self, address: usize, data: Vec<u8>) -> Option<Vec<u8>> {
        self.entries.insert(address, data)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Payload stored at the provided address.
    #[must_use]
    pub fn get(&self, address: usize) -> Option<&[u8]> {
        self.entries.get(&address).map(Vec::as_slice)
    }

    /// Payload stored at the provided address, rendered as hex digits.
    ///
    /// # Examples
    /// ```
    /// use hex2binlib::AddressDataMap;
    ///
    /// let mut map = AddressDataMap::new();
    /// map.insert(0x1000_0020, vec![0xDE, 0xAD, 0xBE, 0xEF]);
    ///
    /// assert_eq!(map.payload_hex(0x1000_0020).as_deref(), Some("DEADBEEF"));
    /// ```
    #[must_use]
    pub fn payload_hex(&self, address: usize) -> Option<String> {
        self.get(address).map(encode_hex)
    }

    /// First entry in the current order.
    #[must_use]
    pub fn first(&self) -> Option<(usize, &[u8])> {
        self.entries
            .first()
            .map(|(addr, data)| (*addr, data.as_slice()))
    }

    /// Last entry in the current order.
    #[must_use]
    pub fn last(&self) -> Option<(usize, &[u8])> {
        self.entries
            .last()
            .map(|(addr, data)| (*addr, data.as_slice()))
    }

    /// Addresses in the current order.
    #[must_use]
    pub fn addresses(&self) -> Vec<usize> {
        self.entries.keys().copied().collect()
    }

    /// Iterator over `(address, payload)` entries in the current order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, usize, Vec<u8>> {
        self.into_iter()
    }

    /// Rearranges the entries according to the provided ordering policy.
    ///
    /// # Examples
    /// ```
    /// use hex2binlib::{AddressDataMap, MapOrder};
    ///
    /// let mut map = AddressDataMap::new();
    /// map.insert(0x20, vec![0x01]);
    /// map.insert(0x10, vec![0x02]);
    /// map.reorder(MapOrder::Ascending);
    ///
    /// assert_eq!(map.addresses(), vec![0x10, 0x20]);
    /// ```
    pub fn reorder(&mut self, order: MapOrder) {
        match order {
            // Insertion order cannot be recovered once sorted, nothing to do
            MapOrder::Insertion => {}
            MapOrder::Ascending => {
                // Keys are unique, so an unstable sort is deterministic
                self.entries.sort_unstable_keys();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_input_order() {
        // Arrange
        let mut map = AddressDataMap::new();

        // Act
        map.insert(0x0200, vec![0xAA]);
        map.insert(0x0100, vec![0xBB]);
        map.insert(0x0300, vec![0xCC]);

        // Assert
        assert_eq!(map.addresses(), vec![0x0200, 0x0100, 0x0300]);
        assert_eq!(map.first(), Some((0x0200, [0xAA].as_slice())));
        assert_eq!(map.last(), Some((0x0300, [0xCC].as_slice())));
    }

    #[test]
    fn test_insert_duplicate_overwrites_in_place() {
        // Arrange
        let mut map = AddressDataMap::new();
        map.insert(0x0000, vec![0x01, 0x02]);
        map.insert(0x0002, vec![0x03, 0x04]);

        // Act
        let previous = map.insert(0x0000, vec![0x05]);

        // Assert
        assert_eq!(previous, Some(vec![0x01, 0x02]));
        assert_eq!(map.len(), 2);
        assert_eq!(map.addresses(), vec![0x0000, 0x0002]);
        assert_eq!(map.get(0x0000), Some([0x05].as_slice()));
    }

    #[test]
    fn test_reorder_ascending() {
        // Arrange
        let mut map = AddressDataMap::new();
        for addr in [0x30, 0x10, 0x20, 0x00] {
            map.insert(addr, vec![u8::try_from(addr).unwrap_or_default()]);
        }

        // Act
        map.reorder(MapOrder::Ascending);

        // Assert
        assert_eq!(map.addresses(), vec![0x00, 0x10, 0x20, 0x30]);
        assert_eq!(map.get(0x20), Some([0x20].as_slice()));

        // Overwrites after sorting keep the sorted position
        map.insert(0x10, vec![0xFF]);
        assert_eq!(map.iter().nth(1), Some((&0x10, &vec![0xFF])));
    }

    #[test]
    fn test_reorder_insertion_is_noop() {
        let mut map = AddressDataMap::new();
        map.insert(0x30, vec![]);
        map.insert(0x10, vec![]);

        map.reorder(MapOrder::Insertion);

        assert_eq!(map.addresses(), vec![0x30, 0x10]);
    }

    #[test]
    fn test_empty_map() {
        let map = AddressDataMap::new();
        assert!(map.is_empty());
        assert!(map.first().is_none());
        assert!(map.last().is_none());
        assert!(map.payload_hex(0).is_none());
    }
}

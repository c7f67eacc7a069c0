use std::collections::BTreeMap;
use std::ops::Bound;

use super::structures::CentralDirectoryEntry;

/// Entries of an archive in central directory order.
///
/// Built once after parsing; read-only afterwards. Names are also kept in an
/// ordered map so that "everything under `dir/`" is a range query instead of
/// a scan.
#[derive(Debug, Default)]
pub struct EntryTable {
    entries: Vec<CentralDirectoryEntry>,
    by_name: BTreeMap<String, Vec<usize>>,
}

impl EntryTable {
    /// Build a table from entries whose `index` fields are `0..len` in order.
    pub fn new(entries: Vec<CentralDirectoryEntry>) -> Self {
        debug_assert!(entries.iter().enumerate().all(|(i, e)| e.index == i));

        let mut by_name: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for entry in &entries {
            by_name
                .entry(entry.name.clone())
                .or_default()
                .push(entry.index);
        }

        Self { entries, by_name }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CentralDirectoryEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CentralDirectoryEntry> {
        self.entries.iter()
    }

    /// First entry with exactly this name.
    pub fn find(&self, name: &str) -> Option<&CentralDirectoryEntry> {
        self.by_name
            .get(name)
            .and_then(|indices| indices.first())
            .map(|&i| &self.entries[i])
    }

    /// Entries whose name starts with `prefix` and is longer than it, in name
    /// order.
    ///
    /// For a directory name such as `tmp/`, this is every entry beneath it at
    /// any depth; `tmp2/file` does not match because the slash is part of the
    /// prefix.
    pub fn under<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = &'a CentralDirectoryEntry> + 'a {
        self.by_name
            .range::<str, _>((Bound::Excluded(prefix), Bound::Unbounded))
            .take_while(move |(name, _)| name.starts_with(prefix))
            .flat_map(move |(_, indices)| indices.iter().map(move |&i| &self.entries[i]))
    }
}

impl<'a> IntoIterator for &'a EntryTable {
    type Item = &'a CentralDirectoryEntry;
    type IntoIter = std::slice::Iter<'a, CentralDirectoryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

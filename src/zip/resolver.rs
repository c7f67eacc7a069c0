//! Turning user-supplied entry indices into the entries to extract.

use std::collections::BTreeSet;

use crate::error::{Error, Result};

use super::structures::CentralDirectoryEntry;
use super::table::EntryTable;

/// Resolve `requested` indices against `table`.
///
/// A directory brings along everything beneath it, nested directories
/// included. The result is in central directory order with duplicates
/// removed, however the indices were ordered or overlapped.
///
/// Every index is checked before anything is expanded, so a bad selection
/// fails as a whole.
///
/// # Errors
///
/// [`Error::InvalidIndex`] for the first index outside `0..table.len()`.
pub fn resolve<'a>(
    table: &'a EntryTable,
    requested: &[i64],
) -> Result<Vec<&'a CentralDirectoryEntry>> {
    let count = table.len();
    let roots = requested
        .iter()
        .map(|&index| {
            usize::try_from(index)
                .ok()
                .and_then(|i| table.get(i))
                .ok_or(Error::InvalidIndex { index, count })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut selected = BTreeSet::new();
    for entry in roots {
        selected.insert(entry.index);
        if entry.is_directory {
            selected.extend(table.under(&entry.name).map(|e| e.index));
        }
    }

    Ok(selected.into_iter().filter_map(|i| table.get(i)).collect())
}

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{RangeFetcher, check_range};
use crate::error::Result;

/// Archive held in memory.
///
/// Counts calls to [`RangeFetcher::fetch`], which lets callers check how many
/// round trips an operation would have cost against a remote server.
pub struct MemoryFetcher {
    data: Vec<u8>,
    fetches: AtomicUsize,
}

impl MemoryFetcher {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            fetches: AtomicUsize::new(0),
        }
    }

    /// Number of range fetches served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RangeFetcher for MemoryFetcher {
    async fn fetch(&self, start: u64, end: u64) -> Result<Vec<u8>> {
        check_range(start, end, self.size())?;
        self.fetches.fetch_add(1, Ordering::Relaxed);
        Ok(self.data[start as usize..=end as usize].to_vec())
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

use async_trait::async_trait;
use std::fs::File;
use std::path::Path;
use tracing::debug;

use super::{RangeFetcher, check_range};
use crate::error::Result;

/// Local ZIP file read with positional reads
pub struct LocalFileFetcher {
    file: File,
    size: u64,
}

impl LocalFileFetcher {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        debug!(path = %path.display(), size, "opened local archive");
        Ok(Self { file, size })
    }
}

#[async_trait]
impl RangeFetcher for LocalFileFetcher {
    async fn fetch(&self, start: u64, end: u64) -> Result<Vec<u8>> {
        check_range(start, end, self.size)?;
        let mut buf = vec![0u8; (end - start + 1) as usize];

        #[cfg(unix)]
        {
            use std::os::unix::fs::FileExt;
            self.file.read_exact_at(&mut buf, start)?;
        }

        #[cfg(not(unix))]
        {
            use std::io::{Read, Seek, SeekFrom};
            // Fetches never overlap
            let mut file = &self.file;
            file.seek(SeekFrom::Start(start))?;
            file.read_exact(&mut buf)?;
        }

        Ok(buf)
    }

    fn size(&self) -> u64 {
        self.size
    }
}

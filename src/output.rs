//! Writing extracted entries below a base directory.

use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{Error, Result};
use crate::zip::ExtractedEntry;

/// Destination for extracted entries.
#[derive(Debug, Clone)]
pub struct OutputDir {
    base: PathBuf,
}

impl OutputDir {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Join an archive path onto the base directory.
    ///
    /// Absolute paths, drive prefixes and `..` components are refused, so
    /// nothing is ever written outside the base.
    pub fn target(&self, name: &str) -> Result<PathBuf> {
        let unsafe_path = || Error::UnsafePath {
            name: name.to_string(),
        };

        let mut target = self.base.clone();
        let mut depth = 0;
        for component in Path::new(name).components() {
            match component {
                Component::Normal(part) => {
                    target.push(part);
                    depth += 1;
                }
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(unsafe_path());
                }
            }
        }

        if depth == 0 {
            return Err(unsafe_path());
        }
        Ok(target)
    }

    /// Create the directory or write the file for `entry`, creating missing
    /// parent directories. Existing files are overwritten.
    pub async fn write(&self, entry: &ExtractedEntry) -> Result<PathBuf> {
        let target = self.target(entry.path())?;

        match entry {
            ExtractedEntry::Directory { .. } => {
                fs::create_dir_all(&target).await?;
                debug!(path = %target.display(), "created directory");
            }
            ExtractedEntry::File { data, .. } => {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent).await?;
                }
                let mut file = fs::File::create(&target).await?;
                file.write_all(data).await?;
                file.flush().await?;
                debug!(path = %target.display(), len = data.len(), "wrote file");
            }
        }

        Ok(target)
    }
}

// Per-entity scratch directory for a day's raw exports.
// The directory is removed when the StagingArea is dropped, on success and error paths alike.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::paths::file_name;

#[derive(Debug)]
pub struct StagingArea {
    dir: TempDir,
    staged: Vec<PathBuf>,
}

impl StagingArea {
    /// Creates `<root>/<entity_id>-XXXXXX`. Each entity gets its own directory.
    pub fn create(root: &Path, entity_id: &str) -> std::io::Result<Self> {
        std::fs::create_dir_all(root)?;
        let safe_id: String = entity_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        let dir = tempfile::Builder::new()
            .prefix(&format!("{safe_id}-"))
            .tempdir_in(root)?;
        Ok(Self {
            dir,
            staged: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes one blob. Files are numbered so equal names from different keys never collide.
    pub async fn stage(&mut self, key: &str, body: &[u8]) -> std::io::Result<PathBuf> {
        let path = self
            .dir
            .path()
            .join(format!("{:05}_{}", self.staged.len(), file_name(key)));
        tokio::fs::write(&path, body).await?;
        self.staged.push(path.clone());
        Ok(path)
    }

    /// Staged files in staging order.
    pub fn files(&self) -> &[PathBuf] {
        &self.staged
    }

    /// Removes the directory now and reports failures (drop removes it silently).
    pub fn close(self) -> std::io::Result<()> {
        self.dir.close()
    }
}

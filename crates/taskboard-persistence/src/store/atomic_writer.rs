use std::io::Write;
use std::path::Path;

use taskboard_core::{TaskboardError, TaskboardResult};
use tokio::fs;

/// Replaces files through a temp file in the same directory, so readers see
/// either the old contents or the new ones.
pub struct AtomicWriter;

impl AtomicWriter {
    pub async fn write_atomic(path: &Path, data: &[u8]) -> TaskboardResult<()> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => Path::new(".").to_path_buf(),
        };
        fs::create_dir_all(&parent).await?;

        let len = data.len();
        let target = path.to_path_buf();
        let data = data.to_vec();
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let mut temp_file = tempfile::NamedTempFile::new_in(&parent)?;
            temp_file.write_all(&data)?;
            temp_file.as_file().sync_all()?;
            temp_file.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| TaskboardError::Internal(e.to_string()))??;

        tracing::debug!("Atomically wrote {} bytes to {}", len, path.display());
        Ok(())
    }

    /// Reads the file, or `None` if it does not exist yet.
    pub async fn read_if_exists(path: &Path) -> TaskboardResult<Option<Vec<u8>>> {
        match fs::read(path).await {
            Ok(data) => {
                tracing::debug!("Read {} bytes from {}", data.len(), path.display());
                Ok(Some(data))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

use anyhow::Result;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};
use uuid::Uuid;

/// Manages uploaded media on disk.
///
/// Every upload is stored as a flat file at `{upload_dir}/{uuid}{ext}`.
/// The client-supplied name is only kept in the database.
pub struct MediaStore {
    dir: PathBuf,
}

/// A file that has been written to the upload directory.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub file_name: String,
    pub path: PathBuf,
    pub size: u64,
    pub sha256: String,
}

impl MediaStore {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Upload directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn file_path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// Write `data` under a fresh name derived from `original_name`
    /// and return its size and SHA-256.
    pub async fn save(&self, original_name: Option<&str>, data: &[u8]) -> Result<StoredFile> {
        let file_name = stored_file_name(original_name);
        let path = self.file_path(&file_name);

        let mut hasher = Sha256::new();
        hasher.update(data);
        let sha256 = hex::encode(hasher.finalize());

        let file = fs::File::create(&path).await?;
        write_or_remove(file, &path, data).await?;

        Ok(StoredFile {
            file_name,
            path,
            size: data.len() as u64,
            sha256,
        })
    }

    pub async fn delete_file(&self, file_name: &str) -> Result<()> {
        let path = self.file_path(file_name);
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted media file {}", file_name);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Media file {} already gone", file_name);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Size of the file on disk.
    pub async fn file_size(&self, file_name: &str) -> Result<u64> {
        let metadata = fs::metadata(self.file_path(file_name)).await?;
        Ok(metadata.len())
    }
}

/// Write `data` through `writer`. On failure the partial file at `path`
/// is removed before the error is returned.
async fn write_or_remove<W>(mut writer: W, path: &Path, data: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        writer.write_all(data).await?;
        writer.flush().await
    }
    .await;

    if let Err(e) = written {
        drop(writer);
        if let Err(rm) = fs::remove_file(path).await {
            warn!("Failed to remove partial file {}: {}", path.display(), rm);
        }
        return Err(e.into());
    }
    Ok(())
}

/// Replace every character outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// A random name that keeps the (sanitized) extension of the original.
pub fn stored_file_name(original_name: Option<&str>) -> String {
    let ext = original_name
        .map(sanitize_file_name)
        .and_then(|name| {
            Path::new(&name)
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_ascii_lowercase)
        })
        .filter(|e| !e.is_empty() && e.len() <= 10);

    match ext {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
        None => Uuid::new_v4().to_string(),
    }
}

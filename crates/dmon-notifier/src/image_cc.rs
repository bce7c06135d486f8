//! Content-addressed copies of notification photos on disk.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::NotifierResult;

/// File name for a photo: hex SHA-256 of its bytes.
pub fn image_file_name(jpeg: &[u8]) -> String {
    format!("{:x}.jpg", Sha256::digest(jpeg))
}

/// Write `jpeg` into `dir`, returning the path written.
pub async fn write_image_copy(dir: &Path, jpeg: &[u8]) -> NotifierResult<PathBuf> {
    let path = dir.join(image_file_name(jpeg));
    tokio::fs::write(&path, jpeg).await?;
    Ok(path)
}

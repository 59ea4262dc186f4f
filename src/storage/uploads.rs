//! Upload folder for prescription images
//!
//! Images saved to the backend are copied here under a generated name. Old
//! files are removed on a best-effort basis.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

/// A folder of stashed prescription images
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    /// Open the folder, creating it if needed
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create upload folder {:?}", dir))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Copy `image` into the folder and return the generated file name
    pub fn stash(&self, image: &Path) -> Result<String> {
        let extension = image
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("png")
            .to_ascii_lowercase();
        let name = unique_file_name(&extension);

        std::fs::copy(image, self.dir.join(&name))
            .with_context(|| format!("Failed to copy {:?} to upload folder", image))?;
        debug!("Stashed {:?} as {}", image, name);

        Ok(name)
    }

    /// Delete regular files last modified more than `max_age` ago.
    ///
    /// Returns the number of files removed. Files that cannot be inspected or
    /// removed are skipped.
    pub fn clean_old_files(&self, max_age: Duration) -> Result<usize> {
        let now = SystemTime::now();
        let mut removed = 0;

        let entries = std::fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to list upload folder {:?}", self.dir))?;

        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }

            let age = metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok());
            if !matches!(age, Some(age) if age > max_age) {
                continue;
            }

            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => warn!("Failed to remove old upload {:?}: {}", path, e),
            }
        }

        if removed > 0 {
            info!("Removed {} old file(s) from {:?}", removed, self.dir);
        }
        Ok(removed)
    }
}

/// `{unix seconds}-{8 hex chars}.{extension}`
fn unique_file_name(extension: &str) -> String {
    let secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}.{}", secs, &suffix[..8], extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::TempDir;

    fn age_file(path: &Path, by: Duration) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - by).unwrap();
    }

    #[test]
    fn test_open_creates_folder() {
        let dir = TempDir::new().unwrap();
        let uploads = dir.path().join("uploads");

        UploadStore::open(&uploads).unwrap();
        assert!(uploads.is_dir());
    }

    #[test]
    fn test_stash_copies_with_unique_name() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("scan.JPG");
        fs::write(&source, b"jpeg bytes").unwrap();
        let uploads = dir.path().join("uploads");
        let store = UploadStore::open(&uploads).unwrap();

        let first = store.stash(&source).unwrap();
        let second = store.stash(&source).unwrap();

        assert_ne!(first, second);
        assert!(first.ends_with(".jpg"));
        assert_eq!(fs::read(uploads.join(&first)).unwrap(), b"jpeg bytes");
    }

    #[test]
    fn test_stash_missing_source() {
        let dir = TempDir::new().unwrap();
        let store = UploadStore::open(dir.path()).unwrap();
        assert!(store.stash(&dir.path().join("missing.png")).is_err());
    }

    #[test]
    fn test_clean_old_files_keeps_recent() {
        let dir = TempDir::new().unwrap();
        let store = UploadStore::open(dir.path()).unwrap();

        let old = dir.path().join("old.png");
        let fresh = dir.path().join("fresh.png");
        fs::write(&old, b"old").unwrap();
        fs::write(&fresh, b"fresh").unwrap();
        age_file(&old, Duration::from_secs(2 * 3600));
        fs::create_dir(dir.path().join("nested")).unwrap();

        let removed = store.clean_old_files(Duration::from_secs(3600)).unwrap();

        assert_eq!(removed, 1);
        assert!(!old.exists());
        assert!(fresh.exists());
        assert!(dir.path().join("nested").is_dir());
    }

    #[test]
    fn test_clean_empty_folder() {
        let dir = TempDir::new().unwrap();
        let store = UploadStore::open(dir.path()).unwrap();
        assert_eq!(store.clean_old_files(Duration::from_secs(1)).unwrap(), 0);
    }
}

//! File operations backing media deletion: permanent delete and OS trash

use crate::{FsError, Result};
use std::path::{Path, PathBuf};

/// Whether this build can move files to the OS trash
pub fn trash_supported() -> bool {
    cfg!(feature = "trash-support")
}

/// Permanently delete a single media file
pub fn delete_permanently(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(FsError::NotFound(path.display().to_string()));
    }

    if path.is_dir() {
        return Err(FsError::InvalidPath(format!("Refusing to delete directory: {}", path.display())));
    }

    std::fs::remove_file(path).map_err(|e| FsError::from_io(e, path))?;
    tracing::warn!("Permanently deleted: {}", path.display());

    Ok(())
}

/// Move a batch of files to the trash in one operation
#[cfg(feature = "trash-support")]
pub fn move_to_trash(paths: &[PathBuf]) -> Result<()> {
    if let Some(missing) = paths.iter().find(|p| !p.exists()) {
        return Err(FsError::NotFound(missing.display().to_string()));
    }

    trash::delete_all(paths).map_err(|e| FsError::Trash(e.to_string()))?;
    for path in paths {
        tracing::info!("Moved to trash: {}", path.display());
    }

    Ok(())
}

#[cfg(not(feature = "trash-support"))]
pub fn move_to_trash(_paths: &[PathBuf]) -> Result<()> {
    Err(FsError::Trash("Trash support not enabled".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_delete_permanently() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("gone.jpg");
        fs::write(&file, b"data").unwrap();

        assert!(delete_permanently(&file).is_ok());
        assert!(!file.exists());

        // Second delete reports the missing file
        assert!(matches!(delete_permanently(&file), Err(FsError::NotFound(_))));
    }

    #[test]
    fn test_delete_refuses_directories() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            delete_permanently(dir.path()),
            Err(FsError::InvalidPath(_))
        ));
        assert!(dir.path().exists());
    }

    #[test]
    fn test_trash_rejects_missing_files_up_front() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("a.jpg");
        fs::write(&present, b"a").unwrap();
        let missing = dir.path().join("b.jpg");

        assert!(move_to_trash(&[present.clone(), missing]).is_err());
        assert!(present.exists());
    }
}

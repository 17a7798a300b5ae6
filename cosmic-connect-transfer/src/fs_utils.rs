//! File System Utilities
//!
//! Permission metadata is not reliable for paths that do not exist yet, so
//! writability is checked by actually opening the destination for writing.

use crate::Result;
use std::fs::{self, OpenOptions};
use std::path::Path;
use tracing::{debug, warn};

/// Probe whether `path` can be written
///
/// Opens the file for writing without truncating it. A file created only for
/// the probe is removed again, an existing file is left untouched.
///
/// # Examples
///
/// ```ignore
/// use cosmic_connect_transfer::fs_utils::probe_writable;
///
/// probe_writable("/home/user/Downloads/photo.png")?;
/// ```
pub fn probe_writable(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let existed = path.exists();

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;
    drop(file);

    if !existed {
        if let Err(e) = fs::remove_file(path) {
            warn!("Failed to remove probe file {}: {}", path.display(), e);
        }
    }

    debug!("Destination {} is writable", path.display());
    Ok(())
}

/// Convenience wrapper around [`probe_writable`]
pub fn is_writable(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    match probe_writable(path) {
        Ok(()) => true,
        Err(e) => {
            debug!("Destination {} is not writable: {}", path.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_probe_new_file_is_removed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("incoming.bin");

        assert!(is_writable(&path));
        assert!(!path.exists());
    }

    #[test]
    fn test_probe_keeps_existing_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("existing.txt");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(b"keep me").unwrap();
        drop(file);

        assert!(is_writable(&path));
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep me");
    }

    #[test]
    fn test_probe_missing_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("no-such-dir").join("file.bin");

        assert!(!is_writable(&path));
        assert!(probe_writable(&path).is_err());
    }
}

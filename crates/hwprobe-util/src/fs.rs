use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Write `bytes` to `path` through a sibling temp file and a rename.
///
/// Readers of `path` see either the previous contents or the complete new
/// contents. Missing parent directories are created.
///
/// # Errors
/// Returns an error if the parent directory, the temp file, or the rename fails.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("out");
    let staging = parent.join(format!(".{file_name}.{}.partial", std::process::id()));

    {
        let mut file = File::create(&staging)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }

    if let Err(e) = fs::rename(&staging, path) {
        // Windows refuses to rename over an existing file.
        if cfg!(windows) {
            fs::copy(&staging, path)?;
            let _ = fs::remove_file(&staging);
            return Ok(());
        }
        let _ = fs::remove_file(&staging);
        return Err(e);
    }
    Ok(())
}

/// Whether `path` is a regular file the current user could execute.
///
/// On non-Unix platforms any regular file counts.
#[must_use]
pub fn is_executable(path: &Path) -> bool {
    let Ok(meta) = fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

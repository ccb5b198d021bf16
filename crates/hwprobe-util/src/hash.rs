use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Hex-encoded BLAKE3 digest of a file's contents.
///
/// Used to fingerprint the subject executable so two runs can be matched to
/// the exact binary they measured. The file is streamed in fixed-size chunks.
///
/// # Errors
/// Returns an error if the file cannot be opened or read.
pub fn fingerprint_file(path: &Path) -> io::Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = blake3::Hasher::new();
    let mut chunk = [0u8; 16 * 1024];

    loop {
        let n = reader.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        hasher.update(&chunk[..n]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}

//! Binary content detection.

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Number of leading bytes inspected when sniffing content.
pub const SNIFF_LEN: usize = 512;

/// Whether the file at `path` looks binary: a NUL byte within its first
/// [`SNIFF_LEN`] bytes.
pub fn is_binary_file(path: &Path) -> std::io::Result<bool> {
    let mut file = File::open(path)?;
    let mut buf = [0u8; SNIFF_LEN];
    let mut filled = 0;

    while filled < SNIFF_LEN {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }

    Ok(is_binary_content(&buf[..filled]))
}

/// Whether a content prefix contains a NUL byte.
pub fn is_binary_content(content: &[u8]) -> bool {
    content.iter().take(SNIFF_LEN).any(|&b| b == 0)
}

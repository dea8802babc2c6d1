//! Content fingerprints for the tracked source files.

use crate::error::Result;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Source path -> lowercase hex SHA-256 of its content.
pub type FingerprintMap = BTreeMap<String, String>;

/// Files are streamed through the hasher in blocks of this size.
const BLOCK_SIZE: usize = 4096;

/// Hash a file's content without loading it into memory.
pub fn hash_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| {
        std::io::Error::new(e.kind(), format!("{}: {}", path.display(), e))
    })?;

    let mut hasher = Sha256::new();
    let mut block = [0u8; BLOCK_SIZE];
    loop {
        let read = file.read(&mut block)?;
        if read == 0 {
            break;
        }
        hasher.update(&block[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Hash an in-memory byte string.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Fingerprint every tracked source. Keys are the paths as given.
pub fn fingerprint_sources<P: AsRef<Path>>(paths: &[P]) -> Result<FingerprintMap> {
    let mut map = FingerprintMap::new();
    for path in paths {
        let path = path.as_ref();
        let digest = hash_file(path)?;
        debug!("{} -> {}", path.display(), digest);
        map.insert(path.display().to_string(), digest);
    }
    Ok(map)
}

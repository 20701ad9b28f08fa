//! Content digests for duplicate detection.
//!
//! Two files with an equal digest are considered duplicates regardless of
//! name or path. Digests live only for the duration of one organize pass
//! and are never persisted.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};

const CHUNK_SIZE: usize = 8192;

/// Content hash of one file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Hex rendering of the digest.
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

/// Hashes a file's content in fixed-size chunks.
///
/// Collision resistance only needs to make accidental collisions negligible
/// at directory scale; BLAKE3 clears that bar and streaming keeps memory
/// flat for large files. Failure to open or read mid-stream surfaces as a
/// [`Error::Read`], which callers treat as "skip this file and continue".
pub fn digest_file(path: &Path) -> Result<ContentDigest> {
    let mut file = File::open(path).map_err(|e| Error::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut hasher = blake3::Hasher::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let read = file.read(&mut buf).map_err(|e| Error::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(ContentDigest(hasher.finalize().to_hex().to_string()))
}

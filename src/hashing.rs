//! Streaming content hashing (§4.A).

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use sha1::Digest as Sha1Digest;
use sha2::Digest as Sha2Digest;

use crate::error::{IsolateError, Result};

const BUFFER_SIZE: usize = 64 * 1024;

/// Digest algorithm a manifest is built with. SHA-1 is the default per
/// §3/§6 (`algo: "sha-1"`); SHA-256 is carried as a real, if currently
/// unexercised, upgrade path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    #[default]
    Sha1,
    Sha256,
}

impl Algorithm {
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Sha1 => "sha-1",
            Self::Sha256 => "sha-256",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Streams `path`'s content through the selected digest, returning a
/// lowercase hex string.
///
/// # Errors
/// Returns an error if the file cannot be opened or read.
pub fn hash_file(path: &Path, algorithm: Algorithm) -> Result<String> {
    let file = File::open(path).map_err(|e| IsolateError::io_with_path(e, path.to_path_buf()))?;
    let mut reader = BufReader::new(file);
    let mut buf = [0_u8; BUFFER_SIZE];

    match algorithm {
        Algorithm::Sha1 => {
            let mut hasher = sha1::Sha1::new();
            loop {
                let n = read_chunk(&mut reader, &mut buf, path)?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
            }
            Ok(hex::encode(hasher.finalize()))
        }
        Algorithm::Sha256 => {
            let mut hasher = sha2::Sha256::new();
            loop {
                let n = read_chunk(&mut reader, &mut buf, path)?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
            }
            Ok(hex::encode(hasher.finalize()))
        }
    }
}

fn read_chunk(reader: &mut impl Read, buf: &mut [u8], path: &Path) -> Result<usize> {
    match reader.read(buf) {
        Ok(n) => Ok(n),
        Err(e) if e.kind() == io::ErrorKind::Interrupted => read_chunk(reader, buf, path),
        Err(e) => Err(IsolateError::io_with_path(e, path.to_path_buf())),
    }
}

#[cfg(test)]
#[path = "hashing_tests.rs"]
mod tests;

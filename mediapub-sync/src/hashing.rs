//! Git blob addressing: `sha1("blob <len>\0" ++ content)`, hex-encoded.
//!
//! Local hashes must match the host's blob ids byte for byte, otherwise
//! every pass would see every file as changed.

use sha1::{Digest, Sha1};

/// Hex blob id of `content` as git (and the hosting API) computes it.
pub fn blob_hash(content: &[u8]) -> String {
    let mut h = Sha1::new();
    h.update(format!("blob {}\0", content.len()).as_bytes());
    h.update(content);
    hex::encode(h.finalize())
}

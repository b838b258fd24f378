//! String fingerprinting for cache keys

use md5::{Digest, Md5};

/// Hash an ordered list of strings into a lowercase hex digest.
///
/// Values are fed to the digest back to back with no separator, so
/// `["a", "bc"]` and `["ab", "c"]` hash identically. Keys written by earlier
/// runs depend on this exact byte stream.
pub fn hash_strings<S: AsRef<str>>(values: &[S]) -> String {
    let mut hasher = Md5::new();
    for value in values {
        hasher.update(value.as_ref().as_bytes());
    }
    hex::encode(hasher.finalize())
}

//! Job context tokens
//!
//! Jobs that describe themselves with the same string (typically a serialized
//! build matrix) resolve to the same token and can share caches even when
//! their job names differ.

use super::hash::hash_strings;

/// Resolve a caller-supplied context descriptor into an opaque token
pub fn resolve_job_context(descriptor: &str) -> String {
    hash_strings(&[descriptor])
}

//! Deterministic schema identifiers.

use schemaforge_core::FieldPath;

const FNV_OFFSET_BASIS: u64 = 14695981039346656037;
const FNV_PRIME: u64 = 1099511628211;

/// FNV-1a over `bytes`, continuing from `hash`.
fn fnv1a(mut hash: u64, bytes: &[u8]) -> u64 {
    for byte in bytes {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Identifies a schema by its canonical property paths and collection.
///
/// Each path and the collection are hashed in order, each terminated by a
/// zero byte so that `a.b` + `c` and `a` + `b.c` differ.
pub fn fingerprint<'a>(paths: impl IntoIterator<Item = &'a FieldPath>, collection: &str) -> u64 {
    let hash = paths.into_iter().fold(FNV_OFFSET_BASIS, |hash, path| {
        fnv1a(fnv1a(hash, path.to_string().as_bytes()), &[0])
    });
    fnv1a(fnv1a(hash, collection.as_bytes()), &[0])
}

//! The hash function shared by every node of a cluster.
//!
//! Routing is only correct if every process maps the same string to the same position, so this
//! function must never change for a running cluster: MD5 over the raw bytes of the input (utf8 for
//! strings), keeping the first 8 bytes of the digest read as a big-endian u64.

/// Type of a position in the hash space [0, 2^64)
pub type HashValue = u64;

/// Signature used by partitioning schemes so tests can inject deterministic hash functions
pub type HashFn = fn(&[u8]) -> HashValue;

pub fn md5_hash(input: &[u8]) -> HashValue {
    let digest = md5::compute(input);
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest.0[..8]);
    u64::from_be_bytes(prefix)
}

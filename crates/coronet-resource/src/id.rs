//! Resource identity.

use std::fmt;

/// 64-bit id of a logical bundle path.
///
/// Ids hash the path string, so the same path maps to the same id on
/// every platform and across runs. The path itself stays the on-disk
/// name; the id is only the in-memory key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

impl ResourceId {
    #[inline]
    pub fn from_path(path: &str) -> Self {
        Self(murmur_hash64(path.as_bytes(), 0))
    }

    #[inline]
    pub fn to_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceId({:016x})", self.0)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// MurmurHash2, 64-bit variant.
///
/// Reads input little-endian so the result does not depend on host
/// endianness.
pub fn murmur_hash64(key: &[u8], seed: u64) -> u64 {
    const M: u64 = 0xc6a4_a793_5bd1_e995;
    const R: u32 = 47;

    let mut h: u64 = seed ^ (key.len() as u64).wrapping_mul(M);

    let mut chunks = key.chunks_exact(8);
    for chunk in chunks.by_ref() {
        let mut k = u64::from_le_bytes([
            chunk[0], chunk[1], chunk[2], chunk[3], chunk[4], chunk[5], chunk[6], chunk[7],
        ]);
        k = k.wrapping_mul(M);
        k ^= k >> R;
        k = k.wrapping_mul(M);
        h ^= k;
        h = h.wrapping_mul(M);
    }

    let tail = chunks.remainder();
    if !tail.is_empty() {
        let mut t: u64 = 0;
        for (i, &b) in tail.iter().enumerate() {
            t |= (b as u64) << (8 * i);
        }
        h ^= t;
        h = h.wrapping_mul(M);
    }

    h ^= h >> R;
    h = h.wrapping_mul(M);
    h ^= h >> R;
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_path_same_id() {
        assert_eq!(
            ResourceId::from_path("shaders/sky.sc"),
            ResourceId::from_path("shaders/sky.sc")
        );
    }

    #[test]
    fn different_paths_differ() {
        let a = ResourceId::from_path("shaders/sky.sc");
        let b = ResourceId::from_path("shaders/sea.sc");
        let c = ResourceId::from_path("maps/level1.map");
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }

    #[test]
    fn seed_changes_hash() {
        assert_ne!(
            murmur_hash64(b"boot.package", 0),
            murmur_hash64(b"boot.package", 1)
        );
    }

    #[test]
    fn tail_bytes_participate() {
        // lengths around the 8-byte block boundary
        assert_ne!(murmur_hash64(b"1234567", 0), murmur_hash64(b"12345678", 0));
        assert_ne!(murmur_hash64(b"12345678", 0), murmur_hash64(b"123456789", 0));
        assert_ne!(murmur_hash64(b"123456788", 0), murmur_hash64(b"123456789", 0));
    }

    #[test]
    fn display_is_fixed_width_hex() {
        let s = ResourceId::from_path("a").to_string();
        assert_eq!(s.len(), 16);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

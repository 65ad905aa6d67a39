//! Client-side frame masking (RFC 6455 Section 5.3).

use rand::Rng;

/// XOR `data` in place with the 4-byte masking key.
///
/// Applying the same key twice restores the original bytes.
///
/// ```
/// use wsswarm::protocol::mask::apply_mask;
///
/// let mask = [0x37, 0xfa, 0x21, 0x3d];
/// let mut data = b"Hello".to_vec();
/// apply_mask(&mut data, mask);
/// assert_eq!(data, [0x7f, 0x9f, 0x4d, 0x51, 0x58]);
/// ```
#[inline]
pub fn apply_mask(data: &mut [u8], mask: [u8; 4]) {
    let mask_u32 = u32::from_ne_bytes(mask);
    let mut chunks = data.chunks_exact_mut(4);
    for chunk in &mut chunks {
        let val = u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) ^ mask_u32;
        chunk.copy_from_slice(&val.to_ne_bytes());
    }
    for (byte, key) in chunks.into_remainder().iter_mut().zip(mask) {
        *byte ^= key;
    }
}

/// Per-connection source of masking keys.
///
/// Keys only need to be unpredictable to intermediaries, so a seeded
/// integer mixer is enough; the seed itself comes from the OS.
#[derive(Debug, Clone)]
pub struct MaskGenerator {
    counter: u32,
}

impl MaskGenerator {
    /// Create a generator seeded from the thread-local OS-seeded RNG.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(rand::rng().random())
    }

    /// Create a generator with a fixed seed.
    #[must_use]
    pub const fn with_seed(seed: u32) -> Self {
        Self { counter: seed }
    }

    /// Produce the next masking key.
    pub fn next_mask(&mut self) -> [u8; 4] {
        self.counter = self.counter.wrapping_add(0x9E37_79B9);
        let a = self.counter;
        let b = a.wrapping_mul(0x85EB_CA6B);
        let c = b ^ (b >> 13);
        let d = c.wrapping_mul(0xC2B2_AE35);
        d.to_le_bytes()
    }
}

impl Default for MaskGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_mask_rfc_example() {
        let mut data = b"Hello".to_vec();
        apply_mask(&mut data, [0x37, 0xfa, 0x21, 0x3d]);
        assert_eq!(data, [0x7f, 0x9f, 0x4d, 0x51, 0x58]);
    }

    #[test]
    fn test_apply_mask_involution() {
        let original: Vec<u8> = (0..=255).collect();
        let mut data = original.clone();
        let mask = [0xde, 0xad, 0xbe, 0xef];
        apply_mask(&mut data, mask);
        assert_ne!(data, original);
        apply_mask(&mut data, mask);
        assert_eq!(data, original);
    }

    #[test]
    fn test_apply_mask_empty() {
        let mut data: Vec<u8> = Vec::new();
        apply_mask(&mut data, [1, 2, 3, 4]);
        assert!(data.is_empty());
    }

    #[test]
    fn test_apply_mask_matches_bytewise() {
        let mask = [0x01, 0x02, 0x03, 0x04];
        for len in 0..16 {
            let mut fast: Vec<u8> = (0..len as u8).collect();
            let expected: Vec<u8> = fast.iter().enumerate().map(|(i, b)| b ^ mask[i % 4]).collect();
            apply_mask(&mut fast, mask);
            assert_eq!(fast, expected, "len {}", len);
        }
    }

    #[test]
    fn test_mask_generators_seeded_independently() {
        let a: Vec<[u8; 4]> = {
            let mut g = MaskGenerator::new();
            (0..4).map(|_| g.next_mask()).collect()
        };
        let b: Vec<[u8; 4]> = {
            let mut g = MaskGenerator::default();
            (0..4).map(|_| g.next_mask()).collect()
        };
        assert_ne!(a, b);
    }

    #[test]
    fn test_mask_generator_deterministic_with_seed() {
        let mut a = MaskGenerator::with_seed(42);
        let mut b = MaskGenerator::with_seed(42);
        for _ in 0..8 {
            assert_eq!(a.next_mask(), b.next_mask());
        }
    }

    #[test]
    fn test_mask_generator_varies() {
        let mut generator = MaskGenerator::with_seed(1);
        let first = generator.next_mask();
        let second = generator.next_mask();
        assert_ne!(first, second);
    }
}

//! Probabilistic set of change hashes used for set reconciliation.
//!
//! A peer summarizes the changes it holds beyond the last sync point as a
//! Bloom filter. The other side treats a negative as "the peer definitely
//! lacks this change" (no false negatives) and compensates for false
//! positives with dependency closure and iterative exchange.
//!
//! Probe indices come from Dillinger-Manolios triple hashing: the first 12
//! bytes of the (already uniform) change hash are read as three u32-LE words
//! `x`, `y`, `z`, and probes are emitted by `x`, then repeatedly
//! `x = (x + y) mod m`, `y = (y + z) mod m`.

use dagmerge_core::{ChangeHash, CoreError, Decoder, Encoder};

use crate::error::Result;

/// Default number of filter bits per inserted hash.
pub const DEFAULT_BITS_PER_ENTRY: u32 = 10;

/// Default number of probe indices per hash.
pub const DEFAULT_NUM_PROBES: u32 = 7;

/// Bloom filter over change hashes.
///
/// The default value is the empty filter, which contains nothing and
/// serializes to the empty byte string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BloomFilter {
    num_entries: u32,
    num_bits_per_entry: u32,
    num_probes: u32,
    bits: Vec<u8>,
}

impl BloomFilter {
    /// Build a filter over the given hashes with default parameters.
    pub fn from_hashes(hashes: &[ChangeHash]) -> Self {
        Self::with_params(DEFAULT_BITS_PER_ENTRY, DEFAULT_NUM_PROBES, hashes)
    }

    /// Build a filter over the given hashes with explicit parameters.
    pub fn with_params(num_bits_per_entry: u32, num_probes: u32, hashes: &[ChangeHash]) -> Self {
        let num_entries = hashes.len() as u32;
        let bits_len = (num_entries as u64 * num_bits_per_entry as u64).div_ceil(8) as usize;
        let mut filter = Self {
            num_entries,
            num_bits_per_entry,
            num_probes,
            bits: vec![0; bits_len],
        };
        for hash in hashes {
            filter.add_hash(hash);
        }
        filter
    }

    /// Number of hashes inserted at construction.
    pub fn num_entries(&self) -> u32 {
        self.num_entries
    }

    /// Whether this is the empty filter.
    pub fn is_empty(&self) -> bool {
        self.num_entries == 0
    }

    /// Set the probe bits for a hash.
    pub fn add_hash(&mut self, hash: &ChangeHash) {
        for probe in self.probes(hash) {
            self.bits[probe >> 3] |= 1 << (probe & 7);
        }
    }

    /// Whether the filter (probabilistically) contains the hash.
    ///
    /// The empty filter contains nothing.
    pub fn contains_hash(&self, hash: &ChangeHash) -> bool {
        if self.bits.is_empty() {
            return false;
        }
        self.probes(hash)
            .into_iter()
            .all(|probe| self.bits[probe >> 3] & (1 << (probe & 7)) != 0)
    }

    /// Probe indices for a hash. Empty when the bit array is empty.
    fn probes(&self, hash: &ChangeHash) -> Vec<usize> {
        let modulo = 8 * self.bits.len() as u64;
        if modulo == 0 {
            return Vec::new();
        }
        let bytes = hash.as_bytes();
        let word = |i: usize| u32::from_le_bytes(bytes[i..i + 4].try_into().expect("u32")) as u64;
        let mut x = word(0) % modulo;
        let mut y = word(4) % modulo;
        let z = word(8) % modulo;

        let mut probes = Vec::with_capacity(self.num_probes as usize);
        probes.push(x as usize);
        for _ in 1..self.num_probes {
            x = (x + y) % modulo;
            y = (y + z) % modulo;
            probes.push(x as usize);
        }
        probes
    }

    /// Serialize: empty filter is the empty byte string, otherwise the three
    /// parameter words followed by the raw bit array.
    pub fn to_bytes(&self) -> Vec<u8> {
        if self.num_entries == 0 {
            return Vec::new();
        }
        let mut enc = Encoder::new();
        enc.push_u32_le(self.num_entries);
        enc.push_u32_le(self.num_bits_per_entry);
        enc.push_u32_le(self.num_probes);
        enc.push_bytes(&self.bits);
        enc.into_bytes()
    }

    /// Deserialize. The empty input yields the empty filter.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        let mut dec = Decoder::new(bytes);
        let num_entries = dec.read_u32_le()?;
        let num_bits_per_entry = dec.read_u32_le()?;
        let num_probes = dec.read_u32_le()?;
        let bits_len = (num_entries as u64 * num_bits_per_entry as u64).div_ceil(8);
        if bits_len > dec.remaining() as u64 {
            return Err(CoreError::UnexpectedEof {
                needed: bits_len.min(usize::MAX as u64) as usize,
                remaining: dec.remaining(),
            }
            .into());
        }
        let bits = dec.read_exact(bits_len as usize)?.to_vec();
        Ok(Self {
            num_entries,
            num_bits_per_entry,
            num_probes,
            bits,
        })
    }
}

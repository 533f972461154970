// Consensus-critical. Changes require vector updates + tests.
//! VerusHash absorb/finalize engines.
//!
//! Both families share one chaining construction: a 64-byte block whose lower
//! half is the chaining value and whose upper half receives input in 32-byte
//! chunks. A full chunk is compressed 512 -> 256 bits back into the lower half.
//!
//! The compression itself is external to this crate and enters through
//! [`Compressor`] / [`Mixer`]. The `Portable*` compressors are BLAKE2b-based
//! stand-ins that keep the engines usable and deterministic without the
//! Haraka/CLHash primitives; their outputs are not mainnet VerusHash values.
//!
//! Every hasher is a plain value. Callers build one per digest, so no state is
//! shared between calls or threads.

use blake2b_simd::Params;
use verushash_core::{Hash32, HASH32_LEN};

/// Size of the compression block.
pub const BLOCK_LEN: usize = 64;

const CHUNK_LEN: usize = BLOCK_LEN / 2;

/// 512 -> 256 bit compression function.
pub trait Compressor {
    /// Compress one full block.
    fn compress(&self, block: &[u8; BLOCK_LEN]) -> [u8; HASH32_LEN];
}

/// Key-mixing step used by the second finalization mode of family 2.
pub trait Mixer: Compressor {
    /// Derive the 32-byte mixing value for the final block.
    fn mix(&self, block: &[u8; BLOCK_LEN]) -> [u8; HASH32_LEN];
}

const PORTABLE_V1_PERSONAL: &[u8; 16] = b"VerusHashV1Cmprs";
const PORTABLE_V2_PERSONAL: &[u8; 16] = b"VerusHashV2Cmprs";
const PORTABLE_V2_MIX_PERSONAL: &[u8; 16] = b"VerusHashV2bMix_";

fn blake2b_256(personal: &[u8; 16], data: &[u8]) -> [u8; HASH32_LEN] {
    let hash = Params::new()
        .hash_length(HASH32_LEN)
        .personal(personal)
        .hash(data);
    let mut out = [0u8; HASH32_LEN];
    out.copy_from_slice(hash.as_bytes());
    out
}

/// Portable family-1 compressor.
#[derive(Clone, Copy, Debug, Default)]
pub struct PortableV1;

impl Compressor for PortableV1 {
    fn compress(&self, block: &[u8; BLOCK_LEN]) -> [u8; HASH32_LEN] {
        blake2b_256(PORTABLE_V1_PERSONAL, block)
    }
}

/// Portable family-2 compressor and mixer.
#[derive(Clone, Copy, Debug, Default)]
pub struct PortableV2;

impl Compressor for PortableV2 {
    fn compress(&self, block: &[u8; BLOCK_LEN]) -> [u8; HASH32_LEN] {
        blake2b_256(PORTABLE_V2_PERSONAL, block)
    }
}

impl Mixer for PortableV2 {
    fn mix(&self, block: &[u8; BLOCK_LEN]) -> [u8; HASH32_LEN] {
        blake2b_256(PORTABLE_V2_MIX_PERSONAL, block)
    }
}

/// Chaining state shared by both families.
#[derive(Clone, Debug)]
struct Chain {
    block: [u8; BLOCK_LEN],
    pos: usize,
}

impl Chain {
    const fn new() -> Self {
        Self {
            block: [0u8; BLOCK_LEN],
            pos: 0,
        }
    }

    fn absorb<C: Compressor>(&mut self, compressor: &C, mut data: &[u8]) {
        while !data.is_empty() {
            let take = (CHUNK_LEN - self.pos).min(data.len());
            let start = CHUNK_LEN + self.pos;
            self.block[start..start + take].copy_from_slice(&data[..take]);
            data = &data[take..];
            self.pos += take;

            if self.pos == CHUNK_LEN {
                let out = compressor.compress(&self.block);
                self.block[..CHUNK_LEN].copy_from_slice(&out);
                self.pos = 0;
            }
        }
    }

    /// Current block with the unused tail of the input half zeroed.
    fn padded(&self) -> [u8; BLOCK_LEN] {
        let mut block = self.block;
        block[CHUNK_LEN + self.pos..].fill(0);
        block
    }

    fn chaining_value(&self) -> [u8; HASH32_LEN] {
        let mut out = [0u8; HASH32_LEN];
        out.copy_from_slice(&self.block[..CHUNK_LEN]);
        out
    }

    fn finalize<C: Compressor>(&self, compressor: &C) -> Hash32 {
        if self.pos == 0 {
            Hash32(self.chaining_value())
        } else {
            Hash32(compressor.compress(&self.padded()))
        }
    }
}

/// Family-1 hasher (`hash`).
#[derive(Clone, Debug)]
pub struct VerusHasher<C = PortableV1> {
    compressor: C,
    chain: Chain,
}

impl<C: Compressor + Default> Default for VerusHasher<C> {
    fn default() -> Self {
        Self::with_compressor(C::default())
    }
}

impl<C: Compressor> VerusHasher<C> {
    /// Fresh hasher over the given compression function.
    pub fn with_compressor(compressor: C) -> Self {
        Self {
            compressor,
            chain: Chain::new(),
        }
    }

    /// Drop all absorbed input.
    pub fn reset(&mut self) {
        self.chain = Chain::new();
    }

    /// Absorb `data`.
    pub fn write(&mut self, data: &[u8]) -> &mut Self {
        self.chain.absorb(&self.compressor, data);
        self
    }

    /// Produce the digest. The hasher is left untouched.
    pub fn finalize(&self) -> Hash32 {
        self.chain.finalize(&self.compressor)
    }
}

/// Family-2 hasher (`hash2`, `hash2b`, `hash2b1`, `hash2b2`).
#[derive(Clone, Debug)]
pub struct VerusHasherV2<C = PortableV2> {
    compressor: C,
    chain: Chain,
}

impl<C: Mixer + Default> Default for VerusHasherV2<C> {
    fn default() -> Self {
        Self::with_compressor(C::default())
    }
}

impl<C: Mixer> VerusHasherV2<C> {
    /// Fresh hasher over the given compression function.
    pub fn with_compressor(compressor: C) -> Self {
        Self {
            compressor,
            chain: Chain::new(),
        }
    }

    /// Drop all absorbed input.
    pub fn reset(&mut self) {
        self.chain = Chain::new();
    }

    /// Absorb `data`.
    pub fn write(&mut self, data: &[u8]) -> &mut Self {
        self.chain.absorb(&self.compressor, data);
        self
    }

    /// First finalization mode (`v2`).
    pub fn finalize(&self) -> Hash32 {
        self.chain.finalize(&self.compressor)
    }

    /// Second finalization mode (`v2b`): the padded final block is compressed
    /// and then folded once more with its mixing value.
    pub fn finalize_2b(&self) -> Hash32 {
        let block = self.chain.padded();
        let mut last = [0u8; BLOCK_LEN];
        last[..CHUNK_LEN].copy_from_slice(&self.compressor.compress(&block));
        last[CHUNK_LEN..].copy_from_slice(&self.compressor.mix(&block));
        Hash32(self.compressor.compress(&last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Compressor that just returns the upper half, to make chaining visible.
    #[derive(Clone, Copy, Default)]
    struct Passthrough;

    impl Compressor for Passthrough {
        fn compress(&self, block: &[u8; BLOCK_LEN]) -> [u8; HASH32_LEN] {
            let mut out = [0u8; HASH32_LEN];
            out.copy_from_slice(&block[CHUNK_LEN..]);
            out
        }
    }

    #[test]
    fn empty_input_yields_zero_chaining_value() {
        assert!(VerusHasher::<PortableV1>::default().finalize().is_zero());
    }

    #[test]
    fn full_chunk_is_compressed_into_chaining_half() {
        let mut h = VerusHasher::with_compressor(Passthrough);
        h.write(&[7u8; 32]);
        assert_eq!(h.finalize(), Hash32([7u8; 32]));
    }

    #[test]
    fn partial_chunk_is_zero_padded() {
        let mut h = VerusHasher::with_compressor(Passthrough);
        h.write(&[9u8; 3]);
        let mut expected = [0u8; 32];
        expected[..3].copy_from_slice(&[9, 9, 9]);
        assert_eq!(h.finalize(), Hash32(expected));
    }

    #[test]
    fn split_writes_match_single_write() {
        let data: Vec<u8> = (0..=200u8).collect();
        let mut one = VerusHasherV2::<PortableV2>::default();
        one.write(&data);
        let mut many = VerusHasherV2::<PortableV2>::default();
        for piece in data.chunks(7) {
            many.write(piece);
        }
        assert_eq!(one.finalize(), many.finalize());
        assert_eq!(one.finalize_2b(), many.finalize_2b());
    }

    #[test]
    fn reset_forgets_previous_input() {
        let mut h = VerusHasherV2::<PortableV2>::default();
        h.write(b"stale input that must not leak");
        h.reset();
        h.write(b"abc");
        let mut fresh = VerusHasherV2::<PortableV2>::default();
        fresh.write(b"abc");
        assert_eq!(h.finalize_2b(), fresh.finalize_2b());
    }

    #[test]
    fn finalization_modes_differ() {
        let mut h = VerusHasherV2::<PortableV2>::default();
        h.write(b"block header bytes");
        assert_ne!(h.finalize(), h.finalize_2b());
    }

    #[test]
    fn families_differ() {
        let mut a = VerusHasher::<PortableV1>::default();
        a.write(b"abc");
        let mut b = VerusHasherV2::<PortableV2>::default();
        b.write(b"abc");
        assert_ne!(a.finalize(), b.finalize());
    }
}

// Consensus-critical. Changes require vector updates + tests.
//! Solution header parsing and PBaaS pre-header assembly.
//!
//! The pre-header is the 196-byte record a merge-mined block commits to in its
//! first chain header entry:
//!
//! ```text
//! hashPrevBlock(32) | hashMerkleRoot(32) | hashFinalSaplingRoot(32)
//!   | nNonce(32) | nBits(4) | hashPrevMMRRoot(32) | hashBlockMMRRoot(32)
//! ```

use blake2b_simd::Params;
use verushash_core::{
    BinaryView, CoreError, Hash32, BITS_LEN, BITS_OFFSET, CHAIN_ID_LEN,
    DEFAULT_HASH_PERSONAL, DESCRIPTOR_BITS_REL, EXTRA_SPACE_REL, FINAL_SAPLING_ROOT_OFFSET,
    FIRST_CHAIN_ID_REL, FIRST_PRE_HEADER_DIGEST_REL, HASH32_LEN, MAX_LEGACY_SOLUTION_VERSION,
    MERKLE_ROOT_OFFSET, MMR_ROOTS_REL, NONCE_OFFSET, NUM_CHAIN_HEADERS_REL,
    PREV_BLOCK_HASH_OFFSET, PRE_HEADER_LEN, SOLUTION_OFFSET, SOLUTION_VERSION_REL,
};

/// Whether a solution version is new enough to carry merge-mining metadata.
pub fn is_pbaas_version(version: u32) -> bool {
    version > MAX_LEGACY_SOLUTION_VERSION
}

/// Read only the solution version (needs 147 bytes).
pub fn solution_version<B: AsRef<[u8]>>(view: &BinaryView<B>) -> Result<u32, CoreError> {
    view.read_u32_le(SOLUTION_OFFSET + SOLUTION_VERSION_REL)
}

/// Read only the PBaaS chain header count (needs 149 bytes).
pub fn num_chain_headers<B: AsRef<[u8]>>(view: &BinaryView<B>) -> Result<u8, CoreError> {
    view.read_u8(SOLUTION_OFFSET + NUM_CHAIN_HEADERS_REL)
}

/// Fixed part of a solution that carries PBaaS metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolutionHeader {
    /// Solution version.
    pub version: u32,
    /// Descriptor bits. Carried, not interpreted.
    pub descriptor_bits: u8,
    /// Number of PBaaS chain headers following this header.
    pub num_chain_headers: u8,
    /// Extra space. Carried, not interpreted.
    pub extra_space: u16,
    /// `hashPrevMMRRoot`.
    pub prev_mmr_root: Hash32,
    /// `hashBlockMMRRoot`.
    pub block_mmr_root: Hash32,
}

impl SolutionHeader {
    /// Parse the 72-byte solution header.
    pub fn parse<B: AsRef<[u8]>>(view: &BinaryView<B>) -> Result<Self, CoreError> {
        let base = SOLUTION_OFFSET;
        Ok(Self {
            version: solution_version(view)?,
            descriptor_bits: view.read_u8(base + DESCRIPTOR_BITS_REL)?,
            num_chain_headers: num_chain_headers(view)?,
            extra_space: view.read_u16_le(base + EXTRA_SPACE_REL)?,
            prev_mmr_root: view.read_hash(base + MMR_ROOTS_REL)?,
            block_mmr_root: view.read_hash(base + MMR_ROOTS_REL + HASH32_LEN)?,
        })
    }

    /// Whether the version is new enough to carry merge-mining metadata.
    pub fn is_pbaas(&self) -> bool {
        is_pbaas_version(self.version)
    }
}

/// First PBaaS chain header entry. Later entries are never consulted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainHeaderEntry {
    /// hash160 identifier of the merge-mined chain.
    pub chain_id: [u8; CHAIN_ID_LEN],
    /// BLAKE2b digest of the pre-header this block was mined against.
    pub pre_header_digest: Hash32,
}

impl ChainHeaderEntry {
    /// Parse the entry directly after the solution header.
    pub fn parse_first<B: AsRef<[u8]>>(view: &BinaryView<B>) -> Result<Self, CoreError> {
        Ok(Self {
            chain_id: view.read_array(SOLUTION_OFFSET + FIRST_CHAIN_ID_REL)?,
            pre_header_digest: view.read_hash(SOLUTION_OFFSET + FIRST_PRE_HEADER_DIGEST_REL)?,
        })
    }
}

/// Digest committed to by the first chain header entry.
///
/// The default is [`Blake2bPreHeaderDigest`]. A null result is treated as a
/// primitive failure by the merge-mining detector.
pub trait PreHeaderDigest {
    /// Digest of the 196-byte record.
    fn digest(&self, pre_header: &PreHeader) -> Hash32;
}

/// BLAKE2b-256, no key, personalized with `VerusDefaultHash`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Blake2bPreHeaderDigest;

impl PreHeaderDigest for Blake2bPreHeaderDigest {
    fn digest(&self, pre_header: &PreHeader) -> Hash32 {
        let hash = Params::new()
            .hash_length(HASH32_LEN)
            .personal(DEFAULT_HASH_PERSONAL)
            .hash(pre_header.as_bytes());
        let mut out = [0u8; HASH32_LEN];
        out.copy_from_slice(hash.as_bytes());
        Hash32(out)
    }
}

/// The 196-byte pre-header record.
#[derive(Clone, PartialEq, Eq)]
pub struct PreHeader([u8; PRE_HEADER_LEN]);

impl PreHeader {
    /// Copy the non-canonical header fields and the solution's MMR roots.
    /// Never mutates the buffer.
    pub fn build<B: AsRef<[u8]>>(
        view: &BinaryView<B>,
        solution: &SolutionHeader,
    ) -> Result<Self, CoreError> {
        let mut out = [0u8; PRE_HEADER_LEN];
        let mut at = 0usize;
        let mut put = |bytes: &[u8]| {
            out[at..at + bytes.len()].copy_from_slice(bytes);
            at += bytes.len();
        };

        put(view.read_bytes(PREV_BLOCK_HASH_OFFSET, HASH32_LEN)?);
        put(view.read_bytes(MERKLE_ROOT_OFFSET, HASH32_LEN)?);
        put(view.read_bytes(FINAL_SAPLING_ROOT_OFFSET, HASH32_LEN)?);
        put(view.read_bytes(NONCE_OFFSET, HASH32_LEN)?);
        put(view.read_bytes(BITS_OFFSET, BITS_LEN)?);
        put(solution.prev_mmr_root.as_bytes());
        put(solution.block_mmr_root.as_bytes());

        Ok(Self(out))
    }

    /// Raw record bytes.
    pub fn as_bytes(&self) -> &[u8; PRE_HEADER_LEN] {
        &self.0
    }

    /// True when every byte is zero, i.e. the header was already canonicalized.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// [`Blake2bPreHeaderDigest`] of the record.
    pub fn digest(&self) -> Hash32 {
        Blake2bPreHeaderDigest.digest(self)
    }
}

impl core::fmt::Debug for PreHeader {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "PreHeader({})", hex::encode(self.0))
    }
}

// Consensus-critical. Changes require vector updates + tests.
//! Byte layout of a serialized block header followed by its solution.
//!
//! All offsets are absolute from the start of the buffer unless the name says
//! otherwise. Integers are little-endian.

/// Length in bytes of a 32-byte hash.
pub const HASH32_LEN: usize = 32;

/// Length in bytes of a hash160 chain identifier.
pub const CHAIN_ID_LEN: usize = 20;

// ---------------------------------------------------------------------------
// Block header
// ---------------------------------------------------------------------------

/// Offset of `hashPrevBlock`.
pub const PREV_BLOCK_HASH_OFFSET: usize = 4;

/// Offset of `hashMerkleRoot`.
pub const MERKLE_ROOT_OFFSET: usize = 36;

/// Offset of `hashFinalSaplingRoot`.
pub const FINAL_SAPLING_ROOT_OFFSET: usize = 68;

/// Offset of `nBits`.
pub const BITS_OFFSET: usize = 104;

/// Length of `nBits`.
pub const BITS_LEN: usize = 4;

/// Offset of the 32-byte `nNonce`.
pub const NONCE_OFFSET: usize = 108;

/// Length of the serialized header fields preceding the solution.
pub const HEADER_LEN: usize = 140;

/// Length of the compact-size prefix in front of the solution.
pub const SOLUTION_PREFIX_LEN: usize = 3;

/// Offset of the first solution byte.
pub const SOLUTION_OFFSET: usize = HEADER_LEN + SOLUTION_PREFIX_LEN;

// ---------------------------------------------------------------------------
// Solution header (offsets relative to `SOLUTION_OFFSET`)
// ---------------------------------------------------------------------------

/// Solution version (u32).
pub const SOLUTION_VERSION_REL: usize = 0;

/// Descriptor bits (u8).
pub const DESCRIPTOR_BITS_REL: usize = 4;

/// Number of PBaaS chain headers carried by the solution (u8).
pub const NUM_CHAIN_HEADERS_REL: usize = 5;

/// Extra space (u16).
pub const EXTRA_SPACE_REL: usize = 6;

/// `hashPrevMMRRoot` followed by `hashBlockMMRRoot`.
pub const MMR_ROOTS_REL: usize = 8;

/// Combined length of both MMR roots.
pub const MMR_ROOTS_LEN: usize = 2 * HASH32_LEN;

/// Size of the solution header when chain headers are present.
pub const SOLUTION_HEADER_LEN: usize = 4 + 1 + 1 + 2 + MMR_ROOTS_LEN;

/// First chain header: hash160 chain identifier.
pub const FIRST_CHAIN_ID_REL: usize = SOLUTION_HEADER_LEN;

/// First chain header: BLAKE2b digest of the pre-header.
pub const FIRST_PRE_HEADER_DIGEST_REL: usize = SOLUTION_HEADER_LEN + CHAIN_ID_LEN;

/// Length of one chain header entry.
pub const CHAIN_HEADER_ENTRY_LEN: usize = CHAIN_ID_LEN + HASH32_LEN;

/// Smallest buffer that holds the solution version.
pub const MIN_SOLUTION_VERSION_LEN: usize = SOLUTION_OFFSET + 4;

/// Smallest buffer that holds the solution header and the first chain entry.
pub const MIN_MERGE_MINED_LEN: usize =
    SOLUTION_OFFSET + SOLUTION_HEADER_LEN + CHAIN_HEADER_ENTRY_LEN;

// ---------------------------------------------------------------------------
// Merge mining
// ---------------------------------------------------------------------------

/// Solution versions above this carry PBaaS merge-mining metadata.
pub const MAX_LEGACY_SOLUTION_VERSION: u32 = 6;

/// Length of the pre-header record.
pub const PRE_HEADER_LEN: usize = 4 * HASH32_LEN + BITS_LEN + MMR_ROOTS_LEN;

/// BLAKE2b personalization used for the pre-header digest.
pub const DEFAULT_HASH_PERSONAL: &[u8; 16] = b"VerusDefaultHash";

/// Digest returned for a rejected merge-mining candidate.
pub const REJECTED_DIGEST: [u8; HASH32_LEN] = [0xff; HASH32_LEN];

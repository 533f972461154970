// Consensus-critical. Changes require vector updates + tests.
//! PBaaS merge-mining detection and header canonicalization.
//!
//! A solution with version > 6 and at least one chain header commits to a
//! pre-header digest. When that digest checks out, the chain-specific header
//! fields are zeroed so the PoW hash no longer depends on which chain mined
//! the block. When it does not, the candidate is rejected.

use tracing::{debug, warn};
use verushash_core::{
    BinaryView, Hash32, BITS_LEN, BITS_OFFSET, CHAIN_ID_LEN, HASH32_LEN, MMR_ROOTS_LEN,
    MMR_ROOTS_REL, NONCE_OFFSET, PREV_BLOCK_HASH_OFFSET, SOLUTION_OFFSET,
};

use crate::error::PowError;
use crate::preheader::{
    is_pbaas_version, num_chain_headers, solution_version, Blake2bPreHeaderDigest,
    ChainHeaderEntry, PreHeader, PreHeaderDigest, SolutionHeader,
};

/// Spans zeroed by canonicalization, as `(offset, len)`.
///
/// `hashPrevBlock | hashMerkleRoot | hashFinalSaplingRoot`, `nBits`, `nNonce`,
/// and both MMR roots in the solution header.
pub const CANONICAL_ZERO_SPANS: [(usize, usize); 4] = [
    (PREV_BLOCK_HASH_OFFSET, 3 * HASH32_LEN),
    (BITS_OFFSET, BITS_LEN),
    (NONCE_OFFSET, HASH32_LEN),
    (SOLUTION_OFFSET + MMR_ROOTS_REL, MMR_ROOTS_LEN),
];

/// Why a buffer is hashed exactly as given.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassReason {
    /// Solution version predates merge mining.
    LegacySolution {
        /// The declared solution version.
        version: u32,
    },
    /// PBaaS solution without chain headers.
    NoChainHeaders,
    /// Non-canonical fields were already cleared upstream.
    PreCleared,
}

/// Why a merge-mining candidate is invalid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// The recomputed pre-header digest differs from the embedded one.
    DigestMismatch {
        /// Digest carried by the first chain header.
        embedded: Hash32,
        /// Digest recomputed from the header.
        computed: Hash32,
    },
    /// The digest primitive produced the null hash.
    DigestFailure,
}

impl core::fmt::Display for Rejection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Rejection::DigestMismatch { .. } => f.write_str("pre-header digest mismatch"),
            Rejection::DigestFailure => f.write_str("pre-header digest failure"),
        }
    }
}

/// Result of inspecting a header + solution buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Inspection {
    /// Hash the buffer unmodified.
    Pass(PassReason),
    /// Merge-mining metadata verified; canonicalize before hashing.
    Verified {
        /// Number of chain headers declared by the solution.
        num_chain_headers: u8,
        /// Identifier of the first merge-mined chain.
        chain_id: [u8; CHAIN_ID_LEN],
    },
    /// Invalid merge-mining candidate.
    Rejected(Rejection),
}

/// Decide how a buffer must be treated. Never mutates.
///
/// Once chain headers are declared, the complete first chain entry (267
/// bytes total) must be present, whatever the pre-header holds.
pub fn inspect(buf: &[u8]) -> Result<Inspection, PowError> {
    inspect_with(buf, &Blake2bPreHeaderDigest)
}

/// [`inspect`] with an explicit pre-header digest.
pub fn inspect_with<D: PreHeaderDigest>(buf: &[u8], digest: &D) -> Result<Inspection, PowError> {
    let view = BinaryView::new(buf);

    let version = solution_version(&view)?;
    if !is_pbaas_version(version) {
        return Ok(Inspection::Pass(PassReason::LegacySolution { version }));
    }
    if num_chain_headers(&view)? == 0 {
        return Ok(Inspection::Pass(PassReason::NoChainHeaders));
    }

    let solution = SolutionHeader::parse(&view)?;
    let entry = ChainHeaderEntry::parse_first(&view)?;
    let pre_header = PreHeader::build(&view, &solution)?;

    if pre_header.is_zero() {
        return Ok(Inspection::Pass(PassReason::PreCleared));
    }

    let computed = digest.digest(&pre_header);
    if computed.is_zero() {
        return Ok(Inspection::Rejected(Rejection::DigestFailure));
    }
    if computed != entry.pre_header_digest {
        return Ok(Inspection::Rejected(Rejection::DigestMismatch {
            embedded: entry.pre_header_digest,
            computed,
        }));
    }

    Ok(Inspection::Verified {
        num_chain_headers: solution.num_chain_headers,
        chain_id: entry.chain_id,
    })
}

/// Zero every span in [`CANONICAL_ZERO_SPANS`]. Idempotent.
///
/// All spans are range-checked before the first write, so a short buffer is
/// left untouched.
pub fn canonicalize(buf: &mut [u8]) -> Result<(), PowError> {
    let mut view = BinaryView::new(buf);
    for (offset, len) in CANONICAL_ZERO_SPANS {
        view.check(offset, len)?;
    }
    for (offset, len) in CANONICAL_ZERO_SPANS {
        view.write_zeros(offset, len)?;
    }
    Ok(())
}

/// Inspect and, on [`Inspection::Verified`], canonicalize in place.
///
/// Only the verified path writes to `buf`.
pub fn prepare(buf: &mut [u8]) -> Result<Inspection, PowError> {
    prepare_with(buf, &Blake2bPreHeaderDigest)
}

/// [`prepare`] with an explicit pre-header digest.
pub fn prepare_with<D: PreHeaderDigest>(
    buf: &mut [u8],
    digest: &D,
) -> Result<Inspection, PowError> {
    let inspection = inspect_with(buf, digest)?;
    match &inspection {
        Inspection::Pass(reason) => {
            debug!(?reason, "hashing header as given");
        }
        Inspection::Verified {
            num_chain_headers,
            chain_id,
        } => {
            canonicalize(buf)?;
            debug!(
                num_chain_headers,
                chain_id = %hex::encode(chain_id),
                "merge mining verified, cleared non-canonical data"
            );
        }
        Inspection::Rejected(reason) => {
            warn!(%reason, "invalid merge-mining candidate");
        }
    }
    Ok(inspection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use verushash_core::{MIN_MERGE_MINED_LEN, MIN_SOLUTION_VERSION_LEN, PRE_HEADER_LEN};

    fn candidate(version: u32, chains: u8) -> Vec<u8> {
        let mut buf: Vec<u8> = (0..MIN_MERGE_MINED_LEN + 40).map(|i| (i * 7 % 253) as u8).collect();
        buf[143..147].copy_from_slice(&version.to_le_bytes());
        buf[148] = chains;
        buf
    }

    fn embed_valid_digest(buf: &mut [u8]) {
        let view = BinaryView::new(&*buf);
        let sol = SolutionHeader::parse(&view).unwrap();
        let digest = PreHeader::build(&view, &sol).unwrap().digest();
        buf[235..267].copy_from_slice(digest.as_bytes());
    }

    /// Stands in for a digest primitive that fails by returning the null hash.
    struct NullDigest;

    impl PreHeaderDigest for NullDigest {
        fn digest(&self, _pre_header: &PreHeader) -> Hash32 {
            Hash32::zero()
        }
    }

    fn mmr_roots_only() -> Vec<u8> {
        let mut buf = vec![0u8; MIN_MERGE_MINED_LEN];
        buf[143..147].copy_from_slice(&7u32.to_le_bytes());
        buf[148] = 1;
        buf[151..215].fill(0x3c);
        buf
    }

    fn clear_pre_header_fields(buf: &mut [u8]) {
        for (offset, len) in CANONICAL_ZERO_SPANS {
            buf[offset..offset + len].fill(0);
        }
    }

    #[test]
    fn legacy_versions_pass() {
        for version in [0u32, 1, 6] {
            let buf = candidate(version, 3);
            assert_eq!(
                inspect(&buf).unwrap(),
                Inspection::Pass(PassReason::LegacySolution { version })
            );
        }
    }

    #[test]
    fn legacy_needs_only_the_version() {
        let mut buf = vec![0u8; MIN_SOLUTION_VERSION_LEN];
        buf[143] = 4;
        assert!(matches!(inspect(&buf).unwrap(), Inspection::Pass(_)));
    }

    #[test]
    fn no_chain_headers_pass() {
        let buf = candidate(7, 0);
        assert_eq!(inspect(&buf).unwrap(), Inspection::Pass(PassReason::NoChainHeaders));
    }

    #[test]
    fn pre_cleared_passes_without_digest_check() {
        let mut buf = candidate(7, 1);
        clear_pre_header_fields(&mut buf);
        assert_eq!(inspect(&buf).unwrap(), Inspection::Pass(PassReason::PreCleared));
    }

    #[test]
    fn matching_digest_verifies() {
        let mut buf = candidate(8, 2);
        embed_valid_digest(&mut buf);
        match inspect(&buf).unwrap() {
            Inspection::Verified {
                num_chain_headers,
                chain_id,
            } => {
                assert_eq!(num_chain_headers, 2);
                assert_eq!(&chain_id[..], &buf[215..235]);
            }
            other => panic!("expected verified, got {other:?}"),
        }
    }

    #[test]
    fn mismatch_rejects() {
        let mut buf = candidate(7, 1);
        embed_valid_digest(&mut buf);
        buf[120] ^= 0x01; // nonce byte
        assert!(matches!(
            inspect(&buf).unwrap(),
            Inspection::Rejected(Rejection::DigestMismatch { .. })
        ));
    }

    #[test]
    fn truncated_chain_entry_is_out_of_range() {
        let mut buf = candidate(7, 1);
        clear_pre_header_fields(&mut buf);
        buf.truncate(MIN_MERGE_MINED_LEN - 1);
        assert!(matches!(inspect(&buf), Err(PowError::OutOfRange { .. })));

        let short = candidate(7, 1)[..148].to_vec();
        assert!(matches!(inspect(&short), Err(PowError::OutOfRange { offset: 148, .. })));
    }

    #[test]
    fn prepare_only_writes_on_verified() {
        let mut rejected = candidate(7, 1);
        let before = rejected.clone();
        assert!(matches!(prepare(&mut rejected).unwrap(), Inspection::Rejected(_)));
        assert_eq!(rejected, before);

        let mut verified = candidate(7, 1);
        embed_valid_digest(&mut verified);
        let before = verified.clone();
        assert!(matches!(prepare(&mut verified).unwrap(), Inspection::Verified { .. }));
        for (offset, len) in CANONICAL_ZERO_SPANS {
            assert!(verified[offset..offset + len].iter().all(|b| *b == 0));
        }
        // Everything outside the spans is preserved, including the chain entry.
        let mut expected = before;
        clear_pre_header_fields(&mut expected);
        assert_eq!(verified, expected);
    }

    #[test]
    fn null_digest_is_a_failure() {
        let mut buf = candidate(7, 1);
        embed_valid_digest(&mut buf);
        assert_eq!(
            inspect_with(&buf, &NullDigest).unwrap(),
            Inspection::Rejected(Rejection::DigestFailure)
        );

        // An embedded null digest does not match a null result either.
        buf[235..267].fill(0);
        assert_eq!(
            inspect_with(&buf, &NullDigest).unwrap(),
            Inspection::Rejected(Rejection::DigestFailure)
        );
    }

    #[test]
    fn null_digest_leaves_buffer_untouched() {
        let mut buf = candidate(8, 1);
        embed_valid_digest(&mut buf);
        let before = buf.clone();
        assert_eq!(
            prepare_with(&mut buf, &NullDigest).unwrap(),
            Inspection::Rejected(Rejection::DigestFailure)
        );
        assert_eq!(buf, before);
    }

    #[test]
    fn pre_cleared_never_reaches_the_digest() {
        let mut buf = candidate(7, 1);
        clear_pre_header_fields(&mut buf);
        assert_eq!(
            inspect_with(&buf, &NullDigest).unwrap(),
            Inspection::Pass(PassReason::PreCleared)
        );
    }

    #[test]
    fn mmr_roots_alone_are_not_pre_cleared() {
        let buf = mmr_roots_only();
        assert!(buf[..140].iter().all(|b| *b == 0));
        assert!(matches!(
            inspect(&buf).unwrap(),
            Inspection::Rejected(Rejection::DigestMismatch { .. })
        ));

        let mut buf = mmr_roots_only();
        embed_valid_digest(&mut buf);
        assert!(matches!(prepare(&mut buf).unwrap(), Inspection::Verified { .. }));
        assert!(buf[151..215].iter().all(|b| *b == 0));
        assert_eq!(inspect(&buf).unwrap(), Inspection::Pass(PassReason::PreCleared));
    }

    #[test]
    fn canonicalize_is_idempotent() {
        let mut once = candidate(7, 1);
        canonicalize(&mut once).unwrap();
        let mut twice = once.clone();
        canonicalize(&mut twice).unwrap();
        assert_eq!(once, twice);

        let view = BinaryView::new(&once[..]);
        let sol = SolutionHeader::parse(&view).unwrap();
        assert_eq!(PreHeader::build(&view, &sol).unwrap().as_bytes(), &[0u8; PRE_HEADER_LEN]);
    }

    #[test]
    fn canonicalize_short_buffer_is_untouched() {
        let mut buf = vec![0xabu8; 200];
        assert!(canonicalize(&mut buf).is_err());
        assert!(buf.iter().all(|b| *b == 0xab));
    }
}

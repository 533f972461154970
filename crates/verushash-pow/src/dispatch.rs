// Consensus-critical. Changes require vector updates + tests.
//! Hash variant dispatch.
//!
//! | variant   | family | finalize | notes                         |
//! |-----------|--------|----------|-------------------------------|
//! | `hash`    | 1      | -        |                               |
//! | `hash2`   | 2      | `v2`     |                               |
//! | `hash2b`  | 2      | `v2b`    |                               |
//! | `hash2b1` | 2      | `v2b`    | separate protocol epoch       |
//! | `hash2b2` | 2      | `v2b`    | PBaaS merge-mining aware      |
//!
//! Every call builds its own hasher, so concurrent calls never share state.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use verushash_core::{Hash32, REJECTED_DIGEST};

use crate::engine::{Compressor, Mixer, PortableV1, PortableV2, VerusHasher, VerusHasherV2};
use crate::error::PowError;
use crate::merge_mining::{prepare_with, Inspection, Rejection};
use crate::preheader::{Blake2bPreHeaderDigest, PreHeaderDigest};

/// Hash function selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Variant {
    /// Family 1.
    #[cfg_attr(feature = "serde", serde(rename = "hash"))]
    V1,
    /// Family 2, first finalization mode.
    #[cfg_attr(feature = "serde", serde(rename = "hash2"))]
    V2,
    /// Family 2, second finalization mode.
    #[cfg_attr(feature = "serde", serde(rename = "hash2b"))]
    V2b,
    /// Family 2, second finalization mode, VerusHash 2.1 epoch.
    #[cfg_attr(feature = "serde", serde(rename = "hash2b1"))]
    V2b1,
    /// Family 2, second finalization mode, with merge-mining canonicalization.
    #[cfg_attr(feature = "serde", serde(rename = "hash2b2"))]
    V2b2,
}

impl Variant {
    /// All variants in declaration order.
    pub const ALL: [Variant; 5] = [
        Variant::V1,
        Variant::V2,
        Variant::V2b,
        Variant::V2b1,
        Variant::V2b2,
    ];

    /// Exported operation name.
    pub const fn name(self) -> &'static str {
        match self {
            Variant::V1 => "hash",
            Variant::V2 => "hash2",
            Variant::V2b => "hash2b",
            Variant::V2b1 => "hash2b1",
            Variant::V2b2 => "hash2b2",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variant {
    type Err = PowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variant::ALL
            .into_iter()
            .find(|v| v.name() == s)
            .ok_or(PowError::InvalidArgument("unknown hash variant"))
    }
}

/// Outcome of the merge-mining aware variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// A real digest was computed.
    Hashed {
        /// The PoW digest.
        digest: Hash32,
        /// How the buffer was treated before hashing.
        inspection: Inspection,
    },
    /// Invalid share; no digest was computed.
    Rejected(Rejection),
}

impl Verdict {
    /// The 32 bytes handed back to callers. Rejection maps to all `0xff`.
    pub fn digest(&self) -> Hash32 {
        match self {
            Verdict::Hashed { digest, .. } => *digest,
            Verdict::Rejected(_) => Hash32(REJECTED_DIGEST),
        }
    }

    /// Whether the candidate was rejected.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Verdict::Rejected(_))
    }
}

/// Dispatches input buffers to the hash families.
///
/// Holds only the (stateless) compression functions and the pre-header
/// digest; hasher state is created per call.
#[derive(Clone, Copy, Debug, Default)]
pub struct HashDispatcher<C1 = PortableV1, C2 = PortableV2, D = Blake2bPreHeaderDigest> {
    v1: C1,
    v2: C2,
    pre_header: D,
}

impl<C1, C2> HashDispatcher<C1, C2>
where
    C1: Compressor + Clone,
    C2: Mixer + Clone,
{
    /// Dispatcher over explicit compression functions.
    pub fn new(v1: C1, v2: C2) -> Self {
        Self {
            v1,
            v2,
            pre_header: Blake2bPreHeaderDigest,
        }
    }
}

impl<C1, C2, D> HashDispatcher<C1, C2, D>
where
    C1: Compressor + Clone,
    C2: Mixer + Clone,
    D: PreHeaderDigest,
{
    /// Replace the digest used to check merge-mining pre-headers.
    pub fn with_pre_header_digest<E: PreHeaderDigest>(
        self,
        pre_header: E,
    ) -> HashDispatcher<C1, C2, E> {
        HashDispatcher {
            v1: self.v1,
            v2: self.v2,
            pre_header,
        }
    }

    fn family2(&self, input: &[u8]) -> VerusHasherV2<C2> {
        let mut hasher = VerusHasherV2::with_compressor(self.v2.clone());
        hasher.write(input);
        hasher
    }

    /// Family 1.
    pub fn hash(&self, input: &[u8]) -> Hash32 {
        let mut hasher = VerusHasher::with_compressor(self.v1.clone());
        hasher.write(input);
        hasher.finalize()
    }

    /// Family 2, `v2` finalization.
    pub fn hash2(&self, input: &[u8]) -> Hash32 {
        self.family2(input).finalize()
    }

    /// Family 2, `v2b` finalization.
    pub fn hash2b(&self, input: &[u8]) -> Hash32 {
        self.family2(input).finalize_2b()
    }

    /// Family 2, `v2b` finalization, VerusHash 2.1 epoch.
    pub fn hash2b1(&self, input: &[u8]) -> Hash32 {
        self.family2(input).finalize_2b()
    }

    /// Merge-mining aware `v2b` hash with the reason kept visible.
    ///
    /// A verified candidate is canonicalized in place before hashing. A
    /// rejected one is left untouched.
    pub fn hash2b2_checked(&self, input: &mut [u8]) -> Result<Verdict, PowError> {
        match prepare_with(input, &self.pre_header)? {
            Inspection::Rejected(reason) => Ok(Verdict::Rejected(reason)),
            inspection => Ok(Verdict::Hashed {
                digest: self.family2(input).finalize_2b(),
                inspection,
            }),
        }
    }

    /// Merge-mining aware `v2b` hash. Rejected candidates yield all `0xff`.
    pub fn hash2b2(&self, input: &mut [u8]) -> Result<Hash32, PowError> {
        self.hash2b2_checked(input).map(|verdict| verdict.digest())
    }

    /// Run `variant` over `input`. Only [`Variant::V2b2`] may mutate it.
    pub fn digest(&self, variant: Variant, input: &mut [u8]) -> Result<Hash32, PowError> {
        match variant {
            Variant::V1 => Ok(self.hash(input)),
            Variant::V2 => Ok(self.hash2(input)),
            Variant::V2b => Ok(self.hash2b(input)),
            Variant::V2b1 => Ok(self.hash2b1(input)),
            Variant::V2b2 => self.hash2b2(input),
        }
    }

    /// Boundary helper: decode hex (optional `0x` prefix) and run `variant`.
    pub fn digest_hex(&self, variant: Variant, input: &str) -> Result<Hash32, PowError> {
        let input = input.strip_prefix("0x").unwrap_or(input);
        let mut bytes =
            hex::decode(input).map_err(|_| PowError::InvalidArgument("input is not valid hex"))?;
        self.digest(variant, &mut bytes)
    }
}

/// [`HashDispatcher::hash`] with the portable compressors.
pub fn hash(input: &[u8]) -> Hash32 {
    HashDispatcher::<PortableV1, PortableV2>::default().hash(input)
}

/// [`HashDispatcher::hash2`] with the portable compressors.
pub fn hash2(input: &[u8]) -> Hash32 {
    HashDispatcher::<PortableV1, PortableV2>::default().hash2(input)
}

/// [`HashDispatcher::hash2b`] with the portable compressors.
pub fn hash2b(input: &[u8]) -> Hash32 {
    HashDispatcher::<PortableV1, PortableV2>::default().hash2b(input)
}

/// [`HashDispatcher::hash2b1`] with the portable compressors.
pub fn hash2b1(input: &[u8]) -> Hash32 {
    HashDispatcher::<PortableV1, PortableV2>::default().hash2b1(input)
}

/// [`HashDispatcher::hash2b2`] with the portable compressors.
pub fn hash2b2(input: &mut [u8]) -> Result<Hash32, PowError> {
    HashDispatcher::<PortableV1, PortableV2>::default().hash2b2(input)
}

//! Algorithm registry.
//!
//! Every serialized key, signature and credential starts with a one-byte
//! algorithm id, and every protocol entry point dispatches on it. The
//! registry is the closed [`Algorithm`] enum: in-process the id cannot be
//! out of range, and on the parse path an unregistered byte is rejected as
//! [`Error::UnknownAlgorithm`] before any payload is touched.
//!
//! All length functions below are derivable from the id alone (plus, for
//! the hierarchical scheme, the delegation level), without materializing a
//! key; callers use them to size wire buffers before parsing.

use crate::error::{Error, Result};
use crate::group::{POINT_LEN, SCALAR_LEN};

/// Registered identification schemes, tagged by wire id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Algorithm {
    /// Single-secret Schnorr IBI
    Heng04 = 0,
    /// Twin-secret Schnorr IBI (two independent bases)
    Chin15 = 1,
    /// Hierarchical IBI chained from twin-secret signatures
    Vangujar19 = 2,
    /// Group IBI with a shared second base and derivable member keys
    Ancygibi = 3,
}

impl Algorithm {
    /// All registered algorithms, in wire-id order
    pub const ALL: [Algorithm; 4] = [
        Algorithm::Heng04,
        Algorithm::Chin15,
        Algorithm::Vangujar19,
        Algorithm::Ancygibi,
    ];

    /// Wire identifier byte
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Parse a wire identifier. The byte is untrusted input here; an
    /// unregistered value is a recoverable error, not a panic.
    pub fn from_id(id: u8) -> Result<Self> {
        match id {
            0 => Ok(Algorithm::Heng04),
            1 => Ok(Algorithm::Chin15),
            2 => Ok(Algorithm::Vangujar19),
            3 => Ok(Algorithm::Ancygibi),
            other => Err(Error::UnknownAlgorithm(other)),
        }
    }

    /// Whether credentials of this scheme carry a delegation chain
    pub fn is_hierarchical(self) -> bool {
        matches!(self, Algorithm::Vangujar19)
    }

    /// Scheme-specific secret payload width (without the 2-byte key header)
    fn secret_payload_len(self) -> usize {
        match self {
            // a, A
            Algorithm::Heng04 => SCALAR_LEN + POINT_LEN,
            // a1, a2, A, B2
            Algorithm::Chin15 | Algorithm::Vangujar19 => 2 * SCALAR_LEN + 2 * POINT_LEN,
            // a, A, A2, B2
            Algorithm::Ancygibi => SCALAR_LEN + 3 * POINT_LEN,
        }
    }

    /// Scheme-specific public payload width (without the 2-byte key header)
    fn public_payload_len(self) -> usize {
        match self {
            Algorithm::Heng04 => POINT_LEN,
            Algorithm::Chin15 | Algorithm::Vangujar19 => 2 * POINT_LEN,
            Algorithm::Ancygibi => 3 * POINT_LEN,
        }
    }

    /// Serialized secret-key length, envelope included
    pub fn secret_key_len(self) -> usize {
        2 + self.secret_payload_len()
    }

    /// Serialized public-key length, envelope included
    pub fn public_key_len(self) -> usize {
        2 + self.public_payload_len()
    }

    /// Serialized signature length, envelope included. For the hierarchical
    /// scheme this is the level-0 (root) width; see [`Self::signature_len_at`].
    pub fn signature_len(self) -> usize {
        self.signature_len_at(0)
    }

    /// Serialized signature length at a delegation level
    pub fn signature_len_at(self, level: usize) -> usize {
        match self {
            // s, x, U
            Algorithm::Heng04 => 1 + 2 * SCALAR_LEN + POINT_LEN,
            // s1, s2, x, U, B2
            Algorithm::Chin15 => 1 + 3 * SCALAR_LEN + 2 * POINT_LEN,
            // level byte, (x_l, U_l) per level, s1, s2, A, B2
            Algorithm::Vangujar19 => {
                1 + 1 + (level + 1) * (SCALAR_LEN + POINT_LEN) + 2 * SCALAR_LEN + 2 * POINT_LEN
            }
            // s, x, U, V
            Algorithm::Ancygibi => 1 + 2 * SCALAR_LEN + 2 * POINT_LEN,
        }
    }

    /// Credential length for an identity of `identity_len` bytes at a level
    pub fn user_key_len(self, level: usize, identity_len: usize) -> usize {
        self.signature_len_at(level) + identity_len
    }

    /// Protocol commitment length. `level` is only significant for the
    /// hierarchical scheme, where the commitment carries the per-level
    /// precomputed points; both ends derive it without a key (the prover
    /// from its credential, the verifier from the claimed identity).
    pub fn commitment_len(self, level: usize) -> usize {
        match self {
            // U, V
            Algorithm::Heng04 => 2 * POINT_LEN,
            // U, T
            Algorithm::Chin15 => 2 * POINT_LEN,
            // U_0..U_level, T
            Algorithm::Vangujar19 => (level + 2) * POINT_LEN,
            // U, V, W
            Algorithm::Ancygibi => 3 * POINT_LEN,
        }
    }

    /// Protocol challenge length (one scalar for every scheme)
    pub fn challenge_len(self) -> usize {
        SCALAR_LEN
    }

    /// Protocol response length
    pub fn response_len(self) -> usize {
        match self {
            Algorithm::Heng04 | Algorithm::Ancygibi => SCALAR_LEN,
            Algorithm::Chin15 | Algorithm::Vangujar19 => 2 * SCALAR_LEN,
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Algorithm::Heng04 => "heng04",
            Algorithm::Chin15 => "chin15",
            Algorithm::Vangujar19 => "vangujar19",
            Algorithm::Ancygibi => "ancygibi",
        };
        f.write_str(name)
    }
}

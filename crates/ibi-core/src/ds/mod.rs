//! Digital-signature layer.
//!
//! Keys and signatures are tagged values: a closed payload enum chosen by
//! the algorithm, carried on the wire behind a one-byte algorithm id. The
//! variant fixes the algorithm, so a key can never disagree with its own
//! payload; cross-object disagreement (verifying a chin15 signature with a
//! heng04 key) falls out of dispatch as [`Error::AlgorithmMismatch`].
//!
//! Wire envelopes:
//! - key: `[algorithm:1][type:1][payload]` with type `0` secret, `1` public
//! - signature: `[algorithm:1][payload]`

pub(crate) mod schnorr;
pub(crate) mod twin;

use crate::group::{Reader, Writer};
use crate::ibi::vangujar19;
use crate::{gibi, Algorithm, Error, Result};
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

const KEY_SECRET: u8 = 0;
const KEY_PUBLIC: u8 = 1;

#[derive(Clone, Zeroize)]
pub(crate) enum SecretPayload {
    Heng04(schnorr::Secret),
    Chin15(twin::Secret),
    Vangujar19(twin::Secret),
    Ancygibi(gibi::Secret),
}

#[derive(Clone, Debug)]
pub(crate) enum PublicPayload {
    Heng04(RistrettoPoint),
    Chin15 {
        big_a: RistrettoPoint,
        b2: RistrettoPoint,
    },
    Vangujar19 {
        big_a: RistrettoPoint,
        b2: RistrettoPoint,
    },
    Ancygibi {
        big_a: RistrettoPoint,
        big_a2: RistrettoPoint,
        b2: RistrettoPoint,
    },
}

#[derive(Clone, Zeroize)]
pub(crate) enum SignaturePayload {
    Heng04(schnorr::Signature),
    Chin15(twin::Signature),
    Vangujar19(ChainSig),
    Ancygibi(gibi::Signature),
}

/// Hierarchical signature: one `(x, U)` link per delegation level plus the
/// running twin responses. Level 0 is a plain twin signature in a different
/// coat.
#[derive(Clone, Zeroize)]
pub(crate) struct ChainSig {
    pub links: Vec<ChainLink>,
    pub s1: Scalar,
    pub s2: Scalar,
    /// Master public point, embedded so delegation needs no key at hand
    pub big_a: RistrettoPoint,
    pub b2: RistrettoPoint,
}

#[derive(Clone, Zeroize)]
pub(crate) struct ChainLink {
    pub x: Scalar,
    pub u: RistrettoPoint,
}

impl ChainSig {
    pub(crate) fn root(sig: twin::Signature, big_a: RistrettoPoint) -> Self {
        ChainSig {
            links: vec![ChainLink { x: sig.x, u: sig.u }],
            s1: sig.s1,
            s2: sig.s2,
            big_a,
            b2: sig.b2,
        }
    }

    /// Delegation depth: 0 for a root-issued signature
    pub(crate) fn level(&self) -> usize {
        self.links.len() - 1
    }

    fn write(&self, w: &mut Writer) {
        w.byte(self.level() as u8);
        for link in &self.links {
            w.scalar(&link.x).point(&link.u);
        }
        w.scalar(&self.s1)
            .scalar(&self.s2)
            .point(&self.big_a)
            .point(&self.b2);
    }

    fn read(r: &mut Reader) -> Result<Self> {
        let level = r.byte()? as usize;
        let mut links = Vec::with_capacity(level + 1);
        for _ in 0..=level {
            links.push(ChainLink {
                x: r.scalar()?,
                u: r.point()?,
            });
        }
        Ok(ChainSig {
            links,
            s1: r.scalar()?,
            s2: r.scalar()?,
            big_a: r.point()?,
            b2: r.point()?,
        })
    }
}

/// Master (or member) secret key of one registered algorithm.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    payload: SecretPayload,
}

/// Public half of a [`SecretKey`].
#[derive(Clone)]
pub struct PublicKey {
    payload: PublicPayload,
}

/// Signature produced by [`SecretKey::sign`]. Carries response scalars, so
/// it is treated as secret material and wiped on drop; a credential is one
/// of these bound to an identity.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DsSignature {
    payload: SignaturePayload,
}

impl SecretKey {
    /// Generate a fresh master key pair for `algorithm`.
    pub fn generate(algorithm: Algorithm) -> Self {
        let payload = match algorithm {
            Algorithm::Heng04 => SecretPayload::Heng04(schnorr::generate()),
            Algorithm::Chin15 => SecretPayload::Chin15(twin::generate()),
            Algorithm::Vangujar19 => SecretPayload::Vangujar19(twin::generate()),
            Algorithm::Ancygibi => SecretPayload::Ancygibi(gibi::generate()),
        };
        SecretKey { payload }
    }

    pub(crate) fn from_payload(payload: SecretPayload) -> Self {
        SecretKey { payload }
    }

    pub(crate) fn payload(&self) -> &SecretPayload {
        &self.payload
    }

    pub fn algorithm(&self) -> Algorithm {
        match self.payload {
            SecretPayload::Heng04(_) => Algorithm::Heng04,
            SecretPayload::Chin15(_) => Algorithm::Chin15,
            SecretPayload::Vangujar19(_) => Algorithm::Vangujar19,
            SecretPayload::Ancygibi(_) => Algorithm::Ancygibi,
        }
    }

    /// Derive the public half.
    pub fn public_key(&self) -> PublicKey {
        let payload = match &self.payload {
            SecretPayload::Heng04(sk) => PublicPayload::Heng04(sk.big_a),
            SecretPayload::Chin15(sk) => PublicPayload::Chin15 {
                big_a: sk.big_a,
                b2: sk.b2,
            },
            SecretPayload::Vangujar19(sk) => PublicPayload::Vangujar19 {
                big_a: sk.big_a,
                b2: sk.b2,
            },
            SecretPayload::Ancygibi(sk) => PublicPayload::Ancygibi {
                big_a: sk.big_a,
                big_a2: sk.big_a2,
                b2: sk.b2,
            },
        };
        PublicKey { payload }
    }

    /// Sign a message. For the hierarchical algorithm this produces the
    /// level-0 link of a credential chain.
    pub fn sign(&self, message: &[u8]) -> DsSignature {
        let payload = match &self.payload {
            SecretPayload::Heng04(sk) => SignaturePayload::Heng04(schnorr::sign(sk, message)),
            SecretPayload::Chin15(sk) => SignaturePayload::Chin15(twin::sign(sk, message)),
            SecretPayload::Vangujar19(sk) => {
                SignaturePayload::Vangujar19(ChainSig::root(twin::sign(sk, message), sk.big_a))
            }
            SecretPayload::Ancygibi(sk) => SignaturePayload::Ancygibi(gibi::sign(sk, message)),
        };
        DsSignature { payload }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let alg = self.algorithm();
        let mut w = Writer::with_capacity(alg.secret_key_len());
        w.byte(alg.id()).byte(KEY_SECRET);
        match &self.payload {
            SecretPayload::Heng04(sk) => sk.write(&mut w),
            SecretPayload::Chin15(sk) | SecretPayload::Vangujar19(sk) => sk.write(&mut w),
            SecretPayload::Ancygibi(sk) => sk.write(&mut w),
        }
        w.finish()
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        let mut r = Reader::new(buf);
        let alg = Algorithm::from_id(r.byte()?)?;
        if r.byte()? != KEY_SECRET {
            return Err(Error::Encoding("not a secret key".into()));
        }
        let payload = match alg {
            Algorithm::Heng04 => SecretPayload::Heng04(schnorr::Secret::read(&mut r)?),
            Algorithm::Chin15 => SecretPayload::Chin15(twin::Secret::read(&mut r)?),
            Algorithm::Vangujar19 => SecretPayload::Vangujar19(twin::Secret::read(&mut r)?),
            Algorithm::Ancygibi => SecretPayload::Ancygibi(gibi::Secret::read(&mut r)?),
        };
        Ok(SecretKey { payload })
    }
}

impl PublicKey {
    pub(crate) fn payload(&self) -> &PublicPayload {
        &self.payload
    }

    pub fn algorithm(&self) -> Algorithm {
        match self.payload {
            PublicPayload::Heng04(_) => Algorithm::Heng04,
            PublicPayload::Chin15 { .. } => Algorithm::Chin15,
            PublicPayload::Vangujar19 { .. } => Algorithm::Vangujar19,
            PublicPayload::Ancygibi { .. } => Algorithm::Ancygibi,
        }
    }

    /// Verify a signature over `message`. Algorithm disagreement between
    /// key and signature is reported as such, never silently rejected.
    pub fn verify(&self, message: &[u8], sig: &DsSignature) -> Result<()> {
        match (&self.payload, &sig.payload) {
            (PublicPayload::Heng04(big_a), SignaturePayload::Heng04(s)) => {
                schnorr::verify(big_a, message, s)
            }
            (PublicPayload::Chin15 { big_a, b2 }, SignaturePayload::Chin15(s)) => {
                twin::verify(big_a, b2, message, s)
            }
            (PublicPayload::Vangujar19 { big_a, b2 }, SignaturePayload::Vangujar19(chain)) => {
                vangujar19::chain_verify(big_a, b2, message, chain)
            }
            (
                PublicPayload::Ancygibi {
                    big_a,
                    big_a2,
                    b2,
                },
                SignaturePayload::Ancygibi(s),
            ) => gibi::verify(big_a, big_a2, b2, message, s),
            _ => Err(Error::AlgorithmMismatch {
                expected: self.algorithm(),
                actual: sig.algorithm(),
            }),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let alg = self.algorithm();
        let mut w = Writer::with_capacity(alg.public_key_len());
        w.byte(alg.id()).byte(KEY_PUBLIC);
        match &self.payload {
            PublicPayload::Heng04(big_a) => {
                w.point(big_a);
            }
            PublicPayload::Chin15 { big_a, b2 } | PublicPayload::Vangujar19 { big_a, b2 } => {
                w.point(big_a).point(b2);
            }
            PublicPayload::Ancygibi { big_a, big_a2, b2 } => {
                w.point(big_a).point(big_a2).point(b2);
            }
        }
        w.finish()
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        let mut r = Reader::new(buf);
        let alg = Algorithm::from_id(r.byte()?)?;
        if r.byte()? != KEY_PUBLIC {
            return Err(Error::Encoding("not a public key".into()));
        }
        let payload = match alg {
            Algorithm::Heng04 => PublicPayload::Heng04(r.point()?),
            Algorithm::Chin15 => PublicPayload::Chin15 {
                big_a: r.point()?,
                b2: r.point()?,
            },
            Algorithm::Vangujar19 => PublicPayload::Vangujar19 {
                big_a: r.point()?,
                b2: r.point()?,
            },
            Algorithm::Ancygibi => PublicPayload::Ancygibi {
                big_a: r.point()?,
                big_a2: r.point()?,
                b2: r.point()?,
            },
        };
        Ok(PublicKey { payload })
    }
}

impl DsSignature {
    pub(crate) fn from_payload(payload: SignaturePayload) -> Self {
        DsSignature { payload }
    }

    pub(crate) fn payload(&self) -> &SignaturePayload {
        &self.payload
    }

    pub fn algorithm(&self) -> Algorithm {
        match self.payload {
            SignaturePayload::Heng04(_) => Algorithm::Heng04,
            SignaturePayload::Chin15(_) => Algorithm::Chin15,
            SignaturePayload::Vangujar19(_) => Algorithm::Vangujar19,
            SignaturePayload::Ancygibi(_) => Algorithm::Ancygibi,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let alg = self.algorithm();
        let mut w = Writer::with_capacity(alg.signature_len_at(self.level()));
        w.byte(alg.id());
        self.write_payload(&mut w);
        w.finish()
    }

    pub(crate) fn level(&self) -> usize {
        match &self.payload {
            SignaturePayload::Vangujar19(chain) => chain.level(),
            _ => 0,
        }
    }

    pub(crate) fn write_payload(&self, w: &mut Writer) {
        match &self.payload {
            SignaturePayload::Heng04(s) => s.write(w),
            SignaturePayload::Chin15(s) => s.write(w),
            SignaturePayload::Vangujar19(chain) => chain.write(w),
            SignaturePayload::Ancygibi(s) => s.write(w),
        }
    }

    pub(crate) fn read_payload(alg: Algorithm, r: &mut Reader) -> Result<SignaturePayload> {
        Ok(match alg {
            Algorithm::Heng04 => SignaturePayload::Heng04(schnorr::Signature::read(r)?),
            Algorithm::Chin15 => SignaturePayload::Chin15(twin::Signature::read(r)?),
            Algorithm::Vangujar19 => SignaturePayload::Vangujar19(ChainSig::read(r)?),
            Algorithm::Ancygibi => SignaturePayload::Ancygibi(gibi::Signature::read(r)?),
        })
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        let mut r = Reader::new(buf);
        let alg = Algorithm::from_id(r.byte()?)?;
        let payload = Self::read_payload(alg, &mut r)?;
        Ok(DsSignature { payload })
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("algorithm", &self.algorithm())
            .field("bytes", &hex::encode(self.to_bytes()))
            .finish()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("algorithm", &self.algorithm())
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for DsSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DsSignature")
            .field("algorithm", &self.algorithm())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_all_algorithms() {
        for alg in Algorithm::ALL {
            let sk = SecretKey::generate(alg);
            let pk = sk.public_key();
            let sig = sk.sign(b"message");
            pk.verify(b"message", &sig).unwrap();
            assert!(matches!(
                pk.verify(b"other", &sig),
                Err(Error::Verification)
            ));
        }
    }

    #[test]
    fn key_and_signature_round_trips() {
        for alg in Algorithm::ALL {
            let sk = SecretKey::generate(alg);
            let pk = sk.public_key();
            let sig = sk.sign(b"message");

            let sk_bytes = sk.to_bytes();
            assert_eq!(sk_bytes.len(), alg.secret_key_len());
            assert_eq!(SecretKey::from_bytes(&sk_bytes).unwrap().to_bytes(), sk_bytes);

            let pk_bytes = pk.to_bytes();
            assert_eq!(pk_bytes.len(), alg.public_key_len());
            assert_eq!(PublicKey::from_bytes(&pk_bytes).unwrap().to_bytes(), pk_bytes);

            let sig_bytes = sig.to_bytes();
            assert_eq!(sig_bytes.len(), alg.signature_len());
            let parsed = DsSignature::from_bytes(&sig_bytes).unwrap();
            assert_eq!(parsed.to_bytes(), sig_bytes);
            pk.verify(b"message", &parsed).unwrap();
        }
    }

    #[test]
    fn cross_algorithm_verify_is_mismatch() {
        let sig = SecretKey::generate(Algorithm::Heng04).sign(b"m");
        let pk = SecretKey::generate(Algorithm::Chin15).public_key();
        assert!(matches!(
            pk.verify(b"m", &sig),
            Err(Error::AlgorithmMismatch {
                expected: Algorithm::Chin15,
                actual: Algorithm::Heng04
            })
        ));
    }

    #[test]
    fn signatures_use_fresh_nonces() {
        for alg in Algorithm::ALL {
            let sk = SecretKey::generate(alg);
            let mut seen = std::collections::HashSet::new();
            for _ in 0..16 {
                assert!(seen.insert(sk.sign(b"m").to_bytes()));
            }
        }
    }

    #[test]
    fn truncated_key_is_buffer_error() {
        let bytes = SecretKey::generate(Algorithm::Chin15).to_bytes();
        assert!(matches!(
            SecretKey::from_bytes(&bytes[..bytes.len() - 1]),
            Err(Error::Buffer { .. })
        ));
    }

    #[test]
    fn key_type_bytes_are_checked() {
        let sk = SecretKey::generate(Algorithm::Heng04);
        assert!(matches!(
            PublicKey::from_bytes(&sk.to_bytes()),
            Err(Error::Encoding(_))
        ));
        assert!(matches!(
            SecretKey::from_bytes(&sk.public_key().to_bytes()),
            Err(Error::Encoding(_))
        ));
    }

    #[test]
    fn unknown_algorithm_byte_is_rejected() {
        let mut bytes = SecretKey::generate(Algorithm::Heng04).to_bytes();
        bytes[0] = 9;
        assert!(matches!(
            SecretKey::from_bytes(&bytes),
            Err(Error::UnknownAlgorithm(9))
        ));
    }
}

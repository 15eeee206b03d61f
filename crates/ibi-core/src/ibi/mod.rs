//! Identification transform.
//!
//! Any of the registered signature schemes becomes an identification
//! scheme the same way: the issuer signs the identity string and hands the
//! signature over as the credential; the holder then proves possession in
//! a three-move commit/challenge/response exchange against the master
//! public key. The exchange never reveals the credential.
//!
//! Sessions are single use. `commit` and `challenge` consume the builder
//! and `respond`/`decide` consume the session, so replaying a state or
//! feeding two challenges into one commitment does not typecheck. Session
//! secrets are wiped on drop, abandoned exchanges included.

mod chin15;
mod heng04;
pub(crate) mod vangujar19;

use crate::ds::SignaturePayload;
use crate::group::{self, Reader, Writer, SCALAR_LEN};
use crate::{gibi, Algorithm, DsSignature, Error, PublicKey, Result, SecretKey, FQN_SEPARATOR};
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use std::fmt;
use tracing::{debug, instrument};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Delegation depth encoded by an identity: its separator count. Zero for
/// every non-hierarchical identity.
pub fn name_level(identity: &[u8]) -> usize {
    identity.iter().filter(|&&b| b == FQN_SEPARATOR).count()
}

/// A credential: a signature bound to exactly one identity. Serialized as
/// `[algorithm:1][signature payload][identity]`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct UserKey {
    signature: DsSignature,
    identity: Vec<u8>,
}

impl UserKey {
    pub(crate) fn from_parts(signature: DsSignature, identity: Vec<u8>) -> Self {
        UserKey {
            signature,
            identity,
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.signature.algorithm()
    }

    /// The identity this credential is bound to.
    pub fn identity(&self) -> &[u8] {
        &self.identity
    }

    /// The fully-qualified name: for a hierarchical credential the dotted
    /// accumulated name, otherwise the plain identity.
    pub fn fqn(&self) -> &[u8] {
        &self.identity
    }

    /// Delegation depth; zero for non-hierarchical credentials.
    pub fn level(&self) -> usize {
        self.signature.level()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let alg = self.algorithm();
        let mut w = Writer::with_capacity(alg.user_key_len(self.level(), self.identity.len()));
        w.byte(alg.id());
        self.signature.write_payload(&mut w);
        w.bytes(&self.identity);
        w.finish()
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        let mut r = Reader::new(buf);
        let alg = Algorithm::from_id(r.byte()?)?;
        let payload = DsSignature::read_payload(alg, &mut r)?;
        let identity = r.rest().to_vec();
        if identity.is_empty() {
            return Err(Error::Identity("credential carries no identity".into()));
        }
        if let SignaturePayload::Vangujar19(chain) = &payload {
            if name_level(&identity) != chain.level() {
                return Err(Error::Identity(
                    "name depth does not match credential level".into(),
                ));
            }
        }
        Ok(UserKey {
            signature: DsSignature::from_payload(payload),
            identity,
        })
    }
}

impl fmt::Debug for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserKey")
            .field("algorithm", &self.algorithm())
            .field("identity", &String::from_utf8_lossy(&self.identity))
            .field("level", &self.level())
            .finish_non_exhaustive()
    }
}

/// Issue a credential for `identity` under the master secret key.
#[instrument(skip_all, fields(algorithm = %msk.algorithm()))]
pub fn issue(msk: &SecretKey, identity: &[u8]) -> Result<UserKey> {
    if identity.is_empty() {
        return Err(Error::Identity("empty identity".into()));
    }
    if msk.algorithm().is_hierarchical() && identity.contains(&FQN_SEPARATOR) {
        return Err(Error::Identity(
            "root identity must not contain the separator".into(),
        ));
    }
    let signature = msk.sign(identity);
    debug!(identity_len = identity.len(), "issued credential");
    Ok(UserKey {
        signature,
        identity: identity.to_vec(),
    })
}

/// Check that a credential was issued under the given master public key
/// for exactly the identity it claims.
#[instrument(skip_all, fields(algorithm = %mpk.algorithm()))]
pub fn validate(mpk: &PublicKey, credential: &UserKey) -> Result<()> {
    mpk.verify(&credential.identity, &credential.signature)
}

/// Extend a hierarchical credential by one level under a child name. The
/// child's fully-qualified name is `parent.fqn() + "." + name`.
#[instrument(skip_all, fields(level = parent.level()))]
pub fn delegate(parent: &UserKey, name: &[u8]) -> Result<UserKey> {
    let SignaturePayload::Vangujar19(chain) = parent.signature.payload() else {
        return Err(Error::Unsupported(
            "delegation requires a hierarchical credential",
        ));
    };
    vangujar19::delegate(chain, &parent.identity, name)
}

/// Per-scheme session scalars held by a prover between commit and respond.
#[derive(Zeroize, ZeroizeOnDrop)]
enum Secrets {
    Single {
        s: Scalar,
        t: Scalar,
    },
    Twin {
        s1: Scalar,
        s2: Scalar,
        t1: Scalar,
        t2: Scalar,
    },
}

/// Prover half of the exchange, armed with a credential.
pub struct Prover {
    key: UserKey,
}

/// Prover after committing; consumed by [`ProverSession::respond`].
pub struct ProverSession {
    secrets: Secrets,
}

impl Prover {
    pub fn new(credential: &UserKey) -> Result<Self> {
        Ok(Prover {
            key: credential.clone(),
        })
    }

    /// Produce the commitment message and the armed session.
    pub fn commit(self) -> Result<(ProverSession, Vec<u8>)> {
        let (secrets, commitment) = match self.key.signature.payload() {
            SignaturePayload::Heng04(sig) => {
                let (t, cmt) = heng04::commit(sig);
                (Secrets::Single { s: sig.s, t }, cmt)
            }
            SignaturePayload::Chin15(sig) => {
                let (t1, t2, cmt) = chin15::commit(sig);
                (
                    Secrets::Twin {
                        s1: sig.s1,
                        s2: sig.s2,
                        t1,
                        t2,
                    },
                    cmt,
                )
            }
            SignaturePayload::Vangujar19(chain) => {
                let (t1, t2, cmt) = vangujar19::commit(chain);
                (
                    Secrets::Twin {
                        s1: chain.s1,
                        s2: chain.s2,
                        t1,
                        t2,
                    },
                    cmt,
                )
            }
            SignaturePayload::Ancygibi(sig) => {
                let (t, cmt) = gibi::commit(sig);
                (Secrets::Single { s: sig.s, t }, cmt)
            }
        };
        Ok((ProverSession { secrets }, commitment))
    }
}

impl ProverSession {
    /// Answer the challenge. Consumes the session; the scalars are wiped.
    pub fn respond(self, challenge: &[u8]) -> Result<Vec<u8>> {
        let mut r = Reader::new(challenge);
        let c = r.scalar()?;
        if r.remaining() != 0 {
            return Err(Error::Buffer {
                expected: SCALAR_LEN,
                actual: challenge.len(),
            });
        }
        let mut w = Writer::with_capacity(2 * SCALAR_LEN);
        match &self.secrets {
            Secrets::Single { s, t } => {
                w.scalar(&(c * s + t));
            }
            Secrets::Twin { s1, s2, t1, t2 } => {
                w.scalar(&(c * s1 + t1)).scalar(&(c * s2 + t2));
            }
        }
        Ok(w.finish())
    }
}

/// Parsed commitment held by a verifier, together with the public points
/// needed for the decision.
enum Pending {
    Heng04 {
        big_a: RistrettoPoint,
        u: RistrettoPoint,
        v: RistrettoPoint,
    },
    Chin15 {
        big_a: RistrettoPoint,
        b2: RistrettoPoint,
        u: RistrettoPoint,
        big_t: RistrettoPoint,
    },
    Vangujar19 {
        big_a: RistrettoPoint,
        b2: RistrettoPoint,
        us: Vec<RistrettoPoint>,
        big_t: RistrettoPoint,
    },
    Ancygibi {
        big_a: RistrettoPoint,
        big_a2: RistrettoPoint,
        u: RistrettoPoint,
        v: RistrettoPoint,
        w: RistrettoPoint,
    },
}

/// Verifier half of the exchange, armed with the master public key and the
/// claimed identity.
pub struct Verifier {
    mpk: PublicKey,
    identity: Vec<u8>,
}

/// Verifier after challenging; consumed by [`VerifierSession::decide`].
pub struct VerifierSession {
    identity: Vec<u8>,
    pending: Pending,
    c: Scalar,
}

impl Verifier {
    pub fn new(mpk: &PublicKey, identity: &[u8]) -> Result<Self> {
        if identity.is_empty() {
            return Err(Error::Identity("empty identity".into()));
        }
        Ok(Verifier {
            mpk: mpk.clone(),
            identity: identity.to_vec(),
        })
    }

    /// Consume the commitment, emit a fresh random challenge.
    pub fn challenge(self, commitment: &[u8]) -> Result<(VerifierSession, Vec<u8>)> {
        let alg = self.mpk.algorithm();
        let level = name_level(&self.identity);
        let expected = alg.commitment_len(level);
        if commitment.len() != expected {
            return Err(Error::Buffer {
                expected,
                actual: commitment.len(),
            });
        }
        let mut r = Reader::new(commitment);
        let pending = match self.mpk.payload() {
            crate::ds::PublicPayload::Heng04(big_a) => Pending::Heng04 {
                big_a: *big_a,
                u: r.point()?,
                v: r.point()?,
            },
            crate::ds::PublicPayload::Chin15 { big_a, b2 } => Pending::Chin15 {
                big_a: *big_a,
                b2: *b2,
                u: r.point()?,
                big_t: r.point()?,
            },
            crate::ds::PublicPayload::Vangujar19 { big_a, b2 } => {
                let mut us = Vec::with_capacity(level + 1);
                for _ in 0..=level {
                    us.push(r.point()?);
                }
                Pending::Vangujar19 {
                    big_a: *big_a,
                    b2: *b2,
                    us,
                    big_t: r.point()?,
                }
            }
            crate::ds::PublicPayload::Ancygibi { big_a, big_a2, .. } => Pending::Ancygibi {
                big_a: *big_a,
                big_a2: *big_a2,
                u: r.point()?,
                v: r.point()?,
                w: r.point()?,
            },
        };
        let c = group::random_scalar();
        let mut w = Writer::with_capacity(SCALAR_LEN);
        w.scalar(&c);
        Ok((
            VerifierSession {
                identity: self.identity,
                pending,
                c,
            },
            w.finish(),
        ))
    }
}

impl VerifierSession {
    /// Consume the response and decide. Rejection is an ordinary error.
    pub fn decide(self, response: &[u8]) -> Result<()> {
        let mut r = Reader::new(response);
        let result = match &self.pending {
            Pending::Heng04 { big_a, u, v } => {
                let y = r.scalar()?;
                heng04::check(big_a, &self.identity, u, v, &self.c, &y)
            }
            Pending::Chin15 {
                big_a,
                b2,
                u,
                big_t,
            } => {
                let y1 = r.scalar()?;
                let y2 = r.scalar()?;
                chin15::check(big_a, b2, &self.identity, u, big_t, &self.c, &y1, &y2)
            }
            Pending::Vangujar19 {
                big_a,
                b2,
                us,
                big_t,
            } => {
                let y1 = r.scalar()?;
                let y2 = r.scalar()?;
                vangujar19::check(big_a, b2, &self.identity, us, big_t, &self.c, &y1, &y2)
            }
            Pending::Ancygibi {
                big_a,
                big_a2,
                u,
                v,
                w,
            } => {
                let y = r.scalar()?;
                gibi::check(big_a, big_a2, &self.identity, u, v, w, &self.c, &y)
            }
        };
        if r.remaining() != 0 {
            return Err(Error::Buffer {
                expected: response.len() - r.remaining(),
                actual: response.len(),
            });
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_protocol(mpk: &PublicKey, credential: &UserKey, identity: &[u8]) -> Result<()> {
        let (prover, cmt) = Prover::new(credential)?.commit()?;
        let (verifier, cha) = Verifier::new(mpk, identity)?.challenge(&cmt)?;
        let response = prover.respond(&cha)?;
        verifier.decide(&response)
    }

    #[test]
    fn alice_identifies_herself() {
        let msk = SecretKey::generate(Algorithm::Heng04);
        let mpk = msk.public_key();
        let credential = issue(&msk, b"alice").unwrap();
        validate(&mpk, &credential).unwrap();
        run_protocol(&mpk, &credential, b"alice").unwrap();

        // a corrupted response must not pass
        let (prover, cmt) = Prover::new(&credential).unwrap().commit().unwrap();
        let (verifier, cha) = Verifier::new(&mpk, b"alice")
            .unwrap()
            .challenge(&cmt)
            .unwrap();
        let mut response = prover.respond(&cha).unwrap();
        response[0] ^= 0x01;
        assert!(verifier.decide(&response).is_err());
    }

    #[test]
    fn protocol_completes_for_every_algorithm() {
        for alg in Algorithm::ALL {
            let msk = SecretKey::generate(alg);
            let mpk = msk.public_key();
            let credential = issue(&msk, b"alice").unwrap();
            validate(&mpk, &credential).unwrap();
            run_protocol(&mpk, &credential, b"alice").unwrap();
        }
    }

    #[test]
    fn wrong_identity_is_rejected() {
        let msk = SecretKey::generate(Algorithm::Chin15);
        let mpk = msk.public_key();
        let credential = issue(&msk, b"alice").unwrap();
        assert!(matches!(
            run_protocol(&mpk, &credential, b"bob"),
            Err(Error::Verification)
        ));
    }

    #[test]
    fn credential_round_trips() {
        for alg in Algorithm::ALL {
            let msk = SecretKey::generate(alg);
            let credential = issue(&msk, b"alice").unwrap();
            let bytes = credential.to_bytes();
            assert_eq!(bytes.len(), alg.user_key_len(0, b"alice".len()));
            let parsed = UserKey::from_bytes(&bytes).unwrap();
            assert_eq!(parsed.to_bytes(), bytes);
            assert_eq!(parsed.identity(), b"alice");
            validate(&msk.public_key(), &parsed).unwrap();
        }
    }

    #[test]
    fn single_bit_tamper_rejects_and_reverts() {
        for alg in Algorithm::ALL {
            let msk = SecretKey::generate(alg);
            let mpk = msk.public_key();
            let mut bytes = issue(&msk, b"alice").unwrap().to_bytes();
            for idx in [2, bytes.len() / 2, bytes.len() - 1] {
                bytes[idx] ^= 0x01;
                // either the envelope no longer parses or validation rejects
                let rejected = match UserKey::from_bytes(&bytes) {
                    Err(_) => true,
                    Ok(tampered) => validate(&mpk, &tampered).is_err(),
                };
                assert!(rejected, "{alg} byte {idx}");
                bytes[idx] ^= 0x01;
                validate(&mpk, &UserKey::from_bytes(&bytes).unwrap()).unwrap();
            }
        }
    }

    #[test]
    fn cross_algorithm_validate_is_mismatch() {
        let credential = issue(&SecretKey::generate(Algorithm::Heng04), b"alice").unwrap();
        let mpk = SecretKey::generate(Algorithm::Chin15).public_key();
        assert!(matches!(
            validate(&mpk, &credential),
            Err(Error::AlgorithmMismatch { .. })
        ));
    }

    #[test]
    fn empty_identity_is_rejected() {
        let msk = SecretKey::generate(Algorithm::Heng04);
        assert!(matches!(issue(&msk, b""), Err(Error::Identity(_))));
        assert!(matches!(
            Verifier::new(&msk.public_key(), b""),
            Err(Error::Identity(_))
        ));
    }

    #[test]
    fn malformed_commitment_length_is_buffer_error() {
        let msk = SecretKey::generate(Algorithm::Heng04);
        let verifier = Verifier::new(&msk.public_key(), b"alice").unwrap();
        assert!(matches!(
            verifier.challenge(&[0u8; 63]),
            Err(Error::Buffer {
                expected: 64,
                actual: 63
            })
        ));
    }

    #[test]
    fn hierarchy_delegates_to_level_two() {
        let msk = SecretKey::generate(Algorithm::Vangujar19);
        let mpk = msk.public_key();

        let root = issue(&msk, b"corp").unwrap();
        validate(&mpk, &root).unwrap();

        let child = delegate(&root, b"eng").unwrap();
        let grandchild = delegate(&child, b"dev").unwrap();
        assert_eq!(grandchild.fqn(), b"corp.eng.dev");
        assert_eq!(grandchild.level(), 2);

        // the whole chain validates against the root public key alone
        validate(&mpk, &child).unwrap();
        validate(&mpk, &grandchild).unwrap();
        run_protocol(&mpk, &grandchild, b"corp.eng.dev").unwrap();

        // any altered character of the accumulated name rejects
        let mut bytes = grandchild.to_bytes();
        let identity_start = bytes.len() - grandchild.fqn().len();
        for idx in identity_start..bytes.len() {
            bytes[idx] ^= 0x20;
            let rejected = match UserKey::from_bytes(&bytes) {
                Err(_) => true,
                Ok(tampered) => validate(&mpk, &tampered).is_err(),
            };
            assert!(rejected, "identity byte {idx}");
            bytes[idx] ^= 0x20;
        }
    }

    #[test]
    fn hierarchy_credentials_round_trip() {
        let msk = SecretKey::generate(Algorithm::Vangujar19);
        let child = delegate(&issue(&msk, b"corp").unwrap(), b"eng").unwrap();
        let bytes = child.to_bytes();
        assert_eq!(
            bytes.len(),
            Algorithm::Vangujar19.user_key_len(1, b"corp.eng".len())
        );
        let parsed = UserKey::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.level(), 1);
        validate(&msk.public_key(), &parsed).unwrap();
    }

    #[test]
    fn delegation_guards() {
        let flat = issue(&SecretKey::generate(Algorithm::Heng04), b"alice").unwrap();
        assert!(matches!(
            delegate(&flat, b"child"),
            Err(Error::Unsupported(_))
        ));

        let msk = SecretKey::generate(Algorithm::Vangujar19);
        let root = issue(&msk, b"corp").unwrap();
        assert!(matches!(delegate(&root, b""), Err(Error::Identity(_))));
        assert!(matches!(
            delegate(&root, b"a.b"),
            Err(Error::Identity(_))
        ));
        assert!(matches!(issue(&msk, b"a.b"), Err(Error::Identity(_))));
    }
}

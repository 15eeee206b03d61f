//! Group identification (ancygibi).
//!
//! A group key pair fixes a shared second base `B2 = tB` next to the
//! generator and publishes `A = (-a)B` and `A2 = (-a)B2`, one secret scalar
//! over both bases. Two independent capabilities hang off it:
//!
//! - the master-level credential issued by [`crate::ibi::issue`] drives the
//!   standard three-move protocol, exactly as the other schemes do;
//! - anyone holding the group public key can derive a full member key pair
//!   from public parameters alone ([`member_derive`]) and later prove
//!   membership with a one-time request ([`request_gen`] /
//!   [`request_check`]), which binds the shared base into the transcript.

use crate::ds::{PublicPayload, SecretPayload};
use crate::group::{self, Reader, Writer, POINT_LEN, SCALAR_LEN};
use crate::{Algorithm, Error, PublicKey, Result, SecretKey};
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use tracing::debug;
use zeroize::Zeroize;

#[derive(Clone, Zeroize)]
pub(crate) struct Secret {
    pub a: Scalar,
    pub big_a: RistrettoPoint,
    pub big_a2: RistrettoPoint,
    pub b2: RistrettoPoint,
}

#[derive(Clone, Zeroize)]
pub(crate) struct Signature {
    pub s: Scalar,
    pub x: Scalar,
    pub u: RistrettoPoint,
    pub v: RistrettoPoint,
}

pub(crate) fn generate() -> Secret {
    let b2 = group::basemul(&group::random_scalar());
    let a = group::random_scalar();
    Secret {
        a,
        big_a: group::basemul(&-a),
        big_a2: (-a) * b2,
        b2,
    }
}

pub(crate) fn sign(sk: &Secret, message: &[u8]) -> Signature {
    let r = group::random_scalar();
    let u = group::basemul(&r);
    let v = r * sk.b2;
    let x = group::hash_to_scalar(message, &[&u, &v, &sk.big_a, &sk.big_a2]);
    Signature {
        s: r + x * sk.a,
        x,
        u,
        v,
    }
}

pub(crate) fn verify(
    big_a: &RistrettoPoint,
    big_a2: &RistrettoPoint,
    b2: &RistrettoPoint,
    message: &[u8],
    sig: &Signature,
) -> Result<()> {
    let u = group::basemul(&sig.s) + sig.x * big_a;
    let v = sig.s * b2 + sig.x * big_a2;
    let x = group::hash_to_scalar(message, &[&u, &v, big_a, big_a2]);
    let mut ok = group::scalar_eq(&x, &sig.x);
    ok &= group::point_eq(&u, &sig.u);
    ok &= group::point_eq(&v, &sig.v);
    if ok {
        Ok(())
    } else {
        Err(Error::Verification)
    }
}

impl Secret {
    pub(crate) fn write(&self, w: &mut Writer) {
        w.scalar(&self.a)
            .point(&self.big_a)
            .point(&self.big_a2)
            .point(&self.b2);
    }

    pub(crate) fn read(r: &mut Reader) -> Result<Self> {
        Ok(Secret {
            a: r.scalar()?,
            big_a: r.point()?,
            big_a2: r.point()?,
            b2: r.point()?,
        })
    }
}

impl Signature {
    pub(crate) fn write(&self, w: &mut Writer) {
        w.scalar(&self.s)
            .scalar(&self.x)
            .point(&self.u)
            .point(&self.v);
    }

    pub(crate) fn read(r: &mut Reader) -> Result<Self> {
        Ok(Signature {
            s: r.scalar()?,
            x: r.scalar()?,
            u: r.point()?,
            v: r.point()?,
        })
    }
}

/// Protocol commitment for the master-level credential: the credential's
/// nonce points plus a fresh `W = tB`. Returns the session scalar `t`.
pub(crate) fn commit(sig: &Signature) -> (Scalar, Vec<u8>) {
    let t = group::random_scalar();
    let mut w = Writer::with_capacity(3 * POINT_LEN);
    w.point(&sig.u).point(&sig.v).point(&group::basemul(&t));
    (t, w.finish())
}

/// Protocol decision: `yB == W + c(U - xA)` with the challenge hash
/// recomputed from the transmitted nonce points.
pub(crate) fn check(
    big_a: &RistrettoPoint,
    big_a2: &RistrettoPoint,
    message: &[u8],
    u: &RistrettoPoint,
    v: &RistrettoPoint,
    w: &RistrettoPoint,
    c: &Scalar,
    y: &Scalar,
) -> Result<()> {
    let x = group::hash_to_scalar(message, &[u, v, big_a, big_a2]);
    let rhs = w + c * (u - x * big_a);
    if group::point_eq(&group::basemul(y), &rhs) {
        Ok(())
    } else {
        Err(Error::Verification)
    }
}

/// Derive a fresh member key pair from the group public key alone. The
/// member shares the group's second base but owns its own secret scalar.
pub fn member_derive(group_pk: &PublicKey) -> Result<SecretKey> {
    let PublicPayload::Ancygibi { b2, .. } = group_pk.payload() else {
        return Err(Error::AlgorithmMismatch {
            expected: Algorithm::Ancygibi,
            actual: group_pk.algorithm(),
        });
    };
    let a = group::random_scalar();
    let secret = Secret {
        a,
        big_a: group::basemul(&-a),
        big_a2: (-a) * b2,
        b2: *b2,
    };
    debug!("derived group member key");
    Ok(SecretKey::from_payload(SecretPayload::Ancygibi(secret)))
}

/// One-time membership request: a signature whose transcript additionally
/// binds the shared second base.
#[derive(Clone)]
pub struct MembershipRequest {
    s: Scalar,
    x: Scalar,
    u: RistrettoPoint,
    v: RistrettoPoint,
}

/// Produce a membership request over `message` with a member secret key.
pub fn request_gen(member: &SecretKey, message: &[u8]) -> Result<MembershipRequest> {
    let SecretPayload::Ancygibi(sk) = member.payload() else {
        return Err(Error::AlgorithmMismatch {
            expected: Algorithm::Ancygibi,
            actual: member.algorithm(),
        });
    };
    let r = group::random_scalar();
    let u = group::basemul(&r);
    let v = r * sk.b2;
    let x = group::hash_to_scalar(message, &[&u, &v, &sk.big_a, &sk.big_a2, &sk.b2]);
    Ok(MembershipRequest {
        s: r + x * sk.a,
        x,
        u,
        v,
    })
}

/// Check a membership request against a member public key.
pub fn request_check(
    member_pk: &PublicKey,
    request: &MembershipRequest,
    message: &[u8],
) -> Result<()> {
    let PublicPayload::Ancygibi { big_a, big_a2, b2 } = member_pk.payload() else {
        return Err(Error::AlgorithmMismatch {
            expected: Algorithm::Ancygibi,
            actual: member_pk.algorithm(),
        });
    };
    let u = group::basemul(&request.s) + request.x * big_a;
    let v = request.s * b2 + request.x * big_a2;
    let x = group::hash_to_scalar(message, &[&u, &v, big_a, big_a2, b2]);
    let mut ok = group::scalar_eq(&x, &request.x);
    ok &= group::point_eq(&u, &request.u);
    ok &= group::point_eq(&v, &request.v);
    if ok {
        Ok(())
    } else {
        Err(Error::Verification)
    }
}

impl MembershipRequest {
    /// Serialize as `[algorithm:1][s][x][U][V]`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::with_capacity(1 + 2 * SCALAR_LEN + 2 * POINT_LEN);
        w.byte(Algorithm::Ancygibi.id())
            .scalar(&self.s)
            .scalar(&self.x)
            .point(&self.u)
            .point(&self.v);
        w.finish()
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        let mut r = Reader::new(buf);
        let alg = Algorithm::from_id(r.byte()?)?;
        if alg != Algorithm::Ancygibi {
            return Err(Error::AlgorithmMismatch {
                expected: Algorithm::Ancygibi,
                actual: alg,
            });
        }
        Ok(MembershipRequest {
            s: r.scalar()?,
            x: r.scalar()?,
            u: r.point()?,
            v: r.point()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ibi;

    #[test]
    fn five_members_prove_membership() {
        let gsk = SecretKey::generate(Algorithm::Ancygibi);
        let gpk = gsk.public_key();

        let members: Vec<SecretKey> = (0..5).map(|_| member_derive(&gpk).unwrap()).collect();
        let requests: Vec<MembershipRequest> = members
            .iter()
            .map(|m| request_gen(m, b"join").unwrap())
            .collect();

        for (member, request) in members.iter().zip(&requests) {
            request_check(&member.public_key(), request, b"join").unwrap();
        }
        // a request only checks against the key that produced it
        for (i, request) in requests.iter().enumerate() {
            for (j, member) in members.iter().enumerate() {
                if i != j {
                    assert!(request_check(&member.public_key(), request, b"join").is_err());
                }
            }
        }
    }

    #[test]
    fn request_round_trip() {
        let gpk = SecretKey::generate(Algorithm::Ancygibi).public_key();
        let member = member_derive(&gpk).unwrap();
        let request = request_gen(&member, b"join").unwrap();
        let parsed = MembershipRequest::from_bytes(&request.to_bytes()).unwrap();
        request_check(&member.public_key(), &parsed, b"join").unwrap();
    }

    #[test]
    fn request_envelope_rejects_foreign_algorithm() {
        let gpk = SecretKey::generate(Algorithm::Ancygibi).public_key();
        let member = member_derive(&gpk).unwrap();
        let mut buf = request_gen(&member, b"join").unwrap().to_bytes();
        buf[0] = Algorithm::Heng04.id();
        assert!(matches!(
            MembershipRequest::from_bytes(&buf),
            Err(Error::AlgorithmMismatch { .. })
        ));
    }

    #[test]
    fn master_credential_runs_protocol() {
        let gsk = SecretKey::generate(Algorithm::Ancygibi);
        let gpk = gsk.public_key();
        let cred = ibi::issue(&gsk, b"group-master").unwrap();
        ibi::validate(&gpk, &cred).unwrap();

        let (prover, cmt) = ibi::Prover::new(&cred).unwrap().commit().unwrap();
        let (verifier, cha) = ibi::Verifier::new(&gpk, b"group-master")
            .unwrap()
            .challenge(&cmt)
            .unwrap();
        let res = prover.respond(&cha).unwrap();
        verifier.decide(&res).unwrap();
    }

    #[test]
    fn member_derive_needs_group_key() {
        let pk = SecretKey::generate(Algorithm::Heng04).public_key();
        assert!(matches!(
            member_derive(&pk),
            Err(Error::AlgorithmMismatch { .. })
        ));
    }
}

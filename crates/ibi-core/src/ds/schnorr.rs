//! Single-secret Schnorr signatures, the base scheme of heng04.
//!
//! The public key is `A = (-a)B`, so verification reconstructs the nonce
//! point additively as `U' = sB + xA` and recomputes the challenge hash.

use crate::group::{self, Reader, Writer};
use crate::{Error, Result};
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use zeroize::Zeroize;

#[derive(Clone, Zeroize)]
pub(crate) struct Secret {
    pub a: Scalar,
    pub big_a: RistrettoPoint,
}

#[derive(Clone, Zeroize)]
pub(crate) struct Signature {
    pub s: Scalar,
    pub x: Scalar,
    pub u: RistrettoPoint,
}

pub(crate) fn generate() -> Secret {
    let a = group::random_scalar();
    let big_a = group::basemul(&-a);
    Secret { a, big_a }
}

pub(crate) fn sign(sk: &Secret, message: &[u8]) -> Signature {
    let r = group::random_scalar();
    let u = group::basemul(&r);
    let x = group::hash_to_scalar(message, &[&u, &sk.big_a]);
    let s = r + x * sk.a;
    Signature { s, x, u }
}

pub(crate) fn verify(big_a: &RistrettoPoint, message: &[u8], sig: &Signature) -> Result<()> {
    let u = group::basemul(&sig.s) + sig.x * big_a;
    let x = group::hash_to_scalar(message, &[&u, big_a]);
    // both checks always run; the decision is a single accept/reject
    let mut ok = group::scalar_eq(&x, &sig.x);
    ok &= group::point_eq(&u, &sig.u);
    if ok {
        Ok(())
    } else {
        Err(Error::Verification)
    }
}

impl Secret {
    pub(crate) fn write(&self, w: &mut Writer) {
        w.scalar(&self.a).point(&self.big_a);
    }

    pub(crate) fn read(r: &mut Reader) -> Result<Self> {
        Ok(Secret {
            a: r.scalar()?,
            big_a: r.point()?,
        })
    }
}

impl Signature {
    pub(crate) fn write(&self, w: &mut Writer) {
        w.scalar(&self.s).scalar(&self.x).point(&self.u);
    }

    pub(crate) fn read(r: &mut Reader) -> Result<Self> {
        Ok(Signature {
            s: r.scalar()?,
            x: r.scalar()?,
            u: r.point()?,
        })
    }
}

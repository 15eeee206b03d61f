//! Protocol math for the twin-secret scheme. Same shape as the
//! single-secret protocol, run over both bases at once.

use crate::group::{self, Writer, POINT_LEN};
use crate::{ds::twin, Error, Result};
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;

/// Commitment `U || T` where `T = t1 B + t2 B2`, plus the session scalars.
pub(crate) fn commit(sig: &twin::Signature) -> (Scalar, Scalar, Vec<u8>) {
    let t1 = group::random_scalar();
    let t2 = group::random_scalar();
    let big_t = group::basemul(&t1) + t2 * sig.b2;
    let mut w = Writer::with_capacity(2 * POINT_LEN);
    w.point(&sig.u).point(&big_t);
    (t1, t2, w.finish())
}

/// Decision: `y1 B + y2 B2 == T + c(U - xA)`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn check(
    big_a: &RistrettoPoint,
    b2: &RistrettoPoint,
    message: &[u8],
    u: &RistrettoPoint,
    big_t: &RistrettoPoint,
    c: &Scalar,
    y1: &Scalar,
    y2: &Scalar,
) -> Result<()> {
    let x = group::hash_to_scalar(message, &[u, big_a]);
    let lhs = group::basemul(y1) + y2 * b2;
    let rhs = big_t + c * (u - x * big_a);
    if group::point_eq(&lhs, &rhs) {
        Ok(())
    } else {
        Err(Error::Verification)
    }
}

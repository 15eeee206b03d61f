//! Protocol math for the single-secret scheme.
//!
//! The prover reveals the credential's nonce point `U` plus a fresh
//! commitment `V = tB`; the response `y = cs + t` then ties the response
//! scalar `s` to the verifier's challenge without revealing it.

use crate::group::{self, Writer, POINT_LEN};
use crate::{ds::schnorr, Error, Result};
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;

/// Commitment `U || V` plus the session scalar `t`.
pub(crate) fn commit(sig: &schnorr::Signature) -> (Scalar, Vec<u8>) {
    let t = group::random_scalar();
    let mut w = Writer::with_capacity(2 * POINT_LEN);
    w.point(&sig.u).point(&group::basemul(&t));
    (t, w.finish())
}

/// Decision: `yB == V + c(U - xA)` with `x` recomputed from the transcript.
pub(crate) fn check(
    big_a: &RistrettoPoint,
    message: &[u8],
    u: &RistrettoPoint,
    v: &RistrettoPoint,
    c: &Scalar,
    y: &Scalar,
) -> Result<()> {
    let x = group::hash_to_scalar(message, &[u, big_a]);
    let rhs = v + c * (u - x * big_a);
    if group::point_eq(&group::basemul(y), &rhs) {
        Ok(())
    } else {
        Err(Error::Verification)
    }
}

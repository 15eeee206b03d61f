//! Hierarchical credentials.
//!
//! A credential at level `n` is a chain of `(x_l, U_l)` links, one per
//! dotted component of the fully-qualified name, closed by the running
//! twin responses `s1, s2`. Delegation re-signs the extended name with the
//! parent's responses in place of the master secrets, so any holder can
//! extend its own subtree without the master key. Verification walks the
//! accumulated points `Q_l = U_l + x_l Q_{l-1}` from `Q_{-1} = -A` and
//! accepts only if the final responses open `Q_n` over both bases, which
//! ties every level back to the root public key.

use crate::ds::{ChainLink, ChainSig, DsSignature, SignaturePayload};
use crate::group::{self, Writer, POINT_LEN};
use crate::ibi::{name_level, UserKey};
use crate::{Error, Result, FQN_SEPARATOR};
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use tracing::debug;

/// Cumulative dotted prefixes of a fully-qualified name:
/// `a.b.c` yields `a`, `a.b`, `a.b.c`.
pub(crate) fn prefixes(fqn: &[u8]) -> impl Iterator<Item = &[u8]> + '_ {
    fqn.iter()
        .enumerate()
        .filter_map(|(i, &b)| (b == FQN_SEPARATOR).then_some(&fqn[..i]))
        .chain(std::iter::once(fqn))
}

/// Extend a credential chain by one level under a child name.
pub(crate) fn delegate(chain: &ChainSig, fqn: &[u8], name: &[u8]) -> Result<UserKey> {
    if name.is_empty() {
        return Err(Error::Identity("empty delegation name".into()));
    }
    if name.contains(&FQN_SEPARATOR) {
        return Err(Error::Identity(
            "delegation name must not contain the separator".into(),
        ));
    }
    if chain.level() >= u8::MAX as usize {
        return Err(Error::Unsupported("maximum delegation depth reached"));
    }

    let mut child_fqn = Vec::with_capacity(fqn.len() + 1 + name.len());
    child_fqn.extend_from_slice(fqn);
    child_fqn.push(FQN_SEPARATOR);
    child_fqn.extend_from_slice(name);

    // the parent's responses play the role of the signing secrets
    let r1 = group::random_scalar();
    let r2 = group::random_scalar();
    let n1 = chain.s1 + r1;
    let n2 = chain.s2 + r2;
    let u = group::basemul(&n1) + n2 * chain.b2;
    let x = group::hash_to_scalar(&child_fqn, &[&u, &chain.big_a]);

    let mut links = chain.links.clone();
    links.push(ChainLink { x, u });
    let child = ChainSig {
        links,
        s1: n1 + x * chain.s1,
        s2: n2 + x * chain.s2,
        big_a: chain.big_a,
        b2: chain.b2,
    };
    debug!(level = child.level(), "delegated credential");
    Ok(UserKey::from_parts(
        DsSignature::from_payload(SignaturePayload::Vangujar19(child)),
        child_fqn,
    ))
}

/// Verify a full chain against the trusted master public key, with the
/// message interpreted as the fully-qualified name.
pub(crate) fn chain_verify(
    big_a: &RistrettoPoint,
    b2: &RistrettoPoint,
    fqn: &[u8],
    chain: &ChainSig,
) -> Result<()> {
    if name_level(fqn) != chain.level() {
        return Err(Error::Identity(
            "name depth does not match credential level".into(),
        ));
    }
    let mut ok = group::point_eq(&chain.big_a, big_a);
    ok &= group::point_eq(&chain.b2, b2);
    let mut q = -big_a;
    for (prefix, link) in prefixes(fqn).zip(&chain.links) {
        let x = group::hash_to_scalar(prefix, &[&link.u, big_a]);
        ok &= group::scalar_eq(&x, &link.x);
        q = link.u + link.x * q;
    }
    let opened = group::basemul(&chain.s1) + chain.s2 * b2;
    ok &= group::point_eq(&opened, &q);
    if ok {
        Ok(())
    } else {
        Err(Error::Verification)
    }
}

/// Commitment `U_0 || .. || U_n || T`, plus the session scalars.
pub(crate) fn commit(chain: &ChainSig) -> (Scalar, Scalar, Vec<u8>) {
    let t1 = group::random_scalar();
    let t2 = group::random_scalar();
    let big_t = group::basemul(&t1) + t2 * chain.b2;
    let mut w = Writer::with_capacity((chain.links.len() + 1) * POINT_LEN);
    for link in &chain.links {
        w.point(&link.u);
    }
    w.point(&big_t);
    (t1, t2, w.finish())
}

/// Decision: rebuild the accumulated point from the transmitted per-level
/// nonce points and the name prefixes, then check
/// `y1 B + y2 B2 == T + c Q_n`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn check(
    big_a: &RistrettoPoint,
    b2: &RistrettoPoint,
    fqn: &[u8],
    us: &[RistrettoPoint],
    big_t: &RistrettoPoint,
    c: &Scalar,
    y1: &Scalar,
    y2: &Scalar,
) -> Result<()> {
    let mut q = -big_a;
    for (prefix, u) in prefixes(fqn).zip(us) {
        let x = group::hash_to_scalar(prefix, &[u, big_a]);
        q = u + x * q;
    }
    let lhs = group::basemul(y1) + y2 * b2;
    let rhs = big_t + c * q;
    if group::point_eq(&lhs, &rhs) {
        Ok(())
    } else {
        Err(Error::Verification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_accumulate() {
        let got: Vec<&[u8]> = prefixes(b"a.bb.c").collect();
        assert_eq!(got, [b"a" as &[u8], b"a.bb", b"a.bb.c"]);
    }
}

//! Group-provider boundary.
//!
//! The protocol engine consumes a prime-order group with a fixed generator,
//! scalar arithmetic and a hash-to-scalar transcript function; it does not
//! implement one. This module binds those operations to ristretto255 as
//! provided by `curve25519-dalek`. The transcript hash is SHA-512 over the
//! message followed by each compressed point, wide-reduced to a scalar.

use crate::{Error, Result};
use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use rand::rngs::OsRng;
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;

/// Serialized scalar width
pub const SCALAR_LEN: usize = 32;

/// Serialized (compressed) point width
pub const POINT_LEN: usize = 32;

/// Fixed-base multiplication with the ristretto255 basepoint B
pub fn basemul(s: &Scalar) -> RistrettoPoint {
    RistrettoPoint::mul_base(s)
}

/// Sample a uniformly random scalar
pub fn random_scalar() -> Scalar {
    Scalar::random(&mut OsRng)
}

/// Sample a uniformly random group element (used for second bases)
pub fn random_point() -> RistrettoPoint {
    RistrettoPoint::random(&mut OsRng)
}

/// Bind a transcript to a challenge scalar: SHA-512 over the message and the
/// compressed points, wide-reduced into the scalar field.
pub fn hash_to_scalar(message: &[u8], points: &[&RistrettoPoint]) -> Scalar {
    let mut h = Sha512::new();
    h.update(message);
    for p in points {
        h.update(p.compress().as_bytes());
    }
    Scalar::from_hash(h)
}

/// Constant-time scalar equality
pub fn scalar_eq(a: &Scalar, b: &Scalar) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Constant-time point equality on compressed encodings
pub fn point_eq(a: &RistrettoPoint, b: &RistrettoPoint) -> bool {
    a.compress()
        .as_bytes()
        .ct_eq(b.compress().as_bytes())
        .into()
}

/// Cursor over a serialized payload with the fixed field widths of the wire
/// envelope. Reading past the end is a buffer error, a non-canonical scalar
/// or undecodable point an encoding error.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.buf.len() < self.pos + n {
            return Err(Error::Buffer {
                expected: self.pos + n,
                actual: self.buf.len(),
            });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn byte(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn scalar(&mut self) -> Result<Scalar> {
        let mut raw = [0u8; SCALAR_LEN];
        raw.copy_from_slice(self.take(SCALAR_LEN)?);
        Option::<Scalar>::from(Scalar::from_canonical_bytes(raw))
            .ok_or_else(|| Error::Encoding("non-canonical scalar".into()))
    }

    pub fn point(&mut self) -> Result<RistrettoPoint> {
        let mut raw = [0u8; POINT_LEN];
        raw.copy_from_slice(self.take(POINT_LEN)?);
        CompressedRistretto(raw)
            .decompress()
            .ok_or_else(|| Error::Encoding("invalid point encoding".into()))
    }

    /// Everything not yet consumed (credential identity trailers)
    pub fn rest(&mut self) -> &'a [u8] {
        let out = &self.buf[self.pos..];
        self.pos = self.buf.len();
        out
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

/// Append-only builder for the same layouts
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            buf: Vec::with_capacity(n),
        }
    }

    pub fn byte(&mut self, b: u8) -> &mut Self {
        self.buf.push(b);
        self
    }

    pub fn scalar(&mut self, s: &Scalar) -> &mut Self {
        self.buf.extend_from_slice(s.as_bytes());
        self
    }

    pub fn point(&mut self, p: &RistrettoPoint) -> &mut Self {
        self.buf.extend_from_slice(p.compress().as_bytes());
        self
    }

    pub fn bytes(&mut self, b: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(b);
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_hash_is_order_sensitive() {
        let p = basemul(&random_scalar());
        let q = basemul(&random_scalar());
        let a = hash_to_scalar(b"m", &[&p, &q]);
        let b = hash_to_scalar(b"m", &[&q, &p]);
        assert!(!scalar_eq(&a, &b));
    }

    #[test]
    fn reader_rejects_short_input() {
        let mut r = Reader::new(&[0u8; 16]);
        assert!(matches!(
            r.scalar(),
            Err(Error::Buffer {
                expected: 32,
                actual: 16
            })
        ));
    }

    #[test]
    fn scalar_point_round_trip() {
        let s = random_scalar();
        let p = basemul(&s);
        let mut w = Writer::with_capacity(64);
        w.scalar(&s).point(&p);
        let buf = w.finish();
        let mut r = Reader::new(&buf);
        assert!(scalar_eq(&r.scalar().unwrap(), &s));
        assert!(point_eq(&r.point().unwrap(), &p));
        assert_eq!(r.remaining(), 0);
    }
}

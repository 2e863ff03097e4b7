//! Per-family key primitives.
//!
//! Every family supplies the same nine operations through
//! [`CurvePrimitives`]. [`KeyMaterial`] is the closed set of family key states
//! and dispatches to the right implementation; the rest of the crate only
//! talks to `KeyMaterial`.

mod ed25519;
mod ed448;
mod x25519;
mod x448;

pub use ed25519::Ed25519Key;
pub use ed448::Ed448Key;
pub use x25519::X25519Key;
pub use x448::X448Key;

use zeroize::Zeroize;

use crate::descriptor::{CurveFamily, Endianness};
use crate::error::KeyMgmtError;
use crate::rng::RandomSource;

/// The primitive operations a curve family provides.
pub trait CurvePrimitives: Clone + Default + Zeroize {
    /// Raw key length for the family.
    const KEY_LEN: usize;

    /// Initialize empty key material.
    fn init() -> Result<Self, KeyMgmtError> {
        Ok(Self::default())
    }

    /// Release key material. Secrets are wiped.
    fn free(&mut self) {
        self.zeroize();
    }

    /// Populate a fresh key pair from `rng`.
    fn generate(&mut self, rng: &mut dyn RandomSource, len: usize) -> Result<(), KeyMgmtError>;

    fn import_public(&mut self, input: &[u8], endian: Endianness) -> Result<(), KeyMgmtError>;

    /// Write the public key into `out`, or only report its length when `out`
    /// is `None`.
    fn export_public(
        &self,
        out: Option<&mut [u8]>,
        endian: Endianness,
    ) -> Result<usize, KeyMgmtError>;

    fn import_private(&mut self, input: &[u8], endian: Endianness) -> Result<(), KeyMgmtError>;

    fn export_private(&self, out: Option<&mut [u8]>) -> Result<usize, KeyMgmtError>;

    /// Check a raw public key is a valid point encoding.
    fn check_public(input: &[u8], endian: Endianness) -> Result<(), KeyMgmtError>;

    /// Check the public and private halves belong together.
    fn check_key(&self) -> Result<(), KeyMgmtError>;
}

/// Key state of exactly one family.
#[derive(Clone)]
pub enum KeyMaterial {
    X25519(X25519Key),
    X448(X448Key),
    Ed25519(Ed25519Key),
    Ed448(Ed448Key),
}

macro_rules! dispatch {
    ($self:expr, $key:ident => $body:expr) => {
        match $self {
            KeyMaterial::X25519($key) => $body,
            KeyMaterial::X448($key) => $body,
            KeyMaterial::Ed25519($key) => $body,
            KeyMaterial::Ed448($key) => $body,
        }
    };
}

impl KeyMaterial {
    pub fn init(family: CurveFamily) -> Result<Self, KeyMgmtError> {
        Ok(match family {
            CurveFamily::X25519 => Self::X25519(X25519Key::init()?),
            CurveFamily::X448 => Self::X448(X448Key::init()?),
            CurveFamily::Ed25519 => Self::Ed25519(Ed25519Key::init()?),
            CurveFamily::Ed448 => Self::Ed448(Ed448Key::init()?),
        })
    }

    pub fn family(&self) -> CurveFamily {
        match self {
            Self::X25519(_) => CurveFamily::X25519,
            Self::X448(_) => CurveFamily::X448,
            Self::Ed25519(_) => CurveFamily::Ed25519,
            Self::Ed448(_) => CurveFamily::Ed448,
        }
    }

    pub fn free(&mut self) {
        dispatch!(self, k => k.free())
    }

    pub fn generate(&mut self, rng: &mut dyn RandomSource, len: usize) -> Result<(), KeyMgmtError> {
        dispatch!(self, k => k.generate(rng, len))
    }

    pub fn import_public(&mut self, input: &[u8], endian: Endianness) -> Result<(), KeyMgmtError> {
        dispatch!(self, k => k.import_public(input, endian))
    }

    pub fn export_public(
        &self,
        out: Option<&mut [u8]>,
        endian: Endianness,
    ) -> Result<usize, KeyMgmtError> {
        dispatch!(self, k => k.export_public(out, endian))
    }

    pub fn import_private(&mut self, input: &[u8], endian: Endianness) -> Result<(), KeyMgmtError> {
        dispatch!(self, k => k.import_private(input, endian))
    }

    pub fn export_private(&self, out: Option<&mut [u8]>) -> Result<usize, KeyMgmtError> {
        dispatch!(self, k => k.export_private(out))
    }

    pub fn check_key(&self) -> Result<(), KeyMgmtError> {
        dispatch!(self, k => k.check_key())
    }

    /// Validate a raw public key for `family` without a key object.
    pub fn check_public(
        family: CurveFamily,
        input: &[u8],
        endian: Endianness,
    ) -> Result<(), KeyMgmtError> {
        match family {
            CurveFamily::X25519 => X25519Key::check_public(input, endian),
            CurveFamily::X448 => X448Key::check_public(input, endian),
            CurveFamily::Ed25519 => Ed25519Key::check_public(input, endian),
            CurveFamily::Ed448 => Ed448Key::check_public(input, endian),
        }
    }
}

/// Copy `src` into `out`, honouring the length-probe convention.
pub(crate) fn write_out(src: &[u8], out: Option<&mut [u8]>) -> Result<usize, KeyMgmtError> {
    if let Some(out) = out {
        if out.len() < src.len() {
            return Err(KeyMgmtError::export(format!(
                "buffer too small: need {}, have {}",
                src.len(),
                out.len()
            )));
        }
        out[..src.len()].copy_from_slice(src);
    }
    Ok(src.len())
}

/// Convert a raw input of exactly `N` bytes to little-endian order.
pub(crate) fn to_le_array<const N: usize>(
    input: &[u8],
    endian: Endianness,
) -> Result<[u8; N], KeyMgmtError> {
    let mut out: [u8; N] = input.try_into().map_err(|_| {
        KeyMgmtError::import(format!(
            "invalid key length: expected {}, got {}",
            N,
            input.len()
        ))
    })?;
    if endian == Endianness::Big {
        out.reverse();
    }
    Ok(out)
}

/// True if little-endian `value` is greater than or equal to `bound`.
pub(crate) fn le_ge(value: &[u8], bound: &[u8]) -> bool {
    for (v, b) in value.iter().rev().zip(bound.iter().rev()) {
        if v != b {
            return v > b;
        }
    }
    true
}

/// Reject the encodings of zero and one.
pub(crate) fn is_zero_or_one(value: &[u8]) -> bool {
    value[1..].iter().all(|&b| b == 0) && value[0] <= 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_out_probe() {
        assert_eq!(write_out(&[1, 2, 3], None).unwrap(), 3);
    }

    #[test]
    fn test_write_out_too_small() {
        let mut buf = [0u8; 2];
        assert!(matches!(
            write_out(&[1, 2, 3], Some(&mut buf)),
            Err(KeyMgmtError::Export(_))
        ));
    }

    #[test]
    fn test_to_le_array_big_endian() {
        let le: [u8; 4] = to_le_array(&[1, 2, 3, 4], Endianness::Big).unwrap();
        assert_eq!(le, [4, 3, 2, 1]);
        assert!(to_le_array::<4>(&[1, 2, 3], Endianness::Little).is_err());
    }

    #[test]
    fn test_le_ge() {
        assert!(le_ge(&[0, 2], &[0xff, 1]));
        assert!(!le_ge(&[0xff, 0], &[0, 1]));
        assert!(le_ge(&[5, 5], &[5, 5]));
    }

    #[test]
    fn test_is_zero_or_one() {
        assert!(is_zero_or_one(&[0u8; 32]));
        let mut one = [0u8; 32];
        one[0] = 1;
        assert!(is_zero_or_one(&one));
        one[0] = 2;
        assert!(!is_zero_or_one(&one));
        one[0] = 1;
        one[31] = 1;
        assert!(!is_zero_or_one(&one));
    }
}

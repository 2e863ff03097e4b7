//! X448 key primitives (x448 crate).

use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{is_zero_or_one, le_ge, to_le_array, write_out, CurvePrimitives};
use crate::descriptor::Endianness;
use crate::error::KeyMgmtError;
use crate::rng::RandomSource;

const KEY_SIZE: usize = 56;

/// p - 1 for p = 2^448 - 2^224 - 1, little-endian.
const P_MINUS_ONE: [u8; KEY_SIZE] = {
    let mut bound = [0xffu8; KEY_SIZE];
    bound[0] = 0xfe;
    bound[28] = 0xfe;
    bound
};

/// X448 key state. Both halves are stored little-endian.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct X448Key {
    private: Option<[u8; KEY_SIZE]>,
    public: Option<[u8; KEY_SIZE]>,
}

fn derive_public(private: &[u8; KEY_SIZE]) -> Result<[u8; KEY_SIZE], KeyMgmtError> {
    let secret = x448::Secret::from_bytes(private)
        .ok_or_else(|| KeyMgmtError::import("invalid X448 private key"))?;
    Ok(*x448::PublicKey::from(&secret).as_bytes())
}

fn clamp(scalar: &mut [u8; KEY_SIZE]) {
    scalar[0] &= 252;
    scalar[KEY_SIZE - 1] |= 128;
}

impl CurvePrimitives for X448Key {
    const KEY_LEN: usize = KEY_SIZE;

    fn generate(&mut self, rng: &mut dyn RandomSource, len: usize) -> Result<(), KeyMgmtError> {
        if len != KEY_SIZE {
            return Err(KeyMgmtError::generation(format!(
                "unsupported key size {len}"
            )));
        }
        let mut scalar = [0u8; KEY_SIZE];
        rng.fill(&mut scalar)?;
        clamp(&mut scalar);
        let result = self
            .import_private(&scalar, Endianness::Little)
            .map_err(KeyMgmtError::generation);
        scalar.zeroize();
        result
    }

    fn import_public(&mut self, input: &[u8], endian: Endianness) -> Result<(), KeyMgmtError> {
        let point: [u8; KEY_SIZE] = to_le_array(input, endian)?;
        self.public = Some(point);
        Ok(())
    }

    fn export_public(
        &self,
        out: Option<&mut [u8]>,
        endian: Endianness,
    ) -> Result<usize, KeyMgmtError> {
        let mut point = match (&self.public, &self.private) {
            (Some(public), _) => *public,
            (None, Some(private)) => derive_public(private).map_err(KeyMgmtError::export)?,
            (None, None) => return Err(KeyMgmtError::export("no public key")),
        };
        if endian == Endianness::Big {
            point.reverse();
        }
        write_out(&point, out)
    }

    fn import_private(&mut self, input: &[u8], endian: Endianness) -> Result<(), KeyMgmtError> {
        let mut scalar: [u8; KEY_SIZE] = to_le_array(input, endian)?;
        let result = derive_public(&scalar).map(|public| {
            self.public = Some(public);
            self.private = Some(scalar);
        });
        scalar.zeroize();
        result
    }

    fn export_private(&self, out: Option<&mut [u8]>) -> Result<usize, KeyMgmtError> {
        let private = self
            .private
            .as_ref()
            .ok_or_else(|| KeyMgmtError::export("no private key"))?;
        write_out(private, out)
    }

    fn check_public(input: &[u8], endian: Endianness) -> Result<(), KeyMgmtError> {
        let point: [u8; KEY_SIZE] = to_le_array(input, endian)?;
        if is_zero_or_one(&point) {
            return Err(KeyMgmtError::import("public key is zero or one"));
        }
        if le_ge(&point, &P_MINUS_ONE) {
            return Err(KeyMgmtError::import("public key out of range"));
        }
        if x448::PublicKey::from_bytes(&point).is_none() {
            return Err(KeyMgmtError::import("public key is a low order point"));
        }
        Ok(())
    }

    fn check_key(&self) -> Result<(), KeyMgmtError> {
        Ok(())
    }
}

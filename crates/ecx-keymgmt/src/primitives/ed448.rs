//! Ed448 key primitives (ed448-rust, point decoding via ed448-goldilocks).

use ed448_goldilocks::curve::edwards::CompressedEdwardsY;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{write_out, CurvePrimitives};
use crate::descriptor::Endianness;
use crate::error::KeyMgmtError;
use crate::rng::RandomSource;

const KEY_SIZE: usize = 57;

/// Field prime 2^448 - 2^224 - 1, little-endian.
const FIELD_PRIME: [u8; KEY_SIZE - 1] = {
    let mut p = [0xff; KEY_SIZE - 1];
    p[28] = 0xfe;
    p
};

/// Ed448 key state: the 57-byte secret and the compressed public point.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct Ed448Key {
    private: Option<[u8; KEY_SIZE]>,
    public: Option<[u8; KEY_SIZE]>,
}

fn check_len(input: &[u8]) -> Result<(), KeyMgmtError> {
    if input.len() != KEY_SIZE {
        return Err(KeyMgmtError::import(format!(
            "invalid key length: expected {KEY_SIZE}, got {}",
            input.len()
        )));
    }
    Ok(())
}

fn derive_public(private: &[u8]) -> Result<[u8; KEY_SIZE], KeyMgmtError> {
    let secret = ed448_rust::PrivateKey::try_from(private)
        .map_err(|e| KeyMgmtError::import(format!("invalid Ed448 private key: {e:?}")))?;
    Ok(ed448_rust::PublicKey::from(&secret).as_byte())
}

/// `y` must be a canonical field element, strictly below the prime.
fn is_canonical(y: &[u8]) -> bool {
    for (byte, limit) in y.iter().rev().zip(FIELD_PRIME.iter().rev()) {
        if byte != limit {
            return byte < limit;
        }
    }
    false
}

/// RFC 8032 section 5.2.3 point decoding.
fn decode_point(input: &[u8]) -> Result<(), KeyMgmtError> {
    check_len(input)?;
    let (y, last) = (&input[..KEY_SIZE - 1], input[KEY_SIZE - 1]);
    if last & 0x7f != 0 {
        return Err(KeyMgmtError::import("invalid Ed448 public key: reserved bits set"));
    }
    if !is_canonical(y) {
        return Err(KeyMgmtError::import("invalid Ed448 public key: y out of range"));
    }
    // x = 0 (y = +-1) has no negative counterpart.
    let one = y[0] == 1 && y[1..].iter().all(|&b| b == 0);
    let minus_one = y[0] == 0xfe && y[1..] == FIELD_PRIME[1..];
    if last & 0x80 != 0 && (one || minus_one) {
        return Err(KeyMgmtError::import("invalid Ed448 public key: bad sign bit"));
    }

    let mut encoded = [0u8; KEY_SIZE];
    encoded.copy_from_slice(input);
    CompressedEdwardsY(encoded)
        .decompress()
        .map(|_| ())
        .ok_or_else(|| KeyMgmtError::import("invalid Ed448 public key: not on the curve"))
}

impl CurvePrimitives for Ed448Key {
    const KEY_LEN: usize = KEY_SIZE;

    fn generate(&mut self, rng: &mut dyn RandomSource, len: usize) -> Result<(), KeyMgmtError> {
        if len != KEY_SIZE {
            return Err(KeyMgmtError::generation(format!(
                "unsupported key size {len}"
            )));
        }
        let mut secret = [0u8; KEY_SIZE];
        rng.fill(&mut secret)?;
        let result = self
            .import_private(&secret, Endianness::Little)
            .map_err(KeyMgmtError::generation);
        secret.zeroize();
        result
    }

    fn import_public(&mut self, input: &[u8], _endian: Endianness) -> Result<(), KeyMgmtError> {
        decode_point(input)?;
        let mut point = [0u8; KEY_SIZE];
        point.copy_from_slice(input);
        self.public = Some(point);
        Ok(())
    }

    fn export_public(
        &self,
        out: Option<&mut [u8]>,
        _endian: Endianness,
    ) -> Result<usize, KeyMgmtError> {
        match (&self.public, &self.private) {
            (Some(public), _) => write_out(public, out),
            (None, Some(private)) => {
                let public = derive_public(private).map_err(KeyMgmtError::export)?;
                write_out(&public, out)
            }
            (None, None) => Err(KeyMgmtError::export("no public key")),
        }
    }

    fn import_private(&mut self, input: &[u8], _endian: Endianness) -> Result<(), KeyMgmtError> {
        check_len(input)?;
        let public = derive_public(input)?;
        let mut secret = [0u8; KEY_SIZE];
        secret.copy_from_slice(input);
        self.private = Some(secret);
        self.public = Some(public);
        secret.zeroize();
        Ok(())
    }

    fn export_private(&self, out: Option<&mut [u8]>) -> Result<usize, KeyMgmtError> {
        let private = self
            .private
            .as_ref()
            .ok_or_else(|| KeyMgmtError::export("no private key"))?;
        write_out(private, out)
    }

    fn check_public(input: &[u8], _endian: Endianness) -> Result<(), KeyMgmtError> {
        decode_point(input)
    }

    fn check_key(&self) -> Result<(), KeyMgmtError> {
        let public = self
            .public
            .as_ref()
            .ok_or_else(|| KeyMgmtError::import("no public key"))?;
        match &self.private {
            Some(private) => {
                if derive_public(private)? != *public {
                    return Err(KeyMgmtError::import("public key does not match private key"));
                }
                Ok(())
            }
            None => decode_point(public),
        }
    }
}

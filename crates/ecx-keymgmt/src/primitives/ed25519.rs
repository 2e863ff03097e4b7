//! Ed25519 key primitives (ed25519-dalek).
//!
//! Signature keys have a single, fixed byte order; the endianness argument
//! is ignored.

use ed25519_dalek::{SigningKey, VerifyingKey};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{write_out, CurvePrimitives};
use crate::descriptor::Endianness;
use crate::error::KeyMgmtError;
use crate::rng::RandomSource;

const KEY_SIZE: usize = 32;

/// Ed25519 key state: the 32-byte seed and the compressed public point.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct Ed25519Key {
    private: Option<[u8; KEY_SIZE]>,
    public: Option<[u8; KEY_SIZE]>,
}

fn to_array(input: &[u8]) -> Result<[u8; KEY_SIZE], KeyMgmtError> {
    input.try_into().map_err(|_| {
        KeyMgmtError::import(format!(
            "invalid key length: expected {KEY_SIZE}, got {}",
            input.len()
        ))
    })
}

fn derive_public(private: &[u8; KEY_SIZE]) -> [u8; KEY_SIZE] {
    SigningKey::from_bytes(private).verifying_key().to_bytes()
}

impl CurvePrimitives for Ed25519Key {
    const KEY_LEN: usize = KEY_SIZE;

    fn generate(&mut self, rng: &mut dyn RandomSource, len: usize) -> Result<(), KeyMgmtError> {
        if len != KEY_SIZE {
            return Err(KeyMgmtError::generation(format!(
                "unsupported key size {len}"
            )));
        }
        let mut seed = [0u8; KEY_SIZE];
        rng.fill(&mut seed)?;
        let result = self
            .import_private(&seed, Endianness::Little)
            .map_err(KeyMgmtError::generation);
        seed.zeroize();
        result
    }

    fn import_public(&mut self, input: &[u8], _endian: Endianness) -> Result<(), KeyMgmtError> {
        let point = to_array(input)?;
        VerifyingKey::from_bytes(&point).map_err(KeyMgmtError::import)?;
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
            (None, Some(private)) => write_out(&derive_public(private), out),
            (None, None) => Err(KeyMgmtError::export("no public key")),
        }
    }

    fn import_private(&mut self, input: &[u8], _endian: Endianness) -> Result<(), KeyMgmtError> {
        let mut seed = to_array(input)?;
        self.public = Some(derive_public(&seed));
        self.private = Some(seed);
        seed.zeroize();
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
        let point = to_array(input)?;
        VerifyingKey::from_bytes(&point).map_err(KeyMgmtError::import)?;
        Ok(())
    }

    fn check_key(&self) -> Result<(), KeyMgmtError> {
        let public = self
            .public
            .as_ref()
            .ok_or_else(|| KeyMgmtError::import("no public key"))?;
        match &self.private {
            Some(private) if derive_public(private) != *public => {
                Err(KeyMgmtError::import("public key does not match private key"))
            }
            Some(_) => Ok(()),
            None => Self::check_public(public, Endianness::Little),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 8032, section 7.1, test 1.
    const SECRET: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";
    const PUBLIC: &str = "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a";

    #[test]
    fn test_rfc8032_public_derivation() {
        let mut key = Ed25519Key::default();
        key.import_private(&hex::decode(SECRET).unwrap(), Endianness::Little)
            .unwrap();

        let mut out = [0u8; KEY_SIZE];
        key.export_public(Some(&mut out), Endianness::Little).unwrap();
        assert_eq!(hex::encode(out), PUBLIC);
        assert!(key.check_key().is_ok());
    }

    #[test]
    fn test_public_derived_lazily_when_not_cached() {
        let seed: [u8; KEY_SIZE] = hex::decode(SECRET).unwrap().try_into().unwrap();
        let key = Ed25519Key {
            private: Some(seed),
            public: None,
        };
        let mut out = [0u8; KEY_SIZE];
        key.export_public(Some(&mut out), Endianness::Little).unwrap();
        assert_eq!(hex::encode(out), PUBLIC);
    }

    #[test]
    fn test_mismatched_pair_fails_check() {
        let mut key = Ed25519Key::default();
        key.import_private(&hex::decode(SECRET).unwrap(), Endianness::Little)
            .unwrap();

        let mut other = Ed25519Key::default();
        other.import_private(&[7u8; KEY_SIZE], Endianness::Little).unwrap();
        let mut other_public = [0u8; KEY_SIZE];
        other
            .export_public(Some(&mut other_public), Endianness::Little)
            .unwrap();

        key.import_public(&other_public, Endianness::Little).unwrap();
        assert!(key.check_key().is_err());
    }

    #[test]
    fn test_import_public_wrong_length() {
        let mut key = Ed25519Key::default();
        assert!(matches!(
            key.import_public(&[1u8; 31], Endianness::Little),
            Err(KeyMgmtError::Import(_))
        ));
    }

    #[test]
    fn test_import_public_not_a_point() {
        let mut key = Ed25519Key::default();
        assert!(key.import_public(&[0x02; 32], Endianness::Little).is_err());
        assert!(Ed25519Key::check_public(&[0x02; 32], Endianness::Little).is_err());
    }
}

//! X25519 key primitives (x25519-dalek).

use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{is_zero_or_one, le_ge, to_le_array, write_out, CurvePrimitives};
use crate::descriptor::Endianness;
use crate::error::KeyMgmtError;
use crate::rng::RandomSource;

const KEY_SIZE: usize = 32;

/// p - 1 for p = 2^255 - 19, little-endian.
const P_MINUS_ONE: [u8; KEY_SIZE] = [
    0xec, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x7f,
];

/// X25519 key state. Both halves are stored little-endian.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct X25519Key {
    private: Option<[u8; KEY_SIZE]>,
    public: Option<[u8; KEY_SIZE]>,
}

fn derive_public(private: &[u8; KEY_SIZE]) -> [u8; KEY_SIZE] {
    let secret = StaticSecret::from(*private);
    PublicKey::from(&secret).to_bytes()
}

fn clamp(scalar: &mut [u8; KEY_SIZE]) {
    scalar[0] &= 248;
    scalar[31] &= 127;
    scalar[31] |= 64;
}

impl CurvePrimitives for X25519Key {
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
        let mut point: [u8; KEY_SIZE] = to_le_array(input, endian)?;
        // The u-coordinate only uses 255 bits; encoders may leave the top bit set.
        point[KEY_SIZE - 1] &= 0x7f;
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
            (None, Some(private)) => derive_public(private),
            (None, None) => return Err(KeyMgmtError::export("no public key")),
        };
        if endian == Endianness::Big {
            point.reverse();
        }
        write_out(&point, out)
    }

    fn import_private(&mut self, input: &[u8], endian: Endianness) -> Result<(), KeyMgmtError> {
        let mut scalar: [u8; KEY_SIZE] = to_le_array(input, endian)?;
        self.public = Some(derive_public(&scalar));
        self.private = Some(scalar);
        scalar.zeroize();
        Ok(())
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
        if point[KEY_SIZE - 1] & 0x80 != 0 {
            return Err(KeyMgmtError::import("public key has top bit set"));
        }
        if le_ge(&point, &P_MINUS_ONE) {
            return Err(KeyMgmtError::import("public key out of range"));
        }
        Ok(())
    }

    fn check_key(&self) -> Result<(), KeyMgmtError> {
        // Clamping makes every private scalar valid.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 7748, section 6.1.
    const ALICE_PRIVATE: &str = "77076d0a7318a57d3c16c17251b26645df4c2f87ebc0992ab177fba51db92c2a";
    const ALICE_PUBLIC: &str = "8520f0098930a754748b7ddcb43ef75a0dbf3a0d26381af4eba4a98eaa9b4e6a";

    #[test]
    fn test_rfc7748_public_derivation() {
        let private = hex::decode(ALICE_PRIVATE).unwrap();
        let mut key = X25519Key::default();
        key.import_private(&private, Endianness::Little).unwrap();

        let mut out = [0u8; KEY_SIZE];
        let len = key.export_public(Some(&mut out), Endianness::Little).unwrap();
        assert_eq!(len, KEY_SIZE);
        assert_eq!(hex::encode(out), ALICE_PUBLIC);
    }

    #[test]
    fn test_big_endian_import_reverses() {
        let mut private = hex::decode(ALICE_PRIVATE).unwrap();
        private.reverse();
        let mut key = X25519Key::default();
        key.import_private(&private, Endianness::Big).unwrap();

        let mut out = [0u8; KEY_SIZE];
        key.export_private(Some(&mut out)).unwrap();
        assert_eq!(hex::encode(out), ALICE_PRIVATE);
    }

    #[test]
    fn test_top_bit_masked_on_import() {
        let mut public = hex::decode(ALICE_PUBLIC).unwrap();
        let mut plain = X25519Key::default();
        plain.import_public(&public, Endianness::Little).unwrap();

        public[31] |= 0x80;
        let mut masked = X25519Key::default();
        masked.import_public(&public, Endianness::Little).unwrap();

        assert_eq!(plain.public, masked.public);
    }

    #[test]
    fn test_check_public_rejects_degenerate_points() {
        assert!(X25519Key::check_public(&[0u8; 32], Endianness::Little).is_err());
        let mut one = [0u8; 32];
        one[0] = 1;
        assert!(X25519Key::check_public(&one, Endianness::Little).is_err());
        assert!(X25519Key::check_public(&P_MINUS_ONE, Endianness::Little).is_err());
        assert!(X25519Key::check_public(&[0xff; 32], Endianness::Little).is_err());

        let public = hex::decode(ALICE_PUBLIC).unwrap();
        assert!(X25519Key::check_public(&public, Endianness::Little).is_ok());
    }

    #[test]
    fn test_export_without_material_fails() {
        let key = X25519Key::default();
        assert!(key.export_public(None, Endianness::Little).is_err());
        assert!(key.export_private(None).is_err());
    }
}

//! Curve descriptors.
//!
//! One immutable descriptor exists per supported family. A key object is
//! bound to its descriptor at creation and keeps it for life.

use std::fmt;

use pkcs8::ObjectIdentifier;

use crate::error::KeyMgmtError;
use crate::primitives::KeyMaterial;

/// Supported curve families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurveFamily {
    X25519,
    X448,
    Ed25519,
    Ed448,
}

impl CurveFamily {
    pub const ALL: [CurveFamily; 4] = [
        CurveFamily::X25519,
        CurveFamily::X448,
        CurveFamily::Ed25519,
        CurveFamily::Ed448,
    ];

    pub fn descriptor(self) -> &'static CurveDescriptor {
        match self {
            Self::X25519 => &X25519,
            Self::X448 => &X448,
            Self::Ed25519 => &ED25519,
            Self::Ed448 => &ED448,
        }
    }

    pub fn kind(self) -> FamilyKind {
        match self {
            Self::X25519 | Self::X448 => FamilyKind::KeyExchange,
            Self::Ed25519 | Self::Ed448 => FamilyKind::Signature,
        }
    }

    /// Stable type tag exposed to callers.
    pub fn as_str(self) -> &'static str {
        self.descriptor().name
    }
}

impl fmt::Display for CurveFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a family is used, which decides its validation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamilyKind {
    /// Montgomery-form Diffie-Hellman curve.
    KeyExchange,
    /// Edwards-form signature curve.
    Signature,
}

/// Byte order of a raw key encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endianness {
    #[default]
    Little,
    Big,
}

/// Static per-family record of sizes and identifiers.
#[derive(Debug)]
pub struct CurveDescriptor {
    pub family: CurveFamily,
    /// Nominal field size in bits.
    pub bits: u32,
    /// Length of a raw public or private key.
    pub encoded_len: usize,
    /// Group name and type tag.
    pub name: &'static str,
    /// Algorithm identifier used in SubjectPublicKeyInfo and PKCS#8.
    pub oid: ObjectIdentifier,
}

pub static X25519: CurveDescriptor = CurveDescriptor {
    family: CurveFamily::X25519,
    bits: 255,
    encoded_len: 32,
    name: "X25519",
    oid: ObjectIdentifier::new_unwrap("1.3.101.110"),
};

pub static X448: CurveDescriptor = CurveDescriptor {
    family: CurveFamily::X448,
    bits: 448,
    encoded_len: 56,
    name: "X448",
    oid: ObjectIdentifier::new_unwrap("1.3.101.111"),
};

pub static ED25519: CurveDescriptor = CurveDescriptor {
    family: CurveFamily::Ed25519,
    bits: 255,
    encoded_len: 32,
    name: "ED25519",
    oid: ObjectIdentifier::new_unwrap("1.3.101.112"),
};

pub static ED448: CurveDescriptor = CurveDescriptor {
    family: CurveFamily::Ed448,
    bits: 448,
    encoded_len: 57,
    name: "ED448",
    oid: ObjectIdentifier::new_unwrap("1.3.101.113"),
};

/// Largest raw key length over all families.
pub const MAX_KEY_SIZE: usize = 57;

/// Security strength advertised for a nominal curve size.
pub fn security_bits_for(bits: u32) -> u32 {
    if bits >= 448 {
        192
    } else if bits >= 255 {
        128
    } else {
        0
    }
}

impl CurveDescriptor {
    pub fn kind(&self) -> FamilyKind {
        self.family.kind()
    }

    pub fn security_bits(&self) -> u32 {
        security_bits_for(self.bits)
    }

    /// Look a descriptor up by group name or type tag (ASCII case-insensitive).
    pub fn by_name(name: &str) -> Option<&'static CurveDescriptor> {
        CurveFamily::ALL
            .iter()
            .map(|f| f.descriptor())
            .find(|d| d.name.eq_ignore_ascii_case(name))
    }

    /// Initialize empty key material for this family.
    pub fn init_material(&self) -> Result<KeyMaterial, KeyMgmtError> {
        KeyMaterial::init(self.family)
    }
}

impl PartialEq for CurveDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.family == other.family
    }
}

impl Eq for CurveDescriptor {}

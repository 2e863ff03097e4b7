//! Key management for the X25519, X448, Ed25519 and Ed448 curve families.
//!
//! This crate provides:
//! - Reference-counted key objects bound to one curve family
//! - Import/export of key material as named parameter lists
//! - Key equality and validation checks
//! - Key-pair generation contexts
//! - Decoding from SubjectPublicKeyInfo and PKCS#8 containers
//!
//! # Design
//!
//! Each family implements the same primitive operations
//! ([`primitives::CurvePrimitives`]); everything above that layer is written
//! once against [`primitives::KeyMaterial`]. Entry points are gated on a
//! [`ProviderContext`] readiness flag instead of process-global state.

#![forbid(unsafe_code)]

pub mod decode;
pub mod descriptor;
pub mod error;
pub mod generate;
pub mod key;
pub mod key_params;
pub mod keymgmt;
pub mod params;
pub mod primitives;
pub mod provider;
pub mod rng;
pub mod selection;
pub mod validate;

pub use decode::{ContainerKind, DecodeOutcome, DecodedObject, Decoder};
pub use descriptor::{CurveDescriptor, CurveFamily, Endianness, FamilyKind};
pub use error::KeyMgmtError;
pub use generate::GenContext;
pub use key::{KeyRef, KeySlot};
pub use keymgmt::KeyManager;
pub use params::{names, Param, ParamKind, ParamList, ParamSpec, ParamValue};
pub use provider::{ProviderContext, ProviderStats};
pub use rng::RandomSource;
pub use selection::Selection;
pub use validate::CheckType;

//! Presence, equality and validity checks.
//!
//! Every check reports a plain `bool`; a failed check never mutates the key.

use ecx_common::helpers::constant_time_eq;
use tracing::debug;
use zeroize::Zeroizing;

use crate::descriptor::{Endianness, FamilyKind};
use crate::key::KeyRef;
use crate::primitives::KeyMaterial;
use crate::selection::Selection;

/// Thoroughness requested by the caller. Both levels run the same checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckType {
    Quick,
    #[default]
    Full,
}

/// True if every key component named in `selection` is present.
pub fn has(key: &KeyRef, selection: Selection) -> bool {
    if !key.is_provider_running() {
        return false;
    }
    let state = key.read_state();
    (!selection.wants_public() || state.has_public)
        && (!selection.wants_private() || state.has_private)
}

fn export_public(key: &KeyRef) -> Option<Zeroizing<Vec<u8>>> {
    let state = key.read_state();
    if !state.has_public {
        return None;
    }
    let mut buf = Zeroizing::new(vec![0u8; key.descriptor().encoded_len]);
    let len = state
        .material
        .export_public(Some(&mut buf[..]), Endianness::Little)
        .ok()?;
    buf.truncate(len);
    Some(buf)
}

fn export_private(key: &KeyRef) -> Option<Zeroizing<Vec<u8>>> {
    let state = key.read_state();
    if !state.has_private {
        return None;
    }
    let mut buf = Zeroizing::new(vec![0u8; key.descriptor().encoded_len]);
    let len = state.material.export_private(Some(&mut buf[..])).ok()?;
    buf.truncate(len);
    Some(buf)
}

fn same_bytes(a: Option<Zeroizing<Vec<u8>>>, b: Option<Zeroizing<Vec<u8>>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => constant_time_eq(&a, &b),
        _ => false,
    }
}

/// True if the components named in `selection` are equal in both keys.
pub fn match_keys(a: &KeyRef, b: &KeyRef, selection: Selection) -> bool {
    if !a.is_provider_running() {
        return false;
    }
    if !selection.is_empty() && a.family() != b.family() {
        return false;
    }
    if selection.wants_private() && !same_bytes(export_private(a), export_private(b)) {
        return false;
    }
    if selection.wants_public() && !same_bytes(export_public(a), export_public(b)) {
        return false;
    }
    true
}

/// Check the components named in `selection` are sound for the key's family.
pub fn validate(key: &KeyRef, selection: Selection, check: CheckType) -> bool {
    if !key.is_provider_running() {
        return false;
    }
    let valid = match key.descriptor().kind() {
        FamilyKind::KeyExchange => validate_key_exchange(key, selection),
        FamilyKind::Signature => validate_signature(key, selection),
    };
    if !valid {
        debug!(family = %key.family(), ?selection, ?check, "key validation failed");
    }
    valid
}

fn validate_key_exchange(key: &KeyRef, selection: Selection) -> bool {
    if selection.wants_public() {
        let Some(public) = export_public(key) else {
            return false;
        };
        if KeyMaterial::check_public(key.family(), &public, Endianness::Little).is_err() {
            return false;
        }
    }
    // Clamping makes any stored private scalar valid.
    !selection.wants_private() || key.has_private()
}

fn validate_signature(key: &KeyRef, selection: Selection) -> bool {
    let state = key.read_state();
    if selection.wants_public() && !state.has_public {
        return false;
    }
    if selection.wants_private() && !state.has_private {
        return false;
    }
    if selection.wants_keypair() {
        return state.material.check_key().is_ok();
    }
    true
}

//! Decoding keys from DER containers.
//!
//! A [`Decoder`] is bound to one curve family and one container kind. Input
//! that is not that container for that family is a non-match, not an error,
//! so several decoders can probe the same bytes. Once the container is
//! recognized, any failure is a hard error.

use std::io::Read;
use std::sync::Arc;

use ecx_common::helpers::constant_time_eq;
use pkcs8::der::asn1::OctetStringRef;
use pkcs8::der::Decode;
use pkcs8::spki::SubjectPublicKeyInfoRef;
use pkcs8::PrivateKeyInfo;
use tracing::{debug, trace};
use zeroize::Zeroizing;

use crate::descriptor::{CurveDescriptor, CurveFamily, Endianness, MAX_KEY_SIZE};
use crate::error::KeyMgmtError;
use crate::key::KeyRef;
use crate::key_params;
use crate::params::ParamList;
use crate::provider::ProviderContext;
use crate::selection::Selection;

/// Serialized container a decoder accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// X.509 SubjectPublicKeyInfo: public key only.
    SubjectPublicKeyInfo,
    /// PKCS#8 PrivateKeyInfo, optionally carrying the public key (v2).
    PrivateKeyInfo,
}

/// Result of a decode attempt that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// A key was built and handed to the sink.
    Decoded,
    /// The input is not this decoder's container or family.
    NotRecognized,
}

/// What a successful decode hands to the sink.
#[derive(Debug)]
pub struct DecodedObject {
    /// Family type tag, e.g. `"X25519"`.
    pub data_type: &'static str,
    pub key: KeyRef,
}

/// Read an entire DER blob from `reader`.
pub fn read_der<R: Read>(mut reader: R) -> Result<Zeroizing<Vec<u8>>, KeyMgmtError> {
    let mut buf = Zeroizing::new(Vec::new());
    reader
        .read_to_end(&mut buf)
        .map_err(|e| KeyMgmtError::Decode(format!("read failed: {e}")))?;
    Ok(buf)
}

pub struct Decoder {
    provider: Arc<ProviderContext>,
    descriptor: &'static CurveDescriptor,
    kind: ContainerKind,
    selection: Selection,
}

impl Decoder {
    pub fn new(
        provider: &Arc<ProviderContext>,
        family: CurveFamily,
        kind: ContainerKind,
    ) -> Result<Self, KeyMgmtError> {
        if !provider.is_running() {
            return Err(KeyMgmtError::NotRunning);
        }
        Ok(Self {
            provider: Arc::clone(provider),
            descriptor: family.descriptor(),
            kind,
            selection: Selection::empty(),
        })
    }

    pub fn family(&self) -> CurveFamily {
        self.descriptor.family
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    /// True if this decoder can produce the components in `selection`.
    pub fn does_selection(&self, selection: Selection) -> bool {
        if selection.is_empty() {
            return true;
        }
        match self.kind {
            ContainerKind::SubjectPublicKeyInfo => selection.wants_public(),
            ContainerKind::PrivateKeyInfo => selection.wants_private(),
        }
    }

    /// Decode one key from `reader` and pass it to `sink`.
    pub fn decode<R, F>(
        &mut self,
        reader: R,
        selection: Selection,
        sink: F,
    ) -> Result<DecodeOutcome, KeyMgmtError>
    where
        R: Read,
        F: FnOnce(DecodedObject) -> anyhow::Result<()>,
    {
        self.selection = selection;
        let der = read_der(reader)?;

        let key = match self.kind {
            ContainerKind::SubjectPublicKeyInfo => self.decode_spki(&der)?,
            ContainerKind::PrivateKeyInfo => self.decode_pkcs8(&der)?,
        };
        let Some(key) = key else {
            trace!(family = %self.family(), kind = ?self.kind, "input not recognized");
            return Ok(DecodeOutcome::NotRecognized);
        };

        debug!(family = %self.family(), kind = ?self.kind, "key decoded");
        sink(DecodedObject {
            data_type: self.descriptor.name,
            key,
        })
        .map_err(|e| KeyMgmtError::Callback(e.to_string()))?;
        Ok(DecodeOutcome::Decoded)
    }

    /// Export a decoded key with the selection of the last decode.
    pub fn export_object<F>(&self, key: &KeyRef, sink: F) -> Result<(), KeyMgmtError>
    where
        F: FnOnce(&ParamList) -> anyhow::Result<()>,
    {
        if key.family() != self.family() {
            return Err(KeyMgmtError::export(format!(
                "key is {}, decoder is {}",
                key.family(),
                self.family()
            )));
        }
        key_params::export(key, self.selection, sink)
    }

    fn decode_spki(&self, der: &[u8]) -> Result<Option<KeyRef>, KeyMgmtError> {
        let Ok(spki) = SubjectPublicKeyInfoRef::from_der(der) else {
            return Ok(None);
        };
        if spki.algorithm.oid != self.descriptor.oid {
            return Ok(None);
        }

        let public = spki
            .subject_public_key
            .as_bytes()
            .ok_or_else(|| KeyMgmtError::Decode("public key has unused bits".into()))?;

        let key = KeyRef::create(&self.provider, self.descriptor)?;
        key.update(|state| {
            state.material.import_public(public, Endianness::Little)?;
            state.has_public = true;
            Ok(())
        })
        .map_err(|e| KeyMgmtError::Decode(e.to_string()))?;
        Ok(Some(key))
    }

    fn decode_pkcs8(&self, der: &[u8]) -> Result<Option<KeyRef>, KeyMgmtError> {
        let Ok(info) = PrivateKeyInfo::from_der(der) else {
            return Ok(None);
        };
        if info.algorithm.oid != self.descriptor.oid {
            return Ok(None);
        }

        // CurvePrivateKey ::= OCTET STRING, nested inside the privateKey field.
        let private = OctetStringRef::from_der(info.private_key)
            .map_err(|e| KeyMgmtError::Decode(format!("private key: {e}")))?;
        let embedded_public = info.public_key;

        let key = KeyRef::create(&self.provider, self.descriptor)?;
        key.update(|state| {
            state
                .material
                .import_private(private.as_bytes(), Endianness::Little)?;
            if let Some(embedded) = embedded_public {
                let mut derived = Zeroizing::new([0u8; MAX_KEY_SIZE]);
                let len = state
                    .material
                    .export_public(Some(&mut derived[..]), Endianness::Little)?;
                if !constant_time_eq(&derived[..len], embedded) {
                    return Err(KeyMgmtError::import(
                        "embedded public key does not match private key",
                    ));
                }
            }
            state.has_private = true;
            state.has_public = true;
            Ok(())
        })
        .map_err(|e| KeyMgmtError::Decode(e.to_string()))?;
        Ok(Some(key))
    }
}

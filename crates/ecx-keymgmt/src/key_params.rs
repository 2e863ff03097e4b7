//! Parameter I/O: get/set/import/export of key material as named parameters.

use tracing::{debug, trace};
use zeroize::Zeroizing;

use crate::descriptor::Endianness;
use crate::error::KeyMgmtError;
use crate::key::KeyRef;
use crate::params::{names, Param, ParamList, ParamSpec};
use crate::selection::Selection;

static NO_KEY_TYPES: [ParamSpec; 0] = [];
static PRIVATE_KEY_TYPES: [ParamSpec; 1] = [ParamSpec::octet_string(names::PRIVATE_KEY)];
static PUBLIC_KEY_TYPES: [ParamSpec; 1] = [ParamSpec::octet_string(names::PUBLIC_KEY)];
static KEYPAIR_TYPES: [ParamSpec; 2] = [
    ParamSpec::octet_string(names::PRIVATE_KEY),
    ParamSpec::octet_string(names::PUBLIC_KEY),
];

static GETTABLE: [ParamSpec; 6] = [
    ParamSpec::integer(names::BITS),
    ParamSpec::integer(names::SECURITY_BITS),
    ParamSpec::integer(names::MAX_SIZE),
    ParamSpec::octet_string(names::ENCODED_PUBLIC_KEY),
    ParamSpec::octet_string(names::PUBLIC_KEY),
    ParamSpec::octet_string(names::PRIVATE_KEY),
];

static SETTABLE: [ParamSpec; 1] = [ParamSpec::octet_string(names::ENCODED_PUBLIC_KEY)];

static GEN_SETTABLE: [ParamSpec; 1] = [ParamSpec::utf8_string(names::GROUP_NAME)];

/// Fields expected for `selection`, used for both import and export.
pub fn key_types(selection: Selection) -> &'static [ParamSpec] {
    match (selection.wants_private(), selection.wants_public()) {
        (false, false) => &NO_KEY_TYPES,
        (true, false) => &PRIVATE_KEY_TYPES,
        (false, true) => &PUBLIC_KEY_TYPES,
        (true, true) => &KEYPAIR_TYPES,
    }
}

pub fn gettable_params() -> &'static [ParamSpec] {
    &GETTABLE
}

pub fn settable_params() -> &'static [ParamSpec] {
    &SETTABLE
}

pub fn gen_settable_params() -> &'static [ParamSpec] {
    &GEN_SETTABLE
}

/// Answer every recognized entry of `params` from `key`.
///
/// Unknown names are left untouched. Octet entries without a buffer only
/// receive the required length.
pub fn get_params(key: &KeyRef, params: &mut ParamList) -> Result<(), KeyMgmtError> {
    let descriptor = key.descriptor();
    let state = key.read_state();
    let len = descriptor.encoded_len;

    for param in params.iter_mut() {
        match param.name() {
            names::MAX_SIZE => param.set_integer(len as i64)?,
            names::BITS => param.set_integer(i64::from(descriptor.bits))?,
            names::SECURITY_BITS => param.set_integer(i64::from(descriptor.security_bits()))?,
            names::ENCODED_PUBLIC_KEY | names::PUBLIC_KEY => {
                param.answer_octets(|buf| match buf {
                    None => Ok(len),
                    Some(buf) => state.material.export_public(Some(buf), Endianness::Little),
                })?
            }
            names::PRIVATE_KEY => param.answer_octets(|buf| match buf {
                None => Ok(len),
                Some(buf) => state.material.export_private(Some(buf)),
            })?,
            other => trace!(name = other, "ignoring unknown parameter"),
        }
    }
    Ok(())
}

/// Apply settable parameters. Only `encoded-public-key` is recognized.
pub fn set_params(key: &KeyRef, params: &ParamList) -> Result<(), KeyMgmtError> {
    let Some(encoded) = params.get_octet_string(names::ENCODED_PUBLIC_KEY)? else {
        return Ok(());
    };
    key.update(|state| {
        state.material.import_public(encoded, Endianness::Little)?;
        state.has_public = true;
        Ok(())
    })
}

/// Import the components named by `selection` from `params`.
///
/// Either every requested component present in `params` is imported, or the
/// key is left unchanged.
pub fn import(key: &KeyRef, selection: Selection, params: &ParamList) -> Result<(), KeyMgmtError> {
    key.ensure_running()?;
    if !selection.is_supported() {
        return Err(KeyMgmtError::import(format!(
            "unsupported selection {:#x}",
            selection.bits()
        )));
    }

    let private = if selection.wants_private() {
        params.get_octet_string(names::PRIVATE_KEY)?
    } else {
        None
    };
    let public = if selection.wants_public() {
        params.get_octet_string(names::PUBLIC_KEY)?
    } else {
        None
    };
    if private.is_none() && public.is_none() {
        return Err(KeyMgmtError::import("no selected key component in input"));
    }

    key.update(|state| {
        if let Some(private) = private {
            state.material.import_private(private, Endianness::Little)?;
            state.has_private = true;
            state.has_public = true;
        }
        if let Some(public) = public {
            state.material.import_public(public, Endianness::Little)?;
            state.has_public = true;
        }
        Ok(())
    })?;

    debug!(
        family = %key.family(),
        private = private.is_some(),
        public = public.is_some(),
        "key material imported"
    );
    Ok(())
}

/// Export the key to `sink` as a parameter list.
///
/// The public key is always included; the private key is added when
/// `selection` asks for it. The transient buffers are wiped on every path.
pub fn export<F>(key: &KeyRef, selection: Selection, sink: F) -> Result<(), KeyMgmtError>
where
    F: FnOnce(&ParamList) -> anyhow::Result<()>,
{
    key.ensure_running()?;
    let len = key.descriptor().encoded_len;
    let with_private = selection.wants_private();
    let count = if with_private { 2 } else { 1 };
    let mut buf = Zeroizing::new(vec![0u8; len * count]);

    let mut list = ParamList::new();
    {
        let state = key.read_state();
        let (public_buf, private_buf) = buf.split_at_mut(len);
        let public_len = state
            .material
            .export_public(Some(public_buf), Endianness::Little)?;
        list.push(Param::octet_string(names::PUBLIC_KEY, &public_buf[..public_len]));

        if with_private {
            let private_len = state.material.export_private(Some(private_buf))?;
            list.push(Param::octet_string(names::PRIVATE_KEY, &private_buf[..private_len]));
        }
    }

    sink(&list).map_err(|e| KeyMgmtError::Callback(e.to_string()))
}

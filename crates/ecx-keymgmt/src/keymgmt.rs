//! Per-family key manager: the single dispatch surface callers use.

use std::sync::Arc;

use crate::descriptor::{CurveDescriptor, CurveFamily};
use crate::error::KeyMgmtError;
use crate::generate::GenContext;
use crate::key::{KeyRef, KeySlot};
use crate::key_params;
use crate::params::{ParamList, ParamSpec};
use crate::provider::ProviderContext;
use crate::rng::RandomSource;
use crate::selection::Selection;
use crate::validate::{self, CheckType};

/// Key-management operations for one curve family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyManager {
    descriptor: &'static CurveDescriptor,
}

impl KeyManager {
    pub fn for_family(family: CurveFamily) -> Self {
        Self {
            descriptor: family.descriptor(),
        }
    }

    /// Look a manager up by type tag, ignoring ASCII case.
    pub fn for_name(name: &str) -> Option<Self> {
        CurveDescriptor::by_name(name).map(|descriptor| Self { descriptor })
    }

    pub fn x25519() -> Self {
        Self::for_family(CurveFamily::X25519)
    }

    pub fn x448() -> Self {
        Self::for_family(CurveFamily::X448)
    }

    pub fn ed25519() -> Self {
        Self::for_family(CurveFamily::Ed25519)
    }

    pub fn ed448() -> Self {
        Self::for_family(CurveFamily::Ed448)
    }

    pub fn descriptor(&self) -> &'static CurveDescriptor {
        self.descriptor
    }

    pub fn family(&self) -> CurveFamily {
        self.descriptor.family
    }

    /// Type tag of the keys this manager handles.
    pub fn query_operation_name(&self) -> &'static str {
        self.descriptor.name
    }

    /// Create an empty key.
    pub fn new_key(&self, provider: &Arc<ProviderContext>) -> Result<KeyRef, KeyMgmtError> {
        KeyRef::create(provider, self.descriptor)
    }

    pub fn free(&self, key: KeyRef) {
        key.release();
    }

    pub fn dup(&self, key: &KeyRef, selection: Selection) -> Result<KeyRef, KeyMgmtError> {
        key.duplicate(selection)
    }

    /// Take the key out of `slot`. Keys of another family are left in place.
    pub fn load(&self, slot: &KeySlot) -> Option<KeyRef> {
        let family = self.family();
        slot.take_if(|key| key.family() == family)
    }

    pub fn get_params(&self, key: &KeyRef, params: &mut ParamList) -> Result<(), KeyMgmtError> {
        key_params::get_params(key, params)
    }

    pub fn gettable_params(&self) -> &'static [ParamSpec] {
        key_params::gettable_params()
    }

    pub fn set_params(&self, key: &KeyRef, params: &ParamList) -> Result<(), KeyMgmtError> {
        key_params::set_params(key, params)
    }

    pub fn settable_params(&self) -> &'static [ParamSpec] {
        key_params::settable_params()
    }

    /// True if `key` exists and holds every component in `selection`.
    pub fn has(&self, key: Option<&KeyRef>, selection: Selection) -> bool {
        key.is_some_and(|key| validate::has(key, selection))
    }

    pub fn matches(&self, a: &KeyRef, b: &KeyRef, selection: Selection) -> bool {
        validate::match_keys(a, b, selection)
    }

    pub fn validate(&self, key: &KeyRef, selection: Selection, check: CheckType) -> bool {
        validate::validate(key, selection, check)
    }

    pub fn import(
        &self,
        key: &KeyRef,
        selection: Selection,
        params: &ParamList,
    ) -> Result<(), KeyMgmtError> {
        key_params::import(key, selection, params)
    }

    pub fn import_types(&self, selection: Selection) -> &'static [ParamSpec] {
        key_params::key_types(selection)
    }

    pub fn export<F>(&self, key: &KeyRef, selection: Selection, sink: F) -> Result<(), KeyMgmtError>
    where
        F: FnOnce(&ParamList) -> anyhow::Result<()>,
    {
        key_params::export(key, selection, sink)
    }

    pub fn export_types(&self, selection: Selection) -> &'static [ParamSpec] {
        key_params::key_types(selection)
    }

    pub fn gen_init(
        &self,
        provider: &Arc<ProviderContext>,
        selection: Selection,
        params: &ParamList,
    ) -> Result<GenContext, KeyMgmtError> {
        GenContext::init(provider, self.descriptor, selection, params)
    }

    pub fn gen_init_with_rng(
        &self,
        provider: &Arc<ProviderContext>,
        selection: Selection,
        params: &ParamList,
        rng: Box<dyn RandomSource>,
    ) -> Result<GenContext, KeyMgmtError> {
        GenContext::init_with_rng(provider, self.descriptor, selection, params, rng)
    }

    pub fn gen_set_params(
        &self,
        ctx: &mut GenContext,
        params: &ParamList,
    ) -> Result<(), KeyMgmtError> {
        ctx.set_params(params)
    }

    pub fn gen_settable_params(&self) -> &'static [ParamSpec] {
        key_params::gen_settable_params()
    }

    pub fn gen(&self, ctx: &mut GenContext) -> Result<KeyRef, KeyMgmtError> {
        ctx.generate()
    }

    pub fn gen_cleanup(&self, ctx: GenContext) {
        ctx.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(KeyManager::for_name("ed448"), Some(KeyManager::ed448()));
        assert!(KeyManager::for_name("secp256k1").is_none());
        assert_eq!(KeyManager::x448().query_operation_name(), "X448");
        assert_eq!(KeyManager::ed25519().family(), CurveFamily::Ed25519);
    }

    #[test]
    fn test_has_without_key() {
        assert!(!KeyManager::x25519().has(None, Selection::empty()));
    }

    #[test]
    fn test_load_leaves_other_family() {
        let provider = ProviderContext::with_defaults();
        let slot = KeySlot::new(KeyManager::x25519().new_key(&provider).unwrap());
        assert!(KeyManager::ed25519().load(&slot).is_none());
        assert!(!slot.is_empty());
        assert!(KeyManager::x25519().load(&slot).is_some());
        assert!(slot.is_empty());
    }
}

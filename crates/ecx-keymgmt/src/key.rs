//! Key objects and their lifecycle.
//!
//! A [`KeyRef`] is one counted reference to a shared key object. The count is
//! kept under a per-object lock; the reference that brings it to zero frees
//! the key material. Handles are not `Clone`: sharing goes through
//! [`KeyRef::up_reference`], which can fail.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use tracing::{debug, trace, warn};

use crate::descriptor::{CurveDescriptor, CurveFamily, Endianness, MAX_KEY_SIZE};
use crate::error::KeyMgmtError;
use crate::primitives::KeyMaterial;
use crate::provider::ProviderContext;
use crate::selection::Selection;

/// Mutable contents of a key object.
#[derive(Clone)]
pub(crate) struct KeyState {
    pub(crate) material: KeyMaterial,
    pub(crate) has_public: bool,
    pub(crate) has_private: bool,
    pub(crate) include_public: bool,
}

#[cfg(not(feature = "single-threaded"))]
struct RefCounter(Mutex<usize>);

#[cfg(not(feature = "single-threaded"))]
impl RefCounter {
    fn new() -> Self {
        Self(Mutex::new(1))
    }

    fn increment(&self) -> Result<usize, KeyMgmtError> {
        let mut count = self.0.lock().map_err(|_| KeyMgmtError::Lock)?;
        *count += 1;
        Ok(*count)
    }

    /// Decrements even when the lock is poisoned so the key is still freed.
    fn decrement(&self) -> usize {
        let mut count = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        *count -= 1;
        *count
    }

    fn get(&self) -> usize {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(feature = "single-threaded")]
struct RefCounter(std::cell::Cell<usize>);

#[cfg(feature = "single-threaded")]
impl RefCounter {
    fn new() -> Self {
        Self(std::cell::Cell::new(1))
    }

    fn increment(&self) -> Result<usize, KeyMgmtError> {
        self.0.set(self.0.get() + 1);
        Ok(self.0.get())
    }

    fn decrement(&self) -> usize {
        self.0.set(self.0.get() - 1);
        self.0.get()
    }

    fn get(&self) -> usize {
        self.0.get()
    }
}

struct KeyInner {
    descriptor: &'static CurveDescriptor,
    state: RwLock<KeyState>,
    ref_count: RefCounter,
    provider: Weak<ProviderContext>,
}

/// A counted reference to a key object.
pub struct KeyRef {
    inner: Arc<KeyInner>,
}

impl KeyRef {
    /// Create an empty key object bound to `descriptor`.
    pub fn create(
        provider: &Arc<ProviderContext>,
        descriptor: &'static CurveDescriptor,
    ) -> Result<Self, KeyMgmtError> {
        if !provider.is_running() {
            warn!(family = %descriptor.family, "key creation refused: provider not running");
            return Err(KeyMgmtError::NotRunning);
        }

        let material = descriptor.init_material()?;
        let state = KeyState {
            material,
            has_public: false,
            has_private: false,
            include_public: provider.config().include_public_in_private_encoding,
        };

        provider.record_created();
        debug!(family = %descriptor.family, "key object created");

        Ok(Self {
            inner: Arc::new(KeyInner {
                descriptor,
                state: RwLock::new(state),
                ref_count: RefCounter::new(),
                provider: Arc::downgrade(provider),
            }),
        })
    }

    /// Take another reference to the same key object.
    pub fn up_reference(&self) -> Result<KeyRef, KeyMgmtError> {
        match self.inner.ref_count.increment() {
            Ok(count) => {
                trace!(family = %self.family(), count, "key reference taken");
                Ok(KeyRef {
                    inner: Arc::clone(&self.inner),
                })
            }
            Err(err) => {
                warn!(family = %self.family(), "failed to lock key reference count");
                Err(err)
            }
        }
    }

    /// Give up this reference. The last release frees the key material.
    pub fn release(self) {
        drop(self);
    }

    /// Copy the parts of this key named by `selection` into a new key object.
    ///
    /// Private material is only copied when `selection` includes the private
    /// key; a public-only selection yields a public-only copy.
    pub fn duplicate(&self, selection: Selection) -> Result<KeyRef, KeyMgmtError> {
        let provider = self.inner.provider.upgrade().ok_or(KeyMgmtError::NotRunning)?;
        let dst = KeyRef::create(&provider, self.inner.descriptor)?;

        let src = self.read_state();
        if selection.wants_private() {
            *dst.write_state() = src.clone();
        } else {
            let mut state = dst.write_state();
            state.include_public = src.include_public;
            if selection.wants_public() && src.has_public {
                let mut public = zeroize::Zeroizing::new([0u8; MAX_KEY_SIZE]);
                let len = src
                    .material
                    .export_public(Some(&mut public[..]), Endianness::Little)
                    .map_err(|e| KeyMgmtError::Init(e.to_string()))?;
                state
                    .material
                    .import_public(&public[..len], Endianness::Little)
                    .map_err(|e| KeyMgmtError::Init(e.to_string()))?;
                state.has_public = true;
            }
        }

        Ok(dst)
    }

    pub fn descriptor(&self) -> &'static CurveDescriptor {
        self.inner.descriptor
    }

    pub fn family(&self) -> CurveFamily {
        self.inner.descriptor.family
    }

    pub fn has_public(&self) -> bool {
        self.read_state().has_public
    }

    pub fn has_private(&self) -> bool {
        self.read_state().has_private
    }

    pub fn include_public_in_private_encoding(&self) -> bool {
        self.read_state().include_public
    }

    pub fn set_include_public_in_private_encoding(&self, include: bool) {
        self.write_state().include_public = include;
    }

    /// Current number of references.
    pub fn reference_count(&self) -> usize {
        self.inner.ref_count.get()
    }

    /// The provider that created this key, if it still exists.
    pub fn provider(&self) -> Option<Arc<ProviderContext>> {
        self.inner.provider.upgrade()
    }

    /// True while the owning provider exists and accepts work.
    pub fn is_provider_running(&self) -> bool {
        self.provider().is_some_and(|p| p.is_running())
    }

    pub(crate) fn ensure_running(&self) -> Result<(), KeyMgmtError> {
        if self.is_provider_running() {
            Ok(())
        } else {
            Err(KeyMgmtError::NotRunning)
        }
    }

    /// True if both handles refer to the same key object.
    pub fn ptr_eq(&self, other: &KeyRef) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn read_state(&self) -> RwLockReadGuard<'_, KeyState> {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write_state(&self) -> RwLockWriteGuard<'_, KeyState> {
        self.inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `f` to a copy of the key state and keep the copy only if `f`
    /// succeeds, so a failed call leaves the key as it was.
    pub(crate) fn update<T, F>(&self, f: F) -> Result<T, KeyMgmtError>
    where
        F: FnOnce(&mut KeyState) -> Result<T, KeyMgmtError>,
    {
        let mut state = self.write_state();
        let mut staged = state.clone();
        let value = f(&mut staged)?;
        *state = staged;
        Ok(value)
    }
}

impl Drop for KeyRef {
    fn drop(&mut self) {
        let remaining = self.inner.ref_count.decrement();
        trace!(family = %self.family(), remaining, "key reference released");
        if remaining != 0 {
            return;
        }

        {
            let mut state = self.write_state();
            state.material.free();
            state.has_public = false;
            state.has_private = false;
        }
        if let Some(provider) = self.inner.provider.upgrade() {
            provider.record_destroyed();
        }
        debug!(family = %self.family(), "key object destroyed");
    }
}

impl fmt::Debug for KeyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read_state();
        f.debug_struct("KeyRef")
            .field("family", &self.family())
            .field("has_public", &state.has_public)
            .field("has_private", &state.has_private)
            .field("references", &self.reference_count())
            .finish()
    }
}

/// Single-use holder that hands a key over exactly once.
///
/// A slot is written at most once and read at most once. After the key has
/// been taken the slot stays spent and refuses further stores.
#[derive(Default)]
pub struct KeySlot {
    slot: Mutex<SlotState>,
}

#[derive(Default)]
enum SlotState {
    #[default]
    Empty,
    Filled(KeyRef),
    Taken,
}

impl KeySlot {
    pub fn new(key: KeyRef) -> Self {
        Self {
            slot: Mutex::new(SlotState::Filled(key)),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SlotState> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Put a key into a slot that has never held one. Returns the key back
    /// otherwise.
    pub fn store(&self, key: KeyRef) -> Result<(), KeyRef> {
        let mut slot = self.lock();
        if !matches!(*slot, SlotState::Empty) {
            return Err(key);
        }
        *slot = SlotState::Filled(key);
        Ok(())
    }

    /// Take the key out, leaving the slot spent.
    pub fn load(&self) -> Option<KeyRef> {
        self.take_if(|_| true)
    }

    /// Take the key out only if `accept` approves it. The check and the take
    /// happen under one lock, so a rejected key stays in place.
    pub fn take_if(&self, accept: impl FnOnce(&KeyRef) -> bool) -> Option<KeyRef> {
        let mut slot = self.lock();
        match &*slot {
            SlotState::Filled(key) if accept(key) => {}
            _ => return None,
        }
        match std::mem::replace(&mut *slot, SlotState::Taken) {
            SlotState::Filled(key) => Some(key),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        !matches!(*self.lock(), SlotState::Filled(_))
    }
}

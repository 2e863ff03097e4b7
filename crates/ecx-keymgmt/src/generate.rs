//! Key-pair generation contexts.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::descriptor::CurveDescriptor;
use crate::error::KeyMgmtError;
use crate::key::KeyRef;
use crate::params::{names, ParamList};
use crate::provider::ProviderContext;
use crate::rng::{system_rng, RandomSource};
use crate::selection::Selection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GenState {
    Created,
    Parameterized,
    Generated,
}

/// State for one generation request. Owns its random source.
pub struct GenContext {
    provider: Arc<ProviderContext>,
    descriptor: &'static CurveDescriptor,
    rng: Box<dyn RandomSource>,
    selection: Selection,
    expected_name: &'static str,
    state: GenState,
}

impl GenContext {
    /// Start a generation request backed by the system random source.
    pub fn init(
        provider: &Arc<ProviderContext>,
        descriptor: &'static CurveDescriptor,
        selection: Selection,
        params: &ParamList,
    ) -> Result<Self, KeyMgmtError> {
        Self::init_with_rng(provider, descriptor, selection, params, system_rng())
    }

    /// Start a generation request with a caller-supplied random source.
    pub fn init_with_rng(
        provider: &Arc<ProviderContext>,
        descriptor: &'static CurveDescriptor,
        selection: Selection,
        params: &ParamList,
        rng: Box<dyn RandomSource>,
    ) -> Result<Self, KeyMgmtError> {
        if !provider.is_running() {
            return Err(KeyMgmtError::NotRunning);
        }
        if !selection.intersects(Selection::POSSIBLE) {
            return Err(KeyMgmtError::generation(format!(
                "unsupported selection {:#x}",
                selection.bits()
            )));
        }

        let mut ctx = Self {
            provider: Arc::clone(provider),
            descriptor,
            rng,
            selection,
            expected_name: descriptor.name,
            state: GenState::Created,
        };
        ctx.set_params(params)?;
        Ok(ctx)
    }

    /// Apply generation parameters. Only `group-name` is recognized and it
    /// must name this context's curve.
    pub fn set_params(&mut self, params: &ParamList) -> Result<(), KeyMgmtError> {
        if let Some(name) = params.get_utf8_string(names::GROUP_NAME)? {
            if !name.eq_ignore_ascii_case(self.expected_name) {
                warn!(expected = self.expected_name, actual = name, "group name mismatch");
                return Err(KeyMgmtError::ParameterMismatch {
                    expected: self.expected_name.to_string(),
                    actual: name.to_string(),
                });
            }
        }
        if self.state == GenState::Created {
            self.state = GenState::Parameterized;
        }
        Ok(())
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn descriptor(&self) -> &'static CurveDescriptor {
        self.descriptor
    }

    /// Produce the key. A context generates at most once.
    ///
    /// Without a key-pair selection the key is returned empty.
    pub fn generate(&mut self) -> Result<KeyRef, KeyMgmtError> {
        if self.state == GenState::Generated {
            return Err(KeyMgmtError::generation("context already used"));
        }
        self.state = GenState::Generated;

        let key = KeyRef::create(&self.provider, self.descriptor)?;
        if !self.selection.intersects(Selection::KEYPAIR) {
            return Ok(key);
        }

        let len = self.descriptor.encoded_len;
        let rng = self.rng.as_mut();
        let generated = key.update(|state| {
            state.material.generate(rng, len)?;
            state.has_public = true;
            state.has_private = true;
            Ok(())
        });
        match generated {
            Ok(()) => {
                debug!(family = %self.descriptor.family, "key pair generated");
                Ok(key)
            }
            Err(err) => {
                warn!(family = %self.descriptor.family, error = %err, "key generation failed");
                key.release();
                Err(err)
            }
        }
    }

    /// Dispose of the context and its random source.
    pub fn cleanup(self) {}
}

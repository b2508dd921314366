use std::sync::{Arc, OnceLock};

use crate::auth::IdentityProvider;
use crate::store::TaskStore;

/// Handles to the remote services. Cloning is cheap; both sides are shared.
#[derive(Clone)]
pub struct Backend {
    pub store: Arc<dyn TaskStore>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl Backend {
    pub fn new(store: Arc<dyn TaskStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { store, identity }
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend").finish_non_exhaustive()
    }
}

/// Builds the backend once on first use and hands out the same instance after.
///
/// Meant to live in a `static` owned by the binary; screen controllers only ever
/// receive the `Arc` handles cloned out of it.
#[derive(Debug, Default)]
pub struct BackendCell {
    inner: OnceLock<Backend>,
}

impl BackendCell {
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    pub fn get_or_init(&self, build: impl FnOnce() -> Backend) -> &Backend {
        self.inner.get_or_init(|| {
            log::info!("backend initialized");
            build()
        })
    }

    pub fn get(&self) -> Option<&Backend> {
        self.inner.get()
    }
}

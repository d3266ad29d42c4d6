//! Teardown management
//!
//! Disposables registered during application life are released in reverse
//! registration order on demand. Per-item failures are logged and never
//! abort the remaining teardown; a second dispose call is a no-op.

use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::error::Result;

/// A resource participating in application teardown
pub trait Disposable: Send + Sync {
    /// Release the resource
    fn dispose(&self) -> Result<()>;
}

/// Accepts disposables and releases them on request
pub trait ApplicationDisposer: Send + Sync {
    /// Register a disposable; it is released before earlier registrations
    fn add(&self, disposable: Arc<dyn Disposable>);

    /// Release every registered disposable, in reverse registration order
    fn dispose(&self);
}

/// Default disposer. Registration order is preserved under a mutex;
/// dispose drains the list, which is what makes a second call a no-op.
#[derive(Default)]
pub struct BasicApplicationDisposer {
    disposables: Mutex<Vec<Arc<dyn Disposable>>>,
}

impl BasicApplicationDisposer {
    /// Create an empty disposer
    pub fn new() -> Self {
        Self::default()
    }
}

impl ApplicationDisposer for BasicApplicationDisposer {
    fn add(&self, disposable: Arc<dyn Disposable>) {
        let mut disposables = match self.disposables.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        disposables.push(disposable);
    }

    fn dispose(&self) {
        let drained: Vec<Arc<dyn Disposable>> = {
            let mut disposables = match self.disposables.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            disposables.drain(..).collect()
        };
        for disposable in drained.into_iter().rev() {
            if let Err(error) = disposable.dispose() {
                warn!(%error, "failed to dispose a resource, continuing teardown");
            }
        }
        debug!("application teardown completed");
    }
}

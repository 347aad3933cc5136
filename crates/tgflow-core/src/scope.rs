//! Per-update resource scopes
//!
//! Every update gets a freshly provisioned [`Scope`] that is never shared
//! with another update. A scope owns its resource bundle and the function that
//! tears it down. The teardown runs exactly once: through [`Scope::release`],
//! or from `Drop` if the scope is abandoned on an error or panic path.

use crate::error::{Error, Result};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

/// Teardown function paired with a resource bundle
pub type ReleaseFn = Box<dyn FnOnce() -> Result<()> + Send>;

/// Produces one isolated scope per update
#[cfg_attr(test, mockall::automock(type Resources = u32;))]
pub trait ScopeProvisioner: Send + Sync + 'static {
    /// Resource bundle handed to the pipeline
    type Resources: Send + Sync + 'static;

    /// Build a new scope.
    ///
    /// On error nothing was acquired; the provisioner cleans up any partial work
    /// before returning.
    fn acquire(&self) -> Result<Scope<Self::Resources>>;
}

/// An isolated resource bundle tied to one update
pub struct Scope<R> {
    id: Uuid,
    resources: Arc<R>,
    release: Option<ReleaseFn>,
}

impl<R> Scope<R> {
    /// Create a scope with a teardown function
    pub fn new<F>(resources: R, release: F) -> Self
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        Self {
            id: Uuid::new_v4(),
            resources: Arc::new(resources),
            release: Some(Box::new(release)),
        }
    }

    /// Create a scope whose resources need no teardown
    pub fn unmanaged(resources: R) -> Self {
        Self {
            id: Uuid::new_v4(),
            resources: Arc::new(resources),
            release: None,
        }
    }

    /// Scope id, for logs
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Shared handle to the resource bundle
    pub fn resources(&self) -> Arc<R> {
        Arc::clone(&self.resources)
    }

    /// Tear the scope down
    pub fn release(mut self) -> Result<()> {
        self.run_release()
    }

    fn run_release(&mut self) -> Result<()> {
        match self.release.take() {
            Some(release) => {
                debug!(scope_id = %self.id, "Releasing scope");
                release()
            }
            None => Ok(()),
        }
    }
}

impl<R> Drop for Scope<R> {
    fn drop(&mut self) {
        if let Err(e) = self.run_release() {
            error!(scope_id = %self.id, error = %e, "Scope release failed during drop");
        }
    }
}

impl<R> fmt::Debug for Scope<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id)
            .field("released", &self.release.is_none())
            .finish()
    }
}

/// Provisioner built from a plain factory function.
///
/// The factory returns the resource bundle and its teardown.
pub struct FnProvisioner<F> {
    factory: F,
}

impl<F> FnProvisioner<F> {
    /// Wrap a factory
    pub fn new<R, D>(factory: F) -> Self
    where
        F: Fn() -> Result<(R, D)> + Send + Sync + 'static,
        D: FnOnce() -> Result<()> + Send + 'static,
    {
        Self { factory }
    }
}

impl<F, R, D> ScopeProvisioner for FnProvisioner<F>
where
    F: Fn() -> Result<(R, D)> + Send + Sync + 'static,
    R: Send + Sync + 'static,
    D: FnOnce() -> Result<()> + Send + 'static,
{
    type Resources = R;

    fn acquire(&self) -> Result<Scope<R>> {
        let (resources, release) = (self.factory)()?;
        Ok(Scope::new(resources, release))
    }
}

/// Turn any displayable failure into a release error
pub fn release_error(e: impl fmt::Display) -> Error {
    Error::ScopeRelease(e.to_string())
}

#[cfg(test)]
mod tests;

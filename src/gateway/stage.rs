//! Pipeline stage availability.

use std::sync::Arc;

use crate::config::FailurePolicy;

/// A collaborator failed to construct.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DependencyInitError {
    #[error("client classifier failed to initialize: {0}")]
    Classifier(String),
    #[error("rate budget failed to initialize: {0}")]
    RateBudget(String),
}

/// A pipeline collaborator slot.
pub(crate) enum Stage<T: ?Sized> {
    Ready(Arc<T>),
    /// Switched off by configuration.
    Disabled,
    /// Construction failed; handled per `FailurePolicy`.
    Unavailable(DependencyInitError),
}

impl<T: ?Sized> Stage<T> {
    pub(crate) fn from_init(result: Result<Arc<T>, DependencyInitError>) -> Self {
        match result {
            Ok(inner) => Stage::Ready(inner),
            Err(e) => {
                tracing::error!(error = %e, "Gateway dependency unavailable");
                Stage::Unavailable(e)
            }
        }
    }

    pub(crate) fn status(&self) -> &'static str {
        match self {
            Stage::Ready(_) => "ready",
            Stage::Disabled => "disabled",
            Stage::Unavailable(_) => "unavailable",
        }
    }
}

impl<T: ?Sized> Clone for Stage<T> {
    fn clone(&self) -> Self {
        match self {
            Stage::Ready(inner) => Stage::Ready(inner.clone()),
            Stage::Disabled => Stage::Disabled,
            Stage::Unavailable(e) => Stage::Unavailable(e.clone()),
        }
    }
}

/// What an unavailable stage does to a request.
pub(crate) fn unavailable_passes(policy: FailurePolicy, error: &DependencyInitError) -> bool {
    match policy {
        FailurePolicy::FailOpen => {
            tracing::warn!(error = %error, "Dependency unavailable, stage bypassed (fail-open)");
            true
        }
        FailurePolicy::FailClosed => false,
    }
}

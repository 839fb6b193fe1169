//! Request metadata consumed by the pipeline.

/// Caller-supplied context for one resolution request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMetadata {
    /// Identity string declared by the client (e.g. its user agent).
    /// Attacker controlled.
    pub declared_identity: Option<String>,

    /// Capability token presented with the request.
    pub capability_token: Option<String>,

    /// Set by the surrounding layer when the request carries an
    /// authenticated admin session.
    pub admin_session: bool,

    /// Correlation id for logs.
    pub request_id: Option<String>,
}

impl RequestMetadata {
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.declared_identity = Some(identity.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.capability_token = Some(token.into());
        self
    }

    pub fn with_admin_session(mut self) -> Self {
        self.admin_session = true;
        self
    }
}

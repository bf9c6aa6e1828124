//! Session identity.
//!
//! The bearer credential is created at login and dropped at logout. It is
//! passed explicitly to every collaborator that needs it and never parsed.

use std::{fmt, sync::Arc};

/// Opaque bearer credential.
///
/// `Debug` output is redacted so credentials never reach logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(Arc<str>);

impl Credential {
    /// Wrap a raw token.
    pub fn new(token: impl Into<Arc<str>>) -> Self {
        Self(token.into())
    }

    /// Raw token, for building request headers.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(..)")
    }
}

/// Login boundary for one user session.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    credential: Option<Credential>,
}

impl SessionContext {
    /// Logged-out context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Context logged in with `token`.
    pub fn logged_in(token: impl Into<Arc<str>>) -> Self {
        let mut context = Self::new();
        context.login(token);
        context
    }

    /// Store the credential for this session.
    pub fn login(&mut self, token: impl Into<Arc<str>>) {
        self.credential = Some(Credential::new(token));
    }

    /// Drop the credential.
    pub fn logout(&mut self) {
        self.credential = None;
    }

    /// Current credential, if logged in.
    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// True while a credential is held.
    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }
}

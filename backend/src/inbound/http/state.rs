//! Shared state handed to every HTTP handler.

use std::sync::Arc;

use crate::domain::ports::TokenService;
use crate::domain::{ApplicationService, AuthService};

/// Services reachable from request handlers.
///
/// Cloning is cheap: the services hold `Arc` handles to their adapters.
#[derive(Clone)]
pub struct HttpState {
    applications: ApplicationService,
    auth: AuthService,
    tokens: Arc<dyn TokenService>,
}

impl HttpState {
    pub fn new(
        applications: ApplicationService,
        auth: AuthService,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            applications,
            auth,
            tokens,
        }
    }

    pub fn applications(&self) -> &ApplicationService {
        &self.applications
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn tokens(&self) -> &Arc<dyn TokenService> {
        &self.tokens
    }
}

pub mod analysis;
pub mod health;
pub mod reports;

use crate::api::middleware::AuthenticatedUser;
use crate::context::{RequestContext, SharedClock};
use crate::services::AnalysisService;

#[derive(Clone)]
pub struct AppState {
    pub service: AnalysisService,
    pub clock: SharedClock,
}

impl AppState {
    pub fn new(service: AnalysisService, clock: SharedClock) -> Self {
        Self { service, clock }
    }

    pub fn context(&self, user: &AuthenticatedUser) -> RequestContext {
        RequestContext::new(user.username.clone(), self.clock.as_ref())
    }
}

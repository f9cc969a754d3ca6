use std::sync::Arc;

use rf_core::{ForumService, IdentityProvider};

/// State shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub forum: Arc<ForumService>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(forum: ForumService, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { forum: Arc::new(forum), identity }
    }
}

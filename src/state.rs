use std::sync::Arc;

use crate::config::AuthConfig;
use crate::images::ImageStore;
use crate::store::{ClientStore, UserStore};

/// Shared, immutable application state handed to every worker.
#[derive(Clone)]
pub struct AppState {
    pub clients: Arc<dyn ClientStore>,
    pub users: Arc<dyn UserStore>,
    pub images: Arc<dyn ImageStore>,
    pub auth: AuthConfig,
    /// Environment name reported by `GET /api`.
    pub environment: String,
}

impl AppState {
    pub fn new(
        clients: Arc<dyn ClientStore>,
        users: Arc<dyn UserStore>,
        images: Arc<dyn ImageStore>,
        auth: AuthConfig,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            clients,
            users,
            images,
            auth,
            environment: environment.into(),
        }
    }
}

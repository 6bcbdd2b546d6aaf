//! Application state shared across handlers.

use std::sync::Arc;

use crate::directory::Directory;
use crate::session::SessionService;

/// State injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionService,
    pub directory: Arc<Directory>,
}

impl AppState {
    pub fn new(sessions: SessionService, directory: Directory) -> Self {
        Self {
            sessions,
            directory: Arc::new(directory),
        }
    }
}

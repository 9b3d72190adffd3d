use std::sync::Arc;

use crate::runner::Runner;

#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<Runner>,
}

impl AppState {
    pub fn new(runner: Arc<Runner>) -> Self {
        Self { runner }
    }
}

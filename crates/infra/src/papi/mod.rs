//! Property API endpoints: rule trees, rule formats and property search

mod rule_formats;
mod rules;
mod search;

use std::sync::Arc;

use crate::session::Session;

/// Client for the `/papi/v1` endpoints
#[derive(Debug, Clone)]
pub struct Papi {
    session: Arc<Session>,
}

impl Papi {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}

//! Chat adapter
//!
//! Thin wrapper for chat front ends: one message in, one reply string out.

use crate::error::AppResult;
use crate::router::{QueryOptions, QueryRouter};
use std::sync::Arc;

#[derive(Clone)]
pub struct ChatAdapter {
    router: Arc<QueryRouter>,
}

impl ChatAdapter {
    pub fn new(router: Arc<QueryRouter>) -> Self {
        Self { router }
    }

    /// Route `message` and return only the response text
    ///
    /// Routing details are never included. Router errors propagate unchanged.
    pub async fn chat_query(&self, message: &str) -> AppResult<String> {
        let result = self
            .router
            .process_user_query(message, QueryOptions { show_routing: false })
            .await?;
        Ok(result.response)
    }
}

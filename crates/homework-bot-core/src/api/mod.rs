//! Homework review API
//!
//! The client fetches raw payloads; [`check_response`] turns them into a
//! [`CheckedResponse`] or a shape error.

mod client;
mod response;

pub use client::PracticumClient;
pub use response::{check_response, CheckedResponse, CURRENT_DATE_KEY, HOMEWORKS_KEY};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Anything that can answer "what changed since this timestamp"
#[async_trait]
pub trait HomeworkSource: Send + Sync {
    /// Fetch the raw status payload for submissions updated after `since`
    async fn fetch(&self, since: i64) -> Result<Value>;
}

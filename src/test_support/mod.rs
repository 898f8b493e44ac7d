//! Test helpers shared by unit tests.

pub mod socket_guard;

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::client::{ApiError, QueryParams, Transport};

/// One recorded `Transport::get` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub endpoint: String,
    pub params: QueryParams,
}

/// In-memory transport that replays queued responses in order and records
/// every request it receives.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<Value, ApiError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedTransport {
    pub fn new(responses: impl IntoIterator<Item = Result<Value, ApiError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_bodies(bodies: impl IntoIterator<Item = Value>) -> Self {
        Self::new(bodies.into_iter().map(Ok))
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn cursors(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter_map(|request| request.params.get("cursor").cloned())
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, endpoint: &str, params: &QueryParams) -> Result<Value, ApiError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(RecordedRequest {
                endpoint: endpoint.to_string(),
                params: params.clone(),
            });
        }
        let next = self
            .responses
            .lock()
            .ok()
            .and_then(|mut responses| responses.pop_front());
        next.unwrap_or_else(|| {
            Err(ApiError::request_failed(
                endpoint,
                crate::client::FailureCause::Request,
                "scripted transport has no more responses",
            ))
        })
    }
}

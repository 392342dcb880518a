use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use bytes::Bytes;
use reqwest::Method;
use serde::Serialize;
use sonic_rs::to_vec;

use super::adapter::{
    RestBytes, RestError, RestFuture, RestRequest, RestResponse, RestResult, RestTransport,
};

/// What the mock does with the next request it receives.
#[derive(Clone, Debug, Default)]
pub enum MockBehavior {
    #[default]
    Pass,
    Reject {
        status: u16,
        reason: String,
    },
    ConnectError {
        status: Option<u16>,
        reason: String,
        retryable: bool,
    },
    SendError {
        status: Option<u16>,
        reason: String,
        retryable: bool,
    },
    ReceiveError {
        status: Option<u16>,
        reason: String,
        retryable: bool,
    },
    TimeoutError {
        status: Option<u16>,
        reason: String,
        retryable: bool,
    },
    InternalError {
        reason: String,
    },
    Drop,
}

impl MockBehavior {
    pub fn reject(status: u16, reason: impl Into<String>) -> Self {
        Self::Reject {
            status,
            reason: reason.into(),
        }
    }

    pub fn connect_error(reason: impl Into<String>, status: Option<u16>, retryable: bool) -> Self {
        Self::ConnectError {
            status,
            reason: reason.into(),
            retryable,
        }
    }

    pub fn send_error(reason: impl Into<String>, status: Option<u16>, retryable: bool) -> Self {
        Self::SendError {
            status,
            reason: reason.into(),
            retryable,
        }
    }

    pub fn receive_error(reason: impl Into<String>, status: Option<u16>, retryable: bool) -> Self {
        Self::ReceiveError {
            status,
            reason: reason.into(),
            retryable,
        }
    }

    pub fn timeout_error(reason: impl Into<String>, status: Option<u16>, retryable: bool) -> Self {
        Self::TimeoutError {
            status,
            reason: reason.into(),
            retryable,
        }
    }

    pub fn internal_error(reason: impl Into<String>) -> Self {
        Self::InternalError {
            reason: reason.into(),
        }
    }

    pub fn drop_response() -> Self {
        Self::Drop
    }

    /// The error this behavior produces, or `None` when the request goes through.
    fn into_error(self) -> Option<RestError> {
        match self {
            Self::Pass => None,
            Self::Reject { status, reason } => Some(RestError::rejected(
                status,
                reason,
                RestError::is_retryable_status(status),
            )),
            Self::ConnectError {
                status,
                reason,
                retryable,
            } => Some(RestError::connect(reason, status, retryable)),
            Self::SendError {
                status,
                reason,
                retryable,
            } => Some(RestError::send(reason, status, retryable)),
            Self::ReceiveError {
                status,
                reason,
                retryable,
            } => Some(RestError::receive(reason, status, retryable)),
            Self::TimeoutError {
                status,
                reason,
                retryable,
            } => Some(RestError::timeout(reason, status, retryable)),
            Self::InternalError { reason } => Some(RestError::internal(reason)),
            Self::Drop => Some(RestError::timeout(
                "mock transport dropped response",
                None,
                false,
            )),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct MockBehaviorPlan {
    request: VecDeque<MockBehavior>,
}

impl MockBehaviorPlan {
    pub fn push(&mut self, behavior: MockBehavior) -> &mut Self {
        self.request.push_back(behavior);
        self
    }

    pub fn pop(&mut self) -> MockBehavior {
        self.request.pop_front().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.request.len()
    }

    pub fn is_empty(&self) -> bool {
        self.request.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(String, RestBytes)>,
    pub body: RestBytes,
}

impl MockResponse {
    pub fn new(status: u16, body: impl Into<RestBytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, body.into())
    }

    pub fn json<T: Serialize>(status: u16, payload: &T) -> RestResult<Self> {
        let body = to_vec(payload).map_err(RestError::from)?;
        Ok(Self::new(status, body))
    }
}

#[derive(Clone, Debug)]
pub struct MockRestStateSnapshot {
    pub request_count: usize,
    pub last_status: Option<u16>,
    pub last_error: Option<RestError>,
    pub behavior_remaining: usize,
    pub response_queue_len: usize,
}

#[derive(Debug, Default)]
struct MockRestAdapterState {
    request_count: usize,
    last_status: Option<u16>,
    last_error: Option<RestError>,
    behavior_plan: MockBehaviorPlan,
    default_response_queue: VecDeque<MockResponse>,
    route_response_queues: HashMap<(Method, String), VecDeque<MockResponse>>,
    outbound_log: Vec<RestRequest>,
}

impl MockRestAdapterState {
    fn snapshot(&self) -> MockRestStateSnapshot {
        MockRestStateSnapshot {
            request_count: self.request_count,
            last_status: self.last_status,
            last_error: self.last_error.clone(),
            behavior_remaining: self.behavior_plan.len(),
            response_queue_len: self.default_response_queue.len(),
        }
    }

    fn next_response(&mut self, request: &RestRequest) -> Option<MockResponse> {
        let route_key = (request.method.clone(), request.url.clone());
        if let Some(response) = self
            .route_response_queues
            .get_mut(&route_key)
            .and_then(VecDeque::pop_front)
        {
            return Some(response);
        }
        self.default_response_queue.pop_front()
    }
}

/// In-memory transport that records every request it is handed.
///
/// Responses come from a per-route queue first, then from the default queue,
/// and finally fall back to an empty `200`. A [`MockBehaviorPlan`] can make
/// individual requests fail before any response is selected.
#[derive(Clone, Debug)]
pub struct MockRestAdapter {
    state: Arc<Mutex<MockRestAdapterState>>,
}

impl MockRestAdapter {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockRestAdapterState::default())),
        }
    }

    pub fn with_behavior_plan(behavior_plan: MockBehaviorPlan) -> Self {
        let state = MockRestAdapterState {
            behavior_plan,
            ..MockRestAdapterState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn with_behavior(behavior: MockBehavior) -> Self {
        let mut plan = MockBehaviorPlan::default();
        plan.push(behavior);
        Self::with_behavior_plan(plan)
    }

    pub fn snapshot(&self) -> MockRestStateSnapshot {
        self.state
            .lock()
            .expect("mock-restapi mutex poisoned while taking snapshot")
            .snapshot()
    }

    pub fn request_count(&self) -> usize {
        self.state
            .lock()
            .expect("mock-restapi mutex poisoned while reading request count")
            .request_count
    }

    /// Every request seen so far, in arrival order.
    pub fn requests(&self) -> Vec<RestRequest> {
        self.state
            .lock()
            .expect("mock-restapi mutex poisoned while reading outbound log")
            .outbound_log
            .clone()
    }

    pub fn last_request(&self) -> Option<RestRequest> {
        self.state
            .lock()
            .expect("mock-restapi mutex poisoned while reading outbound log")
            .outbound_log
            .last()
            .cloned()
    }

    pub fn queue_response(&self, response: MockResponse) {
        self.state
            .lock()
            .expect("mock-restapi mutex poisoned while queueing response")
            .default_response_queue
            .push_back(response);
    }

    pub fn queue_response_for(
        &self,
        method: Method,
        url: impl Into<String>,
        response: MockResponse,
    ) {
        let key = (method, url.into());
        self.state
            .lock()
            .expect("mock-restapi mutex poisoned while queueing response by route")
            .route_response_queues
            .entry(key)
            .or_default()
            .push_back(response);
    }

    pub fn queue_get_response(&self, url: impl Into<String>, response: MockResponse) {
        self.queue_response_for(Method::GET, url, response);
    }

    pub fn queue_json<T: Serialize>(
        &self,
        method: Method,
        url: impl Into<String>,
        status: u16,
        payload: &T,
    ) -> RestResult<()> {
        let response = MockResponse::json(status, payload)?;
        self.queue_response_for(method, url, response);
        Ok(())
    }
}

impl Default for MockRestAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl RestTransport for MockRestAdapter {
    fn execute(&self, request: RestRequest) -> RestFuture<RestResult<RestResponse>> {
        let adapter = self.clone();
        Box::pin(async move {
            let start = Instant::now();
            let mut state = adapter
                .state
                .lock()
                .expect("mock-restapi mutex poisoned while executing request");

            state.request_count += 1;
            state.last_error = None;
            state.outbound_log.push(request.clone());

            if let Some(error) = state.behavior_plan.pop().into_error() {
                state.last_status = error.status();
                state.last_error = Some(error.clone());
                return Err(error);
            }

            let response = match state.next_response(&request) {
                Some(response) => RestResponse {
                    status: response.status,
                    headers: response.headers,
                    body: response.body,
                    elapsed: start.elapsed(),
                },
                None => RestResponse {
                    status: 200,
                    headers: Vec::new(),
                    body: Bytes::new(),
                    elapsed: Duration::ZERO,
                },
            };
            state.last_status = Some(response.status);
            Ok(response)
        })
    }
}

//! Endpoint-table request dispatcher over a thin reqwest wrapper, with an
//! in-memory mock transport for fully deterministic tests.

pub mod adapter;
pub mod config;
pub mod dispatcher;
pub mod endpoint;
pub mod error;
pub mod mock;
pub mod params;

pub use reqwest::Method;

pub use adapter::{
    Client, ReqwestTransport, RestBytes, RestError, RestErrorKind, RestFuture, RestRequest,
    RestResponse, RestResult, RestTransport,
};
pub use config::{DEFAULT_BASE_URL, DispatcherConfig, PlaceholderPolicy};
pub use dispatcher::{DispatchResult, RequestDispatcher};
pub use endpoint::{EndpointTable, Substitution, placeholders, substitute};
pub use error::{ConfigError, DispatchError};
pub use mock::{
    MockBehavior, MockBehaviorPlan, MockResponse, MockRestAdapter, MockRestStateSnapshot,
};
pub use params::RequestParams;

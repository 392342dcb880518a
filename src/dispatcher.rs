use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use sonic_rs::Value;
use tracing::{debug, error};

use crate::adapter::{Client, RestRequest, RestTransport};
use crate::config::{DispatcherConfig, PlaceholderPolicy};
use crate::endpoint::{EndpointTable, substitute};
use crate::error::{ConfigError, DispatchError};
use crate::params::RequestParams;

pub type DispatchResult<T> = Result<T, DispatchError>;

/// Resolves endpoint keys into requests and sends them through a [`Client`].
///
/// Holds no mutable state; clones share the endpoint table and the transport.
#[derive(Clone)]
pub struct RequestDispatcher {
    base_url: Arc<str>,
    endpoints: Arc<EndpointTable>,
    placeholder_policy: PlaceholderPolicy,
    client: Client,
}

impl RequestDispatcher {
    pub fn new(config: DispatcherConfig, client: Client) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            base_url: config.base_url.into(),
            endpoints: Arc::new(config.endpoints),
            placeholder_policy: config.placeholder_policy,
            client,
        })
    }

    pub fn with_transport<T>(config: DispatcherConfig, transport: T) -> Result<Self, ConfigError>
    where
        T: RestTransport + 'static,
    {
        Self::new(config, Client::with_transport(transport))
    }

    /// Full URL for `key`, without sending anything.
    pub fn resolve_url(&self, key: &str, params: &RequestParams) -> DispatchResult<String> {
        let template = self
            .endpoints
            .get(key)
            .ok_or_else(|| DispatchError::UnknownEndpoint {
                key: key.to_owned(),
            })?;

        let resolved = substitute(template, params.path_params());
        if self.placeholder_policy == PlaceholderPolicy::Strict && !resolved.is_complete() {
            return Err(DispatchError::UnresolvedPlaceholder {
                key: key.to_owned(),
                placeholders: resolved.unresolved,
            });
        }

        let mut url = String::with_capacity(self.base_url.len() + resolved.path.len());
        url.push_str(&self.base_url);
        url.push_str(&resolved.path);
        Ok(url)
    }

    /// Request descriptor for `key`. GET never carries a payload.
    pub fn build_request(
        &self,
        key: &str,
        params: &RequestParams,
        method: Method,
    ) -> DispatchResult<RestRequest> {
        let url = self.resolve_url(key, params)?;
        let attach_body = method != Method::GET;
        let mut request = RestRequest::new(method, url).with_json_content_type();
        if let Some(body) = params.body().filter(|_| attach_body) {
            request = request.with_body(body.clone());
        }
        Ok(request)
    }

    /// Sends the request for `key` and decodes a 2xx JSON body into `T`.
    ///
    /// Transport, status and decode failures are logged once and returned as
    /// [`DispatchError::Transport`] holding the client's error unchanged.
    pub async fn dispatch<T>(
        &self,
        key: &str,
        params: RequestParams,
        method: Method,
    ) -> DispatchResult<T>
    where
        T: DeserializeOwned,
    {
        let request = self.build_request(key, &params, method)?;
        let method = request.method.clone();
        let url = request.url.clone();
        debug!(endpoint = key, %method, %url, "dispatching request");

        self.client
            .execute_json_checked::<T>(request)
            .await
            .map_err(|err| {
                error!(endpoint = key, %method, %url, error = %err, "request failed");
                DispatchError::Transport(err)
            })
    }

    pub async fn dispatch_value(
        &self,
        key: &str,
        params: RequestParams,
        method: Method,
    ) -> DispatchResult<Value> {
        self.dispatch::<Value>(key, params, method).await
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        key: &str,
        params: RequestParams,
    ) -> DispatchResult<T> {
        self.dispatch(key, params, Method::GET).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        key: &str,
        params: RequestParams,
    ) -> DispatchResult<T> {
        self.dispatch(key, params, Method::POST).await
    }
}

use std::collections::BTreeMap;
use std::fmt::Display;

use bytes::Bytes;
use serde::Serialize;

use crate::adapter::{RestBytes, RestError, RestResult};

/// Per-call inputs: values for template placeholders plus an optional payload.
///
/// The payload is kept apart from the path parameters, so no parameter name
/// is reserved.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestParams {
    path_params: BTreeMap<String, String>,
    body: Option<RestBytes>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a path parameter from anything printable; numbers and booleans
    /// use their `Display` form.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.path_params.insert(name.into(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: impl Into<RestBytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_json_body<T: Serialize>(self, payload: &T) -> RestResult<Self> {
        let body = sonic_rs::to_vec(payload).map_err(RestError::from)?;
        Ok(self.with_body(Bytes::from(body)))
    }

    pub fn path_params(&self) -> &BTreeMap<String, String> {
        &self.path_params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    pub fn body(&self) -> Option<&RestBytes> {
        self.body.as_ref()
    }
}

impl<K, V> FromIterator<(K, V)> for RequestParams
where
    K: Into<String>,
    V: Display,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params = params.with_param(name, value);
        }
        params
    }
}

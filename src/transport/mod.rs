use std::{borrow::Cow, error::Error};

use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use http_body_util::{combinators::UnsyncBoxBody, BodyExt as _};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::{
    client::LndError,
    document::{self, Document},
    stream::EventStream,
};

pub mod rest;
pub mod tls;

type BoxError = Box<dyn Error + Send + Sync>;

/// Response body handed back by [`Transport::make_request`].
pub type Body = UnsyncBoxBody<Bytes, TransportError>;

/// Ordered JSON object sent as a request body.
pub type Params = Map<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("{context}")]
    Connection {
        context: Cow<'static, str>,
        #[source]
        source: Option<BoxError>,
    },
    #[error("{context}")]
    Tls {
        context: Cow<'static, str>,
        #[source]
        source: Option<BoxError>,
    },
    #[error("failed to encode request parameters")]
    Encode(#[source] serde_json::Error),
    #[error("request parameters must encode to a JSON object")]
    ParamsNotObject,
    #[error("invalid configuration: {0}")]
    InvalidConfig(Cow<'static, str>),
}

impl TransportError {
    /// Build a connection error with context and source.
    pub fn connection<S, E>(context: S, source: E) -> Self
    where
        S: Into<Cow<'static, str>>,
        E: Error + Send + Sync + 'static,
    {
        Self::Connection {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Build a connection error that only has context (no underlying source).
    pub fn connection_message<S>(context: S) -> Self
    where
        S: Into<Cow<'static, str>>,
    {
        Self::Connection {
            context: context.into(),
            source: None,
        }
    }

    /// Build a TLS setup error with context and source.
    pub fn tls<S, E>(context: S, source: E) -> Self
    where
        S: Into<Cow<'static, str>>,
        E: Error + Send + Sync + 'static,
    {
        Self::Tls {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn tls_message<S>(context: S) -> Self
    where
        S: Into<Cow<'static, str>>,
    {
        Self::Tls {
            context: context.into(),
            source: None,
        }
    }
}

/// A single call against the node: method, relative path and optional JSON body.
#[derive(Clone, Debug, PartialEq)]
pub struct RpcRequest {
    pub method: Method,
    pub path: String,
    pub params: Option<Params>,
}

impl RpcRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: None,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Attach an already-built parameter object.
    #[must_use]
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }

    /// Serialize `params` into the request body.
    ///
    /// # Errors
    /// Returns [`TransportError::Encode`] when serialization fails and
    /// [`TransportError::ParamsNotObject`] when the value is not a JSON object.
    pub fn with_json<P: Serialize + ?Sized>(mut self, params: &P) -> Result<Self, TransportError> {
        match serde_json::to_value(params).map_err(TransportError::Encode)? {
            Value::Object(map) => {
                self.params = Some(map);
                Ok(self)
            }
            Value::Null => {
                self.params = None;
                Ok(self)
            }
            _ => Err(TransportError::ParamsNotObject),
        }
    }

    /// Encoded request body, `None` when the request carries no parameters.
    ///
    /// # Errors
    /// Returns [`TransportError::Encode`] if the parameter map cannot be serialized.
    pub fn body(&self) -> Result<Option<Vec<u8>>, TransportError> {
        self.params
            .as_ref()
            .map(|p| serde_json::to_vec(p).map_err(TransportError::Encode))
            .transpose()
    }
}

/// Authenticated request execution against an LND REST endpoint.
///
/// Implementors only provide [`make_request`](Self::make_request); the buffered
/// JSON and streaming entry points are derived from it.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one authenticated round trip and return the raw response.
    async fn make_request(
        &self,
        request: RpcRequest,
    ) -> Result<http::Response<Body>, TransportError>;

    /// Read the whole response body and classify it.
    async fn call_json(&self, request: RpcRequest) -> Result<Document, LndError> {
        let path = request.path.clone();
        let response = self.make_request(request).await?;
        let status = response.status();
        let body = response.into_body().collect().await?.to_bytes();
        debug!(
            target: "lnd_rest::transport",
            %path,
            status = status.as_u16(),
            len = body.len(),
            "response received"
        );
        trace!(target: "lnd_rest::transport", body = %String::from_utf8_lossy(&body));
        document::classify(&body)
    }

    /// Return the response body as an open event stream without reading it.
    async fn call_stream(&self, request: RpcRequest) -> Result<EventStream, LndError> {
        let path = request.path.clone();
        let response = self.make_request(request).await?;
        debug!(
            target: "lnd_rest::transport",
            %path,
            status = response.status().as_u16(),
            "stream opened"
        );
        Ok(EventStream::new(response.into_body()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_without_params_has_no_body() {
        let req = RpcRequest::get("v1/getinfo");
        assert_eq!(req.method, Method::GET);
        assert!(req.body().expect("body").is_none());
    }

    #[test]
    fn with_json_rejects_non_objects() {
        let err = RpcRequest::post("v1/invoices")
            .with_json(&[1, 2, 3])
            .expect_err("array params");
        assert!(matches!(err, TransportError::ParamsNotObject));
    }

    #[test]
    fn with_json_surfaces_serialization_failures() {
        struct Broken;
        impl Serialize for Broken {
            fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("unserializable"))
            }
        }
        let err = RpcRequest::post("v1/invoices")
            .with_json(&Broken)
            .expect_err("broken params");
        assert!(matches!(err, TransportError::Encode(_)));
    }

    #[test]
    fn body_keeps_insertion_order() {
        let req = RpcRequest::post("v1/invoices")
            .with_json(&json!({"value": 5, "memo": "tea"}))
            .expect("params");
        let body = req.body().expect("encode").expect("present");
        assert_eq!(body, br#"{"value":5,"memo":"tea"}"#);
    }
}

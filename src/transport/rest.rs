use async_trait::async_trait;
use bytes::Bytes;
use http::{header::CONTENT_TYPE, HeaderValue, Uri};
use http_body_util::{BodyExt as _, Full};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tracing::{debug, trace};

use super::{tls, Body, RpcRequest, Transport, TransportError};
use crate::config::{LndConfig, MACAROON_HEADER};

/// HTTPS transport for LND's REST gateway.
///
/// Trust is pinned to the certificate in [`LndConfig::tls_cert`] and every request
/// carries the macaroon in the `Grpc-Metadata-macaroon` header.
#[derive(Clone)]
pub struct RestTransport {
    host: String,
    macaroon: HeaderValue,
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
}

impl std::fmt::Debug for RestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestTransport")
            .field("host", &self.host)
            .field("macaroon", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl RestTransport {
    /// Build a transport from validated credentials.
    ///
    /// # Errors
    /// Returns [`TransportError`] when the configuration is invalid or the TLS
    /// certificate cannot be turned into a trust store.
    pub fn new(config: &LndConfig) -> Result<Self, TransportError> {
        config.validate()?;
        let tls_config = tls::pinned_client_config(&config.tls_cert)?;
        let connector = HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_only()
            .enable_http1()
            .build();
        let client = Client::builder(TokioExecutor::new()).build(connector);
        let mut macaroon = HeaderValue::from_str(&config.macaroon_hex)
            .map_err(|e| TransportError::connection("macaroon is not a valid header value", e))?;
        macaroon.set_sensitive(true);
        Ok(Self {
            host: config.normalized_host(),
            macaroon,
            client,
        })
    }

    /// Base URI requests are issued against.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.host, path)
    }
}

/// Join host and path with exactly one separating slash.
pub(crate) fn join_url(host: &str, path: &str) -> String {
    format!(
        "{}/{}",
        host.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[async_trait]
impl Transport for RestTransport {
    async fn make_request(
        &self,
        request: RpcRequest,
    ) -> Result<http::Response<Body>, TransportError> {
        let body = request.body()?;
        let uri: Uri = self
            .url(&request.path)
            .parse()
            .map_err(|e| TransportError::connection("invalid request URI", e))?;
        let mut builder = http::Request::builder()
            .method(request.method.clone())
            .uri(uri)
            .header(MACAROON_HEADER, self.macaroon.clone());
        if body.is_some() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }
        let req = builder
            .body(Full::new(body.map(Bytes::from).unwrap_or_default()))
            .map_err(|e| TransportError::connection("failed to build request", e))?;

        debug!(
            target: "lnd_rest::transport",
            method = %request.method,
            path = %request.path,
            "sending request"
        );
        let response = self.client.request(req).await.map_err(|e| {
            debug!(target: "lnd_rest::transport", error = %e, "request failed");
            TransportError::connection("request to lnd failed", e)
        })?;
        trace!(
            target: "lnd_rest::transport",
            status = response.status().as_u16(),
            "response head received"
        );
        Ok(response.map(|incoming| {
            incoming
                .map_err(|e| TransportError::connection("failed to read response body", e))
                .boxed_unsync()
        }))
    }
}

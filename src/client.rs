use std::borrow::Cow;

use thiserror::Error;
use tracing::debug;

use crate::{
    api,
    config::LndConfig,
    credentials::CredentialSource,
    document::Document,
    stream::EventStream,
    transport::{rest::RestTransport, RpcRequest, Transport, TransportError},
};

/// Failure reported by the node itself in the response body.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The body was the bare scalar `0`; carries the raw body text.
    #[error("remote sentinel error: {0}")]
    Sentinel(String),
    /// The body carried an `error` object; carries its message.
    #[error("remote error: {0}")]
    Reported(String),
}

impl RemoteError {
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Sentinel(m) | Self::Reported(m) => m,
        }
    }
}

/// Library-level error type surfaced by [`Lnd`].
#[derive(Debug, Error)]
pub enum LndError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("malformed response body")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("{context}")]
    Credentials {
        context: Cow<'static, str>,
        #[source]
        source: std::io::Error,
    },
}

impl LndError {
    pub(crate) fn decode(source: serde_json::Error, body: &[u8]) -> Self {
        Self::Decode {
            source,
            body: String::from_utf8_lossy(body).into_owned(),
        }
    }

    fn credentials(context: &'static str, source: std::io::Error) -> Self {
        Self::Credentials {
            context: context.into(),
            source,
        }
    }

    /// The remote failure, if the node rejected the call.
    #[must_use]
    pub fn as_remote(&self) -> Option<&RemoteError> {
        match self {
            Self::Remote(e) => Some(e),
            _ => None,
        }
    }
}

/// Result alias that defaults to [`LndError`].
pub type Result<T, E = LndError> = std::result::Result<T, E>;

/// Client for an LND node's REST API.
///
/// Holds only immutable credentials, so a shared reference can be used from many
/// tasks at once. Each call is an independent round trip.
#[derive(Clone, Debug)]
pub struct Lnd<T: Transport = RestTransport> {
    transport: T,
}

impl Lnd<RestTransport> {
    /// Load credentials from `source`, build the transport and check liveness with `GetInfo`.
    ///
    /// Never returns a client that failed the check.
    ///
    /// # Errors
    /// Returns [`LndError::Credentials`] if the source fails, [`LndError::Transport`]
    /// for unusable credentials, or whatever error the `GetInfo` call produced.
    pub async fn connect(host: impl Into<String>, source: &dyn CredentialSource) -> Result<Self> {
        let tls_cert = source
            .tls_cert()
            .await
            .map_err(|e| LndError::credentials("failed to load TLS certificate", e))?;
        let macaroon = source
            .macaroon()
            .await
            .map_err(|e| LndError::credentials("failed to load macaroon", e))?;
        Self::connect_with_config(LndConfig::new(host, tls_cert, &macaroon)).await
    }

    /// Build the transport from an assembled [`LndConfig`] and check liveness.
    ///
    /// # Errors
    /// See [`connect`](Self::connect).
    pub async fn connect_with_config(config: LndConfig) -> Result<Self> {
        let transport = RestTransport::new(&config)?;
        Self::connect_with(transport).await
    }
}

impl<T: Transport> Lnd<T> {
    /// Wrap a transport without any liveness check.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Wrap a transport and check liveness with `GetInfo`.
    ///
    /// # Errors
    /// Returns the `GetInfo` error unchanged.
    pub async fn connect_with(transport: T) -> Result<Self> {
        let lnd = Self::new(transport);
        let info = lnd.get_info().await?;
        debug!(
            target: "lnd_rest::client",
            alias = info.str("alias").unwrap_or_default(),
            block_height = info.u64("block_height").unwrap_or_default(),
            "connected to lnd"
        );
        Ok(lnd)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Issue an arbitrary request and classify the buffered response.
    ///
    /// # Errors
    /// Returns [`LndError`] as classified by the transport.
    pub async fn call_json(&self, request: RpcRequest) -> Result<Document> {
        self.transport.call_json(request).await
    }

    /// Issue an arbitrary request and return the open response stream.
    ///
    /// # Errors
    /// Returns [`LndError::Transport`] when the request cannot be sent.
    pub async fn call_stream(&self, request: RpcRequest) -> Result<EventStream> {
        self.transport.call_stream(request).await
    }

    /// `GET v1/getinfo`
    ///
    /// # Errors
    /// Returns [`LndError`] as classified by the transport.
    pub async fn get_info(&self) -> Result<Document> {
        self.call_json(api::get_info()).await
    }

    /// `POST v1/invoices` with `{value, memo}`.
    ///
    /// # Errors
    /// Returns [`LndError`] as classified by the transport.
    pub async fn create_invoice(&self, value: i64, memo: &str) -> Result<Document> {
        self.call_json(api::create_invoice(value, memo)).await
    }

    /// `GET v1/invoices`
    ///
    /// # Errors
    /// Returns [`LndError`] as classified by the transport.
    pub async fn list_invoices(&self) -> Result<Document> {
        self.call_json(api::list_invoices()).await
    }

    /// `POST v2/router/send` with a 60 second server-side timeout.
    ///
    /// The route streams payment updates; the first one is returned.
    ///
    /// # Errors
    /// Returns [`LndError`] as classified by the transport.
    pub async fn pay_invoice(&self, invoice: &str, fee_limit_msat: f64) -> Result<Document> {
        self.call_json(api::pay_invoice(invoice, fee_limit_msat)).await
    }

    /// `GET v1/balance/channels`
    ///
    /// # Errors
    /// Returns [`LndError`] as classified by the transport.
    pub async fn balance_channel(&self) -> Result<Document> {
        self.call_json(api::balance_channel()).await
    }

    /// `GET v1/payreq/{invoice}`; the invoice is not escaped.
    ///
    /// # Errors
    /// Returns [`LndError`] as classified by the transport.
    pub async fn decode_invoice(&self, invoice: &str) -> Result<Document> {
        self.call_json(api::decode_invoice(invoice)).await
    }

    /// `GET v1/invoices/subscribe`, returning as soon as the response head arrives.
    ///
    /// # Errors
    /// Returns [`LndError::Transport`] when the request cannot be sent.
    pub async fn invoices_subscribe(&self) -> Result<EventStream> {
        self.call_stream(api::invoices_subscribe()).await
    }
}
